//! VirtualService Custom Resource Definition
//!
//! A VirtualService defines the routing rules applied to traffic addressed
//! to a host, after it has been matched by a gateway or sidecar.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::status::IstioStatus;

/// VirtualService resource specification
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "networking.istio.io",
    version = "v1alpha3",
    kind = "VirtualService",
    plural = "virtualservices",
    singular = "virtualservice",
    shortname = "vs",
    namespaced,
    status = "IstioStatus",
    category = "istio-io",
    printcolumn = r#"{"name": "Gateways", "type": "string", "jsonPath": ".spec.gateways"}"#,
    printcolumn = r#"{"name": "Hosts", "type": "string", "jsonPath": ".spec.hosts"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualServiceSpec {
    /// Destination hosts the routing rules apply to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,

    /// Names of the gateways and sidecars that should apply these rules
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gateways: Vec<String>,

    /// Ordered list of HTTP routing rules, first match wins
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub http: Vec<HttpRoute>,

    /// Ordered list of SNI routing rules for unterminated TLS traffic
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tls: Vec<TlsRoute>,

    /// Ordered list of routing rules for opaque TCP traffic
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tcp: Vec<TcpRoute>,

    /// Namespaces this virtual service is exported to (`*` = all)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub export_to: Vec<String>,
}

/// Routing rule for HTTP/1.1, HTTP/2 and gRPC traffic
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpRoute {
    /// Name assigned to the route for logging and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Match conditions, ORed together
    #[serde(default, rename = "match", skip_serializing_if = "Vec::is_empty")]
    pub match_: Vec<HttpMatchRequest>,

    /// Weighted destinations matching traffic is forwarded to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route: Vec<HttpRouteDestination>,

    /// Return a redirect instead of forwarding (mutually exclusive with route)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<HttpRedirect>,

    /// Rewrite the URI or Host header before forwarding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<HttpRewrite>,

    /// Request timeout, e.g. `5s`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Retry policy for this route
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<HttpRetry>,

    /// Fault injection applied to client traffic on this route
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<HttpFaultInjection>,

    /// Destination receiving a mirrored copy of the traffic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror: Option<Destination>,

    /// Percentage of traffic to mirror (all traffic when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror_percentage: Option<Percent>,
}

/// Conditions an HTTP request is matched against
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpMatchRequest {
    /// Name assigned to the match for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Match on the request URI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<StringMatch>,

    /// Match on the URI scheme
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<StringMatch>,

    /// Match on the HTTP method
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<StringMatch>,

    /// Match on the Authority/Host header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authority: Option<StringMatch>,

    /// Header name to match condition, all must hold
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, StringMatch>,

    /// Query parameter name to match condition, all must hold
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query_params: BTreeMap<String, StringMatch>,

    /// Port on the destination host being addressed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,

    /// Workload labels the source pod must carry
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub source_labels: BTreeMap<String, String>,

    /// Gateway names the rule is restricted to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gateways: Vec<String>,

    /// Compare the URI case-insensitively
    #[serde(default)]
    pub ignore_uri_case: bool,
}

/// String matcher, exactly one field should be set
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StringMatch {
    /// Exact string match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact: Option<String>,

    /// Prefix match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// RE2-style regular expression match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
}

/// Weighted destination of an HTTP route
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpRouteDestination {
    /// Destination service and subset
    pub destination: Destination,

    /// Proportion of traffic for this destination (weights must sum to 100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
}

/// Network-addressable service the request is forwarded to
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    /// Name of the destination service from the platform service registry
    pub host: String,

    /// Named subset defined in a DestinationRule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subset: Option<String>,

    /// Port on the destination service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<PortSelector>,
}

/// Port selection on the destination service
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortSelector {
    /// Port number
    pub number: u32,
}

/// Redirect returned instead of forwarding the request
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpRedirect {
    /// Value replacing the request URI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Value replacing the Authority/Host header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,

    /// HTTP status code for the redirect response
    #[serde(default = "default_redirect_code")]
    pub redirect_code: u32,
}

fn default_redirect_code() -> u32 {
    301
}

/// Rewrite applied before forwarding
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpRewrite {
    /// Value replacing the matched prefix of the URI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Value replacing the Authority/Host header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
}

/// Retry policy for an HTTP route
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpRetry {
    /// Number of retries for a given request
    pub attempts: i32,

    /// Timeout per retry attempt, e.g. `2s`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_try_timeout: Option<String>,

    /// Retry conditions (5xx, gateway-error, connect-failure, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_on: Option<String>,

    /// Retry against other localities when the local endpoints fail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_remote_localities: Option<bool>,
}

/// Faults injected into client traffic
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpFaultInjection {
    /// Delay requests before forwarding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<FaultDelay>,

    /// Abort requests with an error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort: Option<FaultAbort>,
}

/// Delay fault
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FaultDelay {
    /// Percentage of requests the delay is injected into
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<Percent>,

    /// Fixed delay before forwarding, e.g. `7s`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_delay: Option<String>,
}

/// Abort fault
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FaultAbort {
    /// Percentage of requests aborted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<Percent>,

    /// HTTP status code returned for aborted requests
    pub http_status: i32,
}

/// Percentage in the range 0.0 to 100.0
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Percent {
    /// Percentage value
    pub value: f64,
}

/// Routing rule for unterminated TLS traffic, matched on SNI
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TlsRoute {
    /// Match conditions, ORed together
    #[serde(default, rename = "match", skip_serializing_if = "Vec::is_empty")]
    pub match_: Vec<TlsMatchAttributes>,

    /// Weighted destinations matching traffic is forwarded to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route: Vec<RouteDestination>,
}

/// TLS connection match attributes
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TlsMatchAttributes {
    /// SNI server names to match, FQDN or wildcard
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sni_hosts: Vec<String>,

    /// Destination IPv4/IPv6 subnets in CIDR notation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destination_subnets: Vec<String>,

    /// Port on the destination host being addressed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,

    /// Workload labels the source pod must carry
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub source_labels: BTreeMap<String, String>,

    /// Gateway names the rule is restricted to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gateways: Vec<String>,
}

/// Routing rule for opaque TCP traffic
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TcpRoute {
    /// Match conditions, ORed together
    #[serde(default, rename = "match", skip_serializing_if = "Vec::is_empty")]
    pub match_: Vec<L4MatchAttributes>,

    /// Weighted destinations matching traffic is forwarded to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route: Vec<RouteDestination>,
}

/// L4 connection match attributes
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct L4MatchAttributes {
    /// Destination IPv4/IPv6 subnets in CIDR notation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destination_subnets: Vec<String>,

    /// Port on the destination host being addressed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,

    /// Workload labels the source pod must carry
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub source_labels: BTreeMap<String, String>,

    /// Gateway names the rule is restricted to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gateways: Vec<String>,
}

/// Weighted destination of a TCP or TLS route
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteDestination {
    /// Destination service and subset
    pub destination: Destination,

    /// Proportion of traffic for this destination (weights must sum to 100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
}
