//! DestinationRule Custom Resource Definition
//!
//! A DestinationRule configures the client-side policies applied to traffic
//! after routing has selected a destination: load balancing, connection
//! pooling, outlier detection and TLS settings, optionally per named subset.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::status::IstioStatus;
use super::virtual_service::PortSelector;

/// DestinationRule resource specification
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "networking.istio.io",
    version = "v1alpha3",
    kind = "DestinationRule",
    plural = "destinationrules",
    singular = "destinationrule",
    shortname = "dr",
    namespaced,
    status = "IstioStatus",
    category = "istio-io",
    printcolumn = r#"{"name": "Host", "type": "string", "jsonPath": ".spec.host"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct DestinationRuleSpec {
    /// Name of the destination service from the platform service registry
    pub host: String,

    /// Traffic policies applied to all ports and subsets unless overridden
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic_policy: Option<TrafficPolicy>,

    /// Named service subsets keyed off workload labels
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsets: Vec<Subset>,

    /// Namespaces this destination rule is exported to (`*` = all)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub export_to: Vec<String>,
}

/// Client-side traffic policies
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrafficPolicy {
    /// Load balancing algorithm settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balancer: Option<LoadBalancerSettings>,

    /// Connection pool limits for the upstream service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_pool: Option<ConnectionPoolSettings>,

    /// Eviction of unhealthy hosts from the load balancing pool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlier_detection: Option<OutlierDetection>,

    /// TLS settings for connections to the upstream service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<ClientTlsSettings>,

    /// Overrides for individual destination ports
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub port_level_settings: Vec<PortTrafficPolicy>,
}

/// Load balancing algorithm selection, one field should be set
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerSettings {
    /// Standard algorithm (ROUND_ROBIN, LEAST_CONN, RANDOM, PASSTHROUGH)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simple: Option<String>,

    /// Consistent-hash session affinity settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistent_hash: Option<ConsistentHashLb>,
}

/// Consistent-hash load balancer settings, exactly one hash key applies
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsistentHashLb {
    /// Hash on a request header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_header_name: Option<String>,

    /// Hash on a cookie, created when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_cookie: Option<HttpCookie>,

    /// Hash on the source IP address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_source_ip: Option<bool>,

    /// Hash on a query parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_query_parameter_name: Option<String>,

    /// Minimum number of virtual nodes in the hash ring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_ring_size: Option<u64>,
}

/// Cookie used as the consistent-hash key
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpCookie {
    /// Cookie name
    pub name: String,

    /// Cookie path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Cookie lifetime, e.g. `30m`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
}

/// Connection pool limits, split by protocol level
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPoolSettings {
    /// Settings common to HTTP and TCP upstreams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp: Option<TcpSettings>,

    /// Settings specific to HTTP upstreams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpSettings>,
}

/// TCP connection pool settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TcpSettings {
    /// Maximum connections to the destination host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<i32>,

    /// TCP connect timeout, e.g. `30ms`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<String>,

    /// TCP keepalive probing for established connections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp_keepalive: Option<TcpKeepalive>,
}

/// TCP keepalive settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TcpKeepalive {
    /// Idle duration before keepalive probes start, e.g. `7200s`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    /// Duration between keepalive probes, e.g. `75s`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    /// Number of unacknowledged probes before the connection is dropped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probes: Option<u32>,
}

/// HTTP connection pool settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpSettings {
    /// Maximum pending HTTP/1.1 requests while waiting for a connection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http1_max_pending_requests: Option<i32>,

    /// Maximum concurrent requests to all hosts over HTTP/2
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http2_max_requests: Option<i32>,

    /// Maximum requests per connection (1 disables keepalive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_requests_per_connection: Option<i32>,

    /// Maximum retries outstanding across all hosts at a given time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<i32>,

    /// Idle timeout for upstream connections, e.g. `1h`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<String>,

    /// Upgrade policy for HTTP/1.1 connections (DEFAULT, DO_NOT_UPGRADE, UPGRADE)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h2_upgrade_policy: Option<String>,
}

/// Eviction of unhealthy hosts from the load balancing pool
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutlierDetection {
    /// Number of 5xx errors before a host is ejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consecutive_errors: Option<i32>,

    /// Interval between ejection sweeps, e.g. `10s`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    /// Minimum ejection duration, grows with repeated ejections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_ejection_time: Option<String>,

    /// Maximum percentage of hosts ejected at once
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ejection_percent: Option<i32>,

    /// Outlier detection stays disabled while fewer hosts are healthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_health_percent: Option<i32>,
}

/// TLS settings for connections to an upstream service
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientTlsSettings {
    /// TLS mode (DISABLE, SIMPLE, MUTUAL, ISTIO_MUTUAL)
    pub mode: String,

    /// Path to the client certificate (MUTUAL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_certificate: Option<String>,

    /// Path to the client private key (MUTUAL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,

    /// Path to the CA bundle verifying the server certificate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_certificates: Option<String>,

    /// Alternate names the server certificate is verified against
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subject_alt_names: Vec<String>,

    /// SNI string presented to the server during the handshake
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
}

/// Traffic policy override for a single destination port
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortTrafficPolicy {
    /// Destination port the override applies to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<PortSelector>,

    /// Load balancing algorithm settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balancer: Option<LoadBalancerSettings>,

    /// Connection pool limits for the upstream service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_pool: Option<ConnectionPoolSettings>,

    /// Eviction of unhealthy hosts from the load balancing pool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlier_detection: Option<OutlierDetection>,

    /// TLS settings for connections to the upstream service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<ClientTlsSettings>,
}

/// Named subset of a service's endpoints selected by labels
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subset {
    /// Subset name, referenced from VirtualService route destinations
    pub name: String,

    /// Workload labels selecting the subset endpoints
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Traffic policies overriding the rule-level defaults for this subset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic_policy: Option<TrafficPolicy>,
}
