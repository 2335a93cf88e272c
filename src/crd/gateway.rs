//! Gateway Custom Resource Definition
//!
//! A Gateway describes a load balancer operating at the edge of the mesh
//! that receives incoming or outgoing HTTP/TCP connections.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::status::IstioStatus;

/// Gateway resource specification
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "networking.istio.io",
    version = "v1alpha3",
    kind = "Gateway",
    plural = "gateways",
    singular = "gateway",
    shortname = "gw",
    namespaced,
    status = "IstioStatus",
    category = "istio-io"
)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySpec {
    /// Server specifications, one per exposed port
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    /// Workload labels selecting the gateway proxy pods
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub selector: BTreeMap<String, String>,
}

/// Server exposed on a single gateway port
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    /// Port on which the proxy listens for incoming connections
    pub port: Port,

    /// Hosts exposed by this server, FQDN or wildcard (`*.example.com`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,

    /// TLS options to terminate or pass through connections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<ServerTlsSettings>,

    /// Name assigned to the server for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Loopback or Unix domain endpoint traffic is forwarded to instead of
    /// the routed destination
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_endpoint: Option<String>,
}

/// Port a gateway server listens on
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    /// Port number
    pub number: u32,

    /// Protocol (HTTP, HTTPS, GRPC, HTTP2, MONGO, TCP, TLS)
    pub protocol: String,

    /// Label assigned to the port
    pub name: String,

    /// Port number the listener binds to when different from `number`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_port: Option<u32>,
}

/// TLS options for a gateway server
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerTlsSettings {
    /// Redirect plain-text HTTP requests to HTTPS with a 301
    #[serde(default)]
    pub https_redirect: bool,

    /// TLS mode (PASSTHROUGH, SIMPLE, MUTUAL, AUTO_PASSTHROUGH, ISTIO_MUTUAL)
    #[serde(default = "default_tls_mode")]
    pub mode: String,

    /// Path to the server certificate (SIMPLE and MUTUAL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_certificate: Option<String>,

    /// Path to the server private key (SIMPLE and MUTUAL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,

    /// Path to the CA bundle verifying client certificates (MUTUAL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_certificates: Option<String>,

    /// Secret holding the server certificates, used instead of file paths
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_name: Option<String>,

    /// Alternate names the presented client certificate is verified against
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subject_alt_names: Vec<String>,

    /// Minimum TLS protocol version (TLSV1_0 through TLSV1_3)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_protocol_version: Option<String>,

    /// Maximum TLS protocol version (TLSV1_0 through TLSV1_3)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_protocol_version: Option<String>,

    /// Cipher suites offered during the handshake
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cipher_suites: Vec<String>,
}

fn default_tls_mode() -> String {
    "PASSTHROUGH".to_string()
}
