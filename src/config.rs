//! Connection configuration for the registry

use kube::config::AuthInfo;
use kube::Config;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Namespace assumed when the configuration leaves it unset
pub const DEFAULT_NAMESPACE: &str = "default";

/// Connection settings for building a registry against a single API server.
///
/// Only the API server URL is required; every other setting is filled with a
/// default at construction time, so a minimal configuration round-trips
/// through YAML as a single `apiUrl` key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    /// Base URL of the Kubernetes API server, e.g. `https://10.0.0.1:6443`
    pub api_url: String,

    /// Namespace used for namespaced calls that do not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_namespace: Option<String>,

    /// Bearer token presented on every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Skip TLS certificate verification (development clusters only)
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl RegistryConfig {
    /// Configuration pointing at `api_url` with every other setting defaulted
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// Validate the settings and lower them into a `kube::Config`.
    ///
    /// Fails with [`Error::ConfigError`](crate::Error::ConfigError) when the
    /// API server URL is empty or not absolute.
    pub(crate) fn to_kube_config(&self) -> Result<Config> {
        let url: hyper::Uri = self.api_url.parse().map_err(|e| {
            Error::ConfigError(format!(
                "Invalid API server URL '{}': {}",
                self.api_url, e
            ))
        })?;
        if url.scheme().is_none() || url.authority().is_none() {
            return Err(Error::ConfigError(format!(
                "API server URL '{}' must be absolute, e.g. https://host:6443",
                self.api_url
            )));
        }

        let mut config = Config::new(url);
        config.default_namespace = self
            .default_namespace
            .clone()
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        config.accept_invalid_certs = self.accept_invalid_certs;
        if let Some(token) = &self.auth_token {
            config.auth_info = AuthInfo {
                token: Some(SecretString::new(token.clone())),
                ..AuthInfo::default()
            };
        }
        Ok(config)
    }
}
