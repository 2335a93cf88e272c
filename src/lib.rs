//! Typed Kubernetes client registry for Istio networking resources
//!
//! One [`Registry`] holds a shared Kubernetes client and hands out typed
//! per-namespace clients for the networking.istio.io/v1alpha3 kinds
//! (Gateway, VirtualService, DestinationRule). Watch controllers created
//! through the typed clients are cached per namespace and driven together
//! through the registry's `sync`/`start` lifecycle.

pub mod clients;
pub mod config;
pub mod context;
pub mod controllers;
pub mod crd;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod telemetry;

pub use clients::ResourceClient;
pub use config::RegistryConfig;
pub use context::Context;
pub use controllers::Starter;
pub use error::{Error, Result};
pub use registry::{Registry, RegistryStats};
