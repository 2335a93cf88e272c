//! Custom Resource Definitions for the networking.istio.io API group

mod destination_rule;
mod gateway;
mod status;
mod virtual_service;

pub use destination_rule::*;
pub use gateway::*;
pub use status::*;
pub use virtual_service::*;

use kube::api::ApiResource;
use kube::CustomResourceExt;

/// API group shared by every resource kind in this crate
pub const API_GROUP: &str = "networking.istio.io";

/// API version shared by every resource kind in this crate
pub const API_VERSION: &str = "v1alpha3";

/// Type-erased descriptor for the Gateway kind, for dynamic clients
pub fn gateway_resource() -> ApiResource {
    ApiResource::erase::<Gateway>(&())
}

/// Type-erased descriptor for the VirtualService kind, for dynamic clients
pub fn virtual_service_resource() -> ApiResource {
    ApiResource::erase::<VirtualService>(&())
}

/// Type-erased descriptor for the DestinationRule kind, for dynamic clients
pub fn destination_rule_resource() -> ApiResource {
    ApiResource::erase::<DestinationRule>(&())
}

/// Generate CRD YAML manifests for all custom resources
pub fn generate_crds() -> Vec<String> {
    vec![
        serde_yaml::to_string(&Gateway::crd()).unwrap(),
        serde_yaml::to_string(&VirtualService::crd()).unwrap(),
        serde_yaml::to_string(&DestinationRule::crd()).unwrap(),
    ]
}
