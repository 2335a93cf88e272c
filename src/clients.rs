//! Typed per-namespace client wrappers

use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, ApiResource, DynamicObject};
use kube::Resource;
use std::sync::Arc;

use crate::controllers::ResourceController;
use crate::crd::{DestinationRule, Gateway, VirtualService};
use crate::registry::Registry;

/// Typed client for one resource kind, scoped to a namespace.
///
/// Wrappers are built fresh on every getter call and share the registry's
/// underlying REST client; an empty namespace scopes the client to all
/// namespaces. CRUD and watch verbs are exposed through [`api`](Self::api);
/// the wrapper itself only carries the scope and the way back to the
/// registry.
#[derive(Clone)]
pub struct ResourceClient<K> {
    namespace: String,
    registry: Registry,
    api: Api<K>,
}

impl<K> ResourceClient<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
{
    pub(crate) fn new(registry: Registry, namespace: &str) -> Self {
        let api = if namespace.is_empty() {
            Api::all(registry.client().clone())
        } else {
            Api::namespaced(registry.client().clone(), namespace)
        };
        Self {
            namespace: namespace.to_string(),
            registry,
            api,
        }
    }
}

impl ResourceClient<DynamicObject> {
    pub(crate) fn new_dynamic(registry: Registry, namespace: &str, resource: &ApiResource) -> Self {
        let api = if namespace.is_empty() {
            Api::all_with(registry.client().clone(), resource)
        } else {
            Api::namespaced_with(registry.client().clone(), namespace, resource)
        };
        Self {
            namespace: namespace.to_string(),
            registry,
            api,
        }
    }
}

impl<K> ResourceClient<K> {
    /// Namespace this client is scoped to, empty for all namespaces
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Object client carrying the CRUD and watch verbs
    pub fn api(&self) -> &Api<K> {
        &self.api
    }

    /// Registry this client was created from
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl ResourceClient<Gateway> {
    /// Watch controller for Gateways in this client's namespace, created on
    /// first use, cached by the registry and registered as a participant
    pub fn controller(&self) -> Arc<ResourceController<Gateway>> {
        self.registry.gateway_controller(&self.namespace)
    }
}

impl ResourceClient<VirtualService> {
    /// Watch controller for VirtualServices in this client's namespace,
    /// created on first use, cached by the registry and registered as a
    /// participant
    pub fn controller(&self) -> Arc<ResourceController<VirtualService>> {
        self.registry.virtual_service_controller(&self.namespace)
    }
}

impl ResourceClient<DestinationRule> {
    /// Watch controller for DestinationRules in this client's namespace,
    /// created on first use, cached by the registry and registered as a
    /// participant
    pub fn controller(&self) -> Arc<ResourceController<DestinationRule>> {
        self.registry.destination_rule_controller(&self.namespace)
    }
}
