//! Client registry: shared REST client, typed getters, controller caches
//! and lifecycle delegation

use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, ApiResource, DynamicObject};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config, Resource};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::clients::ResourceClient;
use crate::config::RegistryConfig;
use crate::controllers::{self, ResourceController, Starter};
use crate::crd::{DestinationRule, Gateway, VirtualService};
use crate::error::{Error, Result};
use crate::metrics::REGISTERED_STARTERS;

/// Mutable registry state, guarded by a single mutex. Controller caches
/// are keyed by namespace, empty string for all namespaces.
#[derive(Default)]
struct RegistryState {
    starters: Vec<Arc<dyn Starter>>,
    gateway_controllers: HashMap<String, Arc<ResourceController<Gateway>>>,
    virtual_service_controllers: HashMap<String, Arc<ResourceController<VirtualService>>>,
    destination_rule_controllers: HashMap<String, Arc<ResourceController<DestinationRule>>>,
}

struct RegistryInner {
    client: Client,
    state: Mutex<RegistryState>,
}

/// Shared handle over the typed clients for the networking.istio.io/v1alpha3
/// resource kinds.
///
/// All getters hand out wrappers over one REST client. Cloning the handle is
/// cheap and shares the client, the participant list and the controller
/// caches.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    /// Registry over an existing client
    pub fn new(client: Client) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                client,
                state: Mutex::new(RegistryState::default()),
            }),
        }
    }

    /// Registry from explicit connection settings.
    ///
    /// Validates the settings and builds the client without touching the
    /// network; connection failures surface on first use.
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        let kube_config = config.to_kube_config()?;
        let client = Client::try_from(kube_config)
            .map_err(|e| Error::ConfigError(format!("Failed to build client: {}", e)))?;
        info!("Created registry for {}", config.api_url);
        Ok(Self::new(client))
    }

    /// Registry from the environment: the in-cluster service account when
    /// running in a pod, the local kubeconfig otherwise
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default().await.map_err(|e| {
            Error::ConfigError(format!("Failed to infer client configuration: {}", e))
        })?;
        Ok(Self::new(client))
    }

    /// Registry from a kubeconfig file, using its current context
    pub async fn from_kubeconfig(path: impl AsRef<Path>) -> Result<Self> {
        let kubeconfig = Kubeconfig::read_from(path.as_ref()).map_err(|e| {
            Error::ConfigError(format!(
                "Failed to read kubeconfig {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let kube_config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|e| Error::ConfigError(format!("Invalid kubeconfig: {}", e)))?;
        let client = Client::try_from(kube_config)
            .map_err(|e| Error::ConfigError(format!("Failed to build client: {}", e)))?;
        Ok(Self::new(client))
    }

    /// Shared REST client
    pub fn client(&self) -> &Client {
        &self.inner.client
    }

    /// Whether two handles share the same underlying registry
    pub fn ptr_eq(&self, other: &Registry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Typed client for any namespaced kind; empty namespace means all
    /// namespaces. A fresh wrapper is returned on every call.
    pub fn typed<K>(&self, namespace: &str) -> ResourceClient<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
    {
        ResourceClient::new(self.clone(), namespace)
    }

    /// Typed client for Gateways in `namespace`
    pub fn gateways(&self, namespace: &str) -> ResourceClient<Gateway> {
        self.typed(namespace)
    }

    /// Typed client for VirtualServices in `namespace`
    pub fn virtual_services(&self, namespace: &str) -> ResourceClient<VirtualService> {
        self.typed(namespace)
    }

    /// Typed client for DestinationRules in `namespace`
    pub fn destination_rules(&self, namespace: &str) -> ResourceClient<DestinationRule> {
        self.typed(namespace)
    }

    /// Schema-less client for any resource kind described by `resource`
    pub fn dynamic(
        &self,
        namespace: &str,
        resource: &ApiResource,
    ) -> ResourceClient<DynamicObject> {
        ResourceClient::new_dynamic(self.clone(), namespace, resource)
    }

    /// Register a lifecycle participant. Participants are synced and
    /// started in registration order.
    pub fn register_starter(&self, starter: Arc<dyn Starter>) {
        let mut state = self.lock_state();
        debug!("Registered starter {}", starter.name());
        state.starters.push(starter);
        REGISTERED_STARTERS.set(state.starters.len() as f64);
    }

    /// Counts of registered participants and cached controllers
    pub fn stats(&self) -> RegistryStats {
        let state = self.lock_state();
        RegistryStats {
            starters: state.starters.len(),
            gateway_controllers: state.gateway_controllers.len(),
            virtual_service_controllers: state.virtual_service_controllers.len(),
            destination_rule_controllers: state.destination_rule_controllers.len(),
        }
    }

    /// Sync every registered participant in order, failing fast with the
    /// first error. Blocks until each participant reports its initial state
    /// loaded.
    pub async fn sync(&self, shutdown: &CancellationToken) -> Result<()> {
        let starters = self.starters_snapshot();
        info!("Syncing {} participants", starters.len());
        controllers::sync_all(shutdown, &starters).await
    }

    /// Start every registered participant in order with `workers` concurrent
    /// workers each (0 = unbounded), failing fast with the first error
    pub async fn start(&self, workers: usize, shutdown: &CancellationToken) -> Result<()> {
        let starters = self.starters_snapshot();
        info!(
            "Starting {} participants with {} workers",
            starters.len(),
            workers
        );
        controllers::start_all(workers, shutdown, &starters).await
    }

    pub(crate) fn gateway_controller(&self, namespace: &str) -> Arc<ResourceController<Gateway>> {
        self.controller_entry(namespace, |state| &mut state.gateway_controllers)
    }

    pub(crate) fn virtual_service_controller(
        &self,
        namespace: &str,
    ) -> Arc<ResourceController<VirtualService>> {
        self.controller_entry(namespace, |state| &mut state.virtual_service_controllers)
    }

    pub(crate) fn destination_rule_controller(
        &self,
        namespace: &str,
    ) -> Arc<ResourceController<DestinationRule>> {
        self.controller_entry(namespace, |state| &mut state.destination_rule_controllers)
    }

    /// Get or create the cached controller for one kind and namespace,
    /// registering new controllers as participants, under one lock hold
    fn controller_entry<K, F>(&self, namespace: &str, cache: F) -> Arc<ResourceController<K>>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug
            + Send
            + Sync
            + 'static,
        F: FnOnce(&mut RegistryState) -> &mut HashMap<String, Arc<ResourceController<K>>>,
    {
        let mut state = self.lock_state();
        let map = cache(&mut state);
        if let Some(existing) = map.get(namespace) {
            return existing.clone();
        }

        let api = if namespace.is_empty() {
            Api::all(self.inner.client.clone())
        } else {
            Api::namespaced(self.inner.client.clone(), namespace)
        };
        let controller = Arc::new(ResourceController::new(api));
        debug!(
            "Created {} for namespace '{}'",
            controller.name(),
            namespace
        );
        map.insert(namespace.to_string(), controller.clone());

        let starter: Arc<dyn Starter> = controller.clone();
        state.starters.push(starter);
        REGISTERED_STARTERS.set(state.starters.len() as f64);
        controller
    }

    fn starters_snapshot(&self) -> Vec<Arc<dyn Starter>> {
        self.lock_state().starters.clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, RegistryState> {
        self.inner
            .state
            .lock()
            .expect("registry state lock poisoned")
    }
}

/// Counts of cached controllers and registered participants
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Registered lifecycle participants
    pub starters: usize,
    /// Cached Gateway controllers, one per namespace key
    pub gateway_controllers: usize,
    /// Cached VirtualService controllers, one per namespace key
    pub virtual_service_controllers: usize,
    /// Cached DestinationRule controllers, one per namespace key
    pub destination_rule_controllers: usize,
}
