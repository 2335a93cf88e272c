//! Watch-and-cache controller for a single resource kind and namespace

use async_trait::async_trait;
use futures::StreamExt;
use kube::runtime::reflector::store::Writer;
use kube::runtime::reflector::{self, Store};
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::controllers::Starter;
use crate::error::{Error, Result};
use crate::metrics::{
    CACHED_OBJECTS, CONTROLLER_SYNCS, SYNC_DURATION, WATCH_EVENTS, WATCH_FAILURES,
};

/// Watch task state. The writer is consumed when the task launches;
/// `running` stays set for the rest of the controller's lifetime.
struct WatchState<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    writer: Option<Writer<K>>,
    running: bool,
}

/// Watch controller for one resource kind in one namespace scope.
///
/// Wraps a reflector: a watch stream with default backoff feeding an
/// in-memory store. Controllers are created on demand through the typed
/// clients' `controller()` and cached by the registry, one per namespace
/// key, each registered as a lifecycle participant.
pub struct ResourceController<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    name: String,
    kind: String,
    api: Api<K>,
    reader: Store<K>,
    state: Mutex<WatchState<K>>,
}

impl<K> ResourceController<K>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    /// Controller over `api`. The watch task is launched lazily by the
    /// first `sync` or `start` call.
    pub fn new(api: Api<K>) -> Self {
        let kind = K::kind(&()).to_string();
        let (reader, writer) = reflector::store();
        Self {
            name: format!("{}Controller", kind),
            kind,
            api,
            reader,
            state: Mutex::new(WatchState {
                writer: Some(writer),
                running: false,
            }),
        }
    }

    /// Read handle over the cached objects
    pub fn store(&self) -> &Store<K> {
        &self.reader
    }

    /// Kind watched by this controller
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Whether the watch task has been launched
    pub fn is_running(&self) -> bool {
        self.state.lock().expect("watch state lock poisoned").running
    }

    /// Launch the watch task. Only the first call does anything; the
    /// concurrency limit is fixed by whichever call launches the task.
    fn launch(&self, limit: Option<usize>, shutdown: &CancellationToken) {
        let mut state = self.state.lock().expect("watch state lock poisoned");
        if state.running {
            return;
        }
        let Some(writer) = state.writer.take() else {
            return;
        };
        state.running = true;
        drop(state);

        let api = self.api.clone();
        let kind = self.kind.clone();
        let label: Arc<str> = Arc::from(self.kind.as_str());
        let token = shutdown.clone();

        tokio::spawn(async move {
            let events = watcher(api, watcher::Config::default().any_semantic())
                .default_backoff()
                .reflect(writer)
                .touched_objects()
                .for_each_concurrent(limit, move |res| {
                    let label = label.clone();
                    async move {
                        match res {
                            Ok(obj) => {
                                WATCH_EVENTS.with_label_values(&[&label]).inc();
                                debug!("{} cache event for {}", label, obj.name_any());
                            }
                            Err(e) => {
                                WATCH_FAILURES.with_label_values(&[&label]).inc();
                                warn!("{} watch error: {}", label, e);
                            }
                        }
                    }
                });

            tokio::select! {
                _ = token.cancelled() => info!("{} watch stopped", kind),
                _ = events => warn!("{} watch stream ended", kind),
            }
        });
    }
}

#[async_trait]
impl<K> Starter for ResourceController<K>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn sync(&self, shutdown: &CancellationToken) -> Result<()> {
        let start = Instant::now();
        CONTROLLER_SYNCS.with_label_values(&[&self.kind]).inc();
        self.launch(None, shutdown);

        tokio::select! {
            _ = shutdown.cancelled() => Err(Error::LifecycleError(format!(
                "{} sync cancelled before the cache became ready",
                self.name
            ))),
            res = self.reader.wait_until_ready() => res.map_err(|e| {
                Error::LifecycleError(format!("{} sync failed: {}", self.name, e))
            }),
        }?;

        let duration = start.elapsed().as_secs_f64();
        let cached = self.reader.state().len();
        SYNC_DURATION
            .with_label_values(&[&self.kind])
            .observe(duration);
        CACHED_OBJECTS
            .with_label_values(&[&self.kind])
            .set(cached as f64);
        info!(
            "Synced {} with {} cached objects in {:.2}s",
            self.name, cached, duration
        );
        Ok(())
    }

    async fn start(&self, workers: usize, shutdown: &CancellationToken) -> Result<()> {
        let limit = if workers == 0 { None } else { Some(workers) };
        self.launch(limit, shutdown);
        info!("Started {} with {} workers", self.name, workers);
        Ok(())
    }
}
