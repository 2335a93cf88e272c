//! Integration tests for lifecycle delegation
//!
//! These tests drive the registry's sync/start fan-out against recording
//! fake participants to verify registration order, fail-fast semantics and
//! vacuous success, plus cancellation handling of the watch controllers.

use async_trait::async_trait;
use istio_mesh_client::{Error, Registry, RegistryConfig, Result, Starter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Test Helpers
// ============================================================================

type CallLog = Arc<Mutex<Vec<String>>>;

struct RecordingStarter {
    name: &'static str,
    fail: bool,
    calls: CallLog,
    workers_seen: AtomicUsize,
}

impl RecordingStarter {
    fn new(name: &'static str, fail: bool, calls: CallLog) -> Arc<Self> {
        Arc::new(Self {
            name,
            fail,
            calls,
            workers_seen: AtomicUsize::new(usize::MAX),
        })
    }
}

#[async_trait]
impl Starter for RecordingStarter {
    fn name(&self) -> &str {
        self.name
    }

    async fn sync(&self, _shutdown: &CancellationToken) -> Result<()> {
        self.calls.lock().unwrap().push(format!("sync:{}", self.name));
        if self.fail {
            return Err(Error::LifecycleError(format!(
                "{} refused to sync",
                self.name
            )));
        }
        Ok(())
    }

    async fn start(&self, workers: usize, _shutdown: &CancellationToken) -> Result<()> {
        self.workers_seen.store(workers, Ordering::SeqCst);
        self.calls.lock().unwrap().push(format!("start:{}", self.name));
        if self.fail {
            return Err(Error::LifecycleError(format!(
                "{} refused to start",
                self.name
            )));
        }
        Ok(())
    }
}

fn test_registry() -> Registry {
    Registry::from_config(&RegistryConfig::new("https://localhost:6443")).unwrap()
}

// ============================================================================
// Vacuous Success Tests
// ============================================================================

#[tokio::test]
async fn sync_with_no_participants_succeeds() {
    let registry = test_registry();
    let shutdown = CancellationToken::new();

    assert!(registry.sync(&shutdown).await.is_ok());
}

#[tokio::test]
async fn start_with_zero_workers_and_no_participants_succeeds() {
    let registry = test_registry();
    let shutdown = CancellationToken::new();

    assert!(registry.start(0, &shutdown).await.is_ok());
}

// ============================================================================
// Delegation Order Tests
// ============================================================================

#[tokio::test]
async fn sync_runs_participants_in_registration_order() {
    let registry = test_registry();
    let calls: CallLog = Arc::new(Mutex::new(Vec::new()));

    registry.register_starter(RecordingStarter::new("alpha", false, calls.clone()));
    registry.register_starter(RecordingStarter::new("beta", false, calls.clone()));
    registry.register_starter(RecordingStarter::new("gamma", false, calls.clone()));

    let shutdown = CancellationToken::new();
    registry.sync(&shutdown).await.unwrap();

    let log = calls.lock().unwrap();
    assert_eq!(*log, vec!["sync:alpha", "sync:beta", "sync:gamma"]);
}

#[tokio::test]
async fn start_forwards_the_worker_count_to_every_participant() {
    let registry = test_registry();
    let calls: CallLog = Arc::new(Mutex::new(Vec::new()));

    let first = RecordingStarter::new("alpha", false, calls.clone());
    let second = RecordingStarter::new("beta", false, calls.clone());
    registry.register_starter(first.clone());
    registry.register_starter(second.clone());

    let shutdown = CancellationToken::new();
    registry.start(4, &shutdown).await.unwrap();

    assert_eq!(first.workers_seen.load(Ordering::SeqCst), 4);
    assert_eq!(second.workers_seen.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn start_with_zero_workers_reaches_participants_unchanged() {
    let registry = test_registry();
    let calls: CallLog = Arc::new(Mutex::new(Vec::new()));

    let starter = RecordingStarter::new("alpha", false, calls);
    registry.register_starter(starter.clone());

    let shutdown = CancellationToken::new();
    registry.start(0, &shutdown).await.unwrap();

    assert_eq!(starter.workers_seen.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Fail-Fast Tests
// ============================================================================

#[tokio::test]
async fn sync_fails_fast_with_the_first_error() {
    let registry = test_registry();
    let calls: CallLog = Arc::new(Mutex::new(Vec::new()));

    registry.register_starter(RecordingStarter::new("alpha", false, calls.clone()));
    registry.register_starter(RecordingStarter::new("beta", true, calls.clone()));
    registry.register_starter(RecordingStarter::new("gamma", false, calls.clone()));

    let shutdown = CancellationToken::new();
    let err = registry.sync(&shutdown).await.unwrap_err();

    assert!(matches!(err, Error::LifecycleError(_)));
    assert!(err.to_string().contains("beta refused to sync"));

    // gamma is never reached
    let log = calls.lock().unwrap();
    assert_eq!(*log, vec!["sync:alpha", "sync:beta"]);
}

#[tokio::test]
async fn start_fails_fast_with_the_first_error() {
    let registry = test_registry();
    let calls: CallLog = Arc::new(Mutex::new(Vec::new()));

    registry.register_starter(RecordingStarter::new("alpha", true, calls.clone()));
    registry.register_starter(RecordingStarter::new("beta", false, calls.clone()));

    let shutdown = CancellationToken::new();
    let err = registry.start(2, &shutdown).await.unwrap_err();

    assert!(err.to_string().contains("alpha refused to start"));

    let log = calls.lock().unwrap();
    assert_eq!(*log, vec!["start:alpha"]);
}

// ============================================================================
// Watch Controller Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn controller_sync_respects_cancellation() {
    let registry = test_registry();
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let controller = registry.gateways("default").controller();
    let err = registry.sync(&shutdown).await.unwrap_err();

    assert!(matches!(err, Error::LifecycleError(_)));
    assert!(err.to_string().contains("cancelled"));
    assert!(controller.is_running());
}

#[tokio::test]
async fn controller_start_does_not_block() {
    let registry = test_registry();
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let controller = registry.virtual_services("default").controller();
    registry.start(2, &shutdown).await.unwrap();

    assert!(controller.is_running());
}
