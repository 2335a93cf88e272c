//! Tracing subscriber setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// The filter comes from `RUST_LOG` when set, with a crate-scoped default
/// otherwise. `json` switches the fmt layer to structured output. Calling
/// this more than once is a no-op, so tests can call it freely.
pub fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,istio_mesh_client=debug,kube=warn,hyper=warn"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        let _ = registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init();
    } else {
        let _ = registry.with(tracing_subscriber::fmt::layer()).try_init();
    }
}
