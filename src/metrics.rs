//! Prometheus metrics definitions and HTTP server

use std::net::SocketAddr;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, register_histogram_vec, CounterVec,
    Encoder, Gauge, GaugeVec, HistogramVec, TextEncoder,
};
use tokio::net::TcpListener;
use tracing::{error, info};

lazy_static::lazy_static! {
    /// Watch events observed, per kind
    pub static ref WATCH_EVENTS: CounterVec = register_counter_vec!(
        "istio_mesh_client_watch_events_total",
        "Total number of watch events observed",
        &["kind"]
    ).unwrap();

    /// Watch stream errors, per kind
    pub static ref WATCH_FAILURES: CounterVec = register_counter_vec!(
        "istio_mesh_client_watch_failures_total",
        "Total number of watch stream errors",
        &["kind"]
    ).unwrap();

    /// Controller cache syncs, per kind
    pub static ref CONTROLLER_SYNCS: CounterVec = register_counter_vec!(
        "istio_mesh_client_controller_syncs_total",
        "Total number of controller cache syncs",
        &["kind"]
    ).unwrap();

    /// Cache sync duration histogram
    pub static ref SYNC_DURATION: HistogramVec = register_histogram_vec!(
        "istio_mesh_client_sync_duration_seconds",
        "Duration of controller cache syncs in seconds",
        &["kind"],
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();

    /// Objects held in controller caches, per kind
    pub static ref CACHED_OBJECTS: GaugeVec = register_gauge_vec!(
        "istio_mesh_client_cached_objects",
        "Number of objects held in controller caches by kind",
        &["kind"]
    ).unwrap();

    /// Registered lifecycle participants
    pub static ref REGISTERED_STARTERS: Gauge = register_gauge!(
        "istio_mesh_client_registered_starters",
        "Number of registered lifecycle participants"
    ).unwrap();

    /// Registry health (1 = healthy, 0 = unhealthy)
    pub static ref REGISTRY_HEALTH: Gauge = register_gauge!(
        "istio_mesh_client_registry_health",
        "Registry health status (1 = healthy, 0 = unhealthy)"
    ).unwrap();
}

/// Start the metrics HTTP server
pub async fn serve(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    REGISTRY_HEALTH.set(1.0);

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);

        tokio::spawn(async move {
            if let Err(e) = http1::Builder::new()
                .serve_connection(io, service_fn(handle_request))
                .await
            {
                error!("Error serving connection: {}", e);
            }
        });
    }
}

/// Route metrics and probe requests
async fn handle_request(
    req: Request<hyper::body::Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let response = match req.uri().path() {
        "/metrics" => metrics_response(),
        "/healthz" | "/health" => text_response(StatusCode::OK, "ok"),
        "/readyz" | "/ready" => ready_response(),
        _ => text_response(StatusCode::NOT_FOUND, "Not Found"),
    };

    Ok(response)
}

/// Generate metrics response
fn metrics_response() -> Response<Full<Bytes>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return text_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics");
    }

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", encoder.format_type())
        .body(Full::new(Bytes::from(buffer)))
        .unwrap()
}

/// Ready once the health gauge has been raised
fn ready_response() -> Response<Full<Bytes>> {
    if REGISTRY_HEALTH.get() >= 1.0 {
        text_response(StatusCode::OK, "ok")
    } else {
        text_response(StatusCode::SERVICE_UNAVAILABLE, "not ready")
    }
}

fn text_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}
