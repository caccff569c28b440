//! HTTP server implementation
//!
//! hyper http1 with TokioIo, one spawned task per connection, and a single
//! `match (method, path)` route table.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::Args;
use crate::economy::{EconomyEngine, EconomyStore};
use crate::notify::Notifier;
use crate::routes;
use crate::types::ApiaryError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// The economy transition engine
    pub engine: Arc<EconomyEngine>,
    /// Storage handle, kept for readiness probing
    pub store: Arc<dyn EconomyStore>,
    /// "mongodb" or "memory"
    pub store_backend: &'static str,
    /// Fire-and-forget email facade
    pub notifier: Notifier,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        args: Args,
        store: Arc<dyn EconomyStore>,
        store_backend: &'static str,
        notifier: Notifier,
    ) -> Self {
        let engine = Arc::new(EconomyEngine::new(Arc::clone(&store)));
        Self {
            args,
            engine,
            store,
            store_backend,
            notifier,
            started_at: Instant::now(),
        }
    }
}

/// Run the server until the process is stopped
pub async fn run(state: Arc<AppState>) -> Result<(), ApiaryError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Apiary listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - test-resource route is exposed");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("[{}] {} {}", addr, method, path);

    // Game routes consume the request (POST bodies)
    if path.starts_with("/api/game/") && matches!(method, Method::GET | Method::POST) {
        if let Some(response) = routes::game::handle_game_request(req, Arc::clone(&state)).await {
            return Ok(response);
        }
        return Ok(routes::not_found(&path));
    }

    let response = match (method, path.as_str()) {
        // Liveness probe - returns 200 if apiary is running
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health::health_check(Arc::clone(&state))
        }

        // Readiness probe - returns 200 only if the store is reachable
        (Method::GET, "/ready") | (Method::GET, "/readyz") => {
            routes::health::readiness_check(Arc::clone(&state))
        }

        // Build metadata for deployment verification
        (Method::GET, "/version") => routes::health::version_info(),

        // CORS preflight
        (Method::OPTIONS, _) => routes::cors_preflight(),

        (_, p) => routes::not_found(p),
    };

    Ok(response)
}
