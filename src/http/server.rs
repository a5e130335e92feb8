//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the single relay handler
//! - Wire up middleware (timeout, body limit, tracing, request ID)
//! - Collect request fields and hand them to the [`Dispatcher`]
//! - Apply allow-list updates pushed by the keys file watcher
//! - Serve until the shutdown signal fires

use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::http::dispatch::{Dispatcher, Reply};
use crate::http::request::{request_id, MakeRequestUuid, RequestFields};
use crate::security::{AuthGate, ReloadableAllowList, StaticAllowList};

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub max_body_size: usize,
}

/// HTTP front end of the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
    allow_list: Arc<ReloadableAllowList>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and initial
    /// allow-list.
    pub fn new(config: RelayConfig, allow_list: StaticAllowList) -> Self {
        let allow_list = Arc::new(ReloadableAllowList::new(allow_list));
        let gate = AuthGate::new(allow_list.clone());

        let state = AppState {
            dispatcher: Arc::new(Dispatcher::from_config(&config, gate)),
            max_body_size: config.security.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            allow_list,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(relay_handler))
            .route("/{*path}", any(relay_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Allow-lists received on `allow_list_updates` replace the current one.
    /// Returns once `shutdown` fires and in-flight requests have drained.
    pub async fn run(
        self,
        listener: TcpListener,
        mut allow_list_updates: mpsc::UnboundedReceiver<StaticAllowList>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            root = %self.config.storage.root_dir.display(),
            mode = ?self.config.queue.mode,
            "HTTP server starting"
        );

        let allow_list = self.allow_list.clone();
        let updater = tokio::spawn(async move {
            while let Some(list) = allow_list_updates.recv().await {
                allow_list.replace(list);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        updater.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The live allow-list consulted by the auth gate.
    pub fn allow_list(&self) -> Arc<ReloadableAllowList> {
        self.allow_list.clone()
    }
}

/// Single entry point: every path and method lands here.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request_id(request.headers());
    let (parts, body) = request.into_parts();

    let mut fields = RequestFields::from_query(parts.uri.query());
    if matches!(parts.method, Method::PUT | Method::POST) && is_form(&parts.headers) {
        match axum::body::to_bytes(body, state.max_body_size).await {
            Ok(bytes) => fields.extend_urlencoded(&bytes),
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "Unreadable request body");
                let err = RelayError::bad_request(format!("ERROR- unreadable request body: {}", e));
                return Reply::from(err).into_response();
            }
        }
    }

    let span = tracing::info_span!(
        "relay",
        request_id = %request_id,
        method = %parts.method,
        path = %parts.uri.path(),
    );
    state
        .dispatcher
        .dispatch(&parts.method, &fields)
        .instrument(span)
        .await
        .into_response()
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().eq_ignore_ascii_case(FORM_URLENCODED))
        .unwrap_or(false)
}
