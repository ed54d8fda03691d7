use crate::stats::store_record;
use axum::{
    extract::{
        Request,
        State,
    },
    middleware::{
        self,
        Next,
    },
    response::Response,
    routing::{
        get,
        post,
    },
    Router,
};
use census_report::VERSION;
use census_sink::{
    Sink,
    STATS_PATH,
};
use std::{
    sync::Arc,
    time::{
        Duration,
        Instant,
    },
};
use tracing::{
    Instrument as _,
    Span,
};

#[derive(Clone)]
pub struct AppState {
    pub sink: Arc<dyn Sink>,
    /// Largest request body accepted, in bytes.
    pub max_body_bytes: usize,
    /// How long a client may take to send its body.
    pub read_timeout: Duration,
    pub span: Span,
}

impl AppState {
    pub fn new(sink: Arc<dyn Sink>, span: Span) -> Self {
        Self {
            sink,
            max_body_bytes: 1024 * 1024,
            read_timeout: Duration::from_secs(10),
            span,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(healthz))
        .route("/health", get(healthz))
        .route("/healthz", get(healthz))
        .route("/version", get(version))
        .route(STATS_PATH, post(store_record))
        .layer(middleware::from_fn_with_state(state.clone(), access_log))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "OK"
}

async fn version() -> &'static str {
    VERSION
}

async fn access_log(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let span = info_span!(parent: &state.span, "request", %method, %path);

    async move {
        let started = Instant::now();
        let response = next.run(request).await;
        info!(
            status = response.status().as_u16(),
            latency = ?started.elapsed(),
            "handled request"
        );
        response
    }
    .instrument(span)
    .await
}
