use crate::{
    app::App,
    card::LinkCard,
    links::{Link, LinkCreate, LinkId, StoreError},
    metadata::ExtractionResult,
};
use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::signal;

#[derive(Clone)]
struct SharedState {
    app: Arc<App>,
}

pub fn router(app: Arc<App>) -> Router {
    let shared_state = Arc::new(SharedState { app });

    Router::new()
        .route("/api/links", get(list))
        .route("/api/links/create", post(create))
        .route("/api/links/delete", post(delete))
        .route("/api/meta/quick", post(meta_quick))
        .route("/api/meta", post(meta_full))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                log::error!("failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::warn!("shutting down");
}

async fn start_app(app: Arc<App>, listen: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("could not bind {listen}"))?;
    log::info!("listening on {listen}");

    axum::serve(listener, router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub fn start_daemon(app: Arc<App>, listen: &str) -> anyhow::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(start_app(app, listen))
}

#[derive(Debug)]
struct HttpError(StoreError);

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            StoreError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Io(_) | StoreError::Serde(_) => {
                log::error!("{self:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({"error": self.0.to_string()}))).into_response()
    }
}

impl From<StoreError> for HttpError {
    fn from(err: StoreError) -> Self {
        Self(err)
    }
}

async fn list(State(state): State<Arc<SharedState>>) -> Json<Vec<LinkCard>> {
    let app = state.app.clone();
    Json(tokio::task::block_in_place(move || app.cards()))
}

async fn create(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<LinkCreate>,
) -> Result<Json<Link>, HttpError> {
    log::debug!("payload: {payload:?}");

    let app = state.app.clone();
    let link = tokio::task::block_in_place(move || app.add(payload))?;
    Ok(Json(link))
}

#[derive(Debug, Deserialize)]
struct DeleteRequest {
    id: String,
}

async fn delete(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<DeleteRequest>,
) -> Result<Json<Vec<LinkCard>>, HttpError> {
    let app = state.app.clone();
    let id = LinkId::from(payload.id);

    let snapshot = tokio::task::block_in_place(move || app.delete(&id))?;

    let now = Utc::now();
    Ok(Json(
        snapshot
            .iter()
            .map(|link| LinkCard::from_link(link, now))
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
struct MetaRequest {
    url: String,
}

async fn meta_quick(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<MetaRequest>,
) -> Json<ExtractionResult> {
    Json(state.app.extractor().quick(&payload.url))
}

/// Always answers 200, failures are carried in the result's `error`.
async fn meta_full(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<MetaRequest>,
) -> Json<ExtractionResult> {
    let app = state.app.clone();
    Json(tokio::task::block_in_place(move || {
        app.extractor().full(&payload.url)
    }))
}
