//! HTTP backend that indexes ballot submissions and reports whether each
//! ballot was verified and counted.

pub mod auth_middleware;
pub mod database;
pub mod error;
pub mod state;
pub mod submissions;
pub mod types;
pub mod utils;

use axum::{
    extract::State,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    auth_middleware::auth_middleware,
    database::models::SubmissionRow,
    error::ApiError,
    state::AppState,
    submissions::{get_submission_status, get_submissions, ingest_submissions},
    types::MetaResponse,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/meta", get(get_meta))
        .route(
            "/submission-status/{transaction_hash}",
            get(get_submission_status),
        )
        .route("/submissions/{account}", get(get_submissions))
        .route("/submissions", post(ingest_submissions))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}

async fn get_meta(State(app_state): State<AppState>) -> Result<Json<MetaResponse>, ApiError> {
    info!("GET /meta - Metadata requested");
    let submissions = SubmissionRow::count(&app_state.db.connection())?;
    Ok(Json(MetaResponse {
        git_hash: option_env!("SUBMISSION_BUILD_GIT_HASH").unwrap_or("unknown"),
        build_time: option_env!("SUBMISSION_BUILD_TIME_UNIX").unwrap_or("unknown"),
        submissions,
    }))
}
