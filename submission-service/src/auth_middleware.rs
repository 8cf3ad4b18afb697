//! Authentication middleware for the ingestion endpoint

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use tracing::{debug, info};

use crate::{error::ApiError, state::AppState};

/// Middleware that checks the ingest token on `POST /submissions`.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if request.method() != Method::POST || request.uri().path() != "/submissions" {
        return Ok(next.run(request).await);
    }

    let Some(expected) = app_state.ingest_token.as_deref() else {
        info!("Rejecting ingestion: no ingest token configured");
        return Err(ApiError::Unauthorized);
    };

    let token = extract_bearer_token(&headers)?;
    if token != expected {
        info!("Rejecting ingestion: invalid token");
        return Err(ApiError::Unauthorized);
    }

    debug!("Ingest token accepted");
    Ok(next.run(request).await)
}

/// Extract Bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let auth_header = headers
        .get("authorization")
        .ok_or(ApiError::Unauthorized)?
        .to_str()
        .map_err(|_| ApiError::BadRequest {
            what: "authorization header",
            details: "not visible ASCII".to_string(),
        })?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)
}
