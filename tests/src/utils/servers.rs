use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use election_client::{node::TransactionOutcome, TransactionHash};
use submission_service::{build_router, database::Database, state::AppState};

/// Serves `router` on an ephemeral local port and returns its base url.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Static file host: `GET /files/{name}` returns the registered bytes or 404.
pub async fn spawn_resource_server(files: HashMap<String, Vec<u8>>) -> String {
    async fn file(
        State(files): State<HashMap<String, Vec<u8>>>,
        Path(name): Path<String>,
    ) -> Result<Vec<u8>, StatusCode> {
        files.get(&name).cloned().ok_or(StatusCode::NOT_FOUND)
    }

    serve(
        Router::new()
            .route("/files/{name}", get(file))
            .with_state(files),
    )
    .await
}

pub async fn spawn_submission_service(ingest_token: &str) -> String {
    let db = Database::new(":memory:").expect("in-memory database");
    serve(build_router(AppState::new(db, Some(ingest_token.to_string())))).await
}

#[derive(Clone)]
struct NodeState {
    known: String,
    pending_polls: usize,
    outcome: TransactionOutcome,
    polls: Arc<AtomicUsize>,
}

/// Node gateway that answers `202` for the first `pending_polls` finalization
/// polls of `known`, then its `outcome`. Other hashes are `404`. Returns the
/// base url and the poll counter.
pub async fn spawn_node_server(
    known: TransactionHash,
    pending_polls: usize,
    outcome: TransactionOutcome,
) -> (String, Arc<AtomicUsize>) {
    async fn finalized(State(state): State<NodeState>, Path(hash): Path<String>) -> Response {
        if hash != state.known {
            return StatusCode::NOT_FOUND.into_response();
        }
        if state.polls.fetch_add(1, Ordering::SeqCst) < state.pending_polls {
            return StatusCode::ACCEPTED.into_response();
        }
        Json(state.outcome).into_response()
    }

    let polls = Arc::new(AtomicUsize::new(0));
    let state = NodeState {
        known: known.to_string(),
        pending_polls,
        outcome,
        polls: polls.clone(),
    };
    let base = serve(
        Router::new()
            .route("/v1/transactions/{hash}/finalized", get(finalized))
            .with_state(state),
    )
    .await;
    (base, polls)
}
