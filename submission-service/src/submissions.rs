//! Handlers for ballot submission lookups and ingestion

use anyhow::Context;
use axum::{
    extract::{Path, State},
    response::Json,
};
use election_client::BallotSubmissionRecord;
use tracing::info;

use crate::{
    database::models::SubmissionRow,
    error::ApiError,
    state::AppState,
    types::IngestResponse,
    utils::{parse_account, parse_transaction_hash},
};

/// Handle GET /submission-status/{transaction_hash}
pub async fn get_submission_status(
    State(app_state): State<AppState>,
    Path(transaction_hash): Path<String>,
) -> Result<Json<Option<BallotSubmissionRecord>>, ApiError> {
    let hash = parse_transaction_hash(&transaction_hash)?;
    let row = SubmissionRow::get_by_hash(&app_state.db.connection(), &hash.to_string())?;
    let record = row
        .map(BallotSubmissionRecord::try_from)
        .transpose()
        .context("reading stored submission")?;
    Ok(Json(record))
}

/// Handle GET /submissions/{account}
pub async fn get_submissions(
    State(app_state): State<AppState>,
    Path(account): Path<String>,
) -> Result<Json<Vec<BallotSubmissionRecord>>, ApiError> {
    let account = parse_account(&account)?;
    let rows = SubmissionRow::list_by_account(&app_state.db.connection(), &account.to_string())?;
    let records = rows
        .into_iter()
        .map(BallotSubmissionRecord::try_from)
        .collect::<anyhow::Result<Vec<_>>>()
        .context("reading stored submissions")?;
    info!(
        "GET /submissions/{} - {} submissions",
        account,
        records.len()
    );
    Ok(Json(records))
}

/// Handle POST /submissions
pub async fn ingest_submissions(
    State(app_state): State<AppState>,
    Json(records): Json<Vec<BallotSubmissionRecord>>,
) -> Result<Json<IngestResponse>, ApiError> {
    let rows: Vec<SubmissionRow> = records.iter().map(SubmissionRow::from).collect();
    let inserted = SubmissionRow::upsert_batch(&mut app_state.db.connection(), &rows)?;
    info!("POST /submissions - stored {} submissions", inserted);
    Ok(Json(IngestResponse {
        status: "ok",
        inserted,
    }))
}
