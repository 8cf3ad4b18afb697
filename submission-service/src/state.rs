//! Shared application state

use std::sync::Arc;

use crate::database::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    /// Bearer token required by `POST /submissions`; ingestion is closed when unset.
    pub ingest_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(db: Database, ingest_token: Option<String>) -> Self {
        Self {
            db: Arc::new(db),
            ingest_token: ingest_token.map(Arc::from),
        }
    }
}
