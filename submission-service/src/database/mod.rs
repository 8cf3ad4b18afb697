pub mod constants;
pub mod migrator;
pub mod models;
pub mod operations;
pub mod path;
pub mod sql;

use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub use migrator::run_migrations;

/// Database manager for the submission service
pub struct Database {
    connection: Mutex<Connection>,
}

impl Database {
    /// Open the database at `db_path` and run migrations
    pub fn new(db_path: &str) -> Result<Self> {
        info!("Initializing database at {:?}", db_path);
        let location = path::resolve_store_location(db_path)?;

        let mut connection = location.open()?;
        run_migrations(&mut connection)?;

        info!("Database initialized successfully");
        Ok(Database {
            connection: Mutex::new(connection),
        })
    }

    /// Exclusive access to the single shared connection
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.connection.lock().expect("database mutex poisoned")
    }
}
