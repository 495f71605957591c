//! Ledger store for the driftwatch pipeline
//!
//! This crate provides the single source of truth for the two provenance
//! ledgers the controller reasons about: the ingested-file ledger (replaced
//! wholesale per ingestion run) and the score-history ledger (append-only).
//!
//! # Usage
//!
//! ```rust,ignore
//! use driftwatch_db::{LedgerDb, Result};
//!
//! let db = LedgerDb::open("db/pipeline.sqlite3").await?;
//! let known = db.read_ingested_files().await?;
//! let history = db.read_score_history().await?;
//! ```
//!
//! Callers are expected to open a connection per operation batch and close
//! it afterwards; nothing in this crate holds a connection across a
//! multi-step pipeline sequence, so appends committed by another process
//! between two opens are visible to the later one.

mod error;
mod ledger;
mod schema;
mod types;

pub use error::{DbError, Result};
pub use types::{format_date, parse_date, IngestedFileRecord, ScoreRecord, DATE_FORMAT};

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

/// Handle to the ledger database.
///
/// All ledger reads and writes go through this type; no raw sqlx elsewhere.
#[derive(Clone, Debug)]
pub struct LedgerDb {
    pool: SqlitePool,
}

impl LedgerDb {
    /// Open or create the ledger database at the given path.
    ///
    /// Creates both ledger tables if they don't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let url = format!("sqlite:{}?mode=rwc", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;

        info!(path = %path.display(), "Ledger database opened");

        Ok(db)
    }

    /// Open an existing ledger database (fails if not exists).
    ///
    /// No schema creation happens here: a database missing its tables will
    /// surface an error on the first read, which callers treat as the
    /// ledger being unavailable.
    pub async fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DbError::NotFound(format!(
                "Ledger database not found: {}",
                path.display()
            )));
        }

        let url = format!("sqlite:{}?mode=rw", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await?;

        Ok(Self { pool })
    }

    /// Get the underlying connection pool (escape hatch for ad-hoc queries).
    ///
    /// Prefer the typed ledger methods instead.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
