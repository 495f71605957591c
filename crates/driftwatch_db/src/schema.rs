//! Ledger schema creation.
//!
//! All CREATE TABLE statements live here - single source of truth.

use crate::error::Result;
use crate::LedgerDb;
use tracing::info;

impl LedgerDb {
    /// Ensure both ledger tables exist.
    pub(crate) async fn ensure_schema(&self) -> Result<()> {
        // WAL keeps concurrent stage processes from blocking reads
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&self.pool)
            .await?;
        sqlx::query("PRAGMA synchronous=NORMAL")
            .execute(&self.pool)
            .await?;

        // Files merged by the most recent ingestion run. Replaced wholesale
        // per run, so the table never reflects more than one batch.
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS ingested_files (
                date TEXT NOT NULL,
                file TEXT NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        // Score history. Append-only, one row per scoring invocation.
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS model_score (
                date TEXT NOT NULL,
                score REAL NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_model_score_date ON model_score(date)")
            .execute(&self.pool)
            .await?;

        info!("Ledger schema verified");
        Ok(())
    }
}
