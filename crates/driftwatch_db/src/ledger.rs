//! Ledger read/write operations.

use crate::error::{DbError, Result};
use crate::types::{format_date, parse_date, IngestedFileRecord, ScoreRecord};
use crate::LedgerDb;
use sqlx::Row;
use std::collections::BTreeSet;

impl LedgerDb {
    // ========================================================================
    // Ingested-file ledger
    // ========================================================================

    /// Basenames recorded by the most recent ingestion run.
    ///
    /// Empty table yields an empty set, not an error.
    pub async fn read_ingested_files(&self) -> Result<BTreeSet<String>> {
        let rows = sqlx::query("SELECT file FROM ingested_files")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| row.get::<String, _>("file"))
            .collect())
    }

    /// Replace the ingested-file ledger with a new batch.
    ///
    /// The table reflects only the most recent ingestion run, so the old
    /// batch is deleted in the same transaction that writes the new one.
    /// Reserved for the ingestion collaborator and tests; the controller
    /// only reads this ledger.
    pub async fn replace_ingested_files(&self, records: &[IngestedFileRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM ingested_files")
            .execute(&mut *tx)
            .await?;

        for record in records {
            sqlx::query("INSERT INTO ingested_files (date, file) VALUES (?, ?)")
                .bind(format_date(&record.recorded_at))
                .bind(&record.file)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // ========================================================================
    // Score-history ledger
    // ========================================================================

    /// Full score history, ascending by timestamp.
    ///
    /// Rows sharing a timestamp keep insertion order. Empty table yields an
    /// empty vec, not an error.
    pub async fn read_score_history(&self) -> Result<Vec<ScoreRecord>> {
        let rows = sqlx::query("SELECT date, score FROM model_score ORDER BY date ASC, rowid ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let raw: String = row.get("date");
                let recorded_at = parse_date(&raw).map_err(|err| {
                    DbError::corrupt(format!("model_score date '{raw}': {err}"))
                })?;
                Ok(ScoreRecord {
                    recorded_at,
                    score: row.get("score"),
                })
            })
            .collect()
    }

    /// Append one score record.
    ///
    /// Reserved for the scoring collaborator and tests; the controller never
    /// appends, it only re-reads the history after the scoring stage ran.
    pub async fn append_score(&self, record: &ScoreRecord) -> Result<()> {
        sqlx::query("INSERT INTO model_score (date, score) VALUES (?, ?)")
            .bind(format_date(&record.recorded_at))
            .bind(record.score)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
