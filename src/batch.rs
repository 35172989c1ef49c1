//! Chunked remote delete and append.
//!
//! Remote batch APIs limit the rows accepted per call, and individual calls
//! fail from time to time. Both operations here submit bounded chunks
//! strictly in order and record the outcome of every chunk instead of
//! aborting on the first failure, so a run degrades per chunk rather than
//! globally.

use tracing::{info, warn};

use crate::error::Result;
use crate::model::OutputRecord;
use crate::seatable::TableStore;

/// Outcome of one submitted chunk: how many rows it carried, and the error
/// text when the remote call failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOutcome {
    pub rows: usize,
    pub error: Option<String>,
}

impl ChunkOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a full-table clear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearReport {
    /// Rows found in the table before deletion started.
    pub initial_rows: usize,
    /// One outcome per delete chunk, in submission order.
    pub chunks: Vec<ChunkOutcome>,
    /// Rows still present when the table was re-listed after the chunked
    /// pass. Zero on a healthy remote.
    pub remaining_after_chunks: usize,
    /// Outcome of the single unchunked retry over the remaining rows, when
    /// one was needed.
    pub retry: Option<ChunkOutcome>,
}

impl ClearReport {
    /// True when every delete call succeeded and nothing was left behind.
    pub fn is_clean(&self) -> bool {
        self.remaining_after_chunks == 0 && self.chunks.iter().all(ChunkOutcome::succeeded)
    }
}

/// Clears a remote table: chunked batch-deletes over all current row ids,
/// then one re-list and, if rows persist, exactly one unchunked batch-delete
/// over the remainder.
///
/// Chunk-level failures are recorded and do not stop the pass. Failures to
/// list the table propagate, since without the row ids there is nothing to
/// delete. Emptiness afterwards is best effort, reported rather than
/// guaranteed.
pub fn clear_table(store: &dyn TableStore, table: &str, chunk_size: usize) -> Result<ClearReport> {
    let rows = store.list_rows(table)?;
    if rows.is_empty() {
        info!(table, "table is already empty");
        return Ok(ClearReport::default());
    }

    let row_ids: Vec<String> = rows.into_iter().map(|row| row.id).collect();
    info!(table, rows = row_ids.len(), "deleting existing rows");

    let mut report = ClearReport {
        initial_rows: row_ids.len(),
        ..ClearReport::default()
    };

    for chunk in row_ids.chunks(chunk_size) {
        report.chunks.push(delete_chunk(store, table, chunk));
    }

    let remaining: Vec<String> = store
        .list_rows(table)?
        .into_iter()
        .map(|row| row.id)
        .collect();
    report.remaining_after_chunks = remaining.len();

    if remaining.is_empty() {
        info!(table, "table cleared");
    } else {
        warn!(
            table,
            rows = remaining.len(),
            "rows remain after delete pass, retrying once"
        );
        report.retry = Some(delete_chunk(store, table, &remaining));
    }

    Ok(report)
}

fn delete_chunk(store: &dyn TableStore, table: &str, row_ids: &[String]) -> ChunkOutcome {
    match store.batch_delete_rows(table, row_ids) {
        Ok(()) => ChunkOutcome {
            rows: row_ids.len(),
            error: None,
        },
        Err(error) => {
            warn!(table, rows = row_ids.len(), %error, "delete chunk failed");
            ChunkOutcome {
                rows: row_ids.len(),
                error: Some(error.to_string()),
            }
        }
    }
}

/// Appends records to a remote table in chunks of at most `chunk_size`,
/// preserving record order. A failed chunk is recorded and skipped; the
/// remaining chunks are still submitted.
pub fn insert_rows(
    store: &dyn TableStore,
    table: &str,
    records: &[OutputRecord],
    chunk_size: usize,
) -> Vec<ChunkOutcome> {
    let mut outcomes = Vec::new();
    for chunk in records.chunks(chunk_size) {
        match store.batch_append_rows(table, chunk) {
            Ok(()) => {
                info!(table, rows = chunk.len(), "appended chunk");
                outcomes.push(ChunkOutcome {
                    rows: chunk.len(),
                    error: None,
                });
            }
            Err(error) => {
                warn!(table, rows = chunk.len(), %error, "append chunk failed");
                outcomes.push(ChunkOutcome {
                    rows: chunk.len(),
                    error: Some(error.to_string()),
                });
            }
        }
    }
    outcomes
}
