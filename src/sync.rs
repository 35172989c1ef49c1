//! Per-table and per-profile sync orchestration.
//!
//! Every table runs clear → read → transform → insert. A table-level failure
//! is captured in the run report and the remaining tables still run; only the
//! report tells the operator how complete the run actually was.

use std::path::Path;

use tracing::{error, info, instrument, warn};

use crate::batch::{self, ChunkOutcome, ClearReport};
use crate::config::{SyncProfile, TableSpec};
use crate::error::Result;
use crate::io::excel_read;
use crate::seatable::TableStore;
use crate::transform::transform_rows;

/// Everything that happened while syncing one table.
#[derive(Debug, Clone, Default)]
pub struct TableReport {
    /// Target table name.
    pub table: String,
    /// Outcome of the clear phase, when it was reached.
    pub clear: Option<ClearReport>,
    /// Rows read from the source sheet.
    pub source_rows: usize,
    /// One outcome per append chunk, in submission order.
    pub inserts: Vec<ChunkOutcome>,
    /// Set when the table sync aborted before completing (unreadable sheet,
    /// failed row listing). Chunk-level failures do not set this.
    pub error: Option<String>,
}

impl TableReport {
    fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Self::default()
        }
    }

    /// Number of chunks (delete or append) that failed.
    pub fn failed_chunks(&self) -> usize {
        let clear_failures = self.clear.as_ref().map_or(0, |clear| {
            clear
                .chunks
                .iter()
                .chain(clear.retry.as_ref())
                .filter(|chunk| !chunk.succeeded())
                .count()
        });
        let insert_failures = self
            .inserts
            .iter()
            .filter(|chunk| !chunk.succeeded())
            .count();
        clear_failures + insert_failures
    }

    /// True when the table synced without any table-level or chunk-level
    /// failure.
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.failed_chunks() == 0
    }
}

/// Outcome of a full profile run, one entry per configured table.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub tables: Vec<TableReport>,
}

impl RunReport {
    /// True when every table synced cleanly.
    pub fn succeeded(&self) -> bool {
        self.tables.iter().all(TableReport::succeeded)
    }
}

/// Synchronises a single table: clear the target, read the source sheet,
/// transform the rows, and append them in chunks.
///
/// Never returns an error; failures end up in the report so that the
/// remaining tables of the profile still get their turn.
#[instrument(
    level = "info",
    skip_all,
    fields(table = %spec.seatable.table_name, sheet = %spec.excel_sheet)
)]
pub fn sync_table(
    store: &dyn TableStore,
    spec: &TableSpec,
    excel_path: &Path,
    chunk_size: usize,
) -> TableReport {
    info!("starting table sync");
    let mut report = TableReport::new(&spec.seatable.table_name);

    match run_table(store, spec, excel_path, chunk_size, &mut report) {
        Ok(()) => info!(rows = report.source_rows, "table sync completed"),
        Err(sync_error) => {
            error!(error = %sync_error, "table sync failed");
            report.error = Some(sync_error.to_string());
        }
    }

    report
}

fn run_table(
    store: &dyn TableStore,
    spec: &TableSpec,
    excel_path: &Path,
    chunk_size: usize,
    report: &mut TableReport,
) -> Result<()> {
    let table = &spec.seatable.table_name;

    report.clear = Some(batch::clear_table(store, table, chunk_size)?);

    info!(sheet = %spec.excel_sheet, "reading source sheet");
    let rows = excel_read::read_sheet(excel_path, &spec.excel_sheet, spec.start_row)?;
    report.source_rows = rows.len();

    let records = transform_rows(&rows, &spec.field_mappings, &spec.data_types);
    info!(rows = records.len(), "inserting transformed rows");
    report.inserts = batch::insert_rows(store, table, &records, chunk_size);

    Ok(())
}

/// Runs every table of a profile in declared order.
///
/// Starts with a best-effort log of the remote table inventory; a failure to
/// fetch it never blocks the sync.
#[instrument(level = "info", skip_all, fields(tables = profile.tables.len()))]
pub fn sync_profile(store: &dyn TableStore, profile: &SyncProfile) -> RunReport {
    match store.table_names() {
        Ok(names) => info!(?names, "remote tables available"),
        Err(fetch_error) => warn!(error = %fetch_error, "failed to fetch remote table inventory"),
    }

    let excel_path = Path::new(&profile.excel.file_path);
    let tables = profile
        .tables
        .iter()
        .map(|spec| sync_table(store, spec, excel_path, profile.chunk_size))
        .collect();

    RunReport { tables }
}
