use std::cell::{Cell as StdCell, RefCell};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use seatable_sync::batch::{clear_table, insert_rows};
use seatable_sync::config::{ExcelSource, FieldType, SyncProfile, TableSpec, TargetTable};
use seatable_sync::error::{Result, SyncError};
use seatable_sync::io::excel_read;
use seatable_sync::model::{Cell, OutputRecord, RemoteRow};
use seatable_sync::seatable::TableStore;
use seatable_sync::sync;
use tempfile::tempdir;

/// In-memory table store recording every call, with optional failure
/// injection by call index.
#[derive(Default)]
struct FakeStore {
    rows: RefCell<BTreeMap<String, Vec<RemoteRow>>>,
    append_chunks: RefCell<Vec<Vec<OutputRecord>>>,
    delete_chunks: RefCell<Vec<Vec<String>>>,
    fail_delete_calls: Vec<usize>,
    fail_append_calls: Vec<usize>,
    delete_calls: StdCell<usize>,
    append_calls: StdCell<usize>,
    next_id: StdCell<usize>,
    fail_table_names: bool,
}

impl FakeStore {
    fn with_rows(table: &str, count: usize) -> Self {
        let store = FakeStore::default();
        store.seed(table, count);
        store
    }

    fn seed(&self, table: &str, count: usize) {
        let mut rows = self.rows.borrow_mut();
        let entry = rows.entry(table.to_string()).or_default();
        for _ in 0..count {
            let id = self.next_id.get();
            self.next_id.set(id + 1);
            entry.push(RemoteRow {
                id: format!("row-{id}"),
            });
        }
    }

    fn remote_error() -> SyncError {
        SyncError::Api {
            status: 500,
            message: "injected failure".to_string(),
        }
    }
}

impl TableStore for FakeStore {
    fn list_rows(&self, table: &str) -> Result<Vec<RemoteRow>> {
        Ok(self.rows.borrow().get(table).cloned().unwrap_or_default())
    }

    fn batch_delete_rows(&self, table: &str, row_ids: &[String]) -> Result<()> {
        let call = self.delete_calls.get();
        self.delete_calls.set(call + 1);
        if self.fail_delete_calls.contains(&call) {
            return Err(Self::remote_error());
        }
        self.delete_chunks.borrow_mut().push(row_ids.to_vec());
        if let Some(rows) = self.rows.borrow_mut().get_mut(table) {
            rows.retain(|row| !row_ids.contains(&row.id));
        }
        Ok(())
    }

    fn batch_append_rows(&self, table: &str, records: &[OutputRecord]) -> Result<()> {
        let call = self.append_calls.get();
        self.append_calls.set(call + 1);
        if self.fail_append_calls.contains(&call) {
            return Err(Self::remote_error());
        }
        self.append_chunks.borrow_mut().push(records.to_vec());
        self.seed(table, records.len());
        Ok(())
    }

    fn table_names(&self) -> Result<Vec<String>> {
        if self.fail_table_names {
            return Err(Self::remote_error());
        }
        Ok(self.rows.borrow().keys().cloned().collect())
    }
}

fn record(value: u32) -> OutputRecord {
    OutputRecord::from([("value".to_string(), value.to_string())])
}

#[test]
fn insert_chunks_respect_size_and_order() {
    let store = FakeStore::default();
    let records: Vec<_> = (0..250).map(record).collect();

    let outcomes = insert_rows(&store, "Revenue", &records, 100);

    let sizes: Vec<_> = outcomes.iter().map(|chunk| chunk.rows).collect();
    assert_eq!(sizes, [100, 100, 50]);
    assert!(outcomes.iter().all(|chunk| chunk.succeeded()));

    // Concatenating the issued chunks reproduces the input exactly once.
    let submitted: Vec<_> = store
        .append_chunks
        .borrow()
        .iter()
        .flatten()
        .cloned()
        .collect();
    assert_eq!(submitted, records);
}

#[test]
fn insert_continues_past_a_failed_chunk() {
    let store = FakeStore {
        fail_append_calls: vec![1],
        ..FakeStore::default()
    };
    let records: Vec<_> = (0..250).map(record).collect();

    let outcomes = insert_rows(&store, "Revenue", &records, 100);

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].succeeded());
    assert!(!outcomes[1].succeeded());
    assert!(outcomes[2].succeeded());
    // The failed middle chunk is not retried; the rest still landed.
    assert_eq!(store.append_chunks.borrow().len(), 2);
}

#[test]
fn clear_leaves_a_healthy_table_empty() {
    let store = FakeStore::with_rows("Revenue", 250);

    let report = clear_table(&store, "Revenue", 100).expect("clear succeeded");

    assert_eq!(report.initial_rows, 250);
    let sizes: Vec<_> = report.chunks.iter().map(|chunk| chunk.rows).collect();
    assert_eq!(sizes, [100, 100, 50]);
    assert_eq!(report.remaining_after_chunks, 0);
    assert!(report.retry.is_none());
    assert!(report.is_clean());
    assert!(store.list_rows("Revenue").expect("list succeeded").is_empty());
}

#[test]
fn clear_of_an_empty_table_is_a_no_op() {
    let store = FakeStore::default();
    let report = clear_table(&store, "Revenue", 100).expect("clear succeeded");
    assert_eq!(report.initial_rows, 0);
    assert!(report.chunks.is_empty());
    assert_eq!(store.delete_calls.get(), 0);
}

#[test]
fn clear_retries_leftover_rows_exactly_once() {
    // First delete call fails, so its rows survive the chunked pass and are
    // picked up by the single unchunked retry.
    let store = FakeStore {
        fail_delete_calls: vec![0],
        ..FakeStore::default()
    };
    store.seed("Revenue", 150);

    let report = clear_table(&store, "Revenue", 100).expect("clear succeeded");

    assert_eq!(report.initial_rows, 150);
    assert!(!report.chunks[0].succeeded());
    assert!(report.chunks[1].succeeded());
    assert_eq!(report.remaining_after_chunks, 100);
    let retry = report.retry.as_ref().expect("retry issued");
    assert_eq!(retry.rows, 100);
    assert!(retry.succeeded());
    assert!(!report.is_clean());
    assert!(store.list_rows("Revenue").expect("list succeeded").is_empty());
}

#[test]
fn clear_retry_failures_are_recorded_not_raised() {
    let store = FakeStore {
        fail_delete_calls: vec![0, 1],
        ..FakeStore::default()
    };
    store.seed("Revenue", 50);

    let report = clear_table(&store, "Revenue", 100).expect("clear still succeeds");
    let retry = report.retry.expect("retry issued");
    assert!(!retry.succeeded());
    assert_eq!(
        store.list_rows("Revenue").expect("list succeeded").len(),
        50
    );
}

fn write_fixture_workbook(path: &Path) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Sales").expect("sheet named");

    // Row 0 is a title banner, skipped via start_row = 2.
    worksheet
        .write_string(0, 0, "Quarterly revenue")
        .expect("title written");
    worksheet.write_string(1, 0, "Amount").expect("header written");
    worksheet.write_string(1, 1, "Booked").expect("header written");
    worksheet.write_string(1, 2, "Customer").expect("header written");

    worksheet.write_number(2, 0, 1234.5).expect("cell written");
    worksheet
        .write_string(2, 1, "2025-01-03")
        .expect("cell written");
    worksheet.write_string(2, 2, "ACME").expect("cell written");

    worksheet.write_string(3, 0, "N/A").expect("cell written");
    worksheet
        .write_string(3, 1, "2025/02/10")
        .expect("cell written");
    worksheet.write_string(3, 2, "Globex").expect("cell written");

    workbook.save(path).expect("workbook saved");
}

fn revenue_spec() -> TableSpec {
    TableSpec {
        seatable: TargetTable {
            table_name: "Revenue".to_string(),
        },
        excel_sheet: "Sales".to_string(),
        start_row: 2,
        field_mappings: BTreeMap::from([
            ("Amount".to_string(), "amount".to_string()),
            ("Booked".to_string(), "booked_on".to_string()),
            ("Customer".to_string(), "customer".to_string()),
        ]),
        data_types: BTreeMap::from([
            ("amount".to_string(), FieldType::Number),
            ("booked_on".to_string(), FieldType::Date),
        ]),
    }
}

fn fixture_path(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("report.xlsx");
    write_fixture_workbook(&path);
    path
}

#[test]
fn read_sheet_honours_the_start_row_offset() {
    let dir = tempdir().expect("temporary directory");
    let path = fixture_path(&dir);

    let rows = excel_read::read_sheet(&path, "Sales", 2).expect("sheet read");
    assert_eq!(rows.len(), 2);
    assert!(rows[0].contains_key("Amount"));
    assert!(rows[0].contains_key("Customer"));
}

#[test]
fn whitespace_only_text_cells_are_not_treated_as_missing() {
    let dir = tempdir().expect("temporary directory");
    let path = dir.path().join("notes.xlsx");

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Notes").expect("sheet named");
    worksheet.write_string(0, 0, "Note").expect("header written");
    worksheet.write_string(0, 1, "Blank").expect("header written");
    worksheet.write_string(1, 0, "  ").expect("cell written");
    worksheet.write_string(1, 1, "").expect("cell written");
    workbook.save(&path).expect("workbook saved");

    let rows = excel_read::read_sheet(&path, "Notes", 1).expect("sheet read");
    assert_eq!(rows.len(), 1);
    // Whitespace keeps its plain string form; only truly empty cells are
    // missing values.
    assert_eq!(rows[0].get("Note"), Some(&Cell::Text("  ".to_string())));
    assert!(rows[0].get("Blank").map_or(true, Cell::is_empty));
}

#[test]
fn sync_table_clears_transforms_and_reloads() {
    let dir = tempdir().expect("temporary directory");
    let path = fixture_path(&dir);

    let store = FakeStore::with_rows("Revenue", 3);
    let report = sync::sync_table(&store, &revenue_spec(), &path, 100);

    assert!(report.error.is_none());
    assert_eq!(report.source_rows, 2);
    assert_eq!(report.clear.as_ref().expect("cleared").initial_rows, 3);
    assert!(report.succeeded());

    let appended = store.append_chunks.borrow();
    assert_eq!(appended.len(), 1);
    assert_eq!(appended[0][0]["amount"], "1,234.50");
    assert_eq!(appended[0][0]["booked_on"], "2025-01-03");
    assert_eq!(appended[0][0]["customer"], "ACME");
    assert_eq!(appended[0][1]["amount"], "N/A");
    assert_eq!(appended[0][1]["booked_on"], "2025-02-10");

    // The pre-existing rows were replaced by the reload.
    assert_eq!(store.list_rows("Revenue").expect("list succeeded").len(), 2);
}

#[test]
fn a_failing_table_does_not_stop_the_profile() {
    let dir = tempdir().expect("temporary directory");
    let path = fixture_path(&dir);

    let mut broken_spec = revenue_spec();
    broken_spec.excel_sheet = "Nowhere".to_string();
    broken_spec.seatable.table_name = "Broken".to_string();

    let profile = SyncProfile {
        chunk_size: 100,
        excel: ExcelSource {
            file_path: path.display().to_string(),
        },
        tables: vec![broken_spec, revenue_spec()],
    };

    let store = FakeStore::default();
    let report = sync::sync_profile(&store, &profile);

    assert_eq!(report.tables.len(), 2);
    assert!(report.tables[0].error.is_some());
    assert!(report.tables[1].error.is_none());
    assert_eq!(report.tables[1].source_rows, 2);
    assert!(!report.succeeded());
}

#[test]
fn metadata_fetch_failure_does_not_block_the_run() {
    let dir = tempdir().expect("temporary directory");
    let path = fixture_path(&dir);

    let store = FakeStore {
        fail_table_names: true,
        ..FakeStore::default()
    };
    let profile = SyncProfile {
        chunk_size: 100,
        excel: ExcelSource {
            file_path: path.display().to_string(),
        },
        tables: vec![revenue_spec()],
    };

    let report = sync::sync_profile(&store, &profile);
    assert!(report.succeeded());
}
