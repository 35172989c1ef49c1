//! SeaTable remote table client.
//!
//! The sync pipeline only depends on the [`TableStore`] trait; the concrete
//! [`SeaTableClient`] speaks the dtable-server row API over blocking HTTP.

use reqwest::blocking::{Client, Response};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{Result, SyncError};
use crate::model::{OutputRecord, RemoteRow};

/// Remote table operations the sync pipeline relies on. All operations may
/// fail; callers decide which failures abort and which are tolerated.
pub trait TableStore {
    /// Lists the rows currently stored in a table.
    fn list_rows(&self, table: &str) -> Result<Vec<RemoteRow>>;

    /// Deletes the identified rows from a table in one call.
    fn batch_delete_rows(&self, table: &str, row_ids: &[String]) -> Result<()>;

    /// Appends the given records to a table in one call.
    fn batch_append_rows(&self, table: &str, records: &[OutputRecord]) -> Result<()>;

    /// Names of the tables available in the remote base.
    fn table_names(&self) -> Result<Vec<String>>;
}

/// Blocking HTTP client for a single SeaTable base.
///
/// Construction performs the app-access-token exchange, so a connected client
/// is always authenticated.
pub struct SeaTableClient {
    http: Client,
    dtable_server: String,
    dtable_uuid: String,
    access_token: String,
}

#[derive(Deserialize)]
struct AppAccessToken {
    access_token: String,
    dtable_uuid: String,
    dtable_server: String,
}

#[derive(Deserialize)]
struct ListRowsResponse {
    rows: Vec<RemoteRow>,
}

#[derive(Deserialize)]
struct MetadataResponse {
    metadata: Metadata,
}

#[derive(Deserialize)]
struct Metadata {
    tables: Vec<TableInfo>,
}

#[derive(Deserialize)]
struct TableInfo {
    name: String,
}

impl SeaTableClient {
    /// Exchanges the base-specific API token for an app access token and
    /// returns a client bound to that base.
    pub fn connect(server_url: &str, api_token: &str) -> Result<Self> {
        let http = Client::new();
        let url = format!(
            "{}/api/v2.1/dtable/app-access-token/",
            server_url.trim_end_matches('/')
        );
        debug!(%url, "requesting app access token");
        let response = http
            .get(&url)
            .header(AUTHORIZATION, format!("Token {api_token}"))
            .send()?;
        let grant: AppAccessToken = check(response)?.json()?;

        Ok(Self {
            http,
            dtable_server: grant.dtable_server.trim_end_matches('/').to_string(),
            dtable_uuid: grant.dtable_uuid,
            access_token: grant.access_token,
        })
    }

    fn rows_url(&self, suffix: &str) -> String {
        format!(
            "{}/api/v1/dtables/{}/{}",
            self.dtable_server, self.dtable_uuid, suffix
        )
    }

    fn bearer(&self) -> String {
        format!("Token {}", self.access_token)
    }
}

impl TableStore for SeaTableClient {
    fn list_rows(&self, table: &str) -> Result<Vec<RemoteRow>> {
        let response = self
            .http
            .get(self.rows_url("rows/"))
            .header(AUTHORIZATION, self.bearer())
            .query(&[("table_name", table)])
            .send()?;
        let body: ListRowsResponse = check(response)?.json()?;
        Ok(body.rows)
    }

    fn batch_delete_rows(&self, table: &str, row_ids: &[String]) -> Result<()> {
        let response = self
            .http
            .delete(self.rows_url("batch-delete-rows/"))
            .header(AUTHORIZATION, self.bearer())
            .json(&json!({ "table_name": table, "row_ids": row_ids }))
            .send()?;
        check(response)?;
        Ok(())
    }

    fn batch_append_rows(&self, table: &str, records: &[OutputRecord]) -> Result<()> {
        let response = self
            .http
            .post(self.rows_url("batch-append-rows/"))
            .header(AUTHORIZATION, self.bearer())
            .json(&json!({ "table_name": table, "rows": records }))
            .send()?;
        check(response)?;
        Ok(())
    }

    fn table_names(&self) -> Result<Vec<String>> {
        let response = self
            .http
            .get(self.rows_url("metadata/"))
            .header(AUTHORIZATION, self.bearer())
            .send()?;
        let body: MetadataResponse = check(response)?.json()?;
        Ok(body.metadata.tables.into_iter().map(|t| t.name).collect())
    }
}

fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().unwrap_or_default();
    Err(SyncError::Api {
        status: status.as_u16(),
        message,
    })
}
