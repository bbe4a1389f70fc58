use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::table::SheetTable;
use crate::{RecordStore, StoreError};

/// Wire payload of the sheet service: the header row is the first element
/// of `values`, data rows follow.
#[derive(Debug, Serialize, Deserialize)]
struct TablePayload {
    values: Vec<Vec<String>>,
}

/// HTTP client for the remote sheet service.
///
/// Tables are addressed by name under the configured base URL and
/// authenticated with the service-account bearer token minted outside this
/// process. Transport failures and non-success statuses surface as
/// `StoreError` to the triggering request; nothing here retries.
pub struct RemoteSheetStore {
    client: reqwest::Client,
    base_url: String,
    access_token: SecretString,
}

impl RemoteSheetStore {
    pub fn new(
        base_url: impl Into<String>,
        access_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url: String = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self { client, base_url, access_token })
    }

    fn table_url(&self, name: &str) -> String {
        format!("{}/tables/{name}/values", self.base_url)
    }
}

#[async_trait]
impl RecordStore for RemoteSheetStore {
    async fn read_table(&self, name: &str) -> Result<Option<SheetTable>, StoreError> {
        let response = self
            .client
            .get(self.table_url(name))
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StoreError::RemoteStatus {
                table: name.to_string(),
                status: response.status().as_u16(),
            });
        }

        let payload: TablePayload = response.json().await?;
        let mut values = payload.values.into_iter();
        let headers = values.next().unwrap_or_default();

        Ok(Some(SheetTable { headers, rows: values.collect() }))
    }

    async fn overwrite_table(&self, name: &str, table: &SheetTable) -> Result<(), StoreError> {
        let mut values = Vec::with_capacity(table.rows.len() + 1);
        values.push(table.headers.clone());
        values.extend(table.rows.iter().cloned());

        let response = self
            .client
            .put(self.table_url(name))
            .bearer_auth(self.access_token.expose_secret())
            .json(&TablePayload { values })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::RemoteStatus {
                table: name.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}
