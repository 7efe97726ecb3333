use serde::Deserialize;
use tracing::debug;

use crate::models::Row;
use crate::source::SourceError;

#[derive(Debug, Deserialize)]
struct RecordPage {
    #[serde(default)]
    records: Vec<AirtableRecord>,
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AirtableRecord {
    #[serde(default)]
    fields: Row,
}

/// Read-only client for the Airtable REST API.
#[derive(Debug, Clone)]
pub struct AirtableClient {
    http: reqwest::Client,
    api_url: String,
    base_id: String,
    api_key: String,
}

impl AirtableClient {
    pub fn new(
        api_url: impl Into<String>,
        base_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            base_id: base_id.into(),
            api_key: api_key.into(),
        }
    }

    /// Every record of `table`, following pagination to the end.
    pub async fn fetch_all(&self, table: &str) -> Result<Vec<Row>, SourceError> {
        let url = format!("{}/{}/{}", self.api_url, self.base_id, table);
        let mut rows = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut request = self.http.get(&url).bearer_auth(&self.api_key);
            if let Some(offset) = &offset {
                request = request.query(&[("offset", offset)]);
            }
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(SourceError::Status {
                    table: table.to_string(),
                    status: status.as_u16(),
                    body,
                });
            }

            let body = response.text().await?;
            let (page, next) = decode_page(&body)?;
            debug!(table, records = page.len(), "fetched airtable page");
            rows.extend(page);

            match next {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(rows)
    }
}

/// Flattens one list-records response into its `fields` maps plus the
/// continuation offset.
pub fn decode_page(body: &str) -> Result<(Vec<Row>, Option<String>), SourceError> {
    let page: RecordPage = serde_json::from_str(body)?;
    let rows = page.records.into_iter().map(|record| record.fields).collect();
    Ok((rows, page.offset))
}
