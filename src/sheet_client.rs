// src/sheet_client.rs
use std::time::Duration;

use async_trait::async_trait;
use google_sheets4::api::Sheet;
use google_sheets4::oauth2::ServiceAccountAuthenticator;
use google_sheets4::{hyper, hyper_rustls, Sheets};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::data_types::Table;
use crate::secrets::SecretStore;

type Connector = hyper_rustls::HttpsConnector<hyper::client::HttpConnector>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SheetError {
    #[error("credential bundle is malformed: {0}")]
    CredentialMalformed(String),
    #[error("worksheet fetch failed: {0}")]
    FetchFailure(String),
}

impl SheetError {
    pub fn kind(&self) -> &'static str {
        match self {
            SheetError::CredentialMalformed(_) => "CredentialMalformed",
            SheetError::FetchFailure(_) => "FetchFailure",
        }
    }

    pub fn diagnostic(&self) -> &str {
        match self {
            SheetError::CredentialMalformed(msg) | SheetError::FetchFailure(msg) => msg,
        }
    }
}

/// Access to a remote spreadsheet: open a connection, then read worksheets from it.
///
/// `worksheet: None` addresses the default (first) worksheet. `ttl` is how old
/// a cached answer may be; `Duration::ZERO` asks for a fresh read.
#[async_trait]
pub trait SheetClient: Send + Sync {
    type Connection: Send + Sync;

    async fn open(&self) -> Result<Self::Connection, SheetError>;

    async fn read(
        &self,
        conn: &Self::Connection,
        worksheet: Option<&str>,
        ttl: Duration,
    ) -> Result<Table, SheetError>;
}

pub struct GoogleConnection {
    hub: Sheets<Connector>,
    spreadsheet_id: String,
}

impl GoogleConnection {
    async fn default_worksheet(&self) -> Result<String, SheetError> {
        let (_, spreadsheet) = self
            .hub
            .spreadsheets()
            .get(&self.spreadsheet_id)
            .doit()
            .await
            .map_err(|e| SheetError::FetchFailure(e.to_string()))?;

        first_worksheet(spreadsheet.sheets.unwrap_or_default())
    }
}

/// Title of the titled sheet with the lowest index; sheets without an index sort last.
pub fn first_worksheet(sheets: Vec<Sheet>) -> Result<String, SheetError> {
    sheets
        .into_iter()
        .filter_map(|sheet| sheet.properties)
        .filter(|props| props.title.is_some())
        .min_by_key(|props| props.index.unwrap_or(i32::MAX))
        .and_then(|props| props.title)
        .ok_or_else(|| SheetError::FetchFailure("spreadsheet has no worksheets".to_string()))
}

/// Google Sheets backed client. Holds no cache, so every read goes to the API.
#[derive(Debug, Clone)]
pub struct GoogleSheetClient {
    secrets: SecretStore,
}

impl GoogleSheetClient {
    pub fn new(secrets: SecretStore) -> Self {
        GoogleSheetClient { secrets }
    }
}

#[async_trait]
impl SheetClient for GoogleSheetClient {
    type Connection = GoogleConnection;

    #[instrument(skip(self))]
    async fn open(&self) -> Result<GoogleConnection, SheetError> {
        let bundle = self.secrets.gsheets()?;
        let spreadsheet_id = extract_spreadsheet_id(&bundle.spreadsheet)?.to_string();

        // Authenticate with the service account key
        let client = http_client()?;
        let auth = ServiceAccountAuthenticator::with_client(bundle.key, client.clone())
            .build()
            .await
            .map_err(|e| SheetError::CredentialMalformed(e.to_string()))?;

        debug!(%spreadsheet_id, "connection opened");
        Ok(GoogleConnection {
            hub: Sheets::new(client, auth),
            spreadsheet_id,
        })
    }

    #[instrument(skip(self, conn))]
    async fn read(
        &self,
        conn: &GoogleConnection,
        worksheet: Option<&str>,
        ttl: Duration,
    ) -> Result<Table, SheetError> {
        let title = match worksheet {
            Some(name) => name.to_string(),
            None => conn.default_worksheet().await?,
        };

        let range = quote_sheet_title(&title);
        let (_, response) = conn
            .hub
            .spreadsheets()
            .values_get(&conn.spreadsheet_id, &range)
            .doit()
            .await
            .map_err(|e| SheetError::FetchFailure(e.to_string()))?;

        let table = Table::from_grid(response.values.unwrap_or_default());
        debug!(%title, ?ttl, rows = table.len(), "worksheet read");
        Ok(table)
    }
}

fn http_client() -> Result<hyper::Client<Connector>, SheetError> {
    let connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_native_roots()
        .map_err(|e| SheetError::FetchFailure(format!("no native TLS roots: {e}")))?
        .https_or_http()
        .enable_http1()
        .build();
    Ok(hyper::Client::builder().build(connector))
}

/// Accepts either a bare spreadsheet id or a URL such as
/// `https://docs.google.com/spreadsheets/d/[SPREADSHEET_ID]/edit`.
pub fn extract_spreadsheet_id(spreadsheet: &str) -> Result<&str, SheetError> {
    let spreadsheet = spreadsheet.trim();
    if !spreadsheet.contains('/') {
        return Ok(spreadsheet);
    }

    let parts: Vec<&str> = spreadsheet.split('/').collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "d" && i + 1 < parts.len() && !parts[i + 1].is_empty() {
            return Ok(parts[i + 1]);
        }
    }

    Err(SheetError::CredentialMalformed(format!(
        "invalid spreadsheet URL: {spreadsheet}"
    )))
}

/// A1 range covering a whole worksheet.
pub fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}
