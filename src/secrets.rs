// src/secrets.rs
use config::{Config, ConfigError, File, FileFormat};
use serde_json::{Map, Value};
use tracing::{info, instrument};
use google_sheets4::oauth2::ServiceAccountKey;

use crate::sheet_client::SheetError;

pub const SECRETS_PATH_VAR: &str = "LAB_MANAGER_SECRETS";
pub const DEFAULT_SECRETS_PATH: &str = "secrets.toml";

const GSHEETS_SECTION: &str = "connections.gsheets";

/// Read-only view over the secrets file.
#[derive(Debug, Clone, Default)]
pub struct SecretStore {
    config: Config,
}

impl SecretStore {
    pub fn empty() -> Self {
        SecretStore::default()
    }

    /// Loads a TOML secrets file. A missing file gives an empty store.
    #[instrument]
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .build()?;
        let store = SecretStore { config };
        info!(gsheets = store.has_gsheets_secrets(), "secrets loaded");
        Ok(store)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?;
        Ok(SecretStore { config })
    }

    pub fn has_gsheets_secrets(&self) -> bool {
        self.config.get_table(GSHEETS_SECTION).is_ok()
    }

    /// Extracts the `connections.gsheets` credential bundle.
    pub fn gsheets(&self) -> Result<CredentialBundle, SheetError> {
        let fields: Map<String, Value> = self
            .config
            .get(GSHEETS_SECTION)
            .map_err(|e| SheetError::CredentialMalformed(e.to_string()))?;
        CredentialBundle::from_fields(fields)
    }
}

/// Service-account key material plus the spreadsheet it unlocks.
#[derive(Debug, Clone)]
pub struct CredentialBundle {
    pub spreadsheet: String,
    pub key: ServiceAccountKey,
}

impl CredentialBundle {
    fn from_fields(mut fields: Map<String, Value>) -> Result<Self, SheetError> {
        let spreadsheet = match fields.remove("spreadsheet") {
            Some(Value::String(s)) if !s.trim().is_empty() => s,
            _ => {
                return Err(SheetError::CredentialMalformed(
                    "`spreadsheet` must name the spreadsheet URL or id".to_string(),
                ))
            }
        };

        let mut key: ServiceAccountKey = serde_json::from_value(Value::Object(fields))
            .map_err(|e| SheetError::CredentialMalformed(e.to_string()))?;
        key.private_key = restore_newlines(&key.private_key);
        check_pem(&key.private_key).map_err(SheetError::CredentialMalformed)?;

        Ok(CredentialBundle { spreadsheet, key })
    }
}

/// Turns two-character `\n` escapes back into line breaks.
pub fn restore_newlines(flattened: &str) -> String {
    flattened.replace("\\n", "\n")
}

pub fn check_pem(key: &str) -> Result<(), String> {
    let lines: Vec<&str> = key.trim().lines().map(str::trim).collect();
    let (Some(first), Some(last)) = (lines.first(), lines.last()) else {
        return Err("private key is empty".to_string());
    };

    if !first.starts_with("-----BEGIN ") {
        return Err("private key is missing its BEGIN marker".to_string());
    }
    if lines.len() < 3 {
        return Err("private key is on a single line; line breaks were lost".to_string());
    }
    if !last.starts_with("-----END ") {
        return Err("private key is missing its END marker".to_string());
    }
    Ok(())
}
