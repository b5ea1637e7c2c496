use crate::error::DirectoryError;

pub const STORE_URL_VAR: &str = "DIRECTORY_STORE_URL";
pub const STORE_KEY_VAR: &str = "DIRECTORY_STORE_KEY";
pub const STORE_TABLE_VAR: &str = "DIRECTORY_STORE_TABLE";
pub const GEOCODER_URL_VAR: &str = "DIRECTORY_GEOCODER_URL";

/// Table queried when `DIRECTORY_STORE_TABLE` is not set.
pub const DEFAULT_TABLE: &str = "businesses";

/// Connection settings for the hosted record store.
#[derive(Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub access_key: String,
    pub table: String,
}

// Keep the access key out of logs.
impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("base_url", &self.base_url)
            .field("access_key", &"<redacted>")
            .field("table", &self.table)
            .finish()
    }
}

impl StoreConfig {
    /// Read settings through `lookup`. Base URL and access key are both
    /// required; blank values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DirectoryError> {
        let read = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let missing: Vec<&str> = [STORE_URL_VAR, STORE_KEY_VAR]
            .into_iter()
            .filter(|&name| read(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(DirectoryError::Configuration(format!(
                "set {}",
                missing.join(" and ")
            )));
        }

        let base_url = read(STORE_URL_VAR).unwrap_or_default();
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key: read(STORE_KEY_VAR).unwrap_or_default(),
            table: read(STORE_TABLE_VAR).unwrap_or_else(|| DEFAULT_TABLE.to_string()),
        })
    }
}

/// Geocoder endpoint for address suggestions, if one is configured.
pub fn geocoder_url(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    lookup(GEOCODER_URL_VAR)
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
}

/// Load a `.env` file from the working directory or its parents, if any.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {e}"),
    }
}
