//! Record store connection settings and per-course category weights.

use anyhow::{Context, Result, bail};

use crate::fetch::auth::{ApiKey, StoreAuth, UrlParam};
use crate::fetch::{BasicClient, HttpClient};
use crate::grading::types::CategoryWeight;
use crate::infra::RestRecordStore;
use crate::services::record_store::RecordStore;

pub const DEFAULT_TABLE: &str = "grade_c";
const DEFAULT_HEADER: &str = "X-Public-Key";
const DEFAULT_QUERY_PARAM: &str = "public_key";

/// Connection settings for the REST record store.
///
/// Read from the environment (a `.env` file is honoured by the binary):
///
/// | Variable                  | Meaning                                  |
/// |---------------------------|------------------------------------------|
/// | `RECORD_STORE_URL`        | API base URL (required)                  |
/// | `RECORD_STORE_PROJECT_ID` | project identifier (required)            |
/// | `RECORD_STORE_PUBLIC_KEY` | public key, required unless auth is none |
/// | `RECORD_STORE_AUTH`       | `header` (default), `query` or `none`    |
/// | `RECORD_STORE_AUTH_NAME`  | header or query parameter name           |
/// | `RECORD_STORE_TABLE`      | table name, default `grade_c`            |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub base_url: String,
    pub project_id: String,
    pub public_key: Option<String>,
    pub auth: StoreAuth,
    pub table: String,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let base_url = get("RECORD_STORE_URL").context("RECORD_STORE_URL must be set")?;
        let project_id =
            get("RECORD_STORE_PROJECT_ID").context("RECORD_STORE_PROJECT_ID must be set")?;
        let public_key = get("RECORD_STORE_PUBLIC_KEY");
        let auth_name = get("RECORD_STORE_AUTH_NAME");

        let auth = match get("RECORD_STORE_AUTH")
            .map(|s| s.to_ascii_lowercase())
            .as_deref()
            .unwrap_or("header")
        {
            "header" => StoreAuth::Header {
                header_name: auth_name.unwrap_or_else(|| DEFAULT_HEADER.to_string()),
            },
            "query" => StoreAuth::UrlParam {
                param_name: auth_name.unwrap_or_else(|| DEFAULT_QUERY_PARAM.to_string()),
            },
            "none" => StoreAuth::None,
            other => bail!("RECORD_STORE_AUTH must be header, query or none (got '{other}')"),
        };

        if auth.requires_key() && public_key.is_none() {
            bail!("RECORD_STORE_PUBLIC_KEY must be set when RECORD_STORE_AUTH is not none");
        }

        Ok(Self {
            base_url,
            project_id,
            public_key,
            auth,
            table: get("RECORD_STORE_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
        })
    }

    /// Builds the REST store with the configured credentials applied.
    pub fn connect(&self) -> Result<Box<dyn RecordStore>> {
        let client = BasicClient::new().context("building HTTP client")?;
        let key = self.public_key.clone().unwrap_or_default();

        let store: Box<dyn RecordStore> = match &self.auth {
            StoreAuth::None => Box::new(self.rest(client)?),
            StoreAuth::Header { header_name } => {
                Box::new(self.rest(ApiKey::new(client, header_name, &key)?)?)
            }
            StoreAuth::UrlParam { param_name } => {
                Box::new(self.rest(UrlParam::new(client, param_name, &key)?)?)
            }
        };
        Ok(store)
    }

    fn rest<C: HttpClient>(&self, client: C) -> Result<RestRecordStore<C>> {
        RestRecordStore::new(client, &self.base_url, &self.project_id, &self.table)
            .context("configuring record store")
    }
}

/// Category weights for a course, in the order they were listed.
///
/// Stored as a JSON array on disk:
/// ```json
/// [
///   { "name": "Homework", "weight": 40 },
///   { "name": "Exam", "weight": 60 }
/// ]
/// ```
pub struct CategoryConfig {
    entries: Vec<CategoryWeight>,
}

impl CategoryConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading category weights from '{path}'"))?;
        Self::parse(&content).with_context(|| format!("parsing category weights in '{path}'"))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let entries: Vec<CategoryWeight> = serde_json::from_str(content)?;
        Ok(Self { entries })
    }

    pub fn categories(&self) -> &[CategoryWeight] {
        &self.entries
    }

    /// Sum of all weights, in percentage points.
    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|c| c.weight).sum()
    }
}
