//! Credential decorators for [`HttpClient`](crate::fetch::HttpClient).

mod api_key;
mod url_param;

pub use api_key::ApiKey;
pub use url_param::UrlParam;

/// Describes how the record store expects the public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAuth {
    /// No key is sent.
    None,
    /// Key is sent as an HTTP header with the given name.
    Header { header_name: String },
    /// Key is appended as a URL query parameter with the given name.
    UrlParam { param_name: String },
}

impl StoreAuth {
    /// Returns `true` if a key must accompany each request.
    pub fn requires_key(&self) -> bool {
        !matches!(self, StoreAuth::None)
    }
}
