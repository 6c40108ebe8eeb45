use crate::fetch::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects the store's public key as an HTTP header.
///
/// The header name and value are validated once in [`ApiKey::new`], so a
/// malformed key surfaces as a configuration error instead of a failed request.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    key: HeaderValue,
}

impl<C> ApiKey<C> {
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .with_context(|| format!("invalid header name '{header_name}'"))?;
        let mut key = HeaderValue::from_str(key).context("public key is not a valid header value")?;
        key.set_sensitive(true);

        Ok(Self {
            inner,
            header_name,
            key,
        })
    }

    /// Uses `Authorization: Bearer <key>`.
    pub fn bearer(inner: C, key: &str) -> Result<Self> {
        Self::new(inner, "Authorization", &format!("Bearer {key}"))
    }

    fn sign(&self, headers: &mut HeaderMap) {
        headers.insert(self.header_name.clone(), self.key.clone());
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.sign(req.headers_mut());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_header_name() {
        assert!(ApiKey::new((), "bad header", "k").is_err());
    }

    #[test]
    fn test_rejects_key_with_newline() {
        assert!(ApiKey::new((), "X-Public-Key", "abc\ndef").is_err());
    }

    #[test]
    fn test_sign_sets_sensitive_header() {
        let auth = ApiKey::new((), "X-Public-Key", "pk_123").unwrap();
        let mut headers = HeaderMap::new();
        auth.sign(&mut headers);

        let value = &headers["x-public-key"];
        assert_eq!(value.to_str().unwrap(), "pk_123");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_bearer_prefixes_key() {
        let auth = ApiKey::bearer((), "token").unwrap();
        let mut headers = HeaderMap::new();
        auth.sign(&mut headers);
        assert_eq!(headers["authorization"], "Bearer token");
    }
}
