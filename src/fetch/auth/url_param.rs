use crate::fetch::HttpClient;
use anyhow::{Result, bail};
use async_trait::async_trait;
use reqwest::Url;

/// An [`HttpClient`] wrapper that appends the store's public key as a URL query parameter.
pub struct UrlParam<C> {
    inner: C,
    param_name: String,
    key: String,
}

impl<C> UrlParam<C> {
    pub fn new(inner: C, param_name: &str, key: &str) -> Result<Self> {
        if param_name.is_empty() {
            bail!("query parameter name for the public key is empty");
        }
        Ok(Self {
            inner,
            param_name: param_name.to_string(),
            key: key.to_string(),
        })
    }

    fn sign(&self, url: &mut Url) {
        url.query_pairs_mut()
            .append_pair(&self.param_name, &self.key);
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for UrlParam<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.sign(req.url_mut());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_param_name() {
        assert!(UrlParam::new((), "", "k").is_err());
    }

    #[test]
    fn test_keeps_existing_query_and_escapes_key() {
        let auth = UrlParam::new((), "public_key", "a b&c").unwrap();
        let mut url: Url = "https://records.example.com/records/1?fields=Name".parse().unwrap();
        auth.sign(&mut url);
        assert_eq!(url.query(), Some("fields=Name&public_key=a+b%26c"));
    }
}
