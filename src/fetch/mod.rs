//! HTTP transport used by the REST record store.

mod basic;
pub mod auth;

pub use basic::BasicClient;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request, Response, Url};
use serde::Serialize;

/// Sends a prepared request.
///
/// Credentials are added by decorators in [`auth`] that wrap an inner client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

/// Builds a request carrying `body` serialized as JSON.
pub fn json_request<T: Serialize + ?Sized>(
    method: Method,
    url: Url,
    body: &T,
) -> serde_json::Result<Request> {
    let bytes = serde_json::to_vec(body)?;
    let mut req = Request::new(method, url);
    req.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    *req.body_mut() = Some(bytes.into());
    Ok(req)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_request_sets_body_and_content_type() {
        let url: Url = "http://localhost/records".parse().unwrap();
        let req = json_request(Method::POST, url, &serde_json::json!({"a": 1})).unwrap();

        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.headers()[CONTENT_TYPE], "application/json");
        let body = req.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, br#"{"a":1}"#);
    }
}
