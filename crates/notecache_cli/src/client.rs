//! Blocking HTTP client for the remote gateway.

use notecache_sync::HttpClient;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::time::Duration;

const CBOR: &str = "application/cbor";

/// `HttpClient` backed by `reqwest`'s blocking client.
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    /// Builds a client with a per-request timeout.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("notecache/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, String> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, CBOR)
            .header(ACCEPT, CBOR)
            .body(body)
            .send()
            .and_then(|res| res.error_for_status())
            .map_err(|e| e.to_string())?;
        response
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|e| e.to_string())
    }
}
