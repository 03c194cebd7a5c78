use reqwest::{Client, header::CONTENT_TYPE, redirect};
use std::time::Duration;

/// User agent sent by every outbound lookup and download.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 integrity-grader/0.1";

/// Builds the HTTP client shared by source lookups and submission downloads.
///  - `timeout_secs` caps the whole request.
///  - Redirects are followed up to 10 hops.
pub fn build_client(timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .redirect(redirect::Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
}

/// Raw body of a downloaded document.
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    /// `Content-Type` header as sent by the server, if any.
    pub content_type: Option<String>,
}

/// Downloads `url`, failing on any non-2xx status. Decoding is left to the caller.
pub async fn fetch_document(client: &Client, url: &str) -> Result<Download, reqwest::Error> {
    let resp = client.get(url).send().await?.error_for_status()?;
    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = resp.bytes().await?.to_vec();
    Ok(Download {
        bytes,
        content_type,
    })
}
