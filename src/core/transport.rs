// Transport layer: HEAD probes and streamed downloads over blocking reqwest

use reqwest::blocking::Client;
use reqwest::header::ETAG;
use std::io::Read;
use std::time::Duration;

use crate::error::Result;

/// Result of a HEAD check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadResponse {
    pub ok: bool,
    /// URL after redirects
    pub final_url: String,
    pub etag: Option<String>,
    pub status_code: u16,
}

/// A body being streamed from the server
pub struct Download {
    pub ok: bool,
    pub status_code: u16,
    pub content_length: Option<u64>,
    pub body: Box<dyn Read + Send>,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("ok", &self.ok)
            .field("status_code", &self.status_code)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Network access used by the crawler and the downloader
pub trait Transport: Send + Sync {
    fn head(&self, url: &str) -> Result<HeadResponse>;

    fn fetch(&self, url: &str) -> Result<Download>;
}

/// Transport backed by a blocking reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ruv-dl/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .timeout(None)
            .build()?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl Transport for HttpTransport {
    fn head(&self, url: &str) -> Result<HeadResponse> {
        let response = self.client.head(url).send()?;
        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .filter(|e| !e.is_empty());

        Ok(HeadResponse {
            ok: response.status().is_success(),
            final_url: response.url().to_string(),
            etag,
            status_code: response.status().as_u16(),
        })
    }

    fn fetch(&self, url: &str) -> Result<Download> {
        let response = self.client.get(url).send()?;
        Ok(Download {
            ok: response.status().is_success(),
            status_code: response.status().as_u16(),
            content_length: response.content_length(),
            body: Box::new(response),
        })
    }
}
