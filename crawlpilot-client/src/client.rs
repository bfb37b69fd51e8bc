use crate::disposition::filename_from_content_disposition;
use crate::error::{ClientError, Result};
use crate::model::{CrawlRequest, CrawlResponse, DownloadRequest};
use reqwest::header::{ACCEPT, CONTENT_DISPOSITION};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";
/// Crawls of several pages with AI extraction routinely take minutes.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

const SCRAPE_PATH: &str = "api/scrape";
const DOWNLOAD_PATH: &str = "api/download";

/// Client for the scraping service's two endpoints.
#[derive(Debug, Clone)]
pub struct ScrapeClient {
    client: Client,
    base_url: Url,
    timeout_secs: u64,
}

impl ScrapeClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        // Joining relative paths needs a trailing slash on the base
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(concat!("crawlpilot/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs((timeout_secs / 2).clamp(1, 30)))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client,
            base_url,
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// `POST /api/scrape`. Single attempt, no retries.
    pub async fn scrape(&self, request: &CrawlRequest) -> Result<CrawlResponse> {
        let endpoint = self.endpoint(SCRAPE_PATH)?;
        info!(
            "Submitting crawl of {} (depth {}, max pages {})",
            request.url, request.depth, request.max_pages
        );

        let response = self
            .client
            .post(endpoint)
            .header(ACCEPT, "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = api_error_message(status, &body);
            warn!("Scrape API error ({}): {}", status.as_u16(), message);
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CrawlResponse = serde_json::from_str(&body)?;
        debug!("Scrape returned {} page(s)", parsed.data.len());
        Ok(parsed)
    }

    /// `POST /api/download`. The body is not read here; see
    /// [`DownloadResponse::save_to`].
    pub async fn download(&self, request: &DownloadRequest) -> Result<DownloadResponse> {
        let endpoint = self.endpoint(DOWNLOAD_PATH)?;
        info!(
            "Requesting {} download for {} ({} page(s))",
            request.format.as_str(),
            request.url,
            request.data.len()
        );

        let response = self.client.post(endpoint).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                ClientError::status_message(status.as_u16())
            } else {
                body
            };
            warn!("Download API error ({}): {}", status.as_u16(), message);
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let suggested_filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_content_disposition);
        debug!("Download suggested filename: {:?}", suggested_filename);

        Ok(DownloadResponse {
            suggested_filename,
            response,
        })
    }
}

/// A successful download whose body has not been consumed yet.
#[derive(Debug)]
pub struct DownloadResponse {
    pub suggested_filename: Option<String>,
    response: Response,
}

impl DownloadResponse {
    /// Stream the body into `path`, returning the number of bytes written.
    pub async fn save_to(mut self, path: &Path) -> Result<u64> {
        let mut file = tokio::fs::File::create(path).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = self.response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        info!("Saved {} bytes to {}", written, path.display());
        Ok(written)
    }
}

/// Error text for a non-2xx scrape response: the `detail` field when the body
/// carries one, otherwise a message built from the status code.
pub fn api_error_message(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned());

    match detail {
        Some(Value::String(s)) if !s.is_empty() => s,
        Some(Value::Null) | Some(Value::String(_)) | None => {
            ClientError::status_message(status.as_u16())
        }
        Some(other) => other.to_string(),
    }
}
