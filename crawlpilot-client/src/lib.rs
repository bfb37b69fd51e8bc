pub mod client;
pub mod disposition;
pub mod error;
pub mod model;

pub use client::{DownloadResponse, ScrapeClient, DEFAULT_SERVER, DEFAULT_TIMEOUT_SECS};
pub use error::ClientError;
pub use model::{
    AiExtractedContent, CrawlRequest, CrawlResponse, DownloadRequest, ExportFormat, PageResult,
    Relevance,
};
