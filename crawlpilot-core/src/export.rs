// Local exports of a crawl session, written without the server

use crate::controller::CrawlSession;
use crate::view::{page_views, PageContent};
use crawlpilot_client::{CrawlRequest, CrawlResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalFormat {
    Json,
    Markdown,
    Text,
}

impl LocalFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(LocalFormat::Json),
            "markdown" | "md" => Some(LocalFormat::Markdown),
            "text" | "txt" => Some(LocalFormat::Text),
            _ => None,
        }
    }

    /// Guess from a file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_str)
            .unwrap_or(LocalFormat::Json)
    }
}

/// On-disk form of a session. `metadata` is informational and ignored when
/// loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDocument {
    #[serde(default)]
    pub metadata: Option<Value>,
    pub request: CrawlRequest,
    #[serde(default)]
    pub data: Vec<Value>,
}

pub fn generate_json_export(session: &CrawlSession) -> Result<String, serde_json::Error> {
    let document = SessionDocument {
        metadata: Some(serde_json::json!({
            "generator": "crawlpilot",
            "version": env!("CARGO_PKG_VERSION"),
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "format": "json",
            "page_count": session.response.data.len(),
        })),
        request: session.request.clone(),
        data: session.response.data.clone(),
    };
    serde_json::to_string_pretty(&document)
}

/// Load a session previously written by [`generate_json_export`].
pub fn load_session(json: &str) -> Result<CrawlSession, serde_json::Error> {
    let document: SessionDocument = serde_json::from_str(json)?;
    Ok(CrawlSession {
        request: document.request,
        response: CrawlResponse {
            status: None,
            message: None,
            data: document.data,
        },
    })
}

pub fn generate_markdown_export(session: &CrawlSession) -> String {
    let request = &session.request;
    let mut md = String::new();

    md.push_str(&format!("# Crawl results for {}\n\n", request.url));
    if !request.instructions.is_empty() {
        md.push_str(&format!("**Instructions:** {}\n\n", request.instructions));
    }
    md.push_str(&format!(
        "**Depth:** {} | **Max pages:** {} | **Pages crawled:** {}\n\n",
        request.depth,
        request.max_pages,
        session.response.data.len()
    ));
    md.push_str(&format!(
        "_Generated {}_\n\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    for view in page_views(&session.response) {
        md.push_str("---\n\n");
        md.push_str(&format!("## {}\n\n", view.title));
        if let Some(url) = &view.url {
            md.push_str(&format!("<{}>\n\n", url));
        }

        match &view.content {
            PageContent::Error(message) => {
                md.push_str(&format!("**Error:** {}\n\n", message));
            }
            PageContent::AiExtracted(ai) => {
                if let Some(summary) = &ai.summary {
                    md.push_str(&format!("### Summary\n\n{}\n\n", summary));
                }
                if !ai.key_points.is_empty() {
                    md.push_str("### Key Points\n\n");
                    for (i, point) in ai.key_points.iter().enumerate() {
                        md.push_str(&format!("{}. {}\n", i + 1, point));
                    }
                    md.push('\n');
                }
                if !ai.extracted_data.is_empty() {
                    md.push_str("### Extracted Data\n\n");
                    for (key, value) in &ai.extracted_data {
                        md.push_str(&format!("- **{}:** {}\n", key, value));
                    }
                    md.push('\n');
                }
                if let Some(relevance) = &ai.relevance {
                    md.push_str(&format!("**Relevance:** {}%", relevance.percent()));
                    if let Some(reason) = &relevance.reason {
                        md.push_str(&format!(" ({})", reason));
                    }
                    md.push_str("\n\n");
                }
            }
            PageContent::Paragraphs(paragraphs) => {
                for p in paragraphs {
                    md.push_str(&format!("{}\n\n", p));
                }
            }
            PageContent::Empty => md.push_str("_No content extracted from this page._\n\n"),
        }

        if !view.links.is_empty() {
            md.push_str("### Links\n\n");
            for link in &view.links {
                md.push_str(&format!("- <{}>\n", link));
            }
            md.push('\n');
        }
    }

    md
}

pub fn generate_text_export(session: &CrawlSession) -> String {
    let mut out = String::new();
    out.push_str(&format!("Crawler Results for {}\n", session.request.url));
    if !session.request.instructions.is_empty() {
        out.push_str(&format!("Instructions: {}\n", session.request.instructions));
    }
    out.push('\n');

    for view in page_views(&session.response) {
        out.push_str(&format!("Title: {}\n", view.title));
        if let Some(url) = &view.url {
            out.push_str(&format!("URL: {}\n", url));
        }
        out.push('\n');

        match &view.content {
            PageContent::Error(message) => out.push_str(&format!("Error: {}\n\n", message)),
            PageContent::AiExtracted(ai) => {
                out.push_str("--- AI-Extracted Content ---\n");
                out.push_str(&format!(
                    "Summary: {}\n\n",
                    ai.summary.as_deref().unwrap_or("N/A")
                ));
                out.push_str("Key Points:\n");
                for (i, point) in ai.key_points.iter().enumerate() {
                    out.push_str(&format!("{}. {}\n", i + 1, point));
                }
                out.push('\n');
                if !ai.extracted_data.is_empty() {
                    out.push_str("Extracted Data:\n");
                    for (key, value) in &ai.extracted_data {
                        out.push_str(&format!("- {}: {}\n", key, value));
                    }
                    out.push('\n');
                }
                if let Some(relevance) = &ai.relevance {
                    out.push_str(&format!("Relevance: {}%\n\n", relevance.percent()));
                }
            }
            PageContent::Paragraphs(paragraphs) => {
                for p in paragraphs {
                    out.push_str(&format!("{}\n\n", p));
                }
            }
            PageContent::Empty => out.push_str("No content extracted.\n\n"),
        }

        out.push_str("--- Links ---\n");
        for link in &view.links {
            out.push_str(&format!("* {}\n", link));
        }
        out.push('\n');
    }

    out
}

pub fn generate_export(session: &CrawlSession, format: LocalFormat) -> Result<String, serde_json::Error> {
    match format {
        LocalFormat::Json => generate_json_export(session),
        LocalFormat::Markdown => Ok(generate_markdown_export(session)),
        LocalFormat::Text => Ok(generate_text_export(session)),
    }
}

pub fn save_export(content: &str, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
