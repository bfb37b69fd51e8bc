// Tests for local session exports

use crawlpilot_client::{CrawlRequest, CrawlResponse};
use crawlpilot_core::export::{
    generate_export, generate_json_export, generate_markdown_export, generate_text_export,
    load_session, save_export, LocalFormat,
};
use crawlpilot_core::CrawlSession;
use serde_json::json;
use std::path::Path;

fn sample_session() -> CrawlSession {
    CrawlSession {
        request: CrawlRequest {
            url: "https://example.com/".to_string(),
            instructions: "Find pricing".to_string(),
            depth: 1,
            follow_external_links: false,
            max_pages: 10,
        },
        response: serde_json::from_value::<CrawlResponse>(json!({
            "data": [
                {
                    "title": "Pricing",
                    "url": "https://example.com/pricing",
                    "ai_extracted_content": {
                        "summary": "Three plans are offered.",
                        "key_points": ["Free tier", "Pro at $10"],
                        "extracted_data": { "currency": "USD" }
                    },
                    "relevance": { "score": 0.92, "reason": "Lists prices" },
                    "links": ["https://example.com/signup"],
                    "custom_field": { "kept": true }
                },
                { "title": "Broken", "url": "https://example.com/404", "error": "Not found" }
            ]
        }))
        .unwrap(),
    }
}

#[test]
fn test_local_format_from_str() {
    assert_eq!(LocalFormat::from_str("json"), Some(LocalFormat::Json));
    assert_eq!(LocalFormat::from_str("MD"), Some(LocalFormat::Markdown));
    assert_eq!(LocalFormat::from_str("txt"), Some(LocalFormat::Text));
    assert_eq!(LocalFormat::from_str("csv"), None);
}

#[test]
fn test_local_format_from_path() {
    assert_eq!(LocalFormat::from_path(Path::new("out.md")), LocalFormat::Markdown);
    assert_eq!(LocalFormat::from_path(Path::new("out.txt")), LocalFormat::Text);
    assert_eq!(LocalFormat::from_path(Path::new("out")), LocalFormat::Json);
}

#[test]
fn test_json_export_loads_back_unchanged() {
    let session = sample_session();
    let exported = generate_json_export(&session).unwrap();

    let value: serde_json::Value = serde_json::from_str(&exported).unwrap();
    assert_eq!(value["metadata"]["generator"], "crawlpilot");
    assert_eq!(value["metadata"]["page_count"], 2);

    let loaded = load_session(&exported).unwrap();
    assert_eq!(loaded.request, session.request);
    assert_eq!(loaded.response.data, session.response.data);
    // Fields the client does not model survive the trip
    assert_eq!(loaded.response.data[0]["custom_field"]["kept"], true);
}

#[test]
fn test_load_session_rejects_garbage() {
    assert!(load_session("not json").is_err());
    assert!(load_session(r#"{"data": []}"#).is_err());
}

#[test]
fn test_markdown_export() {
    let md = generate_markdown_export(&sample_session());

    assert!(md.starts_with("# Crawl results for https://example.com/"));
    assert!(md.contains("**Instructions:** Find pricing"));
    assert!(md.contains("## Pricing"));
    assert!(md.contains("### Summary\n\nThree plans are offered."));
    assert!(md.contains("1. Free tier\n2. Pro at $10"));
    assert!(md.contains("- **currency:** USD"));
    assert!(md.contains("**Relevance:** 92% (Lists prices)"));
    assert!(md.contains("- <https://example.com/signup>"));
    assert!(md.contains("**Error:** Not found"));
}

#[test]
fn test_text_export() {
    let text = generate_text_export(&sample_session());

    assert!(text.starts_with("Crawler Results for https://example.com/"));
    assert!(text.contains("--- AI-Extracted Content ---"));
    assert!(text.contains("Summary: Three plans are offered."));
    assert!(text.contains("1. Free tier"));
    assert!(text.contains("- currency: USD"));
    assert!(text.contains("Error: Not found"));
    assert!(text.contains("* https://example.com/signup"));
}

#[test]
fn test_save_export_creates_parent_dirs() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested/out/session.md");
    let content = generate_export(&sample_session(), LocalFormat::Markdown)?;

    save_export(&content, &path)?;

    assert_eq!(std::fs::read_to_string(&path)?, content);
    Ok(())
}
