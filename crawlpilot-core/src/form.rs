// Form state and validation

use crate::error::{FormError, Result};
use crawlpilot_client::CrawlRequest;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_DEPTH: u32 = 1;
pub const MAX_DEPTH: u32 = 5;
pub const DEFAULT_MAX_PAGES: u32 = 20;
pub const MIN_MAX_PAGES: u32 = 1;
pub const MAX_MAX_PAGES: u32 = 100;

/// The user's inputs, as typed. Nothing here is validated until
/// [`FormState::to_request`] is called.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    pub url: String,
    pub instructions: String,
    depth: u32,
    max_pages: u32,
    pub follow_external_links: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            url: String::new(),
            instructions: String::new(),
            depth: DEFAULT_DEPTH,
            max_pages: DEFAULT_MAX_PAGES,
            follow_external_links: false,
        }
    }
}

impl FormState {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.set_depth(depth);
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.set_max_pages(max_pages);
        self
    }

    pub fn with_follow_external_links(mut self, follow: bool) -> Self {
        self.follow_external_links = follow;
        self
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Clamped to `0..=MAX_DEPTH`.
    pub fn set_depth(&mut self, depth: u32) {
        self.depth = depth.min(MAX_DEPTH);
    }

    /// Clamped to `MIN_MAX_PAGES..=MAX_MAX_PAGES`.
    pub fn set_max_pages(&mut self, max_pages: u32) {
        self.max_pages = max_pages.clamp(MIN_MAX_PAGES, MAX_MAX_PAGES);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Validate the inputs and build the request body.
    pub fn to_request(&self) -> Result<CrawlRequest> {
        let url = normalize_url(&self.url)?;
        Ok(CrawlRequest {
            url,
            instructions: self.instructions.trim().to_string(),
            depth: self.depth,
            follow_external_links: self.follow_external_links,
            max_pages: self.max_pages,
        })
    }
}

/// Trim the input and make sure it parses as an http(s) URL, adding
/// `http://` when no scheme was typed.
pub fn normalize_url(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FormError::Validation("URL is required.".to_string()));
    }

    let parsed = match Url::parse(trimmed) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => url,
        Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("http://{}", trimmed))
                .map_err(|e| FormError::Validation(format!("Invalid URL '{}': {}", trimmed, e)))?
        }
        Err(e) => {
            return Err(FormError::Validation(format!("Invalid URL '{}': {}", trimmed, e)));
        }
    };

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(FormError::Validation(format!("Invalid URL '{}': missing host", trimmed)));
    }

    Ok(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let form = FormState::default();
        assert_eq!(form.url, "");
        assert_eq!(form.instructions, "");
        assert_eq!(form.depth(), DEFAULT_DEPTH);
        assert_eq!(form.max_pages(), DEFAULT_MAX_PAGES);
        assert!(!form.follow_external_links);
    }

    #[test]
    fn test_values_are_clamped() {
        let form = FormState::new("example.com").with_depth(99).with_max_pages(0);
        assert_eq!(form.depth(), MAX_DEPTH);
        assert_eq!(form.max_pages(), MIN_MAX_PAGES);

        let form = form.with_max_pages(5000);
        assert_eq!(form.max_pages(), MAX_MAX_PAGES);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut form = FormState::new("https://example.com")
            .with_instructions("faq")
            .with_depth(3)
            .with_max_pages(50)
            .with_follow_external_links(true);
        form.reset();
        assert_eq!(form, FormState::default());
    }

    #[test]
    fn test_empty_url_is_rejected() {
        let err = FormState::new("   ").to_request().unwrap_err();
        assert!(matches!(err, FormError::Validation(ref m) if m == "URL is required."));
    }

    #[test]
    fn test_scheme_is_added() {
        let request = FormState::new("example.com/docs").to_request().unwrap();
        assert_eq!(request.url, "http://example.com/docs");
    }

    #[test]
    fn test_https_is_kept() {
        let request = FormState::new(" https://example.com ").to_request().unwrap();
        assert_eq!(request.url, "https://example.com/");
    }

    #[test]
    fn test_unparseable_url_is_rejected() {
        let err = FormState::new("http://exa mple.com").to_request().unwrap_err();
        assert!(matches!(err, FormError::Validation(_)));
    }

    #[test]
    fn test_request_carries_all_fields() {
        let request = FormState::new("https://example.com/a")
            .with_instructions("  pricing  ")
            .with_depth(2)
            .with_max_pages(7)
            .with_follow_external_links(true)
            .to_request()
            .unwrap();

        assert_eq!(request.instructions, "pricing");
        assert_eq!(request.depth, 2);
        assert_eq!(request.max_pages, 7);
        assert!(request.follow_external_links);
    }
}
