// Page views resolved once from loosely-shaped server payloads

use crawlpilot_client::model::value_to_text;
use crawlpilot_client::{CrawlResponse, PageResult};

pub const UNTITLED: &str = "Untitled page";

/// What a page block shows, in priority order.
#[derive(Debug, Clone, PartialEq)]
pub enum PageContent {
    Error(String),
    AiExtracted(AiView),
    Paragraphs(Vec<String>),
    Empty,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiView {
    pub summary: Option<String>,
    pub key_points: Vec<String>,
    pub extracted_data: Vec<(String, String)>,
    pub relevance: Option<RelevanceView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelevanceView {
    /// Always within `0.0..=1.0`.
    pub score: f64,
    pub reason: Option<String>,
}

impl RelevanceView {
    pub fn new(score: f64, reason: Option<String>) -> Self {
        let score = if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 };
        Self { score, reason }
    }

    pub fn percent(&self) -> u32 {
        (self.score * 100.0).round() as u32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub title: String,
    pub url: Option<String>,
    pub content: PageContent,
    pub links: Vec<String>,
}

impl PageView {
    pub fn from_page(page: &PageResult) -> Self {
        Self {
            title: non_blank(page.title.as_deref())
                .unwrap_or(UNTITLED)
                .to_string(),
            url: non_blank(page.url.as_deref()).map(str::to_string),
            content: PageContent::resolve(page),
            links: page
                .links
                .iter()
                .flatten()
                .filter(|l| !l.trim().is_empty())
                .cloned()
                .collect(),
        }
    }
}

impl PageContent {
    pub fn resolve(page: &PageResult) -> Self {
        if let Some(error) = non_blank(page.error.as_deref()) {
            return PageContent::Error(error.to_string());
        }

        if let Some(ai) = &page.ai_extracted_content {
            let relevance = match &page.relevance {
                Some(r) => r.score.map(|s| RelevanceView::new(s, r.reason.clone())),
                None => None,
            }
            .or_else(|| ai.relevance_score.map(|s| RelevanceView::new(s, None)));

            let extracted_data = ai
                .extracted_data
                .iter()
                .flatten()
                .map(|(k, v)| (k.clone(), value_to_text(v.clone()).unwrap_or_default()))
                .collect();

            return PageContent::AiExtracted(AiView {
                summary: non_blank(ai.summary.as_deref()).map(str::to_string),
                key_points: ai
                    .key_points
                    .iter()
                    .flatten()
                    .filter(|p| !p.trim().is_empty())
                    .cloned()
                    .collect(),
                extracted_data,
                relevance,
            });
        }

        let paragraphs: Vec<String> = page
            .paragraphs
            .iter()
            .flatten()
            .filter(|p| !p.trim().is_empty())
            .cloned()
            .collect();
        if !paragraphs.is_empty() {
            return PageContent::Paragraphs(paragraphs);
        }

        PageContent::Empty
    }
}

/// Resolve every page of a response.
pub fn page_views(response: &CrawlResponse) -> Vec<PageView> {
    response.pages().iter().map(PageView::from_page).collect()
}

/// Collapsible link list state. Starts hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinksToggle {
    count: usize,
    expanded: bool,
}

impl LinksToggle {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            expanded: false,
        }
    }

    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn label(&self) -> String {
        if self.expanded {
            "Hide links".to_string()
        } else {
            format!("Show links ({})", self.count)
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}
