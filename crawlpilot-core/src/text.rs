// Terminal rendering of crawl results
//
// Results are laid out once as styled lines. The CLI colours them with
// `colored`; the terminal form maps the same styles onto its own widgets.

use crate::view::{page_views, AiView, LinksToggle, PageContent, PageView, RelevanceView};
use colored::Colorize;
use crawlpilot_client::CrawlResponse;

pub const NO_RESULTS_TEXT: &str = "No results found.";
pub const NO_CONTENT_TEXT: &str = "No content extracted from this page.";

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
const WRAP_WIDTH: usize = 80;
const METER_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Rule,
    Heading,
    Title,
    Label,
    Body,
    Muted,
    Link,
    Meter,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledLine {
    pub style: LineStyle,
    pub text: String,
}

impl StyledLine {
    pub fn new(style: LineStyle, text: impl Into<String>) -> Self {
        Self {
            style,
            text: sanitize_terminal(&text.into()),
        }
    }

    pub fn blank() -> Self {
        Self::new(LineStyle::Body, "")
    }
}

/// Drop control characters so server text cannot emit terminal escape
/// sequences. Tabs become spaces.
pub fn sanitize_terminal(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

pub fn summary_lines(page_count: usize, max_pages: u32) -> Vec<StyledLine> {
    vec![
        StyledLine::new(LineStyle::Rule, RULE),
        StyledLine::new(
            LineStyle::Heading,
            format!(
                "Crawled {} {} (max {})",
                page_count,
                if page_count == 1 { "page" } else { "pages" },
                max_pages
            ),
        ),
        StyledLine::new(LineStyle::Rule, RULE),
        StyledLine::blank(),
    ]
}

/// Lines for one page block. `links` carries the page's toggle state; pass
/// `None` when the page has no links.
pub fn page_lines(index: usize, view: &PageView, links: Option<LinksToggle>) -> Vec<StyledLine> {
    let mut lines = Vec::new();

    lines.push(StyledLine::new(
        LineStyle::Title,
        format!("[{}] {}", index + 1, view.title),
    ));
    if let Some(url) = &view.url {
        lines.push(StyledLine::new(LineStyle::Link, format!("    {}", url)));
    }
    lines.push(StyledLine::blank());

    match &view.content {
        PageContent::Error(message) => {
            lines.push(StyledLine::new(LineStyle::Error, format!("  Error: {}", message)));
        }
        PageContent::AiExtracted(ai) => lines.extend(ai_lines(ai)),
        PageContent::Paragraphs(paragraphs) => {
            for p in paragraphs {
                for wrapped in wrap_text(p, WRAP_WIDTH, "  ") {
                    lines.push(StyledLine::new(LineStyle::Body, wrapped));
                }
                lines.push(StyledLine::blank());
            }
        }
        PageContent::Empty => {
            lines.push(StyledLine::new(LineStyle::Muted, format!("  {}", NO_CONTENT_TEXT)));
        }
    }

    if let Some(toggle) = links {
        lines.push(StyledLine::new(LineStyle::Muted, format!("  ▸ {}", toggle.label())));
        if toggle.is_expanded() {
            for link in &view.links {
                lines.push(StyledLine::new(LineStyle::Link, format!("    • {}", link)));
            }
        }
    }

    lines.push(StyledLine::blank());
    lines
}

fn ai_lines(ai: &AiView) -> Vec<StyledLine> {
    let mut lines = Vec::new();

    if let Some(summary) = &ai.summary {
        lines.push(StyledLine::new(LineStyle::Label, "  Summary"));
        for wrapped in wrap_text(summary, WRAP_WIDTH, "    ") {
            lines.push(StyledLine::new(LineStyle::Body, wrapped));
        }
        lines.push(StyledLine::blank());
    }

    if !ai.key_points.is_empty() {
        lines.push(StyledLine::new(LineStyle::Label, "  Key Points"));
        for point in &ai.key_points {
            lines.push(StyledLine::new(LineStyle::Body, format!("    • {}", point)));
        }
        lines.push(StyledLine::blank());
    }

    if !ai.extracted_data.is_empty() {
        lines.push(StyledLine::new(LineStyle::Label, "  Extracted Data"));
        for (key, value) in &ai.extracted_data {
            lines.push(StyledLine::new(LineStyle::Body, format!("    {}: {}", key, value)));
        }
        lines.push(StyledLine::blank());
    }

    if let Some(relevance) = &ai.relevance {
        lines.push(StyledLine::new(LineStyle::Label, "  Relevance"));
        lines.push(StyledLine::new(
            LineStyle::Meter,
            format!("    {}", relevance_meter(relevance)),
        ));
        if let Some(reason) = &relevance.reason {
            for wrapped in wrap_text(reason, WRAP_WIDTH, "    ") {
                lines.push(StyledLine::new(LineStyle::Muted, wrapped));
            }
        }
        lines.push(StyledLine::blank());
    }

    lines
}

/// `[██████████░░░░░░░░░░] 50%`
pub fn relevance_meter(relevance: &RelevanceView) -> String {
    let filled = ((relevance.score * METER_WIDTH as f64).round() as usize).min(METER_WIDTH);
    format!(
        "[{}{}] {}%",
        "█".repeat(filled),
        "░".repeat(METER_WIDTH - filled),
        relevance.percent()
    )
}

/// Every line for a result set, links collapsed or expanded as requested.
pub fn result_lines(response: &CrawlResponse, max_pages: u32, show_links: bool) -> Vec<StyledLine> {
    if response.is_empty() {
        return vec![StyledLine::new(LineStyle::Muted, NO_RESULTS_TEXT)];
    }

    let views = page_views(response);
    let mut lines = summary_lines(views.len(), max_pages);
    for (index, view) in views.iter().enumerate() {
        let toggle = (!view.links.is_empty()).then(|| {
            let mut toggle = LinksToggle::new(view.links.len());
            if show_links {
                toggle.toggle();
            }
            toggle
        });
        lines.extend(page_lines(index, view, toggle));
    }
    lines
}

pub fn render_results_text(response: &CrawlResponse, max_pages: u32, show_links: bool) -> String {
    join_lines(&result_lines(response, max_pages, show_links), |line| line.text.clone())
}

pub fn render_results_colored(response: &CrawlResponse, max_pages: u32, show_links: bool) -> String {
    join_lines(&result_lines(response, max_pages, show_links), colorize)
}

/// Pretty-printed response body, as the server sent it.
pub fn render_results_json(response: &CrawlResponse) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(response)
}

fn join_lines(lines: &[StyledLine], f: impl Fn(&StyledLine) -> String) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&f(line));
        out.push('\n');
    }
    out
}

fn colorize(line: &StyledLine) -> String {
    let text = line.text.as_str();
    match line.style {
        LineStyle::Rule => text.bright_blue().to_string(),
        LineStyle::Heading => text.bright_white().bold().to_string(),
        LineStyle::Title => text.bright_cyan().bold().to_string(),
        LineStyle::Label => text.yellow().bold().to_string(),
        LineStyle::Body => text.to_string(),
        LineStyle::Muted => text.bright_black().to_string(),
        LineStyle::Link => text.blue().underline().to_string(),
        LineStyle::Meter => text.green().to_string(),
        LineStyle::Error => text.red().bold().to_string(),
    }
}

pub fn wrap_text(text: &str, width: usize, indent: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current_line = String::new();
    let available = width.saturating_sub(indent.len()).max(1);

    for word in text.split_whitespace() {
        if !current_line.is_empty() && current_line.chars().count() + word.chars().count() + 1 > available {
            result.push(format!("{}{}", indent, current_line));
            current_line.clear();
        }

        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }

    if !current_line.is_empty() {
        result.push(format!("{}{}", indent, current_line));
    }

    result
}
