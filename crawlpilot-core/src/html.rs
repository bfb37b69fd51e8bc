// HTML rendering of crawl results

use crate::view::{page_views, AiView, LinksToggle, PageContent, PageView, RelevanceView};
use crawlpilot_client::CrawlResponse;
use url::Url;

pub const NO_RESULTS_HTML: &str = r#"<p class="no-results">No results found.</p>"#;
pub const NO_CONTENT_HTML: &str = r#"<p class="no-content">No content extracted from this page.</p>"#;

/// Escape `& < > " '` so text can be placed in element content or a quoted
/// attribute value.
pub fn escape_html(unsafe_text: &str) -> String {
    let mut escaped = String::with_capacity(unsafe_text.len());
    for c in unsafe_text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// The block that replaces the results area when an action fails.
pub fn render_error_html(message: &str) -> String {
    format!(r#"<pre class="error">Error: {}</pre>"#, escape_html(message))
}

/// Render a full result set. `max_pages` is the limit the crawl was
/// submitted with.
pub fn render_results_html(response: &CrawlResponse, max_pages: u32) -> String {
    if response.is_empty() {
        return NO_RESULTS_HTML.to_string();
    }

    let views = page_views(response);
    let mut html = String::new();

    html.push_str(r#"<div class="results-summary">"#);
    html.push_str(&format!(
        "<p>Crawled <strong>{}</strong> {} (max {})</p>",
        views.len(),
        if views.len() == 1 { "page" } else { "pages" },
        max_pages
    ));
    html.push_str("</div>\n");

    for (index, view) in views.iter().enumerate() {
        html.push_str(&render_page_html(index, view));
    }

    html
}

pub fn render_page_html(index: usize, view: &PageView) -> String {
    let mut html = String::new();

    html.push_str(&format!(
        r#"<article class="page-result" id="page-{}">"#,
        index + 1
    ));
    html.push_str(&format!(
        r#"<h3 class="page-title">{}</h3>"#,
        escape_html(&view.title)
    ));
    if let Some(url) = &view.url {
        html.push_str(&format!(r#"<p class="page-url">{}</p>"#, link_html(url)));
    }

    match &view.content {
        PageContent::Error(message) => {
            html.push_str(&format!(
                r#"<div class="page-error"><strong>Error:</strong> {}</div>"#,
                escape_html(message)
            ));
        }
        PageContent::AiExtracted(ai) => html.push_str(&render_ai_html(ai)),
        PageContent::Paragraphs(paragraphs) => {
            html.push_str(r#"<div class="paragraphs">"#);
            for p in paragraphs {
                html.push_str(&format!("<p>{}</p>", escape_html(p)));
            }
            html.push_str("</div>");
        }
        PageContent::Empty => html.push_str(NO_CONTENT_HTML),
    }

    if !view.links.is_empty() {
        html.push_str(&render_links_html(index, &view.links, LinksToggle::new(view.links.len())));
    }

    html.push_str("</article>\n");
    html
}

fn render_ai_html(ai: &AiView) -> String {
    let mut html = String::from(r#"<div class="ai-content">"#);

    if let Some(summary) = &ai.summary {
        html.push_str(&format!(
            r#"<div class="summary"><h4>Summary</h4><p>{}</p></div>"#,
            escape_html(summary)
        ));
    }

    if !ai.key_points.is_empty() {
        html.push_str(r#"<div class="key-points"><h4>Key Points</h4><ul>"#);
        for point in &ai.key_points {
            html.push_str(&format!("<li>{}</li>", escape_html(point)));
        }
        html.push_str("</ul></div>");
    }

    if !ai.extracted_data.is_empty() {
        html.push_str(r#"<div class="extracted-data"><h4>Extracted Data</h4><dl>"#);
        for (key, value) in &ai.extracted_data {
            html.push_str(&format!(
                "<dt>{}</dt><dd>{}</dd>",
                escape_html(key),
                escape_html(value)
            ));
        }
        html.push_str("</dl></div>");
    }

    if let Some(relevance) = &ai.relevance {
        html.push_str(&render_relevance_html(relevance));
    }

    html.push_str("</div>");
    html
}

fn render_relevance_html(relevance: &RelevanceView) -> String {
    let percent = relevance.percent();
    let mut html = format!(
        concat!(
            r#"<div class="relevance"><h4>Relevance</h4>"#,
            r#"<div class="relevance-bar"><div class="relevance-fill" style="width: {}%"></div></div>"#,
            r#"<span class="relevance-score">{}%</span>"#
        ),
        percent, percent
    );
    if let Some(reason) = &relevance.reason {
        html.push_str(&format!(
            r#"<p class="relevance-reason">{}</p>"#,
            escape_html(reason)
        ));
    }
    html.push_str("</div>");
    html
}

/// Link list behind a toggle button. The list's `hidden` attribute and the
/// button label follow the toggle state.
pub fn render_links_html(index: usize, links: &[String], toggle: LinksToggle) -> String {
    let list_id = format!("links-{}", index + 1);
    let mut html = format!(
        r#"<div class="links"><button type="button" class="links-toggle" aria-controls="{}" aria-expanded="{}">{}</button>"#,
        list_id,
        toggle.is_expanded(),
        escape_html(&toggle.label())
    );
    html.push_str(&format!(
        r#"<ul class="link-list" id="{}"{}>"#,
        list_id,
        if toggle.is_expanded() { "" } else { " hidden" }
    ));
    for link in links {
        html.push_str(&format!("<li>{}</li>", link_html(link)));
    }
    html.push_str("</ul></div>");
    html
}

// Only http(s) targets become anchors; anything else is shown as text.
fn link_html(target: &str) -> String {
    let escaped = escape_html(target);
    match Url::parse(target) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
            escape_html(url.as_str()),
            escaped
        ),
        _ => escaped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html_all_special_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#039;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_html_plain_text_unchanged() {
        assert_eq!(escape_html("plain text 123"), "plain text 123");
        assert_eq!(escape_html(""), "");
    }

    #[test]
    fn test_render_error_html_is_escaped() {
        assert_eq!(
            render_error_html("<b>bad</b>"),
            r#"<pre class="error">Error: &lt;b&gt;bad&lt;/b&gt;</pre>"#
        );
    }

    #[test]
    fn test_javascript_links_are_not_anchors() {
        let html = link_html("javascript:alert(1)");
        assert!(!html.contains("<a"));
        assert_eq!(html, "javascript:alert(1)");
    }

    #[test]
    fn test_links_block_follows_toggle_state() {
        let links = vec!["https://example.com/a".to_string()];
        let mut toggle = LinksToggle::new(1);

        let hidden = render_links_html(0, &links, toggle);
        assert!(hidden.contains(" hidden>"));
        assert!(hidden.contains("Show links (1)"));
        assert!(hidden.contains(r#"aria-expanded="false""#));

        toggle.toggle();
        let shown = render_links_html(0, &links, toggle);
        assert!(!shown.contains(" hidden>"));
        assert!(shown.contains("Hide links"));

        toggle.toggle();
        assert_eq!(render_links_html(0, &links, toggle), hidden);
    }
}
