use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /api/scrape`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlRequest {
    pub url: String,
    #[serde(default)]
    pub instructions: String,
    pub depth: u32,
    #[serde(default)]
    pub follow_external_links: bool,
    pub max_pages: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "markdown" | "md" => Some(ExportFormat::Markdown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "markdown",
        }
    }

    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
        }
    }
}

/// Body of `POST /api/download`: the cached page data plus the parameters
/// of the crawl that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub data: Vec<Value>,
    pub format: ExportFormat,
    pub url: String,
    pub instructions: String,
    pub depth: u32,
    pub max_pages: u32,
}

impl DownloadRequest {
    pub fn new(request: &CrawlRequest, data: Vec<Value>, format: ExportFormat) -> Self {
        Self {
            data,
            format,
            url: request.url.clone(),
            instructions: request.instructions.clone(),
            depth: request.depth,
            max_pages: request.max_pages,
        }
    }
}

/// Success body of `POST /api/scrape`.
///
/// Page objects are kept as raw JSON so a later download sends back exactly
/// what the server produced. Use [`CrawlResponse::pages`] for a typed view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Vec<Value>,
}

impl CrawlResponse {
    pub fn pages(&self) -> Vec<PageResult> {
        self.data.iter().map(PageResult::from_value).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub ai_extracted_content: Option<AiExtractedContent>,
    #[serde(default, deserialize_with = "lenient")]
    pub relevance: Option<Relevance>,
    #[serde(default, deserialize_with = "string_list")]
    pub paragraphs: Option<Vec<String>>,
    #[serde(default, deserialize_with = "string_list")]
    pub links: Option<Vec<String>>,
}

impl PageResult {
    /// Typed view of one raw page object. Anything that is not a JSON object
    /// yields an empty page.
    pub fn from_value(value: &Value) -> Self {
        if !value.is_object() {
            return Self::default();
        }
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiExtractedContent {
    #[serde(default, deserialize_with = "lenient")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub key_points: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub extracted_data: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient")]
    pub relevance_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relevance {
    #[serde(default, deserialize_with = "lenient")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub reason: Option<String>,
}

/// Mistyped fields become `None` instead of failing the whole page.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_text))
}

fn string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(items.into_iter().filter_map(value_to_text).collect()),
        Some(Value::String(s)) => Some(vec![s]),
        _ => None,
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

/// Plain text for a JSON scalar; strings are taken verbatim, other values use
/// their JSON form.
pub fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
