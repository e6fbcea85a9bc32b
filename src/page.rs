use indexmap::IndexMap;
use scraper::Html;
use serde::Serialize;

/// One fetched page, as handed over by the crawler.
#[derive(Debug, Clone)]
pub struct PageDescriptor {
    pub url: String,
    pub base_url: String,
    pub content: Vec<u8>,
    pub content_type: Option<String>,
}

impl PageDescriptor {
    pub fn new(url: impl Into<String>, base_url: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            base_url: base_url.into(),
            content,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Whether the declared content type is an HTML document.
    /// Pages without a declared type are assumed to be HTML.
    pub fn is_html(&self) -> bool {
        match &self.content_type {
            None => true,
            Some(content_type) => {
                let mime = content_type
                    .split(';')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_ascii_lowercase();
                mime.is_empty() || mime == "text/html" || mime == "application/xhtml+xml"
            }
        }
    }

    /// Builds the document tree from the raw bytes.
    pub fn parse_document(&self) -> Html {
        Html::parse_document(&String::from_utf8_lossy(&self.content))
    }
}

/// Append-only multi-valued metadata attached to a parse result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Metadata {
    entries: IndexMap<String, Vec<String>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value under `key`, keeping earlier values.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.entry(key.into()).or_default().push(value.into());
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn values(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }
}

/// The parse output of one page; the coordinator merges its fields here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    pub url: String,
    pub metadata: Metadata,
}

impl ParseResult {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            metadata: Metadata::new(),
        }
    }
}
