//! Per-record predicates applied to each page before accumulation.

use std::fmt;
use std::sync::Arc;

use super::types::Record;

/// Document kind holding per-language PDF links.
pub const PDF_LINKS: &str = "pdf";

/// Post-fetch record predicate. Pure; never fails.
#[derive(Clone, Default)]
pub enum RecordFilter {
    /// Accept every record.
    #[default]
    All,
    /// Keep records with a non-empty `links.<kind>.<language>` URL.
    HasLink { kind: String, language: String },
    /// Caller-supplied predicate.
    Custom(Arc<dyn Fn(&Record) -> bool + Send + Sync>),
}

impl RecordFilter {
    /// Keep only records with a PDF in the given language (e.g. `DEU`).
    pub fn pdf_language(language: &str) -> Self {
        RecordFilter::HasLink {
            kind: PDF_LINKS.to_string(),
            language: language.to_string(),
        }
    }

    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        RecordFilter::Custom(Arc::new(predicate))
    }

    pub fn matches(&self, record: &Record) -> bool {
        match self {
            RecordFilter::All => true,
            RecordFilter::HasLink { kind, language } => record.link(kind, language).is_some(),
            RecordFilter::Custom(predicate) => predicate(record),
        }
    }
}

impl fmt::Debug for RecordFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordFilter::All => write!(f, "All"),
            RecordFilter::HasLink { kind, language } => f
                .debug_struct("HasLink")
                .field("kind", kind)
                .field("language", language)
                .finish(),
            RecordFilter::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn default_accepts_everything() {
        let filter = RecordFilter::default();
        assert!(matches!(filter, RecordFilter::All));
        assert!(filter.matches(&record(json!({}))));
    }

    #[test]
    fn language_filter_drops_missing_links_and_keeps_order() {
        let records = vec![
            record(json!({"id": 1, "links": {"pdf": {"DEU": "https://a"}}})),
            record(json!({"id": 2, "links": {"pdf": {"ENG": "https://b"}}})),
            record(json!({"id": 3})),
            record(json!({"id": 4, "links": {"xml": {"DEU": "https://c"}}})),
            record(json!({"id": 5, "links": {"pdf": {"DEU": "https://d", "ENG": "https://e"}}})),
            record(json!({"id": 6, "links": {"pdf": null}})),
        ];

        let filter = RecordFilter::pdf_language("DEU");
        let kept: Vec<i64> = records
            .iter()
            .filter(|r| filter.matches(r))
            .filter_map(|r| r.get("id").and_then(|v| v.as_i64()))
            .collect();

        assert_eq!(kept, vec![1, 5]);
    }

    #[test]
    fn custom_predicate() {
        let filter = RecordFilter::custom(|r| r.publication_number().is_some());
        assert!(filter.matches(&record(json!({"publication-number": "1-2025"}))));
        assert!(!filter.matches(&record(json!({"publication-date": "2025"}))));
        assert_eq!(format!("{:?}", filter), "Custom(..)");
    }
}
