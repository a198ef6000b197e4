//! Document capabilities
//!
//! The four tools the assistant uses to answer questions about the corpus.
//! Each returns pretty-printed JSON (`[]` when nothing matches).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use super::{Tool, ToolArgs, ToolRegistry};
use crate::error::Result;
use crate::store::{Document, DocumentStore};
use crate::utils::string::preview;

/// Characters of abstract kept in search results.
const SEARCH_ABSTRACT_CHARS: usize = 500;
/// Characters of abstract kept in agency results.
const AGENCY_ABSTRACT_CHARS: usize = 300;

/// Build a registry with all document tools, in the order the model sees them.
pub fn registry(store: Arc<dyn DocumentStore>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    register_all(&mut registry, store);
    registry
}

/// Register all document tools into an existing registry.
pub fn register_all(registry: &mut ToolRegistry, store: Arc<dyn DocumentStore>) {
    registry.register(Box::new(SearchDocumentsTool::new(Arc::clone(&store))));
    registry.register(Box::new(RecentDocumentsTool::new(Arc::clone(&store))));
    registry.register(Box::new(FilterByAgencyTool::new(Arc::clone(&store))));
    registry.register(Box::new(DocumentStatsTool::new(store)));
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn clip(text: &Option<String>, max: usize) -> Option<String> {
    text.as_deref().map(|t| preview(t, max))
}

// ============================================================================
// search_documents
// ============================================================================

#[derive(Serialize)]
struct SearchHit {
    document_number: String,
    title: String,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    publication_date: Option<NaiveDate>,
    agency: Option<String>,
    document_type: Option<String>,
}

impl From<Document> for SearchHit {
    fn from(d: Document) -> Self {
        Self {
            abstract_text: clip(&d.abstract_text, SEARCH_ABSTRACT_CHARS),
            document_number: d.document_number,
            title: d.title,
            publication_date: d.publication_date,
            agency: d.agency,
            document_type: d.document_type,
        }
    }
}

/// Keyword search over titles and abstracts.
pub struct SearchDocumentsTool {
    store: Arc<dyn DocumentStore>,
}

impl SearchDocumentsTool {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SearchDocumentsTool {
    fn name(&self) -> &str {
        "search_documents"
    }

    fn description(&self) -> &str {
        "Search federal documents by keyword in title or abstract"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search keyword or phrase"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of results to return (default: 10)",
                    "default": 10,
                    "minimum": 1
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<String> {
        let query = args.require_str("query")?;
        let limit = args.usize_or("limit", 10);
        let docs = self.store.search(query, limit).await?;
        info!(query = %query, results = docs.len(), "Searched documents");
        let hits: Vec<SearchHit> = docs.into_iter().map(SearchHit::from).collect();
        to_pretty_json(&hits)
    }
}

// ============================================================================
// get_recent_documents
// ============================================================================

#[derive(Serialize)]
struct RecentHit {
    document_number: String,
    title: String,
    publication_date: Option<NaiveDate>,
    agency: Option<String>,
    document_type: Option<String>,
}

impl From<Document> for RecentHit {
    fn from(d: Document) -> Self {
        Self {
            document_number: d.document_number,
            title: d.title,
            publication_date: d.publication_date,
            agency: d.agency,
            document_type: d.document_type,
        }
    }
}

/// Documents published in the last N days.
pub struct RecentDocumentsTool {
    store: Arc<dyn DocumentStore>,
}

impl RecentDocumentsTool {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for RecentDocumentsTool {
    fn name(&self) -> &str {
        "get_recent_documents"
    }

    fn description(&self) -> &str {
        "Get recent federal documents from the last N days"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "days": {
                    "type": "integer",
                    "description": "Number of days back to search (default: 7)",
                    "default": 7,
                    "minimum": 0
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of results to return (default: 20)",
                    "default": 20,
                    "minimum": 1
                }
            }
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<String> {
        let days = u32::try_from(args.u64("days").unwrap_or(7)).unwrap_or(u32::MAX);
        let limit = args.usize_or("limit", 20);
        let docs = self.store.recent(days, limit, today()).await?;
        info!(days, results = docs.len(), "Listed recent documents");
        let hits: Vec<RecentHit> = docs.into_iter().map(RecentHit::from).collect();
        to_pretty_json(&hits)
    }
}

// ============================================================================
// filter_by_agency
// ============================================================================

#[derive(Serialize)]
struct AgencyHit {
    document_number: String,
    title: String,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    publication_date: Option<NaiveDate>,
    document_type: Option<String>,
}

impl From<Document> for AgencyHit {
    fn from(d: Document) -> Self {
        Self {
            abstract_text: clip(&d.abstract_text, AGENCY_ABSTRACT_CHARS),
            document_number: d.document_number,
            title: d.title,
            publication_date: d.publication_date,
            document_type: d.document_type,
        }
    }
}

/// Documents issued by a matching agency.
pub struct FilterByAgencyTool {
    store: Arc<dyn DocumentStore>,
}

impl FilterByAgencyTool {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for FilterByAgencyTool {
    fn name(&self) -> &str {
        "filter_by_agency"
    }

    fn description(&self) -> &str {
        "Filter federal documents by specific agency name"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "agency": {
                    "type": "string",
                    "description": "The agency name to filter by (e.g., 'Environmental Protection Agency', 'FDA')"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of results to return (default: 15)",
                    "default": 15,
                    "minimum": 1
                }
            },
            "required": ["agency"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<String> {
        let agency = args.require_str("agency")?;
        let limit = args.usize_or("limit", 15);
        let docs = self.store.by_agency(agency, limit).await?;
        info!(agency = %agency, results = docs.len(), "Filtered documents by agency");
        let hits: Vec<AgencyHit> = docs.into_iter().map(AgencyHit::from).collect();
        to_pretty_json(&hits)
    }
}

// ============================================================================
// get_document_stats
// ============================================================================

/// Corpus totals, top document types and recent publishing activity.
pub struct DocumentStatsTool {
    store: Arc<dyn DocumentStore>,
}

impl DocumentStatsTool {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for DocumentStatsTool {
    fn name(&self) -> &str {
        "get_document_stats"
    }

    fn description(&self) -> &str {
        "Get statistics about the document database including total count, document types, and recent activity"
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: ToolArgs) -> Result<String> {
        let stats = self.store.stats(today()).await?;
        to_pretty_json(&stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocentError;
    use crate::store::MemoryDocumentStore;
    use serde_json::Map;

    fn args(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap_or_default()
    }

    fn long_doc(abstract_len: usize) -> Document {
        Document {
            document_number: "2024-100".into(),
            title: "Water Quality Criteria".into(),
            abstract_text: Some("é".repeat(abstract_len)),
            publication_date: Some(today()),
            agency: Some("Environmental Protection Agency".into()),
            document_type: Some("Rule".into()),
        }
    }

    fn registry_with(docs: Vec<Document>) -> ToolRegistry {
        registry(Arc::new(MemoryDocumentStore::with_documents(docs)))
    }

    #[test]
    fn test_registry_order() {
        let registry = registry_with(vec![]);
        assert_eq!(
            registry.names(),
            vec![
                "search_documents",
                "get_recent_documents",
                "filter_by_agency",
                "get_document_stats"
            ]
        );
    }

    #[tokio::test]
    async fn test_search_empty_is_empty_array() {
        let registry = registry_with(vec![]);
        let out = registry
            .dispatch("search_documents", args(json!({"query": "water rules"})))
            .await;
        assert_eq!(out, "[]");
    }

    #[tokio::test]
    async fn test_search_truncates_abstract() {
        let registry = registry_with(vec![long_doc(800)]);
        let out = registry
            .dispatch("search_documents", args(json!({"query": "water"})))
            .await;
        let parsed: Value = serde_json::from_str(&out).unwrap();
        let abstract_text = parsed[0]["abstract"].as_str().unwrap();
        assert_eq!(abstract_text.chars().count(), SEARCH_ABSTRACT_CHARS + 3);
        assert!(abstract_text.ends_with("..."));
        assert_eq!(parsed[0]["agency"], json!("Environmental Protection Agency"));
    }

    #[tokio::test]
    async fn test_agency_filter_shape() {
        let registry = registry_with(vec![long_doc(800)]);
        let out = registry
            .dispatch("filter_by_agency", args(json!({"agency": "protection"})))
            .await;
        let parsed: Value = serde_json::from_str(&out).unwrap();
        let hit = &parsed[0];
        assert!(hit.get("agency").is_none());
        assert_eq!(
            hit["abstract"].as_str().unwrap().chars().count(),
            AGENCY_ABSTRACT_CHARS + 3
        );
    }

    #[tokio::test]
    async fn test_recent_has_no_abstract() {
        let registry = registry_with(vec![long_doc(10)]);
        let out = registry.dispatch("get_recent_documents", Map::new()).await;
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
        assert!(parsed[0].get("abstract").is_none());
    }

    #[tokio::test]
    async fn test_recent_huge_days_lists_old_documents() {
        let mut old = long_doc(10);
        old.publication_date = NaiveDate::from_ymd_opt(1994, 1, 3);
        let registry = registry_with(vec![old]);
        let out = registry
            .dispatch("get_recent_documents", args(json!({"days": 200_000_000})))
            .await;
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
        assert_eq!(parsed[0]["publication_date"], json!("1994-01-03"));
    }

    #[tokio::test]
    async fn test_stats_shape() {
        let registry = registry_with(vec![long_doc(10)]);
        let out = registry.dispatch("get_document_stats", Map::new()).await;
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["total_documents"], json!(1));
        assert_eq!(parsed["document_types"][0], json!({"type": "Rule", "count": 1}));
        assert_eq!(parsed["recent_activity"][0]["count"], json!(1));
    }

    #[tokio::test]
    async fn test_missing_agency_reports_validation_error() {
        let registry = registry_with(vec![]);
        let out = registry.dispatch("filter_by_agency", Map::new()).await;
        assert_eq!(
            out,
            "Error executing tool filter_by_agency: Invalid arguments: missing required argument 'agency'"
        );
    }

    struct BrokenStore;

    #[async_trait]
    impl DocumentStore for BrokenStore {
        async fn search(&self, _q: &str, _l: usize) -> Result<Vec<Document>> {
            Err(DocentError::Store("connection refused".into()))
        }
        async fn recent(&self, _d: u32, _l: usize, _t: NaiveDate) -> Result<Vec<Document>> {
            Err(DocentError::Store("connection refused".into()))
        }
        async fn by_agency(&self, _a: &str, _l: usize) -> Result<Vec<Document>> {
            Err(DocentError::Store("connection refused".into()))
        }
        async fn stats(&self, _t: NaiveDate) -> Result<crate::store::DocumentStats> {
            Err(DocentError::Store("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_store_failure_becomes_text() {
        let registry = registry(Arc::new(BrokenStore));
        let out = registry
            .dispatch("search_documents", args(json!({"query": "x"})))
            .await;
        assert_eq!(
            out,
            "Error executing tool search_documents: Store error: connection refused"
        );
    }
}
