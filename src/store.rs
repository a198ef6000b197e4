//! Document store
//!
//! The corpus the capabilities query. [`DocumentStore`] is the seam; the
//! bundled [`MemoryDocumentStore`] keeps documents in memory and can be
//! seeded from a JSON file.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{DocentError, Result};
use crate::utils::string::contains_ignore_case;

/// A published document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Publisher-assigned identifier, unique within the corpus
    pub document_number: String,
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,
    pub publication_date: Option<NaiveDate>,
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub document_type: Option<String>,
}

/// Count of documents sharing one `document_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub document_type: Option<String>,
    pub count: usize,
}

/// Count of documents published on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// Corpus summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentStats {
    pub total_documents: usize,
    /// Five most common types, most common first
    pub document_types: Vec<TypeCount>,
    /// Documents per date over the last 30 days, newest first, at most 10 dates
    pub recent_activity: Vec<DateCount>,
}

/// Read access to the document corpus.
///
/// All listing operations return newest first. Text matching is a
/// case-insensitive substring match.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents whose title or abstract contains `query`.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Document>>;

    /// Documents published within `days` days before `today` (inclusive).
    async fn recent(&self, days: u32, limit: usize, today: NaiveDate) -> Result<Vec<Document>>;

    /// Documents whose agency contains `agency`.
    async fn by_agency(&self, agency: &str, limit: usize) -> Result<Vec<Document>>;

    /// Totals, top types and recent activity as of `today`.
    async fn stats(&self, today: NaiveDate) -> Result<DocumentStats>;
}

/// In-memory document store.
pub struct MemoryDocumentStore {
    documents: RwLock<Vec<Document>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
        }
    }

    /// Create a store holding `documents`.
    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents: RwLock::new(documents),
        }
    }

    /// Load a JSON array of documents from `path`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let documents: Vec<Document> = serde_json::from_str(&content)
            .map_err(|e| DocentError::Store(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), count = documents.len(), "Loaded documents");
        Ok(Self::with_documents(documents))
    }

    /// Insert or replace a document by its number. Returns true if it replaced one.
    pub async fn upsert(&self, document: Document) -> bool {
        let mut docs = self.documents.write().await;
        match docs
            .iter_mut()
            .find(|d| d.document_number == document.document_number)
        {
            Some(existing) => {
                *existing = document;
                true
            }
            None => {
                docs.push(document);
                false
            }
        }
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether the store holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    async fn select<F>(&self, limit: usize, keep: F) -> Vec<Document>
    where
        F: Fn(&Document) -> bool,
    {
        let docs = self.documents.read().await;
        let mut hits: Vec<Document> = docs.iter().filter(|d| keep(d)).cloned().collect();
        // Undated documents sort last
        hits.sort_by_key(|d| Reverse(d.publication_date));
        hits.truncate(limit);
        hits
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Document>> {
        Ok(self
            .select(limit, |d| {
                contains_ignore_case(&d.title, query)
                    || d.abstract_text
                        .as_deref()
                        .is_some_and(|a| contains_ignore_case(a, query))
            })
            .await)
    }

    async fn recent(&self, days: u32, limit: usize, today: NaiveDate) -> Result<Vec<Document>> {
        let since = days_before(today, days);
        Ok(self
            .select(limit, |d| d.publication_date.is_some_and(|p| p >= since))
            .await)
    }

    async fn by_agency(&self, agency: &str, limit: usize) -> Result<Vec<Document>> {
        Ok(self
            .select(limit, |d| {
                d.agency
                    .as_deref()
                    .is_some_and(|a| contains_ignore_case(a, agency))
            })
            .await)
    }

    async fn stats(&self, today: NaiveDate) -> Result<DocumentStats> {
        let docs = self.documents.read().await;

        let mut types: HashMap<Option<String>, usize> = HashMap::new();
        for d in docs.iter() {
            *types.entry(d.document_type.clone()).or_default() += 1;
        }
        let mut document_types: Vec<TypeCount> = types
            .into_iter()
            .map(|(document_type, count)| TypeCount {
                document_type,
                count,
            })
            .collect();
        // Ties broken by name so output is deterministic
        document_types.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.document_type.cmp(&b.document_type))
        });
        document_types.truncate(5);

        let since = days_before(today, 30);
        let mut dates: HashMap<NaiveDate, usize> = HashMap::new();
        for date in docs.iter().filter_map(|d| d.publication_date) {
            if date >= since {
                *dates.entry(date).or_default() += 1;
            }
        }
        let mut recent_activity: Vec<DateCount> = dates
            .into_iter()
            .map(|(date, count)| DateCount { date, count })
            .collect();
        recent_activity.sort_by_key(|c| Reverse(c.date));
        recent_activity.truncate(10);

        Ok(DocumentStats {
            total_documents: docs.len(),
            document_types,
            recent_activity,
        })
    }
}

/// The date `days` before `today`, saturating at the earliest representable date.
fn days_before(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}
