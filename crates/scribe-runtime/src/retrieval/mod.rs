//! Semantic case retrieval.
//!
//! Wraps an embedding model and a vector index - both behind traits, both
//! external collaborators - into "find up to N semantically similar
//! reference cases for a query".
//!
//! Failure policy: the public [`CaseRetriever::find`] never fails. Embedding
//! or search errors are logged and absorbed into an empty result, which
//! callers must treat as a valid, low-confidence outcome. The risk analyzer
//! uses [`CaseRetriever::try_find`] instead, because it needs to tell
//! "retrieval broke" apart from "no similar cases exist".

use async_trait::async_trait;
use scribe_core::ReferenceCase;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

mod cache;

pub use cache::{CacheKey, RetrievalCache};

use crate::config::RetrievalConfig;

/// Errors from the retrieval collaborators.
///
/// Never propagated to the generation caller; absorbed into empty results.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("vector search failed: {0}")]
    Search(String),
}

/// Embedding model seam: text in, fixed-dimension vector out.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a query text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;
}

/// One ranked match from the vector index.
///
/// The payload is an opaque key-value document; the retriever reads `text`,
/// and optionally `fields`, `approved`, and `rejection_reasons`.
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    /// Case identifier
    pub id: String,

    /// Cosine similarity to the query vector
    pub score: f32,

    /// Opaque case document
    pub payload: serde_json::Value,
}

/// Vector index seam: vector in, ranked matches out.
#[async_trait]
pub trait CaseSearch: Send + Sync {
    /// Search for the `k` nearest cases.
    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredPoint>, RetrievalError>;
}

/// Retrieves semantically similar reference cases.
pub struct CaseRetriever {
    embedder: Arc<dyn Embedder>,
    search: Arc<dyn CaseSearch>,
    cache: RetrievalCache,
    default_limit: usize,
}

impl CaseRetriever {
    /// Create a retriever over an embedder and a vector index.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        search: Arc<dyn CaseSearch>,
        config: &RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            search,
            cache: RetrievalCache::new(config.cache_entries, config.cache_ttl),
            default_limit: config.default_limit,
        }
    }

    /// [`find`](Self::find) with the configured default limit.
    pub async fn find_default(
        &self,
        query: &str,
        field_filter: Option<&str>,
        approved_only: bool,
    ) -> Vec<ReferenceCase> {
        self.find(query, field_filter, approved_only, self.default_limit)
            .await
    }

    /// Find up to `limit` similar cases, ordered by descending relevance.
    ///
    /// Never fails: on any retrieval error the cause is logged and an empty
    /// list is returned.
    pub async fn find(
        &self,
        query: &str,
        field_filter: Option<&str>,
        approved_only: bool,
        limit: usize,
    ) -> Vec<ReferenceCase> {
        match self.try_find(query, field_filter, approved_only, limit).await {
            Ok(cases) => cases,
            Err(error) => {
                tracing::warn!(%error, query, "retrieval failed, continuing with no cases");
                Vec::new()
            }
        }
    }

    /// Like [`find`](Self::find), but surfaces the retrieval error.
    pub async fn try_find(
        &self,
        query: &str,
        field_filter: Option<&str>,
        approved_only: bool,
        limit: usize,
    ) -> Result<Vec<ReferenceCase>, RetrievalError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let key = CacheKey::new(query, field_filter, approved_only, limit);
        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!(query, "retrieval cache hit");
            return Ok(cached);
        }

        // The field hint leads: it steers the embedding toward the right
        // section of the reference documents.
        let query_text = match field_filter {
            Some(field) => format!("{field} {query}"),
            None => query.to_string(),
        };

        let vector = self.embedder.embed(&query_text).await?;

        // Overfetch to survive post-filtering
        let points = self.search.search(&vector, limit * 2).await?;

        let mut cases: Vec<ReferenceCase> = points.into_iter().map(case_from_point).collect();
        cases.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));

        if approved_only {
            cases.retain(|case| case.is_approved());
        }
        cases.truncate(limit);

        tracing::debug!(query, count = cases.len(), "retrieval complete");
        self.cache.insert(key, cases.clone()).await;
        Ok(cases)
    }
}

/// Decode a vector match into a reference case.
///
/// Unknown payload keys are ignored; missing ones default to empty.
fn case_from_point(point: ScoredPoint) -> ReferenceCase {
    let excerpt = point.payload["text"].as_str().unwrap_or_default();
    let mut case = ReferenceCase::new(point.id, point.score, excerpt);

    if let Some(fields) = point.payload["fields"].as_object() {
        case.fields = fields
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|text| (k.clone(), text.to_string())))
            .collect::<BTreeMap<_, _>>();
    }

    case.approved = point.payload["approved"].as_bool();

    if let Some(reasons) = point.payload["rejection_reasons"].as_array() {
        case.rejection_reasons = reasons
            .iter()
            .filter_map(|r| r.as_str().map(str::to_string))
            .collect();
    }

    case
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, RetrievalError> {
            Ok(vec![0.1, 0.2, 0.3])
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, RetrievalError> {
            Err(RetrievalError::Embedding("model not loaded".into()))
        }
    }

    /// Records the requested k and last query; returns scripted points.
    struct ScriptedSearch {
        points: Vec<ScoredPoint>,
        calls: AtomicUsize,
        last_k: AtomicUsize,
    }

    impl ScriptedSearch {
        fn new(points: Vec<ScoredPoint>) -> Self {
            Self {
                points,
                calls: AtomicUsize::new(0),
                last_k: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CaseSearch for ScriptedSearch {
        async fn search(
            &self,
            _vector: &[f32],
            k: usize,
        ) -> Result<Vec<ScoredPoint>, RetrievalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.last_k.store(k, Ordering::SeqCst);
            Ok(self.points.clone())
        }
    }

    fn point(id: &str, score: f32, approved: bool) -> ScoredPoint {
        ScoredPoint {
            id: id.to_string(),
            score,
            payload: json!({
                "text": format!("excerpt for {id}"),
                "approved": approved,
                "rejection_reasons": if approved { json!([]) } else { json!(["vague scope"]) },
            }),
        }
    }

    fn retriever(search: Arc<ScriptedSearch>) -> CaseRetriever {
        CaseRetriever::new(Arc::new(FixedEmbedder), search, &RetrievalConfig::default())
    }

    #[tokio::test]
    async fn test_results_ordered_by_relevance() {
        let search = Arc::new(ScriptedSearch::new(vec![
            point("low", 0.3, true),
            point("high", 0.9, true),
        ]));
        let cases = retriever(search).find("query", None, false, 5).await;

        assert_eq!(cases[0].id, "high");
        assert_eq!(cases[1].id, "low");
    }

    #[tokio::test]
    async fn test_overfetches_twice_the_limit() {
        let search = Arc::new(ScriptedSearch::new(vec![]));
        retriever(search.clone()).find("query", None, false, 5).await;

        assert_eq!(search.last_k.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_default_limit_comes_from_config() {
        let search = Arc::new(ScriptedSearch::new(vec![]));
        retriever(search.clone()).find_default("query", None, false).await;

        // Default limit 5, overfetched 2x
        assert_eq!(search.last_k.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_approved_filter_applies_before_truncation() {
        let search = Arc::new(ScriptedSearch::new(vec![
            point("a", 0.9, false),
            point("b", 0.8, true),
            point("c", 0.7, false),
            point("d", 0.6, true),
        ]));
        let cases = retriever(search).find("query", None, true, 2).await;

        assert_eq!(cases.len(), 2);
        assert!(cases.iter().all(|c| c.is_approved()));
        assert_eq!(cases[0].id, "b");
    }

    #[tokio::test]
    async fn test_embedding_failure_yields_empty_list() {
        let search = Arc::new(ScriptedSearch::new(vec![point("a", 0.9, true)]));
        let retriever = CaseRetriever::new(
            Arc::new(FailingEmbedder),
            search.clone(),
            &RetrievalConfig::default(),
        );

        let cases = retriever.find("query", None, false, 5).await;
        assert!(cases.is_empty());
        // The search was never reached
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_try_find_surfaces_the_error() {
        let retriever = CaseRetriever::new(
            Arc::new(FailingEmbedder),
            Arc::new(ScriptedSearch::new(vec![])),
            &RetrievalConfig::default(),
        );

        let result = retriever.try_find("query", None, false, 5).await;
        assert!(matches!(result, Err(RetrievalError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_repeat_queries_hit_the_cache() {
        let search = Arc::new(ScriptedSearch::new(vec![point("a", 0.9, true)]));
        let retriever = retriever(search.clone());

        retriever.find("query", Some("justification"), false, 5).await;
        retriever.find("query", Some("justification"), false, 5).await;

        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_scores_outside_unit_range_are_clamped() {
        let search = Arc::new(ScriptedSearch::new(vec![point("a", 1.7, true)]));
        let cases = retriever(search).find("query", None, false, 5).await;

        assert_eq!(cases[0].relevance, 1.0);
    }

    #[tokio::test]
    async fn test_payload_fields_are_decoded() {
        let search = Arc::new(ScriptedSearch::new(vec![ScoredPoint {
            id: "a".to_string(),
            score: 0.8,
            payload: json!({
                "text": "general excerpt",
                "fields": { "justification": "field text" },
                "approved": false,
                "rejection_reasons": ["incomplete budget"],
            }),
        }]));
        let cases = retriever(search).find("query", None, false, 5).await;

        assert_eq!(cases[0].excerpt_for("justification"), "field text");
        assert_eq!(cases[0].approved, Some(false));
        assert_eq!(cases[0].rejection_reasons, vec!["incomplete budget"]);
    }
}
