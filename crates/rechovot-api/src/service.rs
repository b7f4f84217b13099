//! Street search and delete service.

use std::sync::Arc;

use rechovot_core::Result;
use rechovot_fts::{Hit, QueryBuilder, SearchBackend, SearchMode, soft_delete};
use serde::Serialize;

/// One search result as returned to clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreetHit {
    /// Document id, the handle for deletes.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_primary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_secondary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
}

impl From<Hit> for StreetHit {
    fn from(hit: Hit) -> Self {
        let field = |name: &str| hit.source.get(name).map(ToString::to_string);
        Self {
            name_primary: field("namePrimary"),
            title: field("title"),
            name_secondary: field("nameSecondary"),
            group: field("group"),
            kind: field("kind"),
            neighborhood: field("neighborhood"),
            id: hit.id,
        }
    }
}

/// Search and soft delete over one index.
pub struct StreetService {
    backend: Arc<dyn SearchBackend>,
    index: String,
    queries: QueryBuilder,
}

impl StreetService {
    pub fn new(backend: Arc<dyn SearchBackend>, index: impl Into<String>) -> Self {
        Self {
            backend,
            index: index.into(),
            queries: QueryBuilder::new(),
        }
    }

    /// Name of the index this service reads.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Search streets. A blank query returns no results without contacting
    /// the backend.
    pub async fn search(&self, query: &str, mode: SearchMode) -> Result<Vec<StreetHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let structured = self.queries.build(mode, query);
        tracing::debug!(dsl = %structured.to_dsl(), "Searching {}", self.index);

        let hits = self.backend.search(&self.index, &structured).await?;
        Ok(hits.into_iter().map(StreetHit::from).collect())
    }

    /// Soft-delete a street.
    pub async fn delete(&self, id: &str) -> Result<()> {
        soft_delete(self.backend.as_ref(), &self.index, id).await
    }
}

impl std::fmt::Debug for StreetService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreetService")
            .field("backend", &self.backend.name())
            .field("index", &self.index)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rechovot_core::Error;
    use rechovot_fts::{
        DocumentPatch, FieldValue, StreetDocument, StructuredQuery,
    };
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Records searches and answers with one fixed hit.
    #[derive(Default)]
    struct RecordingBackend {
        searches: Mutex<Vec<serde_json::Value>>,
    }

    #[async_trait]
    impl SearchBackend for RecordingBackend {
        async fn index_exists(&self, _index: &str) -> Result<bool> {
            Ok(true)
        }

        async fn create_index(&self, _index: &str, _mapping: &serde_json::Value) -> Result<()> {
            Ok(())
        }

        async fn bulk_create(&self, _index: &str, docs: &[StreetDocument]) -> Result<usize> {
            Ok(docs.len())
        }

        async fn search(&self, _index: &str, query: &StructuredQuery) -> Result<Vec<Hit>> {
            self.searches.lock().unwrap().push(query.to_dsl());
            let mut source = BTreeMap::new();
            source.insert(
                "namePrimary".to_string(),
                FieldValue::Text("הרצל".to_string()),
            );
            source.insert("kind".to_string(), FieldValue::Text("רחוב".to_string()));
            Ok(vec![Hit {
                id: "abc".to_string(),
                score: 1.0,
                source,
            }])
        }

        async fn update(&self, _index: &str, id: &str, _patch: &DocumentPatch) -> Result<()> {
            Err(Error::not_found("document", id))
        }

        async fn refresh(&self, _index: &str) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn service() -> (Arc<RecordingBackend>, StreetService) {
        let backend = Arc::new(RecordingBackend::default());
        let service = StreetService::new(backend.clone(), "streets");
        (backend, service)
    }

    #[tokio::test]
    async fn test_blank_query_skips_backend() {
        let (backend, service) = service();
        for query in ["", "   ", "\t\n"] {
            assert!(service.search(query, SearchMode::Any).await.unwrap().is_empty());
        }
        assert!(backend.searches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_maps_hits() {
        let (_, service) = service();
        let hits = service.search(" הרצל ", SearchMode::Free).await.unwrap();
        assert_eq!(
            hits,
            vec![StreetHit {
                id: "abc".to_string(),
                name_primary: Some("הרצל".to_string()),
                kind: Some("רחוב".to_string()),
                ..Default::default()
            }]
        );
    }

    #[tokio::test]
    async fn test_search_sends_trimmed_query_with_filter() {
        let (backend, service) = service();
        service.search(" הרצל ", SearchMode::Phrase).await.unwrap();

        let searches = backend.searches.lock().unwrap();
        let dsl = &searches[0];
        assert_eq!(dsl["query"]["bool"]["must"][0]["match_phrase"]["allText"], "הרצל");
        assert_eq!(dsl["query"]["bool"]["filter"][0]["term"]["isDeleted"], false);
    }

    #[test]
    fn test_hit_serialization() {
        let hit = StreetHit {
            id: "abc".to_string(),
            name_primary: Some("הרצל".to_string()),
            name_secondary: Some("בנימין זאב".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&hit).unwrap(),
            serde_json::json!({
                "id": "abc",
                "namePrimary": "הרצל",
                "nameSecondary": "בנימין זאב"
            })
        );
    }

    #[tokio::test]
    async fn test_delete_errors_propagate() {
        let (_, service) = service();
        assert!(matches!(
            service.delete("").await,
            Err(Error::BadInput { .. })
        ));
        assert!(matches!(
            service.delete("abc").await,
            Err(Error::NotFound { .. })
        ));
    }
}
