//! Soft delete.
//!
//! Documents are never physically removed. Deleting sets `isDeleted` to
//! `true` and refreshes, so the document drops out of every search issued
//! after the call returns. Repeating a delete is harmless.

use rechovot_core::{Error, Result};

use crate::backend::{DocumentPatch, SearchBackend};

/// Flag the document `id` as deleted.
///
/// # Errors
///
/// - `BadInput` for a blank id, without contacting the backend
/// - `NotFound` when no document has this id
/// - any backend failure, unchanged
pub async fn soft_delete(backend: &dyn SearchBackend, index: &str, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::bad_input("Missing id"));
    }

    backend
        .update(index, id, &DocumentPatch::mark_deleted())
        .await?;
    log::info!("Soft-deleted {id} in {index}");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::Hit;
    use crate::document::StreetDocument;
    use crate::query::StructuredQuery;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records update calls; knows a single document id.
    #[derive(Default)]
    struct RecordingBackend {
        updates: Mutex<Vec<(String, DocumentPatch)>>,
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

        async fn search(&self, _index: &str, _query: &StructuredQuery) -> Result<Vec<Hit>> {
            Ok(Vec::new())
        }

        async fn update(&self, _index: &str, id: &str, patch: &DocumentPatch) -> Result<()> {
            self.updates
                .lock()
                .unwrap()
                .push((id.to_string(), patch.clone()));
            if id == "known" {
                Ok(())
            } else {
                Err(Error::not_found("document", id))
            }
        }

        async fn refresh(&self, _index: &str) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn test_soft_delete_sends_flag() {
        let backend = RecordingBackend::default();
        soft_delete(&backend, "streets", "known").await.unwrap();

        let updates = backend.updates.lock().unwrap();
        assert_eq!(
            *updates,
            vec![("known".to_string(), DocumentPatch::mark_deleted())]
        );
    }

    #[tokio::test]
    async fn test_blank_id_rejected_without_backend_call() {
        let backend = RecordingBackend::default();
        for id in ["", "   "] {
            let err = soft_delete(&backend, "streets", id).await.unwrap_err();
            assert!(matches!(err, Error::BadInput { .. }));
        }
        assert!(backend.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_id_propagates_not_found() {
        let backend = RecordingBackend::default();
        let err = soft_delete(&backend, "streets", "missing").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
