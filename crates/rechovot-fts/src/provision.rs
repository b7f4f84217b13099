//! Index provisioning.
//!
//! Creates the street index from a mapping document when it does not exist
//! yet. An existing index is left untouched, whatever its mapping.

use rechovot_core::Result;

use crate::backend::SearchBackend;
use crate::mapping::MappingDocument;

/// Ensure `index` exists, creating it from `mapping` if needed.
///
/// The `defaults` section is stripped before the mapping reaches the
/// backend. Returns `true` when the index was created by this call.
pub async fn ensure_index(
    backend: &dyn SearchBackend,
    mapping: &MappingDocument,
    index: &str,
) -> Result<bool> {
    if backend.index_exists(index).await? {
        log::info!("Index {index} already exists");
        return Ok(false);
    }

    backend.create_index(index, &mapping.without_defaults()).await?;
    log::info!("Index {index} created");
    Ok(true)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(all(test, feature = "fts-tantivy"))]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tantivy_search::TantivyBackend;
    use serde_json::json;

    fn mapping() -> MappingDocument {
        MappingDocument::from_value(json!({
            "mappings": {
                "properties": {
                    "namePrimary": { "type": "text" },
                    "kind": { "type": "text" }
                }
            },
            "defaults": { "kind": "רחוב" }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_ensure_index_creates_once() {
        let backend = TantivyBackend::in_memory();

        assert!(ensure_index(&backend, &mapping(), "streets").await.unwrap());
        assert!(backend.index_exists("streets").await.unwrap());

        assert!(!ensure_index(&backend, &mapping(), "streets").await.unwrap());
    }

    #[tokio::test]
    async fn test_ensure_index_on_disk_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let backend = TantivyBackend::open(dir.path()).unwrap();
            assert!(ensure_index(&backend, &mapping(), "streets").await.unwrap());
        }
        let backend = TantivyBackend::open(dir.path()).unwrap();
        assert!(!ensure_index(&backend, &mapping(), "streets").await.unwrap());
    }
}
