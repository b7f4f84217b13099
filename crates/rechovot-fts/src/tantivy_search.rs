//! Tantivy search backend implementation.
//!
//! Provides `TantivyBackend`, an embedded [`SearchBackend`] holding one
//! Tantivy index per index name, either under a root directory or in memory.
//! This module is only available with the `fts-tantivy` feature.
//!
//! Readers reload shortly after any commit to the index directory, including
//! commits made by another process such as a later run of the loader.
//! [`SearchBackend::refresh`] and updates reload right away.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use rechovot_core::{Error, Result};
use tantivy::collector::TopDocs;
use tantivy::query::{
    BooleanQuery, ConstScoreQuery, EmptyQuery, Occur, PhraseQuery, Query, TermQuery,
};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::tokenizer::{Token, TokenStream};
use tantivy::{Index, IndexReader, ReloadPolicy, Searcher, TantivyDocument, Term};

use crate::backend::{DocumentPatch, Hit, SearchBackend};
use crate::document::StreetDocument;
use crate::indexer::{Indexer, dynamic_fields, from_tantivy, stored_value};
use crate::mapping::{FieldSchema, MappingDocument};
use crate::query::{Clause, StructuredQuery, TermFilter};
use crate::schema::IndexLayout;
use crate::types::{DELETED_FIELD, FieldType, FieldValue};

/// One open index with its reader.
struct IndexHandle {
    index: Index,
    reader: IndexReader,
    layout: IndexLayout,
    /// Serializes writers; Tantivy allows one per index.
    write_lock: Mutex<()>,
}

impl IndexHandle {
    fn new(index: Index, layout: IndexLayout) -> Result<Self> {
        IndexLayout::register_tokenizers(&index);
        let reader = open_reader(&index, ReloadPolicy::OnCommitWithDelay)?;
        Ok(Self {
            index,
            reader,
            layout,
            write_lock: Mutex::new(()),
        })
    }

    fn lock_writer(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| Error::backend("Index writer lock poisoned"))
    }

    fn bulk_create(&self, docs: &[StreetDocument]) -> Result<usize> {
        let _guard = self.lock_writer()?;
        let mut indexer = Indexer::new(&self.index, &self.layout)?;
        for doc in docs {
            indexer.add_document(doc)?;
        }
        indexer.commit()?;
        Ok(docs.len())
    }

    fn search(&self, query: &StructuredQuery) -> Result<Vec<Hit>> {
        if query.size() == 0 {
            return Ok(Vec::new());
        }

        let compiled = self.compile(query)?;
        let searcher = self.reader.searcher();
        let top_docs = searcher
            .search(&compiled, &TopDocs::with_limit(query.size()))
            .map_err(|e| Error::backend(format!("Search failed: {e}")))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let stored: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| Error::backend(format!("Failed to load document: {e}")))?;
            hits.push(self.to_hit(score, &stored, query.source()));
        }
        Ok(hits)
    }

    fn update(&self, id: &str, patch: &DocumentPatch) -> Result<()> {
        let _guard = self.lock_writer()?;

        // The shared reader may lag behind the latest commit
        let searcher = open_reader(&self.index, ReloadPolicy::Manual)?.searcher();
        let stored = self
            .find(&searcher, id)?
            .ok_or_else(|| Error::not_found("document", id))?;
        let (_, mut doc) = from_tantivy(&self.layout, &stored)?;

        for (name, value) in patch.fields() {
            if name == DELETED_FIELD {
                match value {
                    FieldValue::Boolean(deleted) => doc.set_deleted(*deleted),
                    other => {
                        return Err(Error::bad_input(format!(
                            "`{DELETED_FIELD}` must be a boolean, got {other}"
                        )));
                    }
                }
            } else {
                doc.set(name, value.clone());
            }
        }

        let mut indexer = Indexer::new(&self.index, &self.layout)?;
        indexer.replace_document(id, &doc)?;
        indexer.commit()?;
        self.refresh()
    }

    fn refresh(&self) -> Result<()> {
        self.reader
            .reload()
            .map_err(|e| Error::backend(format!("Failed to reload index reader: {e}")))
    }

    fn find(&self, searcher: &Searcher, id: &str) -> Result<Option<TantivyDocument>> {
        let query = TermQuery::new(
            Term::from_field_text(self.layout.id, id),
            IndexRecordOption::Basic,
        );
        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(1))
            .map_err(|e| Error::backend(format!("Lookup of {id} failed: {e}")))?;

        match top_docs.into_iter().next() {
            Some((_, address)) => searcher
                .doc(address)
                .map(Some)
                .map_err(|e| Error::backend(format!("Failed to load document {id}: {e}"))),
            None => Ok(None),
        }
    }

    fn to_hit(&self, score: f32, stored: &TantivyDocument, source: &[String]) -> Hit {
        let id = stored_value(stored, self.layout.id, FieldType::Text)
            .map(|v| v.to_string())
            .unwrap_or_default();

        let mut dynamic = dynamic_fields(&self.layout, stored);
        let source = source
            .iter()
            .filter_map(|name| {
                let value = match self.layout.resolve(name) {
                    Some((field, field_type)) => stored_value(stored, field, field_type),
                    None => dynamic.remove(name),
                };
                value.map(|v| (name.clone(), v))
            })
            .collect();

        Hit { id, score, source }
    }

    /// Compile a structured query: the primary clause plus non-scoring
    /// filters, all required.
    fn compile(&self, query: &StructuredQuery) -> Result<BooleanQuery> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> =
            vec![(Occur::Must, self.compile_clause(query.clause())?)];

        for filter in query.filters() {
            let term = TermQuery::new(self.filter_term(filter)?, IndexRecordOption::Basic);
            clauses.push((
                Occur::Must,
                Box::new(ConstScoreQuery::new(Box::new(term), 0.0)),
            ));
        }

        Ok(BooleanQuery::new(clauses))
    }

    fn compile_clause(&self, clause: &Clause) -> Result<Box<dyn Query>> {
        let field = match self.layout.resolve(clause.field()) {
            Some((field, FieldType::Text)) => field,
            _ => {
                return Err(Error::bad_input(format!(
                    "Cannot run a text query on `{}`",
                    clause.field()
                )));
            }
        };

        let mut terms = self.tokenize(field, clause.query())?;
        if terms.is_empty() {
            return Ok(Box::new(EmptyQuery));
        }

        match clause {
            Clause::Match { .. } => {
                let subqueries = terms
                    .into_iter()
                    .map(|term| {
                        let q: Box<dyn Query> =
                            Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs));
                        (Occur::Should, q)
                    })
                    .collect();
                Ok(Box::new(BooleanQuery::new(subqueries)))
            }
            Clause::MatchPhrase { .. } if terms.len() == 1 => Ok(Box::new(TermQuery::new(
                terms.remove(0),
                IndexRecordOption::WithFreqs,
            ))),
            Clause::MatchPhrase { .. } => Ok(Box::new(PhraseQuery::new(terms))),
        }
    }

    fn filter_term(&self, filter: &TermFilter) -> Result<Term> {
        let (field, _) = self
            .layout
            .resolve(&filter.field)
            .ok_or_else(|| Error::bad_input(format!("Unknown filter field `{}`", filter.field)))?;

        Ok(match &filter.value {
            FieldValue::Boolean(b) => Term::from_field_bool(field, *b),
            FieldValue::Integer(n) => Term::from_field_i64(field, *n),
            FieldValue::Text(s) => Term::from_field_text(field, s),
        })
    }

    /// Analyze query text with the field's tokenizer.
    fn tokenize(&self, field: Field, text: &str) -> Result<Vec<Term>> {
        let mut analyzer = self
            .index
            .tokenizer_for_field(field)
            .map_err(|e| Error::backend(format!("No tokenizer for field: {e}")))?;

        let mut terms = Vec::new();
        let mut stream = analyzer.token_stream(text);
        stream.process(&mut |token: &Token| {
            terms.push(Term::from_field_text(field, &token.text));
        });
        Ok(terms)
    }
}

fn open_reader(index: &Index, policy: ReloadPolicy) -> Result<IndexReader> {
    index
        .reader_builder()
        .reload_policy(policy)
        .try_into()
        .map_err(|e| Error::backend(format!("Failed to create index reader: {e}")))
}

/// Tantivy-based search backend.
///
/// Provides full-text search with BM25 scoring. Index handles are opened
/// lazily and cached for the lifetime of the backend.
pub struct TantivyBackend {
    root: Option<PathBuf>,
    indexes: RwLock<HashMap<String, Arc<IndexHandle>>>,
}

impl TantivyBackend {
    /// Open a backend storing indexes under `root`, creating it if needed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root).map_err(|e| Error::io_with_path(e, root))?;
        log::debug!("Tantivy index root: {}", root.display());

        Ok(Self {
            root: Some(root.to_path_buf()),
            indexes: RwLock::new(HashMap::new()),
        })
    }

    /// Create a backend whose indexes live in memory only.
    pub fn in_memory() -> Self {
        Self {
            root: None,
            indexes: RwLock::new(HashMap::new()),
        }
    }

    /// Check if an index exists at the given path.
    pub fn index_exists_at(index_path: &Path) -> bool {
        index_path.join("meta.json").exists()
    }

    fn index_dir(&self, name: &str) -> Option<PathBuf> {
        self.root.as_ref().map(|root| root.join(name))
    }

    fn cached(&self, name: &str) -> Result<Option<Arc<IndexHandle>>> {
        let indexes = self
            .indexes
            .read()
            .map_err(|_| Error::backend("Index registry lock poisoned"))?;
        Ok(indexes.get(name).cloned())
    }

    fn register(&self, name: &str, handle: IndexHandle) -> Result<Arc<IndexHandle>> {
        let mut indexes = self
            .indexes
            .write()
            .map_err(|_| Error::backend("Index registry lock poisoned"))?;
        Ok(indexes
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(handle))
            .clone())
    }

    /// Get the handle for `name`, opening it from disk on first use.
    fn handle(&self, name: &str) -> Result<Arc<IndexHandle>> {
        validate_index_name(name)?;
        if let Some(handle) = self.cached(name)? {
            return Ok(handle);
        }

        let dir = match self.index_dir(name) {
            Some(dir) if Self::index_exists_at(&dir) => dir,
            _ => return Err(Error::not_found("index", name)),
        };

        let index = Index::open_in_dir(&dir)
            .map_err(|e| Error::backend(format!("Failed to open index {name}: {e}")))?;
        let layout = IndexLayout::from_schema(index.schema())?;
        log::debug!("Opened index {name} at {}", dir.display());

        self.register(name, IndexHandle::new(index, layout)?)
    }
}

impl std::fmt::Debug for TantivyBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TantivyBackend")
            .field("root", &self.root)
            .finish()
    }
}

fn validate_index_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_whitespace);
    if valid {
        Ok(())
    } else {
        Err(Error::config(format!("Invalid index name: {name:?}")))
    }
}

/// Run blocking index work off the async runtime.
async fn run_blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| Error::backend_with_source("Index task failed", e))?
}

#[async_trait]
impl SearchBackend for TantivyBackend {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        validate_index_name(index)?;
        if self.cached(index)?.is_some() {
            return Ok(true);
        }
        Ok(self
            .index_dir(index)
            .is_some_and(|dir| Self::index_exists_at(&dir)))
    }

    async fn create_index(&self, index: &str, mapping: &serde_json::Value) -> Result<()> {
        if self.index_exists(index).await? {
            return Err(Error::backend(format!("Index already exists: {index}")));
        }

        let mapping = MappingDocument::from_value(mapping.clone())?;
        let layout = IndexLayout::build(&FieldSchema::from_mapping(&mapping)?);

        let tantivy_index = match self.index_dir(index) {
            Some(dir) => {
                std::fs::create_dir_all(&dir).map_err(|e| Error::io_with_path(e, &dir))?;
                Index::create_in_dir(&dir, layout.schema().clone())
                    .map_err(|e| Error::backend(format!("Failed to create index {index}: {e}")))?
            }
            None => Index::create_in_ram(layout.schema().clone()),
        };

        log::info!(
            "Created index {index} with {} fields",
            layout.fields().count()
        );
        self.register(index, IndexHandle::new(tantivy_index, layout)?)?;
        Ok(())
    }

    async fn bulk_create(&self, index: &str, docs: &[StreetDocument]) -> Result<usize> {
        if docs.is_empty() {
            return Ok(0);
        }
        let handle = self.handle(index)?;
        let docs = docs.to_vec();
        let created = run_blocking(move || handle.bulk_create(&docs)).await?;
        log::debug!("Bulk-created {created} documents in {index}");
        Ok(created)
    }

    async fn search(&self, index: &str, query: &StructuredQuery) -> Result<Vec<Hit>> {
        let handle = self.handle(index)?;
        let query = query.clone();
        run_blocking(move || handle.search(&query)).await
    }

    async fn update(&self, index: &str, id: &str, patch: &DocumentPatch) -> Result<()> {
        let handle = self.handle(index)?;
        let id = id.to_string();
        let patch = patch.clone();
        run_blocking(move || handle.update(&id, &patch)).await
    }

    async fn refresh(&self, index: &str) -> Result<()> {
        self.handle(index)?.refresh()
    }

    fn name(&self) -> &str {
        "tantivy"
    }
}

// ============================================================================
// Tests
// ============================================================================
