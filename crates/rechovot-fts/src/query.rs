//! Query building.
//!
//! Translates a [`SearchMode`] and a query string into a [`StructuredQuery`]:
//! one primary clause chosen by the mode, ANDed with a mandatory
//! `isDeleted == false` filter.
//!
//! | Mode | Primary clause |
//! |------|----------------|
//! | `free` | `match` on `namePrimary` only (default matching) |
//! | `any` | `match` on `allText`, any word suffices |
//! | `phrase` | `match_phrase` on `allText` |
//!
//! A `StructuredQuery` can only be produced by [`QueryBuilder`], and backends
//! only accept a `StructuredQuery` for searches, so no read path can skip the
//! not-deleted filter.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::types::{COMPOSITE_FIELD, DELETED_FIELD, FieldValue, PRIMARY_NAME_FIELD};

/// Maximum hits returned by one search.
pub const MAX_RESULTS: usize = 200;

/// Stored fields returned with every hit, besides the document id.
pub const HIT_FIELDS: [&str; 6] = [
    PRIMARY_NAME_FIELD,
    "title",
    "nameSecondary",
    "group",
    "kind",
    "neighborhood",
];

/// Search mode.
///
/// Controls which field is searched and how query words combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Relevance match on the primary name only.
    #[default]
    Free,
    /// Any query word, across all text fields.
    Any,
    /// Exact contiguous phrase, across all text fields.
    Phrase,
}

impl SearchMode {
    /// Parse a mode name. Names are matched exactly; anything else, or no
    /// name, falls back to [`SearchMode::Free`].
    pub fn parse(name: Option<&str>) -> Self {
        match name {
            Some("any") => SearchMode::Any,
            Some("phrase") => SearchMode::Phrase,
            _ => SearchMode::Free,
        }
    }

    /// Mode name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Free => "free",
            SearchMode::Any => "any",
            SearchMode::Phrase => "phrase",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit word combination of a `match` clause.
///
/// Only OR is ever requested; it is spelled out in the DSL of `any` searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// At least one word must match.
    Or,
}

/// The primary clause of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Full-text match; any analyzed word of the query suffices.
    Match {
        /// Target field.
        field: String,
        /// Query text.
        query: String,
        /// Explicit word combination, if any.
        operator: Option<Operator>,
    },
    /// Words must appear contiguously and in order.
    MatchPhrase {
        /// Target field.
        field: String,
        /// Query text.
        query: String,
    },
}

impl Clause {
    /// Target field of the clause.
    pub fn field(&self) -> &str {
        match self {
            Clause::Match { field, .. } | Clause::MatchPhrase { field, .. } => field,
        }
    }

    /// Query text of the clause.
    pub fn query(&self) -> &str {
        match self {
            Clause::Match { query, .. } | Clause::MatchPhrase { query, .. } => query,
        }
    }

    fn to_dsl(&self) -> Value {
        match self {
            Clause::Match {
                field,
                query,
                operator: None,
            } => json!({ "match": { field.as_str(): query } }),
            Clause::Match {
                field,
                query,
                operator: Some(op),
            } => json!({ "match": { field.as_str(): { "query": query, "operator": op } } }),
            Clause::MatchPhrase { field, query } => {
                json!({ "match_phrase": { field.as_str(): query } })
            }
        }
    }
}

/// Exact-value filter clause. Does not affect scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct TermFilter {
    /// Target field.
    pub field: String,
    /// Required value.
    pub value: FieldValue,
}

impl TermFilter {
    fn to_dsl(&self) -> Value {
        json!({ "term": { self.field.as_str(): self.value } })
    }
}

/// A backend-neutral search request.
///
/// Serializes to the Elasticsearch query DSL via [`StructuredQuery::to_dsl`].
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredQuery {
    clause: Clause,
    filters: Vec<TermFilter>,
    size: usize,
    source: Vec<String>,
}

impl StructuredQuery {
    /// Primary clause.
    pub fn clause(&self) -> &Clause {
        &self.clause
    }

    /// Filters ANDed with the primary clause. Always includes the
    /// not-deleted filter.
    pub fn filters(&self) -> &[TermFilter] {
        &self.filters
    }

    /// Maximum number of hits.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Stored fields to return with each hit.
    pub fn source(&self) -> &[String] {
        &self.source
    }

    /// Elasticsearch request body for this query.
    pub fn to_dsl(&self) -> Value {
        let filters: Vec<Value> = self.filters.iter().map(TermFilter::to_dsl).collect();
        json!({
            "size": self.size,
            "_source": self.source,
            "query": {
                "bool": {
                    "must": [self.clause.to_dsl()],
                    "filter": filters
                }
            }
        })
    }
}

/// Builder for constructing search queries.
///
/// The defaults search `namePrimary` in `free` mode and `allText` otherwise,
/// cap results at [`MAX_RESULTS`] and project [`HIT_FIELDS`].
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    primary_field: String,
    composite_field: String,
    size: usize,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self {
            primary_field: PRIMARY_NAME_FIELD.to_string(),
            composite_field: COMPOSITE_FIELD.to_string(),
            size: MAX_RESULTS,
        }
    }
}

impl QueryBuilder {
    /// Create a builder with the default fields and result cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the result cap.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Build the query for `mode`.
    ///
    /// Callers short-circuit empty queries before getting here; the text is
    /// trimmed again regardless.
    pub fn build(&self, mode: SearchMode, query: &str) -> StructuredQuery {
        let query = query.trim();
        let clause = match mode {
            SearchMode::Free => self.free_clause(query),
            SearchMode::Any => self.any_clause(query),
            SearchMode::Phrase => self.phrase_clause(query),
        };

        StructuredQuery {
            clause,
            filters: vec![not_deleted()],
            size: self.size,
            source: HIT_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn free_clause(&self, query: &str) -> Clause {
        Clause::Match {
            field: self.primary_field.clone(),
            query: query.to_string(),
            operator: None,
        }
    }

    fn any_clause(&self, query: &str) -> Clause {
        Clause::Match {
            field: self.composite_field.clone(),
            query: query.to_string(),
            operator: Some(Operator::Or),
        }
    }

    fn phrase_clause(&self, query: &str) -> Clause {
        Clause::MatchPhrase {
            field: self.composite_field.clone(),
            query: query.to_string(),
        }
    }
}

fn not_deleted() -> TermFilter {
    TermFilter {
        field: DELETED_FIELD.to_string(),
        value: FieldValue::Boolean(false),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!(SearchMode::parse(Some("free")), SearchMode::Free);
        assert_eq!(SearchMode::parse(Some("any")), SearchMode::Any);
        assert_eq!(SearchMode::parse(Some("phrase")), SearchMode::Phrase);
        assert_eq!(SearchMode::parse(Some("fuzzy")), SearchMode::Free);
        assert_eq!(SearchMode::parse(Some("")), SearchMode::Free);
        assert_eq!(SearchMode::parse(None), SearchMode::Free);
    }

    #[test]
    fn test_mode_parse_is_exact() {
        for name in ["ANY", "Phrase", " phrase ", "any\n"] {
            assert_eq!(SearchMode::parse(Some(name)), SearchMode::Free, "name {name:?}");
        }
    }

    #[test]
    fn test_mode_serialization() {
        assert_eq!(serde_json::to_string(&SearchMode::Phrase).unwrap(), "\"phrase\"");
        assert_eq!(SearchMode::Any.to_string(), "any");
    }

    #[test]
    fn test_free_targets_primary_name_only() {
        let q = QueryBuilder::new().build(SearchMode::Free, "דרך העצמאות");
        assert_eq!(q.clause().field(), "namePrimary");
        assert!(matches!(q.clause(), Clause::Match { operator: None, .. }));
    }

    #[test]
    fn test_any_targets_composite_with_or() {
        let q = QueryBuilder::new().build(SearchMode::Any, "דרך העצמאות");
        assert_eq!(
            q.clause(),
            &Clause::Match {
                field: "allText".to_string(),
                query: "דרך העצמאות".to_string(),
                operator: Some(Operator::Or),
            }
        );
    }

    #[test]
    fn test_phrase_targets_composite() {
        let q = QueryBuilder::new().build(SearchMode::Phrase, "  דרך העצמאות ");
        assert_eq!(
            q.clause(),
            &Clause::MatchPhrase {
                field: "allText".to_string(),
                query: "דרך העצמאות".to_string(),
            }
        );
    }

    #[test]
    fn test_not_deleted_filter_in_every_mode() {
        for mode in [SearchMode::Free, SearchMode::Any, SearchMode::Phrase] {
            let q = QueryBuilder::new().build(mode, "הרצל");
            assert_eq!(q.filters(), &[not_deleted()], "mode {mode}");
        }
    }

    #[test]
    fn test_size_and_projection() {
        let q = QueryBuilder::new().build(SearchMode::Any, "x");
        assert_eq!(q.size(), 200);
        assert_eq!(
            q.source(),
            &["namePrimary", "title", "nameSecondary", "group", "kind", "neighborhood"]
        );
        assert_eq!(QueryBuilder::new().with_size(5).build(SearchMode::Any, "x").size(), 5);
    }

    #[test]
    fn test_free_dsl_shape() {
        let q = QueryBuilder::new().build(SearchMode::Free, "הרצל");
        assert_eq!(
            q.to_dsl(),
            json!({
                "size": 200,
                "_source": ["namePrimary", "title", "nameSecondary", "group", "kind", "neighborhood"],
                "query": {
                    "bool": {
                        "must": [{ "match": { "namePrimary": "הרצל" } }],
                        "filter": [{ "term": { "isDeleted": false } }]
                    }
                }
            })
        );
    }

    #[test]
    fn test_any_and_phrase_dsl_clauses() {
        let any = QueryBuilder::new().build(SearchMode::Any, "a b").to_dsl();
        assert_eq!(
            any["query"]["bool"]["must"][0],
            json!({ "match": { "allText": { "query": "a b", "operator": "or" } } })
        );

        let phrase = QueryBuilder::new().build(SearchMode::Phrase, "a b").to_dsl();
        assert_eq!(
            phrase["query"]["bool"]["must"][0],
            json!({ "match_phrase": { "allText": "a b" } })
        );
    }
}
