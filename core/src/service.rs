use crate::index::{parse_doc_id, Document, SearchIndex};
use crate::query::ScoredResult;
use crate::snippet::SnippetOptions;
use crate::{Error, Result};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub total_hits: usize,
    pub results: Vec<ScoredResult>,
}

/// Request/response operations over one loaded index.
///
/// Cloning is cheap and every clone reads the same immutable index, so handlers on
/// any number of threads can share it without locking.
#[derive(Clone)]
pub struct OrdinanceService {
    index: Arc<SearchIndex>,
    snippets: SnippetOptions,
}

impl OrdinanceService {
    pub fn new(index: SearchIndex) -> Self { Self::from_shared(Arc::new(index)) }

    pub fn from_shared(index: Arc<SearchIndex>) -> Self {
        Self { index, snippets: SnippetOptions::default() }
    }

    pub fn with_snippets(mut self, snippets: SnippetOptions) -> Self {
        self.snippets = snippets;
        self
    }

    pub fn index(&self) -> &SearchIndex { &self.index }

    pub fn search_ordinance(&self, query: &str, top_k: i64) -> Result<SearchResponse> {
        let k = usize::try_from(top_k)
            .ok()
            .filter(|&k| k > 0)
            .ok_or_else(|| Error::InvalidArgument(format!("top_k must be positive, got {top_k}")))?;
        let page = self.index.query(query, k, &self.snippets)?;
        Ok(SearchResponse { query: query.to_string(), total_hits: page.total_hits, results: page.results })
    }

    pub fn get_ordinance_details(&self, id: &str) -> Result<Document> {
        let id = parse_doc_id(id)?;
        self.index.get_details(id).cloned()
    }

    pub fn find_ordinance_by_title(&self, title: &str) -> Result<Document> {
        self.index.corpus().find_by_title(title).cloned()
    }
}
