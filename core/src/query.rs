use crate::builder::tf_weight;
use crate::index::{DocId, Document, SearchIndex, TermId};
use crate::snippet::{snippet, SnippetOptions};
use crate::tokenizer::normalize;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Citation fields of a matched section; the full text is fetched separately.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub id: DocId,
    pub chapter: String,
    pub section: String,
    pub title: String,
    pub url: String,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            chapter: doc.chapter.clone(),
            section: doc.section.clone(),
            title: doc.title.clone(),
            url: doc.url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredResult {
    #[serde(flatten)]
    pub summary: DocumentSummary,
    pub score: f32,
    pub snippet: String,
    /// Normalized query terms found in this document, sorted.
    pub matched_terms: Vec<String>,
}

/// One ranked page plus the number of documents that matched at all.
#[derive(Debug, Clone)]
pub struct ResultPage {
    pub total_hits: usize,
    pub results: Vec<ScoredResult>,
}

impl SearchIndex {
    /// Cosine-ranked search returning at most `top_k` results, best first.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredResult>> {
        self.query(query, top_k, &SnippetOptions::default()).map(|page| page.results)
    }

    pub fn query(&self, query: &str, top_k: usize, snippets: &SnippetOptions) -> Result<ResultPage> {
        if top_k == 0 {
            return Err(Error::InvalidArgument("top_k must be positive".into()));
        }

        // Query as a pseudo-document; terms outside the dictionary are dropped.
        let mut tf_q: BTreeMap<TermId, u32> = BTreeMap::new();
        for term in normalize(query) {
            if let Some(&tid) = self.dictionary.get(&term) {
                *tf_q.entry(tid).or_insert(0) += 1;
            }
        }
        let mut q_weights: Vec<(TermId, f32)> = tf_q
            .into_iter()
            .map(|(tid, count)| (tid, tf_weight(count) * self.idf[tid as usize]))
            .filter(|(_, w)| *w > 0.0)
            .collect();
        let norm = q_weights.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm == 0.0 {
            tracing::debug!(query, "no weighted query terms");
            return Ok(ResultPage { total_hits: 0, results: Vec::new() });
        }
        for (_, w) in q_weights.iter_mut() {
            *w /= norm;
        }

        // Only documents reachable through a query term's postings are scored.
        let mut scores: HashMap<DocId, f32> = HashMap::new();
        let mut matched: HashMap<DocId, Vec<TermId>> = HashMap::new();
        for &(tid, q_w) in &q_weights {
            let plist = &self.postings[tid as usize];
            let weights = &self.weights[tid as usize];
            for (p, &d_w) in plist.iter().zip(weights.iter()) {
                if d_w <= 0.0 { continue; }
                *scores.entry(p.doc_id).or_insert(0.0) += d_w * q_w;
                matched.entry(p.doc_id).or_default().push(tid);
            }
        }

        let mut scored: Vec<(DocId, f32)> = scores.into_iter().collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let total_hits = scored.len();
        scored.truncate(top_k);
        tracing::debug!(query, total_hits, returned = scored.len(), "search complete");

        let query_terms: HashSet<String> = q_weights
            .iter()
            .map(|(tid, _)| self.terms[*tid as usize].clone())
            .collect();
        let mut results = Vec::with_capacity(scored.len());
        for (doc_id, score) in scored {
            let doc = self.corpus.get(doc_id)?;
            // term ids follow lexicographic term order, so this list is already sorted
            let matched_terms = matched
                .remove(&doc_id)
                .unwrap_or_default()
                .into_iter()
                .map(|tid| self.terms[tid as usize].clone())
                .collect();
            results.push(ScoredResult {
                summary: DocumentSummary::from(doc),
                score,
                snippet: snippet(&doc.text, &query_terms, snippets),
                matched_terms,
            });
        }
        Ok(ResultPage { total_hits, results })
    }
}
