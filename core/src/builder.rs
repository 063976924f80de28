use crate::index::{Corpus, DocId, Document, Posting, RawDocument, SearchIndex};
use crate::tokenizer::tokenize;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// How inverse document frequency is computed. Fixed per index and persisted with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdfScheme {
    /// `ln(N / df)`; a term present in every document weighs zero.
    Plain,
    /// `ln(1 + N / df)`; always positive, so even a one-document corpus is searchable.
    #[default]
    Smoothed,
}

impl IdfScheme {
    pub fn idf(self, num_docs: u32, df: u32) -> f32 {
        if num_docs == 0 || df == 0 { return 0.0; }
        let ratio = num_docs as f32 / df as f32;
        match self {
            IdfScheme::Plain => ratio.ln(),
            IdfScheme::Smoothed => (1.0 + ratio).ln(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    pub idf: IdfScheme,
    /// Every title term is counted this many times; body terms once.
    pub title_weight: u32,
}

impl Default for BuildOptions {
    fn default() -> Self { Self { idf: IdfScheme::Smoothed, title_weight: 2 } }
}

/// Log-dampened term frequency, shared by documents and queries.
pub fn tf_weight(count: u32) -> f32 {
    if count > 0 { 1.0 + (count as f32).ln() } else { 0.0 }
}

#[derive(Debug, Clone, Default)]
pub struct IndexBuilder {
    options: BuildOptions,
}

impl IndexBuilder {
    /// A zero title weight is raised to 1 so the stored options always reload.
    pub fn new(options: BuildOptions) -> Self {
        Self { options: BuildOptions { title_weight: options.title_weight.max(1), ..options } }
    }

    pub fn build(&self, raw: Vec<RawDocument>) -> SearchIndex {
        let corpus = Corpus::from_raw(raw);
        let title_weight = self.options.title_weight;

        let counts: Vec<HashMap<String, u32>> = corpus
            .all()
            .par_iter()
            .map(|doc| count_terms(doc, title_weight))
            .collect();

        // Documents are visited in id order, so each posting list comes out sorted.
        let mut by_term: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
        for (doc_id, tf) in counts.into_iter().enumerate() {
            for (term, count) in tf {
                by_term.entry(term).or_default().push(Posting { doc_id: doc_id as DocId, count });
            }
        }

        let mut terms = Vec::with_capacity(by_term.len());
        let mut df = Vec::with_capacity(by_term.len());
        let mut postings = Vec::with_capacity(by_term.len());
        for (term, plist) in by_term {
            terms.push(term);
            df.push(plist.len() as u32);
            postings.push(plist);
        }

        if corpus.is_empty() {
            tracing::warn!("building index from an empty corpus; every search will return no results");
        }
        tracing::info!(num_docs = corpus.len(), num_terms = terms.len(), "index built");
        SearchIndex::from_parts(corpus, terms, df, postings, self.options)
    }
}

// Counts saturate at u32::MAX; a huge title weight must never wrap a count to zero.
fn count_terms(doc: &Document, title_weight: u32) -> HashMap<String, u32> {
    let mut tf: HashMap<String, u32> = HashMap::new();
    for (term, _pos) in tokenize(&doc.title) {
        let count = tf.entry(term).or_insert(0);
        *count = count.saturating_add(title_weight);
    }
    for (term, _pos) in tokenize(&doc.text) {
        let count = tf.entry(term).or_insert(0);
        *count = count.saturating_add(1);
    }
    tf
}

/// Derive idf per term and unit-length weights per posting from raw counts.
/// Documents without any weighted term keep all-zero weights.
pub(crate) fn weigh(num_docs: u32, df: &[u32], postings: &[Vec<Posting>], scheme: IdfScheme) -> (Vec<f32>, Vec<Vec<f32>>) {
    let idf: Vec<f32> = df.iter().map(|&d| scheme.idf(num_docs, d)).collect();

    let mut norms = vec![0.0f32; num_docs as usize];
    let mut weights: Vec<Vec<f32>> = Vec::with_capacity(postings.len());
    for (plist, &idf_t) in postings.iter().zip(idf.iter()) {
        let mut row = Vec::with_capacity(plist.len());
        for p in plist {
            let w = tf_weight(p.count) * idf_t;
            norms[p.doc_id as usize] += w * w;
            row.push(w);
        }
        weights.push(row);
    }
    for norm in norms.iter_mut() {
        *norm = norm.sqrt();
    }

    for (plist, row) in postings.iter().zip(weights.iter_mut()) {
        for (p, w) in plist.iter().zip(row.iter_mut()) {
            let norm = norms[p.doc_id as usize];
            *w = if norm > 0.0 { *w / norm } else { 0.0 };
        }
    }
    (idf, weights)
}
