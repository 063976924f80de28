use crate::builder::{self, BuildOptions};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type TermId = u32;
pub type DocId = u32;

/// One ordinance section as served to callers. `id` is the section's position in the corpus snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub chapter: String,
    pub section: String,
    pub title: String,
    pub text: String,
    pub url: String,
}

/// A section as it arrives from ingestion, before it has an id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub chapter: String,
    #[serde(default, alias = "section_number")]
    pub section: String,
    #[serde(default)]
    pub title: String,
    #[serde(alias = "content")]
    pub text: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Raw occurrence count of a term in one document. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Corpus {
    docs: Vec<Document>,
}

impl Corpus {
    pub fn from_raw(raw: Vec<RawDocument>) -> Self {
        let docs = raw
            .into_iter()
            .enumerate()
            .map(|(i, r)| Document {
                id: i as DocId,
                chapter: r.chapter,
                section: r.section,
                title: r.title,
                text: r.text,
                url: r.url.unwrap_or_default(),
            })
            .collect();
        Self { docs }
    }

    /// Wrap already-numbered documents; ids must equal positions.
    pub fn from_documents(docs: Vec<Document>) -> Result<Self> {
        if let Some((pos, doc)) = docs.iter().enumerate().find(|(i, d)| d.id as usize != *i) {
            return Err(Error::Format(format!("document at position {pos} has id {}", doc.id)));
        }
        Ok(Self { docs })
    }

    pub fn get(&self, id: DocId) -> Result<&Document> {
        self.docs
            .get(id as usize)
            .ok_or_else(|| Error::NotFound(format!("ordinance {id}")))
    }

    pub fn all(&self) -> &[Document] { &self.docs }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    /// First section whose title contains `fragment`, ignoring case.
    pub fn find_by_title(&self, fragment: &str) -> Result<&Document> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return Err(Error::InvalidArgument("title must not be empty".into()));
        }
        self.docs
            .iter()
            .find(|d| d.title.to_lowercase().contains(&needle))
            .ok_or_else(|| Error::NotFound(format!("no ordinance with title matching {fragment:?}")))
    }
}

pub fn parse_doc_id(raw: &str) -> Result<DocId> {
    raw.trim()
        .parse::<DocId>()
        .map_err(|_| Error::InvalidArgument(format!("malformed ordinance id {raw:?}")))
}

/// Immutable TF-IDF index over one corpus snapshot.
///
/// Only the raw integer tables (`df`, `postings`) are authoritative; `idf` and the
/// unit-length document weights are derived from them whenever an index is assembled.
#[derive(Debug)]
pub struct SearchIndex {
    pub(crate) corpus: Corpus,
    pub(crate) terms: Vec<String>,
    pub(crate) dictionary: HashMap<String, TermId>,
    pub(crate) df: Vec<u32>,
    pub(crate) postings: Vec<Vec<Posting>>, // sorted by doc_id
    pub(crate) idf: Vec<f32>,
    pub(crate) weights: Vec<Vec<f32>>, // parallel to postings
    pub(crate) options: BuildOptions,
}

impl SearchIndex {
    pub(crate) fn from_parts(
        corpus: Corpus,
        terms: Vec<String>,
        df: Vec<u32>,
        postings: Vec<Vec<Posting>>,
        options: BuildOptions,
    ) -> Self {
        let dictionary = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i as TermId))
            .collect();
        let (idf, weights) = builder::weigh(corpus.len() as u32, &df, &postings, options.idf);
        Self { corpus, terms, dictionary, df, postings, idf, weights, options }
    }

    pub fn corpus(&self) -> &Corpus { &self.corpus }

    pub fn options(&self) -> BuildOptions { self.options }

    pub fn num_docs(&self) -> usize { self.corpus.len() }

    pub fn num_terms(&self) -> usize { self.terms.len() }

    pub fn num_postings(&self) -> usize { self.postings.iter().map(Vec::len).sum() }

    /// True for the degenerate index built from an empty corpus.
    pub fn is_empty(&self) -> bool { self.corpus.is_empty() }

    /// Terms in id order.
    pub fn terms(&self) -> &[String] { &self.terms }

    pub fn df(&self, term: &str) -> Option<u32> {
        self.dictionary.get(term).map(|&tid| self.df[tid as usize])
    }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.dictionary.get(term).map(|&tid| self.idf[tid as usize])
    }

    pub fn postings(&self, term: &str) -> Option<&[Posting]> {
        self.dictionary.get(term).map(|&tid| self.postings[tid as usize].as_slice())
    }

    pub fn get_details(&self, id: DocId) -> Result<&Document> { self.corpus.get(id) }

    /// Nonzero TF-IDF weights of one document, in term order.
    pub fn document_vector(&self, id: DocId) -> Result<Vec<(&str, f32)>> {
        self.corpus.get(id)?;
        let mut vector = Vec::new();
        for (tid, plist) in self.postings.iter().enumerate() {
            if let Ok(pos) = plist.binary_search_by_key(&id, |p| p.doc_id) {
                let w = self.weights[tid][pos];
                if w != 0.0 {
                    vector.push((self.terms[tid].as_str(), w));
                }
            }
        }
        Ok(vector)
    }
}
