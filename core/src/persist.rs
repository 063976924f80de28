use crate::builder::BuildOptions;
use crate::index::{Corpus, Document, Posting, SearchIndex};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};

/// Bumped whenever the on-disk layout changes; older artifacts are refused.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksums {
    pub dictionary: String,
    pub docs: String,
    pub postings: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub version: u32,
    pub created_at: String,
    pub num_docs: u32,
    pub num_terms: u32,
    pub num_postings: u64,
    pub options: BuildOptions,
    pub checksums: Checksums,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn dictionary(&self) -> PathBuf { self.root.join("dictionary.bin") }
    pub fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    pub fn postings(&self) -> PathBuf { self.root.join("postings.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// Write the index as raw integer tables. `meta.json` goes last and carries the
/// checksums of the binary files, so a half-written directory never loads.
pub fn save(index: &SearchIndex, paths: &IndexPaths) -> Result<MetaFile> {
    create_dir_all(&paths.root)?;
    let dictionary = write_bin(&paths.dictionary(), &(&index.terms, &index.df))?;
    let docs = write_bin(&paths.docs(), &index.corpus.all())?;
    let postings = write_bin(&paths.postings(), &index.postings)?;

    let meta = MetaFile {
        version: FORMAT_VERSION,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        num_docs: index.num_docs() as u32,
        num_terms: index.num_terms() as u32,
        num_postings: index.num_postings() as u64,
        options: index.options,
        checksums: Checksums { dictionary, docs, postings },
    };
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, num_terms = meta.num_terms, "index saved");
    Ok(meta)
}

/// Load and verify a saved index, recomputing weights from the stored counts.
pub fn load(paths: &IndexPaths) -> Result<SearchIndex> {
    let meta = load_meta(paths)?;
    if meta.version != FORMAT_VERSION {
        return Err(Error::Format(format!(
            "index version {} is not supported (expected {FORMAT_VERSION})",
            meta.version
        )));
    }
    let (terms, df): (Vec<String>, Vec<u32>) = read_bin(&paths.dictionary(), &meta.checksums.dictionary, "dictionary")?;
    let docs: Vec<Document> = read_bin(&paths.docs(), &meta.checksums.docs, "docs")?;
    let postings: Vec<Vec<Posting>> = read_bin(&paths.postings(), &meta.checksums.postings, "postings")?;

    verify(&meta, &terms, &df, &docs, &postings)?;
    let corpus = Corpus::from_documents(docs)?;
    let index = SearchIndex::from_parts(corpus, terms, df, postings, meta.options);
    tracing::info!(root = %paths.root.display(), num_docs = index.num_docs(), num_terms = index.num_terms(), "index loaded");
    Ok(index)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    fs::write(paths.meta(), serde_json::to_string_pretty(meta)?)?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let json = fs::read_to_string(paths.meta())?;
    Ok(serde_json::from_str(&json)?)
}

fn write_bin<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<String> {
    let bytes = bincode::serialize(value)?;
    fs::write(path, &bytes)?;
    Ok(digest(&bytes))
}

fn read_bin<T: DeserializeOwned>(path: &Path, expected: &str, what: &str) -> Result<T> {
    let bytes = fs::read(path)?;
    if digest(&bytes) != expected {
        return Err(Error::Format(format!("{what} checksum mismatch")));
    }
    Ok(bincode::deserialize(&bytes)?)
}

fn digest(bytes: &[u8]) -> String {
    Sha1::digest(bytes).iter().map(|b| format!("{b:02x}")).collect()
}

/// Cross-check the decoded tables against each other and against the header.
fn verify(meta: &MetaFile, terms: &[String], df: &[u32], docs: &[Document], postings: &[Vec<Posting>]) -> Result<()> {
    let fail = |msg: String| Err(Error::Format(msg));
    let n = docs.len();
    if meta.num_docs as usize != n {
        return fail(format!("header lists {} documents, found {n}", meta.num_docs));
    }
    if meta.num_terms as usize != terms.len() || terms.len() != df.len() || df.len() != postings.len() {
        return fail(format!(
            "term tables disagree: header {}, terms {}, df {}, postings {}",
            meta.num_terms,
            terms.len(),
            df.len(),
            postings.len()
        ));
    }
    if meta.options.title_weight == 0 {
        return fail("title weight must be at least 1".into());
    }
    if let Some(pair) = terms.windows(2).find(|w| w[0] >= w[1]) {
        return fail(format!("dictionary out of order at {:?}", pair[1]));
    }

    let mut total: u64 = 0;
    for (tid, plist) in postings.iter().enumerate() {
        let term = &terms[tid];
        if df[tid] as usize != plist.len() {
            return fail(format!("df of {term:?} is {} but it has {} postings", df[tid], plist.len()));
        }
        if plist.is_empty() || plist.len() > n {
            return fail(format!("df of {term:?} outside 1..={n}"));
        }
        for (i, p) in plist.iter().enumerate() {
            if p.count == 0 {
                return fail(format!("zero count posting for {term:?}"));
            }
            if p.doc_id as usize >= n {
                return fail(format!("posting for {term:?} references missing document {}", p.doc_id));
            }
            if i > 0 && plist[i - 1].doc_id >= p.doc_id {
                return fail(format!("postings for {term:?} not strictly ordered"));
            }
        }
        total += plist.len() as u64;
    }
    if total != meta.num_postings {
        return fail(format!("header lists {} postings, found {total}", meta.num_postings));
    }
    Ok(())
}
