pub mod builder;
pub mod error;
pub mod index;
pub mod persist;
pub mod query;
pub mod service;
pub mod snippet;
pub mod tokenizer;

pub use builder::{BuildOptions, IdfScheme, IndexBuilder};
pub use error::{Error, Result};
pub use index::*;
pub use query::{DocumentSummary, ScoredResult};
pub use service::{OrdinanceService, SearchResponse};
