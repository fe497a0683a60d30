pub mod collection;
pub mod engine;
pub mod error;
pub mod eval;
pub mod index;
pub mod persist;
pub mod scheme;
pub mod scorer;
pub mod tokenizer;
pub mod topk;

pub use error::{Error, Result};
pub use index::{build_index, build_index_parallel, DocId, InvertedIndex, Posting, TermEntry};
pub use scheme::{DocumentFrequency, Scheme, TermFrequency, VectorNorm};
pub use scorer::score;
pub use tokenizer::TextNormalization;
