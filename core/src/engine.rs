use crate::error::Result;
use crate::index::{DocId, InvertedIndex};
use crate::persist::{check_collection_name, load_index, IndexPaths};
use crate::scheme::Scheme;
use crate::scorer::score;
use crate::tokenizer::{normalize, TextNormalization};

/// Normalize `text` the same way the index was built, then rank.
pub fn answer(index: &InvertedIndex, text: &str, method: TextNormalization, scheme: Scheme, k: usize) -> Result<Vec<(DocId, f64)>> {
    let terms = normalize(text, method);
    score(index, &terms, scheme, k)
}

/// Render answers as `doc:score` pairs, tab separated, scores to three decimals.
pub fn render_answers(answers: &[(DocId, f64)]) -> String {
    answers
        .iter()
        .map(|(doc_id, score)| format!("{doc_id}:{score:.3}"))
        .collect::<Vec<_>>()
        .join("\t")
}

/// Query entry point over persisted indexes. Each call loads the index it needs; callers
/// that issue many queries should load once and use [`answer`] directly.
pub struct QueryEngine {
    paths: IndexPaths,
}

impl QueryEngine {
    pub fn new(paths: IndexPaths) -> Self { Self { paths } }

    pub fn paths(&self) -> &IndexPaths { &self.paths }

    pub fn load(&self, collection: &str, method: TextNormalization) -> Result<InvertedIndex> {
        check_collection_name(collection)?;
        load_index(&self.paths, collection, method)
    }

    pub fn answer(&self, collection: &str, scheme: Scheme, method: TextNormalization, k: usize, text: &str) -> Result<Vec<(DocId, f64)>> {
        let index = self.load(collection, method)?;
        tracing::info!(collection, %scheme, %method, k, num_docs = index.total_documents, "answering query");
        answer(&index, text, method, scheme, k)
    }
}
