use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type DocId = String;

/// One document's occurrence count for a term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u32, DocId)", into = "(u32, DocId)")]
pub struct Posting {
    pub term_frequency: u32, // always >= 1
    pub doc_id: DocId,
}

impl From<(u32, DocId)> for Posting {
    fn from((term_frequency, doc_id): (u32, DocId)) -> Self {
        Self { term_frequency, doc_id }
    }
}

impl From<Posting> for (u32, DocId) {
    fn from(p: Posting) -> Self {
        (p.term_frequency, p.doc_id)
    }
}

/// Document frequency plus postings; serialized as `[df, [[tf, docID], ...]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u32, Vec<Posting>)", into = "(u32, Vec<Posting>)")]
pub struct TermEntry {
    pub document_frequency: u32,
    pub postings: Vec<Posting>, // sorted by descending term frequency
}

impl From<(u32, Vec<Posting>)> for TermEntry {
    fn from((document_frequency, postings): (u32, Vec<Posting>)) -> Self {
        Self { document_frequency, postings }
    }
}

impl From<TermEntry> for (u32, Vec<Posting>) {
    fn from(e: TermEntry) -> Self {
        (e.document_frequency, e.postings)
    }
}

/// Term-level inverted index over a fixed document snapshot.
///
/// The document count lives in its own field so that no term can collide with it.
/// Terms are kept in a `BTreeMap` so two builds over the same input serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub total_documents: u32,
    pub terms: BTreeMap<String, TermEntry>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, term: &str) -> Option<&TermEntry> { self.terms.get(term) }

    pub fn contains_term(&self, term: &str) -> bool { self.terms.contains_key(term) }

    pub fn num_terms(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.total_documents == 0 }
}

/// Build an inverted index from already-normalized documents.
///
/// Documents are processed in iteration order, which decides the order of postings that
/// share a term frequency. A repeated document id replaces the earlier document's terms but
/// keeps its position, so each id is counted once.
pub fn build_index<I, D>(documents: I) -> InvertedIndex
where
    I: IntoIterator<Item = (D, Vec<String>)>,
    D: Into<DocId>,
{
    let counted = documents
        .into_iter()
        .map(|(doc_id, terms)| -> (DocId, HashMap<String, u32>) { (doc_id.into(), count_terms(&terms)) });
    merge_counts(counted)
}

/// Same result as [`build_index`], with per-document counting spread over the rayon pool.
pub fn build_index_parallel<D>(documents: Vec<(D, Vec<String>)>) -> InvertedIndex
where
    D: Into<DocId> + Send,
{
    // collect() on an indexed parallel iterator keeps input order
    let counted: Vec<(DocId, HashMap<String, u32>)> = documents
        .into_par_iter()
        .map(|(doc_id, terms)| -> (DocId, HashMap<String, u32>) { (doc_id.into(), count_terms(&terms)) })
        .collect();
    merge_counts(counted)
}

fn count_terms(terms: &[String]) -> HashMap<String, u32> {
    let mut tf_counts: HashMap<String, u32> = HashMap::new();
    for term in terms {
        *tf_counts.entry(term.clone()).or_insert(0) += 1;
    }
    tf_counts
}

fn merge_counts<I>(counted: I) -> InvertedIndex
where
    I: IntoIterator<Item = (DocId, HashMap<String, u32>)>,
{
    let mut documents: Vec<(DocId, HashMap<String, u32>)> = Vec::new();
    let mut positions: HashMap<DocId, usize> = HashMap::new();
    for (doc_id, tf_counts) in counted {
        match positions.get(&doc_id) {
            Some(&pos) => {
                tracing::warn!(%doc_id, "duplicate document id, keeping the later document");
                documents[pos].1 = tf_counts;
            }
            None => {
                positions.insert(doc_id.clone(), documents.len());
                documents.push((doc_id, tf_counts));
            }
        }
    }

    let num_docs = documents.len() as u32;
    let mut postings_raw: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
    for (doc_id, tf_counts) in documents {
        for (term, term_frequency) in tf_counts {
            postings_raw.entry(term).or_default().push(Posting { term_frequency, doc_id: doc_id.clone() });
        }
    }

    let terms = postings_raw
        .into_iter()
        .map(|(term, mut postings)| {
            // stable: equal frequencies stay in document order
            postings.sort_by(|a, b| b.term_frequency.cmp(&a.term_frequency));
            let document_frequency = postings.len() as u32;
            (term, TermEntry { document_frequency, postings })
        })
        .collect::<BTreeMap<_, _>>();

    tracing::debug!(num_docs, num_terms = terms.len(), "built inverted index");
    InvertedIndex { total_documents: num_docs, terms }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn terms(ws: &[&str]) -> Vec<String> {
        ws.iter().map(|w| w.to_string()).collect()
    }

    fn two_docs() -> InvertedIndex {
        build_index(vec![("1", terms(&["a", "a", "b"])), ("2", terms(&["b", "c"]))])
    }

    #[test]
    fn two_document_scenario() {
        let index = two_docs();
        assert_eq!(index.total_documents, 2);
        assert_eq!(index.get("a"), Some(&TermEntry::from((1, vec![Posting::from((2, "1".to_string()))]))));
        assert_eq!(
            index.get("b"),
            Some(&TermEntry::from((2, vec![Posting::from((1, "1".to_string())), Posting::from((1, "2".to_string()))])))
        );
        assert_eq!(index.get("c"), Some(&TermEntry::from((1, vec![Posting::from((1, "2".to_string()))]))));
        assert_eq!(index.num_terms(), 3);
    }

    #[test]
    fn empty_input_has_no_terms() {
        let index = build_index(Vec::<(String, Vec<String>)>::new());
        assert_eq!(index.total_documents, 0);
        assert!(index.terms.is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn document_without_terms_still_counts() {
        let index = build_index(vec![("1", terms(&["x"])), ("2", vec![])]);
        assert_eq!(index.total_documents, 2);
        assert_eq!(index.num_terms(), 1);
    }

    #[test]
    fn postings_sorted_by_descending_frequency() {
        let index = build_index(vec![
            ("d1", terms(&["t"])),
            ("d2", terms(&["t", "t", "t"])),
            ("d3", terms(&["t", "t"])),
            ("d4", terms(&["t"])),
        ]);
        let order: Vec<(u32, &str)> = index.get("t").unwrap().postings.iter().map(|p| (p.term_frequency, p.doc_id.as_str())).collect();
        assert_eq!(order, vec![(3, "d2"), (2, "d3"), (1, "d1"), (1, "d4")]);
    }

    #[test]
    fn document_frequency_matches_distinct_postings() {
        let index = build_index(vec![
            ("1", terms(&["x", "y", "x", "z"])),
            ("2", terms(&["y", "y"])),
            ("3", terms(&["z", "x"])),
        ]);
        for entry in index.terms.values() {
            let distinct: HashSet<&str> = entry.postings.iter().map(|p| p.doc_id.as_str()).collect();
            assert_eq!(entry.document_frequency as usize, entry.postings.len());
            assert_eq!(distinct.len(), entry.postings.len());
            assert!(!entry.postings.is_empty());
        }
    }

    #[test]
    fn repeated_document_id_counts_once_and_later_text_wins() {
        let index = build_index(vec![
            ("7", terms(&["old", "shared"])),
            ("8", terms(&["shared"])),
            ("7", terms(&["new", "shared", "shared"])),
        ]);
        assert_eq!(index.total_documents, 2);
        assert!(!index.contains_term("old"));
        assert_eq!(index.get("new"), Some(&TermEntry::from((1, vec![Posting::from((1, "7".to_string()))]))));
        let shared = index.get("shared").unwrap();
        assert_eq!(shared.document_frequency, 2);
        assert_eq!(shared.postings, vec![Posting::from((2, "7".to_string())), Posting::from((1, "8".to_string()))]);
        assert!(index.terms.values().all(|e| e.document_frequency <= index.total_documents));
    }

    #[test]
    fn parallel_build_matches_sequential() {
        let docs: Vec<(String, Vec<String>)> = (0..50)
            .map(|i| (i.to_string(), terms(&["common", if i % 2 == 0 { "even" } else { "odd" }, "common"])))
            .collect();
        assert_eq!(build_index(docs.clone()), build_index_parallel(docs));
    }

    #[test]
    fn serializes_with_out_of_band_document_count() {
        let json = serde_json::to_value(two_docs()).unwrap();
        assert_eq!(json["total_documents"], 2);
        assert_eq!(json["terms"]["a"], serde_json::json!([1, [[2, "1"]]]));
        assert!(json["terms"].get("_M_").is_none());
    }
}
