use crate::error::{Error, Result};
use crate::index::{DocId, InvertedIndex};
use crate::scheme::{Scheme, VectorNorm};
use crate::topk::TopK;
use std::collections::BTreeMap;

/// Sparse term -> weight vector. Ordered so sums accumulate in the same order every run.
pub type SparseVector = BTreeMap<String, f64>;

/// Build the query vector: each distinct term weighted by its count in the query.
///
/// Every term must be in the index vocabulary; the first one that is not fails the whole query.
pub fn query_vector(index: &InvertedIndex, query_terms: &[String]) -> Result<SparseVector> {
    let mut vector = SparseVector::new();
    for term in query_terms {
        if !index.contains_term(term) {
            return Err(Error::UnknownTerm(term.clone()));
        }
        *vector.entry(term.clone()).or_insert(0.0) += 1.0;
    }
    Ok(vector)
}

/// Gather a weighted vector for every document sharing at least one term with the query.
pub fn document_vectors(index: &InvertedIndex, query: &SparseVector, scheme: Scheme) -> BTreeMap<DocId, SparseVector> {
    let mut vectors: BTreeMap<DocId, SparseVector> = BTreeMap::new();
    for term in query.keys() {
        let Some(entry) = index.get(term) else { continue };
        for posting in &entry.postings {
            let weight = scheme.document_weight(posting.term_frequency, index.total_documents, entry.document_frequency);
            vectors.entry(posting.doc_id.clone()).or_default().insert(term.clone(), weight);
        }
    }
    vectors
}

/// Dot product, optionally cosine-normalized.
///
/// Terms missing from either side contribute 0, so summing over the query's terms covers the
/// whole union.
pub fn similarity(query: &SparseVector, doc: &SparseVector, norm: VectorNorm) -> f64 {
    let dot: f64 = query
        .iter()
        .map(|(term, w)| w * doc.get(term).copied().unwrap_or(0.0))
        .sum();
    match norm {
        VectorNorm::None => dot,
        VectorNorm::Cosine => {
            let denom = l2_norm(query) * l2_norm(doc);
            if denom == 0.0 { 0.0 } else { dot / denom }
        }
    }
}

fn l2_norm(v: &SparseVector) -> f64 {
    v.values().map(|w| w * w).sum::<f64>().sqrt()
}

/// Rank documents against `query_terms` and return at most `k` `(doc_id, score)` pairs,
/// best first. Equal scores are ordered by ascending doc id.
pub fn score(index: &InvertedIndex, query_terms: &[String], scheme: Scheme, k: usize) -> Result<Vec<(DocId, f64)>> {
    let query = query_vector(index, query_terms)?;
    let candidates = document_vectors(index, &query, scheme);
    tracing::debug!(%scheme, k, terms = query.len(), candidates = candidates.len(), "scoring query");

    let mut top = TopK::new(k);
    for (doc_id, doc_vector) in candidates {
        let sim = similarity(&query, &doc_vector, scheme.norm);
        top.push(doc_id, sim);
    }
    Ok(top.into_sorted_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;
    use std::collections::HashSet;

    fn terms(ws: &[&str]) -> Vec<String> {
        ws.iter().map(|w| w.to_string()).collect()
    }

    fn two_docs() -> InvertedIndex {
        build_index(vec![("1", terms(&["a", "a", "b"])), ("2", terms(&["b", "c"]))])
    }

    #[test]
    fn nnn_tie_is_broken_by_ascending_doc_id() {
        let index = two_docs();
        let out = score(&index, &terms(&["b"]), "nnn".parse().unwrap(), 2).unwrap();
        assert_eq!(out, vec![("1".to_string(), 1.0), ("2".to_string(), 1.0)]);
    }

    #[test]
    fn ntc_single_shared_term_is_unit_cosine() {
        let index = two_docs();
        let query = query_vector(&index, &terms(&["a"])).unwrap();
        let docs = document_vectors(&index, &query, "ntc".parse().unwrap());
        let w = docs["1"]["a"];
        assert!((w - 2.0 * 2f64.log10()).abs() < 1e-9, "{w}");

        let out = score(&index, &terms(&["a"]), "ntc".parse().unwrap(), 5).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, "1");
        assert!((out[0].1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_term_fails_whole_query() {
        let index = two_docs();
        let err = score(&index, &terms(&["a", "zebra"]), Scheme::default(), 10).unwrap_err();
        assert!(matches!(err, Error::UnknownTerm(ref t) if t == "zebra"));
    }

    #[test]
    fn empty_index_rejects_every_term() {
        let index = InvertedIndex::new();
        assert!(matches!(score(&index, &terms(&["a"]), Scheme::default(), 1), Err(Error::UnknownTerm(_))));
    }

    #[test]
    fn repeated_query_terms_raise_query_weight() {
        let index = two_docs();
        let q = query_vector(&index, &terms(&["b", "a", "b"])).unwrap();
        assert_eq!(q["b"], 2.0);
        assert_eq!(q["a"], 1.0);
    }

    #[test]
    fn raw_dot_product_without_normalization() {
        let index = two_docs();
        // doc 1: a=2, b=1; query a=1, b=1 -> 3. doc 2: b=1 -> 1
        let out = score(&index, &terms(&["a", "b"]), "nnn".parse().unwrap(), 10).unwrap();
        assert_eq!(out, vec![("1".to_string(), 3.0), ("2".to_string(), 1.0)]);
    }

    #[test]
    fn log_tf_weights_documents() {
        let index = build_index(vec![("x", vec!["t".to_string(); 10]), ("y", terms(&["t"]))]);
        let out = score(&index, &terms(&["t"]), "lnn".parse().unwrap(), 10).unwrap();
        assert_eq!(out[0].0, "x");
        assert!((out[0].1 - 2.0).abs() < 1e-12);
        assert!((out[1].1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn idf_zero_when_term_in_every_document() {
        let index = build_index(vec![("1", terms(&["t"])), ("2", terms(&["t"]))]);
        let out = score(&index, &terms(&["t"]), "ntc".parse().unwrap(), 10).unwrap();
        // both candidates score 0, cosine guarded against zero norms
        assert_eq!(out, vec![("1".to_string(), 0.0), ("2".to_string(), 0.0)]);
    }

    #[test]
    fn only_documents_sharing_a_term_are_returned() {
        let index = build_index(vec![
            ("1", terms(&["a"])),
            ("2", terms(&["b"])),
            ("3", terms(&["a", "b"])),
            ("4", terms(&["c"])),
        ]);
        let out = score(&index, &terms(&["a"]), Scheme::default(), 10).unwrap();
        let ids: HashSet<&str> = out.iter().map(|(d, _)| d.as_str()).collect();
        assert_eq!(ids, HashSet::from(["1", "3"]));
    }

    #[test]
    fn k_truncates() {
        let index = build_index((0..20).map(|i| (i.to_string(), vec!["w".to_string(); i + 1])).collect::<Vec<_>>());
        let out = score(&index, &terms(&["w"]), "nnn".parse().unwrap(), 3).unwrap();
        let ids: Vec<&str> = out.iter().map(|(d, _)| d.as_str()).collect();
        assert_eq!(ids, vec!["19", "18", "17"]);
    }

    #[test]
    fn identical_vectors_tie_exactly_and_order_by_doc_id() {
        let doc = |counts: &[(&str, usize)]| -> Vec<String> {
            counts.iter().flat_map(|(t, n)| std::iter::repeat(t.to_string()).take(*n)).collect()
        };
        let counts = [("a", 2), ("b", 3), ("c", 7), ("d", 5), ("e", 11), ("f", 13)];
        let index = build_index(vec![("1", doc(&counts)), ("2", doc(&counts)), ("3", doc(&[("a", 1)]))]);
        let query = terms(&["a", "b", "c", "d", "e", "f"]);
        for scheme in ["ltn", "ltc", "lnn", "nnc"] {
            let first = score(&index, &query, scheme.parse().unwrap(), 2).unwrap();
            assert_eq!(first[0].0, "1", "{scheme}");
            assert_eq!(first[1].0, "2", "{scheme}");
            assert_eq!(first[0].1.to_bits(), first[1].1.to_bits(), "{scheme}");
            for _ in 0..200 {
                assert_eq!(score(&index, &query, scheme.parse().unwrap(), 2).unwrap(), first, "{scheme}");
            }
        }
    }

    #[test]
    fn cosine_guards_zero_norm() {
        let q = SparseVector::from([("a".to_string(), 1.0)]);
        assert_eq!(similarity(&q, &SparseVector::new(), VectorNorm::Cosine), 0.0);
    }
}
