use crate::index::DocId;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// A scored candidate ordered by score, then by *descending* doc id, so that among equal
/// scores the smaller id ranks higher.
#[derive(Debug, Clone)]
struct Candidate {
    score: f64,
    doc_id: DocId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool { self.cmp(other) == Ordering::Equal }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.total_cmp(&other.score).then_with(|| other.doc_id.cmp(&self.doc_id))
    }
}

/// Bounded selection of the `k` best candidates from a stream.
///
/// Keeps a min-heap of at most `k` entries; each push is O(log k).
pub struct TopK {
    k: usize,
    heap: BinaryHeap<Reverse<Candidate>>,
}

impl TopK {
    pub fn new(k: usize) -> Self {
        Self { k, heap: BinaryHeap::with_capacity(k + 1) }
    }

    pub fn push(&mut self, doc_id: DocId, score: f64) {
        if self.k == 0 {
            return;
        }
        self.heap.push(Reverse(Candidate { score, doc_id }));
        if self.heap.len() > self.k {
            self.heap.pop();
        }
    }

    pub fn len(&self) -> usize { self.heap.len() }

    pub fn is_empty(&self) -> bool { self.heap.is_empty() }

    /// Best first: descending score, ascending doc id on ties.
    pub fn into_sorted_vec(self) -> Vec<(DocId, f64)> {
        // ascending order of Reverse<_> is descending order of Candidate
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(c)| (c.doc_id, c.score))
            .collect()
    }
}
