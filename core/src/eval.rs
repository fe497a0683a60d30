//! Retrieval quality metrics and the in-process evaluation loop.

use crate::collection::{QueryId, Relevance};
use crate::engine::answer;
use crate::error::{Error, Result};
use crate::index::{DocId, InvertedIndex};
use crate::scheme::Scheme;
use crate::tokenizer::TextNormalization;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Mean reciprocal rank.
    Mrr,
    /// Mean average precision.
    Map,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Map, Metric::Mrr];

    pub fn score(self, found: &[DocId], relevant: &HashSet<DocId>) -> f64 {
        match self {
            Metric::Mrr => reciprocal_rank(found, relevant),
            Metric::Map => average_precision(found, relevant),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Mrr => f.write_str("mrr"),
            Metric::Map => f.write_str("map"),
        }
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mrr" => Ok(Metric::Mrr),
            "map" => Ok(Metric::Map),
            other => Err(Error::InvalidMetric(other.to_string())),
        }
    }
}

/// `1 / rank` of the first relevant document, 0 if none was returned.
pub fn reciprocal_rank(found: &[DocId], relevant: &HashSet<DocId>) -> f64 {
    found
        .iter()
        .position(|d| relevant.contains(d))
        .map(|i| 1.0 / (i + 1) as f64)
        .unwrap_or(0.0)
}

/// Sum of precision at each hit, divided by the number of relevant documents for the query
/// (not the number of hits), so relevant documents that were never returned count against it.
pub fn average_precision(found: &[DocId], relevant: &HashSet<DocId>) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    let mut hits = 0usize;
    let mut sum = 0.0;
    for (i, doc_id) in found.iter().enumerate() {
        if relevant.contains(doc_id) {
            hits += 1;
            sum += hits as f64 / (i + 1) as f64;
        }
    }
    sum / relevant.len() as f64
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() { 0.0 } else { values.iter().sum::<f64>() / values.len() as f64 }
}

/// Run every query against `index` and average `metric` over them.
///
/// A query with an out-of-vocabulary term is counted as returning nothing.
pub fn evaluate(
    index: &InvertedIndex,
    queries: &[(QueryId, String)],
    relevance: &Relevance,
    method: TextNormalization,
    scheme: Scheme,
    k: usize,
    metric: Metric,
) -> Result<f64> {
    let empty = HashSet::new();
    let mut per_query = Vec::with_capacity(queries.len());
    for (query_id, text) in queries {
        let found: Vec<DocId> = match answer(index, text, method, scheme, k) {
            Ok(answers) => answers.into_iter().map(|(d, _)| d).collect(),
            Err(Error::UnknownTerm(term)) => {
                tracing::warn!(query_id = %query_id, term = %term, "query has out-of-vocabulary term, counting as no answers");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        let relevant = relevance.get(query_id).unwrap_or(&empty);
        per_query.push(metric.score(&found, relevant));
    }
    let value = mean(&per_query);
    tracing::debug!(%scheme, %method, %metric, k, queries = queries.len(), value, "evaluated");
    Ok(value)
}
