//! SMART-style weighting schemes: one letter each for tf, df and normalization.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Term-frequency transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermFrequency {
    /// `n`: raw count.
    Natural,
    /// `l`: `log10(tf) + 1`.
    Log,
}

/// Document-frequency transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFrequency {
    /// `n`: weight 1.
    None,
    /// `t`: `log10(M / df)`, 0 when either side is 0.
    Idf,
}

/// Similarity normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorNorm {
    /// `n`: raw dot product.
    None,
    /// `c`: dot product over the product of L2 norms.
    Cosine,
}

impl TermFrequency {
    pub fn weight(self, term_frequency: u32) -> f64 {
        match self {
            TermFrequency::Natural => term_frequency as f64,
            TermFrequency::Log if term_frequency > 0 => (term_frequency as f64).log10() + 1.0,
            TermFrequency::Log => 0.0,
        }
    }

    fn code(self) -> char {
        match self {
            TermFrequency::Natural => 'n',
            TermFrequency::Log => 'l',
        }
    }
}

impl DocumentFrequency {
    pub fn weight(self, total_documents: u32, document_frequency: u32) -> f64 {
        match self {
            DocumentFrequency::None => 1.0,
            DocumentFrequency::Idf if total_documents == 0 || document_frequency == 0 => 0.0,
            DocumentFrequency::Idf => (total_documents as f64 / document_frequency as f64).log10(),
        }
    }

    fn code(self) -> char {
        match self {
            DocumentFrequency::None => 'n',
            DocumentFrequency::Idf => 't',
        }
    }
}

impl VectorNorm {
    fn code(self) -> char {
        match self {
            VectorNorm::None => 'n',
            VectorNorm::Cosine => 'c',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scheme {
    pub tf: TermFrequency,
    pub df: DocumentFrequency,
    pub norm: VectorNorm,
}

impl Scheme {
    pub const fn new(tf: TermFrequency, df: DocumentFrequency, norm: VectorNorm) -> Self {
        Self { tf, df, norm }
    }

    /// Every valid scheme, in `nnn, nnc, ntn, ntc, lnn, lnc, ltn, ltc` order.
    pub fn all() -> Vec<Scheme> {
        let mut out = Vec::with_capacity(8);
        for tf in [TermFrequency::Natural, TermFrequency::Log] {
            for df in [DocumentFrequency::None, DocumentFrequency::Idf] {
                for norm in [VectorNorm::None, VectorNorm::Cosine] {
                    out.push(Scheme::new(tf, df, norm));
                }
            }
        }
        out
    }

    /// Combined document weight for one posting.
    pub fn document_weight(&self, term_frequency: u32, total_documents: u32, document_frequency: u32) -> f64 {
        self.tf.weight(term_frequency) * self.df.weight(total_documents, document_frequency)
    }
}

impl Default for Scheme {
    fn default() -> Self {
        Scheme::new(TermFrequency::Log, DocumentFrequency::Idf, VectorNorm::Cosine)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.tf.code(), self.df.code(), self.norm.code())
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidScheme { scheme: s.to_string(), reason: reason.to_string() };
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 3 {
            return Err(invalid("scheme must be three characters long"));
        }
        if chars.iter().any(|c| !"nltc".contains(*c)) {
            return Err(invalid("scheme characters must be from [n, l, t, c]"));
        }
        let tf = match chars[0] {
            'n' => TermFrequency::Natural,
            'l' => TermFrequency::Log,
            _ => return Err(invalid("tf must be one of [n, l]")),
        };
        let df = match chars[1] {
            'n' => DocumentFrequency::None,
            't' => DocumentFrequency::Idf,
            _ => return Err(invalid("df must be one of [n, t]")),
        };
        let norm = match chars[2] {
            'n' => VectorNorm::None,
            'c' => VectorNorm::Cosine,
            _ => return Err(invalid("norm must be one of [n, c]")),
        };
        Ok(Scheme { tf, df, norm })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_eight_schemes_validate() {
        let alphabet = ['n', 'l', 't', 'c'];
        let mut valid = Vec::new();
        let mut total = 0;
        for a in alphabet {
            for b in alphabet {
                for c in alphabet {
                    total += 1;
                    let s: String = [a, b, c].iter().collect();
                    if s.parse::<Scheme>().is_ok() {
                        valid.push(s);
                    }
                }
            }
        }
        assert_eq!(total, 64);
        valid.sort();
        assert_eq!(valid, vec!["lnc", "lnn", "ltc", "ltn", "nnc", "nnn", "ntc", "ntn"]);
    }

    #[test]
    fn display_round_trips_all() {
        let names: Vec<String> = Scheme::all().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["nnn", "nnc", "ntn", "ntc", "lnn", "lnc", "ltn", "ltc"]);
        for name in names {
            assert_eq!(name.parse::<Scheme>().unwrap().to_string(), name);
        }
    }

    #[test]
    fn rejects_bad_length_and_alphabet() {
        for bad in ["", "nn", "nnnn", "xyz", "NNN", "tnn", "ncn", "nnl"] {
            assert!(matches!(bad.parse::<Scheme>(), Err(Error::InvalidScheme { .. })), "{bad}");
        }
    }

    #[test]
    fn rejection_reason_names_the_actual_problem() {
        let reason = |s: &str| match s.parse::<Scheme>() {
            Err(Error::InvalidScheme { reason, .. }) => reason,
            other => panic!("{s}: expected InvalidScheme, got {other:?}"),
        };
        assert_eq!(reason("nn"), "scheme must be three characters long");
        assert_eq!(reason("nnnn"), "scheme must be three characters long");
        assert_eq!(reason("xyz"), "scheme characters must be from [n, l, t, c]");
        assert_eq!(reason("NNN"), "scheme characters must be from [n, l, t, c]");
        assert_eq!(reason("tnn"), "tf must be one of [n, l]");
        assert_eq!(reason("ncn"), "df must be one of [n, t]");
        assert_eq!(reason("nnl"), "norm must be one of [n, c]");
    }

    #[test]
    fn weights() {
        assert_eq!(TermFrequency::Natural.weight(3), 3.0);
        assert!((TermFrequency::Log.weight(10) - 2.0).abs() < 1e-12);
        assert_eq!(TermFrequency::Log.weight(1), 1.0);
        assert_eq!(DocumentFrequency::None.weight(10, 5), 1.0);
        assert!((DocumentFrequency::Idf.weight(100, 10) - 1.0).abs() < 1e-12);
        assert_eq!(DocumentFrequency::Idf.weight(0, 3), 0.0);
        assert_eq!(DocumentFrequency::Idf.weight(3, 0), 0.0);
        assert_eq!(DocumentFrequency::Idf.weight(4, 4), 0.0);
    }
}
