//! Readers for `.ALL` / `.QRY` / `.REL` collection files.
//!
//! Documents and queries use a dot-marker layout:
//!
//! ```text
//! .I 1
//! .T
//! A title
//! .W
//! Body text, possibly
//! over several lines.
//! .X
//! ...
//! ```
//!
//! Only the `.W` section is kept.

use crate::error::{Error, Result};
use crate::index::DocId;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

pub type QueryId = String;

/// Relevance judgments: query id -> relevant document ids.
pub type Relevance = HashMap<QueryId, HashSet<DocId>>;

pub struct CollectionFiles {
    pub dir: PathBuf,
    pub name: String,
}

impl CollectionFiles {
    pub fn new<P: AsRef<Path>>(dir: P, name: &str) -> Self {
        Self { dir: dir.as_ref().to_path_buf(), name: name.to_string() }
    }
    pub fn corpus(&self) -> PathBuf { self.dir.join(format!("{}.ALL", self.name)) }
    pub fn queries(&self) -> PathBuf { self.dir.join(format!("{}.QRY", self.name)) }
    pub fn relevance(&self) -> PathBuf { self.dir.join(format!("{}.REL", self.name)) }
}

/// Numeric ids lose leading zeros so `.REL` ids line up with `.I` ids.
pub fn canonical_id(raw: &str) -> String {
    match raw.trim().parse::<u64>() {
        Ok(n) => n.to_string(),
        Err(_) => raw.trim().to_string(),
    }
}

fn read_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::CollectionNotFound { path: path.to_path_buf() });
    }
    Ok(fs::read_to_string(path)?)
}

/// Parse marker-delimited records into `(id, text)` pairs in file order.
///
/// Ids are compared after [`canonical_id`]; a repeated id replaces the earlier text in place.
pub fn parse_records(content: &str) -> Result<Vec<(String, String)>> {
    let mut records = Records::default();
    let mut current: Option<String> = None;
    let mut capture = false;
    let mut buffer = String::new();

    for (lineno, line) in content.lines().enumerate() {
        if let Some(rest) = line.strip_prefix(".I") {
            if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                if capture {
                    buffer.push_str(line);
                    buffer.push('\n');
                }
                continue;
            }
            if let Some(id) = current.take() {
                records.push(id, buffer.trim().to_string());
            }
            let id = rest.split_whitespace().next().ok_or_else(|| Error::Collection {
                line: lineno + 1,
                message: "missing id after .I".into(),
            })?;
            current = Some(canonical_id(id));
            capture = false;
            buffer.clear();
        } else if is_field_marker(line) {
            capture = line.starts_with(".W");
        } else if capture {
            buffer.push_str(line);
            buffer.push('\n');
        }
    }
    if let Some(id) = current {
        records.push(id, buffer.trim().to_string());
    }
    Ok(records.entries)
}

#[derive(Default)]
struct Records {
    entries: Vec<(String, String)>,
    positions: HashMap<String, usize>,
}

impl Records {
    fn push(&mut self, id: String, text: String) {
        match self.positions.get(&id) {
            Some(&pos) => {
                tracing::warn!(%id, "duplicate record id, keeping the later text");
                self.entries[pos].1 = text;
            }
            None => {
                self.positions.insert(id.clone(), self.entries.len());
                self.entries.push((id, text));
            }
        }
    }
}

fn is_field_marker(line: &str) -> bool {
    let mut chars = line.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some('.'), Some(c), None) | (Some('.'), Some(c), Some(' ' | '\t')) if c.is_ascii_uppercase()
    )
}

/// Parse `.REL` lines: `query_id doc_id [ignored...]`.
pub fn parse_relevance(content: &str) -> Result<Relevance> {
    let mut answers = Relevance::new();
    for (lineno, line) in content.lines().enumerate() {
        let mut parts = line.split_whitespace();
        let Some(query_id) = parts.next() else { continue };
        let doc_id = parts.next().ok_or_else(|| Error::Collection {
            line: lineno + 1,
            message: format!("expected '<query id> <doc id>', got '{}'", line.trim()),
        })?;
        answers.entry(canonical_id(query_id)).or_default().insert(canonical_id(doc_id));
    }
    Ok(answers)
}

pub fn read_documents(path: &Path) -> Result<Vec<(DocId, String)>> {
    let documents = parse_records(&read_file(path)?)?;
    tracing::info!(path = %path.display(), count = documents.len(), "read documents");
    Ok(documents)
}

pub fn read_queries(path: &Path) -> Result<Vec<(QueryId, String)>> {
    parse_records(&read_file(path)?)
}

pub fn read_relevance(path: &Path) -> Result<Relevance> {
    parse_relevance(&read_file(path)?)
}
