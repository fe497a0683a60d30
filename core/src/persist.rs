use crate::error::{Error, Result};
use crate::index::InvertedIndex;
use crate::tokenizer::TextNormalization;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub collection: String,
    pub num_docs: u32,
    /// Vocabulary size per normalization method, keyed by file suffix.
    pub num_terms: BTreeMap<String, usize>,
    pub created_at: String,
    pub version: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexFormat {
    #[default]
    Json,
    Bincode,
}

impl IndexFormat {
    fn extension(self) -> &'static str {
        match self {
            IndexFormat::Json => "json",
            IndexFormat::Bincode => "bin",
        }
    }

    fn other(self) -> IndexFormat {
        match self {
            IndexFormat::Json => IndexFormat::Bincode,
            IndexFormat::Bincode => IndexFormat::Json,
        }
    }
}

impl std::str::FromStr for IndexFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "json" => Ok(IndexFormat::Json),
            "bincode" | "bin" => Ok(IndexFormat::Bincode),
            other => Err(format!("unknown index format '{other}', expected 'json' or 'bincode'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn index(&self, collection: &str, method: TextNormalization, format: IndexFormat) -> PathBuf {
        self.root.join(format!("{collection}_{}.{}", method.file_suffix(), format.extension()))
    }
    pub fn meta(&self, collection: &str) -> PathBuf { self.root.join(format!("{collection}_meta.json")) }
}

/// Collection names become file name prefixes under the index root, so they must stay a
/// single path component.
pub fn check_collection_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(Error::InvalidCollection(name.to_string()));
    }
    Ok(())
}

/// Write the index in `format` and remove any copy in the other format, so a later
/// [`load_index`] cannot pick up a stale file.

pub fn save_index(paths: &IndexPaths, collection: &str, method: TextNormalization, format: IndexFormat, index: &InvertedIndex) -> Result<PathBuf> {
    create_dir_all(&paths.root)?;
    let path = paths.index(collection, method, format);
    let mut w = BufWriter::new(File::create(&path)?);
    match format {
        IndexFormat::Json => serde_json::to_writer_pretty(&mut w, index)?,
        IndexFormat::Bincode => bincode::serialize_into(&mut w, index)?,
    }
    w.flush()?;

    let stale = paths.index(collection, method, format.other());
    if stale.exists() {
        std::fs::remove_file(&stale)?;
        tracing::debug!(path = %stale.display(), "removed index in previous format");
    }
    Ok(path)
}

/// Load a persisted index, preferring JSON and falling back to bincode.
pub fn load_index(paths: &IndexPaths, collection: &str, method: TextNormalization) -> Result<InvertedIndex> {
    let json = paths.index(collection, method, IndexFormat::Json);
    if json.exists() {
        let index = serde_json::from_reader(BufReader::new(File::open(&json)?))?;
        return Ok(index);
    }
    let bin = paths.index(collection, method, IndexFormat::Bincode);
    if bin.exists() {
        let mut buf = Vec::new();
        File::open(&bin)?.read_to_end(&mut buf)?;
        return Ok(bincode::deserialize(&buf)?);
    }
    Err(Error::IndexNotFound { path: json })
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta(&meta.collection))?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths, collection: &str) -> Result<MetaFile> {
    let path = paths.meta(collection);
    if !path.exists() {
        return Err(Error::IndexNotFound { path });
    }
    let mut buf = String::new();
    File::open(&path)?.read_to_string(&mut buf)?;
    Ok(serde_json::from_str(&buf)?)
}

/// RFC 3339 timestamp for meta files; empty if formatting fails.
pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}
