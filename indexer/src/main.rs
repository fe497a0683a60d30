use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};
use vsm_core::collection::{read_documents, CollectionFiles};
use vsm_core::persist::{now_rfc3339, save_index, save_meta, IndexFormat, IndexPaths, MetaFile, FORMAT_VERSION};
use vsm_core::tokenizer::{normalize, TextNormalization};
use vsm_core::{build_index, build_index_parallel, DocId};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build term-based inverted indexes for document collections", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build lemmatized and stemmed indexes for a collection
    Build {
        /// Collection name, e.g. CISI for collections/CISI.ALL. Omit with --all.
        collection: Option<String>,
        /// Build every *.ALL collection found under the collections directory
        #[arg(long, default_value_t = false, conflicts_with = "collection")]
        all: bool,
        /// Directory holding the collection files
        #[arg(long, env = "COLLECTIONS_DIR", default_value = "./collections")]
        collections_dir: PathBuf,
        /// Output directory for processed indexes
        #[arg(long, env = "PROCESSED_DIR", default_value = "./processed")]
        output: PathBuf,
        /// On-disk format: json or bincode
        #[arg(long, default_value = "json")]
        format: IndexFormat,
        /// Count terms on the rayon thread pool
        #[arg(long, default_value_t = false)]
        parallel: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { collection, all, collections_dir, output, format, parallel } => {
            let names = match (collection, all) {
                (Some(name), _) => vec![name],
                (None, true) => discover_collections(&collections_dir),
                (None, false) => bail!("give a collection name or --all"),
            };
            if names.is_empty() {
                bail!("no *.ALL collections under {}", collections_dir.display());
            }
            let out_paths = IndexPaths::new(&output);
            for name in names {
                build_collection(&collections_dir, &name, &out_paths, format, parallel)?;
            }
            Ok(())
        }
    }
}

fn discover_collections(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("ALL"))
        .filter_map(|e| e.path().file_stem().and_then(|s| s.to_str()).map(String::from))
        .collect();
    names.sort();
    names
}

fn build_collection(collections_dir: &Path, name: &str, out_paths: &IndexPaths, format: IndexFormat, parallel: bool) -> Result<()> {
    let files = CollectionFiles::new(collections_dir, name);
    let documents = read_documents(&files.corpus())?;
    let num_docs = documents.len() as u32;

    let mut num_terms = BTreeMap::new();
    for method in TextNormalization::ALL {
        let normalized: Vec<(DocId, Vec<String>)> = documents
            .iter()
            .map(|(doc_id, text)| (doc_id.clone(), normalize(text, method)))
            .collect();
        let index = if parallel { build_index_parallel(normalized) } else { build_index(normalized) };
        let path = save_index(out_paths, name, method, format, &index)?;
        tracing::info!(collection = name, %method, num_docs = index.total_documents, num_terms = index.num_terms(), path = %path.display(), "index written");
        num_terms.insert(method.file_suffix().to_string(), index.num_terms());
    }

    let meta = MetaFile { collection: name.to_string(), num_docs, num_terms, created_at: now_rfc3339(), version: FORMAT_VERSION };
    save_meta(out_paths, &meta)?;
    tracing::info!(collection = name, "index build complete");
    Ok(())
}
