use anyhow::{bail, Result};
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use vsm_core::engine::{answer, QueryEngine};
use vsm_core::persist::{check_collection_name, load_meta, IndexPaths, MetaFile};
use vsm_core::{Error, InvertedIndex, Scheme, TextNormalization};

const MAX_K: usize = 1000;

#[derive(Deserialize)]
pub struct SearchParams {
    pub collection: String,
    pub q: String,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_scheme() -> String { "ltc".into() }
fn default_method() -> String { "s".into() }
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub collection: String,
    pub scheme: String,
    pub method: String,
    pub took_s: f64,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub score: f64,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

/// Loaded indexes keyed by (collection, method). Entries are immutable once inserted.
type IndexCache = Arc<RwLock<HashMap<(String, TextNormalization), Arc<InvertedIndex>>>>;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<QueryEngine>,
    pub cache: IndexCache,
}

impl AppState {
    /// Cached index for `(collection, method)`; a miss reads the file on the blocking pool.
    async fn index_for(&self, collection: &str, method: TextNormalization) -> Result<Arc<InvertedIndex>, ApiError> {
        check_collection_name(collection).map_err(api_error)?;
        let key = (collection.to_string(), method);
        let cached = self.cache.read().get(&key).cloned();
        if let Some(index) = cached {
            return Ok(index);
        }
        let engine = self.engine.clone();
        let name = key.0.clone();
        let loaded = tokio::task::spawn_blocking(move || engine.load(&name, method)).await.map_err(join_error)?;
        let index = Arc::new(loaded.map_err(api_error)?);
        tracing::info!(collection, %method, num_docs = index.total_documents, num_terms = index.num_terms(), "loaded index");
        // another request may have raced us here; either copy is identical
        Ok(self.cache.write().entry(key).or_insert(index).clone())
    }
}

pub fn build_app(index_dir: String) -> Result<Router> {
    let root = PathBuf::from(&index_dir);
    if !root.is_dir() {
        bail!("index directory {} does not exist", root.display());
    }
    let app_state = AppState {
        engine: Arc::new(QueryEngine::new(IndexPaths::new(root))),
        cache: Arc::new(RwLock::new(HashMap::new())),
    };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/collections/:name", get(collection_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let scheme: Scheme = params.scheme.parse().map_err(api_error)?;
    let method: TextNormalization = params.method.parse().map_err(api_error)?;
    if params.k == 0 {
        return Err(error_body(StatusCode::BAD_REQUEST, "k must be a positive integer".into()));
    }
    let k = params.k.min(MAX_K);

    let index = state.index_for(&params.collection, method).await?;
    let answers = answer(&index, &params.q, method, scheme, k).map_err(api_error)?;
    let results = answers.into_iter().map(|(doc_id, score)| SearchHit { doc_id, score }).collect();

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse {
        query: params.q,
        collection: params.collection,
        scheme: scheme.to_string(),
        method: method.to_string(),
        took_s: elapsed.as_secs_f64(),
        results,
    }))
}

pub async fn collection_handler(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<MetaFile>, ApiError> {
    check_collection_name(&name).map_err(api_error)?;
    let engine = state.engine.clone();
    let meta = tokio::task::spawn_blocking(move || load_meta(engine.paths(), &name)).await.map_err(join_error)?;
    meta.map(Json).map_err(api_error)
}

fn api_error(err: Error) -> ApiError {
    let status = match &err {
        Error::UnknownTerm(_)
        | Error::InvalidScheme { .. }
        | Error::InvalidNormalization(_)
        | Error::InvalidCollection(_) => StatusCode::BAD_REQUEST,
        Error::IndexNotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "search failed");
    }
    error_body(status, err.to_string())
}

fn join_error(err: tokio::task::JoinError) -> ApiError {
    tracing::error!(error = %err, "blocking load task failed");
    error_body(StatusCode::INTERNAL_SERVER_ERROR, "failed to load index files".into())
}

fn error_body(status: StatusCode, message: String) -> ApiError {
    (status, Json(serde_json::json!({ "error": message })))
}
