//! # VectorStore
//!
//! Similarity-searchable memory for the agent.
//!
//! A [`VectorStore`] persists `(vector, text, metadata)` records inside a named
//! **collection** and answers nearest-neighbour queries by cosine similarity.
//! Two backends sit behind it:
//!
//! - [`QdrantBackend`]: a Qdrant server reached over its REST API (durable).
//! - [`InMemoryBackend`]: a process-local map with exact cosine search (lost on exit).
//!
//! ## Construction
//! [`VectorStore::connect`] is a two-stage constructor: it first tries the
//! Qdrant server and, when that fails, falls back to the in-memory backend and
//! logs a warning. The outcome is visible afterwards through [`VectorStore::mode`].
//!
//! ## Payload layout
//! Every stored record carries `{text, doc_id, ...caller metadata}`. `text` and
//! `doc_id` are written by the store and always override caller keys of the same name.
//!
//! ## Quick Example
//! ```no_run
//! use ollama_cli_agent::vector_store::VectorStore;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = VectorStore::in_memory("notes", 3).await?;
//! let ids = store
//!     .add(&["hello".to_string()], vec![vec![0.1, 0.2, 0.3]], None)
//!     .await?;
//! let hits = store.search(&[0.1, 0.2, 0.3], 1, None).await?;
//! assert_eq!(hits[0].metadata["doc_id"], ids[0].as_str());
//! # Ok(()) }
//! ```

mod memory;
mod qdrant;

pub use memory::{InMemoryBackend, cosine_similarity};
pub use qdrant::QdrantBackend;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::StoreError;

/// Arbitrary string-keyed metadata attached to a record.
pub type Metadata = serde_json::Map<String, Value>;

/// Equality filter: every key must be present in a record's payload with exactly this value.
pub type MetadataFilter = Metadata;

/// Number of records sent to the backend per upsert request.
pub const BATCH_SIZE: usize = 100;

/// Dimensionality of the default embedding model (all-MiniLM).
pub const DEFAULT_VECTOR_SIZE: usize = 384;

/// A unit of stored memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Globally unique id (UUID v4), also stored as `payload["doc_id"]`.
    pub id: String,
    pub vector: Vec<f32>,
    /// `{text, doc_id, ...caller metadata}`.
    pub payload: Metadata,
}

/// A single search hit. Produced at query time only, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalResult {
    pub text: String,
    /// Cosine similarity in `[-1, 1]`, higher is closer.
    pub score: f32,
    /// The stored payload minus `text`.
    pub metadata: Metadata,
}

impl RetrievalResult {
    /// Split a stored payload into the `text` field and the remaining metadata.
    pub(crate) fn from_payload(mut payload: Metadata, score: f32) -> Self {
        let text = match payload.remove("text") {
            Some(Value::String(text)) => text,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        Self {
            text,
            score,
            metadata: payload,
        }
    }
}

/// Size and health of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub vectors_count: u64,
    pub points_count: u64,
    pub status: String,
}

/// Which backend a [`VectorStore`] ended up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreMode {
    /// Backed by a Qdrant server.
    Persistent,
    /// Backed by process memory; nothing survives a restart.
    InMemory,
}

impl fmt::Display for StoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreMode::Persistent => f.write_str("persistent"),
            StoreMode::InMemory => f.write_str("in-memory"),
        }
    }
}

/// Everything [`VectorStore::connect`] needs.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    /// Qdrant REST endpoint, e.g. `http://localhost:6333`.
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
    pub vector_size: usize,
    /// Skip the Qdrant attempt entirely.
    pub use_memory_mode: bool,
}

enum Backend {
    Qdrant(QdrantBackend),
    Memory(InMemoryBackend),
}

/// Collection-scoped vector storage with cosine nearest-neighbour search.
///
/// `add` and `search` operate on the collection the store was opened with;
/// the collection-management calls take an explicit name.
pub struct VectorStore {
    backend: Backend,
    collection: String,
    vector_size: usize,
}

impl VectorStore {
    /// Open the store described by `settings`, creating its collection if needed.
    ///
    /// Unless `use_memory_mode` is set, this first tries the Qdrant server at
    /// `settings.url`. If the server cannot be reached, the store silently
    /// degrades to the in-memory backend; the fallback is logged and reported
    /// by [`mode`](Self::mode).
    ///
    /// # Errors
    /// Fails only if the collection cannot be ensured on the chosen backend.
    pub async fn connect(settings: &StoreSettings) -> Result<Self, StoreError> {
        let backend = if settings.use_memory_mode {
            info!("Using vector store in memory mode (no persistence)");
            Backend::Memory(InMemoryBackend::new())
        } else {
            match QdrantBackend::connect(&settings.url, settings.api_key.clone()).await {
                Ok(qdrant) => {
                    info!(url = %settings.url, "Connected to Qdrant");
                    Backend::Qdrant(qdrant)
                }
                Err(e) => {
                    warn!(url = %settings.url, error = %e, "Failed to connect to Qdrant server");
                    warn!("Falling back to in-memory mode; memories will not be persisted");
                    Backend::Memory(InMemoryBackend::new())
                }
            }
        };

        Self::open(backend, &settings.collection, settings.vector_size).await
    }

    /// Open a non-persistent store with its collection already created.
    pub async fn in_memory(
        collection: impl Into<String>,
        vector_size: usize,
    ) -> Result<Self, StoreError> {
        Self::open(
            Backend::Memory(InMemoryBackend::new()),
            &collection.into(),
            vector_size,
        )
        .await
    }

    async fn open(backend: Backend, collection: &str, vector_size: usize) -> Result<Self, StoreError> {
        let mut store = Self {
            backend,
            collection: collection.to_string(),
            vector_size,
        };
        store.ensure_collection(collection, vector_size).await?;
        Ok(store)
    }

    pub fn mode(&self) -> StoreMode {
        match self.backend {
            Backend::Qdrant(_) => StoreMode::Persistent,
            Backend::Memory(_) => StoreMode::InMemory,
        }
    }

    /// Name of the collection `add`/`search` operate on.
    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    pub fn vector_size(&self) -> usize {
        self.vector_size
    }

    /// Create `name` with cosine distance and vector size `dim` if it does not exist.
    ///
    /// Idempotent. An existing collection is left untouched and its dimension is
    /// **not** compared against `dim`; a mismatch only shows up on the first `add`.
    pub async fn ensure_collection(&mut self, name: &str, dim: usize) -> Result<(), StoreError> {
        let created = match &mut self.backend {
            Backend::Qdrant(qdrant) => {
                let existing = qdrant.list_collections().await.inspect_err(|e| {
                    error!(collection = name, error = %e, "Error ensuring collection");
                })?;
                if existing.iter().any(|c| c == name) {
                    false
                } else {
                    qdrant.create_collection(name, dim).await?;
                    true
                }
            }
            Backend::Memory(memory) => {
                if memory.has_collection(name) {
                    false
                } else {
                    memory.create_collection(name, dim);
                    true
                }
            }
        };

        if created {
            info!(collection = name, dim, "Created collection");
        } else {
            info!(collection = name, "Collection already exists");
        }
        Ok(())
    }

    /// Store `texts` with their `vectors` and optional per-item `metadatas`.
    ///
    /// Returns the freshly generated ids, in input order.
    ///
    /// Records are uploaded in batches of [`BATCH_SIZE`]. Each batch is applied
    /// as a unit, but the call as a whole is not atomic: if a later batch fails,
    /// the earlier ones stay written and the error is
    /// [`StoreError::PartialWrite`].
    ///
    /// # Errors
    /// - [`StoreError::ArgumentMismatch`] if the list lengths differ (nothing is written).
    /// - [`StoreError::EmptyText`] if any text is empty (nothing is written).
    /// - [`StoreError::NonFiniteVector`] if any vector holds NaN or an infinity (nothing is written).
    /// - [`StoreError::DimensionMismatch`] or a backend error from the failing batch.
    pub async fn add(
        &mut self,
        texts: &[String],
        vectors: Vec<Vec<f32>>,
        metadatas: Option<Vec<Metadata>>,
    ) -> Result<Vec<String>, StoreError> {
        if texts.len() != vectors.len() {
            return Err(StoreError::ArgumentMismatch(format!(
                "number of texts ({}) must match number of embeddings ({})",
                texts.len(),
                vectors.len()
            )));
        }
        if let Some(metadatas) = &metadatas {
            if metadatas.len() != texts.len() {
                return Err(StoreError::ArgumentMismatch(format!(
                    "number of metadatas ({}) must match number of texts ({})",
                    metadatas.len(),
                    texts.len()
                )));
            }
        }
        if let Some(index) = texts.iter().position(|t| t.is_empty()) {
            return Err(StoreError::EmptyText { index });
        }
        if let Some(index) = vectors.iter().position(|v| !is_finite(v)) {
            return Err(StoreError::NonFiniteVector { index });
        }

        let mut metadatas = metadatas.map(Vec::into_iter);
        let records: Vec<Record> = texts
            .iter()
            .zip(vectors)
            .map(|(text, vector)| {
                let id = Uuid::new_v4().to_string();
                let mut payload = metadatas
                    .as_mut()
                    .and_then(Iterator::next)
                    .unwrap_or_default();
                payload.insert("text".into(), Value::String(text.clone()));
                payload.insert("doc_id".into(), Value::String(id.clone()));
                Record {
                    id,
                    vector,
                    payload,
                }
            })
            .collect();

        let mut committed = 0;
        for batch in records.chunks(BATCH_SIZE) {
            let result = match &mut self.backend {
                Backend::Qdrant(qdrant) => qdrant.upsert(&self.collection, batch).await,
                Backend::Memory(memory) => memory.upsert(&self.collection, batch),
            };
            if let Err(e) = result {
                return Err(if committed == 0 {
                    e
                } else {
                    StoreError::PartialWrite {
                        committed,
                        source: Box::new(e),
                    }
                });
            }
            committed += batch.len();
        }

        info!(count = records.len(), collection = %self.collection, "Added documents to collection");
        Ok(records.into_iter().map(|r| r.id).collect())
    }

    /// Return up to `k` records ranked by descending cosine similarity to `query`.
    ///
    /// With a `filter`, only records whose payload matches every key/value pair
    /// are considered. An empty or non-matching collection yields an empty list.
    /// Tied scores keep whatever order the backend produced.
    ///
    /// # Errors
    /// - [`StoreError::NonFiniteQuery`] if `query` holds NaN or an infinity.
    /// - [`StoreError::UnsupportedFilter`] if a filter value is a float, null,
    ///   array or object. Only exact matches on strings, integers and booleans
    ///   are supported, on both backends.
    pub async fn search(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalResult>, StoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        if !is_finite(query) {
            return Err(StoreError::NonFiniteQuery);
        }
        let filter = filter.filter(|f| !f.is_empty());
        if let Some(key) = filter.and_then(unsupported_filter_key) {
            return Err(StoreError::UnsupportedFilter { key });
        }
        match &self.backend {
            Backend::Qdrant(qdrant) => qdrant.search(&self.collection, query, k, filter).await,
            Backend::Memory(memory) => memory.search(&self.collection, query, k, filter),
        }
    }

    /// Drop a collection and all its records. Failures are logged, never returned.
    pub async fn delete_collection(&mut self, name: &str) {
        let result = match &mut self.backend {
            Backend::Qdrant(qdrant) => qdrant.delete_collection(name).await,
            Backend::Memory(memory) => memory.delete_collection(name),
        };
        match result {
            Ok(()) => info!(collection = name, "Deleted collection"),
            Err(e) => error!(collection = name, error = %e, "Error deleting collection"),
        }
    }

    /// Current size and health of `name`, or `None` if the backend could not say.
    pub async fn collection_info(&self, name: &str) -> Option<CollectionInfo> {
        let result = match &self.backend {
            Backend::Qdrant(qdrant) => qdrant.collection_info(name).await,
            Backend::Memory(memory) => memory.collection_info(name),
        };
        result
            .inspect_err(|e| error!(collection = name, error = %e, "Error getting collection info"))
            .ok()
    }
}

fn is_finite(vector: &[f32]) -> bool {
    vector.iter().all(|x| x.is_finite())
}

/// First filter key whose value cannot be matched exactly.
fn unsupported_filter_key(filter: &MetadataFilter) -> Option<String> {
    filter
        .iter()
        .find(|(_, value)| match value {
            Value::String(_) | Value::Bool(_) => false,
            Value::Number(n) => !(n.is_i64() || n.is_u64()),
            _ => true,
        })
        .map(|(key, _)| key.clone())
}
