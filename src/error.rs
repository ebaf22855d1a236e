//! # Error types
//!
//! Each layer of the agent owns a small error enum:
//!
//! - [`StoreError`] for the vector store and its backends.
//! - [`ModelError`] for the embedding and generation backends.
//! - [`ToolError`] for the web search / scrape adapters.
//! - [`PipelineError`] for the memory pipeline, which only ever wraps the first two.
//!
//! Low-level operations return these eagerly. The high-level `ingest`/`ask`
//! entry points in [`crate::pipeline`] are the only place they get swallowed.

use thiserror::Error;

use crate::tools::ToolKind;

/// Failures raised by [`crate::vector_store::VectorStore`] and its backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Parallel input lists (texts/vectors/metadatas) have different lengths.
    #[error("argument mismatch: {0}")]
    ArgumentMismatch(String),

    /// A record was submitted with empty text.
    #[error("record at position {index} has empty text")]
    EmptyText { index: usize },

    /// A vector does not match the collection's configured size.
    #[error("vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A stored vector contains NaN or an infinity.
    #[error("vector at position {index} contains a non-finite value")]
    NonFiniteVector { index: usize },

    #[error("query vector contains a non-finite value")]
    NonFiniteQuery,

    /// Filter values must be strings, integers or booleans.
    #[error("filter value for `{key}` must be a string, integer or boolean")]
    UnsupportedFilter { key: String },

    #[error("collection `{0}` does not exist")]
    CollectionNotFound(String),

    /// The backing service could not be reached.
    #[error("vector store backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A later batch of a multi-batch insert failed after earlier batches were committed.
    #[error("insert failed after {committed} records were written: {source}")]
    PartialWrite {
        committed: usize,
        #[source]
        source: Box<StoreError>,
    },

    /// The backend answered with a non-success status.
    #[error("vector store returned HTTP {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("vector store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected vector store response: {0}")]
    Decode(String),
}

/// Failures raised by the embedding and text-generation backends.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("generation failed: {0}")]
    OpenAI(#[from] async_openai::error::OpenAIError),

    #[error("model returned an empty response")]
    EmptyResponse,

    /// The embedder produced a vector of a different length than it declared.
    #[error("embedding has {got} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Failures raised by the search and scrape tools.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0} not found in environment variables")]
    MissingApiKey(&'static str),

    #[error("tool request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{tool} returned HTTP {status}: {body}")]
    Status {
        tool: ToolKind,
        status: u16,
        body: String,
    },

    #[error("No data returned")]
    NoData,

    #[error("{0} not configured")]
    NotConfigured(ToolKind),
}

/// Anything that can go wrong inside the memory pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
