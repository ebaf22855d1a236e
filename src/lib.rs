//! # Ollama CLI Agent (library root)
//!
//! A local, retrieval-augmented question-answering agent:
//! - Vector memory with a Qdrant backend and an in-memory fallback (`vector_store`).
//! - Ollama embeddings (`embeddings`) and OpenAI-compatible generation (`api`).
//! - Retrieval, prompt assembly and the fail-soft ingest/ask pipeline
//!   (`retriever`, `prompt`, `pipeline`).
//! - Web search and scraping tools (`tools`) behind the [`agent::Agent`] facade.
//! - CLI parsing, configuration, logging and the interactive REPL
//!   (`commands`, `config`, `logging`, `repl`).
//!
//! ## Data flow
//! ```text
//! ingest: text ─▶ Embedder ─▶ VectorStore::add
//! ask:    question ─▶ Embedder ─▶ VectorStore::search(k) ─▶ assemble_prompt ─▶ Generator ─▶ answer
//! ```
//!
//! ## Modules
//! - [`agent`], [`api`], [`commands`], [`config`], [`embeddings`], [`error`],
//!   [`logging`], [`pipeline`], [`prompt`], [`repl`], [`retriever`], [`tools`],
//!   [`vector_store`]

use directories::ProjectDirs;
use std::error::Error;

pub mod agent;
pub mod api;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod prompt;
pub mod repl;
pub mod retriever;
pub mod tools;
pub mod vector_store;

#[cfg(test)]
mod testing;

/// Return the per-platform configuration directory of the agent.
///
/// This uses [`directories::ProjectDirs`] with the application triple
/// `("com", "ollama-cli-agent", "ollama-agent")`. The directory is **not**
/// created here; `init` creates it when writing the default config.
///
/// # Errors
/// Returns an error if the platform configuration directory cannot be determined.
///
/// # Examples
/// ```rust
/// let cfg = ollama_cli_agent::config_dir().expect("has a config dir");
/// println!("config at {}", cfg.display());
/// ```
pub fn config_dir() -> Result<std::path::PathBuf, Box<dyn Error>> {
    let proj_dirs = ProjectDirs::from("com", "ollama-cli-agent", "ollama-agent")
        .ok_or("Unable to determine config directory")?;
    Ok(proj_dirs.config_dir().to_path_buf())
}
