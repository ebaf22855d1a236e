//! Loading and writing the agent's YAML configuration.
//!
//! Every field of [`AgentConfig`] has a default, so a partial file (or no file
//! at all, through [`load_or_default`]) is a valid configuration.
//!
//! # Examples
//!
//! ```no_run
//! use ollama_cli_agent::config::{AgentConfig, load_config};
//!
//! let config: AgentConfig = load_config("/path/to/config.yaml").unwrap();
//! println!("{:?}", config);
//! ```

use serde::{Deserialize, Serialize};
use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::embeddings::{DEFAULT_EMBEDDING_MODEL, DEFAULT_OLLAMA_BASE};
use crate::retriever::DEFAULT_TOP_K;
use crate::tools::DEFAULT_SEARCH_RESULTS;
use crate::vector_store::{DEFAULT_VECTOR_SIZE, StoreSettings};

pub const CONFIG_FILE: &str = "config.yaml";

/// Runtime configuration of the agent.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(default)]
pub struct AgentConfig {
    /// Generation model, as known to the OpenAI-compatible endpoint.
    pub model: String,

    /// Ollama model used for embeddings.
    pub embedding_model: String,

    /// Root of the Ollama server (embeddings).
    pub ollama_base: String,

    /// OpenAI-compatible endpoint used for generation.
    pub api_base: String,

    pub api_key: String,

    pub collection_name: String,

    /// Must match the embedding model's output length.
    pub vector_size: usize,

    pub qdrant_url: String,

    pub qdrant_api_key: Option<String>,

    /// Skip Qdrant and keep memories in process only.
    pub use_memory_mode: bool,

    /// Passages pulled from memory per question.
    pub retrieval_k: usize,

    /// Hits requested per web search.
    pub search_results: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "mistral:7b".to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            ollama_base: DEFAULT_OLLAMA_BASE.to_string(),
            api_base: format!("{DEFAULT_OLLAMA_BASE}/v1"),
            api_key: "ollama".to_string(),
            collection_name: "ollama_cli_agent".to_string(),
            vector_size: DEFAULT_VECTOR_SIZE,
            qdrant_url: "http://localhost:6333".to_string(),
            qdrant_api_key: None,
            use_memory_mode: false,
            retrieval_k: DEFAULT_TOP_K,
            search_results: DEFAULT_SEARCH_RESULTS,
        }
    }
}

impl AgentConfig {
    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            url: self.qdrant_url.clone(),
            api_key: self.qdrant_api_key.clone(),
            collection: self.collection_name.clone(),
            vector_size: self.vector_size,
            use_memory_mode: self.use_memory_mode,
        }
    }
}

/// Loads the configuration from a YAML file.
///
/// # Errors
/// Fails if the file cannot be read or is not valid YAML for [`AgentConfig`].
pub fn load_config(file: &str) -> Result<AgentConfig, Box<dyn Error>> {
    debug!("Loading config from: {}", file);
    let content = fs::read_to_string(file)?;
    let config: AgentConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Like [`load_config`], but a missing file yields [`AgentConfig::default`].
pub fn load_or_default(path: &Path) -> Result<AgentConfig, Box<dyn Error>> {
    if !path.exists() {
        info!("No config at {}, using defaults", path.display());
        return Ok(AgentConfig::default());
    }
    let file = path.to_str().ok_or("Config path is not valid UTF-8")?;
    load_config(file)
}

/// Write the default configuration to `dir/config.yaml`, creating `dir` if needed.
///
/// An existing file is left alone. Returns the file's path either way.
pub fn write_default_config(dir: &Path) -> Result<PathBuf, Box<dyn Error>> {
    fs::create_dir_all(dir)?;
    let config_path = dir.join(CONFIG_FILE);
    if config_path.exists() {
        info!("Config file already exists: {}", config_path.display());
        return Ok(config_path);
    }

    info!("Creating config file: {}", config_path.display());
    let config_yaml = serde_yaml::to_string(&AgentConfig::default())?;
    fs::write(&config_path, config_yaml)?;
    Ok(config_path)
}
