//! This module defines the command-line interface for the application using `clap`.
//!
//! Global flags override fields of the loaded [`AgentConfig`]; web-tool API keys
//! come from flags or their environment variables. Without a subcommand the
//! agent starts the interactive REPL.
//!
//! # Examples
//!
//! ```no_run
//! use clap::Parser;
//! use ollama_cli_agent::commands::{Cli, Commands};
//!
//! let cli = Cli::parse();
//! match cli.command {
//!     Some(Commands::Ask { question, no_memory }) => println!("{question} (memory: {})", !no_memory),
//!     _ => {}
//! }
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AgentConfig;
use crate::tools::{SearchChoice, ToolCredentials};

/// Parsed command-line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, propagate_version = true, color = clap::ColorChoice::Always)]
pub struct Cli {
    /// Path to a config file (defaults to config.yaml in the config directory).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Generation model.
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Embedding model.
    #[arg(long, global = true)]
    pub embedding_model: Option<String>,

    /// Vector store collection.
    #[arg(long, global = true)]
    pub collection: Option<String>,

    /// Keep memories in process only; do not connect to Qdrant.
    #[arg(long, global = true)]
    pub in_memory: bool,

    /// Log at debug level.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Search tool: auto, serpapi or brave.
    #[arg(long, global = true, default_value = "auto")]
    pub search_tool: SearchChoice,

    #[arg(long, global = true, env = "SERPAPI_API_KEY", hide_env_values = true)]
    pub serpapi_key: Option<String>,

    #[arg(long, global = true, env = "BRAVE_API_KEY", hide_env_values = true)]
    pub brave_key: Option<String>,

    #[arg(long, global = true, env = "FIRECRAWL_API_KEY", hide_env_values = true)]
    pub firecrawl_key: Option<String>,

    /// The parsed subcommand, if any.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Apply the flags that were given on top of `config`.
    pub fn apply_overrides(&self, config: &mut AgentConfig) {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(embedding_model) = &self.embedding_model {
            config.embedding_model = embedding_model.clone();
        }
        if let Some(collection) = &self.collection {
            config.collection_name = collection.clone();
        }
        if self.in_memory {
            config.use_memory_mode = true;
        }
    }

    pub fn credentials(&self) -> ToolCredentials {
        ToolCredentials {
            serpapi_key: self.serpapi_key.clone(),
            brave_key: self.brave_key.clone(),
            firecrawl_key: self.firecrawl_key.clone(),
        }
    }
}

#[derive(Subcommand, Debug, PartialEq)]
#[command(about, long_about = None, color = clap::ColorChoice::Always)]
pub enum Commands {
    /// Ask a single question and exit.
    #[clap(name = "ask", alias = "a")]
    Ask {
        question: String,

        /// Answer without consulting memory.
        #[arg(long)]
        no_memory: bool,
    },

    /// Store text, or scrape and store a URL.
    #[clap(name = "ingest")]
    Ingest { content: String },

    /// Start the REPL (the default).
    #[clap(name = "interactive", alias = "i")]
    Interactive,

    /// Write a default config.yaml into the config directory.
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::SearchProvider;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_interactive() {
        let cli = Cli::try_parse_from(["ollama-agent"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.search_tool, SearchChoice::Auto);
        assert!(!cli.in_memory);
    }

    #[test]
    fn test_ask_with_flags() {
        let cli = Cli::try_parse_from([
            "ollama-agent",
            "--model",
            "llama3",
            "ask",
            "What is Rust?",
            "--no-memory",
            "--in-memory",
        ])
        .unwrap();

        assert_eq!(
            cli.command,
            Some(Commands::Ask {
                question: "What is Rust?".into(),
                no_memory: true,
            })
        );

        let mut config = AgentConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.model, "llama3");
        assert!(config.use_memory_mode);
        assert_eq!(config.collection_name, AgentConfig::default().collection_name);
    }

    #[test]
    fn test_search_tool_and_keys() {
        let cli = Cli::try_parse_from([
            "ollama-agent",
            "--search-tool",
            "brave",
            "--brave-key",
            "bk",
            "--collection",
            "kb",
            "i",
        ])
        .unwrap();

        assert_eq!(cli.command, Some(Commands::Interactive));
        assert_eq!(cli.search_tool, SearchChoice::Provider(SearchProvider::Brave));
        assert_eq!(cli.credentials().brave_key.as_deref(), Some("bk"));

        let mut config = AgentConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.collection_name, "kb");
    }

    #[test]
    fn test_unknown_search_tool_is_rejected() {
        assert!(Cli::try_parse_from(["ollama-agent", "--search-tool", "bing"]).is_err());
    }

    #[test]
    fn test_ingest_and_init() {
        let cli = Cli::try_parse_from(["ollama-agent", "ingest", "https://example.com"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Ingest {
                content: "https://example.com".into()
            })
        );
        let cli = Cli::try_parse_from(["ollama-agent", "init"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Init));
    }
}
