//! Entry point of the `ollama-agent` binary.
//!
//! ```sh
//! ollama-agent init
//! ollama-agent ask "What is Rust?" --no-memory
//! ollama-agent ingest https://www.rust-lang.org
//! ollama-agent            # interactive mode
//! ```

use clap::Parser;
use ollama_cli_agent::{
    agent::Agent,
    commands::{Cli, Commands},
    config::{self, CONFIG_FILE},
    config_dir,
    logging::{self, LogSettings},
    repl,
};
use std::{error::Error, io};
use tracing::{debug, info};

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init(LogSettings { debug: cli.debug });
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(cli))
}

async fn run(mut cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command.take().unwrap_or(Commands::Interactive) {
        Commands::Init => init(),
        Commands::Ask {
            question,
            no_memory,
        } => {
            let agent = build_agent(&cli).await?;
            println!("{}", agent.ask(&question, !no_memory).await);
            Ok(())
        }
        Commands::Ingest { content } => {
            let mut agent = build_agent(&cli).await?;
            if repl::is_url(&content) {
                let page = agent.fetch_url(&content).await?;
                let title = if page.title.is_empty() { "Untitled" } else { &page.title };
                println!("✓ Ingested: {title}");
            } else if agent.ingest(&content, None).await {
                println!("✓ Content ingested successfully");
            } else {
                return Err("Failed to ingest content".into());
            }
            Ok(())
        }
        Commands::Interactive => {
            let mut agent = build_agent(&cli).await?;
            repl::run(&mut agent, cli.search_tool, io::stdin().lock(), &mut io::stdout()).await?;
            Ok(())
        }
    }
}

/// Load the config file (or defaults), apply CLI overrides and build the agent.
async fn build_agent(cli: &Cli) -> Result<Agent, Box<dyn Error>> {
    // An explicit --config must exist; the default location may not.
    let mut agent_config = match &cli.config {
        Some(path) => config::load_config(path.to_str().ok_or("Config path is not valid UTF-8")?)?,
        None => config::load_or_default(&config_dir()?.join(CONFIG_FILE))?,
    };
    cli.apply_overrides(&mut agent_config);
    debug!("Config loaded: {:?}", agent_config);

    Ok(Agent::from_config(&agent_config, &cli.credentials()).await?)
}

/// Write the default config into the config directory.
fn init() -> Result<(), Box<dyn Error>> {
    let path = config::write_default_config(&config_dir()?)?;
    info!("Config ready at {}", path.display());
    println!("Config file: {}", path.display());
    Ok(())
}
