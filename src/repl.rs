//! # Interactive mode
//!
//! A line-oriented loop over an [`Agent`]. Each line is `<command> [argument]`;
//! the command word is case-insensitive and the rest of the line, trimmed, is
//! its argument.
//!
//! The loop is generic over its input and output so it can be driven from
//! stdin/stdout or from in-memory buffers.

use crossterm::{
    ExecutableCommand,
    style::{Attribute, Color, SetAttribute, SetForegroundColor},
};
use std::io::{self, BufRead, Write};
use tracing::debug;

use crate::agent::Agent;
use crate::tools::SearchChoice;

const PROMPT: &str = "You> ";
const PREVIEW_CHARS: usize = 500;

const ASK_USAGE: &str = "Usage: ask <question>";
const INGEST_USAGE: &str = "Usage: ingest <text or URL>";
const SEARCH_USAGE: &str = "Usage: search <query>";
const FETCH_USAGE: &str = "Usage: fetch <URL>";

const HELP: &str = "\
  ask <question>     - Ask a question (uses memory for context)
  ingest <text/URL>  - Ingest text or fetch & ingest a URL
  search <query>     - Search the web
  fetch <URL>        - Fetch and display content from a URL
  stats              - Show memory statistics
  help               - Show this help message
  exit/quit          - Exit the assistant";

/// True for strings that literally start with `http://` or `https://`.
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// One parsed REPL line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand<'a> {
    Ask(&'a str),
    Ingest(&'a str),
    Search(&'a str),
    Fetch(&'a str),
    Stats,
    Help,
    Exit,
    /// A known command given without its argument; holds the usage line.
    Usage(&'static str),
    Unknown(String),
}

fn require<'a>(
    argument: &'a str,
    usage: &'static str,
    make: fn(&'a str) -> ReplCommand<'a>,
) -> ReplCommand<'a> {
    if argument.is_empty() {
        ReplCommand::Usage(usage)
    } else {
        make(argument)
    }
}

impl<'a> ReplCommand<'a> {
    /// Parse a line; `None` for blank input.
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (word, argument) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        Some(match word.to_lowercase().as_str() {
            "ask" => require(argument, ASK_USAGE, ReplCommand::Ask),
            "ingest" => require(argument, INGEST_USAGE, ReplCommand::Ingest),
            "search" => require(argument, SEARCH_USAGE, ReplCommand::Search),
            "fetch" => require(argument, FETCH_USAGE, ReplCommand::Fetch),
            "stats" => ReplCommand::Stats,
            "help" => ReplCommand::Help,
            "exit" | "quit" => ReplCommand::Exit,
            other => ReplCommand::Unknown(other.to_string()),
        })
    }
}

enum Flow {
    Continue,
    Exit,
}

/// Run the loop until `exit`/`quit` or end of input.
pub async fn run<R: BufRead, W: Write>(
    agent: &mut Agent,
    search: SearchChoice,
    input: R,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "\n🧠 Ollama CLI Agent")?;
    writeln!(out, "Type 'help' for available commands\n")?;

    let mut lines = input.lines();
    loop {
        out.execute(SetForegroundColor(Color::Green))?;
        write!(out, "{PROMPT}")?;
        out.execute(SetForegroundColor(Color::Reset))?;
        out.flush()?;

        let Some(line) = lines.next() else {
            writeln!(out)?;
            goodbye(out)?;
            break;
        };
        let line = line?;

        let Some(command) = ReplCommand::parse(&line) else {
            continue;
        };
        debug!(?command, "REPL command");

        if let Flow::Exit = dispatch(agent, search, command, out).await? {
            break;
        }
    }
    Ok(())
}

async fn dispatch<W: Write>(
    agent: &mut Agent,
    search: SearchChoice,
    command: ReplCommand<'_>,
    out: &mut W,
) -> io::Result<Flow> {
    match command {
        ReplCommand::Ask(question) => {
            writeln!(out, "\nThinking...")?;
            let answer = agent.ask(question, true).await;
            out.execute(SetForegroundColor(Color::Blue))?;
            out.execute(SetAttribute(Attribute::Bold))?;
            write!(out, "\n{answer}\n")?;
            out.execute(SetAttribute(Attribute::Reset))?;
            out.execute(SetForegroundColor(Color::Reset))?;
            writeln!(out)?;
        }
        ReplCommand::Ingest(content) if is_url(content) => {
            writeln!(out, "\nFetching and ingesting URL: {content}")?;
            match agent.fetch_url(content).await {
                Ok(page) => writeln!(out, "✓ Ingested: {}", title_or_untitled(&page.title))?,
                Err(e) => writeln!(out, "Error: {e}")?,
            }
        }
        ReplCommand::Ingest(content) => {
            if agent.ingest(content, None).await {
                writeln!(out, "✓ Content ingested successfully")?;
            } else {
                writeln!(out, "✗ Failed to ingest content")?;
            }
        }
        ReplCommand::Search(query) => {
            writeln!(out, "\nSearching for: {query}")?;
            let hits = agent.search_web(query, search).await;
            if hits.is_empty() {
                writeln!(out, "No results found.")?;
            } else {
                writeln!(out, "\nFound {} results:\n", hits.len())?;
                for (i, hit) in hits.iter().enumerate() {
                    writeln!(out, "{}. {}", i + 1, hit.title)?;
                    writeln!(out, "   {}", hit.link)?;
                    writeln!(out, "   {}\n", hit.snippet)?;
                }
            }
        }
        ReplCommand::Fetch(url) => {
            if !is_url(url) {
                writeln!(out, "Please provide a valid URL starting with http:// or https://")?;
                return Ok(Flow::Continue);
            }
            writeln!(out, "\nFetching: {url}")?;
            match agent.fetch_url(url).await {
                Ok(page) => {
                    writeln!(out, "\nTitle: {}", title_or_untitled(&page.title))?;
                    writeln!(out, "URL: {}", page.url)?;
                    if !page.content.is_empty() {
                        writeln!(out, "\nContent preview:\n{}", preview(&page.content))?;
                        writeln!(
                            out,
                            "\n✓ Full content ingested ({} characters)",
                            page.content.chars().count()
                        )?;
                    }
                }
                Err(e) => writeln!(out, "Error: {e}")?,
            }
        }
        ReplCommand::Stats => {
            let stats = agent.memory_stats().await;
            writeln!(out, "\n📊 Memory Statistics:\n")?;
            writeln!(out, "{}", serde_json::to_string_pretty(&stats).map_err(io::Error::other)?)?;
        }
        ReplCommand::Help => {
            writeln!(out, "\n🧠 Ollama CLI Agent - Available Commands:\n")?;
            writeln!(out, "{HELP}\n")?;
        }
        ReplCommand::Exit => {
            goodbye(out)?;
            return Ok(Flow::Exit);
        }
        ReplCommand::Usage(usage) => writeln!(out, "{usage}")?,
        ReplCommand::Unknown(command) => writeln!(
            out,
            "Unknown command: {command}. Type 'help' for available commands."
        )?,
    }
    Ok(Flow::Continue)
}

fn goodbye<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "\nGoodbye! 👋")
}

fn title_or_untitled(title: &str) -> &str {
    if title.is_empty() { "Untitled" } else { title }
}

fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}
