use std::fmt::Write as _;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use prereq::{Diagram, Highlight, LayoutConfig, PrerequisiteGraph};

#[derive(Parser)]
#[command(
    name = "prereq",
    version,
    about = "Lay out prerequisite flowcharts and trace the paths feeding a course"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the laid-out diagram as JSON
    Render {
        /// Input file, or "-" for stdin
        #[arg(default_value = "-")]
        input: String,

        /// TOML layout configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print every node and edge on a path into NODE
    Highlight {
        /// Focus node identifier
        node: String,

        /// Input file, or "-" for stdin
        #[arg(default_value = "-")]
        input: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match cli.command {
        Command::Render {
            input,
            config,
            pretty,
        } => cmd_render(&input, config.as_deref(), pretty),
        Command::Highlight {
            node,
            input,
            json,
            pretty,
        } => cmd_highlight(&node, &input, json, pretty),
    };

    match result {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

fn load_input(input: &str) -> Result<String> {
    let text = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| prereq::Error::Io {
                input: "stdin".to_string(),
                source,
            })?;
        buf
    } else {
        std::fs::read_to_string(input).map_err(|source| prereq::Error::Io {
            input: input.to_string(),
            source,
        })?
    };
    info!(input, bytes = text.len(), "loaded diagram");
    Ok(text)
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let mut json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(prereq::Error::from)?;
    json.push('\n');
    Ok(json)
}

fn cmd_render(input: &str, config: Option<&Path>, pretty: bool) -> Result<String> {
    let config = match config {
        Some(path) => LayoutConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => LayoutConfig::default(),
    };
    let text = load_input(input)?;
    let model = prereq::render_with_config(&text, &config);
    to_json(&model, pretty)
}

fn cmd_highlight(node: &str, input: &str, json: bool, pretty: bool) -> Result<String> {
    let text = load_input(input)?;
    let diagram = prereq::parse_graph(&text);
    if !diagram.contains_node(node) {
        warn!(node, "focus node is not declared in the diagram");
    }

    let graph = PrerequisiteGraph::from_diagram(&diagram);
    let highlight = prereq::find_prerequisite_paths(node, &graph);
    if json {
        return to_json(&highlight, pretty);
    }
    Ok(format_highlight(&diagram, &highlight))
}

fn format_highlight(diagram: &Diagram, highlight: &Highlight) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "nodes:");
    for id in &highlight.node_ids {
        match diagram.label(id) {
            Some(label) if label != id.as_str() => {
                let _ = writeln!(out, "  {id}  {label}");
            }
            _ => {
                let _ = writeln!(out, "  {id}");
            }
        }
    }
    let _ = writeln!(out, "edges:");
    for edge in diagram.edges.iter().filter(|e| highlight.contains_edge(&e.id)) {
        let _ = writeln!(out, "  {}  {} -> {}", edge.id, edge.source, edge.target);
    }
    out
}
