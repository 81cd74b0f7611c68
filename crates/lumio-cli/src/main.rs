//! Lumio CLI
//!
//! Command-line front end for the evaluation core:
//! - `filter`: run a JSON filter envelope and print the accepted ids
//! - `aggregate`: reduce a column of stored values
//! - `lock`: evaluate an attribute lock (and action button) for one record
//!
//! Requests are read from a file or stdin; results go to stdout as JSON and
//! logs to stderr.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use lumio_engine::FilterEnvelope;
use lumio_model::LanguageTag;
use lumio_values::DataAggregationType;
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod requests;

use requests::{AggregateRequest, LockRequest};

#[derive(Parser)]
#[command(name = "lumio")]
#[command(author, version, about = "Lumio: typed values, locks and document filtering")]
struct Cli {
    /// Default log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter documents and link instances with a JSON envelope.
    ///
    /// Prints `{"documentsIds": [...], "linkInstancesIds": [...]}`.
    Filter {
        #[command(flatten)]
        input: InputArgs,
        /// Also accept children of accepted documents
        #[arg(long)]
        include_children: bool,
        /// Also accept documents of linked collections that have no link
        #[arg(long)]
        include_non_linked: bool,
        /// Language tag for formatting and parsing (e.g. `cs`, `en-US`)
        #[arg(long)]
        language: Option<String>,
    },

    /// Aggregate a column of stored values.
    Aggregate {
        #[command(flatten)]
        input: InputArgs,
        /// sum, min, max, avg, median, count, unique or join
        #[arg(short, long, value_parser = parse_aggregation)]
        aggregation: Option<DataAggregationType>,
    },

    /// Evaluate the lock of one attribute on one record.
    Lock {
        #[command(flatten)]
        input: InputArgs,
        /// Attribute to evaluate; overrides the request's `attributeId`
        #[arg(long)]
        attribute: Option<String>,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Request file; stdin when omitted or `-`
    input: Option<PathBuf>,
}

impl InputArgs {
    fn read(&self) -> Result<String> {
        match self.input.as_deref() {
            Some(path) if path != Path::new("-") => {
                fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
            }
            _ => {
                let mut buffer = String::new();
                io::stdin()
                    .read_to_string(&mut buffer)
                    .context("failed to read stdin")?;
                Ok(buffer)
            }
        }
    }
}

fn parse_aggregation(text: &str) -> Result<DataAggregationType, String> {
    serde_json::from_value(serde_json::Value::String(text.to_lowercase()))
        .map_err(|_| format!("unknown aggregation `{text}`"))
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_filter(
    input: &InputArgs,
    include_children: bool,
    include_non_linked: bool,
    language: Option<&str>,
    pretty: bool,
) -> Result<()> {
    let json = input.read()?;
    let mut envelope = FilterEnvelope::from_json(&json)?;
    envelope.options.include_children |= include_children;
    envelope.options.include_non_linked_documents |= include_non_linked;
    if let Some(tag) = language {
        let language = LanguageTag::from_tag(tag).ok_or_else(|| anyhow!("unknown language tag `{tag}`"))?;
        envelope.options.language = Some(language);
    }

    let ids = envelope.evaluate();
    eprintln!(
        "{} {} documents, {} link instances",
        "ok".green().bold(),
        ids.documents_ids.len(),
        ids.link_instances_ids.len()
    );
    print_json(&ids, pretty)
}

fn cmd_aggregate(input: &InputArgs, aggregation: Option<DataAggregationType>, pretty: bool) -> Result<()> {
    let request: AggregateRequest =
        serde_json::from_str(&input.read()?).context("malformed aggregate request")?;
    let aggregation = aggregation.or(request.aggregation).unwrap_or_default();
    let constraint = request.constraint();
    if !constraint.aggregations().contains(&aggregation) {
        eprintln!(
            "{} {:?} is not offered for {} values",
            "info:".yellow().bold(),
            aggregation,
            constraint.kind()
        );
    }
    print_json(&request.aggregate(aggregation, &constraint), pretty)
}

fn cmd_lock(input: &InputArgs, attribute: Option<&str>, pretty: bool) -> Result<()> {
    let mut request: LockRequest = serde_json::from_str(&input.read()?).context("malformed lock request")?;
    if let Some(attribute) = attribute {
        request.attribute_id = attribute.to_string();
    }
    let report = request.evaluate()?;
    let status = if report.editable {
        "editable".green().bold()
    } else {
        "locked".red().bold()
    };
    eprintln!("{} {}", status, report.attribute_id);
    print_json(&report, pretty)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match &cli.command {
        Commands::Filter {
            input,
            include_children,
            include_non_linked,
            language,
        } => cmd_filter(
            input,
            *include_children,
            *include_non_linked,
            language.as_deref(),
            cli.pretty,
        ),
        Commands::Aggregate { input, aggregation } => cmd_aggregate(input, *aggregation, cli.pretty),
        Commands::Lock { input, attribute } => cmd_lock(input, attribute.as_deref(), cli.pretty),
    }
}
