//! flow-reconstructor CLI
//!
//! Reconstruct per-transaction money flows from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Reconstruct links for every transaction of a book
//! flow-reconstructor reconstruct --input book.json
//!
//! # Use the LP strategy and emit JSON
//! flow-reconstructor reconstruct --input book.json --strategy continuous --format json
//!
//! # Generate a random balanced book for testing
//! flow-reconstructor generate --transactions 500 --seed 7 --output book.json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use flow_reconstructor::config::{ReconstructorConfig, StrategyKind};
use flow_reconstructor::core::book::Book;
use flow_reconstructor::reconstruction::{BatchReport, LinkReconstructor};
use flow_reconstructor::simulation::generator::{generate_book, BookConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(
    name = "flow-reconstructor",
    version,
    about = "Reconstruct who-paid-whom inside ledger transactions",
    long_about = "Given each account's net change in a transaction, reconstructs the \
                  directed money flows between the accounts, choosing the assignment \
                  with the least total movement."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct links for every transaction of a book
    Reconstruct {
        /// Path to a JSON book ({ "accounts": [...], "splits": [...] })
        #[arg(short, long)]
        input: PathBuf,
        /// JSON configuration file; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Solving strategy: continuous or exact
        #[arg(short, long, env = "FLOW_RECONSTRUCTOR_STRATEGY")]
        strategy: Option<String>,
        /// Minor units per currency unit for the exact strategy
        #[arg(short, long)]
        denomination: Option<u32>,
        /// Per-transaction solve budget in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Worker threads
        #[arg(short, long)]
        workers: Option<usize>,
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Generate a random balanced book
    Generate {
        #[arg(short, long, default_value_t = 100)]
        transactions: usize,
        #[arg(short, long, default_value_t = 5)]
        max_splits: usize,
        #[arg(long)]
        seed: Option<u64>,
        /// Write to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// JSON output schema for one transaction.
#[derive(serde::Serialize)]
struct TransactionOutput<'a> {
    transaction: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    links: Option<&'a flow_reconstructor::core::link::LinkSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorOutput>,
}

#[derive(serde::Serialize)]
struct ErrorOutput {
    kind: &'static str,
    message: String,
}

#[derive(serde::Serialize)]
struct ReportOutput<'a> {
    strategy: StrategyKind,
    summary: flow_reconstructor::reconstruction::batch::BatchSummary,
    transactions: Vec<TransactionOutput<'a>>,
}

fn build_config(
    path: Option<PathBuf>,
    strategy: Option<String>,
    denomination: Option<u32>,
    timeout_ms: Option<u64>,
    workers: Option<usize>,
) -> ReconstructorConfig {
    let mut config = match path {
        Some(path) => ReconstructorConfig::from_file(&path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        }),
        None => ReconstructorConfig::default(),
    };
    if let Some(strategy) = strategy {
        config.strategy = strategy.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        });
    }
    if let Some(denomination) = denomination {
        config.denomination = denomination;
    }
    if timeout_ms.is_some() {
        config.timeout_ms = timeout_ms;
    }
    if let Some(workers) = workers {
        config.workers = workers;
    }
    config
}

fn load_book(path: &Path) -> Book {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path.display(), e);
        process::exit(1);
    });
    Book::from_json(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing book: {}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "accounts": [ {{ "id": "a300", "type": "BANK", "name": "Checking" }} ],
  "splits":   [ {{ "transaction": "t1", "account": "a300", "value": "-25.42" }} ]
}}"#
        );
        process::exit(1);
    })
}

fn print_text(report: &BatchReport) {
    for outcome in report.outcomes() {
        match &outcome.result {
            Ok(links) => {
                println!("Transaction {}", outcome.transaction);
                if links.is_empty() {
                    println!("  (no flow)");
                }
                for link in links {
                    println!("  {} → {}: {}", link.source, link.target, link.value);
                }
            }
            Err(e) => println!("Transaction {}: FAILED ({}) {}", outcome.transaction, e.kind(), e),
        }
    }
    let summary = report.summary();
    println!(
        "\nReconstructed {}/{} transactions, {} links, {} failed",
        summary.reconstructed, summary.transactions, summary.links, summary.failed
    );
}

fn cmd_reconstruct(input: PathBuf, config: ReconstructorConfig, format: Format) {
    let reconstructor = LinkReconstructor::new(config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });
    let book = load_book(&input);
    let transactions = book.transactions().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    let report = reconstructor.reconstruct_batch(&transactions);

    match format {
        Format::Text => print_text(&report),
        Format::Json => {
            let output = ReportOutput {
                strategy: reconstructor.strategy_kind(),
                summary: report.summary(),
                transactions: report
                    .outcomes()
                    .iter()
                    .map(|o| TransactionOutput {
                        transaction: o.transaction.as_str(),
                        links: o.result.as_ref().ok(),
                        error: o.result.as_ref().err().map(|e| ErrorOutput {
                            kind: e.kind(),
                            message: e.to_string(),
                        }),
                    })
                    .collect(),
            };
            match serde_json::to_string_pretty(&output) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error serializing report: {}", e);
                    process::exit(1);
                }
            }
        }
    }
}

fn cmd_generate(transactions: usize, max_splits: usize, seed: Option<u64>, output: Option<PathBuf>) {
    let config = BookConfig {
        transaction_count: transactions,
        max_splits,
        seed,
        ..Default::default()
    };
    let book = generate_book(&config);
    let json = book.to_json().unwrap_or_else(|e| {
        eprintln!("Error serializing book: {}", e);
        process::exit(1);
    });

    if let Some(path) = output {
        fs::write(&path, &json).unwrap_or_else(|e| {
            eprintln!("Error writing to '{}': {}", path.display(), e);
            process::exit(1);
        });
        eprintln!(
            "Generated {} transactions ({} splits) → {}",
            transactions,
            book.splits.len(),
            path.display()
        );
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Reconstruct {
            input,
            config,
            strategy,
            denomination,
            timeout_ms,
            workers,
            format,
        } => {
            let config = build_config(config, strategy, denomination, timeout_ms, workers);
            cmd_reconstruct(input, config, format);
        }
        Commands::Generate {
            transactions,
            max_splits,
            seed,
            output,
        } => cmd_generate(transactions, max_splits, seed, output),
    }
}
