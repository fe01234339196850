use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tools::{format_codes, format_tree, inspect, load_bag, InspectReport};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "dmap-tools",
    version,
    about = "DMAP inspection and decoding tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a captured DMAP body and print its node tree.
    Inspect {
        /// Path to the message bytes.
        message: PathBuf,
        /// A captured `/content-codes` body to decode with instead of the built-in codes.
        #[arg(long)]
        codes: Option<PathBuf>,
        /// Output format.
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
    /// Print a content-code table.
    Codes {
        /// A captured `/content-codes` body; the built-in codes when omitted.
        #[arg(long)]
        codes: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let limits = wire::Limits::default();
    match cli.command {
        Command::Inspect {
            message,
            codes,
            format,
        } => {
            let codes = codes.as_deref().map(read_file).transpose()?;
            let bag = load_bag(codes.as_deref(), &limits).context("parse content codes")?;
            let bytes = read_file(&message)?;
            let report = inspect(&bytes, &bag, &limits)
                .with_context(|| format!("decode {}", message.display()))?;
            if report.unknown > 0 {
                tracing::warn!(unknown = report.unknown, "message carries unregistered codes");
            }
            match format {
                Format::Json => {
                    let json =
                        serde_json::to_string_pretty(&report.root).context("serialize json")?;
                    println!("{json}");
                }
                Format::Pretty => print_inspect_report(&report),
            }
        }
        Command::Codes { codes } => {
            let codes = codes.as_deref().map(read_file).transpose()?;
            let bag = load_bag(codes.as_deref(), &limits).context("parse content codes")?;
            print!("{}", format_codes(&bag));
        }
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("read {}", path.display()))
}

fn print_inspect_report(report: &InspectReport) {
    println!(
        "{} bytes, {} nodes, depth {}",
        report.bytes, report.nodes, report.depth
    );
    if report.unknown > 0 {
        println!("unknown codes: {}", report.unknown);
    }
    print!("{}", format_tree(&report.root));
}
