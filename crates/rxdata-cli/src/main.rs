//! `rxdata` CLI: inspect Ruby Marshal (`.rxdata`) files from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Dump a map file as pretty-printed JSON
//! rxdata dump -i Data/Map001.rxdata
//!
//! # Pipe through stdin, compact output to a file
//! cat Data/System.rxdata | rxdata dump --compact -o system.json
//!
//! # Node and cache counts for many files at once
//! rxdata stats Data/*.rxdata
//!
//! # A stream whose version header was already stripped
//! rxdata --raw dump -i value.bin
//! ```

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use rxdata_core::{DecodeOptions, Decoder, Document};
use std::fmt::Write as _;
use std::io::{self, Read, Write};
use std::thread;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "rxdata",
    version,
    about = "Inspect Ruby Marshal (.rxdata) game data files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Input has no 2-byte version header
    #[arg(long, global = true)]
    raw: bool,

    /// Maximum nesting depth before decoding fails
    #[arg(long, global = true, default_value_t = rxdata_core::decoder::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Do not give string instance-variable wrappers their own cache slot
    #[arg(long, global = true)]
    no_ivar_slot: bool,

    /// Skip unread special-class payload bytes instead of failing
    #[arg(long, global = true)]
    lenient: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a stream and print it as JSON
    Dump {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Single-line JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },
    /// Show node and cache counts for one or more files
    Stats {
        /// Files to decode
        #[arg(required = true)]
        files: Vec<String>,
    },
}

impl Cli {
    fn decode_options(&self) -> DecodeOptions {
        DecodeOptions::new()
            .with_max_depth(self.max_depth)
            .with_ivar_slot(!self.no_ivar_slot)
            .with_strict_payload(!self.lenient)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let options = cli.decode_options();
    debug!(?options, raw = cli.raw, "decode options");

    match &cli.command {
        Commands::Dump {
            input,
            output,
            compact,
        } => {
            let bytes = read_input(input.as_deref())?;
            let doc = decode_bytes(&bytes, &options, cli.raw)
                .with_context(|| format!("Failed to decode {}", input_name(input.as_deref())))?;
            let json = doc.to_json();
            let mut text = if *compact {
                serde_json::to_string(&json)?
            } else {
                serde_json::to_string_pretty(&json)?
            };
            text.push('\n');
            write_output(output.as_deref(), &text)?;
        }
        Commands::Stats { files } => {
            let reports = stats_all(files, &options, cli.raw);
            let mut failed = 0;
            let mut stdout = io::stdout().lock();
            for (path, report) in files.iter().zip(reports) {
                match report {
                    Ok(text) => write!(stdout, "{text}")?,
                    Err(e) => {
                        failed += 1;
                        eprintln!("{path}: {e:#}");
                    }
                }
            }
            if failed > 0 {
                anyhow::bail!("{failed} of {} files failed to decode", files.len());
            }
        }
    }

    Ok(())
}

fn decode_bytes(bytes: &[u8], options: &DecodeOptions, raw: bool) -> Result<Document> {
    let decoder = Decoder::with_options(bytes, options.clone());
    let doc = if raw { decoder.decode()? } else { decoder.load()? };
    Ok(doc)
}

/// Decode every file on its own scoped thread, returning reports in input order.
fn stats_all(files: &[String], options: &DecodeOptions, raw: bool) -> Vec<Result<String>> {
    thread::scope(|s| {
        let handles: Vec<_> = files
            .iter()
            .map(|path| s.spawn(move || stats_report(path, options, raw)))
            .collect();
        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .map_err(|_| anyhow!("decoder thread panicked"))
                    .and_then(|report| report)
            })
            .collect()
    })
}

fn stats_report(path: &str, options: &DecodeOptions, raw: bool) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read file: {path}"))?;
    let doc = decode_bytes(&bytes, options, raw).context("Failed to decode")?;
    info!(path, len = bytes.len(), "decoded");

    let root = doc.root();
    let root_name = match doc.class_name(root) {
        Some(class) => class.to_string(),
        None => root.kind().to_string(),
    };
    let stats = doc.stats();

    let mut out = String::new();
    writeln!(out, "{path}")?;
    writeln!(out, "  root:          {root_name}")?;
    writeln!(out, "  strings:       {}", stats.strings)?;
    writeln!(out, "  arrays:        {}", stats.arrays)?;
    writeln!(out, "  hashes:        {}", stats.hashes)?;
    writeln!(out, "  objects:       {}", stats.objects)?;
    writeln!(out, "  colors:        {}", stats.colors)?;
    writeln!(out, "  tables:        {}", stats.tables)?;
    writeln!(out, "  tones:         {}", stats.tones)?;
    writeln!(out, "  object cache:  {}", stats.object_cache)?;
    writeln!(out, "  symbol cache:  {}", stats.symbol_cache)?;
    writeln!(out, "  trailing:      {}", doc.trailing_bytes())?;
    for (class, count) in &stats.classes {
        writeln!(out, "  class {class}: {count}")?;
    }
    Ok(out)
}

fn input_name(path: Option<&str>) -> &str {
    path.unwrap_or("stdin")
}

fn read_input(path: Option<&str>) -> Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path).with_context(|| format!("Failed to read file: {path}")),
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {path}"))?;
        }
        None => {
            io::stdout()
                .write_all(content.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}
