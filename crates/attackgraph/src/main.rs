use std::time::Instant;

use clap::ArgGroup;
use clap::Parser;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[cfg(target_env = "msvc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use attackgraph::AttackgraphOptions;
use attackgraph::run_main;
use attackgraph_error::Result;

#[derive(Parser, Debug)]
#[command(
    name = "attackgraph",
    about = "attackgraph: ATT&CK STIX bundles in, technique records and a nested knowledge base out",
    version,
    group = ArgGroup::new("inputs").required(true).args(["bundles", "dirs"])
)]
pub struct Cli {
    /// STIX bundle files to load (repeatable)
    #[arg(
        short = 'b',
        long = "bundle",
        value_name = "FILE",
        num_args = 1..,
        action = clap::ArgAction::Append,
        conflicts_with = "dirs"
    )]
    bundles: Vec<String>,

    /// Directories to scan recursively for *.json bundles (repeatable)
    #[arg(
        short = 'd',
        long = "dir",
        value_name = "DIR",
        num_args = 1..,
        action = clap::ArgAction::Append,
        conflicts_with = "bundles"
    )]
    dirs: Vec<String>,

    /// Output directory for technique records and the nested knowledge base
    #[arg(short = 'o', long = "out", value_name = "DIR", default_value = "mitre")]
    out: String,

    /// Filename of the nested knowledge base inside the output directory
    #[arg(
        long = "nested-file",
        value_name = "FILE",
        default_value = "attack_nested.json"
    )]
    nested_file: String,

    /// Do not write per-technique record files
    #[arg(long = "skip-records", default_value_t = false)]
    skip_records: bool,

    /// Do not write the nested knowledge base
    #[arg(long = "skip-nested", default_value_t = false)]
    skip_nested: bool,

    /// Keep revoked and deprecated techniques in the record output
    #[arg(long = "keep-revoked", default_value_t = false)]
    keep_revoked: bool,

    /// Render records one at a time instead of across the thread pool
    #[arg(long, default_value_t = false)]
    sequential: bool,

    /// Log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Initialize the tracing subscriber. `RUST_LOG` wins when set;
/// otherwise `-v` picks the level and silence stays the default.
fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => return,
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(args: Cli) -> Result<()> {
    let total_start = Instant::now();

    init_tracing(args.verbose);

    let opts = AttackgraphOptions {
        bundles: args.bundles,
        dirs: args.dirs,
        out: args.out.clone(),
        nested_file: args.nested_file.clone(),
        skip_records: args.skip_records,
        skip_nested: args.skip_nested,
        keep_revoked: args.keep_revoked,
        sequential: args.sequential,
    };

    let summary = match run_main(&opts) {
        Ok(summary) => summary,
        Err(err) => {
            tracing::error!(error = %err, "execution failed");
            return Err(err);
        }
    };

    if summary.records_failed > 0 {
        eprintln!("{} techniques failed; see logs", summary.records_failed);
    }
    if !args.skip_records {
        println!(
            "Extraction completed. {} techniques saved to {}/",
            summary.records_written, args.out
        );
    }
    if summary.nested_written {
        println!("Nested KB written to {}/{}", args.out, args.nested_file);
    }

    let total_secs = total_start.elapsed().as_secs_f64();
    tracing::info!(total_secs, "complete");
    eprintln!("Total time: {total_secs:.2}s");
    Ok(())
}

pub fn main() {
    let args = Cli::parse();
    if let Err(err) = run(args) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
