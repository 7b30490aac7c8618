use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Once};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use stockbench_core::{
    BenchConfig, CertainBookStore, LeastCopiesOrder, SweepSeries, TrialDriver, report::SweepReport,
};
use tracing::info;


static TRACE_INIT: Once = Once::new();
const DEFAULT_TRACE_FILTER: &str = "stockbench_core=info,stockbench_cli=info";
const CONFIG_FILE_NAME: &str = "stockbench.toml";
const DEFAULT_LABEL: &str = "local";

#[derive(Debug, Parser)]
#[command(
    name = "stockbench",
    author,
    version,
    about = "Concurrency sweep benchmark for the book store",
    long_about = None
)]
struct CliArgs {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a sweep against the in-process store and report throughput and latency.
    Run(RunArgs),
    /// Print the effective configuration as TOML.
    Config {
        /// Configuration file (defaults to ./stockbench.toml when present)
        #[arg(long, value_name = "FILE", value_parser = parse_checked_path)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Default, Args)]
struct RunArgs {
    /// Configuration file (defaults to ./stockbench.toml when present)
    #[arg(long, value_name = "FILE", value_parser = parse_checked_path)]
    config: Option<PathBuf>,
    /// Highest concurrency level of the sweep
    #[arg(long, value_name = "N")]
    max_concurrency: Option<usize>,
    /// Warm-up iterations per worker
    #[arg(long, value_name = "N")]
    warm_up: Option<usize>,
    /// Measured iterations per worker
    #[arg(long, value_name = "N")]
    runs: Option<usize>,
    /// Base seed for worker RNGs
    #[arg(long, value_name = "N")]
    seed: Option<u64>,
    /// Order replenishment candidates numerically instead of by their decimal string
    #[arg(long)]
    numeric_order: bool,
    /// Directory for latest.json / latest.csv
    #[arg(long, value_name = "DIR", value_parser = parse_checked_path)]
    output_dir: Option<PathBuf>,
    /// Series label in the report (default: local)
    #[arg(long)]
    label: Option<String>,
}

/// Config and report paths stay below the working directory.
fn checked_path(raw: &str) -> anyhow::Result<PathBuf> {
    let path = Path::new(raw);
    if path.components().any(|component| component == Component::ParentDir) {
        anyhow::bail!("path {raw:?} may not step outside the working directory ('..')");
    }
    Ok(path.to_path_buf())
}

fn parse_checked_path(raw: &str) -> Result<PathBuf, String> {
    checked_path(raw).map_err(|e| e.to_string())
}

/// What `STOCKBENCH_TRACE` asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TraceSetting {
    Off,
    /// Use `RUST_LOG` if set, else the crate default.
    DefaultFilter,
    Filter(String),
}

impl TraceSetting {
    fn parse(raw: &str) -> Self {
        let value = raw.trim();
        match value.to_ascii_lowercase().as_str() {
            "" | "0" | "false" | "off" => Self::Off,
            "1" | "true" | "on" => Self::DefaultFilter,
            _ => Self::Filter(value.to_string()),
        }
    }
}

fn maybe_init_tracing() {
    let Ok(raw) = std::env::var("STOCKBENCH_TRACE") else {
        return;
    };
    let filter_expr = match TraceSetting::parse(&raw) {
        TraceSetting::Off => return,
        TraceSetting::DefaultFilter => std::env::var("RUST_LOG").ok(),
        TraceSetting::Filter(expr) => Some(expr),
    };

    TRACE_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;

        let filter = filter_expr
            .and_then(|expr| EnvFilter::try_new(expr).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_TRACE_FILTER));
        let _ = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_env_filter(filter)
            .try_init();
    });
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<BenchConfig> {
    match explicit {
        Some(path) => BenchConfig::load(path),
        None => {
            let default_path = Path::new(CONFIG_FILE_NAME);
            if default_path.exists() {
                BenchConfig::load(default_path)
            } else {
                Ok(BenchConfig::default())
            }
        }
    }
}

/// Applies command-line overrides on top of the loaded file.
fn resolve_config(args: &RunArgs) -> anyhow::Result<BenchConfig> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(max_concurrency) = args.max_concurrency {
        config.max_concurrency = max_concurrency;
    }
    if let Some(warm_up) = args.warm_up {
        config.workload.warm_up_runs = warm_up;
    }
    if let Some(runs) = args.runs {
        config.workload.actual_runs = runs;
    }
    if args.seed.is_some() {
        config.workload.seed = args.seed;
    }
    if args.numeric_order {
        config.workload.least_copies_order = LeastCopiesOrder::Numeric;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    info!(
        max_concurrency = config.max_concurrency,
        actual_runs = config.workload.actual_runs,
        "starting sweep"
    );

    let store = Arc::new(CertainBookStore::new());
    let sweep = TrialDriver::new(config.workload.clone())
        .run_sweep(store.clone(), store, config.max_concurrency)
        .context("concurrency sweep failed")?;

    let mut report = SweepReport::now();
    let label = args.label.unwrap_or_else(|| DEFAULT_LABEL.to_string());
    report.push(SweepSeries::from_sweep(label, &sweep));
    print!("{}", report.render_table());

    if let Some(output_dir) = args.output_dir {
        let (json_path, csv_path) = report.write_to_dir(&output_dir)?;
        eprintln!("Report written to {}, {}", json_path.display(), csv_path.display());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    maybe_init_tracing();

    let CliArgs { command } = CliArgs::parse();
    match command.unwrap_or_else(|| Commands::Run(RunArgs::default())) {
        Commands::Run(args) => run(args),
        Commands::Config { config } => {
            let config = load_config(config.as_deref())?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}
