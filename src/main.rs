use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::{error, info};

use heart_warehouse::config::{EnvProvider, JsonFileProvider, LayeredProvider};
use heart_warehouse::{
    ConsoleReporter, LocalObjectStore, Pipeline, RunMode, RunOptions, WarehouseConfig,
};

#[global_allocator]
static ALLOC: snmalloc_rs::SnMalloc = snmalloc_rs::SnMalloc;

/// Which layers to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LayerArg {
    /// Bronze only
    Bronze,
    /// Bronze and silver
    Silver,
    /// Bronze, silver and gold
    Full,
}

impl From<LayerArg> for RunMode {
    fn from(layer: LayerArg) -> Self {
        match layer {
            LayerArg::Bronze => Self::IngestOnly,
            LayerArg::Silver => Self::ThroughCleaning,
            LayerArg::Full => Self::Full,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "heart-warehouse")]
#[command(about = "Bronze/silver/gold warehouse pipeline for the heart disease dataset")]
#[command(version)]
struct Cli {
    /// Which layers to run
    #[arg(long, value_enum, default_value_t = LayerArg::Full)]
    layer: LayerArg,

    /// Skip uploads and keep every artifact in the work directory
    #[arg(long)]
    no_upload: bool,

    /// Skip the CSV export of the gold relations
    #[arg(long)]
    no_export: bool,

    /// Directory for the CSV export (defaults to `<work dir>/export`)
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Flat JSON file with configuration values; the environment takes precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show stage spinners
    #[arg(long)]
    progress: bool,

    /// Print the run report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Worker threads for cleaning and aggregation (defaults to the CPU count)
    #[arg(long)]
    threads: Option<usize>,
}

fn load_config(cli: &Cli) -> anyhow::Result<WarehouseConfig> {
    let mut provider = LayeredProvider::default().then(EnvProvider::with_dotenv());
    if let Some(path) = &cli.config {
        let file = JsonFileProvider::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
        provider = provider.then(file);
    }
    WarehouseConfig::from_provider(&provider).context("Invalid warehouse configuration")
}

fn run(cli: &Cli) -> anyhow::Result<bool> {
    let threads = cli.threads.unwrap_or_else(num_cpus::get).max(1);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .context("Failed to configure the worker pool")?;

    let config = load_config(cli)?;
    info!("{config}");

    let export_dir = (!cli.no_export && cli.layer == LayerArg::Full)
        .then(|| cli.export_dir.clone().unwrap_or_else(|| config.work_dir.join("export")));
    let options = RunOptions {
        upload: !cli.no_upload,
        export_dir,
        progress: cli.progress,
    };

    let store = Arc::new(LocalObjectStore::new(&config.storage_root));
    let pipeline = Pipeline::new(config, store)?
        .with_options(options)?
        .with_observer(ConsoleReporter::new(!cli.json));

    match pipeline.run(cli.layer.into()) {
        Ok(report) => {
            if cli.json {
                println!("{}", report.to_json()?);
            }
            info!("Warehouse pipeline completed successfully");
            Ok(true)
        }
        Err(e) => {
            error!("The pipeline terminated with errors: {e}");
            Ok(false)
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
