//! Command-line entry point: analyse a confinement run laid out on disk.

use anyhow::{Context, Result};
use ccr_post::{AnalysisConfig, DirectorySource, EntropyMethod};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ccr_post_process",
    about = "Free-energy difference between two states from confinement simulations",
    version
)]
struct Cli {
    /// Directory holding one sub-directory per state
    #[arg(value_name = "DIR")]
    root: PathBuf,

    /// JSON analysis configuration
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Quasiharmonic entropy estimator (required unless set in the config file)
    #[arg(short, long, value_name = "METHOD")]
    entropy_method: Option<Method>,

    /// Directory for the CSV tables and report.json
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Bootstrap replicates
    #[arg(long, value_name = "N")]
    replicates: Option<usize>,

    /// Bootstrap seed (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Temperature in K
    #[arg(short, long, value_name = "K")]
    temperature: Option<f64>,

    /// Suppress progress bars
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Method {
    /// Eigen-decomposition with Planck's constant, rigid-body modes dropped
    Eigen,
    /// SVD with the reduced Planck constant (experimental)
    Svd,
}

impl From<Method> for EntropyMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Eigen => EntropyMethod::Eigen,
            Method::Svd => EntropyMethod::Svd,
        }
    }
}

fn load_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = match (&cli.config, cli.entropy_method) {
        (Some(path), _) => AnalysisConfig::from_file(path)
            .with_context(|| format!("reading configuration `{}`", path.display()))?,
        (None, Some(method)) => AnalysisConfig::new(method.into()),
        (None, None) => anyhow::bail!(
            "no entropy method chosen: pass --entropy-method eigen|svd or a config file"
        ),
    };
    if let Some(method) = cli.entropy_method {
        config.entropy_method = method.into();
    }
    if let Some(replicates) = cli.replicates {
        config.bootstrap_replicates = replicates;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if let Some(temperature) = cli.temperature {
        config.temperature = temperature;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let source = DirectorySource::new(&cli.root, config.schedule_header_lines, config.energy_model);
    let report = ccr_post::pipeline::run(&source, &config, cli.output.as_deref(), !cli.quiet)
        .with_context(|| format!("analysing `{}`", cli.root.display()))?;
    println!("{report}");
    Ok(())
}
