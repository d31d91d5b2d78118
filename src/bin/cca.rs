//! CCA - paired-block canonical correlation CLI
//!
//! Command-line interface for composable canonical correlation analysis.

use clap::{Parser, Subcommand, ValueEnum};
use composable_cca::data::SampleTable;
use composable_cca::error::Result;
use composable_cca::pipeline::{run_integration, IntegrationConfig};
use composable_cca::simulate::{simulate, SimulationConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Report output format
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Canonical correlation analysis between paired measurement blocks
#[derive(Parser)]
#[command(name = "cca")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand a table, fit CCA, and project the input samples
    Run {
        /// Path to the paired sample table (CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Path to an integration configuration YAML
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of synthetic samples to fit on (overrides the config)
        #[arg(long)]
        simulate_n: Option<usize>,

        /// Random seed for the synthetic expansion (overrides the config)
        #[arg(long)]
        seed: Option<u64>,

        /// Fit on the input table directly, without synthetic expansion
        #[arg(long, conflicts_with_all = ["simulate_n", "seed"])]
        no_simulate: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a synthetic expansion of a table to CSV
    Simulate {
        /// Path to the paired sample table (CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,

        /// Number of samples to generate (default: 300)
        #[arg(short, long, default_value = "300")]
        n: usize,

        /// Random seed (default: 0)
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Path to an integration configuration YAML (layout and noise levels)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the shape of each block in a table
    Blocks {
        /// Path to the paired sample table (CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Path to an integration configuration YAML
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Generate an example integration configuration
    Example {
        /// Output path for the example YAML
        #[arg(short, long, default_value = "integration.yaml")]
        output: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            config,
            simulate_n,
            seed,
            no_simulate,
            format,
            output,
        } => cmd_run(
            &input,
            config.as_ref(),
            simulate_n,
            seed,
            no_simulate,
            format,
            output.as_ref(),
        ),

        Commands::Simulate {
            input,
            output,
            n,
            seed,
            config,
        } => cmd_simulate(&input, &output, n, seed, config.as_ref()),

        Commands::Blocks { input, config } => cmd_blocks(&input, config.as_ref()),

        Commands::Example { output } => cmd_example(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<IntegrationConfig> {
    match path {
        Some(path) => {
            eprintln!("Loading configuration from {:?}...", path);
            let yaml = std::fs::read_to_string(path)?;
            IntegrationConfig::from_yaml(&yaml)
        }
        None => Ok(IntegrationConfig::default()),
    }
}

/// Run the full integration
fn cmd_run(
    input_path: &PathBuf,
    config_path: Option<&PathBuf>,
    simulate_n: Option<usize>,
    seed: Option<u64>,
    no_simulate: bool,
    format: OutputFormat,
    output_path: Option<&PathBuf>,
) -> Result<()> {
    let mut config = load_config(config_path)?;

    if no_simulate {
        config.simulation = None;
    } else if simulate_n.is_some() || seed.is_some() {
        let mut sim = config.simulation.take().unwrap_or_default();
        if let Some(n) = simulate_n {
            sim.n_samples = n;
        }
        if let Some(seed) = seed {
            sim.seed = seed;
        }
        config.simulation = Some(sim);
    }

    eprintln!("Loading table from {:?}...", input_path);
    let table = SampleTable::from_csv_with_layout(input_path, &config.layout)?;
    eprintln!(
        "Loaded {} samples x {} features",
        table.n_samples(),
        table.n_features()
    );

    let report = run_integration(&table, &config)?;

    let rendered = match format {
        OutputFormat::Text => report.to_text(),
        OutputFormat::Json => report.to_json()?,
    };

    match output_path {
        Some(path) => {
            std::fs::write(path, &rendered)?;
            eprintln!("Wrote report to {:?}", path);
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// Write a synthetic expansion
fn cmd_simulate(
    input_path: &PathBuf,
    output_path: &PathBuf,
    n: usize,
    seed: u64,
    config_path: Option<&PathBuf>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let sim = SimulationConfig {
        n_samples: n,
        seed,
        ..config.simulation.unwrap_or_default()
    };

    let table = SampleTable::from_csv_with_layout(input_path, &config.layout)?;
    eprintln!(
        "Expanding {} samples to {} (seed {})...",
        table.n_samples(),
        n,
        seed
    );

    let expanded = simulate(&table, &config.layout, &sim)?;
    expanded.to_csv(output_path)?;
    eprintln!("Wrote {} samples to {:?}", expanded.n_samples(), output_path);

    Ok(())
}

/// Print block shapes
fn cmd_blocks(input_path: &PathBuf, config_path: Option<&PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let table = SampleTable::from_csv_with_layout(input_path, &config.layout)?;

    println!("Paired sample table:");
    println!("{}", table.to_csv_string()?);

    println!("Block shapes:");
    let blocks = config.layout.blocks();
    for ((name, rows, cols), (_, columns)) in table.block_shapes(&config.layout)?.into_iter().zip(blocks) {
        println!("- {}: ({}, {}) ({})", name, rows, cols, columns.join(", "));
    }

    Ok(())
}

/// Generate example configuration
fn cmd_example(output_path: &PathBuf) -> Result<()> {
    let config = IntegrationConfig::default();
    let yaml = config.to_yaml()?;

    std::fs::write(output_path, &yaml)?;
    eprintln!("Wrote example configuration to {:?}", output_path);
    eprintln!();
    eprintln!("Contents:");
    println!("{}", yaml);

    Ok(())
}
