use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use nextday::core::io::MarketFileSource;
use predict_direction::*;

#[derive(Debug, Parser)]
#[command(name = "predict_direction")]
#[command(about = "Next-day price direction prediction from SMA, RSI and MACD")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run with settings given as flags
    Run(Config),
    /// Run with settings loaded from a TOML file
    FromConfig {
        #[arg(long, value_name = "FILE")]
        config: PathBuf,
    },
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);

    if let Some(path) = log_file {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|err| anyhow!("failed to create log directory {parent:?}: {err}"))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| anyhow!("failed to open log file {path:?}: {err}"))?;
        let (non_blocking_writer, guard) = non_blocking(file);
        // The writer flushes until the guard drops; keep it for the whole process.
        let _guard = Box::leak(Box::new(guard));
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(non_blocking_writer);
        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .with(file_layer)
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing: {err}"))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing: {err}"))
    }
}

fn main() -> Result<()> {
    println!("PREDICT - Next-Day Direction Prediction\n");

    let cli = Cli::parse();
    let config = match cli.command {
        Commands::Run(config) => config,
        Commands::FromConfig { config } => Config::from_file(&config)?,
    };
    config.validate()?;

    init_tracing(config.log_file.as_deref().map(Path::new))?;

    let source = MarketFileSource::new(&config.data_dir);
    println!("Loading market data from {}...", source.path_for(&config.symbol).display());

    let report = run_pipeline(&source, &config.request()?, &config.options())?;

    write_results(config.output_file("PREDICT.LOG"), &config, &report)?;
    write_json_report(config.output_file("report.json"), &report)?;
    if let Some(aligned) = report.aligned() {
        write_predictions_csv(config.output_file("predictions.csv"), &aligned.rows)?;
    }

    // Print summary
    println!("\n{}", "=".repeat(60));
    println!("Summary");
    println!("{}", "=".repeat(60));
    println!("\nData:");
    println!("  Symbol: {}", report.symbol);
    println!("  Price bars: {}", report.n_bars);
    println!("  Dataset rows: {}", report.dataset_rows);

    match &report.outcome {
        PipelineOutcome::InsufficientData { reason } => {
            println!("\nNo data: {}", reason);
        }
        PipelineOutcome::Trained { training, aligned } => {
            println!("\nModel Performance:");
            println!(
                "  Held-out accuracy: {:.4} ({} train / {} test, {:?} split)",
                training.held_out_accuracy, training.n_train, training.n_test, training.split
            );
            if training.degenerate_labels {
                println!("  Warning: only one target class present");
            }
            match aligned.display_accuracy {
                Some(acc) => println!("  Display accuracy: {:.4} over {} rows", acc, aligned.rows.len()),
                None => println!("  Display accuracy: n/a"),
            }
            println!("\nClassification Report:");
            print!("{}", training.report.to_table());
        }
    }

    if let Some(summary) = &report.summary {
        println!("\nLatest Indicators ({}):", summary.date);
        println!("  RSI: {:.2} ({})", summary.rsi, summary.rsi_state);
        println!("  MACD: {:.4} ({})", summary.macd, summary.macd_state);
    }

    Ok(())
}
