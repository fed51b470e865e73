//! Command-line entry point: load a CSV, select a model, write diagnostics.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quarterly_forecast::io::{DiagnosticsReporter, FileSink, SeriesLoader};
use quarterly_forecast::pipeline::{Pipeline, PipelineConfig};
use quarterly_forecast::Result;

#[derive(Parser)]
#[command(name = "quarterly-forecast")]
#[command(about = "Select and fit a forecasting model for a quarterly series", long_about = None)]
struct Cli {
    /// Input CSV with a period-label column and a target column
    #[arg(short, long)]
    input: PathBuf,

    /// JSON configuration file (missing keys take their defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target column name
    #[arg(short, long)]
    target: Option<String>,

    /// Period-label column name
    #[arg(long)]
    period_column: Option<String>,

    /// Number of quarters to forecast
    #[arg(long)]
    horizon: Option<usize>,

    /// Training points in the first cross-validation fold
    #[arg(long)]
    min_train: Option<usize>,

    /// Directory for the output artifacts
    #[arg(short, long, default_value = "outputs")]
    output_dir: PathBuf,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(target) = &self.target {
            config = config.with_target_column(target.clone());
        }
        if let Some(column) = &self.period_column {
            config = config.with_period_column(column.clone());
        }
        if let Some(horizon) = self.horizon {
            config = config.with_horizon(horizon);
        }
        if let Some(min_train) = self.min_train {
            config = config.with_min_train(min_train);
        }
        Ok(config)
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.pipeline_config()?;
    let pipeline = Pipeline::new(config)?;

    let loaded = SeriesLoader::from_config(pipeline.config()).load_path(&cli.input)?;
    info!(
        observations = loaded.report.kept,
        dropped = loaded.report.dropped(),
        "series loaded"
    );

    let reporter = DiagnosticsReporter::new().with_input(&cli.input);
    let mut sink = FileSink::new(&cli.output_dir)?;
    let run = pipeline.run_and_report(&loaded.series, &reporter, &mut sink)?;

    for (period, point) in run.forecast.periods.iter().zip(&run.forecast.point) {
        info!(period = %period.label(), forecast = point, model = %run.forecast.model, "forecast");
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quarterly_forecast=info".into()),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "quarterly-forecast failed");
            ExitCode::FAILURE
        }
    }
}
