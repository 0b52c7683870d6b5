use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod data;
mod error;
mod model;
mod report;

use config::{Command, Config, OutputFormat, PredictArgs};
use data::{DatasetRepository, Snapshot};
use model::{ChampionProfile, PredictionRequest, ScoringParams};

fn main() -> Result<()> {
    let config = Config::parse();

    // Logs go to stderr so stdout carries only the report
    let default_level = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    config.validate()?;

    let source = data::open_source(&config.data)?;
    let mut repo = DatasetRepository::new(source);

    match &config.command {
        Command::Seasons => {
            let snapshot = repo.snapshot()?;
            if snapshot.dataset.is_empty() {
                warn!("{} contains no records", config.data.display());
            }
            print!("{}", report::render_seasons(&snapshot.dataset)?);
        }
        Command::Profile { decay } => {
            let snapshot = repo.snapshot()?;
            let profile = ChampionProfile::build(&snapshot.dataset, *decay)
                .context("Failed to build champion profile")?;
            let scale = snapshot.scale().ok();
            print!("{}", report::render_profile(&profile, scale.as_deref())?);
        }
        Command::Predict(args) => run_predict(&mut repo, args)?,
    }

    Ok(())
}

fn run_predict(repo: &mut DatasetRepository, args: &PredictArgs) -> Result<()> {
    let params = args.scoring_params();
    let request = PredictionRequest {
        season: args.season.clone(),
        roster: args.load_roster()?,
    };
    if args.chart && args.format == OutputFormat::Json {
        warn!("--chart is ignored with --format json");
    }

    let Some(secs) = args.watch else {
        let snapshot = repo.snapshot()?;
        print!("{}", render_prediction(&snapshot, &request, &params, args)?);
        return Ok(());
    };

    info!("Watching dataset every {}s (Ctrl-C to stop)", secs);
    let interval = Duration::from_secs(secs);
    let mut printed_for = 0;
    loop {
        match repo.snapshot() {
            Ok(snapshot) if repo.load_count() != printed_for => {
                printed_for = repo.load_count();
                match render_prediction(&snapshot, &request, &params, args) {
                    Ok(out) => print!("{}", out),
                    Err(e) => error!("Prediction failed: {:#}", e),
                }
            }
            Ok(_) => {}
            Err(e) => error!("Dataset reload failed: {:#}", e),
        }
        thread::sleep(interval);
    }
}

fn render_prediction(
    snapshot: &Snapshot,
    request: &PredictionRequest,
    params: &ScoringParams,
    args: &PredictArgs,
) -> Result<String> {
    let scale = snapshot.scale()?;
    let prediction = model::predict(&snapshot.dataset, &scale, request, params)?;

    match args.format {
        OutputFormat::Json => {
            let mut out = report::render_json(&prediction, Utc::now())
                .context("Failed to serialize prediction report")?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Table => {
            let mut out = report::render_table(&prediction)?;
            if args.chart {
                out.push('\n');
                out.push_str(&report::render_chart(&prediction.ranking, report::CHART_WIDTH)?);
            }
            Ok(out)
        }
    }
}
