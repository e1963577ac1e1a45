use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use stockrank_core::config::Settings;
use stockrank_core::domain::recommendation::RecommendationReport;
use stockrank_core::domain::weights::WeightVector;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod output;

#[derive(Debug, Parser)]
#[command(name = "stockrank_worker")]
struct Args {
    /// Factor snapshot JSON. Defaults to FACTOR_SNAPSHOT_PATH.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Weight vector JSON. Defaults to SCORING_WEIGHTS_PATH, then SCORING_WEIGHT_* env.
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Number of recommendations. Zero or negative produces an empty list.
    #[arg(long, allow_negative_numbers = true)]
    top_n: Option<i64>,

    /// Fail the run when no ticker could be scored.
    #[arg(long)]
    strict: bool,

    /// Maximum tickers scored concurrently.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Market as-of date (YYYY-MM-DD). Must match the snapshot when given.
    #[arg(long)]
    as_of_date: Option<String>,

    /// Write the report here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Do everything except writing the report.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    apply_args(&mut settings, &args);

    match run(&settings, &args).await {
        Ok(()) => Ok(()),
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %format!("{err:#}"), "recommendation run failed");
            Err(err)
        }
    }
}

fn apply_args(settings: &mut Settings, args: &Args) {
    if let Some(input) = &args.input {
        settings.factor_snapshot_path = Some(input.clone());
    }
    if let Some(weights) = &args.weights {
        settings.scoring_weights_path = Some(weights.clone());
    }
    if let Some(top_n) = args.top_n {
        settings.top_n = top_n;
    }
    if args.strict {
        settings.require_non_empty = true;
    }
    if let Some(concurrency) = args.concurrency {
        settings.concurrency = concurrency;
    }
}

async fn run(settings: &Settings, args: &Args) -> anyhow::Result<()> {
    // Weights first: a bad weighting must stop the run before anything is scored.
    let weights: WeightVector = settings
        .load_weights()
        .context("invalid scoring weights")?;
    tracing::info!(weights = ?weights.as_per_category(), "scoring weights loaded");

    let explicit_date = args
        .as_of_date
        .as_deref()
        .map(|s| stockrank_core::time::market_date::resolve_as_of_date(Some(s), settings.market, chrono::Utc::now()))
        .transpose()?;

    let snapshot_path = settings.require_factor_snapshot_path()?;
    let snapshot = stockrank_core::ingest::snapshot::load_snapshot(snapshot_path, explicit_date)?;
    let as_of_date = snapshot.as_of_date;

    if explicit_date.is_none() {
        let market_date =
            stockrank_core::time::market_date::resolve_as_of_date(None, settings.market, chrono::Utc::now())?;
        if market_date != as_of_date {
            tracing::warn!(%as_of_date, %market_date, "factor snapshot is not for the latest market date");
        }
    }

    let opts = settings.run_options();
    tracing::info!(
        %as_of_date,
        market = %settings.market,
        candidates = snapshot.items.len(),
        top_n = opts.top_n,
        strict = opts.strict,
        concurrency = opts.concurrency,
        "starting recommendation run"
    );

    let out = stockrank_core::scoring::run(snapshot.items, &weights, opts).await?;
    out.recommendations.validate()?;

    for item in out.recommendations.items() {
        tracing::info!(
            rank = item.rank,
            ticker = %item.ticker(),
            composite = item.score.composite,
            rating = %item.score.rating,
            "{} recommended",
            item.score.rating.icon()
        );
    }

    let report = RecommendationReport {
        as_of_date,
        generated_at: chrono::Utc::now(),
        market: settings.market,
        weights,
        requested_top_n: opts.top_n,
        recommendations: out.recommendations,
        summary: out.summary,
    };

    if args.dry_run {
        tracing::info!(
            %as_of_date,
            dry_run = true,
            recommendations = report.recommendations.len(),
            excluded = report.summary.excluded.len(),
            "run complete (dry-run); report not written"
        );
        return Ok(());
    }

    output::write_report(&report, args.output.as_deref())?;
    tracing::info!(
        %as_of_date,
        recommendations = report.recommendations.len(),
        excluded = report.summary.excluded.len(),
        "run complete"
    );
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
