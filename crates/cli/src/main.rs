use btc_bias_core::error::PriceDataUnavailable;
use btc_bias_core::pipeline::Pipeline;
use btc_bias_core::report::render_text;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    name = "btc-bias",
    about = "Same-day BTC-USD directional bias from headlines and recent returns"
)]
struct Args {
    /// Print the structured JSON report instead of the text summary.
    #[arg(long)]
    json: bool,

    /// Number of headlines listed in the text summary.
    #[arg(long, default_value_t = 10)]
    headlines: usize,

    /// Evaluate as of this instant (RFC 3339). Defaults to the current UTC time.
    #[arg(long)]
    now: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let settings = btc_bias_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let now = btc_bias_core::time::utc_day::resolve_now(args.now.as_deref(), chrono::Utc::now())?;

    let pipeline = Pipeline::from_settings(&settings)?;

    match pipeline.run(now).await {
        Ok(report) => {
            if args.json {
                println!("{}", report.to_json_pretty()?);
            } else {
                print!("{}", render_text(&report, args.headlines));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            if let Some(diag) = err.downcast_ref::<PriceDataUnavailable>() {
                tracing::error!(
                    symbol = %diag.symbol,
                    stage = diag.stage,
                    "price data unavailable"
                );
                eprintln!(
                    "Failed to fetch {} price data. Check network access and try again.",
                    diag.symbol
                );
                eprintln!("Error: {diag}");
            } else {
                tracing::error!(error = %err, "run failed");
                eprintln!("Run failed.\nError: {err:#}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn init_sentry(settings: &btc_bias_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
