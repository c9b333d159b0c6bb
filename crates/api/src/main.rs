use axum::{
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use btc_bias_core::error::PriceDataUnavailable;
use btc_bias_core::pipeline::Pipeline;
use btc_bias_core::report::{render_text, Report};

const DEFAULT_TEXT_HEADLINES: usize = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = btc_bias_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let pipeline = Pipeline::from_settings(&settings)?;
    let state = AppState {
        pipeline: Arc::new(pipeline),
    };

    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/signal", get(get_signal))
        .route("/signal.txt", get(get_signal_text))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
}

#[derive(Debug, Deserialize)]
struct TextParams {
    headlines: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        sentry_anyhow::capture_anyhow(&err);
        match err.downcast_ref::<PriceDataUnavailable>() {
            Some(diag) => {
                tracing::warn!(symbol = %diag.symbol, stage = diag.stage, "price data unavailable");
                Self {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    message: diag.to_string(),
                }
            }
            None => {
                tracing::error!(error = %err, "pipeline run failed");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "pipeline run failed".to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ApiErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

async fn run_pipeline(state: &AppState) -> Result<Report, ApiError> {
    Ok(state.pipeline.run(chrono::Utc::now()).await?)
}

async fn get_signal(State(state): State<AppState>) -> Result<Json<Report>, ApiError> {
    let report = run_pipeline(&state).await?;
    Ok(Json(report))
}

async fn get_signal_text(
    State(state): State<AppState>,
    Query(params): Query<TextParams>,
) -> Result<String, ApiError> {
    let report = run_pipeline(&state).await?;
    Ok(render_text(
        &report,
        params.headlines.unwrap_or(DEFAULT_TEXT_HEADLINES),
    ))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
