mod artifacts;
mod classifier;
mod config;
mod engine;
mod error;
mod language;
mod predictor;
mod preprocess;
mod types;
mod vectorizer;

use anyhow::Context;
use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::HeaderValue,
    response::Json,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use clap::Parser;
use metrics::counter;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use artifacts::Artifacts;
use config::{Config, CorsConfig, LogFormat, PredictionPolicy};
use engine::{Engine, Vectorizer};
use error::AppResult;
use language::WhatlangDetector;
use predictor::PredictionEngine;
use types::{InfoResponse, PredictionRequest, PredictionResponse};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_format);
    config.validate()?;

    tracing::info!("Starting prediction server with config: {:?}", config);

    tracing::info!("Loading model artifacts...");
    let artifacts = Artifacts::load(&config.vectorizer_path(), &config.model_path())
        .context("Failed to load model artifacts")?;
    tracing::info!(
        features = artifacts.vectorizer.dimension(),
        classes = ?artifacts.classifier.classes(),
        "Artifacts loaded successfully"
    );

    let engine = PredictionEngine::new(
        Arc::new(artifacts.vectorizer),
        Arc::new(artifacts.classifier),
        Arc::new(WhatlangDetector::new(config.min_language_confidence)),
        PredictionPolicy::from(&config),
    );

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app = build_router(AppState::new(Arc::new(engine)), &CorsConfig::from(&config))
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(prometheus_layer);

    let listener = TcpListener::bind(&config.server_address()).await?;
    tracing::info!("Server running on http://{}", config.server_address());
    tracing::info!("Prediction mode: {:?}", config.mode);

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,newsprobe=debug".into());

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[derive(Clone)]
struct AppState {
    engine: Arc<dyn Engine + Send + Sync>,
}

impl AppState {
    fn new(engine: Arc<dyn Engine + Send + Sync>) -> Self {
        Self { engine }
    }
}

fn build_router(state: AppState, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/predict", post(predict_handler))
        .layer(cors_layer(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `*` with credentials mirrors the caller's origin, method and headers,
/// since browsers refuse a literal wildcard on credentialed requests.
fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let layer = if !cors.allow_origins.is_empty() {
        let origins: Vec<HeaderValue> = cors
            .allow_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
    } else if cors.allow_credentials {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
    } else {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    layer.allow_credentials(cors.allow_credentials)
}

async fn root_handler() -> Json<InfoResponse> {
    Json(InfoResponse::default())
}

#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4().simple()))]
async fn predict_handler(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> AppResult<Json<PredictionResponse>> {
    let Json(request) = payload?;
    counter!("prediction_requests_total").increment(1);
    tracing::info!(
        input_len = request.inputs.len(),
        "Processing prediction request"
    );

    match state.engine.predict(request).await {
        Ok(response) => {
            counter!("predictions_total", "status" => response.outcome()).increment(1);
            tracing::info!(outcome = response.outcome(), "Prediction completed");
            Ok(Json(response))
        }
        Err(e) => {
            counter!("predictions_total", "status" => "error").increment(1);
            Err(e.into())
        }
    }
}
