use anyhow::Result;
use pollution_forecaster::{api, config, forecast::ForecastEngine, ml::ModelArtifacts, telemetry};
use config::Config;
use std::sync::Arc;
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load()?;

    // A missing model keeps the service up; forecast endpoints answer 503
    let artifacts = match ModelArtifacts::load(&cfg.model.artifact_path) {
        Ok(artifacts) => Some(Arc::new(artifacts)),
        Err(e) => {
            warn!(
                path = %cfg.model.artifact_path.display(),
                error = %format!("{e:#}"),
                "model not loaded, forecasts unavailable"
            );
            None
        }
    };

    let settings = cfg.forecast.engine_settings(artifacts.as_deref());
    let synthesizer = cfg.features.synthesizer(cfg.forecast.jitter_seed);
    if let Some(stats) = artifacts.as_deref().and_then(ModelArtifacts::statistics) {
        let shadowed = synthesizer.catalog().shadowed_by(stats);
        if !shadowed.is_empty() {
            info!(
                features = ?shadowed,
                "training means replace configured feature defaults"
            );
        }
    }
    let engine = ForecastEngine::new(artifacts, synthesizer, settings);

    let addr = cfg.server.socket_addr()?;

    if cfg.server.host == "0.0.0.0" {
        warn!("Server binding to 0.0.0.0 - service will be accessible from the network");
    }

    info!(
        %addr,
        model_loaded = engine.is_model_loaded(),
        confidence = ?settings.confidence,
        "starting pollution forecaster"
    );

    let app = api::router(api::AppState::new(cfg, engine))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
