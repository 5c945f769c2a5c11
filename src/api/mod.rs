pub mod error;
pub mod forecast;
pub mod health;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::{sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::{config::Config, forecast::ForecastEngine};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub engine: Arc<ForecastEngine>,
}

impl AppState {
    pub fn new(cfg: Config, engine: ForecastEngine) -> Self {
        Self {
            cfg: Arc::new(cfg),
            engine: Arc::new(engine),
        }
    }
}

pub fn router(state: AppState) -> Result<Router> {
    let cfg = state.cfg.clone();

    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .route("/features", get(forecast::list_features))
        .route("/predict", post(forecast::predict))
        .route("/predict-48h", post(forecast::predict_horizon))
        .route("/predict-whatif", post(forecast::predict_what_if))
        .with_state(state);

    if cfg.server.enable_cors {
        use tower_http::cors::{AllowOrigin, Any};
        let origin = match &cfg.server.cors_origin {
            Some(origin) => AllowOrigin::exact(origin.parse()?),
            None => AllowOrigin::from(Any),
        };
        let cors = CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers([axum::http::header::CONTENT_TYPE]);
        router = router.layer(cors);
    }

    Ok(router
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024))
                .layer(TimeoutLayer::new(Duration::from_secs(cfg.server.request_timeout_secs))),
        )
        .layer(TraceLayer::new_for_http()))
}
