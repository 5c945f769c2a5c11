use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::{collections::BTreeMap, net::SocketAddr, path::PathBuf};
use tracing::warn;

use crate::forecast::{
    CategoryBasis, ConfidenceMode, EngineSettings, FeatureCatalog, FeatureRole,
    FeatureSynthesizer, DEFAULT_BAND_FRACTION, DEFAULT_MAX_HORIZON_HOURS, Z_95,
};
use crate::ml::ModelArtifacts;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub enable_cors: bool,
    /// Allowed browser origin; any origin when unset
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            request_timeout_secs: 30,
            enable_cors: true,
            cors_origin: None,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub artifact_path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from("models/pollution_model.json"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceKind {
    #[default]
    Proportional,
    ResidualStd,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub mode: ConfidenceKind,
    pub fraction: f64,
    pub z: f64,
    /// Used when the artifacts carry no residual std
    pub residual_std: Option<f64>,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            mode: ConfidenceKind::Proportional,
            fraction: DEFAULT_BAND_FRACTION,
            z: Z_95,
            residual_std: None,
        }
    }
}

impl ConfidenceConfig {
    /// Concrete band strategy for the loaded model
    pub fn resolve(&self, artifacts: Option<&ModelArtifacts>) -> ConfidenceMode {
        match self.mode {
            ConfidenceKind::Proportional => ConfidenceMode::proportional(self.fraction),
            ConfidenceKind::ResidualStd => {
                match artifacts.and_then(|a| a.residual_std()).or(self.residual_std) {
                    Some(residual_std) => ConfidenceMode::ResidualStd {
                        residual_std,
                        z: self.z,
                    },
                    None => {
                        warn!(
                            fraction = self.fraction,
                            "no residual std available, using proportional confidence bands"
                        );
                        ConfidenceMode::proportional(self.fraction)
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub default_horizon_hours: i64,
    pub whatif_horizon_hours: i64,
    pub max_horizon_hours: i64,
    pub category_basis: CategoryBasis,
    pub confidence: ConfidenceConfig,
    /// Enables seeded jitter on synthesized features
    pub jitter_seed: Option<u64>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_horizon_hours: 48,
            whatif_horizon_hours: 24,
            max_horizon_hours: DEFAULT_MAX_HORIZON_HOURS,
            category_basis: CategoryBasis::Raw,
            confidence: ConfidenceConfig::default(),
            jitter_seed: None,
        }
    }
}

impl ForecastConfig {
    pub fn engine_settings(&self, artifacts: Option<&ModelArtifacts>) -> EngineSettings {
        EngineSettings {
            confidence: self.confidence.resolve(artifacts),
            category_basis: self.category_basis,
            max_horizon_hours: self.max_horizon_hours,
        }
    }
}

/// Catalog adjustments: default values and heuristic roles per feature
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    pub defaults: BTreeMap<String, f64>,
    pub roles: BTreeMap<String, FeatureRole>,
}

impl FeaturesConfig {
    pub fn synthesizer(&self, jitter_seed: Option<u64>) -> FeatureSynthesizer {
        let catalog = FeatureCatalog::default().customized(&self.defaults, &self.roles);
        let synthesizer = FeatureSynthesizer::new(catalog);
        match jitter_seed {
            Some(seed) => synthesizer.with_jitter(seed),
            None => synthesizer,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("POLLUTION__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Self = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        let f = &self.forecast;
        if f.max_horizon_hours <= 0 {
            anyhow::bail!("forecast.max_horizon_hours must be positive");
        }
        for (name, hours) in [
            ("default_horizon_hours", f.default_horizon_hours),
            ("whatif_horizon_hours", f.whatif_horizon_hours),
        ] {
            if hours <= 0 || hours > f.max_horizon_hours {
                anyhow::bail!(
                    "forecast.{} must be within 1..={}, got {}",
                    name,
                    f.max_horizon_hours,
                    hours
                );
            }
        }
        let c = &f.confidence;
        for (name, value) in [
            ("fraction", Some(c.fraction)),
            ("z", Some(c.z)),
            ("residual_std", c.residual_std),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    anyhow::bail!(
                        "forecast.confidence.{} must be a non-negative number, got {}",
                        name,
                        v
                    );
                }
            }
        }
        if self.server.request_timeout_secs == 0 {
            anyhow::bail!("server.request_timeout_secs must be positive");
        }
        Ok(())
    }
}
