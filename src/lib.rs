//! Urban pollution forecasting
//!
//! Hourly air-quality index predictions from synthesized urban activity
//! features, with confidence bands, AQI categories and what-if scenario
//! comparison, served over HTTP.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod ml;
pub mod telemetry;
