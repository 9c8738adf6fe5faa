use anyhow::Result;
use serde::Deserialize;

use crate::session::SessionConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub session: SessionSettings,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionSettings {
    /// Seconds of inactivity before auto-stop; <= 0 disables it
    pub silence_timeout_secs: f64,
    /// Request intermediate results from the backend
    pub report_partials: bool,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Build a per-session config (fresh session id) from the loaded settings.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            silence_timeout_secs: self.session.silence_timeout_secs,
            report_partials: self.session.report_partials,
            ..SessionConfig::default()
        }
    }
}
