use crate::config::AppConfig;
use crate::error::Result;
use crate::services::AppServices;

/// Application state shared by every frontend (HTTP server, CLI).
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub services: AppServices,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let services = AppServices::new(&config)?;
        Ok(Self { config, services })
    }

    /// State built from the process environment with default endpoints.
    pub fn from_env() -> Result<Self> {
        Self::new(AppConfig::from_env())
    }
}
