pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod services;
pub mod util;

pub use app::AppState;
pub use cache::{TtlCell, TtlMap};
pub use config::{AppConfig, CacheTtls, CloudflareCredentials, UsageCredentials};
pub use error::{ApiError, AppError, Result};
pub use services::{AppServices, WriteGate, parse_year, validate_github_user};
pub use util::time::{next_utc_midnight_ms, parse_start_date};
