//! Environment-driven configuration for the CLI.

use std::env;

use validator::Validate;

/// Default file the report is written to.
pub const DEFAULT_OUTPUT_PATH: &str = "gl-dependency-scanning-report.json";

/// Log output format for the CLI subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Application configuration loaded from environment variables.
///
/// Command-line flags override these values.
#[derive(Debug, Clone, Validate)]
pub struct AppConfig {
    #[validate(length(min = 1))]
    pub output_path: String,
    #[validate(length(min = 1))]
    pub manifest_path: Option<String>,
    pub log_filter: String,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, validator::ValidationErrors> {
        let config = Self {
            output_path: env::var("NPM_AUDIT_DEPSCAN_OUTPUT")
                .unwrap_or_else(|_| DEFAULT_OUTPUT_PATH.to_string()),
            manifest_path: env::var("NPM_AUDIT_DEPSCAN_MANIFEST").ok(),
            log_filter: env::var("RUST_LOG")
                .unwrap_or_else(|_| "npm_audit_depscan=info".to_string()),
            log_format: env::var("NPM_AUDIT_DEPSCAN_LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(LogFormat::Text),
        };
        config.validate()?;
        Ok(config)
    }
}
