use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// DSPT reporting period new assessments are opened against.
pub const DEFAULT_DSPT_YEAR: &str = "2025-26";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub questionnaire: QuestionnaireConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let dspt_year = env::var("DSPT_YEAR").unwrap_or_else(|_| DEFAULT_DSPT_YEAR.to_string());
        if !is_valid_dspt_year(&dspt_year) {
            return Err(ConfigError::InvalidDsptYear(dspt_year));
        }

        let catalog_csv = env::var("CATALOG_CSV")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            questionnaire: QuestionnaireConfig {
                dspt_year,
                catalog_csv,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Which reporting period to open and where the evidence catalog comes from.
#[derive(Debug, Clone)]
pub struct QuestionnaireConfig {
    pub dspt_year: String,
    /// Replaces the embedded DSPT v8 GP catalog when set.
    pub catalog_csv: Option<PathBuf>,
}

impl Default for QuestionnaireConfig {
    fn default() -> Self {
        Self {
            dspt_year: DEFAULT_DSPT_YEAR.to_string(),
            catalog_csv: None,
        }
    }
}

/// Accepts `YYYY-YY` where the second year follows the first, e.g. `2025-26`.
fn is_valid_dspt_year(value: &str) -> bool {
    let Some((start, end)) = value.split_once('-') else {
        return false;
    };
    if start.len() != 4 || end.len() != 2 {
        return false;
    }
    match (start.parse::<u32>(), end.parse::<u32>()) {
        (Ok(start), Ok(end)) => (start + 1) % 100 == end,
        _ => false,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost {
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("DSPT_YEAR must look like 2025-26, got '{0}'")]
    InvalidDsptYear(String),
}
