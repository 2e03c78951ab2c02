use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

const MIN_DEBOUNCE_MS: u64 = 150;
const MAX_DEBOUNCE_MS: u64 = 300;

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

/// Top-level configuration for the discovery service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub discovery: DiscoveryConfig,
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
        let format = match environment {
            AppEnvironment::Development => LogFormat::Pretty,
            _ => LogFormat::Compact,
        };

        let catalog_dir = env::var("APP_CATALOG_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        let geolocation_timeout_ms = read_u64("APP_GEOLOCATION_TIMEOUT_MS", 10_000)?;
        let fit_padding = read_u64("APP_MAP_FIT_PADDING", 50)?;
        let debounce_ms =
            read_u64("APP_FILTER_DEBOUNCE_MS", 200)?.clamp(MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, format },
            discovery: DiscoveryConfig {
                catalog_dir,
                geolocation_timeout: Duration::from_millis(geolocation_timeout_ms),
                fit_padding: u32::try_from(fit_padding).map_err(|_| ConfigError::InvalidNumber {
                    variable: "APP_MAP_FIT_PADDING",
                })?,
                filter_debounce: Duration::from_millis(debounce_ms),
            },
        })
    }
}

fn read_u64(variable: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { variable }),
        Err(_) => Ok(default),
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

/// Tunables for the discovery engine and map view.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryConfig {
    /// Directory holding `listings.csv`, `professionals.csv`, and `projects.csv`.
    pub catalog_dir: Option<PathBuf>,
    pub geolocation_timeout: Duration,
    /// Pixel padding applied when fitting the viewport to entity bounds.
    pub fit_padding: u32,
    pub filter_debounce: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            catalog_dir: None,
            geolocation_timeout: Duration::from_secs(10),
            fit_padding: 50,
            filter_debounce: Duration::from_millis(200),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { variable: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { variable } => {
                write!(f, "{variable} must be a non-negative integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
