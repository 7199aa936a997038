use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use rust_decimal::Decimal;

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub pdf: PdfServiceConfig,
    pub commissions: CommissionDefaults,
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

        let pdf_base_url = env::var("PDF_SERVICE_URL").ok().filter(|url| !url.trim().is_empty());

        let commissions = CommissionDefaults {
            capturing_percentage: percentage_var("COMMISSION_CAPTURING_PCT", "2")?,
            selling_percentage: percentage_var("COMMISSION_SELLING_PCT", "3")?,
            total_percentage: percentage_var("COMMISSION_TOTAL_PCT", "5")?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            pdf: PdfServiceConfig {
                base_url: pdf_base_url,
            },
            commissions,
        })
    }
}

fn percentage_var(name: &'static str, default: &str) -> Result<Decimal, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse::<Decimal>()
        .map_err(|_| ConfigError::InvalidPercentage { name })
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Location of the external proposal renderer, when one is deployed.
#[derive(Debug, Clone)]
pub struct PdfServiceConfig {
    pub base_url: Option<String>,
}

/// Percentages used to seed the initial commission rule when the store
/// starts empty.
#[derive(Debug, Clone)]
pub struct CommissionDefaults {
    pub capturing_percentage: Decimal,
    pub selling_percentage: Decimal,
    pub total_percentage: Decimal,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidPercentage { name: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidPercentage { name } => {
                write!(f, "{name} must be a decimal percentage")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidPercentage { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
