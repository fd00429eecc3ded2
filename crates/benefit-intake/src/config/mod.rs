use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::applicant::locale::{Locale, DEFAULT_LOCALE};

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
    pub intake: IntakeConfig,
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

        let default_locale = env::var("INTAKE_DEFAULT_LOCALE")
            .unwrap_or_else(|_| DEFAULT_LOCALE.to_string());
        if default_locale.trim().is_empty() {
            return Err(ConfigError::InvalidLocale);
        }
        let max_updates = match env::var("INTAKE_MAX_UPDATES") {
            Ok(value) => value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|max| *max > 0)
                .ok_or(ConfigError::InvalidMaxUpdates)?,
            Err(_) => IntakeConfig::DEFAULT_MAX_UPDATES,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                json: environment == AppEnvironment::Production,
            },
            intake: IntakeConfig {
                default_locale: Locale::new(default_locale),
                max_updates,
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
    pub json: bool,
}

/// Applicant intake limits and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeConfig {
    /// Locale stamped on newly created applicants.
    pub default_locale: Locale,
    /// Largest edit batch accepted by one staging call.
    pub max_updates: usize,
}

impl IntakeConfig {
    pub const DEFAULT_MAX_UPDATES: usize = 256;
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            default_locale: Locale::default(),
            max_updates: Self::DEFAULT_MAX_UPDATES,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLocale,
    InvalidMaxUpdates,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLocale => write!(f, "INTAKE_DEFAULT_LOCALE must not be blank"),
            ConfigError::InvalidMaxUpdates => {
                write!(f, "INTAKE_MAX_UPDATES must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidLocale
            | ConfigError::InvalidMaxUpdates => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("INTAKE_DEFAULT_LOCALE");
        env::remove_var("INTAKE_MAX_UPDATES");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(!config.telemetry.json);
        assert_eq!(config.intake, IntakeConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn reads_intake_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        env::set_var("INTAKE_DEFAULT_LOCALE", "es-US");
        env::set_var("INTAKE_MAX_UPDATES", "12");
        let config = AppConfig::load().expect("config loads");
        assert!(config.telemetry.json);
        assert_eq!(config.intake.default_locale, Locale::new("es-US"));
        assert_eq!(config.intake.max_updates, 12);
        reset_env();
    }

    #[test]
    fn rejects_invalid_update_limit() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("INTAKE_MAX_UPDATES", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidMaxUpdates)
        ));
        reset_env();
    }
}
