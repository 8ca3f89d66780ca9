use std::env;
use std::fmt;

use chrono::Duration;

use crate::rewards::builder::{RatesError, RewardRates};

const DEFAULT_LOG_KEY: &str = "mlm";
const DEFAULT_DELAY_HOURS: i64 = 48;

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
    pub telemetry: TelemetryConfig,
    pub rewards: RewardSettings,
    pub rates: RewardRates,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("MLM_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("MLM_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_key = env::var("MLM_LOG_KEY").unwrap_or_else(|_| DEFAULT_LOG_KEY.to_string());

        let skip_worthless = match env::var("MLM_SKIP_WORTHLESS") {
            Ok(raw) => parse_bool("MLM_SKIP_WORTHLESS", &raw)?,
            Err(_) => true,
        };

        let approval_delay = delay_from_env("MLM_APPROVAL_DELAY_HOURS")?;
        let denial_delay = delay_from_env("MLM_DENIAL_DELAY_HOURS")?;

        let mut rates = RewardRates::default();
        if let Ok(raw) = env::var("MLM_BASIC_TIER_BPS") {
            rates.basic_tier_bps =
                RewardRates::parse_tiers(&raw).map_err(|source| ConfigError::InvalidRates {
                    var: "MLM_BASIC_TIER_BPS",
                    source,
                })?;
        }
        if let Ok(raw) = env::var("MLM_EXTRA_BPS") {
            rates.extra_bps = raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                var: "MLM_EXTRA_BPS",
                value: raw.clone(),
            })?;
        }

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            rewards: RewardSettings {
                skip_worthless,
                log_key,
                approval_delay,
                denial_delay,
            },
            rates,
        })
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Policy switches for generation and the approval workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardSettings {
    /// Drop zero-valued rewards instead of persisting them.
    pub skip_worthless: bool,
    /// Namespace attached to every reward log span.
    pub log_key: String,
    pub approval_delay: Duration,
    pub denial_delay: Duration,
}

impl Default for RewardSettings {
    fn default() -> Self {
        Self {
            skip_worthless: true,
            log_key: DEFAULT_LOG_KEY.to_string(),
            approval_delay: Duration::hours(DEFAULT_DELAY_HOURS),
            denial_delay: Duration::hours(DEFAULT_DELAY_HOURS),
        }
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: raw.to_string(),
        }),
    }
}

fn delay_from_env(var: &'static str) -> Result<Duration, ConfigError> {
    let Ok(raw) = env::var(var) else {
        return Ok(Duration::hours(DEFAULT_DELAY_HOURS));
    };

    match raw.trim().parse::<i64>() {
        Ok(hours) if hours >= 0 => match Duration::try_hours(hours) {
            Some(delay) => Ok(delay),
            None => Err(ConfigError::InvalidNumber { var, value: raw }),
        },
        _ => Err(ConfigError::InvalidNumber { var, value: raw }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidBool {
        var: &'static str,
        value: String,
    },
    InvalidNumber {
        var: &'static str,
        value: String,
    },
    InvalidRates {
        var: &'static str,
        source: RatesError,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidBool { var, value } => {
                write!(f, "{var} must be a boolean, got '{value}'")
            }
            ConfigError::InvalidNumber { var, value } => {
                write!(f, "{var} must be a non-negative whole number, got '{value}'")
            }
            ConfigError::InvalidRates { var, .. } => {
                write!(f, "{var} must be a comma separated list of basis points")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidBool { .. } | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidRates { source, .. } => Some(source),
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
        for var in [
            "MLM_ENV",
            "MLM_LOG_LEVEL",
            "MLM_LOG_KEY",
            "MLM_SKIP_WORTHLESS",
            "MLM_APPROVAL_DELAY_HOURS",
            "MLM_DENIAL_DELAY_HOURS",
            "MLM_BASIC_TIER_BPS",
            "MLM_EXTRA_BPS",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.rewards, RewardSettings::default());
        assert_eq!(config.rates, RewardRates::default());
    }

    #[test]
    fn load_reads_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MLM_ENV", "ci");
        env::set_var("MLM_SKIP_WORTHLESS", "off");
        env::set_var("MLM_APPROVAL_DELAY_HOURS", "24");
        env::set_var("MLM_BASIC_TIER_BPS", "700,300");
        env::set_var("MLM_EXTRA_BPS", "50");

        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.environment, AppEnvironment::Test);
        assert!(!config.rewards.skip_worthless);
        assert_eq!(config.rewards.approval_delay, Duration::hours(24));
        assert_eq!(config.rewards.denial_delay, Duration::hours(48));
        assert_eq!(config.rates.basic_tier_bps, vec![700, 300]);
        assert_eq!(config.rates.extra_bps, 50);
    }

    #[test]
    fn load_rejects_negative_delay() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MLM_DENIAL_DELAY_HOURS", "-3");

        let result = AppConfig::load();
        reset_env();

        match result {
            Err(ConfigError::InvalidNumber { var, value }) => {
                assert_eq!(var, "MLM_DENIAL_DELAY_HOURS");
                assert_eq!(value, "-3");
            }
            other => panic!("expected invalid number, got {other:?}"),
        }
    }

    #[test]
    fn load_rejects_delay_beyond_duration_range() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MLM_APPROVAL_DELAY_HOURS", "9999999999999");

        let result = AppConfig::load();
        reset_env();

        match result {
            Err(ConfigError::InvalidNumber { var, value }) => {
                assert_eq!(var, "MLM_APPROVAL_DELAY_HOURS");
                assert_eq!(value, "9999999999999");
            }
            other => panic!("expected invalid number, got {other:?}"),
        }
    }
}
