use std::str::FromStr;
use std::time::Duration;

use crate::domain::pricing::PlatformRates;
use crate::utils::CircuitBreakerConfig;

// ============================================================================
// Application Configuration
// ============================================================================
//
// Loaded once at startup from the environment (and `.env` if present).
// Unset keys fall back to defaults; set-but-unparseable keys are errors so a
// typo in a rate never silently prices orders at the default.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid platform rates: {0}")]
    InvalidRates(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port for `/metrics` and `/health`; 0 disables the server
    pub metrics_port: u16,
    pub order_number_prefix: String,
    /// Rates in force at startup, published as version 1
    pub platform_rates: PlatformRates,
    pub notification_breaker: CircuitBreakerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            metrics_port: 9090,
            order_number_prefix: "RUZ".to_string(),
            platform_rates: PlatformRates::default(),
            notification_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_ok() {
            tracing::debug!("Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let rates = defaults.platform_rates;
        let breaker = defaults.notification_breaker;

        let platform_rates = PlatformRates {
            version: rates.version,
            base_delivery_charge: parse(&lookup, "BASE_DELIVERY_CHARGE", rates.base_delivery_charge)?,
            per_km_rate: parse(&lookup, "PER_KM_RATE", rates.per_km_rate)?,
            platform_fee_percentage: parse(&lookup, "PLATFORM_FEE_PERCENTAGE", rates.platform_fee_percentage)?,
            default_commission_percentage: parse(
                &lookup,
                "DEFAULT_COMMISSION_PERCENTAGE",
                rates.default_commission_percentage,
            )?,
        };
        platform_rates
            .validate()
            .map_err(|e| ConfigError::InvalidRates(e.to_string()))?;

        let notification_breaker = CircuitBreakerConfig {
            failure_threshold: parse(&lookup, "NOTIFY_FAILURE_THRESHOLD", breaker.failure_threshold)?,
            open_duration: Duration::from_secs(parse(
                &lookup,
                "NOTIFY_OPEN_SECS",
                breaker.open_duration.as_secs(),
            )?),
            success_threshold: breaker.success_threshold,
        };

        let order_number_prefix = lookup("ORDER_NUMBER_PREFIX")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.order_number_prefix);

        Ok(Self {
            metrics_port: parse(&lookup, "METRICS_PORT", defaults.metrics_port)?,
            order_number_prefix,
            platform_rates,
            notification_breaker,
        })
    }
}

fn parse<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}
