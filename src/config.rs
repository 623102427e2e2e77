use rust_decimal::Decimal;

use crate::domain::catalog::DEFAULT_FEATURED_LIMIT;
use crate::domain::order::{CancelRejectionPolicy, ProgressionPolicy, TransitionPolicy};
use crate::domain::pricing::DEFAULT_TAX_RATE;

// ============================================================================
// Configuration
// ============================================================================
//
// Read once at startup from the environment (a `.env` file is honoured).
// Unset variables fall back to defaults; set-but-invalid values are errors.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScyllaConfig {
    pub node: String,
    pub keyspace: String,
}

#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    pub tax_rate: Decimal,
    pub featured_limit: usize,
    pub transition_policy: TransitionPolicy,
    /// `None` selects the in-memory store.
    pub scylla: Option<ScyllaConfig>,
    /// `None` disables the metrics server.
    pub metrics_port: Option<u16>,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            tax_rate: DEFAULT_TAX_RATE,
            featured_limit: DEFAULT_FEATURED_LIMIT,
            transition_policy: TransitionPolicy::default(),
            scylla: None,
            metrics_port: Some(9090),
        }
    }
}

impl StorefrontConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let tax_rate = match lookup("STOREFRONT_TAX_RATE") {
            Some(raw) => {
                let rate: Decimal = parse("STOREFRONT_TAX_RATE", &raw)?;
                if rate < Decimal::ZERO || rate >= Decimal::ONE {
                    return Err(invalid("STOREFRONT_TAX_RATE", &raw, "must be in [0, 1)"));
                }
                rate
            }
            None => defaults.tax_rate,
        };

        let featured_limit = match lookup("STOREFRONT_FEATURED_LIMIT") {
            Some(raw) => parse("STOREFRONT_FEATURED_LIMIT", &raw)?,
            None => defaults.featured_limit,
        };

        let progression: ProgressionPolicy = match lookup("STOREFRONT_PROGRESSION") {
            Some(raw) => parse("STOREFRONT_PROGRESSION", &raw)?,
            None => defaults.transition_policy.progression,
        };

        let cancel_rejection: CancelRejectionPolicy = match lookup("STOREFRONT_CANCEL_REJECTION") {
            Some(raw) => parse("STOREFRONT_CANCEL_REJECTION", &raw)?,
            None => defaults.transition_policy.cancel_rejection,
        };

        let scylla = lookup("SCYLLA_NODE").map(|node| ScyllaConfig {
            node,
            keyspace: lookup("SCYLLA_KEYSPACE").unwrap_or_else(|| "storefront".to_string()),
        });

        let metrics_port = match lookup("METRICS_PORT") {
            Some(raw) => match parse::<u16>("METRICS_PORT", &raw)? {
                0 => None,
                port => Some(port),
            },
            None => defaults.metrics_port,
        };

        Ok(Self {
            tax_rate,
            featured_limit,
            transition_policy: TransitionPolicy {
                progression,
                cancel_rejection,
            },
            scylla,
            metrics_port,
        })
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| invalid(key, raw, &e.to_string()))
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
