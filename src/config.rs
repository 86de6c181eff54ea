//! Environment-driven configuration.
//!
//! Reads `.env` (if present) and then the process environment:
//!
//! | Variable | Default |
//! |---|---|
//! | `PRICING_CURRENCY` | `EGP` |
//! | `PRICING_DEFAULT_TIER` | `standard` |
//! | `PRICING_LOG` | `package_pricing=info` |

use tracing::{info, warn};

use crate::error::{PricingError, Result};
use crate::pricing::HotelPackageTier;

const DEFAULT_CURRENCY: &str = "EGP";
const DEFAULT_LOG_FILTER: &str = "package_pricing=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingConfig {
    /// Currency code attached to display amounts.
    pub currency: String,
    /// Tier applied when a request does not name one.
    pub default_tier: HotelPackageTier,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            default_tier: HotelPackageTier::Standard,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl PricingConfig {
    pub fn from_env() -> Result<Self> {
        if dotenvy::dotenv().is_err() {
            info!("No .env file found, using process environment");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let currency = match lookup("PRICING_CURRENCY") {
            Some(raw) if raw.trim().is_empty() => {
                return Err(PricingError::Config {
                    key: "PRICING_CURRENCY",
                    message: "must not be empty".to_string(),
                });
            }
            Some(raw) => raw.trim().to_uppercase(),
            None => {
                info!("PRICING_CURRENCY not set, using default: {}", defaults.currency);
                defaults.currency
            }
        };

        let default_tier = match lookup("PRICING_DEFAULT_TIER") {
            Some(raw) => HotelPackageTier::from_key(raw.trim()).ok_or_else(|| {
                warn!("Invalid PRICING_DEFAULT_TIER value: {}", raw);
                PricingError::Config {
                    key: "PRICING_DEFAULT_TIER",
                    message: format!("unknown tier '{}'", raw),
                }
            })?,
            None => defaults.default_tier,
        };

        let log_filter = lookup("PRICING_LOG")
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or(defaults.log_filter);

        Ok(Self {
            currency,
            default_tier,
            log_filter,
        })
    }
}
