//! Package price engine for the travel booking platform.
//!
//! The storefront and cart hand a package record, the party and the stay
//! dates to [`pricing::compute_price`] (or a [`pricing::PriceEngine`] bound
//! to a reference-data snapshot) and get back a [`pricing::PriceBreakdown`].

pub mod config;
pub mod error;
pub mod pricing;
pub mod telemetry;

pub use config::PricingConfig;
pub use error::{PricingError, Result};
