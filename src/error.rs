//! Error handling for the boundary around the price engine.
//!
//! The engine itself never fails. These errors come from decoding request
//! envelopes and from reading configuration.

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("Invalid pricing request: {0}")]
    InvalidRequest(#[from] serde_json::Error),

    #[error("Invalid configuration for {key}: {message}")]
    Config { key: &'static str, message: String },
}

pub type Result<T> = std::result::Result<T, PricingError>;
