//! Record of every fallback the engine applied while pricing.
//!
//! The engine never fails. When it has to guess (bad JSON, unknown tour,
//! inverted dates, amounts too large to represent) it records a
//! [`PricingWarning`] here instead.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

/// A degraded input that was absorbed rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricingWarning {
    #[error("{field} holds malformed JSON, treated as empty")]
    MalformedJson { field: &'static str },

    #[error("{field} is not a list, treated as empty")]
    NotAList { field: &'static str },

    #[error("tour selection entry {raw} is not a tour id, dropped")]
    DroppedTourId { raw: String },

    #[error("tour {id} has no pricing and no reference entry, skipped")]
    UnknownTour { id: i64 },

    #[error("date range {start} .. {end} is shorter than a night, priced as 1 night")]
    DateRangeFloored {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("date range is missing a start or end date, nights taken from duration")]
    MissingDate,

    #[error("unknown hotel package tier '{key}', priced as standard")]
    UnknownTier { key: String },

    #[error("{component} exceeded the largest representable amount, capped")]
    Overflow { component: &'static str },
}

/// Collector threaded through one pricing run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<PricingWarning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, warning: PricingWarning) {
        debug!("Pricing fallback: {}", warning);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[PricingWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<PricingWarning> {
        self.warnings
    }
}
