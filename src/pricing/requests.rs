//! Request envelopes for pricing calls.
//!
//! Decoding only fails when the envelope itself is unusable. Irregular
//! fields decode to their empty value and the engine absorbs the rest.

use serde::Deserialize;

use crate::error::Result;

use super::models::{
    lenient_entries, lenient_opt_string, or_default, DateContext, GuestCounts, PackageConfig,
    RoomRef, TourLookupEntry,
};
use super::services::{CartLine, ReferenceData};

/// Request to price a single package
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackagePriceRequest {
    #[serde(deserialize_with = "or_default")]
    pub package: PackageConfig,
    #[serde(deserialize_with = "or_default")]
    pub guests: GuestCounts,
    #[serde(deserialize_with = "or_default")]
    pub dates: DateContext,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub hotel_package_tier: Option<String>,
    #[serde(deserialize_with = "lenient_entries")]
    pub all_rooms: Vec<RoomRef>,
    #[serde(deserialize_with = "lenient_entries")]
    pub all_tours: Vec<TourLookupEntry>,
}

impl PackagePriceRequest {
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Split off the reference tables for a [`super::PriceEngine`].
    pub fn reference_data(&self) -> ReferenceData {
        ReferenceData {
            all_rooms: self.all_rooms.clone(),
            all_tours: self.all_tours.clone(),
        }
    }
}

/// Request to price every line of a cart
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CartPriceRequest {
    #[serde(deserialize_with = "lenient_entries")]
    pub lines: Vec<CartLine>,
    #[serde(deserialize_with = "lenient_entries")]
    pub all_rooms: Vec<RoomRef>,
    #[serde(deserialize_with = "lenient_entries")]
    pub all_tours: Vec<TourLookupEntry>,
}

impl CartPriceRequest {
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn reference_data(&self) -> ReferenceData {
        ReferenceData {
            all_rooms: self.all_rooms.clone(),
            all_tours: self.all_tours.clone(),
        }
    }
}
