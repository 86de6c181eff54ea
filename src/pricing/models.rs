//! Input and output models for package pricing.
//!
//! Input models tolerate the shapes the package store actually delivers
//! (stringified JSON arrays, missing fields, loosely formatted dates).
//! Output models are plain values built fresh for every calculation.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::normalize::{decimal_from_value, int_from_value};

// ==================== package record ====================

/// Array-valued package field as stored: a native list or JSON text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListField {
    #[default]
    Missing,
    Items(Vec<Value>),
    Encoded(String),
    Other(Value),
}

impl From<Vec<Value>> for ListField {
    fn from(items: Vec<Value>) -> Self {
        ListField::Items(items)
    }
}

impl From<&str> for ListField {
    fn from(text: &str) -> Self {
        ListField::Encoded(text.to_string())
    }
}

/// How legacy tour prices scale with the party.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "Option<Value>")]
pub enum PricingMode {
    PerPerson,
    #[default]
    PerBooking,
}

impl From<Option<Value>> for PricingMode {
    fn from(raw: Option<Value>) -> Self {
        match raw.as_ref().and_then(Value::as_str) {
            Some("per_person") => PricingMode::PerPerson,
            _ => PricingMode::PerBooking,
        }
    }
}

/// The pricing-relevant subset of a stored package record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackageConfig {
    #[serde(deserialize_with = "lenient_int")]
    pub id: i64,
    /// List price in minor units. Never part of the computed subtotal.
    #[serde(deserialize_with = "lenient_int")]
    pub price: i64,
    #[serde(deserialize_with = "lenient_opt_int")]
    pub discounted_price: Option<i64>,
    /// Nominal trip length in nights.
    #[serde(deserialize_with = "lenient_opt_int")]
    pub duration: Option<i64>,
    pub rooms: ListField,
    #[serde(deserialize_with = "lenient_opt_int")]
    pub selected_tour_id: Option<i64>,
    pub tour_selection: ListField,
    pub pricing_mode: PricingMode,
}

// ==================== reference data ====================

/// A room as priced by the engine. Prices are major units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoomRef {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_decimal")]
    pub price: Decimal,
    #[serde(deserialize_with = "lenient_opt_decimal")]
    pub custom_price: Option<Decimal>,
}

impl RoomRef {
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            price,
            custom_price: None,
        }
    }

    /// Read a room out of a stored package record, filling gaps with zero.
    pub fn from_value(value: &Value) -> Self {
        Self {
            name: value
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            price: value
                .get("price")
                .and_then(decimal_from_value)
                .unwrap_or(Decimal::ZERO),
            custom_price: value.get("customPrice").and_then(decimal_from_value),
        }
    }

    /// Nightly rate: the custom price when one is set.
    pub fn unit_price(&self) -> Decimal {
        self.custom_price.unwrap_or(self.price)
    }
}

/// Tour from the reference table. `price` is in minor units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TourLookupEntry {
    #[serde(deserialize_with = "lenient_int")]
    pub id: i64,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_int")]
    pub price: i64,
}

/// Per-traveler-type tour prices, already converted to major units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TourPricing {
    pub adult_price: Decimal,
    pub child_price: Decimal,
    pub infant_price: Decimal,
}

// ==================== booking context ====================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuestCounts {
    #[serde(deserialize_with = "lenient_count")]
    pub adults: u32,
    #[serde(deserialize_with = "lenient_count")]
    pub children: u32,
    #[serde(deserialize_with = "lenient_count")]
    pub infants: u32,
}

impl GuestCounts {
    pub fn new(adults: u32, children: u32, infants: u32) -> Self {
        Self {
            adults,
            children,
            infants,
        }
    }

    /// Total head count (PAX), infants included.
    pub fn total_pax(&self) -> u64 {
        u64::from(self.adults) + u64::from(self.children) + u64::from(self.infants)
    }
}

/// Either an explicit stay range or a single departure date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum DateContext {
    Range {
        #[serde(rename = "startDate", default, deserialize_with = "lenient_date")]
        start_date: Option<DateTime<Utc>>,
        #[serde(rename = "endDate", default, deserialize_with = "lenient_date")]
        end_date: Option<DateTime<Utc>>,
    },
    Single {
        #[serde(rename = "selectedDate", default, deserialize_with = "lenient_date")]
        selected_date: Option<DateTime<Utc>>,
    },
}

impl DateContext {
    pub fn range(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        DateContext::Range {
            start_date: Some(start),
            end_date: Some(end),
        }
    }

    pub fn single(selected: Option<DateTime<Utc>>) -> Self {
        DateContext::Single {
            selected_date: selected,
        }
    }
}

impl Default for DateContext {
    fn default() -> Self {
        DateContext::single(None)
    }
}

/// Parse a booking date the way the storefront sends them.
///
/// Accepts RFC 3339, a zone-less `YYYY-MM-DDTHH:MM[:SS]` (read as UTC) and
/// a bare `YYYY-MM-DD` (UTC midnight).
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ==================== lenient field decoding ====================
//
// Stored records and storefront payloads carry nulls, numeric strings and
// the odd wrong type. These decoders map anything unusable to the field's
// empty value so only a broken envelope rejects a request.

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(text)) => parse_date(&text),
        Some(Value::Number(millis)) => millis
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    })
}

fn lenient_opt_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(int_from_value))
}

fn lenient_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_int(deserializer)?.unwrap_or_default())
}

/// Head counts below zero read as zero, above `u32::MAX` as `u32::MAX`.
fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let count = lenient_opt_int(deserializer)?.unwrap_or_default().max(0);
    Ok(u32::try_from(count).unwrap_or(u32::MAX))
}

fn lenient_opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(decimal_from_value))
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_decimal(deserializer)?.unwrap_or(Decimal::ZERO))
}

pub(crate) fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

/// Decode a nested record, falling back to its default when the value has
/// the wrong shape altogether.
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(T::deserialize(raw).unwrap_or_default())
}

/// Decode a reference table, skipping entries that are not records.
pub(crate) fn lenient_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| T::deserialize(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Hotel upgrade tier selected on the booking page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotelPackageTier {
    #[default]
    Standard,
    Deluxe,
    Luxury,
}

impl HotelPackageTier {
    /// Look up a tier by its exact key.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "standard" => Some(HotelPackageTier::Standard),
            "deluxe" => Some(HotelPackageTier::Deluxe),
            "luxury" => Some(HotelPackageTier::Luxury),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HotelPackageTier::Standard => "standard",
            HotelPackageTier::Deluxe => "deluxe",
            HotelPackageTier::Luxury => "luxury",
        }
    }

    /// Surcharge per night per paying guest, in major units.
    pub fn surcharge(&self) -> Decimal {
        match self {
            HotelPackageTier::Standard => Decimal::ZERO,
            HotelPackageTier::Deluxe => dec!(150),
            HotelPackageTier::Luxury => dec!(300),
        }
    }
}

// ==================== price breakdown ====================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomLine {
    pub name: String,
    pub nights: i64,
    pub cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourLine {
    pub name: String,
    pub cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcursionLine {
    pub name: String,
    pub cost: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BreakdownLines {
    pub rooms: Vec<RoomLine>,
    pub tours: Vec<TourLine>,
    pub excursions: Vec<ExcursionLine>,
}

/// Result of pricing one package for one party.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub subtotal: Decimal,
    /// Equal to `subtotal` until fees or taxes are layered on.
    pub total: Decimal,
    pub rooms_cost: Decimal,
    pub tours_cost: Decimal,
    pub excursions_cost: Decimal,
    pub upgrade_price: Decimal,
    pub actual_nights: i64,
    #[serde(rename = "totalPAX")]
    pub total_pax: u64,
    pub breakdown: BreakdownLines,
}
