//! Normalisation of heterogeneous stored package fields.
//!
//! Package records arrive with list fields either as native arrays or as
//! JSON text, and tour selections in two generations of format. Everything
//! here resolves those shapes once, before any pricing math runs.

use std::borrow::Cow;
use std::collections::HashMap;

use rust_decimal::Decimal;
use serde_json::Value;

use super::calculators::minor_to_major;
use super::diagnostics::{Diagnostics, PricingWarning};
use super::models::{ListField, PackageConfig, TourPricing};

/// Resolve a list field to its elements.
///
/// Absent values, JSON that fails to parse and anything that is not a list
/// all yield an empty slice.
pub fn normalize_list<'a>(
    field: &'a ListField,
    name: &'static str,
    diagnostics: &mut Diagnostics,
) -> Cow<'a, [Value]> {
    match field {
        ListField::Missing => Cow::Borrowed(&[]),
        ListField::Items(items) => Cow::Borrowed(items.as_slice()),
        ListField::Encoded(text) if text.trim().is_empty() => Cow::Borrowed(&[]),
        ListField::Encoded(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => Cow::Owned(items),
            Ok(Value::Null) => Cow::Borrowed(&[]),
            Ok(_) => {
                diagnostics.warn(PricingWarning::NotAList { field: name });
                Cow::Borrowed(&[])
            }
            Err(_) => {
                diagnostics.warn(PricingWarning::MalformedJson { field: name });
                Cow::Borrowed(&[])
            }
        },
        ListField::Other(Value::Null) => Cow::Borrowed(&[]),
        ListField::Other(_) => {
            diagnostics.warn(PricingWarning::NotAList { field: name });
            Cow::Borrowed(&[])
        }
    }
}

/// Tours a package references, with per-tour pricing when the selection
/// carries it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TourSelection {
    pub ids: Vec<i64>,
    pub pricing: Option<HashMap<i64, TourPricing>>,
}

impl TourSelection {
    pub fn pricing_for(&self, id: i64) -> Option<&TourPricing> {
        self.pricing.as_ref().and_then(|pricing| pricing.get(&id))
    }
}

/// Work out which tours a package includes.
///
/// `selectedTourId` wins over `tourSelection`. The format of
/// `tourSelection` is decided by its first element alone.
pub fn resolve_tour_selection(
    package: &PackageConfig,
    diagnostics: &mut Diagnostics,
) -> TourSelection {
    if let Some(id) = package.selected_tour_id.filter(|id| *id != 0) {
        return TourSelection {
            ids: vec![id],
            pricing: None,
        };
    }

    let entries = normalize_list(&package.tour_selection, "tourSelection", diagnostics);
    let priced = entries
        .first()
        .and_then(Value::as_object)
        .is_some_and(|first| first.contains_key("id"));

    if priced {
        resolve_priced_selection(&entries)
    } else {
        resolve_legacy_selection(&entries, diagnostics)
    }
}

fn resolve_priced_selection(entries: &[Value]) -> TourSelection {
    let mut ids = Vec::with_capacity(entries.len());
    let mut pricing = HashMap::with_capacity(entries.len());

    for entry in entries {
        let Some(id) = entry.get("id").and_then(int_from_value).filter(|id| *id != 0) else {
            continue;
        };
        let price = |key: &str| {
            minor_to_major(
                entry
                    .get(key)
                    .and_then(decimal_from_value)
                    .unwrap_or(Decimal::ZERO),
            )
        };

        ids.push(id);
        pricing.insert(
            id,
            TourPricing {
                adult_price: price("adultPrice"),
                child_price: price("childPrice"),
                infant_price: price("infantPrice"),
            },
        );
    }

    TourSelection {
        ids,
        pricing: Some(pricing),
    }
}

fn resolve_legacy_selection(entries: &[Value], diagnostics: &mut Diagnostics) -> TourSelection {
    let ids = entries
        .iter()
        .filter_map(|entry| {
            let id = int_from_value(entry);
            if id.is_none() {
                diagnostics.warn(PricingWarning::DroppedTourId {
                    raw: entry.to_string(),
                });
            }
            id
        })
        .collect();

    TourSelection { ids, pricing: None }
}

/// Coerce a stored id or count to an integer.
///
/// Strings go through [`parse_int`]; numbers must be integral.
pub fn int_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::String(text) => parse_int(text),
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    }
}

/// Integer prefix parse, as browsers do for form values.
///
/// Skips leading whitespace, takes an optional sign and an optional `0x`
/// prefix, then as many digits as follow. `None` when no digit is found.
pub fn parse_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let (radix, digits) = match unsigned.get(..2) {
        Some("0x") | Some("0X") => (16, &unsigned[2..]),
        _ => (10, unsigned),
    };

    let end = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let magnitude = i64::from_str_radix(&digits[..end], radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Read a stored amount that may be a JSON number or a numeric string.
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => match number.as_i64() {
            Some(whole) => Some(Decimal::from(whole)),
            None => number.as_f64().and_then(|f| Decimal::try_from(f).ok()),
        },
        Value::String(text) => text.trim().parse::<Decimal>().ok(),
        _ => None,
    }
}
