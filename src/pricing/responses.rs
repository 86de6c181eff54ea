//! Display DTOs for pricing results.
//!
//! Amounts are rounded to two places with banker's rounding and serialized
//! as strings, so consumers never see binary floating-point noise.

use rust_decimal::Decimal;
use serde::Serialize;

use super::calculators::round_money;
use super::diagnostics::PricingWarning;
use super::models::{ExcursionLine, RoomLine, TourLine};
use super::services::{CartQuote, PriceQuote};

/// Money value for JSON responses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoneyResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
}

impl MoneyResponse {
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Self {
            amount: round_money(amount, 2),
            currency: currency.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomLineResponse {
    pub name: String,
    pub nights: i64,
    pub cost: MoneyResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineResponse {
    pub name: String,
    pub cost: MoneyResponse,
}

/// Response for a single package price
#[derive(Debug, Clone, Serialize)]
pub struct PriceBreakdownResponse {
    pub subtotal: MoneyResponse,
    pub total: MoneyResponse,
    pub rooms_cost: MoneyResponse,
    pub tours_cost: MoneyResponse,
    pub excursions_cost: MoneyResponse,
    pub upgrade_price: MoneyResponse,
    pub actual_nights: i64,
    pub total_pax: u64,
    pub rooms: Vec<RoomLineResponse>,
    pub tours: Vec<LineResponse>,
    pub excursions: Vec<LineResponse>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<PricingWarning>,
}

impl PriceBreakdownResponse {
    pub fn from_quote(quote: &PriceQuote, currency: &str) -> Self {
        let breakdown = &quote.breakdown;
        let money = |amount: Decimal| MoneyResponse::new(amount, currency);

        Self {
            subtotal: money(breakdown.subtotal),
            total: money(breakdown.total),
            rooms_cost: money(breakdown.rooms_cost),
            tours_cost: money(breakdown.tours_cost),
            excursions_cost: money(breakdown.excursions_cost),
            upgrade_price: money(breakdown.upgrade_price),
            actual_nights: breakdown.actual_nights,
            total_pax: breakdown.total_pax,
            rooms: breakdown
                .breakdown
                .rooms
                .iter()
                .map(|line: &RoomLine| RoomLineResponse {
                    name: line.name.clone(),
                    nights: line.nights,
                    cost: money(line.cost),
                })
                .collect(),
            tours: breakdown
                .breakdown
                .tours
                .iter()
                .map(|line: &TourLine| LineResponse {
                    name: line.name.clone(),
                    cost: money(line.cost),
                })
                .collect(),
            excursions: breakdown
                .breakdown
                .excursions
                .iter()
                .map(|line: &ExcursionLine| LineResponse {
                    name: line.name.clone(),
                    cost: money(line.cost),
                })
                .collect(),
            warnings: quote.warnings.clone(),
        }
    }
}

/// Response for a priced cart
#[derive(Debug, Clone, Serialize)]
pub struct CartQuoteResponse {
    pub lines: Vec<PriceBreakdownResponse>,
    pub grand_total: MoneyResponse,
    pub total_pax: u64,
}

impl CartQuoteResponse {
    pub fn from_cart(cart: &CartQuote, currency: &str) -> Self {
        Self {
            lines: cart
                .lines
                .iter()
                .map(|quote| PriceBreakdownResponse::from_quote(quote, currency))
                .collect(),
            grand_total: MoneyResponse::new(cart.grand_total, currency),
            total_pax: cart.total_pax,
        }
    }
}
