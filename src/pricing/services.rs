//! Package price engine.
//!
//! Wires the normalisers and calculators together. Pricing never fails:
//! every degraded input is priced at zero and reported as a
//! [`PricingWarning`] on the quote.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::PricingConfig;

use super::calculators::{
    aggregate, calculate_excursions_cost, calculate_room_cost, calculate_tour_cost,
    calculate_upgrade_price, resolve_nights,
};
use super::diagnostics::{Diagnostics, PricingWarning};
use super::models::{
    lenient_entries, lenient_opt_string, or_default, DateContext, GuestCounts, HotelPackageTier,
    PackageConfig, PriceBreakdown, RoomRef, TourLookupEntry,
};
use super::normalize::{normalize_list, resolve_tour_selection};
use super::requests::{CartPriceRequest, PackagePriceRequest};
use super::responses::{CartQuoteResponse, PriceBreakdownResponse};

/// Room and tour reference tables shared by every price in a cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReferenceData {
    #[serde(deserialize_with = "lenient_entries")]
    pub all_rooms: Vec<RoomRef>,
    #[serde(deserialize_with = "lenient_entries")]
    pub all_tours: Vec<TourLookupEntry>,
}

/// A breakdown together with the fallbacks applied to produce it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub breakdown: PriceBreakdown,
    pub warnings: Vec<PricingWarning>,
}

/// One package in the cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CartLine {
    #[serde(deserialize_with = "or_default")]
    pub package: PackageConfig,
    #[serde(deserialize_with = "or_default")]
    pub guests: GuestCounts,
    #[serde(deserialize_with = "or_default")]
    pub dates: DateContext,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub hotel_package_tier: Option<String>,
}

/// Result of pricing a whole cart
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartQuote {
    pub lines: Vec<PriceQuote>,
    /// Capped at `Decimal::MAX` rather than overflowing.
    pub grand_total: Decimal,
    pub total_pax: u64,
}

/// Price a package against caller-supplied reference tables.
///
/// `hotel_package_tier` is matched exactly; unknown keys price as
/// `standard`.
pub fn compute_price(
    package: &PackageConfig,
    guests: &GuestCounts,
    dates: &DateContext,
    hotel_package_tier: &str,
    all_rooms: &[RoomRef],
    all_tours: &[TourLookupEntry],
) -> PriceBreakdown {
    price_package(
        package,
        guests,
        dates,
        hotel_package_tier,
        all_rooms,
        all_tours,
        &mut Diagnostics::new(),
    )
}

fn price_package(
    package: &PackageConfig,
    guests: &GuestCounts,
    dates: &DateContext,
    hotel_package_tier: &str,
    all_rooms: &[RoomRef],
    all_tours: &[TourLookupEntry],
    diagnostics: &mut Diagnostics,
) -> PriceBreakdown {
    let package_rooms = normalize_list(&package.rooms, "rooms", diagnostics);
    let selection = resolve_tour_selection(package, diagnostics);
    let tier = HotelPackageTier::from_key(hotel_package_tier).unwrap_or_else(|| {
        diagnostics.warn(PricingWarning::UnknownTier {
            key: hotel_package_tier.to_string(),
        });
        HotelPackageTier::Standard
    });

    let nights = resolve_nights(dates, package.duration, diagnostics);
    let rooms = calculate_room_cost(&package_rooms, all_rooms, nights, guests, diagnostics);
    let tours = calculate_tour_cost(
        &selection,
        all_tours,
        package.pricing_mode,
        guests,
        diagnostics,
    );
    let excursions = calculate_excursions_cost();
    let upgrade_price = calculate_upgrade_price(
        tier,
        rooms.used_package_rooms,
        nights,
        guests,
        diagnostics,
    );

    let breakdown = aggregate(
        rooms,
        tours,
        excursions,
        upgrade_price,
        nights,
        guests.total_pax(),
        diagnostics,
    );

    debug!(
        "Priced package {}: {} nights, {} pax, total {}",
        package.id, breakdown.actual_nights, breakdown.total_pax, breakdown.total
    );

    breakdown
}

/// Price engine bound to one reference-data snapshot.
#[derive(Debug, Clone, Default)]
pub struct PriceEngine {
    reference: ReferenceData,
    default_tier: HotelPackageTier,
}

impl PriceEngine {
    pub fn new(reference: ReferenceData) -> Self {
        Self {
            reference,
            default_tier: HotelPackageTier::Standard,
        }
    }

    /// Tier used for cart lines that do not name one.
    pub fn with_default_tier(mut self, tier: HotelPackageTier) -> Self {
        self.default_tier = tier;
        self
    }

    pub fn quote(
        &self,
        package: &PackageConfig,
        guests: &GuestCounts,
        dates: &DateContext,
        hotel_package_tier: &str,
    ) -> PriceBreakdown {
        compute_price(
            package,
            guests,
            dates,
            hotel_package_tier,
            &self.reference.all_rooms,
            &self.reference.all_tours,
        )
    }

    /// Same breakdown as [`PriceEngine::quote`], plus the warnings.
    pub fn quote_with_diagnostics(
        &self,
        package: &PackageConfig,
        guests: &GuestCounts,
        dates: &DateContext,
        hotel_package_tier: &str,
    ) -> PriceQuote {
        let mut diagnostics = Diagnostics::new();
        let breakdown = price_package(
            package,
            guests,
            dates,
            hotel_package_tier,
            &self.reference.all_rooms,
            &self.reference.all_tours,
            &mut diagnostics,
        );

        PriceQuote {
            breakdown,
            warnings: diagnostics.into_warnings(),
        }
    }

    /// Price every line independently and sum the totals.
    pub fn quote_cart(&self, lines: &[CartLine]) -> CartQuote {
        let lines: Vec<PriceQuote> = lines
            .iter()
            .map(|line| {
                let tier = line
                    .hotel_package_tier
                    .as_deref()
                    .unwrap_or(self.default_tier.as_str());
                self.quote_with_diagnostics(&line.package, &line.guests, &line.dates, tier)
            })
            .collect();

        let grand_total = lines.iter().fold(Decimal::ZERO, |sum, quote| {
            sum.checked_add(quote.breakdown.total).unwrap_or_else(|| {
                warn!("Cart grand total exceeds the largest representable amount, capped");
                sum.saturating_add(quote.breakdown.total)
            })
        });
        let total_pax = lines
            .iter()
            .fold(0u64, |sum, quote| sum.saturating_add(quote.breakdown.total_pax));

        debug!(
            "Priced cart of {} lines, grand total {}",
            lines.len(),
            grand_total
        );

        CartQuote {
            lines,
            grand_total,
            total_pax,
        }
    }
}

/// Price a decoded single-package request.
///
/// A request without a tier uses the configured default.
pub fn quote_package_request(
    request: &PackagePriceRequest,
    config: &PricingConfig,
) -> PriceBreakdownResponse {
    let engine = PriceEngine::new(request.reference_data());
    let tier = request
        .hotel_package_tier
        .as_deref()
        .unwrap_or(config.default_tier.as_str());

    let quote =
        engine.quote_with_diagnostics(&request.package, &request.guests, &request.dates, tier);
    if !quote.warnings.is_empty() {
        info!(
            "Package {} priced with {} fallback(s)",
            request.package.id,
            quote.warnings.len()
        );
    }

    PriceBreakdownResponse::from_quote(&quote, &config.currency)
}

/// Price a decoded cart request.
pub fn quote_cart_request(
    request: &CartPriceRequest,
    config: &PricingConfig,
) -> CartQuoteResponse {
    let engine =
        PriceEngine::new(request.reference_data()).with_default_tier(config.default_tier);
    let cart = engine.quote_cart(&request.lines);

    CartQuoteResponse::from_cart(&cart, &config.currency)
}
