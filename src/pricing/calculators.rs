//! Core pricing calculation functions.
//!
//! Pure functions for package pricing math - no I/O. Each component of a
//! package price (rooms, tours, excursions, hotel upgrade) is computed
//! separately and then aggregated into a [`PriceBreakdown`].

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde_json::Value;

use super::diagnostics::{Diagnostics, PricingWarning};
use super::models::{
    BreakdownLines, DateContext, ExcursionLine, GuestCounts, HotelPackageTier, PriceBreakdown,
    PricingMode, RoomLine, RoomRef, TourLine, TourLookupEntry,
};
use super::normalize::TourSelection;

/// Weight of a child against an adult for per-person legacy tours.
pub const CHILD_TOUR_WEIGHT: Decimal = dec!(0.7);

/// Weight of an infant against an adult for per-person legacy tours.
pub const INFANT_TOUR_WEIGHT: Decimal = dec!(0.1);

const MINOR_UNITS_PER_MAJOR: Decimal = dec!(100);

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Multiply two amounts, capping at the representable range on overflow.
fn capped_mul(
    lhs: Decimal,
    rhs: Decimal,
    component: &'static str,
    diagnostics: &mut Diagnostics,
) -> Decimal {
    lhs.checked_mul(rhs).unwrap_or_else(|| {
        note_overflow(component, diagnostics);
        lhs.saturating_mul(rhs)
    })
}

/// Add two amounts, capping at the representable range on overflow.
fn capped_add(
    lhs: Decimal,
    rhs: Decimal,
    component: &'static str,
    diagnostics: &mut Diagnostics,
) -> Decimal {
    lhs.checked_add(rhs).unwrap_or_else(|| {
        note_overflow(component, diagnostics);
        lhs.saturating_add(rhs)
    })
}

fn note_overflow(component: &'static str, diagnostics: &mut Diagnostics) {
    let warning = PricingWarning::Overflow { component };
    if !diagnostics.warnings().contains(&warning) {
        diagnostics.warn(warning);
    }
}

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is exactly
/// halfway between two possibilities. This reduces cumulative rounding bias.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use package_pricing::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Convert an amount in minor units (piasters, cents) to major units.
pub fn minor_to_major(amount: Decimal) -> Decimal {
    amount / MINOR_UNITS_PER_MAJOR
}

/// Number of nights the room cost is scaled by.
///
/// A full date range wins; otherwise the package duration, otherwise one
/// night. Ranges shorter than a night are floored to 1.
pub fn resolve_nights(
    dates: &DateContext,
    duration: Option<i64>,
    diagnostics: &mut Diagnostics,
) -> i64 {
    let from_duration = duration.filter(|nights| *nights > 0).unwrap_or(1);

    match dates {
        DateContext::Range {
            start_date: Some(start),
            end_date: Some(end),
        } => {
            let millis = (*end - *start).num_milliseconds();
            let nights = millis.div_euclid(MILLIS_PER_DAY)
                + i64::from(millis.rem_euclid(MILLIS_PER_DAY) > 0);
            if nights < 1 {
                diagnostics.warn(PricingWarning::DateRangeFloored {
                    start: *start,
                    end: *end,
                });
            }
            nights.max(1)
        }
        DateContext::Range { .. } => {
            diagnostics.warn(PricingWarning::MissingDate);
            from_duration
        }
        DateContext::Single { .. } => from_duration,
    }
}

/// Result of room cost calculation
#[derive(Debug, Clone)]
pub struct RoomCostResult {
    pub cost: Decimal,
    pub lines: Vec<RoomLine>,
    /// True when the package carried its own rooms.
    pub used_package_rooms: bool,
}

/// Calculate the lodging component.
///
/// Prices only the first room of the package's own rooms, falling back to
/// the first reference room. Cost scales by head count, not by room.
pub fn calculate_room_cost(
    package_rooms: &[Value],
    all_rooms: &[RoomRef],
    nights: i64,
    guests: &GuestCounts,
    diagnostics: &mut Diagnostics,
) -> RoomCostResult {
    let (room, used_package_rooms) = match (package_rooms.first(), all_rooms.first()) {
        (Some(stored), _) => (Some(RoomRef::from_value(stored)), true),
        (None, Some(reference)) => (Some(reference.clone()), false),
        (None, None) => (None, false),
    };

    let Some(room) = room else {
        return RoomCostResult {
            cost: Decimal::ZERO,
            lines: vec![],
            used_package_rooms,
        };
    };

    let per_guest = capped_mul(room.unit_price(), Decimal::from(nights), "rooms", diagnostics);
    let cost = capped_mul(
        per_guest,
        Decimal::from(guests.total_pax()),
        "rooms",
        diagnostics,
    );

    RoomCostResult {
        cost,
        lines: vec![RoomLine {
            name: room.name,
            nights,
            cost,
        }],
        used_package_rooms,
    }
}

/// Result of tour cost calculation
#[derive(Debug, Clone)]
pub struct TourCostResult {
    pub cost: Decimal,
    pub lines: Vec<TourLine>,
}

/// Calculate the tours component.
///
/// Per-tour pricing from the selection takes precedence over the reference
/// table. Tours found in neither contribute nothing.
pub fn calculate_tour_cost(
    selection: &TourSelection,
    all_tours: &[TourLookupEntry],
    pricing_mode: PricingMode,
    guests: &GuestCounts,
    diagnostics: &mut Diagnostics,
) -> TourCostResult {
    let adults = Decimal::from(guests.adults);
    let children = Decimal::from(guests.children);
    let infants = Decimal::from(guests.infants);

    let mut cost = Decimal::ZERO;
    let mut lines = Vec::with_capacity(selection.ids.len());

    for &id in &selection.ids {
        let (name, tour_cost) = if let Some(pricing) = selection.pricing_for(id) {
            let tour_cost = [
                (pricing.adult_price, adults),
                (pricing.child_price, children),
                (pricing.infant_price, infants),
            ]
            .into_iter()
            .fold(Decimal::ZERO, |sum, (price, heads)| {
                let share = capped_mul(price, heads, "tours", diagnostics);
                capped_add(sum, share, "tours", diagnostics)
            });
            (tour_label(id), tour_cost)
        } else if let Some(tour) = all_tours.iter().find(|tour| tour.id == id) {
            let tour_price = minor_to_major(Decimal::from(tour.price));
            let tour_cost = match pricing_mode {
                PricingMode::PerPerson => {
                    let weighted_heads =
                        adults + children * CHILD_TOUR_WEIGHT + infants * INFANT_TOUR_WEIGHT;
                    capped_mul(tour_price, weighted_heads, "tours", diagnostics)
                }
                PricingMode::PerBooking => tour_price,
            };
            let name = tour.name.clone().unwrap_or_else(|| tour_label(id));
            (name, tour_cost)
        } else {
            diagnostics.warn(PricingWarning::UnknownTour { id });
            continue;
        };

        cost = capped_add(cost, tour_cost, "tours", diagnostics);
        lines.push(TourLine {
            name,
            cost: tour_cost,
        });
    }

    TourCostResult { cost, lines }
}

fn tour_label(id: i64) -> String {
    format!("Tour #{}", id)
}

/// Result of excursions calculation
#[derive(Debug, Clone, Default)]
pub struct ExcursionsCostResult {
    pub cost: Decimal,
    pub lines: Vec<ExcursionLine>,
}

/// Optional add-on excursions. Not wired to any data source yet.
pub fn calculate_excursions_cost() -> ExcursionsCostResult {
    ExcursionsCostResult::default()
}

/// Calculate the hotel-package upgrade surcharge.
///
/// Package rooms already include the upgrade. Infants ride free.
pub fn calculate_upgrade_price(
    tier: HotelPackageTier,
    used_package_rooms: bool,
    nights: i64,
    guests: &GuestCounts,
    diagnostics: &mut Diagnostics,
) -> Decimal {
    if used_package_rooms {
        return Decimal::ZERO;
    }

    let paying_guests = u64::from(guests.adults) + u64::from(guests.children);
    let per_guest = capped_mul(tier.surcharge(), Decimal::from(nights), "upgrade", diagnostics);
    capped_mul(per_guest, Decimal::from(paying_guests), "upgrade", diagnostics)
}

/// Combine the components into a breakdown.
///
/// The package's own list price is not part of the subtotal.
pub fn aggregate(
    rooms: RoomCostResult,
    tours: TourCostResult,
    excursions: ExcursionsCostResult,
    upgrade_price: Decimal,
    actual_nights: i64,
    total_pax: u64,
    diagnostics: &mut Diagnostics,
) -> PriceBreakdown {
    let subtotal = [tours.cost, excursions.cost, upgrade_price]
        .into_iter()
        .fold(rooms.cost, |sum, component| {
            capped_add(sum, component, "subtotal", diagnostics)
        });

    PriceBreakdown {
        subtotal,
        total: subtotal,
        rooms_cost: rooms.cost,
        tours_cost: tours.cost,
        excursions_cost: excursions.cost,
        upgrade_price,
        actual_nights,
        total_pax,
        breakdown: BreakdownLines {
            rooms: rooms.lines,
            tours: tours.lines,
            excursions: excursions.lines,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::models::{parse_date, TourPricing};
    use serde_json::json;
    use std::collections::HashMap;

    fn range(start: &str, end: &str) -> DateContext {
        DateContext::range(parse_date(start).unwrap(), parse_date(end).unwrap())
    }

    // ==================== round_money tests ====================

    #[test]
    fn test_round_money_bankers_rounding_to_even() {
        // Banker's rounding: 0.5 rounds to nearest even
        assert_eq!(round_money(dec!(2.5), 0), dec!(2)); // rounds down to even
        assert_eq!(round_money(dec!(3.5), 0), dec!(4)); // rounds up to even
        assert_eq!(round_money(dec!(4.5), 0), dec!(4));
        assert_eq!(round_money(dec!(5.5), 0), dec!(6));
    }

    #[test]
    fn test_round_money_decimal_places() {
        assert_eq!(round_money(dec!(2.25), 1), dec!(2.2));
        assert_eq!(round_money(dec!(2.35), 1), dec!(2.4));
        assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
        assert_eq!(round_money(dec!(1.236), 2), dec!(1.24));
    }

    #[test]
    fn test_round_money_negative() {
        assert_eq!(round_money(dec!(-2.5), 0), dec!(-2));
        assert_eq!(round_money(dec!(-3.5), 0), dec!(-4));
    }

    #[test]
    fn test_minor_to_major() {
        assert_eq!(minor_to_major(dec!(10000)), dec!(100));
        assert_eq!(minor_to_major(dec!(1999)), dec!(19.99));
        assert_eq!(minor_to_major(dec!(0)), dec!(0));
    }

    // ==================== resolve_nights tests ====================

    #[test]
    fn test_nights_from_date_range() {
        let mut diagnostics = Diagnostics::new();
        let nights = resolve_nights(&range("2025-04-01", "2025-04-04"), Some(7), &mut diagnostics);

        assert_eq!(nights, 3);
        assert!(diagnostics.warnings().is_empty());
    }

    #[test]
    fn test_nights_partial_day_rounds_up() {
        let nights = resolve_nights(
            &range("2025-04-01T00:00:00Z", "2025-04-03T01:00:00Z"),
            None,
            &mut Diagnostics::new(),
        );
        assert_eq!(nights, 3);
    }

    #[test]
    fn test_nights_equal_dates_floor_to_one() {
        let mut diagnostics = Diagnostics::new();
        let nights = resolve_nights(&range("2025-04-01", "2025-04-01"), Some(5), &mut diagnostics);

        assert_eq!(nights, 1);
        assert_eq!(diagnostics.warnings().len(), 1);
    }

    #[test]
    fn test_nights_reversed_dates_floor_to_one() {
        let nights = resolve_nights(
            &range("2025-04-10", "2025-04-01"),
            Some(5),
            &mut Diagnostics::new(),
        );
        assert_eq!(nights, 1);
    }

    #[test]
    fn test_nights_single_date_uses_duration() {
        let dates = DateContext::single(parse_date("2025-04-01"));
        let mut diagnostics = Diagnostics::new();

        assert_eq!(resolve_nights(&dates, Some(6), &mut diagnostics), 6);
        assert_eq!(resolve_nights(&dates, None, &mut diagnostics), 1);
        assert_eq!(resolve_nights(&dates, Some(0), &mut diagnostics), 1);
        assert!(diagnostics.warnings().is_empty());
    }

    #[test]
    fn test_nights_incomplete_range_falls_back_to_duration() {
        let dates = DateContext::Range {
            start_date: parse_date("2025-04-01"),
            end_date: None,
        };
        let mut diagnostics = Diagnostics::new();

        assert_eq!(resolve_nights(&dates, Some(4), &mut diagnostics), 4);
        assert_eq!(diagnostics.warnings(), &[PricingWarning::MissingDate]);
    }

    // ==================== calculate_room_cost tests ====================

    #[test]
    fn test_room_cost_scales_by_head_count() {
        let rooms = vec![json!({"name": "Nile View Double", "price": 1000})];
        let result = calculate_room_cost(
            &rooms,
            &[],
            3,
            &GuestCounts::new(2, 1, 0),
            &mut Diagnostics::new(),
        );

        assert_eq!(result.cost, dec!(9000));
        assert!(result.used_package_rooms);
        assert_eq!(
            result.lines,
            vec![RoomLine {
                name: "Nile View Double".to_string(),
                nights: 3,
                cost: dec!(9000),
            }]
        );
    }

    #[test]
    fn test_room_cost_prices_first_room_only() {
        let rooms = vec![
            json!({"name": "Twin", "price": 400, "customPrice": 350}),
            json!({"name": "Suite", "price": 2000}),
        ];
        let result = calculate_room_cost(
            &rooms,
            &[],
            2,
            &GuestCounts::new(2, 0, 0),
            &mut Diagnostics::new(),
        );

        assert_eq!(result.cost, dec!(1400)); // 350 * 2 * 2
        assert_eq!(result.lines.len(), 1);
    }

    #[test]
    fn test_room_cost_falls_back_to_reference_rooms() {
        let all_rooms = vec![RoomRef::new("Standard Room", dec!(500))];
        let result = calculate_room_cost(
            &[],
            &all_rooms,
            2,
            &GuestCounts::new(1, 0, 1),
            &mut Diagnostics::new(),
        );

        assert_eq!(result.cost, dec!(2000)); // 500 * 2 * 2
        assert!(!result.used_package_rooms);
    }

    #[test]
    fn test_room_cost_without_rooms_is_zero() {
        let result = calculate_room_cost(
            &[],
            &[],
            5,
            &GuestCounts::new(2, 2, 0),
            &mut Diagnostics::new(),
        );

        assert_eq!(result.cost, dec!(0));
        assert!(result.lines.is_empty());
        assert!(!result.used_package_rooms);
    }

    // ==================== calculate_tour_cost tests ====================

    #[test]
    fn test_tour_cost_per_traveler_pricing() {
        let selection = TourSelection {
            ids: vec![11],
            pricing: Some(HashMap::from([(
                11,
                TourPricing {
                    adult_price: dec!(200),
                    child_price: dec!(120),
                    infant_price: dec!(80),
                },
            )])),
        };
        let result = calculate_tour_cost(
            &selection,
            &[],
            PricingMode::PerBooking,
            &GuestCounts::new(2, 1, 1),
            &mut Diagnostics::new(),
        );

        assert_eq!(result.cost, dec!(600));
        assert_eq!(result.lines[0].name, "Tour #11");
    }

    #[test]
    fn test_tour_cost_per_booking_is_flat() {
        let selection = TourSelection {
            ids: vec![5],
            pricing: None,
        };
        let tours = vec![TourLookupEntry {
            id: 5,
            name: Some("City Tour".to_string()),
            price: 10000,
        }];
        let result = calculate_tour_cost(
            &selection,
            &tours,
            PricingMode::PerBooking,
            &GuestCounts::new(6, 3, 2),
            &mut Diagnostics::new(),
        );

        assert_eq!(result.cost, dec!(100));
        assert_eq!(result.lines[0].name, "City Tour");
    }

    #[test]
    fn test_tour_cost_per_person_weights_children_and_infants() {
        let selection = TourSelection {
            ids: vec![5],
            pricing: None,
        };
        let tours = vec![TourLookupEntry {
            id: 5,
            name: Some("City Tour".to_string()),
            price: 10000,
        }];
        let result = calculate_tour_cost(
            &selection,
            &tours,
            PricingMode::PerPerson,
            &GuestCounts::new(2, 1, 1),
            &mut Diagnostics::new(),
        );

        assert_eq!(result.cost, dec!(380)); // 100 * (2 + 0.7 + 0.1)
    }

    #[test]
    fn test_tour_cost_unnamed_tour_gets_label() {
        let selection = TourSelection {
            ids: vec![3],
            pricing: None,
        };
        let tours = vec![TourLookupEntry {
            id: 3,
            name: None,
            price: 2550,
        }];
        let result = calculate_tour_cost(
            &selection,
            &tours,
            PricingMode::PerBooking,
            &GuestCounts::new(1, 0, 0),
            &mut Diagnostics::new(),
        );

        assert_eq!(result.cost, dec!(25.50));
        assert_eq!(result.lines[0].name, "Tour #3");
    }

    #[test]
    fn test_tour_cost_unknown_tour_is_skipped() {
        let selection = TourSelection {
            ids: vec![1, 2],
            pricing: None,
        };
        let tours = vec![TourLookupEntry {
            id: 2,
            name: Some("Felucca Ride".to_string()),
            price: 4000,
        }];
        let mut diagnostics = Diagnostics::new();
        let result = calculate_tour_cost(
            &selection,
            &tours,
            PricingMode::PerBooking,
            &GuestCounts::new(2, 0, 0),
            &mut diagnostics,
        );

        assert_eq!(result.cost, dec!(40));
        assert_eq!(result.lines.len(), 1);
        assert_eq!(
            diagnostics.warnings(),
            &[PricingWarning::UnknownTour { id: 1 }]
        );
    }

    #[test]
    fn test_tour_cost_sums_in_selection_order() {
        let selection = TourSelection {
            ids: vec![2, 1],
            pricing: None,
        };
        let tours = vec![
            TourLookupEntry {
                id: 1,
                name: Some("Pyramids".to_string()),
                price: 30000,
            },
            TourLookupEntry {
                id: 2,
                name: Some("Museum".to_string()),
                price: 15000,
            },
        ];
        let result = calculate_tour_cost(
            &selection,
            &tours,
            PricingMode::PerBooking,
            &GuestCounts::new(1, 0, 0),
            &mut Diagnostics::new(),
        );

        assert_eq!(result.cost, dec!(450));
        let names: Vec<&str> = result.lines.iter().map(|line| line.name.as_str()).collect();
        assert_eq!(names, vec!["Museum", "Pyramids"]);
    }

    // ==================== calculate_upgrade_price tests ====================

    #[test]
    fn test_upgrade_excludes_infants() {
        let price = calculate_upgrade_price(
            HotelPackageTier::Luxury,
            false,
            2,
            &GuestCounts::new(2, 1, 3),
            &mut Diagnostics::new(),
        );
        assert_eq!(price, dec!(1800)); // 300 * 2 * 3
    }

    #[test]
    fn test_upgrade_suppressed_by_package_rooms() {
        let price = calculate_upgrade_price(
            HotelPackageTier::Luxury,
            true,
            2,
            &GuestCounts::new(2, 0, 0),
            &mut Diagnostics::new(),
        );
        assert_eq!(price, dec!(0));
    }

    #[test]
    fn test_upgrade_standard_is_free() {
        let price = calculate_upgrade_price(
            HotelPackageTier::Standard,
            false,
            10,
            &GuestCounts::new(4, 0, 0),
            &mut Diagnostics::new(),
        );
        assert_eq!(price, dec!(0));
    }

    // ==================== aggregate tests ====================

    #[test]
    fn test_aggregate_sums_components() {
        let rooms = RoomCostResult {
            cost: dec!(9000),
            lines: vec![],
            used_package_rooms: true,
        };
        let tours = TourCostResult {
            cost: dec!(600),
            lines: vec![],
        };
        let breakdown = aggregate(
            rooms,
            tours,
            calculate_excursions_cost(),
            dec!(0),
            3,
            3,
            &mut Diagnostics::new(),
        );

        assert_eq!(breakdown.subtotal, dec!(9600));
        assert_eq!(breakdown.total, breakdown.subtotal);
        assert_eq!(breakdown.excursions_cost, dec!(0));
        assert!(breakdown.breakdown.excursions.is_empty());
    }

    // ==================== overflow tests ====================

    #[test]
    fn test_room_cost_caps_on_overflow() {
        let all_rooms = vec![RoomRef::new("Royal Suite", dec!(9000000000000000000))];
        let mut diagnostics = Diagnostics::new();
        let result = calculate_room_cost(
            &[],
            &all_rooms,
            2_556_000,
            &GuestCounts::new(2_000_000_000, 0, 0),
            &mut diagnostics,
        );

        assert_eq!(result.cost, Decimal::MAX);
        assert_eq!(result.lines[0].cost, Decimal::MAX);
        assert_eq!(
            diagnostics.warnings(),
            &[PricingWarning::Overflow { component: "rooms" }]
        );
    }

    #[test]
    fn test_upgrade_counts_guests_beyond_u32() {
        let mut diagnostics = Diagnostics::new();
        let price = calculate_upgrade_price(
            HotelPackageTier::Deluxe,
            false,
            1,
            &GuestCounts::new(u32::MAX, 1, 0),
            &mut diagnostics,
        );

        assert_eq!(price, dec!(150) * Decimal::from(4_294_967_296u64));
        assert!(diagnostics.warnings().is_empty());
    }

    #[test]
    fn test_tour_cost_caps_on_overflow() {
        let selection = TourSelection {
            ids: vec![1, 1],
            pricing: Some(HashMap::from([(
                1,
                TourPricing {
                    adult_price: Decimal::MAX,
                    child_price: dec!(0),
                    infant_price: dec!(0),
                },
            )])),
        };
        let mut diagnostics = Diagnostics::new();
        let result = calculate_tour_cost(
            &selection,
            &[],
            PricingMode::PerBooking,
            &GuestCounts::new(2, 0, 0),
            &mut diagnostics,
        );

        assert_eq!(result.cost, Decimal::MAX);
        assert_eq!(
            diagnostics.warnings(),
            &[PricingWarning::Overflow { component: "tours" }]
        );
    }

    #[test]
    fn test_aggregate_caps_subtotal_on_overflow() {
        let rooms = RoomCostResult {
            cost: Decimal::MAX,
            lines: vec![],
            used_package_rooms: false,
        };
        let tours = TourCostResult {
            cost: dec!(1),
            lines: vec![],
        };
        let mut diagnostics = Diagnostics::new();
        let breakdown = aggregate(
            rooms,
            tours,
            calculate_excursions_cost(),
            dec!(0),
            1,
            1,
            &mut diagnostics,
        );

        assert_eq!(breakdown.subtotal, Decimal::MAX);
        assert_eq!(
            diagnostics.warnings(),
            &[PricingWarning::Overflow {
                component: "subtotal"
            }]
        );
    }
}
