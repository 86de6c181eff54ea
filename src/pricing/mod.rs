//! Pricing engine module for travel packages.
//!
//! Computes the price breakdown of a package (rooms, tours, excursions,
//! hotel upgrade) for a party of guests and a stay. Callers supply the
//! package record and the room/tour reference tables; nothing here does I/O.

pub mod calculators;
pub mod diagnostics;
pub mod models;
pub mod normalize;
pub mod requests;
pub mod responses;
pub mod services;

// Re-export commonly used items
pub use calculators::round_money;
pub use diagnostics::PricingWarning;
pub use models::{
    DateContext, GuestCounts, HotelPackageTier, ListField, PackageConfig, PriceBreakdown,
    PricingMode, RoomRef, TourLookupEntry,
};
pub use services::{compute_price, CartLine, CartQuote, PriceEngine, PriceQuote, ReferenceData};
