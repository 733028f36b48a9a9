//! Domain types for the leaderboard scoring core.
//!
//! This module contains all the core types used throughout the service:
//!
//! - [`enums`] - Closed vocabularies (`EventName`, `RuleName`, `Category`)
//! - [`primitives`] - Fixed-point 256-bit arithmetic helpers
//! - [`events`] - Normalised domain events and replay ordering
//! - [`entities`] - Transient scores and published leaderboard rows

pub mod entities;
pub mod enums;
pub mod events;
pub mod primitives;

// Re-export commonly used types at module level
pub use entities::{
    Boost, CategorisedScore, LeaderboardLine, MinterBuyValue, Point, RankedLine, Score,
    aggregate_categories, total_score,
};
pub use enums::{Category, EventName, RuleName};
pub use events::{DomainEvent, EventData, EventMetadata, sort_for_replay};
pub use primitives::{ArithmeticOverflow, InvalidPoints, SCALE, parse_hex_u256};
