//! Scoring entities: transient per-replay records and published rows.
//!
//! [`Score`] and [`Boost`] only exist while one wallet's history is being
//! replayed. [`LeaderboardLine`] and its [`Point`] items are what the
//! aggregator publishes; [`MinterBuyValue`] is the running funding
//! aggregate the Karathuru booster reads.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Category, RuleName};
use super::events::{DomainEvent, EventMetadata};
use super::primitives::to_display_units;

// ═══════════════════════════════════════════════════════════════════════════════
// SCORE & BOOST (transient)
// ═══════════════════════════════════════════════════════════════════════════════

/// One per-rule contribution produced by a builder for one event.
///
/// Boosters may rewrite `points` in place and append themselves to
/// `boosts`; the score is folded into a [`LeaderboardLine`] at the end of
/// the replay and then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    /// Point value, scaled by 10^6 until total emission.
    pub points: U256,
    /// Contribution class that produced this score.
    pub rule: RuleName,
    /// Originating event.
    pub event: DomainEvent,
    /// Boosts applied to this score, in application order.
    pub boosts: Vec<Boost>,
}

impl Score {
    /// Create a score with no boosts applied yet.
    #[must_use]
    pub const fn new(points: U256, rule: RuleName, event: DomainEvent) -> Self {
        Self {
            points,
            rule,
            event,
            boosts: Vec::new(),
        }
    }
}

/// A multiplicative modifier applied to a [`Score`].
///
/// `value` is percent times 100, so `300` multiplies by 3.0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boost {
    /// Machine name of the booster.
    pub name: String,
    /// Human-readable name shown in the UI metadata.
    pub display_name: String,
    /// Coefficient, percent times 100.
    pub value: u32,
}

impl Boost {
    /// UI rendering of the coefficient, e.g. `x2.0 - Funding Karathuru`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("x{:.1} - {}", f64::from(self.value) / 100.0, self.display_name)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PUBLISHED ROWS
// ═══════════════════════════════════════════════════════════════════════════════

/// Stringified per-category totals, already divided by 10^6.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorisedScore {
    /// Funding contributions total.
    pub fund: String,
    /// Farming contributions total.
    pub farming: String,
    /// Everything else.
    pub other: String,
}

impl CategorisedScore {
    /// Total for one category.
    #[must_use]
    pub fn get(&self, category: Category) -> &str {
        match category {
            Category::Fund => &self.fund,
            Category::Farming => &self.farming,
            Category::Other => &self.other,
        }
    }
}

/// One published score item: rule, raw point value and UI metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// Metadata bag rendered by the UI (project, slot, date, boosts...).
    pub metadata: EventMetadata,
    /// Rule wire name.
    pub rule: String,
    /// Raw point value, still scaled, truncated to 64 bits.
    pub value: u64,
}

/// Separator between rendered boosts in the point metadata.
const BOOST_SEPARATOR: &str = " // ";

/// Build the UI metadata bag for one score.
///
/// Carries over the event metadata (project name, slot) and adds the
/// recorded-at date in milliseconds, the source event name, the rule and
/// the rendered boost chain (empty string when nothing fired).
fn build_point_metadata(score: &Score) -> EventMetadata {
    let mut metadata = score.event.metadata.clone();
    metadata.insert(
        "date".to_owned(),
        (score.event.recorded_at.timestamp() * 1000).to_string(),
    );
    metadata.insert("event".to_owned(), score.event.event_name.to_string());
    metadata.insert("rule".to_owned(), score.rule.to_string());
    metadata.insert(
        "boosts".to_owned(),
        score
            .boosts
            .iter()
            .map(Boost::display)
            .collect::<Vec<_>>()
            .join(BOOST_SEPARATOR),
    );
    metadata
}

impl Point {
    /// Project a transient score into its published form.
    #[must_use]
    pub fn from_score(score: &Score) -> Self {
        Self {
            metadata: build_point_metadata(score),
            rule: score.rule.to_string(),
            value: score.points.wrapping_to::<u64>(),
        }
    }
}

/// The published ranking row for one wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardLine {
    /// Row identifier (UUID v7, lexicographically sortable).
    pub id: Uuid,
    /// Wallet address, unique in the published table.
    pub wallet_address: String,
    /// Total score, already divided by 10^6, as a decimal string.
    pub total_score: String,
    /// Ordered per-rule score items.
    pub points: Vec<Point>,
    /// Per-category totals.
    pub categories: CategorisedScore,
}

impl LeaderboardLine {
    /// Assemble the published row from a finished replay.
    #[must_use]
    pub fn from_scores(
        wallet: &str,
        scores: &[Score],
        total_score: U256,
        categories: CategorisedScore,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            wallet_address: wallet.to_owned(),
            total_score: total_score.to_string(),
            points: scores.iter().map(Point::from_score).collect(),
            categories,
        }
    }
}

/// A published line annotated with its ranking position.
///
/// Produced by the serving queries, which window over the published table
/// with `ROW_NUMBER() OVER (ORDER BY total_score::int DESC)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedLine {
    /// The published row.
    #[serde(flatten)]
    pub line: LeaderboardLine,
    /// 1-based position in the ranking.
    pub position: i64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// MINTER BUY VALUE (running aggregate)
// ═══════════════════════════════════════════════════════════════════════════════

/// Running aggregate of summed `minter:buy` + `minter:airdrop` values,
/// one row per (project, slot).
///
/// Written by the event handlers on every relevant event arrival; read
/// with eventual-consistency semantics by the funding-milestone booster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinterBuyValue {
    /// Row identifier.
    pub id: Uuid,
    /// Project name the aggregate belongs to.
    pub project_name: String,
    /// Project slot.
    pub slot: String,
    /// Summed value.
    pub value: U256,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TOTALS
// ═══════════════════════════════════════════════════════════════════════════════

/// Sum raw scores and divide once by 10^6.
///
/// # Errors
///
/// Returns [`ArithmeticOverflow`](super::primitives::ArithmeticOverflow)
/// when the raw sum exceeds 256 bits.
pub fn total_score(scores: &[Score]) -> Result<U256, super::primitives::ArithmeticOverflow> {
    let mut sum = U256::ZERO;
    for score in scores {
        sum = super::primitives::checked_add(sum, score.points)?;
    }
    Ok(to_display_units(sum))
}

/// Bucket scores by category and total each bucket.
///
/// Every score lands in exactly one category; each bucket is divided by
/// 10^6 independently, matching the flooring of the overall total.
///
/// # Errors
///
/// Returns [`ArithmeticOverflow`](super::primitives::ArithmeticOverflow)
/// when a bucket sum exceeds 256 bits.
pub fn aggregate_categories(
    scores: &[Score],
) -> Result<CategorisedScore, super::primitives::ArithmeticOverflow> {
    let mut totals = [U256::ZERO; 3];
    for score in scores {
        let idx = match score.rule.category() {
            Category::Fund => 0,
            Category::Farming => 1,
            Category::Other => 2,
        };
        totals[idx] = super::primitives::checked_add(totals[idx], score.points)?;
    }

    Ok(CategorisedScore {
        fund: to_display_units(totals[0]).to_string(),
        farming: to_display_units(totals[1]).to_string(),
        other: to_display_units(totals[2]).to_string(),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
