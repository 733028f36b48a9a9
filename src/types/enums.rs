//! Closed vocabularies of the scoring domain.
//!
//! Each enum provides:
//! - Safe conversion from/to the wire string used in storage
//! - JSON serialization via `serde`
//! - Domain-specific helper methods (replay priority, category mapping)

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT NAME - Normalised on-chain event vocabulary
// ═══════════════════════════════════════════════════════════════════════════════

/// Symbolic names of the normalised domain events.
///
/// Event names are written by the indexer subscribers and read back during
/// replay. The vocabulary is closed: an unknown name in storage is a data
/// error, not an extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum EventName {
    /// Purchase through the minter contract.
    #[serde(rename = "minter:buy")]
    MinterBuy,
    /// Airdrop through the minter contract.
    #[serde(rename = "minter:airdrop")]
    MinterAirdrop,
    /// Position migrated from the legacy contract.
    #[serde(rename = "migrator:migration")]
    MigratorMigration,
    /// Yield claimed from the yielder farm.
    #[serde(rename = "yielder:claim")]
    YielderClaim,
    /// Deposit into the yielder farm.
    #[serde(rename = "yielder:deposit")]
    YielderDeposit,
    /// Withdrawal from the yielder farm.
    #[serde(rename = "yielder:withdraw")]
    YielderWithdraw,
    /// Carbon credits claimed from the offseter farm.
    #[serde(rename = "offseter:claim")]
    OffseterClaim,
    /// Deposit into the offseter farm.
    #[serde(rename = "offseter:deposit")]
    OffseterDeposit,
    /// Withdrawal from the offseter farm.
    #[serde(rename = "offseter:withdraw")]
    OffseterWithdraw,
    /// Project token transfer.
    #[serde(rename = "project:transfer")]
    ProjectTransfer,
    /// Project token value transfer.
    #[serde(rename = "project:transfer-value")]
    ProjectTransferValue,
    /// Project token moved to another slot.
    #[serde(rename = "project:slot-changed")]
    ProjectSlotChanged,
}

/// Replay priority assigned to events outside the project family.
///
/// Large on purpose: project bookkeeping events must come first within a
/// second so downstream rules can resolve the wallet a value transfer
/// belongs to.
const DEFAULT_EVENT_PRIORITY: u32 = 99_999;

impl EventName {
    /// Wire representation, as stored in `domain_events.event_name`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MinterBuy => "minter:buy",
            Self::MinterAirdrop => "minter:airdrop",
            Self::MigratorMigration => "migrator:migration",
            Self::YielderClaim => "yielder:claim",
            Self::YielderDeposit => "yielder:deposit",
            Self::YielderWithdraw => "yielder:withdraw",
            Self::OffseterClaim => "offseter:claim",
            Self::OffseterDeposit => "offseter:deposit",
            Self::OffseterWithdraw => "offseter:withdraw",
            Self::ProjectTransfer => "project:transfer",
            Self::ProjectTransferValue => "project:transfer-value",
            Self::ProjectSlotChanged => "project:slot-changed",
        }
    }

    /// Ordering priority within a single recorded-at second.
    ///
    /// A `project:transfer` must be visible to the replay before a
    /// `project:transfer-value` carrying the same timestamp.
    #[must_use]
    pub const fn priority(&self) -> u32 {
        match self {
            Self::ProjectTransfer => 0,
            Self::ProjectTransferValue => 1,
            Self::ProjectSlotChanged => 2,
            _ => DEFAULT_EVENT_PRIORITY,
        }
    }

    /// Returns all event names in the vocabulary.
    #[must_use]
    pub const fn all() -> [Self; 12] {
        [
            Self::MinterBuy,
            Self::MinterAirdrop,
            Self::MigratorMigration,
            Self::YielderClaim,
            Self::YielderDeposit,
            Self::YielderWithdraw,
            Self::OffseterClaim,
            Self::OffseterDeposit,
            Self::OffseterWithdraw,
            Self::ProjectTransfer,
            Self::ProjectTransferValue,
            Self::ProjectSlotChanged,
        ]
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when an event name outside the vocabulary is read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event name: {0:?}")]
pub struct UnknownEventName(pub String);

impl std::str::FromStr for EventName {
    type Err = UnknownEventName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minter:buy" => Ok(Self::MinterBuy),
            "minter:airdrop" => Ok(Self::MinterAirdrop),
            "migrator:migration" => Ok(Self::MigratorMigration),
            "yielder:claim" => Ok(Self::YielderClaim),
            "yielder:deposit" => Ok(Self::YielderDeposit),
            "yielder:withdraw" => Ok(Self::YielderWithdraw),
            "offseter:claim" => Ok(Self::OffseterClaim),
            "offseter:deposit" => Ok(Self::OffseterDeposit),
            "offseter:withdraw" => Ok(Self::OffseterWithdraw),
            "project:transfer" => Ok(Self::ProjectTransfer),
            "project:transfer-value" => Ok(Self::ProjectTransferValue),
            "project:slot-changed" => Ok(Self::ProjectSlotChanged),
            _ => Err(UnknownEventName(s.to_owned())),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RULE NAME - Contribution classes
// ═══════════════════════════════════════════════════════════════════════════════

/// Named contribution classes, wire-visible in stored `points.rule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum RuleName {
    /// Dollars funded through buys, airdrops and migrations.
    AmountFunded,
    /// First-encounter bonus per distinct project.
    NumberOfProjects,
    /// Fixed bonus for the launch projects.
    EarlyAdopter,
    /// Carbon offset claims.
    Offseter,
    /// Yield resale claims.
    Resaler,
    /// Reserved for standalone boost entries.
    Boost,
}

impl RuleName {
    /// Wire representation, as stored in `points.rule`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AmountFunded => "amount_funded",
            Self::NumberOfProjects => "number_of_projects",
            Self::EarlyAdopter => "early_adopter",
            Self::Offseter => "offseter",
            Self::Resaler => "resaler",
            Self::Boost => "boost",
        }
    }

    /// Display category this rule is aggregated under.
    #[must_use]
    pub const fn category(&self) -> Category {
        match self {
            Self::AmountFunded | Self::NumberOfProjects | Self::EarlyAdopter => Category::Fund,
            Self::Offseter | Self::Resaler => Category::Farming,
            Self::Boost => Category::Other,
        }
    }
}

impl std::fmt::Display for RuleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CATEGORY - Grouping of rules for UI display
// ═══════════════════════════════════════════════════════════════════════════════

/// Score categories, wire-visible in the `categories` JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Category {
    /// Funding contributions.
    Fund,
    /// Farming contributions.
    Farming,
    /// Everything without a dedicated bucket.
    Other,
}

impl Category {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fund => "fund",
            Self::Farming => "farming",
            Self::Other => "other",
        }
    }

    /// Returns all categories.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Fund, Self::Farming, Self::Other]
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn event_name_roundtrip() {
        for name in EventName::all() {
            let parsed = EventName::from_str(name.as_str()).expect("roundtrip failed");
            assert_eq!(name, parsed);
        }
    }

    #[test]
    fn unknown_event_name_is_rejected() {
        assert!(EventName::from_str("not-a-real-event-wedontcare").is_err());
        assert!(EventName::from_str("").is_err());
    }

    #[test]
    fn project_events_order_before_everything_else() {
        assert_eq!(EventName::ProjectTransfer.priority(), 0);
        assert_eq!(EventName::ProjectTransferValue.priority(), 1);
        assert_eq!(EventName::ProjectSlotChanged.priority(), 2);
        assert_eq!(EventName::MinterBuy.priority(), 99_999);
        assert_eq!(EventName::YielderClaim.priority(), 99_999);
    }

    #[test]
    fn rule_categories_partition_the_rules() {
        assert_eq!(RuleName::AmountFunded.category(), Category::Fund);
        assert_eq!(RuleName::NumberOfProjects.category(), Category::Fund);
        assert_eq!(RuleName::EarlyAdopter.category(), Category::Fund);
        assert_eq!(RuleName::Offseter.category(), Category::Farming);
        assert_eq!(RuleName::Resaler.category(), Category::Farming);
        assert_eq!(RuleName::Boost.category(), Category::Other);
    }

    #[test]
    fn wire_names_match_storage_contract() {
        assert_eq!(RuleName::AmountFunded.as_str(), "amount_funded");
        assert_eq!(RuleName::NumberOfProjects.as_str(), "number_of_projects");
        assert_eq!(Category::Fund.as_str(), "fund");
        assert_eq!(Category::Farming.as_str(), "farming");
        assert_eq!(Category::Other.as_str(), "other");
        assert_eq!(EventName::MinterBuy.as_str(), "minter:buy");
        assert_eq!(EventName::ProjectTransferValue.as_str(), "project:transfer-value");
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&EventName::MinterBuy).unwrap();
        assert_eq!(json, "\"minter:buy\"");
        let json = serde_json::to_string(&RuleName::NumberOfProjects).unwrap();
        assert_eq!(json, "\"number_of_projects\"");
    }
}
