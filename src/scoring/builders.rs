//! Score builders: per-rule functions from one event to an optional score.
//!
//! A builder inspects one event plus the scores already emitted for the
//! wallet and may emit one [`Score`] under its rule. Builders are pure
//! and independent; malformed payloads make a builder emit nothing while
//! the event stays visible to the other builders.
//!
//! The set of rules is closed: adding a rule means extending
//! [`ScoreBuilder`] and its dispatch arms.

use alloy::primitives::U256;
use tracing::error;

use crate::types::entities::Score;
use crate::types::enums::{EventName, RuleName};
use crate::types::events::DomainEvent;
use crate::types::primitives::{SCALE, parse_hex_u256};

// ═══════════════════════════════════════════════════════════════════════════════
// RULE CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Bonus for the first encounter of a distinct project: 200 points,
/// pre-scaled by 10^6.
const FIRST_PROJECT_POINTS: U256 = U256::from_limbs([200_000_000, 0, 0, 0]);

/// Points per tCO2 offset; claim amounts arrive in grams.
const POINTS_PER_TON: U256 = U256::from_limbs([100, 0, 0, 0]);

/// Early-adopter bonus when the project has no dedicated entry.
const EARLY_ADOPTER_FALLBACK: u64 = 50;

/// Early-adopter bonus per launch project, in display points.
fn early_adopter_bonus(project_name: &str) -> Option<u64> {
    match project_name {
        "Banegas Farm" => Some(200),
        "Las Delicias" => Some(150),
        "Manjarisoa" => Some(100),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCORE BUILDER
// ═══════════════════════════════════════════════════════════════════════════════

/// The closed set of score builders, dispatched in registration order by
/// the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreBuilder {
    /// One point per dollar funded (buys, airdrops, migrations).
    AmountFunded,
    /// First-encounter bonus per distinct project.
    NumberOfProjects,
    /// One point per dollar of resold yield.
    Resaler,
    /// One hundred points per offset tCO2.
    Offseter,
    /// Fixed bonus for the launch projects.
    EarlyAdopter,
}

impl ScoreBuilder {
    /// Whether this builder wants to see the event at all.
    #[must_use]
    pub fn supports(&self, event: &DomainEvent, prior: &[Score]) -> bool {
        match self {
            Self::AmountFunded => matches!(
                event.event_name,
                EventName::MinterBuy | EventName::MinterAirdrop | EventName::MigratorMigration
            ),
            Self::NumberOfProjects => event.project_name().is_some_and(|project| {
                !rule_was_applied(RuleName::NumberOfProjects, project, prior)
            }),
            Self::Resaler => event.event_name == EventName::YielderClaim,
            Self::Offseter => event.event_name == EventName::OffseterClaim,
            Self::EarlyAdopter => event
                .project_name()
                .is_some_and(|project| early_adopter_bonus(project).is_some()),
        }
    }

    /// Compute the score for a supported event, or nothing.
    #[must_use]
    pub fn compute(&self, event: &DomainEvent, prior: &[Score]) -> Option<Score> {
        match self {
            Self::AmountFunded => compute_amount_funded(event),
            Self::NumberOfProjects => compute_number_of_projects(event, prior),
            Self::Resaler => compute_resaler(event),
            Self::Offseter => compute_offseter(event),
            Self::EarlyAdopter => compute_early_adopter(event, prior),
        }
    }
}

/// Whether a (rule, project) pair already produced a score.
fn rule_was_applied(rule: RuleName, project_name: &str, scores: &[Score]) -> bool {
    scores.iter().any(|score| {
        score.rule == rule && score.event.project_name() == Some(project_name)
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// PER-RULE COMPUTATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// 1 value unit = 1 dollar = 1 point; values arrive pre-scaled by 10^6.
fn compute_amount_funded(event: &DomainEvent) -> Option<Score> {
    let raw = event.data_field("value")?;
    match parse_hex_u256(raw) {
        Ok(points) => Some(Score::new(points, RuleName::AmountFunded, event.clone())),
        Err(err) => {
            error!(event = %event.event_name, event_id = %event.event_id, %err,
                "failed to parse funded value, skipping");
            None
        }
    }
}

/// First encounter of a distinct project.
///
/// Walks the prior scores: entries without a project, and same-project
/// entries already under this rule, are passed over; the first prior
/// score outside those cases earns the flat bonus. A wallet whose very
/// first score comes from a `minter:buy` is credited the raw event value
/// instead (unscaled; pinned by the published rankings).
fn compute_number_of_projects(event: &DomainEvent, prior: &[Score]) -> Option<Score> {
    let mut found = false;
    if let Some(project_name) = event.project_name() {
        for score in prior {
            match score.event.project_name() {
                None => found = true,
                Some(prev)
                    if prev == project_name && score.rule == RuleName::NumberOfProjects =>
                {
                    found = true;
                }
                Some(_) => {
                    return Some(Score::new(
                        FIRST_PROJECT_POINTS,
                        RuleName::NumberOfProjects,
                        event.clone(),
                    ));
                }
            }
        }
    }

    if !found && event.event_name == EventName::MinterBuy {
        return score_from_event_value(event);
    }

    None
}

/// Fallback crediting the raw `value` payload under the project rule.
fn score_from_event_value(event: &DomainEvent) -> Option<Score> {
    let raw = event.data_field("value")?;
    // An event without a parsable value is simply ignored here.
    let points = parse_hex_u256(raw).ok()?;
    Some(Score::new(points, RuleName::NumberOfProjects, event.clone()))
}

/// 1 dollar resold = 1 point; amounts arrive pre-scaled by 10^6.
fn compute_resaler(event: &DomainEvent) -> Option<Score> {
    let raw = event.data_field("amount")?;
    match parse_hex_u256(raw) {
        Ok(points) => Some(Score::new(points, RuleName::Resaler, event.clone())),
        Err(err) => {
            error!(event = %event.event_name, event_id = %event.event_id, %err,
                "failed to parse resale amount, skipping");
            None
        }
    }
}

/// 1 tCO2 offset = 100 points; amounts arrive in grams.
fn compute_offseter(event: &DomainEvent) -> Option<Score> {
    let raw = event.data_field("amount")?;
    let grams = match parse_hex_u256(raw) {
        Ok(grams) => grams,
        Err(err) => {
            error!(event = %event.event_name, event_id = %event.event_id, %err,
                "failed to parse offset amount, skipping");
            return None;
        }
    };

    let points = grams.checked_mul(POINTS_PER_TON)?;
    Some(Score::new(points, RuleName::Offseter, event.clone()))
}

/// Per-project launch bonus, at most once per project.
fn compute_early_adopter(event: &DomainEvent, prior: &[Score]) -> Option<Score> {
    if let Some(project_name) = event.project_name() {
        for score in prior {
            match score.event.project_name() {
                None => return None,
                Some(prev) if prev == project_name && score.rule == RuleName::EarlyAdopter => {
                    return None;
                }
                Some(_) => {}
            }
        }
    }

    let bonus = event
        .project_name()
        .and_then(early_adopter_bonus)
        .unwrap_or(EARLY_ADOPTER_FALLBACK);

    let points = U256::from(bonus) * SCALE;
    Some(Score::new(points, RuleName::EarlyAdopter, event.clone()))
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
