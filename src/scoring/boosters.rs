//! Boost calculators: conditional multiplicative rewrites of emitted scores.
//!
//! A booster answers three questions: does this event class interest me
//! ([`BoostCalculator::check`]), does this concrete score get rewritten
//! ([`BoostCalculator::apply`], mutation in place), and where do the
//! thresholds sit for the what-if projections
//! ([`BoostCalculator::interval`]).
//!
//! Boosters are applied in registration order and compose
//! multiplicatively: two coefficients `c1` and `c2` rewrite the points to
//! `points * c1 * c2 / 10000`.

use std::sync::Arc;

use alloy::primitives::U256;
use tracing::error;

use crate::ports::BuyValueAggregator;
use crate::types::entities::{Boost, Score};
use crate::types::enums::{EventName, RuleName};
use crate::types::events::DomainEvent;
use crate::types::primitives::{ArithmeticOverflow, SCALE, mul_percent};

// ═══════════════════════════════════════════════════════════════════════════════
// BOOST STEPS
// ═══════════════════════════════════════════════════════════════════════════════

/// One (threshold, coefficient) step of a boost ladder.
///
/// Coefficients are percent times 100, so `300` multiplies by 3.0. Steps
/// are evaluated strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoostStep {
    /// Threshold in display dollars (unscaled).
    pub threshold: u64,
    /// Coefficient, percent times 100.
    pub coef: u64,
}

/// Thresholds around a projected purchase value, used by the mint page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoostInterval {
    /// Coefficient currently earned by the value.
    pub current: u64,
    /// Next threshold to reach (0 when already at the top).
    pub next_threshold: u64,
    /// Coefficient granted at the next threshold (0 at the top).
    pub next_coef: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// KARATHURU FUNDING MILESTONE
// ═══════════════════════════════════════════════════════════════════════════════

/// Aggregate identifier the milestone booster queries.
const KARATHURU_IDENTIFIER: &str = "karathuru";

/// Project name gating the milestone booster.
const KARATHURU_PROJECT: &str = "Karathuru";

/// Multiplies Karathuru funding scores while the project's global funding
/// sits below a milestone ladder.
///
/// Reads the live minter aggregate through an injected read-only port;
/// the scoring core never updates that aggregate.
#[derive(Clone)]
pub struct KarathuruMilestoneBoost {
    aggregator: Arc<dyn BuyValueAggregator>,
    steps: Vec<BoostStep>,
}

impl std::fmt::Debug for KarathuruMilestoneBoost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KarathuruMilestoneBoost")
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

impl KarathuruMilestoneBoost {
    /// Create the booster with the default milestone ladder.
    #[must_use]
    pub fn new(aggregator: Arc<dyn BuyValueAggregator>) -> Self {
        Self {
            aggregator,
            steps: vec![
                BoostStep { threshold: 50_000, coef: 300 },
                BoostStep { threshold: 150_000, coef: 200 },
                BoostStep { threshold: 300_000, coef: 150 },
                BoostStep { threshold: 500_000, coef: 120 },
                BoostStep { threshold: 700_000, coef: 110 },
            ],
        }
    }

    fn check(&self, event: &DomainEvent) -> Option<Boost> {
        let is_minter_event = matches!(
            event.event_name,
            EventName::MinterBuy | EventName::MinterAirdrop
        );
        if event.project_name() != Some(KARATHURU_PROJECT) || !is_minter_event {
            return None;
        }

        Some(Boost {
            name: "KarathuruFundingMilestone".to_owned(),
            display_name: String::new(),
            value: 0,
        })
    }

    async fn apply(
        &self,
        event: &DomainEvent,
        mut boost: Boost,
        score: &mut Score,
    ) -> Result<(), ArithmeticOverflow> {
        let current = match self
            .aggregator
            .current_value(KARATHURU_IDENTIFIER, event.recorded_at)
            .await
        {
            Ok(value) => value,
            Err(err) => {
                // Lookup failures leave the score unboosted.
                error!(%err, "failed to read minter aggregate value");
                return Ok(());
            }
        };
        if score.rule != RuleName::AmountFunded {
            return Ok(());
        }

        for step in &self.steps {
            // TODO: a project with zero funding already earns the top
            // coefficient here; revisit the comparison direction together
            // with the published rankings.
            if current <= U256::from(step.threshold) {
                score.points = mul_percent(score.points, step.coef)?;
                boost.display_name = "Funding Karathuru".to_owned();
                boost.value = u32::try_from(step.coef).unwrap_or(u32::MAX);
                score.boosts.push(boost);
                return Ok(());
            }
        }

        // Past the last milestone nothing fires.
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROJECT VALUE
// ═══════════════════════════════════════════════════════════════════════════════

/// Multiplies funding scores based on the size of the purchase itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectValueBoost {
    steps: Vec<BoostStep>,
}

impl Default for ProjectValueBoost {
    fn default() -> Self {
        Self {
            steps: vec![
                BoostStep { threshold: 5_000, coef: 300 },
                BoostStep { threshold: 1_000, coef: 200 },
                BoostStep { threshold: 500, coef: 150 },
            ],
        }
    }
}

impl ProjectValueBoost {
    fn check(event: &DomainEvent) -> Option<Boost> {
        if !matches!(
            event.event_name,
            EventName::MinterBuy | EventName::MinterAirdrop
        ) {
            return None;
        }

        Some(Boost {
            name: "ProjectValue".to_owned(),
            display_name: String::new(),
            value: 0,
        })
    }

    fn apply(&self, mut boost: Boost, score: &mut Score) -> Result<(), ArithmeticOverflow> {
        if score.rule != RuleName::AmountFunded {
            return Ok(());
        }

        for step in &self.steps {
            if score.points >= U256::from(step.threshold) * SCALE {
                score.points = mul_percent(score.points, step.coef)?;
                boost.display_name = "Funding Value".to_owned();
                boost.value = u32::try_from(step.coef).unwrap_or(u32::MAX);
                score.boosts.push(boost);
                return Ok(());
            }
        }

        Ok(())
    }

    /// Current and next threshold around an unscaled dollar value.
    ///
    /// Walks the descending ladder front to back: each step not yet
    /// reached records itself as the next target, the first step reached
    /// fixes the current coefficient and re-exposes the previous rung as
    /// the target. At the top rung there is no next threshold.
    #[must_use]
    pub fn interval(&self, value: u64) -> BoostInterval {
        let mut interval = BoostInterval::default();

        for (i, step) in self.steps.iter().enumerate() {
            if value >= step.threshold {
                interval.current = step.coef;
                if i == 0 {
                    return BoostInterval {
                        current: step.coef,
                        next_threshold: 0,
                        next_coef: 0,
                    };
                }
                interval.next_threshold = self.steps[i - 1].threshold;
                interval.next_coef = self.steps[i - 1].coef;
                break;
            }
            interval.next_threshold = step.threshold;
            interval.next_coef = step.coef;
        }

        interval
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BOOST CALCULATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// The closed set of boost calculators, dispatched in registration order
/// by the manager.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum BoostCalculator {
    /// Karathuru funding milestone ladder.
    KarathuruMilestone(KarathuruMilestoneBoost),
    /// Purchase-size ladder.
    ProjectValue(ProjectValueBoost),
}

impl BoostCalculator {
    /// Does this event class interest the booster?
    #[must_use]
    pub fn check(&self, event: &DomainEvent) -> Option<Boost> {
        match self {
            Self::KarathuruMilestone(boost) => boost.check(event),
            Self::ProjectValue(_) => ProjectValueBoost::check(event),
        }
    }

    /// Apply the boost to a score, rewriting it in place when it fires.
    ///
    /// May suspend: the milestone booster reads the live minter
    /// aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`ArithmeticOverflow`] when the rewrite overflows 256
    /// bits; this aborts the wallet replay in progress.
    pub async fn apply(
        &self,
        event: &DomainEvent,
        boost: Boost,
        score: &mut Score,
    ) -> Result<(), ArithmeticOverflow> {
        match self {
            Self::KarathuruMilestone(calculator) => calculator.apply(event, boost, score).await,
            Self::ProjectValue(calculator) => calculator.apply(boost, score),
        }
    }

    /// Thresholds around a projected value, for the mint page.
    ///
    /// Only the purchase-size ladder exposes a meaningful interval.
    #[must_use]
    pub fn interval(&self, value: u64) -> BoostInterval {
        match self {
            Self::KarathuruMilestone(_) => BoostInterval::default(),
            Self::ProjectValue(calculator) => calculator.interval(value),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
