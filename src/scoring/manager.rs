//! Composition point driving one event through builders and boosters.
//!
//! The manager owns an ordered list of [`ScoreBuilder`]s and an ordered
//! list of [`BoostCalculator`]s. For each event, every supporting builder
//! gets to emit a score, and every emitted score is offered to every
//! booster before it joins the running list. Ordering is part of the
//! contract: boosts compose multiplicatively in registration order.

use std::sync::Arc;

use crate::ports::BuyValueAggregator;
use crate::types::entities::Score;
use crate::types::events::DomainEvent;
use crate::types::primitives::ArithmeticOverflow;

use super::boosters::{BoostCalculator, KarathuruMilestoneBoost, ProjectValueBoost};
use super::builders::ScoreBuilder;

// ═══════════════════════════════════════════════════════════════════════════════
// SCORE CALCULATOR MANAGER
// ═══════════════════════════════════════════════════════════════════════════════

/// Ordered composition of builders and boosters.
#[derive(Debug, Clone, Default)]
pub struct ScoreCalculatorManager {
    builders: Vec<ScoreBuilder>,
    boosters: Vec<BoostCalculator>,
}

impl ScoreCalculatorManager {
    /// Compose an arbitrary set of builders and boosters.
    ///
    /// Both lists are applied strictly in the given order.
    #[must_use]
    pub const fn new(builders: Vec<ScoreBuilder>, boosters: Vec<BoostCalculator>) -> Self {
        Self { builders, boosters }
    }

    /// Preset for the cluster-wide rebuild: every rule, every booster.
    #[must_use]
    pub fn full(aggregator: Arc<dyn BuyValueAggregator>) -> Self {
        Self::new(
            vec![
                ScoreBuilder::AmountFunded,
                ScoreBuilder::NumberOfProjects,
                ScoreBuilder::Resaler,
                ScoreBuilder::Offseter,
                ScoreBuilder::EarlyAdopter,
            ],
            vec![
                BoostCalculator::KarathuruMilestone(KarathuruMilestoneBoost::new(aggregator)),
                BoostCalculator::ProjectValue(ProjectValueBoost::default()),
            ],
        )
    }

    /// Preset for the mint-page what-if projections: funded amounts with
    /// the purchase-size booster only.
    #[must_use]
    pub fn mint_page() -> Self {
        Self::new(
            vec![ScoreBuilder::AmountFunded],
            vec![BoostCalculator::ProjectValue(ProjectValueBoost::default())],
        )
    }

    /// The registered boosters, in application order.
    #[must_use]
    pub fn boosters(&self) -> &[BoostCalculator] {
        &self.boosters
    }

    /// Drive one event through every builder and booster.
    ///
    /// Takes and returns the wallet's running score list so the fold over
    /// a history stays explicit at the call site.
    ///
    /// # Errors
    ///
    /// Returns [`ArithmeticOverflow`] when a boost rewrite overflows,
    /// aborting the replay of the current wallet.
    pub async fn compute_score(
        &self,
        event: &DomainEvent,
        mut scores: Vec<Score>,
    ) -> Result<Vec<Score>, ArithmeticOverflow> {
        for builder in &self.builders {
            if !builder.supports(event, &scores) {
                continue;
            }
            let Some(mut score) = builder.compute(event, &scores) else {
                continue;
            };

            for booster in &self.boosters {
                if let Some(boost) = booster.check(event) {
                    booster.apply(event, boost, &mut score).await?;
                }
            }
            scores.push(score);
        }

        Ok(scores)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
