//! Per-wallet replay producing a published leaderboard line.
//!
//! [`PersonalRanking`] owns one wallet's full event history, sorted into
//! replay order at construction. `compute_score` folds a manager over the
//! events and assembles the [`LeaderboardLine`]: per-rule points, the
//! overall total and the per-category breakdown.
//!
//! The replay is a pure function of the multiset and order of the events;
//! replaying the same history always yields the same line (up to the
//! regenerated row id).

use crate::types::entities::{LeaderboardLine, Score, aggregate_categories, total_score};
use crate::types::events::{DomainEvent, sort_for_replay};
use crate::types::primitives::ArithmeticOverflow;

use super::manager::ScoreCalculatorManager;

// ═══════════════════════════════════════════════════════════════════════════════
// PERSONAL RANKING
// ═══════════════════════════════════════════════════════════════════════════════

/// One wallet's history, ready for replay.
#[derive(Debug, Clone)]
pub struct PersonalRanking {
    /// The wallet the history belongs to.
    pub wallet: String,
    /// The wallet's events, in replay order.
    pub events: Vec<DomainEvent>,
}

impl PersonalRanking {
    /// Take ownership of a wallet's events and sort them into replay
    /// order. Sorting an already ordered history is a no-op.
    #[must_use]
    pub fn new(wallet: impl Into<String>, mut events: Vec<DomainEvent>) -> Self {
        sort_for_replay(&mut events);
        Self {
            wallet: wallet.into(),
            events,
        }
    }

    /// Fold the manager over the history and assemble the published line.
    ///
    /// May suspend inside the milestone booster's aggregate lookup; the
    /// scoring itself never does.
    ///
    /// # Errors
    ///
    /// Returns [`ArithmeticOverflow`] when any 256-bit operation in the
    /// replay overflows. The wallet's line is then not produced; other
    /// wallets are unaffected.
    pub async fn compute_score(
        &self,
        manager: &ScoreCalculatorManager,
    ) -> Result<LeaderboardLine, ArithmeticOverflow> {
        let mut scores: Vec<Score> = Vec::new();
        for event in &self.events {
            scores = manager.compute_score(event, scores).await?;
        }

        let total = total_score(&scores)?;
        let categories = aggregate_categories(&scores)?;

        Ok(LeaderboardLine::from_scores(
            &self.wallet,
            &scores,
            total,
            categories,
        ))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
