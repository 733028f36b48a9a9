//! Mint-page what-if projections.
//!
//! "What would my score be if I bought N more" is answered by running a
//! synthesized `minter:buy` event through the same pipeline as the real
//! rankings: one fake event recorded now, the mint-page manager, and the
//! purchase-size ladder for the surrounding thresholds.

use uuid::Uuid;

use crate::ports::Clock;
use crate::types::enums::EventName;
use crate::types::events::{DomainEvent, EventData, EventMetadata};
use crate::types::primitives::ArithmeticOverflow;

use super::boosters::BoostInterval;
use super::manager::ScoreCalculatorManager;
use super::ranking::PersonalRanking;

// ═══════════════════════════════════════════════════════════════════════════════
// PROJECTION RESULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Projected score and boost for a candidate purchase value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoostProjection {
    /// The candidate value, in display dollars.
    pub value: String,
    /// Projected total score for the purchase alone.
    pub total_score: String,
    /// Boost coefficient the value currently earns.
    pub boost: String,
}

/// Distance to the next boost threshold for a candidate purchase value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextBoostProjection {
    /// Dollars missing to reach the next threshold (0 at the top rung).
    pub missing: String,
    /// Projected total score for the purchase alone.
    pub total_score: String,
    /// Boost coefficient granted at the next threshold.
    pub boost: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROJECTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Synthesize the single fake buy the projections replay.
fn fake_buy_event(
    clock: &dyn Clock,
    wallet: &str,
    value_to_buy: u64,
    project_address: &str,
    slot: u64,
) -> DomainEvent {
    let scaled = u128::from(value_to_buy) * 1_000_000;

    let mut data = EventData::new();
    data.insert("address".to_owned(), project_address.to_owned());
    data.insert("value".to_owned(), format!("{scaled:#x}"));
    let mut metadata = EventMetadata::new();
    metadata.insert("slot".to_owned(), format!("{slot:#x}"));

    DomainEvent {
        id: Uuid::now_v7(),
        event_id: String::new(),
        event_name: EventName::MinterBuy,
        wallet_address: wallet.to_owned(),
        from_address: project_address.to_owned(),
        recorded_at: clock.now(),
        data,
        metadata,
    }
}

/// Total score the purchase alone would earn through the mint-page
/// pipeline.
async fn projected_total(
    clock: &dyn Clock,
    wallet: &str,
    value_to_buy: u64,
    project_address: &str,
    slot: u64,
) -> Result<String, ArithmeticOverflow> {
    let buy = fake_buy_event(clock, wallet, value_to_buy, project_address, slot);
    let manager = ScoreCalculatorManager::mint_page();
    let line = PersonalRanking::new(wallet, vec![buy])
        .compute_score(&manager)
        .await?;
    Ok(line.total_score)
}

/// Purchase-size interval around the candidate value.
fn purchase_interval(value_to_buy: u64) -> BoostInterval {
    let manager = ScoreCalculatorManager::mint_page();
    manager
        .boosters()
        .iter()
        .map(|booster| booster.interval(value_to_buy))
        .find(|interval| *interval != BoostInterval::default())
        .unwrap_or_default()
}

/// Project the score and current boost for buying `value_to_buy` dollars.
///
/// # Errors
///
/// Returns [`ArithmeticOverflow`] when the projected replay overflows.
pub async fn boost_for_value(
    clock: &dyn Clock,
    wallet: &str,
    value_to_buy: u64,
    project_address: &str,
    slot: u64,
) -> Result<BoostProjection, ArithmeticOverflow> {
    let total_score =
        projected_total(clock, wallet, value_to_buy, project_address, slot).await?;
    let interval = purchase_interval(value_to_buy);

    Ok(BoostProjection {
        value: value_to_buy.to_string(),
        total_score,
        boost: interval.current.to_string(),
    })
}

/// Project the distance to the next boost threshold for buying
/// `value_to_buy` dollars.
///
/// `missing` floors at zero; at the top rung there is no next threshold.
///
/// # Errors
///
/// Returns [`ArithmeticOverflow`] when the projected replay overflows.
pub async fn next_boost_for_value(
    clock: &dyn Clock,
    wallet: &str,
    value_to_buy: u64,
    project_address: &str,
    slot: u64,
) -> Result<NextBoostProjection, ArithmeticOverflow> {
    let total_score =
        projected_total(clock, wallet, value_to_buy, project_address, slot).await?;
    let interval = purchase_interval(value_to_buy);

    Ok(NextBoostProjection {
        missing: interval.next_threshold.saturating_sub(value_to_buy).to_string(),
        total_score,
        boost: interval.next_coef.to_string(),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::ports::FixedClock;

    const PROJECT: &str = "0x130b5a3035eef0470cff2f9a450a7a6856a3c5a4ea3f5b7886c2d03a50d2bf";

    #[test]
    fn fake_event_scales_the_value() {
        let clock = FixedClock::at(1_703_845_777);
        let event = fake_buy_event(&clock, "aWallet", 100, PROJECT, 1);

        assert_eq!(event.event_name, EventName::MinterBuy);
        assert_eq!(event.recorded_at.timestamp(), 1_703_845_777);
        // 100 * 10^6 = 0x5f5e100
        assert_eq!(event.data_field("value").unwrap(), "0x5f5e100");
    }

    #[rstest]
    #[case(100, "100", "0")]
    #[case(500, "750", "150")]
    #[case(1_000, "2000", "200")]
    #[case(5_000, "15000", "300")]
    #[tokio::test]
    async fn projects_score_and_current_boost(
        #[case] value: u64,
        #[case] total: &str,
        #[case] boost: &str,
    ) {
        let clock = FixedClock::at(1_703_845_777);
        let projection = boost_for_value(&clock, "aWallet", value, PROJECT, 1)
            .await
            .unwrap();

        assert_eq!(projection.value, value.to_string());
        assert_eq!(projection.total_score, total);
        assert_eq!(projection.boost, boost);
    }

    #[rstest]
    #[case(450, "50", "150")]
    #[case(900, "100", "200")]
    #[case(1_000, "4000", "300")]
    #[case(5_500, "0", "0")]
    #[tokio::test]
    async fn projects_distance_to_the_next_threshold(
        #[case] value: u64,
        #[case] missing: &str,
        #[case] next_boost: &str,
    ) {
        let clock = FixedClock::at(1_703_845_777);
        let projection = next_boost_for_value(&clock, "aWallet", value, PROJECT, 1)
            .await
            .unwrap();

        assert_eq!(projection.missing, missing);
        assert_eq!(projection.boost, next_boost);
    }
}
