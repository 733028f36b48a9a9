//! Property-based invariants of the scoring pipeline.

mod common;

use std::sync::Arc;

use alloy::primitives::U256;
use proptest::prelude::*;

use common::fixtures::{self, FixedBuyValueAggregator, buy_project_at, offset_claim, yield_claim};
use leaderboard_aggregator::scoring::{PersonalRanking, ScoreCalculatorManager};
use leaderboard_aggregator::types::{
    DomainEvent, EventName, RuleName, Score, aggregate_categories, sort_for_replay, total_score,
};

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATORS
// ═══════════════════════════════════════════════════════════════════════════════

const PROJECTS: [&str; 5] = [
    "Banegas Farm",
    "Las Delicias",
    "Manjarisoa",
    "Karathuru",
    "Solar One",
];

fn arb_event_name() -> impl Strategy<Value = EventName> {
    prop::sample::select(EventName::all().to_vec())
}

/// Events with distinct timestamps, so the replay order is unique and
/// permutation determinism is well-defined.
fn arb_history() -> impl Strategy<Value = Vec<DomainEvent>> {
    prop::collection::vec(
        (prop::sample::select(PROJECTS.to_vec()), 1u64..5_000, 0usize..3),
        0..12,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (project, dollars, kind))| {
                let ts = fixtures::TS + i64::try_from(i).unwrap_or_default();
                match kind {
                    0 => buy_project_at(project, dollars * 1_000_000, ts),
                    1 => yield_claim(project, dollars * 1_000_000, ts),
                    _ => offset_claim(project, dollars, ts),
                }
            })
            .collect()
    })
}

fn arb_rule() -> impl Strategy<Value = RuleName> {
    prop::sample::select(vec![
        RuleName::AmountFunded,
        RuleName::NumberOfProjects,
        RuleName::EarlyAdopter,
        RuleName::Offseter,
        RuleName::Resaler,
        RuleName::Boost,
    ])
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORDERING
// ═══════════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn sorting_is_idempotent(
        specs in prop::collection::vec((0i64..60, arb_event_name()), 0..24)
    ) {
        let mut events: Vec<DomainEvent> = specs
            .into_iter()
            .enumerate()
            .map(|(i, (offset, name))| {
                fixtures::event(
                    &format!("0xevt_{i}"),
                    name,
                    Default::default(),
                    Default::default(),
                    fixtures::TS + offset,
                )
            })
            .collect();

        sort_for_replay(&mut events);
        let once = events.clone();
        sort_for_replay(&mut events);
        prop_assert_eq!(once, events);
    }

    #[test]
    fn sorted_events_are_totally_ordered_by_the_replay_key(
        specs in prop::collection::vec((0i64..60, arb_event_name()), 0..24)
    ) {
        let mut events: Vec<DomainEvent> = specs
            .into_iter()
            .enumerate()
            .map(|(i, (offset, name))| {
                fixtures::event(
                    &format!("0xevt_{i}"),
                    name,
                    Default::default(),
                    Default::default(),
                    fixtures::TS + offset,
                )
            })
            .collect();

        sort_for_replay(&mut events);
        for pair in events.windows(2) {
            let key_a = (pair[0].recorded_at.timestamp(), pair[0].event_name.priority());
            let key_b = (pair[1].recorded_at.timestamp(), pair[1].event_name.priority());
            prop_assert!(key_a <= key_b);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONSERVATION
// ═══════════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn total_is_the_floored_sum_of_raw_points(
        points in prop::collection::vec((any::<u64>(), arb_rule()), 0..16)
    ) {
        let scores: Vec<Score> = points
            .iter()
            .map(|(p, rule)| {
                Score::new(U256::from(*p), *rule, fixtures::buy_project("Banegas Farm", 1))
            })
            .collect();

        let raw_sum: u128 = points.iter().map(|(p, _)| u128::from(*p)).sum();
        let total = total_score(&scores).unwrap();
        prop_assert_eq!(total, U256::from(raw_sum / 1_000_000));
    }

    #[test]
    fn categories_partition_the_total(
        points in prop::collection::vec((any::<u64>(), arb_rule()), 0..16)
    ) {
        let scores: Vec<Score> = points
            .iter()
            .map(|(p, rule)| {
                Score::new(U256::from(*p), *rule, fixtures::buy_project("Banegas Farm", 1))
            })
            .collect();

        // Each raw score lands in exactly one bucket.
        let mut raw = [0u128; 3];
        for (p, rule) in &points {
            let idx = match rule {
                RuleName::AmountFunded | RuleName::NumberOfProjects | RuleName::EarlyAdopter => 0,
                RuleName::Offseter | RuleName::Resaler => 1,
                _ => 2,
            };
            raw[idx] += u128::from(*p);
        }

        let categories = aggregate_categories(&scores).unwrap();
        prop_assert_eq!(categories.fund, (raw[0] / 1_000_000).to_string());
        prop_assert_eq!(categories.farming, (raw[1] / 1_000_000).to_string());
        prop_assert_eq!(categories.other, (raw[2] / 1_000_000).to_string());

        // The bucketed raw sums partition the overall raw sum.
        let total = total_score(&scores).unwrap();
        let raw_sum: u128 = raw.iter().sum();
        prop_assert_eq!(total, U256::from(raw_sum / 1_000_000));
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REPLAY
// ═══════════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn replay_is_invariant_under_permutation(history in arb_history()) {
        let manager =
            ScoreCalculatorManager::full(Arc::new(FixedBuyValueAggregator::new(50_000)));

        let reversed: Vec<DomainEvent> = history.iter().rev().cloned().collect();
        let line_a = block_on(
            PersonalRanking::new(fixtures::WALLET, history).compute_score(&manager),
        )
        .unwrap();
        let line_b = block_on(
            PersonalRanking::new(fixtures::WALLET, reversed).compute_score(&manager),
        )
        .unwrap();

        prop_assert_eq!(line_a.total_score, line_b.total_score);
        prop_assert_eq!(line_a.points, line_b.points);
        prop_assert_eq!(line_a.categories, line_b.categories);
    }

    #[test]
    fn first_encounter_rules_fire_at_most_once_per_project(history in arb_history()) {
        let manager =
            ScoreCalculatorManager::full(Arc::new(FixedBuyValueAggregator::new(50_000)));
        let line = block_on(
            PersonalRanking::new(fixtures::WALLET, history).compute_score(&manager),
        )
        .unwrap();

        for rule in ["early_adopter", "number_of_projects"] {
            let mut seen = std::collections::BTreeSet::new();
            for point in line.points.iter().filter(|p| p.rule == rule) {
                let project = point.metadata.get("project_name").cloned().unwrap_or_default();
                prop_assert!(
                    seen.insert(project.clone()),
                    "{} fired twice for {}",
                    rule,
                    project
                );
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BOOST COMPOSITION
// ═══════════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn boosts_compose_multiplicatively(
        raw in 1u64..1_000_000,
        c1 in prop::sample::select(vec![300u64, 200, 150, 120, 110]),
        c2 in prop::sample::select(vec![300u64, 200, 150]),
    ) {
        use leaderboard_aggregator::types::primitives::mul_percent;

        // Scaled points are always multiples of 10^4, which keeps the
        // sequential rewrites free of intermediate truncation.
        let points = U256::from(raw) * U256::from(10_000u64);
        let sequential = mul_percent(mul_percent(points, c1).unwrap(), c2).unwrap();
        let combined = points * U256::from(c1) * U256::from(c2) / U256::from(10_000u64);

        prop_assert_eq!(sequential, combined);
    }
}
