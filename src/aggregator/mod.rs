//! Cluster-wide leaderboard rebuild.
//!
//! On a timer, the aggregator replays every wallet's history into a
//! staging table and atomically promotes it over the published one.
//! Readers of the published table always see a complete ranking: the
//! previous one until the swap commits, the new one after.
//!
//! # Failure containment
//!
//! - A wallet that fails to replay is logged and skipped; the rebuild
//!   carries on.
//! - A failed publish leaves the staging table behind and the published
//!   table untouched; the next cycle starts by discarding stale staging.
//! - Cancellation mid-rebuild has the same effect as a failed publish.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use metrics::{counter, gauge, histogram};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::error::Result;
use crate::ports::{BuyValueAggregator, EventStore, LeaderboardStore};
use crate::scoring::{PersonalRanking, ScoreCalculatorManager};

// ═══════════════════════════════════════════════════════════════════════════════
// REBUILD SUMMARY
// ═══════════════════════════════════════════════════════════════════════════════

/// Outcome of one rebuild cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildSummary {
    /// Wallets found in the event log.
    pub wallets: usize,
    /// Lines written into staging and published.
    pub published: usize,
    /// Wallets skipped after a replay or insert failure.
    pub skipped: usize,
}

// ═══════════════════════════════════════════════════════════════════════════════
// LEADERBOARD AGGREGATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Timer-driven rebuild of the published ranking.
pub struct LeaderboardAggregator<S> {
    store: Arc<S>,
    buy_values: Arc<dyn BuyValueAggregator>,
    interval: Duration,
    wallet_concurrency: usize,
}

impl<S> std::fmt::Debug for LeaderboardAggregator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaderboardAggregator")
            .field("interval", &self.interval)
            .field("wallet_concurrency", &self.wallet_concurrency)
            .finish_non_exhaustive()
    }
}

impl<S> LeaderboardAggregator<S>
where
    S: EventStore + LeaderboardStore + Send + Sync + 'static,
{
    /// Create an aggregator over the given store.
    ///
    /// `wallet_concurrency` bounds the per-wallet fan-out; each wallet
    /// replay is pure and only shares the staging table, which accepts
    /// concurrent appends keyed by wallet address.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        buy_values: Arc<dyn BuyValueAggregator>,
        interval: Duration,
        wallet_concurrency: usize,
    ) -> Self {
        Self {
            store,
            buy_values,
            interval,
            wallet_concurrency: wallet_concurrency.max(1),
        }
    }

    /// Run rebuild cycles until cancelled.
    ///
    /// The first cycle starts immediately; a failed cycle does not stop
    /// the loop.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(interval_secs = self.interval.as_secs(), "starting leaderboard aggregator");
        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    info!("aggregator shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    match self.rebuild().await {
                        Ok(summary) => {
                            info!(
                                wallets = summary.wallets,
                                published = summary.published,
                                skipped = summary.skipped,
                                "leaderboard rebuilt"
                            );
                        }
                        Err(err) => {
                            counter!("leaderboard_rebuild_failures_total").increment(1);
                            error!(%err, "leaderboard rebuild failed");
                        }
                    }
                }
            }
        }
    }

    /// One full rebuild: stage every wallet, then hot-swap.
    ///
    /// # Errors
    ///
    /// Returns an error when staging cannot be prepared, the wallet list
    /// cannot be fetched, or the publish swap fails. Per-wallet failures
    /// are absorbed and only counted.
    #[instrument(skip(self))]
    pub async fn rebuild(&self) -> Result<RebuildSummary> {
        let started = Instant::now();

        // Also clears any staging left behind by a cancelled run.
        self.store.prepare_staging().await?;

        let wallets = self.store.list_wallets().await?;
        let manager = ScoreCalculatorManager::full(Arc::clone(&self.buy_values));

        let results: Vec<bool> = futures::stream::iter(wallets.iter().map(|wallet| {
            let store = Arc::clone(&self.store);
            let manager = &manager;
            async move { Self::stage_wallet(&store, manager, wallet).await }
        }))
        .buffer_unordered(self.wallet_concurrency)
        .collect()
        .await;

        let published = results.iter().filter(|ok| **ok).count();
        let skipped = results.len() - published;

        self.store.publish_staging().await?;

        counter!("leaderboard_rebuilds_total").increment(1);
        gauge!("leaderboard_published_lines").set(published as f64);
        gauge!("leaderboard_skipped_wallets").set(skipped as f64);
        histogram!("leaderboard_rebuild_duration_seconds").record(started.elapsed().as_secs_f64());

        Ok(RebuildSummary {
            wallets: wallets.len(),
            published,
            skipped,
        })
    }

    /// Replay one wallet into the staging table.
    ///
    /// Returns whether the wallet made it in; failures are logged here
    /// and absorbed.
    async fn stage_wallet(store: &Arc<S>, manager: &ScoreCalculatorManager, wallet: &str) -> bool {
        info!(wallet, "computing participant events");

        let events = match store.events_for(wallet).await {
            Ok(events) => events,
            Err(err) => {
                warn!(wallet, %err, "failed to fetch wallet events, skipping");
                return false;
            }
        };

        let line = match PersonalRanking::new(wallet, events).compute_score(manager).await {
            Ok(line) => line,
            Err(err) => {
                warn!(wallet, %err, "failed to replay wallet history, skipping");
                return false;
            }
        };

        if let Err(err) = store.insert_staged_line(&line).await {
            warn!(wallet, %err, "failed to stage wallet line, skipping");
            return false;
        }

        true
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::test_support::{
        FixedBuyValueAggregator, InMemoryStore, buy_project_event, minter_buy_event,
    };

    fn aggregator(store: Arc<InMemoryStore>) -> LeaderboardAggregator<InMemoryStore> {
        LeaderboardAggregator::new(
            store,
            Arc::new(FixedBuyValueAggregator::new(50_000)),
            Duration::from_secs(60),
            4,
        )
    }

    #[tokio::test]
    async fn rebuild_publishes_one_line_per_wallet() {
        let mut buy = buy_project_event("Karathuru", 100 * 1_000_000);
        buy.wallet_address = "wallet-a".to_owned();
        let mut other = minter_buy_event("evt_2", "Banegas Farm", "0x5F5E100", 1_703_845_800);
        other.wallet_address = "wallet-b".to_owned();

        let store = Arc::new(InMemoryStore::with_events(vec![buy, other]));
        let summary = aggregator(Arc::clone(&store)).rebuild().await.unwrap();

        assert_eq!(summary.wallets, 2);
        assert_eq!(summary.published, 2);
        assert_eq!(summary.skipped, 0);

        let published = store.published();
        assert_eq!(published.len(), 2);
        let line_a = published
            .iter()
            .find(|l| l.wallet_address == "wallet-a")
            .unwrap();
        assert_eq!(line_a.total_score, "500");
        // Staging was consumed by the publish.
        assert!(store.staging().is_none());
    }

    #[tokio::test]
    async fn rebuild_with_no_wallets_publishes_an_empty_ranking() {
        let store = Arc::new(InMemoryStore::new());
        let summary = aggregator(Arc::clone(&store)).rebuild().await.unwrap();

        assert_eq!(summary.wallets, 0);
        assert_eq!(summary.published, 0);
        assert_eq!(store.publish_count(), 1);
        assert!(store.published().is_empty());
    }

    #[tokio::test]
    async fn failed_publish_keeps_the_previous_ranking() {
        let mut buy = buy_project_event("Banegas Farm", 100 * 1_000_000);
        buy.wallet_address = "wallet-a".to_owned();
        let store = Arc::new(InMemoryStore::with_events(vec![buy]));

        let agg = aggregator(Arc::clone(&store));
        agg.rebuild().await.unwrap();
        let before = store.published();

        store.fail_next_publish();
        assert!(agg.rebuild().await.is_err());

        // The published view is untouched and the staging survives for
        // the next cycle to discard.
        assert_eq!(store.published(), before);
        assert!(store.staging().is_some());

        // The next cycle recovers.
        agg.rebuild().await.unwrap();
        assert_eq!(store.publish_count(), 2);
    }

    #[tokio::test]
    async fn ranking_queries_window_over_the_published_table() {
        let mut big = buy_project_event("Karathuru", 1_000 * 1_000_000);
        big.wallet_address = "wallet-big".to_owned();
        let mut small = minter_buy_event("evt_2", "Banegas Farm", "0x5F5E100", 1_703_845_800);
        small.wallet_address = "wallet-small".to_owned();

        let store = Arc::new(InMemoryStore::with_events(vec![big, small]));
        aggregator(Arc::clone(&store)).rebuild().await.unwrap();

        let page = store.leaderboard_page(1, 10).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].position, 1);
        assert_eq!(page[0].line.wallet_address, "wallet-big");
        assert_eq!(page[1].position, 2);

        let line = store.line_for_wallet("wallet-small").await.unwrap().unwrap();
        assert_eq!(line.position, 2);
        assert_eq!(store.count_lines().await.unwrap(), 2);
    }
}
