//! Storage port traits for the scoring core.
//!
//! These traits define what the domain layer needs from its
//! collaborators. Infrastructure adapters implement them against concrete
//! backends (PostgreSQL in production, in-memory fakes in tests).

use alloy::primitives::U256;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::entities::{LeaderboardLine, RankedLine};
use crate::types::events::DomainEvent;

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Port over the append-only domain event log.
///
/// The log is written by the indexer subscribers; the scoring core only
/// ever reads it.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// All distinct wallet addresses present in the event log.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    async fn list_wallets(&self) -> Result<Vec<String>>;

    /// Full event history for one wallet, in arbitrary order.
    ///
    /// The caller is responsible for replay ordering.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    async fn events_for(&self, wallet: &str) -> Result<Vec<DomainEvent>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// LEADERBOARD STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Port over the published ranking table and its staging area.
///
/// The rebuild protocol: [`prepare_staging`](Self::prepare_staging) once,
/// any number of concurrent [`insert_staged_line`](Self::insert_staged_line)
/// calls (unique per wallet), then [`publish_staging`](Self::publish_staging)
/// as the single commit point. A reader of the published table sees either
/// the previous complete ranking or the new complete ranking, never a
/// partial one.
#[async_trait]
pub trait LeaderboardStore: Send + Sync {
    /// Drop any stale staging table and create a fresh one with the
    /// published schema.
    ///
    /// Stale staging can be left behind by a cancelled rebuild or a
    /// failed publish; it is always discarded before a new rebuild.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn prepare_staging(&self) -> Result<()>;

    /// Insert one wallet's line into the staging table.
    ///
    /// Safe to call concurrently for distinct wallets.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the wallet is
    /// already staged.
    async fn insert_staged_line(&self, line: &LeaderboardLine) -> Result<()>;

    /// Atomically promote the staging table over the published one.
    ///
    /// Snapshots the published table first, swaps in one transaction,
    /// then drops the snapshot. On failure the staging table is left in
    /// place and the published table remains authoritative.
    ///
    /// # Errors
    ///
    /// Returns an error if the swap fails.
    async fn publish_staging(&self) -> Result<()>;

    /// Drop the staging table without publishing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn discard_staging(&self) -> Result<()>;

    /// One page of the published ranking, positions computed by
    /// `ROW_NUMBER() OVER (ORDER BY total_score::int DESC)`.
    ///
    /// `page` is 1-based.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    async fn leaderboard_page(&self, page: u32, limit: u32) -> Result<Vec<RankedLine>>;

    /// Published line for one wallet with its ranking position.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    async fn line_for_wallet(&self, wallet: &str) -> Result<Option<RankedLine>>;

    /// Number of published lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    async fn count_lines(&self) -> Result<u64>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// MINTER BUY VALUE AGGREGATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Read port over the running minter funding aggregate.
///
/// Consumed by the funding-milestone booster with eventual-consistency
/// semantics: the value returned is whatever the aggregate holds at query
/// time.
#[async_trait]
pub trait BuyValueAggregator: Send + Sync {
    /// Summed `minter:buy` + `minter:airdrop` value for a project up to
    /// `as_of`, divided once by 10^6.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    async fn current_value(&self, identifier: &str, as_of: DateTime<Utc>) -> Result<U256>;
}

/// Write port over the running minter funding aggregate.
///
/// Called by the event handlers on every `minter:buy`, `minter:airdrop`
/// and `project:transfer-value` arrival. The scoring core itself never
/// writes the aggregate.
#[async_trait]
pub trait PersistBuyValue: Send + Sync {
    /// Upsert the aggregate value for one (project, slot) pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn save_value(&self, project_name: &str, slot: &str, value: U256) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
