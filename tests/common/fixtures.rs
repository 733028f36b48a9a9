//! Event fixtures and mock ports built on the crate's public API.

#![allow(dead_code)]

use std::collections::BTreeMap;

use alloy::primitives::U256;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use leaderboard_aggregator::error::Result;
use leaderboard_aggregator::ports::{BuyValueAggregator, Clock};
use leaderboard_aggregator::types::{DomainEvent, EventData, EventMetadata, EventName};

/// Wallet used across fixtures.
pub const WALLET: &str = "0x1e2f67d8132831f210e19c5ee0197aa134308e16f7f284bba2c72e28fc464d2";

/// Contract address used across fixtures.
pub const CONTRACT: &str = "0x130b5a3035eef0470cff2f9a450a7a6856a3c5a4ea3f5b7886c2d03a50d2bf";

/// Timestamp shared by most fixtures (2023-12-29).
pub const TS: i64 = 1_703_845_777;

/// Build a domain event against the fixture wallet.
pub fn event(
    event_id: &str,
    event_name: EventName,
    data: EventData,
    metadata: EventMetadata,
    ts: i64,
) -> DomainEvent {
    DomainEvent {
        id: Uuid::now_v7(),
        event_id: event_id.to_owned(),
        event_name,
        wallet_address: WALLET.to_owned(),
        from_address: CONTRACT.to_owned(),
        recorded_at: DateTime::from_timestamp(ts, 0).unwrap_or_default(),
        data,
        metadata,
    }
}

fn project_metadata(project: &str) -> EventMetadata {
    let mut metadata = BTreeMap::new();
    metadata.insert("slot".to_owned(), "0x1".to_owned());
    metadata.insert("project_name".to_owned(), project.to_owned());
    metadata
}

/// A `minter:buy` of `value` payload units against a named project.
pub fn buy_project(project: &str, value: u64) -> DomainEvent {
    buy_project_at(project, value, TS)
}

/// A `minter:buy` at a chosen timestamp.
pub fn buy_project_at(project: &str, value: u64, ts: i64) -> DomainEvent {
    let mut data = BTreeMap::new();
    data.insert("address".to_owned(), WALLET.to_owned());
    data.insert("value".to_owned(), format!("{value:#x}"));
    data.insert("time".to_owned(), ts.to_string());

    event(
        &format!("0xbuy_{project}_{ts}"),
        EventName::MinterBuy,
        data,
        project_metadata(project),
        ts,
    )
}

/// A `minter:airdrop` of `value` payload units against a named project.
pub fn airdrop_project(project: &str, value: u64, ts: i64) -> DomainEvent {
    let mut data = BTreeMap::new();
    data.insert("to".to_owned(), WALLET.to_owned());
    data.insert("value".to_owned(), format!("{value:#x}"));
    data.insert("time".to_owned(), ts.to_string());

    event(
        &format!("0xairdrop_{project}_{ts}"),
        EventName::MinterAirdrop,
        data,
        project_metadata(project),
        ts,
    )
}

/// A `yielder:claim` of `amount` payload units.
pub fn yield_claim(project: &str, amount: u64, ts: i64) -> DomainEvent {
    let mut data = BTreeMap::new();
    data.insert("address".to_owned(), WALLET.to_owned());
    data.insert("amount".to_owned(), format!("{amount:#x}"));
    data.insert("time".to_owned(), ts.to_string());

    event(
        &format!("0xyield_{project}_{ts}"),
        EventName::YielderClaim,
        data,
        project_metadata(project),
        ts,
    )
}

/// An `offseter:claim` of `amount` grams.
pub fn offset_claim(project: &str, amount: u64, ts: i64) -> DomainEvent {
    let mut data = BTreeMap::new();
    data.insert("address".to_owned(), WALLET.to_owned());
    data.insert("amount".to_owned(), format!("{amount:#x}"));
    data.insert("time".to_owned(), ts.to_string());

    event(
        &format!("0xoffset_{project}_{ts}"),
        EventName::OffseterClaim,
        data,
        project_metadata(project),
        ts,
    )
}

/// Clock pinned to a fixed Unix timestamp.
#[derive(Debug, Clone, Copy)]
pub struct PinnedClock(pub i64);

impl Clock for PinnedClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }
}

/// Buy-value aggregate pinned to a fixed value.
#[derive(Debug, Clone)]
pub struct FixedBuyValueAggregator(pub U256);

impl FixedBuyValueAggregator {
    pub fn new(value: u64) -> Self {
        Self(U256::from(value))
    }
}

#[async_trait]
impl BuyValueAggregator for FixedBuyValueAggregator {
    async fn current_value(&self, _identifier: &str, _as_of: DateTime<Utc>) -> Result<U256> {
        Ok(self.0)
    }
}
