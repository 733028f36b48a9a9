//! Shared fixtures and mock ports for unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use alloy::primitives::U256;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{InfraError, Result};
use crate::ports::{BuyValueAggregator, EventStore, LeaderboardStore};
use crate::types::entities::{LeaderboardLine, RankedLine};
use crate::types::enums::EventName;
use crate::types::events::{DomainEvent, EventData, EventMetadata};

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

/// Wallet used across fixtures.
pub const TEST_WALLET: &str =
    "0x1e2f67d8132831f210e19c5ee0197aa134308e16f7f284bba2c72e28fc464d2";

/// Contract address used across fixtures.
pub const TEST_CONTRACT: &str =
    "0x130b5a3035eef0470cff2f9a450a7a6856a3c5a4ea3f5b7886c2d03a50d2bf";

/// Timestamp shared by most fixtures (2023-12-29).
pub const TEST_TS: i64 = 1_703_845_777;

pub fn new_event(
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
        wallet_address: TEST_WALLET.to_owned(),
        from_address: TEST_CONTRACT.to_owned(),
        recorded_at: DateTime::from_timestamp(ts, 0).unwrap(),
        data,
        metadata,
    }
}

/// Event with empty payload and metadata.
pub fn plain_event(event_name: EventName) -> DomainEvent {
    new_event("0xplain_0", event_name, EventData::new(), EventMetadata::new(), TEST_TS)
}

fn project_metadata(project: &str) -> EventMetadata {
    let mut metadata = BTreeMap::new();
    metadata.insert("slot".to_owned(), "0x1".to_owned());
    metadata.insert("project_name".to_owned(), project.to_owned());
    metadata
}

/// A `minter:buy` of `value` payload units against a named project.
pub fn buy_project_event(project: &str, value: u64) -> DomainEvent {
    let mut data = BTreeMap::new();
    data.insert("address".to_owned(), TEST_WALLET.to_owned());
    data.insert("value".to_owned(), format!("{value:#x}"));
    data.insert("time".to_owned(), TEST_TS.to_string());

    new_event(
        "0x4aa5ea227fb0457e4cbe20be80a1896796c2d07c9032835dbbd395629c8f42f_0",
        EventName::MinterBuy,
        data,
        project_metadata(project),
        TEST_TS,
    )
}

pub fn minter_buy_event(event_id: &str, project: &str, value_hex: &str, ts: i64) -> DomainEvent {
    let mut data = BTreeMap::new();
    data.insert("address".to_owned(), TEST_WALLET.to_owned());
    data.insert("value".to_owned(), value_hex.to_owned());
    data.insert("time".to_owned(), ts.to_string());

    new_event(event_id, EventName::MinterBuy, data, project_metadata(project), ts)
}

pub fn minter_airdrop_event(event_id: &str, project: &str, value_hex: &str, ts: i64) -> DomainEvent {
    let mut data = BTreeMap::new();
    data.insert("to".to_owned(), TEST_WALLET.to_owned());
    data.insert("value".to_owned(), value_hex.to_owned());
    data.insert("time".to_owned(), ts.to_string());

    let mut metadata = project_metadata(project);
    metadata.insert("slot".to_owned(), "0x2".to_owned());
    new_event(event_id, EventName::MinterAirdrop, data, metadata, ts)
}

/// A `yielder:claim` of `amount` payload units against Banegas Farm.
pub fn yielder_claim_event(amount: u64) -> DomainEvent {
    let mut data = BTreeMap::new();
    data.insert("address".to_owned(), TEST_WALLET.to_owned());
    data.insert("amount".to_owned(), format!("{amount:#x}"));
    data.insert("time".to_owned(), TEST_TS.to_string());

    new_event(
        "0x4aa5ea227fb0457e4cbe20be80a1896796c2d07c9032835dbbd395629c8f42f_0",
        EventName::YielderClaim,
        data,
        project_metadata("Banegas Farm"),
        TEST_TS,
    )
}

/// An `offseter:claim` of `amount` grams against Banegas Farm.
pub fn offseter_claim_event(amount: u64) -> DomainEvent {
    let mut data = BTreeMap::new();
    data.insert("address".to_owned(), TEST_WALLET.to_owned());
    data.insert("amount".to_owned(), format!("{amount:#x}"));
    data.insert("time".to_owned(), TEST_TS.to_string());

    new_event(
        "0x4aa5ea227fb0457e4cbe20be80a1896796c2d07c9032835dbbd395629c8f42f_0",
        EventName::OffseterClaim,
        data,
        project_metadata("Banegas Farm"),
        TEST_TS,
    )
}

/// A project bookkeeping history: slot change, two transfers and a value
/// transfer, deliberately out of replay order.
pub fn project_history_events() -> Vec<DomainEvent> {
    let mut events = Vec::new();

    let mut slot_data = BTreeMap::new();
    slot_data.insert("new_slot".to_owned(), "0x1".to_owned());
    slot_data.insert("old_slot".to_owned(), "0x0".to_owned());
    slot_data.insert("token_id".to_owned(), "0x1".to_owned());
    events.push(new_event(
        "0x4aa5ea227fb0457e4cbe20be80a1896796c2d07c9032835dbbd395629c8f42f_1",
        EventName::ProjectSlotChanged,
        slot_data,
        project_metadata("Banegas Farm"),
        TEST_TS,
    ));

    let mut transfer_data = BTreeMap::new();
    transfer_data.insert("to".to_owned(), TEST_WALLET.to_owned());
    transfer_data.insert("from".to_owned(), "0x0".to_owned());
    transfer_data.insert("token_id".to_owned(), "0x1".to_owned());
    events.push(new_event(
        "0x4aa5ea227fb0457e4cbe20be80a1896796c2d07c9032835dbbd395629c8f42f_0",
        EventName::ProjectTransfer,
        transfer_data.clone(),
        project_metadata("Banegas Farm"),
        TEST_TS,
    ));

    let mut value_data = BTreeMap::new();
    value_data.insert("value".to_owned(), "0xe4e1c0".to_owned());
    value_data.insert("to_token_id".to_owned(), "0x1".to_owned());
    value_data.insert("from_token_id".to_owned(), "0x0".to_owned());
    events.push(new_event(
        "0x4aa5ea227fb0457e4cbe20be80a1896796c2d07c9032835dbbd395629c8f42f_2",
        EventName::ProjectTransferValue,
        value_data,
        project_metadata("Banegas Farm"),
        TEST_TS,
    ));

    events.push(new_event(
        "0x4aa5ea227fb0457e4cbe20be80a1896796c2d07c9032835dbbd395629c8f42f_3",
        EventName::ProjectTransfer,
        transfer_data,
        project_metadata("Banegas Farm"),
        1_703_845_960,
    ));

    events
}

// ═══════════════════════════════════════════════════════════════════════════════
// MOCK PORTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Buy-value aggregate pinned to a fixed value, or failing on demand.
#[derive(Debug)]
pub struct FixedBuyValueAggregator {
    value: U256,
    fail: bool,
}

impl FixedBuyValueAggregator {
    pub fn new(value: u64) -> Self {
        Self {
            value: U256::from(value),
            fail: false,
        }
    }

    /// Aggregator whose lookups always fail.
    pub fn failing() -> Self {
        Self {
            value: U256::ZERO,
            fail: true,
        }
    }
}

#[async_trait]
impl BuyValueAggregator for FixedBuyValueAggregator {
    async fn current_value(&self, _identifier: &str, _as_of: DateTime<Utc>) -> Result<U256> {
        if self.fail {
            return Err(InfraError::NotFound.into());
        }
        Ok(self.value)
    }
}

/// In-memory event log and leaderboard store for aggregator tests.
///
/// Tracks the staging lifecycle so tests can assert the rebuild protocol:
/// prepare, concurrent inserts, publish.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<InMemoryState>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    events: BTreeMap<String, Vec<DomainEvent>>,
    staging: Option<Vec<LeaderboardLine>>,
    published: Vec<LeaderboardLine>,
    fail_publish: bool,
    publish_count: usize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<DomainEvent>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock().unwrap();
            for event in events {
                state
                    .events
                    .entry(event.wallet_address.clone())
                    .or_default()
                    .push(event);
            }
        }
        store
    }

    pub fn fail_next_publish(&self) {
        self.state.lock().unwrap().fail_publish = true;
    }

    pub fn published(&self) -> Vec<LeaderboardLine> {
        self.state.lock().unwrap().published.clone()
    }

    pub fn staging(&self) -> Option<Vec<LeaderboardLine>> {
        self.state.lock().unwrap().staging.clone()
    }

    pub fn publish_count(&self) -> usize {
        self.state.lock().unwrap().publish_count
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn list_wallets(&self) -> Result<Vec<String>> {
        Ok(self.state.lock().unwrap().events.keys().cloned().collect())
    }

    async fn events_for(&self, wallet: &str) -> Result<Vec<DomainEvent>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .events
            .get(wallet)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl LeaderboardStore for InMemoryStore {
    async fn prepare_staging(&self) -> Result<()> {
        self.state.lock().unwrap().staging = Some(Vec::new());
        Ok(())
    }

    async fn insert_staged_line(&self, line: &LeaderboardLine) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let staging = state.staging.as_mut().ok_or(InfraError::NotFound)?;
        staging.push(line.clone());
        Ok(())
    }

    async fn publish_staging(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_publish {
            state.fail_publish = false;
            return Err(InfraError::NotFound.into());
        }
        let staged = state.staging.take().ok_or(InfraError::NotFound)?;
        state.published = staged;
        state.publish_count += 1;
        Ok(())
    }

    async fn discard_staging(&self) -> Result<()> {
        self.state.lock().unwrap().staging = None;
        Ok(())
    }

    async fn leaderboard_page(&self, page: u32, limit: u32) -> Result<Vec<RankedLine>> {
        let state = self.state.lock().unwrap();
        let mut lines = state.published.clone();
        lines.sort_by_key(|line| {
            std::cmp::Reverse(line.total_score.parse::<i64>().unwrap_or_default())
        });

        Ok(lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| RankedLine {
                line,
                position: i64::try_from(i).unwrap_or_default() + 1,
            })
            .skip((page.saturating_sub(1) as usize) * limit as usize)
            .take(limit as usize)
            .collect())
    }

    async fn line_for_wallet(&self, wallet: &str) -> Result<Option<RankedLine>> {
        let all = self.leaderboard_page(1, u32::MAX).await?;
        Ok(all.into_iter().find(|l| l.line.wallet_address == wallet))
    }

    async fn count_lines(&self) -> Result<u64> {
        Ok(self.state.lock().unwrap().published.len() as u64)
    }
}
