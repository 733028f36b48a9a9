//! Normalised domain events and their replay ordering.
//!
//! A [`DomainEvent`] is the immutable record of one on-chain occurrence
//! for one wallet, written once by the indexer subscribers and replayed
//! many times by the scoring core. Payload fields live in a free-form
//! string map (`data`), enrichment such as the project name in a second
//! map (`metadata`).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::EventName;

// ═══════════════════════════════════════════════════════════════════════════════
// PAYLOAD MAPS
// ═══════════════════════════════════════════════════════════════════════════════

/// Typed payload fields of an event, hex-encoded 256-bit integers or
/// address strings keyed by field name.
pub type EventData = BTreeMap<String, String>;

/// Enrichment attached by the subscribers (`project_name`, `slot`, ...).
pub type EventMetadata = BTreeMap<String, String>;

// ═══════════════════════════════════════════════════════════════════════════════
// DOMAIN EVENT
// ═══════════════════════════════════════════════════════════════════════════════

/// One normalised on-chain occurrence attributed to a wallet.
///
/// Lifecycle: created once by a subscriber, never mutated, read on every
/// replay of the wallet's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Storage identifier (UUID v7, time-ordered).
    pub id: Uuid,
    /// Stable on-chain event identifier, unique across all events.
    pub event_id: String,
    /// Symbolic event name from the closed vocabulary.
    pub event_name: EventName,
    /// Wallet address the event pertains to.
    pub wallet_address: String,
    /// Contract address that emitted the event.
    pub from_address: String,
    /// When the event was recorded on chain (second precision).
    pub recorded_at: DateTime<Utc>,
    /// Typed payload fields.
    pub data: EventData,
    /// Enrichment metadata.
    pub metadata: EventMetadata,
}

impl DomainEvent {
    /// Project name from the enrichment metadata, when present.
    #[must_use]
    pub fn project_name(&self) -> Option<&str> {
        self.metadata.get("project_name").map(String::as_str)
    }

    /// Payload field by name, when present.
    #[must_use]
    pub fn data_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REPLAY ORDERING
// ═══════════════════════════════════════════════════════════════════════════════

/// Sort events into replay order.
///
/// The order is `(recorded_at seconds ascending, event priority
/// ascending)`; the sort is stable, so same-timestamp same-priority
/// events keep their insertion order. Sorting an already sorted slice is
/// a no-op.
pub fn sort_for_replay(events: &mut [DomainEvent]) {
    events.sort_by_key(|e| (e.recorded_at.timestamp(), e.event_name.priority()));
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn event(event_id: &str, name: EventName, ts: i64) -> DomainEvent {
        DomainEvent {
            id: Uuid::now_v7(),
            event_id: event_id.to_owned(),
            event_name: name,
            wallet_address: "0x1e2f67d8132831f210e19c5ee0197aa134308e16f7f284bba2c72e28fc464d2"
                .to_owned(),
            from_address: "0x130b5a3035eef0470cff2f9a450a7a6856a3c5a4ea3f5b7886c2d03a50d2bf"
                .to_owned(),
            recorded_at: DateTime::from_timestamp(ts, 0).unwrap(),
            data: EventData::new(),
            metadata: EventMetadata::new(),
        }
    }

    #[test]
    fn sorts_by_recorded_at() {
        let mut events = vec![
            event("e2", EventName::MinterBuy, 1_703_845_960),
            event("e1", EventName::MinterBuy, 1_703_845_777),
        ];
        sort_for_replay(&mut events);

        assert_eq!(events[0].event_id, "e1");
        assert_eq!(events[1].event_id, "e2");
        assert!(events[0].recorded_at <= events[1].recorded_at);
    }

    #[test]
    fn sorts_same_second_by_event_priority() {
        // Arrival order scrambles the project bookkeeping events; the
        // replay order must put the transfer first.
        let mut events = vec![
            event("e1", EventName::ProjectSlotChanged, 1_703_845_777),
            event("e0", EventName::ProjectTransfer, 1_703_845_777),
            event("e2", EventName::ProjectTransferValue, 1_703_845_777),
            event("e3", EventName::ProjectTransfer, 1_703_845_960),
        ];
        sort_for_replay(&mut events);

        assert_eq!(events[0].event_name, EventName::ProjectTransfer);
        assert_eq!(events[1].event_name, EventName::ProjectTransferValue);
        assert_eq!(events[2].event_name, EventName::ProjectSlotChanged);
        assert_eq!(events[3].event_name, EventName::ProjectTransfer);
        assert_eq!(events[3].event_id, "e3");
    }

    #[test]
    fn stable_for_equal_keys() {
        let mut events = vec![
            event("first", EventName::MinterBuy, 1_703_845_777),
            event("second", EventName::MinterBuy, 1_703_845_777),
            event("third", EventName::MinterBuy, 1_703_845_777),
        ];
        sort_for_replay(&mut events);

        let ids: Vec<_> = events.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn sorting_twice_is_idempotent() {
        let mut events = vec![
            event("e1", EventName::ProjectSlotChanged, 1_703_845_777),
            event("e0", EventName::ProjectTransfer, 1_703_845_777),
            event("e2", EventName::MinterBuy, 1_703_845_700),
        ];
        sort_for_replay(&mut events);
        let once = events.clone();
        sort_for_replay(&mut events);

        assert_eq!(once, events);
    }

    #[test]
    fn accessors_read_the_maps() {
        let mut e = event("e0", EventName::MinterBuy, 1_703_845_777);
        e.metadata
            .insert("project_name".into(), "Banegas Farm".into());
        e.data.insert("value".into(), "0x64".into());

        assert_eq!(e.project_name(), Some("Banegas Farm"));
        assert_eq!(e.data_field("value"), Some("0x64"));
        assert_eq!(e.data_field("amount"), None);
    }
}
