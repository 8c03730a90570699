use std::collections::HashMap;
use std::marker::PhantomData;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::event_sourcing::core::{Aggregate, DomainEvent, EventEnvelope};

// ============================================================================
// Generic Event Store - Repository for Events
// ============================================================================
//
// In-process event store that works with ANY event type.
//
// Responsibilities:
// 1. Append events to a per-aggregate stream (append-only)
// 2. Load event history for aggregates
// 3. Enforce optimistic concurrency: an append commits only if the stream
//    is still at the version the caller read
//
// The whole check-and-append happens under one write lock, which is the
// single-row transaction every transition relies on.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Concurrency conflict on {aggregate_id}: expected version {expected}, but current is {actual}")]
    ConcurrencyConflict {
        aggregate_id: Uuid,
        expected: i64,
        actual: i64,
    },

    #[error("Cannot append empty event list")]
    EmptyAppend,

    #[error("Event sequence gap on {aggregate_id}: expected {expected}, got {actual}")]
    SequenceGap {
        aggregate_id: Uuid,
        expected: i64,
        actual: i64,
    },

    #[error("Aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    #[error("Failed to replay aggregate {aggregate_id}: {reason}")]
    Replay { aggregate_id: Uuid, reason: String },
}

pub struct EventStore<E: DomainEvent> {
    streams: RwLock<HashMap<Uuid, Vec<EventEnvelope<E>>>>,
    aggregate_type_name: String,
    _phantom: PhantomData<E>,
}

impl<E: DomainEvent> EventStore<E> {
    pub fn new(aggregate_type_name: &str) -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            aggregate_type_name: aggregate_type_name.to_string(),
            _phantom: PhantomData,
        }
    }

    /// Append events to the event store
    /// Returns the new version number after appending
    pub async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<EventEnvelope<E>>,
    ) -> Result<i64, StoreError> {
        if events.is_empty() {
            return Err(StoreError::EmptyAppend);
        }

        let mut streams = self.streams.write().await;
        let stream = streams.entry(aggregate_id).or_default();

        let current_version = stream.last().map(|e| e.sequence_number).unwrap_or(0);
        if current_version != expected_version {
            return Err(StoreError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual: current_version,
            });
        }

        let mut new_version = expected_version;
        for envelope in &events {
            new_version += 1;
            if envelope.sequence_number != new_version {
                return Err(StoreError::SequenceGap {
                    aggregate_id,
                    expected: new_version,
                    actual: envelope.sequence_number,
                });
            }
        }

        let event_count = events.len();
        stream.extend(events);

        tracing::debug!(
            aggregate_id = %aggregate_id,
            aggregate_type = %self.aggregate_type_name,
            new_version = new_version,
            event_count = event_count,
            "Appended events to event store"
        );

        Ok(new_version)
    }

    /// Load all events for an aggregate, oldest first
    pub async fn load_events(&self, aggregate_id: Uuid) -> Vec<EventEnvelope<E>> {
        let streams = self.streams.read().await;
        streams.get(&aggregate_id).cloned().unwrap_or_default()
    }


    /// Load aggregate from events
    pub async fn load_aggregate<A>(&self, aggregate_id: Uuid) -> Result<A, StoreError>
    where
        A: Aggregate<Event = E>,
        <A as Aggregate>::Error: std::fmt::Display,
    {
        let events = self.load_events(aggregate_id).await;

        if events.is_empty() {
            return Err(StoreError::AggregateNotFound(aggregate_id));
        }

        tracing::debug!("Loaded {} events for aggregate {}", events.len(), aggregate_id);

        A::load_from_events(&events).map_err(|e| StoreError::Replay {
            aggregate_id,
            reason: e.to_string(),
        })
    }

    /// Rebuild every aggregate in the store from its own stream
    pub async fn load_all<A>(&self) -> Result<Vec<A>, StoreError>
    where
        A: Aggregate<Event = E>,
        <A as Aggregate>::Error: std::fmt::Display,
    {
        let streams = self.streams.read().await;
        let mut aggregates = Vec::with_capacity(streams.len());

        for (aggregate_id, events) in streams.iter() {
            if events.is_empty() {
                continue;
            }
            let aggregate = A::load_from_events(events).map_err(|e| StoreError::Replay {
                aggregate_id: *aggregate_id,
                reason: e.to_string(),
            })?;
            aggregates.push(aggregate);
        }

        Ok(aggregates)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Clone, Debug)]
    enum CounterEvent {
        Opened,
        Bumped(i64),
    }

    impl DomainEvent for CounterEvent {
        fn event_name(&self) -> &'static str {
            match self {
                CounterEvent::Opened => "CounterOpened",
                CounterEvent::Bumped(_) => "CounterBumped",
            }
        }
    }

    #[derive(Debug)]
    struct Counter {
        id: Uuid,
        version: i64,
        total: i64,
    }

    impl Aggregate for Counter {
        type Event = CounterEvent;
        type Command = i64;
        type Error = String;

        fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
            match event {
                CounterEvent::Opened => Ok(Self { id: Uuid::nil(), version: 0, total: 0 }),
                _ => Err("not opened".to_string()),
            }
        }

        fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
            if let CounterEvent::Bumped(n) = event {
                self.total += n;
            }
            Ok(())
        }

        fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
            Ok(vec![CounterEvent::Bumped(*command)])
        }

        fn aggregate_id(&self) -> Uuid {
            self.id
        }

        fn version(&self) -> i64 {
            self.version
        }

        fn set_version(&mut self, version: i64) {
            self.version = version;
        }
    }

    fn envelope(id: Uuid, seq: i64, event: CounterEvent) -> EventEnvelope<CounterEvent> {
        let name = event.event_name().to_string();
        EventEnvelope::new(id, seq, name, event, Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_append_and_load_roundtrip() {
        let store = EventStore::<CounterEvent>::new("Counter");
        let id = Uuid::new_v4();

        let v = store
            .append_events(id, 0, vec![envelope(id, 1, CounterEvent::Opened), envelope(id, 2, CounterEvent::Bumped(5))])
            .await
            .unwrap();
        assert_eq!(v, 2);
        assert_eq!(store.load_events(id).await.len(), 2);

        let counter: Counter = store.load_aggregate(id).await.unwrap();
        assert_eq!(counter.total, 5);
        assert_eq!(counter.version, 2);
    }

    #[tokio::test]
    async fn test_stale_expected_version_is_rejected() {
        let store = EventStore::<CounterEvent>::new("Counter");
        let id = Uuid::new_v4();
        store.append_events(id, 0, vec![envelope(id, 1, CounterEvent::Opened)]).await.unwrap();
        store.append_events(id, 1, vec![envelope(id, 2, CounterEvent::Bumped(1))]).await.unwrap();

        let result = store
            .append_events(id, 1, vec![envelope(id, 2, CounterEvent::Bumped(1))])
            .await;

        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict { expected: 1, actual: 2, .. })
        ));
        assert_eq!(store.load_events(id).await.last().map(|e| e.sequence_number), Some(2));
    }

    #[tokio::test]
    async fn test_sequence_gap_is_rejected() {
        let store = EventStore::<CounterEvent>::new("Counter");
        let id = Uuid::new_v4();

        let result = store.append_events(id, 0, vec![envelope(id, 2, CounterEvent::Opened)]).await;
        assert!(matches!(result, Err(StoreError::SequenceGap { expected: 1, actual: 2, .. })));
        assert!(store.load_events(id).await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_append_and_missing_aggregate() {
        let store = EventStore::<CounterEvent>::new("Counter");
        let id = Uuid::new_v4();

        assert!(matches!(store.append_events(id, 0, vec![]).await, Err(StoreError::EmptyAppend)));
        assert!(matches!(
            store.load_aggregate::<Counter>(id).await,
            Err(StoreError::AggregateNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_load_all_rebuilds_every_stream() {
        let store = EventStore::<CounterEvent>::new("Counter");
        for n in 1..=3 {
            let id = Uuid::new_v4();
            store
                .append_events(id, 0, vec![envelope(id, 1, CounterEvent::Opened), envelope(id, 2, CounterEvent::Bumped(n))])
                .await
                .unwrap();
        }

        let all: Vec<Counter> = store.load_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all.iter().map(|c| c.total).sum::<i64>(), 6);
    }
}
