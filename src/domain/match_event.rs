//! Match events for external subscribers (analytics, audit).

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::domain::signature::RequestSignature;

/// Emitted on every positive match, before conditions are evaluated.
///
/// Dry-run requests do not emit events.
#[derive(Debug, Clone)]
pub struct MatchEvent {
    pub rule_id: i64,
    pub signature: RequestSignature,
    pub matched_at: DateTime<Utc>,
}

impl MatchEvent {
    pub fn new(rule_id: i64, signature: RequestSignature) -> Self {
        Self {
            rule_id,
            signature,
            matched_at: Utc::now(),
        }
    }
}

/// Fire-and-forget fan-out of [`MatchEvent`]s.
///
/// Publishing never blocks: with no subscribers the event is dropped, and a
/// subscriber that falls behind loses the oldest events.
#[derive(Debug, Clone)]
pub struct MatchEventBus {
    sender: broadcast::Sender<MatchEvent>,
}

impl MatchEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MatchEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: MatchEvent) {
        // Err only means nobody is listening.
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
