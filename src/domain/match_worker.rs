//! Background worker that writes match events to the audit log.

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

use crate::domain::match_event::MatchEvent;

/// Logs every [`MatchEvent`] under the `redirect_engine::audit` target until
/// the bus is dropped.
pub async fn run_match_audit(mut rx: broadcast::Receiver<MatchEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                metrics::counter!("redirect_matches_total").increment(1);
                info!(
                    target: "redirect_engine::audit",
                    rule_id = event.rule_id,
                    scheme = %event.signature.scheme,
                    path = %event.signature.path,
                    matched_at = %event.matched_at,
                    "Rule matched"
                );
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Match audit worker lagging, events dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::RequestScheme;
    use crate::domain::match_event::MatchEventBus;
    use crate::domain::signature::RequestSignature;

    #[tokio::test]
    async fn test_worker_stops_when_bus_dropped() {
        let bus = MatchEventBus::new(4);
        let handle = tokio::spawn(run_match_audit(bus.subscribe()));

        bus.publish(MatchEvent::new(
            1,
            RequestSignature::new("/a", RequestScheme::Http, None, ""),
        ));
        drop(bus);

        handle.await.unwrap();
    }
}
