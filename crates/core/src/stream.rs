// crates/core/src/stream.rs
//! Per-subscriber progress stream over the session store.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_stream::Stream;

use crate::coordinator::SubscriptionGuard;
use crate::store::SessionStore;
use crate::types::{ConnectedAck, ProgressSnapshot, StreamEvent};

/// Default cadence at which a subscription polls the store.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Stream the snapshots of one session.
///
/// Yields a [`StreamEvent::Connected`] acknowledgement first, then every
/// snapshot that differs from the one this subscription delivered last,
/// polling every `poll_interval`. The stream ends right after the first
/// terminal snapshot. An unknown session never produces anything past the
/// acknowledgement.
///
/// `guard` is held for the lifetime of the stream, so subscriber tracking
/// is released both on normal termination and when the consumer drops the
/// stream early.
pub fn progress_stream(
    store: Arc<SessionStore>,
    guard: SubscriptionGuard,
    poll_interval: Duration,
) -> impl Stream<Item = StreamEvent> + Send + 'static {
    async_stream::stream! {
        let guard = guard;
        let session_id = guard.session_id().to_owned();
        tracing::debug!(session_id = %session_id, "Progress stream opened");
        yield StreamEvent::Connected(ConnectedAck::new(session_id.clone()));

        let mut last_delivered: Option<ProgressSnapshot> = None;
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let Some(current) = store.get(&session_id) else {
                continue;
            };
            if last_delivered.as_ref() == Some(&current) {
                continue;
            }
            let terminal = current.is_terminal();
            last_delivered = Some(current.clone());
            yield StreamEvent::Snapshot(current);
            if terminal {
                tracing::debug!(session_id = %session_id, "Progress stream reached terminal snapshot");
                break;
            }
        }
        drop(guard);
    }
}
