//! CAN Receive Pump.
//!
//! A single permanently-running task, gated on
//! [`crate::session::SessionManager::pump_signal`] instead of being
//! created and torn down per `O`/`C` pair — the re-expression DESIGN NOTES
//! §9 asks for of the "leftover pump" TODO visible in
//! `original_source/main/slcan.c` (`slcanFramesTxTask`), which the original
//! firmware never cleanly cancels on close.

use std::time::Duration;

use tokio::sync::Notify;

use crate::dispatch::{frame_to_egress_message, SharedSession};
use crate::egress::EgressQueue;
use crate::session::CanDriver;

/// Backoff between `poll_receive` calls while the session is closed, so the
/// pump doesn't spin hot waiting on the signal in the (expected) gap
/// between `Notify::notify_waiters` firing and the task actually parking on
/// `notified()`.
const IDLE_RECHECK: Duration = Duration::from_millis(50);

/// Runs until the `egress` queue is closed. Polls the CAN driver with a
/// bounded timeout (`SessionManager::poll_receive` already applies
/// [`crate::session::DRIVER_TIMEOUT`]) and republishes every received frame
/// as an asynchronous egress line, per spec.md §4.3.
pub async fn run_receive_pump<D: CanDriver>(
    session: SharedSession<D>,
    pump_signal: std::sync::Arc<Notify>,
    egress: EgressQueue,
) {
    loop {
        let is_open = session.lock().await.is_open();
        if !is_open {
            let _ = tokio::time::timeout(IDLE_RECHECK, pump_signal.notified()).await;
            continue;
        }

        let polled = session.lock().await.poll_receive().await;
        match polled {
            Ok(Some(frame)) => {
                egress.send_frame_line(frame_to_egress_message(&frame));
            }
            Ok(None) => {
                // Bounded-wait timeout with nothing to receive; loop and
                // re-check openness.
            }
            Err(err) => {
                tracing::warn!(?err, "CAN receive failed");
            }
        }
    }
}
