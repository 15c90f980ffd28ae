//! Response Encoder / Egress Serializer (component C5).
//!
//! All outbound bytes — command replies and asynchronous received-frame
//! lines — flow through a single queue as discrete messages, drained by a
//! dedicated actor that ensures at most one transport write is in flight
//! at a time. Grounded in `original_source/main/bt.c`'s `txTask` /
//! `sppWriteLock` / `sppCallback` congestion handling: that code drives a
//! binary `SemaphoreHandle_t` from ESP-IDF callbacks (`ESP_SPP_WRITE_EVT`,
//! `ESP_SPP_CONG_EVT`). DESIGN NOTES §9 asks for this to become a
//! single-writer actor whose state machine is driven by transport
//! notifications through an internal channel instead of a module-level
//! semaphore and "in-flight message" global — that's `EgressSender` below.

use async_trait::async_trait;
use heapless::Vec as HVec;
use tokio::sync::{mpsc, Notify};

/// Max size of one outbound line: the longest frame line the codec
/// produces (matching [`crate::splitter::MAX_CMD_LEN`]) plus the
/// terminating CR this module appends.
pub const MAX_LINE_LEN: usize = crate::splitter::MAX_CMD_LEN + 1;

/// One outbound message. `Ok`/`Error`/`Data` are command responses;
/// `FrameLine` is an asynchronous received-frame notification. The two
/// kinds share this queue per spec.md §3, but only `FrameLine` is
/// permitted to be dropped under back-pressure (§5).
#[derive(Debug, Clone)]
pub enum EgressMessage {
    /// Single CR.
    Ok,
    /// OK-with-data: `data` followed by CR (e.g. the `V0000` / `N<XXYY>`
    /// replies).
    Data(HVec<u8, 16>),
    /// Single BEL.
    Error,
    /// An already-encoded frame line (see [`crate::frame::encode_frame`]),
    /// CR appended here.
    FrameLine(HVec<u8, 32>),
}

impl EgressMessage {
    /// Appends this message's wire bytes to `buf`. Returns `Err(())` and
    /// leaves `buf` unchanged if it wouldn't fit — the caller must not
    /// treat a failed append as "nothing to write", only as "doesn't fit
    /// here, flush and retry in a fresh buffer".
    fn write_into(&self, buf: &mut HVec<u8, MAX_LINE_LEN>) -> Result<(), ()> {
        let mut staged = buf.clone();
        match self {
            EgressMessage::Ok => staged.push(b'\r').map_err(|_| ())?,
            EgressMessage::Error => staged.push(0x07).map_err(|_| ())?,
            EgressMessage::Data(data) => {
                staged.extend_from_slice(data).map_err(|_| ())?;
                staged.push(b'\r').map_err(|_| ())?;
            }
            EgressMessage::FrameLine(line) => {
                staged.extend_from_slice(line).map_err(|_| ())?;
                staged.push(b'\r').map_err(|_| ())?;
            }
        }
        *buf = staged;
        Ok(())
    }
}

/// Result of one write attempt against the serial transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The transport accepted and completed the write.
    Completed,
    /// The transport is backed up; the sender must wait for a
    /// congestion-cleared notification before trying again.
    Congested,
    /// No host is currently connected; the message is discarded.
    NotConnected,
}

/// The serial egress contract from spec.md §6: a byte-buffer sink that may
/// report congestion instead of completing immediately.
#[async_trait]
pub trait SerialEgress: Send {
    async fn write(&mut self, bytes: &[u8]) -> WriteOutcome;
}

/// Sending half of the egress queue. Cloneable so both the command
/// processor and the CAN receive pump can enqueue onto the same queue,
/// each with its own back-pressure discipline (§5: responses block
/// briefly rather than drop; frame lines are dropped and logged).
#[derive(Clone)]
pub struct EgressQueue {
    tx: mpsc::Sender<EgressMessage>,
}

impl EgressQueue {
    /// Enqueues a command response. Blocks (briefly) rather than drop —
    /// responses must never be dropped per spec.md §5.
    pub async fn send_response(&self, msg: EgressMessage) {
        if self.tx.send(msg).await.is_err() {
            tracing::error!("egress channel closed while sending a command response");
        }
    }

    /// Enqueues an asynchronous received-frame line. Dropped (with a log)
    /// if the queue is full, per spec.md §5's back-pressure rule.
    pub fn send_frame_line(&self, msg: EgressMessage) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.tx.try_send(msg) {
            tracing::warn!("serial-out queue full, dropping asynchronous frame line");
        }
    }
}

/// The egress sender actor's internal state, per DESIGN NOTES §9:
/// `idle -> writing -> congested? -> idle`, driven by [`WriteOutcome`]
/// rather than a global semaphore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SenderState {
    Idle,
    Writing,
    Congested,
}

/// Drains the egress queue and drives the transport, one write in flight
/// at a time. Construct with [`egress_channel`] and run with [`EgressSender::run`]
/// as its own task.
pub struct EgressSender<T: SerialEgress> {
    rx: mpsc::Receiver<EgressMessage>,
    transport: T,
    congestion_cleared: std::sync::Arc<Notify>,
    state: SenderState,
}

/// Builds a bounded egress queue and its sender actor. `capacity` is the
/// `BT_TX_QUEUE_LEN`-equivalent knob from [`crate::config::Config`].
pub fn egress_channel<T: SerialEgress>(
    capacity: usize,
    transport: T,
    congestion_cleared: std::sync::Arc<Notify>,
) -> (EgressQueue, EgressSender<T>) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        EgressQueue { tx },
        EgressSender {
            rx,
            transport,
            congestion_cleared,
            state: SenderState::Idle,
        },
    )
}

impl<T: SerialEgress> EgressSender<T> {
    /// Runs until the queue is closed (all [`EgressQueue`] handles dropped).
    /// Coalesces any additional messages already queued when a send-lock
    /// acquisition begins into one bounded write, the way
    /// `original_source/main/bt.c::txTask` batches up to 512 bytes per
    /// SPP write instead of issuing one write per queued message.
    pub async fn run(mut self) {
        while let Some(first) = self.rx.recv().await {
            self.state = SenderState::Writing;

            let mut buf: HVec<u8, MAX_LINE_LEN> = HVec::new();
            first
                .write_into(&mut buf)
                .expect("a single message always fits MAX_LINE_LEN");

            while let Ok(next) = self.rx.try_recv() {
                if next.write_into(&mut buf).is_err() {
                    // Doesn't fit in the coalesced buffer; flush what we
                    // have, then start a fresh buffer with `next` rather
                    // than drop it.
                    self.submit(&buf).await;
                    buf = HVec::new();
                    next.write_into(&mut buf)
                        .expect("a single message always fits MAX_LINE_LEN");
                }
            }

            self.submit(&buf).await;
            self.state = SenderState::Idle;
        }
    }

    async fn submit(&mut self, bytes: &[u8]) {
        loop {
            match self.transport.write(bytes).await {
                WriteOutcome::Completed => return,
                WriteOutcome::NotConnected => {
                    tracing::debug!("serial transport not connected, discarding write");
                    return;
                }
                WriteOutcome::Congested => {
                    self.state = SenderState::Congested;
                    self.congestion_cleared.notified().await;
                    self.state = SenderState::Writing;
                    // Resend: the transport reported that no bytes were
                    // accepted, so loop back and try the same buffer again.
                }
            }
        }
    }
}
