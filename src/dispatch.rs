//! Command Parser & Dispatcher, wiring half (component C2).
//!
//! `command::parse_command` only does grammar; this module enforces
//! preconditions against [`crate::session::SessionManager`] and turns the
//! result into exactly one [`EgressMessage`] per spec.md §4.2/§7 — no
//! partial or cascading responses. Grounded in
//! `original_source/main/slcan.c::slcanExecuteCommand`'s big opcode
//! `switch`, and in the teacher's separation between parsing (`parser.rs`)
//! and the command vocabulary (`command.rs`).

use std::sync::Arc;

use heapless::Vec as HVec;
use tokio::sync::Mutex;

use crate::command::{parse_command, Command};
use crate::config::Config;
use crate::egress::{EgressMessage, EgressQueue};
use crate::frame::{encode_frame, EncodeOptions};
use crate::session::{CanDriver, Mode, SessionManager};
use crate::splitter::LineSplitter;

/// A session shared between the command processor and the CAN receive pump
/// (`pump.rs`) — spec.md §5: "The CAN driver handle is touched only by the
/// command processor and the receive pump; the FSM guarantees the pump is
/// quiescent whenever the command processor mutates driver state." The
/// mutex is the Rust realization of that guarantee: both tasks serialize
/// on it, and `SessionManager::poll_receive` is a no-op whenever the
/// session isn't Open-*, so contention is brief.
pub type SharedSession<D> = Arc<Mutex<SessionManager<D>>>;

/// Literal adapter-version reply, spec.md §6: "Adapter-version reply:
/// literal `V0000`."
const VERSION_REPLY: &[u8] = b"V0000";

fn hex_upper(byte: u8) -> [u8; 2] {
    const LUT: &[u8; 16] = b"0123456789ABCDEF";
    [LUT[(byte >> 4) as usize], LUT[(byte & 0xF) as usize]]
}

fn serial_number_reply(suffix: [u8; 2]) -> HVec<u8, 16> {
    let mut out = HVec::new();
    out.push(b'N').unwrap();
    for byte in suffix {
        let [hi, lo] = hex_upper(byte);
        out.push(hi).unwrap();
        out.push(lo).unwrap();
    }
    out
}

/// Runs the Line Splitter and Command Parser & Dispatcher over one session,
/// publishing replies onto the shared egress queue. One instance per
/// connected host; shares its `SessionManager` with that host's receive
/// pump task (`pump.rs`) through [`SharedSession`].
pub struct CommandProcessor<D: CanDriver> {
    splitter: LineSplitter,
    session: SharedSession<D>,
    egress: EgressQueue,
    config: Config,
}

impl<D: CanDriver> CommandProcessor<D> {
    pub fn new(session: SharedSession<D>, egress: EgressQueue, config: Config) -> Self {
        Self {
            splitter: LineSplitter::new(),
            session,
            egress,
            config,
        }
    }

    /// Feeds one inbound byte chunk through the Line Splitter and dispatches
    /// every complete line it yields, in order — preserving the ordering
    /// guarantee from spec.md §5.
    pub async fn on_ingress(&mut self, chunk: &[u8]) {
        let outcome = self.splitter.push(chunk);

        if outcome.overflowed {
            tracing::warn!("command line overflowed MAX_CMD_LEN, dropping residual");
            self.egress.send_response(EgressMessage::Error).await;
        }

        for line in outcome.lines.iter() {
            self.dispatch_line(line).await;
        }
    }

    async fn dispatch_line(&mut self, line: &[u8]) {
        match parse_command(line) {
            Ok(command) => self.dispatch_command(command).await,
            Err(err) => {
                tracing::debug!(?err, "rejected malformed command line");
                self.egress.send_response(EgressMessage::Error).await;
            }
        }
    }

    async fn dispatch_command(&mut self, command: Command) {
        match command {
            Command::SetBitrate(digit) => {
                let result = self.session.lock().await.set_bitrate(digit);
                self.reply_ok_or_error(result).await;
            }
            Command::SetAutoRetransmission(digit) => {
                let result = self.session.lock().await.set_auto_retransmission(digit);
                self.reply_ok_or_error(result).await;
            }
            Command::Open => {
                let result = self.session.lock().await.open(Mode::Normal).await;
                self.reply_ok_or_error(result).await;
            }
            Command::OpenListenOnly => {
                let result = self.session.lock().await.open(Mode::Listen).await;
                self.reply_ok_or_error(result).await;
            }
            Command::Close => {
                let result = self.session.lock().await.close().await;
                self.reply_ok_or_error(result).await;
            }
            Command::Transmit(frame) => {
                let extended = frame.is_extended();
                let outcome = self.session.lock().await.transmit(frame).await;
                match outcome {
                    // `z`/`Z` on success per spec.md §4.2, not a bare OK.
                    Ok(()) => {
                        let tag = if extended { b'Z' } else { b'z' };
                        let mut reply: HVec<u8, 16> = HVec::new();
                        reply.push(tag).unwrap();
                        self.egress.send_response(EgressMessage::Data(reply)).await;
                    }
                    Err(err) => {
                        tracing::debug!(?err, "transmit rejected");
                        self.egress.send_response(EgressMessage::Error).await;
                    }
                }
            }
            Command::ReadStatusFlags => {
                let result = self.session.lock().await.read_status_flags();
                match result {
                    Ok(flags) => {
                        let mut reply: HVec<u8, 16> = HVec::new();
                        reply.push(b'F').unwrap();
                        let [hi, lo] = hex_upper(flags);
                        reply.push(hi).unwrap();
                        reply.push(lo).unwrap();
                        self.egress.send_response(EgressMessage::Data(reply)).await;
                    }
                    Err(err) => {
                        tracing::debug!(?err, "status-flag command rejected");
                        self.egress.send_response(EgressMessage::Error).await;
                    }
                }
            }
            Command::Version => {
                let mut reply: HVec<u8, 16> = HVec::new();
                reply.extend_from_slice(VERSION_REPLY).unwrap();
                self.egress.send_response(EgressMessage::Data(reply)).await;
            }
            Command::SerialNumber => {
                let reply = serial_number_reply(self.config.serial_number_suffix);
                self.egress.send_response(EgressMessage::Data(reply)).await;
            }
        }
    }

    async fn reply_ok_or_error<E: std::fmt::Debug>(&self, result: Result<(), E>) {
        match result {
            Ok(()) => self.egress.send_response(EgressMessage::Ok).await,
            Err(err) => {
                tracing::debug!(?err, "command rejected");
                self.egress.send_response(EgressMessage::Error).await;
            }
        }
    }
}

/// Re-encodes a received frame as an egress line, used by the receive pump
/// (`pump.rs`) to stay in this module's vocabulary of "how a frame becomes
/// wire bytes".
pub(crate) fn frame_to_egress_message(frame: &crate::frame::CanFrame) -> EgressMessage {
    let line: HVec<u8, 32> = encode_frame(frame, EncodeOptions::default());
    EgressMessage::FrameLine(line)
}
