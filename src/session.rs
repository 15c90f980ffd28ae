//! Session Manager (component C3).
//!
//! Owns the CAN-controller lifecycle: bitrate selection, mode, the
//! at-most-one-open invariant, and gating of the receive pump. Grounded in
//! `original_source/main/can.c` (`canIsOpen`/`canOpen`/`canClose`/
//! `canTransmit`) and `original_source/main/slcan.c`'s bitrate table
//! (`slcanTimingConfig50K` .. `slcanTimingConfig1M`); the "open = queue
//! non-empty" flag from the original is replaced with the explicit tagged
//! `SessionFsm` enum DESIGN NOTES §9 calls for.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use num_enum::TryFromPrimitive;
use tokio::sync::Notify;

use crate::error::{DriverError, SessionError};
use crate::frame::CanFrame;

/// Bounded-wait timeout applied to every driver transmit/receive call,
/// matching `pdMS_TO_TICKS(100)` used throughout `original_source/main/can.c`.
pub const DRIVER_TIMEOUT: Duration = Duration::from_millis(100);

/// One of the seven bitrates the adapter actually supports, keyed by their
/// `S<n>` ASCII digit exactly as the teacher's `NominalBitRate` is keyed
/// (`adom_inc_slcan_fd::command::NominalBitRate`). `'0'`/`'1'` are valid
/// SLCAN input codes (10/20 kbit/s) but have no variant here — see
/// [`Bitrate::from_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum Bitrate {
    B50K = b'2',
    B100K = b'3',
    B125K = b'4',
    B250K = b'5',
    B500K = b'6',
    B800K = b'7',
    B1M = b'8',
}

impl Bitrate {
    /// Maps an `S<n>` ASCII digit to a supported bitrate, distinguishing
    /// "recognized but unsupported" (`'0'`/`'1'`) from "not a bitrate code
    /// at all" per spec.md §3 — both are rejected, but as the same
    /// [`SessionError::UnsupportedBitrate`] since the Command Parser
    /// already enforces single-digit grammar upstream.
    pub fn from_code(digit: u8) -> Result<Self, SessionError> {
        Self::try_from(digit).map_err(|_| SessionError::UnsupportedBitrate(digit))
    }
}

/// CAN controller mode selected by `O` (normal) or `L` (listen-only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Listen,
}

/// Auto-retransmission policy, supplemental to the distilled spec (see
/// SPEC_FULL.md §4.3). Stored by the session but not acted on by the
/// transmit path — retry policy is a CAN driver concern outside this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum AutoRetransmissionMode {
    Disabled = b'0',
    Enabled = b'1',
}

impl AutoRetransmissionMode {
    pub fn from_code(digit: u8) -> Result<Self, SessionError> {
        Self::try_from(digit).map_err(|_| SessionError::UnsupportedAutoRetransmission(digit))
    }
}

impl Default for AutoRetransmissionMode {
    fn default() -> Self {
        Self::Enabled
    }
}

/// The session FSM from spec.md §3: `Uninitialized -> Configured ->
/// Open-Normal | Open-Listen -> Configured`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionFsm {
    Uninitialized,
    Configured { bitrate: Bitrate },
    Open { bitrate: Bitrate, mode: Mode },
}

/// The abstract CAN controller capability from spec.md §6. The concrete
/// driver (TWAI, SocketCAN, whatever the platform provides) lives outside
/// this crate; install always requests an accept-all filter.
#[async_trait]
pub trait CanDriver: Send {
    async fn install(&mut self, bitrate: Bitrate, mode: Mode) -> Result<(), DriverError>;
    async fn start(&mut self) -> Result<(), DriverError>;
    async fn stop(&mut self) -> Result<(), DriverError>;
    async fn uninstall(&mut self) -> Result<(), DriverError>;
    async fn transmit(&mut self, frame: &CanFrame, timeout: Duration) -> Result<(), DriverError>;
    /// Returns `Ok(None)` on a bounded-wait timeout (no frame available),
    /// `Ok(Some(frame))` on reception, `Err` on a driver-level failure.
    async fn receive(&mut self, timeout: Duration) -> Result<Option<CanFrame>, DriverError>;
}

/// Owns the session FSM, the selected bitrate, the CAN driver handle, and
/// the signal that gates the receive pump (component C3 + the "permanently
/// running pump" design from SPEC_FULL.md §5).
pub struct SessionManager<D: CanDriver> {
    fsm: SessionFsm,
    driver: D,
    auto_retransmission: AutoRetransmissionMode,
    pump_signal: Arc<Notify>,
}

impl<D: CanDriver> SessionManager<D> {
    pub fn new(driver: D) -> Self {
        Self {
            fsm: SessionFsm::Uninitialized,
            driver,
            auto_retransmission: AutoRetransmissionMode::default(),
            pump_signal: Arc::new(Notify::new()),
        }
    }

    /// Handle to the signal the receive pump waits on; it is notified
    /// whenever the session transitions into an Open-* state.
    pub fn pump_signal(&self) -> Arc<Notify> {
        self.pump_signal.clone()
    }

    pub fn is_open(&self) -> bool {
        matches!(self.fsm, SessionFsm::Open { .. })
    }

    pub fn current_mode(&self) -> Option<Mode> {
        match self.fsm {
            SessionFsm::Open { mode, .. } => Some(mode),
            _ => None,
        }
    }

    pub fn auto_retransmission(&self) -> AutoRetransmissionMode {
        self.auto_retransmission
    }

    /// `S<n>` — rejected while Open-*, per spec.md §3.
    pub fn set_bitrate(&mut self, digit: u8) -> Result<(), SessionError> {
        if self.is_open() {
            return Err(SessionError::BitrateWhileOpen);
        }
        let bitrate = Bitrate::from_code(digit)?;
        self.fsm = SessionFsm::Configured { bitrate };
        Ok(())
    }

    /// `A<n>` — supplemental command, same open/closed precondition class
    /// as `S<n>`.
    pub fn set_auto_retransmission(&mut self, digit: u8) -> Result<(), SessionError> {
        if self.is_open() {
            return Err(SessionError::AutoRetransmissionWhileOpen);
        }
        self.auto_retransmission = AutoRetransmissionMode::from_code(digit)?;
        Ok(())
    }

    /// `O`/`L` — requires Configured. Installs the driver with an
    /// accept-all filter, starts it, and wakes the receive pump.
    pub async fn open(&mut self, mode: Mode) -> Result<(), SessionError> {
        let SessionFsm::Configured { bitrate } = self.fsm else {
            return Err(SessionError::OpenPrecondition);
        };

        self.driver.install(bitrate, mode).await?;
        self.driver.start().await?;

        self.fsm = SessionFsm::Open { bitrate, mode };
        self.pump_signal.notify_waiters();
        Ok(())
    }

    /// `C` — requires Open-*. Returns to Configured, preserving the
    /// selected bitrate.
    pub async fn close(&mut self) -> Result<(), SessionError> {
        let SessionFsm::Open { bitrate, .. } = self.fsm else {
            return Err(SessionError::ClosePrecondition);
        };

        self.driver.stop().await?;
        self.driver.uninstall().await?;

        self.fsm = SessionFsm::Configured { bitrate };
        Ok(())
    }

    /// `t`/`T`/`r`/`R` — requires Open-Normal (listen-only may never
    /// transmit).
    pub async fn transmit(&mut self, frame: CanFrame) -> Result<(), SessionError> {
        if self.current_mode() != Some(Mode::Normal) {
            return Err(SessionError::TransmitPrecondition);
        }

        self.driver.transmit(&frame, DRIVER_TIMEOUT).await?;
        Ok(())
    }

    /// `F` — status flags. Unconditionally unimplemented, matching the
    /// `// TODO` branch in `original_source/main/slcan.c`; see
    /// SPEC_FULL.md §4.3 for why this is a deliberate decision rather than
    /// an oversight. Still routed through from the dispatcher like every
    /// other command so the precondition/reply shape stays uniform.
    pub fn read_status_flags(&self) -> Result<u8, SessionError> {
        Err(SessionError::NotYetImplemented)
    }

    /// One bounded-wait poll of the driver, used by the receive pump task.
    /// Returns quiescently (`Ok(None)`) both on a driver timeout and
    /// whenever the session is not Open-*, so the pump never touches the
    /// driver handle while the command processor is mutating it.
    pub async fn poll_receive(&mut self) -> Result<Option<CanFrame>, DriverError> {
        if !self.is_open() {
            return Ok(None);
        }
        self.driver.receive(DRIVER_TIMEOUT).await
    }
}
