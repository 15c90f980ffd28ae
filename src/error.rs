//! Error types for the SLCAN protocol core.
//!
//! Mirrors the teacher's habit (see `adom_inc_slcan_fd::parser::MessageParseError`)
//! of one focused `thiserror` enum per layer rather than a single
//! stringly-typed error threaded through everything.

/// Errors produced while decoding an SLCAN frame line (`t`/`T`/`r`/`R`) into
/// a [`crate::frame::CanFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("line too short to contain a complete frame")]
    TooShort,
    #[error("line has trailing bytes beyond the declared DLC")]
    TooLong,
    #[error("hex digit out of range: {0:?}")]
    IllegalHexDigit(u8),
    #[error("DLC out of range (0..=8): {0}")]
    IllegalDlc(u8),
    #[error("standard identifier out of range (0..=0x7FF): {0:#x}")]
    StandardIdOutOfRange(u16),
    #[error("extended identifier out of range (0..=0x1FFFFFFF): {0:#x}")]
    ExtendedIdOutOfRange(u32),
    #[error("declared DLC ({dlc}) does not match the ({bytes}) bytes of payload provided")]
    MismatchedDataLength { dlc: u8, bytes: usize },
    #[error("unrecognized frame opcode: {0:?}")]
    UnrecognizedOpcode(u8),
    #[error("empty command line")]
    EmptyLine,
}

/// Errors produced by the [`crate::session::SessionManager`] when a command
/// is issued in a session state that disallows it, or the underlying CAN
/// driver reports a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("bitrate selection is rejected while the session is open")]
    BitrateWhileOpen,
    #[error("unsupported bitrate code: {0:?}")]
    UnsupportedBitrate(u8),
    #[error("open requires a configured bitrate and a closed session")]
    OpenPrecondition,
    #[error("close requires an open session")]
    ClosePrecondition,
    #[error("transmit requires an open session in normal mode")]
    TransmitPrecondition,
    #[error("status flag command is not yet implemented")]
    NotYetImplemented,
    #[error("unrecognized auto-retransmission mode code: {0:?}")]
    UnsupportedAutoRetransmission(u8),
    #[error("auto-retransmission mode selection is rejected while the session is open")]
    AutoRetransmissionWhileOpen,
    #[error("CAN driver reported a failure: {0}")]
    Driver(#[from] DriverError),
}

/// Errors surfaced by the abstract CAN controller capability (§6 of the spec).
/// The concrete driver implementation lives outside this crate; this core
/// only needs to know whether an operation succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    #[error("CAN driver install failed")]
    InstallFailed,
    #[error("CAN driver start failed")]
    StartFailed,
    #[error("CAN driver stop failed")]
    StopFailed,
    #[error("CAN driver uninstall failed")]
    UninstallFailed,
    #[error("CAN transmit timed out or was rejected by the bus")]
    TransmitFailed,
    #[error("CAN receive failed")]
    ReceiveFailed,
}

/// Top-level error for the bring-up/runner layer that wires queues and
/// tasks together. The protocol core's public API never returns this; it
/// exists so a binary composing this crate has one error type at the edge,
/// the way `adom_inc_slcan_fd::ReadError` composes IO and parse errors.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("CAN driver error: {0}")]
    Driver(#[from] DriverError),
    #[error("session error: {0}")]
    Session(#[from] SessionError),
    #[error("fatal bring-up failure: {0}")]
    BringUp(String),
}
