//! Command Parser & Dispatcher (component C2).
//!
//! Decodes one complete SLCAN command line (CR already stripped by the
//! Line Splitter) into a [`Command`]. Precondition checks against session
//! state are *not* performed here — they belong to
//! [`crate::session::SessionManager`] — this module only validates
//! grammar, the same split the teacher keeps between `parser.rs` (grammar)
//! and `command.rs` (the command/opcode vocabulary). The opcode table is
//! grounded in `original_source/main/slcan.c::slcanExecuteCommand`.

use crate::error::DecodeError;
use crate::frame::{decode_frame, CanFrame};

/// A parsed SLCAN command, grammar-valid but not yet checked against
/// session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `S<n>` — set standard bitrate. Carries the raw ASCII digit; mapping
    /// to a supported rate (or rejecting it) is the Session Manager's job.
    SetBitrate(u8),
    /// `A<n>` — set auto-retransmission mode (supplemental, see
    /// SPEC_FULL.md §4.3). Carries the raw ASCII digit.
    SetAutoRetransmission(u8),
    /// `O` — open in normal mode.
    Open,
    /// `L` — open in listen-only mode.
    OpenListenOnly,
    /// `C` — close.
    Close,
    /// `t`/`T`/`r`/`R` — transmit a frame.
    Transmit(CanFrame),
    /// `F` — read & clear status flags.
    ReadStatusFlags,
    /// `V` — adapter version.
    Version,
    /// `N` — adapter serial number.
    SerialNumber,
}

/// Parses one complete command line. An empty line or any opcode/operand
/// grammar violation is a [`DecodeError`], which the dispatcher surfaces
/// as a single BEL per spec.md §7.
pub fn parse_command(line: &[u8]) -> Result<Command, DecodeError> {
    let (&opcode, operands) = line.split_first().ok_or(DecodeError::EmptyLine)?;

    match opcode {
        b'S' => {
            let &[digit] = operands else {
                return Err(DecodeError::TooShort);
            };
            Ok(Command::SetBitrate(digit))
        }
        b'A' => {
            let &[digit] = operands else {
                return Err(DecodeError::TooShort);
            };
            Ok(Command::SetAutoRetransmission(digit))
        }
        b'O' if operands.is_empty() => Ok(Command::Open),
        b'L' if operands.is_empty() => Ok(Command::OpenListenOnly),
        b'C' if operands.is_empty() => Ok(Command::Close),
        b't' | b'T' | b'r' | b'R' => Ok(Command::Transmit(decode_frame(line)?)),
        b'F' if operands.is_empty() => Ok(Command::ReadStatusFlags),
        b'V' if operands.is_empty() => Ok(Command::Version),
        b'N' if operands.is_empty() => Ok(Command::SerialNumber),
        b'O' | b'L' | b'C' | b'F' | b'V' | b'N' => Err(DecodeError::TooLong),
        other => Err(DecodeError::UnrecognizedOpcode(other)),
    }
}
