//! Binary CAN frame representation and the ASCII SLCAN codec (component C4).
//!
//! The frame type and the hex lookup table are grounded in
//! `adom_inc_slcan_fd::frame::Can2Frame` and `adom_inc_slcan_fd::command`'s
//! `to_hex_digit`/`standard_id_to_hex`/`extended_id_to_hex`; this crate
//! drops the CAN FD variant the teacher carries (`CanFdFrame`) since the
//! spec's frame model is classic CAN only (DLC 0..=8, no BRS/FD opcodes).

use embedded_can::{ExtendedId, Id, StandardId};

use crate::error::DecodeError;

/// A classic CAN frame: 11-bit (standard) or 29-bit (extended) identifier,
/// an optional remote-transmission-request flag, a data-length code of
/// 0..=8, and up to 8 payload bytes.
///
/// Invariant: `data().len() == dlc as usize` for data frames; remote
/// frames carry no payload on the wire but still report their requested
/// `dlc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    id: Id,
    dlc: u8,
    data: Option<[u8; 8]>,
}

impl CanFrame {
    /// Builds a data frame. Returns `None` if `data.len() > 8`.
    pub fn new_data(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > 8 {
            return None;
        }

        let mut buf = [0u8; 8];
        buf[..data.len()].copy_from_slice(data);

        Some(Self {
            id: id.into(),
            dlc: data.len() as u8,
            data: Some(buf),
        })
    }

    /// Builds a remote frame requesting `dlc` bytes. Returns `None` if
    /// `dlc > 8`.
    pub fn new_remote(id: impl Into<Id>, dlc: u8) -> Option<Self> {
        if dlc > 8 {
            return None;
        }

        Some(Self {
            id: id.into(),
            dlc,
            data: None,
        })
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn dlc(&self) -> u8 {
        self.dlc
    }

    pub fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    pub fn is_remote(&self) -> bool {
        self.data.is_none()
    }

    /// Payload bytes, `None` for remote frames.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_ref().map(|d| &d[..self.dlc as usize])
    }
}

/// Optional fields the caller may ask the encoder to append. Both are
/// off by default, per the open questions recorded in spec.md §9.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Low 16 bits of a millisecond counter, appended as 4 uppercase hex
    /// digits before the terminating CR when set.
    pub timestamp: Option<u16>,
}

const HEX_LUT: &[u8; 16] = b"0123456789ABCDEF";

fn hex_digit(value: u32) -> u8 {
    HEX_LUT[(value & 0xF) as usize]
}

fn hex_decode(byte: u8) -> Result<u8, DecodeError> {
    match byte {
        b'0'..=b'9' => Ok(byte - b'0'),
        b'a'..=b'f' => Ok(byte - b'a' + 10),
        b'A'..=b'F' => Ok(byte - b'A' + 10),
        _ => Err(DecodeError::IllegalHexDigit(byte)),
    }
}

/// Encodes a frame as an SLCAN ASCII line, *without* the terminating CR —
/// the egress serializer (C5) owns framing of the response.
pub fn encode_frame(frame: &CanFrame, opts: EncodeOptions) -> heapless::Vec<u8, 32> {
    let mut out = heapless::Vec::new();

    let opcode = match (frame.is_extended(), frame.is_remote()) {
        (false, false) => b't',
        (true, false) => b'T',
        (false, true) => b'r',
        (true, true) => b'R',
    };
    out.push(opcode).unwrap();

    match frame.id {
        Id::Standard(id) => {
            let raw = id.as_raw() as u32;
            out.push(hex_digit(raw >> 8)).unwrap();
            out.push(hex_digit(raw >> 4)).unwrap();
            out.push(hex_digit(raw)).unwrap();
        }
        Id::Extended(id) => {
            let raw = id.as_raw();
            for shift in [28, 24, 20, 16, 12, 8, 4, 0] {
                out.push(hex_digit(raw >> shift)).unwrap();
            }
        }
    }

    out.push(hex_digit(frame.dlc as u32)).unwrap();

    if let Some(data) = frame.data() {
        for byte in data {
            out.push(hex_digit((*byte >> 4) as u32)).unwrap();
            out.push(hex_digit(*byte as u32)).unwrap();
        }
    }

    if let Some(ts) = opts.timestamp {
        for shift in [12, 8, 4, 0] {
            out.push(hex_digit((ts as u32) >> shift)).unwrap();
        }
    }

    out
}

/// Decodes an SLCAN frame line (opcode + operands, CR already stripped by
/// the line splitter) into a [`CanFrame`]. Inverse of [`encode_frame`]
/// ignoring any timestamp suffix — timestamps are an output-only, opt-in
/// annotation; hosts never send them back to the adapter.
pub fn decode_frame(line: &[u8]) -> Result<CanFrame, DecodeError> {
    if line.is_empty() {
        return Err(DecodeError::EmptyLine);
    }

    let opcode = line[0];
    let extended = matches!(opcode, b'T' | b'R');
    let remote = matches!(opcode, b'r' | b'R');
    if !matches!(opcode, b't' | b'T' | b'r' | b'R') {
        return Err(DecodeError::UnrecognizedOpcode(opcode));
    }

    let id_width = if extended { 8 } else { 3 };
    let rest = &line[1..];

    if rest.len() < id_width + 1 {
        return Err(DecodeError::TooShort);
    }

    let id_hex = &rest[..id_width];
    let dlc_byte = rest[id_width];
    let payload_hex = &rest[id_width + 1..];

    let id: Id = if extended {
        let mut raw = 0u32;
        for &nibble in id_hex {
            raw = (raw << 4) | hex_decode(nibble)? as u32;
        }
        ExtendedId::new(raw)
            .ok_or(DecodeError::ExtendedIdOutOfRange(raw))?
            .into()
    } else {
        let mut raw = 0u16;
        for &nibble in id_hex {
            raw = (raw << 4) | hex_decode(nibble)? as u16;
        }
        StandardId::new(raw)
            .ok_or(DecodeError::StandardIdOutOfRange(raw))?
            .into()
    };

    let dlc = hex_decode(dlc_byte)?;
    if dlc > 8 {
        return Err(DecodeError::IllegalDlc(dlc));
    }

    if remote {
        if !payload_hex.is_empty() {
            return Err(DecodeError::TooLong);
        }
        return Ok(CanFrame::new_remote(id, dlc).expect("dlc already validated <= 8"));
    }

    let expected_hex_len = dlc as usize * 2;
    if payload_hex.len() < expected_hex_len {
        return Err(DecodeError::TooShort);
    }
    if payload_hex.len() > expected_hex_len {
        return Err(DecodeError::TooLong);
    }

    let mut data = [0u8; 8];
    for (i, chunk) in payload_hex.chunks_exact(2).enumerate() {
        data[i] = (hex_decode(chunk[0])? << 4) | hex_decode(chunk[1])?;
    }

    Ok(CanFrame::new_data(id, &data[..dlc as usize]).expect("dlc already validated <= 8"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_standard_data_frame_dlc_zero() {
        let frame = CanFrame::new_data(StandardId::new(0x123).unwrap(), &[]).unwrap();
        let line = encode_frame(&frame, EncodeOptions::default());
        assert_eq!(&line[..], b"t1230");
        assert_eq!(decode_frame(&line).unwrap(), frame);
    }

    #[test]
    fn round_trips_standard_data_frame_dlc_eight() {
        let payload = [0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x02, 0x03, 0x04];
        let frame = CanFrame::new_data(StandardId::new(0x1FF).unwrap(), &payload).unwrap();
        let line = encode_frame(&frame, EncodeOptions::default());
        assert_eq!(decode_frame(&line).unwrap(), frame);
    }

    #[test]
    fn extended_id_all_bits_set_encodes_to_eight_fs() {
        let frame = CanFrame::new_data(ExtendedId::new(0x1FFF_FFFF).unwrap(), &[]).unwrap();
        let line = encode_frame(&frame, EncodeOptions::default());
        assert_eq!(&line[1..9], b"1FFFFFFF");
        assert_eq!(decode_frame(&line).unwrap(), frame);
    }

    #[test]
    fn decodes_extended_data_frame_from_spec_example() {
        let frame = decode_frame(b"T00000ABC4DEADBEEF").unwrap();
        assert_eq!(frame.id(), Id::Extended(ExtendedId::new(0x00000ABC).unwrap()));
        assert_eq!(frame.dlc(), 4);
        assert_eq!(frame.data(), Some(&[0xDE, 0xAD, 0xBE, 0xEF][..]));
    }

    #[test]
    fn decodes_standard_remote_frame() {
        let frame = decode_frame(b"r1230").unwrap();
        assert!(frame.is_remote());
        assert_eq!(frame.dlc(), 0);
        assert_eq!(frame.data(), None);
    }

    #[test]
    fn rejects_dlc_above_eight() {
        assert_eq!(decode_frame(b"t1239"), Err(DecodeError::IllegalDlc(9)));
    }

    #[test]
    fn rejects_mismatched_payload_length() {
        assert_eq!(decode_frame(b"t1232AA"), Err(DecodeError::TooLong));
        assert_eq!(decode_frame(b"t1232A"), Err(DecodeError::TooShort));
    }

    #[test]
    fn rejects_short_lines() {
        assert_eq!(decode_frame(b"t12"), Err(DecodeError::TooShort));
        assert_eq!(decode_frame(b""), Err(DecodeError::EmptyLine));
    }

    #[test]
    fn accepts_lowercase_hex_digits() {
        let frame = decode_frame(b"t1ff1ab").unwrap();
        assert_eq!(frame.id(), Id::Standard(StandardId::new(0x1FF).unwrap()));
        assert_eq!(frame.data(), Some(&[0xAB][..]));
    }

    #[test]
    fn encode_appends_timestamp_when_requested() {
        let frame = CanFrame::new_data(StandardId::new(0x7E8).unwrap(), &[0x41]).unwrap();
        let line = encode_frame(&frame, EncodeOptions { timestamp: Some(0x1234) });
        assert!(line.ends_with(b"1234"));
    }
}
