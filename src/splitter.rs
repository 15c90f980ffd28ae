//! Line Splitter (component C1).
//!
//! Reassembles inbound byte chunks into complete SLCAN command lines
//! terminated by CR, tolerating a trailing LF. Grounded in
//! `original_source/main/slcan.c::slcanRxTask`, which does the same
//! residual-buffer bookkeeping with `memchr`/`memcpy` over a fixed
//! `SLCAN_MAX_CMD_LEN` buffer; this is the bounds-checked, allocation-free
//! Rust equivalent.

use heapless::Vec as HVec;

/// Longest SLCAN command line: an extended data frame with a full 8-byte
/// payload and a 4-digit timestamp (`T` + 8 id hex + 1 dlc + 16 data hex +
/// 4 timestamp hex), matching
/// `original_source/main/slcan.c`'s `SLCAN_MAX_CMD_LEN` derivation.
pub const MAX_CMD_LEN: usize = 1 + 8 + 1 + 16 + 4;

/// Output of feeding one chunk to the splitter: zero or more complete
/// lines (CR stripped), plus whether the residual buffer overflowed and
/// was discarded.
#[derive(Debug, Default)]
pub struct SplitOutcome {
    pub lines: HVec<HVec<u8, MAX_CMD_LEN>, 4>,
    pub overflowed: bool,
}

/// Owns the residual bytes carried over between inbound chunks. Exclusively
/// owned by the Line Splitter per spec.md §3.
pub struct LineSplitter {
    residual: HVec<u8, MAX_CMD_LEN>,
}

impl Default for LineSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSplitter {
    pub fn new() -> Self {
        Self {
            residual: HVec::new(),
        }
    }

    /// Feeds one inbound byte chunk. For each CR found, the bytes from the
    /// residual plus the chunk up to (not including) that CR form one
    /// complete line. If the residual fills to [`MAX_CMD_LEN`] without a CR,
    /// it is dropped and `overflowed` is set — the caller replies with a
    /// single BEL per spec.md §4.1.
    pub fn push(&mut self, chunk: &[u8]) -> SplitOutcome {
        let mut outcome = SplitOutcome::default();
        let mut rest = chunk;

        while let Some(cr_pos) = rest.iter().position(|&b| b == b'\r') {
            let (before_cr, after_cr) = rest.split_at(cr_pos);
            let mut line: HVec<u8, MAX_CMD_LEN> = HVec::new();
            let _ = line.extend_from_slice(&self.residual);
            let pushed_all = line.extend_from_slice(before_cr).is_ok();
            self.residual.clear();

            if pushed_all {
                let _ = outcome.lines.push(line);
            } else {
                outcome.overflowed = true;
            }

            // Skip the CR, then an optional following LF (CRLF tolerance).
            rest = &after_cr[1..];
            if rest.first() == Some(&b'\n') {
                rest = &rest[1..];
            }
        }

        if !rest.is_empty() {
            if self.residual.extend_from_slice(rest).is_err() {
                self.residual.clear();
                outcome.overflowed = true;
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines_as_vecs(outcome: &SplitOutcome) -> Vec<Vec<u8>> {
        outcome.lines.iter().map(|l| l.to_vec()).collect()
    }

    #[test]
    fn splits_a_single_complete_line() {
        let mut splitter = LineSplitter::new();
        let outcome = splitter.push(b"t1230\r");
        assert_eq!(lines_as_vecs(&outcome), vec![b"t1230".to_vec()]);
        assert!(!outcome.overflowed);
    }

    #[test]
    fn tolerates_trailing_lf_after_cr() {
        let mut splitter = LineSplitter::new();
        let outcome = splitter.push(b"t1FF0\r\n");
        assert_eq!(lines_as_vecs(&outcome), vec![b"t1FF0".to_vec()]);
    }

    #[test]
    fn reassembles_a_line_split_across_two_chunks() {
        let mut splitter = LineSplitter::new();
        let first = splitter.push(b"t1F");
        assert!(lines_as_vecs(&first).is_empty());
        let second = splitter.push(b"F0\r");
        assert_eq!(lines_as_vecs(&second), vec![b"t1FF0".to_vec()]);
    }

    #[test]
    fn byte_by_byte_feed_matches_single_chunk_feed() {
        let input = b"S6\rO\rt1230\r";

        let mut whole = LineSplitter::new();
        let whole_lines = lines_as_vecs(&whole.push(input));

        let mut incremental = LineSplitter::new();
        let mut incremental_lines = Vec::new();
        for byte in input {
            incremental_lines.extend(lines_as_vecs(&incremental.push(&[*byte])));
        }

        assert_eq!(whole_lines, incremental_lines);
    }

    #[test]
    fn multiple_commands_in_one_chunk_all_dispatch() {
        let mut splitter = LineSplitter::new();
        let outcome = splitter.push(b"V\rN\r");
        assert_eq!(lines_as_vecs(&outcome), vec![b"V".to_vec(), b"N".to_vec()]);
    }

    #[test]
    fn overflow_drops_residual_and_reports_it() {
        let mut splitter = LineSplitter::new();
        let long = vec![b'A'; MAX_CMD_LEN + 1];
        let outcome = splitter.push(&long);
        assert!(outcome.overflowed);
        assert!(lines_as_vecs(&outcome).is_empty());

        // Splitter resumes normally afterwards.
        let resumed = splitter.push(b"V\r");
        assert_eq!(lines_as_vecs(&resumed), vec![b"V".to_vec()]);
    }
}
