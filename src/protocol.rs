//! Serial command/telemetry protocol.
//!
//! The wire format is plain ASCII with no acknowledgement or checksum:
//!
//! | Direction | Bytes | Meaning |
//! |-----------|-------|---------|
//! | host → plotter | `M <left> <right>\n` | move both axes to absolute step targets |
//! | host → plotter | `T` | telemetry request, a single byte, no newline |
//! | plotter → host | `<left>,<right>\n` | current step positions |
//!
//! Malformed lines are dropped silently. Target values are 32-bit signed
//! integers on the wire and are not range-checked.
//!
//! # Example
//!
//! ```rust
//! use ploptart::protocol::{decode_move, format_telemetry, CommandReader};
//! use ploptart::Command;
//!
//! assert_eq!(decode_move("M 100 -100").unwrap().as_slice(), &[100, -100]);
//! assert!(decode_move("M 10").is_none());
//!
//! let mut reader = CommandReader::new(2, 64);
//! assert_eq!(reader.push(b'T'), Some(Command::Telemetry));
//!
//! assert_eq!(format_telemetry(&[100, -100]).as_str(), "100,-100\n");
//! ```

use core::fmt::Write;

use heapless::String as HString;
use heapless::Vec as HVec;

use crate::commands::{Command, Targets};
use crate::config::{MAX_AXES, MAX_LINE_LEN, PLOTTER_AXES};

/// Room for [`MAX_AXES`] signed 64-bit values plus separators.
pub const MAX_REPLY_LEN: usize = 96;

/// One formatted telemetry reply, newline included.
pub type TelemetryLine = HString<MAX_REPLY_LEN>;

/// One encoded move command, newline included.
pub type MoveLine = HString<MAX_REPLY_LEN>;

const MOVE_PREFIX: &str = "M";
const TELEMETRY_BYTE: u8 = b'T';

// ============================================================================
// Decoding
// ============================================================================

/// Decode a two-axis move line, `M <i32> <i32>`.
///
/// Surrounding whitespace and a trailing `\r` are ignored. Anything else
/// (wrong token count, non-integer or out-of-range fields) yields `None`.
pub fn decode_move(line: &str) -> Option<Targets> {
    decode_move_for(line, PLOTTER_AXES)
}

/// Decode a move line carrying exactly `axis_count` targets.
///
/// ```rust
/// use ploptart::protocol::decode_move_for;
///
/// assert_eq!(decode_move_for("M 1 2 3", 3).unwrap().as_slice(), &[1, 2, 3]);
/// assert!(decode_move_for("M 1 2 3", 2).is_none());
/// assert!(decode_move_for("M 1 2.5", 2).is_none());
/// ```
pub fn decode_move_for(line: &str, axis_count: usize) -> Option<Targets> {
    if axis_count == 0 || axis_count > MAX_AXES {
        return None;
    }
    let mut tokens = line.split_ascii_whitespace();
    if tokens.next()? != MOVE_PREFIX {
        return None;
    }
    let mut targets = Targets::new();
    for token in tokens {
        let value: i32 = token.parse().ok()?;
        targets.push(i64::from(value)).ok()?;
    }
    (targets.len() == axis_count).then_some(targets)
}

/// Decode a complete line into a [`Command`].
///
/// A line consisting of a lone `T` is treated as a telemetry request.
pub fn decode_line(line: &str, axis_count: usize) -> Option<Command> {
    if line.trim() == "T" {
        return Some(Command::Telemetry);
    }
    decode_move_for(line, axis_count).map(Command::Move)
}

// ============================================================================
// Framing
// ============================================================================

/// Byte-stream framer for the command protocol.
///
/// Feed every received byte to [`push`](Self::push). A `T` at the start of
/// a line is a complete telemetry request on its own; any other byte is
/// buffered until `\n`. A `T` that arrives mid-line is ordinary line
/// content. Lines longer than the configured capacity are dropped up to the
/// next newline.
#[derive(Debug)]
pub struct CommandReader {
    buffer: HVec<u8, MAX_LINE_LEN>,
    capacity: usize,
    axis_count: usize,
    discarding: bool,
}

impl CommandReader {
    /// Create a framer for `axis_count` axes holding at most `line_capacity`
    /// bytes per line (capped at [`MAX_LINE_LEN`]).
    pub fn new(axis_count: usize, line_capacity: usize) -> Self {
        Self {
            buffer: HVec::new(),
            capacity: line_capacity.clamp(1, MAX_LINE_LEN),
            axis_count,
            discarding: false,
        }
    }

    /// Feed one byte. Returns a command once one is complete.
    pub fn push(&mut self, byte: u8) -> Option<Command> {
        if self.discarding {
            if byte == b'\n' {
                self.discarding = false;
            }
            return None;
        }

        match byte {
            TELEMETRY_BYTE if self.buffer.is_empty() => Some(Command::Telemetry),
            b'\n' => {
                let command = self.decode_buffer();
                self.buffer.clear();
                command
            }
            _ => {
                if self.buffer.len() >= self.capacity || self.buffer.push(byte).is_err() {
                    log::warn!(
                        "command line longer than {} bytes, discarding",
                        self.capacity
                    );
                    self.buffer.clear();
                    self.discarding = true;
                }
                None
            }
        }
    }

    /// True while part of a line has been buffered.
    pub fn is_mid_line(&self) -> bool {
        !self.buffer.is_empty() || self.discarding
    }

    /// Drop any partial line.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }

    fn decode_buffer(&self) -> Option<Command> {
        let Ok(line) = core::str::from_utf8(&self.buffer) else {
            log::trace!("ignoring non-ASCII line");
            return None;
        };
        if line.trim().is_empty() {
            return None;
        }
        let command = decode_move_for(line, self.axis_count).map(Command::Move);
        if command.is_none() {
            log::trace!("ignoring malformed line {:?}", line);
        }
        command
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Format positions as a telemetry reply, `<p0>,<p1>\n`.
pub fn format_telemetry(positions: &[i64]) -> TelemetryLine {
    let mut line = TelemetryLine::new();
    for (i, position) in positions.iter().take(MAX_AXES).enumerate() {
        if i > 0 {
            let _ = line.push(',');
        }
        // MAX_REPLY_LEN holds MAX_AXES full-width values.
        let _ = write!(line, "{}", position);
    }
    let _ = line.push('\n');
    line
}

/// Host side: encode a move command, `M <p0> <p1>\n`.
///
/// ```rust
/// use ploptart::protocol::encode_move;
///
/// assert_eq!(encode_move(&[4095, -2048]).as_str(), "M 4095 -2048\n");
/// ```
pub fn encode_move(targets: &[i64]) -> MoveLine {
    let mut line = MoveLine::new();
    let _ = line.push_str(MOVE_PREFIX);
    for target in targets.iter().take(MAX_AXES) {
        let _ = write!(line, " {}", target);
    }
    let _ = line.push('\n');
    line
}

/// Host side: parse a telemetry reply back into positions.
pub fn parse_telemetry(line: &str) -> Option<Targets> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let mut positions = Targets::new();
    for field in line.split(',') {
        positions.push(field.trim().parse().ok()?).ok()?;
    }
    Some(positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(reader: &mut CommandReader, bytes: &[u8]) -> Option<Command> {
        let mut last = None;
        for byte in bytes {
            if let Some(command) = reader.push(*byte) {
                last = Some(command);
            }
        }
        last
    }

    // =========================================================================
    // decode_move
    // =========================================================================

    #[test]
    fn decode_move_valid() {
        assert_eq!(decode_move("M 100 -100").unwrap().as_slice(), &[100, -100]);
    }

    #[test]
    fn decode_move_tolerates_whitespace_and_cr() {
        assert_eq!(decode_move("  M\t5   6 \r").unwrap().as_slice(), &[5, 6]);
    }

    #[test]
    fn decode_move_wrong_token_count() {
        assert!(decode_move("M 10").is_none());
        assert!(decode_move("M 1 2 3").is_none());
        assert!(decode_move("M").is_none());
        assert!(decode_move("").is_none());
    }

    #[test]
    fn decode_move_bad_prefix() {
        assert!(decode_move("m 1 2").is_none());
        assert!(decode_move("X 1 2").is_none());
        assert!(decode_move("M1 2").is_none());
    }

    #[test]
    fn decode_move_non_integer() {
        assert!(decode_move("M a 2").is_none());
        assert!(decode_move("M 1.0 2").is_none());
    }

    #[test]
    fn decode_move_i32_range() {
        assert_eq!(
            decode_move("M 2147483647 -2147483648").unwrap().as_slice(),
            &[i64::from(i32::MAX), i64::from(i32::MIN)]
        );
        assert!(decode_move("M 2147483648 0").is_none());
    }

    #[test]
    fn decode_move_for_rejects_unsupported_axis_count() {
        assert!(decode_move_for("M", 0).is_none());
        assert!(decode_move_for("M 1 2 3 4 5", 5).is_none());
    }

    #[test]
    fn decode_line_telemetry_and_move() {
        assert_eq!(decode_line("T", 2), Some(Command::Telemetry));
        assert_eq!(
            decode_line("M 1 2", 2),
            Some(Command::Move(Targets::from_slice(&[1, 2]).unwrap()))
        );
        assert_eq!(decode_line("garbage", 2), None);
    }

    // =========================================================================
    // CommandReader
    // =========================================================================

    #[test]
    fn reader_frames_move_on_newline() {
        let mut reader = CommandReader::new(2, MAX_LINE_LEN);
        for byte in b"M 3 4" {
            assert_eq!(reader.push(*byte), None);
        }
        assert!(reader.is_mid_line());
        assert_eq!(
            reader.push(b'\n'),
            Some(Command::Move(Targets::from_slice(&[3, 4]).unwrap()))
        );
        assert!(!reader.is_mid_line());
    }

    #[test]
    fn reader_telemetry_needs_no_newline() {
        let mut reader = CommandReader::new(2, MAX_LINE_LEN);
        assert_eq!(reader.push(b'T'), Some(Command::Telemetry));
        assert_eq!(reader.push(b'T'), Some(Command::Telemetry));
        assert!(!reader.is_mid_line());
    }

    #[test]
    fn reader_t_mid_line_is_line_content() {
        let mut reader = CommandReader::new(2, MAX_LINE_LEN);
        assert_eq!(feed(&mut reader, b"M 1T 2\n"), None);
    }

    #[test]
    fn reader_crlf_lines() {
        let mut reader = CommandReader::new(2, MAX_LINE_LEN);
        assert!(matches!(feed(&mut reader, b"M 1 2\r\n"), Some(Command::Move(_))));
        assert_eq!(reader.push(b'T'), Some(Command::Telemetry));
    }

    #[test]
    fn reader_ignores_blank_and_malformed_lines() {
        let mut reader = CommandReader::new(2, MAX_LINE_LEN);
        assert_eq!(feed(&mut reader, b"\n\nM 10\nhello\n"), None);
        assert!(!reader.is_mid_line());
    }

    #[test]
    fn reader_discards_overflowing_line() {
        let mut reader = CommandReader::new(2, 8);
        assert_eq!(feed(&mut reader, b"M 123456 7\n"), None);
        assert!(!reader.is_mid_line());
        // Next line decodes normally.
        assert!(matches!(feed(&mut reader, b"M 1 2\n"), Some(Command::Move(_))));
    }

    #[test]
    fn reader_t_after_overflow_is_discarded() {
        let mut reader = CommandReader::new(2, 4);
        assert_eq!(feed(&mut reader, b"M 1 2"), None);
        assert_eq!(reader.push(b'T'), None);
        assert_eq!(reader.push(b'\n'), None);
        assert_eq!(reader.push(b'T'), Some(Command::Telemetry));
    }

    #[test]
    fn reader_reset_drops_partial_line() {
        let mut reader = CommandReader::new(2, MAX_LINE_LEN);
        feed(&mut reader, b"M 1");
        reader.reset();
        assert_eq!(reader.push(b'T'), Some(Command::Telemetry));
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    #[test]
    fn telemetry_format() {
        assert_eq!(format_telemetry(&[0, 0]).as_str(), "0,0\n");
        assert_eq!(format_telemetry(&[4095, -2048]).as_str(), "4095,-2048\n");
    }

    #[test]
    fn telemetry_format_fits_extremes() {
        let line = format_telemetry(&[i64::MIN; MAX_AXES]);
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches(',').count(), MAX_AXES - 1);
    }

    #[test]
    fn parse_telemetry_reply() {
        assert_eq!(parse_telemetry("12,-7\n").unwrap().as_slice(), &[12, -7]);
        assert!(parse_telemetry("12;7").is_none());
        assert!(parse_telemetry("").is_none());
    }

    #[test]
    fn encoded_move_decodes() {
        let line = encode_move(&[-5, 9]);
        assert_eq!(decode_move(&line).unwrap().as_slice(), &[-5, 9]);
    }
}
