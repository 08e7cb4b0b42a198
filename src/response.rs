//! Response parameter section parser.
//!
//! The parameter section of a response is a continuous stream of records using
//! the same escapes as requests (see [`encoder`](crate::encoder)):
//!
//! ```text
//! [0xFF hi] [0xFE len] lo value...      one record
//! [0xFF hi] 0xFD lo                     parameter not supported by the device
//! ```
//!
//! Markers are only recognised where a parameter ID is expected. Once the low
//! ID byte has been read, the declared number of value bytes (1 by default) is
//! taken verbatim, so values may contain `0xFD`-`0xFF`.
//!
//! # Example
//!
//! ```
//! use ecovent::parse_payload;
//!
//! // state = 1, battery_voltage = [0x01, 0x02], night_mode_timer = [0x1E, 0x08]
//! let payload = [
//!     0x01, 0x01,
//!     0xFE, 0x02, 0x24, 0x01, 0x02,
//!     0xFF, 0x03, 0xFE, 0x02, 0x02, 0x1E, 0x08,
//! ];
//! let parsed = parse_payload(&payload).unwrap();
//!
//! let ids: Vec<u16> = parsed.records.iter().map(|r| r.id).collect();
//! assert_eq!(ids, vec![0x0001, 0x0024, 0x0302]);
//! assert_eq!(parsed.records[1].value, vec![0x01, 0x02]);
//! ```

use crate::encoder::{MARKER_HIGH_BYTE, MARKER_UNSUPPORTED, MARKER_VALUE_LENGTH};
use crate::error::{Result, VentError};

/// One `(parameter ID, raw value)` unit of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRecord {
    /// Parameter ID.
    pub id: u16,
    /// Raw value bytes, in wire order.
    pub value: Vec<u8>,
}

/// Everything extracted from one response parameter section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPayload {
    /// Records in the order they appeared.
    pub records: Vec<ParameterRecord>,
    /// IDs the device flagged as not supported.
    pub unsupported: Vec<u16>,
}

impl ParsedPayload {
    /// Returns the record for `id`, if present.
    pub fn record(&self, id: u16) -> Option<&ParameterRecord> {
        self.records.iter().find(|r| r.id == id)
    }
}

/// Item produced by [`ResponseParser::push`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    /// A complete record.
    Record(ParameterRecord),
    /// The device does not support this ID.
    Unsupported(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    ExpectIdOrEscape,
    GotHighMarker,
    GotLengthMarker,
    GotUnsupportedMarker,
    Value { id: u16, remaining: usize },
}

/// Byte-at-a-time parser for a response parameter section.
///
/// The parser owns its working buffers, so independent parsers can run on
/// different threads.
#[derive(Debug, Clone)]
pub struct ResponseParser {
    state: State,
    ext_high_byte: u8,
    value_len: usize,
    prefix_pending: bool,
    value: Vec<u8>,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseParser {
    /// Creates a parser waiting for the first parameter ID.
    pub fn new() -> Self {
        Self {
            state: State::ExpectIdOrEscape,
            ext_high_byte: 0,
            value_len: 1,
            prefix_pending: false,
            value: Vec::new(),
        }
    }

    fn reset_record(&mut self) {
        self.state = State::ExpectIdOrEscape;
        self.ext_high_byte = 0;
        self.value_len = 1;
        self.prefix_pending = false;
    }

    fn current_id(&self, low: u8) -> u16 {
        u16::from(self.ext_high_byte) << 8 | u16::from(low)
    }

    fn finish_record(&mut self, id: u16) -> ParseEvent {
        let value = std::mem::take(&mut self.value);
        self.reset_record();
        ParseEvent::Record(ParameterRecord { id, value })
    }

    /// Feeds one byte. Returns an event when a record or unsupported marker completes.
    pub fn push(&mut self, byte: u8) -> Option<ParseEvent> {
        match self.state {
            State::ExpectIdOrEscape => match byte {
                MARKER_HIGH_BYTE => {
                    self.state = State::GotHighMarker;
                    self.prefix_pending = true;
                    None
                }
                MARKER_VALUE_LENGTH => {
                    self.state = State::GotLengthMarker;
                    self.prefix_pending = true;
                    None
                }
                MARKER_UNSUPPORTED => {
                    self.state = State::GotUnsupportedMarker;
                    self.prefix_pending = true;
                    None
                }
                low => {
                    let id = self.current_id(low);
                    if self.value_len == 0 {
                        return Some(self.finish_record(id));
                    }
                    self.value.clear();
                    self.state = State::Value {
                        id,
                        remaining: self.value_len,
                    };
                    None
                }
            },
            State::GotHighMarker => {
                self.ext_high_byte = byte;
                self.state = State::ExpectIdOrEscape;
                None
            }
            State::GotLengthMarker => {
                self.value_len = usize::from(byte);
                self.state = State::ExpectIdOrEscape;
                None
            }
            State::GotUnsupportedMarker => {
                let id = self.current_id(byte);
                self.reset_record();
                Some(ParseEvent::Unsupported(id))
            }
            State::Value { id, remaining } => {
                self.value.push(byte);
                if remaining == 1 {
                    Some(self.finish_record(id))
                } else {
                    self.state = State::Value {
                        id,
                        remaining: remaining - 1,
                    };
                    None
                }
            }
        }
    }

    /// Returns whether the parser sits between records.
    pub fn is_idle(&self) -> bool {
        self.state == State::ExpectIdOrEscape && !self.prefix_pending
    }

    /// Checks that the stream did not end inside a record.
    ///
    /// # Errors
    ///
    /// Returns `VentError::MalformedFrame` if a record was left incomplete.
    pub fn finish(&self) -> Result<()> {
        match &self.state {
            State::Value { id, remaining } => Err(VentError::malformed(format!(
                "record 0x{:04X} truncated: {} value byte(s) missing",
                id, remaining
            ))),
            _ if !self.is_idle() => Err(VentError::malformed(
                "parameter section ends inside an escape sequence",
            )),
            _ => Ok(()),
        }
    }
}

/// Parses a whole parameter section.
///
/// # Errors
///
/// Returns `VentError::MalformedFrame` if the section ends mid-record. Nothing
/// is returned for a truncated section, so it is never partially applied.
pub fn parse_payload(payload: &[u8]) -> Result<ParsedPayload> {
    let mut parser = ResponseParser::new();
    let mut parsed = ParsedPayload::default();

    for &byte in payload {
        match parser.push(byte) {
            Some(ParseEvent::Record(record)) => parsed.records.push(record),
            Some(ParseEvent::Unsupported(id)) => {
                log::debug!("device reports parameter 0x{:04X} as unsupported", id);
                parsed.unsupported.push(id);
            }
            None => {}
        }
    }
    parser.finish()?;

    Ok(parsed)
}
