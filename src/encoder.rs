//! Escaped encoding of the parameter section of a request.
//!
//! Each `(id, value)` pair is written as:
//!
//! | Bytes | Present when | Meaning |
//! |-------|--------------|---------|
//! | `0xFF hi` | `id >> 8 != 0` | high byte of the parameter ID |
//! | `0xFE len` | value longer than 1 byte | number of value bytes |
//! | `lo` | always | low byte of the parameter ID |
//! | value | always (may be empty) | value bytes |
//!
//! An empty value means "read this parameter".
//!
//! # Example
//!
//! ```
//! use ecovent::{encode_parameters, ParamRequest};
//!
//! let bytes = encode_parameters(&[
//!     ParamRequest::write(0x0001, vec![0x01]),
//!     ParamRequest::read(0x0302),
//! ]).unwrap();
//! assert_eq!(bytes, vec![0x01, 0x01, 0xFF, 0x03, 0x02]);
//! ```

use crate::error::{Result, VentError};
use crate::params::PARAMETERS;

/// Marker: next byte is the high byte of the parameter ID.
pub const MARKER_HIGH_BYTE: u8 = 0xFF;
/// Marker: next byte is the number of value bytes.
pub const MARKER_VALUE_LENGTH: u8 = 0xFE;
/// Marker: device-reserved, next byte names an unsupported parameter.
pub const MARKER_UNSUPPORTED: u8 = 0xFD;

/// Weekly schedule setup, the one parameter with a default request value.
pub const WEEKLY_SCHEDULE_SETUP: u16 = 0x0077;

/// One parameter of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamRequest {
    /// Parameter ID.
    pub id: u16,
    /// Value bytes; empty for a read.
    pub value: Vec<u8>,
}

impl ParamRequest {
    /// A read of `id`.
    pub fn read(id: u16) -> Self {
        Self {
            id,
            value: Vec::new(),
        }
    }

    /// A write of `value` to `id`.
    pub fn write(id: u16, value: Vec<u8>) -> Self {
        Self { id, value }
    }
}

/// Returns the value sent for `id` when the caller supplies none.
///
/// Only the weekly schedule setup has one: `01 01` selects day 1, slot 1. The
/// override applies to that single pair and never leaks into the next one.
pub fn default_value_for(id: u16) -> Option<&'static [u8]> {
    match id {
        WEEKLY_SCHEDULE_SETUP => Some(&[0x01, 0x01]),
        _ => None,
    }
}

fn effective_value(request: &ParamRequest) -> &[u8] {
    match default_value_for(request.id) {
        Some(default) if request.value.is_empty() => default,
        _ => &request.value,
    }
}

/// Appends one escaped `(id, value)` pair to `out`.
///
/// # Errors
///
/// Returns `VentError::InvalidParameter` if the low byte of `id` is one of the
/// escape markers, or if `value` is longer than 255 bytes.
pub fn encode_parameter(out: &mut Vec<u8>, id: u16, value: &[u8]) -> Result<()> {
    let high = (id >> 8) as u8;
    let low = (id & 0xFF) as u8;

    if low >= MARKER_UNSUPPORTED {
        return Err(VentError::invalid_parameter(
            format!("0x{:04X}", id),
            "low byte collides with an escape marker",
        ));
    }
    if value.len() > u8::MAX as usize {
        return Err(VentError::invalid_parameter(
            format!("0x{:04X}", id),
            format!("value must not exceed {} bytes", u8::MAX),
        ));
    }

    if high != 0 {
        out.push(MARKER_HIGH_BYTE);
        out.push(high);
    }
    if value.len() > 1 {
        out.push(MARKER_VALUE_LENGTH);
        out.push(value.len() as u8);
    }
    out.push(low);
    out.extend_from_slice(value);
    Ok(())
}

/// Encodes a batch of parameters in order.
///
/// # Errors
///
/// See [`encode_parameter`].
pub fn encode_parameters(params: &[ParamRequest]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(params.len() * 2);
    for request in params {
        encode_parameter(&mut out, request.id, effective_value(request))?;
    }
    Ok(out)
}

/// Read requests for every readable parameter, in registry order.
pub fn read_all_requests() -> Vec<ParamRequest> {
    PARAMETERS.iter().map(|p| ParamRequest::read(p.id)).collect()
}

/// Encodes a read of every readable parameter.
///
/// # Errors
///
/// Only fails if the registry contains an unencodable ID.
pub fn encode_read_all() -> Result<Vec<u8>> {
    encode_parameters(&read_all_requests())
}
