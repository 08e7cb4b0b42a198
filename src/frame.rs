//! Frame assembly, checksum and response envelope validation.
//!
//! A frame is `marker | header | function | parameter section | checksum`.
//! The checksum covers everything after the marker.
//!
//! ```text
//! +------+------+--------------------+------+-----------------+-------+-------+
//! | 0xFD | 0xFD | type id.. pwd..    | func | parameters ...  | ck_lo | ck_hi |
//! +------+------+--------------------+------+-----------------+-------+-------+
//! ```
//!
//! # Example
//!
//! ```
//! use ecovent::{build_request, encode_parameters, FrameHeader, FunctionCode, ParamRequest};
//!
//! let header = FrameHeader::new("ID", "1").unwrap();
//! let params = encode_parameters(&[ParamRequest::write(0x0001, vec![0x01])]).unwrap();
//! let frame = build_request(FunctionCode::WriteReturn, &params, &header).unwrap();
//!
//! assert_eq!(&frame[..2], &[0xFD, 0xFD]);
//! assert_eq!(&frame[frame.len() - 4..frame.len() - 2], &[0x01, 0x01]);
//! ```

use bytes::BufMut;

use crate::error::{Result, VentError};
use crate::header::{FrameHeader, FunctionCode, FRAME_MARKER};
use crate::response::{parse_payload, ParsedPayload};

/// Size of the trailing checksum in bytes.
pub const CHECKSUM_SIZE: usize = 2;

/// Smallest possible frame: marker, type, two empty length prefixes, function, checksum.
pub const MIN_FRAME_SIZE: usize = FRAME_MARKER.len() + 4 + CHECKSUM_SIZE;

/// Computes the frame checksum.
///
/// Sums all bytes modulo 65536 and swaps the two bytes of the sum. The result
/// is appended big-endian, which puts the low byte of the sum first on the wire.
///
/// # Example
///
/// ```
/// use ecovent::compute_checksum;
///
/// assert_eq!(compute_checksum(&[0x02, 0x00]), 0x0200);
/// assert_eq!(compute_checksum(&[0xFF, 0x02]), 0x0101);
/// ```
pub fn compute_checksum(data: &[u8]) -> u16 {
    data.iter()
        .fold(0u16, |sum, &b| sum.wrapping_add(u16::from(b)))
        .swap_bytes()
}

/// Checks `checksum` against the checksum of `data`.
pub fn verify_checksum(data: &[u8], checksum: u16) -> bool {
    compute_checksum(data) == checksum
}

/// Formats a frame as space-separated lowercase hex, for logs.
///
/// ```
/// use ecovent::format_frame;
///
/// assert_eq!(format_frame(&[0xFD, 0xFD, 0x02]), "fd fd 02");
/// ```
pub fn format_frame(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3);
    for (i, byte) in data.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// Builds a complete request frame.
///
/// `encoded_params` is the output of [`encode_parameters`](crate::encode_parameters).
///
/// # Errors
///
/// Returns `VentError::InvalidParameter` if the header credentials cannot be
/// encoded.
pub fn build_request(
    function: FunctionCode,
    encoded_params: &[u8],
    header: &FrameHeader,
) -> Result<Vec<u8>> {
    let header_bytes = header.to_bytes()?;
    let mut frame = Vec::with_capacity(
        FRAME_MARKER.len() + header_bytes.len() + 1 + encoded_params.len() + CHECKSUM_SIZE,
    );
    frame.put_slice(&FRAME_MARKER);
    frame.put_slice(&header_bytes);
    frame.put_u8(function.code());
    frame.put_slice(encoded_params);

    let checksum = compute_checksum(&frame[FRAME_MARKER.len()..]);
    frame.put_u16(checksum);
    Ok(frame)
}

/// A validated response frame with its envelope removed.
#[derive(Debug, Clone)]
pub struct ResponseFrame {
    /// Device type, identity and password echoed by the device.
    pub header: FrameHeader,
    /// Function code of the frame.
    pub function: FunctionCode,
    /// Escaped parameter section.
    pub payload: Vec<u8>,
}

impl ResponseFrame {
    /// Validates a received datagram and strips its envelope.
    ///
    /// # Errors
    ///
    /// Returns `VentError::MalformedFrame` if the datagram is too short, does
    /// not start with the marker, has a truncated header, an unknown function
    /// code or a checksum mismatch.
    ///
    /// # Example
    ///
    /// ```
    /// use ecovent::{build_request, FrameHeader, FunctionCode, ResponseFrame};
    ///
    /// let header = FrameHeader::new("ID", "1").unwrap();
    /// let bytes = build_request(FunctionCode::Response, &[0x01, 0x01], &header).unwrap();
    ///
    /// let frame = ResponseFrame::from_bytes(&bytes).unwrap();
    /// assert_eq!(frame.function, FunctionCode::Response);
    /// assert_eq!(frame.payload, vec![0x01, 0x01]);
    /// ```
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < MIN_FRAME_SIZE {
            return Err(VentError::malformed(format!(
                "frame too short: expected at least {} bytes, got {}",
                MIN_FRAME_SIZE,
                data.len()
            )));
        }
        if data[..FRAME_MARKER.len()] != FRAME_MARKER {
            return Err(VentError::malformed(format!(
                "bad marker {:02X}{:02X}",
                data[0], data[1]
            )));
        }

        let body_end = data.len() - CHECKSUM_SIZE;
        let body = &data[FRAME_MARKER.len()..body_end];
        let received = u16::from_be_bytes([data[body_end], data[body_end + 1]]);
        if !verify_checksum(body, received) {
            return Err(VentError::malformed(format!(
                "checksum mismatch: expected 0x{:04X}, received 0x{:04X}",
                compute_checksum(body),
                received
            )));
        }

        let (header, used) = FrameHeader::from_bytes(body)?;
        let function = body
            .get(used)
            .ok_or_else(|| VentError::malformed("missing function code"))
            .and_then(|&code| FunctionCode::from_code(code))?;

        Ok(Self {
            header,
            function,
            payload: body[used + 1..].to_vec(),
        })
    }

    /// Rejects frames that are not device responses.
    ///
    /// # Errors
    ///
    /// Returns `VentError::MalformedFrame` if the function is not `resp`.
    pub fn check_response(&self) -> Result<()> {
        if self.function == FunctionCode::Response {
            Ok(())
        } else {
            Err(VentError::malformed(format!(
                "expected function resp, got {}",
                self.function
            )))
        }
    }

    /// Parses the parameter section into records.
    pub fn parameters(&self) -> Result<ParsedPayload> {
        parse_payload(&self.payload)
    }
}
