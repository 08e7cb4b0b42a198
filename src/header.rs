//! Frame header: device type, identity block and function codes.
//!
//! Every frame, in both directions, starts with the same envelope:
//!
//! | Bytes | Field | Description |
//! |-------|-------|-------------|
//! | 2 | Marker | Always `0xFD 0xFD` |
//! | 1 | Type | Device type (`0x02` for current units) |
//! | 1 | ID size | Length of the identity in bytes |
//! | n | ID | Device identity, raw ASCII bytes |
//! | 1 | PWD size | Length of the password in bytes |
//! | m | PWD | Password, raw ASCII bytes |
//! | 1 | Function | [`FunctionCode`] |
//! | ... | Data | Escaped parameter section |
//! | 2 | Checksum | See [`compute_checksum`](crate::compute_checksum) |
//!
//! This module owns everything between the marker and the parameter section.
//!
//! # Example
//!
//! ```
//! use ecovent::{FrameHeader, FunctionCode};
//!
//! let header = FrameHeader::new("DEFAULT_DEVICEID", "1111").unwrap();
//! let bytes = header.to_bytes().unwrap();
//! assert_eq!(bytes[0], 0x02); // device type
//! assert_eq!(bytes[1], 16);   // identity length
//! assert_eq!(FunctionCode::Read.code(), 0x01);
//! ```

use crate::error::{Result, VentError};

/// Fixed 2-byte marker that starts every frame.
pub const FRAME_MARKER: [u8; 2] = [0xFD, 0xFD];

/// Device type byte of current units.
pub const DEFAULT_DEVICE_TYPE: u8 = 0x02;

/// Identity sentinel the device answers to before its real ID is known.
pub const DEFAULT_IDENTITY: &str = "DEFAULT_DEVICEID";

/// Factory default password.
pub const DEFAULT_PASSWORD: &str = "1111";

/// Function code of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionCode {
    /// Read the listed parameters.
    Read,
    /// Write the listed values; the device does not reply.
    Write,
    /// Write the listed values and reply with the new values.
    WriteReturn,
    /// Increment the listed parameters.
    Increment,
    /// Decrement the listed parameters.
    Decrement,
    /// Device response.
    Response,
}

impl FunctionCode {
    /// Returns the wire value of the function code.
    pub fn code(self) -> u8 {
        match self {
            FunctionCode::Read => 0x01,
            FunctionCode::Write => 0x02,
            FunctionCode::WriteReturn => 0x03,
            FunctionCode::Increment => 0x04,
            FunctionCode::Decrement => 0x05,
            FunctionCode::Response => 0x06,
        }
    }

    /// Parses a wire value.
    ///
    /// # Errors
    ///
    /// Returns `VentError::MalformedFrame` for an unknown code.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0x01 => Ok(FunctionCode::Read),
            0x02 => Ok(FunctionCode::Write),
            0x03 => Ok(FunctionCode::WriteReturn),
            0x04 => Ok(FunctionCode::Increment),
            0x05 => Ok(FunctionCode::Decrement),
            0x06 => Ok(FunctionCode::Response),
            other => Err(VentError::malformed(format!(
                "unknown function code 0x{:02X}",
                other
            ))),
        }
    }

    /// Returns whether the device answers a frame with this function.
    pub fn expects_reply(self) -> bool {
        !matches!(self, FunctionCode::Write | FunctionCode::Response)
    }
}

impl std::fmt::Display for FunctionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FunctionCode::Read => "read",
            FunctionCode::Write => "write",
            FunctionCode::WriteReturn => "write_return",
            FunctionCode::Increment => "inc",
            FunctionCode::Decrement => "dec",
            FunctionCode::Response => "resp",
        };
        f.write_str(name)
    }
}

/// Encodes the identity block: length-prefixed identity then length-prefixed password.
///
/// Both strings travel as their literal bytes.
///
/// # Errors
///
/// Returns `VentError::InvalidParameter` if either string is not ASCII or is
/// longer than 255 bytes.
///
/// # Example
///
/// ```
/// use ecovent::build_identity_block;
///
/// let block = build_identity_block("AB", "1").unwrap();
/// assert_eq!(block, vec![0x02, b'A', b'B', 0x01, b'1']);
/// ```
pub fn build_identity_block(identity: &str, password: &str) -> Result<Vec<u8>> {
    check_credential("identity", identity)?;
    check_credential("password", password)?;

    let mut block = Vec::with_capacity(2 + identity.len() + password.len());
    block.push(identity.len() as u8);
    block.extend_from_slice(identity.as_bytes());
    block.push(password.len() as u8);
    block.extend_from_slice(password.as_bytes());
    Ok(block)
}

fn check_credential(field: &str, value: &str) -> Result<()> {
    if !value.is_ascii() {
        return Err(VentError::invalid_parameter(field, "must be ASCII"));
    }
    if value.len() > u8::MAX as usize {
        return Err(VentError::invalid_parameter(
            field,
            format!("must not exceed {} bytes", u8::MAX),
        ));
    }
    Ok(())
}

/// Device type, identity and password of a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    /// Device type byte.
    pub device_type: u8,
    /// Device identity (16 ASCII characters on real units).
    pub identity: String,
    /// Device password.
    pub password: String,
}

impl FrameHeader {
    /// Creates a header with the default device type.
    ///
    /// # Errors
    ///
    /// Returns `VentError::InvalidParameter` if the identity or password is
    /// not ASCII or longer than 255 bytes.
    pub fn new(identity: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let identity = identity.into();
        let password = password.into();
        check_credential("identity", &identity)?;
        check_credential("password", &password)?;
        Ok(Self {
            device_type: DEFAULT_DEVICE_TYPE,
            identity,
            password,
        })
    }

    /// Sets the device type byte.
    pub fn with_device_type(mut self, device_type: u8) -> Self {
        self.device_type = device_type;
        self
    }

    /// Returns whether the identity is still the discovery sentinel.
    pub fn needs_discovery(&self) -> bool {
        self.identity == DEFAULT_IDENTITY
    }

    /// Serializes device type and identity block.
    ///
    /// # Errors
    ///
    /// Returns `VentError::InvalidParameter` if the fields were changed to a
    /// non-ASCII or overlong credential after construction.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = vec![self.device_type];
        bytes.extend(build_identity_block(&self.identity, &self.password)?);
        Ok(bytes)
    }

    /// Parses a header from the bytes following the marker.
    ///
    /// Returns the header and the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns `VentError::MalformedFrame` if a length prefix runs past the end.
    ///
    /// # Example
    ///
    /// ```
    /// use ecovent::FrameHeader;
    ///
    /// let bytes = [0x02, 0x02, b'I', b'D', 0x01, b'p', 0x06];
    /// let (header, used) = FrameHeader::from_bytes(&bytes).unwrap();
    /// assert_eq!(header.identity, "ID");
    /// assert_eq!(header.password, "p");
    /// assert_eq!(used, 6);
    /// ```
    pub fn from_bytes(data: &[u8]) -> Result<(Self, usize)> {
        let device_type = *data
            .first()
            .ok_or_else(|| VentError::malformed("missing device type"))?;
        let (identity, after_id) = read_prefixed(data, 1, "identity")?;
        let (password, after_pwd) = read_prefixed(data, after_id, "password")?;

        Ok((
            Self {
                device_type,
                identity,
                password,
            },
            after_pwd,
        ))
    }
}

fn read_prefixed(data: &[u8], at: usize, field: &str) -> Result<(String, usize)> {
    let len = *data
        .get(at)
        .ok_or_else(|| VentError::malformed(format!("missing {} length", field)))?
        as usize;
    let start = at + 1;
    let end = start + len;
    let bytes = data.get(start..end).ok_or_else(|| {
        VentError::malformed(format!(
            "{} truncated: declared {} bytes, {} available",
            field,
            len,
            data.len().saturating_sub(start)
        ))
    })?;
    Ok((String::from_utf8_lossy(bytes).into_owned(), end))
}

impl Default for FrameHeader {
    fn default() -> Self {
        Self {
            device_type: DEFAULT_DEVICE_TYPE,
            identity: DEFAULT_IDENTITY.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        }
    }
}
