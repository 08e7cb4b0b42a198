//! Error types for the ventilator protocol.

use std::io;
use thiserror::Error;

/// Result type alias for ventilator operations.
pub type Result<T> = std::result::Result<T, VentError>;

/// Errors that can occur while talking to a ventilation unit.
///
/// Only [`VentError::MalformedFrame`] and transport failures invalidate a whole
/// response. Decode errors ([`VentError::UnknownParameterId`],
/// [`VentError::EnumDecode`], [`VentError::InvalidValue`]) are reported per
/// record and never stop the rest of a batched response from being applied.
#[derive(Debug, Error)]
pub enum VentError {
    /// No datagram arrived within the configured timeout.
    #[error("Communication timeout")]
    Timeout,

    /// I/O error during communication.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The response envelope is unusable (marker, length, checksum or record stream).
    #[error("Malformed frame: {reason}")]
    MalformedFrame {
        /// Description of what is wrong with the frame.
        reason: String,
    },

    /// A record carried a parameter ID that has no registry entry.
    #[error("Unknown parameter ID 0x{id:04X}")]
    UnknownParameterId {
        /// The 16-bit parameter ID found on the wire.
        id: u16,
    },

    /// A parameter name that is not in the registry.
    #[error("Unknown parameter '{name}'")]
    UnknownParameter {
        /// The name the caller asked for.
        name: String,
    },

    /// A raw value that is not a key of the parameter's enum table.
    #[error("Parameter '{parameter}': raw value 0x{raw:02X} is not a known enum value")]
    EnumDecode {
        /// Name of the parameter being decoded.
        parameter: &'static str,
        /// The raw value read from the device.
        raw: u16,
    },

    /// Raw bytes that a non-enum decoder cannot interpret.
    #[error("Parameter '{parameter}': {reason}")]
    InvalidValue {
        /// Name of the parameter being decoded.
        parameter: &'static str,
        /// Description of why the bytes were rejected.
        reason: String,
    },

    /// A write value that cannot be turned into a raw encoding.
    #[error("Cannot write '{parameter}': {reason}")]
    UnsupportedWriteValue {
        /// Name of the parameter being written.
        parameter: String,
        /// Description of why the value was rejected.
        reason: String,
    },

    /// The device answered with the "not supported" marker for this ID.
    #[error("Parameter 0x{id:04X} is not supported by the device")]
    UnsupportedParameter {
        /// The parameter ID the device rejected.
        id: u16,
    },

    /// Invalid argument provided by the caller.
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the invalid argument.
        parameter: String,
        /// Description of why the argument is invalid.
        reason: String,
    },
}

impl VentError {
    /// Creates a new `MalformedFrame` error.
    ///
    /// # Example
    ///
    /// ```
    /// use ecovent::VentError;
    ///
    /// let err = VentError::malformed("checksum mismatch");
    /// assert_eq!(err.to_string(), "Malformed frame: checksum mismatch");
    /// ```
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedFrame {
            reason: reason.into(),
        }
    }

    /// Creates a new `InvalidValue` error for a decoder failure.
    pub fn invalid_value(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            parameter,
            reason: reason.into(),
        }
    }

    /// Creates a new `UnsupportedWriteValue` error.
    ///
    /// # Example
    ///
    /// ```
    /// use ecovent::VentError;
    ///
    /// let err = VentError::unsupported_write("speed", "unknown label 'turbo'");
    /// assert_eq!(err.to_string(), "Cannot write 'speed': unknown label 'turbo'");
    /// ```
    pub fn unsupported_write(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedWriteValue {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `UnknownParameter` error.
    pub fn unknown_parameter(name: impl Into<String>) -> Self {
        Self::UnknownParameter { name: name.into() }
    }

    /// Creates a new `InvalidParameter` error.
    ///
    /// # Example
    ///
    /// ```
    /// use ecovent::VentError;
    ///
    /// let err = VentError::invalid_parameter("speed", "must be 1-3");
    /// ```
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Returns whether this error only affects a single record of a response.
    ///
    /// Record-local errors are skipped while applying a batched response.
    pub fn is_record_local(&self) -> bool {
        matches!(
            self,
            Self::UnknownParameterId { .. } | Self::EnumDecode { .. } | Self::InvalidValue { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = VentError::Timeout;
        assert_eq!(err.to_string(), "Communication timeout");
    }

    #[test]
    fn test_unknown_id_display() {
        let err = VentError::UnknownParameterId { id: 0x0305 };
        assert_eq!(err.to_string(), "Unknown parameter ID 0x0305");
    }

    #[test]
    fn test_enum_decode_display() {
        let err = VentError::EnumDecode {
            parameter: "speed",
            raw: 0x64,
        };
        assert_eq!(
            err.to_string(),
            "Parameter 'speed': raw value 0x64 is not a known enum value"
        );
    }

    #[test]
    fn test_is_record_local() {
        assert!(VentError::UnknownParameterId { id: 1 }.is_record_local());
        assert!(VentError::invalid_value("rtc_date", "bad month").is_record_local());
        assert!(!VentError::malformed("short").is_record_local());
        assert!(!VentError::Timeout.is_record_local());
    }
}
