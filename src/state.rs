//! Decoded device state.
//!
//! A [`DeviceState`] is a plain value owned by the caller: the client returns
//! a fresh one from every exchange and never keeps a shared cache.

use std::collections::BTreeMap;

use crate::error::VentError;
use crate::params::lookup_by_id;
use crate::response::ParsedPayload;
use crate::value::{decode_value, DomainValue};

/// A record that could not be turned into a domain value.
#[derive(Debug)]
pub struct DecodeFailure {
    /// Parameter ID of the record.
    pub id: u16,
    /// Why decoding failed. Always a record-local error.
    pub error: VentError,
}

/// Last-known attributes of a device, keyed by parameter name.
///
/// # Example
///
/// ```
/// use ecovent::{parse_payload, DeviceState, DomainValue};
///
/// // state = on, speed = 0x64 (not a valid speed), humidity = 55
/// let parsed = parse_payload(&[0x01, 0x01, 0x02, 0x64, 0x25, 0x37]).unwrap();
///
/// let mut state = DeviceState::new();
/// assert_eq!(state.apply(&parsed), 2);
/// assert_eq!(state.get("state"), Some(&DomainValue::Label("on")));
/// assert!(state.get("speed").is_none());
/// assert_eq!(state.failures().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct DeviceState {
    values: BTreeMap<&'static str, DomainValue>,
    failures: Vec<DecodeFailure>,
    unsupported: Vec<u16>,
}

impl DeviceState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a state from one parsed response.
    pub fn from_payload(parsed: &ParsedPayload) -> Self {
        let mut state = Self::new();
        state.apply(parsed);
        state
    }

    /// Decodes every record of `parsed` and stores the successes.
    ///
    /// Records that fail to decode are logged, collected in
    /// [`failures`](Self::failures) and skipped; they never stop the rest of
    /// the batch. Returns the number of values stored.
    pub fn apply(&mut self, parsed: &ParsedPayload) -> usize {
        let mut applied = 0;
        for record in &parsed.records {
            let decoded = lookup_by_id(record.id)
                .ok_or(VentError::UnknownParameterId { id: record.id })
                .and_then(|param| decode_value(param, &record.value).map(|v| (param.name, v)));

            match decoded {
                Ok((name, value)) => {
                    self.values.insert(name, value);
                    applied += 1;
                }
                Err(error) => {
                    log::warn!("skipping record 0x{:04X}: {}", record.id, error);
                    self.failures.push(DecodeFailure {
                        id: record.id,
                        error,
                    });
                }
            }
        }
        self.unsupported.extend_from_slice(&parsed.unsupported);
        applied
    }

    /// Returns the value of a parameter, if it was decoded.
    pub fn get(&self, name: &str) -> Option<&DomainValue> {
        self.values.get(name)
    }

    /// Removes and returns the value of a parameter.
    pub fn take(&mut self, name: &str) -> Option<DomainValue> {
        self.values.remove(name)
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &DomainValue)> {
        self.values.iter().map(|(name, value)| (*name, value))
    }

    /// Number of decoded values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether no value was decoded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Records skipped because they could not be decoded.
    pub fn failures(&self) -> &[DecodeFailure] {
        &self.failures
    }

    /// IDs the device reported as not supported.
    pub fn unsupported(&self) -> &[u16] {
        &self.unsupported
    }

    /// Renders the decoded values as a JSON object.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.values)
    }
}
