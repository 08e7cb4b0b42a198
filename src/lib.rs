//! # EcoVent Protocol Library
//!
//! A Rust library for controlling TwinFresh/Blauberg heat-recovery ventilation
//! units over their UDP binary protocol.
//!
//! This is a **protocol-only** library: no polling, scheduling or host
//! integration. Each call produces exactly 1 request and at most 1 response.
//! No automatic retries, caching, or reconnection.
//!
//! ## Features
//!
//! - **Protocol-only** - frame codec, escaped parameter encoding, response parser
//! - **Deterministic** - each call produces exactly 1 request
//! - **Typed values** - every parameter decodes into a [`DomainValue`]
//! - **Fail closed, fail local** - a bad record never spoils the rest of a batch
//! - **No panics** - all errors returned as `Result<T, VentError>`
//!
//! ## Quick Start
//!
//! ```no_run
//! use ecovent::{Client, ClientConfig};
//! use std::net::Ipv4Addr;
//!
//! fn main() -> ecovent::Result<()> {
//!     // Identity defaults to the discovery sentinel, so connect() asks the
//!     // unit for its real ID first.
//!     let client = Client::connect(ClientConfig::new(Ipv4Addr::new(192, 168, 1, 30)))?;
//!     println!("connected to {}", client.identity());
//!
//!     let state = client.read_all()?;
//!     println!("speed = {}", state.get("speed").map(|v| v.to_string()).unwrap_or_default());
//!
//!     client.set_speed(2)?;
//!     client.set_airflow("heat_recovery")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Frame Layout
//!
//! ```text
//! FD FD | type | id_len id.. | pwd_len pwd.. | func | parameters.. | ck_lo ck_hi
//! ```
//!
//! | Function | Code | Reply |
//! |----------|:----:|:-----:|
//! | [`FunctionCode::Read`] | `0x01` | ✓ |
//! | [`FunctionCode::Write`] | `0x02` | ✗ |
//! | [`FunctionCode::WriteReturn`] | `0x03` | ✓ |
//! | [`FunctionCode::Increment`] | `0x04` | ✓ |
//! | [`FunctionCode::Decrement`] | `0x05` | ✓ |
//! | [`FunctionCode::Response`] | `0x06` | - |
//!
//! Parameters are escaped with `0xFF hi` (high ID byte), `0xFE len` (value
//! length) and, in responses, `0xFD lo` (parameter not supported). See
//! [`encoder`] and [`ResponseParser`].
//!
//! ## Codec Without a Device
//!
//! ```
//! use ecovent::{build_request, encode_parameters, parse_payload, DeviceState};
//! use ecovent::{FrameHeader, FunctionCode, ParamRequest, ResponseFrame};
//!
//! let header = FrameHeader::default();
//! let params = encode_parameters(&[ParamRequest::write(0x0001, vec![0x01])]).unwrap();
//! let bytes = build_request(FunctionCode::Response, &params, &header).unwrap();
//!
//! let frame = ResponseFrame::from_bytes(&bytes).unwrap();
//! let state = DeviceState::from_payload(&parse_payload(&frame.payload).unwrap());
//! assert_eq!(state.get("state").unwrap().to_string(), "on");
//! ```
//!
//! ## Error Handling
//!
//! ```no_run
//! use ecovent::{Client, ClientConfig, VentError};
//! use std::net::Ipv4Addr;
//!
//! let config = ClientConfig::new(Ipv4Addr::new(192, 168, 1, 30))
//!     .with_identity("003A00345758520F");
//! let client = Client::new(config)?;
//!
//! match client.read("man_speed") {
//!     Ok(value) => println!("manual speed: {}", value),
//!     Err(VentError::Timeout) => println!("no answer, try again"),
//!     Err(VentError::UnsupportedParameter { id }) => println!("0x{:04X} not supported", id),
//!     Err(e) => println!("Error: {}", e),
//! }
//! # Ok::<(), VentError>(())
//! ```
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade: frames at `trace`, exchange
//! summaries at `debug`, skipped records at `warn`, discovery at `info`.
//! Install any logger to see them.
//!
//! ## Feature Flags
//!
//! - `serde` - `Serialize`/`Deserialize` for [`ClientConfig`], `Serialize` for
//!   [`DomainValue`], and [`DeviceState::to_json`].

#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod client;
pub mod encoder;
mod error;
mod frame;
mod header;
pub mod params;
mod response;
mod state;
mod transport;
mod value;

// Public re-exports
pub use client::{Client, ClientConfig};
pub use encoder::{encode_parameters, encode_read_all, ParamRequest};
pub use error::{Result, VentError};
pub use frame::{
    build_request, compute_checksum, format_frame, verify_checksum, ResponseFrame, CHECKSUM_SIZE,
    MIN_FRAME_SIZE,
};
pub use header::{
    build_identity_block, FrameHeader, FunctionCode, DEFAULT_DEVICE_TYPE, DEFAULT_IDENTITY,
    DEFAULT_PASSWORD, FRAME_MARKER,
};
pub use params::{ParameterDescriptor, ValueKind};
pub use response::{parse_payload, ParameterRecord, ParseEvent, ParsedPayload, ResponseParser};
pub use state::{DecodeFailure, DeviceState};
pub use transport::{Transport, UdpTransport, DEFAULT_PORT, DEFAULT_TIMEOUT, MAX_PACKET_SIZE};
pub use value::{
    decode_value, encode_value, DeviceDate, DomainValue, FirmwareVersion, ScheduleEntry, TimeSpan,
    DEVICE_EPOCH_YEAR,
};
