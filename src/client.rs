//! Device session for ventilation units.
//!
//! This module provides the [`Client`] struct, the primary interface for
//! talking to a unit.
//!
//! # Overview
//!
//! Every call performs one round trip: encode, send, receive, validate the
//! envelope, parse the records and decode their values. The client handles:
//! - Identity discovery through the `device_search` parameter
//! - Frame construction and envelope validation
//! - Decoding records into a [`DeviceState`]
//! - Encoding domain values for writes before any I/O happens
//!
//! # Example
//!
//! ```no_run
//! use ecovent::{Client, ClientConfig, DomainValue};
//! use std::net::Ipv4Addr;
//!
//! let config = ClientConfig::new(Ipv4Addr::new(192, 168, 1, 30));
//! let client = Client::connect(config)?;
//!
//! let state = client.read_all()?;
//! for (name, value) in state.iter() {
//!     println!("{name}: {value}");
//! }
//!
//! client.write("airflow", &DomainValue::Label("heat_recovery"))?;
//! client.set_manual_speed(60)?;
//! # Ok::<(), ecovent::VentError>(())
//! ```
//!
//! # Thread Safety
//!
//! Responses carry no correlation ID, so the transport sits behind a mutex and
//! exchanges on one client never overlap. Calls block for at most the
//! configured timeout.

use std::net::{IpAddr, SocketAddr};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::encoder::{encode_parameters, read_all_requests, ParamRequest};
use crate::error::{Result, VentError};
use crate::frame::{build_request, format_frame, ResponseFrame};
use crate::header::{
    FrameHeader, FunctionCode, DEFAULT_DEVICE_TYPE, DEFAULT_IDENTITY, DEFAULT_PASSWORD,
};
use crate::params::{lookup_by_name, lookup_write_only, ParameterDescriptor, SPEEDS};
use crate::response::ParsedPayload;
use crate::state::DeviceState;
use crate::transport::{Transport, UdpTransport, DEFAULT_PORT, DEFAULT_TIMEOUT};
use crate::value::{decode_value, encode_value, DomainValue};

const DEVICE_SEARCH: &str = "device_search";

/// Configuration for creating a client.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientConfig {
    /// Device IP address and port.
    pub device_addr: SocketAddr,
    /// Device identity. The default sentinel triggers discovery on connect.
    pub identity: String,
    /// Device password.
    pub password: String,
    /// Device type byte.
    pub device_type: u8,
    /// Communication timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration with factory defaults.
    ///
    /// # Example
    ///
    /// ```
    /// use ecovent::ClientConfig;
    /// use std::net::Ipv4Addr;
    ///
    /// let config = ClientConfig::new(Ipv4Addr::new(192, 168, 1, 30));
    /// assert_eq!(config.device_addr.port(), 4000);
    /// assert_eq!(config.identity, "DEFAULT_DEVICEID");
    /// assert_eq!(config.password, "1111");
    /// ```
    pub fn new(ip: impl Into<IpAddr>) -> Self {
        Self {
            device_addr: SocketAddr::new(ip.into(), DEFAULT_PORT),
            identity: DEFAULT_IDENTITY.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            device_type: DEFAULT_DEVICE_TYPE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom device port (default is 4000).
    pub fn with_port(mut self, port: u16) -> Self {
        self.device_addr.set_port(port);
        self
    }

    /// Sets a custom timeout (default is 4 seconds).
    ///
    /// # Example
    ///
    /// ```
    /// use ecovent::ClientConfig;
    /// use std::net::Ipv4Addr;
    /// use std::time::Duration;
    ///
    /// let config = ClientConfig::new(Ipv4Addr::new(192, 168, 1, 30))
    ///     .with_timeout(Duration::from_secs(1));
    /// assert_eq!(config.timeout, Duration::from_secs(1));
    /// ```
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets a known device identity, skipping discovery.
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    /// Sets the device password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Sets the device type byte.
    pub fn with_device_type(mut self, device_type: u8) -> Self {
        self.device_type = device_type;
        self
    }

    /// Builds the frame header for this configuration.
    ///
    /// # Errors
    ///
    /// Returns `VentError::InvalidParameter` for non-ASCII or overlong credentials.
    pub fn header(&self) -> Result<FrameHeader> {
        Ok(FrameHeader::new(self.identity.clone(), self.password.clone())?
            .with_device_type(self.device_type))
    }
}

fn readable(name: &str) -> Result<&'static ParameterDescriptor> {
    lookup_by_name(name).ok_or_else(|| VentError::unknown_parameter(name))
}

fn single_value(param: &ParameterDescriptor, parsed: &ParsedPayload) -> Result<DomainValue> {
    if parsed.unsupported.contains(&param.id) {
        return Err(VentError::UnsupportedParameter { id: param.id });
    }
    let record = parsed.record(param.id).ok_or_else(|| {
        VentError::malformed(format!("response carries no value for '{}'", param.name))
    })?;
    decode_value(param, &record.value)
}

/// Client for one ventilation unit.
///
/// Each operation produces one request and at most one response. No automatic
/// retries, caching or reconnection.
///
/// # Example
///
/// ```no_run
/// use ecovent::{Client, ClientConfig};
/// use std::net::Ipv4Addr;
///
/// let config = ClientConfig::new(Ipv4Addr::new(192, 168, 1, 30))
///     .with_identity("003A00345758520F");
/// let client = Client::new(config).unwrap();
///
/// let speed = client.read("speed").unwrap();
/// println!("speed: {}", speed);
/// client.turn_on().unwrap();
/// ```
pub struct Client<T: Transport = UdpTransport> {
    transport: Mutex<T>,
    header: FrameHeader,
}

impl Client<UdpTransport> {
    /// Creates a client with the configured identity, without discovery.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are invalid or the UDP socket
    /// cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let header = config.header()?;
        let transport = UdpTransport::new(config.device_addr, config.timeout)?;
        Ok(Self::with_transport(transport, header))
    }

    /// Creates a client and discovers the identity if none was configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created or discovery fails.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let mut client = Self::new(config)?;
        if client.header.needs_discovery() {
            client.discover()?;
        }
        Ok(client)
    }
}

impl<T: Transport> Client<T> {
    /// Creates a client over any transport.
    pub fn with_transport(transport: T, header: FrameHeader) -> Self {
        Self {
            transport: Mutex::new(transport),
            header,
        }
    }

    /// Returns the device identity currently used in frames.
    pub fn identity(&self) -> &str {
        &self.header.identity
    }

    /// Returns the frame header used for requests.
    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// Consumes the client and returns its transport.
    pub fn into_transport(self) -> T {
        self.transport
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn exchange(
        &self,
        header: &FrameHeader,
        function: FunctionCode,
        requests: &[ParamRequest],
    ) -> Result<ParsedPayload> {
        let params = encode_parameters(requests)?;
        let request = build_request(function, &params, header)?;
        log::trace!("-> {}", format_frame(&request));

        let mut transport = self.transport.lock().unwrap_or_else(PoisonError::into_inner);
        if !function.expects_reply() {
            transport.send(&request)?;
            log::debug!("{}: {} parameter(s) sent", function, requests.len());
            return Ok(ParsedPayload::default());
        }
        let reply = transport.send_receive(&request)?;
        drop(transport);
        log::trace!("<- {}", format_frame(&reply));

        let frame = ResponseFrame::from_bytes(&reply)?;
        frame.check_response()?;
        let parsed = frame.parameters()?;
        log::debug!(
            "{}: {} parameter(s) requested, {} record(s) received, {} unsupported",
            function,
            requests.len(),
            parsed.records.len(),
            parsed.unsupported.len()
        );
        Ok(parsed)
    }

    /// Asks the device for its identity and adopts it.
    ///
    /// The request is sent with the discovery sentinel as identity.
    ///
    /// # Errors
    ///
    /// Returns an error on timeout, a malformed reply, or an undecodable identity.
    pub fn discover(&mut self) -> Result<String> {
        let param = readable(DEVICE_SEARCH)?;
        let probe = FrameHeader {
            identity: DEFAULT_IDENTITY.to_string(),
            ..self.header.clone()
        };
        let parsed = self.exchange(&probe, FunctionCode::Read, &[ParamRequest::read(param.id)])?;

        let identity = match single_value(param, &parsed)? {
            DomainValue::Text(identity) if !identity.is_empty() => identity,
            other => {
                return Err(VentError::invalid_value(
                    param.name,
                    format!("'{}' is not a device identity", other),
                ))
            }
        };
        self.header = FrameHeader::new(identity.clone(), self.header.password.clone())?
            .with_device_type(self.header.device_type);
        log::info!("discovered device identity {}", identity);
        Ok(identity)
    }

    /// Reads one parameter.
    ///
    /// Unlike batched reads, a decode failure is returned as the error.
    ///
    /// # Errors
    ///
    /// Returns `VentError::UnknownParameter` for an unknown name,
    /// `VentError::UnsupportedParameter` if the device rejects the ID, any
    /// decode error for the value, or a transport/frame error.
    pub fn read(&self, name: &str) -> Result<DomainValue> {
        self.step(name, FunctionCode::Read)
    }

    /// Reads several parameters in one frame.
    ///
    /// # Errors
    ///
    /// Returns `VentError::UnknownParameter` before any I/O if a name is
    /// unknown, or a transport/frame error.
    pub fn read_many(&self, names: &[&str]) -> Result<DeviceState> {
        let requests = names
            .iter()
            .map(|name| readable(name).map(|p| ParamRequest::read(p.id)))
            .collect::<Result<Vec<_>>>()?;
        let parsed = self.exchange(&self.header, FunctionCode::Read, &requests)?;
        Ok(DeviceState::from_payload(&parsed))
    }

    /// Reads every readable parameter in one frame.
    ///
    /// Records that fail to decode are skipped and listed in
    /// [`DeviceState::failures`].
    ///
    /// # Errors
    ///
    /// Returns a transport or frame error.
    pub fn read_all(&self) -> Result<DeviceState> {
        let parsed = self.exchange(&self.header, FunctionCode::Read, &read_all_requests())?;
        Ok(DeviceState::from_payload(&parsed))
    }

    /// Writes one parameter and returns the values echoed by the device.
    ///
    /// # Errors
    ///
    /// Returns `VentError::UnsupportedWriteValue` before any I/O if the value
    /// cannot be encoded, or a transport/frame error.
    pub fn write(&self, name: &str, value: &DomainValue) -> Result<DeviceState> {
        self.write_many(&[(name, value.clone())])
    }

    /// Writes several parameters in one frame, in order.
    ///
    /// # Errors
    ///
    /// See [`write`](Self::write).
    pub fn write_many(&self, values: &[(&str, DomainValue)]) -> Result<DeviceState> {
        let requests = values
            .iter()
            .map(|(name, value)| {
                let param = readable(name)?;
                Ok(ParamRequest::write(param.id, encode_value(param, value)?))
            })
            .collect::<Result<Vec<_>>>()?;
        let parsed = self.exchange(&self.header, FunctionCode::WriteReturn, &requests)?;
        Ok(DeviceState::from_payload(&parsed))
    }

    /// Fires a write-only parameter such as `filter_timer_reset`.
    ///
    /// The device does not reply to this kind of write.
    ///
    /// # Errors
    ///
    /// Returns `VentError::UnknownParameter` if `name` is not a write-only
    /// parameter, or a transport error.
    pub fn trigger(&self, name: &str) -> Result<()> {
        let param = lookup_write_only(name).ok_or_else(|| VentError::unknown_parameter(name))?;
        self.exchange(
            &self.header,
            FunctionCode::Write,
            &[ParamRequest::write(param.id, Vec::new())],
        )?;
        Ok(())
    }

    fn step(&self, name: &str, function: FunctionCode) -> Result<DomainValue> {
        let param = readable(name)?;
        let parsed = self.exchange(&self.header, function, &[ParamRequest::read(param.id)])?;
        single_value(param, &parsed)
    }

    /// Steps a parameter up on the device and returns its new value.
    pub fn increment(&self, name: &str) -> Result<DomainValue> {
        self.step(name, FunctionCode::Increment)
    }

    /// Steps a parameter down on the device and returns its new value.
    pub fn decrement(&self, name: &str) -> Result<DomainValue> {
        self.step(name, FunctionCode::Decrement)
    }

    /// Switches the unit on.
    pub fn turn_on(&self) -> Result<DeviceState> {
        self.write("state", &DomainValue::Label("on"))
    }

    /// Switches the unit off.
    pub fn turn_off(&self) -> Result<DeviceState> {
        self.write("state", &DomainValue::Label("off"))
    }

    /// Selects preset speed 1-3.
    ///
    /// # Errors
    ///
    /// Returns `VentError::InvalidParameter` for any other speed.
    pub fn set_speed(&self, speed: u8) -> Result<DeviceState> {
        let label = match speed {
            1..=3 => SPEEDS.label(u16::from(speed)),
            _ => None,
        }
        .ok_or_else(|| VentError::invalid_parameter("speed", "must be 1-3"))?;
        self.write("speed", &DomainValue::Label(label))
    }

    /// Sets the manual speed to `percent` (2-100) and selects manual mode.
    ///
    /// # Errors
    ///
    /// Returns `VentError::InvalidParameter` for a percentage outside 2-100.
    pub fn set_manual_speed(&self, percent: u8) -> Result<DeviceState> {
        if !(2..=100).contains(&percent) {
            return Err(VentError::invalid_parameter("man_speed", "must be 2-100 %"));
        }
        self.write_many(&[
            ("man_speed", DomainValue::Percentage(percent)),
            ("speed", DomainValue::Label("manual")),
        ])
    }

    /// Selects an airflow mode by label (`ventilation`, `heat_recovery`, `air_supply`).
    pub fn set_airflow(&self, airflow: &str) -> Result<DeviceState> {
        self.write("airflow", &DomainValue::Text(airflow.to_string()))
    }

    /// Enables or disables the humidity sensor.
    pub fn set_humidity_sensor(&self, enabled: bool) -> Result<DeviceState> {
        let label = if enabled { "on" } else { "off" };
        self.write("humidity_sensor_state", &DomainValue::Label(label))
    }

    /// Sets the humidity threshold (40-80 %).
    ///
    /// # Errors
    ///
    /// Returns `VentError::InvalidParameter` for a threshold outside 40-80.
    pub fn set_humidity_threshold(&self, percent: u8) -> Result<DeviceState> {
        if !(40..=80).contains(&percent) {
            return Err(VentError::invalid_parameter(
                "humidity_treshold",
                "must be 40-80 %",
            ));
        }
        self.write("humidity_treshold", &DomainValue::number(u32::from(percent)))
    }

    /// Resets the filter replacement timer.
    pub fn clear_filter_reminder(&self) -> Result<()> {
        self.trigger("filter_timer_reset")
    }

    /// Clears active alarms.
    pub fn reset_alarms(&self) -> Result<()> {
        self.trigger("reset_alarms")
    }
}

impl<T: Transport + std::fmt::Debug> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("transport", &self.transport)
            .field("identity", &self.header.identity)
            .field("device_type", &self.header.device_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::net::Ipv4Addr;

    #[derive(Debug, Default)]
    struct ScriptedTransport {
        sent: Vec<Vec<u8>>,
        replies: VecDeque<Result<Vec<u8>>>,
    }

    impl ScriptedTransport {
        fn replying(replies: Vec<Vec<u8>>) -> Self {
            Self {
                sent: Vec::new(),
                replies: replies.into_iter().map(Ok).collect(),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&mut self, data: &[u8]) -> Result<()> {
            self.sent.push(data.to_vec());
            Ok(())
        }

        fn send_receive(&mut self, data: &[u8]) -> Result<Vec<u8>> {
            self.sent.push(data.to_vec());
            self.replies.pop_front().unwrap_or(Err(VentError::Timeout))
        }
    }

    fn known_header() -> FrameHeader {
        FrameHeader::new("003A00345758520F", "1111").unwrap()
    }

    fn response(records: &[ParamRequest]) -> Vec<u8> {
        let params = encode_parameters(records).unwrap();
        build_request(FunctionCode::Response, &params, &known_header()).unwrap()
    }

    fn client(replies: Vec<Vec<u8>>) -> Client<ScriptedTransport> {
        Client::with_transport(ScriptedTransport::replying(replies), known_header())
    }

    fn sent_frames(client: Client<ScriptedTransport>) -> Vec<ResponseFrame> {
        client
            .into_transport()
            .sent
            .iter()
            .map(|bytes| ResponseFrame::from_bytes(bytes).unwrap())
            .collect()
    }

    #[test]
    fn test_client_config_new() {
        let config = ClientConfig::new(Ipv4Addr::new(192, 168, 1, 30));

        assert_eq!(config.device_addr.ip(), Ipv4Addr::new(192, 168, 1, 30));
        assert_eq!(config.device_addr.port(), DEFAULT_PORT);
        assert_eq!(config.identity, DEFAULT_IDENTITY);
        assert_eq!(config.password, DEFAULT_PASSWORD);
        assert_eq!(config.device_type, 0x02);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_client_config_builders() {
        let config = ClientConfig::new(Ipv4Addr::new(192, 168, 1, 30))
            .with_port(4001)
            .with_timeout(Duration::from_secs(1))
            .with_identity("ABC")
            .with_password("pw")
            .with_device_type(0x03);

        assert_eq!(config.device_addr.port(), 4001);
        assert_eq!(config.timeout, Duration::from_secs(1));
        let header = config.header().unwrap();
        assert_eq!(header.identity, "ABC");
        assert_eq!(header.password, "pw");
        assert_eq!(header.device_type, 0x03);
    }

    #[test]
    fn test_client_creation() {
        let config = ClientConfig::new(Ipv4Addr::LOCALHOST).with_identity("003A00345758520F");
        let client = Client::new(config).unwrap();
        assert_eq!(client.identity(), "003A00345758520F");

        let debug_str = format!("{:?}", client);
        assert!(debug_str.contains("Client"));
        assert!(debug_str.contains("003A00345758520F"));
    }

    #[test]
    fn test_client_rejects_bad_credentials() {
        let config = ClientConfig::new(Ipv4Addr::LOCALHOST).with_password("pässword");
        assert!(matches!(
            Client::new(config),
            Err(VentError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_read() {
        let client = client(vec![response(&[ParamRequest::write(0x0002, vec![0x02])])]);
        assert_eq!(client.read("speed").unwrap(), DomainValue::Label("medium"));

        let frames = sent_frames(client);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].function, FunctionCode::Read);
        assert_eq!(frames[0].header, known_header());
        assert_eq!(frames[0].payload, vec![0x02]);
    }

    #[test]
    fn test_read_unknown_name_sends_nothing() {
        let client = client(vec![]);
        assert!(matches!(
            client.read("turbo"),
            Err(VentError::UnknownParameter { .. })
        ));
        assert!(client.into_transport().sent.is_empty());
    }

    #[test]
    fn test_read_unsupported() {
        let params = [0xFD, 0x44];
        let reply = build_request(FunctionCode::Response, &params, &known_header()).unwrap();
        let client = client(vec![reply]);
        assert!(matches!(
            client.read("man_speed"),
            Err(VentError::UnsupportedParameter { id: 0x0044 })
        ));
    }

    #[test]
    fn test_read_bad_enum_is_an_error() {
        let client = client(vec![response(&[ParamRequest::write(0x0002, vec![0x64])])]);
        assert!(matches!(
            client.read("speed"),
            Err(VentError::EnumDecode { raw: 0x64, .. })
        ));
    }

    #[test]
    fn test_read_missing_record() {
        let client = client(vec![response(&[ParamRequest::write(0x0001, vec![0x01])])]);
        assert!(matches!(
            client.read("speed"),
            Err(VentError::MalformedFrame { .. })
        ));
    }

    #[test]
    fn test_read_timeout() {
        let client = client(vec![]);
        assert!(matches!(client.read("state"), Err(VentError::Timeout)));
    }

    #[test]
    fn test_read_rejects_corrupt_reply() {
        let mut reply = response(&[ParamRequest::write(0x0001, vec![0x01])]);
        let last = reply.len() - 1;
        reply[last] ^= 0xFF;
        let client = client(vec![reply]);
        assert!(matches!(
            client.read("state"),
            Err(VentError::MalformedFrame { .. })
        ));
    }

    #[test]
    fn test_read_rejects_non_response_function() {
        let params = encode_parameters(&[ParamRequest::write(0x0001, vec![0x01])]).unwrap();
        let reply = build_request(FunctionCode::WriteReturn, &params, &known_header()).unwrap();
        let client = client(vec![reply]);
        assert!(client.read("state").is_err());
    }

    #[test]
    fn test_read_many() {
        let client = client(vec![response(&[
            ParamRequest::write(0x0001, vec![0x01]),
            ParamRequest::write(0x0025, vec![0x37]),
        ])]);
        let state = client.read_many(&["state", "humidity"]).unwrap();
        assert_eq!(state.len(), 2);

        let frames = sent_frames(client);
        assert_eq!(frames[0].payload, vec![0x01, 0x25]);
    }

    #[test]
    fn test_read_all_isolates_failures() {
        let client = client(vec![response(&[
            ParamRequest::write(0x0001, vec![0x01]),
            ParamRequest::write(0x0002, vec![0x64]),
            ParamRequest::write(0x0024, vec![0x01, 0x02]),
        ])]);
        let state = client.read_all().unwrap();
        assert_eq!(state.len(), 2);
        assert_eq!(state.get("battery_voltage").unwrap().to_string(), "513 mV");
        assert_eq!(state.failures().len(), 1);

        let frames = sent_frames(client);
        assert_eq!(frames[0].payload, crate::encoder::encode_read_all().unwrap());
    }

    #[test]
    fn test_write_uses_write_return() {
        let client = client(vec![response(&[ParamRequest::write(0x00B7, vec![0x01])])]);
        let state = client
            .write("airflow", &DomainValue::Label("heat_recovery"))
            .unwrap();
        assert_eq!(state.get("airflow"), Some(&DomainValue::Label("heat_recovery")));

        let frames = sent_frames(client);
        assert_eq!(frames[0].function, FunctionCode::WriteReturn);
        assert_eq!(frames[0].payload, vec![0xB7, 0x01]);
    }

    #[test]
    fn test_write_rejected_before_io() {
        let client = client(vec![]);
        let err = client.set_airflow("sideways").unwrap_err();
        assert!(matches!(err, VentError::UnsupportedWriteValue { .. }));
        assert!(client
            .write("battery_voltage", &DomainValue::number(3))
            .is_err());
        assert!(client.into_transport().sent.is_empty());
    }

    #[test]
    fn test_trigger_is_send_only() {
        let client = client(vec![]);
        client.clear_filter_reminder().unwrap();
        client.reset_alarms().unwrap();
        client.trigger("weekly_schedule_setup").unwrap();

        let frames = sent_frames(client);
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.function == FunctionCode::Write));
        assert_eq!(frames[0].payload, vec![0x65]);
        assert_eq!(frames[1].payload, vec![0x80]);
        assert_eq!(frames[2].payload, vec![0xFE, 0x02, 0x77, 0x01, 0x01]);
    }

    #[test]
    fn test_increment_and_decrement() {
        let client = client(vec![
            response(&[ParamRequest::write(0x0002, vec![0x03])]),
            response(&[ParamRequest::write(0x0002, vec![0x02])]),
        ]);
        assert_eq!(client.increment("speed").unwrap(), DomainValue::Label("high"));
        assert_eq!(client.decrement("speed").unwrap(), DomainValue::Label("medium"));

        let frames = sent_frames(client);
        assert_eq!(frames[0].function, FunctionCode::Increment);
        assert_eq!(frames[1].function, FunctionCode::Decrement);
        assert_eq!(frames[1].payload, vec![0x02]);
    }

    #[test]
    fn test_trigger_unknown() {
        let client = client(vec![]);
        assert!(client.trigger("speed").is_err());
    }

    #[test]
    fn test_set_manual_speed() {
        let client = client(vec![response(&[
            ParamRequest::write(0x0044, vec![0x80]),
            ParamRequest::write(0x0002, vec![0xFF]),
        ])]);
        let state = client.set_manual_speed(50).unwrap();
        assert_eq!(state.get("man_speed"), Some(&DomainValue::Percentage(50)));
        assert_eq!(state.get("speed"), Some(&DomainValue::Label("manual")));

        let frames = sent_frames(client);
        assert_eq!(frames[0].payload, vec![0x44, 0x80, 0x02, 0xFF]);
    }

    #[test]
    fn test_convenience_payloads() {
        let replies = (0..5)
            .map(|_| response(&[ParamRequest::write(0x0001, vec![0x01])]))
            .collect();
        let client = client(replies);
        client.turn_on().unwrap();
        client.turn_off().unwrap();
        client.set_speed(3).unwrap();
        client.set_humidity_sensor(true).unwrap();
        client.set_humidity_threshold(60).unwrap();

        let payloads: Vec<Vec<u8>> = sent_frames(client).into_iter().map(|f| f.payload).collect();
        assert_eq!(
            payloads,
            vec![
                vec![0x01, 0x01],
                vec![0x01, 0x00],
                vec![0x02, 0x03],
                vec![0x0F, 0x01],
                vec![0x19, 60],
            ]
        );
    }

    #[test]
    fn test_convenience_ranges() {
        let client = client(vec![]);
        assert!(client.set_speed(0).is_err());
        assert!(client.set_speed(4).is_err());
        assert!(client.set_manual_speed(1).is_err());
        assert!(client.set_manual_speed(101).is_err());
        assert!(client.set_humidity_threshold(39).is_err());
        assert!(client.set_humidity_threshold(81).is_err());
        assert!(client.into_transport().sent.is_empty());
    }

    #[test]
    fn test_discover() {
        let reply = response(&[ParamRequest::write(0x007C, b"003A00345758520F".to_vec())]);
        let state_reply = response(&[ParamRequest::write(0x0001, vec![0x00])]);
        let mut client = Client::with_transport(
            ScriptedTransport::replying(vec![reply, state_reply]),
            FrameHeader::default(),
        );
        assert!(client.header().needs_discovery());

        assert_eq!(client.discover().unwrap(), "003A00345758520F");
        assert_eq!(client.identity(), "003A00345758520F");
        client.read("state").unwrap();

        let frames = sent_frames(client);
        assert_eq!(frames[0].header.identity, DEFAULT_IDENTITY);
        assert_eq!(frames[0].payload, vec![0x7C]);
        assert_eq!(frames[1].header.identity, "003A00345758520F");
    }

    #[test]
    fn test_discover_rejects_empty_identity() {
        let reply =
            build_request(FunctionCode::Response, &[0xFE, 0x00, 0x7C], &known_header()).unwrap();
        let mut client = Client::with_transport(
            ScriptedTransport::replying(vec![reply]),
            FrameHeader::default(),
        );
        assert!(client.discover().is_err());
        assert!(client.header().needs_discovery());
    }
}
