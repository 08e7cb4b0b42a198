//! End-to-end sessions against a fake unit on a localhost UDP socket.

use std::collections::BTreeMap;
use std::net::{Ipv4Addr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use ecovent::{
    build_request, encode_parameters, parse_payload, Client, ClientConfig, DomainValue,
    FrameHeader, FunctionCode, ParamRequest, ResponseFrame, VentError, DEFAULT_IDENTITY,
};

const IDENTITY: &str = "003A00345758520F";
const PASSWORD: &str = "1111";

type Registers = Arc<Mutex<BTreeMap<u16, Vec<u8>>>>;

struct FakeDevice {
    port: u16,
    registers: Registers,
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FakeDevice {
    fn start() -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_millis(50)))
            .unwrap();
        let port = socket.local_addr().unwrap().port();

        let registers: Registers = Arc::new(Mutex::new(default_registers()));
        let writes = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));

        let handle = {
            let registers = Arc::clone(&registers);
            let writes = Arc::clone(&writes);
            let stop = Arc::clone(&stop);
            thread::spawn(move || serve(socket, registers, writes, stop))
        };

        Self {
            port,
            registers,
            writes,
            stop,
            handle: Some(handle),
        }
    }

    fn config(&self) -> ClientConfig {
        ClientConfig::new(Ipv4Addr::LOCALHOST)
            .with_port(self.port)
            .with_timeout(Duration::from_secs(2))
    }

    fn set(&self, id: u16, value: &[u8]) {
        self.registers.lock().unwrap().insert(id, value.to_vec());
    }

    fn wait_for_write(&self) -> Vec<u8> {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if let Some(payload) = self.writes.lock().unwrap().pop() {
                return payload;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("device never received the write");
    }
}

impl Drop for FakeDevice {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn default_registers() -> BTreeMap<u16, Vec<u8>> {
    let mut registers = BTreeMap::new();
    registers.insert(0x0001, vec![0x00]);
    registers.insert(0x0002, vec![0x01]);
    registers.insert(0x000F, vec![0x00]);
    registers.insert(0x0019, vec![50]);
    registers.insert(0x0024, vec![0x01, 0x0C]);
    registers.insert(0x0025, vec![0x37]);
    registers.insert(0x0044, vec![0x00]);
    registers.insert(0x004A, vec![0x4C, 0x04]);
    registers.insert(0x0064, vec![0x0F, 0x04, 0x5A]);
    registers.insert(0x007C, IDENTITY.as_bytes().to_vec());
    registers.insert(0x0086, vec![0x00, 0x11, 0x0F, 0x06, 0xE6, 0x07]);
    registers.insert(0x009C, vec![192, 168, 1, 30]);
    registers.insert(0x00B7, vec![0x00]);
    registers.insert(0x00B9, vec![0x05, 0x00]);
    registers.insert(0x0302, vec![0x1E, 0x08]);
    registers
}

/// Splits a read request into IDs. Reads carry no values except the schedule default.
fn requested_ids(payload: &[u8]) -> Vec<u16> {
    let mut ids = Vec::new();
    let mut high = 0u8;
    let mut skip = 0usize;
    let mut i = 0;
    while i < payload.len() {
        match payload[i] {
            0xFF => {
                high = payload[i + 1];
                i += 2;
            }
            0xFE => {
                skip = usize::from(payload[i + 1]);
                i += 2;
            }
            low => {
                ids.push(u16::from(high) << 8 | u16::from(low));
                i += 1 + skip;
                high = 0;
                skip = 0;
            }
        }
    }
    ids
}

fn reply_to(
    request: &[u8],
    registers: &Registers,
    writes: &Mutex<Vec<Vec<u8>>>,
) -> Option<Vec<u8>> {
    let frame = ResponseFrame::from_bytes(request).ok()?;
    if frame.header.password != PASSWORD {
        return None;
    }
    let discovering = frame.header.identity == DEFAULT_IDENTITY;
    if frame.header.identity != IDENTITY && !discovering {
        return None;
    }

    let mut registers = registers.lock().unwrap();
    let mut out = Vec::new();
    match frame.function {
        FunctionCode::Read => {
            let ids = requested_ids(&frame.payload);
            if discovering && ids != [0x007C] {
                return None;
            }
            for id in ids {
                match registers.get(&id) {
                    Some(value) => {
                        let record = ParamRequest::write(id, value.clone());
                        out.extend(encode_parameters(&[record]).unwrap())
                    }
                    None => {
                        if id >> 8 != 0 {
                            out.extend([0xFF, (id >> 8) as u8]);
                        }
                        out.extend([0xFD, id as u8]);
                    }
                }
            }
        }
        FunctionCode::WriteReturn => {
            let parsed = parse_payload(&frame.payload).ok()?;
            let echoed: Vec<ParamRequest> = parsed
                .records
                .into_iter()
                .map(|record| {
                    registers.insert(record.id, record.value.clone());
                    ParamRequest::write(record.id, record.value)
                })
                .collect();
            out = encode_parameters(&echoed).unwrap();
        }
        FunctionCode::Write => {
            writes.lock().unwrap().push(frame.payload);
            return None;
        }
        _ => return None,
    }

    let header = FrameHeader::new(IDENTITY, PASSWORD).unwrap();
    build_request(FunctionCode::Response, &out, &header).ok()
}

fn serve(
    socket: UdpSocket,
    registers: Registers,
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
    stop: Arc<AtomicBool>,
) {
    let mut buf = [0u8; 4096];
    while !stop.load(Ordering::Relaxed) {
        let Ok((n, peer)) = socket.recv_from(&mut buf) else {
            continue;
        };
        if let Some(reply) = reply_to(&buf[..n], &registers, &writes) {
            let _ = socket.send_to(&reply, peer);
        }
    }
}

#[test]
fn test_connect_discovers_identity() {
    let device = FakeDevice::start();
    let client = Client::connect(device.config()).unwrap();
    assert_eq!(client.identity(), IDENTITY);
}

#[test]
fn test_known_identity_skips_discovery() {
    let device = FakeDevice::start();
    let client = Client::connect(device.config().with_identity(IDENTITY)).unwrap();
    assert_eq!(client.read("humidity").unwrap().to_string(), "55 %");
}

#[test]
fn test_read_all() {
    let device = FakeDevice::start();
    let client = Client::connect(device.config()).unwrap();

    let state = client.read_all().unwrap();
    assert_eq!(state.get("state"), Some(&DomainValue::Label("off")));
    assert_eq!(state.get("speed"), Some(&DomainValue::Label("low")));
    assert_eq!(state.get("battery_voltage").unwrap().to_string(), "3073 mV");
    assert_eq!(state.get("fan1_speed").unwrap().to_string(), "1100 rpm");
    assert_eq!(state.get("filter_timer_countdown").unwrap().to_string(), "90d 4h 15m");
    assert_eq!(state.get("firmware").unwrap().to_string(), "0.17 2022-06-15");
    assert_eq!(state.get("wifi_assigned_ip").unwrap().to_string(), "192.168.1.30");
    assert_eq!(state.get("unit_type").unwrap().to_string(), "Vento Expert A30 W V.2");
    assert_eq!(state.get("night_mode_timer").unwrap().to_string(), "08h 30m");
    assert!(state.failures().is_empty());

    // every registry entry the fake lacks comes back as unsupported
    assert!(state.unsupported().contains(&0x0303));
    assert!(state.unsupported().contains(&0x0095));
    assert_eq!(state.len() + state.unsupported().len(), ecovent::params::PARAMETERS.len());
}

#[test]
fn test_read_all_skips_bad_records() {
    let device = FakeDevice::start();
    device.set(0x0002, &[0x64]);
    device.set(0x0070, &[31, 1, 2, 24]);
    let client = Client::connect(device.config()).unwrap();

    let state = client.read_all().unwrap();
    assert!(state.get("speed").is_none());
    assert!(state.get("rtc_date").is_none());
    assert_eq!(state.get("humidity").unwrap().to_string(), "55 %");
    assert_eq!(state.failures().len(), 2);

    assert!(matches!(
        client.read("speed"),
        Err(VentError::EnumDecode { raw: 0x64, .. })
    ));
}

#[test]
fn test_read_unsupported_parameter() {
    let device = FakeDevice::start();
    let client = Client::connect(device.config()).unwrap();
    assert!(matches!(
        client.read("party_mode_timer"),
        Err(VentError::UnsupportedParameter { id: 0x0303 })
    ));
}

#[test]
fn test_writes_are_echoed_and_stored() {
    let device = FakeDevice::start();
    let client = Client::connect(device.config()).unwrap();

    let echoed = client.set_manual_speed(50).unwrap();
    assert_eq!(echoed.get("man_speed"), Some(&DomainValue::Percentage(50)));
    assert_eq!(echoed.get("speed"), Some(&DomainValue::Label("manual")));

    client.turn_on().unwrap();
    client.set_airflow("air_supply").unwrap();

    let state = client.read_many(&["state", "man_speed", "airflow"]).unwrap();
    assert_eq!(state.get("state"), Some(&DomainValue::Label("on")));
    assert_eq!(state.get("man_speed"), Some(&DomainValue::Percentage(50)));
    assert_eq!(state.get("airflow"), Some(&DomainValue::Label("air_supply")));
}

#[test]
fn test_trigger_reaches_device() {
    let device = FakeDevice::start();
    let client = Client::connect(device.config()).unwrap();

    client.clear_filter_reminder().unwrap();
    assert_eq!(device.wait_for_write(), vec![0x65]);
}

#[test]
fn test_wrong_identity_times_out() {
    let device = FakeDevice::start();
    let config = device
        .config()
        .with_identity("FFFFFFFFFFFFFFFF")
        .with_timeout(Duration::from_millis(200));
    let client = Client::connect(config).unwrap();
    assert!(matches!(client.read("state"), Err(VentError::Timeout)));
}

#[test]
fn test_shared_client_keeps_replies_paired() {
    let device = FakeDevice::start();
    let client = Client::connect(device.config()).unwrap();

    thread::scope(|scope| {
        for (name, expected) in [
            ("humidity", "55 %"),
            ("speed", "low"),
            ("fan1_speed", "1100 rpm"),
            ("airflow", "ventilation"),
        ] {
            let client = &client;
            scope.spawn(move || {
                for _ in 0..5 {
                    assert_eq!(client.read(name).unwrap().to_string(), expected);
                }
            });
        }
    });
}
