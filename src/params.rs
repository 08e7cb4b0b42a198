//! Parameter registry for TwinFresh/Blauberg ventilation units.
//!
//! Every device attribute is addressed by a 16-bit parameter ID. This module
//! holds the static tables mapping IDs to names and to the shape of their
//! value ([`ValueKind`]), plus the enumerated value tables.
//!
//! Two registries exist:
//!
//! - [`PARAMETERS`] - readable (and mostly writable) parameters. Every entry
//!   may appear in a device response.
//! - [`WRITE_ONLY_PARAMETERS`] - action triggers such as a filter timer reset
//!   or a factory reset. They never appear in decoded responses.
//!
//! # Example
//!
//! ```
//! use ecovent::params::{decode_enum, lookup_by_id, lookup_by_name};
//!
//! let speed = lookup_by_name("speed").unwrap();
//! assert_eq!(speed.id, 0x0002);
//! assert_eq!(lookup_by_id(0x0002).unwrap().name, "speed");
//!
//! assert_eq!(decode_enum(0x0002, 0xFF), Some("manual"));
//! assert_eq!(decode_enum(0x0002, 0x64), None);
//! ```

/// Enumerated values of a parameter, keyed by the raw integer.
#[derive(Debug)]
pub struct EnumTable {
    width: usize,
    entries: &'static [(u16, &'static str)],
}

impl EnumTable {
    const fn new(width: usize, entries: &'static [(u16, &'static str)]) -> Self {
        Self { width, entries }
    }

    /// Returns the label for a raw value, if it is a key of the table.
    pub fn label(&self, raw: u16) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(key, _)| *key == raw)
            .map(|(_, label)| *label)
    }

    /// Returns the raw value for a label, if the label is in the table.
    pub fn raw(&self, label: &str) -> Option<u16> {
        self.entries
            .iter()
            .find(|(_, l)| *l == label)
            .map(|(key, _)| *key)
    }

    /// Number of bytes the raw value occupies on the wire.
    pub fn width(&self) -> usize {
        self.width
    }

    /// All `(raw, label)` pairs, in table order.
    pub fn entries(&self) -> &'static [(u16, &'static str)] {
        self.entries
    }
}

/// On/off/toggle switch.
pub static STATES: EnumTable = EnumTable::new(1, &[(0, "off"), (1, "on"), (2, "togle")]);

/// Fan speed presets.
pub static SPEEDS: EnumTable = EnumTable::new(
    1,
    &[
        (0, "standby"),
        (1, "low"),
        (2, "medium"),
        (3, "high"),
        (0xFF, "manual"),
    ],
);

/// Timer modes.
pub static TIMER_MODES: EnumTable = EnumTable::new(1, &[(0, "off"), (1, "night"), (2, "party")]);

/// Read-only on/off statuses.
pub static STATUSES: EnumTable = EnumTable::new(1, &[(0, "off"), (1, "on")]);

/// Airflow modes.
pub static AIRFLOWS: EnumTable = EnumTable::new(
    1,
    &[(0, "ventilation"), (1, "heat_recovery"), (2, "air_supply")],
);

/// Alarm levels.
pub static ALARMS: EnumTable = EnumTable::new(1, &[(0, "no"), (1, "alarm"), (2, "warning")]);

/// Day selectors used by the weekly schedule.
pub static DAYS_OF_WEEK: EnumTable = EnumTable::new(
    1,
    &[
        (0, "all days"),
        (1, "Monday"),
        (2, "Tuesday"),
        (3, "Wednesday"),
        (4, "Thursday"),
        (5, "Friday"),
        (6, "Saturday"),
        (7, "Sunday"),
        (8, "Mon-Fri"),
        (9, "Sat-Sun"),
    ],
);

/// Unit models. The only two-byte enum.
pub static UNIT_TYPES: EnumTable = EnumTable::new(
    2,
    &[
        (0x0300, "Vento Expert A50-1/A85-1/A100-1 W V.2"),
        (0x0400, "Vento Expert Duo A30-1 W V.2"),
        (0x0500, "Vento Expert A30 W V.2"),
    ],
);

/// Wi-Fi operation modes.
pub static WIFI_OPERATION_MODES: EnumTable = EnumTable::new(1, &[(1, "client"), (2, "ap")]);

/// Wi-Fi encryption types.
pub static WIFI_ENC_TYPES: EnumTable = EnumTable::new(
    1,
    &[
        (48, "Open"),
        (50, "wpa-psk"),
        (51, "wpa2_psk"),
        (52, "wpa_wpa2_psk"),
    ],
);

/// Wi-Fi address assignment modes.
pub static WIFI_DHCPS: EnumTable = EnumTable::new(1, &[(0, "STATIC"), (1, "DHCP"), (2, "Invert")]);

/// Field layout of a duration-like value.
///
/// Fields are stored smallest unit first, so the byte order on the wire is the
/// reverse of the reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanLayout {
    /// 3 bytes: `[seconds, minutes, hours]`.
    HoursMinutesSeconds,
    /// 3 bytes: `[minutes, hours, days]`.
    DaysHoursMinutes,
    /// 4 bytes: `[minutes, hours, days_lo, days_hi]` (days little-endian).
    LongDaysHoursMinutes,
    /// 2 bytes: `[minutes, hours]`.
    HoursMinutes,
}

impl SpanLayout {
    /// Number of raw bytes for this layout.
    pub fn width(self) -> usize {
        match self {
            SpanLayout::HoursMinutesSeconds | SpanLayout::DaysHoursMinutes => 3,
            SpanLayout::LongDaysHoursMinutes => 4,
            SpanLayout::HoursMinutes => 2,
        }
    }
}

/// Shape of a parameter's value, selecting its decoder and encoder.
#[derive(Debug, Clone, Copy)]
pub enum ValueKind {
    /// Lookup in an enum table.
    Enum(&'static EnumTable),
    /// One byte scaled from 0-255 to 0-100 %.
    Percentage,
    /// Big-endian unsigned integer with a display unit (may be empty).
    Number {
        /// Unit suffix, e.g. `"%"` or `"m"`.
        unit: &'static str,
    },
    /// Two bytes reinterpreted as a little-endian integer, read-only.
    LittleEndian16 {
        /// Unit suffix, e.g. `"mV"` or `"rpm"`.
        unit: &'static str,
    },
    /// Duration-like value, see [`SpanLayout`].
    Span(SpanLayout),
    /// Real-time clock, 3 bytes `[seconds, minutes, hours]`.
    ClockTime,
    /// Real-time clock date, 4 bytes `[day, weekday, month, year - 2000]`.
    Date,
    /// Weekly schedule slot, 6 bytes.
    Schedule,
    /// ASCII text.
    Text,
    /// Firmware version and build date, read-only.
    Firmware,
    /// Dotted IPv4 address.
    Ipv4,
    /// Write-only action trigger without a readable value.
    Action,
}

/// Static description of one device parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParameterDescriptor {
    /// 16-bit parameter ID.
    pub id: u16,
    /// Unique parameter name. Kept byte-for-byte compatible with existing consumers.
    pub name: &'static str,
    /// Value shape.
    pub kind: ValueKind,
}

impl ParameterDescriptor {
    const fn new(id: u16, name: &'static str, kind: ValueKind) -> Self {
        Self { id, name, kind }
    }

    /// Returns the enum table, if the parameter is an enum.
    pub fn enum_table(&self) -> Option<&'static EnumTable> {
        match self.kind {
            ValueKind::Enum(table) => Some(table),
            _ => None,
        }
    }

    /// Returns whether this entry is a write-only action.
    pub fn is_action(&self) -> bool {
        matches!(self.kind, ValueKind::Action)
    }
}

const fn number(unit: &'static str) -> ValueKind {
    ValueKind::Number { unit }
}

const fn le16(unit: &'static str) -> ValueKind {
    ValueKind::LittleEndian16 { unit }
}

/// Readable parameters, in the order they are requested by a full read.
pub static PARAMETERS: &[ParameterDescriptor] = &[
    ParameterDescriptor::new(0x0001, "state", ValueKind::Enum(&STATES)),
    ParameterDescriptor::new(0x0002, "speed", ValueKind::Enum(&SPEEDS)),
    ParameterDescriptor::new(0x0006, "boost_status", ValueKind::Enum(&STATUSES)),
    ParameterDescriptor::new(0x0007, "timer_mode", ValueKind::Enum(&TIMER_MODES)),
    ParameterDescriptor::new(
        0x000B,
        "timer_counter",
        ValueKind::Span(SpanLayout::HoursMinutesSeconds),
    ),
    ParameterDescriptor::new(0x000F, "humidity_sensor_state", ValueKind::Enum(&STATES)),
    ParameterDescriptor::new(0x0014, "relay_sensor_state", ValueKind::Enum(&STATES)),
    ParameterDescriptor::new(0x0016, "analogV_sensor_state", ValueKind::Enum(&STATES)),
    ParameterDescriptor::new(0x0019, "humidity_treshold", number("%")),
    ParameterDescriptor::new(0x0024, "battery_voltage", le16("mV")),
    ParameterDescriptor::new(0x0025, "humidity", number("%")),
    ParameterDescriptor::new(0x002D, "analogV", number("")),
    ParameterDescriptor::new(0x0032, "relay_status", ValueKind::Enum(&STATUSES)),
    ParameterDescriptor::new(0x0044, "man_speed", ValueKind::Percentage),
    ParameterDescriptor::new(0x004A, "fan1_speed", le16("rpm")),
    ParameterDescriptor::new(0x004B, "fan2_speed", le16("rpm")),
    ParameterDescriptor::new(
        0x0064,
        "filter_timer_countdown",
        ValueKind::Span(SpanLayout::DaysHoursMinutes),
    ),
    ParameterDescriptor::new(0x0066, "boost_time", number("m")),
    ParameterDescriptor::new(0x006F, "rtc_time", ValueKind::ClockTime),
    ParameterDescriptor::new(0x0070, "rtc_date", ValueKind::Date),
    ParameterDescriptor::new(0x0072, "weekly_schedule_state", ValueKind::Enum(&STATES)),
    ParameterDescriptor::new(0x0077, "weekly_schedule_setup", ValueKind::Schedule),
    ParameterDescriptor::new(0x007C, "device_search", ValueKind::Text),
    ParameterDescriptor::new(0x007D, "device_password", ValueKind::Text),
    ParameterDescriptor::new(
        0x007E,
        "machine_hours",
        ValueKind::Span(SpanLayout::LongDaysHoursMinutes),
    ),
    ParameterDescriptor::new(0x0083, "alarm_status", ValueKind::Enum(&ALARMS)),
    ParameterDescriptor::new(0x0085, "cloud_server_state", ValueKind::Enum(&STATES)),
    ParameterDescriptor::new(0x0086, "firmware", ValueKind::Firmware),
    ParameterDescriptor::new(
        0x0088,
        "filter_replacement_status",
        ValueKind::Enum(&STATUSES),
    ),
    ParameterDescriptor::new(
        0x0094,
        "wifi_operation_mode",
        ValueKind::Enum(&WIFI_OPERATION_MODES),
    ),
    ParameterDescriptor::new(0x0095, "wifi_name", ValueKind::Text),
    ParameterDescriptor::new(0x0096, "wifi_pasword", ValueKind::Text),
    ParameterDescriptor::new(0x0099, "wifi_enc_type", ValueKind::Enum(&WIFI_ENC_TYPES)),
    ParameterDescriptor::new(0x009A, "wifi_freq_chnnel", number("")),
    ParameterDescriptor::new(0x009B, "wifi_dhcp", ValueKind::Enum(&WIFI_DHCPS)),
    ParameterDescriptor::new(0x009C, "wifi_assigned_ip", ValueKind::Ipv4),
    ParameterDescriptor::new(0x009D, "wifi_assigned_netmask", ValueKind::Ipv4),
    ParameterDescriptor::new(0x009E, "wifi_main_gateway", ValueKind::Ipv4),
    ParameterDescriptor::new(0x00A3, "curent_wifi_ip", ValueKind::Ipv4),
    ParameterDescriptor::new(0x00B7, "airflow", ValueKind::Enum(&AIRFLOWS)),
    ParameterDescriptor::new(0x00B8, "analogV_treshold", number("%")),
    ParameterDescriptor::new(0x00B9, "unit_type", ValueKind::Enum(&UNIT_TYPES)),
    ParameterDescriptor::new(
        0x0302,
        "night_mode_timer",
        ValueKind::Span(SpanLayout::HoursMinutes),
    ),
    ParameterDescriptor::new(
        0x0303,
        "party_mode_timer",
        ValueKind::Span(SpanLayout::HoursMinutes),
    ),
    ParameterDescriptor::new(0x0304, "humidity_status", ValueKind::Enum(&STATUSES)),
    ParameterDescriptor::new(0x0305, "analogV_status", ValueKind::Enum(&STATUSES)),
];

/// Write-only parameters. `weekly_schedule_setup` is also readable.
pub static WRITE_ONLY_PARAMETERS: &[ParameterDescriptor] = &[
    ParameterDescriptor::new(0x0065, "filter_timer_reset", ValueKind::Action),
    ParameterDescriptor::new(0x0077, "weekly_schedule_setup", ValueKind::Schedule),
    ParameterDescriptor::new(0x0080, "reset_alarms", ValueKind::Action),
    ParameterDescriptor::new(0x0087, "factory_reset", ValueKind::Action),
    ParameterDescriptor::new(0x00A0, "wifi_apply_and_quit", ValueKind::Action),
    ParameterDescriptor::new(0x00A2, "wifi_discard_and_quit", ValueKind::Action),
];

/// Looks up a readable parameter by ID.
pub fn lookup_by_id(id: u16) -> Option<&'static ParameterDescriptor> {
    PARAMETERS.iter().find(|p| p.id == id)
}

/// Looks up a readable parameter by name.
pub fn lookup_by_name(name: &str) -> Option<&'static ParameterDescriptor> {
    PARAMETERS.iter().find(|p| p.name == name)
}

/// Looks up a write-only parameter by name.
///
/// # Example
///
/// ```
/// use ecovent::params::lookup_write_only;
///
/// assert_eq!(lookup_write_only("factory_reset").unwrap().id, 0x0087);
/// assert!(lookup_write_only("speed").is_none());
/// ```
pub fn lookup_write_only(name: &str) -> Option<&'static ParameterDescriptor> {
    WRITE_ONLY_PARAMETERS.iter().find(|p| p.name == name)
}

/// Returns the enum label of a raw value for parameter `id`.
///
/// Absent when the parameter is unknown, not an enum, or `raw` is not a key.
pub fn decode_enum(id: u16, raw: u16) -> Option<&'static str> {
    lookup_by_id(id)?.enum_table()?.label(raw)
}

/// Returns the raw value for an enum label of parameter `id`.
pub fn encode_enum(id: u16, label: &str) -> Option<u16> {
    lookup_by_id(id)?.enum_table()?.raw(label)
}
