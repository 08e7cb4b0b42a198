//! Domain values and the per-parameter decoders and encoders.
//!
//! Raw bytes are interpreted according to the parameter's
//! [`ValueKind`](crate::params::ValueKind). Every decoder fails closed: a value
//! of the wrong width or out of range becomes an error for that one record.
//!
//! # Example
//!
//! ```
//! use ecovent::params::lookup_by_name;
//! use ecovent::{decode_value, encode_value, DomainValue};
//!
//! let man_speed = lookup_by_name("man_speed").unwrap();
//! assert_eq!(decode_value(man_speed, &[0xFF]).unwrap(), DomainValue::Percentage(100));
//!
//! let battery = lookup_by_name("battery_voltage").unwrap();
//! let value = decode_value(battery, &[0x01, 0x02]).unwrap();
//! assert_eq!(value.to_string(), "513 mV");
//!
//! let airflow = lookup_by_name("airflow").unwrap();
//! assert_eq!(encode_value(airflow, &DomainValue::Label("air_supply")).unwrap(), vec![0x02]);
//! ```

use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

use crate::error::{Result, VentError};
use crate::params::{EnumTable, ParameterDescriptor, SpanLayout, ValueKind, DAYS_OF_WEEK, SPEEDS};

/// Years on the device clock are stored as an offset from this year.
pub const DEVICE_EPOCH_YEAR: i32 = 2000;

/// Duration-like value (countdowns, timers, operating hours).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    /// Byte layout and display style.
    pub layout: SpanLayout,
    /// Days (zero for layouts without days).
    pub days: u16,
    /// Hours.
    pub hours: u8,
    /// Minutes.
    pub minutes: u8,
    /// Seconds (zero for layouts without seconds).
    pub seconds: u8,
}

impl TimeSpan {
    /// A `[minutes, hours]` span, as used by the night and party timers.
    pub fn hours_minutes(hours: u8, minutes: u8) -> Self {
        Self {
            layout: SpanLayout::HoursMinutes,
            days: 0,
            hours,
            minutes,
            seconds: 0,
        }
    }

    /// Converts to a standard duration.
    pub fn as_duration(&self) -> Duration {
        let secs = u64::from(self.days) * 86_400
            + u64::from(self.hours) * 3_600
            + u64::from(self.minutes) * 60
            + u64::from(self.seconds);
        Duration::from_secs(secs)
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.layout {
            SpanLayout::HoursMinutesSeconds => {
                write!(f, "{}h {}m {}s", self.hours, self.minutes, self.seconds)
            }
            SpanLayout::DaysHoursMinutes | SpanLayout::LongDaysHoursMinutes => {
                write!(f, "{}d {}h {}m", self.days, self.hours, self.minutes)
            }
            SpanLayout::HoursMinutes => write!(f, "{:02}h {:02}m", self.hours, self.minutes),
        }
    }
}

/// Real-time clock date with the device's own weekday number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceDate {
    /// Calendar date.
    pub date: NaiveDate,
    /// Weekday as stored by the device (1 = Monday).
    pub weekday: u8,
}

impl fmt::Display for DeviceDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.weekday, self.date)
    }
}

/// Firmware version and build date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion {
    /// Major version.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
    /// Build date.
    pub build_date: NaiveDate,
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} {}", self.major, self.minor, self.build_date)
    }
}

/// One slot of the weekly schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    /// Day selector, a key of [`DAYS_OF_WEEK`].
    pub day: u8,
    /// Slot index within the day.
    pub slot: u8,
    /// Speed code, a key of [`SPEEDS`].
    pub speed: u8,
    /// Hour the slot ends.
    pub end_hour: u8,
    /// Minute the slot ends.
    pub end_minute: u8,
}

impl ScheduleEntry {
    /// Label of the day selector.
    pub fn day_label(&self) -> Option<&'static str> {
        DAYS_OF_WEEK.label(u16::from(self.day))
    }

    /// Label of the speed.
    pub fn speed_label(&self) -> Option<&'static str> {
        SPEEDS.label(u16::from(self.speed))
    }
}

impl fmt::Display for ScheduleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}: to {}h {}m {}",
            self.day_label().unwrap_or("?"),
            self.slot,
            self.end_hour,
            self.end_minute,
            self.speed_label().unwrap_or("?")
        )
    }
}

/// A decoded parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainValue {
    /// Enum label.
    Label(&'static str),
    /// Percentage 0-100.
    Percentage(u8),
    /// Integer with a unit suffix (empty for unitless values).
    Number {
        /// The integer value.
        value: u32,
        /// Display unit.
        unit: &'static str,
    },
    /// Duration-like value.
    Span(TimeSpan),
    /// Time of day.
    Time(NaiveTime),
    /// Calendar date.
    Date(DeviceDate),
    /// IPv4 address.
    Address(Ipv4Addr),
    /// Firmware version.
    Version(FirmwareVersion),
    /// ASCII text. Also accepted as an enum label when writing.
    Text(String),
    /// Weekly schedule slot.
    Schedule(ScheduleEntry),
}

impl DomainValue {
    /// A unitless number, convenient for writes.
    pub fn number(value: u32) -> Self {
        DomainValue::Number { value, unit: "" }
    }

    /// Short name of the variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DomainValue::Label(_) => "label",
            DomainValue::Percentage(_) => "percentage",
            DomainValue::Number { .. } => "number",
            DomainValue::Span(_) => "duration",
            DomainValue::Time(_) => "time",
            DomainValue::Date(_) => "date",
            DomainValue::Address(_) => "address",
            DomainValue::Version(_) => "version",
            DomainValue::Text(_) => "text",
            DomainValue::Schedule(_) => "schedule",
        }
    }

    /// Returns the label or text, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DomainValue::Label(label) => Some(label),
            DomainValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for DomainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainValue::Label(label) => f.write_str(label),
            DomainValue::Percentage(p) => write!(f, "{} %", p),
            DomainValue::Number { value, unit } if unit.is_empty() => write!(f, "{}", value),
            DomainValue::Number { value, unit } => write!(f, "{} {}", value, unit),
            DomainValue::Span(span) => write!(f, "{}", span),
            DomainValue::Time(time) => write!(f, "{}", time),
            DomainValue::Date(date) => write!(f, "{}", date),
            DomainValue::Address(addr) => write!(f, "{}", addr),
            DomainValue::Version(version) => write!(f, "{}", version),
            DomainValue::Text(text) => f.write_str(text),
            DomainValue::Schedule(entry) => write!(f, "{}", entry),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DomainValue {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            DomainValue::Label(label) => serializer.serialize_str(label),
            DomainValue::Percentage(p) => serializer.serialize_u8(*p),
            DomainValue::Number { value, .. } => serializer.serialize_u32(*value),
            DomainValue::Text(text) => serializer.serialize_str(text),
            other => serializer.collect_str(other),
        }
    }
}

fn expect_len(param: &ParameterDescriptor, raw: &[u8], len: usize) -> Result<()> {
    if raw.len() == len {
        Ok(())
    } else {
        Err(VentError::invalid_value(
            param.name,
            format!("expected {} byte(s), got {}", len, raw.len()),
        ))
    }
}

fn check_range(param: &ParameterDescriptor, field: &str, value: u8, max: u8) -> Result<()> {
    if value <= max {
        Ok(())
    } else {
        Err(VentError::invalid_value(
            param.name,
            format!("{} {} out of range 0-{}", field, value, max),
        ))
    }
}

fn decode_enum_value(
    param: &ParameterDescriptor,
    table: &EnumTable,
    raw: &[u8],
) -> Result<DomainValue> {
    expect_len(param, raw, table.width())?;
    let key = raw.iter().fold(0u16, |acc, &b| acc << 8 | u16::from(b));
    table
        .label(key)
        .map(DomainValue::Label)
        .ok_or(VentError::EnumDecode {
            parameter: param.name,
            raw: key,
        })
}

fn decode_span(param: &ParameterDescriptor, layout: SpanLayout, raw: &[u8]) -> Result<TimeSpan> {
    expect_len(param, raw, layout.width())?;
    let mut span = TimeSpan {
        layout,
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
    };
    match layout {
        SpanLayout::HoursMinutesSeconds => {
            span.seconds = raw[0];
            span.minutes = raw[1];
            span.hours = raw[2];
            check_range(param, "seconds", span.seconds, 59)?;
        }
        SpanLayout::DaysHoursMinutes => {
            span.minutes = raw[0];
            span.hours = raw[1];
            span.days = u16::from(raw[2]);
            check_range(param, "hours", span.hours, 23)?;
        }
        SpanLayout::LongDaysHoursMinutes => {
            span.minutes = raw[0];
            span.hours = raw[1];
            span.days = u16::from_le_bytes([raw[2], raw[3]]);
            check_range(param, "hours", span.hours, 23)?;
        }
        SpanLayout::HoursMinutes => {
            span.minutes = raw[0];
            span.hours = raw[1];
        }
    }
    check_range(param, "minutes", span.minutes, 59)?;
    Ok(span)
}

fn check_write_range(param: &ParameterDescriptor, field: &str, value: u8, max: u8) -> Result<()> {
    if value <= max {
        Ok(())
    } else {
        Err(VentError::unsupported_write(
            param.name,
            format!("{} {} out of range 0-{}", field, value, max),
        ))
    }
}

/// Same ranges as `decode_span`.
fn encode_span(param: &ParameterDescriptor, span: &TimeSpan) -> Result<Vec<u8>> {
    check_write_range(param, "minutes", span.minutes, 59)?;
    match span.layout {
        SpanLayout::HoursMinutesSeconds => {
            check_write_range(param, "seconds", span.seconds, 59)?;
            Ok(vec![span.seconds, span.minutes, span.hours])
        }
        SpanLayout::DaysHoursMinutes => {
            check_write_range(param, "hours", span.hours, 23)?;
            let days = u8::try_from(span.days).map_err(|_| {
                VentError::unsupported_write(
                    param.name,
                    format!("days {} out of range 0-255", span.days),
                )
            })?;
            Ok(vec![span.minutes, span.hours, days])
        }
        SpanLayout::LongDaysHoursMinutes => {
            check_write_range(param, "hours", span.hours, 23)?;
            let [lo, hi] = span.days.to_le_bytes();
            Ok(vec![span.minutes, span.hours, lo, hi])
        }
        SpanLayout::HoursMinutes => Ok(vec![span.minutes, span.hours]),
    }
}

fn decode_text(param: &ParameterDescriptor, raw: &[u8]) -> Result<String> {
    let trimmed = match raw.iter().rposition(|&b| b != 0) {
        Some(last) => &raw[..=last],
        None => &[][..],
    };
    if !trimmed.is_ascii() {
        return Err(VentError::invalid_value(param.name, "text is not ASCII"));
    }
    Ok(String::from_utf8_lossy(trimmed).into_owned())
}

fn decode_schedule(param: &ParameterDescriptor, raw: &[u8]) -> Result<ScheduleEntry> {
    expect_len(param, raw, 6)?;
    let entry = ScheduleEntry {
        day: raw[0],
        slot: raw[1],
        speed: raw[2],
        end_minute: raw[4],
        end_hour: raw[5],
    };
    if entry.day_label().is_none() {
        return Err(VentError::EnumDecode {
            parameter: param.name,
            raw: u16::from(entry.day),
        });
    }
    if entry.speed_label().is_none() {
        return Err(VentError::EnumDecode {
            parameter: param.name,
            raw: u16::from(entry.speed),
        });
    }
    check_range(param, "end hour", entry.end_hour, 23)?;
    check_range(param, "end minute", entry.end_minute, 59)?;
    Ok(entry)
}

/// Decodes the raw bytes of a record into a domain value.
///
/// # Errors
///
/// Returns `VentError::EnumDecode` for an unknown enum value and
/// `VentError::InvalidValue` for any other unusable bytes.
pub fn decode_value(param: &ParameterDescriptor, raw: &[u8]) -> Result<DomainValue> {
    match param.kind {
        ValueKind::Enum(table) => decode_enum_value(param, table, raw),
        ValueKind::Percentage => {
            expect_len(param, raw, 1)?;
            let percent = (u32::from(raw[0]) * 100 + 127) / 255;
            Ok(DomainValue::Percentage(percent as u8))
        }
        ValueKind::Number { unit } => {
            if raw.is_empty() || raw.len() > 4 {
                return Err(VentError::invalid_value(
                    param.name,
                    format!("expected 1-4 bytes, got {}", raw.len()),
                ));
            }
            let value = raw.iter().fold(0u32, |acc, &b| acc << 8 | u32::from(b));
            Ok(DomainValue::Number { value, unit })
        }
        ValueKind::LittleEndian16 { unit } => {
            expect_len(param, raw, 2)?;
            let value = u16::from_le_bytes([raw[0], raw[1]]);
            Ok(DomainValue::Number {
                value: u32::from(value),
                unit,
            })
        }
        ValueKind::Span(layout) => decode_span(param, layout, raw).map(DomainValue::Span),
        ValueKind::ClockTime => {
            expect_len(param, raw, 3)?;
            NaiveTime::from_hms_opt(u32::from(raw[2]), u32::from(raw[1]), u32::from(raw[0]))
                .map(DomainValue::Time)
                .ok_or_else(|| {
                    VentError::invalid_value(
                        param.name,
                        format!("invalid time {}:{}:{}", raw[2], raw[1], raw[0]),
                    )
                })
        }
        ValueKind::Date => {
            expect_len(param, raw, 4)?;
            let year = DEVICE_EPOCH_YEAR + i32::from(raw[3]);
            let date = NaiveDate::from_ymd_opt(year, u32::from(raw[2]), u32::from(raw[0]))
                .ok_or_else(|| {
                    VentError::invalid_value(
                        param.name,
                        format!("invalid date {}-{}-{}", year, raw[2], raw[0]),
                    )
                })?;
            check_range(param, "weekday", raw[1], 7)?;
            Ok(DomainValue::Date(DeviceDate {
                date,
                weekday: raw[1],
            }))
        }
        ValueKind::Schedule => decode_schedule(param, raw).map(DomainValue::Schedule),
        ValueKind::Text => decode_text(param, raw).map(DomainValue::Text),
        ValueKind::Firmware => {
            expect_len(param, raw, 6)?;
            let year = u16::from_le_bytes([raw[4], raw[5]]);
            let build_date =
                NaiveDate::from_ymd_opt(i32::from(year), u32::from(raw[3]), u32::from(raw[2]))
                    .ok_or_else(|| {
                        VentError::invalid_value(
                            param.name,
                            format!("invalid build date {}-{}-{}", year, raw[3], raw[2]),
                        )
                    })?;
            Ok(DomainValue::Version(FirmwareVersion {
                major: raw[0],
                minor: raw[1],
                build_date,
            }))
        }
        ValueKind::Ipv4 => {
            expect_len(param, raw, 4)?;
            Ok(DomainValue::Address(Ipv4Addr::new(
                raw[0], raw[1], raw[2], raw[3],
            )))
        }
        ValueKind::Action => Err(VentError::invalid_value(
            param.name,
            "write-only parameter has no readable value",
        )),
    }
}

fn mismatch(param: &ParameterDescriptor, value: &DomainValue) -> VentError {
    VentError::unsupported_write(
        param.name,
        format!("a {} value does not fit this parameter", value.kind_name()),
    )
}

/// Encodes a domain value into raw bytes for a write.
///
/// # Errors
///
/// Returns `VentError::UnsupportedWriteValue` if the parameter is read-only,
/// the value has the wrong shape, an enum label is unknown, or the value is
/// out of range.
pub fn encode_value(param: &ParameterDescriptor, value: &DomainValue) -> Result<Vec<u8>> {
    match (param.kind, value) {
        (ValueKind::Enum(table), DomainValue::Label(_) | DomainValue::Text(_)) => {
            let label = value.as_str().unwrap_or_default();
            let raw = table.raw(label).ok_or_else(|| {
                VentError::unsupported_write(param.name, format!("unknown label '{}'", label))
            })?;
            let bytes = raw.to_be_bytes();
            Ok(bytes[bytes.len() - table.width()..].to_vec())
        }
        (ValueKind::Percentage, DomainValue::Percentage(p)) => {
            if *p > 100 {
                return Err(VentError::unsupported_write(
                    param.name,
                    format!("percentage {} exceeds 100", p),
                ));
            }
            let raw = (u32::from(*p) * 255 + 99) / 100;
            Ok(vec![raw as u8])
        }
        (ValueKind::Number { .. }, DomainValue::Number { value: n, .. }) => {
            u8::try_from(*n).map(|b| vec![b]).map_err(|_| {
                VentError::unsupported_write(param.name, format!("{} does not fit in one byte", n))
            })
        }
        (ValueKind::Span(layout), DomainValue::Span(span)) => {
            if span.layout != layout {
                return Err(VentError::unsupported_write(
                    param.name,
                    format!("expected a {:?} duration", layout),
                ));
            }
            encode_span(param, span)
        }
        (ValueKind::ClockTime, DomainValue::Time(time)) => Ok(vec![
            time.second() as u8,
            time.minute() as u8,
            time.hour() as u8,
        ]),
        (ValueKind::Date, DomainValue::Date(d)) => {
            check_write_range(param, "weekday", d.weekday, 7)?;
            let offset = d.date.year() - DEVICE_EPOCH_YEAR;
            let offset = u8::try_from(offset).map_err(|_| {
                VentError::unsupported_write(
                    param.name,
                    format!("year {} outside the device range", d.date.year()),
                )
            })?;
            Ok(vec![
                d.date.day() as u8,
                d.weekday,
                d.date.month() as u8,
                offset,
            ])
        }
        (ValueKind::Schedule, DomainValue::Schedule(e)) => {
            if e.day_label().is_none() || e.speed_label().is_none() {
                return Err(VentError::unsupported_write(
                    param.name,
                    "unknown day or speed code",
                ));
            }
            check_write_range(param, "end hour", e.end_hour, 23)?;
            check_write_range(param, "end minute", e.end_minute, 59)?;
            Ok(vec![e.day, e.slot, e.speed, 0x00, e.end_minute, e.end_hour])
        }
        (ValueKind::Text, DomainValue::Text(text)) => {
            // an empty value would go out as a bare read request
            if text.is_empty() {
                return Err(VentError::unsupported_write(param.name, "text must not be empty"));
            }
            if !text.is_ascii() || text.len() > u8::MAX as usize {
                return Err(VentError::unsupported_write(
                    param.name,
                    "text must be ASCII and at most 255 bytes",
                ));
            }
            Ok(text.as_bytes().to_vec())
        }
        (ValueKind::Ipv4, DomainValue::Address(addr)) => Ok(addr.octets().to_vec()),
        (ValueKind::LittleEndian16 { .. } | ValueKind::Firmware, _) => Err(
            VentError::unsupported_write(param.name, "parameter is read-only"),
        ),
        (ValueKind::Action, _) => Err(VentError::unsupported_write(
            param.name,
            "write-only action takes no value",
        )),
        _ => Err(mismatch(param, value)),
    }
}
