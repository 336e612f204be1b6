use nom::number::streaming::{be_i64, be_u16, be_u64, le_f64};
use rusticata_macros::newtype_enum;

use crate::error::DResult;
use crate::frame::NsTime;
use crate::tree::{FieldValue, WireStr};
use crate::value_string::ValueString;

/// `type[2] length[2]`, big-endian; the length includes the header
pub const PART_HEADER_LEN: usize = 4;
/// Header and one 8-byte number
pub const NUMERIC_PART_LEN: usize = 12;
/// Header, value count, and at least one value
pub const VALUES_PART_MIN_LEN: usize = 15;
/// Header and a SHA-256 hash
pub const SIGN_PART_MIN_LEN: usize = 36;
/// Header, username length, IV and SHA-1 checksum
pub const ENCR_PART_MIN_LEN: usize = 42;

#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct PartType(pub u16);

newtype_enum! {
impl debug PartType {
    Host = 0x0000,
    Time = 0x0001,
    Plugin = 0x0002,
    PluginInstance = 0x0003,
    Type = 0x0004,
    TypeInstance = 0x0005,
    Values = 0x0006,
    Interval = 0x0007,
    TimeHr = 0x0008,
    IntervalHr = 0x0009,
    Message = 0x0100,
    Severity = 0x0101,
    SignSha256 = 0x0200,
    EncrAes256 = 0x0210,
}
}

pub static COLLECTD_PART_TYPES: &[ValueString] = &[
    (0x0000, "HOST"),
    (0x0001, "TIME"),
    (0x0002, "PLUGIN"),
    (0x0003, "PLUGIN_INSTANCE"),
    (0x0004, "TYPE"),
    (0x0005, "TYPE_INSTANCE"),
    (0x0006, "VALUES"),
    (0x0007, "INTERVAL"),
    (0x0008, "TIME_HR"),
    (0x0009, "INTERVAL_HR"),
    (0x0100, "MESSAGE"),
    (0x0101, "SEVERITY"),
    (0x0200, "SIGN_SHA256"),
    (0x0210, "ENCR_AES256"),
];

/// Kind of a value in a VALUES part
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct DataSourceType(pub u8);

newtype_enum! {
impl debug DataSourceType {
    Counter = 0,
    Gauge = 1,
    Derive = 2,
    Absolute = 3,
}
}

pub static COLLECTD_DS_TYPES: &[ValueString] = &[
    (0, "COUNTER"),
    (1, "GAUGE"),
    (2, "DERIVE"),
    (3, "ABSOLUTE"),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartHeader {
    pub part_type: PartType,
    pub length: u16,
}

pub fn parse_part_header(i: &[u8]) -> DResult<PartHeader> {
    let (i, part_type) = be_u16(i)?;
    let (i, length) = be_u16(i)?;
    let header = PartHeader {
        part_type: PartType(part_type),
        length,
    };
    Ok((i, header))
}

/// A string part: the whole input, up to the first NUL byte
pub fn parse_part_string(i: &[u8]) -> DResult<WireStr> {
    let end = i.iter().position(|&b| b == 0).unwrap_or_else(|| i.len());
    Ok((&i[i.len()..], WireStr(&i[..end])))
}

/// Convert a high-resolution time (units of 2^-30 seconds)
pub fn cdtime_to_nstime(v: u64) -> NsTime {
    let secs = (v >> 30) as i64;
    let frac = v & ((1 << 30) - 1);
    let nsecs = ((frac * 1_000_000_000) >> 30) as i32;
    NsTime::new(secs, nsecs)
}

/// Time in seconds (TIME, INTERVAL)
pub fn parse_seconds(i: &[u8]) -> DResult<NsTime> {
    let (i, v) = be_u64(i)?;
    Ok((i, NsTime::new(v as i64, 0)))
}

/// High-resolution time (TIME_HR, INTERVAL_HR)
pub fn parse_cdtime(i: &[u8]) -> DResult<NsTime> {
    let (i, v) = be_u64(i)?;
    Ok((i, cdtime_to_nstime(v)))
}

/// One value of a VALUES part
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Counter(u64),
    Gauge(f64),
    Derive(i64),
    Absolute(u64),
    Unknown(u64),
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Counter(v) | Value::Absolute(v) => FieldValue::UInt(v),
            Value::Gauge(v) => FieldValue::Double(v),
            Value::Derive(v) => FieldValue::Int(v),
            Value::Unknown(v) => FieldValue::Bytes(v.to_be_bytes().to_vec()),
        }
    }
}

/// Parse a value of kind `ds_type`
///
/// Gauges are little-endian doubles, all other kinds are big-endian integers.
pub fn parse_value(ds_type: DataSourceType, i: &[u8]) -> DResult<Value> {
    match ds_type {
        DataSourceType::Counter => be_u64(i).map(|(i, v)| (i, Value::Counter(v))),
        DataSourceType::Gauge => le_f64(i).map(|(i, v)| (i, Value::Gauge(v))),
        DataSourceType::Derive => be_i64(i).map(|(i, v)| (i, Value::Derive(v))),
        DataSourceType::Absolute => be_u64(i).map(|(i, v)| (i, Value::Absolute(v))),
        _ => be_u64(i).map(|(i, v)| (i, Value::Unknown(v))),
    }
}

/// Expected length of a VALUES part holding `count` values
#[inline]
pub fn values_part_len(count: usize) -> usize {
    PART_HEADER_LEN + 2 + 9 * count
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn header() {
        let (rem, h) = parse_part_header(&hex!("00 06 00 18 ff")).expect("header");
        assert_eq!(rem, &[0xff]);
        assert_eq!(h.part_type, PartType::Values);
        assert_eq!(h.length, 24);
    }

    #[test]
    fn values_of_each_kind() {
        let (_, v) = parse_value(DataSourceType::Counter, &hex!("00 00 00 00 00 00 01 00")).expect("counter");
        assert_eq!(v, Value::Counter(256));
        let (_, v) = parse_value(DataSourceType::Gauge, &hex!("00 00 00 00 00 00 f0 3f")).expect("gauge");
        assert_eq!(v, Value::Gauge(1.0));
        let (_, v) = parse_value(DataSourceType::Derive, &hex!("ff ff ff ff ff ff ff fe")).expect("derive");
        assert_eq!(v, Value::Derive(-2));
        assert_eq!(values_part_len(2), 24);
    }

    #[test]
    fn strings_and_times() {
        let (rem, s) = parse_part_string(b"host\0\0").expect("string");
        assert!(rem.is_empty());
        assert_eq!(s.to_string_lossy(), "host");
        assert_eq!(cdtime_to_nstime((10 << 30) | (1 << 29)), NsTime::new(10, 500_000_000));
    }
}
