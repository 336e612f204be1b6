use std::collections::BTreeSet;
use std::fmt::Write;
use std::ops::Range;

use nom::bytes::streaming::take;
use nom::number::streaming::{be_u16, be_u64, le_u8};
use nom::Offset;
use tracing::{debug, trace};

use crate::collectd::fields::*;
use crate::collectd::part::*;
use crate::column::ColumnFormat;
use crate::dissector::Dissector;
use crate::error::{check_length, flatten, DissectError};
use crate::frame::{NsTime, PortType};
use crate::packet::PacketContext;
use crate::prefs::CollectdPrefs;
use crate::tree::{HeaderField, ItemParser, NodeId, ProtoTree, WireStr};
use crate::value_string::val_to_str;

/// Identification of the values being sent, as a collectd server would rebuild it
///
/// Each string or time part updates one member; each VALUES part is dispatched with the
/// members in effect at that point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueDispatch {
    pub host: Option<String>,
    pub plugin: Option<String>,
    pub plugin_instance: Option<String>,
    pub type_name: Option<String>,
    pub type_instance: Option<String>,
    pub time: Option<NsTime>,
    pub interval: Option<NsTime>,
}

/// Counters of one packet, used for the Info column
#[derive(Debug, Default)]
pub struct PacketSummary {
    /// First host name of the packet
    pub host: Option<String>,
    pub values: usize,
    pub plugins: BTreeSet<String>,
    pub types: BTreeSet<String>,
    pub notifications: usize,
    pub unknown: usize,
    pub errors: usize,
    pub signed: bool,
    pub encrypted: bool,
}

fn plural(n: usize, singular: &'static str, plural: &'static str) -> &'static str {
    if n == 1 {
        singular
    } else {
        plural
    }
}

impl PacketSummary {
    /// Text of the Info column
    pub fn info(&self) -> String {
        let mut s = format!("Host={}, ", self.host.as_deref().unwrap_or("???"));
        let _ = write!(
            s,
            "{} {} for {} {} {} {}",
            self.values,
            plural(self.values, "value", "values"),
            self.plugins.len(),
            plural(self.plugins.len(), "plugin", "plugins"),
            self.types.len(),
            plural(self.types.len(), "type", "types"),
        );
        if self.notifications > 0 {
            let _ = write!(
                s,
                ", {} {}",
                self.notifications,
                plural(self.notifications, "notification", "notifications")
            );
        }
        if self.unknown > 0 {
            let _ = write!(
                s,
                ", {} unknown {}",
                self.unknown,
                plural(self.unknown, "item", "items")
            );
        }
        if self.errors > 0 {
            let _ = write!(s, ", {} {}", self.errors, plural(self.errors, "error", "errors"));
        }
        if self.signed {
            s.push_str(", signed");
        }
        if self.encrypted {
            s.push_str(", encrypted");
        }
        s
    }
}

/// Reason a part could not be decoded
enum PartError<'a> {
    /// The declared length does not fit the part type
    Length(String),
    Parse(nom::Err<DissectError<&'a [u8]>>),
}

impl<'a> From<nom::Err<DissectError<&'a [u8]>>> for PartError<'a> {
    fn from(e: nom::Err<DissectError<&'a [u8]>>) -> Self {
        PartError::Parse(e)
    }
}

fn string_field(part_type: PartType) -> Option<&'static HeaderField> {
    let hf = match part_type {
        PartType::Host => &HF_HOST,
        PartType::Plugin => &HF_PLUGIN,
        PartType::PluginInstance => &HF_PLUGIN_INSTANCE,
        PartType::Type => &HF_TYPE,
        PartType::TypeInstance => &HF_TYPE_INSTANCE,
        PartType::Message => &HF_MESSAGE,
        _ => return None,
    };
    Some(hf)
}

fn value_field(ds_type: DataSourceType) -> &'static HeaderField {
    match ds_type {
        DataSourceType::Counter => &HF_VAL_COUNTER,
        DataSourceType::Gauge => &HF_VAL_GAUGE,
        DataSourceType::Derive => &HF_VAL_DERIVE,
        DataSourceType::Absolute => &HF_VAL_ABSOLUTE,
        _ => &HF_VAL_UNKNOWN,
    }
}

/// Dissector of the collectd binary network protocol
#[derive(Debug, Default)]
pub struct CollectdDissector {
    prefs: CollectdPrefs,
}

impl CollectdDissector {
    pub fn new(prefs: CollectdPrefs) -> CollectdDissector {
        CollectdDissector { prefs }
    }

    fn dissect_part<'a>(
        &self,
        cx: &mut PacketContext,
        part_root: NodeId,
        data: &'a [u8],
        header: PartHeader,
        body: &'a [u8],
        dispatch: &mut ValueDispatch,
        summary: &mut PacketSummary,
    ) -> Result<(), PartError<'a>> {
        let length = usize::from(header.length);
        let mut r = ItemParser::new(&mut cx.tree, part_root, data, body);
        match header.part_type {
            PartType::Host
            | PartType::Plugin
            | PartType::PluginInstance
            | PartType::Type
            | PartType::TypeInstance
            | PartType::Message => {
                let hf = string_field(header.part_type).unwrap_or(&HF_PART_DATA);
                let s = r.item(hf, parse_part_string)?.to_string_lossy();
                r.tree.append_text(part_root, &format!(": {}", s));
                match header.part_type {
                    PartType::Host => {
                        if summary.host.is_none() {
                            summary.host = Some(s.clone());
                        }
                        dispatch.host = Some(s);
                    }
                    PartType::Plugin => dispatch.plugin = Some(s),
                    PartType::PluginInstance => dispatch.plugin_instance = Some(s),
                    PartType::Type => dispatch.type_name = Some(s),
                    PartType::TypeInstance => dispatch.type_instance = Some(s),
                    _ => summary.notifications += 1,
                }
            }
            PartType::Time | PartType::Interval | PartType::TimeHr | PartType::IntervalHr | PartType::Severity => {
                if length != NUMERIC_PART_LEN {
                    return Err(PartError::Length(format!(
                        "Invalid length {} (expected {} bytes)",
                        length, NUMERIC_PART_LEN
                    )));
                }
                match header.part_type {
                    PartType::Time => dispatch.time = Some(r.item(&HF_TIME, parse_seconds)?),
                    PartType::TimeHr => dispatch.time = Some(r.item(&HF_TIME_HR, parse_cdtime)?),
                    PartType::Interval => dispatch.interval = Some(r.item(&HF_INTERVAL, parse_seconds)?),
                    PartType::IntervalHr => {
                        dispatch.interval = Some(r.item(&HF_INTERVAL_HR, parse_cdtime)?)
                    }
                    _ => {
                        r.item(&HF_SEVERITY, be_u64)?;
                    }
                }
            }
            PartType::Values => {
                if length < VALUES_PART_MIN_LEN {
                    return Err(PartError::Length(format!(
                        "Invalid length {} (minimum is {} bytes)",
                        length, VALUES_PART_MIN_LEN
                    )));
                }
                let count = usize::from(r.item(&HF_VALUE_COUNT, be_u16)?);
                if length != values_part_len(count) {
                    return Err(PartError::Length(format!(
                        "Number of values ({}) does not match length {} (expected {})",
                        count,
                        length,
                        values_part_len(count)
                    )));
                }
                let prev = r.open("Data types");
                let mut types = Vec::with_capacity(count);
                for _ in 0..count {
                    let ds_type = DataSourceType(r.parse(le_u8)?);
                    let start = r.offset() - 1;
                    let name = val_to_str(u32::from(ds_type.0), COLLECTD_DS_TYPES);
                    r.tree
                        .add_item(r.parent, &HF_VALUE_TYPE, start..start + 1, &*name);
                    types.push(ds_type);
                }
                r.close(prev);
                let prev = r.open("Values");
                let mut unknown = Vec::new();
                for &ds_type in &types {
                    let start = r.offset();
                    if let Value::Unknown(_) = r.item(value_field(ds_type), |i| parse_value(ds_type, i))? {
                        unknown.push((start..start + 8, ds_type));
                    }
                }
                r.close(prev);
                self.dispatch_values(r.tree, part_root, dispatch, count, summary);
                for (range, ds_type) in unknown {
                    cx.add_expert(
                        part_root,
                        &EI_UNKNOWN_VALUE_TYPE,
                        range,
                        format!("Unknown data source type {}", ds_type.0),
                    );
                }
            }
            PartType::SignSha256 => {
                if length < SIGN_PART_MIN_LEN {
                    return Err(PartError::Length(format!(
                        "Invalid length {} (minimum is {} bytes)",
                        length, SIGN_PART_MIN_LEN
                    )));
                }
                r.item(&HF_SIGN_HASH, take(32usize))?;
                r.item(&HF_USERNAME, parse_part_string)?;
                summary.signed = true;
            }
            PartType::EncrAes256 => {
                if length < ENCR_PART_MIN_LEN {
                    return Err(PartError::Length(format!(
                        "Invalid length {} (minimum is {} bytes)",
                        length, ENCR_PART_MIN_LEN
                    )));
                }
                let user_len = r.item(&HF_USERNAME_LEN, be_u16)?;
                if length < ENCR_PART_MIN_LEN + usize::from(user_len) {
                    return Err(PartError::Length(format!(
                        "Username length {} does not fit in part length {}",
                        user_len, length
                    )));
                }
                r.item(&HF_USERNAME, |i| {
                    let (i, s) = take(user_len)(i)?;
                    Ok((i, WireStr(s)))
                })?;
                r.item(&HF_ENCR_IV, take(16usize))?;
                let rest = r.rest.len();
                let start = r.offset();
                r.item(&HF_ENCR_DATA, take(rest))?;
                summary.encrypted = true;
                cx.add_expert_summary(part_root, &EI_ENCRYPTED, start..start + rest);
            }
            _ => {
                let start = data.offset(body);
                r.item(&HF_PART_DATA, take(body.len()))?;
                summary.unknown += 1;
                cx.add_expert(
                    part_root,
                    &EI_UNKNOWN_PART,
                    start - PART_HEADER_LEN..start + body.len(),
                    format!("Unknown part type 0x{:04x}", header.part_type.0),
                );
            }
        }
        Ok(())
    }

    /// Show the identification a VALUES part is dispatched with, and count it
    fn dispatch_values(
        &self,
        tree: &mut ProtoTree,
        part_root: NodeId,
        dispatch: &ValueDispatch,
        count: usize,
        summary: &mut PacketSummary,
    ) {
        let node = tree.add_text(part_root, 0..0, "Dispatch simulation");
        let strings: [(&'static HeaderField, &Option<String>); 5] = [
            (&HF_DISP_HOST, &dispatch.host),
            (&HF_DISP_PLUGIN, &dispatch.plugin),
            (&HF_DISP_PLUGIN_INSTANCE, &dispatch.plugin_instance),
            (&HF_DISP_TYPE, &dispatch.type_name),
            (&HF_DISP_TYPE_INSTANCE, &dispatch.type_instance),
        ];
        for &(hf, value) in strings.iter() {
            tree.add_generated(node, hf, value.as_deref().unwrap_or("(null)"));
        }
        if let Some(t) = dispatch.time {
            tree.add_generated(node, &HF_DISP_TIME, t);
        }
        if let Some(t) = dispatch.interval {
            tree.add_generated(node, &HF_DISP_INTERVAL, t);
        }
        summary.values += count;
        summary
            .plugins
            .insert(dispatch.plugin.clone().unwrap_or_default());
        summary
            .types
            .insert(dispatch.type_name.clone().unwrap_or_default());
    }

    fn malformed(cx: &mut PacketContext, node: NodeId, range: Range<usize>, message: String, summary: &mut PacketSummary) {
        summary.errors += 1;
        cx.add_expert(node, &EI_MALFORMED, range, message);
    }
}

impl Dissector for CollectdDissector {
    fn short_name(&self) -> &'static str {
        "collectd"
    }

    fn full_name(&self) -> &'static str {
        "collectd network data"
    }

    fn filter_name(&self) -> &'static str {
        "collectd"
    }

    fn ports(&self) -> Vec<(PortType, u16)> {
        vec![(PortType::Udp, self.prefs.udp_port)]
    }

    fn dissect(&mut self, cx: &mut PacketContext, data: &[u8]) -> usize {
        cx.columns.set_str(ColumnFormat::Protocol, "collectd");
        cx.columns.clear(ColumnFormat::Info);
        let root = cx
            .tree
            .add_text(NodeId::ROOT, 0..data.len(), "collectd network data");
        let mut dispatch = ValueDispatch::default();
        let mut summary = PacketSummary::default();
        let mut offset = 0;
        while offset < data.len() {
            let i = &data[offset..];
            if i.len() < PART_HEADER_LEN {
                summary.errors += 1;
                cx.add_expert(
                    root,
                    &EI_GARBAGE,
                    offset..data.len(),
                    format!("Garbage at end of packet: Length = {}", i.len()),
                );
                break;
            }
            let header = match parse_part_header(i) {
                Ok((_, h)) => h,
                Err(_) => break,
            };
            let length = usize::from(header.length);
            let name = val_to_str(u32::from(header.part_type.0), COLLECTD_PART_TYPES);
            let part_root = cx.tree.add_text(
                root,
                offset..offset + length.clamp(PART_HEADER_LEN, i.len()),
                format!("collectd {} segment", name),
            );
            cx.tree
                .add_item(part_root, &HF_PART_TYPE, offset..offset + 2, &*name);
            cx.tree
                .add_item(part_root, &HF_PART_LENGTH, offset + 2..offset + 4, header.length);
            trace!(frame = cx.frame.number, offset, part_type = ?header.part_type, length, "collectd part");

            if let Err(e) = check_length(i, length, PART_HEADER_LEN) {
                let e = flatten(e);
                debug!(frame = cx.frame.number, offset, length, "invalid collectd part length");
                Self::malformed(cx, part_root, offset + 2..offset + 4, e.to_string(), &mut summary);
                break;
            }
            let body = &i[PART_HEADER_LEN..length];
            let result = self.dissect_part(cx, part_root, data, header, body, &mut dispatch, &mut summary);
            match result {
                Ok(()) => (),
                Err(PartError::Length(message)) => {
                    let message = format!("{}: {}", name, message);
                    Self::malformed(cx, part_root, offset..offset + length, message, &mut summary);
                }
                Err(PartError::Parse(e)) => {
                    let e = flatten(e);
                    let start = match e {
                        DissectError::Incomplete(_) | DissectError::OwnedNomError(..) => offset,
                        _ => e.offset_in(data),
                    };
                    let message = format!("{}: {}", name, e);
                    Self::malformed(cx, part_root, start..offset + length, message, &mut summary);
                }
            }
            offset += length;
        }
        let info = summary.info();
        cx.columns.add_str(ColumnFormat::Info, &info);
        data.len()
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_text() {
        let mut s = PacketSummary::default();
        assert_eq!(s.info(), "Host=???, 0 values for 0 plugins 0 types");
        s.host = Some("h".to_owned());
        s.values = 1;
        s.plugins.insert("cpu".to_owned());
        s.types.insert("cpu".to_owned());
        s.errors = 2;
        s.signed = true;
        assert_eq!(s.info(), "Host=h, 1 value for 1 plugin 1 type, 2 errors, signed");
    }
}
