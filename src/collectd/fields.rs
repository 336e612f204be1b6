use crate::expert::{ExpertField, ExpertGroup, Severity};
use crate::tree::{FieldDisplay, HeaderField};

use FieldDisplay::*;

pub static HF_PART_TYPE: HeaderField = HeaderField::new("Type", "collectd.type", Str);
pub static HF_PART_LENGTH: HeaderField = HeaderField::new("Length", "collectd.length", Dec);
pub static HF_PART_DATA: HeaderField = HeaderField::new("Payload", "collectd.data", Bytes);

pub static HF_HOST: HeaderField = HeaderField::new("Host", "collectd.data.host", Str);
pub static HF_PLUGIN: HeaderField = HeaderField::new("Plugin", "collectd.data.plugin", Str);
pub static HF_PLUGIN_INSTANCE: HeaderField =
    HeaderField::new("Plugin instance", "collectd.data.plugin.inst", Str);
pub static HF_TYPE: HeaderField = HeaderField::new("Type", "collectd.data.type", Str);
pub static HF_TYPE_INSTANCE: HeaderField =
    HeaderField::new("Type instance", "collectd.data.type.inst", Str);
pub static HF_MESSAGE: HeaderField = HeaderField::new("Message", "collectd.data.message", Str);
pub static HF_TIME: HeaderField = HeaderField::new("Timestamp", "collectd.data.time", Time);
pub static HF_TIME_HR: HeaderField = HeaderField::new("Timestamp", "collectd.data.time.hr", Time);
pub static HF_INTERVAL: HeaderField = HeaderField::new("Interval", "collectd.data.interval", Time);
pub static HF_INTERVAL_HR: HeaderField =
    HeaderField::new("Interval", "collectd.data.interval.hr", Time);
pub static HF_SEVERITY: HeaderField = HeaderField::new("Severity", "collectd.data.severity", Dec);

pub static HF_VALUE_COUNT: HeaderField = HeaderField::new("Value count", "collectd.data.valcnt", Dec);
pub static HF_VALUE_TYPE: HeaderField = HeaderField::new("Value type", "collectd.val.type", Str);
pub static HF_VAL_COUNTER: HeaderField = HeaderField::new("Counter value", "collectd.val.counter", Dec);
pub static HF_VAL_GAUGE: HeaderField = HeaderField::new("Gauge value", "collectd.val.gauge", Double);
pub static HF_VAL_DERIVE: HeaderField = HeaderField::new("Derive value", "collectd.val.derive", Dec);
pub static HF_VAL_ABSOLUTE: HeaderField =
    HeaderField::new("Absolute value", "collectd.val.absolute", Dec);
pub static HF_VAL_UNKNOWN: HeaderField = HeaderField::new("Value of unknown type", "collectd.val.unknown", Bytes);

pub static HF_SIGN_HASH: HeaderField = HeaderField::new("Signature", "collectd.data.sighash", Bytes);
pub static HF_USERNAME_LEN: HeaderField =
    HeaderField::new("Username length", "collectd.data.username_length", Dec);
pub static HF_USERNAME: HeaderField = HeaderField::new("Username", "collectd.data.username", Str);
pub static HF_ENCR_IV: HeaderField = HeaderField::new("Init vector", "collectd.data.initvec", Bytes);
pub static HF_ENCR_DATA: HeaderField = HeaderField::new("Encrypted data", "collectd.data.encrypted", Bytes);

pub static HF_DISP_HOST: HeaderField = HeaderField::new("Host", "collectd.dispatch.host", Str);
pub static HF_DISP_PLUGIN: HeaderField = HeaderField::new("Plugin", "collectd.dispatch.plugin", Str);
pub static HF_DISP_PLUGIN_INSTANCE: HeaderField =
    HeaderField::new("Plugin instance", "collectd.dispatch.plugin.instance", Str);
pub static HF_DISP_TYPE: HeaderField = HeaderField::new("Type", "collectd.dispatch.type", Str);
pub static HF_DISP_TYPE_INSTANCE: HeaderField =
    HeaderField::new("Type instance", "collectd.dispatch.type.instance", Str);
pub static HF_DISP_TIME: HeaderField = HeaderField::new("Timestamp", "collectd.dispatch.time", Time);
pub static HF_DISP_INTERVAL: HeaderField =
    HeaderField::new("Interval", "collectd.dispatch.interval", Time);

pub static EI_MALFORMED: ExpertField = ExpertField::new(
    "collectd.malformed",
    ExpertGroup::Malformed,
    Severity::Error,
    "Malformed collectd part",
);
pub static EI_GARBAGE: ExpertField = ExpertField::new(
    "collectd.garbage",
    ExpertGroup::Malformed,
    Severity::Error,
    "Garbage at end of packet",
);
pub static EI_UNKNOWN_PART: ExpertField = ExpertField::new(
    "collectd.unknown_part",
    ExpertGroup::Undecoded,
    Severity::Warn,
    "Unknown part type",
);
pub static EI_UNKNOWN_VALUE_TYPE: ExpertField = ExpertField::new(
    "collectd.unknown_value_type",
    ExpertGroup::Undecoded,
    Severity::Warn,
    "Unknown data source type",
);
pub static EI_ENCRYPTED: ExpertField = ExpertField::new(
    "collectd.encrypted",
    ExpertGroup::Decryption,
    Severity::Note,
    "Encrypted data, not decoded",
);
