use crate::expert::{ExpertField, ExpertGroup, Severity};
use crate::tree::{FieldDisplay, HeaderField};

use FieldDisplay::*;

pub static HF_VERSION: HeaderField = HeaderField::new("Version", "lbtru.hdr.ver", Dec);
pub static HF_TYPE: HeaderField = HeaderField::new("Type", "lbtru.hdr.type", Str);
pub static HF_NEXT_HDR: HeaderField = HeaderField::new("Next header", "lbtru.hdr.next_hdr", Str);
pub static HF_FLAGS: HeaderField = HeaderField::new("Flags", "lbtru.hdr.flags", Hex);
pub static HF_FLAGS_RX: HeaderField = HeaderField::new("Retransmission", "lbtru.hdr.flags.rx", Bool);
pub static HF_FLAGS_SYN: HeaderField = HeaderField::new("SYN", "lbtru.hdr.flags.syn", Bool);
pub static HF_CREQ_REQUEST: HeaderField = HeaderField::new("Request", "lbtru.hdr.request", Str);
pub static HF_RST_REASON: HeaderField = HeaderField::new("Reset reason", "lbtru.hdr.reason", Str);

pub static HF_DATA_SQN: HeaderField = HeaderField::new("Sequence number", "lbtru.data.sqn", Hex);
pub static HF_DATA_TRAIL: HeaderField = HeaderField::new("Trailing edge", "lbtru.data.trail", Hex);
pub static HF_SM_SQN: HeaderField = HeaderField::new("Sequence number", "lbtru.sm.sqn", Hex);
pub static HF_SM_LEAD: HeaderField = HeaderField::new("Leading edge", "lbtru.sm.lead", Hex);
pub static HF_SM_TRAIL: HeaderField = HeaderField::new("Trailing edge", "lbtru.sm.trail", Hex);
pub static HF_NAK_NUM: HeaderField = HeaderField::new("Number of NAKs", "lbtru.nak.num", Dec);
pub static HF_NAK_FORMAT: HeaderField = HeaderField::new("Format", "lbtru.nak.format", Str);
pub static HF_NAK_SQN: HeaderField = HeaderField::new("NAK", "lbtru.nak.list.nak", Hex);
pub static HF_NCF_TRAIL: HeaderField = HeaderField::new("Trailing edge", "lbtru.ncf.trail", Hex);
pub static HF_NCF_NUM: HeaderField = HeaderField::new("Number of NCFs", "lbtru.ncf.num", Dec);
pub static HF_NCF_RESERVED: HeaderField = HeaderField::new("Reserved", "lbtru.ncf.reserved", Hex);
pub static HF_NCF_REASON: HeaderField = HeaderField::new("Reason", "lbtru.ncf.reason", Str);
pub static HF_NCF_FORMAT: HeaderField = HeaderField::new("Format", "lbtru.ncf.format", Str);
pub static HF_NCF_SQN: HeaderField = HeaderField::new("NCF", "lbtru.ncf.list.ncf", Hex);
pub static HF_ACK_SQN: HeaderField = HeaderField::new("ACK sequence number", "lbtru.ack.sqn", Hex);

pub static HF_OPT_NEXT_HDR: HeaderField = HeaderField::new("Next header", "lbtru.opt.next_hdr", Str);
pub static HF_OPT_HDR_LEN: HeaderField = HeaderField::new("Header length", "lbtru.opt.hdr_len", Dec);
pub static HF_OPT_FLAGS: HeaderField = HeaderField::new("Flags", "lbtru.opt.flags", Hex);
pub static HF_OPT_IGNORE: HeaderField = HeaderField::new("Ignore", "lbtru.opt.flags.ignore", Bool);
pub static HF_OPT_SESSION_ID: HeaderField = HeaderField::new("Session ID", "lbtru.opt_sid.session_id", Hex);
pub static HF_OPT_CLIENT_ID: HeaderField = HeaderField::new("Client ID", "lbtru.opt_cid.client_id", Hex);
pub static HF_OPT_DATA: HeaderField = HeaderField::new("Data", "lbtru.opt_unknown.data", Bytes);
pub static HF_DATA: HeaderField = HeaderField::new("Data", "lbtru.data", Bytes);

pub static HF_TRANSPORT: HeaderField = HeaderField::new("Transport", "lbtru.transport", Str);
pub static HF_CLIENT: HeaderField = HeaderField::new("Client", "lbtru.client", Str);
pub static HF_PREV_FRAME: HeaderField = HeaderField::new("Previous frame", "lbtru.analysis.prev_frame", Dec);
pub static HF_NEXT_FRAME: HeaderField = HeaderField::new("Next frame", "lbtru.analysis.next_frame", Dec);
pub static HF_PREV_TYPE_FRAME: HeaderField =
    HeaderField::new("Previous frame of the same type", "lbtru.analysis.prev_type_frame", Dec);
pub static HF_NEXT_TYPE_FRAME: HeaderField =
    HeaderField::new("Next frame of the same type", "lbtru.analysis.next_type_frame", Dec);
pub static HF_SQN_FRAME: HeaderField =
    HeaderField::new("Frame with the same sequence number", "lbtru.analysis.sqn.frame", Dec);
pub static HF_RETRANSMISSION: HeaderField =
    HeaderField::new("Retransmission", "lbtru.analysis.retransmission", Bool);
pub static HF_SQN_GAP: HeaderField = HeaderField::new("Sequence gap", "lbtru.analysis.sqn_gap", Dec);
pub static HF_OOO_GAP: HeaderField = HeaderField::new("Out-of-order gap", "lbtru.analysis.ooo_gap", Dec);
pub static HF_DUPLICATE: HeaderField = HeaderField::new("Duplicate", "lbtru.analysis.duplicate", Bool);

pub static EI_MALFORMED: ExpertField = ExpertField::new(
    "lbtru.malformed",
    ExpertGroup::Malformed,
    Severity::Error,
    "Malformed LBT-RU packet",
);
pub static EI_UNRECOGNIZED: ExpertField = ExpertField::new(
    "lbtru.unrecognized",
    ExpertGroup::Undecoded,
    Severity::Warn,
    "Unrecognized LBT-RU packet",
);
pub static EI_UNKNOWN_OPTION: ExpertField = ExpertField::new(
    "lbtru.opt.unknown",
    ExpertGroup::Undecoded,
    Severity::Warn,
    "Unknown option header",
);
pub static EI_RETRANSMISSION: ExpertField = ExpertField::new(
    "lbtru.analysis.rx",
    ExpertGroup::Sequence,
    Severity::Note,
    "Retransmission",
);
pub static EI_SQN_GAP: ExpertField = ExpertField::new(
    "lbtru.analysis.sqn_gap",
    ExpertGroup::Sequence,
    Severity::Error,
    "Sequence gap",
);
pub static EI_OOO: ExpertField = ExpertField::new(
    "lbtru.analysis.ooo",
    ExpertGroup::Sequence,
    Severity::Error,
    "Sequence number out of order",
);
pub static EI_DUPLICATE: ExpertField = ExpertField::new(
    "lbtru.analysis.duplicate",
    ExpertGroup::Sequence,
    Severity::Error,
    "Duplicate sequence number",
);
