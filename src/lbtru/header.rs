use nom::number::streaming::{be_u16, be_u32, be_u8};
use rusticata_macros::newtype_enum;

use crate::error::{check_length, DissectError};
use crate::lbtru::fields::*;
use crate::tree::{HeaderField, ItemParser, ItemResult};
use crate::value_string::{val_to_str, ValueString};

pub const LBTRU_VERSION: u8 = 0;
/// `ver_type[1] next_hdr[1] flags[2]`
pub const HEADER_LEN: usize = 4;
/// DATA: the packet is a retransmission
pub const RETRANSMISSION_FLAG: u16 = 0x4000;
/// SM: first session message of a transport
pub const SM_SYN_FLAG: u16 = 0x8000;
/// Option: may be skipped by receivers not knowing it
pub const OPT_IGNORE: u16 = 0x8000;
/// `next_hdr[1] hdr_len[1] flags[2]`
pub const OPT_HEADER_LEN: usize = 4;
/// Session ID and client ID options
pub const OPT_ID_LEN: usize = 8;

#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct LbtruPacketType(pub u8);

newtype_enum! {
impl debug LbtruPacketType {
    Data = 0x00,
    Sm = 0x01,
    Nak = 0x02,
    Ncf = 0x03,
    Ack = 0x04,
    Creq = 0x05,
    Rst = 0x06,
}
}

impl LbtruPacketType {
    pub fn is_known(self) -> bool {
        self.0 <= LbtruPacketType::Rst.0
    }

    /// Returns true for packets sent by the source to a receiver
    pub fn is_from_source(self) -> bool {
        matches!(
            self,
            LbtruPacketType::Data | LbtruPacketType::Sm | LbtruPacketType::Ncf | LbtruPacketType::Rst
        )
    }
}

#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct LbtruNextHeader(pub u8);

newtype_enum! {
impl debug LbtruNextHeader {
    Data = 0x00,
    SessionId = 0x01,
    ClientId = 0x02,
}
}

pub static LBTRU_PACKET_TYPES: &[ValueString] = &[
    (0x00, "DATA"),
    (0x01, "SM"),
    (0x02, "NAK"),
    (0x03, "NCF"),
    (0x04, "ACK"),
    (0x05, "CREQ"),
    (0x06, "RST"),
];

pub static LBTRU_NEXT_HEADERS: &[ValueString] = &[(0x00, "Data"), (0x01, "Session ID"), (0x02, "Client ID")];

pub static LBTRU_NAK_FORMATS: &[ValueString] = &[(0x0, "Selective")];

pub static LBTRU_NCF_REASONS: &[ValueString] = &[
    (0x0, "Do not retry"),
    (0x1, "NAK ignored"),
    (0x2, "Retransmission delay"),
    (0x3, "NAK shed"),
];

pub static LBTRU_CREQ_REQUESTS: &[ValueString] = &[(0x0, "SYN")];

pub static LBTRU_RST_REASONS: &[ValueString] = &[(0x0, "Default")];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LbtruHeader {
    pub version: u8,
    pub packet_type: LbtruPacketType,
    pub next_hdr: LbtruNextHeader,
    pub flags: u16,
}

impl LbtruHeader {
    pub fn is_retransmission(&self) -> bool {
        self.packet_type == LbtruPacketType::Data && self.flags & RETRANSMISSION_FLAG != 0
    }

    pub fn is_syn(&self) -> bool {
        self.packet_type == LbtruPacketType::Sm && self.flags & SM_SYN_FLAG != 0
    }
}

/// Fixed header following the common header, by packet type
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeHeader {
    Data { sqn: u32, trail_sqn: u32 },
    Sm { sm_sqn: u32, lead_sqn: u32, trail_sqn: u32 },
    Nak { format: u16, naks: Vec<u32> },
    Ncf { trail_sqn: u32, reason: u8, format: u8, ncfs: Vec<u32> },
    Ack { ack_sqn: u32 },
    Creq { request: u16 },
    Rst { reason: u16 },
}

impl TypeHeader {
    /// Sequence number tracked by the sequence analysis
    pub fn sqn(&self) -> Option<u32> {
        match self {
            TypeHeader::Data { sqn, .. } => Some(*sqn),
            TypeHeader::Sm { sm_sqn, .. } => Some(*sm_sqn),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionBody {
    SessionId(u32),
    ClientId(u32),
    Unknown,
}

/// One header of the option chain
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LbtruOption {
    pub kind: LbtruNextHeader,
    pub next_hdr: LbtruNextHeader,
    pub hdr_len: u8,
    pub flags: u16,
    pub body: OptionBody,
}

/// Parse a byte and add it to the tree as its name in `table`
fn named_u8<'a>(
    r: &mut ItemParser<'_, 'a>,
    hf: &'static HeaderField,
    table: &[ValueString],
) -> ItemResult<'a, u8> {
    let start = r.offset();
    let v = r.parse(be_u8)?;
    let parent = r.parent;
    r.tree
        .add_item(parent, hf, start..start + 1, &*val_to_str(u32::from(v), table));
    Ok(v)
}

/// Decode the common header
pub fn decode_header<'a>(r: &mut ItemParser<'_, 'a>) -> ItemResult<'a, LbtruHeader> {
    let start = r.offset();
    let ver_type = r.parse(be_u8)?;
    let version = ver_type >> 4;
    let packet_type = LbtruPacketType(ver_type & 0x0f);
    let parent = r.parent;
    r.tree
        .add_item(parent, &HF_VERSION, start..start + 1, version);
    let name = val_to_str(u32::from(packet_type.0), LBTRU_PACKET_TYPES);
    r.tree.add_item(parent, &HF_TYPE, start..start + 1, &*name);
    let next_hdr = LbtruNextHeader(named_u8(r, &HF_NEXT_HDR, LBTRU_NEXT_HEADERS)?);
    let start = r.offset();
    let flags = r.parse(be_u16)?;
    let range = start..start + 2;
    match packet_type {
        LbtruPacketType::Creq => {
            let s = val_to_str(u32::from(flags), LBTRU_CREQ_REQUESTS);
            r.tree.add_item(parent, &HF_CREQ_REQUEST, range, &*s);
        }
        LbtruPacketType::Rst => {
            let s = val_to_str(u32::from(flags), LBTRU_RST_REASONS);
            r.tree.add_item(parent, &HF_RST_REASON, range, &*s);
        }
        _ => {
            let node = r.tree.add_item(parent, &HF_FLAGS, range.clone(), flags);
            if packet_type == LbtruPacketType::Data {
                r.tree
                    .add_item(node, &HF_FLAGS_RX, range, flags & RETRANSMISSION_FLAG != 0);
            } else if packet_type == LbtruPacketType::Sm {
                r.tree
                    .add_item(node, &HF_FLAGS_SYN, range, flags & SM_SYN_FLAG != 0);
            }
        }
    }
    Ok(LbtruHeader {
        version,
        packet_type,
        next_hdr,
        flags,
    })
}

/// Decode a list of `count` sequence numbers, refusing counts that cannot fit in the packet
fn sqn_list<'a>(r: &mut ItemParser<'_, 'a>, hf: &'static HeaderField, count: usize) -> ItemResult<'a, Vec<u32>> {
    check_length(r.rest, count * 4, 0)?;
    let mut v = Vec::with_capacity(count);
    for _ in 0..count {
        v.push(r.item(hf, be_u32)?);
    }
    Ok(v)
}

/// Decode the fixed header of a packet type; None if the type is unknown
pub fn decode_type_header<'a>(
    r: &mut ItemParser<'_, 'a>,
    header: &LbtruHeader,
) -> ItemResult<'a, Option<TypeHeader>> {
    let th = match header.packet_type {
        LbtruPacketType::Data => {
            let prev = r.open("DATA header");
            let sqn = r.item(&HF_DATA_SQN, be_u32)?;
            let trail_sqn = r.item(&HF_DATA_TRAIL, be_u32)?;
            r.close(prev);
            TypeHeader::Data { sqn, trail_sqn }
        }
        LbtruPacketType::Sm => {
            let prev = r.open("SM header");
            let sm_sqn = r.item(&HF_SM_SQN, be_u32)?;
            let lead_sqn = r.item(&HF_SM_LEAD, be_u32)?;
            let trail_sqn = r.item(&HF_SM_TRAIL, be_u32)?;
            r.close(prev);
            TypeHeader::Sm {
                sm_sqn,
                lead_sqn,
                trail_sqn,
            }
        }
        LbtruPacketType::Nak => {
            let prev = r.open("NAK header");
            let num_naks = r.item(&HF_NAK_NUM, be_u16)?;
            let start = r.offset();
            let format = r.parse(be_u16)?;
            let parent = r.parent;
            let s = val_to_str(u32::from(format & 0x0f), LBTRU_NAK_FORMATS);
            r.tree.add_item(parent, &HF_NAK_FORMAT, start..start + 2, &*s);
            let naks = sqn_list(r, &HF_NAK_SQN, usize::from(num_naks))?;
            r.close(prev);
            TypeHeader::Nak { format, naks }
        }
        LbtruPacketType::Ncf => {
            let prev = r.open("NCF header");
            let trail_sqn = r.item(&HF_NCF_TRAIL, be_u32)?;
            let num_ncfs = r.item(&HF_NCF_NUM, be_u16)?;
            r.item(&HF_NCF_RESERVED, be_u8)?;
            let start = r.offset();
            let reason_format = r.parse(be_u8)?;
            let (reason, format) = (reason_format >> 4, reason_format & 0x0f);
            let parent = r.parent;
            let s = val_to_str(u32::from(reason), LBTRU_NCF_REASONS);
            r.tree.add_item(parent, &HF_NCF_REASON, start..start + 1, &*s);
            let s = val_to_str(u32::from(format), LBTRU_NAK_FORMATS);
            r.tree.add_item(parent, &HF_NCF_FORMAT, start..start + 1, &*s);
            let ncfs = sqn_list(r, &HF_NCF_SQN, usize::from(num_ncfs))?;
            r.close(prev);
            TypeHeader::Ncf {
                trail_sqn,
                reason,
                format,
                ncfs,
            }
        }
        LbtruPacketType::Ack => {
            let prev = r.open("ACK header");
            let ack_sqn = r.item(&HF_ACK_SQN, be_u32)?;
            r.close(prev);
            TypeHeader::Ack { ack_sqn }
        }
        LbtruPacketType::Creq => TypeHeader::Creq {
            request: header.flags,
        },
        LbtruPacketType::Rst => TypeHeader::Rst {
            reason: header.flags,
        },
        _ => return Ok(None),
    };
    Ok(Some(th))
}

/// Decode one option header of kind `kind`, consuming exactly its declared length
///
/// A declared length of zero is refused, since the chain would never advance.
pub fn decode_option<'a>(r: &mut ItemParser<'_, 'a>, kind: LbtruNextHeader) -> ItemResult<'a, LbtruOption> {
    let input = r.rest;
    let opt_start = r.offset();
    let (_, hdr_len) = nom::sequence::preceded(be_u8, be_u8)(input)?;
    if hdr_len == 0 {
        return Err(nom::Err::Error(DissectError::ZeroLength(input)));
    }
    let minimum = match kind {
        LbtruNextHeader::SessionId | LbtruNextHeader::ClientId => OPT_ID_LEN,
        _ => OPT_HEADER_LEN,
    };
    check_length(input, usize::from(hdr_len), minimum)?;
    let label = match kind {
        LbtruNextHeader::SessionId => "Session ID option".to_owned(),
        LbtruNextHeader::ClientId => "Client ID option".to_owned(),
        _ => format!("Unknown option 0x{:02x}", kind.0),
    };
    let prev = r.open(label);
    let next_hdr = LbtruNextHeader(named_u8(r, &HF_OPT_NEXT_HDR, LBTRU_NEXT_HEADERS)?);
    r.item(&HF_OPT_HDR_LEN, be_u8)?;
    let start = r.offset();
    let flags = r.parse(be_u16)?;
    let parent = r.parent;
    let node = r.tree.add_item(parent, &HF_OPT_FLAGS, start..start + 2, flags);
    r.tree
        .add_item(node, &HF_OPT_IGNORE, start..start + 2, flags & OPT_IGNORE != 0);
    let body = match kind {
        LbtruNextHeader::SessionId => OptionBody::SessionId(r.item(&HF_OPT_SESSION_ID, be_u32)?),
        LbtruNextHeader::ClientId => OptionBody::ClientId(r.item(&HF_OPT_CLIENT_ID, be_u32)?),
        _ => OptionBody::Unknown,
    };
    let used = r.offset() - opt_start;
    let left = usize::from(hdr_len) - used;
    if left > 0 {
        r.item(&HF_OPT_DATA, nom::bytes::streaming::take(left))?;
    }
    r.close(prev);
    Ok(LbtruOption {
        kind,
        next_hdr,
        hdr_len,
        flags,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NodeId, ProtoTree};
    use hex_literal::hex;

    #[test]
    fn data_header() {
        let data = hex!("00 01 40 00 00 00 00 07 00 00 00 02");
        let mut tree = ProtoTree::new();
        let mut r = ItemParser::new(&mut tree, NodeId::ROOT, &data, &data);
        let h = decode_header(&mut r).expect("header");
        assert_eq!(h.packet_type, LbtruPacketType::Data);
        assert_eq!(h.next_hdr, LbtruNextHeader::SessionId);
        assert!(h.is_retransmission());
        let th = decode_type_header(&mut r, &h).expect("type header");
        assert_eq!(th, Some(TypeHeader::Data { sqn: 7, trail_sqn: 2 }));
        assert!(r.rest.is_empty());
        assert_eq!(tree.find("lbtru.hdr.flags.rx").map(|n| n.value.to_string()), Some("True".to_owned()));
    }

    #[test]
    fn options() {
        // SID option then an unknown option of 6 bytes
        let data = hex!("05 08 00 00 00 00 01 00 00 06 80 00 aa bb");
        let mut tree = ProtoTree::new();
        let mut r = ItemParser::new(&mut tree, NodeId::ROOT, &data, &data);
        let o = decode_option(&mut r, LbtruNextHeader::SessionId).expect("sid");
        assert_eq!(o.body, OptionBody::SessionId(0x100));
        assert_eq!(o.next_hdr, LbtruNextHeader(5));
        let o = decode_option(&mut r, o.next_hdr).expect("unknown");
        assert_eq!(o.body, OptionBody::Unknown);
        assert_eq!(o.flags & OPT_IGNORE, OPT_IGNORE);
        assert!(r.rest.is_empty());
    }

    #[test]
    fn zero_length_option() {
        let data = hex!("00 00 00 00 00 00 00 01");
        let mut tree = ProtoTree::new();
        let mut r = ItemParser::new(&mut tree, NodeId::ROOT, &data, &data);
        match decode_option(&mut r, LbtruNextHeader::ClientId) {
            Err(nom::Err::Error(DissectError::ZeroLength(_))) => (),
            other => panic!("zero length accepted: {:?}", other),
        }
        assert_eq!(r.rest.len(), data.len());
    }

    #[test]
    fn runaway_nak_list() {
        // 0x100 NAKs announced, one present
        let data = hex!("01 00 00 00 00 00 00 05");
        let mut tree = ProtoTree::new();
        let mut r = ItemParser::new(&mut tree, NodeId::ROOT, &data, &data);
        let h = LbtruHeader {
            version: 0,
            packet_type: LbtruPacketType::Nak,
            next_hdr: LbtruNextHeader::Data,
            flags: 0,
        };
        match decode_type_header(&mut r, &h) {
            Err(nom::Err::Error(e)) => assert!(e.is_length_error()),
            other => panic!("runaway list accepted: {:?}", other),
        }
    }
}
