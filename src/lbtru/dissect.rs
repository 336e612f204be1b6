use std::ops::Range;

use nom::Offset;
use tracing::{debug, trace};

use crate::column::ColumnFormat;
use crate::dissector::Dissector;
use crate::error::{flatten, DissectError};
use crate::frame::{Endpoint, PortType};
use crate::lbtru::fields::*;
use crate::lbtru::header::*;
use crate::lbtru::transport::*;
use crate::packet::PacketContext;
use crate::prefs::LbtruPrefs;
use crate::tree::{ItemParser, NodeId};
use crate::value_string::val_to_str;

/// Dissector of LBT-RU (unicast reliable transport) over UDP
#[derive(Debug, Default)]
pub struct LbtruDissector {
    prefs: LbtruPrefs,
    state: LbtruState,
}

/// Error of a decode step, with the range it covers
fn error_range(e: &DissectError<&[u8]>, data: &[u8], fallback: usize) -> Range<usize> {
    let start = match e {
        DissectError::Incomplete(_) | DissectError::OwnedNomError(..) => fallback,
        _ => e.offset_in(data),
    };
    start.min(data.len())..data.len()
}

impl LbtruDissector {
    pub fn new(prefs: LbtruPrefs) -> LbtruDissector {
        LbtruDissector {
            prefs,
            state: LbtruState::new(),
        }
    }

    pub fn state(&self) -> &LbtruState {
        &self.state
    }

    fn write_info(cx: &mut PacketContext, header: &LbtruHeader, th: &TypeHeader) {
        let c = &mut *cx.columns;
        match th {
            TypeHeader::Data { sqn, trail_sqn } => {
                let name = if header.is_retransmission() { "DATA(RX)" } else { "DATA" };
                c.add_fstr(
                    ColumnFormat::Info,
                    format_args!("{} sqn 0x{:x} trail 0x{:x}", name, sqn, trail_sqn),
                );
            }
            TypeHeader::Sm {
                sm_sqn,
                lead_sqn,
                trail_sqn,
            } => {
                c.add_fstr(
                    ColumnFormat::Info,
                    format_args!("SM sqn 0x{:x} lead 0x{:x} trail 0x{:x}", sm_sqn, lead_sqn, trail_sqn),
                );
                if header.is_syn() {
                    c.append_str(ColumnFormat::Info, " [SYN]");
                }
            }
            TypeHeader::Nak { naks, .. } => {
                c.add_fstr(ColumnFormat::Info, format_args!("NAK {} naks", naks.len()));
            }
            TypeHeader::Ncf {
                trail_sqn,
                reason,
                ncfs,
                ..
            } => {
                let reason = val_to_str(u32::from(*reason), LBTRU_NCF_REASONS);
                c.add_fstr(
                    ColumnFormat::Info,
                    format_args!("NCF trail 0x{:x} {} ncfs reason {}", trail_sqn, ncfs.len(), reason),
                );
            }
            TypeHeader::Ack { ack_sqn } => {
                c.add_fstr(ColumnFormat::Info, format_args!("ACK sqn 0x{:x}", ack_sqn));
            }
            TypeHeader::Creq { request } => {
                let request = val_to_str(u32::from(*request), LBTRU_CREQ_REQUESTS);
                c.add_fstr(ColumnFormat::Info, format_args!("CREQ request {}", request));
            }
            TypeHeader::Rst { reason } => {
                let reason = val_to_str(u32::from(*reason), LBTRU_RST_REASONS);
                c.add_fstr(ColumnFormat::Info, format_args!("RST reason {}", reason));
            }
        }
    }

    /// Run the sequence analysis of the frame and show its results
    #[allow(clippy::too_many_arguments)]
    fn analyse(
        &mut self,
        cx: &mut PacketContext,
        root: NodeId,
        header: &LbtruHeader,
        sqn: Option<u32>,
        session_id: u32,
        range: Range<usize>,
    ) {
        let (source, client) = if header.packet_type.is_from_source() {
            (cx.frame.src_endpoint(), cx.frame.dst_endpoint())
        } else {
            (cx.frame.dst_endpoint(), cx.frame.src_endpoint())
        };
        let conv = cx
            .conversations
            .find_or_create(cx.frame, PortType::Udp, source, Endpoint::default());
        let record = self.state.track(
            cx.frame,
            conv,
            session_id,
            client,
            header.packet_type,
            sqn,
            header.is_retransmission(),
        );
        let rec = match record {
            Some(rec) => rec,
            None => return,
        };
        trace!(frame = rec.frame, session_id, client = %client, analysis = ?rec.analysis, "LBT-RU frame tracked");

        let node = cx.tree.add_text(root, range.clone(), "Analysis");
        let transport = format!("LBT-RU:{}:{:08x}", source, session_id);
        cx.tree.add_generated(node, &HF_TRANSPORT, transport.as_str());
        cx.tree.add_generated(node, &HF_CLIENT, client.to_string());
        let links = [
            (&HF_PREV_FRAME, rec.previous_frame),
            (&HF_NEXT_FRAME, rec.next_frame),
            (&HF_PREV_TYPE_FRAME, rec.previous_type_frame),
            (&HF_NEXT_TYPE_FRAME, rec.next_type_frame),
        ];
        for &(hf, frame) in links.iter() {
            if let Some(f) = frame {
                cx.tree.add_generated(node, hf, f);
            }
        }
        if let Some(c) = self.state.client(conv, session_id, client) {
            for &f in c.same_sqn_frames(&rec).iter().filter(|&&f| f != rec.frame) {
                cx.tree.add_generated(node, &HF_SQN_FRAME, f);
            }
        }
        if rec.retransmission {
            cx.tree.add_generated(node, &HF_RETRANSMISSION, true);
            cx.add_expert_summary(node, &EI_RETRANSMISSION, range.clone());
        }
        let a = rec.analysis;
        if a.sqn_gap > 0 {
            cx.tree.add_generated(node, &HF_SQN_GAP, a.sqn_gap);
            cx.add_expert(node, &EI_SQN_GAP, range.clone(), format!("Sequence gap ({})", a.sqn_gap));
        }
        if a.ooo_gap > 0 {
            cx.tree.add_generated(node, &HF_OOO_GAP, a.ooo_gap);
            cx.add_expert(
                node,
                &EI_OOO,
                range.clone(),
                format!("Sequence number out of order ({})", a.ooo_gap),
            );
        }
        if a.duplicate {
            cx.tree.add_generated(node, &HF_DUPLICATE, true);
            cx.add_expert_summary(node, &EI_DUPLICATE, range);
        }
    }
}

impl Dissector for LbtruDissector {
    fn short_name(&self) -> &'static str {
        "LBT-RU"
    }

    fn full_name(&self) -> &'static str {
        "LBT Reliable Unicast Protocol"
    }

    fn filter_name(&self) -> &'static str {
        "lbtru"
    }

    fn ports(&self) -> Vec<(PortType, u16)> {
        self.prefs
            .source_ports
            .clone()
            .chain(self.prefs.receiver_ports.clone())
            .map(|p| (PortType::Udp, p))
            .collect()
    }

    fn dissect(&mut self, cx: &mut PacketContext, data: &[u8]) -> usize {
        cx.columns.set_str(ColumnFormat::Protocol, "LBT-RU");
        cx.columns.clear(ColumnFormat::Info);
        let root = cx
            .tree
            .add_text(NodeId::ROOT, 0..data.len(), "LBT-RU Protocol");
        if data.len() < HEADER_LEN {
            debug!(frame = cx.frame.number, len = data.len(), "short LBT-RU packet");
            cx.add_expert(
                root,
                &EI_MALFORMED,
                0..data.len(),
                format!("Packet too short for the LBT-RU header ({} bytes)", data.len()),
            );
            cx.columns
                .set_str(ColumnFormat::Info, "[Malformed LBT-RU packet]");
            return data.len();
        }

        let mut r = ItemParser::new(&mut cx.tree, root, data, data);
        let header = match decode_header(&mut r) {
            Ok(h) => h,
            Err(_) => return data.len(),
        };
        if header.version != LBTRU_VERSION || !header.packet_type.is_known() {
            debug!(
                frame = cx.frame.number,
                version = header.version,
                packet_type = ?header.packet_type,
                "unrecognized LBT-RU packet"
            );
            cx.tree
                .add_item(root, &HF_DATA, HEADER_LEN..data.len(), &data[HEADER_LEN..]);
            cx.add_expert(
                root,
                &EI_UNRECOGNIZED,
                0..1,
                format!(
                    "Unrecognized LBT-RU packet (version {}, type 0x{:x})",
                    header.version, header.packet_type.0
                ),
            );
            cx.columns.set_str(ColumnFormat::Info, "Unrecognized LBT-RU packet");
            return data.len();
        }

        let mut r = ItemParser::new(&mut cx.tree, root, data, &data[HEADER_LEN..]);
        let th = match decode_type_header(&mut r, &header) {
            Ok(Some(th)) => th,
            Ok(None) => return data.len(),
            Err(e) => {
                let e = flatten(e);
                let range = error_range(&e, data, HEADER_LEN);
                cx.add_expert(root, &EI_MALFORMED, range, format!("Malformed type header: {}", e));
                cx.columns.set_str(ColumnFormat::Info, "[Malformed LBT-RU packet]");
                return data.len();
            }
        };
        let options = r.rest;
        Self::write_info(cx, &header, &th);

        // option chain, until the next header is the payload
        let mut session_id = 0;
        let mut next_hdr = header.next_hdr;
        let mut unknown = Vec::new();
        let mut chain_error = None;
        let mut r = ItemParser::new(&mut cx.tree, root, data, options);
        while next_hdr != LbtruNextHeader::Data && !r.rest.is_empty() {
            let start = r.offset();
            match decode_option(&mut r, next_hdr) {
                Ok(opt) => {
                    match opt.body {
                        OptionBody::SessionId(id) => session_id = id,
                        OptionBody::ClientId(_) => (),
                        OptionBody::Unknown => unknown.push((opt.kind, start..r.offset())),
                    }
                    next_hdr = opt.next_hdr;
                }
                Err(e) => {
                    chain_error = Some((start, flatten(e)));
                    break;
                }
            }
        }
        let rest = r.rest;
        for (kind, range) in unknown {
            let message = format!("Unknown option header 0x{:02x}", kind.0);
            cx.add_expert(root, &EI_UNKNOWN_OPTION, range, message);
        }
        match chain_error {
            Some((start, e)) => {
                debug!(frame = cx.frame.number, offset = start, "malformed LBT-RU option");
                let range = error_range(&e, data, start);
                cx.add_expert(root, &EI_MALFORMED, range, format!("Malformed option header: {}", e));
                cx.columns.append_str(ColumnFormat::Info, " [Malformed]");
            }
            None if !rest.is_empty() => {
                let start = data.offset(rest);
                cx.tree.add_item(root, &HF_DATA, start..data.len(), rest);
            }
            None => (),
        }

        if self.prefs.sequence_analysis {
            self.analyse(cx, root, &header, th.sqn(), session_id, 0..data.len());
        }
        data.len()
    }

    fn reset(&mut self) {
        self.state.reset();
    }
}
