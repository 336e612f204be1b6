use nom::Offset;
use tracing::{debug, trace};

use crate::column::ColumnFormat;
use crate::conversation::ConversationId;
use crate::dissector::Dissector;
use crate::error::{check_length, flatten, DissectError};
use crate::frame::PortType;
use crate::ninep::fields::*;
use crate::ninep::message::*;
use crate::ninep::state::*;
use crate::packet::PacketContext;
use crate::prefs::NinePPrefs;
use crate::tree::{ItemParser, NodeId};
use crate::value_string::val_to_str;

/// Dissector of 9P over TCP
#[derive(Debug, Default)]
pub struct NinePDissector {
    prefs: NinePPrefs,
    state: NinePState,
}

impl NinePDissector {
    pub fn new(prefs: NinePPrefs) -> NinePDissector {
        NinePDissector {
            prefs,
            state: NinePState::new(),
        }
    }

    pub fn state(&self) -> &NinePState {
        &self.state
    }

    /// Dissect the message at `offset`, returning its length, or None to stop
    fn dissect_message(
        &mut self,
        cx: &mut PacketContext,
        conv: ConversationId,
        data: &[u8],
        offset: usize,
        index: u32,
    ) -> Option<usize> {
        let i = &data[offset..];
        let header = match parse_header(i) {
            Ok((_, h)) => h,
            Err(e) => {
                let e = flatten(e);
                let node = cx.tree.add_text(NodeId::ROOT, offset..data.len(), "9P (truncated)");
                cx.add_expert(node, &EI_MALFORMED, offset..data.len(), e.to_string());
                cx.columns
                    .append_sep_str(ColumnFormat::Info, Some(" ; "), "[Malformed 9P message]");
                return None;
            }
        };
        let size = header.size as usize;
        let name = val_to_str(u32::from(header.msg_type.0), NINEP_MSG_TYPES);
        let msg_root = cx.tree.add_text(
            NodeId::ROOT,
            offset..offset + size.min(i.len()),
            format!("9P {}", name),
        );
        cx.tree.add_item(msg_root, &HF_SIZE, offset..offset + 4, header.size);
        cx.tree
            .add_item(msg_root, &HF_TYPE, offset + 4..offset + 5, &*name);
        cx.tree
            .add_item(msg_root, &HF_TAG, offset + 5..offset + 7, header.tag);
        cx.columns.append_sep_fstr(
            ColumnFormat::Info,
            Some(" ; "),
            format_args!("{} Tag={}", name, header.tag),
        );

        if let Err(e) = check_length(i, size, HEADER_LEN) {
            let e = flatten(e);
            debug!(frame = cx.frame.number, size, "invalid 9P message size");
            cx.add_expert(msg_root, &EI_MALFORMED, offset..offset + 4, e.to_string());
            cx.columns
                .append_str(ColumnFormat::Info, " [Malformed: invalid size]");
            return None;
        }
        let msg = &i[..size];
        let body = &msg[HEADER_LEN..];
        let pos = MessagePos {
            frame: cx.frame.number,
            index,
        };
        let version = self.state.version_at(conv, pos);
        trace!(frame = pos.frame, index, msg_type = ?header.msg_type, tag = header.tag, "9P message");

        let mut r = ItemParser::new(&mut cx.tree, msg_root, data, body);
        let decoded = decode_body(&mut r, header.msg_type, version);
        let rest = r.rest;
        match decoded {
            Ok(decoded) => {
                if let NinePBody::Unknown = decoded.body {
                    let start = data.offset(body);
                    cx.tree
                        .add_item(msg_root, &HF_PAYLOAD, start..offset + size, body);
                    cx.add_expert(
                        msg_root,
                        &EI_UNKNOWN_TYPE,
                        offset + 4..offset + 5,
                        format!("Unknown message type {}", header.msg_type.0),
                    );
                } else if !rest.is_empty() && !decoded.list_truncated {
                    let start = data.offset(rest);
                    cx.add_expert_summary(msg_root, &EI_TRAILING, start..offset + size);
                }
                if decoded.list_truncated {
                    cx.add_expert(
                        msg_root,
                        &EI_TRUNCATED_LIST,
                        offset + HEADER_LEN..offset + size,
                        format!("List truncated, showing first {}", MAXWELEM),
                    );
                }
                let mut summary = String::new();
                decoded.body.write_summary(&mut summary);
                cx.columns.append_str(ColumnFormat::Info, &summary);
                self.track(cx, conv, pos, &header, &decoded.body, msg_root);
            }
            Err(e) => {
                let e = flatten(e);
                let start = match e {
                    DissectError::Incomplete(_) | DissectError::OwnedNomError(..) => offset + HEADER_LEN,
                    _ => e.offset_in(data),
                };
                cx.add_expert(
                    msg_root,
                    &EI_MALFORMED,
                    start.min(offset + size)..offset + size,
                    format!("Malformed {} body: {}", name, e),
                );
                cx.columns.append_str(ColumnFormat::Info, " [Malformed]");
            }
        }
        Some(size)
    }

    /// Update and show the tag and fid state for one decoded message
    fn track(
        &mut self,
        cx: &mut PacketContext,
        conv: ConversationId,
        pos: MessagePos,
        header: &NinePHeader,
        body: &NinePBody,
        msg_root: NodeId,
    ) {
        let frame = cx.frame;
        match body {
            NinePBody::Tversion { version, .. } | NinePBody::Rversion { version, .. } => {
                if let Some(v) = NinePVersion::from_wire(version) {
                    self.state.set_version(frame, conv, pos, v);
                }
            }
            NinePBody::Tattach { fid, aname, .. } => {
                self.state
                    .bind_fid(frame, conv, *fid, pos, Some(aname.clone()));
            }
            _ => (),
        }

        if header.msg_type.is_request() {
            let fid = body.fid().unwrap_or(NOFID);
            let fid_path = self.state.fid_path(conv, fid, pos).map(str::to_owned);
            if fid != NOFID {
                let shown = fid_path.as_deref().unwrap_or(UNKNOWN_PLACEHOLDER);
                cx.tree.add_generated(msg_root, &HF_PATH, shown);
            }
            let (newfid, newpath, nwname) = match body {
                NinePBody::Twalk {
                    newfid,
                    nwname,
                    wnames,
                    ..
                } => (
                    *newfid,
                    fid_path.as_deref().map(|p| join_path(p, wnames.as_slice())),
                    *nwname,
                ),
                NinePBody::Tcreate { name, .. } | NinePBody::Tlcreate { name, .. } => (
                    NOFID,
                    fid_path.as_deref().map(|p| join_path(p, &[name])),
                    0,
                ),
                NinePBody::Trename { dfid, name, .. } => (
                    NOFID,
                    self.state
                        .fid_path(conv, *dfid, pos)
                        .map(|p| join_path(p, &[name])),
                    0,
                ),
                _ => (NOFID, None, 0),
            };
            if let Some(p) = newpath.as_deref() {
                cx.tree.add_generated(msg_root, &HF_NEWPATH, p);
            }
            let info = TagInfo {
                msg_type: header.msg_type,
                frame: frame.number,
                fid,
                newfid,
                newpath,
                nwname,
            };
            self.state.store_request(frame, conv, header.tag, info);
            return;
        }

        let (request, response) = self
            .state
            .resolve_response(frame, conv, header.tag, pos.index);
        if let Some(req) = request {
            let bind = match (body, req.msg_type) {
                (NinePBody::Rwalk { nwqid, .. }, NinePMsgType::Twalk) if *nwqid == req.nwname => {
                    Some((req.newfid, req.newpath.clone()))
                }
                (NinePBody::Rcreate { .. }, NinePMsgType::Tcreate)
                | (NinePBody::Rlcreate { .. }, NinePMsgType::Tlcreate)
                | (NinePBody::Rrename, NinePMsgType::Trename) => Some((req.fid, req.newpath.clone())),
                (NinePBody::Rclunk, NinePMsgType::Tclunk)
                | (NinePBody::Rremove, _)
                | (NinePBody::Rerror { .. }, NinePMsgType::Tremove)
                | (NinePBody::Rlerror { .. }, NinePMsgType::Tremove) => Some((req.fid, None)),
                _ => None,
            };
            if let Some((fid, path)) = bind {
                debug!(frame = frame.number, fid, path = ?path, "9P fid bound");
                self.state.bind_fid(frame, conv, fid, pos, path);
            }
        }
        match response {
            Some(resp) => {
                cx.tree
                    .add_generated(msg_root, &HF_REQUEST_IN, resp.request_frame);
                let req_name = val_to_str(u32::from(resp.request_type.0), NINEP_MSG_TYPES);
                cx.tree
                    .add_generated(msg_root, &HF_REQUEST_TYPE, &*req_name);
                let path = resp.path.clone().or_else(|| {
                    self.state
                        .fid_path_before(conv, resp.fid, pos)
                        .map(str::to_owned)
                });
                if resp.fid != NOFID || path.is_some() {
                    let shown = path.as_deref().unwrap_or(UNKNOWN_PLACEHOLDER);
                    cx.tree.add_generated(msg_root, &HF_PATH, shown);
                }
            }
            None => {
                cx.tree
                    .add_generated(msg_root, &HF_REQUEST_TYPE, UNKNOWN_PLACEHOLDER);
                cx.tree
                    .add_generated(msg_root, &HF_PATH, UNKNOWN_PLACEHOLDER);
                let range = cx.tree.node(msg_root).map(|n| n.range.clone()).unwrap_or(0..0);
                cx.add_expert_summary(msg_root, &EI_NO_REQUEST, range);
            }
        }
    }
}

impl Dissector for NinePDissector {
    fn short_name(&self) -> &'static str {
        "9P"
    }

    fn full_name(&self) -> &'static str {
        "Plan 9"
    }

    fn filter_name(&self) -> &'static str {
        "9p"
    }

    fn ports(&self) -> Vec<(PortType, u16)> {
        vec![(PortType::Tcp, self.prefs.tcp_port)]
    }

    fn dissect(&mut self, cx: &mut PacketContext, data: &[u8]) -> usize {
        cx.columns.set_str(ColumnFormat::Protocol, "9P");
        cx.columns.clear(ColumnFormat::Info);
        let conv = cx.conversation();
        let mut offset = 0;
        let mut index = 0;
        while offset < data.len() {
            match self.dissect_message(cx, conv, data, offset, index) {
                Some(len) => offset += len,
                None => return data.len(),
            }
            cx.columns.set_fence(ColumnFormat::Info);
            index += 1;
        }
        offset
    }

    fn reset(&mut self) {
        self.state.reset();
    }
}
