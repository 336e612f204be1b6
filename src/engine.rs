//! The dissection engine: one packet in, one tree and one row of columns out

use tracing::{debug, trace};

use crate::collectd::CollectdDissector;
use crate::column::{ColumnFormat, ColumnSet, ColumnSpec};
use crate::conversation::ConversationTable;
use crate::dissector::{Dissector, DissectorTable};
use crate::frame::{FrameContext, PortType};
use crate::lbtru::LbtruDissector;
use crate::ninep::NinePDissector;
use crate::packet::{DissectedPacket, PacketContext};
use crate::prefs::Preferences;
use crate::tree::{FieldDisplay, HeaderField, NodeId};

pub static HF_FRAME_NUMBER: HeaderField = HeaderField::new("Frame Number", "frame.number", FieldDisplay::Dec);
pub static HF_FRAME_LEN: HeaderField = HeaderField::new("Frame Length", "frame.len", FieldDisplay::Dec);
pub static HF_FRAME_TIME: HeaderField = HeaderField::new("Arrival Time", "frame.time", FieldDisplay::Time);
pub static HF_SRC_PORT: HeaderField = HeaderField::new("Source Port", "srcport", FieldDisplay::Dec);
pub static HF_DST_PORT: HeaderField = HeaderField::new("Destination Port", "dstport", FieldDisplay::Dec);
pub static HF_DATA: HeaderField = HeaderField::new("Data", "data.data", FieldDisplay::Bytes);

/// Owns the columns, the conversations and the dissectors of a capture session
///
/// Frames must be presented in order on the first pass (`visited == false`). Later passes
/// may present any frame again with `visited` set; they find the state built by the first
/// pass and produce the same result.
///
/// # Example
///
/// ```rust
/// use packet_dissect::*;
///
/// let mut engine = Engine::new(Preferences::default(), &default_columns());
/// let frame = FrameContext {
///     number: 1,
///     pkt_len: 4,
///     ..FrameContext::default()
/// }
/// .with_endpoints(
///     PortType::Udp,
///     Endpoint::new(std::net::Ipv4Addr::new(10, 0, 0, 1), 40000),
///     Endpoint::new(std::net::Ipv4Addr::new(10, 0, 0, 2), 9),
/// );
/// let packet = engine.dissect(&frame, b"ping");
/// assert_eq!(packet.protocol(), Some("UDP"));
/// assert_eq!(packet.info(), Some("40000 → 9 Len=4"));
/// ```
pub struct Engine {
    prefs: Preferences,
    columns: ColumnSet<'static>,
    conversations: ConversationTable,
    dissectors: DissectorTable,
}

impl Engine {
    /// Create an engine with the built-in dissectors, configured by `prefs`
    pub fn new(prefs: Preferences, specs: &[ColumnSpec]) -> Engine {
        let mut dissectors = DissectorTable::new();
        dissectors.register(Box::new(NinePDissector::new(prefs.ninep.clone())));
        dissectors.register(Box::new(CollectdDissector::new(prefs.collectd.clone())));
        dissectors.register(Box::new(LbtruDissector::new(prefs.lbtru.clone())));
        Engine {
            columns: ColumnSet::setup(specs, prefs.time),
            conversations: ConversationTable::new(),
            dissectors,
            prefs,
        }
    }

    /// Register another dissector; ports already taken keep their dissector
    pub fn register(&mut self, dissector: Box<dyn Dissector>) {
        self.dissectors.register(dissector);
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn columns(&self) -> &ColumnSet<'static> {
        &self.columns
    }

    pub fn conversations(&self) -> &ConversationTable {
        &self.conversations
    }

    /// Dissect the transport payload `data` of `frame`
    pub fn dissect(&mut self, frame: &FrameContext, data: &[u8]) -> DissectedPacket {
        self.columns.init();
        let mut cx = PacketContext::new(frame, &mut self.columns, &mut self.conversations);

        let root = cx.tree.add_text(
            NodeId::ROOT,
            0..data.len(),
            format!("Frame {}: {} bytes", frame.number, frame.pkt_len),
        );
        cx.tree.add_generated(root, &HF_FRAME_NUMBER, frame.number);
        cx.tree.add_generated(root, &HF_FRAME_LEN, frame.pkt_len);
        cx.tree.add_generated(root, &HF_FRAME_TIME, frame.abs_ts);
        if frame.port_type != PortType::None {
            let node = cx.tree.add_text(root, 0..0, frame.port_type.name());
            cx.tree.add_generated(node, &HF_SRC_PORT, frame.src_port);
            cx.tree.add_generated(node, &HF_DST_PORT, frame.dst_port);
        }

        cx.columns.set_str(ColumnFormat::Protocol, frame.port_type.name());
        cx.columns.add_fstr(
            ColumnFormat::Info,
            format_args!("{} → {} Len={}", frame.src_port, frame.dst_port, data.len()),
        );

        match self.dissectors.lookup(frame) {
            Some(dissector) => {
                trace!(frame = frame.number, dissector = dissector.short_name(), "dispatch");
                let used = dissector.dissect(&mut cx, data);
                if used < data.len() {
                    debug!(
                        frame = frame.number,
                        used,
                        len = data.len(),
                        dissector = dissector.filter_name(),
                        "payload not fully dissected"
                    );
                }
            }
            None if !data.is_empty() => {
                cx.tree.add_item(NodeId::ROOT, &HF_DATA, 0..data.len(), data);
            }
            None => (),
        }

        let (tree, expert) = cx.finish();
        self.columns.fill_in(frame, true, true);
        self.columns.fill_custom(&tree);
        DissectedPacket {
            frame_number: frame.number,
            tree,
            expert,
            row: self.columns.row(),
        }
    }

    /// Forget the state of all dissectors and conversations, before reading a new capture
    pub fn reset_for_capture(&mut self) {
        debug!(conversations = self.conversations.len(), "reset for a new capture");
        self.conversations.reset();
        self.dissectors.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::default_columns;
    use crate::frame::Endpoint;
    use std::net::Ipv4Addr;

    #[test]
    fn unknown_port_gets_data() {
        let mut engine = Engine::new(Preferences::default(), &default_columns());
        let frame = FrameContext {
            number: 1,
            pkt_len: 3,
            ..FrameContext::default()
        }
        .with_endpoints(
            PortType::Tcp,
            Endpoint::new(Ipv4Addr::new(192, 168, 0, 1), 1234),
            Endpoint::new(Ipv4Addr::new(192, 168, 0, 2), 80),
        );
        let p = engine.dissect(&frame, &[1, 2, 3]);
        assert_eq!(p.protocol(), Some("TCP"));
        assert_eq!(p.info(), Some("1234 → 80 Len=3"));
        assert!(p.tree.find("data.data").is_some());
        assert_eq!(p.row.text(ColumnFormat::DefSrc), Some("192.168.0.1"));
        assert_eq!(p.row.text(ColumnFormat::Number), Some("1"));
    }
}
