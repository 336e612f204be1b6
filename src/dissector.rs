use std::collections::HashMap;

use crate::frame::{FrameContext, PortType};
use crate::packet::PacketContext;

/// A protocol dissector
///
/// A dissector keeps its protocol state between packets. It must only modify that state
/// while the frame is seen for the first time (see [`FrameContext::first_pass`]).
pub trait Dissector {
    /// Name shown in the Protocol column
    fn short_name(&self) -> &'static str;
    fn full_name(&self) -> &'static str;
    /// Prefix of the filter names of the fields of the protocol
    fn filter_name(&self) -> &'static str;

    /// Transport ports this dissector is registered on
    fn ports(&self) -> Vec<(PortType, u16)>;

    /// Dissect the transport payload `data`, and return the number of bytes used
    fn dissect(&mut self, cx: &mut PacketContext, data: &[u8]) -> usize;

    /// Forget all protocol state (new capture)
    fn reset(&mut self);
}

/// Dissectors, indexed by transport port
#[derive(Default)]
pub struct DissectorTable {
    dissectors: Vec<Box<dyn Dissector>>,
    by_port: HashMap<(PortType, u16), usize>,
}

impl DissectorTable {
    pub fn new() -> DissectorTable {
        DissectorTable::default()
    }

    /// Register a dissector on its ports; a port already taken keeps its first dissector
    pub fn register(&mut self, dissector: Box<dyn Dissector>) {
        let idx = self.dissectors.len();
        for key in dissector.ports() {
            self.by_port.entry(key).or_insert(idx);
        }
        self.dissectors.push(dissector);
    }

    /// Find the dissector of a frame, trying the lower port first
    pub fn lookup(&mut self, frame: &FrameContext) -> Option<&mut Box<dyn Dissector>> {
        let (low, high) = if frame.src_port <= frame.dst_port {
            (frame.src_port, frame.dst_port)
        } else {
            (frame.dst_port, frame.src_port)
        };
        let idx = self
            .by_port
            .get(&(frame.port_type, low))
            .or_else(|| self.by_port.get(&(frame.port_type, high)))
            .copied()?;
        self.dissectors.get_mut(idx)
    }

    pub fn by_filter_name(&mut self, name: &str) -> Option<&mut Box<dyn Dissector>> {
        self.dissectors.iter_mut().find(|d| d.filter_name() == name)
    }

    pub fn len(&self) -> usize {
        self.dissectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dissectors.is_empty()
    }

    pub fn reset(&mut self) {
        for d in self.dissectors.iter_mut() {
            d.reset();
        }
    }
}
