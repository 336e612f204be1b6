use std::ops::Range;

use tracing::debug;

use crate::column::{ColumnFormat, ColumnRow, ColumnSet};
use crate::conversation::{ConversationId, ConversationTable};
use crate::expert::{ExpertField, ExpertInfo};
use crate::frame::FrameContext;
use crate::tree::{NodeId, ProtoTree};

/// Everything a dissector reads and writes while dissecting one packet
pub struct PacketContext<'p> {
    pub frame: &'p FrameContext,
    pub columns: &'p mut ColumnSet<'static>,
    pub conversations: &'p mut ConversationTable,
    pub tree: ProtoTree,
    pub expert: Vec<ExpertInfo>,
}

impl<'p> PacketContext<'p> {
    pub fn new(
        frame: &'p FrameContext,
        columns: &'p mut ColumnSet<'static>,
        conversations: &'p mut ConversationTable,
    ) -> Self {
        PacketContext {
            frame,
            columns,
            conversations,
            tree: ProtoTree::new(),
            expert: Vec::new(),
        }
    }

    /// Conversation of the transport endpoints of the packet
    pub fn conversation(&mut self) -> ConversationId {
        self.conversations.find_or_create_for_frame(self.frame)
    }

    /// Raise an annotation on `range`, attached to `node`
    pub fn add_expert<S: Into<String>>(
        &mut self,
        node: NodeId,
        field: &'static ExpertField,
        range: Range<usize>,
        message: S,
    ) {
        let message = message.into();
        debug!(
            frame = self.frame.number,
            expert = field.name,
            start = range.start,
            end = range.end,
            "{}",
            message
        );
        self.expert.push(ExpertInfo {
            field,
            message,
            range,
            node,
        });
    }

    /// Raise an annotation with the default message of `field`
    pub fn add_expert_summary(&mut self, node: NodeId, field: &'static ExpertField, range: Range<usize>) {
        self.add_expert(node, field, range, field.summary);
    }

    pub fn finish(self) -> (ProtoTree, Vec<ExpertInfo>) {
        (self.tree, self.expert)
    }
}

/// Result of the dissection of one packet
#[derive(Clone, Debug)]
pub struct DissectedPacket {
    pub frame_number: u32,
    pub tree: ProtoTree,
    pub expert: Vec<ExpertInfo>,
    pub row: ColumnRow,
}

impl DissectedPacket {
    pub fn info(&self) -> Option<&str> {
        self.row.text(ColumnFormat::Info)
    }

    pub fn protocol(&self) -> Option<&str> {
        self.row.text(ColumnFormat::Protocol)
    }

    /// Returns true if any structural error was found
    pub fn is_malformed(&self) -> bool {
        self.expert.iter().any(ExpertInfo::is_malformed)
    }

    /// Annotations of kind `name`
    pub fn expert_named<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s ExpertInfo> + 's {
        self.expert.iter().filter(move |e| e.field.name == name)
    }
}
