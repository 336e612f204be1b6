//! Typed tree of decoded fields
//!
//! The tree is an arena: nodes are referenced by [`NodeId`], and each node keeps the byte range
//! of the packet data it was decoded from. Fields are described by static [`HeaderField`]
//! values, whose `abbrev` is the name used in filters and custom columns.

use std::fmt;
use std::fmt::Write;
use std::ops::Range;

use nom::Offset;

use crate::error::{DResult, DissectError};
use crate::frame::NsTime;

/// How the value of a field is rendered in its label
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldDisplay {
    None,
    Dec,
    Hex,
    Str,
    Bytes,
    Bool,
    Double,
    Time,
}

/// Static description of a field
#[derive(Debug, PartialEq, Eq)]
pub struct HeaderField {
    /// Human readable name
    pub name: &'static str,
    /// Filter name
    pub abbrev: &'static str,
    pub display: FieldDisplay,
}

impl HeaderField {
    pub const fn new(name: &'static str, abbrev: &'static str, display: FieldDisplay) -> Self {
        HeaderField {
            name,
            abbrev,
            display,
        }
    }
}

/// Decoded value of a field
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    None,
    UInt(u64),
    Int(i64),
    Double(f64),
    Bool(bool),
    Str(String),
    Bytes(Vec<u8>),
    Time(NsTime),
}

impl FieldValue {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::UInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as it must appear on the right side of a filter expression
    pub fn to_filter_string(&self) -> String {
        match self {
            FieldValue::Str(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            FieldValue::Bool(b) => if *b { "1" } else { "0" }.to_owned(),
            FieldValue::Bytes(b) => {
                let mut out = String::with_capacity(b.len() * 3);
                for (n, byte) in b.iter().enumerate() {
                    if n > 0 {
                        out.push(':');
                    }
                    let _ = write!(out, "{:02x}", byte);
                }
                out
            }
            v => v.to_string(),
        }
    }

    fn fmt_with(&self, display: FieldDisplay, f: &mut fmt::Formatter) -> fmt::Result {
        match (self, display) {
            (FieldValue::UInt(v), FieldDisplay::Hex) => write!(f, "0x{:08x}", v),
            (FieldValue::Int(v), FieldDisplay::Hex) => write!(f, "0x{:08x}", v),
            _ => fmt::Display::fmt(self, f),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldValue::None => Ok(()),
            FieldValue::UInt(v) => write!(f, "{}", v),
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Double(v) => write!(f, "{}", v),
            FieldValue::Bool(b) => f.write_str(if *b { "True" } else { "False" }),
            FieldValue::Str(s) => f.write_str(s),
            FieldValue::Bytes(b) => {
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            FieldValue::Time(t) => {
                if t.is_negative() {
                    write!(f, "-{}.{:09}", t.secs.unsigned_abs(), t.nsecs.unsigned_abs())
                } else {
                    write!(f, "{}.{:09}", t.secs, t.nsecs)
                }
            }
        }
    }
}

macro_rules! impl_from_uint {
    ($($t:ty),*) => {
        $(impl From<$t> for FieldValue {
            fn from(v: $t) -> Self {
                FieldValue::UInt(u64::from(v))
            }
        })*
    };
}

impl_from_uint!(u8, u16, u32, u64);

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Double(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl<'a> From<&'a str> for FieldValue {
    fn from(v: &'a str) -> Self {
        FieldValue::Str(v.to_owned())
    }
}

impl<'a> From<&'a [u8]> for FieldValue {
    fn from(v: &'a [u8]) -> Self {
        FieldValue::Bytes(v.to_vec())
    }
}

impl From<NsTime> for FieldValue {
    fn from(v: NsTime) -> Self {
        FieldValue::Time(v)
    }
}

/// Raw string bytes, as read from the wire (rendered lossily as UTF-8)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WireStr<'a>(pub &'a [u8]);

impl<'a> WireStr<'a> {
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.0).into_owned()
    }
}

impl<'a> From<WireStr<'a>> for FieldValue {
    fn from(v: WireStr<'a>) -> Self {
        FieldValue::Str(v.to_string_lossy())
    }
}

/// Index of a node in a [`ProtoTree`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

#[derive(Clone, Debug)]
pub struct ProtoNode {
    pub field: Option<&'static HeaderField>,
    pub label: String,
    pub value: FieldValue,
    /// Byte range in the packet data
    pub range: Range<usize>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// The item was computed (correlation, analysis), not read from the packet
    pub generated: bool,
}

impl ProtoNode {
    pub fn abbrev(&self) -> Option<&'static str> {
        self.field.map(|hf| hf.abbrev)
    }
}

/// The decoded fields of one packet
#[derive(Clone, Debug)]
pub struct ProtoTree {
    nodes: Vec<ProtoNode>,
}

impl Default for ProtoTree {
    fn default() -> Self {
        ProtoTree::new()
    }
}

impl ProtoTree {
    pub fn new() -> ProtoTree {
        let root = ProtoNode {
            field: None,
            label: String::new(),
            value: FieldValue::None,
            range: 0..0,
            parent: None,
            children: Vec::new(),
            generated: false,
        };
        ProtoTree { nodes: vec![root] }
    }

    fn push(&mut self, parent: NodeId, node: ProtoNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(id);
        }
        id
    }

    /// Add a field decoded from `range`
    pub fn add_item<V: Into<FieldValue>>(
        &mut self,
        parent: NodeId,
        hf: &'static HeaderField,
        range: Range<usize>,
        value: V,
    ) -> NodeId {
        let value = value.into();
        let label = item_label(hf, &value);
        self.push(
            parent,
            ProtoNode {
                field: Some(hf),
                label,
                value,
                range,
                parent: Some(parent),
                children: Vec::new(),
                generated: false,
            },
        )
    }

    /// Add a text-only node, usually the root of a subtree
    pub fn add_text<S: Into<String>>(
        &mut self,
        parent: NodeId,
        range: Range<usize>,
        label: S,
    ) -> NodeId {
        self.push(
            parent,
            ProtoNode {
                field: None,
                label: label.into(),
                value: FieldValue::None,
                range,
                parent: Some(parent),
                children: Vec::new(),
                generated: false,
            },
        )
    }

    /// Add a field that was computed rather than read from the packet
    pub fn add_generated<V: Into<FieldValue>>(
        &mut self,
        parent: NodeId,
        hf: &'static HeaderField,
        value: V,
    ) -> NodeId {
        let value = value.into();
        let label = format!("[{}]", item_label(hf, &value));
        self.push(
            parent,
            ProtoNode {
                field: Some(hf),
                label,
                value,
                range: 0..0,
                parent: Some(parent),
                children: Vec::new(),
                generated: true,
            },
        )
    }

    pub fn append_text(&mut self, id: NodeId, text: &str) {
        if let Some(n) = self.nodes.get_mut(id.0) {
            n.label.push_str(text);
        }
    }

    /// Set the end of the byte range of a subtree root, once its length is known
    pub fn set_end(&mut self, id: NodeId, end: usize) {
        if let Some(n) = self.nodes.get_mut(id.0) {
            n.range.end = end.max(n.range.start);
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&ProtoNode> {
        self.nodes.get(id.0)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Number of nodes, root excluded
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// All nodes, in insertion order (root excluded)
    pub fn iter(&self) -> impl Iterator<Item = &ProtoNode> {
        self.nodes.iter().skip(1)
    }

    /// First node with filter name `abbrev`
    pub fn find(&self, abbrev: &str) -> Option<&ProtoNode> {
        self.iter().find(|n| n.abbrev() == Some(abbrev))
    }

    /// Values of all nodes with filter name `abbrev`
    pub fn values<'t>(&'t self, abbrev: &'t str) -> impl Iterator<Item = &'t FieldValue> + 't {
        self.iter()
            .filter(move |n| n.abbrev() == Some(abbrev))
            .map(|n| &n.value)
    }

    /// Last node with filter name `abbrev`
    pub fn last(&self, abbrev: &str) -> Option<&ProtoNode> {
        self.iter().filter(|n| n.abbrev() == Some(abbrev)).last()
    }

    /// Run `parser` on `i` and record the result as field `hf`
    ///
    /// `base` is the packet data; the byte range of the item is the part of `base` that
    /// `parser` consumed.
    pub fn parse_item<'a, O, P>(
        &mut self,
        parent: NodeId,
        base: &'a [u8],
        i: &'a [u8],
        hf: &'static HeaderField,
        mut parser: P,
    ) -> DResult<'a, O>
    where
        O: Clone + Into<FieldValue>,
        P: FnMut(&'a [u8]) -> DResult<'a, O>,
    {
        let (rem, o) = parser(i)?;
        let start = base.offset(i);
        let end = base.offset(rem);
        self.add_item(parent, hf, start..end, o.clone());
        Ok((rem, o))
    }

    /// Render the tree as indented text
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_node(NodeId::ROOT, 0, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        for &child in self.children(id) {
            if let Some(n) = self.node(child) {
                let _ = writeln!(out, "{:indent$}{}", "", n.label, indent = depth * 4);
                self.dump_node(child, depth + 1, out);
            }
        }
    }
}

/// Result of one step of an [`ItemParser`]
pub type ItemResult<'a, T> = Result<T, nom::Err<DissectError<&'a [u8]>>>;

/// Sequential decoder adding one tree item per parsed field
///
/// `base` is the packet data, used to compute the byte ranges of the items; `rest` is the
/// data still to decode.
pub struct ItemParser<'t, 'a> {
    pub tree: &'t mut ProtoTree,
    pub parent: NodeId,
    base: &'a [u8],
    pub rest: &'a [u8],
}

impl<'t, 'a> ItemParser<'t, 'a> {
    pub fn new(tree: &'t mut ProtoTree, parent: NodeId, base: &'a [u8], rest: &'a [u8]) -> Self {
        ItemParser {
            tree,
            parent,
            base,
            rest,
        }
    }

    /// Offset of the next byte to decode, in the packet data
    #[inline]
    pub fn offset(&self) -> usize {
        self.base.offset(self.rest)
    }

    #[inline]
    pub fn base(&self) -> &'a [u8] {
        self.base
    }

    /// Parse one field and add it to the tree
    pub fn item<O, P>(&mut self, hf: &'static HeaderField, parser: P) -> ItemResult<'a, O>
    where
        O: Clone + Into<FieldValue>,
        P: FnMut(&'a [u8]) -> DResult<'a, O>,
    {
        let (rem, o) = self
            .tree
            .parse_item(self.parent, self.base, self.rest, hf, parser)?;
        self.rest = rem;
        Ok(o)
    }

    /// Parse a value without adding it to the tree
    pub fn parse<O, P>(&mut self, mut parser: P) -> ItemResult<'a, O>
    where
        P: FnMut(&'a [u8]) -> DResult<'a, O>,
    {
        let (rem, o) = parser(self.rest)?;
        self.rest = rem;
        Ok(o)
    }

    /// Open a subtree starting at the current offset, and make it the parent of the next items
    ///
    /// Returns the previous parent, to be given back to [`ItemParser::close`].
    pub fn open<S: Into<String>>(&mut self, label: S) -> NodeId {
        let start = self.offset();
        let node = self.tree.add_text(self.parent, start..start, label);
        std::mem::replace(&mut self.parent, node)
    }

    /// Close the current subtree, setting its end to the current offset
    pub fn close(&mut self, previous: NodeId) {
        let end = self.offset();
        self.tree.set_end(self.parent, end);
        self.parent = previous;
    }
}

fn item_label(hf: &HeaderField, value: &FieldValue) -> String {
    if let FieldValue::None = value {
        return hf.name.to_owned();
    }
    struct Shown<'v>(&'v FieldValue, FieldDisplay);
    impl<'v> fmt::Display for Shown<'v> {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            self.0.fmt_with(self.1, f)
        }
    }
    format!("{}: {}", hf.name, Shown(value, hf.display))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nom::number::streaming::le_u16;

    static HF_A: HeaderField = HeaderField::new("Field A", "test.a", FieldDisplay::Dec);
    static HF_S: HeaderField = HeaderField::new("Name", "test.name", FieldDisplay::Str);
    static HF_H: HeaderField = HeaderField::new("Flags", "test.flags", FieldDisplay::Hex);

    #[test]
    fn parse_item_records_range() {
        let data = [0xff, 0x01, 0x02, 0xee];
        let mut tree = ProtoTree::new();
        let (rem, v) = tree
            .parse_item(NodeId::ROOT, &data, &data[1..], &HF_A, le_u16)
            .expect("parse");
        assert_eq!(v, 0x0201);
        assert_eq!(rem, &[0xee]);
        let n = tree.find("test.a").expect("node");
        assert_eq!(n.range, 1..3);
        assert_eq!(n.label, "Field A: 513");
    }

    #[test]
    fn subtree_and_values() {
        let mut tree = ProtoTree::new();
        let sub = tree.add_text(NodeId::ROOT, 0..4, "Sub");
        tree.add_item(sub, &HF_S, 0..2, "x");
        tree.add_item(sub, &HF_S, 2..4, "y");
        tree.add_item(sub, &HF_H, 2..4, 0x10u32);
        tree.add_generated(sub, &HF_A, 3u32);
        let v: Vec<_> = tree.values("test.name").map(|v| v.to_string()).collect();
        assert_eq!(v, vec!["x", "y"]);
        assert_eq!(tree.last("test.name").map(|n| n.range.clone()), Some(2..4));
        assert_eq!(tree.children(sub).len(), 4);
        let dump = tree.dump();
        assert!(dump.starts_with("Sub\n    Name: x\n"));
        assert!(dump.contains("    Flags: 0x00000010\n"));
        assert!(dump.contains("    [Field A: 3]\n"));
    }

    #[test]
    fn filter_rendering() {
        assert_eq!(FieldValue::from("a\"b").to_filter_string(), "\"a\\\"b\"");
        assert_eq!(FieldValue::from(&[1u8, 0xab][..]).to_filter_string(), "01:ab");
        assert_eq!(FieldValue::Time(NsTime::new(1, 5)).to_string(), "1.000000005");
    }
}
