//! Severity-tagged annotations attached to byte ranges of a packet

use std::fmt;
use std::ops::Range;

use crate::tree::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Comment,
    Chat,
    Note,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Severity::Comment => "Comment",
            Severity::Chat => "Chat",
            Severity::Note => "Note",
            Severity::Warn => "Warning",
            Severity::Error => "Error",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExpertGroup {
    Checksum,
    Sequence,
    ResponseCode,
    RequestCode,
    Undecoded,
    Reassemble,
    Malformed,
    Debug,
    Protocol,
    Security,
    Comment,
    Decryption,
    Assumption,
    Deprecated,
}

/// Static description of an annotation kind
#[derive(Debug, PartialEq, Eq)]
pub struct ExpertField {
    /// Filter name, e.g. `9p.malformed`
    pub name: &'static str,
    pub group: ExpertGroup,
    pub severity: Severity,
    /// Default message
    pub summary: &'static str,
}

impl ExpertField {
    pub const fn new(
        name: &'static str,
        group: ExpertGroup,
        severity: Severity,
        summary: &'static str,
    ) -> Self {
        ExpertField {
            name,
            group,
            severity,
            summary,
        }
    }
}

/// One annotation raised while dissecting a packet
#[derive(Clone, Debug, PartialEq)]
pub struct ExpertInfo {
    pub field: &'static ExpertField,
    pub message: String,
    /// Byte range in the packet data
    pub range: Range<usize>,
    /// Tree node the annotation is attached to
    pub node: NodeId,
}

impl ExpertInfo {
    #[inline]
    pub fn severity(&self) -> Severity {
        self.field.severity
    }

    #[inline]
    pub fn is_malformed(&self) -> bool {
        self.field.group == ExpertGroup::Malformed
    }
}

impl fmt::Display for ExpertInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} ({}) [{}..{}]: {}",
            self.field.name, self.field.severity, self.range.start, self.range.end, self.message
        )
    }
}
