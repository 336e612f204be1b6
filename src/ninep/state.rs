//! Tag and fid tracking
//!
//! All 9P state of a conversation lives in one [`StateTable`], keyed by [`NinePKey`]:
//!
//! - [`NinePKey::Conversation`] holds the negotiated version,
//! - [`NinePKey::Tag`] holds the pending request of a tag,
//! - [`NinePKey::Fid`] holds the paths a fid referred to.
//!
//! Versions and fid paths are kept as histories indexed by message position, so that a
//! later pass resolves exactly what the first pass did.

use std::collections::BTreeMap;

use crate::conversation::{ConversationId, FrameDataTable, StateTable};
use crate::frame::FrameContext;
use crate::ninep::message::{NinePMsgType, NinePVersion, NOFID};

/// Shown when the path of a fid, or the request of a response, is not known
pub const UNKNOWN_PLACEHOLDER: &str = "<unknown>";

/// Sub-key of the 9P state table
///
/// Version exchanges use `NOTAG`, so the conversation-wide entry has a key of its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NinePKey {
    Conversation,
    Tag(u16),
    Fid(u32),
}

/// Position of a message in the capture: frame number, then index in the frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessagePos {
    pub frame: u32,
    pub index: u32,
}

/// Values of something over time, indexed by the message that set them
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct History<T> {
    entries: BTreeMap<MessagePos, T>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        History {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> History<T> {
    pub fn record(&mut self, pos: MessagePos, value: T) {
        self.entries.insert(pos, value);
    }

    /// Value in effect at `pos` (the last one recorded at or before it)
    pub fn at(&self, pos: MessagePos) -> Option<&T> {
        self.entries.range(..=pos).next_back().map(|(_, v)| v)
    }

    /// Value in effect just before `pos`
    pub fn before(&self, pos: MessagePos) -> Option<&T> {
        self.entries.range(..pos).next_back().map(|(_, v)| v)
    }
}

/// A request waiting for its response
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagInfo {
    pub msg_type: NinePMsgType,
    pub frame: u32,
    pub fid: u32,
    pub newfid: u32,
    /// Path the fid (or newfid) will refer to if the request succeeds
    pub newpath: Option<String>,
    pub nwname: u16,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NinePEntry {
    Version(History<NinePVersion>),
    Tag(TagInfo),
    Fid(History<Option<String>>),
}

/// What a response learned from its request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseInfo {
    pub request_frame: u32,
    pub request_type: NinePMsgType,
    pub fid: u32,
    pub path: Option<String>,
}

/// 9P state of all conversations of a capture
#[derive(Debug)]
pub struct NinePState {
    entries: StateTable<NinePKey, NinePEntry>,
    responses: FrameDataTable<Option<ResponseInfo>>,
}

impl Default for NinePState {
    fn default() -> Self {
        NinePState::new()
    }
}

/// Join a directory path and path elements
pub fn join_path<S: AsRef<str>>(base: &str, elements: &[S]) -> String {
    let mut path = base.to_owned();
    for e in elements {
        if !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(e.as_ref());
    }
    path
}

impl NinePState {
    pub fn new() -> NinePState {
        NinePState {
            entries: StateTable::new("9p"),
            responses: FrameDataTable::new(),
        }
    }

    pub fn reset(&mut self) {
        self.entries.reset();
        self.responses.reset();
    }

    /// Version in effect at `pos` (9P2000 if never negotiated)
    pub fn version_at(&self, conv: ConversationId, pos: MessagePos) -> NinePVersion {
        match self.entries.get(conv, NinePKey::Conversation) {
            Some(NinePEntry::Version(h)) => h.at(pos).copied().unwrap_or_default(),
            _ => NinePVersion::default(),
        }
    }

    pub fn set_version(&mut self, frame: &FrameContext, conv: ConversationId, pos: MessagePos, version: NinePVersion) {
        let entry = self
            .entries
            .get_or_insert_with(frame, conv, NinePKey::Conversation, || {
                NinePEntry::Version(History::default())
            });
        if let Some(NinePEntry::Version(h)) = entry {
            h.record(pos, version);
        }
    }

    /// Path of `fid` at `pos`, if known
    pub fn fid_path(&self, conv: ConversationId, fid: u32, pos: MessagePos) -> Option<&str> {
        match self.entries.get(conv, NinePKey::Fid(fid)) {
            Some(NinePEntry::Fid(h)) => h.at(pos).and_then(|p| p.as_deref()),
            _ => None,
        }
    }

    /// Path of `fid` just before the message at `pos`, ignoring what that message bound
    pub fn fid_path_before(&self, conv: ConversationId, fid: u32, pos: MessagePos) -> Option<&str> {
        match self.entries.get(conv, NinePKey::Fid(fid)) {
            Some(NinePEntry::Fid(h)) => h.before(pos).and_then(|p| p.as_deref()),
            _ => None,
        }
    }

    /// Make `fid` refer to `path` from `pos` on (None closes it)
    pub fn bind_fid(
        &mut self,
        frame: &FrameContext,
        conv: ConversationId,
        fid: u32,
        pos: MessagePos,
        path: Option<String>,
    ) {
        if fid == NOFID {
            return;
        }
        let entry = self
            .entries
            .get_or_insert_with(frame, conv, NinePKey::Fid(fid), || {
                NinePEntry::Fid(History::default())
            });
        if let Some(NinePEntry::Fid(h)) = entry {
            h.record(pos, path);
        }
    }

    /// Remember a request until its response; a previous request on the same tag is dropped
    pub fn store_request(&mut self, frame: &FrameContext, conv: ConversationId, tag: u16, info: TagInfo) {
        self.entries
            .set(frame, conv, NinePKey::Tag(tag), NinePEntry::Tag(info));
    }

    /// Take the request matching a response
    ///
    /// On the first pass the request is removed, and the result is attached to the frame;
    /// later passes read the attached result.
    pub fn resolve_response(
        &mut self,
        frame: &FrameContext,
        conv: ConversationId,
        tag: u16,
        index: u32,
    ) -> (Option<TagInfo>, Option<ResponseInfo>) {
        if !frame.first_pass() {
            let cached = self.responses.get(frame, index).cloned().flatten();
            return (None, cached);
        }
        let info = match self.entries.remove(frame, conv, NinePKey::Tag(tag)) {
            Some(NinePEntry::Tag(info)) => Some(info),
            _ => None,
        };
        let response = info.as_ref().map(|t| ResponseInfo {
            request_frame: t.frame,
            request_type: t.msg_type,
            fid: t.fid,
            path: t.newpath.clone(),
        });
        self.responses.set(frame, index, response.clone());
        (info, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ninep::message::NOTAG;

    fn pos(frame: u32, index: u32) -> MessagePos {
        MessagePos { frame, index }
    }

    #[test]
    fn history_lookup() {
        let mut h = History::default();
        h.record(pos(2, 0), "a");
        h.record(pos(5, 1), "b");
        assert_eq!(h.at(pos(1, 9)), None);
        assert_eq!(h.at(pos(2, 0)), Some(&"a"));
        assert_eq!(h.at(pos(5, 0)), Some(&"a"));
        assert_eq!(h.at(pos(7, 0)), Some(&"b"));
        assert_eq!(h.before(pos(5, 1)), Some(&"a"));
        assert_eq!(h.before(pos(2, 0)), None);
    }

    #[test]
    fn join() {
        assert_eq!(join_path("/export", &["foo", "bar"]), "/export/foo/bar");
        assert_eq!(join_path("/", &["etc"]), "/etc");
        assert_eq!(join_path::<&str>("/x", &[]), "/x");
    }

    #[test]
    fn fid_paths_survive_a_second_pass() {
        let conv = ConversationId(0);
        let mut st = NinePState::new();
        let f1 = FrameContext {
            number: 1,
            ..FrameContext::default()
        };
        let f3 = FrameContext {
            number: 3,
            ..FrameContext::default()
        };
        st.bind_fid(&f1, conv, 5, pos(1, 0), Some("/export".to_owned()));
        st.bind_fid(&f3, conv, 5, pos(3, 0), None);
        st.bind_fid(&f3.revisited(), conv, 5, pos(3, 0), Some("/bad".to_owned()));
        assert_eq!(st.fid_path(conv, 5, pos(2, 0)), Some("/export"));
        assert_eq!(st.fid_path(conv, 5, pos(3, 0)), None);
        assert_eq!(st.version_at(conv, pos(9, 0)), NinePVersion::V2000);
        st.set_version(&f1, conv, pos(1, 0), NinePVersion::V2000L);
        assert_eq!(st.version_at(conv, pos(1, 1)), NinePVersion::V2000L);
    }

    #[test]
    fn version_survives_a_pending_notag_request() {
        let conv = ConversationId(0);
        let mut st = NinePState::new();
        let f1 = FrameContext {
            number: 1,
            ..FrameContext::default()
        };
        let f2 = FrameContext {
            number: 2,
            ..FrameContext::default()
        };
        let info = TagInfo {
            msg_type: NinePMsgType::Tversion,
            frame: 1,
            fid: NOFID,
            newfid: NOFID,
            newpath: None,
            nwname: 0,
        };
        st.set_version(&f1, conv, pos(1, 0), NinePVersion::V2000L);
        st.store_request(&f1, conv, NOTAG, info);
        st.set_version(&f2, conv, pos(2, 0), NinePVersion::V2000L);
        let (req, resp) = st.resolve_response(&f2, conv, NOTAG, 0);
        assert_eq!(req.map(|r| r.msg_type), Some(NinePMsgType::Tversion));
        assert_eq!(resp.map(|r| r.request_frame), Some(1));
        assert_eq!(st.version_at(conv, pos(3, 0)), NinePVersion::V2000L);
    }
}
