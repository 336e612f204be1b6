//! Conversations and per-conversation protocol state
//!
//! Protocol state lives in [`StateTable`]s keyed by `(conversation, sub-key)`. State is only
//! created, replaced or removed while the frame is seen for the first time; lookups are
//! always allowed. Later passes over the capture therefore see the state built by the first
//! one, in the same order.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use tracing::debug;

use crate::frame::{Endpoint, FrameContext, PortType};

/// Index of a conversation in a [`ConversationTable`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConversationId(pub u32);

/// A bidirectional exchange between two endpoints
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversation {
    pub id: ConversationId,
    pub port_type: PortType,
    /// Endpoints, in canonical order
    pub endpoints: (Endpoint, Endpoint),
    pub first_frame: u32,
    pub last_frame: u32,
}

type EndpointKey = (PortType, Endpoint, Endpoint);

fn canonical(port_type: PortType, a: Endpoint, b: Endpoint) -> EndpointKey {
    if a <= b {
        (port_type, a, b)
    } else {
        (port_type, b, a)
    }
}

/// Registry of the conversations of a capture
#[derive(Debug, Default)]
pub struct ConversationTable {
    by_endpoints: HashMap<EndpointKey, ConversationId>,
    conversations: Vec<Conversation>,
}

impl ConversationTable {
    pub fn new() -> ConversationTable {
        ConversationTable::default()
    }

    /// Look up the conversation between `a` and `b`, in either direction
    pub fn find(&self, port_type: PortType, a: Endpoint, b: Endpoint) -> Option<ConversationId> {
        self.by_endpoints
            .get(&canonical(port_type, a, b))
            .copied()
    }

    /// Look up the conversation between `a` and `b`, creating it if needed
    pub fn find_or_create(
        &mut self,
        frame: &FrameContext,
        port_type: PortType,
        a: Endpoint,
        b: Endpoint,
    ) -> ConversationId {
        let key = canonical(port_type, a, b);
        let next_id = ConversationId(self.conversations.len() as u32);
        let id = match self.by_endpoints.entry(key) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                debug!(conversation = next_id.0, frame = frame.number, "new conversation");
                self.conversations.push(Conversation {
                    id: next_id,
                    port_type,
                    endpoints: (key.1, key.2),
                    first_frame: frame.number,
                    last_frame: frame.number,
                });
                *e.insert(next_id)
            }
        };
        if frame.first_pass() {
            if let Some(c) = self.conversations.get_mut(id.0 as usize) {
                c.last_frame = c.last_frame.max(frame.number);
            }
        }
        id
    }

    /// Conversation of the transport endpoints of `frame`
    pub fn find_or_create_for_frame(&mut self, frame: &FrameContext) -> ConversationId {
        self.find_or_create(
            frame,
            frame.port_type,
            frame.src_endpoint(),
            frame.dst_endpoint(),
        )
    }

    pub fn get(&self, id: ConversationId) -> Option<&Conversation> {
        self.conversations.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Forget all conversations (new capture)
    pub fn reset(&mut self) {
        self.by_endpoints.clear();
        self.conversations.clear();
    }
}

/// Key of a protocol state entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConversationKey<K> {
    pub conversation: ConversationId,
    pub subkey: K,
}

impl<K> ConversationKey<K> {
    pub fn new(conversation: ConversationId, subkey: K) -> Self {
        ConversationKey {
            conversation,
            subkey,
        }
    }
}

/// Protocol state, at most one value per `(conversation, sub-key)`
#[derive(Debug)]
pub struct StateTable<K, V> {
    name: &'static str,
    entries: HashMap<ConversationKey<K>, V>,
}

impl<K, V> StateTable<K, V>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Create an empty table; `name` is only used in log messages
    pub fn new(name: &'static str) -> Self {
        StateTable {
            name,
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, conversation: ConversationId, subkey: K) -> Option<&V> {
        self.entries.get(&ConversationKey::new(conversation, subkey))
    }

    pub fn contains(&self, conversation: ConversationId, subkey: K) -> bool {
        self.entries
            .contains_key(&ConversationKey::new(conversation, subkey))
    }

    /// Insert or replace a value, dropping the previous one
    ///
    /// Returns false without storing anything if the frame was already visited.
    pub fn set(&mut self, frame: &FrameContext, conversation: ConversationId, subkey: K, value: V) -> bool {
        if !frame.first_pass() {
            return false;
        }
        debug!(table = self.name, frame = frame.number, key = ?subkey, "state set");
        self.entries
            .insert(ConversationKey::new(conversation, subkey), value);
        true
    }

    /// Remove a value; nothing is removed if the frame was already visited
    pub fn remove(&mut self, frame: &FrameContext, conversation: ConversationId, subkey: K) -> Option<V> {
        if !frame.first_pass() {
            return None;
        }
        let v = self
            .entries
            .remove(&ConversationKey::new(conversation, subkey));
        if v.is_some() {
            debug!(table = self.name, frame = frame.number, key = ?subkey, "state removed");
        }
        v
    }

    /// Mutable access to a value, only while the frame is seen for the first time
    pub fn get_mut(&mut self, frame: &FrameContext, conversation: ConversationId, subkey: K) -> Option<&mut V> {
        if !frame.first_pass() {
            return None;
        }
        self.entries
            .get_mut(&ConversationKey::new(conversation, subkey))
    }

    /// Mutable access to a value, created with `f` if absent
    ///
    /// Returns None if the frame was already visited.
    pub fn get_or_insert_with<F>(
        &mut self,
        frame: &FrameContext,
        conversation: ConversationId,
        subkey: K,
        f: F,
    ) -> Option<&mut V>
    where
        F: FnOnce() -> V,
    {
        if !frame.first_pass() {
            return None;
        }
        let name = self.name;
        let entry = self
            .entries
            .entry(ConversationKey::new(conversation, subkey))
            .or_insert_with(|| {
                debug!(table = name, frame = frame.number, key = ?subkey, "state created");
                f()
            });
        Some(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

/// Data attached to a frame by its first dissection
///
/// `index` distinguishes several values attached to the same frame, for example one per
/// message of a segment.
#[derive(Debug)]
pub struct FrameDataTable<V> {
    entries: HashMap<(u32, u32), V>,
}

impl<V> Default for FrameDataTable<V> {
    fn default() -> Self {
        FrameDataTable {
            entries: HashMap::new(),
        }
    }
}

impl<V> FrameDataTable<V> {
    pub fn new() -> Self {
        FrameDataTable::default()
    }

    pub fn get(&self, frame: &FrameContext, index: u32) -> Option<&V> {
        self.entries.get(&(frame.number, index))
    }

    /// Attach a value to the frame; ignored if the frame was already visited
    pub fn set(&mut self, frame: &FrameContext, index: u32, value: V) -> bool {
        if !frame.first_pass() {
            return false;
        }
        self.entries.insert((frame.number, index), value);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn frame(number: u32) -> FrameContext {
        FrameContext {
            number,
            ..FrameContext::default()
        }
    }

    #[test]
    fn conversation_is_bidirectional() {
        let a = Endpoint::new(Ipv4Addr::new(10, 0, 0, 1), 40000);
        let b = Endpoint::new(Ipv4Addr::new(10, 0, 0, 2), 564);
        let mut table = ConversationTable::new();
        let c1 = table.find_or_create(&frame(1), PortType::Tcp, a, b);
        let c2 = table.find_or_create(&frame(2), PortType::Tcp, b, a);
        let c3 = table.find_or_create(&frame(3), PortType::Udp, a, b);
        assert_eq!(c1, c2);
        assert_ne!(c1, c3);
        assert_eq!(table.find(PortType::Tcp, b, a), Some(c1));
        assert_eq!(table.get(c1).map(|c| (c.first_frame, c.last_frame)), Some((1, 2)));
        table.reset();
        assert!(table.is_empty());
    }

    #[test]
    fn mutation_is_gated_by_first_pass() {
        let conv = ConversationId(0);
        let mut state: StateTable<u16, String> = StateTable::new("test");
        let f1 = frame(1);
        assert!(state.set(&f1, conv, 7, "a".to_owned()));
        assert!(state.set(&f1, conv, 7, "b".to_owned()));
        assert_eq!(state.len(), 1);
        let again = f1.revisited();
        assert!(!state.set(&again, conv, 7, "c".to_owned()));
        assert_eq!(state.remove(&again, conv, 7), None);
        assert!(state.get_mut(&again, conv, 7).is_none());
        assert!(state.get_or_insert_with(&again, conv, 8, String::new).is_none());
        assert_eq!(state.get(conv, 7).map(String::as_str), Some("b"));
        assert_eq!(state.remove(&f1, conv, 7).as_deref(), Some("b"));
        assert!(!state.contains(conv, 7));
    }

    #[test]
    fn frame_data() {
        let mut fd = FrameDataTable::new();
        let f = frame(4);
        assert!(fd.set(&f, 1, 10u32));
        assert!(!fd.set(&f.revisited(), 1, 11));
        assert_eq!(fd.get(&f.revisited(), 1), Some(&10));
        assert_eq!(fd.get(&f, 0), None);
    }
}
