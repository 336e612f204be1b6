//! Transport and client tracking
//!
//! A transport is identified by the source endpoint and the session ID; its state lives in
//! a conversation holding only the source endpoint. Each receiver of the transport is a
//! client, keyed by its endpoint. Clients keep one [`FrameRecord`] per frame, linking
//! frames together and holding the result of the sequence analysis.

use std::collections::BTreeMap;

use crate::conversation::{ConversationId, StateTable};
use crate::frame::{Endpoint, FrameContext};
use crate::lbtru::header::LbtruPacketType;

/// Sub-key of the LBT-RU state table; `client: None` is the transport itself
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LbtruKey {
    pub session_id: u32,
    pub client: Option<Endpoint>,
}

impl LbtruKey {
    pub fn transport(session_id: u32) -> LbtruKey {
        LbtruKey {
            session_id,
            client: None,
        }
    }

    pub fn client(session_id: u32, client: Endpoint) -> LbtruKey {
        LbtruKey {
            session_id,
            client: Some(client),
        }
    }
}

/// Result of the sequence analysis of one frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SqnAnalysis {
    /// Number of sequence numbers skipped since the highest one seen
    pub sqn_gap: u32,
    /// Distance below the highest sequence number seen
    pub ooo_gap: u32,
    pub duplicate: bool,
}

/// High-water mark and frames of each sequence number, for one message category
#[derive(Clone, Debug, Default)]
pub struct SqnTracker {
    high: Option<u32>,
    frames: BTreeMap<u32, Vec<u32>>,
}

impl SqnTracker {
    pub fn high(&self) -> Option<u32> {
        self.high
    }

    /// Frames carrying `sqn`, in order
    pub fn frames_with(&self, sqn: u32) -> &[u32] {
        self.frames.get(&sqn).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Record `sqn`, seen in `frame`
    ///
    /// Retransmissions are expected to go backwards, and are not analysed.
    pub fn track(&mut self, frame: u32, sqn: u32, retransmission: bool) -> SqnAnalysis {
        let mut a = SqnAnalysis {
            duplicate: !retransmission && self.frames.contains_key(&sqn),
            ..SqnAnalysis::default()
        };
        if let (false, Some(high)) = (retransmission, self.high) {
            if sqn <= high {
                a.ooo_gap = high - sqn;
            } else if sqn > high + 1 {
                a.sqn_gap = sqn - high - 1;
            }
        }
        self.high = Some(self.high.map_or(sqn, |h| h.max(sqn)));
        self.frames.entry(sqn).or_default().push(frame);
        a
    }
}

/// What the first pass learned about one frame of a client
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRecord {
    pub frame: u32,
    pub packet_type: LbtruPacketType,
    pub sqn: Option<u32>,
    pub previous_frame: Option<u32>,
    pub next_frame: Option<u32>,
    pub previous_type_frame: Option<u32>,
    pub next_type_frame: Option<u32>,
    pub retransmission: bool,
    pub analysis: SqnAnalysis,
}

/// State of one receiver of a transport
#[derive(Clone, Debug, Default)]
pub struct ClientState {
    last_frame: Option<u32>,
    last_type_frame: BTreeMap<u8, u32>,
    records: BTreeMap<u32, FrameRecord>,
    data: SqnTracker,
    sm: SqnTracker,
}

impl ClientState {
    pub fn record(&self, frame: u32) -> Option<&FrameRecord> {
        self.records.get(&frame)
    }

    pub fn data(&self) -> &SqnTracker {
        &self.data
    }

    pub fn sm(&self) -> &SqnTracker {
        &self.sm
    }

    /// Frames of the same category carrying the same sequence number as `rec`
    pub fn same_sqn_frames(&self, rec: &FrameRecord) -> &[u32] {
        match (rec.packet_type, rec.sqn) {
            (LbtruPacketType::Data, Some(sqn)) => self.data.frames_with(sqn),
            (LbtruPacketType::Sm, Some(sqn)) => self.sm.frames_with(sqn),
            _ => &[],
        }
    }

    /// Add the record of `frame`, linking it to the previous frames
    pub fn add_frame(
        &mut self,
        frame: u32,
        packet_type: LbtruPacketType,
        sqn: Option<u32>,
        retransmission: bool,
    ) -> FrameRecord {
        if let Some(rec) = self.records.get(&frame) {
            return rec.clone();
        }
        let previous_frame = self.last_frame.replace(frame);
        if let Some(rec) = previous_frame.and_then(|p| self.records.get_mut(&p)) {
            rec.next_frame = Some(frame);
        }
        let previous_type_frame = self.last_type_frame.insert(packet_type.0, frame);
        if let Some(rec) = previous_type_frame.and_then(|p| self.records.get_mut(&p)) {
            rec.next_type_frame = Some(frame);
        }
        let analysis = match (packet_type, sqn) {
            (LbtruPacketType::Data, Some(sqn)) => self.data.track(frame, sqn, retransmission),
            (LbtruPacketType::Sm, Some(sqn)) => self.sm.track(frame, sqn, retransmission),
            _ => SqnAnalysis::default(),
        };
        let rec = FrameRecord {
            frame,
            packet_type,
            sqn,
            previous_frame,
            next_frame: None,
            previous_type_frame,
            next_type_frame: None,
            retransmission,
            analysis,
        };
        self.records.insert(frame, rec.clone());
        rec
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportState {
    pub first_frame: u32,
    pub last_frame: u32,
}

#[derive(Clone, Debug)]
pub enum LbtruEntry {
    Transport(TransportState),
    Client(ClientState),
}

/// LBT-RU state of all transports of a capture
#[derive(Debug)]
pub struct LbtruState {
    entries: StateTable<LbtruKey, LbtruEntry>,
}

impl Default for LbtruState {
    fn default() -> Self {
        LbtruState::new()
    }
}

impl LbtruState {
    pub fn new() -> LbtruState {
        LbtruState {
            entries: StateTable::new("lbtru"),
        }
    }

    pub fn reset(&mut self) {
        self.entries.reset();
    }

    pub fn transport(&self, conv: ConversationId, session_id: u32) -> Option<&TransportState> {
        match self.entries.get(conv, LbtruKey::transport(session_id)) {
            Some(LbtruEntry::Transport(t)) => Some(t),
            _ => None,
        }
    }

    pub fn client(&self, conv: ConversationId, session_id: u32, client: Endpoint) -> Option<&ClientState> {
        match self.entries.get(conv, LbtruKey::client(session_id, client)) {
            Some(LbtruEntry::Client(c)) => Some(c),
            _ => None,
        }
    }

    /// Track one frame of transport `(conv, session_id)` exchanged with `client`
    ///
    /// The record is created on the first pass, and looked up on later ones.
    #[allow(clippy::too_many_arguments)]
    pub fn track(
        &mut self,
        frame: &FrameContext,
        conv: ConversationId,
        session_id: u32,
        client: Endpoint,
        packet_type: LbtruPacketType,
        sqn: Option<u32>,
        retransmission: bool,
    ) -> Option<FrameRecord> {
        if !frame.first_pass() {
            return self
                .client(conv, session_id, client)
                .and_then(|c| c.record(frame.number))
                .cloned();
        }
        let number = frame.number;
        let transport = self
            .entries
            .get_or_insert_with(frame, conv, LbtruKey::transport(session_id), || {
                LbtruEntry::Transport(TransportState {
                    first_frame: number,
                    last_frame: number,
                })
            });
        if let Some(LbtruEntry::Transport(t)) = transport {
            t.last_frame = number;
        }
        let entry = self
            .entries
            .get_or_insert_with(frame, conv, LbtruKey::client(session_id, client), || {
                LbtruEntry::Client(ClientState::default())
            });
        match entry {
            Some(LbtruEntry::Client(c)) => Some(c.add_frame(number, packet_type, sqn, retransmission)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_and_duplicate() {
        let mut t = SqnTracker::default();
        let a: Vec<_> = [1u32, 2, 2, 4]
            .iter()
            .enumerate()
            .map(|(n, &sqn)| t.track(n as u32 + 1, sqn, false))
            .collect();
        assert_eq!(a[0], SqnAnalysis::default());
        assert_eq!(a[1], SqnAnalysis::default());
        assert!(a[2].duplicate);
        assert_eq!(a[2].ooo_gap, 0);
        assert_eq!(a[3].sqn_gap, 1);
        assert!(!a[3].duplicate);
        assert_eq!(t.high(), Some(4));
        assert_eq!(t.frames_with(2), &[2, 3]);
    }

    #[test]
    fn retransmissions_are_not_analysed() {
        let mut t = SqnTracker::default();
        t.track(1, 10, false);
        let a = t.track(2, 5, true);
        assert_eq!(a, SqnAnalysis::default());
        let a = t.track(3, 8, false);
        assert_eq!(a.ooo_gap, 2);
    }

    #[test]
    fn frame_links() {
        let mut c = ClientState::default();
        c.add_frame(1, LbtruPacketType::Sm, Some(0), false);
        c.add_frame(2, LbtruPacketType::Data, Some(0), false);
        c.add_frame(4, LbtruPacketType::Data, Some(1), false);
        let r1 = c.record(1).expect("frame 1");
        assert_eq!(r1.next_frame, Some(2));
        assert_eq!(r1.next_type_frame, None);
        let r2 = c.record(2).expect("frame 2");
        assert_eq!(r2.previous_frame, Some(1));
        assert_eq!(r2.previous_type_frame, None);
        assert_eq!(r2.next_type_frame, Some(4));
        let r4 = c.record(4).expect("frame 4");
        assert_eq!(r4.previous_type_frame, Some(2));
    }

    #[test]
    fn later_passes_read_the_records() {
        let mut st = LbtruState::new();
        let conv = ConversationId(3);
        let client = Endpoint::default();
        let f1 = FrameContext {
            number: 1,
            ..FrameContext::default()
        };
        let f2 = FrameContext {
            number: 2,
            ..FrameContext::default()
        };
        st.track(&f1, conv, 7, client, LbtruPacketType::Data, Some(1), false);
        let first = st.track(&f2, conv, 7, client, LbtruPacketType::Data, Some(1), false);
        assert!(first.as_ref().map_or(false, |r| r.analysis.duplicate));
        let again = st.track(&f2.revisited(), conv, 7, client, LbtruPacketType::Data, Some(1), false);
        assert_eq!(first, again);
        assert_eq!(st.transport(conv, 7).map(|t| t.last_frame), Some(2));
    }
}
