//! Per-packet context, as supplied by the frame loading layer
//!
//! The dissectors only read a [`FrameContext`]. The [`FrameTimeline`] helper builds
//! contexts for a sequence of packets, computing relative and delta timestamps and the
//! cumulative byte counter the same way a capture loader does.

use std::cmp::Ordering;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// A timestamp or time delta, in seconds and nanoseconds
///
/// For negative values both parts carry the sign (`-1.5s` is `{ secs: -1, nsecs: -500_000_000 }`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NsTime {
    pub secs: i64,
    pub nsecs: i32,
}

impl NsTime {
    pub const fn new(secs: i64, nsecs: i32) -> NsTime {
        NsTime { secs, nsecs }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.secs == 0 && self.nsecs == 0
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.secs < 0 || self.nsecs < 0
    }

    fn as_nanos(&self) -> i128 {
        i128::from(self.secs) * NANOS_PER_SEC + i128::from(self.nsecs)
    }

    fn from_nanos(n: i128) -> NsTime {
        NsTime {
            secs: (n / NANOS_PER_SEC) as i64,
            nsecs: (n % NANOS_PER_SEC) as i32,
        }
    }

    /// Return `self - earlier`
    pub fn delta(&self, earlier: &NsTime) -> NsTime {
        NsTime::from_nanos(self.as_nanos() - earlier.as_nanos())
    }
}

impl PartialOrd for NsTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NsTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_nanos().cmp(&other.as_nanos())
    }
}

/// A resolved network or link-layer address
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Address {
    None,
    Ether([u8; 6]),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
}

impl Address {
    /// Prefix of the display filter fields for this address type
    pub fn filter_prefix(&self) -> Option<&'static str> {
        match self {
            Address::None => None,
            Address::Ether(_) => Some("eth"),
            Address::Ipv4(_) => Some("ip"),
            Address::Ipv6(_) => Some("ipv6"),
        }
    }
}

impl Default for Address {
    fn default() -> Self {
        Address::None
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Address::None => Ok(()),
            Address::Ether(m) => write!(
                f,
                "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
                m[0], m[1], m[2], m[3], m[4], m[5]
            ),
            Address::Ipv4(a) => write!(f, "{}", a),
            Address::Ipv6(a) => write!(f, "{}", a),
        }
    }
}

impl From<Ipv4Addr> for Address {
    fn from(a: Ipv4Addr) -> Self {
        Address::Ipv4(a)
    }
}

impl From<Ipv6Addr> for Address {
    fn from(a: Ipv6Addr) -> Self {
        Address::Ipv6(a)
    }
}

/// Transport carrying the payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PortType {
    None,
    Tcp,
    Udp,
}

impl PortType {
    pub fn name(&self) -> &'static str {
        match self {
            PortType::None => "",
            PortType::Tcp => "TCP",
            PortType::Udp => "UDP",
        }
    }

    pub fn filter_prefix(&self) -> Option<&'static str> {
        match self {
            PortType::None => None,
            PortType::Tcp => Some("tcp"),
            PortType::Udp => Some("udp"),
        }
    }
}

impl Default for PortType {
    fn default() -> Self {
        PortType::None
    }
}

/// One side of a conversation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Endpoint {
    pub address: Address,
    pub port: u16,
}

impl Endpoint {
    pub fn new<A: Into<Address>>(address: A, port: u16) -> Endpoint {
        Endpoint {
            address: address.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.address {
            Address::Ipv6(a) => write!(f, "[{}]:{}", a, self.port),
            a => write!(f, "{}:{}", a, self.port),
        }
    }
}

/// Per-packet facts, read-only for dissectors
#[derive(Clone, Debug, Default)]
pub struct FrameContext {
    /// Frame number, starting at 1, increasing within a pass
    pub number: u32,
    /// True once the frame has been dissected by a previous pass
    pub visited: bool,
    /// Absolute capture timestamp
    pub abs_ts: NsTime,
    /// Time since the first frame (or the last reference frame)
    pub rel_ts: NsTime,
    /// Time since the previous captured frame
    pub delta_ts: NsTime,
    /// Time since the previous displayed frame
    pub delta_dis_ts: NsTime,
    /// The frame is a time reference
    pub ref_time: bool,
    /// Number of significant fractional digits of the capture timestamps (0 to 9)
    pub ts_precision: u8,
    /// Length of the packet on the wire
    pub pkt_len: u32,
    /// Number of captured bytes
    pub cap_len: u32,
    /// Bytes of all frames up to and including this one
    pub cum_bytes: u32,
    pub src: Address,
    pub dst: Address,
    pub port_type: PortType,
    pub src_port: u16,
    pub dst_port: u16,
}

impl FrameContext {
    /// True during the first, state-building traversal of the capture
    #[inline]
    pub fn first_pass(&self) -> bool {
        !self.visited
    }

    pub fn src_endpoint(&self) -> Endpoint {
        Endpoint {
            address: self.src,
            port: self.src_port,
        }
    }

    pub fn dst_endpoint(&self) -> Endpoint {
        Endpoint {
            address: self.dst,
            port: self.dst_port,
        }
    }

    /// Set the resolved transport endpoints
    pub fn with_endpoints(mut self, port_type: PortType, src: Endpoint, dst: Endpoint) -> Self {
        self.port_type = port_type;
        self.src = src.address;
        self.src_port = src.port;
        self.dst = dst.address;
        self.dst_port = dst.port;
        self
    }

    /// The same frame, as seen by a later pass
    pub fn revisited(&self) -> FrameContext {
        FrameContext {
            visited: true,
            ..self.clone()
        }
    }
}

/// Builds consecutive [`FrameContext`] values for one pass over a capture
#[derive(Debug)]
pub struct FrameTimeline {
    number: u32,
    ts_precision: u8,
    reference: Option<NsTime>,
    prev_captured: Option<NsTime>,
    cum_bytes: u32,
}

impl FrameTimeline {
    /// Create a timeline for a capture whose timestamps have `ts_precision` fractional digits
    pub fn new(ts_precision: u8) -> FrameTimeline {
        FrameTimeline {
            number: 0,
            ts_precision: ts_precision.min(9),
            reference: None,
            prev_captured: None,
            cum_bytes: 0,
        }
    }

    /// Context of the next frame
    ///
    /// All frames are considered displayed, so the displayed delta equals the captured delta.
    /// When `ref_time` is set, the frame becomes the new reference for relative times.
    pub fn next_frame(&mut self, abs_ts: NsTime, pkt_len: u32, ref_time: bool) -> FrameContext {
        self.number += 1;
        if ref_time || self.reference.is_none() {
            self.reference = Some(abs_ts);
        }
        let rel_ts = self
            .reference
            .map(|r| abs_ts.delta(&r))
            .unwrap_or_default();
        let delta_ts = self
            .prev_captured
            .map(|p| abs_ts.delta(&p))
            .unwrap_or_default();
        self.prev_captured = Some(abs_ts);
        self.cum_bytes = self.cum_bytes.wrapping_add(pkt_len);
        FrameContext {
            number: self.number,
            visited: false,
            abs_ts,
            rel_ts,
            delta_ts,
            delta_dis_ts: delta_ts,
            ref_time,
            ts_precision: self.ts_precision,
            pkt_len,
            cap_len: pkt_len,
            cum_bytes: self.cum_bytes,
            ..FrameContext::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nstime_delta_sign() {
        let a = NsTime::new(10, 100);
        let b = NsTime::new(8, 900_000_000);
        assert_eq!(a.delta(&b), NsTime::new(1, 100_000_100));
        let d = b.delta(&a);
        assert_eq!(d, NsTime::new(-1, -100_000_100));
        assert!(d.is_negative());
        assert!(a > b);
    }

    #[test]
    fn timeline_relative_and_cumulative() {
        let mut tl = FrameTimeline::new(6);
        let f1 = tl.next_frame(NsTime::new(100, 0), 60, false);
        let f2 = tl.next_frame(NsTime::new(101, 500_000_000), 40, false);
        let f3 = tl.next_frame(NsTime::new(103, 0), 10, true);
        let f4 = tl.next_frame(NsTime::new(104, 0), 10, false);
        assert_eq!(f1.number, 1);
        assert!(f1.rel_ts.is_zero());
        assert_eq!(f2.rel_ts, NsTime::new(1, 500_000_000));
        assert_eq!(f2.delta_ts, NsTime::new(1, 500_000_000));
        assert_eq!(f2.cum_bytes, 100);
        assert!(f3.ref_time);
        assert!(f3.rel_ts.is_zero());
        assert_eq!(f4.rel_ts, NsTime::new(1, 0));
        assert!(f4.first_pass());
        assert!(!f4.revisited().first_pass());
    }
}
