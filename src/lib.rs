//! # Packet dissection engine
//!
//! This crate dissects the transport payload of captured packets into a typed tree of
//! fields, and builds the summary columns (protocol, info, addresses, times ...) of a packet
//! list.
//!
//! It is designed around three parts:
//!
//! - a column model ([`ColumnSet`]) with fenced, multi-format text accumulation, used by the
//!   dissectors to write the summary of a packet
//! - a conversation registry ([`ConversationTable`], [`StateTable`]) keeping protocol state
//!   across packets and across passes over a capture: state is only modified the first time
//!   a frame is seen, so that later passes produce the same result
//! - stateful dissectors for [9P](ninep), [collectd](collectd) and [LBT-RU](lbtru), built on
//!   [nom](https://github.com/Geal/nom) parsers that never read past the declared length of a
//!   structure
//!
//! Decoding errors never abort the dissection of a packet: they are reported as
//! [`ExpertInfo`] annotations bound to the byte range of the faulty structure.
//!
//! # Example
//!
//! The [`Engine`] drives everything for one packet at a time:
//!
//! ```rust
//! use packet_dissect::*;
//! use std::net::Ipv4Addr;
//!
//! let mut engine = Engine::new(Preferences::default(), &default_columns());
//! let frame = FrameContext {
//!     number: 1,
//!     pkt_len: 12,
//!     ..FrameContext::default()
//! }
//! .with_endpoints(
//!     PortType::Udp,
//!     Endpoint::new(Ipv4Addr::new(10, 0, 0, 1), 40000),
//!     Endpoint::new(Ipv4Addr::new(10, 0, 0, 2), 25826),
//! );
//! // a single collectd HOST part
//! let data = b"\x00\x00\x00\x0cabcdefgh";
//! let packet = engine.dissect(&frame, data);
//! assert_eq!(packet.protocol(), Some("collectd"));
//! assert!(packet.info().unwrap_or("").starts_with("Host=abcdefgh"));
//! ```
//!
//! A second pass over the capture presents each frame again with
//! [`FrameContext::revisited`]; call [`Engine::reset_for_capture`] before reading another
//! capture.

pub mod column;
mod conversation;
mod dissector;
mod engine;
mod error;
mod expert;
mod frame;
mod packet;
mod prefs;
mod tree;
mod value_string;

pub use column::time::*;
pub use column::*;
pub use conversation::*;
pub use dissector::*;
pub use engine::*;
pub use error::*;
pub use expert::*;
pub use frame::*;
pub use packet::*;
pub use prefs::*;
pub use tree::*;
pub use value_string::*;

pub mod collectd;
pub mod lbtru;
pub mod ninep;
