//! LBT-RU, the unicast reliable transport of Ultra Messaging
//!
//! A packet starts with a 4-byte header `ver:4 type:4 next_hdr:8 flags:16` (big-endian),
//! followed by the fixed header of its type, a chain of option headers linked by their
//! `next_hdr` field, and the payload.
//!
//! Sources send DATA, SM, NCF and RST packets to receivers (clients), which answer with
//! NAK, ACK and CREQ. When enabled in [`LbtruPrefs`](crate::prefs::LbtruPrefs), each
//! frame is tracked per transport and client, see [`LbtruState`].

mod dissect;
pub mod fields;
mod header;
mod transport;

pub use dissect::*;
pub use header::*;
pub use transport::*;
