//! collectd binary network protocol
//!
//! A UDP datagram is a sequence of parts `type[2] length[2] payload`, big-endian, where
//! `length` includes the 4-byte header. String and time parts set the identification
//! (host, plugin, type, ...) of the values that follow; each VALUES part is dispatched with
//! the identification in effect at that point. See [`ValueDispatch`].
//!
//! A part whose declared length does not fit its type is reported as malformed, and
//! dissection continues with the next part.

mod dissect;
pub mod fields;
mod part;

pub use dissect::*;
pub use part::*;
