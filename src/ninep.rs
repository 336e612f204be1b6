//! 9P (Plan 9 file protocol) over TCP
//!
//! A TCP payload carries one or more messages, each starting with `size[4] type[1] tag[2]`
//! (little-endian). The dialect (9P2000, 9P2000.u or 9P2000.L) is learned from the
//! Tversion / Rversion exchange and changes how some bodies are decoded.
//!
//! Requests are matched with their responses by tag, and the paths fids refer to are
//! followed through attach, walk, create and rename, so that each message can show the
//! path it operates on. See [`NinePState`].

mod dissect;
pub mod fields;
mod message;
mod state;

pub use dissect::*;
pub use message::*;
pub use state::*;
