//! sentinel-proto — IRC client protocol plumbing for the sentinel bot.
//!
//! This crate owns everything between raw bytes and classified protocol
//! events:
//!
//! - [`LineCodec`]: newline framing over a byte stream (partial and merged
//!   reads are the codec's problem, not the caller's).
//! - [`Message`]: one parsed IRC line (`[:prefix] COMMAND params [:trailing]`).
//! - [`Event`]: the classified subset of inbound traffic the bot reacts to
//!   (ping, join, privmsg, numeric replies, error).
//! - [`HostMask`] / [`wildcard_match`]: anchored glob matching of stored
//!   `*!ident@host` patterns against observed identities.

pub mod error;
pub mod event;
pub mod line;
pub mod mask;
pub mod message;
pub mod numeric;
pub mod prefix;

pub use error::{MaskError, ProtoError};
pub use event::{Event, WhoRecord};
pub use line::LineCodec;
pub use mask::{wildcard_match, HostMask};
pub use message::{Command, Message};
pub use prefix::Identity;
