//! slirc-sentinel — Straylight IRC channel sentinel.
//!
//! A protocol-level moderation bot: it keeps one connection to an IRC
//! network, authenticates, joins its channel, and reacts to inbound events
//! (pings, joins, private messages) by issuing moderation commands on
//! behalf of a privileged owner set.
//!
//! Layering, leaves first:
//! - `sentinel-proto` (workspace crate): line framing, message parsing,
//!   event classification, hostmask matching.
//! - [`store`]: the durable owner set and per-channel forbidden list.
//! - [`transport`]: the TCP connection plus the background line receiver.
//! - [`session`]: the single dispatch loop that owns the stores and the
//!   outbound half of the connection.
//! - [`dispatch`] / [`actions`]: owner-command routing and the moderation
//!   operations themselves, including the WHO/WHOIS awaited-reply flows.

pub mod actions;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod session;
pub mod store;
pub mod transport;
