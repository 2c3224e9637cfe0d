//! Classified inbound events.
//!
//! The session loop never touches raw lines: the reader task frames and
//! parses them, then classifies each [`Message`](crate::Message) into one
//! of these events. Anything the bot has no reaction to classifies as
//! `None` and is dropped with a trace log by the caller.

use crate::message::{Command, Message};
use crate::prefix::Identity;

/// An inbound protocol event the bot reacts to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Server ping challenge; answer with `PONG :<token>`.
    Ping {
        /// The challenge token.
        token: String,
    },
    /// A user joined a channel the bot can see.
    Join {
        /// Who joined.
        identity: Identity,
        /// The joined channel, normalized to plain `#channel` form.
        channel: String,
    },
    /// A private message (to the bot or a shared channel).
    Privmsg {
        /// The sender.
        identity: Identity,
        /// Where the message was addressed (channel or the bot's nick).
        target: String,
        /// The message text.
        text: String,
    },
    /// A three-digit numeric reply.
    Numeric {
        /// The reply code.
        code: u16,
        /// Reply parameters, trailing last.
        params: Vec<String>,
    },
    /// Server-side `ERROR`, terminal for the connection.
    Error {
        /// The reason text.
        reason: String,
    },
}

impl Event {
    /// Classify a parsed message. Returns `None` for traffic the bot
    /// ignores (notices, mode echoes, joins without a user prefix, ...).
    pub fn from_message(msg: Message) -> Option<Event> {
        let identity = msg.prefix.as_deref().and_then(Identity::parse);

        match msg.command {
            Command::Ping(token) => Some(Event::Ping { token }),
            Command::Join(channel) => identity.map(|identity| Event::Join {
                identity,
                // Guard against the ':#chan' artifact some servers emit
                channel: channel.trim_start_matches(':').to_owned(),
            }),
            Command::Privmsg(target, text) => identity.map(|identity| Event::Privmsg {
                identity,
                target,
                text,
            }),
            Command::Numeric(code, params) => Some(Event::Numeric { code, params }),
            Command::Error(reason) => Some(Event::Error { reason }),
            _ => None,
        }
    }
}

/// One member record from a `352` WHO reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WhoRecord {
    /// The channel the record belongs to.
    pub channel: String,
    /// The member's ident.
    pub ident: String,
    /// The member's host.
    pub host: String,
    /// The member's nickname.
    pub nick: String,
}

impl WhoRecord {
    /// Extract a record from the parameters of a [`RPL_WHOREPLY`] numeric.
    ///
    /// Parameter layout: `<client> <channel> <ident> <host> <server>
    /// <nick> <flags> :<hops> <realname>`.
    pub fn from_params(params: &[String]) -> Option<WhoRecord> {
        if params.len() < 6 {
            return None;
        }
        Some(WhoRecord {
            channel: params[1].clone(),
            ident: params[2].clone(),
            host: params[3].clone(),
            nick: params[5].clone(),
        })
    }

    /// The nick-agnostic `*!ident@host` form of this member, matched
    /// against forbidden-list masks during a channel sweep.
    pub fn join_form(&self) -> String {
        format!("*!{}@{}", self.ident, self.host)
    }

    /// Derive the ban mask for this member.
    ///
    /// A `~`-prefixed ident signals an unidentified connection, so the
    /// ident is wildcarded away and only the host is pinned.
    pub fn ban_mask(&self) -> String {
        if self.ident.starts_with('~') {
            format!("*!*@{}", self.host)
        } else {
            format!("*!*{}@{}", self.ident, self.host)
        }
    }
}
