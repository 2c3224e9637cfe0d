//! Sender identities.
//!
//! An inbound message prefixed with `:nick!ident@host` identifies the user
//! that originated it. The bot only cares about user prefixes; server-name
//! prefixes carry no identity and classify as `None` here.

use std::fmt;

/// A `nick!ident@host` identity observed on the wire.
///
/// Immutable once parsed; extracted from message prefixes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identity {
    /// Nickname (the part before `!`).
    pub nick: String,
    /// Ident/username (between `!` and `@`).
    pub ident: String,
    /// Hostname (after `@`).
    pub host: String,
}

impl Identity {
    /// Parse a raw prefix into an identity.
    ///
    /// Returns `None` for server-name prefixes and anything else that does
    /// not carry the full `nick!ident@host` shape.
    pub fn parse(prefix: &str) -> Option<Self> {
        let bang = prefix.find('!')?;
        let at = prefix[bang + 1..].find('@')? + bang + 1;

        let nick = &prefix[..bang];
        let ident = &prefix[bang + 1..at];
        let host = &prefix[at + 1..];

        if nick.is_empty() || ident.is_empty() || host.is_empty() {
            return None;
        }

        Some(Identity {
            nick: nick.to_owned(),
            ident: ident.to_owned(),
            host: host.to_owned(),
        })
    }

    /// The `*!ident@host` form used when evaluating forbidden-list entries,
    /// where the nickname is irrelevant.
    pub fn join_form(&self) -> String {
        format!("*!{}@{}", self.ident, self.host)
    }

    /// The `*!*ident@host` ban mask derived from this identity.
    pub fn ban_mask(&self) -> String {
        format!("*!*{}@{}", self.ident, self.host)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}@{}", self.nick, self.ident, self.host)
    }
}
