//! Bot-level error taxonomy.

use sentinel_proto::ProtoError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;

/// Convenience alias for Results using [`BotError`].
pub type Result<T, E = BotError> = std::result::Result<T, E>;

/// Errors surfaced by the session and its collaborators.
///
/// Store duplicate/not-found outcomes never reach this type — the
/// dispatcher reports those to the commanding owner and carries on. What
/// does arrive here is fatal to the session: transport failures,
/// persistence failures, broken configuration.
#[derive(Debug, Error)]
pub enum BotError {
    /// Connect or bind failure. Fatal at startup and during migration.
    #[error("transport failure: {0}")]
    Transport(#[source] std::io::Error),

    /// The peer terminated the link.
    #[error("connection closed by peer: {0}")]
    ConnectionClosed(String),

    /// Framing or write error on the wire.
    #[error(transparent)]
    Proto(#[from] ProtoError),

    /// Store persistence failure (duplicate/not-found are handled before
    /// this level).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration load/save failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
