//! Session configuration.
//!
//! The on-disk format is a compatibility surface: one `key=value` per
//! line, keys `server`, `port`, `nick`, `channel`, `bind_ip`. Lines that
//! are blank or start with `#` are skipped; anything else without a `=` is
//! an explicit error rather than an undefined crash.

use std::fs;
use std::net::IpAddr;
use std::path::Path;

use thiserror::Error;
use tracing::warn;

use crate::store::write_atomic;

/// Immutable-after-load connection settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// IRC server address.
    pub server: String,
    /// IRC server port.
    pub port: u16,
    /// Bot nickname (also used as ident and realname).
    pub nick: String,
    /// Channel joined after registration.
    pub channel: String,
    /// Optional local address to bind before connecting.
    pub bind_ip: Option<IpAddr>,
}

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A non-comment line without a `=` separator.
    #[error("config line {line} is not key=value")]
    MalformedLine {
        /// 1-based line number.
        line: usize,
    },

    /// A required key was absent.
    #[error("missing required config key `{0}`")]
    MissingKey(&'static str),

    /// A key carried an unusable value.
    #[error("invalid value for `{key}`: {value:?}")]
    InvalidValue {
        /// The offending key.
        key: &'static str,
        /// The raw value.
        value: String,
    },

    /// Read or write failure.
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionConfig {
    /// Load from a `config.txt`-format file.
    pub fn load(path: &Path) -> Result<SessionConfig, ConfigError> {
        let raw = fs::read_to_string(path)?;
        SessionConfig::parse(&raw)
    }

    /// Parse the `key=value` format.
    pub fn parse(raw: &str) -> Result<SessionConfig, ConfigError> {
        let mut server = None;
        let mut port = None;
        let mut nick = None;
        let mut channel = None;
        let mut bind_ip = None;

        for (idx, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::MalformedLine { line: idx + 1 });
            };
            let (key, value) = (key.trim(), value.trim());

            match key {
                "server" => server = Some(value.to_owned()),
                "port" => {
                    port = Some(value.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                        key: "port",
                        value: value.to_owned(),
                    })?);
                }
                "nick" => nick = Some(value.to_owned()),
                "channel" => {
                    if !value.starts_with('#') {
                        return Err(ConfigError::InvalidValue {
                            key: "channel",
                            value: value.to_owned(),
                        });
                    }
                    channel = Some(value.to_owned());
                }
                "bind_ip" => {
                    // The wizard writes an empty value when no bind is wanted
                    if !value.is_empty() {
                        bind_ip =
                            Some(value.parse::<IpAddr>().map_err(|_| {
                                ConfigError::InvalidValue {
                                    key: "bind_ip",
                                    value: value.to_owned(),
                                }
                            })?);
                    }
                }
                other => warn!(key = other, "ignoring unknown config key"),
            }
        }

        Ok(SessionConfig {
            server: server.ok_or(ConfigError::MissingKey("server"))?,
            port: port.ok_or(ConfigError::MissingKey("port"))?,
            nick: nick.ok_or(ConfigError::MissingKey("nick"))?,
            channel: channel.ok_or(ConfigError::MissingKey("channel"))?,
            bind_ip,
        })
    }

    /// Persist atomically in the `key=value` format.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        use std::fmt::Write as _;

        let mut out = String::new();
        let _ = writeln!(out, "server={}", self.server);
        let _ = writeln!(out, "port={}", self.port);
        let _ = writeln!(out, "nick={}", self.nick);
        let _ = writeln!(out, "channel={}", self.channel);
        let _ = writeln!(
            out,
            "bind_ip={}",
            self.bind_ip.map(|ip| ip.to_string()).unwrap_or_default()
        );
        write_atomic(path, &out)?;
        Ok(())
    }
}
