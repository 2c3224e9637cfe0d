//! The forbidden list: per-channel hostmask rules evaluated on JOIN.

use std::path::PathBuf;

use sentinel_proto::{HostMask, Identity};
use tracing::warn;

use super::{read_lines, write_atomic, StoreError};

/// What a matching forbidden entry does to a joiner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Flag `f`: grant ops.
    Op,
    /// Flag `d`: ban and kick.
    Deny,
}

impl Action {
    /// The single-letter flag stored in `fb.txt`.
    pub fn flag(self) -> char {
        match self {
            Action::Op => 'f',
            Action::Deny => 'd',
        }
    }

    fn from_flag(flag: &str) -> Option<Action> {
        match flag {
            "f" => Some(Action::Op),
            "d" => Some(Action::Deny),
            _ => None,
        }
    }
}

/// One `channel mask flag` rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForbiddenEntry {
    /// The channel the rule applies to.
    pub channel: String,
    /// The `*!ident@host` pattern.
    pub mask: HostMask,
    /// What happens on a match.
    pub action: Action,
}

/// Durable forbidden list, one space-separated `channel mask flag` rule
/// per line in `fb.txt`. Rule order is file order; JOIN evaluation is
/// first match wins.
#[derive(Debug)]
pub struct ForbiddenStore {
    path: PathBuf,
    entries: Vec<ForbiddenEntry>,
}

impl ForbiddenStore {
    /// Load the store, warning about and skipping malformed lines.
    pub fn load(path: PathBuf) -> Result<ForbiddenStore, StoreError> {
        let mut entries = Vec::new();
        for line in read_lines(&path)? {
            match Self::parse_line(&line) {
                Some(entry) => entries.push(entry),
                None => warn!(file = %path.display(), line = %line, "skipping malformed forbidden entry"),
            }
        }
        Ok(ForbiddenStore { path, entries })
    }

    fn parse_line(line: &str) -> Option<ForbiddenEntry> {
        let mut parts = line.split_whitespace();
        let channel = parts.next()?;
        let mask = parts.next()?;
        let flag = parts.next()?;
        if parts.next().is_some() || !channel.starts_with('#') {
            return None;
        }
        Some(ForbiddenEntry {
            channel: channel.to_owned(),
            mask: mask.parse().ok()?,
            action: Action::from_flag(flag)?,
        })
    }

    /// Add a rule. An entry is unique per (channel, mask, flag) triple, so
    /// the same mask may carry both flags on one channel.
    pub fn add(&mut self, channel: &str, raw_mask: &str, action: Action) -> Result<(), StoreError> {
        let mask: HostMask = raw_mask.parse()?;
        if self.entries.iter().any(|e| {
            e.channel.eq_ignore_ascii_case(channel) && e.mask == mask && e.action == action
        }) {
            return Err(StoreError::DuplicateEntry(format!(
                "{channel} {raw_mask} {}",
                action.flag()
            )));
        }
        self.entries.push(ForbiddenEntry {
            channel: channel.to_owned(),
            mask,
            action,
        });
        self.persist()
    }

    /// Remove the rule for the exact (channel, mask, flag) triple and
    /// return it (the caller lifts the channel ban for removed deny
    /// rules).
    pub fn remove(
        &mut self,
        channel: &str,
        raw_mask: &str,
        action: Action,
    ) -> Result<ForbiddenEntry, StoreError> {
        let mask: HostMask = raw_mask.parse()?;
        let pos = self
            .entries
            .iter()
            .position(|e| {
                e.channel.eq_ignore_ascii_case(channel) && e.mask == mask && e.action == action
            })
            .ok_or_else(|| {
                StoreError::NotFound(format!("{channel} {raw_mask} {}", action.flag()))
            })?;
        let entry = self.entries.remove(pos);
        self.persist()?;
        Ok(entry)
    }

    /// First rule (in file order) matching a joiner's `*!ident@host` form
    /// on `channel`.
    pub fn match_join(&self, identity: &Identity, channel: &str) -> Option<&ForbiddenEntry> {
        self.entries.iter().find(|e| {
            e.channel.eq_ignore_ascii_case(channel) && e.mask.matches_join_form(identity)
        })
    }

    /// All rules for `channel`, in file order.
    pub fn for_channel<'a>(&'a self, channel: &'a str) -> impl Iterator<Item = &'a ForbiddenEntry> {
        self.entries
            .iter()
            .filter(move |e| e.channel.eq_ignore_ascii_case(channel))
    }

    /// All rules, in file order.
    pub fn list(&self) -> impl Iterator<Item = &ForbiddenEntry> {
        self.entries.iter()
    }

    /// Number of stored rules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store has no rules.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) -> Result<(), StoreError> {
        use std::fmt::Write as _;

        let mut out = String::new();
        for e in &self.entries {
            let _ = writeln!(out, "{} {} {}", e.channel, e.mask, e.action.flag());
        }
        write_atomic(&self.path, &out)?;
        Ok(())
    }
}
