//! The owner list: hostmasks allowed to command the bot.

use std::path::PathBuf;

use sentinel_proto::{HostMask, Identity};
use tracing::warn;

use super::{read_lines, write_atomic, StoreError};

/// Durable set of owner hostmasks, one mask per line in `owner.txt`.
#[derive(Debug)]
pub struct OwnerStore {
    path: PathBuf,
    masks: Vec<HostMask>,
}

impl OwnerStore {
    /// Load the store, warning about and skipping malformed lines.
    ///
    /// A missing file is an empty store; the file is created on the first
    /// mutation.
    pub fn load(path: PathBuf) -> Result<OwnerStore, StoreError> {
        let mut masks = Vec::new();
        for line in read_lines(&path)? {
            match line.parse::<HostMask>() {
                Ok(mask) => masks.push(mask),
                Err(e) => warn!(file = %path.display(), line = %line, error = %e, "skipping malformed owner mask"),
            }
        }
        Ok(OwnerStore { path, masks })
    }

    /// Whether `identity` matches any owner mask.
    pub fn is_owner(&self, identity: &Identity) -> bool {
        self.masks.iter().any(|m| m.matches_identity(identity))
    }

    /// Add a mask. Rejects structural junk and exact duplicates, then
    /// persists the whole list.
    pub fn add(&mut self, raw: &str) -> Result<(), StoreError> {
        let mask: HostMask = raw.parse()?;
        if self.masks.iter().any(|m| *m == mask) {
            return Err(StoreError::DuplicateEntry(raw.to_owned()));
        }
        self.masks.push(mask);
        self.persist()
    }

    /// Remove a mask by exact (case-insensitive) text, then persist.
    pub fn remove(&mut self, raw: &str) -> Result<(), StoreError> {
        let mask: HostMask = raw.parse()?;
        let before = self.masks.len();
        self.masks.retain(|m| *m != mask);
        if self.masks.len() == before {
            return Err(StoreError::NotFound(raw.to_owned()));
        }
        self.persist()
    }

    /// The stored masks, in file order.
    pub fn list(&self) -> impl Iterator<Item = &HostMask> {
        self.masks.iter()
    }

    /// Number of stored masks.
    pub fn len(&self) -> usize {
        self.masks.len()
    }

    /// Whether the store has no masks.
    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    fn persist(&self) -> Result<(), StoreError> {
        let mut out = String::new();
        for mask in &self.masks {
            out.push_str(mask.as_str());
            out.push('\n');
        }
        write_atomic(&self.path, &out)?;
        Ok(())
    }
}
