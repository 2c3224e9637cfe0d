//! Host-mask patterns and wildcard matching.
//!
//! Stored masks keep their literal form (`*!ident@host`); they only become
//! matchable predicates at use time. Matching is constrained globbing —
//! `*` and `?` are the only metacharacters, everything else (including `.`
//! in hostnames) matches literally — and is anchored over the full string,
//! so `*!*@host.com` never matches `nick!u@host.com.attacker.net`.

use std::fmt;

use crate::error::MaskError;
use crate::prefix::Identity;

/// Match `text` against a wildcard `pattern`, ASCII case-insensitively.
///
/// Supports:
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
///
/// The match is anchored: the whole of `text` must be covered.
///
/// # Examples
///
/// ```
/// use sentinel_proto::wildcard_match;
///
/// assert!(wildcard_match("*", "anything"));
/// assert!(wildcard_match("*!*@*.example.com", "nick!user@gw.example.com"));
/// assert!(wildcard_match("te?t", "test"));
/// assert!(!wildcard_match("*!*@host.com", "nick!u@host.com.attacker.net"));
/// ```
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().map(|c| c.to_ascii_lowercase()).collect();
    let text: Vec<char> = text.chars().map(|c| c.to_ascii_lowercase()).collect();
    wildcard_match_impl(&pattern, &text)
}

/// Iterative backtracking matcher over char slices.
fn wildcard_match_impl(pattern: &[char], text: &[char]) -> bool {
    let mut p = 0; // pattern index
    let mut t = 0; // text index
    let mut star_p = None; // position after last '*' in pattern
    let mut star_t = 0; // text position when we matched '*'

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star_p = Some(p);
            star_t = t;
            p += 1;
        } else if let Some(sp) = star_p {
            // Mismatch - backtrack to last '*' and consume one more char
            p = sp + 1;
            star_t += 1;
            t = star_t;
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }

    p == pattern.len()
}

/// A validated host-mask pattern of the form `*!ident@host`.
///
/// The pattern string is stored literally; `matches_*` convert it to a
/// predicate at call time. Equality is ASCII case-insensitive, matching
/// how the stores deduplicate entries.
#[derive(Clone, Debug)]
pub struct HostMask(String);

impl HostMask {
    /// Validate and wrap a mask string.
    ///
    /// A mask must contain a `!` followed by an `@`, with non-empty ident
    /// and host segments. Anything else is rejected here so the stores
    /// never admit an unmatchable pattern.
    pub fn parse(s: &str) -> Result<Self, MaskError> {
        let bang = s.find('!').ok_or_else(|| MaskError::MissingBang(s.to_owned()))?;
        let at = s[bang + 1..]
            .find('@')
            .map(|i| i + bang + 1)
            .ok_or_else(|| MaskError::MissingAt(s.to_owned()))?;

        if bang == 0 || at == bang + 1 || at + 1 == s.len() {
            return Err(MaskError::EmptySegment(s.to_owned()));
        }

        Ok(HostMask(s.to_owned()))
    }

    /// The literal pattern string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `ident@host` portion (everything after the `!`), used when
    /// deriving the ban-lift mask for a removed deny entry.
    pub fn ident_host(&self) -> &str {
        // parse() guarantees the '!' exists
        &self.0[self.0.find('!').unwrap_or(0) + 1..]
    }

    /// Anchored wildcard match against an arbitrary string.
    pub fn matches(&self, text: &str) -> bool {
        wildcard_match(&self.0, text)
    }

    /// Match against a full `nick!ident@host` identity (owner checks).
    pub fn matches_identity(&self, identity: &Identity) -> bool {
        self.matches(&identity.to_string())
    }

    /// Match against the nick-agnostic `*!ident@host` form (fb checks).
    pub fn matches_join_form(&self, identity: &Identity) -> bool {
        self.matches(&identity.join_form())
    }
}

impl std::str::FromStr for HostMask {
    type Err = MaskError;

    fn from_str(s: &str) -> Result<Self, MaskError> {
        HostMask::parse(s)
    }
}

impl PartialEq for HostMask {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for HostMask {}

impl fmt::Display for HostMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
