//! Numeric replies the bot consumes.
//!
//! Only the small WHO/WHOIS slice of the numeric space matters here; any
//! other numeric passes through [`crate::Event::Numeric`] untouched.

/// `RPL_WHOISUSER` — `<nick> <ident> <host> * :<realname>`
pub const RPL_WHOISUSER: u16 = 311;

/// `RPL_ENDOFWHO` — terminates a WHO reply burst.
pub const RPL_ENDOFWHO: u16 = 315;

/// `RPL_ENDOFWHOIS` — terminates a WHOIS reply burst.
pub const RPL_ENDOFWHOIS: u16 = 318;

/// `RPL_WHOISCHANNELS` — `<nick> :{[@|+]<channel> }`
pub const RPL_WHOISCHANNELS: u16 = 319;

/// `RPL_WHOREPLY` — `<channel> <ident> <host> <server> <nick> <flags> :<hops> <realname>`
pub const RPL_WHOREPLY: u16 = 352;
