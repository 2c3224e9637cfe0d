//! IRC message parsing and serialization.
//!
//! One inbound line parses into a [`Message`]: an optional prefix plus a
//! typed [`Command`]. Outbound traffic is built through the `Message`
//! constructors and serialized by `Display`, which knows which parameter of
//! each command is the trailing one.

use std::fmt;

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, space0},
    combinator::opt,
    error::ErrorKind,
    sequence::preceded,
    IResult,
};
use smallvec::SmallVec;

use crate::error::ProtoError;

/// The command subset the bot speaks and understands.
///
/// Outbound variants serialize through `Display`. Inbound lines whose verb
/// falls outside this set parse into [`Command::Raw`] and are dropped at
/// classification time rather than treated as fatal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `NICK <nickname>`
    Nick(String),
    /// `USER <username> 0 * :<realname>`
    User(String, String),
    /// `JOIN <channel>`
    Join(String),
    /// `PART <channel> [:<message>]`
    Part(String, Option<String>),
    /// `PING <token>` (inbound challenge)
    Ping(String),
    /// `PONG :<token>`
    Pong(String),
    /// `PRIVMSG <target> :<text>`
    Privmsg(String, String),
    /// `MODE <target> <modes> <arg>` (e.g. `+o nick`, `+b mask`)
    Mode(String, String, String),
    /// `KICK <channel> <nick> [:<reason>]`
    Kick(String, String, Option<String>),
    /// `WHO <channel>`
    Who(String),
    /// `WHOIS <target> <target>` (doubled form forces the end-to-end query)
    Whois(String),
    /// `QUIT [:<message>]`
    Quit(Option<String>),
    /// `ERROR :<reason>` (inbound, terminal)
    Error(String),
    /// A three-digit numeric reply with its parameters.
    Numeric(u16, Vec<String>),
    /// Any other verb, kept with its parameters for logging.
    Raw(String, Vec<String>),
}

impl Command {
    /// Build a typed command from a parsed verb and parameter list.
    fn from_parts(verb: &str, params: &[&str]) -> Command {
        let arg = |i: usize| params.get(i).copied().unwrap_or("").to_owned();
        let opt_arg = |i: usize| params.get(i).map(|s| (*s).to_owned());

        if verb.len() == 3 && verb.chars().all(|c| c.is_ascii_digit()) {
            // Parse can't fail: exactly three ASCII digits
            let code = verb.parse::<u16>().unwrap_or(0);
            return Command::Numeric(code, params.iter().map(|s| (*s).to_owned()).collect());
        }

        match verb.to_ascii_uppercase().as_str() {
            "PING" => Command::Ping(arg(0)),
            "JOIN" => Command::Join(arg(0)),
            "PART" => Command::Part(arg(0), opt_arg(1)),
            "PRIVMSG" => Command::Privmsg(arg(0), arg(1)),
            "KICK" => Command::Kick(arg(0), arg(1), opt_arg(2)),
            "NICK" => Command::Nick(arg(0)),
            "QUIT" => Command::Quit(opt_arg(0)),
            "ERROR" => Command::Error(arg(0)),
            _ => Command::Raw(
                verb.to_ascii_uppercase(),
                params.iter().map(|s| (*s).to_owned()).collect(),
            ),
        }
    }
}

/// One parsed IRC line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Raw prefix (without the leading `:`), if present.
    pub prefix: Option<String>,
    /// The typed command.
    pub command: Command,
}

impl Message {
    /// Parse one framed line (CR/LF already permitted at the end).
    pub fn parse(line: &str) -> Result<Message, ProtoError> {
        let (prefix, verb, params) = parse_line(line).map_err(|position| {
            ProtoError::ParseFailed {
                input: line.trim_end_matches(['\r', '\n']).to_owned(),
                position,
            }
        })?;

        Ok(Message {
            prefix: prefix.map(str::to_owned),
            command: Command::from_parts(verb, &params),
        })
    }

    /// `PRIVMSG <target> :<text>`
    pub fn privmsg(target: impl Into<String>, text: impl Into<String>) -> Message {
        Command::Privmsg(target.into(), text.into()).into()
    }

    /// `NICK <nickname>`
    pub fn nick(nickname: impl Into<String>) -> Message {
        Command::Nick(nickname.into()).into()
    }

    /// `USER <username> 0 * :<realname>`
    pub fn user(username: impl Into<String>, realname: impl Into<String>) -> Message {
        Command::User(username.into(), realname.into()).into()
    }

    /// `JOIN <channel>`
    pub fn join(channel: impl Into<String>) -> Message {
        Command::Join(channel.into()).into()
    }

    /// `PART <channel> :<message>`
    pub fn part(channel: impl Into<String>, message: impl Into<String>) -> Message {
        Command::Part(channel.into(), Some(message.into())).into()
    }

    /// `PONG :<token>`
    pub fn pong(token: impl Into<String>) -> Message {
        Command::Pong(token.into()).into()
    }

    /// `MODE <target> <modes> <arg>`
    pub fn mode(
        target: impl Into<String>,
        modes: impl Into<String>,
        arg: impl Into<String>,
    ) -> Message {
        Command::Mode(target.into(), modes.into(), arg.into()).into()
    }

    /// `KICK <channel> <nick> :<reason>`
    pub fn kick(
        channel: impl Into<String>,
        nick: impl Into<String>,
        reason: impl Into<String>,
    ) -> Message {
        Command::Kick(channel.into(), nick.into(), Some(reason.into())).into()
    }

    /// `WHO <channel>`
    pub fn who(channel: impl Into<String>) -> Message {
        Command::Who(channel.into()).into()
    }

    /// `WHOIS <target> <target>`
    pub fn whois(target: impl Into<String>) -> Message {
        Command::Whois(target.into()).into()
    }

    /// `QUIT :<message>`
    pub fn quit(message: impl Into<String>) -> Message {
        Command::Quit(Some(message.into())).into()
    }
}

impl From<Command> for Message {
    fn from(command: Command) -> Message {
        Message {
            prefix: None,
            command,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{prefix} ")?;
        }

        match &self.command {
            Command::Nick(n) => write!(f, "NICK {n}"),
            Command::User(u, realname) => write!(f, "USER {u} 0 * :{realname}"),
            Command::Join(c) => write!(f, "JOIN {c}"),
            Command::Part(c, None) => write!(f, "PART {c}"),
            Command::Part(c, Some(m)) => write!(f, "PART {c} :{m}"),
            Command::Ping(t) => write!(f, "PING :{t}"),
            Command::Pong(t) => write!(f, "PONG :{t}"),
            Command::Privmsg(target, text) => write!(f, "PRIVMSG {target} :{text}"),
            Command::Mode(target, modes, arg) => write!(f, "MODE {target} {modes} {arg}"),
            Command::Kick(c, n, None) => write!(f, "KICK {c} {n}"),
            Command::Kick(c, n, Some(r)) => write!(f, "KICK {c} {n} :{r}"),
            Command::Who(c) => write!(f, "WHO {c}"),
            Command::Whois(t) => write!(f, "WHOIS {t} {t}"),
            Command::Quit(None) => write!(f, "QUIT"),
            Command::Quit(Some(m)) => write!(f, "QUIT :{m}"),
            Command::Error(reason) => write!(f, "ERROR :{reason}"),
            Command::Numeric(code, params) => {
                write!(f, "{code:03}")?;
                write_params(f, params)
            }
            Command::Raw(verb, params) => {
                write!(f, "{verb}")?;
                write_params(f, params)
            }
        }
    }
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &[String]) -> fmt::Result {
    for (i, p) in params.iter().enumerate() {
        let last = i + 1 == params.len();
        if last && (p.is_empty() || p.contains(' ') || p.starts_with(':')) {
            write!(f, " :{p}")?;
        } else {
            write!(f, " {p}")?;
        }
    }
    Ok(())
}

/// Parse message prefix (the part after `:` and before the first space).
fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

/// Parse the command verb (1*letter or 3digit).
fn parse_verb(input: &str) -> IResult<&str, &str> {
    let (rest, verb) = take_while1(|c: char| c.is_alphanumeric())(input)?;

    // RFC 2812: command = 1*letter / 3digit
    let is_all_letters = verb.chars().all(|c| c.is_ascii_alphabetic());
    let is_three_digits = verb.len() == 3 && verb.chars().all(|c| c.is_ascii_digit());

    if is_all_letters || is_three_digits {
        Ok((rest, verb))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::AlphaNumeric,
        )))
    }
}

/// Parse parameters after the verb: space-separated tokens plus an optional
/// trailing parameter introduced by `:` which may contain spaces. Multiple
/// consecutive spaces are a single separator.
fn parse_params(input: &str) -> SmallVec<[&str; 15]> {
    let mut params: SmallVec<[&str; 15]> = SmallVec::new();
    let mut rest = input;

    while rest.as_bytes().first() == Some(&b' ') {
        if params.len() >= 15 {
            break;
        }

        while rest.as_bytes().first() == Some(&b' ') {
            rest = &rest[1..];
        }

        if rest.is_empty() || rest.starts_with('\r') || rest.starts_with('\n') {
            break;
        }

        if let Some(after_colon) = rest.strip_prefix(':') {
            let end = after_colon.find(['\r', '\n']).unwrap_or(after_colon.len());
            params.push(&after_colon[..end]);
            break;
        }

        let end = rest.find([' ', '\r', '\n']).unwrap_or(rest.len());
        let param = &rest[..end];
        if param.is_empty() {
            break;
        }
        params.push(param);
        rest = &rest[end..];
    }

    params
}

/// Split a line into (prefix, verb, params), or the failure position.
fn parse_line(input: &str) -> Result<(Option<&str>, &str, SmallVec<[&str; 15]>), usize> {
    fn run(input: &str) -> IResult<&str, (Option<&str>, &str)> {
        let (input, prefix) = opt(parse_prefix)(input)?;
        let (input, _) = space0(input)?;
        let (input, verb) = parse_verb(input)?;
        Ok((input, (prefix, verb)))
    }

    match run(input) {
        Ok((rest, (prefix, verb))) => Ok((prefix, verb, parse_params(rest))),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(input.len() - e.input.len())
        }
        Err(nom::Err::Incomplete(_)) => Err(input.len()),
    }
}
