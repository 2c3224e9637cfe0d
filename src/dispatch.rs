//! Owner-command routing.
//!
//! One inbound PRIVMSG at a time: gate on the owner list (non-owners are
//! dropped silently, so the command surface stays undiscoverable), match
//! the verb, validate arguments, delegate to an action. Argument
//! shortfalls answer with a usage line instead of acting.

use sentinel_proto::Identity;
use tracing::{debug, trace};

use crate::actions;
use crate::error::{BotError, Result};
use crate::session::Session;
use crate::store::{Action, StoreError};

/// Handle one private message.
pub async fn handle(
    session: &mut Session,
    sender: &Identity,
    target: &str,
    text: &str,
) -> Result<()> {
    if !session.owners.is_owner(sender) {
        trace!(from = %sender, "dropping message from non-owner");
        return Ok(());
    }

    let mut tokens = text.split_whitespace();
    let Some(verb) = tokens.next() else {
        return Ok(());
    };

    // Kick-family commands act where they were spoken; a command sent in
    // private falls back to the configured channel.
    let context = if target.starts_with('#') {
        target.to_owned()
    } else {
        session.config.channel.clone()
    };

    debug!(from = %sender.nick, verb, "owner command");

    match verb {
        ".op" => match tokens.next() {
            Some(nick) => actions::op(session, nick).await,
            None => usage(session, sender, ".op <nick>").await,
        },
        ".deop" => match tokens.next() {
            Some(nick) => actions::deop(session, nick).await,
            None => usage(session, sender, ".deop <nick>").await,
        },
        ".k" => match tokens.next() {
            Some(nick) => {
                let reason = trailing_reason(text);
                actions::kick(session, &context, nick, reason).await
            }
            None => usage(session, sender, ".k <nick> [reason]").await,
        },
        ".kb" => match tokens.next() {
            Some(nick) => {
                let reason = trailing_reason(text);
                actions::kick_ban(session, &context, nick, reason).await
            }
            None => usage(session, sender, ".kb <nick> [reason]").await,
        },
        ".mk" => {
            let invoker = sender.nick.clone();
            actions::mass_kick(session, &context, &invoker).await
        }
        ".+own" => match tokens.next() {
            Some(mask) => {
                let outcome = session.owners.add(mask);
                let ok = format!("Added {mask} to owner list");
                report(session, sender, outcome, ok).await
            }
            None => usage(session, sender, ".+own <mask>").await,
        },
        ".-own" => match tokens.next() {
            Some(mask) => {
                let outcome = session.owners.remove(mask);
                let ok = format!("Removed {mask} from owner list");
                report(session, sender, outcome, ok).await
            }
            None => usage(session, sender, ".-own <mask>").await,
        },
        ".own" => {
            let lines: Vec<String> = session.owners.list().map(|m| m.to_string()).collect();
            if lines.is_empty() {
                session.reply_to(sender, "Owner list is empty").await
            } else {
                for line in lines {
                    session.reply_to(sender, line).await?;
                }
                Ok(())
            }
        }
        ".+fb" => match fb_args(&mut tokens) {
            Some((channel, mask, flag)) => {
                let Some(action) = parse_flag(flag) else {
                    return usage(session, sender, ".+fb <#channel> <mask> <f|d>").await;
                };
                if !channel.starts_with('#') {
                    return usage(session, sender, ".+fb <#channel> <mask> <f|d>").await;
                }
                let outcome = actions::add_forbidden(session, channel, mask, action).await;
                let ok = format!("Added {channel} to fb list");
                report_bot(session, sender, outcome, ok).await
            }
            None => usage(session, sender, ".+fb <#channel> <mask> <f|d>").await,
        },
        ".-fb" => match fb_args(&mut tokens) {
            Some((channel, mask, flag)) => {
                let Some(action) = parse_flag(flag) else {
                    return usage(session, sender, ".-fb <#channel> <mask> <f|d>").await;
                };
                if !channel.starts_with('#') {
                    return usage(session, sender, ".-fb <#channel> <mask> <f|d>").await;
                }
                let outcome = actions::remove_forbidden(session, channel, mask, action)
                    .await
                    .map(|_| ());
                let ok = format!("Removed {channel} from fb list");
                report_bot(session, sender, outcome, ok).await
            }
            None => usage(session, sender, ".-fb <#channel> <mask> <f|d>").await,
        },
        ".fb" => {
            let lines: Vec<String> = session
                .forbidden
                .list()
                .map(|e| format!("{} {} {}", e.channel, e.mask, e.action.flag()))
                .collect();
            if lines.is_empty() {
                session.reply_to(sender, "Fb list is empty").await
            } else {
                session.reply_to(sender, "List of fbs:").await?;
                for line in lines {
                    session.reply_to(sender, line).await?;
                }
                Ok(())
            }
        }
        ".join" => match tokens.next() {
            Some(channel) if channel.starts_with('#') => session.join_channel(channel).await,
            _ => usage(session, sender, ".join <#channel>").await,
        },
        ".part" => match tokens.next() {
            Some(channel) if channel.starts_with('#') => {
                session.part_channel(channel, actions::PART_MESSAGE).await
            }
            _ => usage(session, sender, ".part <#channel>").await,
        },
        ".lc" => actions::channel_list(session, sender).await,
        ".jump" => match tokens.next() {
            Some(server) => actions::jump(session, server).await,
            None => usage(session, sender, ".jump <server>").await,
        },
        _ => {
            trace!(verb, "unknown verb ignored");
            Ok(())
        }
    }
}

/// `<channel> <mask> <flag>` triple for the fb mutation commands.
fn fb_args<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Option<(&'a str, &'a str, &'a str)> {
    Some((tokens.next()?, tokens.next()?, tokens.next()?))
}

fn parse_flag(flag: &str) -> Option<Action> {
    match flag {
        "f" => Some(Action::Op),
        "d" => Some(Action::Deny),
        _ => None,
    }
}

/// Everything after the verb and first argument, preserving spaces.
fn trailing_reason(text: &str) -> &str {
    let mut rest = text.trim();
    // Skip the verb and the nick tokens
    for _ in 0..2 {
        match rest.find(char::is_whitespace) {
            Some(i) => rest = rest[i..].trim_start(),
            None => return actions::DEFAULT_KICK_REASON,
        }
    }
    if rest.is_empty() {
        actions::DEFAULT_KICK_REASON
    } else {
        rest
    }
}

async fn usage(session: &mut Session, sender: &Identity, line: &str) -> Result<()> {
    session.reply_to(sender, format!("usage: {line}")).await
}

/// Report a store mutation outcome to the sender. Duplicate, not-found,
/// and invalid-mask outcomes are conversational; persistence failures
/// stay fatal.
async fn report<T>(
    session: &mut Session,
    sender: &Identity,
    outcome: Result<T, StoreError>,
    ok: String,
) -> Result<()> {
    match outcome {
        Ok(_) => session.reply_to(sender, ok).await,
        Err(StoreError::DuplicateEntry(what)) => {
            session
                .reply_to(sender, format!("Already present: {what}"))
                .await
        }
        Err(StoreError::NotFound(what)) => {
            session
                .reply_to(sender, format!("No such entry: {what}"))
                .await
        }
        Err(StoreError::InvalidMask(e)) => {
            session.reply_to(sender, format!("Invalid mask: {e}")).await
        }
        Err(e @ StoreError::Io(_)) => Err(e.into()),
    }
}

/// As [`report`], for actions that mix store and transport errors.
async fn report_bot(
    session: &mut Session,
    sender: &Identity,
    outcome: Result<()>,
    ok: String,
) -> Result<()> {
    match outcome {
        Ok(()) => session.reply_to(sender, ok).await,
        Err(BotError::Store(store_err)) => {
            report(session, sender, Err::<(), _>(store_err), ok).await
        }
        Err(other) => Err(other),
    }
}
