//! Moderation actions, including the WHO/WHOIS awaited-reply flows.
//!
//! Every action takes the session by mutable reference; there is no
//! ambient state. Actions that need server data (kick, kick-ban,
//! mass-kick, channel list, migration) issue the query and collect the
//! numeric reply burst through [`Session::collect_numerics`] before
//! acting.

use std::collections::HashSet;
use std::time::Duration;

use sentinel_proto::{HostMask, Identity, Message, WhoRecord};
use tracing::{debug, info};

use crate::error::Result;
use crate::session::Session;
use crate::store::{Action, ForbiddenEntry};

/// Reason used when `.k`/`.kb` is given none.
pub const DEFAULT_KICK_REASON: &str = "no reason given";
/// Reason attached to forbidden-list enforcement kicks.
pub const FORBIDDEN_KICK_REASON: &str = "forbidden host";
/// Reason attached to mass kicks.
pub const MASS_KICK_REASON: &str = "mass kick";
/// Part message for `.part`.
pub const PART_MESSAGE: &str = "leaving";
/// Quit message emitted before a server migration.
pub const QUIT_MESSAGE: &str = "changing servers";
/// Pause between consecutive mass-kick KICKs.
pub const MASS_KICK_DELAY: Duration = Duration::from_millis(300);

/// Apply the first matching forbidden-list rule to a joiner.
pub async fn enforce_forbidden(
    session: &mut Session,
    identity: &Identity,
    channel: &str,
) -> Result<()> {
    let Some(entry) = session.forbidden.match_join(identity, channel) else {
        return Ok(());
    };
    let action = entry.action;
    let nick = identity.nick.clone();

    match action {
        Action::Op => {
            info!(%nick, %channel, "forbidden list: granting ops");
            session.send(Message::mode(channel, "+o", nick)).await
        }
        Action::Deny => {
            // Ban the joiner's own ident@host, not the stored pattern
            let ban = identity.ban_mask();
            info!(%nick, %channel, %ban, "forbidden list: banning");
            session.send(Message::mode(channel, "+b", ban)).await?;
            session
                .send(Message::kick(channel, nick, FORBIDDEN_KICK_REASON))
                .await
        }
    }
}

/// Grant ops on the configured channel.
pub async fn op(session: &mut Session, nick: &str) -> Result<()> {
    let channel = session.config.channel.clone();
    session.send(Message::mode(channel, "+o", nick)).await
}

/// Revoke ops on the configured channel.
pub async fn deop(session: &mut Session, nick: &str) -> Result<()> {
    let channel = session.config.channel.clone();
    session.send(Message::mode(channel, "-o", nick)).await
}

/// Look a nick up in the channel's WHO list.
async fn find_member(
    session: &mut Session,
    channel: &str,
    nick: &str,
) -> Result<Option<WhoRecord>> {
    let members = session.who(channel).await?;
    Ok(members
        .into_iter()
        .find(|rec| rec.nick.eq_ignore_ascii_case(nick)))
}

/// Kick `nick` from `channel` if present. Absent nicks are skipped
/// without complaint.
pub async fn kick(session: &mut Session, channel: &str, nick: &str, reason: &str) -> Result<()> {
    match find_member(session, channel, nick).await? {
        Some(member) => {
            session
                .send(Message::kick(channel, member.nick, reason))
                .await
        }
        None => {
            debug!(%nick, %channel, "kick target not present");
            Ok(())
        }
    }
}

/// Ban-then-kick `nick` from `channel` if present. The ban mask is
/// derived from the member's WHO record.
pub async fn kick_ban(
    session: &mut Session,
    channel: &str,
    nick: &str,
    reason: &str,
) -> Result<()> {
    match find_member(session, channel, nick).await? {
        Some(member) => {
            session
                .send(Message::mode(channel, "+b", member.ban_mask()))
                .await?;
            session
                .send(Message::kick(channel, member.nick, reason))
                .await
        }
        None => {
            debug!(%nick, %channel, "kick-ban target not present");
            Ok(())
        }
    }
}

/// Kick every channel member except the bot and the invoking owner, with
/// a pause between kicks.
pub async fn mass_kick(session: &mut Session, channel: &str, invoker: &str) -> Result<()> {
    // Ask the server what it calls us; fall back to the configured nick
    let (server_nick, _) = session.whois_self().await?;
    let own_nick = server_nick.unwrap_or_else(|| session.config.nick.clone());

    let members = session.who(channel).await?;
    let targets: Vec<String> = members
        .into_iter()
        .map(|rec| rec.nick)
        .filter(|nick| {
            !nick.eq_ignore_ascii_case(&own_nick) && !nick.eq_ignore_ascii_case(invoker)
        })
        .collect();

    info!(%channel, count = targets.len(), "mass kick");
    let mut first = true;
    for nick in targets {
        if !first {
            tokio::time::sleep(MASS_KICK_DELAY).await;
        }
        first = false;
        session
            .send(Message::kick(channel, nick, MASS_KICK_REASON))
            .await?;
    }
    Ok(())
}

/// Add a forbidden-list rule. For deny rules the channel is swept
/// immediately: the mask is banned once and every member it matches is
/// kicked.
pub async fn add_forbidden(
    session: &mut Session,
    channel: &str,
    mask: &str,
    action: Action,
) -> Result<()> {
    let pattern: HostMask = mask.parse().map_err(crate::store::StoreError::from)?;
    session.forbidden.add(channel, mask, action)?;
    if action != Action::Deny {
        return Ok(());
    }

    let members = session.who(channel).await?;
    let matching: Vec<String> = members
        .into_iter()
        .filter(|rec| pattern.matches(&rec.join_form()))
        .map(|rec| rec.nick)
        .collect();

    if matching.is_empty() {
        return Ok(());
    }

    session
        .send(Message::mode(channel, "+b", mask))
        .await?;
    for nick in matching {
        session
            .send(Message::kick(channel, nick, FORBIDDEN_KICK_REASON))
            .await?;
    }
    Ok(())
}

/// Remove a forbidden-list rule by its exact (channel, mask, flag)
/// triple; a removed deny rule also lifts its channel ban.
pub async fn remove_forbidden(
    session: &mut Session,
    channel: &str,
    mask: &str,
    action: Action,
) -> Result<ForbiddenEntry> {
    let entry = session.forbidden.remove(channel, mask, action)?;
    if entry.action == Action::Deny {
        session
            .send(Message::mode(channel, "-b", entry.mask.as_str()))
            .await?;
    }
    Ok(entry)
}

/// Report the bot's current channel list to `owner`.
pub async fn channel_list(session: &mut Session, owner: &Identity) -> Result<()> {
    let (_, channels) = session.whois_self().await?;
    if channels.is_empty() {
        session
            .reply_to(owner, "Could not determine channel list")
            .await
    } else {
        let text = format!("Channels: {}", channels.join(" "));
        session.reply_to(owner, text).await
    }
}

/// Migrate to a new server: collect the current channel set, quit,
/// reconnect on the same port (and bind address), re-register, rejoin.
/// A failed reconnect propagates as fatal.
pub async fn jump(session: &mut Session, server: &str) -> Result<()> {
    let (_, mut channels) = session.whois_self().await?;
    if channels.is_empty() {
        channels = session.channels().to_vec();
    }
    let mut seen = HashSet::new();
    channels.retain(|c| seen.insert(c.to_ascii_lowercase()));

    session.quit(QUIT_MESSAGE).await?;
    session.reconnect(server).await?;

    for channel in channels {
        session.join_channel(&channel).await?;
    }
    Ok(())
}
