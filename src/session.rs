//! The session: one connection, one event loop, all bot state.
//!
//! The session owns the outbound transport, the stores, and the inbound
//! event receiver fed by the reader task. Everything runs on this single
//! loop; awaited numeric replies are collected inline with a deadline
//! while unrelated traffic is deferred and replayed afterwards, so a
//! slow WHO can never wedge ping handling.

use std::collections::VecDeque;
use std::time::Duration;

use sentinel_proto::numeric::{
    RPL_ENDOFWHO, RPL_ENDOFWHOIS, RPL_WHOISCHANNELS, RPL_WHOISUSER, RPL_WHOREPLY,
};
use sentinel_proto::{Event, Identity, Message, WhoRecord};
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, trace, warn};

use crate::actions;
use crate::config::SessionConfig;
use crate::dispatch;
use crate::error::{BotError, Result};
use crate::store::{ForbiddenStore, OwnerStore};
use crate::transport::{Connector, Transport};

/// How long an awaited numeric reply may take before the collector gives
/// up with whatever it has.
pub const REPLY_WINDOW: Duration = Duration::from_secs(5);

/// Connection session state and event loop.
pub struct Session {
    /// Connection settings, fixed for the session's lifetime.
    pub config: SessionConfig,
    /// The owner hostmask store.
    pub owners: OwnerStore,
    /// The forbidden-list store.
    pub forbidden: ForbiddenStore,
    /// Channels joined this session, in join order.
    channels: Vec<String>,
    transport: Box<dyn Transport>,
    events: mpsc::Receiver<Event>,
    /// Events set aside while a reply collector was running.
    deferred: VecDeque<Event>,
    connector: Box<dyn Connector>,
}

impl Session {
    /// Assemble a session around an already-established connection.
    pub fn new(
        config: SessionConfig,
        owners: OwnerStore,
        forbidden: ForbiddenStore,
        connector: Box<dyn Connector>,
        transport: Box<dyn Transport>,
        events: mpsc::Receiver<Event>,
    ) -> Session {
        Session {
            config,
            owners,
            forbidden,
            channels: Vec::new(),
            transport,
            events,
            deferred: VecDeque::new(),
            connector,
        }
    }

    /// Send one message on the wire.
    pub async fn send(&mut self, msg: Message) -> Result<()> {
        self.transport.send(msg).await
    }

    /// Private-message a user (usually the commanding owner).
    pub async fn reply_to(&mut self, identity: &Identity, text: impl Into<String>) -> Result<()> {
        let nick = identity.nick.clone();
        self.send(Message::privmsg(nick, text)).await
    }

    /// Introduce the bot to the server and join the configured channel.
    pub async fn register(&mut self) -> Result<()> {
        let nick = self.config.nick.clone();
        self.send(Message::nick(&nick)).await?;
        self.send(Message::user(&nick, &nick)).await?;
        let channel = self.config.channel.clone();
        self.join_channel(&channel).await
    }

    /// Join a channel and remember it for rejoin after migration.
    pub async fn join_channel(&mut self, channel: &str) -> Result<()> {
        self.send(Message::join(channel)).await?;
        if !self
            .channels
            .iter()
            .any(|c| c.eq_ignore_ascii_case(channel))
        {
            self.channels.push(channel.to_owned());
        }
        Ok(())
    }

    /// Part a channel and forget it.
    pub async fn part_channel(&mut self, channel: &str, message: &str) -> Result<()> {
        self.send(Message::part(channel, message)).await?;
        self.channels.retain(|c| !c.eq_ignore_ascii_case(channel));
        Ok(())
    }

    /// Channels joined this session, in join order.
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Run the event loop until the connection is lost.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            let event = self.next_event().await?;
            self.handle_event(event).await?;
        }
    }

    /// Next event: deferred backlog first, then the live channel.
    async fn next_event(&mut self) -> Result<Event> {
        if let Some(event) = self.deferred.pop_front() {
            return Ok(event);
        }
        self.events
            .recv()
            .await
            .ok_or_else(|| BotError::ConnectionClosed("event stream ended".into()))
    }

    /// React to one inbound event.
    pub async fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Ping { token } => self.send(Message::pong(token)).await,
            Event::Join { identity, channel } => {
                if identity.nick.eq_ignore_ascii_case(&self.config.nick) {
                    trace!(%channel, "own join echo");
                    return Ok(());
                }
                actions::enforce_forbidden(self, &identity, &channel).await
            }
            Event::Privmsg {
                identity,
                target,
                text,
            } => dispatch::handle(self, &identity, &target, &text).await,
            Event::Numeric { code, .. } => {
                // Numerics outside a collector window carry nothing we need
                trace!(code, "stray numeric");
                Ok(())
            }
            Event::Error { reason } => {
                warn!(%reason, "server closed the connection");
                Err(BotError::ConnectionClosed(reason))
            }
        }
    }

    /// Collect numeric replies until `end_code` or the window elapses.
    ///
    /// Pings are answered inline so a long reply burst cannot time the bot
    /// out; every other non-matching event is deferred and replayed by the
    /// main loop once the collector returns. Returns `(code, params)`
    /// rows for the codes in `wanted`.
    pub async fn collect_numerics(
        &mut self,
        wanted: &[u16],
        end_code: u16,
        window: Duration,
    ) -> Result<Vec<(u16, Vec<String>)>> {
        let deadline = Instant::now() + window;
        let mut rows = Vec::new();

        loop {
            let event = match timeout_at(deadline, self.events.recv()).await {
                Err(_) => {
                    debug!(end_code, "reply window elapsed");
                    break;
                }
                Ok(None) => {
                    return Err(BotError::ConnectionClosed("event stream ended".into()));
                }
                Ok(Some(event)) => event,
            };

            match event {
                Event::Ping { token } => self.send(Message::pong(token)).await?,
                Event::Numeric { code, .. } if code == end_code => break,
                Event::Numeric { code, params } if wanted.contains(&code) => {
                    rows.push((code, params));
                }
                other => self.deferred.push_back(other),
            }
        }

        Ok(rows)
    }

    /// WHO a channel and return its member records.
    pub async fn who(&mut self, channel: &str) -> Result<Vec<WhoRecord>> {
        self.send(Message::who(channel)).await?;
        let rows = self
            .collect_numerics(&[RPL_WHOREPLY], RPL_ENDOFWHO, REPLY_WINDOW)
            .await?;

        Ok(rows
            .iter()
            .filter_map(|(_, params)| WhoRecord::from_params(params))
            .filter(|rec| rec.channel.eq_ignore_ascii_case(channel))
            .collect())
    }

    /// WHOIS the bot itself. Returns the server's view of the bot's nick
    /// (from `311`) and its channel list (from `319`, membership prefixes
    /// stripped).
    pub async fn whois_self(&mut self) -> Result<(Option<String>, Vec<String>)> {
        let nick = self.config.nick.clone();
        self.send(Message::whois(nick)).await?;
        let rows = self
            .collect_numerics(
                &[RPL_WHOISUSER, RPL_WHOISCHANNELS],
                RPL_ENDOFWHOIS,
                REPLY_WINDOW,
            )
            .await?;

        let mut server_nick = None;
        let mut channels = Vec::new();
        for (code, params) in rows {
            match code {
                RPL_WHOISUSER => server_nick = params.get(1).cloned(),
                RPL_WHOISCHANNELS => {
                    if let Some(list) = params.last() {
                        channels.extend(
                            list.split_whitespace()
                                .map(|c| c.trim_start_matches(['@', '+', '%']).to_owned()),
                        );
                    }
                }
                _ => {}
            }
        }
        Ok((server_nick, channels))
    }

    /// Tear down the current connection and establish a fresh one to
    /// `server`, re-registering afterwards. The joined-channel list is
    /// preserved so the caller can rejoin.
    pub async fn reconnect(&mut self, server: &str) -> Result<()> {
        info!(server, port = self.config.port, "migrating connection");
        self.transport.close().await;

        let (transport, events) = self
            .connector
            .connect(server, self.config.port, self.config.bind_ip)
            .await?;
        self.transport = transport;
        self.events = events;
        self.deferred.clear();
        self.config.server = server.to_owned();

        let nick = self.config.nick.clone();
        self.send(Message::nick(&nick)).await?;
        self.send(Message::user(&nick, &nick)).await
    }

    /// Announce departure and close the transport.
    pub async fn quit(&mut self, message: &str) -> Result<()> {
        self.send(Message::quit(message)).await?;
        self.transport.close().await;
        Ok(())
    }
}
