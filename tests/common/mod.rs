//! Shared test harness: a session wired to a mock transport and a
//! hand-fed event channel.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sentinel_proto::{Event, Identity, Message};
use slirc_sentinel::config::SessionConfig;
use slirc_sentinel::error::Result;
use slirc_sentinel::session::Session;
use slirc_sentinel::store::{ForbiddenStore, OwnerStore};
use slirc_sentinel::transport::{Connector, Transport};
use tempfile::TempDir;
use tokio::sync::mpsc;

pub const BOT_NICK: &str = "sentinel";
pub const HOME_CHANNEL: &str = "#ops";
pub const OWNER_MASK: &str = "boss!*@trusted.example.org";
pub const OWNER_IDENT: &str = "boss!ident@trusted.example.org";

/// Outbound lines, in send order.
pub type SentLog = Arc<Mutex<Vec<String>>>;

pub struct MockTransport {
    pub sent: SentLog,
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, msg: Message) -> Result<()> {
        self.sent.lock().unwrap().push(msg.to_string());
        Ok(())
    }

    async fn close(&mut self) {}
}

/// Hands out pre-scripted event receivers on each connect, all sharing
/// one outbound log.
pub struct MockConnector {
    pub sent: SentLog,
    pub pending: Arc<Mutex<VecDeque<mpsc::Receiver<Event>>>>,
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        _server: &str,
        _port: u16,
        _bind_ip: Option<IpAddr>,
    ) -> Result<(Box<dyn Transport>, mpsc::Receiver<Event>)> {
        let rx = self
            .pending
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| mpsc::channel(1).1);
        let transport = MockTransport {
            sent: self.sent.clone(),
        };
        Ok((Box::new(transport), rx))
    }
}

pub struct Harness {
    pub session: Session,
    pub sent: SentLog,
    /// Feeds the session's live event channel.
    pub feed: mpsc::Sender<Event>,
    /// Receivers handed out by the connector on reconnect, in order.
    pub pending: Arc<Mutex<VecDeque<mpsc::Receiver<Event>>>>,
    pub dir: TempDir,
}

impl Harness {
    pub fn sent_lines(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear_sent(&self) {
        self.sent.lock().unwrap().clear();
    }
}

/// A fresh session: one owner on file, empty fb list, configured for
/// [`HOME_CHANNEL`].
pub fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let mut owners = OwnerStore::load(dir.path().join("owner.txt")).unwrap();
    owners.add(OWNER_MASK).unwrap();
    let forbidden = ForbiddenStore::load(dir.path().join("fb.txt")).unwrap();

    let config = SessionConfig {
        server: "irc.example.net".into(),
        port: 6667,
        nick: BOT_NICK.into(),
        channel: HOME_CHANNEL.into(),
        bind_ip: None,
    };

    let sent: SentLog = Arc::default();
    let pending = Arc::new(Mutex::new(VecDeque::new()));
    let (feed, events) = mpsc::channel(128);

    let connector = MockConnector {
        sent: sent.clone(),
        pending: pending.clone(),
    };
    let transport = MockTransport { sent: sent.clone() };
    let session = Session::new(
        config,
        owners,
        forbidden,
        Box::new(connector),
        Box::new(transport),
        events,
    );

    Harness {
        session,
        sent,
        feed,
        pending,
        dir,
    }
}

pub fn identity(s: &str) -> Identity {
    Identity::parse(s).unwrap()
}

/// Owner command spoken in the home channel.
pub fn owner_says(text: &str) -> Event {
    Event::Privmsg {
        identity: identity(OWNER_IDENT),
        target: HOME_CHANNEL.into(),
        text: text.into(),
    }
}

/// Owner command sent in private.
pub fn owner_whispers(text: &str) -> Event {
    Event::Privmsg {
        identity: identity(OWNER_IDENT),
        target: BOT_NICK.into(),
        text: text.into(),
    }
}

pub fn joined(who: &str, channel: &str) -> Event {
    Event::Join {
        identity: identity(who),
        channel: channel.into(),
    }
}

/// `352` WHO reply: `<client> <channel> <ident> <host> <server> <nick>
/// <flags> :<hops> <realname>`.
pub fn who_reply(channel: &str, ident: &str, host: &str, nick: &str) -> Event {
    Event::Numeric {
        code: 352,
        params: [
            BOT_NICK, channel, ident, host, "irc.example.net", nick, "H", "0 real name",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    }
}

pub fn end_of_who(channel: &str) -> Event {
    Event::Numeric {
        code: 315,
        params: vec![BOT_NICK.into(), channel.into(), "End of WHO list".into()],
    }
}

/// `311` WHOIS user reply carrying the server's view of the nick.
pub fn whois_user(nick: &str) -> Event {
    Event::Numeric {
        code: 311,
        params: vec![
            BOT_NICK.into(),
            nick.into(),
            "ident".into(),
            "bot.example.net".into(),
            "*".into(),
            "real name".into(),
        ],
    }
}

/// `319` WHOIS channels reply, trailing list with membership prefixes.
pub fn whois_channels(list: &str) -> Event {
    Event::Numeric {
        code: 319,
        params: vec![BOT_NICK.into(), BOT_NICK.into(), list.into()],
    }
}

pub fn end_of_whois() -> Event {
    Event::Numeric {
        code: 318,
        params: vec![BOT_NICK.into(), BOT_NICK.into(), "End of WHOIS list".into()],
    }
}
