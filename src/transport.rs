//! TCP transport and the background line receiver.
//!
//! The connection is split at connect time: the write half stays with the
//! session (behind the [`Transport`] trait), while a spawned reader task
//! owns the read half, frames and parses lines, classifies them into
//! [`Event`]s, and feeds the session's event channel. The session never
//! blocks the socket while it is busy moderating.

use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use sentinel_proto::{Event, LineCodec, Message, ProtoError};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{lookup_host, TcpSocket, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, trace, warn};

use crate::error::{BotError, Result};

/// Event channel depth; a burst of WHO replies fits comfortably.
const EVENT_CHANNEL_CAPACITY: usize = 128;

/// The outbound half of a connection.
#[async_trait]
pub trait Transport: Send {
    /// Serialize and send one message.
    async fn send(&mut self, msg: Message) -> Result<()>;

    /// Shut the connection down. Errors during teardown are ignored.
    async fn close(&mut self);
}

/// Connection factory, abstracted so the session can be driven by a mock
/// in tests and reconnect through the same seam in production.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establish a connection and spawn its reader task. Returns the
    /// outbound half and the inbound event stream.
    async fn connect(
        &self,
        server: &str,
        port: u16,
        bind_ip: Option<IpAddr>,
    ) -> Result<(Box<dyn Transport>, mpsc::Receiver<Event>)>;
}

/// Plain-TCP connector.
#[derive(Clone, Copy, Debug, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(
        &self,
        server: &str,
        port: u16,
        bind_ip: Option<IpAddr>,
    ) -> Result<(Box<dyn Transport>, mpsc::Receiver<Event>)> {
        let stream = match bind_ip {
            Some(local) => connect_from(server, port, local).await,
            None => TcpStream::connect((server, port)).await,
        }
        .map_err(BotError::Transport)?;

        debug!(server, port, "connected");

        let (read_half, write_half) = stream.into_split();
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tokio::spawn(read_loop(FramedRead::new(read_half, LineCodec::new()), tx));

        let transport = TcpTransport {
            sink: FramedWrite::new(write_half, LineCodec::new()),
        };
        Ok((Box::new(transport), rx))
    }
}

/// Connect with a specific local source address (port 0, ephemeral).
async fn connect_from(server: &str, port: u16, local: IpAddr) -> std::io::Result<TcpStream> {
    let peer = lookup_host((server, port))
        .await?
        .find(|a| a.is_ipv4() == local.is_ipv4())
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                "no resolved address matches the bind address family",
            )
        })?;

    let socket = if local.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.bind(SocketAddr::new(local, 0))?;
    socket.connect(peer).await
}

struct TcpTransport {
    sink: FramedWrite<OwnedWriteHalf, LineCodec>,
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, msg: Message) -> Result<()> {
        trace!(line = %msg, "send");
        self.sink.send(msg).await.map_err(BotError::Proto)
    }

    async fn close(&mut self) {
        let _ = self.sink.get_mut().shutdown().await;
    }
}

/// Reader task: frame, parse, classify, forward.
///
/// Ends on EOF, on a fatal framing error, or when the session drops its
/// receiver; the closed channel is how the session observes connection
/// loss.
async fn read_loop(
    mut lines: FramedRead<OwnedReadHalf, LineCodec>,
    tx: mpsc::Sender<Event>,
) {
    while let Some(result) = lines.next().await {
        let line = match result {
            Ok(line) => line,
            Err(ProtoError::InvalidUtf8 { byte_pos }) => {
                // One bad line does not poison the stream
                warn!(byte_pos, "dropping non-utf8 line");
                continue;
            }
            Err(e) => {
                warn!(error = %e, "read failure, closing receiver");
                break;
            }
        };

        trace!(%line, "recv");

        let msg = match Message::parse(&line) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(%line, error = %e, "dropping unparseable line");
                continue;
            }
        };

        match Event::from_message(msg) {
            Some(event) => {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            None => trace!(%line, "ignored"),
        }
    }
    debug!("reader task finished");
}
