//! TCP acceptor and per-connection tasks

use crate::registry::{ConnectionId, Registry, SharedRegistry};
use log::{debug, error, info, warn};
use shared::{ClientMessage, ProtocolError, Seat, ServerMessage};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Longest command line a seat may send, newline included.
pub const MAX_LINE: usize = 1024;

/// Accepts connections and seats them in the shared registry
pub struct Server {
    listener: TcpListener,
    registry: SharedRegistry,
}

impl Server {
    /// Binds the listening socket. Failing here is fatal to startup.
    pub async fn bind(addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            registry: Registry::shared(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }

    /// Accept loop. Runs until the task is dropped; accept errors are logged
    /// and never end the loop.
    pub async fn run(&self) {
        info!("Waiting for players");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => self.admit(stream, addr).await,
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }

    async fn admit(&self, stream: TcpStream, addr: SocketAddr) {
        let (reader, writer) = stream.into_split();
        let (outbox, inbox) = mpsc::unbounded_channel();

        let seated = {
            let mut registry = self.registry.lock().await;
            registry.seat_connection(addr, outbox)
        };

        match seated {
            Ok((connection, seat)) => {
                tokio::spawn(write_messages(writer, inbox, seat));

                let registry = Arc::clone(&self.registry);
                tokio::spawn(async move {
                    read_commands(BufReader::new(reader), connection, seat, registry).await;
                });
            }
            Err(e) => {
                warn!("Turning away {}: {}", addr, e);
                tokio::spawn(reject(writer, addr));
            }
        }
    }
}

/// Tells a surplus connection the room is full, then closes it.
async fn reject<W: AsyncWrite + Unpin>(mut writer: W, addr: SocketAddr) {
    if let Err(e) = writer.write_all(ServerMessage::Full.to_line().as_bytes()).await {
        debug!("Could not send FULL to {}: {}", addr, e);
    }
    let _ = writer.shutdown().await;
}

/// Drains a seat's outbox onto its socket, one line per message.
///
/// Ends when the registry drops the outbox or a write fails; the failed
/// connection's reader will surface the disconnect.
pub async fn write_messages<W: AsyncWrite + Unpin>(
    mut writer: W,
    mut inbox: mpsc::UnboundedReceiver<ServerMessage>,
    seat: Seat,
) {
    while let Some(message) = inbox.recv().await {
        if let Err(e) = writer.write_all(message.to_line().as_bytes()).await {
            warn!("Failed to send {} to seat {}: {}", message, seat, e);
            break;
        }
    }
    let _ = writer.shutdown().await;
    debug!("Writer for seat {} finished", seat);
}

/// Reads commands from one seat until the connection ends, then frees the
/// seat.
///
/// Malformed lines are logged and skipped, as is everything up to the next
/// newline once a line runs past [`MAX_LINE`]. Commands the registry refuses
/// are dropped without a reply.
pub async fn read_commands<R: AsyncBufRead + Unpin>(
    mut reader: R,
    connection: ConnectionId,
    seat: Seat,
    registry: SharedRegistry,
) {
    let mut buffer = Vec::with_capacity(MAX_LINE);
    let mut overlong = false;

    loop {
        buffer.clear();
        match (&mut reader).take(MAX_LINE as u64).read_until(b'\n', &mut buffer).await {
            Ok(0) => {
                info!("Seat {} closed the connection", seat);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Error reading from seat {}: {}", seat, e);
                break;
            }
        }

        let complete = buffer.last() == Some(&b'\n');
        if overlong {
            overlong = !complete;
            continue;
        }
        if !complete && buffer.len() == MAX_LINE {
            warn!("Ignoring input from seat {}: {}", seat, ProtocolError::LineTooLong(MAX_LINE));
            overlong = true;
            continue;
        }

        let line = String::from_utf8_lossy(&buffer);
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<ClientMessage>() {
            Ok(command) => command,
            Err(e) => {
                warn!("Ignoring input from seat {}: {}", seat, e);
                continue;
            }
        };

        let mut guard = registry.lock().await;
        if let Err(e) = guard.handle_command(connection, seat, command) {
            debug!("Seat {} sent {}: {}", seat, command, e);
        }
    }

    registry.lock().await.release_seat(connection, seat);
}
