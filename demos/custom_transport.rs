//! # Custom Transport Example
//!
//! Shows how to implement the [`Transport`] and [`Connector`] traits with a
//! simple in-process loopback channel. This is useful for:
//!
//! - **Testing** — drive your game UI without a real server
//! - **Custom backends** — adapt any I/O layer (TCP, QUIC, WebRTC data channels)
//!
//! ## Running
//!
//! ```sh
//! cargo run --example custom_transport
//! ```

use async_trait::async_trait;
use sketchparty_client::{
    Connector, SessionIdentity, SketchPartyClient, SketchPartyConfig, SketchPartyError,
    SketchPartyEvent, Transport,
};
use tokio::sync::mpsc;

// ─────────────────────────────────────────────────────────────────────
// Step 1: Define a channel-based "loopback" transport
// ─────────────────────────────────────────────────────────────────────

/// A loopback transport that shuttles messages through in-process channels.
///
/// This transport consists of two halves:
/// - The **client half** (`LoopbackTransport`) implements [`Transport`] and
///   is minted by the [`LoopbackConnector`].
/// - The **server half** (`LoopbackServer`) lets you inject responses and
///   read what the client sent — perfect for testing.
pub struct LoopbackTransport {
    /// Messages the client sends go here (server reads from the other end).
    tx: mpsc::UnboundedSender<String>,
    /// Messages the server sends arrive here (client reads them).
    rx: mpsc::UnboundedReceiver<String>,
}

/// The "server side" of the loopback — use this to drive the conversation.
pub struct LoopbackServer {
    /// Read what the client sent.
    pub rx: mpsc::UnboundedReceiver<String>,
    /// Send messages to the client (as if they came from a server).
    pub tx: mpsc::UnboundedSender<String>,
}

/// Create a connected `(transport, server)` pair.
fn loopback_pair() -> (LoopbackTransport, LoopbackServer) {
    // Client → Server channel
    let (client_tx, server_rx) = mpsc::unbounded_channel();
    // Server → Client channel
    let (server_tx, client_rx) = mpsc::unbounded_channel();

    let transport = LoopbackTransport {
        tx: client_tx,
        rx: client_rx,
    };
    let server = LoopbackServer {
        rx: server_rx,
        tx: server_tx,
    };

    (transport, server)
}

// ─────────────────────────────────────────────────────────────────────
// Step 2: Implement the Transport trait
// ─────────────────────────────────────────────────────────────────────

#[async_trait]
impl Transport for LoopbackTransport {
    /// Send a JSON message to the "server" side of the loopback.
    async fn send(&mut self, message: String) -> Result<(), SketchPartyError> {
        self.tx
            .send(message)
            .map_err(|e| SketchPartyError::TransportSend(e.to_string()))
    }

    /// Receive the next message from the "server" side.
    ///
    /// Returns `None` when the server channel is closed — this is how the
    /// client discovers that the connection has ended.
    ///
    /// This method is **cancel-safe** because `mpsc::UnboundedReceiver::recv`
    /// is cancel-safe.
    async fn recv(&mut self) -> Option<Result<String, SketchPartyError>> {
        self.rx.recv().await.map(Ok)
    }

    /// Close is a no-op for channels — dropping is sufficient.
    async fn close(&mut self) -> Result<(), SketchPartyError> {
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Step 3: Implement the Connector trait
// ─────────────────────────────────────────────────────────────────────

/// Hands out a single prepared loopback transport.
///
/// A real connector would dial a fresh connection on every call; this one
/// yields its transport once and then pends, so there is no reconnect.
pub struct LoopbackConnector {
    transport: Option<LoopbackTransport>,
}

#[async_trait]
impl Connector for LoopbackConnector {
    type Transport = LoopbackTransport;

    async fn connect(
        &mut self,
        identity: &SessionIdentity,
    ) -> Result<Self::Transport, SketchPartyError> {
        tracing::info!(
            "loopback connect for room {} player {}",
            identity.room_id,
            identity.player_id
        );
        match self.transport.take() {
            Some(transport) => Ok(transport),
            None => std::future::pending().await,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Step 4: Wire together the client and the fake server
// ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for readable output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Create the loopback pair.
    let (transport, mut server) = loopback_pair();
    let connector = LoopbackConnector {
        transport: Some(transport),
    };

    // Start the client.
    let identity = SessionIdentity::new("room_1", "rust_player");
    let (mut client, mut event_rx) =
        SketchPartyClient::start(connector, identity, SketchPartyConfig::new());

    // ── Fake server: push a room snapshot to the client ─────────────
    // The JSON must match the server's wire format — internally tagged:
    // {"type": "message_name", …flat payload fields…}.
    let snapshot = serde_json::json!({
        "type": "game_state",
        "room": {
            "id": "room_1",
            "name": "loopback",
            "players": [
                {"id": "rust_player", "name": "Rusty", "score": 0, "is_drawing": false}
            ],
            "round_time": 60,
            "max_rounds": 3,
            "current_round": 1,
            "status": "waiting"
        },
        "is_drawer": false
    });
    server.tx.send(snapshot.to_string())?;

    // ── Read events from the client ─────────────────────────────────
    // We expect Connected (synthetic) and then StateSynced.
    let mut events_seen = 0;
    while let Some(event) = event_rx.recv().await {
        match &event {
            SketchPartyEvent::Connected => {
                tracing::info!("Event: Connected (synthetic)");
            }
            SketchPartyEvent::StateSynced => {
                let room = client.room().await;
                tracing::info!("Event: StateSynced — room={:?}", room.map(|r| r.name));
            }
            SketchPartyEvent::Disconnected { reason } => {
                tracing::info!(
                    "Event: Disconnected — {}",
                    reason.as_deref().unwrap_or("clean")
                );
                break;
            }
            other => {
                tracing::info!("Event: {other:?}");
            }
        }

        events_seen += 1;
        // After seeing both events, send a guess and shut down.
        if events_seen >= 2 {
            client.guess("penguin")?;
            let Some(guess_msg) = server.rx.recv().await else {
                return Err("server channel closed before the guess arrived".into());
            };
            tracing::info!("Server received: {guess_msg}");
            break;
        }
    }

    // ── Clean shutdown ──────────────────────────────────────────────
    client.shutdown().await;
    tracing::info!("Done — saw {events_seen} event(s). Custom transport works!");
    Ok(())
}
