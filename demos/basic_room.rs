//! # Basic Room Example
//!
//! Demonstrates a complete Sketch Party client lifecycle:
//!
//! 1. Connect to a game server via WebSocket
//! 2. React to session events (players joining, rounds, guesses, strokes)
//! 3. Submit a guess
//! 4. Shut down gracefully on Ctrl+C or game over
//!
//! ## Running
//!
//! ```sh
//! # Start a Sketch Party server on localhost:8000, then:
//! cargo run --example basic_room
//!
//! # Override the server URL, room, or player:
//! SKETCHPARTY_URL=ws://my-server:8000 SKETCHPARTY_ROOM=room_42 cargo run --example basic_room
//! ```

use sketchparty_client::{
    SessionIdentity, SketchPartyClient, SketchPartyConfig, SketchPartyEvent, WebSocketConnector,
};

/// Default server URL when `SKETCHPARTY_URL` is not set.
const DEFAULT_URL: &str = "ws://localhost:8000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Initialize tracing. Set `RUST_LOG=debug` for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Configuration ───────────────────────────────────────────────
    let url = std::env::var("SKETCHPARTY_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
    let room_id = std::env::var("SKETCHPARTY_ROOM").unwrap_or_else(|_| "room_1".to_string());
    let player_id = std::env::var("SKETCHPARTY_PLAYER").unwrap_or_else(|_| "rust_player".to_string());
    tracing::info!("Connecting to {url} (room {room_id}, player {player_id})");

    // ── Start ───────────────────────────────────────────────────────
    // The connector mints a fresh WebSocket for the session — and again
    // after every disconnect, with the same room and player identity.
    let connector = WebSocketConnector::new(&url);
    let identity = SessionIdentity::new(room_id, player_id);
    let (mut client, mut event_rx) =
        SketchPartyClient::start(connector, identity, SketchPartyConfig::new());

    // ── Event loop ──────────────────────────────────────────────────
    // Use `tokio::select!` to listen for both session events and Ctrl+C.
    loop {
        tokio::select! {
            // Branch 1: Incoming event from the session loop.
            event = event_rx.recv() => {
                let Some(event) = event else {
                    // Channel closed — session loop exited.
                    tracing::info!("Event channel closed, exiting");
                    break;
                };

                match event {
                    // ── Connection lifecycle ─────────────────────────
                    SketchPartyEvent::Connected => {
                        tracing::info!("Connected, awaiting room snapshot…");
                    }

                    SketchPartyEvent::StateSynced => {
                        if let Some(room) = client.room().await {
                            tracing::info!(
                                "In room {} ({} player(s) present)",
                                room.name,
                                room.players.len()
                            );
                        }
                    }

                    SketchPartyEvent::Reconnecting { delay } => {
                        tracing::warn!("Reconnecting in {delay:?}…");
                    }

                    // ── Room lifecycle ───────────────────────────────
                    SketchPartyEvent::PlayerJoined { name } => {
                        tracing::info!("Player joined: {name}");
                    }

                    SketchPartyEvent::PlayerLeft { name, .. } => {
                        tracing::info!("Player left: {name}");
                    }

                    SketchPartyEvent::GameStarted { current_round, max_rounds, .. } => {
                        tracing::info!("Game started (round {current_round}/{max_rounds})");
                    }

                    // ── The round ────────────────────────────────────
                    SketchPartyEvent::WordAssigned { word } => {
                        tracing::info!("You are the drawer — draw: {word}");
                    }

                    SketchPartyEvent::GuessReceived { player, guess } => {
                        tracing::info!("{player} guessed: {guess}");

                        // Throw in a guess of our own (unless we're drawing).
                        if !client.is_drawer() {
                            client.guess("penguin")?;
                        }
                    }

                    SketchPartyEvent::WordGuessed { player, word } => {
                        tracing::info!("{player} got it — the word was {word}");
                    }

                    SketchPartyEvent::NewRound { round, drawer } => {
                        tracing::info!("Round {round}, {drawer} is drawing");
                    }

                    SketchPartyEvent::TimerTick { seconds_left } => {
                        if seconds_left % 10 == 0 {
                            tracing::info!("{seconds_left}s left");
                        }
                    }

                    // ── Drawing stream ───────────────────────────────
                    SketchPartyEvent::Stroke(segment) => {
                        tracing::debug!(
                            "stroke ({}, {}) → ({}, {})",
                            segment.prev_x, segment.prev_y, segment.curr_x, segment.curr_y
                        );
                    }

                    SketchPartyEvent::CanvasCleared => {
                        tracing::info!("Canvas cleared");
                    }

                    // ── Game over ────────────────────────────────────
                    SketchPartyEvent::GameOver { winner, final_scores } => {
                        tracing::info!("Game over! Winner: {winner}");
                        for (name, score) in &final_scores {
                            tracing::info!("  {name}: {score}");
                        }
                        break;
                    }

                    SketchPartyEvent::Disconnected { reason } => {
                        tracing::warn!("Disconnected: {}", reason.as_deref().unwrap_or("unknown"));
                    }
                }
            }

            // Branch 2: Ctrl+C — shut down gracefully.
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, shutting down…");
                break;
            }
        }
    }

    // ── Cleanup ─────────────────────────────────────────────────────
    client.shutdown().await;
    tracing::info!("Client shut down. Goodbye!");
    Ok(())
}
