//! # sketchparty-client
//!
//! An async, transport-agnostic client for Sketch Party, a multiplayer
//! drawing-and-guessing game. One player sketches a secret word while the
//! others race to guess it from the strokes appearing in real time.
//!
//! The crate keeps a local session in sync with the authoritative game
//! server over a persistent connection: it decodes server messages, drives
//! a room state machine (waiting → playing → finished), relays the live
//! drawing stream, and reconnects automatically — with the same room and
//! player identity — whenever the connection drops.
//!
//! ## Architecture
//!
//! - [`SketchPartyClient`] — thin handle; spawns a background session loop
//!   and exposes `guess` / `send_stroke` / `clear_canvas` plus state
//!   accessors.
//! - [`SketchPartyEvent`] — everything the server tells us, surfaced on a
//!   bounded channel for the UI to consume.
//! - [`SessionState`] — the room state machine, applied to every
//!   authoritative server message in receipt order.
//! - [`DrawingRelay`] / [`DrawSurface`] — the drawing stream: local pointer
//!   samples out, remote stroke segments onto a surface.
//! - [`Transport`] / [`Connector`] — the seam to the wire. The crate ships
//!   a WebSocket implementation behind the `transport-websocket` feature
//!   (enabled by default); bring your own by implementing the traits.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sketchparty_client::{
//!     SessionIdentity, SketchPartyClient, SketchPartyConfig, SketchPartyEvent,
//!     WebSocketConnector,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connector = WebSocketConnector::new("ws://localhost:8000");
//!     let identity = SessionIdentity::new("room_1", "player_1");
//!     let (client, mut events) =
//!         SketchPartyClient::start(connector, identity, SketchPartyConfig::new());
//!
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             SketchPartyEvent::WordAssigned { word } => {
//!                 println!("you are drawing: {word}");
//!             }
//!             SketchPartyEvent::GuessReceived { player, guess } => {
//!                 println!("{player} guessed {guess}");
//!             }
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `transport-websocket` *(default)* — WebSocket transport via
//!   `tokio-tungstenite`.
//! - `tokio-runtime` *(default)* — enables the tokio macros used by the
//!   client task machinery.

#[cfg(feature = "tokio-runtime")]
pub mod client;
pub mod error;
pub mod event;
pub mod protocol;
pub mod relay;
pub mod session;
pub mod transport;
pub mod transports;

#[cfg(feature = "tokio-runtime")]
pub use client::{SketchPartyClient, SketchPartyConfig};
pub use error::{Result, SketchPartyError};
pub use event::SketchPartyEvent;
pub use protocol::{
    ChatEntry, ClientMessage, Player, PlayerId, Room, RoomId, RoomStatus, ServerMessage,
    SessionIdentity, StrokeSegment,
};
pub use relay::{DrawSurface, DrawingRelay};
pub use session::SessionState;
pub use transport::{Connector, Transport};

#[cfg(feature = "transport-websocket")]
pub use transports::{WebSocketConnector, WebSocketTransport};
