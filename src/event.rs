//! Consumer-facing events emitted by the session loop.
//!
//! [`SketchPartyEvent`] is the typed stream a UI layer consumes: connection
//! lifecycle notifications, game transitions mirrored from the session
//! state machine, countdown ticks, and the ephemeral drawing stream
//! (strokes and canvas clears) that the drawing relay applies to a surface.

use std::collections::HashMap;
use std::time::Duration;

use crate::protocol::{ServerMessage, StrokeSegment};

/// Events emitted on the channel returned from
/// [`SketchPartyClient::start`](crate::client::SketchPartyClient::start).
#[derive(Debug, Clone, PartialEq)]
pub enum SketchPartyEvent {
    /// A transport connection is live. Emitted once per (re)connect.
    Connected,
    /// The current connection ended. Always delivered, even under
    /// event-channel backpressure.
    Disconnected {
        /// Human-readable close reason, when one is known.
        reason: Option<String>,
    },
    /// The supervisor will attempt a reconnect after `delay`.
    Reconnecting { delay: Duration },
    /// A full `game_state` resync was applied.
    StateSynced,
    /// Another player joined the room.
    PlayerJoined { name: String },
    /// A player left; `new_drawer` is the server's advisory replacement hint.
    PlayerLeft {
        name: String,
        new_drawer: Option<String>,
    },
    /// The game began.
    GameStarted {
        current_round: u32,
        max_rounds: u32,
        drawer: Option<String>,
    },
    /// The secret word was assigned to the local player.
    WordAssigned { word: String },
    /// A guess arrived (already appended to the chat log).
    GuessReceived { player: String, guess: String },
    /// The word was guessed; scores have been merged into the room.
    WordGuessed { player: String, word: String },
    /// A new round began.
    NewRound { round: u32, drawer: String },
    /// The game is over.
    GameOver {
        winner: String,
        final_scores: HashMap<String, u32>,
    },
    /// Round countdown tick, emitted once per second while playing.
    TimerTick { seconds_left: u32 },
    /// One inbound stroke segment for the drawing relay.
    Stroke(StrokeSegment),
    /// Clear the local drawing surface.
    CanvasCleared,
}

impl SketchPartyEvent {
    /// Convert a decoded server message into the event the consumer sees.
    ///
    /// Returns `None` for [`ServerMessage::Unknown`] — unrecognized frames
    /// are discarded, never surfaced.
    pub(crate) fn from_server(msg: ServerMessage) -> Option<Self> {
        let event = match msg {
            ServerMessage::GameState { .. } => Self::StateSynced,
            ServerMessage::PlayerJoined { player } => Self::PlayerJoined { name: player },
            ServerMessage::PlayerLeft { player, new_drawer } => Self::PlayerLeft {
                name: player,
                new_drawer,
            },
            ServerMessage::GameStarted {
                current_round,
                max_rounds,
                drawer,
            } => Self::GameStarted {
                current_round,
                max_rounds,
                drawer,
            },
            ServerMessage::WordToDraw { word } => Self::WordAssigned { word },
            ServerMessage::PlayerGuess { player, guess } => Self::GuessReceived { player, guess },
            ServerMessage::WordGuessed { player, word, .. } => Self::WordGuessed { player, word },
            ServerMessage::NewRound { round, drawer } => Self::NewRound { round, drawer },
            ServerMessage::GameOver {
                winner,
                final_scores,
            } => Self::GameOver {
                winner,
                final_scores,
            },
            ServerMessage::DrawData { data } => Self::Stroke(data),
            ServerMessage::ClearCanvas => Self::CanvasCleared,
            ServerMessage::Unknown => return None,
        };
        Some(event)
    }
}
