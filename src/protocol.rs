//! Wire-compatible protocol types for the Sketch Party game protocol.
//!
//! Every type in this module produces identical JSON to the game server's
//! message format. Frames are internally tagged on a `type` field with
//! `snake_case` tags, and payload fields sit flat next to the tag (there is
//! no `data` envelope except for stroke segments, which the server nests
//! under `data` on both directions).
//!
//! Unknown inbound `type` tags decode to [`ServerMessage::Unknown`] so that
//! future server message types never break the client.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ── Type aliases ────────────────────────────────────────────────────

/// Unique identifier for players. The server issues opaque strings
/// (e.g. `"player_1_1718000000"`).
pub type PlayerId = String;

/// Unique identifier for rooms (e.g. `"room_1_1718000000"`).
pub type RoomId = String;

// ── Enums ───────────────────────────────────────────────────────────

/// Lifecycle status of a room.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Players are gathering; the game has not started.
    #[default]
    Waiting,
    /// A round is in progress.
    Playing,
    /// All rounds are done. Terminal until the next full resync.
    Finished,
}

// ── Structs ─────────────────────────────────────────────────────────

/// Information about a player in a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Accumulated score. Only ever increases within a round.
    pub score: u32,
    /// Whether this player is the active drawer.
    pub is_drawing: bool,
}

/// Full snapshot of a room as pushed by the server.
///
/// Replaced wholesale on every `game_state` resync; individual fields are
/// patched by score-affecting events in between.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    /// Players ordered by join sequence.
    pub players: Vec<Player>,
    /// The secret word. The server only includes this for the drawer's own
    /// resync; tolerated but never relied upon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_word: Option<String>,
    /// Round duration in seconds.
    pub round_time: u32,
    pub max_rounds: u32,
    pub current_round: u32,
    pub status: RoomStatus,
}

/// One short line segment between two sampled pointer positions.
///
/// Transient: relayed and drawn, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StrokeSegment {
    pub prev_x: f64,
    pub prev_y: f64,
    pub curr_x: f64,
    pub curr_y: f64,
    /// CSS-style color value (e.g. `"#000000"`).
    pub color: String,
    /// Stroke width in surface units. Positive.
    pub size: f64,
}

/// One entry in the chat/guess log. Append-only, ordered by arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    /// `"System"` for notices, otherwise a player name.
    pub speaker: String,
    pub text: String,
    /// True when this entry is a player guess rather than a notice.
    pub is_guess: bool,
}

impl ChatEntry {
    /// A system notice entry.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            speaker: "System".to_string(),
            text: text.into(),
            is_guess: false,
        }
    }

    /// A guess entry attributed to a player.
    pub fn guess(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            is_guess: true,
        }
    }
}

/// The `(room, player)` pair that names one logical game session.
///
/// Immutable for the lifetime of the session and reused verbatim by every
/// reconnect attempt. Obtaining (and persisting) the pair is the caller's
/// concern — typically via the server's `POST /rooms/{id}/join` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub room_id: RoomId,
    pub player_id: PlayerId,
}

impl SessionIdentity {
    pub fn new(room_id: impl Into<RoomId>, player_id: impl Into<PlayerId>) -> Self {
        Self {
            room_id: room_id.into(),
            player_id: player_id.into(),
        }
    }
}

// ── Messages ────────────────────────────────────────────────────────

/// Message types sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Submit a text guess for the current word.
    Guess { guess: String },
    /// Relay one stroke segment. Only valid from the active drawer.
    Draw { data: StrokeSegment },
    /// Clear the shared drawing surface for everyone.
    ClearCanvas,
}

/// Message types pushed from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full-state resync. Idempotent and valid in any state; supersedes all
    /// locally accumulated room state.
    GameState {
        room: Room,
        /// Whether the receiving player is the active drawer.
        is_drawer: bool,
    },
    /// Another player joined the room.
    PlayerJoined { player: String },
    /// A player left the room.
    PlayerLeft {
        player: String,
        /// Advisory hint naming the replacement drawer, if the drawer left.
        /// Logged only; `game_state` / `word_to_draw` stay authoritative.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_drawer: Option<String>,
    },
    /// The game began.
    GameStarted {
        current_round: u32,
        max_rounds: u32,
        #[serde(default)]
        drawer: Option<String>,
    },
    /// The secret word, delivered only to the active drawer.
    WordToDraw { word: String },
    /// A player submitted a guess.
    PlayerGuess { player: String, guess: String },
    /// The word was guessed; carries the updated score map keyed by name.
    WordGuessed {
        player: String,
        word: String,
        scores: HashMap<String, u32>,
    },
    /// A new round began with a new drawer.
    NewRound { round: u32, drawer: String },
    /// The game finished. Terminal until the next `game_state` resync.
    GameOver {
        winner: String,
        #[serde(default)]
        final_scores: HashMap<String, u32>,
    },
    /// One inbound stroke segment from the active drawer.
    DrawData { data: StrokeSegment },
    /// Clear the local drawing surface.
    ClearCanvas,
    /// Forward-compatibility arm: any unrecognized `type` tag lands here
    /// and is discarded by the router.
    #[serde(other)]
    Unknown,
}
