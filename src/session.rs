//! Session state machine for one game session.
//!
//! [`SessionState`] holds the canonical room/player/round state plus the
//! append-only chat log, and applies server-pushed events as transitions.
//! It is purely synchronous: the session loop is its single writer, the UI
//! and drawing relay only read from it.
//!
//! The machine favors eventual consistency over strict validation: an
//! out-of-state-order message is logged and ignored, never an error, and
//! any drift is repaired by the next `game_state` resync (which replaces
//! the room wholesale).

use tracing::debug;

use crate::protocol::{ChatEntry, Room, RoomStatus, ServerMessage};

/// Round duration used before any room snapshot has arrived.
const DEFAULT_ROUND_SECONDS: u32 = 60;

/// Canonical local view of one game session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Latest room snapshot. `None` until the first `game_state` resync.
    room: Option<Room>,
    /// The secret word, known only while the local player is the drawer.
    current_word: Option<String>,
    /// Whether the local player may transmit strokes and canvas clears.
    can_draw: bool,
    /// Seconds remaining in the current round countdown.
    round_seconds_left: u32,
    /// Append-only chat/guess log in arrival order.
    chat: Vec<ChatEntry>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Read accessors ──────────────────────────────────────────────

    /// Latest room snapshot, if one has arrived.
    pub fn room(&self) -> Option<&Room> {
        self.room.as_ref()
    }

    /// Current room status; `Waiting` before the first snapshot.
    pub fn status(&self) -> RoomStatus {
        self.room.as_ref().map(|r| r.status).unwrap_or_default()
    }

    /// The secret word, if the local player is the drawer and it arrived.
    pub fn current_word(&self) -> Option<&str> {
        self.current_word.as_deref()
    }

    /// Whether local pointer input may be transmitted.
    pub fn can_draw(&self) -> bool {
        self.can_draw
    }

    /// Seconds remaining in the round countdown.
    pub fn seconds_left(&self) -> u32 {
        self.round_seconds_left
    }

    /// The chat/guess log, ordered by arrival.
    pub fn chat(&self) -> &[ChatEntry] {
        &self.chat
    }

    fn round_seconds(&self) -> u32 {
        match &self.room {
            Some(room) if room.round_time > 0 => room.round_time,
            _ => DEFAULT_ROUND_SECONDS,
        }
    }

    // ── Transitions ─────────────────────────────────────────────────

    /// Apply one server message as a state transition.
    ///
    /// Only reads/writes the fields relevant to the message's own
    /// transition, so a stray message cannot corrupt unrelated state.
    pub fn apply(&mut self, msg: &ServerMessage) {
        // Finished is terminal: only a fresh resync is accepted afterwards.
        if self.status() == RoomStatus::Finished
            && !matches!(msg, ServerMessage::GameState { .. })
        {
            debug!(?msg, "ignoring message in finished session");
            return;
        }

        match msg {
            ServerMessage::GameState { room, is_drawer } => {
                self.room = Some(room.clone());
                self.can_draw = *is_drawer;
                // Wholesale replacement includes the revealed word: the
                // server sends it only in the drawer's own snapshot, so a
                // non-drawer resync drops any stale reveal.
                self.current_word = room.current_word.clone();
                // A mid-round resync restarts the cosmetic countdown; the
                // server remains the timing authority either way.
                self.round_seconds_left = match room.status {
                    RoomStatus::Playing => self.round_seconds(),
                    _ => 0,
                };
                debug!(room = %room.id, is_drawer, "applied game_state resync");
            }
            ServerMessage::PlayerJoined { player } => {
                self.chat
                    .push(ChatEntry::system(format!("{player} joined the room")));
            }
            ServerMessage::PlayerLeft { player, new_drawer } => {
                self.chat
                    .push(ChatEntry::system(format!("{player} left the room")));
                // Advisory only: the authoritative drawer flag arrives via
                // game_state or word_to_draw.
                if let Some(drawer) = new_drawer {
                    self.chat
                        .push(ChatEntry::system(format!("{drawer} is now drawing")));
                }
            }
            ServerMessage::GameStarted {
                current_round,
                max_rounds,
                drawer,
            } => {
                if self.status() == RoomStatus::Playing {
                    debug!("ignoring game_started while already playing");
                    return;
                }
                if let Some(room) = &mut self.room {
                    room.status = RoomStatus::Playing;
                    room.current_round = *current_round;
                    room.max_rounds = *max_rounds;
                }
                self.round_seconds_left = self.round_seconds();
                let drawer = drawer.as_deref().unwrap_or("someone");
                self.chat.push(ChatEntry::system(format!(
                    "Game started! Round {current_round} of {max_rounds}. {drawer} is drawing."
                )));
            }
            ServerMessage::WordToDraw { word } => {
                self.current_word = Some(word.clone());
                self.can_draw = true;
            }
            ServerMessage::PlayerGuess { player, guess } => {
                self.chat.push(ChatEntry::guess(player, guess));
            }
            ServerMessage::WordGuessed {
                player,
                word,
                scores,
            } => {
                self.merge_scores(scores);
                self.chat.push(ChatEntry::system(format!(
                    "{player} guessed the word: {word}!"
                )));
            }
            ServerMessage::NewRound { round, drawer } => {
                if self.status() != RoomStatus::Playing {
                    debug!(round, "ignoring new_round while not playing");
                    return;
                }
                if let Some(room) = &mut self.room {
                    room.current_round = *round;
                }
                self.current_word = None;
                self.can_draw = false;
                self.round_seconds_left = self.round_seconds();
                self.chat.push(ChatEntry::system(format!(
                    "Round {round} started. {drawer} is drawing."
                )));
            }
            ServerMessage::GameOver {
                winner,
                final_scores,
            } => {
                self.merge_scores(final_scores);
                if let Some(room) = &mut self.room {
                    room.status = RoomStatus::Finished;
                }
                self.current_word = None;
                self.can_draw = false;
                self.round_seconds_left = 0;
                self.chat
                    .push(ChatEntry::system(format!("Game over! Winner: {winner}")));
            }
            // The drawing stream bypasses the session entirely.
            ServerMessage::DrawData { .. } | ServerMessage::ClearCanvas => {}
            ServerMessage::Unknown => {
                debug!("ignoring unknown server message");
            }
        }
    }

    /// Advance the round countdown by one second.
    ///
    /// Returns the remaining seconds while a round is in progress, `None`
    /// otherwise. The countdown is cosmetic: round timing authority is
    /// server-side.
    pub fn tick(&mut self) -> Option<u32> {
        if self.status() != RoomStatus::Playing {
            return None;
        }
        self.round_seconds_left = self.round_seconds_left.saturating_sub(1);
        Some(self.round_seconds_left)
    }

    /// Merge a server-supplied `name → score` map into the room's players.
    /// A player whose name is absent keeps their prior score.
    fn merge_scores(&mut self, scores: &std::collections::HashMap<String, u32>) {
        if let Some(room) = &mut self.room {
            for player in &mut room.players {
                if let Some(score) = scores.get(&player.name) {
                    player.score = *score;
                }
            }
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::protocol::Player;
    use std::collections::HashMap;

    fn player(name: &str, score: u32, is_drawing: bool) -> Player {
        Player {
            id: format!("id_{name}"),
            name: name.to_string(),
            score,
            is_drawing,
        }
    }

    fn room(status: RoomStatus, players: Vec<Player>) -> Room {
        Room {
            id: "room_1".into(),
            name: "test room".into(),
            players,
            current_word: None,
            round_time: 60,
            max_rounds: 3,
            current_round: 1,
            status,
        }
    }

    fn playing_session(players: Vec<Player>) -> SessionState {
        let mut session = SessionState::new();
        session.apply(&ServerMessage::GameState {
            room: room(RoomStatus::Playing, players),
            is_drawer: false,
        });
        session
    }

    #[test]
    fn game_state_replaces_room_wholesale() {
        let mut session = SessionState::new();
        assert!(session.room().is_none());
        assert_eq!(session.status(), RoomStatus::Waiting);

        session.apply(&ServerMessage::GameState {
            room: room(RoomStatus::Waiting, vec![player("alice", 0, true)]),
            is_drawer: true,
        });
        assert_eq!(session.room().unwrap().players.len(), 1);
        assert!(session.can_draw());

        // A second resync supersedes the first entirely.
        session.apply(&ServerMessage::GameState {
            room: room(
                RoomStatus::Playing,
                vec![player("alice", 5, false), player("bob", 0, true)],
            ),
            is_drawer: false,
        });
        assert_eq!(session.status(), RoomStatus::Playing);
        assert_eq!(session.room().unwrap().players.len(), 2);
        assert!(!session.can_draw());
    }

    #[test]
    fn player_joined_appends_system_entry() {
        let mut session = SessionState::new();
        session.apply(&ServerMessage::PlayerJoined {
            player: "carol".into(),
        });
        assert_eq!(session.chat().len(), 1);
        assert_eq!(session.chat()[0].speaker, "System");
        assert!(session.chat()[0].text.contains("carol joined"));
        assert!(!session.chat()[0].is_guess);
    }

    #[test]
    fn player_left_hint_is_logged_but_not_authoritative() {
        let mut session = playing_session(vec![player("alice", 0, true)]);
        session.apply(&ServerMessage::PlayerLeft {
            player: "alice".into(),
            new_drawer: Some("bob".into()),
        });
        let texts: Vec<_> = session.chat().iter().map(|e| e.text.as_str()).collect();
        assert!(texts.iter().any(|t| t.contains("alice left")));
        assert!(texts.iter().any(|t| t.contains("bob is now drawing")));
        // The hint never flips the local drawing flag.
        assert!(!session.can_draw());
    }

    #[test]
    fn game_started_moves_waiting_to_playing() {
        let mut session = SessionState::new();
        session.apply(&ServerMessage::GameState {
            room: room(RoomStatus::Waiting, vec![player("alice", 0, true)]),
            is_drawer: false,
        });

        session.apply(&ServerMessage::GameStarted {
            current_round: 1,
            max_rounds: 3,
            drawer: Some("alice".into()),
        });
        assert_eq!(session.status(), RoomStatus::Playing);
        assert_eq!(session.seconds_left(), 60);
        assert!(session.chat().last().unwrap().text.contains("Game started"));
    }

    #[test]
    fn duplicate_game_started_is_ignored() {
        let mut session = playing_session(vec![player("alice", 0, true)]);
        let chat_len = session.chat().len();
        session.apply(&ServerMessage::GameStarted {
            current_round: 9,
            max_rounds: 9,
            drawer: None,
        });
        assert_eq!(session.chat().len(), chat_len);
        assert_eq!(session.room().unwrap().current_round, 1);
    }

    #[test]
    fn word_to_draw_enables_drawing() {
        let mut session = playing_session(vec![player("alice", 0, true)]);
        assert!(!session.can_draw());
        session.apply(&ServerMessage::WordToDraw {
            word: "penguin".into(),
        });
        assert_eq!(session.current_word(), Some("penguin"));
        assert!(session.can_draw());
    }

    #[test]
    fn player_guess_appends_without_touching_scores() {
        let mut session = playing_session(vec![player("alice", 3, true), player("bob", 2, false)]);
        session.apply(&ServerMessage::PlayerGuess {
            player: "bob".into(),
            guess: "cat".into(),
        });
        let entry = session.chat().last().unwrap();
        assert_eq!(entry.speaker, "bob");
        assert_eq!(entry.text, "cat");
        assert!(entry.is_guess);
        let players = &session.room().unwrap().players;
        assert_eq!(players[0].score, 3);
        assert_eq!(players[1].score, 2);
    }

    #[test]
    fn word_guessed_merges_scores_by_name() {
        let mut session = playing_session(vec![player("A", 3, true), player("B", 2, false)]);
        let mut scores = HashMap::new();
        scores.insert("A".to_string(), 5u32);
        session.apply(&ServerMessage::WordGuessed {
            player: "A".into(),
            word: "fish".into(),
            scores,
        });
        let players = &session.room().unwrap().players;
        assert_eq!(players[0].score, 5, "A updated from the map");
        assert_eq!(players[1].score, 2, "B absent from the map keeps prior score");
        assert!(session.chat().last().unwrap().text.contains("guessed the word: fish"));
    }

    #[test]
    fn new_round_clears_word_and_drawing_flag() {
        let mut session = playing_session(vec![player("alice", 0, true)]);
        session.apply(&ServerMessage::WordToDraw {
            word: "zebra".into(),
        });
        assert!(session.can_draw());

        session.apply(&ServerMessage::NewRound {
            round: 2,
            drawer: "bob".into(),
        });
        assert!(session.current_word().is_none());
        assert!(!session.can_draw());
        assert_eq!(session.seconds_left(), 60);
        assert_eq!(session.room().unwrap().current_round, 2);
    }

    #[test]
    fn new_round_before_playing_is_ignored() {
        let mut session = SessionState::new();
        session.apply(&ServerMessage::GameState {
            room: room(RoomStatus::Waiting, vec![]),
            is_drawer: false,
        });
        session.apply(&ServerMessage::NewRound {
            round: 2,
            drawer: "bob".into(),
        });
        assert_eq!(session.status(), RoomStatus::Waiting);
        assert_eq!(session.room().unwrap().current_round, 1);
    }

    #[test]
    fn game_over_is_terminal_until_resync() {
        let mut session = playing_session(vec![player("alice", 10, true)]);
        session.apply(&ServerMessage::GameOver {
            winner: "alice".into(),
            final_scores: HashMap::new(),
        });
        assert_eq!(session.status(), RoomStatus::Finished);
        assert!(session.current_word().is_none());
        assert!(!session.can_draw());

        // None of these gameplay transitions are accepted any more.
        session.apply(&ServerMessage::GameStarted {
            current_round: 1,
            max_rounds: 3,
            drawer: None,
        });
        session.apply(&ServerMessage::NewRound {
            round: 2,
            drawer: "bob".into(),
        });
        session.apply(&ServerMessage::WordToDraw {
            word: "igloo".into(),
        });
        assert_eq!(session.status(), RoomStatus::Finished);
        assert!(session.current_word().is_none());
        assert!(!session.can_draw());

        // A fresh resync reopens the session.
        session.apply(&ServerMessage::GameState {
            room: room(RoomStatus::Waiting, vec![]),
            is_drawer: false,
        });
        assert_eq!(session.status(), RoomStatus::Waiting);
    }

    #[test]
    fn game_over_merges_final_scores() {
        let mut session = playing_session(vec![player("A", 3, true), player("B", 2, false)]);
        let mut finals = HashMap::new();
        finals.insert("A".to_string(), 15u32);
        finals.insert("B".to_string(), 12u32);
        session.apply(&ServerMessage::GameOver {
            winner: "A".into(),
            final_scores: finals,
        });
        let players = &session.room().unwrap().players;
        assert_eq!(players[0].score, 15);
        assert_eq!(players[1].score, 12);
    }

    #[test]
    fn status_never_moves_backward_without_resync() {
        let mut session = playing_session(vec![player("alice", 0, true)]);
        session.apply(&ServerMessage::GameOver {
            winner: "alice".into(),
            final_scores: HashMap::new(),
        });
        assert_eq!(session.status(), RoomStatus::Finished);

        // Waiting can only be reached again through game_state.
        session.apply(&ServerMessage::GameStarted {
            current_round: 1,
            max_rounds: 3,
            drawer: None,
        });
        assert_eq!(session.status(), RoomStatus::Finished);
    }

    #[test]
    fn tick_counts_down_only_while_playing() {
        let mut session = SessionState::new();
        assert_eq!(session.tick(), None);

        let mut session = playing_session(vec![player("alice", 0, true)]);
        session.apply(&ServerMessage::NewRound {
            round: 2,
            drawer: "alice".into(),
        });
        assert_eq!(session.tick(), Some(59));
        assert_eq!(session.tick(), Some(58));
    }

    #[test]
    fn resync_replaces_the_revealed_word() {
        let mut session = playing_session(vec![player("alice", 0, true)]);
        session.apply(&ServerMessage::WordToDraw {
            word: "zebra".into(),
        });
        assert_eq!(session.current_word(), Some("zebra"));

        // Reconnect as a non-drawer: the snapshot carries no word, so the
        // stale reveal is dropped with the rest of the old state.
        session.apply(&ServerMessage::GameState {
            room: room(RoomStatus::Playing, vec![player("alice", 0, false)]),
            is_drawer: false,
        });
        assert!(session.current_word().is_none());

        // A drawer's own snapshot carries the word and restores it.
        let mut with_word = room(RoomStatus::Playing, vec![player("alice", 0, true)]);
        with_word.current_word = Some("zebra".into());
        session.apply(&ServerMessage::GameState {
            room: with_word,
            is_drawer: true,
        });
        assert_eq!(session.current_word(), Some("zebra"));
    }

    #[test]
    fn resync_restarts_the_countdown() {
        let mut session = playing_session(vec![player("alice", 0, true)]);
        for _ in 0..30 {
            session.tick();
        }
        assert_eq!(session.seconds_left(), 30);

        // Reconnect mid-round: the fresh snapshot restarts the countdown.
        session.apply(&ServerMessage::GameState {
            room: room(RoomStatus::Playing, vec![player("alice", 0, true)]),
            is_drawer: false,
        });
        assert_eq!(session.seconds_left(), 60);

        // A waiting-room snapshot parks it at zero.
        session.apply(&ServerMessage::GameState {
            room: room(RoomStatus::Waiting, vec![]),
            is_drawer: false,
        });
        assert_eq!(session.seconds_left(), 0);
    }

    #[test]
    fn tick_saturates_at_zero() {
        let mut session = playing_session(vec![player("alice", 0, true)]);
        for _ in 0..120 {
            session.tick();
        }
        assert_eq!(session.tick(), Some(0));
    }

    #[test]
    fn chat_log_preserves_arrival_order() {
        let mut session = playing_session(vec![]);
        session.apply(&ServerMessage::PlayerJoined {
            player: "carol".into(),
        });
        session.apply(&ServerMessage::PlayerGuess {
            player: "carol".into(),
            guess: "dog".into(),
        });
        session.apply(&ServerMessage::PlayerLeft {
            player: "carol".into(),
            new_drawer: None,
        });
        let texts: Vec<_> = session.chat().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["carol joined the room", "dog", "carol left the room"]);
    }
}
