//! Wire-format tests against literal server JSON.
//!
//! These frames are copied verbatim from server traffic; if a test here
//! breaks, the crate no longer speaks the same dialect as the server.

use std::collections::HashMap;

use sketchparty_client::protocol::{
    ClientMessage, Player, RoomStatus, ServerMessage, SessionIdentity, StrokeSegment,
};

// ── Client → server ─────────────────────────────────────────────────

#[test]
fn guess_encodes_with_flat_payload() {
    let msg = ClientMessage::Guess {
        guess: "penguin".into(),
    };
    let json = serde_json::to_string(&msg).unwrap();
    assert_eq!(json, r#"{"type":"guess","guess":"penguin"}"#);
}

#[test]
fn draw_encodes_segment_under_data_key() {
    let msg = ClientMessage::Draw {
        data: StrokeSegment {
            prev_x: 1.0,
            prev_y: 2.0,
            curr_x: 3.0,
            curr_y: 4.0,
            color: "#ff0000".into(),
            size: 5.0,
        },
    };
    let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["type"], "draw");
    // Segment coordinates are camelCase on the wire.
    assert_eq!(json["data"]["prevX"], 1.0);
    assert_eq!(json["data"]["prevY"], 2.0);
    assert_eq!(json["data"]["currX"], 3.0);
    assert_eq!(json["data"]["currY"], 4.0);
    assert_eq!(json["data"]["color"], "#ff0000");
    assert_eq!(json["data"]["size"], 5.0);
}

#[test]
fn clear_canvas_encodes_as_bare_tag() {
    let json = serde_json::to_string(&ClientMessage::ClearCanvas).unwrap();
    assert_eq!(json, r#"{"type":"clear_canvas"}"#);
}

// ── Server → client ─────────────────────────────────────────────────

#[test]
fn game_state_decodes_room_snapshot() {
    let json = r#"{
        "type": "game_state",
        "room": {
            "id": "abc123",
            "name": "friday night",
            "players": [
                {"id": "p1", "name": "alice", "score": 30, "is_drawing": true},
                {"id": "p2", "name": "bob", "score": 10, "is_drawing": false}
            ],
            "round_time": 60,
            "max_rounds": 3,
            "current_round": 2,
            "status": "playing"
        },
        "is_drawer": true
    }"#;

    let msg: ServerMessage = serde_json::from_str(json).unwrap();
    match msg {
        ServerMessage::GameState { room, is_drawer } => {
            assert!(is_drawer);
            assert_eq!(room.id, "abc123");
            assert_eq!(room.status, RoomStatus::Playing);
            assert_eq!(room.current_round, 2);
            assert_eq!(room.players.len(), 2);
            assert_eq!(room.players[0].name, "alice");
            assert!(room.players[0].is_drawing);
            assert!(room.current_word.is_none());
        }
        other => panic!("expected GameState, got {other:?}"),
    }
}

#[test]
fn player_joined_and_left_decode() {
    let joined: ServerMessage =
        serde_json::from_str(r#"{"type":"player_joined","player":"carol"}"#).unwrap();
    assert_eq!(
        joined,
        ServerMessage::PlayerJoined {
            player: "carol".into()
        }
    );

    // `new_drawer` is optional: the server omits it when the leaver was
    // not the drawer.
    let left: ServerMessage =
        serde_json::from_str(r#"{"type":"player_left","player":"carol"}"#).unwrap();
    assert_eq!(
        left,
        ServerMessage::PlayerLeft {
            player: "carol".into(),
            new_drawer: None
        }
    );

    let left_with_drawer: ServerMessage = serde_json::from_str(
        r#"{"type":"player_left","player":"alice","new_drawer":"bob"}"#,
    )
    .unwrap();
    assert_eq!(
        left_with_drawer,
        ServerMessage::PlayerLeft {
            player: "alice".into(),
            new_drawer: Some("bob".into())
        }
    );
}

#[test]
fn game_started_decodes_with_and_without_drawer() {
    let msg: ServerMessage = serde_json::from_str(
        r#"{"type":"game_started","current_round":1,"max_rounds":3,"drawer":"alice"}"#,
    )
    .unwrap();
    assert_eq!(
        msg,
        ServerMessage::GameStarted {
            current_round: 1,
            max_rounds: 3,
            drawer: Some("alice".into())
        }
    );

    let msg: ServerMessage =
        serde_json::from_str(r#"{"type":"game_started","current_round":1,"max_rounds":3}"#)
            .unwrap();
    assert!(matches!(
        msg,
        ServerMessage::GameStarted { drawer: None, .. }
    ));
}

#[test]
fn word_guessed_carries_score_table() {
    let msg: ServerMessage = serde_json::from_str(
        r#"{"type":"word_guessed","player":"bob","word":"zebra","scores":{"alice":5,"bob":12}}"#,
    )
    .unwrap();
    match msg {
        ServerMessage::WordGuessed {
            player,
            word,
            scores,
        } => {
            assert_eq!(player, "bob");
            assert_eq!(word, "zebra");
            assert_eq!(scores.get("bob"), Some(&12));
            assert_eq!(scores.get("alice"), Some(&5));
        }
        other => panic!("expected WordGuessed, got {other:?}"),
    }
}

#[test]
fn game_over_final_scores_default_to_empty() {
    let msg: ServerMessage = serde_json::from_str(
        r#"{"type":"game_over","winner":"alice","final_scores":{"alice":42,"bob":17}}"#,
    )
    .unwrap();
    match &msg {
        ServerMessage::GameOver {
            winner,
            final_scores,
        } => {
            assert_eq!(winner, "alice");
            assert_eq!(final_scores.get("alice"), Some(&42));
        }
        other => panic!("expected GameOver, got {other:?}"),
    }

    let bare: ServerMessage =
        serde_json::from_str(r#"{"type":"game_over","winner":"alice"}"#).unwrap();
    assert_eq!(
        bare,
        ServerMessage::GameOver {
            winner: "alice".into(),
            final_scores: HashMap::new()
        }
    );
}

#[test]
fn draw_data_decodes_camel_case_segment() {
    let msg: ServerMessage = serde_json::from_str(
        r##"{"type":"draw_data","data":{"prevX":10.5,"prevY":20.0,"currX":11.0,"currY":21.5,"color":"#000000","size":5.0}}"##,
    )
    .unwrap();
    match msg {
        ServerMessage::DrawData { data } => {
            assert_eq!(data.prev_x, 10.5);
            assert_eq!(data.curr_y, 21.5);
            assert_eq!(data.color, "#000000");
        }
        other => panic!("expected DrawData, got {other:?}"),
    }
}

#[test]
fn unknown_type_decodes_to_unknown_variant() {
    let msg: ServerMessage =
        serde_json::from_str(r#"{"type":"spectator_count","count":7}"#).unwrap();
    assert_eq!(msg, ServerMessage::Unknown);
}

#[test]
fn malformed_frames_fail_to_decode() {
    assert!(serde_json::from_str::<ServerMessage>("not json at all").is_err());
    assert!(serde_json::from_str::<ServerMessage>(r#"{"no_type_field":1}"#).is_err());
    assert!(serde_json::from_str::<ServerMessage>(r#"{"type":42}"#).is_err());
    // Known tag with a missing required field is malformed too.
    assert!(serde_json::from_str::<ServerMessage>(r#"{"type":"word_to_draw"}"#).is_err());
}

#[test]
fn room_status_decodes_lowercase() {
    let player: Player =
        serde_json::from_str(r#"{"id":"p1","name":"alice","score":0,"is_drawing":false}"#)
            .unwrap();
    assert_eq!(player.score, 0);

    for (text, status) in [
        ("\"waiting\"", RoomStatus::Waiting),
        ("\"playing\"", RoomStatus::Playing),
        ("\"finished\"", RoomStatus::Finished),
    ] {
        let decoded: RoomStatus = serde_json::from_str(text).unwrap();
        assert_eq!(decoded, status);
    }
}

#[test]
fn session_identity_holds_room_and_player() {
    let identity = SessionIdentity::new("room_1", "player_9");
    assert_eq!(identity.room_id, "room_1");
    assert_eq!(identity.player_id, "player_9");
    assert_eq!(identity, identity.clone());
}
