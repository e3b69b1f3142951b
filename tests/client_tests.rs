//! End-to-end client tests over a scripted in-memory transport.

mod common;

use std::time::Duration;

use sketchparty_client::{
    RoomStatus, SessionIdentity, SketchPartyClient, SketchPartyConfig, SketchPartyEvent,
};

use common::{
    draw_data_frame, frame, game_state_frame, player_guess_frame, word_to_draw_frame,
    ScriptedConnector,
};

fn identity() -> SessionIdentity {
    SessionIdentity::new("room_1", "p1")
}

fn fast_config() -> SketchPartyConfig {
    SketchPartyConfig::new().with_reconnect_delay(Duration::from_millis(20))
}

async fn next_matching<F>(
    events: &mut tokio::sync::mpsc::Receiver<SketchPartyEvent>,
    mut pred: F,
) -> SketchPartyEvent
where
    F: FnMut(&SketchPartyEvent) -> bool,
{
    loop {
        let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed");
        if pred(&event) {
            return event;
        }
    }
}

#[tokio::test]
async fn full_round_lifecycle() {
    let (connector, _probe) = ScriptedConnector::new(vec![vec![
        game_state_frame(false),
        frame(r#"{"type":"game_started","current_round":1,"max_rounds":3,"drawer":"alice"}"#),
        word_to_draw_frame("zebra"),
        player_guess_frame("bob", "horse"),
        frame(r#"{"type":"word_guessed","player":"bob","word":"zebra","scores":{"bob":10}}"#),
        frame(r#"{"type":"new_round","round":2,"drawer":"bob"}"#),
        frame(r#"{"type":"game_over","winner":"bob","final_scores":{"alice":5,"bob":22}}"#),
    ]]);
    let (mut client, mut events) = SketchPartyClient::start(connector, identity(), fast_config());

    next_matching(&mut events, |e| matches!(e, SketchPartyEvent::Connected)).await;
    next_matching(&mut events, |e| matches!(e, SketchPartyEvent::StateSynced)).await;

    let started = next_matching(&mut events, |e| {
        matches!(e, SketchPartyEvent::GameStarted { .. })
    })
    .await;
    if let SketchPartyEvent::GameStarted {
        current_round,
        max_rounds,
        drawer,
    } = started
    {
        assert_eq!((current_round, max_rounds), (1, 3));
        assert_eq!(drawer.as_deref(), Some("alice"));
    }

    let word = next_matching(&mut events, |e| {
        matches!(e, SketchPartyEvent::WordAssigned { .. })
    })
    .await;
    assert!(matches!(word, SketchPartyEvent::WordAssigned { word } if word == "zebra"));

    let guess = next_matching(&mut events, |e| {
        matches!(e, SketchPartyEvent::GuessReceived { .. })
    })
    .await;
    if let SketchPartyEvent::GuessReceived { player, guess } = guess {
        assert_eq!((player.as_str(), guess.as_str()), ("bob", "horse"));
    }

    next_matching(&mut events, |e| {
        matches!(e, SketchPartyEvent::WordGuessed { .. })
    })
    .await;
    next_matching(&mut events, |e| {
        matches!(e, SketchPartyEvent::NewRound { round: 2, .. })
    })
    .await;

    let over = next_matching(&mut events, |e| {
        matches!(e, SketchPartyEvent::GameOver { .. })
    })
    .await;
    if let SketchPartyEvent::GameOver {
        winner,
        final_scores,
    } = over
    {
        assert_eq!(winner, "bob");
        assert_eq!(final_scores.get("bob"), Some(&22));
    }

    let room = client.room().await.expect("room snapshot");
    assert_eq!(room.status, RoomStatus::Finished);
    assert!(!client.is_drawer());

    client.shutdown().await;
}

#[tokio::test]
async fn chat_log_collects_guesses_and_system_lines() {
    let (connector, _probe) = ScriptedConnector::new(vec![vec![
        frame(r#"{"type":"player_joined","player":"carol"}"#),
        player_guess_frame("carol", "dog"),
        player_guess_frame("carol", "wolf"),
        frame(r#"{"type":"player_left","player":"carol"}"#),
    ]]);
    let (mut client, mut events) = SketchPartyClient::start(connector, identity(), fast_config());

    next_matching(&mut events, |e| {
        matches!(e, SketchPartyEvent::PlayerLeft { .. })
    })
    .await;

    let log = client.chat_log().await;
    assert_eq!(log.len(), 4);
    assert!(!log[0].is_guess, "join line is a system entry");
    assert!(log[1].is_guess);
    assert_eq!(log[1].speaker, "carol");
    assert_eq!(log[1].text, "dog");
    assert!(log[2].is_guess);
    assert!(!log[3].is_guess, "leave line is a system entry");

    client.shutdown().await;
}

#[tokio::test]
async fn reconnect_resyncs_state_from_fresh_snapshot() {
    // First connection: playing as drawer, then the server closes.
    // Second connection: fresh snapshot where we are no longer the drawer.
    let (connector, probe) = ScriptedConnector::new(vec![
        vec![
            game_state_frame(true),
            word_to_draw_frame("apple"),
            None, // server closes
        ],
        vec![game_state_frame(false)],
    ]);
    let (mut client, mut events) = SketchPartyClient::start(connector, identity(), fast_config());

    next_matching(&mut events, |e| {
        matches!(e, SketchPartyEvent::WordAssigned { .. })
    })
    .await;
    assert!(client.is_drawer());

    next_matching(&mut events, |e| {
        matches!(e, SketchPartyEvent::Disconnected { .. })
    })
    .await;
    next_matching(&mut events, |e| {
        matches!(e, SketchPartyEvent::Reconnecting { .. })
    })
    .await;
    next_matching(&mut events, |e| matches!(e, SketchPartyEvent::Connected)).await;
    next_matching(&mut events, |e| matches!(e, SketchPartyEvent::StateSynced)).await;

    // The fresh snapshot wholesale-replaces the stale drawer state,
    // including the previously revealed word.
    assert!(!client.is_drawer());
    assert!(client.current_word().await.is_none());
    assert_eq!(probe.connect_count(), 2);
    {
        let identities = probe.identities.lock().unwrap();
        assert_eq!(identities[0], identities[1]);
    }

    client.shutdown().await;
}

#[tokio::test]
async fn failed_connect_attempts_retry_until_success() {
    use sketchparty_client::SketchPartyError;

    // `ScriptedConnector` cannot fail a connect, so script a transport
    // whose first recv errors immediately — the supervisor path is the
    // same fixed-delay retry loop either way.
    let (connector, probe) = ScriptedConnector::new(vec![
        vec![Some(Err(SketchPartyError::TransportReceive(
            "refused".into(),
        )))],
        vec![Some(Err(SketchPartyError::TransportReceive(
            "refused".into(),
        )))],
        vec![game_state_frame(false)],
    ]);
    let (mut client, mut events) = SketchPartyClient::start(connector, identity(), fast_config());

    next_matching(&mut events, |e| matches!(e, SketchPartyEvent::StateSynced)).await;

    assert_eq!(probe.connect_count(), 3);
    assert!(client.is_connected());

    client.shutdown().await;
}

#[tokio::test]
async fn outgoing_frames_match_server_wire_format() {
    let (connector, probe) = ScriptedConnector::new(vec![vec![
        game_state_frame(false),
        word_to_draw_frame("kite"),
    ]]);
    let (mut client, mut events) = SketchPartyClient::start(connector, identity(), fast_config());

    next_matching(&mut events, |e| {
        matches!(e, SketchPartyEvent::WordAssigned { .. })
    })
    .await;

    client.guess("balloon").unwrap();
    client.clear_canvas().unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let sent = probe.sent_frames();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], r#"{"type":"guess","guess":"balloon"}"#);
    assert_eq!(sent[1], r#"{"type":"clear_canvas"}"#);

    client.shutdown().await;
}

#[tokio::test]
async fn inbound_draw_stream_surfaces_as_stroke_events() {
    let (connector, _probe) = ScriptedConnector::new(vec![vec![
        draw_data_frame(),
        frame(r#"{"type":"clear_canvas"}"#),
    ]]);
    let (mut client, mut events) = SketchPartyClient::start(connector, identity(), fast_config());

    let stroke = next_matching(&mut events, |e| matches!(e, SketchPartyEvent::Stroke(_))).await;
    if let SketchPartyEvent::Stroke(segment) = stroke {
        assert_eq!(segment.prev_x, 1.0);
        assert_eq!(segment.curr_y, 4.0);
        assert_eq!(segment.color, "#ff0000");
    }
    next_matching(&mut events, |e| {
        matches!(e, SketchPartyEvent::CanvasCleared)
    })
    .await;

    client.shutdown().await;
}

#[tokio::test]
async fn noise_between_valid_frames_is_tolerated() {
    let (connector, _probe) = ScriptedConnector::new(vec![vec![
        frame("garbage"),
        frame(r#"{"type":"future_feature","v":2}"#),
        frame(r#"{"type":"player_joined"}"#), // known tag, missing field
        game_state_frame(false),
    ]]);
    let (mut client, mut events) = SketchPartyClient::start(connector, identity(), fast_config());

    next_matching(&mut events, |e| matches!(e, SketchPartyEvent::StateSynced)).await;
    assert!(client.room().await.is_some());

    client.shutdown().await;
}

#[tokio::test]
async fn shutdown_closes_transport_and_ends_event_stream() {
    let (connector, probe) = ScriptedConnector::new(vec![vec![]]);
    let (mut client, mut events) = SketchPartyClient::start(connector, identity(), fast_config());

    next_matching(&mut events, |e| matches!(e, SketchPartyEvent::Connected)).await;
    client.shutdown().await;

    next_matching(&mut events, |e| {
        matches!(e, SketchPartyEvent::Disconnected { .. })
    })
    .await;
    assert!(probe.closed.load(std::sync::atomic::Ordering::Relaxed));

    // After the loop exits, the channel drains to None.
    assert!(events.recv().await.is_none());
}
