//! Shared test helpers: a scriptable in-memory transport and JSON frame
//! builders matching the server's wire format.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use sketchparty_client::error::SketchPartyError;
use sketchparty_client::protocol::SessionIdentity;
use sketchparty_client::transport::{Connector, Transport};

/// One scripted `recv()` outcome: a frame, an error, or (`None`) a clean close.
pub type ScriptedFrame = Option<Result<String, SketchPartyError>>;

/// In-memory transport that records sent frames and replays a script.
///
/// When the script runs out, `recv()` pends forever so the connection
/// stays open until the client shuts down.
pub struct ScriptedTransport {
    incoming: VecDeque<ScriptedFrame>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&mut self, message: String) -> Result<(), SketchPartyError> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(SketchPartyError::TransportClosed);
        }
        self.sent
            .lock()
            .expect("sent mutex poisoned")
            .push(message);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, SketchPartyError>> {
        match self.incoming.pop_front() {
            Some(frame) => frame,
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<(), SketchPartyError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

/// Handles to observe a [`ScriptedConnector`] from the test body.
pub struct ConnectorProbe {
    /// Every identity `connect()` was called with, in order.
    pub identities: Arc<Mutex<Vec<SessionIdentity>>>,
    /// Every frame sent over any minted transport, in order.
    pub sent: Arc<Mutex<Vec<String>>>,
    /// Set once any minted transport has been closed.
    pub closed: Arc<AtomicBool>,
}

impl ConnectorProbe {
    pub fn connect_count(&self) -> usize {
        self.identities.lock().expect("identities mutex poisoned").len()
    }

    pub fn sent_frames(&self) -> Vec<String> {
        self.sent.lock().expect("sent mutex poisoned").clone()
    }
}

/// Connector that mints one [`ScriptedTransport`] per scripted connection.
///
/// When the scripts run out, `connect()` pends forever, parking the
/// reconnection supervisor until shutdown.
pub struct ScriptedConnector {
    scripts: VecDeque<Vec<ScriptedFrame>>,
    identities: Arc<Mutex<Vec<SessionIdentity>>>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl ScriptedConnector {
    pub fn new(scripts: Vec<Vec<ScriptedFrame>>) -> (Self, ConnectorProbe) {
        let identities = Arc::new(Mutex::new(Vec::new()));
        let sent = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let probe = ConnectorProbe {
            identities: Arc::clone(&identities),
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        };
        let connector = Self {
            scripts: VecDeque::from(scripts),
            identities,
            sent,
            closed,
        };
        (connector, probe)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Transport = ScriptedTransport;

    async fn connect(
        &mut self,
        identity: &SessionIdentity,
    ) -> Result<Self::Transport, SketchPartyError> {
        self.identities
            .lock()
            .expect("identities mutex poisoned")
            .push(identity.clone());
        match self.scripts.pop_front() {
            Some(incoming) => Ok(ScriptedTransport {
                incoming: VecDeque::from(incoming),
                sent: Arc::clone(&self.sent),
                closed: Arc::clone(&self.closed),
            }),
            None => std::future::pending().await,
        }
    }
}

// ── JSON frame builders (server wire format, verbatim) ──────────────

pub fn frame(json: &str) -> ScriptedFrame {
    Some(Ok(json.to_string()))
}

pub fn game_state_frame(is_drawer: bool) -> ScriptedFrame {
    frame(&format!(
        r#"{{"type":"game_state","room":{{"id":"room_1","name":"friday night","players":[{{"id":"p1","name":"alice","score":0,"is_drawing":{is_drawer}}},{{"id":"p2","name":"bob","score":0,"is_drawing":false}}],"round_time":60,"max_rounds":3,"current_round":1,"status":"playing"}},"is_drawer":{is_drawer}}}"#
    ))
}

pub fn word_to_draw_frame(word: &str) -> ScriptedFrame {
    frame(&format!(r#"{{"type":"word_to_draw","word":"{word}"}}"#))
}

pub fn player_guess_frame(player: &str, guess: &str) -> ScriptedFrame {
    frame(&format!(
        r#"{{"type":"player_guess","player":"{player}","guess":"{guess}"}}"#
    ))
}

pub fn draw_data_frame() -> ScriptedFrame {
    frame(
        r##"{"type":"draw_data","data":{"prevX":1.0,"prevY":2.0,"currX":3.0,"currY":4.0,"color":"#ff0000","size":5.0}}"##,
    )
}
