//! Transport abstraction for the Sketch Party game protocol.
//!
//! The [`Transport`] trait defines a bidirectional text message channel
//! between the client and the game server. The protocol uses JSON text
//! frames, so every transport implementation must handle message framing
//! internally (e.g., WebSocket frames, length-prefixed TCP).
//!
//! The [`Connector`] trait is the factory half: the reconnection
//! supervisor asks it for a fresh connected [`Transport`] for a given
//! [`SessionIdentity`](crate::protocol::SessionIdentity) — once at session
//! start, and again after every abnormal close, with the identical
//! identity each time.
//!
//! # Implementing a Custom Transport
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use sketchparty_client::error::SketchPartyError;
//! use sketchparty_client::transport::Transport;
//!
//! struct MyTransport { /* ... */ }
//!
//! #[async_trait]
//! impl Transport for MyTransport {
//!     async fn send(&mut self, message: String) -> Result<(), SketchPartyError> {
//!         // Send the JSON text frame over your transport
//!         todo!()
//!     }
//!
//!     async fn recv(&mut self) -> Option<Result<String, SketchPartyError>> {
//!         // Receive the next JSON text frame
//!         // Return None when the connection is closed cleanly
//!         todo!()
//!     }
//!
//!     async fn close(&mut self) -> Result<(), SketchPartyError> {
//!         // Gracefully shut down the connection
//!         todo!()
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::SketchPartyError;
use crate::protocol::SessionIdentity;

/// A bidirectional text message transport for one game connection.
///
/// Implementors shuttle serialized JSON strings between the client and the
/// server. Each call to [`send`](Transport::send) transmits one complete
/// frame; each call to [`recv`](Transport::recv) returns one complete frame.
///
/// # Cancel Safety
///
/// The [`recv`](Transport::recv) method **MUST** be cancel-safe because it
/// is used inside `tokio::select!`. If `recv` is cancelled before
/// completion, calling it again must not lose data. Channel-based
/// implementations (e.g., wrapping `mpsc::Receiver`) are naturally
/// cancel-safe.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Send a JSON text frame to the server.
    ///
    /// # Errors
    ///
    /// Returns [`SketchPartyError::TransportSend`] if the frame could not be
    /// sent (e.g., connection broken, write buffer full).
    async fn send(&mut self, message: String) -> Result<(), SketchPartyError>;

    /// Receive the next JSON text frame from the server.
    ///
    /// Returns:
    /// - `Some(Ok(text))` — a complete frame was received
    /// - `Some(Err(e))` — a transport error occurred
    /// - `None` — the connection was closed cleanly by the server
    ///
    /// # Cancel Safety
    ///
    /// This method **MUST** be cancel-safe (see [trait documentation](Transport)).
    async fn recv(&mut self) -> Option<Result<String, SketchPartyError>>;

    /// Close the transport connection gracefully.
    ///
    /// After calling this method, subsequent calls to [`send`](Transport::send)
    /// and [`recv`](Transport::recv) may return errors or `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the graceful shutdown fails. Implementations
    /// should still release resources even if the close handshake fails.
    async fn close(&mut self) -> Result<(), SketchPartyError>;
}

/// Factory for connections to one session endpoint.
///
/// The supervisor holds exactly one connector for the lifetime of a
/// session and calls [`connect`](Connector::connect) sequentially, so at
/// most one transport produced by it is ever live.
#[async_trait]
pub trait Connector: Send + 'static {
    /// The transport type this connector produces.
    type Transport: Transport;

    /// Establish a new connection for the given session identity.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection cannot be established; the
    /// supervisor treats this as recoverable and retries after its fixed
    /// delay.
    async fn connect(
        &mut self,
        identity: &SessionIdentity,
    ) -> Result<Self::Transport, SketchPartyError>;
}
