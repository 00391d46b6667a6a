//! The chat transport contract.
//!
//! The game core never touches sockets or markup. A transport feeds
//! [`IncomingMessage`] values into the server's channel and renders the
//! [`OutgoingTurn`] values that come back; how buttons and emphasis look is
//! entirely its business. Wiring is plain tokio mpsc channels.

use tokio::sync::mpsc;

pub mod console;

/// Opaque handle for where a reply should go; round-trips untouched through
/// the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRef(pub String);

/// One message from a player.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub chat: ChatRef,
    /// Stable player identifier; keys all persisted state.
    pub player_id: String,
    /// Profile names the transport knows, offered as buttons when the game
    /// asks the player for a name.
    pub profile_names: Vec<String>,
    pub text: String,
}

/// One reply: narrative text plus the next menu of buttons. An empty menu
/// means "keep whatever menu you had".
#[derive(Debug, Clone)]
pub struct OutgoingTurn {
    pub chat: ChatRef,
    pub text: String,
    pub menu: Vec<String>,
}

/// The transport-facing ends of the server's channels.
pub struct TransportHandles {
    pub incoming: mpsc::UnboundedSender<IncomingMessage>,
    pub outgoing: mpsc::UnboundedReceiver<OutgoingTurn>,
}
