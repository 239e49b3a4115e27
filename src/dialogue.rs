//! Conversation state for routing a user's next free-text message.

use crate::pricing::CalcMode;
use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

/// Pending admin console input
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminTask {
    /// Next message is the text to broadcast to every user
    Broadcast,
    /// Next message is the track code to delete
    DeleteTrack,
}

/// Per-chat conversation state.
///
/// One tagged variant per pending input kind, so a chat can never be waiting
/// for a track number and a calculator value at the same time. Held in memory
/// only; a restart drops everyone back to `Idle`, which is acceptable for
/// this bot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ChatState {
    #[default]
    Idle,
    /// The next message holds newline-separated track codes to look up
    AwaitingTrackCodes,
    /// The next message holds a weight or volume to price
    Calculating { mode: CalcMode },
    /// The next message completes an admin console action
    AdminPrompt { task: AdminTask },
}

/// Type alias for our per-chat dialogue
pub type ChatDialogue = Dialogue<ChatState, InMemStorage<ChatState>>;
