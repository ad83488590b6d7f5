//! Command-based control for remote command handlers.

use crate::types::{Direction, SequenceConfig};

/// Actions a remote handler can request from the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StairAction {
    /// Start a sequence walking in this direction. Ignored while one runs.
    Start(Direction),
    /// Abort the running sequence and turn every step off.
    Stop,
    /// Replace the configuration. Only accepted while idle.
    Configure(SequenceConfig),
}

impl StairAction {
    /// Parses the short textual commands used on remote command topics:
    /// `up`, `down`, `stop`.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "up" | "ascend" => Some(StairAction::Start(Direction::Ascending)),
            "down" | "descend" => Some(StairAction::Start(Direction::Descending)),
            "stop" | "off" => Some(StairAction::Stop),
            _ => None,
        }
    }
}
