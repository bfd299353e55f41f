//! Power actions that can be requested on an instance

use serde::{Deserialize, Serialize};

/// State-changing action on an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerAction {
    /// Power the instance on
    Start,
    /// Power the instance off
    Stop,
}

impl PowerAction {
    /// "started" / "stopped"
    pub fn past_tense(&self) -> &'static str {
        match self {
            PowerAction::Start => "started",
            PowerAction::Stop => "stopped",
        }
    }

    /// "starting" / "stopping"
    pub fn progressive(&self) -> &'static str {
        match self {
            PowerAction::Start => "starting",
            PowerAction::Stop => "stopping",
        }
    }
}

impl std::fmt::Display for PowerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PowerAction::Start => write!(f, "start"),
            PowerAction::Stop => write!(f, "stop"),
        }
    }
}
