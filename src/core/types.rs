//! Shared vocabulary: endpoint direction, default-device role, flag class

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which class of endpoint a command applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Capture endpoints (microphones, line-in)
    Input,
    /// Render endpoints (speakers, headphones)
    Output,
}

impl Direction {
    /// Render first, then capture
    pub const ALL: [Direction; 2] = [Direction::Output, Direction::Input];

    /// Word used for this direction in operator-facing confirmations
    pub fn noun(self) -> &'static str {
        match self {
            Direction::Input => "recording",
            Direction::Output => "playback",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

/// One of the two independent default-device slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// General purpose (games, system sounds, media)
    Console,
    /// Voice chat and telephony
    Communications,
}

impl Role {
    /// Fan-out order for a command that names no role
    pub const ALL: [Role; 2] = [Role::Console, Role::Communications];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Console => write!(f, "console"),
            Role::Communications => write!(f, "communications"),
        }
    }
}

/// Flag class of a command field, reported when one is given twice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Direction,
    Role,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Direction => write!(f, "direction"),
            Field::Role => write!(f, "role"),
        }
    }
}
