//! Token classification for the command-line grammar
//!
//! Flags are matched exactly and case-sensitively. Anything that is not a
//! known flag is a device-name pattern, including dash-prefixed words the
//! grammar does not know.

use crate::core::types::{Direction, Role};

pub const FLAG_INPUT: &str = "-in";
pub const FLAG_OUTPUT: &str = "-out";
pub const FLAG_CONSOLE: &str = "-cons";
pub const FLAG_COMMUNICATIONS: &str = "-comm";
pub const FLAG_LIST: &str = "-list";

/// One symbol of the command grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Direction(Direction),
    Role(Role),
    /// Substring to look for in device names
    Pattern(String),
}

impl Token {
    pub fn classify(raw: &str) -> Token {
        match raw {
            FLAG_INPUT => Token::Direction(Direction::Input),
            FLAG_OUTPUT => Token::Direction(Direction::Output),
            FLAG_CONSOLE => Token::Role(Role::Console),
            FLAG_COMMUNICATIONS => Token::Role(Role::Communications),
            _ => Token::Pattern(raw.to_string()),
        }
    }
}

/// A command-line argument: a grammar token, or the `-list` bypass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    List,
    Token(Token),
}

impl Arg {
    pub fn classify(raw: &str) -> Arg {
        if raw == FLAG_LIST {
            Arg::List
        } else {
            Arg::Token(Token::classify(raw))
        }
    }
}
