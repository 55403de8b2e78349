//! Navigation commands
//!
//! Command line syntax: `replace:<place>`, `push:<place>`, `pop`, `reset`.

use std::fmt;

/// One navigator operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Replace(String),
    Push(String),
    Pop,
    Reset,
}

impl std::str::FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (verb, place) = match s.split_once(':') {
            Some((verb, place)) => (verb, Some(place.trim())),
            None => (s, None),
        };

        match (verb.trim().to_lowercase().as_str(), place) {
            ("replace" | "goto", Some(place)) if !place.is_empty() => {
                Ok(Self::Replace(place.to_string()))
            }
            ("push", Some(place)) if !place.is_empty() => Ok(Self::Push(place.to_string())),
            ("pop" | "back", None) => Ok(Self::Pop),
            ("reset", None) => Ok(Self::Reset),
            ("replace" | "goto" | "push", _) => Err(format!("Missing place in command: {}", s)),
            _ => Err(format!("Unknown command: {}", s)),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Replace(place) => write!(f, "replace:{}", place),
            Command::Push(place) => write!(f, "push:{}", place),
            Command::Pop => write!(f, "pop"),
            Command::Reset => write!(f, "reset"),
        }
    }
}
