//! Command line options
//!
//! ```text
//! stagenav <config.toml|config.json> [--latency-ms=N] [--empty-pop=error|ignore]
//!          [--fail=Scene,Scene] <command>...
//! ```
//!
//! `STAGENAV_EMPTY_POP` and `STAGENAV_LATENCY_MS` override the defaults;
//! flags override the environment.

use std::path::PathBuf;
use std::time::Duration;

use void_stage::EmptyPopPolicy;

use crate::command::Command;

/// Parsed options
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Stage configuration file
    pub config_path: PathBuf,
    /// Simulated per-request latency
    pub latency: Duration,
    /// Empty-history pop behaviour
    pub empty_pop: EmptyPopPolicy,
    /// Scenes whose requests fail
    pub failing: Vec<String>,
    /// Commands to run in order
    pub commands: Vec<Command>,
}

impl Options {
    /// Parse process arguments and environment
    pub fn from_env() -> Result<Self, String> {
        let mut options = Self::parse(std::env::args().skip(1))?;

        if let Ok(policy) = std::env::var("STAGENAV_EMPTY_POP") {
            if !std::env::args().any(|a| a.starts_with("--empty-pop=")) {
                options.empty_pop = parse_policy(&policy)?;
            }
        }
        if let Ok(latency) = std::env::var("STAGENAV_LATENCY_MS") {
            if !std::env::args().any(|a| a.starts_with("--latency-ms=")) {
                options.latency = parse_latency(&latency)?;
            }
        }

        Ok(options)
    }

    /// Parse arguments (program name excluded)
    pub fn parse<I, S>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config_path = None;
        let mut latency = Duration::from_millis(50);
        let mut empty_pop = EmptyPopPolicy::Error;
        let mut failing = Vec::new();
        let mut commands = Vec::new();

        for arg in args {
            let arg = arg.as_ref();
            if let Some(value) = arg.strip_prefix("--latency-ms=") {
                latency = parse_latency(value)?;
            } else if let Some(value) = arg.strip_prefix("--empty-pop=") {
                empty_pop = parse_policy(value)?;
            } else if let Some(value) = arg.strip_prefix("--fail=") {
                failing.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from),
                );
            } else if arg.starts_with("--") {
                return Err(format!("Unknown flag: {}", arg));
            } else if config_path.is_none() {
                // First positional argument is the config file
                config_path = Some(PathBuf::from(arg));
            } else {
                commands.push(arg.parse()?);
            }
        }

        Ok(Self {
            config_path: config_path.ok_or_else(|| "Missing config path".to_string())?,
            latency,
            empty_pop,
            failing,
            commands,
        })
    }
}

fn parse_latency(value: &str) -> Result<Duration, String> {
    value
        .trim()
        .parse()
        .map(Duration::from_millis)
        .map_err(|_| format!("Invalid latency: {}", value))
}

fn parse_policy(value: &str) -> Result<EmptyPopPolicy, String> {
    match value.trim().to_lowercase().as_str() {
        "error" | "fail" => Ok(EmptyPopPolicy::Error),
        "ignore" | "noop" => Ok(EmptyPopPolicy::Ignore),
        _ => Err(format!("Unknown empty-pop policy: {}", value)),
    }
}

/// Usage text
pub fn usage() -> &'static str {
    "usage: stagenav <config.toml|config.json> [--latency-ms=N] [--empty-pop=error|ignore] \
     [--fail=Scene,...] <replace:Place|push:Place|pop|reset>..."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let options = Options::parse([
            "stages.toml",
            "--latency-ms=5",
            "--empty-pop=ignore",
            "--fail=Chat, Lobby",
            "push:Title",
            "pop",
        ])
        .unwrap();

        assert_eq!(options.config_path, PathBuf::from("stages.toml"));
        assert_eq!(options.latency, Duration::from_millis(5));
        assert_eq!(options.empty_pop, EmptyPopPolicy::Ignore);
        assert_eq!(options.failing, vec!["Chat".to_string(), "Lobby".to_string()]);
        assert_eq!(
            options.commands,
            vec![Command::Push("Title".to_string()), Command::Pop]
        );
    }

    #[test]
    fn test_defaults() {
        let options = Options::parse(["stages.json"]).unwrap();
        assert_eq!(options.latency, Duration::from_millis(50));
        assert_eq!(options.empty_pop, EmptyPopPolicy::Error);
        assert!(options.commands.is_empty());
    }

    #[test]
    fn test_errors() {
        assert!(Options::parse(Vec::<String>::new()).is_err());
        assert!(Options::parse(["stages.toml", "--verbose"]).is_err());
        assert!(Options::parse(["stages.toml", "--latency-ms=soon"]).is_err());
        assert!(Options::parse(["stages.toml", "--empty-pop=maybe"]).is_err());
        assert!(Options::parse(["stages.toml", "jump:Title"]).is_err());
    }
}
