/// Operator commands: single keystrokes for the interactive session and
/// `on`/`off` words for one-shot use.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::LedError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    TurnOn,
    TurnOff,
    Quit,
    Invalid(char),
}

impl From<char> for KeyCommand {
    fn from(c: char) -> Self {
        match c {
            '1' => KeyCommand::TurnOn,
            '0' => KeyCommand::TurnOff,
            'q' => KeyCommand::Quit,
            other => KeyCommand::Invalid(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    On,
    Off,
}

impl FromStr for RemoteCommand {
    type Err = LedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" => Ok(RemoteCommand::On),
            "off" => Ok(RemoteCommand::Off),
            _ => Err(LedError::UnknownCommand(s.trim().to_string())),
        }
    }
}

/// LED state reported after a successful command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LedStatus {
    On,
    Off,
}

impl fmt::Display for LedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedStatus::On => write!(f, "on"),
            LedStatus::Off => write!(f, "off"),
        }
    }
}

/// Status record printed by one-shot mode (`--json`).
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    #[serde(rename = "piId")]
    pub pi_id: String,
    pub status: LedStatus,
    pub timestamp: f64, // unix seconds
}

impl StatusReport {
    pub fn now(pi_id: &str, status: LedStatus) -> Self {
        Self {
            pi_id: pi_id.to_string(),
            status,
            timestamp: chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_classification() {
        assert_eq!(KeyCommand::from('1'), KeyCommand::TurnOn);
        assert_eq!(KeyCommand::from('0'), KeyCommand::TurnOff);
        assert_eq!(KeyCommand::from('q'), KeyCommand::Quit);
        // Only lowercase q quits
        assert_eq!(KeyCommand::from('Q'), KeyCommand::Invalid('Q'));
        assert_eq!(KeyCommand::from('\n'), KeyCommand::Invalid('\n'));
    }

    #[test]
    fn test_remote_command_parse() {
        assert_eq!("on".parse::<RemoteCommand>().unwrap(), RemoteCommand::On);
        assert_eq!(" OFF\n".parse::<RemoteCommand>().unwrap(), RemoteCommand::Off);
        match "blink".parse::<RemoteCommand>() {
            Err(LedError::UnknownCommand(word)) => assert_eq!(word, "blink"),
            other => panic!("expected UnknownCommand, got {:?}", other),
        }
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&LedStatus::On).unwrap(), "\"on\"");
        assert_eq!(LedStatus::Off.to_string(), "off");
    }

    #[test]
    fn test_status_report_fields() {
        let report = StatusReport::now("pi-001", LedStatus::Off);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["piId"], "pi-001");
        assert_eq!(value["status"], "off");
        assert!(value["timestamp"].as_f64().unwrap() > 0.0);
    }
}
