/// Error types for pin requests and session output.

use std::io;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedError {
    /// The pin-control program ran but reported failure.
    #[error("`{command}` exited with {status}")]
    ExternalCommandFailed { command: String, status: ExitStatus },

    /// The pin-control program could not be started at all.
    #[error("could not run `{command}`: {source}")]
    CommandUnavailable {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The GPIO character device refused the line request.
    #[error("GPIO line {pin} request failed: {reason}")]
    LineRequest { pin: i32, reason: String },

    #[error("unknown LED command '{0}' (expected 'on' or 'off')")]
    UnknownCommand(String),

    /// Status output could not be written.
    #[error("status output failed: {0}")]
    Output(#[from] io::Error),
}

impl LedError {
    /// True for failures of the pin request itself, which an interactive
    /// session reports and survives.
    pub fn is_pin_failure(&self) -> bool {
        matches!(
            self,
            LedError::ExternalCommandFailed { .. }
                | LedError::CommandUnavailable { .. }
                | LedError::LineRequest { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_failure_classification() {
        let unavailable = LedError::CommandUnavailable {
            command: "pinctrl set 17 dh".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert!(unavailable.is_pin_failure());

        let line = LedError::LineRequest { pin: -1, reason: "negative offset".into() };
        assert!(line.is_pin_failure());

        let output = LedError::Output(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        assert!(!output.is_pin_failure());
        assert!(!LedError::UnknownCommand("blink".into()).is_pin_failure());
    }

    #[test]
    fn test_error_messages_name_the_command() {
        let err = LedError::CommandUnavailable {
            command: "pinctrl set 4 dl".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file"),
        };
        assert_eq!(err.to_string(), "could not run `pinctrl set 4 dl`: No such file");
        assert_eq!(
            LedError::UnknownCommand("blink".into()).to_string(),
            "unknown LED command 'blink' (expected 'on' or 'off')"
        );
    }
}
