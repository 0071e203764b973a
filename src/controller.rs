/// LED pin controller and its interactive session.
///
/// Status lines go to the controller's output; pin requests go to the driver.
/// A failed pin request is reported and the session keeps running, the same
/// as an invalid keystroke. Only a failure to write status output ends it.

use std::io::{self, Read, Write};

use crate::command::{KeyCommand, LedStatus, RemoteCommand, StatusReport};
use crate::error::LedError;
use crate::gpio::PinDriver;
use crate::input::{KeyReader, ReadMode};

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Quit,
    EndOfInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    pub ended_by: SessionEnd,
    pub on_requests: usize,
    pub off_requests: usize,
    pub invalid_keys: usize,
    pub failed_requests: usize,
}

impl SessionOutcome {
    fn new() -> Self {
        Self {
            ended_by: SessionEnd::EndOfInput,
            on_requests: 0,
            off_requests: 0,
            invalid_keys: 0,
            failed_requests: 0,
        }
    }
}

pub struct PinController<D, W> {
    pin: i32,
    driver: D,
    out: W,
}

impl<D: PinDriver, W: Write> PinController<D, W> {
    /// Any pin number is accepted; a nonexistent pin only fails at the driver.
    pub fn new(pin: i32, driver: D, mut out: W) -> Result<Self, LedError> {
        writeln!(out, "GPIO pin {} initialized", pin)?;
        log::debug!(target: "controller", "Controller created for pin {}", pin);
        Ok(Self { pin, driver, out })
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn into_parts(self) -> (D, W) {
        (self.driver, self.out)
    }

    pub fn turn_on(&mut self) -> Result<(), LedError> {
        self.driver.set_high(self.pin)?;
        writeln!(self.out, "LED ON")?;
        Ok(())
    }

    pub fn turn_off(&mut self) -> Result<(), LedError> {
        self.driver.set_low(self.pin)?;
        writeln!(self.out, "LED OFF")?;
        Ok(())
    }

    /// Apply one word command outside the interactive loop.
    pub fn apply_command(&mut self, command: RemoteCommand) -> Result<LedStatus, LedError> {
        match command {
            RemoteCommand::On => self.turn_on().map(|_| LedStatus::On),
            RemoteCommand::Off => self.turn_off().map(|_| LedStatus::Off),
        }
    }

    /// Run the keystroke loop until `q` or end of input.
    pub fn run_interactive_session<R: Read>(
        &mut self,
        input: R,
        mode: ReadMode,
    ) -> Result<SessionOutcome, LedError> {
        writeln!(self.out, "LED Control Test")?;
        writeln!(self.out, "Press '1' to turn ON, '0' to turn OFF, 'q' to quit")?;

        let mut outcome = SessionOutcome::new();
        let mut keys = KeyReader::new(input, mode);

        while let Some(key) = keys.next_key() {
            let result = match KeyCommand::from(key) {
                KeyCommand::TurnOn => {
                    outcome.on_requests += 1;
                    self.turn_on()
                }
                KeyCommand::TurnOff => {
                    outcome.off_requests += 1;
                    self.turn_off()
                }
                KeyCommand::Quit => {
                    writeln!(self.out, "Goodbye!")?;
                    outcome.ended_by = SessionEnd::Quit;
                    break;
                }
                KeyCommand::Invalid(c) => {
                    outcome.invalid_keys += 1;
                    log::debug!(target: "controller", "Ignoring key {:?}", c);
                    writeln!(self.out, "Invalid input. Use '1', '0', or 'q'")?;
                    continue;
                }
            };

            match result {
                Ok(()) => {}
                Err(e) if e.is_pin_failure() => {
                    outcome.failed_requests += 1;
                    log::error!(target: "controller", "Pin {} request failed: {}", self.pin, e);
                    writeln!(self.out, "LED command failed: {}", e)?;
                }
                Err(e) => return Err(e),
            }
        }

        log::info!(target: "controller", "Session ended ({:?}): {} on, {} off, {} invalid, {} failed",
                   outcome.ended_by, outcome.on_requests, outcome.off_requests,
                   outcome.invalid_keys, outcome.failed_requests);
        Ok(outcome)
    }
}

/// Apply one `on`/`off` word and stop.
///
/// With `json_pi_id` set, `out` receives only the JSON status record and the
/// controller's status lines are discarded, so stdout stays parseable.
pub fn run_one_shot<D: PinDriver, W: Write>(
    pin: i32,
    driver: D,
    word: &str,
    json_pi_id: Option<&str>,
    mut out: W,
) -> Result<LedStatus, LedError> {
    let command: RemoteCommand = word.parse()?;
    match json_pi_id {
        Some(pi_id) => {
            let status = PinController::new(pin, driver, io::sink())?.apply_command(command)?;
            let report = serde_json::to_string(&StatusReport::now(pi_id, status)).map_err(io::Error::from)?;
            writeln!(out, "{}", report)?;
            Ok(status)
        }
        None => PinController::new(pin, driver, out)?.apply_command(command),
    }
}
