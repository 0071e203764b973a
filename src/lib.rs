/// LED Control Library
///
/// Drives a single GPIO pin (an LED) from operator keystrokes or one-shot commands.

pub mod command;
pub mod config_loader;
pub mod controller;
pub mod error;
pub mod gpio;
pub mod input;

pub use command::{KeyCommand, LedStatus, RemoteCommand, StatusReport};
pub use controller::{run_one_shot, PinController, SessionEnd, SessionOutcome};
pub use error::LedError;
pub use gpio::{PinDriver, PinLevel};
pub use input::ReadMode;
