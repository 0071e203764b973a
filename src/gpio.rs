/// GPIO pin drivers
///
/// The controller only ever asks for "drive pin N high/low"; how that happens
/// is up to the driver. `pinctrl` is the default on Raspberry Pi OS, libgpiod
/// (character device) is available behind the `gpiod` feature, and a disabled
/// driver keeps the tool usable on hosts without GPIO.

use anyhow::{anyhow, Result};
use std::process::{Command, Stdio};

use crate::config_loader::{GpioBackend, LedSettings};
use crate::error::LedError;

#[cfg(feature = "gpiod")]
use gpiocdev::line::Value;
#[cfg(feature = "gpiod")]
use gpiocdev::request::Request;
#[cfg(feature = "gpiod")]
use std::collections::HashMap;
#[cfg(feature = "gpiod")]
use std::path::PathBuf;

/// Logical level a pin can be driven to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinLevel {
    High,
    Low,
}

impl PinLevel {
    /// `pinctrl` drive argument: `dh` (drive high) or `dl` (drive low).
    pub fn pinctrl_arg(self) -> &'static str {
        match self {
            PinLevel::High => "dh",
            PinLevel::Low => "dl",
        }
    }
}

/// Anything that can apply a level request to a pin.
pub trait PinDriver {
    fn apply(&mut self, pin: i32, level: PinLevel) -> Result<(), LedError>;

    fn set_high(&mut self, pin: i32) -> Result<(), LedError> {
        self.apply(pin, PinLevel::High)
    }

    fn set_low(&mut self, pin: i32) -> Result<(), LedError> {
        self.apply(pin, PinLevel::Low)
    }
}

impl<D: PinDriver + ?Sized> PinDriver for Box<D> {
    fn apply(&mut self, pin: i32, level: PinLevel) -> Result<(), LedError> {
        (**self).apply(pin, level)
    }
}

impl<D: PinDriver + ?Sized> PinDriver for &mut D {
    fn apply(&mut self, pin: i32, level: PinLevel) -> Result<(), LedError> {
        (**self).apply(pin, level)
    }
}

/// Drives pins by running `<program> set <pin> dh|dl` and waiting for it.
#[derive(Debug, Clone)]
pub struct PinctrlCommand {
    program: String,
}

impl PinctrlCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    pub fn args(pin: i32, level: PinLevel) -> [String; 3] {
        ["set".to_string(), pin.to_string(), level.pinctrl_arg().to_string()]
    }

    fn command_line(&self, pin: i32, level: PinLevel) -> String {
        format!("{} {}", self.program, Self::args(pin, level).join(" "))
    }
}

impl Default for PinctrlCommand {
    fn default() -> Self {
        Self::new("pinctrl")
    }
}

impl PinDriver for PinctrlCommand {
    fn apply(&mut self, pin: i32, level: PinLevel) -> Result<(), LedError> {
        let command = self.command_line(pin, level);
        log::debug!(target: "gpio::pinctrl", "→ {}", command);

        let output = Command::new(&self.program)
            .args(Self::args(pin, level))
            .stdin(Stdio::null())
            .output()
            .map_err(|source| LedError::CommandUnavailable { command: command.clone(), source })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::warn!(target: "gpio::pinctrl", "{} failed ({}): {}", command, output.status, stderr.trim());
            return Err(LedError::ExternalCommandFailed { command, status: output.status });
        }
        Ok(())
    }
}

/// Stand-in driver for hosts with GPIO disabled: logs and succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledPin;

impl PinDriver for DisabledPin {
    fn apply(&mut self, pin: i32, level: PinLevel) -> Result<(), LedError> {
        log::info!(target: "gpio::disabled", "GPIO disabled on this host; pin {} -> {:?} not applied", pin, level);
        Ok(())
    }
}

/// Drives pins through the GPIO character device (libgpiod ABI).
/// Each line is requested as an output on first use and held until drop.
#[cfg(feature = "gpiod")]
#[derive(Debug)]
pub struct GpiodLine {
    chip_path: PathBuf,
    line_requests: HashMap<u32, Request>,
}

#[cfg(feature = "gpiod")]
impl GpiodLine {
    pub fn new(chip_path: impl Into<PathBuf>) -> Self {
        Self {
            chip_path: chip_path.into(),
            line_requests: HashMap::new(),
        }
    }
}

#[cfg(feature = "gpiod")]
impl PinDriver for GpiodLine {
    fn apply(&mut self, pin: i32, level: PinLevel) -> Result<(), LedError> {
        let offset = u32::try_from(pin).map_err(|_| LedError::LineRequest {
            pin,
            reason: "line offsets cannot be negative".to_string(),
        })?;
        let value = match level {
            PinLevel::High => Value::Active,
            PinLevel::Low => Value::Inactive,
        };
        log::debug!(target: "gpio::gpiod", "→ {} line {} = {:?}", self.chip_path.display(), offset, value);

        if let Some(request) = self.line_requests.get(&offset) {
            request
                .set_value(offset, value)
                .map_err(|e| LedError::LineRequest { pin, reason: e.to_string() })?;
            return Ok(());
        }

        let request = Request::builder()
            .on_chip(&self.chip_path)
            .with_consumer("led_control")
            .with_line(offset)
            .as_output(value)
            .request()
            .map_err(|e| LedError::LineRequest { pin, reason: e.to_string() })?;
        self.line_requests.insert(offset, request);
        Ok(())
    }
}

#[cfg(feature = "gpiod")]
impl Drop for GpiodLine {
    fn drop(&mut self) {
        if self.line_requests.is_empty() {
            return;
        }
        // Requests are released when dropped
        self.line_requests.clear();
        log::info!(target: "gpio::gpiod", "GPIO resources released.");
    }
}

/// Build the driver selected by host settings.
pub fn build_driver(settings: &LedSettings) -> Result<Box<dyn PinDriver>> {
    if !settings.gpio_enabled {
        log::info!(target: "gpio", "GPIO_ENABLED is false; using disabled driver");
        return Ok(Box::new(DisabledPin));
    }

    match settings.backend {
        GpioBackend::Pinctrl => {
            log::info!(target: "gpio", "Using pinctrl backend ({})", settings.pinctrl_cmd);
            Ok(Box::new(PinctrlCommand::new(settings.pinctrl_cmd.clone())))
        }
        GpioBackend::Gpiod => build_gpiod(settings),
    }
}

#[cfg(feature = "gpiod")]
fn build_gpiod(settings: &LedSettings) -> Result<Box<dyn PinDriver>> {
    log::info!(target: "gpio", "Using gpiod backend ({})", settings.gpio_chip);
    Ok(Box::new(GpiodLine::new(settings.gpio_chip.clone())))
}

#[cfg(not(feature = "gpiod"))]
fn build_gpiod(_settings: &LedSettings) -> Result<Box<dyn PinDriver>> {
    Err(anyhow!("GPIO_BACKEND 'gpiod' is not compiled in. Enable the 'gpiod' feature."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pinctrl_args() {
        assert_eq!(PinctrlCommand::args(17, PinLevel::High), ["set", "17", "dh"]);
        assert_eq!(PinctrlCommand::args(-3, PinLevel::Low), ["set", "-3", "dl"]);
        assert_eq!(PinctrlCommand::default().command_line(17, PinLevel::Low), "pinctrl set 17 dl");
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let mut driver = PinctrlCommand::new("/nonexistent/led_control/pinctrl");
        match driver.set_high(17) {
            Err(LedError::CommandUnavailable { command, .. }) => {
                assert_eq!(command, "/nonexistent/led_control/pinctrl set 17 dh");
            }
            other => panic!("expected CommandUnavailable, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_is_checked() {
        // `true`/`false` ignore their arguments, standing in for pinctrl
        assert!(PinctrlCommand::new("true").set_low(17).is_ok());
        match PinctrlCommand::new("false").set_high(17) {
            Err(LedError::ExternalCommandFailed { command, status }) => {
                assert_eq!(command, "false set 17 dh");
                assert!(!status.success());
            }
            other => panic!("expected ExternalCommandFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_disabled_driver_accepts_anything() {
        let mut driver = DisabledPin;
        assert!(driver.set_high(i32::MAX).is_ok());
        assert!(driver.set_low(i32::MIN).is_ok());
    }

    #[test]
    fn test_build_driver_disabled_host() {
        let settings = LedSettings { gpio_enabled: false, ..LedSettings::default() };
        let mut driver = build_driver(&settings).unwrap();
        assert!(driver.set_high(17).is_ok());
    }

    #[cfg(not(feature = "gpiod"))]
    #[test]
    fn test_gpiod_requires_feature() {
        let settings = LedSettings { backend: GpioBackend::Gpiod, ..LedSettings::default() };
        assert!(build_driver(&settings).is_err());
    }
}
