//! Host-side backends and helpers for the `heartbeat` binary

use log::{debug, error, info};
use std::collections::HashMap;

use heartbeat_gpio::errors::Error;
use heartbeat_gpio::port::GpioPort;
use heartbeat_gpio::{Level, PinMode, PinNumbering};

pub mod input;
#[cfg(target_os = "linux")]
pub mod rppal_port;

/// Port that only logs, for trying things out without hardware
///
/// Still enforces the order of operations a real driver would: no mode
/// changes before `init`, no writes to pins that aren't outputs.
#[derive(Debug, Default)]
pub struct LogPort {
    numbering: PinNumbering,
    ready: bool,
    modes: HashMap<u8, PinMode>,
    levels: HashMap<u8, Level>,
}

impl LogPort {
    pub fn new(numbering: PinNumbering) -> Self {
        Self {
            numbering,
            ..Default::default()
        }
    }

    pub fn mode(&self, pin: u8) -> Option<PinMode> {
        self.modes.get(&pin).copied()
    }

    pub fn level(&self, pin: u8) -> Option<Level> {
        self.levels.get(&pin).copied()
    }
}

impl GpioPort for LogPort {
    fn init(&mut self) -> Result<(), Error> {
        info!("dry run: GPIO interface ready, {:?} numbering", self.numbering);
        self.ready = true;
        Ok(())
    }

    fn set_mode(&mut self, pin: u8, mode: PinMode) -> Result<(), Error> {
        if !self.ready {
            error!("dry run: set_mode before init");
            return Err(Error::PlatformInit);
        }
        let bcm = self.numbering.to_bcm(pin)?;
        info!("dry run: pin {} (BCM {}) -> {:?}", pin, bcm, mode);
        self.modes.insert(pin, mode);
        Ok(())
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<(), Error> {
        if self.mode(pin) != Some(PinMode::Output) {
            error!("dry run: pin {} is not an output", pin);
            return Err(Error::NotConfigured);
        }
        debug!("dry run: pin {} {:?}", pin, level);
        self.levels.insert(pin, level);
        Ok(())
    }
}
