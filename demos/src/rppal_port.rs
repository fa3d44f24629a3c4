//! Raspberry Pi GPIO through rppal
//!
//! rppal talks BCM numbers, wiringPi indices are translated on the way in.

use std::collections::HashMap;

use log::{debug, error};
use rppal::gpio::{Gpio, OutputPin};

use heartbeat_gpio::errors::Error;
use heartbeat_gpio::port::GpioPort;
use heartbeat_gpio::{Level, PinMode, PinNumbering};

pub struct RppalPort {
    numbering: PinNumbering,
    gpio: Option<Gpio>,
    outputs: HashMap<u8, OutputPin>,
}

impl RppalPort {
    pub fn new(numbering: PinNumbering) -> Self {
        Self {
            numbering,
            gpio: None,
            outputs: HashMap::new(),
        }
    }
}

impl GpioPort for RppalPort {
    fn init(&mut self) -> Result<(), Error> {
        let gpio = Gpio::new().map_err(|e| {
            error!("Failed to open GPIO: {}", e);
            Error::PlatformInit
        })?;
        self.gpio = Some(gpio);
        Ok(())
    }

    fn set_mode(&mut self, pin: u8, mode: PinMode) -> Result<(), Error> {
        let bcm = self.numbering.to_bcm(pin)?;
        let gpio = self.gpio.as_ref().ok_or(Error::PlatformInit)?;
        // rppal hands out each line once, give back any earlier handle first
        self.outputs.remove(&pin);
        let line = gpio.get(bcm).map_err(|e| {
            error!("GPIO {} unavailable: {}", bcm, e);
            Error::InvalidPin(pin)
        })?;
        debug!("pin {} (BCM {}) -> {:?}", pin, bcm, mode);
        match mode {
            PinMode::Output => {
                self.outputs.insert(pin, line.into_output_low());
            }
            PinMode::Input => {
                let mut input = line.into_input();
                input.set_reset_on_drop(false);
            }
        }
        Ok(())
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<(), Error> {
        let output = self.outputs.get_mut(&pin).ok_or(Error::NotConfigured)?;
        match level {
            Level::High => output.set_high(),
            Level::Low => output.set_low(),
        }
        Ok(())
    }
}
