// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use embedded_hal::digital::OutputPin;

use crate::errors::Error;
use crate::trace;

/// Direction of a GPIO line
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Input,
    Output,
}

/// Logical level of a GPIO line
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// Trait for talking to the GPIO hardware
///
/// There is a Raspberry Pi implementation and a dry-run one in the
/// demos crate.
pub trait GpioPort {
    /// Acquire the platform interface
    fn init(&mut self) -> Result<(), Error>;
    /// Set the direction of a line
    fn set_mode(&mut self, pin: u8, mode: PinMode) -> Result<(), Error>;
    /// Drive a line
    fn write(&mut self, pin: u8, level: Level) -> Result<(), Error>;
}

impl<T: GpioPort + ?Sized> GpioPort for &mut T {
    fn init(&mut self) -> Result<(), Error> {
        (**self).init()
    }
    fn set_mode(&mut self, pin: u8, mode: PinMode) -> Result<(), Error> {
        (**self).set_mode(pin, mode)
    }
    fn write(&mut self, pin: u8, level: Level) -> Result<(), Error> {
        (**self).write(pin, level)
    }
}

/// Port over a single, already acquired embedded-hal output pin
///
/// The pin is an output by construction, so `set_mode` only validates
/// the request.
pub struct HalPort<O> {
    pin: u8,
    output: O,
}

impl<O: OutputPin> HalPort<O> {
    /// Wraps `output`, answering to pin index `pin`
    pub fn new(pin: u8, output: O) -> Self {
        Self { pin, output }
    }

    pub fn into_inner(self) -> O {
        self.output
    }

    fn check_pin(&self, pin: u8) -> Result<(), Error> {
        if pin == self.pin {
            Ok(())
        } else {
            Err(Error::InvalidPin(pin))
        }
    }
}

impl<O: OutputPin> GpioPort for HalPort<O> {
    fn init(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn set_mode(&mut self, pin: u8, mode: PinMode) -> Result<(), Error> {
        self.check_pin(pin)?;
        match mode {
            PinMode::Output => Ok(()),
            PinMode::Input => Err(Error::UnsupportedMode),
        }
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<(), Error> {
        self.check_pin(pin)?;
        trace!("hal port: pin {} -> {:?}", pin, level);
        match level {
            Level::High => self.output.set_high(),
            Level::Low => self.output.set_low(),
        }
        .map_err(|_| Error::WriteFailed)
    }
}

/// Delay backed by `std::thread::sleep`
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

#[cfg(feature = "std")]
impl embedded_hal::delay::DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(ns as u64));
    }
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(ms as u64));
    }
}
