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

use embedded_hal::delay::DelayNs;

use crate::errors::Error;
use crate::port::{GpioPort, Level, PinMode};
use crate::{debug, info, trace, warn};

/// Which pin to beat on, and for how long
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Pin index, in the port's own numbering
    pub pin: u8,
    /// Time the line is held high on every pulse
    pub pulse_width_ms: u32,
}

impl HeartbeatConfig {
    pub const DEFAULT_PIN: u8 = 0;
    pub const DEFAULT_PULSE_WIDTH_MS: u32 = 100;

    pub fn new(pin: u8) -> Self {
        Self {
            pin,
            pulse_width_ms: Self::DEFAULT_PULSE_WIDTH_MS,
        }
    }

    pub fn with_pulse_width_ms(mut self, pulse_width_ms: u32) -> Self {
        self.pulse_width_ms = pulse_width_ms;
        self
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PIN)
    }
}

/// Owns the GPIO port and drives heartbeat pulses on one of its pins
///
/// The handle starts unconfigured. [Heartbeat::setup] acquires the
/// platform interface and makes the pin an output; pulsing before that
/// fails with [Error::NotConfigured].
///
/// All operations take `&mut self`: sharing a handle between threads
/// needs external serialization.
pub struct Heartbeat<P, D> {
    port: P,
    delay: D,
    config: HeartbeatConfig,
    configured: bool,
}

impl<P: GpioPort, D> Heartbeat<P, D> {
    pub fn new(port: P, delay: D, config: HeartbeatConfig) -> Self {
        Self {
            port,
            delay,
            config,
            configured: false,
        }
    }

    pub fn config(&self) -> &HeartbeatConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Gives back the port and delay. The pin is left as it is.
    pub fn release(self) -> (P, D) {
        (self.port, self.delay)
    }

    /// One-time setup of the hardware interface and the pin direction
    ///
    /// Calling it again on a configured handle does nothing.
    pub fn setup(&mut self) -> Result<(), Error> {
        if self.configured {
            warn!("setup: pin {} already configured", self.config.pin);
            return Ok(());
        }
        info!("Setting up IO on pin {}", self.config.pin);
        self.port.init()?;
        self.port.set_mode(self.config.pin, PinMode::Output)?;
        self.configured = true;
        debug!("setup: pin {} is an output", self.config.pin);
        Ok(())
    }

    fn rise(&mut self) -> Result<(), Error> {
        if !self.configured {
            return Err(Error::NotConfigured);
        }
        trace!("pulse: pin {} high", self.config.pin);
        self.port.write(self.config.pin, Level::High)
    }

    fn fall(&mut self) -> Result<(), Error> {
        trace!("pulse: pin {} low", self.config.pin);
        self.port.write(self.config.pin, Level::Low)
    }
}

impl<P: GpioPort, D: DelayNs> Heartbeat<P, D> {
    /// Drive the pin high, block for the pulse width, drive it low
    pub fn pulse(&mut self) -> Result<(), Error> {
        self.rise()?;
        self.delay.delay_ms(self.config.pulse_width_ms);
        self.fall()
    }

    /// Periodic heartbeat, one pulse every `period_ms` measured start to
    /// start. `None` beats forever.
    ///
    /// A failing pulse is logged and skipped, the train keeps going.
    /// Returns the number of missed pulses.
    pub fn pulse_train(&mut self, count: Option<u32>, period_ms: u32) -> Result<u32, Error> {
        if !self.configured {
            return Err(Error::NotConfigured);
        }
        if count == Some(0) {
            return Ok(0);
        }
        let rest_ms = period_ms.saturating_sub(self.config.pulse_width_ms);
        let mut missed = 0;
        let mut beat = 0u32;
        loop {
            if let Err(e) = self.timed_pulse() {
                warn!("pulse_train: beat {} missed: {:?}", beat, e);
                missed += 1;
            }
            beat = beat.wrapping_add(1);
            if count.is_some_and(|count| beat >= count) {
                break;
            }
            self.delay.delay_ms(rest_ms);
        }
        debug!("pulse_train: {} beats, {} missed", beat, missed);
        Ok(missed)
    }

    /// Like [Heartbeat::pulse], but the pulse width always elapses, even
    /// when the line could not be raised
    pub(crate) fn timed_pulse(&mut self) -> Result<(), Error> {
        let raised = self.rise();
        self.delay.delay_ms(self.config.pulse_width_ms);
        raised?;
        self.fall()
    }

    pub(crate) fn wait_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}

#[cfg(feature = "async")]
impl<P: GpioPort, D: embedded_hal_async::delay::DelayNs> Heartbeat<P, D> {
    /// Same as [Heartbeat::pulse], yielding to the executor while the
    /// line is high
    pub async fn pulse_async(&mut self) -> Result<(), Error> {
        self.rise()?;
        self.delay.delay_ms(self.config.pulse_width_ms).await;
        self.fall()
    }
}
