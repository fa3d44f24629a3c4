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

//! Heartbeat GPIO library
//!
//! Drives a single GPIO line as a liveness indicator: the line is set up
//! once as an output, then every beat drives it high, waits a fixed
//! width and drives it low again.
//!
//! The main entry point is [Heartbeat]. Hardware access goes through the
//! [port::GpioPort] trait, so the same code runs against a Raspberry Pi
//! pin, any [embedded_hal::digital::OutputPin] (via [port::HalPort]) or
//! a mock in unit tests.
//!
//! With the `std` feature, the [beat] module detects S1/S2 heart sounds
//! in an amplitude envelope and replays them as pulses.
//!
//! Basic usage:
//! ```no_run
//! # use heartbeat_gpio::{Heartbeat, HeartbeatConfig, Level, PinMode};
//! # use heartbeat_gpio::port::GpioPort;
//! # use heartbeat_gpio::errors::Error;
//! # struct Port;
//! # impl GpioPort for Port {
//! #     fn init(&mut self) -> Result<(), Error> { Ok(()) }
//! #     fn set_mode(&mut self, _: u8, _: PinMode) -> Result<(), Error> { Ok(()) }
//! #     fn write(&mut self, _: u8, _: Level) -> Result<(), Error> { Ok(()) }
//! # }
//! # struct Delay;
//! # impl embedded_hal::delay::DelayNs for Delay { fn delay_ns(&mut self, _: u32) {} }
//! // port: something that implements GpioPort
//! // delay: something that implements embedded_hal::delay::DelayNs
//! let mut heartbeat = Heartbeat::new(Port, Delay, HeartbeatConfig::default());
//! heartbeat.setup().unwrap();
//! loop {
//!     heartbeat.pulse().unwrap();
//! }
//! ```
#![no_std]
// defmt doesn't support inline format args
#![allow(clippy::uninlined_format_args)]

#[cfg(any(test, feature = "std"))]
extern crate std;

#[cfg(not(any(feature = "defmt", feature = "log")))]
compile_error!("Must enable either 'defmt' or 'log' feature for logging support.");

#[cfg(feature = "defmt")]
pub(crate) use defmt::{debug, info, trace, warn};
#[cfg(not(feature = "defmt"))]
pub(crate) use log::{debug, info, trace, warn};

#[cfg(feature = "std")]
pub mod beat;
pub mod errors;
mod heartbeat;
pub mod pins;
pub mod port;

#[cfg(test)]
pub(crate) mod mock;

pub use errors::Error;
pub use heartbeat::Heartbeat;
pub use heartbeat::HeartbeatConfig;
pub use pins::PinNumbering;
pub use port::{Level, PinMode};
