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

//! Port and delay doubles sharing a virtual clock

use std::cell::Cell;
use std::rc::Rc;
use std::vec::Vec;

use crate::errors::Error;
use crate::port::{GpioPort, Level, PinMode};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Event {
    Init,
    Mode(u8, PinMode),
    Write(u8, Level),
}

/// Virtual time in nanoseconds
pub(crate) type Clock = Rc<Cell<u64>>;

#[derive(Default)]
pub(crate) struct MockPort {
    clock: Clock,
    pub events: Vec<(u64, Event)>,
    pub fail_init: bool,
    /// Fail writes once this many have succeeded
    pub fail_writes_after: Option<usize>,
    /// Reject this many upcoming writes, then recover
    pub fail_next_writes: usize,
}

impl MockPort {
    pub fn new(clock: &Clock) -> Self {
        Self {
            clock: clock.clone(),
            ..Default::default()
        }
    }

    pub fn mode(&self, pin: u8) -> Option<PinMode> {
        self.events.iter().rev().find_map(|(_, e)| match e {
            Event::Mode(p, mode) if *p == pin => Some(*mode),
            _ => None,
        })
    }

    /// Level changes as (timestamp, level)
    pub fn writes(&self, pin: u8) -> Vec<(u64, Level)> {
        self.events
            .iter()
            .filter_map(|(t, e)| match e {
                Event::Write(p, level) if *p == pin => Some((*t, *level)),
                _ => None,
            })
            .collect()
    }

    fn record(&mut self, event: Event) {
        self.events.push((self.clock.get(), event));
    }
}

impl GpioPort for MockPort {
    fn init(&mut self) -> Result<(), Error> {
        if self.fail_init {
            return Err(Error::PlatformInit);
        }
        self.record(Event::Init);
        Ok(())
    }

    fn set_mode(&mut self, pin: u8, mode: PinMode) -> Result<(), Error> {
        self.record(Event::Mode(pin, mode));
        Ok(())
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<(), Error> {
        if self.fail_next_writes > 0 {
            self.fail_next_writes -= 1;
            return Err(Error::WriteFailed);
        }
        if let Some(limit) = self.fail_writes_after {
            if self.writes(pin).len() >= limit {
                return Err(Error::WriteFailed);
            }
        }
        self.record(Event::Write(pin, level));
        Ok(())
    }
}

pub(crate) struct MockDelay {
    clock: Clock,
}

impl MockDelay {
    pub fn new(clock: &Clock) -> Self {
        Self {
            clock: clock.clone(),
        }
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.set(self.clock.get() + ns as u64);
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::delay::DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.clock.set(self.clock.get() + ns as u64);
    }
}

pub(crate) const MS: u64 = 1_000_000;
