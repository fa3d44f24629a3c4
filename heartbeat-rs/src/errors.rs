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

/// GPIO access errors
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The platform GPIO interface could not be acquired,
    /// usually missing privileges or no such hardware
    PlatformInit,
    /// Pin index not available on this port
    InvalidPin(u8),
    /// Port can't put the pin into the requested mode
    UnsupportedMode,
    /// Setting the pin direction failed
    ModeFailed,
    /// Driving the pin level failed
    WriteFailed,
    /// Pulse requested before a successful setup
    NotConfigured,
}

impl From<core::convert::Infallible> for Error {
    fn from(_: core::convert::Infallible) -> Self {
        unreachable!("Infallible error")
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PlatformInit => write!(f, "GPIO platform interface unavailable"),
            Self::InvalidPin(pin) => write!(f, "invalid pin {}", pin),
            Self::UnsupportedMode => write!(f, "pin mode not supported by port"),
            Self::ModeFailed => write!(f, "setting pin mode failed"),
            Self::WriteFailed => write!(f, "writing pin level failed"),
            Self::NotConfigured => write!(f, "pin not set up"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
