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

//! Raspberry Pi pin numbering schemes

use crate::errors::Error;

// wiringPi index -> Broadcom GPIO, board revision 2 and later.
// 17..=20 are on the P5 header of older boards.
const WIRING_TO_BCM: [u8; 32] = [
    17, 18, 27, 22, 23, 24, 25, 4, // 0-7
    2, 3, // 8-9: I2C
    8, 7, // 10-11: SPI CE0/CE1
    10, 9, 11, // 12-14: SPI MOSI/MISO/SCLK
    14, 15, // 15-16: UART
    28, 29, 30, 31, // 17-20: P5
    5, 6, 13, 19, 26, // 21-25
    12, 16, 20, 21, // 26-29
    0, 1, // 30-31: ID EEPROM
];

/// Translates a wiringPi pin index to a Broadcom GPIO number
pub fn wiring_to_bcm(pin: u8) -> Option<u8> {
    WIRING_TO_BCM.get(pin as usize).copied()
}

/// How a configured pin number is to be read
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PinNumbering {
    /// wiringPi indices, as used by the classic C tooling
    #[default]
    Wiring,
    /// Broadcom GPIO numbers
    Bcm,
}

impl PinNumbering {
    pub fn to_bcm(self, pin: u8) -> Result<u8, Error> {
        match self {
            Self::Wiring => wiring_to_bcm(pin).ok_or(Error::InvalidPin(pin)),
            Self::Bcm => Ok(pin),
        }
    }
}
