//! Conversion between frequencies in Hz and the chip's 24-bit frequency codes.
//!
//! The start and increment registers hold `f / (mclk / 4) * 2^27`, truncated
//! to an integer. Only the low 24 bits exist on the chip.

use byteorder::ByteOrder as _;

use crate::constants::{MAX_FREQUENCY_HZ, MIN_FREQUENCY_HZ};
use crate::RangeError;

const CODE_SCALE: f64 = (1u32 << 27) as f64;
const CODE_MAX: u32 = 0x00FF_FFFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrequencyCode(u32);

impl FrequencyCode {
    /// Encodes a sweep frequency, which must lie within 1 kHz to 100 kHz.
    pub fn encode(frequency_hz: f64, master_clock_hz: f64) -> Result<Self, RangeError> {
        if !(MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ).contains(&frequency_hz) {
            return Err(RangeError::Frequency);
        }

        Self::from_hz(frequency_hz, master_clock_hz)
    }

    /// Encodes a frequency step. Steps below 1 kHz are fine, a zero step is
    /// allowed for single-point sweeps.
    pub fn encode_increment(increment_hz: f64, master_clock_hz: f64) -> Result<Self, RangeError> {
        if !(0.0..=MAX_FREQUENCY_HZ).contains(&increment_hz) {
            return Err(RangeError::Increment);
        }

        Self::from_hz(increment_hz, master_clock_hz)
    }

    fn from_hz(hz: f64, master_clock_hz: f64) -> Result<Self, RangeError> {
        if !master_clock_hz.is_finite() || master_clock_hz <= 0.0 {
            return Err(RangeError::MasterClock);
        }

        let code = hz / (master_clock_hz / 4.0) * CODE_SCALE;
        if code > CODE_MAX as f64 {
            return Err(RangeError::CodeOverflow);
        }

        // truncation, code is never negative here
        Ok(FrequencyCode(code as u32))
    }

    /// Builds a code from a raw register value, `None` if it does not fit in 24 bits.
    pub fn from_raw(raw: u32) -> Option<Self> {
        if raw <= CODE_MAX {
            Some(FrequencyCode(raw))
        } else {
            None
        }
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn decode(self, master_clock_hz: f64) -> f64 {
        self.0 as f64 * (master_clock_hz / 4.0) / CODE_SCALE
    }

    /// Register bytes, most significant first.
    pub fn to_bytes(self) -> [u8; 3] {
        let mut buf = [0u8; 3];
        byteorder::BigEndian::write_u24(&mut buf, self.0);
        buf
    }

    /// Size of one code step in Hz.
    pub fn resolution_hz(master_clock_hz: f64) -> f64 {
        master_clock_hz / 4.0 / CODE_SCALE
    }
}
