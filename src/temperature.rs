use byteorder::ByteOrder as _;
use embedded_hal::{delay::DelayNs, i2c::I2c};

use crate::constants::{Command, Register, StatusBits};
use crate::{Ad5933, DeviceMode, Result};

const TEMP_MASK: u16 = 0x3FFF;
const SIGN_THRESHOLD: i32 = 0x2000;
const TEMP_RANGE: i32 = 0x4000;

/// Die temperature in degrees Celsius.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TemperatureReading(pub f32);

impl TemperatureReading {
    pub fn celsius(self) -> f32 {
        self.0
    }
}

/// Decodes the 14-bit temperature word, 1/32 degree per LSB. Bits above 13 are ignored.
pub fn decode_temperature(raw: u16) -> TemperatureReading {
    let v = i32::from(raw & TEMP_MASK);
    let v = if v < SIGN_THRESHOLD { v } else { v - TEMP_RANGE };

    TemperatureReading(v as f32 / 32.0)
}

impl<I2C: I2c, D: DelayNs> Ad5933<I2C, D> {
    /// Runs a temperature conversion. The chip has to be in standby or idle;
    /// it is idle afterwards.
    pub fn read_temperature(&mut self) -> Result<TemperatureReading, I2C::Error> {
        self.measure_temp()?;
        self.wait_for(StatusBits::TemperatureValid)?;

        let raw = self.get_register_pair(Register::Temp1, Register::Temp0)?;
        self.mode = DeviceMode::Idle;
        // keep the nibble in step, later Control0 writes resend it
        self.registers.stage_command(Command::Idle);

        Ok(decode_temperature(byteorder::BigEndian::read_u16(&raw)))
    }
}
