//! Software shadow of the two control registers.
//!
//! Every mutation is computed against the shadow and written to the chip in
//! full. The shadow only changes once the bus write went through.

use embedded_hal::i2c::I2c;

use crate::constants::*;
use crate::{write_register, Result};

/// Returns `byte` with bit `pos` set, `None` for positions past bit 7.
pub fn set_bit(byte: u8, pos: u8) -> Option<u8> {
    1u8.checked_shl(pos.into()).map(|bit| byte | bit)
}

/// Returns `byte` with bit `pos` cleared, `None` for positions past bit 7.
pub fn clear_bit(byte: u8, pos: u8) -> Option<u8> {
    1u8.checked_shl(pos.into()).map(|bit| byte & !bit)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlRegister {
    Control0,
    Control1,
}

impl ControlRegister {
    fn address(self) -> Register {
        match self {
            ControlRegister::Control0 => Register::Control0,
            ControlRegister::Control1 => Register::Control1,
        }
    }
}

/// Single bits living in one of the control registers.
pub trait ControlBits: RegisterBits {
    const REGISTER: ControlRegister;
}

impl ControlBits for Control0Bits {
    const REGISTER: ControlRegister = ControlRegister::Control0;
}

impl ControlBits for Control1Bits {
    const REGISTER: ControlRegister = ControlRegister::Control1;
}

/// Multi-bit settings. `MASK` keeps every bit the field does not own.
pub trait ControlField: Copy {
    const REGISTER: ControlRegister;
    const MASK: u8;
    const START_BIT: u8;

    fn bits(self) -> u8;
}

impl ControlField for Gain {
    const REGISTER: ControlRegister = ControlRegister::Control0;
    const MASK: u8 = 0b1111_1110;
    const START_BIT: u8 = 0;

    fn bits(self) -> u8 {
        self as _
    }
}

impl ControlField for ExcitationVoltage {
    const REGISTER: ControlRegister = ControlRegister::Control0;
    const MASK: u8 = RANGE_MASK;
    const START_BIT: u8 = RANGE_START_BIT;

    fn bits(self) -> u8 {
        self as _
    }
}

impl ControlField for ClockSource {
    const REGISTER: ControlRegister = ControlRegister::Control1;
    const MASK: u8 = !(1 << Control1Bits::ExternalClock as u8);
    const START_BIT: u8 = Control1Bits::ExternalClock as u8;

    fn bits(self) -> u8 {
        self as _
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlRegisters {
    control0: u8,
    control1: u8,
}

impl Default for ControlRegisters {
    /// Power-on contents: power-down command, 2 Vpp, gain x5, internal clock.
    fn default() -> Self {
        Self {
            control0: 0xA0,
            control1: 0x00,
        }
    }
}

impl ControlRegisters {
    pub fn value(&self, reg: ControlRegister) -> u8 {
        match reg {
            ControlRegister::Control0 => self.control0,
            ControlRegister::Control1 => self.control1,
        }
    }

    /// Command currently held in the Control0 nibble.
    pub fn command_nibble(&self) -> u8 {
        self.control0 >> COMMAND_START_BIT
    }

    pub fn set_bit<I: I2c, B: ControlBits>(&mut self, i2c: &mut I, bit: B) -> Result<u8, I::Error> {
        let val = self.value(B::REGISTER) | (1 << bit.get());
        self.flush(i2c, B::REGISTER, val)
    }

    pub fn clear_bit<I: I2c, B: ControlBits>(&mut self, i2c: &mut I, bit: B) -> Result<u8, I::Error> {
        let val = self.value(B::REGISTER) & !(1 << bit.get());
        self.flush(i2c, B::REGISTER, val)
    }

    pub fn write_field<I: I2c, F: ControlField>(&mut self, i2c: &mut I, field: F) -> Result<u8, I::Error> {
        let mut val = self.value(F::REGISTER);
        val &= F::MASK;
        val |= field.bits() << F::START_BIT;

        self.flush(i2c, F::REGISTER, val)
    }

    /// Updates the command nibble in the shadow only. [`Command::Reset`] has
    /// no nibble and leaves the shadow alone.
    pub fn stage_command(&mut self, cmd: Command) -> u8 {
        if let Some(nibble) = cmd.nibble() {
            self.control0 = (self.control0 & COMMAND_MASK) | (nibble << COMMAND_START_BIT);
        }
        self.control0
    }

    /// Writes `cmd` to the chip. Returns the byte that went out on the bus.
    pub fn write_command<I: I2c>(&mut self, i2c: &mut I, cmd: Command) -> Result<u8, I::Error> {
        match cmd.nibble() {
            Some(nibble) => {
                let val = (self.control0 & COMMAND_MASK) | (nibble << COMMAND_START_BIT);
                self.flush(i2c, ControlRegister::Control0, val)
            }
            None => {
                // reset clears itself on the chip, keep it out of the shadow
                let val = self.control1 | (1 << Control1Bits::Reset as u8);
                write_register(i2c, Register::Control1, val)?;
                Ok(val)
            }
        }
    }

    fn flush<I: I2c>(&mut self, i2c: &mut I, reg: ControlRegister, val: u8) -> Result<u8, I::Error> {
        write_register(i2c, reg.address(), val)?;

        match reg {
            ControlRegister::Control0 => self.control0 = val,
            ControlRegister::Control1 => self.control1 = val,
        }

        Ok(val)
    }
}
