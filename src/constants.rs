#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    Control0 = 0x80,
    Control1,
    FreqMin2,
    FreqMin1,
    FreqMin0,
    FreqInc2,
    FreqInc1,
    FreqInc0,
    IncNum1,
    IncNum0,
    SettleTime1,
    SettleTime0,
    Status = 0x8F,
    Temp1 = 0x92,
    Temp0,
    Real1,
    Real0,
    Imag1,
    Imag0,
}

#[derive(Clone, Copy)]
#[repr(u8)]
pub enum Control0Bits {
    PgaGain = 0,
}

pub const COMMAND_MASK: u8 = 0b0000_1111;
pub const COMMAND_START_BIT: u8 = 4;
pub const RANGE_MASK: u8 = 0b1111_1001;
pub const RANGE_START_BIT: u8 = 1;

#[derive(Clone, Copy)]
#[repr(u8)]
pub enum Control1Bits {
    ExternalClock = 3,
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StatusBits {
    ImpedanceValid = 0,
    TemperatureValid,
    SweepComplete,
}

pub trait RegisterBits {
    fn get(&self) -> u8;
}

macro_rules! impl_register_bits {
    ($($type:ident),*) => {
        $(
            impl RegisterBits for $type {
                fn get(&self) -> u8 {
                    *self as _
                }
            }
        )*
    }
}

impl_register_bits!(Control0Bits, Control1Bits, StatusBits);

/// Commands accepted by the control register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    InitStartFreq,
    StartSweep,
    IncrementFreq,
    RepeatFreq,
    MeasureTemp,
    PowerDown,
    Standby,
    Idle,
    /// Lives in Control1 rather than the Control0 command nibble.
    Reset,
}

impl Command {
    /// Value of bits 7-4 of Control0, `None` for [`Command::Reset`].
    pub const fn nibble(self) -> Option<u8> {
        match self {
            Command::InitStartFreq => Some(0x1),
            Command::StartSweep => Some(0x2),
            Command::IncrementFreq => Some(0x3),
            Command::RepeatFreq => Some(0x4),
            Command::MeasureTemp => Some(0x9),
            Command::PowerDown => Some(0xA),
            Command::Standby => Some(0xB),
            Command::Idle => Some(0x0),
            Command::Reset => None,
        }
    }

    /// Inverse of [`Command::nibble`].
    pub const fn from_nibble(nibble: u8) -> Option<Command> {
        match nibble {
            0x1 => Some(Command::InitStartFreq),
            0x2 => Some(Command::StartSweep),
            0x3 => Some(Command::IncrementFreq),
            0x4 => Some(Command::RepeatFreq),
            0x9 => Some(Command::MeasureTemp),
            0xA => Some(Command::PowerDown),
            0xB => Some(Command::Standby),
            0x0 => Some(Command::Idle),
            _ => None,
        }
    }
}

/// PGA gain applied to the response signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Gain {
    X1 = 0b1,
    X5 = 0b0,
}

/// Excitation voltage ranges, peak-to-peak amplitude of the output signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ExcitationVoltage {
    V2p0 = 0b00,
    V1p0 = 0b11,
    V0p4 = 0b10,
    V0p2 = 0b01,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ClockSource {
    Internal = 0b0,
    External = 0b1,
}

/// Multiplier applied to the settling cycle count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SettlingMultiplier {
    X1 = 0b00,
    X2 = 0b01,
    X4 = 0b11,
}

impl SettlingMultiplier {
    pub const fn factor(self) -> u16 {
        match self {
            SettlingMultiplier::X1 => 1,
            SettlingMultiplier::X2 => 2,
            SettlingMultiplier::X4 => 4,
        }
    }
}

pub const MIN_FREQUENCY_HZ: f64 = 1_000.0;
pub const MAX_FREQUENCY_HZ: f64 = 100_000.0;
pub const MAX_INCREMENTS: u16 = 511;
pub const MAX_SETTLING_CYCLES: u16 = 511;

/// Internal oscillator frequency.
pub const INTERNAL_CLOCK_HZ: f64 = 16_776_000.0;
