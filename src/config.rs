use byteorder::ByteOrder as _;

use crate::constants::*;
use crate::RangeError;

/// Where the master clock comes from, along with its frequency.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MasterClock {
    Internal,
    /// External clock on MCLK, frequency in Hz.
    External(f64),
}

impl MasterClock {
    pub fn frequency_hz(self) -> f64 {
        match self {
            MasterClock::Internal => INTERNAL_CLOCK_HZ,
            MasterClock::External(hz) => hz,
        }
    }

    pub fn source(self) -> ClockSource {
        match self {
            MasterClock::Internal => ClockSource::Internal,
            MasterClock::External(_) => ClockSource::External,
        }
    }
}

/// Output cycles the chip waits at each point before sampling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SettlingTime {
    cycles: u16,
    multiplier: SettlingMultiplier,
}

impl SettlingTime {
    pub fn new(cycles: u16, multiplier: SettlingMultiplier) -> Result<Self, RangeError> {
        if cycles > MAX_SETTLING_CYCLES {
            return Err(RangeError::SettlingCycles);
        }

        Ok(Self { cycles, multiplier })
    }

    pub fn cycles(self) -> u16 {
        self.cycles
    }

    pub fn multiplier(self) -> SettlingMultiplier {
        self.multiplier
    }

    /// Cycle count with the multiplier applied, at most 2044.
    pub fn total_cycles(self) -> u16 {
        self.cycles * self.multiplier.factor()
    }

    /// Contents of SettleTime1 and SettleTime0: cycle count in bits 8-0,
    /// multiplier in bits 10-9.
    pub fn to_bytes(self) -> [u8; 2] {
        let word = self.cycles | (u16::from(self.multiplier as u8) << 9);

        let mut buf = [0u8; 2];
        byteorder::BigEndian::write_u16(&mut buf, word);
        buf
    }
}

impl Default for SettlingTime {
    fn default() -> Self {
        Self {
            cycles: 15,
            multiplier: SettlingMultiplier::X1,
        }
    }
}

/// Status polling cadence.
///
/// `timeout_us` only counts the `interval_us` sleeps between status reads.
/// Each read also occupies the bus (roughly 0.3 ms at 100 kHz I2C), so the
/// wall-clock bound is `attempts() * (interval_us + read time)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollConfig {
    pub interval_us: u32,
    pub timeout_us: u32,
}

impl PollConfig {
    /// Number of status reads, `timeout_us / interval_us` and at least one.
    pub fn attempts(self) -> u32 {
        (self.timeout_us / self.interval_us.max(1)).max(1)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_us: 100,
            timeout_us: 100_000,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub clock: MasterClock,
    pub gain: Gain,
    pub excitation: ExcitationVoltage,
    pub settling: SettlingTime,
    /// Wait between initializing the start frequency and starting the sweep.
    pub start_settle_us: u32,
    pub poll: PollConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clock: MasterClock::Internal,
            gain: Gain::X1,
            excitation: ExcitationVoltage::V2p0,
            settling: SettlingTime::default(),
            start_settle_us: 10_000,
            poll: PollConfig::default(),
        }
    }
}

impl Config {
    /// Checks everything that can be checked without touching the bus.
    pub fn validate(&self) -> Result<(), RangeError> {
        let mclk = self.clock.frequency_hz();
        if !mclk.is_finite() || mclk <= 0.0 {
            return Err(RangeError::MasterClock);
        }

        if self.poll.interval_us == 0 {
            return Err(RangeError::PollInterval);
        }

        Ok(())
    }
}
