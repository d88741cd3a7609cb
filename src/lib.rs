#![cfg_attr(not(test), no_std)]

//! Driver for the AD5933 impedance converter over I2C.
//!
//! The driver keeps a shadow of the control registers, tracks the chip's
//! command state and refuses commands the chip does not define for the
//! current mode. Status polling is bounded by [`PollConfig`].

#[cfg(feature = "alloc")]
extern crate alloc;

use byteorder::ByteOrder as _;
use core::slice;
use embedded_hal::{delay::DelayNs, i2c::I2c};

mod config;
mod constants;
mod control;
mod frequency;
mod state;
mod sweep;
mod temperature;

pub use config::{Config, MasterClock, PollConfig, SettlingTime};
pub use constants::{
    ClockSource, Command, Control0Bits, Control1Bits, ExcitationVoltage, Gain, Register, RegisterBits,
    SettlingMultiplier, StatusBits, INTERNAL_CLOCK_HZ, MAX_FREQUENCY_HZ, MAX_INCREMENTS, MAX_SETTLING_CYCLES,
    MIN_FREQUENCY_HZ,
};
pub use control::{clear_bit, set_bit, ControlBits, ControlField, ControlRegister, ControlRegisters};
pub use frequency::FrequencyCode;
pub use state::DeviceMode;
#[cfg(feature = "alloc")]
pub use sweep::{SweepAbort, SweepSession};
pub use sweep::{SamplePoint, Sweep, SweepParameters};
pub use temperature::{decode_temperature, TemperatureReading};

use constants::*;

pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Which quantity was outside what the chip supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RangeError {
    /// Frequency outside 1 kHz to 100 kHz.
    Frequency,
    /// Negative or oversized frequency step.
    Increment,
    /// More than 511 increments.
    IncrementCount,
    /// Last sweep point lands above 100 kHz.
    SweepEnd,
    MasterClock,
    /// Frequency code does not fit in 24 bits.
    CodeOverflow,
    SettlingCycles,
    PollInterval,
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    Range(RangeError),
    /// `command` is not defined for the chip in mode `from`.
    InvalidTransition { from: DeviceMode, command: Command },
    Transport(E),
    /// The awaited status flag never showed up. `mode` is the last mode the
    /// chip was commanded into.
    Timeout { mode: DeviceMode },
}

impl<E> From<RangeError> for Error<E> {
    fn from(err: RangeError) -> Self {
        Error::Range(err)
    }
}

const DEVICE_ADDRESS: u8 = 0x0D;

/// Snapshot of the status register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status(pub u8);

impl Status {
    pub fn is_set(self, bit: StatusBits) -> bool {
        self.0 & (1 << bit.get()) != 0
    }

    pub fn impedance_valid(self) -> bool {
        self.is_set(StatusBits::ImpedanceValid)
    }

    pub fn temperature_valid(self) -> bool {
        self.is_set(StatusBits::TemperatureValid)
    }

    pub fn sweep_complete(self) -> bool {
        self.is_set(StatusBits::SweepComplete)
    }
}

pub struct Ad5933<I2C, D> {
    i2c_dev: I2C,
    delay: D,
    registers: ControlRegisters,
    config: Config,
    mode: DeviceMode,
    // imp-measure-complete seen for the current point, no command since
    point_ready: bool,
    // sweep-complete seen, cleared by anything but a repeat
    sweep_complete: bool,
}

impl<I2C: I2c, D: DelayNs> Ad5933<I2C, D> {
    #[inline]
    pub fn new(i2c_dev: I2C, delay: D) -> Result<Self, I2C::Error> {
        Self::new_with_config(i2c_dev, delay, Config::default())
    }

    /// Resets the chip, applies `config` and leaves it in standby.
    pub fn new_with_config(i2c_dev: I2C, delay: D, config: Config) -> Result<Self, I2C::Error> {
        config.validate()?;

        let mut adc = Self {
            i2c_dev,
            delay,
            registers: ControlRegisters::default(),
            config,
            mode: DeviceMode::Uninitialized,
            point_ready: false,
            sweep_complete: false,
        };

        adc.reset()?;
        adc.registers.write_field(&mut adc.i2c_dev, config.clock.source())?;
        adc.registers.write_field(&mut adc.i2c_dev, config.excitation)?;
        adc.registers.write_field(&mut adc.i2c_dev, config.gain)?;
        adc.write_settling_time(config.settling)?;
        adc.standby()?;

        Ok(adc)
    }

    pub fn destroy(self) -> (I2C, D) {
        let Self { i2c_dev, delay, .. } = self;
        (i2c_dev, delay)
    }

    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registers(&self) -> &ControlRegisters {
        &self.registers
    }

    pub fn master_clock_hz(&self) -> f64 {
        self.config.clock.frequency_hz()
    }

    /// Control0 writes carry the command nibble, so the chip runs the last
    /// command again. Refused while that would disturb a measurement.
    pub fn set_gain(&mut self, gain: Gain) -> Result<(), I2C::Error> {
        self.check_control0_write()?;
        self.registers.write_field(&mut self.i2c_dev, gain)?;
        self.config.gain = gain;
        Ok(())
    }

    /// Same restrictions as [`Ad5933::set_gain`].
    pub fn set_excitation_voltage(&mut self, voltage: ExcitationVoltage) -> Result<(), I2C::Error> {
        self.check_control0_write()?;
        self.registers.write_field(&mut self.i2c_dev, voltage)?;
        self.config.excitation = voltage;
        Ok(())
    }

    pub fn set_master_clock(&mut self, clock: MasterClock) -> Result<(), I2C::Error> {
        let hz = clock.frequency_hz();
        if !hz.is_finite() || hz <= 0.0 {
            return Err(RangeError::MasterClock.into());
        }

        self.registers.write_field(&mut self.i2c_dev, clock.source())?;
        self.config.clock = clock;
        Ok(())
    }

    pub fn set_settling_time(&mut self, settling: SettlingTime) -> Result<(), I2C::Error> {
        self.write_settling_time(settling)?;
        self.config.settling = settling;
        Ok(())
    }

    pub fn set_poll_config(&mut self, poll: PollConfig) -> Result<(), I2C::Error> {
        if poll.interval_us == 0 {
            return Err(RangeError::PollInterval.into());
        }

        self.config.poll = poll;
        Ok(())
    }

    pub fn reset(&mut self) -> Result<(), I2C::Error> {
        self.command(Command::Reset)
    }

    pub fn standby(&mut self) -> Result<(), I2C::Error> {
        self.command(Command::Standby)
    }

    pub fn idle(&mut self) -> Result<(), I2C::Error> {
        self.command(Command::Idle)
    }

    /// The chip starts settling at the start frequency. Wait at least the
    /// settling time before [`Ad5933::start_freq_sweep`].
    pub fn init_with_start_freq(&mut self) -> Result<(), I2C::Error> {
        self.command(Command::InitStartFreq)
    }

    pub fn start_freq_sweep(&mut self) -> Result<(), I2C::Error> {
        self.command(Command::StartSweep)
    }

    /// Only valid once the current point has been measured, and never after
    /// the chip reported sweep-complete.
    pub fn increment_freq(&mut self) -> Result<(), I2C::Error> {
        self.command(Command::IncrementFreq)
    }

    /// Measures the current point again.
    pub fn repeat_freq(&mut self) -> Result<(), I2C::Error> {
        self.command(Command::RepeatFreq)
    }

    pub fn measure_temp(&mut self) -> Result<(), I2C::Error> {
        self.command(Command::MeasureTemp)
    }

    pub fn power_down(&mut self) -> Result<(), I2C::Error> {
        self.command(Command::PowerDown)
    }

    /// Issues `cmd` if the current mode allows it.
    pub fn command(&mut self, cmd: Command) -> Result<(), I2C::Error> {
        let needs_point = matches!(cmd, Command::IncrementFreq | Command::RepeatFreq);
        let past_end = cmd == Command::IncrementFreq && self.sweep_complete;

        let next = match self.mode.after(cmd) {
            Some(next) if (!needs_point || self.point_ready) && !past_end => next,
            _ => {
                return Err(Error::InvalidTransition {
                    from: self.mode,
                    command: cmd,
                })
            }
        };

        self.registers.write_command(&mut self.i2c_dev, cmd)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("AD5933 {} -> {} via {}", self.mode, next, cmd);

        self.mode = next;
        self.point_ready = false;
        if cmd != Command::RepeatFreq {
            self.sweep_complete = false;
        }
        Ok(())
    }

    fn check_control0_write(&self) -> Result<(), I2C::Error> {
        match self.mode {
            DeviceMode::InitStartFreq | DeviceMode::Sweeping | DeviceMode::MeasuringTemp => {
                Err(Error::InvalidTransition {
                    from: self.mode,
                    command: Command::from_nibble(self.registers.command_nibble()).unwrap_or(Command::Idle),
                })
            }
            _ => Ok(()),
        }
    }

    pub fn status(&mut self) -> Result<Status, I2C::Error> {
        self.get_register(Register::Status).map(Status)
    }

    /// Checks `bit` once, returns nb::Error::WouldBlock if it is not set yet
    pub fn poll_status(&mut self, bit: StatusBits) -> nb::Result<Status, Error<I2C::Error>> {
        let status = self.status().map_err(nb::Error::Other)?;

        if !status.is_set(bit) {
            return Err(nb::Error::WouldBlock);
        }

        if let StatusBits::ImpedanceValid = bit {
            self.point_ready = true;
            self.sweep_complete = status.sweep_complete();
        }

        Ok(status)
    }

    /// Polls `bit` until it is set, at most [`PollConfig::attempts`] status
    /// reads with `interval_us` sleeps in between. The bus time of the reads
    /// comes on top of `timeout_us`.
    pub fn wait_for(&mut self, bit: StatusBits) -> Result<Status, I2C::Error> {
        let poll = self.config.poll;

        for attempt in 0..poll.attempts() {
            if attempt > 0 {
                self.delay.delay_us(poll.interval_us);
            }

            match self.poll_status(bit) {
                Ok(status) => return Ok(status),
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(e)) => return Err(e),
            }
        }

        #[cfg(feature = "defmt")]
        defmt::warn!("AD5933 timed out waiting for {} in {}", bit, self.mode);

        Err(Error::Timeout { mode: self.mode })
    }

    /// Real and imaginary parts of the current point, returns
    /// nb::Error::WouldBlock while the measurement is still running
    pub fn read_impedance(&mut self) -> nb::Result<(i16, i16), Error<I2C::Error>> {
        if !self.point_ready {
            self.poll_status(StatusBits::ImpedanceValid)?;
        }

        self.read_impedance_unchecked().map_err(nb::Error::Other)
    }

    /// assumes imp-measure-complete has been seen for the current point.
    /// Read before the next command, which overwrites the result
    pub fn read_impedance_unchecked(&mut self) -> Result<(i16, i16), I2C::Error> {
        let real = self.get_register_pair(Register::Real1, Register::Real0)?;
        let imag = self.get_register_pair(Register::Imag1, Register::Imag0)?;

        Ok((
            byteorder::BigEndian::read_i16(&real),
            byteorder::BigEndian::read_i16(&imag),
        ))
    }

    /// Writes start frequency, increment and increment count.
    pub fn program_sweep(&mut self, params: &SweepParameters) -> Result<(), I2C::Error> {
        params.validate()?;

        let mclk = self.master_clock_hz();
        let start = FrequencyCode::encode(params.start_hz(), mclk)?;
        let increment = FrequencyCode::encode_increment(params.increment_hz(), mclk)?;

        let mut count = [0u8; 2];
        byteorder::BigEndian::write_u16(&mut count, params.increment_count());

        self.set_registers(Register::FreqMin2, &start.to_bytes())?;
        self.set_registers(Register::FreqInc2, &increment.to_bytes())?;
        self.set_registers(Register::IncNum1, &count)
    }

    fn write_settling_time(&mut self, settling: SettlingTime) -> Result<(), I2C::Error> {
        self.set_registers(Register::SettleTime1, &settling.to_bytes())
    }

    pub(crate) fn settle_start(&mut self) {
        self.delay.delay_us(self.config.start_settle_us);
    }

    fn set_registers(&mut self, first: Register, vals: &[u8]) -> Result<(), I2C::Error> {
        let first = first as u8;

        for (offset, &val) in (first..).zip(vals.iter()) {
            write_register_raw(&mut self.i2c_dev, offset, val)?;
        }

        Ok(())
    }

    pub(crate) fn get_register_pair(&mut self, high: Register, low: Register) -> Result<[u8; 2], I2C::Error> {
        Ok([self.get_register(high)?, self.get_register(low)?])
    }

    fn get_register(&mut self, reg: Register) -> Result<u8, I2C::Error> {
        self.request_register(reg)?;

        let mut val = 0;
        self.i2c_dev
            .read(DEVICE_ADDRESS, slice::from_mut(&mut val))
            .map_err(Error::Transport)?;

        Ok(val)
    }

    fn request_register(&mut self, reg: Register) -> Result<(), I2C::Error> {
        let reg = reg as u8;

        self.i2c_dev
            .write(DEVICE_ADDRESS, slice::from_ref(&reg))
            .map_err(Error::Transport)
    }
}

pub(crate) fn write_register<I: I2c>(i2c: &mut I, reg: Register, val: u8) -> Result<(), I::Error> {
    write_register_raw(i2c, reg as u8, val)
}

fn write_register_raw<I: I2c>(i2c: &mut I, reg: u8, val: u8) -> Result<(), I::Error> {
    let transaction = [reg, val];

    #[cfg(feature = "defmt")]
    defmt::trace!("AD5933 0x{=u8:02x} <- 0x{=u8:02x}", reg, val);

    i2c.write(DEVICE_ADDRESS, &transaction).map_err(Error::Transport)
}
