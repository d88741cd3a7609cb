//! Frequency sweep acquisition.

#[cfg(feature = "alloc")]
use alloc::vec::Vec;
use embedded_hal::{delay::DelayNs, i2c::I2c};

use crate::constants::{StatusBits, MAX_FREQUENCY_HZ, MAX_INCREMENTS, MIN_FREQUENCY_HZ};
use crate::{Ad5933, RangeError, Result};

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SweepParameters {
    start_hz: f64,
    increment_hz: f64,
    increment_count: u16,
}

impl SweepParameters {
    /// A sweep of `increment_count + 1` points starting at `start_hz`.
    pub fn new(start_hz: f64, increment_hz: f64, increment_count: u16) -> core::result::Result<Self, RangeError> {
        let params = Self {
            start_hz,
            increment_hz,
            increment_count,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> core::result::Result<(), RangeError> {
        if !(MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ).contains(&self.start_hz) {
            return Err(RangeError::Frequency);
        }

        if !(0.0..=MAX_FREQUENCY_HZ).contains(&self.increment_hz) {
            return Err(RangeError::Increment);
        }

        if self.increment_count > MAX_INCREMENTS {
            return Err(RangeError::IncrementCount);
        }

        if self.stop_hz() > MAX_FREQUENCY_HZ {
            return Err(RangeError::SweepEnd);
        }

        Ok(())
    }

    pub fn start_hz(&self) -> f64 {
        self.start_hz
    }

    pub fn increment_hz(&self) -> f64 {
        self.increment_hz
    }

    pub fn increment_count(&self) -> u16 {
        self.increment_count
    }

    pub fn points(&self) -> usize {
        usize::from(self.increment_count) + 1
    }

    /// Nominal frequency of point `index`.
    pub fn frequency_at(&self, index: u16) -> f64 {
        self.start_hz + f64::from(index) * self.increment_hz
    }

    pub fn stop_hz(&self) -> f64 {
        self.frequency_at(self.increment_count)
    }
}

/// One measured point of a sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SamplePoint {
    pub frequency_hz: f64,
    pub real: i16,
    pub imaginary: i16,
}

impl SamplePoint {
    pub fn magnitude(&self) -> f64 {
        let re = f64::from(self.real);
        let im = f64::from(self.imaginary);
        libm::sqrt(re * re + im * im)
    }

    /// Phase in radians, -pi to pi.
    pub fn phase(&self) -> f64 {
        libm::atan2(f64::from(self.imaginary), f64::from(self.real))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Measure,
    Increment,
    PowerDown,
    Done,
}

/// A running sweep. Yields one sample per frequency point and powers the
/// chip down after the last one.
///
/// The sweep holds the driver borrowed for its whole lifetime. Once an item
/// is an error the sweep is over; the chip is left in whatever mode the last
/// successful command put it in, possibly mid-sweep.
pub struct Sweep<'a, I2C, D> {
    adc: &'a mut Ad5933<I2C, D>,
    params: SweepParameters,
    index: u16,
    stage: Stage,
}

impl<'a, I2C: I2c, D: DelayNs> Sweep<'a, I2C, D> {
    pub fn parameters(&self) -> &SweepParameters {
        &self.params
    }

    /// Stops polling and powers the chip down. The chip itself cannot abort a
    /// measurement in flight.
    pub fn cancel(self) -> Result<(), I2C::Error> {
        self.adc.power_down()
    }

    fn measure(&mut self) -> Result<SamplePoint, I2C::Error> {
        if self.stage == Stage::Increment {
            self.adc.increment_freq()?;
        }

        let status = self.adc.wait_for(StatusBits::ImpedanceValid)?;
        let (real, imaginary) = self.adc.read_impedance_unchecked()?;

        let point = SamplePoint {
            frequency_hz: self.params.frequency_at(self.index),
            real,
            imaginary,
        };

        // never step past the programmed range, flag or not
        let last = self.index >= self.params.increment_count();

        if status.sweep_complete() || last {
            self.stage = Stage::PowerDown;
        } else {
            self.index += 1;
            self.stage = Stage::Increment;
        }

        Ok(point)
    }
}

impl<'a, I2C: I2c, D: DelayNs> Iterator for Sweep<'a, I2C, D> {
    type Item = Result<SamplePoint, I2C::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.stage {
            Stage::Done => None,
            Stage::PowerDown => {
                self.stage = Stage::Done;
                self.adc.power_down().err().map(Err)
            }
            Stage::Measure | Stage::Increment => {
                let res = self.measure();
                if res.is_err() {
                    self.stage = Stage::Done;
                }
                Some(res)
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.stage {
            Stage::Done | Stage::PowerDown => (0, Some(1)),
            _ => (0, Some(self.params.points() - usize::from(self.index))),
        }
    }
}

impl<'a, I2C, D> core::iter::FusedIterator for Sweep<'a, I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
}

impl<I2C: I2c, D: DelayNs> Ad5933<I2C, D> {
    /// Programs the range and starts the sweep. Nothing touches the bus if
    /// `params` is out of range.
    pub fn sweep(&mut self, params: SweepParameters) -> Result<Sweep<'_, I2C, D>, I2C::Error> {
        self.program_sweep(&params)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("AD5933 sweep {} Hz + {} x {} Hz", params.start_hz(), params.increment_count(), params.increment_hz());

        self.standby()?;
        self.init_with_start_freq()?;
        self.settle_start();
        self.start_freq_sweep()?;

        Ok(Sweep {
            adc: self,
            params,
            index: 0,
            stage: Stage::Measure,
        })
    }

    /// Runs a whole sweep. On failure the samples taken so far come back in
    /// the [`SweepAbort`].
    #[cfg(feature = "alloc")]
    pub fn run_sweep(&mut self, params: SweepParameters) -> core::result::Result<SweepSession, SweepAbort<I2C::Error>> {
        let mut session = SweepSession {
            params,
            points: Vec::with_capacity(params.points()),
        };

        let sweep = match self.sweep(params) {
            Ok(sweep) => sweep,
            Err(error) => return Err(SweepAbort { error, session }),
        };

        for item in sweep {
            match item {
                Ok(point) => session.points.push(point),
                Err(error) => return Err(SweepAbort { error, session }),
            }
        }

        Ok(session)
    }
}

/// Samples of one sweep, in ascending frequency order.
#[cfg(feature = "alloc")]
#[derive(Clone, Debug, PartialEq)]
pub struct SweepSession {
    params: SweepParameters,
    points: Vec<SamplePoint>,
}

#[cfg(feature = "alloc")]
impl SweepSession {
    pub fn parameters(&self) -> &SweepParameters {
        &self.params
    }

    pub fn points(&self) -> &[SamplePoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<SamplePoint> {
        self.points
    }
}

/// A sweep that stopped early, with whatever it collected before the error.
#[cfg(feature = "alloc")]
#[derive(Debug)]
pub struct SweepAbort<E> {
    pub error: crate::Error<E>,
    pub session: SweepSession,
}
