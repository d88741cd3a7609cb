#![allow(dead_code)]

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};

pub const ADDRESS: u8 = 0x0D;

const CONTROL0: u8 = 0x80;
const INC_NUM1: u8 = 0x88;
const STATUS: u8 = 0x8F;
const TEMP1: u8 = 0x92;
const REAL1: u8 = 0x94;
const IMAG0: u8 = 0x97;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Write(u8, u8),
    Read(u8),
}

/// Register-level model of the chip, enough to run sweeps and temperature
/// conversions against.
pub struct SimulatedAd5933 {
    pub regs: [u8; 256],
    pub events: Vec<Event>,
    pointer: u8,
    point: u16,
    pub status_reads: usize,
    /// Status read number (1-based) that fails on the bus.
    pub fail_status_read: Option<usize>,
    /// Status never reports a finished measurement.
    pub stuck: bool,
    /// Sweep-complete is never raised.
    pub no_sweep_complete: bool,
    pub temperature_raw: u16,
    pub result_fresh: bool,
    pub clobbered_results: usize,
}

impl SimulatedAd5933 {
    pub fn new() -> Self {
        Self {
            regs: [0; 256],
            events: Vec::new(),
            pointer: 0,
            point: 0,
            status_reads: 0,
            fail_status_read: None,
            stuck: false,
            no_sweep_complete: false,
            temperature_raw: 800,
            result_fresh: false,
            clobbered_results: 0,
        }
    }

    pub fn sample_for(point: u16) -> (i16, i16) {
        (1000 + point as i16, -100 - point as i16)
    }

    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                Event::Write(reg, val) => Some((reg, val)),
                Event::Read(_) => None,
            })
            .collect()
    }

    pub fn writes_to(&self, reg: u8) -> Vec<u8> {
        self.writes()
            .into_iter()
            .filter(|&(r, _)| r == reg)
            .map(|(_, v)| v)
            .collect()
    }

    fn increments(&self) -> u16 {
        u16::from_be_bytes([self.regs[INC_NUM1 as usize], self.regs[INC_NUM1 as usize + 1]]) & 0x1FF
    }

    fn measure(&mut self) {
        if self.result_fresh {
            self.clobbered_results += 1;
        }

        let (real, imag) = Self::sample_for(self.point);
        self.regs[REAL1 as usize..REAL1 as usize + 2].copy_from_slice(&real.to_be_bytes());
        self.regs[REAL1 as usize + 2..REAL1 as usize + 4].copy_from_slice(&imag.to_be_bytes());
        self.result_fresh = true;

        if self.stuck {
            return;
        }

        let mut status = 0x01;
        if self.point >= self.increments() && !self.no_sweep_complete {
            status |= 0x04;
        }
        self.regs[STATUS as usize] = status;
    }

    fn command(&mut self, nibble: u8) {
        self.regs[STATUS as usize] = 0;

        match nibble {
            0x1 => self.point = 0,
            0x2 => self.measure(),
            0x3 => {
                self.point += 1;
                self.measure();
            }
            0x4 => self.measure(),
            0x9 => {
                let raw = self.temperature_raw.to_be_bytes();
                self.regs[TEMP1 as usize..TEMP1 as usize + 2].copy_from_slice(&raw);
                if !self.stuck {
                    self.regs[STATUS as usize] = 0x02;
                }
            }
            _ => {}
        }
    }

    fn write_register(&mut self, reg: u8, val: u8) {
        self.events.push(Event::Write(reg, val));
        self.regs[reg as usize] = val;

        if reg == CONTROL0 {
            self.command(val >> 4);
        }
    }

    fn read_register(&mut self) -> Result<u8, ErrorKind> {
        let reg = self.pointer;

        if reg == STATUS {
            self.status_reads += 1;
            if self.fail_status_read == Some(self.status_reads) {
                return Err(ErrorKind::Other);
            }
        }

        self.events.push(Event::Read(reg));
        if reg == IMAG0 {
            self.result_fresh = false;
        }

        Ok(self.regs[reg as usize])
    }
}

impl ErrorType for SimulatedAd5933 {
    type Error = ErrorKind;
}

impl I2c for SimulatedAd5933 {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        assert_eq!(address, ADDRESS);

        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => match bytes.len() {
                    1 => self.pointer = bytes[0],
                    2 => self.write_register(bytes[0], bytes[1]),
                    n => panic!("unexpected {}-byte write", n),
                },
                Operation::Read(buf) => {
                    for b in buf.iter_mut() {
                        *b = self.read_register()?;
                    }
                }
            }
        }

        Ok(())
    }
}

/// Records how long the driver asked to sleep instead of sleeping.
#[derive(Default)]
pub struct NoopDelay {
    pub total_ns: u64,
}

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}
