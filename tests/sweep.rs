mod common;

use ad5933::{Ad5933, Config, DeviceMode, Error, MasterClock, PollConfig, RangeError, SweepParameters};
use common::{Event, NoopDelay, SimulatedAd5933};
use embedded_hal::i2c::ErrorKind;

#[test]
fn five_point_sweep_in_order() {
    let mut chip = SimulatedAd5933::new();
    let mut delay = NoopDelay::default();
    let mut adc = Ad5933::new(&mut chip, &mut delay).unwrap();

    let params = SweepParameters::new(1_000.0, 500.0, 4).unwrap();
    let points: Vec<_> = adc.sweep(params).unwrap().collect::<Result<_, _>>().unwrap();

    let freqs: Vec<f64> = points.iter().map(|p| p.frequency_hz).collect();
    assert_eq!(freqs, vec![1_000.0, 1_500.0, 2_000.0, 2_500.0, 3_000.0]);

    for (i, p) in points.iter().enumerate() {
        let (real, imag) = SimulatedAd5933::sample_for(i as u16);
        assert_eq!((p.real, p.imaginary), (real, imag));
    }

    assert_eq!(adc.mode(), DeviceMode::PowerDown);
    drop(adc);
    assert_eq!(chip.clobbered_results, 0);
}

#[test]
fn single_point_sweep() {
    let mut chip = SimulatedAd5933::new();
    let mut adc = Ad5933::new(&mut chip, NoopDelay::default()).unwrap();

    let params = SweepParameters::new(50_000.0, 1_000.0, 0).unwrap();
    let points: Vec<_> = adc.sweep(params).unwrap().collect();

    assert_eq!(points.len(), 1);
    assert_eq!(points[0].as_ref().unwrap().frequency_hz, 50_000.0);
    assert_eq!(adc.mode(), DeviceMode::PowerDown);
}

#[cfg(feature = "alloc")]
#[test]
fn sweep_register_traffic() {
    let mut chip = SimulatedAd5933::new();
    let mut adc = Ad5933::new(&mut chip, NoopDelay::default()).unwrap();

    let params = SweepParameters::new(30_000.0, 10.0, 2).unwrap();
    adc.run_sweep(params).unwrap();
    drop(adc);

    // 30 kHz and 10 Hz on the 16.776 MHz internal clock
    assert_eq!(&chip.regs[0x82..0x85], &[0x0E, 0xA6, 0x45]);
    assert_eq!(&chip.regs[0x85..0x88], &[0x00, 0x01, 0x40]);
    assert_eq!(&chip.regs[0x88..0x8A], &[0x00, 0x02]);
    assert_eq!(&chip.regs[0x8A..0x8C], &[0x00, 0x0F]);

    // power-on defaults, gain x1 and 2 Vpp keep the low nibble at 0x1
    assert_eq!(
        chip.writes_to(0x80),
        vec![0xA0, 0xA1, 0xB1, 0xB1, 0x11, 0x21, 0x31, 0x31, 0xA1]
    );
    assert_eq!(chip.writes_to(0x81), vec![0x10, 0x00]);
}

#[cfg(feature = "alloc")]
#[test]
fn results_read_before_increment() {
    let mut chip = SimulatedAd5933::new();
    let mut adc = Ad5933::new(&mut chip, NoopDelay::default()).unwrap();

    adc.run_sweep(SweepParameters::new(10_000.0, 1_000.0, 3).unwrap()).unwrap();
    drop(adc);

    let increment_at: Vec<usize> = chip
        .events
        .iter()
        .enumerate()
        .filter(|(_, e)| **e == Event::Write(0x80, 0x31))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(increment_at.len(), 3);

    for &i in increment_at.iter() {
        assert_eq!(chip.events[i - 1], Event::Read(0x97));
    }
    assert_eq!(chip.clobbered_results, 0);
}

#[test]
fn sweep_end_past_100khz_never_reaches_the_bus() {
    assert_eq!(SweepParameters::new(99_000.0, 500.0, 4), Err(RangeError::SweepEnd));
}

#[test]
fn unencodable_sweep_leaves_bus_untouched() {
    let mut chip = SimulatedAd5933::new();
    let config = Config {
        clock: MasterClock::External(1_000_000.0),
        ..Config::default()
    };
    let mut adc = Ad5933::new_with_config(&mut chip, NoopDelay::default(), config).unwrap();
    assert_eq!(adc.mode(), DeviceMode::Standby);

    let res = adc.sweep(SweepParameters::new(90_000.0, 1_000.0, 5).unwrap());
    assert!(matches!(res, Err(Error::Range(RangeError::CodeOverflow))));
    assert_eq!(adc.mode(), DeviceMode::Standby);
    drop(adc);

    let setup_writes = 1 + 3 + 2 + 1;
    assert_eq!(chip.writes().len(), setup_writes);
}

#[test]
fn bus_failure_mid_poll_keeps_earlier_samples() {
    let mut chip = SimulatedAd5933::new();
    chip.fail_status_read = Some(3);
    let mut adc = Ad5933::new(&mut chip, NoopDelay::default()).unwrap();

    let params = SweepParameters::new(1_000.0, 500.0, 4).unwrap();
    let items: Vec<_> = adc.sweep(params).unwrap().collect();

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].as_ref().unwrap().frequency_hz, 1_000.0);
    assert_eq!(items[1].as_ref().unwrap().frequency_hz, 1_500.0);
    assert!(matches!(items[2], Err(Error::Transport(ErrorKind::Other))));

    // no power down after the fault
    assert_eq!(adc.mode(), DeviceMode::Sweeping);
    drop(adc);
    assert_eq!(chip.writes_to(0x80).last(), Some(&0x31));
}

#[cfg(feature = "alloc")]
#[test]
fn run_sweep_returns_partial_session_on_error() {
    let mut chip = SimulatedAd5933::new();
    chip.fail_status_read = Some(4);
    let mut adc = Ad5933::new(&mut chip, NoopDelay::default()).unwrap();

    let abort = adc.run_sweep(SweepParameters::new(2_000.0, 100.0, 9).unwrap()).unwrap_err();

    assert!(matches!(abort.error, Error::Transport(_)));
    let freqs: Vec<f64> = abort.session.points().iter().map(|p| p.frequency_hz).collect();
    assert_eq!(freqs, vec![2_000.0, 2_100.0, 2_200.0]);
    assert_eq!(abort.session.parameters().increment_count(), 9);
}

#[test]
fn poll_times_out_instead_of_hanging() {
    let mut chip = SimulatedAd5933::new();
    chip.stuck = true;
    let mut delay = NoopDelay::default();
    let config = Config {
        poll: PollConfig {
            interval_us: 10,
            timeout_us: 1_000,
        },
        start_settle_us: 0,
        ..Config::default()
    };
    let mut adc = Ad5933::new_with_config(&mut chip, &mut delay, config).unwrap();

    let mut sweep = adc.sweep(SweepParameters::new(5_000.0, 100.0, 3).unwrap()).unwrap();
    assert!(matches!(sweep.next(), Some(Err(Error::Timeout { mode: DeviceMode::Sweeping }))));
    assert!(sweep.next().is_none());
    drop(sweep);
    drop(adc);

    assert_eq!(chip.status_reads, 100);
    assert_eq!(delay.total_ns, 99 * 10_000);
}

#[cfg(feature = "alloc")]
#[test]
fn missing_sweep_complete_stops_at_last_point() {
    let mut chip = SimulatedAd5933::new();
    chip.no_sweep_complete = true;
    let mut adc = Ad5933::new(&mut chip, NoopDelay::default()).unwrap();

    let session = adc.run_sweep(SweepParameters::new(1_000.0, 1_000.0, 2).unwrap()).unwrap();
    assert_eq!(session.points().len(), 3);
    assert_eq!(adc.mode(), DeviceMode::PowerDown);
}

#[test]
fn cancel_powers_down() {
    let mut chip = SimulatedAd5933::new();
    let mut adc = Ad5933::new(&mut chip, NoopDelay::default()).unwrap();

    let mut sweep = adc.sweep(SweepParameters::new(1_000.0, 500.0, 4).unwrap()).unwrap();
    assert!(sweep.next().unwrap().is_ok());
    sweep.cancel().unwrap();

    assert_eq!(adc.mode(), DeviceMode::PowerDown);
    drop(adc);
    assert_eq!(chip.writes_to(0x80).last(), Some(&0xA1));
}

#[cfg(feature = "alloc")]
#[test]
fn start_settle_is_waited() {
    let mut chip = SimulatedAd5933::new();
    let mut delay = NoopDelay::default();
    let config = Config {
        start_settle_us: 2_500,
        ..Config::default()
    };
    let mut adc = Ad5933::new_with_config(&mut chip, &mut delay, config).unwrap();

    adc.run_sweep(SweepParameters::new(1_000.0, 500.0, 1).unwrap()).unwrap();
    drop(adc);

    // chip answers every poll on the first read, so only the settle wait remains
    assert_eq!(delay.total_ns, 2_500_000);
}

#[cfg(feature = "alloc")]
#[test]
fn back_to_back_sweeps() {
    let mut chip = SimulatedAd5933::new();
    let mut adc = Ad5933::new(&mut chip, NoopDelay::default()).unwrap();

    let first = adc.run_sweep(SweepParameters::new(1_000.0, 500.0, 1).unwrap()).unwrap();
    let second = adc.run_sweep(SweepParameters::new(20_000.0, 1_000.0, 2).unwrap()).unwrap();

    assert_eq!(first.points().len(), 2);
    assert_eq!(second.points()[2].frequency_hz, 22_000.0);
}
