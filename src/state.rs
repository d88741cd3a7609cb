//! Command state machine as seen from the driver.

use crate::constants::Command;

/// The chip's operating mode. Only commands move it, except that a finished
/// temperature conversion drops back to [`DeviceMode::Idle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceMode {
    /// Before the first reset.
    Uninitialized,
    PowerDown,
    Standby,
    Idle,
    InitStartFreq,
    Sweeping,
    MeasuringTemp,
}

impl DeviceMode {
    /// Mode the chip ends up in after `cmd`, `None` if `cmd` is undefined here.
    ///
    /// Increment and repeat additionally require the current point to have
    /// completed, which the driver tracks on its own.
    pub fn after(self, cmd: Command) -> Option<DeviceMode> {
        use DeviceMode::*;

        match (self, cmd) {
            (_, Command::Standby) => Some(Standby),
            (_, Command::PowerDown) => Some(PowerDown),
            (Uninitialized, Command::Reset) | (PowerDown, Command::Reset) | (Standby, Command::Reset) => {
                Some(Standby)
            }
            (Standby, Command::InitStartFreq) => Some(InitStartFreq),
            (InitStartFreq, Command::StartSweep) => Some(Sweeping),
            (Sweeping, Command::IncrementFreq) | (Sweeping, Command::RepeatFreq) => Some(Sweeping),
            (Standby, Command::MeasureTemp) | (Idle, Command::MeasureTemp) => Some(MeasuringTemp),
            (Standby, Command::Idle) | (Idle, Command::Idle) | (MeasuringTemp, Command::Idle) => Some(Idle),
            _ => None,
        }
    }
}
