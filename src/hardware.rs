//! Seams to the platform interrupt and timer plumbing.
//!
//! The core never touches registers. A board adapter implements the two
//! services below and calls the registered handler from its interrupt
//! vector. Handlers are passed in explicitly, so several tachometers can
//! coexist without a global "active instance".

/// Receiver for rising edges on the sensor input.
pub trait EdgeHandler: Sync {
    /// Runs in the edge interrupt with the current timestamp in microseconds.
    fn on_edge(&self, now_micros: u32);
}

/// Receiver for time-base ticks.
pub trait TickHandler: Sync {
    /// Runs in the timer interrupt once per sample period.
    fn on_tick(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HardwareError {
    /// Pin has no edge interrupt on this board
    UnsupportedPin(u8),
    UnsupportedTimer(u8),
    /// Timer already owned by someone else
    TimerBusy(u8),
    /// Period not representable by the timer hardware
    InvalidPeriod(u16),
}

impl core::fmt::Display for HardwareError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HardwareError::UnsupportedPin(pin) => write!(f, "pin {} has no edge interrupt", pin),
            HardwareError::UnsupportedTimer(id) => write!(f, "timer {} is not supported", id),
            HardwareError::TimerBusy(id) => write!(f, "timer {} is already in use", id),
            HardwareError::InvalidPeriod(ms) => {
                write!(f, "period of {} ms is not supported by the timer", ms)
            }
        }
    }
}

impl core::error::Error for HardwareError {}

/// Edge-triggered interrupt on a digital input.
///
/// The service must run the handler to completion before delivering the
/// next edge on the same input.
pub trait EdgeInterruptService<'a> {
    fn attach(&mut self, pin: u8, handler: &'a dyn EdgeHandler) -> Result<(), HardwareError>;

    /// Current timestamp on the same clock handed to `on_edge`.
    fn now_micros(&self) -> u32;
}

/// Periodic timer interrupt.
pub trait PeriodicTimerService<'a> {
    fn start(
        &mut self,
        timer_id: u8,
        period_ms: u16,
        handler: &'a dyn TickHandler,
    ) -> Result<(), HardwareError>;

    /// Change the period of a running timer.
    fn set_period(&mut self, timer_id: u8, period_ms: u16) -> Result<(), HardwareError>;

    fn stop(&mut self, timer_id: u8);
}
