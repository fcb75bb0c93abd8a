/// Noise filtering implementations
///
/// Two integer stages run in the time-base interrupt: exponential smoothing
/// of frequency and RPM, then an optional moving average over the smoothed
/// frequency with RPM derived back from the averaged value.
mod ema;
mod moving_avg;

pub use ema::EmaFilter;
pub use moving_avg::MovingAvgFilter;

use crate::config::{ConfigError, validate_filter};
use crate::rate::{self, Rate};

/// Filter tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FilterSettings {
    /// Weight of the new sample, 0..=1000. 1000 disables smoothing.
    pub alpha: u16,
    /// Moving-average depth, 1..=MAX_WINDOW. 1 disables averaging.
    pub window_size: u8,
}

impl FilterSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_filter(self.alpha, self.window_size)
    }

    /// Alpha in the high half, window in the low byte, so both travel
    /// through one `AtomicCell<u32>`.
    pub(crate) const fn to_bits(self) -> u32 {
        ((self.alpha as u32) << 16) | self.window_size as u32
    }

    pub(crate) const fn from_bits(bits: u32) -> Self {
        Self {
            alpha: (bits >> 16) as u16,
            window_size: bits as u8,
        }
    }
}

/// Smoothing pipeline for raw frequency/RPM readings.
///
/// The smoothed frequency accumulator doubles as the published filtered
/// frequency, so with averaging active the next smoothing step starts from
/// the averaged value.
#[derive(Debug, Clone)]
pub struct DigitalFilter {
    enabled: bool,
    alpha: u16,
    frequency: EmaFilter,
    rpm: EmaFilter,
    history: MovingAvgFilter,
}

impl DigitalFilter {
    /// Out-of-range `settings` are sanitized like `Config::sanitized`: alpha
    /// is capped at pass-through and the window falls back to the default.
    pub fn new(enabled: bool, settings: FilterSettings) -> Self {
        Self {
            enabled,
            alpha: settings.alpha.min(crate::config::ALPHA_SCALE),
            frequency: EmaFilter::new(),
            rpm: EmaFilter::new(),
            history: MovingAvgFilter::new(settings.window_size),
        }
    }

    /// Feed one raw reading. Returns `None` and leaves state untouched while
    /// filtering is disabled.
    pub fn update(&mut self, raw: Rate, pulses_per_rev: u8) -> Option<Rate> {
        if !self.enabled {
            return None;
        }

        let frequency_hz = self.frequency.apply(raw.frequency_hz, self.alpha);
        // Overwritten below when averaging is active
        self.rpm.apply(raw.rpm, self.alpha);

        if self.history.window_size() > 1 {
            let averaged = self.history.apply(frequency_hz);
            self.frequency.set(averaged);
            self.rpm.set(rate::rpm_from_frequency(averaged, pulses_per_rev));
        }

        Some(self.filtered())
    }

    /// Externally visible filtered values: zero while filtering is disabled.
    pub fn output(&self) -> Rate {
        if self.enabled {
            self.filtered()
        } else {
            Rate::ZERO
        }
    }

    /// Internal accumulators regardless of the enabled flag.
    pub fn filtered(&self) -> Rate {
        Rate {
            frequency_hz: self.frequency.value(),
            rpm: self.rpm.value(),
        }
    }

    /// Zero both accumulators and clear the history.
    pub fn reset(&mut self) {
        self.frequency.reset();
        self.rpm.reset();
        self.history.reset();
    }

    /// Restart from `current` without a discontinuity: accumulators take the
    /// given reading and the history is cleared.
    pub fn reset_to(&mut self, current: Rate) {
        self.frequency.set(current.frequency_hz);
        self.rpm.set(current.rpm);
        self.history.reset();
    }

    /// Validate and apply new tuning. Rejected input leaves everything as is;
    /// accepted input clears the history.
    pub fn set_parameters(&mut self, settings: FilterSettings) -> Result<(), ConfigError> {
        settings.validate()?;
        self.alpha = settings.alpha;
        self.history.set_window_size(settings.window_size);
        Ok(())
    }

    /// Disabling snaps the accumulators to `last_raw` and clears the history.
    pub fn set_enabled(&mut self, enabled: bool, last_raw: Rate) {
        self.enabled = enabled;
        if !enabled {
            self.reset_to(last_raw);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn settings(&self) -> FilterSettings {
        FilterSettings {
            alpha: self.alpha,
            // window_size is at most MAX_WINDOW
            window_size: self.history.window_size() as u8,
        }
    }

    /// Valid entries in the moving-average history.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}
