/// Shortest time base the timer collaborators are expected to support.
pub const MIN_SAMPLE_PERIOD_MS: u16 = 100;
pub const DEFAULT_SAMPLE_PERIOD_MS: u16 = 1000;
pub const DEFAULT_DEBOUNCE_MICROS: u16 = 100;
pub const DEFAULT_PULSES_PER_REV: u8 = 1;

/// Fixed-point scale of the smoothing coefficient. `ALPHA_SCALE` means pass-through.
pub const ALPHA_SCALE: u16 = 1000;
pub const DEFAULT_FILTER_ALPHA: u16 = 800;

/// Capacity of the moving-average history.
pub const MAX_WINDOW: u8 = 20;
pub const DEFAULT_WINDOW_SIZE: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    SamplePeriodTooShort,
    AlphaOutOfRange,
    WindowSizeOutOfRange,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::SamplePeriodTooShort => {
                write!(f, "sample period must be at least {} ms", MIN_SAMPLE_PERIOD_MS)
            }
            ConfigError::AlphaOutOfRange => {
                write!(f, "filter alpha must be in range 0..={}", ALPHA_SCALE)
            }
            ConfigError::WindowSizeOutOfRange => {
                write!(f, "window size must be in range 1..={}", MAX_WINDOW)
            }
        }
    }
}

impl core::error::Error for ConfigError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Digital input carrying the sensor signal
    pub sensor_pin: u8,
    /// Platform timer driving the time base
    pub timer_id: u8,
    pub sample_period_ms: u16,
    /// Minimum spacing between accepted edges
    pub debounce_micros: u16,
    /// 0 is accepted and yields RPM = 0
    pub pulses_per_revolution: u8,
    pub filter_enabled: bool,
    /// Weight of the new sample, 0..=1000
    pub filter_alpha: u16,
    /// Moving-average depth, 1..=MAX_WINDOW. 1 disables averaging.
    pub window_size: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sensor_pin: 2,
            timer_id: 1,
            sample_period_ms: DEFAULT_SAMPLE_PERIOD_MS,
            debounce_micros: DEFAULT_DEBOUNCE_MICROS,
            pulses_per_revolution: DEFAULT_PULSES_PER_REV,
            filter_enabled: false,
            filter_alpha: DEFAULT_FILTER_ALPHA,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl Config {
    /// Report the first out-of-range field without modifying anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_sample_period(self.sample_period_ms)?;
        validate_filter(self.filter_alpha, self.window_size)
    }

    /// Clamp out-of-range fields to safe values.
    ///
    /// Used at construction so a tachometer is always usable once built:
    /// a short period is raised to the minimum, an oversized alpha becomes
    /// pass-through and an invalid window falls back to the default depth.
    pub fn sanitized(mut self) -> Self {
        if self.sample_period_ms < MIN_SAMPLE_PERIOD_MS {
            self.sample_period_ms = MIN_SAMPLE_PERIOD_MS;
        }
        if self.filter_alpha > ALPHA_SCALE {
            self.filter_alpha = ALPHA_SCALE;
        }
        self.window_size = sanitize_window(self.window_size);
        self
    }
}

/// Out-of-range window sizes fall back to the default depth.
pub(crate) const fn sanitize_window(window_size: u8) -> u8 {
    if window_size < 1 || window_size > MAX_WINDOW {
        DEFAULT_WINDOW_SIZE
    } else {
        window_size
    }
}

pub fn validate_sample_period(period_ms: u16) -> Result<(), ConfigError> {
    if period_ms < MIN_SAMPLE_PERIOD_MS {
        return Err(ConfigError::SamplePeriodTooShort);
    }
    Ok(())
}

pub fn validate_filter(alpha: u16, window_size: u8) -> Result<(), ConfigError> {
    if alpha > ALPHA_SCALE {
        return Err(ConfigError::AlphaOutOfRange);
    }
    if window_size < 1 || window_size > MAX_WINDOW {
        return Err(ConfigError::WindowSizeOutOfRange);
    }
    Ok(())
}
