use crate::atomic_cell::AtomicCell;
use crate::config::{Config, ConfigError, validate_sample_period};
use crate::filters::{DigitalFilter, FilterSettings};
use crate::hardware::{
    EdgeHandler, EdgeInterruptService, HardwareError, PeriodicTimerService, TickHandler,
};
use crate::pulse_counter::PulseCounter;
use crate::rate::{self, Rate};
use crate::state::SystemState;
use crate::tick_local::TickLocal;

// Filter requests posted by the main context, applied by the next tick in
// this order.
const REQUEST_RESET: u8 = 1 << 0;
const REQUEST_RESTART_FROM_RAW: u8 = 1 << 1;
const REQUEST_APPLY_SETTINGS: u8 = 1 << 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    /// Interrupt registration failed; the instance is now in `SystemState::Error`
    Hardware(HardwareError),
    /// A previous initialization failed
    Faulted,
    /// Called again while an initialization is still running
    InProgress,
}

impl core::fmt::Display for InitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            InitError::Hardware(e) => write!(f, "hardware registration failed: {}", e),
            InitError::Faulted => write!(f, "tachometer is in the error state"),
            InitError::InProgress => write!(f, "initialization already in progress"),
        }
    }
}

impl core::error::Error for InitError {}

impl From<HardwareError> for InitError {
    fn from(e: HardwareError) -> Self {
        InitError::Hardware(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SamplePeriodError {
    Config(ConfigError),
    /// Timer rejected the new period; the previous period stays active
    Hardware(HardwareError),
}

impl core::fmt::Display for SamplePeriodError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SamplePeriodError::Config(e) => write!(f, "{}", e),
            SamplePeriodError::Hardware(e) => write!(f, "{}", e),
        }
    }
}

impl core::error::Error for SamplePeriodError {}

impl From<ConfigError> for SamplePeriodError {
    fn from(e: ConfigError) -> Self {
        SamplePeriodError::Config(e)
    }
}

impl From<HardwareError> for SamplePeriodError {
    fn from(e: HardwareError) -> Self {
        SamplePeriodError::Hardware(e)
    }
}

/// Every published measurement at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    pub frequency_hz: u32,
    pub rpm: u32,
    /// 0 while filtering is disabled
    pub filtered_frequency_hz: u32,
    /// 0 while filtering is disabled
    pub filtered_rpm: u32,
    pub total_revolutions: u32,
    /// Edges counted during the last sample period
    pub pulses: u32,
    pub edge_interval_micros: u32,
}

/// Pulse-counting tachometer.
///
/// All methods take `&self`: `on_edge` and `on_tick` are meant to be called
/// from two interrupt handlers while the main loop reads and reconfigures.
/// Every field shared across contexts is a single [`AtomicCell`], so no path
/// masks interrupts. The filter pipeline belongs to the tick handler; main
/// context changes to it are posted as requests and take effect on the next
/// tick, while the published values are updated immediately.
pub struct Tachometer {
    config: Config,
    sample_period_ms: AtomicCell<u16>,
    state: AtomicCell<u8>,

    pulses: PulseCounter,
    filter: TickLocal<FilterState>,
    filter_enabled: AtomicCell<bool>,
    filter_settings: AtomicCell<u32>,
    filter_requests: AtomicCell<u8>,

    last_sample_pulses: AtomicCell<u32>,
    current: AtomicCell<u64>,
    filtered: AtomicCell<u64>,
    total_revolutions: AtomicCell<u32>,
    new_data: AtomicCell<bool>,
}

struct FilterState {
    filter: DigitalFilter,
    /// Raw reading of the previous tick, the restart point for the filter
    last_raw: Rate,
}

impl FilterState {
    fn apply_requests(&mut self, requests: u8, settings: FilterSettings) {
        if requests & REQUEST_RESET != 0 {
            self.filter.reset();
            self.last_raw = Rate::ZERO;
        }
        if requests & REQUEST_RESTART_FROM_RAW != 0 {
            self.filter.reset_to(self.last_raw);
        }
        if requests & REQUEST_APPLY_SETTINGS != 0 {
            // Validated before it was posted
            let _ = self.filter.set_parameters(settings);
        }
    }
}

impl Tachometer {
    /// Build a tachometer. Out-of-range configuration is clamped, never rejected.
    pub fn new(config: Config) -> Self {
        let sanitized = config.sanitized();
        if sanitized != config {
            warn!("tachometer configuration out of range, clamped to safe values");
        }

        let settings = FilterSettings {
            alpha: sanitized.filter_alpha,
            window_size: sanitized.window_size,
        };

        Self {
            config: sanitized,
            sample_period_ms: AtomicCell::new(sanitized.sample_period_ms),
            state: AtomicCell::new(SystemState::Uninitialized.as_u8()),
            pulses: PulseCounter::new(sanitized.debounce_micros),
            filter: TickLocal::new(FilterState {
                filter: DigitalFilter::new(sanitized.filter_enabled, settings),
                last_raw: Rate::ZERO,
            }),
            filter_enabled: AtomicCell::new(sanitized.filter_enabled),
            filter_settings: AtomicCell::new(settings.to_bits()),
            filter_requests: AtomicCell::new(0),
            last_sample_pulses: AtomicCell::new(0),
            current: AtomicCell::new(0),
            filtered: AtomicCell::new(0),
            total_revolutions: AtomicCell::new(0),
            new_data: AtomicCell::new(false),
        }
    }

    /// Register the edge and tick handlers with the platform services.
    ///
    /// Idempotent: once `Running`, further calls succeed without touching
    /// the hardware. A failed registration moves the instance to the
    /// terminal `Error` state and releases the timer if it was started.
    pub fn initialize<'a, E, T>(&'a self, edge: &mut E, timer: &mut T) -> Result<(), InitError>
    where
        E: EdgeInterruptService<'a> + ?Sized,
        T: PeriodicTimerService<'a> + ?Sized,
    {
        match self.state() {
            SystemState::Running => return Ok(()),
            SystemState::Error => return Err(InitError::Faulted),
            SystemState::Initializing => return Err(InitError::InProgress),
            SystemState::Uninitialized => {}
        }
        self.set_state(SystemState::Initializing);

        self.pulses.set_reference(edge.now_micros());

        let timer_id = self.config.timer_id;
        let period_ms = self.sample_period_ms.read();
        if let Err(e) = timer.start(timer_id, period_ms, self) {
            warn!("tachometer timer setup failed: {}", e);
            self.set_state(SystemState::Error);
            return Err(e.into());
        }

        if let Err(e) = edge.attach(self.config.sensor_pin, self) {
            warn!("tachometer edge interrupt setup failed: {}", e);
            timer.stop(timer_id);
            self.set_state(SystemState::Error);
            return Err(e.into());
        }

        self.set_state(SystemState::Running);
        info!(
            "tachometer running: pin {}, timer {}, period {} ms",
            self.config.sensor_pin,
            timer_id,
            period_ms
        );
        Ok(())
    }

    pub fn state(&self) -> SystemState {
        SystemState::from_u8(self.state.read())
    }

    fn set_state(&self, state: SystemState) {
        self.state.write(state.as_u8());
    }

    /// Edge interrupt entry point.
    pub fn on_edge(&self, now_micros: u32) {
        self.pulses.on_edge(now_micros);
    }

    /// Time-base interrupt entry point.
    ///
    /// Snapshot-and-zero the pulse count, derive the raw rate, apply pending
    /// filter requests and run the filter if enabled, accumulate whole
    /// revolutions, then flag new data.
    pub fn on_tick(&self) {
        let pulses = self.pulses.take_sample();
        let pulses_per_rev = self.config.pulses_per_revolution;

        let raw = rate::compute(pulses, self.sample_period_ms.read(), pulses_per_rev);
        self.last_sample_pulses.write(pulses);
        self.current.write(raw.to_bits());

        // Only skipped if on_tick is re-entered, which the timer service rules out
        self.filter.with(|state| {
            let requests = self.filter_requests.take();
            let settings = FilterSettings::from_bits(self.filter_settings.read());
            state.apply_requests(requests, settings);

            let enabled = self.filter_enabled.read();
            if state.filter.is_enabled() != enabled {
                state.filter.set_enabled(enabled, state.last_raw);
            }

            if let Some(filtered) = state.filter.update(raw, pulses_per_rev) {
                self.filtered.write(filtered.to_bits());
            }
            state.last_raw = raw;
        });

        self.total_revolutions
            .saturating_add(rate::revolutions(pulses, pulses_per_rev));
        self.new_data.write(true);
    }

    fn current_rate(&self) -> Rate {
        Rate::from_bits(self.current.read())
    }

    fn filtered_rate(&self) -> Rate {
        if self.filter_enabled.read() {
            Rate::from_bits(self.filtered.read())
        } else {
            Rate::ZERO
        }
    }

    pub fn current_frequency_hz(&self) -> u32 {
        self.current_rate().frequency_hz
    }

    pub fn current_rpm(&self) -> u32 {
        self.current_rate().rpm
    }

    pub fn filtered_frequency_hz(&self) -> u32 {
        self.filtered_rate().frequency_hz
    }

    pub fn filtered_rpm(&self) -> u32 {
        self.filtered_rate().rpm
    }

    pub fn total_revolutions(&self) -> u32 {
        self.total_revolutions.read()
    }

    /// Edges counted during the last completed sample period.
    pub fn raw_pulse_count_last_sample(&self) -> u32 {
        self.last_sample_pulses.read()
    }

    /// Microseconds between the last two accepted edges.
    pub fn edge_interval(&self) -> u32 {
        self.pulses.edge_interval()
    }

    /// True once per tick: the first call after a tick consumes the flag.
    pub fn is_new_data_available(&self) -> bool {
        self.new_data.take()
    }

    /// Frequency and RPM in each pair always come from the same tick.
    pub fn reading(&self) -> Reading {
        let current = self.current_rate();
        let filtered = self.filtered_rate();
        Reading {
            frequency_hz: current.frequency_hz,
            rpm: current.rpm,
            filtered_frequency_hz: filtered.frequency_hz,
            filtered_rpm: filtered.rpm,
            total_revolutions: self.total_revolutions(),
            pulses: self.raw_pulse_count_last_sample(),
            edge_interval_micros: self.edge_interval(),
        }
    }

    /// Zero counters, timing, current readings, filter state and the new-data flag.
    ///
    /// The filter itself is zeroed by the next tick.
    pub fn reset_counters(&self) {
        self.pulses.reset();
        self.last_sample_pulses.write(0);
        self.total_revolutions.write(0);
        self.current.write(0);
        self.filtered.write(0);
        self.filter_requests.set_bits(REQUEST_RESET);
        self.new_data.write(false);
        debug!("tachometer counters reset");
    }

    /// Restart the filter from the current raw reading. Counters are untouched.
    pub fn reset_filters(&self) {
        self.filtered.write(self.current.read());
        self.filter_requests.set_bits(REQUEST_RESTART_FROM_RAW);
        debug!("tachometer filters reset");
    }

    /// Zero pulse counts, total revolutions and the new-data flag only.
    pub fn reset_revolution_counters(&self) {
        self.pulses.reset_count();
        self.last_sample_pulses.write(0);
        self.total_revolutions.write(0);
        self.new_data.write(false);
        debug!("tachometer revolution counters reset");
    }

    /// `reset_counters` plus a fresh debounce reference at `now_micros`.
    pub fn reset_system(&self, now_micros: u32) {
        self.reset_counters();
        self.pulses.set_reference(now_micros);
        debug!("tachometer system reset at {} us", now_micros);
    }

    pub fn sample_period_ms(&self) -> u16 {
        self.sample_period_ms.read()
    }

    /// Change the time base.
    ///
    /// Periods below the platform minimum are rejected. Once running, the
    /// timer is reprogrammed first and the new period is only recorded if
    /// the timer accepts it.
    pub fn set_sample_period<'a, T>(
        &self,
        period_ms: u16,
        timer: &mut T,
    ) -> Result<(), SamplePeriodError>
    where
        T: PeriodicTimerService<'a> + ?Sized,
    {
        if let Err(e) = validate_sample_period(period_ms) {
            warn!("rejected sample period {} ms: {}", period_ms, e);
            return Err(e.into());
        }

        if self.state() == SystemState::Running {
            if let Err(e) = timer.set_period(self.config.timer_id, period_ms) {
                warn!("timer rejected sample period {} ms: {}", period_ms, e);
                return Err(e.into());
            }
        }

        self.sample_period_ms.write(period_ms);
        debug!("sample period set to {} ms", period_ms);
        Ok(())
    }

    pub fn debounce_micros(&self) -> u16 {
        self.pulses.debounce_micros()
    }

    /// Takes effect on the next edge.
    pub fn set_debounce_time(&self, debounce_micros: u16) {
        self.pulses.set_debounce_micros(debounce_micros);
        debug!("debounce set to {} us", debounce_micros);
    }

    pub fn is_filtering_enabled(&self) -> bool {
        self.filter_enabled.read()
    }

    /// Disabling snaps the filter to the last raw reading and clears its
    /// history; filtered reads return 0 until filtering is enabled again.
    pub fn set_filtering_enabled(&self, enabled: bool) {
        self.filter_enabled.write(enabled);
        if !enabled {
            self.filtered.write(self.current.read());
            self.filter_requests.set_bits(REQUEST_RESTART_FROM_RAW);
        }
        debug!("filtering enabled: {}", enabled);
    }

    /// Flip filtering on or off, returning the new state.
    pub fn toggle_filtering(&self) -> bool {
        let enabled = !self.filter_enabled.read();
        self.set_filtering_enabled(enabled);
        enabled
    }

    pub fn filter_settings(&self) -> FilterSettings {
        FilterSettings::from_bits(self.filter_settings.read())
    }

    /// Validate and apply `alpha` (0..=1000) and `window_size` (1..=MAX_WINDOW).
    /// Rejected values change nothing; accepted values clear the history on
    /// the next tick.
    pub fn set_filter_parameters(&self, alpha: u16, window_size: u8) -> Result<(), ConfigError> {
        let settings = FilterSettings { alpha, window_size };
        if let Err(e) = settings.validate() {
            warn!("rejected filter parameters: {}", e);
            return Err(e);
        }

        self.filter_settings.write(settings.to_bits());
        self.filter_requests.set_bits(REQUEST_APPLY_SETTINGS);
        debug!("filter parameters set: alpha {}, window {}", alpha, window_size);
        Ok(())
    }

    pub fn pulses_per_revolution(&self) -> u8 {
        self.config.pulses_per_revolution
    }

    pub fn sensor_pin(&self) -> u8 {
        self.config.sensor_pin
    }

    pub fn timer_id(&self) -> u8 {
        self.config.timer_id
    }

    /// Active configuration, including runtime changes.
    pub fn config(&self) -> Config {
        let settings = self.filter_settings();
        Config {
            sample_period_ms: self.sample_period_ms(),
            debounce_micros: self.debounce_micros(),
            filter_enabled: self.is_filtering_enabled(),
            filter_alpha: settings.alpha,
            window_size: settings.window_size,
            ..self.config
        }
    }
}

impl EdgeHandler for Tachometer {
    fn on_edge(&self, now_micros: u32) {
        Tachometer::on_edge(self, now_micros);
    }
}

impl TickHandler for Tachometer {
    fn on_tick(&self) {
        Tachometer::on_tick(self);
    }
}
