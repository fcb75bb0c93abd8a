#![no_std]

#[macro_use]
mod fmt;

mod config;
mod state;
mod tachometer;
mod tick_local;
pub mod atomic_cell;
pub mod filters;
pub mod hardware;
pub mod pulse_counter;
pub mod rate;

pub use config::{
    ALPHA_SCALE, Config, ConfigError, DEFAULT_SAMPLE_PERIOD_MS, DEFAULT_WINDOW_SIZE, MAX_WINDOW,
    MIN_SAMPLE_PERIOD_MS,
};
pub use state::SystemState;
pub use tachometer::{InitError, Reading, SamplePeriodError, Tachometer};
pub use atomic_cell::AtomicCell;
pub use filters::{DigitalFilter, FilterSettings};
pub use hardware::{EdgeHandler, EdgeInterruptService, HardwareError, PeriodicTimerService, TickHandler};
pub use pulse_counter::PulseCounter;
pub use rate::Rate;
