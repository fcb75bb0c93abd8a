#![allow(dead_code)]

use tacho_core::{EdgeHandler, EdgeInterruptService, HardwareError, PeriodicTimerService, TickHandler};

/// Edge interrupt stand-in. `edge()` plays the role of the interrupt vector.
#[derive(Default)]
pub struct FakeEdgeService<'a> {
    pub handler: Option<&'a dyn EdgeHandler>,
    pub pin: Option<u8>,
    pub attaches: usize,
    pub now: u32,
    pub fail_with: Option<HardwareError>,
}

impl<'a> FakeEdgeService<'a> {
    pub fn failing(error: HardwareError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::default()
        }
    }

    pub fn edge(&mut self, at: u32) {
        self.now = at;
        if let Some(handler) = self.handler {
            handler.on_edge(at);
        }
    }
}

impl<'a> EdgeInterruptService<'a> for FakeEdgeService<'a> {
    fn attach(&mut self, pin: u8, handler: &'a dyn EdgeHandler) -> Result<(), HardwareError> {
        if let Some(e) = self.fail_with {
            return Err(e);
        }
        self.attaches += 1;
        self.pin = Some(pin);
        self.handler = Some(handler);
        Ok(())
    }

    fn now_micros(&self) -> u32 {
        self.now
    }
}

/// Periodic timer stand-in. `fire()` plays the role of the interrupt vector.
#[derive(Default)]
pub struct FakeTimer<'a> {
    pub handler: Option<&'a dyn TickHandler>,
    pub timer_id: Option<u8>,
    pub period_ms: u16,
    pub starts: usize,
    pub stops: usize,
    pub fail_start: Option<HardwareError>,
    pub fail_set_period: Option<HardwareError>,
}

impl<'a> FakeTimer<'a> {
    pub fn fire(&self) {
        if let Some(handler) = self.handler {
            handler.on_tick();
        }
    }
}

impl<'a> PeriodicTimerService<'a> for FakeTimer<'a> {
    fn start(
        &mut self,
        timer_id: u8,
        period_ms: u16,
        handler: &'a dyn TickHandler,
    ) -> Result<(), HardwareError> {
        if let Some(e) = self.fail_start {
            return Err(e);
        }
        self.starts += 1;
        self.timer_id = Some(timer_id);
        self.period_ms = period_ms;
        self.handler = Some(handler);
        Ok(())
    }

    fn set_period(&mut self, _timer_id: u8, period_ms: u16) -> Result<(), HardwareError> {
        if let Some(e) = self.fail_set_period {
            return Err(e);
        }
        self.period_ms = period_ms;
        Ok(())
    }

    fn stop(&mut self, _timer_id: u8) {
        self.stops += 1;
        self.handler = None;
    }
}

/// Deterministic xorshift32 for interleaving tests.
pub struct XorShift(u32);

impl XorShift {
    pub fn new(seed: u32) -> Self {
        Self(seed.max(1))
    }

    pub fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    pub fn below(&mut self, bound: u32) -> u32 {
        self.next() % bound
    }
}
