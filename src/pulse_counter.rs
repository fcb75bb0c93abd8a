//! Edge counting with a debounce gate.
//!
//! `on_edge` runs in the edge interrupt; `take_sample` runs in the time-base
//! interrupt. Everything else is main-context bookkeeping.

use crate::atomic_cell::AtomicCell;

pub struct PulseCounter {
    raw_pulse_count: AtomicCell<u32>,
    last_edge_time: AtomicCell<u32>,
    previous_edge_time: AtomicCell<u32>,
    edge_interval: AtomicCell<u32>,
    /// `last_edge_time` holds a usable debounce reference
    has_reference: AtomicCell<bool>,
    debounce_micros: AtomicCell<u16>,
}

impl PulseCounter {
    pub fn new(debounce_micros: u16) -> Self {
        Self {
            raw_pulse_count: AtomicCell::new(0),
            last_edge_time: AtomicCell::new(0),
            previous_edge_time: AtomicCell::new(0),
            edge_interval: AtomicCell::new(0),
            has_reference: AtomicCell::new(false),
            debounce_micros: AtomicCell::new(debounce_micros),
        }
    }

    /// Register a rising edge seen at `now` (microseconds, wrapping).
    ///
    /// Edges closer than the debounce interval to the last accepted edge are
    /// dropped. The first edge without a reference is always accepted and
    /// leaves `edge_interval` untouched.
    pub fn on_edge(&self, now: u32) -> bool {
        let last = self.last_edge_time.read();

        if self.has_reference.read() {
            let elapsed = now.wrapping_sub(last);
            if elapsed < u32::from(self.debounce_micros.read()) {
                return false;
            }
            self.edge_interval.write(elapsed);
        }

        self.previous_edge_time.write(last);
        self.last_edge_time.write(now);
        self.has_reference.write(true);
        self.raw_pulse_count.increment();
        true
    }

    /// Snapshot-and-zero the accepted edge count.
    ///
    /// A single atomic swap: an edge racing the tick lands either in this
    /// sample or in the next one, never both.
    pub fn take_sample(&self) -> u32 {
        self.raw_pulse_count.take()
    }

    /// Edges accepted since the last sample.
    pub fn pending(&self) -> u32 {
        self.raw_pulse_count.read()
    }

    pub fn last_edge_time(&self) -> u32 {
        self.last_edge_time.read()
    }

    pub fn previous_edge_time(&self) -> u32 {
        self.previous_edge_time.read()
    }

    /// Time between the last two accepted edges, 0 until two edges are seen.
    pub fn edge_interval(&self) -> u32 {
        self.edge_interval.read()
    }

    pub fn debounce_micros(&self) -> u16 {
        self.debounce_micros.read()
    }

    /// Takes effect on the next edge.
    pub fn set_debounce_micros(&self, debounce_micros: u16) {
        self.debounce_micros.write(debounce_micros);
    }

    /// Debounce subsequent edges against `now`.
    pub fn set_reference(&self, now: u32) {
        self.last_edge_time.write(now);
        self.has_reference.write(true);
    }

    /// Zero the count only. Edge timing is kept.
    pub fn reset_count(&self) {
        self.raw_pulse_count.write(0);
    }

    /// Zero the count, both timestamps, the interval and the reference.
    pub fn reset(&self) {
        self.raw_pulse_count.write(0);
        self.has_reference.write(false);
        self.last_edge_time.write(0);
        self.previous_edge_time.write(0);
        self.edge_interval.write(0);
    }
}
