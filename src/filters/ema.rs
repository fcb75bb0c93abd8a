use crate::config::ALPHA_SCALE;

/// Integer exponential moving average.
///
/// `alpha` is a fixed-point weight on the new sample in `0..=ALPHA_SCALE`.
/// The accumulator starts at zero rather than at the first sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmaFilter {
    previous: u32,
}

impl EmaFilter {
    pub const fn new() -> Self {
        Self { previous: 0 }
    }

    /// Apply EMA filter: output = alpha * input + (1 - alpha) * previous
    ///
    /// Each step is rounded toward `input`, so a constant input is reached
    /// exactly for any non-zero alpha instead of stalling a few counts short.
    pub fn apply(&mut self, input: u32, alpha: u16) -> u32 {
        let alpha = u64::from(alpha.min(ALPHA_SCALE));
        let scale = u64::from(ALPHA_SCALE);

        let output = if input >= self.previous {
            let step = (alpha * u64::from(input - self.previous)).div_ceil(scale);
            // step <= input - previous
            self.previous + step as u32
        } else {
            let step = (alpha * u64::from(self.previous - input)).div_ceil(scale);
            self.previous - step as u32
        };

        self.previous = output;
        output
    }

    pub fn value(&self) -> u32 {
        self.previous
    }

    /// Overwrite the accumulator.
    pub fn set(&mut self, value: u32) {
        self.previous = value;
    }

    pub fn reset(&mut self) {
        self.previous = 0;
    }
}
