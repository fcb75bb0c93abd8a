//! Integer frequency and RPM arithmetic.
//!
//! Pure functions, safe to call from the time-base interrupt. Intermediates
//! are `u64` so `pulses * 1000` and `frequency * 60` cannot wrap; results
//! saturate at `u32::MAX`.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rate {
    pub frequency_hz: u32,
    pub rpm: u32,
}

impl Rate {
    pub const ZERO: Rate = Rate {
        frequency_hz: 0,
        rpm: 0,
    };

    /// Frequency in the high word, RPM in the low word. Publishing the pair
    /// as one `u64` keeps a reader from pairing halves of different ticks.
    pub(crate) const fn to_bits(self) -> u64 {
        ((self.frequency_hz as u64) << 32) | self.rpm as u64
    }

    pub(crate) const fn from_bits(bits: u64) -> Self {
        Rate {
            frequency_hz: (bits >> 32) as u32,
            rpm: bits as u32,
        }
    }
}

const fn saturate(value: u64) -> u32 {
    if value > u32::MAX as u64 {
        u32::MAX
    } else {
        value as u32
    }
}

/// Frequency and RPM for `pulses` counted over `period_ms`.
///
/// `frequency = pulses * 1000 / period_ms`, `rpm = frequency * 60 / pulses_per_rev`,
/// both truncated. A zero `pulses_per_rev` yields RPM 0; a zero period
/// (never produced by a validated config) yields `Rate::ZERO`.
pub const fn compute(pulses: u32, period_ms: u16, pulses_per_rev: u8) -> Rate {
    if period_ms == 0 {
        return Rate::ZERO;
    }

    let frequency_hz = saturate(pulses as u64 * 1000 / period_ms as u64);
    Rate {
        frequency_hz,
        rpm: rpm_from_frequency(frequency_hz, pulses_per_rev),
    }
}

pub const fn rpm_from_frequency(frequency_hz: u32, pulses_per_rev: u8) -> u32 {
    if pulses_per_rev == 0 {
        return 0;
    }
    saturate(frequency_hz as u64 * 60 / pulses_per_rev as u64)
}

/// Whole revolutions in `pulses`. The remainder is dropped.
pub const fn revolutions(pulses: u32, pulses_per_rev: u8) -> u32 {
    if pulses_per_rev == 0 {
        return 0;
    }
    pulses / pulses_per_rev as u32
}
