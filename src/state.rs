/// Lifecycle of a [`Tachometer`](crate::Tachometer).
///
/// `Running` is entered once both interrupt registrations succeed and ticks
/// start immediately. `Error` is terminal; recover by building a new instance.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemState {
    #[default]
    Uninitialized = 0,
    Initializing = 1,
    Running = 2,
    Error = 3,
}

impl SystemState {
    pub(crate) const fn as_u8(self) -> u8 {
        self as u8
    }

    pub(crate) const fn from_u8(value: u8) -> Self {
        match value {
            0 => SystemState::Uninitialized,
            1 => SystemState::Initializing,
            2 => SystemState::Running,
            _ => SystemState::Error,
        }
    }
}
