//! Tear-free storage for values shared between interrupt and main context.
//!
//! Every access is a single load, store or read-modify-write on a
//! `portable-atomic` type. Targets with native atomics for the value width
//! get a plain atomic access; narrower targets (AVR, thumbv6m with `u64`)
//! fall back to a critical section covering exactly that one access.

use portable_atomic::{AtomicBool, AtomicU8, AtomicU16, AtomicU32, AtomicU64, Ordering};

mod sealed {
    pub trait Sealed {}
}

/// A value type that has a matching atomic representation.
pub trait Atom: Copy + Default + sealed::Sealed {
    #[doc(hidden)]
    type Repr;

    #[doc(hidden)]
    fn new_repr(value: Self) -> Self::Repr;
    #[doc(hidden)]
    fn load(repr: &Self::Repr) -> Self;
    #[doc(hidden)]
    fn store(repr: &Self::Repr, value: Self);
    #[doc(hidden)]
    fn swap(repr: &Self::Repr, value: Self) -> Self;
}

macro_rules! impl_atom {
    ($($ty:ty => $atomic:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Atom for $ty {
                type Repr = $atomic;

                #[inline]
                fn new_repr(value: Self) -> Self::Repr {
                    <$atomic>::new(value)
                }

                #[inline]
                fn load(repr: &Self::Repr) -> Self {
                    repr.load(Ordering::Acquire)
                }

                #[inline]
                fn store(repr: &Self::Repr, value: Self) {
                    repr.store(value, Ordering::Release)
                }

                #[inline]
                fn swap(repr: &Self::Repr, value: Self) -> Self {
                    repr.swap(value, Ordering::AcqRel)
                }
            }
        )*
    };
}

impl_atom! {
    bool => AtomicBool,
    u8 => AtomicU8,
    u16 => AtomicU16,
    u32 => AtomicU32,
    u64 => AtomicU64,
}

/// Single-value cell written from one context and read from another.
///
/// A reader never observes a value assembled from two different writes.
pub struct AtomicCell<T: Atom> {
    inner: T::Repr,
}

impl<T: Atom> AtomicCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: T::new_repr(value),
        }
    }

    #[inline]
    pub fn read(&self) -> T {
        T::load(&self.inner)
    }

    #[inline]
    pub fn write(&self, value: T) {
        T::store(&self.inner, value)
    }

    /// Replace the value and return the previous one in one indivisible step.
    #[inline]
    pub fn replace(&self, value: T) -> T {
        T::swap(&self.inner, value)
    }

    /// Snapshot-and-zero.
    #[inline]
    pub fn take(&self) -> T {
        self.replace(T::default())
    }
}

impl<T: Atom> Default for AtomicCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Atom + core::fmt::Debug> core::fmt::Debug for AtomicCell<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("AtomicCell").field(&self.read()).finish()
    }
}

impl AtomicCell<u32> {
    /// Wrapping increment, returns the previous value.
    #[inline]
    pub fn increment(&self) -> u32 {
        self.inner.fetch_add(1, Ordering::AcqRel)
    }

    /// Saturating add, returns the previous value.
    #[inline]
    pub fn saturating_add(&self, value: u32) -> u32 {
        match self
            .inner
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| Some(v.saturating_add(value)))
        {
            Ok(prev) | Err(prev) => prev,
        }
    }
}

impl AtomicCell<u8> {
    /// OR `bits` into the value, returns the previous value.
    #[inline]
    pub fn set_bits(&self, bits: u8) -> u8 {
        self.inner.fetch_or(bits, Ordering::AcqRel)
    }
}
