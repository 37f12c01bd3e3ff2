//! AtomicCell
//!
//! An atomic cell holding a scalar value, which can only be read, or transformed.

use core::{
    fmt,
    ptr::NonNull,
    sync::atomic::{self, Ordering},
};

use crate::internals::{
    atomic::into_raw,
    mutate::{self, AtomicWord},
    ordering,
};

/// Scalar
///
/// A value which can be stored in an `AtomicCell`, by mapping it to the bits of an atomic word.
///
/// Cells compare values by their bits: `-0.0` and `0.0` are distinct, whereas a `NaN` is equal to itself.
pub trait Scalar: Copy {
    /// The atomic word storing the bits of the value.
    #[doc(hidden)]
    type Atomic: AtomicWord;

    /// Converts the value to its bits.
    #[doc(hidden)]
    fn into_word(self) -> <Self::Atomic as AtomicWord>::Value;

    /// Converts the bits back to the value.
    #[doc(hidden)]
    fn from_word(word: <Self::Atomic as AtomicWord>::Value) -> Self;
}

macro_rules! scalar {
    ($scalar:ty, $atomic:ty, |$value:ident| $into:expr, |$word:ident| $from:expr) => {
        impl Scalar for $scalar {
            type Atomic = $atomic;

            #[inline(always)]
            fn into_word(self) -> <$atomic as AtomicWord>::Value { let $value = self; $into }

            #[inline(always)]
            fn from_word($word: <$atomic as AtomicWord>::Value) -> $scalar { $from }
        }
    };
}

scalar!(bool, atomic::AtomicU32, |value| value as u32, |word| word != 0);
scalar!(u32, atomic::AtomicU32, |value| value, |word| word);
scalar!(i32, atomic::AtomicU32, |value| value as u32, |word| word as i32);
scalar!(f32, atomic::AtomicU32, |value| value.to_bits(), |word| f32::from_bits(word));
scalar!(usize, atomic::AtomicUsize, |value| value, |word| word);
scalar!(isize, atomic::AtomicUsize, |value| value as usize, |word| word as isize);

#[cfg(target_has_atomic = "64")]
scalar!(u64, atomic::AtomicU64, |value| value, |word| word);
#[cfg(target_has_atomic = "64")]
scalar!(i64, atomic::AtomicU64, |value| value as u64, |word| word as i64);
#[cfg(target_has_atomic = "64")]
scalar!(f64, atomic::AtomicU64, |value| value.to_bits(), |word| f64::from_bits(word));

impl<T> Scalar for *mut T {
    type Atomic = atomic::AtomicPtr<T>;

    #[inline(always)]
    fn into_word(self) -> *mut T { self }

    #[inline(always)]
    fn from_word(word: *mut T) -> *mut T { word }
}

impl<T> Scalar for *const T {
    type Atomic = atomic::AtomicPtr<T>;

    #[inline(always)]
    fn into_word(self) -> *mut T { self as *mut T }

    #[inline(always)]
    fn from_word(word: *mut T) -> *const T { word }
}

impl<T> Scalar for Option<NonNull<T>> {
    type Atomic = atomic::AtomicPtr<T>;

    #[inline(always)]
    fn into_word(self) -> *mut T { into_raw(self) }

    #[inline(always)]
    fn from_word(word: *mut T) -> Self { NonNull::new(word) }
}

/// AtomicCell
///
/// A cell holding a value of type `T`, whose value is only accessed through atomic loads and transformations.
///
/// A value observed by any thread is always either the value the cell was constructed with, or the value committed
/// by exactly one successful transformation.
///
/// #   Example
///
/// ```
/// use mutate_core::AtomicCell;
///
/// let cell = AtomicCell::new(126u32);
///
/// //  The attempt may fail spuriously, or due to a concurrent update, and is therefore retried.
/// while !cell.mutate(|value| Some((value + 1) % 128)) {}
/// while !cell.mutate(|value| Some((value + 1) % 128)) {}
///
/// assert_eq!(0, cell.get());
///
/// //  Declining leaves the value untouched.
/// assert!(!cell.mutate(|value| if value > 0 { Some(value - 1) } else { None }));
/// ```
pub struct AtomicCell<T: Scalar>(T::Atomic);

impl<T: Scalar> AtomicCell<T> {
    /// Creates an instance.
    pub fn new(value: T) -> Self { Self(T::Atomic::new(value.into_word())) }

    /// Loads the current value, with the requested ordering.
    ///
    /// Release semantics, which do not apply to a load, are ignored.
    pub fn load(&self, order: Ordering) -> T { T::from_word(self.0.load(ordering::load(order))) }

    /// Loads the current value, sequentially consistent.
    pub fn get(&self) -> T { self.load(Ordering::SeqCst) }

    /// Attempts to transform the value of the cell.
    ///
    /// `transform` is invoked with the current value, loaded with `load_order`:
    ///
    /// -   If it returns `None`, the attempt is abandoned, and false is returned.
    /// -   If it returns a value, the value is committed with `store_order` if the cell was not modified since the
    ///     load, and true is returned. Otherwise false is returned.
    ///
    /// The attempt may fail spuriously, even in the absence of concurrent modifications; it is up to the caller to
    /// retry. On failure, the cell is left untouched.
    ///
    /// `transform` is invoked exactly once per attempt, yet its result may be discarded: it should be free of
    /// side-effects visible to other threads.
    #[inline]
    pub fn mutate_explicit<F>(&self, transform: F, load_order: Ordering, store_order: Ordering) -> bool
        where
            F: FnOnce(T) -> Option<T>,
    {
        mutate::mutate_explicit(
            &self.0,
            |word| transform(T::from_word(word)).map(T::into_word),
            load_order,
            store_order)
    }

    /// Attempts to transform the value of the cell, sequentially consistent.
    ///
    /// See `mutate_explicit`.
    #[inline]
    pub fn mutate<F>(&self, transform: F) -> bool
        where
            F: FnOnce(T) -> Option<T>,
    {
        self.mutate_explicit(transform, Ordering::SeqCst, Ordering::SeqCst)
    }
}

impl<T: Scalar + Default> Default for AtomicCell<T> {
    fn default() -> Self { Self::new(T::default()) }
}

impl<T: Scalar> From<T> for AtomicCell<T> {
    fn from(value: T) -> Self { Self::new(value) }
}

impl<T: Scalar + fmt::Debug> fmt::Debug for AtomicCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicCell").field(&self.load(Ordering::Relaxed)).finish()
    }
}

// mod tests
