//! Double-checked, exactly-once initialization cell.
//!
//! `OnceSlot<T>` holds at most one value of `T`. The value is written by the single
//! caller that wins the init lock and is then shared by reference with every other
//! caller for as long as the slot lives.
//!
//! # Fast and slow path
//!
//! - **Fast path**: one `Acquire` load of the `ready` flag. Never blocks.
//! - **Slow path**: taken on a fast-path miss. Locks the init mutex, re-checks the
//!   flag (another caller may have published the value while we waited), and only
//!   then runs the constructor. The value is written before the flag is set with
//!   `Release`, so a reader that sees `ready == true` also sees the whole value.
//!
//! A constructor that returns `Err` or panics leaves the slot empty, and the next
//! caller retries.

use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A thread-safe cell that is initialized at most once.
///
/// # Examples
///
/// ```rust
/// use lazy_singleton_registry::OnceSlot;
///
/// static GREETING: OnceSlot<String> = OnceSlot::new();
///
/// let first = GREETING.get_or_init(|| "Hello".to_string());
/// let second = GREETING.get_or_init(|| unreachable!());
///
/// assert!(std::ptr::eq(first, second));
/// ```
pub struct OnceSlot<T> {
    ready: AtomicBool,
    lock: Mutex<()>,
    value: UnsafeCell<MaybeUninit<T>>,
}

// SAFETY: the value is written once, under `lock`, before `ready` is published
// with Release; every shared read happens after an Acquire load observed `ready`.
// Sharing `&OnceSlot<T>` hands out `&T` to many threads (needs `T: Sync`) and lets
// any thread write the value (needs `T: Send`).
unsafe impl<T: Send + Sync> Sync for OnceSlot<T> {}
unsafe impl<T: Send> Send for OnceSlot<T> {}

impl<T> OnceSlot<T> {
    /// Creates an empty slot.
    pub const fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            lock: Mutex::new(()),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    /// Creates a slot that already holds `value`.
    ///
    /// Usable in `static` items when `value` is a constant expression; this is the
    /// eager counterpart of a lazily built singleton.
    pub const fn with_value(value: T) -> Self {
        Self {
            ready: AtomicBool::new(true),
            lock: Mutex::new(()),
            value: UnsafeCell::new(MaybeUninit::new(value)),
        }
    }

    /// Returns `true` once the value has been published.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Returns the value if it has been published. Never blocks.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        if self.is_initialized() {
            // SAFETY: `ready` was observed with Acquire, so the value is fully written.
            Some(unsafe { self.get_unchecked() })
        } else {
            None
        }
    }

    /// Returns the value, constructing it with `f` if this is the first call.
    ///
    /// If several threads call this concurrently, exactly one runs `f`; the others
    /// block until the value is published and then receive the same reference.
    ///
    /// Calling `get_or_init` on the same slot from inside `f` deadlocks.
    pub fn get_or_init(&self, f: impl FnOnce() -> T) -> &T {
        match self.get_or_try_init(|| Ok::<T, std::convert::Infallible>(f())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Returns the value, constructing it with `f` if this is the first call.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `f`, unchanged, to the caller that ran it. The
    /// slot stays empty and a later call runs its own constructor.
    pub fn get_or_try_init<E>(&self, f: impl FnOnce() -> Result<T, E>) -> Result<&T, E> {
        if let Some(value) = self.get() {
            return Ok(value);
        }
        self.init_slow(f)
    }

    /// Slow path of [`get_or_try_init`](Self::get_or_try_init): always takes the
    /// init lock. Callers that already missed the fast path use it directly, so
    /// `f` not running means the value was published while they waited.
    #[cold]
    pub(crate) fn init_slow<E>(&self, f: impl FnOnce() -> Result<T, E>) -> Result<&T, E> {
        // A poisoned lock means an earlier constructor panicked. The slot is still
        // empty and the mutex guards no data, so the next attempt may proceed.
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());

        // Re-check: another caller may have published while we were waiting.
        // Relaxed is enough here, the mutex already orders us after that write.
        if self.ready.load(Ordering::Relaxed) {
            // SAFETY: the publishing caller wrote the value before releasing `lock`.
            return Ok(unsafe { self.get_unchecked() });
        }

        let value = f()?;

        // SAFETY: we hold `lock` and `ready` is false, so nobody else reads or
        // writes the cell.
        unsafe { (*self.value.get()).write(value) };
        self.ready.store(true, Ordering::Release);

        // SAFETY: just published.
        Ok(unsafe { self.get_unchecked() })
    }

    /// Stores `value` if the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns `value` back when the slot was already initialized; the published
    /// value is never replaced.
    pub fn set(&self, value: T) -> Result<(), T> {
        let mut pending = Some(value);
        let _ = self.get_or_try_init(|| pending.take().ok_or(()));
        match pending {
            None => Ok(()),
            Some(value) => Err(value),
        }
    }

    /// Consumes the slot and returns its value, if any.
    pub fn into_inner(mut self) -> Option<T> {
        self.take()
    }

    /// Takes the value out, leaving the slot empty.
    ///
    /// Requires exclusive access, so no synchronization is involved.
    pub fn take(&mut self) -> Option<T> {
        if *self.ready.get_mut() {
            *self.ready.get_mut() = false;
            // SAFETY: `ready` was true so the value is initialized, and the flag is
            // now cleared so it will not be read or dropped again.
            Some(unsafe { self.value.get_mut().assume_init_read() })
        } else {
            None
        }
    }

    /// # Safety
    ///
    /// The caller must have observed `ready == true` with a synchronizing load or
    /// while holding `lock`.
    #[inline]
    unsafe fn get_unchecked(&self) -> &T {
        (*self.value.get()).assume_init_ref()
    }
}

impl<T> Default for OnceSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<T> for OnceSlot<T> {
    fn from(value: T) -> Self {
        Self::with_value(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for OnceSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => f.debug_tuple("OnceSlot").field(value).finish(),
            None => f.write_str("OnceSlot(<uninit>)"),
        }
    }
}

impl<T> Drop for OnceSlot<T> {
    fn drop(&mut self) {
        if *self.ready.get_mut() {
            // SAFETY: initialized and never dropped elsewhere.
            unsafe { self.value.get_mut().assume_init_drop() };
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
