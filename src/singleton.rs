//! Process-wide singletons bound to their constructor.
//!
//! A [`Singleton<T>`] is declared as a `static` next to the function that builds it.
//! Nothing runs until the first call to [`Singleton::instance`]; that call (and only
//! that call, however many threads race for it) runs the constructor.
//!
//! ```rust
//! use lazy_singleton_registry::Singleton;
//!
//! struct LoadBalancer {
//!     servers: Vec<&'static str>,
//! }
//!
//! static BALANCER: Singleton<LoadBalancer> = Singleton::new(|| LoadBalancer {
//!     servers: vec!["server-1", "server-2"],
//! });
//!
//! let a = BALANCER.instance().unwrap();
//! let b = BALANCER.instance().unwrap();
//! assert!(std::ptr::eq(a, b));
//! assert_eq!(a.servers.len(), 2);
//! ```

use std::fmt;
use std::sync::Mutex;

use crate::once_slot::OnceSlot;
use crate::singleton_event::{self, SingletonEvent, TraceHook};
use crate::{BoxError, SingletonError};

/// What happens after a constructor fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Leave the singleton uninitialized; the next call runs the constructor again.
    #[default]
    Retry,
    /// Remember the first failure; every later call returns
    /// [`SingletonError::Poisoned`] without running the constructor.
    Poison,
}

enum Constructor<T> {
    Infallible(fn() -> T),
    Fallible(fn() -> Result<T, BoxError>),
}

impl<T> Constructor<T> {
    fn build(&self) -> Result<T, BoxError> {
        match self {
            Constructor::Infallible(ctor) => Ok(ctor()),
            Constructor::Fallible(ctor) => ctor(),
        }
    }
}

/// A lazily constructed, process-wide instance of `T`.
pub struct Singleton<T> {
    slot: OnceSlot<T>,
    ctor: Constructor<T>,
    policy: FailurePolicy,
    poison: OnceSlot<String>,
    trace: TraceHook,
}

impl<T> Singleton<T> {
    /// Creates a singleton built by an infallible constructor.
    pub const fn new(ctor: fn() -> T) -> Self {
        Self::with_constructor(Constructor::Infallible(ctor))
    }

    /// Creates a singleton built by a constructor that may fail.
    ///
    /// ```rust
    /// use lazy_singleton_registry::{BoxError, Singleton};
    ///
    /// fn read_port() -> Result<u16, BoxError> {
    ///     Ok("8080".parse()?)
    /// }
    ///
    /// static PORT: Singleton<u16> = Singleton::fallible(read_port);
    /// assert_eq!(*PORT.instance().unwrap(), 8080);
    /// ```
    pub const fn fallible(ctor: fn() -> Result<T, BoxError>) -> Self {
        Self::with_constructor(Constructor::Fallible(ctor))
    }

    const fn with_constructor(ctor: Constructor<T>) -> Self {
        Self {
            slot: OnceSlot::new(),
            ctor,
            policy: FailurePolicy::Retry,
            poison: OnceSlot::new(),
            trace: Mutex::new(None),
        }
    }

    /// Sets the failure policy. Defaults to [`FailurePolicy::Retry`].
    pub const fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the failure policy this singleton was declared with.
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Returns the shared instance, constructing it on first use.
    ///
    /// Once constructed, this is a single atomic load and never blocks.
    ///
    /// # Errors
    ///
    /// - [`SingletonError::Construction`] to the caller whose constructor run failed
    /// - [`SingletonError::Poisoned`] under [`FailurePolicy::Poison`] after a failure
    pub fn instance(&self) -> Result<&T, SingletonError> {
        if let Some(value) = self.slot.get() {
            return Ok(value);
        }
        self.instance_slow()
    }

    #[cold]
    fn instance_slow(&self) -> Result<&T, SingletonError> {
        let type_name = std::any::type_name::<T>();
        let mut ran = false;

        // The closure runs under the slot's init lock, so poison checks and
        // updates are serialized with construction.
        let result = self.slot.init_slow(|| {
            ran = true;

            if let Some(message) = self.poison.get() {
                self.emit(&SingletonEvent::Poisoned { type_name });
                return Err(SingletonError::Poisoned {
                    type_name,
                    message: message.clone(),
                });
            }

            self.emit(&SingletonEvent::Construct { type_name });
            match self.ctor.build() {
                Ok(value) => Ok(value),
                Err(source) => {
                    let error = source.to_string();
                    self.emit(&SingletonEvent::ConstructFailed {
                        type_name,
                        error: error.clone(),
                    });
                    if self.policy == FailurePolicy::Poison {
                        let _ = self.poison.set(error);
                    }
                    Err(SingletonError::construction::<T>(source))
                }
            }
        });

        match &result {
            Ok(_) if ran => self.emit(&SingletonEvent::Constructed { type_name }),
            Ok(_) => self.emit(&SingletonEvent::Contended { type_name }),
            Err(_) => {}
        }
        result
    }

    /// Returns the instance if it has already been constructed. Never blocks.
    pub fn get(&self) -> Option<&T> {
        self.slot.get()
    }

    /// Returns `true` once the instance has been constructed. Never blocks.
    pub fn is_initialized(&self) -> bool {
        self.slot.is_initialized()
    }

    /// Returns `true` if an earlier failure poisoned this singleton.
    pub fn is_poisoned(&self) -> bool {
        self.poison.is_initialized()
    }

    /// Set a tracing callback for this singleton's slow path.
    ///
    /// The callback is never invoked on the fast path. It runs after the trace
    /// lock is released, so it may replace or clear itself. Calling `instance()` on
    /// the same singleton from inside the callback deadlocks while the instance is
    /// still being constructed.
    pub fn set_trace_callback(&self, callback: impl Fn(&SingletonEvent) + Send + Sync + 'static) {
        singleton_event::set_callback(&self.trace, callback);
    }

    /// Clear the tracing callback.
    pub fn clear_trace_callback(&self) {
        singleton_event::clear_callback(&self.trace);
    }

    fn emit(&self, event: &SingletonEvent) {
        singleton_event::emit(&self.trace, event);
    }
}

impl<T: fmt::Debug> fmt::Debug for Singleton<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Singleton")
            .field("value", &self.slot)
            .field("policy", &self.policy)
            .field("poisoned", &self.is_poisoned())
            .finish()
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
