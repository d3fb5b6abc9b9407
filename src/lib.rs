//! # Lazy Singleton Registry
//!
//! Process-wide instances that are constructed exactly once, on first use, and are
//! then shared with every caller on every thread.
//!
//! The crate is built in three layers:
//!
//! - [`OnceSlot`]: the double-checked initialization cell. A lock-free fast path
//!   (one `Acquire` load) and a mutex-guarded slow path that re-checks before
//!   constructing.
//! - [`Singleton`]: a `static`-friendly singleton bound to its constructor, with a
//!   configurable [`FailurePolicy`].
//! - [`RegistryApi`] and [`define_registry!`]: type-keyed registries holding one lazily
//!   constructed instance per type.
//!
//! ## Quick Start
//!
//! ```rust
//! use lazy_singleton_registry::Singleton;
//!
//! struct Config {
//!     name: &'static str,
//! }
//!
//! static CONFIG: Singleton<Config> = Singleton::new(|| Config { name: "app" });
//!
//! assert_eq!(CONFIG.instance().unwrap().name, "app");
//! ```
//!
//! ## Failure handling
//!
//! A failed construction is reported to the caller that ran it and nothing is cached;
//! by default the next call tries again. [`FailurePolicy::Poison`] turns the first
//! failure into a permanent [`SingletonError::Poisoned`] instead.
//!
//! ## Main Functions
//!
//! The default registry's functions are re-exported here:
//!
//! - [`get_or_init`] - Return the instance of a type, constructing it on first use
//! - [`get_or_try_init`] - Same, with a fallible constructor
//! - [`register`] / [`register_arc`] - Store a ready instance
//! - [`get`] / [`get_cloned`] - Retrieve an already constructed instance
//! - [`contains`] - Check if a type has an instance
//! - [`set_trace_callback`] - Set up tracing for registry operations

#[macro_use]
mod macros;

mod once_slot;
mod registry;
mod registry_trait;
mod singleton;
mod singleton_error;
mod singleton_event;

pub use once_slot::OnceSlot;
pub use registry::global;
pub use registry_trait::{RegistryApi, SlotMap, Storage};
pub use singleton::{FailurePolicy, Singleton};
pub use singleton_error::{BoxError, SingletonError};
pub use singleton_event::{SingletonEvent, TraceCallback, TraceHook};

// Re-export the default registry's API
pub use registry::global::{
    clear_trace_callback, contains, get, get_cloned, get_or_init, get_or_try_init, register,
    register_arc, set_trace_callback,
};
