//! Core trait defining registry behavior.
//!
//! This module provides the `RegistryApi` trait with default implementations for
//! type-keyed, lazily constructed singletons.
//!
//! The registry is type-based: each type (`TypeId`) owns one [`OnceSlot`], created empty
//! on first mention and filled at most once. A filled slot is never replaced or cleared,
//! so every `Arc<T>` handed out for a type points at the same instance.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, LazyLock, RwLock};

use crate::once_slot::OnceSlot;
use crate::singleton_event::{self, SingletonEvent, TraceHook};
use crate::{BoxError, SingletonError};

/// Type-erased slots, keyed by the `TypeId` of the instance type.
///
/// Every value is an `Arc<OnceSlot<Arc<T>>>` for the `T` of its key.
pub type SlotMap = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// Type alias for the storage static.
///
/// Note: the `define_registry!` macro names this type through `$crate::Storage`.
pub type Storage = LazyLock<RwLock<SlotMap>>;

type Slot<T> = OnceSlot<Arc<T>>;

/// Core trait defining registry behavior.
///
/// Provides default implementations for all registry operations, requiring only
/// two accessor methods (`storage` and `trace`) to be implemented by the implementor.
pub trait RegistryApi {
    // -------------------------------------------------------------------------------------------------
    // Tracing
    // -------------------------------------------------------------------------------------------------

    /// Access the trace callback static.
    fn trace() -> &'static TraceHook;

    /// Set a tracing callback for registry operations.
    ///
    /// The callback is invoked on construction, registration and explicit lookups
    /// (`get`, `contains`). It is not invoked when `get_or_init` finds an already
    /// constructed instance.
    ///
    /// # Lock Poisoning Recovery
    ///
    /// If the trace lock is poisoned, this method recovers by extracting the inner value.
    ///
    /// # Re-entrancy
    ///
    /// The callback runs after the trace lock is released, so it may call any method
    /// of this registry, including `set_trace_callback` and `clear_trace_callback`.
    /// `Construct` is emitted while the slot's init lock is held: requesting the type
    /// being constructed from inside the callback deadlocks, the same as requesting it
    /// from its own constructor.
    fn set_trace_callback(&self, callback: impl Fn(&SingletonEvent) + Send + Sync + 'static) {
        singleton_event::set_callback(Self::trace(), callback);
    }

    /// Clear the tracing callback.
    ///
    /// Does not affect constructed instances.
    fn clear_trace_callback(&self) {
        singleton_event::clear_callback(Self::trace());
    }

    /// Logs the event and passes it to the current callback, if any.
    fn emit_event(&self, event: &SingletonEvent) {
        singleton_event::emit(Self::trace(), event);
    }

    // -------------------------------------------------------------------------------------------------
    // Registry
    // -------------------------------------------------------------------------------------------------

    /// Access the storage static.
    fn storage() -> &'static Storage;

    /// Returns the slot for `T`, creating an empty one if `T` was never mentioned.
    ///
    /// Concurrent callers converge on a single slot: the insert happens under the
    /// write lock through `entry().or_insert_with`.
    #[doc(hidden)]
    fn slot<T: Send + Sync + 'static>(&self) -> Result<Arc<Slot<T>>, SingletonError> {
        if let Some(slot) = self.existing_slot::<T>()? {
            return Ok(slot);
        }

        let any_slot = Self::storage()
            .write()
            // The map is insert-only, so a poisoned lock still guards a consistent map.
            .unwrap_or_else(|p| p.into_inner())
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Arc::new(Slot::<T>::new()) as Arc<dyn Any + Send + Sync>)
            .clone();

        downcast_slot::<T>(any_slot)
    }

    /// Returns the slot for `T` without creating one.
    #[doc(hidden)]
    fn existing_slot<T: Send + Sync + 'static>(
        &self,
    ) -> Result<Option<Arc<Slot<T>>>, SingletonError> {
        let any_slot = Self::storage()
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(&TypeId::of::<T>())
            .cloned();

        any_slot.map(downcast_slot::<T>).transpose()
    }

    /// Returns the instance of `T`, constructing it with `f` on first use.
    ///
    /// # Errors
    ///
    /// - Type mismatch in the slot map (not reachable through this trait)
    fn get_or_init<T: Send + Sync + 'static>(
        &self,
        f: impl FnOnce() -> T,
    ) -> Result<Arc<T>, SingletonError> {
        self.get_or_try_init(|| Ok::<T, Infallible>(f()))
    }

    /// Returns the instance of `T`, constructing it with the fallible `f` on first use.
    ///
    /// Among any number of concurrent callers for the same `T`, at most one runs `f`.
    /// `f` runs without the map lock held, so it may request other types from this
    /// registry. Requesting `T` itself from inside `f` deadlocks.
    ///
    /// # Errors
    ///
    /// - `SingletonError::Construction` if `f` fails; the slot stays empty and the
    ///   next call retries
    /// - Type mismatch in the slot map
    fn get_or_try_init<T, E>(
        &self,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, SingletonError>
    where
        T: Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let slot = self.slot::<T>()?;
        if let Some(value) = slot.get() {
            return Ok(Arc::clone(value));
        }

        let type_name = std::any::type_name::<T>();
        let mut ran = false;
        let result = slot
            .init_slow(|| {
                ran = true;
                self.emit_event(&SingletonEvent::Construct { type_name });
                f().map(Arc::new).map_err(|e| {
                    let source: BoxError = e.into();
                    self.emit_event(&SingletonEvent::ConstructFailed {
                        type_name,
                        error: source.to_string(),
                    });
                    SingletonError::construction::<T>(source)
                })
            })
            .map(Arc::clone);

        if result.is_ok() {
            if ran {
                self.emit_event(&SingletonEvent::Constructed { type_name });
            } else {
                self.emit_event(&SingletonEvent::Contended { type_name });
            }
        }
        result
    }

    /// Register a ready value for `T`.
    ///
    /// Takes ownership of the value and wraps it in an `Arc` automatically.
    ///
    /// # Errors
    ///
    /// - `SingletonError::AlreadyInitialized` if `T` already has an instance; the
    ///   existing instance is kept
    fn register<T: Send + Sync + 'static>(&self, value: T) -> Result<(), SingletonError> {
        self.register_arc(Arc::new(value))
    }

    /// Register an Arc-wrapped value for `T`.
    ///
    /// More efficient than `register` when you already have an `Arc`,
    /// as it avoids creating an additional reference count.
    fn register_arc<T: Send + Sync + 'static>(&self, value: Arc<T>) -> Result<(), SingletonError> {
        let type_name = std::any::type_name::<T>();

        self.slot::<T>()?
            .set(value)
            .map_err(|_| SingletonError::AlreadyInitialized { type_name })?;

        self.emit_event(&SingletonEvent::Register { type_name });
        Ok(())
    }

    /// Retrieve the instance of `T` without constructing it.
    ///
    /// # Errors
    ///
    /// - `SingletonError::NotInitialized` if `T` has no instance yet
    /// - Type mismatch (extremely rare)
    fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, SingletonError> {
        let value = self
            .existing_slot::<T>()?
            .and_then(|slot| slot.get().cloned());

        self.emit_event(&SingletonEvent::Get {
            type_name: std::any::type_name::<T>(),
            found: value.is_some(),
        });

        value.ok_or(SingletonError::NotInitialized {
            type_name: std::any::type_name::<T>(),
        })
    }

    /// Retrieve a cloned value from the registry.
    ///
    /// Returns an owned value by cloning the instance stored in the registry.
    ///
    /// # Errors
    ///
    /// Same as [`get`](RegistryApi::get).
    fn get_cloned<T: Send + Sync + Clone + 'static>(&self) -> Result<T, SingletonError> {
        let arc = self.get::<T>()?;
        Ok((*arc).clone())
    }

    /// Check if `T` has an instance in the registry.
    ///
    /// Returns `Ok(false)` for types that are unknown or whose construction has not
    /// succeeded yet.
    fn contains<T: Send + Sync + 'static>(&self) -> Result<bool, SingletonError> {
        let found = self
            .existing_slot::<T>()?
            .is_some_and(|slot| slot.is_initialized());

        self.emit_event(&SingletonEvent::Contains {
            type_name: std::any::type_name::<T>(),
            found,
        });

        Ok(found)
    }
}

fn downcast_slot<T: Send + Sync + 'static>(
    any_slot: Arc<dyn Any + Send + Sync>,
) -> Result<Arc<Slot<T>>, SingletonError> {
    any_slot
        .downcast::<Slot<T>>()
        .map_err(|_| SingletonError::TypeMismatch {
            type_name: std::any::type_name::<T>(),
        })
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
