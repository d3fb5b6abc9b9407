//! Macros for creating singleton registries.
//!
//! This module provides a simple macro-based approach to create type-keyed,
//! thread-safe registries of lazily constructed singletons.

/// Creates a complete singleton registry with a single macro invocation.
///
/// The macro generates a module containing:
/// - Storage static (hidden)
/// - Trace callback static (hidden)
/// - An `Api` struct that implements `RegistryApi`
///
/// # Examples
///
/// ```rust
/// use lazy_singleton_registry::define_registry;
/// use std::sync::Arc;
///
/// struct Database {
///     url: String,
/// }
///
/// // Create a registry
/// define_registry!(services);
///
/// // The first call constructs, every later call shares the same instance
/// let db: Arc<Database> = services::get_or_init(|| Database {
///     url: "postgres://localhost".to_string(),
/// })
/// .unwrap();
/// let again: Arc<Database> = services::get().unwrap();
///
/// assert!(Arc::ptr_eq(&db, &again));
/// assert_eq!(again.url, "postgres://localhost");
/// ```
///
/// # Multiple Registries
///
/// You can create multiple isolated registries:
///
/// ```rust
/// use lazy_singleton_registry::define_registry;
///
/// define_registry!(database);
/// define_registry!(cache);
///
/// // Each registry is completely isolated
/// database::register("db_connection".to_string()).unwrap();
///
/// assert!(database::contains::<String>().unwrap());
/// assert!(!cache::contains::<String>().unwrap());
/// ```
///
/// # Trait-Based Usage
///
/// If you need trait-based usage, the `API` constant is available:
///
/// ```rust
/// use lazy_singleton_registry::{define_registry, RegistryApi};
/// use std::sync::Arc;
///
/// define_registry!(app);
///
/// let value: Arc<i32> = app::API.get_or_init(|| 100).unwrap();
/// assert_eq!(*value, 100);
/// ```
#[macro_export]
macro_rules! define_registry {
    ($name:ident) => {
        pub mod $name {
            use std::sync::{Arc, LazyLock, Mutex, RwLock};

            // Slots for lazily constructed instances (module-private)
            static STORAGE: $crate::Storage = LazyLock::new(|| RwLock::new($crate::SlotMap::new()));

            // Trace callback storage (module-private)
            static TRACE: $crate::TraceHook = Mutex::new(None);

            /// Zero-sized type that implements the registry API.
            ///
            /// All registry operations are provided by the `RegistryApi` trait's
            /// default implementations. This struct only provides access to the statics.
            pub struct Api;

            impl $crate::RegistryApi for Api {
                fn storage() -> &'static $crate::Storage {
                    &STORAGE
                }

                fn trace() -> &'static $crate::TraceHook {
                    &TRACE
                }
            }

            /// Convenient constant for accessing the registry API.
            pub const API: Api = Api;

            // Free functions for ergonomic usage - they delegate to API

            /// Return the instance of `T`, constructing it with `f` on first use.
            pub fn get_or_init<T: Send + Sync + 'static>(
                f: impl FnOnce() -> T,
            ) -> Result<Arc<T>, $crate::SingletonError> {
                use $crate::RegistryApi;
                API.get_or_init(f)
            }

            /// Return the instance of `T`, constructing it with the fallible `f` on first use.
            pub fn get_or_try_init<T, E>(
                f: impl FnOnce() -> Result<T, E>,
            ) -> Result<Arc<T>, $crate::SingletonError>
            where
                T: Send + Sync + 'static,
                E: Into<$crate::BoxError>,
            {
                use $crate::RegistryApi;
                API.get_or_try_init(f)
            }

            /// Register a ready value for `T`.
            pub fn register<T: Send + Sync + 'static>(
                value: T,
            ) -> Result<(), $crate::SingletonError> {
                use $crate::RegistryApi;
                API.register(value)
            }

            /// Register an Arc-wrapped value for `T`.
            pub fn register_arc<T: Send + Sync + 'static>(
                value: Arc<T>,
            ) -> Result<(), $crate::SingletonError> {
                use $crate::RegistryApi;
                API.register_arc(value)
            }

            /// Retrieve an already constructed instance.
            pub fn get<T: Send + Sync + 'static>() -> Result<Arc<T>, $crate::SingletonError> {
                use $crate::RegistryApi;
                API.get()
            }

            /// Retrieve a clone of an already constructed instance.
            pub fn get_cloned<T: Send + Sync + Clone + 'static>(
            ) -> Result<T, $crate::SingletonError> {
                use $crate::RegistryApi;
                API.get_cloned()
            }

            /// Check if `T` has an instance in the registry.
            pub fn contains<T: Send + Sync + 'static>() -> Result<bool, $crate::SingletonError> {
                use $crate::RegistryApi;
                API.contains::<T>()
            }

            /// Set a tracing callback for registry operations.
            pub fn set_trace_callback(
                callback: impl Fn(&$crate::SingletonEvent) + Send + Sync + 'static,
            ) {
                use $crate::RegistryApi;
                API.set_trace_callback(callback)
            }

            /// Clear the tracing callback.
            pub fn clear_trace_callback() {
                use $crate::RegistryApi;
                API.clear_trace_callback()
            }
        }
    };
}
