use std::fmt;
use std::sync::{Arc, Mutex};

/// Events emitted while singletons are constructed and looked up.
///
/// These events are passed to the tracing callback set via `set_trace_callback`
/// and are also logged through the `tracing` crate.
/// The `Clone` derive allows callbacks to store or forward events if needed.
///
/// # Examples
///
/// ```rust
/// use lazy_singleton_registry::SingletonEvent;
///
/// let event = SingletonEvent::Construct { type_name: "i32" };
/// assert_eq!(event.to_string(), "construct { type_name: i32 }");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SingletonEvent {
    /// A caller won the init lock and is running the constructor.
    Construct {
        /// The type name of the instance (e.g., "i32", "alloc::string::String")
        type_name: &'static str,
    },

    /// The constructor finished and the instance was published.
    Constructed { type_name: &'static str },

    /// The constructor failed; the instance stays uninitialized.
    ConstructFailed {
        type_name: &'static str,
        /// Display form of the constructor error
        error: String,
    },

    /// A caller missed the fast path and waited on the init lock, but another
    /// caller had published the instance by the time the lock was acquired.
    Contended { type_name: &'static str },

    /// A call was refused because an earlier failure poisoned the instance.
    Poisoned { type_name: &'static str },

    /// A ready value was stored without running a constructor.
    Register { type_name: &'static str },

    /// An already constructed value was requested.
    Get {
        type_name: &'static str,
        /// Whether the value was initialized
        found: bool,
    },

    /// An existence check was performed.
    Contains { type_name: &'static str, found: bool },
}

impl fmt::Display for SingletonEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SingletonEvent::Construct { type_name } => {
                write!(f, "construct {{ type_name: {type_name} }}")
            }
            SingletonEvent::Constructed { type_name } => {
                write!(f, "constructed {{ type_name: {type_name} }}")
            }
            SingletonEvent::ConstructFailed { type_name, error } => {
                write!(
                    f,
                    "construct failed {{ type_name: {type_name}, error: {error} }}"
                )
            }
            SingletonEvent::Contended { type_name } => {
                write!(f, "contended {{ type_name: {type_name} }}")
            }
            SingletonEvent::Poisoned { type_name } => {
                write!(f, "poisoned {{ type_name: {type_name} }}")
            }
            SingletonEvent::Register { type_name } => {
                write!(f, "register {{ type_name: {type_name} }}")
            }
            SingletonEvent::Get { type_name, found } => {
                write!(f, "get {{ type_name: {type_name}, found: {found} }}")
            }
            SingletonEvent::Contains { type_name, found } => {
                write!(f, "contains {{ type_name: {type_name}, found: {found} }}")
            }
        }
    }
}

/// Type alias for the user-supplied tracing callback.
///
/// The callback receives a reference to a `SingletonEvent` every time a slow path
/// or lookup runs. It must be thread-safe because singletons are globally shared.
pub type TraceCallback = dyn Fn(&SingletonEvent) + Send + Sync + 'static;

/// Storage for an optional trace callback. `Mutex::new(None)` is const, so this
/// can back a `static` directly.
pub type TraceHook = Mutex<Option<Arc<TraceCallback>>>;

pub(crate) fn set_callback(
    hook: &TraceHook,
    callback: impl Fn(&SingletonEvent) + Send + Sync + 'static,
) {
    let mut guard = hook.lock().unwrap_or_else(|p| p.into_inner());
    *guard = Some(Arc::new(callback));
}

pub(crate) fn clear_callback(hook: &TraceHook) {
    let mut guard = hook.lock().unwrap_or_else(|p| p.into_inner());
    *guard = None;
}

/// Logs the event through `tracing` and forwards it to the callback, if any.
///
/// The callback is invoked after the hook lock is released.
pub(crate) fn emit(hook: &TraceHook, event: &SingletonEvent) {
    log_event(event);

    // lock poisoning unlikely; if poisoned, keep emitting with recovered lock
    let callback = hook.lock().unwrap_or_else(|p| p.into_inner()).clone();
    if let Some(callback) = callback {
        callback(event);
    }
}

fn log_event(event: &SingletonEvent) {
    match event {
        SingletonEvent::Construct { type_name } => {
            tracing::debug!(type_name, "constructing singleton");
        }
        SingletonEvent::Constructed { type_name } => {
            tracing::debug!(type_name, "singleton constructed");
        }
        SingletonEvent::ConstructFailed { type_name, error } => {
            tracing::warn!(type_name, error = %error, "singleton construction failed");
        }
        SingletonEvent::Poisoned { type_name } => {
            tracing::warn!(type_name, "singleton is poisoned");
        }
        SingletonEvent::Contended { type_name } => {
            tracing::trace!(type_name, "singleton already constructed by another caller");
        }
        SingletonEvent::Register { type_name } => {
            tracing::debug!(type_name, "singleton registered");
        }
        SingletonEvent::Get { type_name, found } => {
            tracing::trace!(type_name, found, "singleton lookup");
        }
        SingletonEvent::Contains { type_name, found } => {
            tracing::trace!(type_name, found, "singleton existence check");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singleton_event_display() {
        let event = SingletonEvent::Register { type_name: "i32" };
        assert_eq!(event.to_string(), "register { type_name: i32 }");

        let event = SingletonEvent::Get {
            type_name: "String",
            found: true,
        };
        assert_eq!(event.to_string(), "get { type_name: String, found: true }");

        let event = SingletonEvent::Contains {
            type_name: "u8",
            found: false,
        };
        assert_eq!(
            event.to_string(),
            "contains { type_name: u8, found: false }"
        );

        let event = SingletonEvent::ConstructFailed {
            type_name: "u8",
            error: "nope".to_string(),
        };
        assert_eq!(
            event.to_string(),
            "construct failed { type_name: u8, error: nope }"
        );

        let event = SingletonEvent::Contended { type_name: "u8" };
        assert_eq!(event.to_string(), "contended { type_name: u8 }");
    }

    #[test]
    fn test_singleton_event_clone() {
        let event = SingletonEvent::Constructed { type_name: "i32" };
        let cloned = event.clone();
        assert_eq!(event, cloned);
    }

    #[test]
    fn test_emit_reaches_callback_until_cleared() {
        static HOOK: TraceHook = Mutex::new(None);

        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        set_callback(&HOOK, move |e| {
            events_clone.lock().unwrap().push(e.clone());
        });

        emit(&HOOK, &SingletonEvent::Construct { type_name: "u8" });
        clear_callback(&HOOK);
        emit(&HOOK, &SingletonEvent::Constructed { type_name: "u8" });

        let captured = events.lock().unwrap();
        assert_eq!(*captured, vec![SingletonEvent::Construct { type_name: "u8" }]);
    }

    #[test]
    fn test_callback_may_clear_itself() {
        static HOOK: TraceHook = Mutex::new(None);

        let calls = Arc::new(Mutex::new(0usize));
        let calls_clone = calls.clone();
        set_callback(&HOOK, move |_| {
            *calls_clone.lock().unwrap() += 1;
            clear_callback(&HOOK);
        });

        emit(&HOOK, &SingletonEvent::Construct { type_name: "u8" });
        emit(&HOOK, &SingletonEvent::Constructed { type_name: "u8" });

        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_emit_without_callback_is_noop() {
        let hook: TraceHook = Mutex::new(None);
        emit(&hook, &SingletonEvent::Poisoned { type_name: "u8" });
    }
}
