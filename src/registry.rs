//! The crate-wide default registry.
//!
//! Its free functions are re-exported at the crate root, so small programs can use
//! lazily constructed singletons without declaring a registry of their own.
//!
//! # Examples
//!
//! ```
//! use lazy_singleton_registry::{get, get_or_init};
//! use std::sync::Arc;
//!
//! struct Greeting(String);
//!
//! let first: Arc<Greeting> = get_or_init(|| Greeting("Hello, World!".to_string())).unwrap();
//! let second: Arc<Greeting> = get().unwrap();
//!
//! assert!(Arc::ptr_eq(&first, &second));
//! assert_eq!(second.0, "Hello, World!");
//! ```

define_registry!(global);

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
