//! Integration tests for lazily constructed trait objects.
//!
//! Trait objects are stored as `Arc<dyn Trait>` instances, which is useful for
//! dependency injection and plugin systems.
//!
//! NOTE: All tests use #[serial] because they share the same registry (traits).

use lazy_singleton_registry::define_registry;
use serial_test::serial;
use std::sync::Arc;

// Create a registry for these tests
define_registry!(traits);

trait Logger: Send + Sync {
    fn get_name(&self) -> &str;
}

trait Calculator: Send + Sync {
    fn calculate(&self, a: i32, b: i32) -> i32;
}

trait Formatter: Send + Sync {
    fn format(&self, value: &str) -> String;
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn get_name(&self) -> &str {
        "ConsoleLogger"
    }
}

struct AddCalculator;
impl Calculator for AddCalculator {
    fn calculate(&self, a: i32, b: i32) -> i32 {
        a + b
    }
}

struct UppercaseFormatter;
impl Formatter for UppercaseFormatter {
    fn format(&self, value: &str) -> String {
        value.to_uppercase()
    }
}

#[test]
#[serial]
fn test_multiple_trait_objects() {
    traits::get_or_init(|| Arc::new(AddCalculator) as Arc<dyn Calculator>).unwrap();
    traits::get_or_init(|| Arc::new(UppercaseFormatter) as Arc<dyn Formatter>).unwrap();

    let calc: Arc<Arc<dyn Calculator>> = traits::get().unwrap();
    assert_eq!(calc.calculate(40, 2), 42);

    // get_cloned() clones the stored Arc<dyn Formatter>, which is cheap
    let fmt: Arc<dyn Formatter> = traits::get_cloned().unwrap();
    assert_eq!(fmt.format("hello"), "HELLO");
}

#[test]
#[serial]
fn test_dependency_injection_pattern() {
    struct Component;
    impl Component {
        fn process(&self) -> i32 {
            let calc = traits::get_or_init(|| Arc::new(AddCalculator) as Arc<dyn Calculator>)
                .unwrap();
            calc.calculate(20, 22)
        }
    }

    assert_eq!(Component.process(), 42);
    assert_eq!(Component.process(), 42);
}

#[test]
#[serial]
fn test_concrete_and_trait_types_are_separate() {
    #[derive(Clone)]
    struct MultiLogger {
        prefix: String,
    }

    impl Logger for MultiLogger {
        fn get_name(&self) -> &str {
            &self.prefix
        }
    }

    // Concrete type - has access to all fields
    traits::register(MultiLogger {
        prefix: "[CONCRETE]".to_string(),
    })
    .unwrap();
    let concrete = traits::get::<MultiLogger>().unwrap();
    assert_eq!(concrete.prefix, "[CONCRETE]");

    // Trait object - its own slot
    let trait_obj = traits::get_or_init(|| {
        Arc::new(MultiLogger {
            prefix: "[TRAIT]".to_string(),
        }) as Arc<dyn Logger>
    })
    .unwrap();
    assert_eq!(trait_obj.get_name(), "[TRAIT]");

    // The first trait object stays in place
    assert!(traits::register(Arc::new(ConsoleLogger) as Arc<dyn Logger>).is_err());
    assert_eq!(
        traits::get::<Arc<dyn Logger>>().unwrap().get_name(),
        "[TRAIT]"
    );

    assert!(traits::contains::<MultiLogger>().unwrap());
    assert!(traits::contains::<Arc<dyn Logger>>().unwrap());
}
