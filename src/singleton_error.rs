use thiserror::Error;

/// Error type returned by fallible constructors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum SingletonError {
    /// The constructor failed. The instance stays uninitialized.
    #[error("failed to construct {type_name}: {source}")]
    Construction {
        type_name: &'static str,
        #[source]
        source: BoxError,
    },

    /// An earlier construction failed under [`FailurePolicy::Poison`](crate::FailurePolicy::Poison).
    #[error("{type_name} is poisoned by an earlier construction failure: {message}")]
    Poisoned {
        type_name: &'static str,
        message: String,
    },

    #[error("{type_name} has not been initialized")]
    NotInitialized { type_name: &'static str },

    #[error("{type_name} is already initialized")]
    AlreadyInitialized { type_name: &'static str },

    #[error("type mismatch in registry for type: {type_name}")]
    TypeMismatch { type_name: &'static str },
}

impl SingletonError {
    /// The type name of the instance the error refers to.
    pub fn type_name(&self) -> &'static str {
        match self {
            SingletonError::Construction { type_name, .. }
            | SingletonError::Poisoned { type_name, .. }
            | SingletonError::NotInitialized { type_name }
            | SingletonError::AlreadyInitialized { type_name }
            | SingletonError::TypeMismatch { type_name } => type_name,
        }
    }

    pub(crate) fn construction<T>(source: impl Into<BoxError>) -> Self {
        SingletonError::Construction {
            type_name: std::any::type_name::<T>(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_construction_display() {
        let err = SingletonError::construction::<u32>("disk on fire");
        assert_eq!(err.to_string(), "failed to construct u32: disk on fire");
    }

    #[test]
    fn test_construction_source() {
        let err = SingletonError::construction::<u32>("disk on fire");
        let source = err.source().expect("construction error carries its cause");
        assert_eq!(source.to_string(), "disk on fire");
    }

    #[test]
    fn test_poisoned_display() {
        let err = SingletonError::Poisoned {
            type_name: "i64",
            message: "boom".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "i64 is poisoned by an earlier construction failure: boom"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn test_lookup_errors_display() {
        let err = SingletonError::NotInitialized { type_name: "u8" };
        assert_eq!(err.to_string(), "u8 has not been initialized");

        let err = SingletonError::AlreadyInitialized { type_name: "u8" };
        assert_eq!(err.to_string(), "u8 is already initialized");

        let err = SingletonError::TypeMismatch { type_name: "u8" };
        assert_eq!(err.to_string(), "type mismatch in registry for type: u8");
    }

    #[test]
    fn test_type_name_accessor() {
        let err = SingletonError::construction::<String>("nope");
        assert_eq!(err.type_name(), "alloc::string::String");
        assert_eq!(
            SingletonError::NotInitialized { type_name: "f32" }.type_name(),
            "f32"
        );
    }

    #[test]
    fn test_error_trait() {
        let err: &dyn std::error::Error = &SingletonError::NotInitialized { type_name: "u16" };
        assert_eq!(err.to_string(), "u16 has not been initialized");
    }
}
