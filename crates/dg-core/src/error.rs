use thiserror::Error;

use crate::value::ValueKind;

pub type DgResult<T> = Result<T, DgError>;

/// Errors raised by the graph runtime.
///
/// Every error is reported to the immediate caller of the failing operation.
/// Nothing is retried or replaced by a stale value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DgError {
    #[error("Duplicate {what} name: '{name}'")]
    DuplicateName { what: &'static str, name: String },

    #[error("{what} '{name}' not found")]
    NotFound { what: &'static str, name: String },

    #[error("Signal '{signal}' has no constant, no function and no cached value")]
    UnboundSignal { signal: String },

    #[error("Signal link '{signal}' is not plugged")]
    UnboundLink { signal: String },

    #[error("Signal '{signal}' could not be computed: {source}")]
    StaleInput {
        signal: String,
        #[source]
        source: Box<DgError>,
    },

    #[error("Cycle detected while evaluating signal '{signal}'")]
    CycleDetected { signal: String },

    #[error("Command '{command}' expects {expected} argument(s), got {found}")]
    ArityMismatch {
        command: String,
        expected: usize,
        found: usize,
    },

    #[error("Argument {index} of command '{command}' should be {expected}, got {found}")]
    TypeMismatch {
        command: String,
        index: usize,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("Cannot plug '{producer}' ({found}) into '{consumer}' ({expected})")]
    IncompatibleSignal {
        consumer: String,
        producer: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Signal '{signal}' is not plugable")]
    NotPlugable { signal: String },

    #[error("Unknown entity class: '{class}'")]
    UnknownClass { class: String },

    #[error("No cast registered for type {type_name}")]
    UnregisteredType { type_name: &'static str },

    #[error("Type {type_name} cannot be converted to a Value")]
    Unconvertible { type_name: &'static str },

    #[error("Parse error for {what}: {message}")]
    Parse { what: &'static str, message: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("I/O error: {message}")]
    Io { message: String },
}

impl DgError {
    /// Follow `StaleInput` wrappers down to the error that started the failure.
    pub fn root_cause(&self) -> &DgError {
        let mut err = self;
        while let DgError::StaleInput { source, .. } = err {
            err = source.as_ref();
        }
        err
    }

    pub fn parse(what: &'static str, message: impl Into<String>) -> Self {
        DgError::Parse {
            what,
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for DgError {
    fn from(e: std::io::Error) -> Self {
        DgError::Io {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_cause_unwraps_nested_stale_inputs() {
        let inner = DgError::UnboundLink {
            signal: "b".into(),
        };
        let err = DgError::StaleInput {
            signal: "a".into(),
            source: Box::new(DgError::StaleInput {
                signal: "b".into(),
                source: Box::new(inner.clone()),
            }),
        };
        assert_eq!(err.root_cause(), &inner);
    }

    #[test]
    fn messages_name_the_offender() {
        let err = DgError::TypeMismatch {
            command: "setCartMass".into(),
            index: 0,
            expected: ValueKind::Double,
            found: ValueKind::String,
        };
        assert_eq!(
            err.to_string(),
            "Argument 0 of command 'setCartMass' should be double, got string"
        );
    }
}
