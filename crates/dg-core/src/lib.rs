//! dg-core: shared foundation for the dynamic graph runtime.
//!
//! Contains:
//! - time (logical time stamps)
//! - value (closed set of command values + conversions)
//! - codec (text stream format for built-in payloads)
//! - name (fully-qualified signal names)
//! - error (shared error type)

pub mod codec;
pub mod error;
pub mod name;
pub mod time;
pub mod value;

pub use error::{DgError, DgResult};
pub use name::{Direction, SignalName};
pub use time::{NEVER, Time};
pub use value::{Value, ValueKind, ValueType};
