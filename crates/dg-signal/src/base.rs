//! Type-erased view of signals.
//!
//! Entities store their signals as `Box<dyn SignalBase>` so that callers can
//! look them up by name, plug them together and read or write their payloads
//! as text without knowing the payload type.

use std::any::{Any, TypeId};
use std::io;

use dg_core::{DgError, DgResult, SignalName, Time, Value};

use crate::registry::ValueRegistry;

/// Something a [`crate::SignalLink`] can forward to.
pub(crate) trait Produce<T> {
    fn produce(&self, time: Time) -> DgResult<T>;

    fn produce_time(&self) -> Time;
}

pub trait SignalBase {
    /// Fully-qualified name.
    fn name(&self) -> &str;

    /// Name the owning entity uses as the lookup key.
    fn short_name(&self) -> &str {
        SignalName::short_name(self.name())
    }

    fn payload_type(&self) -> TypeId;

    fn payload_type_name(&self) -> &'static str;

    /// Time of the last computation, or [`dg_core::NEVER`].
    fn time(&self) -> Time;

    /// Bring the signal up to date for `time`, discarding the value.
    fn recompute(&self, time: Time) -> DgResult<()>;

    /// Read the payload as a [`Value`]; fails for payloads outside the closed set.
    fn value(&self, time: Time) -> DgResult<Value>;

    /// Write the payload at `time` through the cast registered for its type.
    fn write_value(
        &self,
        time: Time,
        registry: &ValueRegistry,
        out: &mut dyn io::Write,
    ) -> DgResult<()>;

    /// Read a payload through the registered cast and make it the constant value.
    fn read_constant(&self, registry: &ValueRegistry, input: &mut dyn io::Read) -> DgResult<()>;

    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    fn is_plugged(&self) -> bool {
        false
    }

    /// Name of the producer this signal forwards to, if any.
    fn plugged_to(&self) -> Option<String> {
        None
    }

    fn plug(&self, _producer: &dyn SignalBase) -> DgResult<()> {
        Err(DgError::NotPlugable {
            signal: self.name().to_string(),
        })
    }

    fn unplug(&self) -> DgResult<()> {
        Err(DgError::NotPlugable {
            signal: self.name().to_string(),
        })
    }

    fn as_any(&self) -> &dyn Any;

    fn clone_box(&self) -> Box<dyn SignalBase>;

    /// One-line summary for entity listings.
    fn describe(&self) -> String {
        let mut line = format!("{} [{}]", self.name(), self.payload_type_name());
        if let Some(producer) = self.plugged_to() {
            line.push_str(" <- ");
            line.push_str(&producer);
        }
        let deps = self.dependencies();
        if !deps.is_empty() {
            line.push_str(" depends on ");
            line.push_str(&deps.join(", "));
        }
        line
    }
}

impl Clone for Box<dyn SignalBase> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl std::fmt::Debug for dyn SignalBase + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}
