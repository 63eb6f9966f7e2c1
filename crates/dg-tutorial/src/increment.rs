//! The `incr` command of the inverted pendulum.

use dg_core::{DgResult, Value, ValueKind};
use dg_entity::{Command, arg};

use crate::inverted_pendulum::PendulumModel;

/// Integrate the pendulum dynamics over the time step given as argument.
pub struct Increment {
    model: PendulumModel,
}

impl Increment {
    pub(crate) fn new(model: PendulumModel) -> Self {
        Self { model }
    }
}

impl Command for Increment {
    fn signature(&self) -> &[ValueKind] {
        &[ValueKind::Double]
    }

    fn docstring(&self) -> &str {
        "Integrate dynamics for time step provided as input\n\n  take one floating point number as input"
    }

    fn run(&self, args: &[Value]) -> DgResult<Option<Value>> {
        let dt: f64 = arg(args, 0)?;
        self.model.incr(dt)?;
        Ok(None)
    }
}
