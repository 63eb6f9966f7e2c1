//! dg-tutorial: a cart-pole and its stabilizing controller as graph entities.
//!
//! Provides:
//! - [`InvertedPendulum`]: pendulum-on-a-cart dynamics, integrated on demand
//!   by the `incr` command
//! - [`FeedbackControl`]: state feedback `force = -gain * state`
//! - [`register`] / [`init`]: make both classes creatable by name
//!
//! Plugging `pendulum.state -> controller.state` and
//! `controller.force -> pendulum.forcein` closes the loop; each `incr(dt)`
//! then pulls a fresh force for the next logical time.

pub mod feedback_control;
pub mod increment;
pub mod inverted_pendulum;

use std::sync::OnceLock;

use nalgebra::{DMatrix, DVector};

use dg_core::DgResult;
use dg_entity::Factory;
use dg_signal::{TypeKey, ValueRegistry};

pub use feedback_control::FeedbackControl;
pub use increment::Increment;
pub use inverted_pendulum::{InvertedPendulum, PendulumParams};

/// Register the tutorial classes and the casts of their payload types.
///
/// Payload casts already present in `registry` are left alone.
pub fn register(factory: &Factory, registry: &ValueRegistry) -> DgResult<()> {
    factory.register::<InvertedPendulum>()?;
    factory.register::<FeedbackControl>()?;
    if !registry.contains(TypeKey::of::<DVector<f64>>()) {
        registry.register_value_type::<DVector<f64>>()?;
    }
    if !registry.contains(TypeKey::of::<DMatrix<f64>>()) {
        registry.register_value_type::<DMatrix<f64>>()?;
    }
    Ok(())
}

/// Register into the process-wide factory and registry, once.
pub fn init() -> DgResult<()> {
    static INIT: OnceLock<DgResult<()>> = OnceLock::new();
    INIT.get_or_init(|| register(Factory::global(), ValueRegistry::global()))
        .clone()
}
