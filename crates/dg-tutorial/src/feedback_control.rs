//! Linear state feedback controller.
//!
//! Computes `force = -gain * state` on demand. The gain is a `1 x 4` matrix
//! for the cart-pole but any shape compatible with the plugged state works.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use nalgebra::{DMatrix, DVector};

use dg_core::{DgError, DgResult, Direction};
use dg_entity::{Entity, EntityClass, EntityCore, Getter, Setter};
use dg_signal::{Signal, SignalLink};

/// Feedback controller entity.
///
/// Signals:
/// - `state` (input, vector)
/// - `force` (output, vector, recomputed once per logical time)
pub struct FeedbackControl {
    core: EntityCore,
    state: SignalLink<DVector<f64>>,
    force: Signal<DVector<f64>>,
    gain: Rc<RefCell<DMatrix<f64>>>,
}

impl FeedbackControl {
    pub fn state(&self) -> &SignalLink<DVector<f64>> {
        &self.state
    }

    pub fn force(&self) -> &Signal<DVector<f64>> {
        &self.force
    }

    pub fn gain(&self) -> DMatrix<f64> {
        self.gain.borrow().clone()
    }

    pub fn set_gain(&self, gain: DMatrix<f64>) {
        *self.gain.borrow_mut() = gain;
    }
}

fn feedback(gain: &DMatrix<f64>, state: &DVector<f64>) -> DgResult<DVector<f64>> {
    if gain.ncols() != state.len() {
        return Err(DgError::InvalidArg {
            what: format!(
                "gain is {}x{} but state has {} entries",
                gain.nrows(),
                gain.ncols(),
                state.len()
            ),
        });
    }
    Ok(-(gain * state))
}

impl EntityClass for FeedbackControl {
    const CLASS_NAME: &'static str = "FeedbackControl";

    fn create(name: &str) -> DgResult<Self> {
        let mut core = EntityCore::new(Self::CLASS_NAME, name)
            .with_docstring("Feedback controller computing force = -gain * state");

        let state = SignalLink::new(core.signal_name(Direction::Input, "vector", "state"));
        let gain = Rc::new(RefCell::new(DMatrix::zeros(1, 4)));

        let (input, k) = (state.clone(), Rc::clone(&gain));
        let force = Signal::computed(
            core.signal_name(Direction::Output, "vector", "force"),
            move |t| feedback(&k.borrow(), &input.get(t)?),
        );
        force.add_dependency(&state);

        core.register_signal(&state)?;
        core.register_signal(&force)?;
        core.register_command(
            "setGain",
            Setter::new(
                &gain,
                |g: &mut DMatrix<f64>, v: DMatrix<f64>| *g = v,
                "Set the feedback gain matrix",
            ),
        )?;
        core.register_command(
            "getGain",
            Getter::new(&gain, |g: &DMatrix<f64>| g.clone(), "Get the feedback gain matrix"),
        )?;

        Ok(Self {
            core,
            state,
            force,
            gain,
        })
    }
}

impl Entity for FeedbackControl {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
