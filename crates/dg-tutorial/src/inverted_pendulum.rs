//! Inverted pendulum on a cart.
//!
//! State vector `[x, theta, dx, dtheta]`: cart position, pendulum angle from
//! the upward vertical and their rates. The input is a one-element force
//! vector applied to the cart.
//!
//! The state is not computed on demand. It is held as the constant of the
//! `state` signal and advanced explicitly by [`InvertedPendulum::incr`] (or
//! the `incr` command), which stamps the signal with the new logical time.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use nalgebra::{DVector, Matrix2, Vector2};
use tracing::trace;

use dg_core::{DgError, DgResult, Direction, Time};
use dg_entity::{Entity, EntityClass, EntityCore, Getter, Setter};
use dg_signal::{Signal, SignalLink};

use crate::increment::Increment;

/// Gravity acceleration (m/s^2).
pub const GRAVITY: f64 = 9.81;

/// Number of state variables.
pub const STATE_SIZE: usize = 4;

/// Physical parameters of the cart-pole.
#[derive(Debug, Clone, PartialEq)]
pub struct PendulumParams {
    /// Mass of the cart (kg).
    pub cart_mass: f64,
    /// Mass of the pendulum tip (kg).
    pub pendulum_mass: f64,
    /// Length of the pendulum (m).
    pub pendulum_length: f64,
    /// Viscous friction coefficient of the cart.
    pub viscosity: f64,
}

impl Default for PendulumParams {
    fn default() -> Self {
        Self {
            cart_mass: 1.0,
            pendulum_mass: 1.0,
            pendulum_length: 1.0,
            viscosity: 0.1,
        }
    }
}

impl PendulumParams {
    /// Time derivative of `state` under `force`.
    ///
    /// Solves the 2x2 mass matrix system for the cart and angular
    /// accelerations. Fails with `InvalidArg` if the matrix is singular.
    pub fn derivative(&self, state: &DVector<f64>, force: f64) -> DgResult<DVector<f64>> {
        if state.len() != STATE_SIZE {
            return Err(DgError::InvalidArg {
                what: format!("pendulum state has {} entries, expected {STATE_SIZE}", state.len()),
            });
        }
        let (m, cart, l, lambda) = (
            self.pendulum_mass,
            self.cart_mass,
            self.pendulum_length,
            self.viscosity,
        );
        let (theta, dx, dtheta) = (state[1], state[2], state[3]);
        let (sin, cos) = theta.sin_cos();

        let mass = Matrix2::new(m + cart, m * l * cos, m * l * cos, m * l * l);
        let rhs = Vector2::new(
            force + m * l * dtheta * dtheta * sin - lambda * dx,
            m * l * GRAVITY * sin,
        );
        let acc = mass.lu().solve(&rhs).ok_or_else(|| DgError::InvalidArg {
            what: "singular pendulum mass matrix".to_string(),
        })?;

        Ok(DVector::from_vec(vec![dx, dtheta, acc[0], acc[1]]))
    }

    /// One explicit Euler step of length `dt`.
    pub fn step(&self, state: &DVector<f64>, force: f64, dt: f64) -> DgResult<DVector<f64>> {
        let rate = self.derivative(state, force)?;
        Ok(state + rate * dt)
    }
}

/// Signals and parameters shared by the entity and its `incr` command.
#[derive(Clone)]
pub(crate) struct PendulumModel {
    force: SignalLink<DVector<f64>>,
    state: Signal<DVector<f64>>,
    params: Rc<RefCell<PendulumParams>>,
}

impl PendulumModel {
    /// Integrate over `dt` and publish the new state at the next logical time.
    pub(crate) fn incr(&self, dt: f64) -> DgResult<Time> {
        if dt.is_nan() || dt <= 0.0 {
            return Err(DgError::InvalidArg {
                what: format!("time step must be positive, got {dt}"),
            });
        }

        let time = self.state.time().max(0) + 1;
        let state = self.state.get(time)?;
        let force = self.force.get(time)?;
        let f = *force.get(0).ok_or_else(|| DgError::InvalidArg {
            what: "force vector is empty".to_string(),
        })?;

        let next = self.params.borrow().step(&state, f, dt)?;
        trace!(signal = self.state.name(), time, force = f, "pendulum step");

        self.state.set_constant(next);
        self.state.set_time(time);
        Ok(time)
    }
}

/// Cart-pole entity.
///
/// Signals:
/// - `forcein` (input, vector of size 1, constant `[0]` until plugged)
/// - `state` (output, vector of size 4, starts at rest in the upright position)
pub struct InvertedPendulum {
    core: EntityCore,
    model: PendulumModel,
}

impl InvertedPendulum {
    /// Input force signal.
    pub fn force(&self) -> &SignalLink<DVector<f64>> {
        &self.model.force
    }

    /// Output state signal.
    pub fn state(&self) -> &Signal<DVector<f64>> {
        &self.model.state
    }

    pub fn params(&self) -> PendulumParams {
        self.model.params.borrow().clone()
    }

    pub fn set_params(&self, params: PendulumParams) {
        *self.model.params.borrow_mut() = params;
    }

    /// Integrate the equations of motion over `dt`.
    ///
    /// Returns the logical time now stamped on the state signal.
    pub fn incr(&self, dt: f64) -> DgResult<Time> {
        self.model.incr(dt)
    }
}

impl EntityClass for InvertedPendulum {
    const CLASS_NAME: &'static str = "InvertedPendulum";

    fn create(name: &str) -> DgResult<Self> {
        let mut core = EntityCore::new(Self::CLASS_NAME, name)
            .with_docstring("Classical inverted pendulum dynamic model");

        let force = SignalLink::new(core.signal_name(Direction::Input, "vector", "forcein"));
        force.set_constant(DVector::zeros(1));
        let state = Signal::constant(
            core.signal_name(Direction::Output, "vector", "state"),
            DVector::zeros(STATE_SIZE),
        );
        core.register_signal(&force)?;
        core.register_signal(&state)?;

        let params = Rc::new(RefCell::new(PendulumParams::default()));
        let model = PendulumModel {
            force,
            state,
            params: Rc::clone(&params),
        };

        core.register_command("incr", Increment::new(model.clone()))?;
        core.register_command(
            "setCartMass",
            Setter::new(&params, |p: &mut PendulumParams, v: f64| p.cart_mass = v, "Set cart mass"),
        )?;
        core.register_command(
            "getCartMass",
            Getter::new(&params, |p: &PendulumParams| p.cart_mass, "Get cart mass"),
        )?;
        core.register_command(
            "setPendulumMass",
            Setter::new(
                &params,
                |p: &mut PendulumParams, v: f64| p.pendulum_mass = v,
                "Set pendulum mass",
            ),
        )?;
        core.register_command(
            "getPendulumMass",
            Getter::new(&params, |p: &PendulumParams| p.pendulum_mass, "Get pendulum mass"),
        )?;
        core.register_command(
            "setPendulumLength",
            Setter::new(
                &params,
                |p: &mut PendulumParams, v: f64| p.pendulum_length = v,
                "Set pendulum length",
            ),
        )?;
        core.register_command(
            "getPendulumLength",
            Getter::new(&params, |p: &PendulumParams| p.pendulum_length, "Get pendulum length"),
        )?;
        core.register_command(
            "setViscosity",
            Setter::new(&params, |p: &mut PendulumParams, v: f64| p.viscosity = v, "Set viscosity"),
        )?;
        core.register_command(
            "getViscosity",
            Getter::new(&params, |p: &PendulumParams| p.viscosity, "Get viscosity"),
        )?;

        Ok(Self { core, model })
    }
}

impl Entity for InvertedPendulum {
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
