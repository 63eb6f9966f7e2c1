//! Time-stamped, lazily computed signals.
//!
//! A [`Signal`] is in one of three states:
//! - **constant**: `get` returns the constant for every time
//! - **computed**: `get(t)` returns the cached value if it was computed for
//!   `t`, otherwise calls the compute function once and caches the result
//! - **unbound**: no constant and no function; `get` returns the last cached
//!   value if there is one, or fails with `UnboundSignal`
//!
//! Caching is keyed only by time. A computed signal recomputes once per
//! distinct time it is asked for, whether or not its inputs changed.

use std::any::{Any, TypeId, type_name};
use std::cell::{Cell, RefCell};
use std::io;
use std::rc::{Rc, Weak};

use tracing::trace;

use dg_core::{DgError, DgResult, NEVER, Time, Value};

use crate::base::{Produce, SignalBase};
use crate::registry::{TypeKey, ValueRegistry};

/// Compute function of a signal: produce the value for the requested time.
///
/// The function may read other signals (usually through a
/// [`crate::SignalLink`]) at the same time.
pub type ComputeFn<T> = Box<dyn FnMut(Time) -> DgResult<T>>;

struct Cache<T> {
    value: Option<T>,
    time: Time,
    constant: bool,
}

pub(crate) struct SignalInner<T> {
    name: String,
    cache: RefCell<Cache<T>>,
    function: RefCell<Option<ComputeFn<T>>>,
    /// Bumped whenever the mode changes, so a function taken out for a
    /// computation is not put back over a newer mode.
    epoch: Cell<u64>,
    evaluating: Cell<bool>,
    dependencies: RefCell<Vec<String>>,
}

/// Handle to a signal. Clones share the same node.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Signal<T> {
    /// Create an unbound signal.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                name: name.into(),
                cache: RefCell::new(Cache {
                    value: None,
                    time: NEVER,
                    constant: false,
                }),
                function: RefCell::new(None),
                epoch: Cell::new(0),
                evaluating: Cell::new(false),
                dependencies: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Create a signal in constant mode.
    pub fn constant(name: impl Into<String>, value: T) -> Self {
        let signal = Self::new(name);
        signal.set_constant(value);
        signal
    }

    /// Create a signal computed by `function`.
    pub fn computed<F>(name: impl Into<String>, function: F) -> Self
    where
        F: FnMut(Time) -> DgResult<T> + 'static,
    {
        let signal = Self::new(name);
        signal.set_function(function);
        signal
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Value at `time`.
    ///
    /// Fails with `StaleInput` if the compute function fails (typically
    /// because an upstream signal could not be produced), `CycleDetected` if
    /// the signal is already being computed further up the call tree, and
    /// `UnboundSignal` if there is nothing to return.
    pub fn get(&self, time: Time) -> DgResult<T> {
        self.inner.get(time)
    }

    /// Switch to constant mode. The compute function is dropped.
    pub fn set_constant(&self, value: T) {
        let mut cache = self.inner.cache.borrow_mut();
        cache.value = Some(value);
        cache.constant = true;
        self.inner.function.replace(None);
        self.inner.bump_epoch();
    }

    /// Install the compute function and leave constant mode.
    ///
    /// The cache is invalidated so that the next `get` runs the new function.
    pub fn set_function<F>(&self, function: F)
    where
        F: FnMut(Time) -> DgResult<T> + 'static,
    {
        let mut cache = self.inner.cache.borrow_mut();
        cache.constant = false;
        cache.time = NEVER;
        cache.value = None;
        self.inner.function.replace(Some(Box::new(function)));
        self.inner.bump_epoch();
    }

    /// Stamp the cache with `time` without computing.
    pub fn set_time(&self, time: Time) {
        self.inner.cache.borrow_mut().time = time;
    }

    pub fn time(&self) -> Time {
        self.inner.cache.borrow().time
    }

    pub fn is_constant(&self) -> bool {
        self.inner.cache.borrow().constant
    }

    pub fn has_function(&self) -> bool {
        self.inner.function.borrow().is_some() || self.inner.evaluating.get()
    }

    /// Last value held by the signal, without computing.
    pub fn last_value(&self) -> Option<T> {
        self.inner.cache.borrow().value.clone()
    }

    /// Declare that the compute function reads `signal`.
    ///
    /// Only recorded for introspection; nothing is computed.
    pub fn add_dependency(&self, signal: &dyn SignalBase) {
        let mut deps = self.inner.dependencies.borrow_mut();
        let name = signal.name().to_string();
        if !deps.contains(&name) {
            deps.push(name);
        }
    }

    pub fn remove_dependency(&self, signal: &dyn SignalBase) {
        self.inner
            .dependencies
            .borrow_mut()
            .retain(|n| n != signal.name());
    }

    pub fn clear_dependencies(&self) {
        self.inner.dependencies.borrow_mut().clear();
    }

    pub(crate) fn downgrade(&self) -> Weak<dyn Produce<T>> {
        let weak: Weak<SignalInner<T>> = Rc::downgrade(&self.inner);
        weak
    }
}

impl<T: Clone + 'static> SignalInner<T> {
    fn bump_epoch(&self) {
        self.epoch.set(self.epoch.get().wrapping_add(1));
    }

    fn get(&self, time: Time) -> DgResult<T> {
        if self.evaluating.get() {
            return Err(DgError::CycleDetected {
                signal: self.name.clone(),
            });
        }

        {
            let cache = self.cache.borrow();
            if cache.constant || cache.time == time {
                if let Some(value) = &cache.value {
                    return Ok(value.clone());
                }
            }
        }

        let Some(mut function) = self.function.borrow_mut().take() else {
            return self
                .cache
                .borrow()
                .value
                .clone()
                .ok_or_else(|| DgError::UnboundSignal {
                    signal: self.name.clone(),
                });
        };

        trace!(signal = %self.name, time, "recomputing");
        let epoch = self.epoch.get();
        self.evaluating.set(true);
        let result = function(time);
        self.evaluating.set(false);

        if self.epoch.get() == epoch {
            self.function.replace(Some(function));
        }

        match result {
            Ok(value) => {
                let mut cache = self.cache.borrow_mut();
                if self.epoch.get() == epoch {
                    cache.value = Some(value.clone());
                    cache.time = time;
                }
                Ok(value)
            }
            Err(source) => Err(DgError::StaleInput {
                signal: self.name.clone(),
                source: Box::new(source),
            }),
        }
    }
}

impl<T: Clone + 'static> Produce<T> for SignalInner<T> {
    fn produce(&self, time: Time) -> DgResult<T> {
        self.get(time)
    }

    fn produce_time(&self) -> Time {
        self.cache.borrow().time
    }
}

impl<T: Clone + 'static> SignalBase for Signal<T> {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn payload_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn payload_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn time(&self) -> Time {
        Signal::time(self)
    }

    fn recompute(&self, time: Time) -> DgResult<()> {
        self.get(time).map(|_| ())
    }

    fn value(&self, time: Time) -> DgResult<Value> {
        let value = self.get(time)?;
        Value::from_any(&value).ok_or(DgError::Unconvertible {
            type_name: type_name::<T>(),
        })
    }

    fn write_value(
        &self,
        time: Time,
        registry: &ValueRegistry,
        out: &mut dyn io::Write,
    ) -> DgResult<()> {
        let value = self.get(time)?;
        registry.write(out, TypeKey::of::<T>(), &value)
    }

    fn read_constant(&self, registry: &ValueRegistry, input: &mut dyn io::Read) -> DgResult<()> {
        let value = registry.read_as::<T>(input)?;
        self.set_constant(value);
        Ok(())
    }

    fn dependencies(&self) -> Vec<String> {
        self.inner.dependencies.borrow().clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn SignalBase> {
        Box::new(self.clone())
    }
}
