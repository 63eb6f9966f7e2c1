//! Rebindable dependency edges.
//!
//! A [`SignalLink`] is the input side of an entity: it forwards `get` to
//! whichever producer is currently plugged in. The link holds only a weak
//! reference; it never keeps the producer alive.

use std::any::{Any, TypeId, type_name};
use std::cell::{Cell, RefCell};
use std::io;
use std::rc::{Rc, Weak};

use tracing::debug;

use dg_core::{DgError, DgResult, NEVER, Time, Value};

use crate::base::{Produce, SignalBase};
use crate::registry::ValueRegistry;
use crate::signal::Signal;

struct Plugged<T> {
    producer: Weak<dyn Produce<T>>,
    name: String,
}

pub(crate) struct LinkInner<T> {
    name: String,
    plugged: RefCell<Option<Plugged<T>>>,
    /// Returned while nothing is plugged.
    constant: RefCell<Option<T>>,
    forwarding: Cell<bool>,
}

/// Handle to a link. Clones share the same binding.
pub struct SignalLink<T> {
    inner: Rc<LinkInner<T>>,
}

impl<T> Clone for SignalLink<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> SignalLink<T> {
    /// Create an unplugged link.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(LinkInner {
                name: name.into(),
                plugged: RefCell::new(None),
                constant: RefCell::new(None),
                forwarding: Cell::new(false),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Plug `producer` in. Replaces any previous producer or constant.
    pub fn bind(&self, producer: &Signal<T>) {
        self.attach(producer.downgrade(), producer.name());
    }

    /// Forward to another link, which forwards to its own producer.
    pub fn bind_link(&self, producer: &SignalLink<T>) -> DgResult<()> {
        if Rc::ptr_eq(&self.inner, &producer.inner) {
            return Err(DgError::CycleDetected {
                signal: self.name().to_string(),
            });
        }
        self.attach(producer.downgrade(), producer.name());
        Ok(())
    }

    fn attach(&self, producer: Weak<dyn Produce<T>>, producer_name: &str) {
        debug!(link = %self.inner.name, producer = producer_name, "plugging");
        self.inner.constant.replace(None);
        self.inner.plugged.replace(Some(Plugged {
            producer,
            name: producer_name.to_string(),
        }));
    }

    /// Detach the producer. The link becomes unbound.
    pub fn unbind(&self) {
        self.inner.plugged.replace(None);
    }

    /// Unplug and return `value` until something is plugged again.
    pub fn set_constant(&self, value: T) {
        self.inner.plugged.replace(None);
        self.inner.constant.replace(Some(value));
    }

    pub fn is_bound(&self) -> bool {
        self.inner.plugged.borrow().is_some()
    }

    /// Name of the plugged producer, if any.
    pub fn producer_name(&self) -> Option<String> {
        self.inner.plugged.borrow().as_ref().map(|p| p.name.clone())
    }

    /// Value of the plugged producer at `time`, or the link's constant.
    ///
    /// Producer failures are returned unchanged.
    pub fn get(&self, time: Time) -> DgResult<T> {
        self.inner.get(time)
    }

    pub(crate) fn downgrade(&self) -> Weak<dyn Produce<T>> {
        let weak: Weak<LinkInner<T>> = Rc::downgrade(&self.inner);
        weak
    }
}

impl<T: Clone + 'static> LinkInner<T> {
    fn unbound(&self) -> DgError {
        DgError::UnboundLink {
            signal: self.name.clone(),
        }
    }

    fn producer(&self) -> Option<Weak<dyn Produce<T>>> {
        self.plugged.borrow().as_ref().map(|p| p.producer.clone())
    }

    fn get(&self, time: Time) -> DgResult<T> {
        if self.forwarding.get() {
            return Err(DgError::CycleDetected {
                signal: self.name.clone(),
            });
        }

        let Some(weak) = self.producer() else {
            return self.constant.borrow().clone().ok_or_else(|| self.unbound());
        };
        // The producer was dropped together with its entity.
        let producer = weak.upgrade().ok_or_else(|| self.unbound())?;

        self.forwarding.set(true);
        let result = producer.produce(time);
        self.forwarding.set(false);
        result
    }
}

impl<T: Clone + 'static> Produce<T> for LinkInner<T> {
    fn produce(&self, time: Time) -> DgResult<T> {
        self.get(time)
    }

    fn produce_time(&self) -> Time {
        self.producer()
            .and_then(|weak| weak.upgrade())
            .map_or(NEVER, |p| p.produce_time())
    }
}

impl<T: Clone + 'static> SignalBase for SignalLink<T> {
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
        self.inner.produce_time()
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
        registry.write_as(out, &value)
    }

    fn read_constant(&self, registry: &ValueRegistry, input: &mut dyn io::Read) -> DgResult<()> {
        let value = registry.read_as::<T>(input)?;
        self.set_constant(value);
        Ok(())
    }

    fn is_plugged(&self) -> bool {
        self.is_bound()
    }

    fn plugged_to(&self) -> Option<String> {
        self.producer_name()
    }

    fn plug(&self, producer: &dyn SignalBase) -> DgResult<()> {
        let any = producer.as_any();
        if let Some(signal) = any.downcast_ref::<Signal<T>>() {
            self.bind(signal);
            Ok(())
        } else if let Some(link) = any.downcast_ref::<SignalLink<T>>() {
            self.bind_link(link)
        } else {
            Err(DgError::IncompatibleSignal {
                consumer: self.name().to_string(),
                producer: producer.name().to_string(),
                expected: type_name::<T>(),
                found: producer.payload_type_name(),
            })
        }
    }

    fn unplug(&self) -> DgResult<()> {
        self.unbind();
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn SignalBase> {
        Box::new(self.clone())
    }
}
