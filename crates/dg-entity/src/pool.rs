//! The pool owns the entities of one graph.
//!
//! Instance names are unique within a pool. Signals are addressed by
//! `entity.signal` paths, which is how drivers plug entities together.

use indexmap::IndexMap;
use tracing::debug;

use dg_core::{DgError, DgResult, Value};
use dg_signal::SignalBase;

use crate::entity::Entity;
use crate::factory::Factory;

#[derive(Default)]
pub struct Pool {
    entities: IndexMap<String, Box<dyn Entity>>,
}

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entity through `factory` and take ownership of it.
    pub fn create(
        &mut self,
        factory: &Factory,
        class_name: &str,
        instance: &str,
    ) -> DgResult<&dyn Entity> {
        if self.entities.contains_key(instance) {
            return Err(duplicate(instance));
        }
        let entity = factory.create(class_name, instance)?;
        self.insert(entity)?;
        self.get(instance)
    }

    /// Take ownership of an already built entity.
    pub fn insert(&mut self, entity: Box<dyn Entity>) -> DgResult<()> {
        let name = entity.name().to_string();
        if self.entities.contains_key(&name) {
            return Err(duplicate(&name));
        }
        debug!(entity = %name, class = entity.class_name(), "added to pool");
        self.entities.insert(name, entity);
        Ok(())
    }

    pub fn get(&self, name: &str) -> DgResult<&dyn Entity> {
        self.entities
            .get(name)
            .map(|e| e.as_ref())
            .ok_or_else(|| not_found(name))
    }

    pub fn get_mut(&mut self, name: &str) -> DgResult<&mut dyn Entity> {
        let entity = self.entities.get_mut(name).ok_or_else(|| not_found(name))?;
        let entity: &mut dyn Entity = &mut **entity;
        Ok(entity)
    }

    /// Concrete view of an entity, for the native API.
    pub fn downcast<E: Entity>(&self, name: &str) -> DgResult<&E> {
        let entity = self.get(name)?;
        entity
            .as_any()
            .downcast_ref::<E>()
            .ok_or_else(|| DgError::InvalidArg {
                what: format!("entity '{name}' is a {}", entity.class_name()),
            })
    }

    /// Destroy an entity. Links plugged into its signals become unbound.
    pub fn remove(&mut self, name: &str) -> DgResult<Box<dyn Entity>> {
        let entity = self
            .entities
            .shift_remove(name)
            .ok_or_else(|| not_found(name))?;
        debug!(entity = name, "removed from pool");
        Ok(entity)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Instance names in creation order.
    pub fn names(&self) -> Vec<String> {
        self.entities.keys().cloned().collect()
    }

    pub fn entities(&self) -> impl Iterator<Item = &dyn Entity> {
        self.entities.values().map(|e| &**e as &dyn Entity)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Resolve an `entity.signal` path.
    pub fn signal(&self, path: &str) -> DgResult<&dyn SignalBase> {
        let (entity, signal) = split_path(path)?;
        self.get(entity)?.signal(signal)
    }

    /// Plug the producer at `from` into the link at `to`.
    pub fn plug(&self, from: &str, to: &str) -> DgResult<()> {
        let producer = self.signal(from)?;
        let consumer = self.signal(to)?;
        consumer.plug(producer)
    }

    pub fn execute(&self, entity: &str, command: &str, args: &[Value]) -> DgResult<Option<Value>> {
        self.get(entity)?.execute(command, args)
    }

    /// Destroy every entity.
    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

pub fn split_path(path: &str) -> DgResult<(&str, &str)> {
    path.rsplit_once('.')
        .filter(|(entity, signal)| !entity.is_empty() && !signal.is_empty())
        .ok_or_else(|| {
            DgError::parse("signal path", format!("'{path}' is not of the form entity.signal"))
        })
}

fn duplicate(name: &str) -> DgError {
    DgError::DuplicateName {
        what: "entity",
        name: name.to_string(),
    }
}

fn not_found(name: &str) -> DgError {
    DgError::NotFound {
        what: "entity",
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_split_on_last_dot() {
        assert_eq!(split_path("pendulum.state").unwrap(), ("pendulum", "state"));
        assert_eq!(split_path("a.b.c").unwrap(), ("a.b", "c"));
        assert!(split_path("state").is_err());
        assert!(split_path(".state").is_err());
        assert!(split_path("pendulum.").is_err());
    }

    #[test]
    fn empty_pool_lookups() {
        let mut pool = Pool::new();
        assert!(pool.is_empty());
        assert!(matches!(
            pool.get("x"),
            Err(DgError::NotFound { what: "entity", .. })
        ));
        assert!(pool.remove("x").is_err());
        assert!(pool.signal("x.y").is_err());
    }
}
