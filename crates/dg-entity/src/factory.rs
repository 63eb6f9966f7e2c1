//! Entity factory: create entities by class name.
//!
//! Each entity module registers its classes once during initialization;
//! afterwards entities are created by name without compile-time knowledge of
//! their concrete type. There is no unregistration.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::debug;

use dg_core::{DgError, DgResult};

use crate::entity::{Entity, EntityClass};

/// Builds an entity of one class from an instance name.
pub type EntityConstructor = Arc<dyn Fn(&str) -> DgResult<Box<dyn Entity>> + Send + Sync>;

pub struct Factory {
    classes: RwLock<BTreeMap<String, EntityConstructor>>,
}

impl Factory {
    pub fn new() -> Self {
        Self {
            classes: RwLock::new(BTreeMap::new()),
        }
    }

    /// The process-wide factory.
    ///
    /// Populate it during single-threaded initialization, before entities are created.
    pub fn global() -> &'static Factory {
        static GLOBAL: OnceLock<Factory> = OnceLock::new();
        GLOBAL.get_or_init(Factory::new)
    }

    /// Register a constructor under `class_name`.
    ///
    /// Fails with `DuplicateName` if the class is already known; the first
    /// registration stays in place.
    pub fn register_entity_type<F>(&self, class_name: &str, constructor: F) -> DgResult<()>
    where
        F: Fn(&str) -> DgResult<Box<dyn Entity>> + Send + Sync + 'static,
    {
        let mut classes = self.classes.write().unwrap_or_else(PoisonError::into_inner);
        if classes.contains_key(class_name) {
            return Err(DgError::DuplicateName {
                what: "entity class",
                name: class_name.to_string(),
            });
        }
        classes.insert(class_name.to_string(), Arc::new(constructor));
        debug!(class = class_name, "registered entity class");
        Ok(())
    }

    /// Register `E` under [`EntityClass::CLASS_NAME`].
    pub fn register<E: EntityClass>(&self) -> DgResult<()> {
        self.register_entity_type(E::CLASS_NAME, |name| {
            E::create(name).map(|e| Box::new(e) as Box<dyn Entity>)
        })
    }

    /// Create an instance of `class_name` named `instance`.
    pub fn create(&self, class_name: &str, instance: &str) -> DgResult<Box<dyn Entity>> {
        let constructor = self
            .classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(class_name)
            .cloned()
            .ok_or_else(|| DgError::UnknownClass {
                class: class_name.to_string(),
            })?;

        let entity = constructor(instance)?;
        if entity.class_name() != class_name {
            return Err(DgError::InvalidArg {
                what: format!(
                    "constructor registered for '{class_name}' built a '{}'",
                    entity.class_name()
                ),
            });
        }
        debug!(class = class_name, instance, "created entity");
        Ok(entity)
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(class_name)
    }

    /// Registered class names, sorted.
    pub fn class_names(&self) -> Vec<String> {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl Default for Factory {
    fn default() -> Self {
        Self::new()
    }
}
