//! Cast registry: stream read/write behavior per payload type.
//!
//! Signals can carry payload types the runtime has never heard of. A module
//! introducing such a type registers a cast for it, after which signals of
//! that type can be written to and read from text streams generically.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt::Display;
use std::io;
use std::str::FromStr;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use nalgebra::{DMatrix, DVector, Matrix4};
use tracing::debug;

use dg_core::{DgError, DgResult, Value, ValueType};

/// Runtime identifier of a payload type.
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    pub id: TypeId,
    pub name: &'static str,
}

impl TypeKey {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }
}

type WriteFn = Box<dyn Fn(&dyn Any, &mut dyn io::Write) -> DgResult<()> + Send + Sync>;
type ReadFn = Box<dyn Fn(&mut dyn io::Read) -> DgResult<Box<dyn Any>> + Send + Sync>;

struct Cast {
    type_name: &'static str,
    write: WriteFn,
    read: ReadFn,
}

/// Mapping from payload type to its (write, read) pair.
pub struct ValueRegistry {
    casts: RwLock<HashMap<TypeId, Arc<Cast>>>,
}

impl ValueRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            casts: RwLock::new(HashMap::new()),
        }
    }

    /// A registry holding casts for every kind of the closed [`Value`] set
    /// that has a text form.
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register_builtin();
        registry
    }

    /// The process-wide registry, created with the built-in casts on first use.
    pub fn global() -> &'static ValueRegistry {
        static GLOBAL: OnceLock<ValueRegistry> = OnceLock::new();
        GLOBAL.get_or_init(ValueRegistry::with_builtin)
    }

    fn register_builtin(&self) {
        fn add<T: ValueType + Send + Sync>(registry: &ValueRegistry) {
            // Fresh registry: the only failure is a duplicate, which cannot happen here.
            let _ = registry.register_value_type::<T>();
        }
        add::<bool>(self);
        add::<u32>(self);
        add::<u64>(self);
        add::<i32>(self);
        add::<i64>(self);
        add::<f32>(self);
        add::<f64>(self);
        add::<String>(self);
        add::<DVector<f64>>(self);
        add::<DMatrix<f64>>(self);
        add::<Matrix4<f64>>(self);
    }

    /// Associate write/read behavior with `T`.
    ///
    /// Fails with `DuplicateName` if `T` already has a cast; the existing one is kept.
    pub fn register_cast<T, W, R>(&self, write: W, read: R) -> DgResult<()>
    where
        T: 'static,
        W: Fn(&T, &mut dyn io::Write) -> DgResult<()> + Send + Sync + 'static,
        R: Fn(&mut dyn io::Read) -> DgResult<T> + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        let cast = Cast {
            type_name: key.name,
            write: Box::new(move |value, out| {
                let value = value
                    .downcast_ref::<T>()
                    .ok_or(DgError::UnregisteredType {
                        type_name: key.name,
                    })?;
                write(value, out)
            }),
            read: Box::new(move |input| Ok(Box::new(read(input)?) as Box<dyn Any>)),
        };

        let mut casts = self.casts.write().unwrap_or_else(PoisonError::into_inner);
        if casts.contains_key(&key.id) {
            return Err(DgError::DuplicateName {
                what: "cast",
                name: key.name.to_string(),
            });
        }
        casts.insert(key.id, Arc::new(cast));
        debug!(payload = key.name, "registered cast");
        Ok(())
    }

    /// Register a cast based on `Display` and `FromStr`.
    pub fn register_default<T>(&self) -> DgResult<()>
    where
        T: Display + FromStr + 'static,
    {
        self.register_cast::<T, _, _>(
            |value, out| Ok(write!(out, "{value}")?),
            |input| {
                let text = read_all(input)?;
                text.trim().parse::<T>().map_err(|_| {
                    DgError::parse(type_name::<T>(), format!("cannot parse '{}'", text.trim()))
                })
            },
        )
    }

    /// Register a cast using the text form of the corresponding [`Value`] kind.
    pub fn register_value_type<T>(&self) -> DgResult<()>
    where
        T: ValueType + Send + Sync,
    {
        self.register_cast::<T, _, _>(
            |value, out| Ok(write!(out, "{}", value.clone().into_value())?),
            |input| {
                let value = Value::parse(T::KIND, &read_all(input)?)?;
                T::from_value(&value).ok_or(DgError::UnregisteredType {
                    type_name: type_name::<T>(),
                })
            },
        )
    }

    pub fn contains(&self, key: TypeKey) -> bool {
        self.casts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&key.id)
    }

    /// Names of all registered payload types, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        let casts = self.casts.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<_> = casts.values().map(|c| c.type_name).collect();
        names.sort_unstable();
        names
    }

    fn cast(&self, key: TypeKey) -> DgResult<Arc<Cast>> {
        self.casts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key.id)
            .cloned()
            .ok_or(DgError::UnregisteredType {
                type_name: key.name,
            })
    }

    /// Write `value`, whose type is `key`, to `out`.
    pub fn write(&self, out: &mut dyn io::Write, key: TypeKey, value: &dyn Any) -> DgResult<()> {
        (self.cast(key)?.write)(value, out)
    }

    /// Read a value of type `key` from `input`.
    pub fn read(&self, input: &mut dyn io::Read, key: TypeKey) -> DgResult<Box<dyn Any>> {
        (self.cast(key)?.read)(input)
    }

    pub fn write_as<T: 'static>(&self, out: &mut dyn io::Write, value: &T) -> DgResult<()> {
        self.write(out, TypeKey::of::<T>(), value)
    }

    pub fn read_as<T: 'static>(&self, input: &mut dyn io::Read) -> DgResult<T> {
        let key = TypeKey::of::<T>();
        let boxed = self.read(input, key)?;
        boxed
            .downcast::<T>()
            .map(|b| *b)
            .map_err(|_| DgError::UnregisteredType {
                type_name: key.name,
            })
    }

    /// Text form of `value` through its registered cast.
    pub fn to_text<T: 'static>(&self, value: &T) -> DgResult<String> {
        let mut buf = Vec::new();
        self.write_as(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| DgError::parse(type_name::<T>(), e.to_string()))
    }
}

impl Default for ValueRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn read_all(input: &mut dyn io::Read) -> DgResult<String> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    Ok(text)
}
