//! dg-entity: entities, commands and the factory.
//!
//! Entities compose only through signals and commands:
//! - an entity exposes [`dg_signal::Signal`]s and [`dg_signal::SignalLink`]s
//!   registered on its [`EntityCore`]
//! - [`Command`]s wrap setters, getters and actions, invoked by name with
//!   [`dg_core::Value`] arguments checked against a declared signature
//! - the [`Factory`] creates entities by class name
//! - the [`Pool`] owns a graph's entities and plugs signals by path

pub mod command;
pub mod entity;
pub mod factory;
pub mod pool;

pub use command::{Command, CommandEntry, FnCommand, Getter, Setter, arg, check_arguments};
pub use entity::{Entity, EntityClass, EntityCore};
pub use factory::{EntityConstructor, Factory};
pub use pool::{Pool, split_path};
