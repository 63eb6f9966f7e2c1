//! dg-sim: run dynamic graphs described in YAML.
//!
//! Provides:
//! - the graph file schema (entities, plugs, setup and step actions, recorded signals)
//! - conversion of YAML arguments to command values by declared kind
//! - building a [`dg_entity::Pool`] from a graph
//! - a fixed-step runner recording signals at each logical time

pub mod convert;
pub mod error;
pub mod graph;
pub mod schema;
pub mod sim;

pub use error::{SimError, SimResult};
pub use graph::{apply, build, from_yaml_str, load_yaml, save_yaml, validate};
pub use schema::*;
pub use sim::{SimOptions, SimRecord, run_sim, run_steps};
