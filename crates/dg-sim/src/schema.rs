//! Graph file schema definitions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphDef {
    pub name: String,
    #[serde(default)]
    pub entities: Vec<EntityDef>,
    #[serde(default)]
    pub plugs: Vec<PlugDef>,
    /// Actions applied once, after plugging.
    #[serde(default)]
    pub setup: Vec<ActionDef>,
    /// Actions applied at every step, in order.
    #[serde(default)]
    pub step: Vec<ActionDef>,
    /// `entity.signal` paths sampled while running.
    #[serde(default)]
    pub record: Vec<String>,
    #[serde(default)]
    pub run: RunDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityDef {
    pub class: String,
    pub name: String,
}

/// Plug the producer at `from` into the input at `to`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlugDef {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ActionDef {
    /// Execute a command; arguments are converted to the kinds it declares.
    Command {
        entity: String,
        command: String,
        #[serde(default)]
        args: Vec<ArgDef>,
    },
    /// Set a signal constant from its text form, e.g. `[4](0,0.1,0,0)`.
    SetSignal {
        entity: String,
        signal: String,
        value: String,
    },
}

/// A command argument as written in YAML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ArgDef {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<ArgDef>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunDef {
    #[serde(default = "default_steps")]
    pub steps: usize,
    #[serde(default = "default_record_every")]
    pub record_every: usize,
}

impl Default for RunDef {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            record_every: default_record_every(),
        }
    }
}

fn default_steps() -> usize {
    100
}

fn default_record_every() -> usize {
    1
}
