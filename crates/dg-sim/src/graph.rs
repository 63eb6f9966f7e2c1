//! Loading, validating and building graphs.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use dg_core::Value;
use dg_entity::{Factory, Pool, split_path};
use dg_signal::ValueRegistry;

use crate::convert;
use crate::error::{SimError, SimResult};
use crate::schema::{ActionDef, GraphDef};

pub fn load_yaml(path: &Path) -> SimResult<GraphDef> {
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

pub fn from_yaml_str(content: &str) -> SimResult<GraphDef> {
    Ok(serde_yaml::from_str(content)?)
}

pub fn save_yaml(path: &Path, graph: &GraphDef) -> SimResult<()> {
    let content = serde_yaml::to_string(graph)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Check a graph against `factory` without creating anything.
///
/// Entity names must be unique and classes registered; every path and action
/// must refer to a declared entity.
pub fn validate(graph: &GraphDef, factory: &Factory) -> SimResult<()> {
    let mut names = HashSet::new();
    for entity in &graph.entities {
        if !names.insert(entity.name.as_str()) {
            return Err(SimError::Validation {
                what: format!("duplicate entity name '{}'", entity.name),
            });
        }
        if !factory.contains(&entity.class) {
            return Err(SimError::Validation {
                what: format!("entity '{}' has unknown class '{}'", entity.name, entity.class),
            });
        }
    }

    let declared = |entity: &str, context: &str| {
        if names.contains(entity) {
            Ok(())
        } else {
            Err(SimError::Validation {
                what: format!("{context} refers to undeclared entity '{entity}'"),
            })
        }
    };

    for plug in &graph.plugs {
        declared(split_path(&plug.from)?.0, "plug")?;
        declared(split_path(&plug.to)?.0, "plug")?;
    }
    for path in &graph.record {
        declared(split_path(path)?.0, "record")?;
    }
    for action in graph.setup.iter().chain(&graph.step) {
        match action {
            ActionDef::Command { entity, .. } | ActionDef::SetSignal { entity, .. } => {
                declared(entity.as_str(), "action")?
            }
        }
    }
    Ok(())
}

/// Create the entities of `graph` in a new pool, plug them and run the setup.
pub fn build(graph: &GraphDef, factory: &Factory, registry: &ValueRegistry) -> SimResult<Pool> {
    validate(graph, factory)?;

    let mut pool = Pool::new();
    for entity in &graph.entities {
        pool.create(factory, &entity.class, &entity.name)?;
    }
    for plug in &graph.plugs {
        pool.plug(&plug.from, &plug.to)?;
    }
    for action in &graph.setup {
        apply(&pool, registry, action)?;
    }
    debug!(graph = %graph.name, entities = pool.len(), "graph built");
    Ok(pool)
}

/// Apply one action to the entities of `pool`.
pub fn apply(pool: &Pool, registry: &ValueRegistry, action: &ActionDef) -> SimResult<Option<Value>> {
    match action {
        ActionDef::Command {
            entity,
            command,
            args,
        } => {
            let entry = pool.get(entity)?.command(command)?;
            let signature = entry.signature();
            // Surplus or missing arguments are left to the arity check.
            let values = args
                .iter()
                .enumerate()
                .map(|(index, arg)| match signature.get(index) {
                    Some(kind) => convert::to_value(arg, *kind).map_err(|e| SimError::Argument {
                        entity: entity.clone(),
                        command: command.clone(),
                        index,
                        what: e.to_string(),
                    }),
                    None => Ok(convert::infer(arg)),
                })
                .collect::<SimResult<Vec<_>>>()?;
            Ok(entry.execute(&values)?)
        }
        ActionDef::SetSignal {
            entity,
            signal,
            value,
        } => {
            let signal = pool.get(entity)?.signal(signal)?;
            signal.read_constant(registry, &mut value.as_bytes())?;
            Ok(None)
        }
    }
}
