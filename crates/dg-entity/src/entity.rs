//! Entities: named units of computation owning signals and commands.
//!
//! An entity type embeds an [`EntityCore`] and implements [`Entity`] by
//! handing it out. During construction it registers every signal and command
//! it exposes; callers then reach them by name only.

use std::any::Any;
use std::fmt::Write as _;

use indexmap::IndexMap;

use dg_core::{DgError, DgResult, Direction, SignalName, Value};
use dg_signal::SignalBase;

use crate::command::{Command, CommandEntry};

/// Name, signals and commands shared by every entity.
pub struct EntityCore {
    name: String,
    class_name: &'static str,
    docstring: String,
    signals: IndexMap<String, Box<dyn SignalBase>>,
    commands: IndexMap<String, CommandEntry>,
}

impl EntityCore {
    pub fn new(class_name: &'static str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            class_name,
            docstring: String::new(),
            signals: IndexMap::new(),
            commands: IndexMap::new(),
        }
    }

    pub fn with_docstring(mut self, docstring: &str) -> Self {
        self.docstring = docstring.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_name(&self) -> &'static str {
        self.class_name
    }

    pub fn docstring(&self) -> &str {
        &self.docstring
    }

    /// Fully-qualified name for a signal of this entity.
    pub fn signal_name(&self, direction: Direction, type_tag: &str, name: &str) -> String {
        SignalName::new(self.class_name, &self.name, direction, type_tag, name).to_string()
    }

    /// Register a signal under its short name.
    ///
    /// The entity keeps its own handle; the caller's handle stays usable.
    pub fn register_signal(&mut self, signal: &dyn SignalBase) -> DgResult<()> {
        let key = signal.short_name().to_string();
        if self.signals.contains_key(&key) {
            return Err(DgError::DuplicateName { what: "signal", name: key });
        }
        self.signals.insert(key, signal.clone_box());
        Ok(())
    }

    /// Remove a signal from the namespace, returning the entity's handle.
    pub fn deregister_signal(&mut self, name: &str) -> DgResult<Box<dyn SignalBase>> {
        self.signals
            .shift_remove(name)
            .ok_or_else(|| self.not_found("signal", name))
    }

    pub fn register_command(&mut self, name: &str, command: impl Command + 'static) -> DgResult<()> {
        self.register_boxed_command(name, Box::new(command))
    }

    /// Fails with `DuplicateName` if `name` is taken; the existing command is kept.
    pub fn register_boxed_command(&mut self, name: &str, command: Box<dyn Command>) -> DgResult<()> {
        if self.commands.contains_key(name) {
            return Err(DgError::DuplicateName {
                what: "command",
                name: name.to_string(),
            });
        }
        self.commands
            .insert(name.to_string(), CommandEntry::new(name, command));
        Ok(())
    }

    pub fn signal(&self, name: &str) -> DgResult<&dyn SignalBase> {
        self.signals
            .get(name)
            .map(|s| s.as_ref())
            .ok_or_else(|| self.not_found("signal", name))
    }

    pub fn command(&self, name: &str) -> DgResult<&CommandEntry> {
        self.commands
            .get(name)
            .ok_or_else(|| self.not_found("command", name))
    }

    pub fn has_signal(&self, name: &str) -> bool {
        self.signals.contains_key(name)
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Signals in registration order.
    pub fn signals(&self) -> impl Iterator<Item = &dyn SignalBase> {
        self.signals.values().map(|s| &**s as &dyn SignalBase)
    }

    /// Commands in registration order.
    pub fn commands(&self) -> impl Iterator<Item = &CommandEntry> {
        self.commands.values()
    }

    fn not_found(&self, what: &'static str, name: &str) -> DgError {
        DgError::NotFound {
            what,
            name: format!("{}.{}", self.name, name),
        }
    }
}

/// A node of the graph, creatable by class name through a [`crate::Factory`].
pub trait Entity: Any {
    fn core(&self) -> &EntityCore;

    fn core_mut(&mut self) -> &mut EntityCore;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Instance name, unique within a pool.
    fn name(&self) -> &str {
        self.core().name()
    }

    /// Class name used for factory lookup; identical for all instances of a type.
    fn class_name(&self) -> &'static str {
        self.core().class_name()
    }

    fn docstring(&self) -> &str {
        self.core().docstring()
    }

    fn register_signal(&mut self, signal: &dyn SignalBase) -> DgResult<()> {
        self.core_mut().register_signal(signal)
    }

    fn register_command(&mut self, name: &str, command: Box<dyn Command>) -> DgResult<()> {
        self.core_mut().register_boxed_command(name, command)
    }

    fn signal(&self, name: &str) -> DgResult<&dyn SignalBase> {
        self.core().signal(name)
    }

    fn command(&self, name: &str) -> DgResult<&CommandEntry> {
        self.core().command(name)
    }

    /// Look up a command and execute it with `args`.
    fn execute(&self, command: &str, args: &[Value]) -> DgResult<Option<Value>> {
        self.command(command)?.execute(args)
    }

    fn signal_names(&self) -> Vec<String> {
        self.core().signals().map(|s| s.short_name().to_string()).collect()
    }

    fn command_names(&self) -> Vec<String> {
        self.core().commands().map(|c| c.name().to_string()).collect()
    }

    /// Multi-line description: identity, signals, commands.
    fn display(&self) -> String {
        let core = self.core();
        let mut out = format!("{} ({})\n", core.name(), core.class_name());
        if !core.docstring().is_empty() {
            let _ = writeln!(out, "  {}", core.docstring());
        }
        for signal in core.signals() {
            let _ = writeln!(out, "  signal  {}", signal.describe());
        }
        for command in core.commands() {
            let _ = write!(out, "  command {}", command.prototype());
            if !command.docstring().is_empty() {
                let _ = write!(out, " - {}", command.docstring());
            }
            out.push('\n');
        }
        out
    }
}

/// An entity type with a fixed class name and a by-name constructor.
pub trait EntityClass: Entity + Sized {
    const CLASS_NAME: &'static str;

    fn create(name: &str) -> DgResult<Self>;
}
