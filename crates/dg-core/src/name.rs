//! Fully-qualified signal names.
//!
//! By convention a signal is named `Class(instance)::direction(type)::name`,
//! e.g. `InvertedPendulum(pendulum)::input(vector)::forcein`. Entities key their
//! signals by the last segment.

use core::fmt;

use crate::error::{DgError, DgResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
    Inner,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
            Direction::Inner => "inner",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignalName {
    pub class: String,
    pub instance: String,
    pub direction: Direction,
    pub type_tag: String,
    pub name: String,
}

impl SignalName {
    pub fn new(
        class: &str,
        instance: &str,
        direction: Direction,
        type_tag: &str,
        name: &str,
    ) -> Self {
        Self {
            class: class.to_string(),
            instance: instance.to_string(),
            direction,
            type_tag: type_tag.to_string(),
            name: name.to_string(),
        }
    }

    pub fn input(class: &str, instance: &str, type_tag: &str, name: &str) -> Self {
        Self::new(class, instance, Direction::Input, type_tag, name)
    }

    pub fn output(class: &str, instance: &str, type_tag: &str, name: &str) -> Self {
        Self::new(class, instance, Direction::Output, type_tag, name)
    }

    pub fn parse(full: &str) -> DgResult<Self> {
        let parts: Vec<&str> = full.split("::").collect();
        let [owner, kind, name] = parts[..] else {
            return Err(DgError::parse(
                "signal name",
                format!("'{full}' does not have three '::' separated parts"),
            ));
        };
        let (class, instance) = split_call(owner, full)?;
        let (direction, type_tag) = split_call(kind, full)?;
        let direction = match direction {
            "input" => Direction::Input,
            "output" => Direction::Output,
            "inner" => Direction::Inner,
            other => {
                return Err(DgError::parse(
                    "signal name",
                    format!("unknown direction '{other}' in '{full}'"),
                ));
            }
        };
        Ok(Self::new(class, instance, direction, type_tag, name))
    }

    /// Last segment of a signal name; the whole string if it has no `::`.
    pub fn short_name(full: &str) -> &str {
        full.rsplit("::").next().unwrap_or(full)
    }
}

/// Split `head(arg)` into `head` and `arg`.
fn split_call<'a>(part: &'a str, full: &str) -> DgResult<(&'a str, &'a str)> {
    part.strip_suffix(')')
        .and_then(|s| s.split_once('('))
        .ok_or_else(|| DgError::parse("signal name", format!("malformed segment '{part}' in '{full}'")))
}

impl fmt::Display for SignalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({})::{}({})::{}",
            self.class,
            self.instance,
            self.direction.as_str(),
            self.type_tag,
            self.name
        )
    }
}
