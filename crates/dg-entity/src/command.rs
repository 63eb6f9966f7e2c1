//! Dynamically invoked entity operations.
//!
//! A command declares the kinds of the arguments it expects. Arguments are
//! checked against that signature before the command body runs, so bodies can
//! extract typed arguments without re-checking.

use std::cell::RefCell;
use std::rc::Rc;

use dg_core::{DgError, DgResult, Value, ValueKind, ValueType};

/// Body of a command.
pub trait Command {
    /// Expected argument kinds, in order.
    fn signature(&self) -> &[ValueKind];

    fn docstring(&self) -> &str {
        ""
    }

    /// Run with arguments already checked against [`Command::signature`].
    fn run(&self, args: &[Value]) -> DgResult<Option<Value>>;
}

/// Check argument count and kinds against a signature.
pub fn check_arguments(command: &str, signature: &[ValueKind], args: &[Value]) -> DgResult<()> {
    if args.len() != signature.len() {
        return Err(DgError::ArityMismatch {
            command: command.to_string(),
            expected: signature.len(),
            found: args.len(),
        });
    }
    for (index, (expected, arg)) in signature.iter().zip(args).enumerate() {
        if arg.kind() != *expected {
            return Err(DgError::TypeMismatch {
                command: command.to_string(),
                index,
                expected: *expected,
                found: arg.kind(),
            });
        }
    }
    Ok(())
}

/// Typed argument at `index`.
pub fn arg<T: ValueType>(args: &[Value], index: usize) -> DgResult<T> {
    args.get(index)
        .and_then(T::from_value)
        .ok_or_else(|| DgError::InvalidArg {
            what: format!("argument {index} is not a {}", T::KIND),
        })
}

/// A command registered under a name on an entity.
pub struct CommandEntry {
    name: String,
    command: Box<dyn Command>,
}

impl CommandEntry {
    pub fn new(name: impl Into<String>, command: Box<dyn Command>) -> Self {
        Self {
            name: name.into(),
            command,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &[ValueKind] {
        self.command.signature()
    }

    pub fn docstring(&self) -> &str {
        self.command.docstring()
    }

    /// Validate `args` and run the command.
    ///
    /// Fails with `ArityMismatch` or `TypeMismatch` before any side effect.
    pub fn execute(&self, args: &[Value]) -> DgResult<Option<Value>> {
        check_arguments(&self.name, self.command.signature(), args)?;
        self.command.run(args)
    }

    /// `name(kind, kind)`
    pub fn prototype(&self) -> String {
        let kinds: Vec<_> = self.signature().iter().map(|k| k.type_name()).collect();
        format!("{}({})", self.name, kinds.join(", "))
    }
}

impl std::fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.prototype())
    }
}

/// Sets one property of the entity state.
pub struct Setter<E, T> {
    state: Rc<RefCell<E>>,
    set: Box<dyn Fn(&mut E, T)>,
    signature: [ValueKind; 1],
    doc: String,
}

impl<E, T: ValueType> Setter<E, T> {
    pub fn new(state: &Rc<RefCell<E>>, set: impl Fn(&mut E, T) + 'static, doc: &str) -> Self {
        Self {
            state: Rc::clone(state),
            set: Box::new(set),
            signature: [T::KIND],
            doc: doc.to_string(),
        }
    }
}

impl<E, T: ValueType> Command for Setter<E, T> {
    fn signature(&self) -> &[ValueKind] {
        &self.signature
    }

    fn docstring(&self) -> &str {
        &self.doc
    }

    fn run(&self, args: &[Value]) -> DgResult<Option<Value>> {
        let value = arg::<T>(args, 0)?;
        (self.set)(&mut self.state.borrow_mut(), value);
        Ok(None)
    }
}

/// Reads one property of the entity state.
pub struct Getter<E, T> {
    state: Rc<RefCell<E>>,
    get: Box<dyn Fn(&E) -> T>,
    doc: String,
}

impl<E, T: ValueType> Getter<E, T> {
    pub fn new(state: &Rc<RefCell<E>>, get: impl Fn(&E) -> T + 'static, doc: &str) -> Self {
        Self {
            state: Rc::clone(state),
            get: Box::new(get),
            doc: doc.to_string(),
        }
    }
}

impl<E, T: ValueType> Command for Getter<E, T> {
    fn signature(&self) -> &[ValueKind] {
        &[]
    }

    fn docstring(&self) -> &str {
        &self.doc
    }

    fn run(&self, _args: &[Value]) -> DgResult<Option<Value>> {
        Ok(Some((self.get)(&self.state.borrow()).into_value()))
    }
}

type CommandBody = Box<dyn Fn(&[Value]) -> DgResult<Option<Value>>>;

/// A command defined by a closure and an explicit signature.
pub struct FnCommand {
    signature: Vec<ValueKind>,
    body: CommandBody,
    doc: String,
}

impl FnCommand {
    pub fn new(
        signature: Vec<ValueKind>,
        body: impl Fn(&[Value]) -> DgResult<Option<Value>> + 'static,
        doc: &str,
    ) -> Self {
        Self {
            signature,
            body: Box::new(body),
            doc: doc.to_string(),
        }
    }
}

impl Command for FnCommand {
    fn signature(&self) -> &[ValueKind] {
        &self.signature
    }

    fn docstring(&self) -> &str {
        &self.doc
    }

    fn run(&self, args: &[Value]) -> DgResult<Option<Value>> {
        (self.body)(args)
    }
}
