//! Variable frames and the three-scope frame stack.
//!
//! A [`FrameTable`] is a flat name → value mapping. The [`FrameStack`]
//! arranges three of them into the language's address spaces: the global
//! frame (always present), the optional temporary frame, and a stack of
//! local frames whose top is the current `LF`.
//!
//! Access checks are layered: frame existence first (exit 55), then
//! declaration (54). Initialisation (56) is the caller's concern, because
//! `TYPE` legitimately reads uninitialised variables.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::operand::Scope;
use crate::value::Value;

/// A single frame: a mapping from variable names to values.
#[derive(Debug, Clone, Default)]
pub struct FrameTable {
    vars: HashMap<String, Value>,
}

impl FrameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a fresh variable, initially `Uninit`.
    pub fn declare(&mut self, name: &str) -> Result<()> {
        if self.vars.contains_key(name) {
            return Err(Error::Redeclared(name.to_string()));
        }
        self.vars.insert(name.to_string(), Value::Uninit);
        Ok(())
    }

    /// Overwrite the value of an already-declared variable.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<()> {
        match self.vars.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::Undeclared(name.to_string())),
        }
    }

    /// Read a declared variable. The result may be `Uninit`.
    pub fn read(&self, name: &str) -> Result<&Value> {
        self.vars
            .get(name)
            .ok_or_else(|| Error::Undeclared(name.to_string()))
    }

    /// How many variables currently hold a defined value.
    pub fn defined_vars(&self) -> usize {
        self.vars.values().filter(|v| v.is_defined()).count()
    }
}

/// The global frame, the optional temporary frame, and the local-frame
/// stack, with the scope-addressed access protocol.
#[derive(Debug, Clone, Default)]
pub struct FrameStack {
    global: FrameTable,
    temporary: Option<FrameTable>,
    locals: Vec<FrameTable>,
}

impl FrameStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// `CREATEFRAME`: replace the temporary frame with a fresh empty one.
    /// Any previous temporary frame is discarded.
    pub fn create_temporary(&mut self) {
        self.temporary = Some(FrameTable::new());
    }

    /// `PUSHFRAME`: move the temporary frame onto the local stack, where it
    /// becomes the new `LF`. There must be a temporary frame.
    pub fn push_frame(&mut self) -> Result<()> {
        let frame = self
            .temporary
            .take()
            .ok_or(Error::NoFrame(Scope::Temporary))?;
        self.locals.push(frame);
        Ok(())
    }

    /// `POPFRAME`: remove the top local frame and rebind it as the new
    /// temporary frame, discarding any current one.
    pub fn pop_frame(&mut self) -> Result<()> {
        let frame = self.locals.pop().ok_or(Error::NoFrame(Scope::Local))?;
        self.temporary = Some(frame);
        Ok(())
    }

    pub fn declare(&mut self, scope: Scope, name: &str) -> Result<()> {
        self.frame_mut(scope)?.declare(name)
    }

    pub fn assign(&mut self, scope: Scope, name: &str, value: Value) -> Result<()> {
        self.frame_mut(scope)?.assign(name, value)
    }

    pub fn read(&self, scope: Scope, name: &str) -> Result<&Value> {
        self.frame(scope)?.read(name)
    }

    /// Defined variables across the global frame, the temporary frame, and
    /// every frame on the local stack.
    pub fn defined_vars(&self) -> usize {
        self.global.defined_vars()
            + self.temporary.as_ref().map_or(0, FrameTable::defined_vars)
            + self.locals.iter().map(FrameTable::defined_vars).sum::<usize>()
    }

    pub fn global(&self) -> &FrameTable {
        &self.global
    }

    pub fn temporary(&self) -> Option<&FrameTable> {
        self.temporary.as_ref()
    }

    /// The current `LF`, if the local stack is non-empty.
    pub fn local(&self) -> Option<&FrameTable> {
        self.locals.last()
    }

    pub fn local_depth(&self) -> usize {
        self.locals.len()
    }

    fn frame(&self, scope: Scope) -> Result<&FrameTable> {
        match scope {
            Scope::Global => Ok(&self.global),
            Scope::Temporary => self.temporary.as_ref().ok_or(Error::NoFrame(scope)),
            Scope::Local => self.locals.last().ok_or(Error::NoFrame(scope)),
        }
    }

    fn frame_mut(&mut self, scope: Scope) -> Result<&mut FrameTable> {
        match scope {
            Scope::Global => Ok(&mut self.global),
            Scope::Temporary => self.temporary.as_mut().ok_or(Error::NoFrame(scope)),
            Scope::Local => self.locals.last_mut().ok_or(Error::NoFrame(scope)),
        }
    }
}
