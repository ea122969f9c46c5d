// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use std::fmt;

/// The result of evaluating an expression.
///
/// A variable reference is kept as `VarRef` instead of being dereferenced
/// right away, since assignment treats a directly copied undefined variable
/// differently from an undefined computation result.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Value {
    Number(f64),
    /// The value of `#0` and of never assigned variables.
    Undefined,
    Boolean(bool),
    VarRef(u32),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Undefined => write!(f, "<undefined>"),
            Value::Boolean(true) => write!(f, "TRUE"),
            Value::Boolean(false) => write!(f, "FALSE"),
            Value::VarRef(n) => write!(f, "#{}", n),
        }
    }
}

/// Execution state of the interpreter.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum State {
    /// The index of the next block to execute.
    Running(usize),
    Halted,
}

/// A G code, stored as ten times its number (G43.4 is `GCode(434)`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GCode(pub u32);

impl GCode {
    pub fn major(self) -> u32 {
        self.0 / 10
    }

    pub fn minor(self) -> u32 {
        self.0 % 10
    }
}

impl fmt::Display for GCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.minor() == 0 {
            write!(f, "G{:02}", self.major())
        } else {
            write!(f, "G{:02}.{}", self.major(), self.minor())
        }
    }
}

/// Runtime switches of the interpreter.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Skip blocks starting with `/`.
    pub block_delete: bool,
    /// Maximum number of blocks executed before the run is aborted.
    pub step_limit: Option<u64>,
}
