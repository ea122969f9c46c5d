// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use std::fmt;
use thiserror::Error;

use crate::ast::{Address, Func};
use super::enums::*;
use super::machine::MachineError;

/// A runtime error, with the position of the block that caused it.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalError {
    pub program: String,
    pub lineno: usize,
    pub col: Option<usize>,
    pub errtype: ErrType,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.col {
            Some(col) => write!(f, "Error in {}: Line {}, col {}. ", self.program, self.lineno, col)?,
            None => write!(f, "Error in {}: Line {}. ", self.program, self.lineno)?,
        }
        write!(f, "{}", self.errtype)
    }
}

impl std::error::Error for EvalError {}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrType {
    #[error("Variable #{0} cannot be accessed")]
    InvalidVariableAccess(i64),
    #[error("Variable number {0} is not an integer")]
    InvalidVariableNumber(f64),
    #[error("The left-hand side of an assignment must be a variable")]
    InvalidAssignmentTarget,
    #[error("Expected {0}, found {1}")]
    TypeMismatch(&'static str, Value),
    #[error("The value of address {0} is undefined")]
    UndefinedAddress(Address),
    #[error("Address {0} can only be given once per block")]
    RepeatedAddress(Address),
    #[error("Sequence number N{0} does not exist")]
    UndefinedLabel(u32),
    #[error("{0} is not a valid sequence number")]
    InvalidLabel(f64),
    #[error("Loop END{0} has no matching DO")]
    UnmatchedLoop(u8),
    #[error("Division by zero attempted")]
    DivisionByZero,
    #[error("Result of calculation is out of range")]
    Overflow,
    #[error("The value {1} is out of range for function {0}")]
    InvalidFunctionArgument(Func, f64),
    #[error("{a} and {b} of group {0} cannot be used together", a = GCode(*.1), b = GCode(*.2))]
    ConflictingGCodes(&'static str, u32, u32),
    #[error("The code G{0} does not exist")]
    InvalidGCode(f64),
    #[error("The code M{0} does not exist")]
    InvalidMCode(f64),
    #[error("The tool number {0} is invalid")]
    InvalidTool(f64),
    #[error("Step limit of {0} blocks exceeded")]
    StepLimitExceeded(u64),
    #[error("Machine rejected command: {0}")]
    Machine(#[from] MachineError),
}
