// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! Storage of the macro variables.
//!
//! Variable numbers map onto storage as follows:
//!
//! * `#0` is always undefined and cannot be written.
//! * `#1` to `#33` are local to the running program.
//! * `#100` to `#199` and `#500` to `#999` are common variables, shared by
//!   all programs run on one interpreter.
//!
//! Every other number is invalid.  Since variable numbers can be computed,
//! all checks happen on access.

use tracing::trace;

use super::error::ErrType;

pub const NUM_LOCALS: usize = 33;

const COMMON_LOW: (u32, u32) = (100, 199);
const COMMON_HIGH: (u32, u32) = (500, 999);
const NUM_COMMONS: usize = (COMMON_LOW.1 - COMMON_LOW.0 + 1 + COMMON_HIGH.1 - COMMON_HIGH.0 + 1) as usize;

/// Where a variable number points to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Slot {
    Null,
    Local(usize),
    Common(usize),
}

impl Slot {
    pub(crate) fn of(index: u32) -> Result<Slot, ErrType> {
        Ok(match index {
            0 => Slot::Null,
            1..=33 => Slot::Local(index as usize - 1),
            n if n >= COMMON_LOW.0 && n <= COMMON_LOW.1 => Slot::Common((n - COMMON_LOW.0) as usize),
            n if n >= COMMON_HIGH.0 && n <= COMMON_HIGH.1 =>
                Slot::Common((n - COMMON_HIGH.0) as usize + (COMMON_LOW.1 - COMMON_LOW.0 + 1) as usize),
            n => return Err(ErrType::InvalidVariableAccess(n as i64)),
        })
    }
}

/// The local variables of one program.
#[derive(Clone, PartialEq, Debug)]
pub struct Locals([Option<f64>; NUM_LOCALS]);

impl Default for Locals {
    fn default() -> Self {
        Locals([None; NUM_LOCALS])
    }
}

impl Locals {
    pub(crate) fn get(&self, slot: usize) -> Option<f64> {
        self.0[slot]
    }
}

/// The common variables, kept in one contiguous store.
#[derive(Clone, PartialEq, Debug)]
pub struct CommonVariables(Vec<Option<f64>>);

impl Default for CommonVariables {
    fn default() -> Self {
        CommonVariables(vec![None; NUM_COMMONS])
    }
}

impl CommonVariables {
    pub(crate) fn get(&self, slot: usize) -> Option<f64> {
        self.0[slot]
    }

    pub(crate) fn set(&mut self, slot: usize, value: Option<f64>) {
        self.0[slot] = value;
    }

    /// Forget all values.
    pub fn clear(&mut self) {
        self.0.iter_mut().for_each(|v| *v = None);
    }
}

/// The variables visible to the running program: its own locals, and the
/// common variables.
pub struct VariableTable<'a> {
    locals: &'a mut Locals,
    commons: &'a mut CommonVariables,
}

impl<'a> VariableTable<'a> {
    pub fn new(locals: &'a mut Locals, commons: &'a mut CommonVariables) -> Self {
        VariableTable { locals, commons }
    }

    /// Read a variable, `None` meaning undefined.
    pub fn get(&self, index: u32) -> Result<Option<f64>, ErrType> {
        Ok(match Slot::of(index)? {
            Slot::Null => None,
            Slot::Local(i) => self.locals.get(i),
            Slot::Common(i) => self.commons.get(i),
        })
    }

    pub fn set(&mut self, index: u32, value: Option<f64>) -> Result<(), ErrType> {
        trace!(index, ?value, "set variable");
        match Slot::of(index)? {
            Slot::Null => return Err(ErrType::InvalidVariableAccess(0)),
            Slot::Local(i) => self.locals.0[i] = value,
            Slot::Common(i) => self.commons.set(i, value),
        }
        Ok(())
    }
}
