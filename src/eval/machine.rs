// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! The interface to the machine tool that executes the program's commands.

use thiserror::Error;

use crate::ast::Address;
use super::enums::GCode;

/// Error returned by a machine tool that refuses a command.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct MachineError(pub String);

/// The machine tool runtime driven by the interpreter.
///
/// Only the feed rate has to be supported.  All other commands are accepted
/// and ignored unless the implementation overrides them.
pub trait MachineTool {
    fn set_feedrate(&mut self, feed: f64) -> Result<(), MachineError>;

    fn set_spindle_speed(&mut self, _speed: f64) -> Result<(), MachineError> {
        Ok(())
    }

    fn select_tool(&mut self, _tool: u32) -> Result<(), MachineError> {
        Ok(())
    }

    /// A preparatory code.  Called before any other word of the block.
    fn gcode(&mut self, _code: GCode) -> Result<(), MachineError> {
        Ok(())
    }

    /// A miscellaneous function.  Called after all other words of the block.
    fn mcode(&mut self, _code: u32) -> Result<(), MachineError> {
        Ok(())
    }

    /// Any other address word, e.g. axis coordinates.
    fn word(&mut self, _address: Address, _value: f64) -> Result<(), MachineError> {
        Ok(())
    }
}

/// A command as recorded by the `SimMachine`.
#[derive(Clone, PartialEq, Debug)]
pub enum Command {
    FeedRate(f64),
    SpindleSpeed(f64),
    ToolSelect(u32),
    GCode(GCode),
    MCode(u32),
    Word(Address, f64),
}

/// A simulated machine that records everything it is told to do.
#[derive(Clone, Debug, Default)]
pub struct SimMachine {
    pub feedrate: f64,
    pub spindle_speed: f64,
    pub tool: Option<u32>,
    pub commands: Vec<Command>,
}

impl SimMachine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MachineTool for SimMachine {
    fn set_feedrate(&mut self, feed: f64) -> Result<(), MachineError> {
        if feed < 0. {
            return Err(MachineError(format!("feed rate {} must not be negative", feed)));
        }
        self.feedrate = feed;
        self.commands.push(Command::FeedRate(feed));
        Ok(())
    }

    fn set_spindle_speed(&mut self, speed: f64) -> Result<(), MachineError> {
        self.spindle_speed = speed;
        self.commands.push(Command::SpindleSpeed(speed));
        Ok(())
    }

    fn select_tool(&mut self, tool: u32) -> Result<(), MachineError> {
        self.tool = Some(tool);
        self.commands.push(Command::ToolSelect(tool));
        Ok(())
    }

    fn gcode(&mut self, code: GCode) -> Result<(), MachineError> {
        self.commands.push(Command::GCode(code));
        Ok(())
    }

    fn mcode(&mut self, code: u32) -> Result<(), MachineError> {
        self.commands.push(Command::MCode(code));
        Ok(())
    }

    fn word(&mut self, address: Address, value: f64) -> Result<(), MachineError> {
        self.commands.push(Command::Word(address, value));
        Ok(())
    }
}
