// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use tracing::info;

use crate::ast::{self, Block};
use crate::parse::{parse, ParseErrors};
use super::jumps::JumpTable;
use super::vars::Locals;

/// A program ready to be run: its blocks, jump table and local variables.
#[derive(Debug)]
pub struct Program {
    pub name: String,
    pub blocks: Vec<Block>,
    pub jumps: JumpTable,
    pub locals: Locals,
}

impl Program {
    pub fn load(program: ast::Program) -> Result<Self, ParseErrors> {
        let jumps = JumpTable::build(&program)?;
        info!(name = %program.name, blocks = program.blocks.len(), "loaded program");
        Ok(Program {
            name: program.name,
            blocks: program.blocks,
            jumps,
            locals: Locals::default(),
        })
    }

    /// Parse program text and load it.
    pub fn from_source(filename: &str, input: &str) -> Result<Self, ParseErrors> {
        Program::load(parse(filename, input)?)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
