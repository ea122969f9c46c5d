// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use std::collections::HashMap;

use crate::ast::{self, Control, Stmt};
use crate::parse::{ParseError, ParseErrors};
use super::error::ErrType;

/// Jump targets of a program: block indices for sequence numbers, and the
/// matching block indices of `DO`/`END` loop pairs.
#[derive(Clone, Debug, Default)]
pub struct JumpTable {
    labels: HashMap<u32, usize>,
    loop_ends: HashMap<usize, usize>,
    loop_starts: HashMap<usize, usize>,
}

impl JumpTable {
    /// Build the table in one pass over the blocks.
    ///
    /// Sequence numbers declared twice and unbalanced loops are errors.
    pub fn build(program: &ast::Program) -> Result<Self, ParseErrors> {
        let mut table = JumpTable::default();
        let mut errors = vec![];
        let mut label_lines = HashMap::new();
        // open loops: (identifier, block index, line)
        let mut open: Vec<(u8, usize, usize)> = vec![];

        let mut error = |lineno: usize, col: usize, message: String| errors.push(ParseError {
            program: program.name.clone(),
            lineno,
            col,
            message,
        });

        for (index, block) in program.blocks.iter().enumerate() {
            if let Some(label) = block.label {
                if let Some(first) = label_lines.insert(label, block.lineno) {
                    error(block.lineno, 1, format!("sequence number N{} is already declared on line {}",
                                                   label, first));
                } else {
                    table.labels.insert(label, index);
                }
            }
            match &block.stmt {
                Stmt::Control(Control::While(_, id)) => {
                    if open.iter().any(|&(other, _, _)| other == *id) {
                        error(block.lineno, block.col, format!("loop DO{} is already open", id));
                    } else {
                        open.push((*id, index, block.lineno));
                    }
                }
                Stmt::Control(Control::End(id)) => match open.last() {
                    Some(&(other, start, _)) if other == *id => {
                        open.pop();
                        table.loop_ends.insert(start, index);
                        table.loop_starts.insert(index, start);
                    }
                    Some(&(other, _, _)) => {
                        error(block.lineno, block.col, format!("END{} crosses the open loop DO{}", id, other));
                    }
                    None => error(block.lineno, block.col, format!("END{} has no matching DO", id)),
                },
                _ => ()
            }
        }
        for (id, _, lineno) in open {
            error(lineno, 1, format!("loop DO{} is never closed by END{}", id, id));
        }

        if errors.is_empty() {
            Ok(table)
        } else {
            Err(ParseErrors(errors))
        }
    }

    /// Get the block index for a sequence number.
    pub fn resolve(&self, label: u32) -> Result<usize, ErrType> {
        self.labels.get(&label).copied().ok_or(ErrType::UndefinedLabel(label))
    }

    /// Get the index of the `END` block closing the loop started at `start`.
    pub fn loop_end(&self, start: usize, id: u8) -> Result<usize, ErrType> {
        self.loop_ends.get(&start).copied().ok_or(ErrType::UnmatchedLoop(id))
    }

    /// Get the index of the `DO` block belonging to the `END` at `end`.
    pub fn loop_start(&self, end: usize, id: u8) -> Result<usize, ErrType> {
        self.loop_starts.get(&end).copied().ok_or(ErrType::UnmatchedLoop(id))
    }
}
