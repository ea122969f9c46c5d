// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

mod enums;
mod error;
mod expr;
mod jumps;
mod machine;
mod program;
mod vars;

use std::collections::BTreeMap;
use fixedbitset::FixedBitSet as BitSet;
use tracing::{debug, info};

use crate::ast::{Address, Block, Control, Expr, Stmt, Word};
use crate::parse::MAX_SEQ_NUM;
use crate::util::num_to_int;

pub use self::enums::*;
pub use self::error::*;
pub use self::expr::{collapse, evaluate};
pub use self::jumps::JumpTable;
pub use self::machine::*;
pub use self::program::Program;
pub use self::vars::{CommonVariables, Locals, VariableTable, NUM_LOCALS};

use self::vars::Slot;

const MAX_GCODE: u32 = 1000;
const MAX_MCODE: u32 = 1000;
const MAX_TOOL: u32 = 10000;
const MAX_LABEL: u32 = MAX_SEQ_NUM + 1;

/// Modal groups of G codes.  Only one code of each group may appear in a block.
const MODAL_GROUPS: &[(&str, &[usize])] = &[
    ("motion", &[0, 10, 20, 30, 330]),
    ("plane selection", &[170, 180, 190]),
    ("distance mode", &[900, 910]),
    ("feed mode", &[940, 950]),
    ("units", &[200, 210]),
    ("cutter compensation", &[400, 410, 420]),
    ("tool length offset", &[430, 440, 490]),
    ("canned cycle", &[730, 740, 760, 800, 810, 820, 830, 840, 850, 860, 870, 880, 890]),
    ("canned cycle return", &[980, 990]),
    ("work coordinate system", &[540, 550, 560, 570, 580, 590]),
];

/// The Interpreter runs a loaded program block by block, evaluating
/// expressions against the variables and passing the resulting commands to
/// the machine tool.
///
/// Common variables are kept across programs run on the same interpreter;
/// local variables belong to the loaded program.
pub struct Interpreter<M> {
    machine: M,
    config: Config,
    commons: CommonVariables,
    program: Option<Program>,
    state: State,
    // blocks executed in the current run
    steps: u64,
}

impl<M: MachineTool> Interpreter<M> {
    pub fn new(machine: M) -> Self {
        Self::with_config(machine, Config::default())
    }

    pub fn with_config(machine: M, config: Config) -> Self {
        Interpreter {
            machine,
            config,
            commons: CommonVariables::default(),
            program: None,
            state: State::Halted,
            steps: 0,
        }
    }

    /// Load a program, replacing the current one, and prepare to run it from
    /// its first block.
    pub fn load(&mut self, program: Program) {
        info!(name = %program.name, "starting program");
        self.state = if program.is_empty() { State::Halted } else { State::Running(0) };
        self.program = Some(program);
        self.steps = 0;
    }

    /// Execute one block, and return the state afterwards.
    ///
    /// Any error halts the program.
    pub fn step(&mut self) -> Result<State, EvalError> {
        let index = match self.state {
            State::Running(index) => index,
            State::Halted => return Ok(State::Halted),
        };
        let Program { name, blocks, jumps, locals } = match &mut self.program {
            Some(program) => program,
            None => {
                self.state = State::Halted;
                return Ok(State::Halted);
            }
        };
        let block = match blocks.get(index) {
            Some(block) => block,
            None => {
                self.state = State::Halted;
                return Ok(State::Halted);
            }
        };

        if let Some(limit) = self.config.step_limit {
            if self.steps >= limit {
                self.state = State::Halted;
                return Err(EvalError { program: name.clone(), lineno: block.lineno, col: None,
                                       errtype: ErrType::StepLimitExceeded(limit) });
            }
        }
        self.steps += 1;

        let flow = if block.blockdel && self.config.block_delete {
            debug!(line = block.lineno, "skipping deleted block");
            Flow::Next
        } else {
            debug!(line = block.lineno, index, "executing block");
            let mut exec = Executor {
                jumps,
                vars: VariableTable::new(locals, &mut self.commons),
                machine: &mut self.machine,
                index,
            };
            match exec.block(block) {
                Ok(flow) => flow,
                Err((col, errtype)) => {
                    self.state = State::Halted;
                    return Err(EvalError { program: name.clone(), lineno: block.lineno,
                                           col: Some(col), errtype });
                }
            }
        };

        let next = match flow {
            Flow::Next => index + 1,
            Flow::Jump(target) => {
                debug!(from = index, to = target, "jump");
                target
            }
            Flow::End => blocks.len(),
        };
        self.state = if next < blocks.len() {
            State::Running(next)
        } else {
            info!(name = %name, steps = self.steps, "program halted");
            State::Halted
        };
        Ok(self.state)
    }

    /// Run the loaded program until it halts.
    pub fn run(&mut self) -> Result<(), EvalError> {
        while let State::Running(_) = self.step()? {}
        Ok(())
    }

    /// Load a program and run it to completion.
    pub fn run_program(&mut self, program: Program) -> Result<(), EvalError> {
        self.load(program);
        self.run()
    }

    /// Read a variable.  Local variables are those of the loaded program.
    pub fn get_variable(&self, index: u32) -> Result<Option<f64>, ErrType> {
        Ok(match Slot::of(index)? {
            Slot::Null => None,
            Slot::Local(i) => self.program.as_ref().and_then(|p| p.locals.get(i)),
            Slot::Common(i) => self.commons.get(i),
        })
    }

    /// Set a variable.  Local variables can only be set with a loaded program.
    pub fn set_variable(&mut self, index: u32, value: Option<f64>) -> Result<(), ErrType> {
        match &mut self.program {
            Some(program) => VariableTable::new(&mut program.locals, &mut self.commons).set(index, value),
            None => match Slot::of(index)? {
                Slot::Common(i) => {
                    self.commons.set(i, value);
                    Ok(())
                }
                _ => Err(ErrType::InvalidVariableAccess(index as i64)),
            },
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn commons_mut(&mut self) -> &mut CommonVariables {
        &mut self.commons
    }

    pub fn machine(&self) -> &M {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut M {
        &mut self.machine
    }

    pub fn into_machine(self) -> M {
        self.machine
    }
}

// ----- non-public helper APIs

/// What to do after a block.
enum Flow {
    Next,
    Jump(usize),
    End,
}

type BlockResult<T> = Result<T, (usize, ErrType)>;

fn at(col: usize) -> impl FnOnce(ErrType) -> (usize, ErrType) {
    move |e| (col, e)
}

/// Executes single blocks with the parts of the interpreter they need.
struct Executor<'a, M> {
    jumps: &'a JumpTable,
    vars: VariableTable<'a>,
    machine: &'a mut M,
    index: usize,
}

impl<'a, M: MachineTool> Executor<'a, M> {
    fn block(&mut self, block: &Block) -> BlockResult<Flow> {
        match &block.stmt {
            Stmt::Empty | Stmt::Comment(_) => Ok(Flow::Next),
            Stmt::Words(words) => self.words(block, words),
            Stmt::Control(ctl) => self.control(ctl).map_err(at(block.col)),
            Stmt::Expr(ex) => {
                evaluate(ex, &mut self.vars).map_err(at(block.col))?;
                Ok(Flow::Next)
            }
        }
    }

    fn control(&mut self, ctl: &Control) -> Result<Flow, ErrType> {
        Ok(match ctl {
            Control::Goto(target) => Flow::Jump(self.target(target)?),
            Control::IfGoto(cond, target) => if self.condition(cond)? {
                Flow::Jump(self.target(target)?)
            } else {
                Flow::Next
            },
            Control::IfThen(cond, assign) => {
                if self.condition(cond)? {
                    evaluate(assign, &mut self.vars)?;
                }
                Flow::Next
            }
            Control::While(cond, id) => {
                let enter = match cond {
                    Some(cond) => self.condition(cond)?,
                    None => true,
                };
                if enter {
                    Flow::Next
                } else {
                    Flow::Jump(self.jumps.loop_end(self.index, *id)? + 1)
                }
            }
            Control::End(id) => Flow::Jump(self.jumps.loop_start(self.index, *id)?),
        })
    }

    fn condition(&mut self, cond: &Expr) -> Result<bool, ErrType> {
        match evaluate(cond, &mut self.vars)? {
            Value::Boolean(b) => Ok(b),
            other => Err(ErrType::TypeMismatch("a condition", other)),
        }
    }

    fn target(&mut self, target: &Expr) -> Result<usize, ErrType> {
        let value = evaluate(target, &mut self.vars)?;
        match collapse(value, &self.vars, "a sequence number")? {
            Some(n) => self.jumps.resolve(num_to_int(n, 0, MAX_LABEL, ErrType::InvalidLabel)?),
            None => Err(ErrType::TypeMismatch("a sequence number", Value::Undefined)),
        }
    }

    /// Evaluate a word's value, which must be a defined number.
    fn word_value(&mut self, word: &Word) -> Result<f64, ErrType> {
        let value = evaluate(&word.value, &mut self.vars)?;
        match collapse(value, &self.vars, "a numeric address value")? {
            Some(n) => Ok(n),
            None => Err(ErrType::UndefinedAddress(word.address)),
        }
    }

    fn words(&mut self, block: &Block, words: &[Word]) -> BlockResult<Flow> {
        let mut gcodes = Codes(BitSet::with_capacity(MAX_GCODE as usize));
        let mut mcodes = vec![];
        let mut args = Args(BTreeMap::new());

        for word in words {
            let value = self.word_value(word).map_err(at(word.col))?;
            match word.address {
                Address::G => gcodes.insert(num_to_int(value, 1, MAX_GCODE, ErrType::InvalidGCode)
                                            .map_err(at(word.col))?),
                Address::M => mcodes.push((num_to_int(value, 0, MAX_MCODE, ErrType::InvalidMCode)
                                           .map_err(at(word.col))?, word.col)),
                address => args.insert(address, value, word.col)?,
            }
        }

        // #1. Preparatory codes, checked against their modal groups.
        gcodes.check_groups().map_err(at(block.col))?;
        for code in gcodes.0.ones() {
            self.machine.gcode(GCode(code as u32)).map_err(|e| (block.col, ErrType::Machine(e)))?;
        }

        // #2. Feed rate, spindle speed and tool.
        if let Some((feed, col)) = args.take(Address::F) {
            self.machine.set_feedrate(feed).map_err(|e| (col, ErrType::Machine(e)))?;
        }
        if let Some((speed, col)) = args.take(Address::S) {
            self.machine.set_spindle_speed(speed).map_err(|e| (col, ErrType::Machine(e)))?;
        }
        if let Some((tool, col)) = args.take(Address::T) {
            let tool = num_to_int(tool, 0, MAX_TOOL, ErrType::InvalidTool).map_err(at(col))?;
            self.machine.select_tool(tool).map_err(|e| (col, ErrType::Machine(e)))?;
        }

        // #3. Everything else is up to the machine.
        for (address, (value, col)) in args.0 {
            self.machine.word(address, value).map_err(|e| (col, ErrType::Machine(e)))?;
        }

        // #4. Miscellaneous functions; M02 and M30 end the program.
        let mut end_of_program = false;
        for (code, col) in mcodes {
            self.machine.mcode(code).map_err(|e| (col, ErrType::Machine(e)))?;
            if code == 2 || code == 30 {
                end_of_program = true;
            }
        }

        Ok(if end_of_program { Flow::End } else { Flow::Next })
    }
}


/// Helper for flagging and checking the G codes on a line.
struct Codes(BitSet);

impl Codes {
    fn insert(&mut self, code: u32) {
        self.0.insert(code as usize);
    }

    fn check_groups(&self) -> Result<(), ErrType> {
        for &(name, codes) in MODAL_GROUPS {
            let mut found = codes.iter().filter(|&&c| self.0[c]);
            if let (Some(&first), Some(&second)) = (found.next(), found.next()) {
                return Err(ErrType::ConflictingGCodes(name, first as u32, second as u32));
            }
        }
        Ok(())
    }
}


/// Helper for collecting the non-G/M address words of a line.
struct Args(BTreeMap<Address, (f64, usize)>);

impl Args {
    fn insert(&mut self, address: Address, value: f64, col: usize) -> BlockResult<()> {
        if self.0.insert(address, (value, col)).is_some() {
            return Err((col, ErrType::RepeatedAddress(address)));
        }
        Ok(())
    }

    fn take(&mut self, address: Address) -> Option<(f64, usize)> {
        self.0.remove(&address)
    }
}
