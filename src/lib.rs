// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! A G-code interpreter for the [Fanuc] dialect of G-code, including the
//! custom macro variables and control flow (`IF`, `GOTO`, `WHILE`).
//!
//! The undefined variable value (`#0`) is modelled faithfully: it is not the
//! same as zero, and propagates through arithmetic and assignments the way
//! the controller does.
//!
//! [Fanuc]: https://www.fanuc.co.jp/
//!
//! ## Basic usage
//!
//! Use `fanuc_ngc::eval::Program::from_source` to parse and load a program, then
//! run it with an `Interpreter` driving a `MachineTool`.  The crate comes
//! with `SimMachine`, which records all commands it receives.
//!
//! ```rust,no_run
//! use std::{env, fs};
//! use fanuc_ngc::eval::{Interpreter, Program, SimMachine};
//!
//! fn main() {
//!     let filename = env::args().nth(1).unwrap();
//!     let input = fs::read_to_string(&filename).unwrap();
//!
//!     let program = match Program::from_source(&filename, &input) {
//!         Err(e) => return eprintln!("{}", e),
//!         Ok(program) => program,
//!     };
//!     let mut interp = Interpreter::new(SimMachine::new());
//!     match interp.run_program(program) {
//!         Err(e) => eprintln!("{}", e),
//!         Ok(()) => println!("#1 = {:?}", interp.get_variable(1)),
//!     }
//! }
//! ```
//!
//! ## Unsupported features
//!
//! Subprogram calls (`M98`, `G65`) and system variables are not supported.

pub mod ast;
pub mod parse;
pub mod eval;

// internal helpers
pub(crate) mod util;
