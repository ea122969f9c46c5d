// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! Abstract syntax tree of a Fanuc G-code program.
//!
//! The `Display` implementations produce a normalized form of the source:
//! one block per line, comments removed (except for comment-only blocks),
//! keywords uppercased and expressions bracketed where needed.

use std::fmt::{self, Display, Formatter};
use strum_macros::{Display, EnumString};

#[derive(Debug)]
pub struct Program {
    /// The file the program was read from.
    pub filename: String,
    /// The program number from the `O` line, if any.
    pub number: Option<u32>,
    /// `O<number>` if the program has a number line, else the filename.
    pub name: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug)]
pub struct Block {
    /// Physical line in the source file, starting at 1.
    pub lineno: usize,
    /// Column where the statement starts.
    pub col: usize,
    pub blockdel: bool,
    pub label: Option<u32>,
    pub stmt: Stmt,
}

#[derive(Debug)]
pub enum Stmt {
    /// Nothing but (possibly) a sequence number.
    Empty,
    /// Address words like `G01 X10 F200`.
    Words(Vec<Word>),
    Control(Control),
    /// A bare assignment.
    Expr(Expr),
    /// A block consisting only of comments.
    Comment(String),
}

#[derive(Debug)]
pub struct Word {
    pub address: Address,
    pub value: Expr,
    pub col: usize,
}

#[derive(Debug)]
pub enum Control {
    IfGoto(Expr, Expr),
    IfThen(Expr, Expr),
    Goto(Expr),
    /// `WHILE[cond]DOm`, or a bare `DOm` if there is no condition.
    While(Option<Expr>, u8),
    End(u8),
}

#[derive(Debug)]
pub enum VarId {
    Numeric(u32),
    Indirect(Box<Expr>),
}

#[derive(Debug)]
pub enum Expr {
    Int(i64),
    Real(f64),
    Var(VarId),
    UnOp(UnOp, Box<Expr>),
    BinOp(Op, Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
    Assign(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Minus,
    Plus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Mul,
    Div,
    Mod,
    And,
    Add,
    Sub,
    Or,
    Xor,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Op {
    pub fn is_relational(self) -> bool {
        match self {
            Op::Eq | Op::Ne | Op::Gt | Op::Ge | Op::Lt | Op::Le => true,
            _ => false
        }
    }
}

/// Built-in functions.  Trigonometric ones work in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sqrt,
    Abs,
    Round,
    Fix,
    Fup,
    Ln,
    Exp,
}

/// An address letter.  `N` and `O` are not addresses, they introduce
/// sequence and program numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString)]
pub enum Address {
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    P, Q, R, S, T, U, V, W, X, Y, Z,
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, "%")?;
        if let Some(n) = self.number {
            writeln!(f, "O{}", n)?;
        }
        for block in &self.blocks {
            writeln!(f, "{}", block)?;
        }
        writeln!(f, "%")
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut sep = "";
        if self.blockdel {
            write!(f, "/")?;
        }
        if let Some(n) = self.label {
            write!(f, "N{}", n)?;
            sep = " ";
        }
        match &self.stmt {
            Stmt::Empty => Ok(()),
            Stmt::Words(words) => {
                for word in words {
                    write!(f, "{}{}", sep, word)?;
                    sep = " ";
                }
                Ok(())
            }
            Stmt::Control(ctl) => write!(f, "{}{}", sep, ctl),
            Stmt::Expr(ex) => write!(f, "{}{}", sep, ex),
            Stmt::Comment(text) => write!(f, "{}({})", sep, text),
        }
    }
}

impl Display for Word {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.value {
            Expr::BinOp(..) | Expr::Assign(..) => write!(f, "{}[{}]", self.address, self.value),
            _ => write!(f, "{}{}", self.address, self.value),
        }
    }
}

impl Display for Control {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Control::IfGoto(cond, target) => write!(f, "IF[{}] GOTO{}", cond, Target(target)),
            Control::IfThen(cond, assign) => write!(f, "IF[{}] THEN {}", cond, assign),
            Control::Goto(target) => write!(f, "GOTO{}", Target(target)),
            Control::While(Some(cond), id) => write!(f, "WHILE[{}] DO{}", cond, id),
            Control::While(None, id) => write!(f, "DO{}", id),
            Control::End(id) => write!(f, "END{}", id),
        }
    }
}

// GOTO targets other than numbers and variables need brackets.
struct Target<'a>(&'a Expr);

impl Display for Target<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.0 {
            Expr::Int(_) | Expr::Var(_) => write!(f, "{}", self.0),
            _ => write!(f, "[{}]", self.0),
        }
    }
}

impl Display for VarId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            VarId::Numeric(n) => write!(f, "{}", n),
            VarId::Indirect(ex) => write!(f, "[{}]", ex),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Expr::Int(n) => write!(f, "{}", n),
            Expr::Real(n) => if n.fract() == 0. && n.is_finite() {
                write!(f, "{}.", n)
            } else {
                write!(f, "{}", n)
            },
            Expr::Var(id) => write!(f, "#{}", id),
            Expr::UnOp(op, arg) => {
                match op {
                    UnOp::Minus => write!(f, "-")?,
                    UnOp::Plus => write!(f, "+")?,
                    UnOp::Not => return write!(f, "NOT[{}]", arg),
                }
                match **arg {
                    Expr::BinOp(..) | Expr::UnOp(..) | Expr::Assign(..) => write!(f, "[{}]", arg),
                    _ => write!(f, "{}", arg),
                }
            }
            Expr::Call(func, args) => if args.len() == 2 {
                write!(f, "{}[{}]/[{}]", func, args[0], args[1])
            } else {
                write!(f, "{}[{}]", func, args[0])
            },
            Expr::BinOp(op, lhs, rhs) => {
                match **lhs {
                    Expr::BinOp(..) | Expr::Assign(..) => write!(f, "[{}] {} ", lhs, op)?,
                    _ => write!(f, "{} {} ", lhs, op)?,
                }
                match **rhs {
                    Expr::BinOp(..) | Expr::Assign(..) => write!(f, "[{}]", rhs),
                    _ => write!(f, "{}", rhs),
                }
            }
            Expr::Assign(lhs, rhs) => write!(f, "{}={}", lhs, rhs),
        }
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Op::Mul => "*",
            Op::Div => "/",
            Op::Mod => "MOD",
            Op::And => "AND",
            Op::Add => "+",
            Op::Sub => "-",
            Op::Or  => "OR",
            Op::Xor => "XOR",
            Op::Eq  => "EQ",
            Op::Ne  => "NE",
            Op::Gt  => "GT",
            Op::Ge  => "GE",
            Op::Lt  => "LT",
            Op::Le  => "LE",
        })
    }
}
