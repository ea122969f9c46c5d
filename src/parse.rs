// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! The parsing front end.
//!
//! Every line of the program is parsed on its own, so that all syntax errors
//! of a program can be reported together instead of only the first one.

use std::fmt;
use std::str::FromStr;
use itertools::Itertools;
use pest_derive::Parser;
use pest::{Parser, Span, error::{Error, ErrorVariant, LineColLocation}, iterators::Pair};
use thiserror::Error;

use crate::ast::*;

#[derive(Parser)]
#[grammar = "fanuc.pest"]
pub struct FanucParser;

type ParseResult<T> = Result<T, Error<Rule>>;

/// Largest sequence number a block can declare.
pub const MAX_SEQ_NUM: u32 = 99_999;

/// A single syntax (or load-time) error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Error in {program}: Line {lineno}, col {col}. {message}")]
pub struct ParseError {
    pub program: String,
    pub lineno: usize,
    pub col: usize,
    pub message: String,
}

/// All errors found while loading a program.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseErrors(pub Vec<ParseError>);

impl ParseErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.iter().join("\n"))
    }
}

impl std::error::Error for ParseErrors {}

fn err<T>(span: Span, msg: impl Into<String>) -> ParseResult<T> {
    Err(Error::new_from_span(ErrorVariant::CustomError { message: msg.into() }, span))
}

fn parse_num<T: FromStr>(pair: &Pair<Rule>) -> ParseResult<T> {
    match pair.as_str().parse() {
        Ok(v) => Ok(v),
        Err(_) => err(pair.as_span(), format!("number {} is out of range", pair.as_str())),
    }
}

fn col_of(pair: &Pair<Rule>) -> usize {
    pair.as_span().start_pos().line_col().1
}

fn make_var_ref(pair: Pair<Rule>) -> ParseResult<VarId> {
    let (pair,) = pair.into_inner().collect_tuple().expect("one child");
    Ok(match pair.as_rule() {
        Rule::digits => VarId::Numeric(parse_num(&pair)?),
        Rule::expr => VarId::Indirect(Box::new(make_expr(pair)?)),
        _ => unreachable!()
    })
}

fn make_unop(pair: &Pair<Rule>) -> UnOp {
    match pair.as_str() {
        "-" => UnOp::Minus,
        "+" => UnOp::Plus,
        _ => UnOp::Not,
    }
}

fn make_expr(expr_pair: Pair<Rule>) -> ParseResult<Expr> {
    let mut lhs = None;
    let mut op = None;
    let mut unops = vec![];
    for pair in expr_pair.into_inner() {
        let operand = match pair.as_rule() {
            // singletons inside "expr_unary" or brackets
            Rule::expr => make_expr(pair)?,
            Rule::int => Expr::Int(parse_num(&pair)?),
            Rule::real => Expr::Real(parse_num(&pair)?),
            Rule::var_ref => Expr::Var(make_var_ref(pair)?),
            Rule::expr_call => {
                let (func, arg) = pair.into_inner().collect_tuple().expect("children");
                let func = func.as_str().to_ascii_uppercase().parse().expect("valid function");
                Expr::Call(func, vec![make_expr(arg)?])
            }
            Rule::expr_atan => {
                let (argy, argx) = pair.into_inner().collect_tuple().expect("children");
                Expr::Call(Func::Atan, vec![make_expr(argy)?, make_expr(argx)?])
            }
            // left-associative binops
            Rule::expr_add |
            Rule::expr_mul |
            Rule::expr_unary => make_expr(pair)?,
            // operators
            Rule::op_unary => {
                unops.push(make_unop(&pair));
                continue;
            }
            Rule::op_mul => {
                op = Some(match pair.as_str() {
                    "*" => Op::Mul,
                    "/" => Op::Div,
                    x if x.eq_ignore_ascii_case("MOD") => Op::Mod,
                    _ => Op::And,
                });
                continue;
            }
            Rule::op_add => {
                op = Some(match pair.as_str() {
                    "+" => Op::Add,
                    "-" => Op::Sub,
                    x if x.eq_ignore_ascii_case("OR") => Op::Or,
                    _ => Op::Xor,
                });
                continue;
            }
            Rule::op_cmp => {
                op = Some(match pair.as_str() {
                    x if x.eq_ignore_ascii_case("EQ") => Op::Eq,
                    x if x.eq_ignore_ascii_case("NE") => Op::Ne,
                    x if x.eq_ignore_ascii_case("GT") => Op::Gt,
                    x if x.eq_ignore_ascii_case("GE") => Op::Ge,
                    x if x.eq_ignore_ascii_case("LT") => Op::Lt,
                    _                                 => Op::Le,
                });
                continue;
            }
            _ => unreachable!()
        };
        // unary operators apply innermost-last
        let operand = unops.drain(..).rev().fold(operand, |ex, op| Expr::UnOp(op, Box::new(ex)));
        lhs = Some(match (lhs.take(), op.take()) {
            (Some(lhs), Some(op)) => Expr::BinOp(op, Box::new(lhs), Box::new(operand)),
            _ => operand,
        });
    }
    Ok(lhs.expect("no children in expr?"))
}

fn make_assignment(pair: Pair<Rule>) -> ParseResult<Expr> {
    let (lhs, rhs) = pair.into_inner().collect_tuple().expect("children");
    Ok(Expr::Assign(Box::new(make_expr(lhs)?), Box::new(make_expr(rhs)?)))
}

fn make_goto_target(pair: Pair<Rule>) -> ParseResult<Expr> {
    let (pair,) = pair.into_inner().collect_tuple().expect("one child");
    Ok(match pair.as_rule() {
        Rule::digits => Expr::Int(parse_num(&pair)?),
        Rule::var_ref => Expr::Var(make_var_ref(pair)?),
        Rule::expr => make_expr(pair)?,
        _ => unreachable!()
    })
}

fn make_loop_id(pair: Pair<Rule>) -> ParseResult<u8> {
    match pair.as_str().parse::<u8>() {
        Ok(n @ 1..=3) => Ok(n),
        _ => err(pair.as_span(), "loop identifier must be 1, 2 or 3"),
    }
}

fn make_word(pair: Pair<Rule>) -> ParseResult<Word> {
    let col = col_of(&pair);
    let (letter, value) = pair.into_inner().collect_tuple().expect("children");
    let address = letter.as_str().to_ascii_uppercase().parse().expect("valid address");
    let mut sign = None;
    let mut expr = None;
    for pair in value.into_inner() {
        match pair.as_rule() {
            Rule::sign => sign = Some(make_unop(&pair)),
            Rule::int => expr = Some(Expr::Int(parse_num(&pair)?)),
            Rule::real => expr = Some(Expr::Real(parse_num(&pair)?)),
            Rule::var_ref => expr = Some(Expr::Var(make_var_ref(pair)?)),
            Rule::expr => expr = Some(make_expr(pair)?),
            _ => unreachable!()
        }
    }
    let value = expr.expect("word value");
    Ok(Word {
        address,
        value: match sign {
            Some(op) => Expr::UnOp(op, Box::new(value)),
            None => value,
        },
        col,
    })
}

fn make_stmt(pair: Pair<Rule>) -> ParseResult<Stmt> {
    Ok(match pair.as_rule() {
        Rule::if_goto => {
            let (cond, target) = pair.into_inner().collect_tuple().expect("children");
            Stmt::Control(Control::IfGoto(make_expr(cond)?, make_goto_target(target)?))
        }
        Rule::if_then => {
            let (cond, assign) = pair.into_inner().collect_tuple().expect("children");
            Stmt::Control(Control::IfThen(make_expr(cond)?, make_assignment(assign)?))
        }
        Rule::goto_stmt => {
            let (target,) = pair.into_inner().collect_tuple().expect("one child");
            Stmt::Control(Control::Goto(make_goto_target(target)?))
        }
        Rule::while_do => {
            let (cond, id) = pair.into_inner().collect_tuple().expect("children");
            Stmt::Control(Control::While(Some(make_expr(cond)?), make_loop_id(id)?))
        }
        Rule::do_stmt => {
            let (id,) = pair.into_inner().collect_tuple().expect("one child");
            Stmt::Control(Control::While(None, make_loop_id(id)?))
        }
        Rule::end_stmt => {
            let (id,) = pair.into_inner().collect_tuple().expect("one child");
            Stmt::Control(Control::End(make_loop_id(id)?))
        }
        Rule::assignment => Stmt::Expr(make_assignment(pair)?),
        Rule::words => {
            let words = pair.into_inner()
                            .filter(|p| p.as_rule() == Rule::word)
                            .map(make_word)
                            .collect::<ParseResult<_>>()?;
            Stmt::Words(words)
        }
        _ => unreachable!()
    })
}

fn make_block(lineno: usize, pair: Pair<Rule>) -> ParseResult<Block> {
    let mut block = Block { lineno, col: 1, blockdel: false, label: None, stmt: Stmt::Empty };
    let mut comments = vec![];
    for pair in pair.into_inner() {
        match pair.as_rule() {
            Rule::blockdel => block.blockdel = true,
            Rule::seq_num => {
                let (digits,) = pair.into_inner().collect_tuple().expect("one child");
                let label = parse_num(&digits)?;
                if label > MAX_SEQ_NUM {
                    return err(digits.as_span(), format!("sequence number must be at most {}", MAX_SEQ_NUM));
                }
                block.label = Some(label);
            }
            Rule::comment => {
                let (text,) = pair.into_inner().collect_tuple().expect("one child");
                comments.push(text.as_str().trim().to_string());
            }
            Rule::EOI => (),
            _ => {
                block.col = col_of(&pair);
                block.stmt = make_stmt(pair)?;
            }
        }
    }
    if let (Stmt::Empty, false) = (&block.stmt, comments.is_empty()) {
        block.stmt = Stmt::Comment(comments.join(" "));
    }
    Ok(block)
}

fn convert_error(program: &str, lineno: usize, e: Error<Rule>) -> ParseError {
    let col = match e.line_col {
        LineColLocation::Pos((_, c)) | LineColLocation::Span((_, c), _) => c,
    };
    let message = match e.variant {
        ErrorVariant::CustomError { message } => message,
        ErrorVariant::ParsingError { positives, negatives } => {
            match (positives.is_empty(), negatives.is_empty()) {
                (false, false) => format!("unexpected {:?}; expected {:?}", negatives, positives),
                (false, true) => format!("expected {}", positives.iter().map(|r| format!("{:?}", r)).join(" or ")),
                (true, false) => format!("unexpected {}", negatives.iter().map(|r| format!("{:?}", r)).join(" or ")),
                (true, true) => "unknown parsing error".into(),
            }
        }
    };
    ParseError { program: program.into(), lineno, col, message }
}

fn parse_program_number(line: &str) -> Option<u32> {
    let pair = FanucParser::parse(Rule::program_number, line).ok()?.next()?;
    let digits = pair.into_inner().find(|p| p.as_rule() == Rule::digits)?;
    digits.as_str().parse().ok()
}

/// Parse a single block, given as the text of one line.
pub fn parse_block(lineno: usize, line: &str) -> ParseResult<Block> {
    let pair = FanucParser::parse(Rule::block, line)?.next().expect("block");
    make_block(lineno, pair)
}

/// Parse a complete program.
///
/// The text may be framed by `%` lines and start with an `O` number line,
/// which determines the program name.  Without one, the filename is used.
pub fn parse(filename: &str, input: &str) -> Result<Program, ParseErrors> {
    let mut lines = input.lines().map(|l| l.trim_end_matches('\r')).enumerate().peekable();

    if let Some((_, first)) = lines.peek() {
        if first.trim() == "%" {
            lines.next();
        }
    }
    let number = match lines.peek() {
        Some((_, line)) => parse_program_number(line),
        None => None,
    };
    if number.is_some() {
        lines.next();
    }
    let name = match number {
        Some(n) => format!("O{}", n),
        None => filename.to_string(),
    };

    let mut blocks = vec![];
    let mut errors = vec![];
    for (n, line) in lines {
        if line.trim() == "%" {
            break;
        }
        match parse_block(n + 1, line) {
            Ok(block) => blocks.push(block),
            Err(e) => errors.push(convert_error(&name, n + 1, e)),
        }
    }

    if errors.is_empty() {
        Ok(Program { filename: filename.into(), number, name, blocks })
    } else {
        Err(ParseErrors(errors))
    }
}
