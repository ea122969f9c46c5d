// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! Expression evaluation.
//!
//! The undefined value (`#0`) follows the controller's rules:
//!
//! * Arithmetic with an undefined operand gives undefined.
//! * Assigning a variable that is undefined makes the target undefined, but
//!   assigning an undefined *computation result* stores zero.
//! * `EQ`/`NE` compare undefined like a value of its own, `LT`/`GT` are
//!   false with any undefined operand, and `GE`/`LE` are true if both
//!   operands are undefined.

use crate::ast::{Expr, Func, Op, UnOp, VarId};
use crate::util::num_to_int;
use super::enums::Value;
use super::error::ErrType;
use super::vars::VariableTable;

/// Evaluate an expression.  Only assignments modify variables.
pub fn evaluate(expr: &Expr, vars: &mut VariableTable) -> Result<Value, ErrType> {
    Ok(match expr {
        Expr::Int(n) => Value::Number(*n as f64),
        Expr::Real(n) => Value::Number(*n),
        Expr::Var(VarId::Numeric(n)) => Value::VarRef(*n),
        Expr::Var(VarId::Indirect(inner)) => {
            let value = evaluate(inner, vars)?;
            match collapse(value, vars, "a variable number")? {
                Some(n) => Value::VarRef(var_index(n)?),
                None => return Err(ErrType::TypeMismatch("a defined variable number", Value::Undefined)),
            }
        }
        Expr::UnOp(op, arg) => {
            let value = evaluate(arg, vars)?;
            match op {
                UnOp::Minus => number(collapse(value, vars, "a numeric operand")?.map(|n| -n)),
                UnOp::Plus => number(collapse(value, vars, "a numeric operand")?),
                UnOp::Not => Value::Boolean(compare(Op::Ne, collapse(value, vars, "a numeric operand")?,
                                                    Some(0.))),
            }
        }
        Expr::BinOp(op, lhs, rhs) => {
            let left = evaluate(lhs, vars)?;
            let right = evaluate(rhs, vars)?;
            match op {
                Op::And | Op::Or | Op::Xor => logical(*op, left, right, vars)?,
                _ => {
                    let left = collapse(left, vars, "a numeric operand")?;
                    let right = collapse(right, vars, "a numeric operand")?;
                    if op.is_relational() {
                        Value::Boolean(compare(*op, left, right))
                    } else {
                        arithmetic(*op, left, right)?
                    }
                }
            }
        }
        Expr::Call(func, args) => {
            let mut nums = Vec::with_capacity(args.len());
            for arg in args {
                let value = evaluate(arg, vars)?;
                nums.push(collapse(value, vars, "a numeric function argument")?);
            }
            match nums.as_slice() {
                [Some(x)] => Value::Number(call(*func, *x)?),
                [Some(y), Some(x)] => Value::Number(atan2(*y, *x)),
                _ => Value::Undefined,
            }
        }
        Expr::Assign(lhs, rhs) => {
            let value = match evaluate(rhs, vars)? {
                Value::VarRef(n) => vars.get(n)?,
                Value::Number(n) => Some(n),
                Value::Undefined => Some(0.),
                value @ Value::Boolean(_) => return Err(ErrType::TypeMismatch("a numeric value", value)),
            };
            match evaluate(lhs, vars)? {
                Value::VarRef(n) => vars.set(n, value)?,
                _ => return Err(ErrType::InvalidAssignmentTarget),
            }
            number(value)
        }
    })
}

/// Dereference variable references, and check that the value is numeric.
///
/// Returns `None` for the undefined value.
pub fn collapse(value: Value, vars: &VariableTable, expected: &'static str) -> Result<Option<f64>, ErrType> {
    match value {
        Value::Number(n) => Ok(Some(n)),
        Value::Undefined => Ok(None),
        Value::VarRef(n) => vars.get(n),
        Value::Boolean(_) => Err(ErrType::TypeMismatch(expected, value)),
    }
}

fn number(value: Option<f64>) -> Value {
    value.map_or(Value::Undefined, Value::Number)
}

fn var_index(n: f64) -> Result<u32, ErrType> {
    if n < 0. && n.fract() == 0. {
        return Err(ErrType::InvalidVariableAccess(n as i64));
    }
    num_to_int(n, 0, u32::MAX, ErrType::InvalidVariableNumber)
}

fn compare(op: Op, left: Option<f64>, right: Option<f64>) -> bool {
    match (op, left, right) {
        (Op::Eq, l, r) => l == r,
        (Op::Ne, l, r) => l != r,
        (Op::Ge, None, None) | (Op::Le, None, None) => true,
        (_, None, _) | (_, _, None) => false,
        (Op::Gt, Some(l), Some(r)) => l > r,
        (Op::Ge, Some(l), Some(r)) => l >= r,
        (Op::Lt, Some(l), Some(r)) => l < r,
        (Op::Le, Some(l), Some(r)) => l <= r,
        _ => unreachable!("not a relational operator")
    }
}

fn arithmetic(op: Op, left: Option<f64>, right: Option<f64>) -> Result<Value, ErrType> {
    let (left, right) = match (left, right) {
        (Some(l), Some(r)) => (l, r),
        _ => return Ok(Value::Undefined),
    };
    let result = match op {
        Op::Mul => left * right,
        Op::Div => if right == 0. {
            return Err(ErrType::DivisionByZero)
        } else { left / right },
        Op::Mod => if right == 0. {
            return Err(ErrType::DivisionByZero)
        } else { left % right },
        Op::Add => left + right,
        Op::Sub => left - right,
        _ => unreachable!("not an arithmetic operator")
    };
    if result.is_finite() {
        Ok(Value::Number(result))
    } else {
        Err(ErrType::Overflow)
    }
}

/// AND, OR and XOR combine conditions, or integers bitwise.
fn logical(op: Op, left: Value, right: Value, vars: &VariableTable) -> Result<Value, ErrType> {
    if let (Value::Boolean(l), Value::Boolean(r)) = (left, right) {
        return Ok(Value::Boolean(match op {
            Op::And => l && r,
            Op::Or => l || r,
            _ => l ^ r,
        }));
    }
    let left = collapse(left, vars, "matching operands for a logical operator")?;
    let right = collapse(right, vars, "matching operands for a logical operator")?;
    let (left, right) = match (left, right) {
        (Some(l), Some(r)) => (bits(l)?, bits(r)?),
        _ => return Ok(Value::Undefined),
    };
    Ok(Value::Number(match op {
        Op::And => left & right,
        Op::Or => left | right,
        _ => left ^ right,
    } as f64))
}

fn bits(n: f64) -> Result<u32, ErrType> {
    num_to_int(n, 0, u32::MAX, |n| ErrType::TypeMismatch("an integer operand", Value::Number(n)))
}

fn call(func: Func, x: f64) -> Result<f64, ErrType> {
    let invalid = || Err(ErrType::InvalidFunctionArgument(func, x));
    let result = match func {
        Func::Sin => x.to_radians().sin(),
        Func::Cos => x.to_radians().cos(),
        Func::Tan => x.to_radians().tan(),
        Func::Asin => if x.abs() > 1. { return invalid() } else { x.asin().to_degrees() },
        Func::Acos => if x.abs() > 1. { return invalid() } else { x.acos().to_degrees() },
        Func::Atan => x.atan().to_degrees(),
        Func::Sqrt => if x < 0. { return invalid() } else { x.sqrt() },
        Func::Abs => x.abs(),
        Func::Round => x.round(),
        Func::Fix => x.trunc(),
        Func::Fup => if x < 0. { x.floor() } else { x.ceil() },
        Func::Ln => if x <= 0. { return invalid() } else { x.ln() },
        Func::Exp => x.exp(),
    };
    if result.is_finite() { Ok(result) } else { invalid() }
}

/// Two-argument arc tangent, in degrees between 0 and 360.
fn atan2(y: f64, x: f64) -> f64 {
    let angle = y.atan2(x).to_degrees();
    if angle < 0. { angle + 360. } else { angle }
}
