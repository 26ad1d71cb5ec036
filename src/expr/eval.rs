//! Tree-walking evaluator for checked lambdas.

use std::cmp::Ordering;

use thiserror::Error;

use super::ast::{BinaryOp, CastType, Expr, ExprKind, LambdaExpr, UnaryOp};
use crate::value::{Record, Value, parse_number};

/// Failure while applying a lambda to one item.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("attempted to divide by zero")]
    DivideByZero,

    #[error("arithmetic operation resulted in an overflow")]
    Overflow,

    #[error("unable to cast {from} value {value} to type '{to}'")]
    InvalidCast {
        from: &'static str,
        value: String,
        to: &'static str,
    },

    #[error("operator '{op}' cannot be applied to operands of type '{lhs}' and '{rhs}'")]
    InvalidOperands {
        op: String,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("operator '{op}' cannot be applied to operand of type '{operand}'")]
    InvalidOperand { op: String, operand: &'static str },

    #[error("'{kind}' does not contain a definition for '{name}'")]
    NoMember { kind: &'static str, name: String },

    #[error("record has no field '{0}'")]
    NoField(String),

    #[error("cannot access '{0}' on a null value")]
    NullReference(String),

    #[error("expected a bool result, found {0}")]
    NotBool(&'static str),
}

type EResult<T> = Result<T, EvalError>;

/// Apply `lambda` to `arg`.
pub fn evaluate(lambda: &LambdaExpr, arg: &Value) -> EResult<Value> {
    Evaluator { arg }.eval(&lambda.body)
}

struct Evaluator<'a> {
    arg: &'a Value,
}

impl Evaluator<'_> {
    fn eval(&self, expr: &Expr) -> EResult<Value> {
        match &expr.kind {
            ExprKind::Literal(value) => Ok(value.clone()),
            // The checker rejects every name except the parameter.
            ExprKind::Ident(_) => Ok(self.arg.clone()),
            ExprKind::Member { target, name } => member(self.eval(target)?, name),
            ExprKind::Method { target, name, args } => {
                let target = self.eval(target)?;
                let args = self.eval_all(args)?;
                method(target, name, &args)
            }
            ExprKind::Math { name, args } => math(name, &self.eval_all(args)?),
            ExprKind::Cast { ty, expr } => cast(*ty, self.eval(expr)?),
            ExprKind::Unary { op, expr } => unary(*op, self.eval(expr)?),
            ExprKind::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs),
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => {
                if self.boolean(cond, "?:")? {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            ExprKind::Record(members) => {
                let mut record = Record::new();
                for member in members {
                    record.push(member.name.clone(), self.eval(&member.value)?);
                }
                Ok(Value::Record(record))
            }
        }
    }

    fn eval_all(&self, exprs: &[Expr]) -> EResult<Vec<Value>> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    fn boolean(&self, expr: &Expr, op: &str) -> EResult<bool> {
        match self.eval(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(EvalError::InvalidOperand {
                op: op.to_string(),
                operand: other.kind_name(),
            }),
        }
    }

    fn binary(&self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> EResult<Value> {
        match op {
            BinaryOp::And => {
                Ok(Value::Bool(self.boolean(lhs, "&&")? && self.boolean(rhs, "&&")?))
            }
            BinaryOp::Or => Ok(Value::Bool(self.boolean(lhs, "||")? || self.boolean(rhs, "||")?)),
            BinaryOp::Coalesce => match self.eval(lhs)? {
                Value::Null => self.eval(rhs),
                value => Ok(value),
            },
            _ => {
                let l = self.eval(lhs)?;
                let r = self.eval(rhs)?;
                match op {
                    BinaryOp::Eq => Ok(Value::Bool(l == r)),
                    BinaryOp::NotEq => Ok(Value::Bool(l != r)),
                    _ if op.is_ordering() => ordering(op, &l, &r).map(Value::Bool),
                    _ => arithmetic(op, l, r),
                }
            }
        }
    }
}

fn operands_error(op: BinaryOp, l: &Value, r: &Value) -> EvalError {
    EvalError::InvalidOperands {
        op: op.to_string(),
        lhs: l.kind_name(),
        rhs: r.kind_name(),
    }
}

fn arithmetic(op: BinaryOp, l: Value, r: Value) -> EResult<Value> {
    if op == BinaryOp::Add && (matches!(l, Value::Str(_)) || matches!(r, Value::Str(_))) {
        return Ok(Value::Str(l.to_text() + &r.to_text()));
    }
    match (&l, &r) {
        (Value::Int(a), Value::Int(b)) => int_arithmetic(op, *a, *b).map(Value::Int),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let (a, b) = (to_f64(&l), to_f64(&r));
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => a % b,
            };
            Ok(Value::Float(result))
        }
        _ => Err(operands_error(op, &l, &r)),
    }
}

fn int_arithmetic(op: BinaryOp, a: i64, b: i64) -> EResult<i64> {
    if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b == 0 {
        return Err(EvalError::DivideByZero);
    }
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => a.checked_div(b),
        _ => a.checked_rem(b),
    };
    result.ok_or(EvalError::Overflow)
}

fn to_f64(value: &Value) -> f64 {
    match value {
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        _ => f64::NAN,
    }
}

fn ordering(op: BinaryOp, l: &Value, r: &Value) -> EResult<bool> {
    let ord = match (l, r) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            to_f64(l).partial_cmp(&to_f64(r))
        }
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => return Err(operands_error(op, l, r)),
    };
    // NaN compares false against everything
    let Some(ord) = ord else {
        return Ok(false);
    };
    Ok(match op {
        BinaryOp::Lt => ord == Ordering::Less,
        BinaryOp::LtEq => ord != Ordering::Greater,
        BinaryOp::Gt => ord == Ordering::Greater,
        _ => ord != Ordering::Less,
    })
}

fn unary(op: UnaryOp, value: Value) -> EResult<Value> {
    match (op, &value) {
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Neg, Value::Int(i)) => i.checked_neg().map(Value::Int).ok_or(EvalError::Overflow),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Plus, Value::Int(_) | Value::Float(_)) => Ok(value),
        _ => Err(EvalError::InvalidOperand {
            op: op.to_string(),
            operand: value.kind_name(),
        }),
    }
}

fn invalid_cast(value: &Value, to: CastType) -> EvalError {
    EvalError::InvalidCast {
        from: value.kind_name(),
        value: value.to_string(),
        to: to.name(),
    }
}

fn cast(ty: CastType, value: Value) -> EResult<Value> {
    match ty {
        CastType::Object => Ok(value),
        CastType::Int => match &value {
            Value::Int(_) => Ok(value),
            Value::Float(f) => truncate(*f),
            Value::Str(s) => match s.trim().parse::<i64>() {
                Ok(i) => Ok(Value::Int(i)),
                Err(_) => parse_number(s)
                    .ok_or_else(|| invalid_cast(&value, ty))
                    .and_then(truncate),
            },
            _ => Err(invalid_cast(&value, ty)),
        },
        CastType::Float => match &value {
            Value::Int(i) => Ok(Value::Float(*i as f64)),
            Value::Float(_) => Ok(value),
            Value::Str(s) => parse_number(s)
                .map(Value::Float)
                .ok_or_else(|| invalid_cast(&value, ty)),
            _ => Err(invalid_cast(&value, ty)),
        },
        CastType::Str => match value {
            Value::Null | Value::Str(_) => Ok(value),
            other => Ok(Value::Str(other.to_text())),
        },
        CastType::Bool => match &value {
            Value::Bool(_) => Ok(value),
            Value::Str(s) if s.trim().eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Value::Str(s) if s.trim().eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            _ => Err(invalid_cast(&value, ty)),
        },
    }
}

fn truncate(f: f64) -> EResult<Value> {
    // i64 bounds as exactly representable floats
    const LOW: f64 = -9_223_372_036_854_775_808.0;
    const HIGH: f64 = 9_223_372_036_854_775_808.0;
    if f.is_finite() && (LOW..HIGH).contains(&f) {
        Ok(Value::Int(f.trunc() as i64))
    } else {
        Err(EvalError::Overflow)
    }
}

fn member(target: Value, name: &str) -> EResult<Value> {
    match &target {
        Value::Record(record) => record
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::NoField(name.to_string())),
        Value::Str(s) if name == "Length" => Ok(Value::Int(s.chars().count() as i64)),
        Value::List(items) if name == "Length" || name == "Count" => {
            Ok(Value::Int(items.len() as i64))
        }
        Value::Null => Err(EvalError::NullReference(name.to_string())),
        other => Err(EvalError::NoMember {
            kind: other.kind_name(),
            name: name.to_string(),
        }),
    }
}

fn method(target: Value, name: &str, args: &[Value]) -> EResult<Value> {
    if target.is_null() {
        return Err(EvalError::NullReference(format!("{name}()")));
    }
    if name == "ToString" {
        return Ok(Value::Str(target.to_text()));
    }
    let Value::Str(s) = &target else {
        return Err(EvalError::NoMember {
            kind: target.kind_name(),
            name: name.to_string(),
        });
    };

    let text_arg = || match args.first() {
        Some(Value::Str(arg)) => Ok(arg.as_str()),
        Some(other) => Err(invalid_cast(other, CastType::Str)),
        None => Err(EvalError::NoMember {
            kind: "string",
            name: name.to_string(),
        }),
    };

    Ok(match name {
        "ToUpper" => Value::Str(s.to_uppercase()),
        "ToLower" => Value::Str(s.to_lowercase()),
        "Trim" => Value::Str(s.trim().to_string()),
        "Contains" => Value::Bool(s.contains(text_arg()?)),
        "StartsWith" => Value::Bool(s.starts_with(text_arg()?)),
        "EndsWith" => Value::Bool(s.ends_with(text_arg()?)),
        _ => {
            return Err(EvalError::NoMember {
                kind: "string",
                name: name.to_string(),
            });
        }
    })
}

fn math(name: &str, args: &[Value]) -> EResult<Value> {
    let number = |i: usize| -> EResult<f64> {
        match args.get(i) {
            Some(v @ (Value::Int(_) | Value::Float(_))) => Ok(to_f64(v)),
            Some(other) => Err(invalid_cast(other, CastType::Float)),
            None => Err(EvalError::NoMember {
                kind: "Math",
                name: name.to_string(),
            }),
        }
    };
    let all_int = args.iter().all(|a| matches!(a, Value::Int(_)));

    let result = match (name, args) {
        ("Abs", [Value::Int(i)]) => return i.checked_abs().map(Value::Int).ok_or(EvalError::Overflow),
        ("Min", [Value::Int(a), Value::Int(b)]) if all_int => Value::Int(*a.min(b)),
        ("Max", [Value::Int(a), Value::Int(b)]) if all_int => Value::Int(*a.max(b)),
        ("Abs", _) => Value::Float(number(0)?.abs()),
        ("Min", _) => Value::Float(number(0)?.min(number(1)?)),
        ("Max", _) => Value::Float(number(0)?.max(number(1)?)),
        ("Sqrt", _) => Value::Float(number(0)?.sqrt()),
        ("Pow", _) => Value::Float(number(0)?.powf(number(1)?)),
        ("Floor", _) => Value::Float(number(0)?.floor()),
        ("Ceiling", _) => Value::Float(number(0)?.ceil()),
        ("Round", [_]) => Value::Float(number(0)?.round_ties_even()),
        ("Round", [_, Value::Int(digits)]) => {
            let scale = 10f64.powi((*digits).clamp(0, 15) as i32);
            Value::Float((number(0)? * scale).round_ties_even() / scale)
        }
        _ => {
            return Err(EvalError::NoMember {
                kind: "Math",
                name: name.to_string(),
            });
        }
    };
    Ok(result)
}
