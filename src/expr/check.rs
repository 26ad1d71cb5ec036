//! Static checks run between parsing and evaluation.
//!
//! The parameter is dynamically typed, so most checks only fire when an
//! operand's type is known for certain (literals, casts, operator results).
//! Everything the checker cannot rule out is left to evaluation.

use super::Diagnostic;
use super::ResultKind;
use super::ast::{BinaryOp, CastType, Expr, ExprKind, LambdaExpr, UnaryOp};
use crate::value::Value;

/// Statically known type of a sub-expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ty {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Record,
    Dynamic,
}

impl Ty {
    fn of(value: &Value) -> Ty {
        match value {
            Value::Null => Ty::Null,
            Value::Bool(_) => Ty::Bool,
            Value::Int(_) => Ty::Int,
            Value::Float(_) => Ty::Float,
            Value::Str(_) => Ty::Str,
            Value::Record(_) => Ty::Record,
            Value::List(_) => Ty::Dynamic,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Ty::Null => "null",
            Ty::Bool => "bool",
            Ty::Int => "int",
            Ty::Float => "double",
            Ty::Str => "string",
            Ty::Record => "<anonymous type>",
            Ty::Dynamic => "object",
        }
    }

    fn is_numeric(self) -> bool {
        matches!(self, Ty::Int | Ty::Float)
    }

    /// Could hold a value of type `want` at runtime.
    fn admits(self, want: Ty) -> bool {
        self == want || self == Ty::Dynamic
    }
}

/// Check a parsed lambda for the requested result kind.
pub(crate) fn check(lambda: &LambdaExpr, kind: ResultKind) -> Result<(), Vec<Diagnostic>> {
    let mut checker = Checker {
        param: &lambda.param,
        diagnostics: Vec::new(),
    };
    let ty = checker.expr(&lambda.body);

    if kind == ResultKind::Boolean && !ty.admits(Ty::Bool) {
        checker.error(
            &lambda.body,
            format!("cannot implicitly convert type '{}' to 'bool'", ty.name()),
        );
    }

    if checker.diagnostics.is_empty() {
        Ok(())
    } else {
        Err(checker.diagnostics)
    }
}

struct Checker<'a> {
    param: &'a str,
    diagnostics: Vec<Diagnostic>,
}

impl Checker<'_> {
    fn error(&mut self, at: &Expr, message: String) {
        self.diagnostics.push(Diagnostic::new(at.span.start, message));
    }

    fn expr(&mut self, expr: &Expr) -> Ty {
        match &expr.kind {
            ExprKind::Literal(value) => Ty::of(value),
            ExprKind::Ident(name) => {
                if name != self.param {
                    self.error(
                        expr,
                        format!("the name '{name}' does not exist in the current context"),
                    );
                }
                Ty::Dynamic
            }
            ExprKind::Member { target, name } => self.member(expr, target, name),
            ExprKind::Method { target, name, args } => self.method(expr, target, name, args),
            ExprKind::Math { name, args } => self.math(expr, name, args),
            ExprKind::Cast { ty, expr: inner } => self.cast(expr, *ty, inner),
            ExprKind::Unary { op, expr: inner } => self.unary(expr, *op, inner),
            ExprKind::Binary { op, lhs, rhs } => self.binary(expr, *op, lhs, rhs),
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => {
                let cond_ty = self.expr(cond);
                if !cond_ty.admits(Ty::Bool) {
                    self.error(
                        cond,
                        format!(
                            "cannot implicitly convert type '{}' to 'bool'",
                            cond_ty.name()
                        ),
                    );
                }
                let a = self.expr(then);
                let b = self.expr(otherwise);
                match (a, b) {
                    _ if a == b => a,
                    (Ty::Null, other) | (other, Ty::Null) => other,
                    (x, y) if x.is_numeric() && y.is_numeric() => Ty::Float,
                    _ => Ty::Dynamic,
                }
            }
            ExprKind::Record(members) => {
                for (i, member) in members.iter().enumerate() {
                    if members[..i].iter().any(|m| m.name == member.name) {
                        self.error(
                            &member.value,
                            format!(
                                "an anonymous type cannot have multiple properties with the same name '{}'",
                                member.name
                            ),
                        );
                    }
                    self.expr(&member.value);
                }
                Ty::Record
            }
        }
    }

    fn member(&mut self, at: &Expr, target: &Expr, name: &str) -> Ty {
        match self.expr(target) {
            Ty::Str if name == "Length" => Ty::Int,
            Ty::Dynamic | Ty::Record => Ty::Dynamic,
            other => {
                self.error(
                    at,
                    format!(
                        "'{}' does not contain a definition for '{name}'",
                        other.name()
                    ),
                );
                Ty::Dynamic
            }
        }
    }

    fn method(&mut self, at: &Expr, target: &Expr, name: &str, args: &[Expr]) -> Ty {
        let target_ty = self.expr(target);
        for arg in args {
            let arg_ty = self.expr(arg);
            if name != "ToString" && !arg_ty.admits(Ty::Str) {
                self.error(
                    arg,
                    format!("cannot convert from '{}' to 'string'", arg_ty.name()),
                );
            }
        }

        let (arity, result) = match name {
            "ToString" => (0, Ty::Str),
            "ToUpper" | "ToLower" | "Trim" => (0, Ty::Str),
            "Contains" | "StartsWith" | "EndsWith" => (1, Ty::Bool),
            _ => {
                self.error(at, format!("'{name}' is not a supported method"));
                return Ty::Dynamic;
            }
        };

        if name != "ToString" && !target_ty.admits(Ty::Str) {
            self.error(
                at,
                format!(
                    "'{}' does not contain a definition for '{name}'",
                    target_ty.name()
                ),
            );
        }
        if args.len() != arity {
            self.error(
                at,
                format!(
                    "no overload for method '{name}' takes {} arguments",
                    args.len()
                ),
            );
        }
        result
    }

    fn math(&mut self, at: &Expr, name: &str, args: &[Expr]) -> Ty {
        let tys: Vec<Ty> = args
            .iter()
            .map(|arg| {
                let ty = self.expr(arg);
                if !(ty.is_numeric() || ty == Ty::Dynamic) {
                    self.error(
                        arg,
                        format!("cannot convert from '{}' to 'double'", ty.name()),
                    );
                }
                ty
            })
            .collect();

        let arity_ok = match name {
            "Abs" | "Sqrt" | "Floor" | "Ceiling" => args.len() == 1,
            "Pow" | "Min" | "Max" => args.len() == 2,
            "Round" => args.len() == 1 || args.len() == 2,
            _ => {
                self.error(
                    at,
                    format!("'Math' does not contain a definition for '{name}'"),
                );
                return Ty::Dynamic;
            }
        };
        if !arity_ok {
            self.error(
                at,
                format!(
                    "no overload for method '{name}' takes {} arguments",
                    args.len()
                ),
            );
        }

        match name {
            "Abs" | "Min" | "Max" if tys.iter().all(|t| *t == Ty::Int) => Ty::Int,
            "Abs" | "Min" | "Max" if tys.contains(&Ty::Dynamic) => Ty::Dynamic,
            _ => Ty::Float,
        }
    }

    fn cast(&mut self, at: &Expr, ty: CastType, inner: &Expr) -> Ty {
        let from = self.expr(inner);
        let allowed = match (ty, from) {
            (CastType::Object | CastType::Str, _) | (_, Ty::Dynamic) => true,
            (CastType::Int | CastType::Float, t) => t.is_numeric() || t == Ty::Str,
            (CastType::Bool, t) => t == Ty::Bool || t == Ty::Str,
        };
        if !allowed {
            self.error(
                at,
                format!("cannot convert type '{}' to '{}'", from.name(), ty.name()),
            );
        }
        match ty {
            CastType::Int => Ty::Int,
            CastType::Float => Ty::Float,
            CastType::Str => Ty::Str,
            CastType::Bool => Ty::Bool,
            CastType::Object => Ty::Dynamic,
        }
    }

    fn unary(&mut self, at: &Expr, op: UnaryOp, inner: &Expr) -> Ty {
        let ty = self.expr(inner);
        let result = match op {
            UnaryOp::Not if ty.admits(Ty::Bool) => Some(Ty::Bool),
            UnaryOp::Neg | UnaryOp::Plus if ty.is_numeric() || ty == Ty::Dynamic => Some(ty),
            _ => None,
        };
        result.unwrap_or_else(|| {
            self.error(
                at,
                format!(
                    "operator '{op}' cannot be applied to operand of type '{}'",
                    ty.name()
                ),
            );
            Ty::Dynamic
        })
    }

    fn binary(&mut self, at: &Expr, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Ty {
        let l = self.expr(lhs);
        let r = self.expr(rhs);

        let result = match op {
            BinaryOp::Add if l == Ty::Str || r == Ty::Str => Some(Ty::Str),
            _ if op.is_arithmetic() => match (l, r) {
                (Ty::Int, Ty::Int) => Some(Ty::Int),
                (a, b) if a.is_numeric() && b.is_numeric() => Some(Ty::Float),
                (a, b) if (a.is_numeric() || a == Ty::Dynamic) && (b.is_numeric() || b == Ty::Dynamic) => {
                    Some(Ty::Dynamic)
                }
                _ => None,
            },
            BinaryOp::Eq | BinaryOp::NotEq => Some(Ty::Bool),
            _ if op.is_ordering() => {
                let comparable = |t: Ty| t.is_numeric() || t == Ty::Str || t == Ty::Dynamic;
                let mixed = (l.is_numeric() && r == Ty::Str) || (l == Ty::Str && r.is_numeric());
                (comparable(l) && comparable(r) && !mixed).then_some(Ty::Bool)
            }
            BinaryOp::And | BinaryOp::Or => {
                (l.admits(Ty::Bool) && r.admits(Ty::Bool)).then_some(Ty::Bool)
            }
            BinaryOp::Coalesce => Some(if l == r { l } else { Ty::Dynamic }),
            _ => None,
        };

        result.unwrap_or_else(|| {
            self.error(
                at,
                format!(
                    "operator '{op}' cannot be applied to operands of type '{}' and '{}'",
                    l.name(),
                    r.name()
                ),
            );
            Ty::Dynamic
        })
    }
}
