//! Syntax tree for lambda expressions.

use std::fmt;

use super::lexer::Span;
use crate::value::Value;

/// A parsed `param => body` lambda.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaExpr {
    pub param: String,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Value),
    /// Any bare name; resolved against the parameter by the checker.
    Ident(String),
    Member {
        target: Box<Expr>,
        name: String,
    },
    Method {
        target: Box<Expr>,
        name: String,
        args: Vec<Expr>,
    },
    /// `Math.Name(args)`
    Math {
        name: String,
        args: Vec<Expr>,
    },
    Cast {
        ty: CastType,
        expr: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// `new { Name = expr, ... }`
    Record(Vec<RecordMember>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordMember {
    pub name: String,
    pub value: Expr,
}

/// Target type of an explicit `(type)expr` cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastType {
    Int,
    Float,
    Str,
    Bool,
    Object,
}

impl CastType {
    /// Map a type keyword to its cast, if it is one.
    pub fn from_keyword(name: &str) -> Option<CastType> {
        match name {
            "int" | "long" => Some(CastType::Int),
            "double" | "float" | "decimal" => Some(CastType::Float),
            "string" => Some(CastType::Str),
            "bool" => Some(CastType::Bool),
            "object" => Some(CastType::Object),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CastType::Int => "int",
            CastType::Float => "double",
            CastType::Str => "string",
            CastType::Bool => "bool",
            CastType::Object => "object",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Coalesce,
}

impl BinaryOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem
        )
    }

    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq
        )
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
        })
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Coalesce => "??",
        })
    }
}
