//! Recursive-descent parser for lambda expressions.
//!
//! Precedence, lowest first:
//! `?:`, `??`, `||`, `&&`, `== !=`, `< > <= >=`, `+ -`, `* / %`,
//! unary `! - +` and casts, then member access and calls.

use super::Diagnostic;
use super::ast::{
    BinaryOp, CastType, Expr, ExprKind, LambdaExpr, RecordMember, UnaryOp,
};
use super::lexer::{Span, Token, tokenize};
use crate::value::Value;

/// Maximum depth of the syntax tree: nesting, chained operators and
/// member accesses all count.
const MAX_DEPTH: usize = 64;

type PResult<T> = Result<T, Diagnostic>;

/// Parse `param => body` text into a syntax tree.
pub fn parse_lambda(source: &str) -> Result<LambdaExpr, Vec<Diagnostic>> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
        depth: 0,
    };
    parser.lambda().map_err(|d| vec![d])
}

struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|(t, _)| t)
    }

    /// Start offset of the current token, or end of input.
    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, s)| s.start)
            .unwrap_or(self.end)
    }

    /// End offset of the most recently consumed token.
    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|(_, s)| s.end)
            .unwrap_or(0)
    }

    fn advance(&mut self) -> Option<(Token, Span)> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> Diagnostic {
        match self.peek() {
            Some(token) => Diagnostic::new(
                self.offset(),
                format!("expected {expected}, found '{token}'"),
            ),
            None => Diagnostic::new(
                self.end,
                format!("expected {expected}, found end of expression"),
            ),
        }
    }

    fn expect(&mut self, token: &Token, expected: &str) -> PResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn ident(&mut self, expected: &str) -> PResult<String> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn enter(&mut self) -> PResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(Diagnostic::new(
                self.offset(),
                format!("expression nested too deeply (max {MAX_DEPTH})"),
            ));
        }
        Ok(())
    }

    fn lambda(&mut self) -> PResult<LambdaExpr> {
        let param = if self.eat(&Token::LParen) {
            let name = self.ident("lambda parameter name")?;
            self.expect(&Token::RParen, "')'")?;
            name
        } else {
            self.ident("lambda parameter name")?
        };
        self.expect(&Token::Arrow, "'=>' after lambda parameter")?;

        let body = self.expr()?;
        if let Some(token) = self.peek() {
            return Err(Diagnostic::new(
                self.offset(),
                format!("unexpected '{token}' after end of expression"),
            ));
        }
        Ok(LambdaExpr { param, body })
    }

    fn expr(&mut self) -> PResult<Expr> {
        self.enter()?;
        let cond = self.coalesce()?;
        let result = if self.eat(&Token::Question) {
            let then = self.expr()?;
            self.expect(&Token::Colon, "':' in conditional expression")?;
            let otherwise = self.expr()?;
            let span = cond.span.start..otherwise.span.end;
            Expr::new(
                ExprKind::Conditional {
                    cond: Box::new(cond),
                    then: Box::new(then),
                    otherwise: Box::new(otherwise),
                },
                span,
            )
        } else {
            cond
        };
        self.depth -= 1;
        Ok(result)
    }

    fn coalesce(&mut self) -> PResult<Expr> {
        let lhs = self.or()?;
        if self.eat(&Token::Coalesce) {
            self.enter()?;
            let rhs = self.coalesce()?;
            self.depth -= 1;
            return Ok(binary(BinaryOp::Coalesce, lhs, rhs));
        }
        Ok(lhs)
    }

    fn or(&mut self) -> PResult<Expr> {
        self.binary_level(Self::and, &[(Token::OrOr, BinaryOp::Or)])
    }

    fn and(&mut self) -> PResult<Expr> {
        self.binary_level(Self::equality, &[(Token::AndAnd, BinaryOp::And)])
    }

    fn equality(&mut self) -> PResult<Expr> {
        self.binary_level(
            Self::relational,
            &[(Token::EqEq, BinaryOp::Eq), (Token::NotEq, BinaryOp::NotEq)],
        )
    }

    fn relational(&mut self) -> PResult<Expr> {
        self.binary_level(
            Self::additive,
            &[
                (Token::Lt, BinaryOp::Lt),
                (Token::LtEq, BinaryOp::LtEq),
                (Token::Gt, BinaryOp::Gt),
                (Token::GtEq, BinaryOp::GtEq),
            ],
        )
    }

    fn additive(&mut self) -> PResult<Expr> {
        self.binary_level(
            Self::multiplicative,
            &[(Token::Plus, BinaryOp::Add), (Token::Minus, BinaryOp::Sub)],
        )
    }

    fn multiplicative(&mut self) -> PResult<Expr> {
        self.binary_level(
            Self::unary,
            &[
                (Token::Star, BinaryOp::Mul),
                (Token::Slash, BinaryOp::Div),
                (Token::Percent, BinaryOp::Rem),
            ],
        )
    }

    /// Left-associative binary level.
    ///
    /// Each operator applied deepens the tree by one, so it counts against
    /// the nesting limit like a parenthesis does.
    fn binary_level(
        &mut self,
        next: fn(&mut Self) -> PResult<Expr>,
        ops: &[(Token, BinaryOp)],
    ) -> PResult<Expr> {
        let base = self.depth;
        let mut lhs = next(self)?;
        'outer: loop {
            for (token, op) in ops {
                if self.eat(token) {
                    self.enter()?;
                    let rhs = next(self)?;
                    lhs = binary(*op, lhs, rhs);
                    continue 'outer;
                }
            }
            self.depth = base;
            return Ok(lhs);
        }
    }

    fn unary(&mut self) -> PResult<Expr> {
        let start = self.offset();
        let op = match self.peek() {
            Some(Token::Bang) => Some(UnaryOp::Not),
            Some(Token::Minus) => Some(UnaryOp::Neg),
            Some(Token::Plus) => Some(UnaryOp::Plus),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            self.enter()?;
            let operand = self.unary()?;
            self.depth -= 1;
            let span = start..operand.span.end;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    expr: Box::new(operand),
                },
                span,
            ));
        }

        if let Some(ty) = self.cast_ahead() {
            self.pos += 3;
            self.enter()?;
            let operand = self.unary()?;
            self.depth -= 1;
            let span = start..operand.span.end;
            return Ok(Expr::new(
                ExprKind::Cast {
                    ty,
                    expr: Box::new(operand),
                },
                span,
            ));
        }

        self.postfix()
    }

    /// `( type )` at the current position.
    fn cast_ahead(&self) -> Option<CastType> {
        if self.peek() != Some(&Token::LParen) || self.peek_at(2) != Some(&Token::RParen) {
            return None;
        }
        match self.peek_at(1) {
            Some(Token::Ident(name)) => CastType::from_keyword(name),
            _ => None,
        }
    }

    fn postfix(&mut self) -> PResult<Expr> {
        let base = self.depth;
        let mut expr = self.primary()?;
        while self.eat(&Token::Dot) {
            self.enter()?;
            let name = self.ident("member name after '.'")?;
            if self.eat(&Token::LParen) {
                let args = self.args()?;
                let span = expr.span.start..self.prev_end();
                expr = Expr::new(
                    ExprKind::Method {
                        target: Box::new(expr),
                        name,
                        args,
                    },
                    span,
                );
            } else {
                let span = expr.span.start..self.prev_end();
                expr = Expr::new(
                    ExprKind::Member {
                        target: Box::new(expr),
                        name,
                    },
                    span,
                );
            }
        }
        self.depth = base;
        Ok(expr)
    }

    /// Call arguments; the opening parenthesis is already consumed.
    fn args(&mut self) -> PResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(&Token::RParen, "',' or ')' in argument list")?;
            return Ok(args);
        }
    }

    fn primary(&mut self) -> PResult<Expr> {
        let Some((token, span)) = self.advance() else {
            return Err(Diagnostic::new(
                self.end,
                "expected expression, found end of expression",
            ));
        };

        let kind = match token {
            Token::Int(i) => ExprKind::Literal(Value::Int(i)),
            Token::Float(f) => ExprKind::Literal(Value::Float(f)),
            Token::Str(s) => ExprKind::Literal(Value::Str(s)),
            Token::True => ExprKind::Literal(Value::Bool(true)),
            Token::False => ExprKind::Literal(Value::Bool(false)),
            Token::Null => ExprKind::Literal(Value::Null),
            Token::Ident(name) if name == "Math" && self.peek() == Some(&Token::Dot) => {
                self.pos += 1;
                let function = self.ident("function name after 'Math.'")?;
                self.expect(&Token::LParen, "'(' after Math function name")?;
                let args = self.args()?;
                ExprKind::Math {
                    name: function,
                    args,
                }
            }
            Token::Ident(name) => ExprKind::Ident(name),
            Token::LParen => {
                let inner = self.expr()?;
                self.expect(&Token::RParen, "')'")?;
                return Ok(Expr::new(inner.kind, span.start..self.prev_end()));
            }
            Token::New => return self.record(span.start),
            other => {
                return Err(Diagnostic::new(
                    span.start,
                    format!("expected expression, found '{other}'"),
                ));
            }
        };

        Ok(Expr::new(kind, span.start..self.prev_end()))
    }

    /// `new { ... }`; the `new` keyword is already consumed.
    fn record(&mut self, start: usize) -> PResult<Expr> {
        self.expect(&Token::LBrace, "'{' after 'new'")?;
        let mut members = Vec::new();

        while !self.eat(&Token::RBrace) {
            members.push(self.record_member()?);
            if !self.eat(&Token::Comma) {
                self.expect(&Token::RBrace, "',' or '}' in anonymous type")?;
                break;
            }
        }

        Ok(Expr::new(ExprKind::Record(members), start..self.prev_end()))
    }

    fn record_member(&mut self) -> PResult<RecordMember> {
        if let (Some(Token::Ident(name)), Some(Token::Assign)) = (self.peek(), self.peek_at(1)) {
            let name = name.clone();
            self.pos += 2;
            let value = self.expr()?;
            return Ok(RecordMember { name, value });
        }

        let start = self.offset();
        let value = self.expr()?;
        let name = match &value.kind {
            ExprKind::Ident(name) | ExprKind::Member { name, .. } => name.clone(),
            _ => {
                return Err(Diagnostic::new(
                    start,
                    "invalid anonymous type member; expected 'Name = expression'",
                ));
            }
        };
        Ok(RecordMember { name, value })
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    let span = lhs.span.start..rhs.span.end;
    Expr::new(
        ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(source: &str) -> ExprKind {
        parse_lambda(source).unwrap().body.kind
    }

    #[test]
    fn test_parse_param_forms() {
        assert_eq!(parse_lambda("x => x").unwrap().param, "x");
        assert_eq!(parse_lambda("(item) => item").unwrap().param, "item");
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        match body("x => 1 + 2 * 3") {
            ExprKind::Binary { op, rhs, .. } => {
                assert_eq!(op, BinaryOp::Add);
                assert!(matches!(
                    rhs.kind,
                    ExprKind::Binary {
                        op: BinaryOp::Mul,
                        ..
                    }
                ));
            }
            other => panic!("Expected Binary, got {other:?}"),
        }
    }

    #[test]
    fn test_cast_binds_tighter_than_modulo() {
        match body("x => (int)x % 2") {
            ExprKind::Binary { op, lhs, .. } => {
                assert_eq!(op, BinaryOp::Rem);
                assert!(matches!(
                    lhs.kind,
                    ExprKind::Cast {
                        ty: CastType::Int,
                        ..
                    }
                ));
            }
            other => panic!("Expected Binary, got {other:?}"),
        }
    }

    #[test]
    fn test_parenthesized_is_not_cast() {
        assert!(matches!(body("x => (x)"), ExprKind::Ident(ref n) if n == "x"));
    }

    #[test]
    fn test_record_literal() {
        match body("x => new { Value = x, Square = (int)x * (int)x, x.Key }") {
            ExprKind::Record(members) => {
                let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
                assert_eq!(names, vec!["Value", "Square", "Key"]);
            }
            other => panic!("Expected Record, got {other:?}"),
        }
    }

    #[test]
    fn test_methods_and_math() {
        assert!(matches!(
            body("s => s.ToUpper().Contains(\"A\")"),
            ExprKind::Method { ref name, .. } if name == "Contains"
        ));
        assert!(matches!(
            body("x => Math.Abs((int)x)"),
            ExprKind::Math { ref name, ref args } if name == "Abs" && args.len() == 1
        ));
    }

    #[test]
    fn test_conditional() {
        assert!(matches!(
            body("x => (int)x > 2 ? \"big\" : \"small\""),
            ExprKind::Conditional { .. }
        ));
    }

    #[test]
    fn test_missing_arrow_is_reported() {
        let errors = parse_lambda("x x").unwrap_err();
        assert!(errors[0].message.contains("'=>'"));
        assert_eq!(errors[0].column, 3);
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let errors = parse_lambda("x => x x").unwrap_err();
        assert!(errors[0].message.contains("after end of expression"));
    }

    #[test]
    fn test_unbalanced_paren() {
        let errors = parse_lambda("x => ((int)x").unwrap_err();
        assert!(errors[0].message.contains("end of expression"));
    }

    #[test]
    fn test_invalid_record_member() {
        let errors = parse_lambda("x => new { 1 + 2 }").unwrap_err();
        assert!(errors[0].message.contains("anonymous type member"));
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let source = format!("x => {}x{}", "(".repeat(200), ")".repeat(200));
        let errors = parse_lambda(&source).unwrap_err();
        assert!(errors[0].message.contains("nested too deeply"));
    }

    #[test]
    fn test_long_operator_chain_rejected() {
        let source = format!("x => x{}", " + 1".repeat(10_000));
        let errors = parse_lambda(&source).unwrap_err();
        assert!(errors[0].message.contains("nested too deeply"));

        let source = format!("x => x{}", " ?? 1".repeat(10_000));
        let errors = parse_lambda(&source).unwrap_err();
        assert!(errors[0].message.contains("nested too deeply"));
    }

    #[test]
    fn test_long_member_chain_rejected() {
        let source = format!("x => x{}", ".Length".repeat(5_000));
        let errors = parse_lambda(&source).unwrap_err();
        assert!(errors[0].message.contains("nested too deeply"));
    }

    #[test]
    fn test_moderate_chain_accepted() {
        let source = format!("x => (int)x{}", " + 1".repeat(40));
        assert!(parse_lambda(&source).is_ok());
        assert!(parse_lambda("x => ((string)x).Trim().ToUpper().Length").is_ok());
    }
}
