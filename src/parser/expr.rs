//! Math expression parsing: precedence climbing over the single typed sub-grammar that
//! avoids a separate pure-numeric/mixed split (see [`crate::ir::Ty`]).
//!
//! Precedence, lowest to highest: `+ -` < `* / // %` < unary `-` < `**` (right-assoc).
//! `**`'s right operand may itself carry a leading unary minus (`2 ** -3`), matching how
//! most languages with a power operator read it.

use crate::error::{ParseError, Span};
use crate::ir::{BinOp, Expr, FuncName, Ty, TypedExpr};

use super::Parser;

impl<'g> Parser<'g> {
    pub(super) fn parse_expr(&mut self) -> Result<TypedExpr, ParseError> {
        self.parse_add()
    }

    fn parse_add(&mut self) -> Result<TypedExpr, ParseError> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek_kind() {
                super::TokenKind::Plus => BinOp::Add,
                super::TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_mul()?;
            lhs = self.combine(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<TypedExpr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                super::TokenKind::Star => BinOp::Mul,
                super::TokenKind::Slash => BinOp::Div,
                super::TokenKind::DSlash => BinOp::FloorDiv,
                super::TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = self.combine(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<TypedExpr, ParseError> {
        if matches!(self.peek_kind(), super::TokenKind::Minus) {
            let start = self.peek_span().start;
            self.advance();
            let operand = self.parse_unary()?;
            let span = Span::new(start, operand.span.end);
            let ty = operand.ty;
            return Ok(TypedExpr {
                expr: Expr::Neg(Box::new(operand)),
                ty,
                span,
            });
        }
        self.parse_pow()
    }

    fn parse_pow(&mut self) -> Result<TypedExpr, ParseError> {
        let base = self.parse_primary()?;
        if matches!(self.peek_kind(), super::TokenKind::DStar) {
            self.advance();
            let exponent = self.parse_unary()?;
            let span = Span::new(base.span.start, exponent.span.end);
            let ty = Self::join_ty(base.ty, exponent.ty);
            return Ok(TypedExpr {
                expr: Expr::Binop(BinOp::Pow, Box::new(base), Box::new(exponent)),
                ty,
                span,
            });
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<TypedExpr, ParseError> {
        let start = self.peek_span().start;
        match self.peek_kind().clone() {
            super::TokenKind::Number(text) => {
                self.advance();
                let value: f64 = text.parse().map_err(|_| {
                    ParseError::new(Span::new(start, start + text.len()), "a numeric literal", format!("`{text}`"))
                })?;
                Ok(TypedExpr {
                    expr: Expr::NumLit(value),
                    ty: Ty::Scalar,
                    span: Span::new(start, start + text.len()),
                })
            }
            super::TokenKind::LParen => {
                self.advance();
                let inner = self.parse_add()?;
                let end = self.expect_rparen()?;
                Ok(TypedExpr {
                    span: Span::new(start, end),
                    ..inner
                })
            }
            super::TokenKind::Dollar => {
                self.advance();
                let name = self.expect_ident_any()?;
                let end = self.prev_end();
                Ok(TypedExpr {
                    expr: Expr::VarRef(name),
                    ty: Ty::Vector,
                    span: Span::new(start, end),
                })
            }
            super::TokenKind::Ident(word) => self.parse_ident_primary(&word, start),
            other => Err(ParseError::new(
                Span::point(start),
                "a number, constant, function call, field reference, or `(`",
                self.describe(&other),
            )),
        }
    }

    fn parse_ident_primary(&mut self, word: &str, start: usize) -> Result<TypedExpr, ParseError> {
        if word == "pi" {
            self.advance();
            return Ok(TypedExpr {
                expr: Expr::ConstPi,
                ty: Ty::Scalar,
                span: Span::new(start, self.prev_end()),
            });
        }
        if word == "e" {
            self.advance();
            return Ok(TypedExpr {
                expr: Expr::ConstE,
                ty: Ty::Scalar,
                span: Span::new(start, self.prev_end()),
            });
        }
        if let Some(func) = func_name(word) {
            self.advance();
            self.expect_lparen()?;
            let arg = self.parse_add()?;
            let end = self.expect_rparen()?;
            let ty = arg.ty;
            return Ok(TypedExpr {
                expr: Expr::Func(func, Box::new(arg)),
                ty,
                span: Span::new(start, end),
            });
        }
        if let super::TokenClass::Keyword { canonical } = self.grammar.classify(word) {
            let canonical = canonical.to_owned();
            self.advance();
            return Ok(TypedExpr {
                expr: Expr::FieldRef(canonical),
                ty: Ty::Vector,
                span: Span::new(start, self.prev_end()),
            });
        }
        Err(ParseError::new(
            Span::point(start),
            "a constant, function call, or registered keyword",
            format!("identifier `{word}`"),
        ))
    }

    fn combine(&self, op: BinOp, lhs: TypedExpr, rhs: TypedExpr) -> TypedExpr {
        let span = Span::new(lhs.span.start, rhs.span.end);
        let ty = Self::join_ty(lhs.ty, rhs.ty);
        TypedExpr {
            expr: Expr::Binop(op, Box::new(lhs), Box::new(rhs)),
            ty,
            span,
        }
    }

    fn join_ty(a: Ty, b: Ty) -> Ty {
        if a == Ty::Vector || b == Ty::Vector {
            Ty::Vector
        } else {
            Ty::Scalar
        }
    }
}

fn func_name(word: &str) -> Option<FuncName> {
    word.parse().ok()
}
