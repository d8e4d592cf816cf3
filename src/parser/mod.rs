//! Recursive-descent parser: turns a token stream into the typed IR, consulting the
//! assembled [`Grammar`] to classify identifiers as keywords, macros, or universal
//! flags.
//!
//! Layering, lowest to highest precedence: logical `or` < `xor` < `and` < `not`, with
//! side-by-side predicates read as an implicit `and`. Below that, predicate forms
//! dispatch on a fixed set of structural words (`within`, `bonded`, `sequence`, `same`,
//! …) before falling back to the shared math-expression grammar in [`expr`], which is
//! itself shared by comparison chains, regex selections, and parenthesized property
//! fields — see [`crate::ir::Ty`] for how the scalar/vector split avoids duplicated
//! numeric/mixed grammars.

mod expr;

use crate::error::{EvalError, ParseError, SelectError, Span};
use crate::grammar::{Grammar, TokenClass};
use crate::ir::{
    BondedOp, BoolFlag, CmpOp, Expr, GroupKind, Ir, Logical, Predicate, PropertyField, PropertyItem, SpatialOp,
    Ty, TypedExpr,
};
use crate::lexer::{Lexer, Token, TokenKind};

/// Words that drive a predicate form rather than naming a registry entry or a value.
/// Reserved regardless of what a host has registered as a keyword or macro: registry
/// names are reserved by registration, but these structural words belong to the
/// grammar itself, one layer below the registry.
const STRUCTURAL_WORDS: [&str; 20] = [
    "within", "exwithin", "bonded", "exbonded", "sequence", "same", "to", "of", "as", "step", "and", "or", "xor",
    "not", "le", "ge", "lt", "gt", "eq", "ne",
];

fn is_structural_word(word: &str) -> bool {
    STRUCTURAL_WORDS.contains(&word)
}

/// Parses `query` against `grammar`, producing the top-level [`Ir`] (a [`Logical`] tree).
/// The parser never evaluates; see [`crate::eval`] for that.
pub fn parse(grammar: &Grammar, query: &str) -> Result<Ir, SelectError> {
    let tokens = Lexer::new(query).tokenize()?;
    let mut parser = Parser { tokens, pos: 0, grammar };
    let ir = parser.parse_or()?;
    parser.expect_eof()?;
    Ok(ir)
}

struct Parser<'g> {
    tokens: Vec<Token>,
    pos: usize,
    grammar: &'g Grammar,
}

impl<'g> Parser<'g> {
    fn peek_kind(&self) -> &TokenKind {
        self.tokens.get(self.pos).map_or(&self.tokens[self.tokens.len() - 1].kind, |t| &t.kind)
    }

    fn peek_span(&self) -> Span {
        self.tokens.get(self.pos).map_or(self.tokens[self.tokens.len() - 1].span, |t| t.span)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn prev_end(&self) -> usize {
        self.tokens[self.pos.saturating_sub(1)].span.end
    }

    fn peek_ident(&self) -> Option<&str> {
        match self.peek_kind() {
            TokenKind::Ident(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn peek_is_ident(&self, word: &str) -> bool {
        self.peek_ident() == Some(word)
    }

    fn describe(&self, kind: &TokenKind) -> String {
        match kind {
            TokenKind::Eof => "end of input".to_owned(),
            TokenKind::Ident(s) => format!("identifier `{s}`"),
            TokenKind::Number(s) => format!("number `{s}`"),
            TokenKind::Regex(_) => "a double-quoted pattern".to_owned(),
            TokenKind::SingleQuoted(_) => "a single-quoted string".to_owned(),
            TokenKind::Raw(_) => "a backtick-quoted string".to_owned(),
            TokenKind::Dollar => "`$`".to_owned(),
            TokenKind::At => "`@`".to_owned(),
            TokenKind::LParen => "`(`".to_owned(),
            TokenKind::RParen => "`)`".to_owned(),
            TokenKind::Plus => "`+`".to_owned(),
            TokenKind::Minus => "`-`".to_owned(),
            TokenKind::Star => "`*`".to_owned(),
            TokenKind::DStar => "`**`".to_owned(),
            TokenKind::Slash => "`/`".to_owned(),
            TokenKind::DSlash => "`//`".to_owned(),
            TokenKind::Percent => "`%`".to_owned(),
            TokenKind::Colon => "`:`".to_owned(),
            TokenKind::Le => "`<=`".to_owned(),
            TokenKind::Ge => "`>=`".to_owned(),
            TokenKind::Lt => "`<`".to_owned(),
            TokenKind::Gt => "`>`".to_owned(),
            TokenKind::EqEq => "`==`".to_owned(),
            TokenKind::Eq => "`=`".to_owned(),
            TokenKind::Ne => "`!=`".to_owned(),
            TokenKind::RegexOp => "`=~`".to_owned(),
            TokenKind::AndAnd => "`&&`".to_owned(),
            TokenKind::Amp => "`&`".to_owned(),
            TokenKind::OrOr => "`||`".to_owned(),
            TokenKind::Pipe => "`|`".to_owned(),
            TokenKind::Bang => "`!`".to_owned(),
        }
    }

    fn expect_rparen(&mut self) -> Result<usize, ParseError> {
        if matches!(self.peek_kind(), TokenKind::RParen) {
            self.advance();
            Ok(self.prev_end())
        } else {
            let got = self.describe(&self.peek_kind().clone());
            Err(ParseError::new(self.peek_span(), "`)`", got))
        }
    }

    fn expect_lparen(&mut self) -> Result<(), ParseError> {
        if matches!(self.peek_kind(), TokenKind::LParen) {
            self.advance();
            Ok(())
        } else {
            let got = self.describe(&self.peek_kind().clone());
            Err(ParseError::new(self.peek_span(), "`(`", got))
        }
    }

    fn expect_ident_any(&mut self) -> Result<String, ParseError> {
        if let TokenKind::Ident(s) = self.peek_kind().clone() {
            self.advance();
            Ok(s)
        } else {
            let got = self.describe(&self.peek_kind().clone());
            Err(ParseError::new(self.peek_span(), "an identifier", got))
        }
    }

    fn expect_ident_word(&mut self, word: &str) -> Result<(), SelectError> {
        if self.peek_is_ident(word) {
            self.advance();
            Ok(())
        } else {
            let got = self.describe(&self.peek_kind().clone());
            Err(SelectError::Parse(ParseError::new(self.peek_span(), format!("`{word}`"), got)))
        }
    }

    fn expect_eof(&mut self) -> Result<(), SelectError> {
        if matches!(self.peek_kind(), TokenKind::Eof) {
            Ok(())
        } else {
            let got = self.describe(&self.peek_kind().clone());
            Err(SelectError::Parse(ParseError::new(self.peek_span(), "end of query", got)))
        }
    }

    fn expect_pattern(&mut self) -> Result<String, SelectError> {
        match self.peek_kind().clone() {
            TokenKind::Regex(s) | TokenKind::SingleQuoted(s) | TokenKind::Raw(s) => {
                self.advance();
                Ok(s)
            }
            other => {
                let got = self.describe(&other);
                Err(SelectError::Parse(ParseError::new(self.peek_span(), "a quoted pattern", got)))
            }
        }
    }

    fn expect_number_literal(&mut self) -> Result<f64, SelectError> {
        match self.peek_kind().clone() {
            TokenKind::Number(text) => {
                let span = self.peek_span();
                self.advance();
                text.parse::<f64>()
                    .map_err(|_| SelectError::Parse(ParseError::new(span, "a numeric literal", format!("`{text}`"))))
            }
            other => {
                let got = self.describe(&other);
                Err(SelectError::Parse(ParseError::new(self.peek_span(), "a numeric distance", got)))
            }
        }
    }

    fn expect_nonneg_int(&mut self) -> Result<u32, SelectError> {
        match self.peek_kind().clone() {
            TokenKind::Number(text) => {
                let span = self.peek_span();
                self.advance();
                text.parse::<u32>().map_err(|_| {
                    SelectError::Parse(ParseError::new(span, "a non-negative integer hop count", format!("`{text}`")))
                })
            }
            other => {
                let got = self.describe(&other);
                Err(SelectError::Parse(ParseError::new(
                    self.peek_span(),
                    "a non-negative integer hop count",
                    got,
                )))
            }
        }
    }

    fn expect_group_kind(&mut self) -> Result<GroupKind, SelectError> {
        let span = self.peek_span();
        let word = self.expect_ident_any()?;
        match word.as_str() {
            "residue" => Ok(GroupKind::Residue),
            "chain" => Ok(GroupKind::Chain),
            "segment" => Ok(GroupKind::Segment),
            "fragment" => Ok(GroupKind::Fragment),
            "model" => Ok(GroupKind::Model),
            _ => Err(SelectError::Parse(ParseError::new(
                span,
                "a grouping keyword (residue, chain, segment, fragment, model)",
                format!("identifier `{word}`"),
            ))),
        }
    }

    // --- logical layer ---------------------------------------------------------------

    fn peek_is_or(&self) -> bool {
        self.peek_is_ident("or") || matches!(self.peek_kind(), TokenKind::OrOr)
    }

    fn peek_is_xor(&self) -> bool {
        self.peek_is_ident("xor")
    }

    fn peek_is_and(&self) -> bool {
        self.peek_is_ident("and") || matches!(self.peek_kind(), TokenKind::AndAnd | TokenKind::Amp)
    }

    fn peek_is_not(&self) -> bool {
        self.peek_is_ident("not") || matches!(self.peek_kind(), TokenKind::Bang)
    }

    /// True if the current token could begin a fresh `not`-level term — used to decide
    /// whether two side-by-side predicates should combine as an implicit `and`.
    fn at_predicate_start(&self) -> bool {
        match self.peek_kind() {
            TokenKind::RParen | TokenKind::Eof => false,
            TokenKind::Ident(w) if w == "and" || w == "or" || w == "xor" => false,
            TokenKind::Le
            | TokenKind::Ge
            | TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::Eq
            | TokenKind::EqEq
            | TokenKind::Ne
            | TokenKind::RegexOp
            | TokenKind::Colon
            | TokenKind::Plus
            | TokenKind::Star
            | TokenKind::DStar
            | TokenKind::Slash
            | TokenKind::DSlash
            | TokenKind::Percent
            | TokenKind::Pipe => false,
            _ => true,
        }
    }

    fn parse_or(&mut self) -> Result<Logical, SelectError> {
        let mut lhs = self.parse_xor()?;
        while self.peek_is_or() {
            self.advance();
            let rhs = self.parse_xor()?;
            lhs = Logical::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_xor(&mut self) -> Result<Logical, SelectError> {
        let mut lhs = self.parse_and()?;
        while self.peek_is_xor() {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Logical::Xor(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Logical, SelectError> {
        let mut lhs = self.parse_not()?;
        loop {
            if self.peek_is_and() {
                self.advance();
                let rhs = self.parse_not()?;
                lhs = Logical::And(Box::new(lhs), Box::new(rhs));
                continue;
            }
            if self.at_predicate_start() {
                let rhs = self.parse_not()?;
                lhs = Logical::And(Box::new(lhs), Box::new(rhs));
                continue;
            }
            break;
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Logical, SelectError> {
        if self.peek_is_not() {
            self.advance();
            let inner = self.parse_not()?;
            return Ok(Logical::Not(Box::new(inner)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Logical, SelectError> {
        if matches!(self.peek_kind(), TokenKind::LParen) {
            self.advance();
            let inner = self.parse_or()?;
            self.expect_rparen()?;
            return Ok(inner);
        }
        let predicate = self.parse_predicate()?;
        Ok(Logical::Predicate(predicate))
    }

    // --- predicate forms ---------------------------------------------------------------

    fn parse_predicate(&mut self) -> Result<Predicate, SelectError> {
        if self.peek_is_ident("within") || self.peek_is_ident("exwithin") {
            return self.parse_within();
        }
        if self.peek_is_ident("bonded") || self.peek_is_ident("exbonded") {
            return self.parse_bonded();
        }
        if self.peek_is_ident("sequence") {
            return self.parse_sequence();
        }
        if self.peek_is_ident("same") {
            return self.parse_sameas();
        }
        if matches!(self.peek_kind(), TokenKind::At) {
            return self.parse_explicit_macro();
        }
        if let Some(word) = self.peek_ident().map(str::to_owned) {
            match self.grammar.classify(&word) {
                TokenClass::Universal { selects_all } => {
                    self.advance();
                    return Ok(Predicate::BoolFlag(if selects_all { BoolFlag::All } else { BoolFlag::None }));
                }
                TokenClass::Macro { canonical } => {
                    let canonical = canonical.to_owned();
                    self.advance();
                    return Ok(Predicate::BoolFlag(BoolFlag::Macro(canonical)));
                }
                TokenClass::Keyword { .. } | TokenClass::Bare => {}
            }
        }
        self.parse_expr_led_predicate()
    }

    fn parse_explicit_macro(&mut self) -> Result<Predicate, SelectError> {
        let start = self.peek_span().start;
        self.advance(); // '@'
        let name = self.expect_ident_any()?;
        match self.grammar.classify(&name) {
            TokenClass::Macro { canonical } => Ok(Predicate::BoolFlag(BoolFlag::Macro(canonical.to_owned()))),
            _ => Err(SelectError::Parse(ParseError::new(
                Span::new(start, self.prev_end()),
                "a registered macro name",
                format!("`@{name}`"),
            ))),
        }
    }

    /// Everything that is not a universal flag, an explicit/implicit macro reference, or
    /// a structural keyword: parses a math expression and decides, from what follows it,
    /// whether the predicate is a property selection, a comparison chain, a regex
    /// selection, or a bare keyword flag.
    fn parse_expr_led_predicate(&mut self) -> Result<Predicate, SelectError> {
        let start = self.peek_span().start;
        let expr = self.parse_expr()?;
        if self.at_item_start() {
            let field = match &expr.expr {
                Expr::FieldRef(name) => PropertyField::Keyword(name.clone()),
                _ => PropertyField::Expr(expr.clone()),
            };
            let items = self.parse_items()?;
            let span = Span::new(start, self.prev_end());
            return Ok(Predicate::PropertySel { field, items, span });
        }
        if let Some(op) = self.peek_cmp_op() {
            return self.parse_compare_tail(expr, op, start);
        }
        if matches!(self.peek_kind(), TokenKind::RegexOp) {
            self.advance();
            let pattern = self.expect_pattern()?;
            let span = Span::new(start, self.prev_end());
            return Ok(Predicate::RegexSel { field_expr: expr, pattern, span });
        }
        if let Expr::FieldRef(name) = &expr.expr {
            return Ok(Predicate::BoolFlag(BoolFlag::KeywordFlag(name.clone())));
        }
        let got = self.describe(&self.peek_kind().clone());
        Err(SelectError::Parse(ParseError::new(
            Span::new(start, self.prev_end()),
            "an item list, a comparison operator, or `=~`",
            got,
        )))
    }

    fn peek_cmp_op(&self) -> Option<CmpOp> {
        match self.peek_kind() {
            TokenKind::Le => Some(CmpOp::Le),
            TokenKind::Ge => Some(CmpOp::Ge),
            TokenKind::Lt => Some(CmpOp::Lt),
            TokenKind::Gt => Some(CmpOp::Gt),
            TokenKind::Eq | TokenKind::EqEq => Some(CmpOp::Eq),
            TokenKind::Ne => Some(CmpOp::Ne),
            TokenKind::Ident(w) => match w.as_str() {
                "le" => Some(CmpOp::Le),
                "ge" => Some(CmpOp::Ge),
                "lt" => Some(CmpOp::Lt),
                "gt" => Some(CmpOp::Gt),
                "eq" => Some(CmpOp::Eq),
                "ne" => Some(CmpOp::Ne),
                _ => None,
            },
            _ => None,
        }
    }

    fn parse_compare_tail(&mut self, first: TypedExpr, first_op: CmpOp, start: usize) -> Result<Predicate, SelectError> {
        let mut operands = vec![first];
        let mut ops = vec![first_op];
        self.advance(); // the operator we already peeked
        let rhs = self.parse_expr()?;
        operands.push(rhs);
        while let Some(op) = self.peek_cmp_op() {
            self.advance();
            ops.push(op);
            let next = self.parse_expr()?;
            operands.push(next);
        }
        let span = Span::new(start, self.prev_end());
        if operands.iter().all(|o| o.ty == Ty::Scalar) {
            return Err(SelectError::Eval(EvalError::PureNumericMask { span }));
        }
        Ok(Predicate::CompareSel { operands, ops, span })
    }

    // --- property items ---------------------------------------------------------------

    fn at_item_start(&self) -> bool {
        match self.peek_kind() {
            TokenKind::Number(_)
            | TokenKind::LParen
            | TokenKind::Regex(_)
            | TokenKind::SingleQuoted(_)
            | TokenKind::Raw(_)
            | TokenKind::Dollar => true,
            TokenKind::Ident(w) => !is_structural_word(w) && !self.grammar.is_reserved(w),
            _ => false,
        }
    }

    fn parse_items(&mut self) -> Result<Vec<PropertyItem>, SelectError> {
        let mut items = Vec::new();
        while self.at_item_start() {
            items.push(self.parse_item()?);
        }
        Ok(items)
    }

    fn parse_item(&mut self) -> Result<PropertyItem, SelectError> {
        match self.peek_kind().clone() {
            TokenKind::Regex(s) => {
                self.advance();
                Ok(PropertyItem::Regex(s))
            }
            TokenKind::SingleQuoted(s) | TokenKind::Raw(s) => {
                self.advance();
                Ok(PropertyItem::StringLit(s))
            }
            TokenKind::Ident(w) => {
                self.advance();
                Ok(PropertyItem::StringLit(w))
            }
            TokenKind::Number(_) | TokenKind::LParen | TokenKind::Dollar => {
                let lo = self.parse_expr()?;
                if matches!(self.peek_kind(), TokenKind::Colon) {
                    self.advance();
                    let hi = self.parse_expr()?;
                    let step = if matches!(self.peek_kind(), TokenKind::Colon) {
                        self.advance();
                        Some(self.parse_expr()?)
                    } else {
                        None
                    };
                    Ok(PropertyItem::Range { lo, hi, step })
                } else if self.peek_is_ident("to") {
                    self.advance();
                    let hi = self.parse_expr()?;
                    let step = if self.peek_is_ident("step") {
                        self.advance();
                        Some(self.parse_expr()?)
                    } else {
                        None
                    };
                    Ok(PropertyItem::Range { lo, hi, step })
                } else {
                    Ok(PropertyItem::Number(lo))
                }
            }
            other => {
                let got = self.describe(&other);
                Err(SelectError::Parse(ParseError::new(self.peek_span(), "a property value", got)))
            }
        }
    }

    // --- structural predicate forms -----------------------------------------------------

    fn parse_within(&mut self) -> Result<Predicate, SelectError> {
        let start = self.peek_span().start;
        let op = if self.peek_is_ident("within") { SpatialOp::Within } else { SpatialOp::ExWithin };
        self.advance();
        let distance = self.expect_number_literal()?;
        self.expect_ident_word("of")?;
        let inner = self.parse_not()?;
        let span = Span::new(start, self.prev_end());
        Ok(Predicate::WithinSel { op, distance, inner: Box::new(inner), span })
    }

    fn parse_bonded(&mut self) -> Result<Predicate, SelectError> {
        let start = self.peek_span().start;
        let op = if self.peek_is_ident("bonded") { BondedOp::Bonded } else { BondedOp::ExBonded };
        self.advance();
        let hops = self.expect_nonneg_int()?;
        self.expect_ident_word("to")?;
        let inner = self.parse_not()?;
        let span = Span::new(start, self.prev_end());
        Ok(Predicate::BondedSel { op, hops, inner: Box::new(inner), span })
    }

    fn parse_sequence(&mut self) -> Result<Predicate, SelectError> {
        let start = self.peek_span().start;
        self.advance(); // "sequence"
        let pattern = self.expect_pattern()?;
        let span = Span::new(start, self.prev_end());
        Ok(Predicate::SequenceSel { pattern, span })
    }

    fn parse_sameas(&mut self) -> Result<Predicate, SelectError> {
        let start = self.peek_span().start;
        self.advance(); // "same"
        let grouping = self.expect_group_kind()?;
        self.expect_ident_word("as")?;
        let inner = self.parse_not()?;
        let span = Span::new(start, self.prev_end());
        Ok(Predicate::SameAsSel { grouping, inner: Box::new(inner), span })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    fn grammar() -> Grammar {
        crate::grammar::assemble(&Registry::with_builtins())
    }

    fn parse_ok(query: &str) -> Ir {
        parse(&grammar(), query).unwrap_or_else(|e| panic!("expected `{query}` to parse, got {e}"))
    }

    #[test]
    fn bare_keyword_is_a_flag() {
        match parse_ok("water") {
            Logical::Predicate(Predicate::BoolFlag(BoolFlag::Macro(name))) => assert_eq!(name, "water"),
            other => panic!("unexpected IR: {other:?}"),
        }
    }

    #[test]
    fn property_selection_collects_items() {
        match parse_ok("name CA CB") {
            Logical::Predicate(Predicate::PropertySel { field, items, .. }) => {
                assert!(matches!(field, PropertyField::Keyword(ref k) if k == "name"));
                assert_eq!(items.len(), 2);
            }
            other => panic!("unexpected IR: {other:?}"),
        }
    }

    #[test]
    fn implicit_and_matches_explicit_and() {
        let implicit = parse_ok("protein name CA");
        let explicit = parse_ok("protein and name CA");
        assert_eq!(format!("{implicit:?}"), format!("{explicit:?}"));
    }

    #[test]
    fn range_item_with_to_and_colon_both_parse() {
        assert!(matches!(
            parse_ok("resid 1 to 10"),
            Logical::Predicate(Predicate::PropertySel { .. })
        ));
        assert!(matches!(
            parse_ok("resid 1:10"),
            Logical::Predicate(Predicate::PropertySel { .. })
        ));
    }

    #[test]
    fn comparison_chain_parses() {
        match parse_ok("0 < beta < 50") {
            Logical::Predicate(Predicate::CompareSel { operands, ops, .. }) => {
                assert_eq!(operands.len(), 3);
                assert_eq!(ops, vec![CmpOp::Lt, CmpOp::Lt]);
            }
            other => panic!("unexpected IR: {other:?}"),
        }
    }

    #[test]
    fn pure_numeric_comparison_is_rejected() {
        let err = parse(&grammar(), "sqrt(25) < 10").unwrap_err();
        assert!(matches!(err, SelectError::Eval(EvalError::PureNumericMask { .. })));
    }

    #[test]
    fn within_of_and_bonded_to_parse() {
        assert!(matches!(
            parse_ok("within 5 of name CA"),
            Logical::Predicate(Predicate::WithinSel { .. })
        ));
        assert!(matches!(
            parse_ok("bonded 1 to index 0"),
            Logical::Predicate(Predicate::BondedSel { .. })
        ));
    }

    #[test]
    fn same_as_parses() {
        assert!(matches!(
            parse_ok("same residue as name CA"),
            Logical::Predicate(Predicate::SameAsSel { .. })
        ));
    }

    #[test]
    fn regex_selection_parses() {
        assert!(matches!(
            parse_ok(r#"name =~ "^C""#),
            Logical::Predicate(Predicate::RegexSel { .. })
        ));
    }

    #[test]
    fn unknown_identifier_is_a_parse_error() {
        let err = parse(&grammar(), "bogus_flag_name").unwrap_err();
        assert!(matches!(err, SelectError::Parse(_)));
    }
}
