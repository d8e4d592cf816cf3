//! Hand-written tokenizer for the MolSelect query language.
//!
//! Grammar-agnostic: it only recognizes the lexical shapes of the language (identifiers,
//! numbers, quoted forms, punctuation). Classifying an identifier as a
//! keyword, macro, or universal flag is the [`crate::grammar::Grammar`]'s job, consulted
//! by the parser — this keeps the lexer reusable across grammar reassemblies.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::{ParseError, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    /// Raw numeric lexeme text (e.g. "3", "3.5", "1e-3"); the parser decides int-vs-float.
    Number(String),
    /// Double-quoted: a regex pattern, unescaped only for `\"`.
    Regex(String),
    /// Single-quoted: a literal string allowing internal `"`, escaped `\'`/`\"`.
    SingleQuoted(String),
    /// Backtick-quoted: a raw string allowing spaces, negative signs, and colons.
    Raw(String),
    Dollar,
    At,
    LParen,
    RParen,
    Plus,
    Minus,
    Star,
    DStar,
    Slash,
    DSlash,
    Percent,
    Colon,
    Le,
    Ge,
    Lt,
    Gt,
    EqEq,
    Eq,
    Ne,
    RegexOp,
    AndAnd,
    Amp,
    OrOr,
    Pipe,
    Bang,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

pub struct Lexer<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    /// Tokenizes the entire input, ending with a single [`TokenKind::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(&(start, c)) = self.chars.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    span: Span::point(self.src.len()),
                });
                return Ok(tokens);
            };
            let token = match c {
                '(' => self.single(start, TokenKind::LParen),
                ')' => self.single(start, TokenKind::RParen),
                '+' => self.single(start, TokenKind::Plus),
                '%' => self.single(start, TokenKind::Percent),
                ':' => self.single(start, TokenKind::Colon),
                '$' => self.single(start, TokenKind::Dollar),
                '@' => self.single(start, TokenKind::At),
                '*' => self.star(start),
                '/' => self.slash(start),
                '-' => self.minus(start),
                '<' => self.two_char(start, '=', TokenKind::Le, TokenKind::Lt),
                '>' => self.two_char(start, '=', TokenKind::Ge, TokenKind::Gt),
                '=' => self.eq(start),
                '!' => self.bang(start),
                '&' => self.two_char(start, '&', TokenKind::AndAnd, TokenKind::Amp),
                '|' => self.two_char(start, '|', TokenKind::OrOr, TokenKind::Pipe),
                '"' => self.quoted(start, '"', QuoteKind::Regex)?,
                '\'' => self.quoted(start, '\'', QuoteKind::Single)?,
                '`' => self.quoted(start, '`', QuoteKind::Raw)?,
                c if c.is_ascii_digit() => self.number(start),
                c if is_ident_start(c) => self.ident(start),
                other => {
                    return Err(ParseError::new(
                        Span::point(start),
                        "a valid token",
                        format!("unexpected character `{other}`"),
                    ));
                }
            };
            tokens.push(token);
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    fn single(&mut self, start: usize, kind: TokenKind) -> Token {
        self.chars.next();
        Token {
            kind,
            span: Span::new(start, start + 1),
        }
    }

    fn two_char(&mut self, start: usize, second: char, two: TokenKind, one: TokenKind) -> Token {
        self.chars.next();
        if let Some(&(_, c)) = self.chars.peek() {
            if c == second {
                self.chars.next();
                return Token {
                    kind: two,
                    span: Span::new(start, start + 2),
                };
            }
        }
        Token {
            kind: one,
            span: Span::new(start, start + 1),
        }
    }

    fn star(&mut self, start: usize) -> Token {
        self.two_char(start, '*', TokenKind::DStar, TokenKind::Star)
    }

    fn slash(&mut self, start: usize) -> Token {
        self.two_char(start, '/', TokenKind::DSlash, TokenKind::Slash)
    }

    /// `=` (assignment-like `Eq` comparator), `==` (`EqEq`), or `=~` (`RegexOp`).
    fn eq(&mut self, start: usize) -> Token {
        self.chars.next();
        match self.chars.peek() {
            Some(&(_, '=')) => {
                self.chars.next();
                Token {
                    kind: TokenKind::EqEq,
                    span: Span::new(start, start + 2),
                }
            }
            Some(&(_, '~')) => {
                self.chars.next();
                Token {
                    kind: TokenKind::RegexOp,
                    span: Span::new(start, start + 2),
                }
            }
            _ => Token {
                kind: TokenKind::Eq,
                span: Span::new(start, start + 1),
            },
        }
    }

    fn bang(&mut self, start: usize) -> Token {
        self.chars.next();
        if let Some(&(_, '=')) = self.chars.peek() {
            self.chars.next();
            return Token {
                kind: TokenKind::Ne,
                span: Span::new(start, start + 2),
            };
        }
        Token {
            kind: TokenKind::Bang,
            span: Span::new(start, start + 1),
        }
    }

    /// A `-` immediately followed by a digit, itself preceded by whitespace or the
    /// start of input, is read as the sign of a negative number literal (letting
    /// `resid -5 to -1` read naturally); otherwise it is the binary `Minus` token, so
    /// `5 - 3` and `mass - 1` still subtract.
    fn minus(&mut self, start: usize) -> Token {
        let next_is_digit = {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            matches!(lookahead.peek(), Some((_, d)) if d.is_ascii_digit())
        };
        if next_is_digit && self.preceded_by_space(start) {
            self.chars.next();
            self.number(start)
        } else {
            self.single(start, TokenKind::Minus)
        }
    }

    fn preceded_by_space(&self, start: usize) -> bool {
        start == 0
            || self.src[..start]
                .chars()
                .next_back()
                .map_or(true, char::is_whitespace)
    }

    fn number(&mut self, start: usize) -> Token {
        let mut end = start;
        while let Some(&(i, c)) = self.chars.peek() {
            if c.is_ascii_digit() {
                end = i + c.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        if let Some(&(i, '.')) = self.chars.peek() {
            // Lookahead: only consume `.` as a decimal point if followed by a digit,
            // so `1.to` style ranges (unused here) or trailing `.` never break.
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if matches!(lookahead.peek(), Some((_, d)) if d.is_ascii_digit()) {
                end = i + 1;
                self.chars.next();
                while let Some(&(i, c)) = self.chars.peek() {
                    if c.is_ascii_digit() {
                        end = i + c.len_utf8();
                        self.chars.next();
                    } else {
                        break;
                    }
                }
            }
        }
        if let Some(&(_, e)) = self.chars.peek() {
            if e == 'e' || e == 'E' {
                let mut lookahead = self.chars.clone();
                lookahead.next();
                let mut la_end = end;
                if matches!(lookahead.peek(), Some((_, s)) if *s == '+' || *s == '-') {
                    lookahead.next();
                }
                if matches!(lookahead.peek(), Some((_, d)) if d.is_ascii_digit()) {
                    // commit: consume 'e', optional sign, digits
                    let (ei, _) = self.chars.next().unwrap();
                    la_end = ei + 1;
                    if matches!(self.chars.peek(), Some((_, s)) if *s == '+' || *s == '-') {
                        let (si, _) = self.chars.next().unwrap();
                        la_end = si + 1;
                    }
                    while let Some(&(i, c)) = self.chars.peek() {
                        if c.is_ascii_digit() {
                            la_end = i + c.len_utf8();
                            self.chars.next();
                        } else {
                            break;
                        }
                    }
                    end = la_end;
                }
            }
        }
        Token {
            kind: TokenKind::Number(self.src[start..end].to_owned()),
            span: Span::new(start, end),
        }
    }

    fn ident(&mut self, start: usize) -> Token {
        let mut end = start;
        while let Some(&(i, c)) = self.chars.peek() {
            if is_ident_continue(c) {
                end = i + c.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        Token {
            kind: TokenKind::Ident(self.src[start..end].to_owned()),
            span: Span::new(start, end),
        }
    }

    fn quoted(&mut self, start: usize, delim: char, kind: QuoteKind) -> Result<Token, ParseError> {
        self.chars.next(); // opening delimiter
        let mut content = String::new();
        loop {
            match self.chars.next() {
                None => {
                    return Err(ParseError::new(
                        Span::new(start, self.src.len()),
                        format!("closing `{delim}`"),
                        "end of input",
                    ));
                }
                Some((end, c)) if c == delim => {
                    let token_kind = match kind {
                        QuoteKind::Regex => TokenKind::Regex(content),
                        QuoteKind::Single => TokenKind::SingleQuoted(content),
                        QuoteKind::Raw => TokenKind::Raw(content),
                    };
                    return Ok(Token {
                        kind: token_kind,
                        span: Span::new(start, end + 1),
                    });
                }
                Some((_, '\\')) if kind != QuoteKind::Raw => {
                    match self.chars.next() {
                        Some((_, '"')) => content.push('"'),
                        Some((_, '\'')) => content.push('\''),
                        Some((_, '\\')) => content.push('\\'),
                        Some((_, other)) => {
                            content.push('\\');
                            content.push(other);
                        }
                        None => {
                            return Err(ParseError::new(
                                Span::new(start, self.src.len()),
                                format!("closing `{delim}`"),
                                "end of input",
                            ));
                        }
                    }
                }
                Some((_, c)) => content.push(c),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteKind {
    Regex,
    Single,
    Raw,
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\''
}
