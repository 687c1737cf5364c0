use std::ops::{Deref, DerefMut};

use crate::diagnostics::CompileError;
use crate::span::{Span, Spanned};
use super::token::Token;

/// Sequential reader over the lexed token list.
///
/// This is the scanner surface the parsers are written against: one token of
/// pushback, case-insensitive word comparison, a "crossed a newline" flag,
/// and switchable escape-sequence interpretation for string literals (state
/// blocks read backslashes literally, everything else does not).
pub struct TokenStream<'a> {
    tokens: &'a [Spanned<Token>],
    source: &'a str,
    pos: usize,
    prev: (usize, bool),
    crossed: bool,
    last_span: Span,
    escapes: bool,
}

/// Opaque save point for bounded lookahead.
#[derive(Clone, Copy)]
pub struct Mark(usize, bool);

impl<'a> TokenStream<'a> {
    pub fn new(tokens: &'a [Spanned<Token>], source: &'a str) -> Self {
        Self {
            tokens,
            source,
            pos: 0,
            prev: (0, false),
            crossed: false,
            last_span: Span::dummy(),
            escapes: true,
        }
    }

    /// Next token, skipping newlines. Sets the crossed flag when at least
    /// one newline was skipped on the way.
    pub fn get(&mut self) -> Option<Spanned<Token>> {
        self.prev = (self.pos, self.crossed);
        let mut crossed = false;
        while let Some(tok) = self.tokens.get(self.pos) {
            self.pos += 1;
            if matches!(tok.node, Token::Newline) {
                crossed = true;
                continue;
            }
            self.crossed = crossed;
            self.last_span = tok.span;
            return Some(tok.clone());
        }
        self.crossed = crossed;
        self.last_span = self.eof_span();
        None
    }

    /// Push the last token back. One level deep.
    pub fn unget(&mut self) {
        let (pos, crossed) = self.prev;
        self.pos = pos;
        self.crossed = crossed;
    }

    /// Whether the most recent token sat on a new line.
    pub fn crossed(&self) -> bool {
        self.crossed
    }

    pub fn mark(&self) -> Mark {
        Mark(self.pos, self.crossed)
    }

    pub fn reset(&mut self, mark: Mark) {
        self.pos = mark.0;
        self.crossed = mark.1;
    }

    /// Peek at the next non-newline token without consuming it.
    pub fn peek(&self) -> Option<&Spanned<Token>> {
        self.tokens[self.pos..]
            .iter()
            .find(|t| !matches!(t.node, Token::Newline))
    }

    pub fn at_end(&self) -> bool {
        self.peek().is_none()
    }

    /// Text of a token: the source slice, except string literals, whose
    /// inner text is escape-processed only when escapes are enabled.
    pub fn text(&self, tok: &Spanned<Token>) -> String {
        match &tok.node {
            Token::StringLit(raw) => {
                if self.escapes {
                    unescape(raw)
                } else {
                    raw.clone()
                }
            }
            _ => self.source[tok.span.start..tok.span.end].to_string(),
        }
    }

    /// Consume the next token if its text matches case-insensitively.
    pub fn check(&mut self, what: &str) -> bool {
        match self.get() {
            Some(tok) => {
                if self.text(&tok).eq_ignore_ascii_case(what) {
                    true
                } else {
                    self.unget();
                    false
                }
            }
            None => false,
        }
    }

    /// Require the next token to match case-insensitively.
    pub fn expect(&mut self, what: &str) -> Result<(), CompileError> {
        match self.get() {
            Some(tok) => {
                let text = self.text(&tok);
                if text.eq_ignore_ascii_case(what) {
                    Ok(())
                } else {
                    Err(CompileError::syntax(
                        format!("expected '{what}', found '{text}'"),
                        tok.span,
                    ))
                }
            }
            None => Err(CompileError::syntax(
                format!("expected '{what}', found end of file"),
                self.eof_span(),
            )),
        }
    }

    /// Any token at all, as text.
    pub fn get_string(&mut self) -> Result<(String, Span), CompileError> {
        match self.get() {
            Some(tok) => {
                let text = self.text(&tok);
                Ok((text, tok.span))
            }
            None => Err(CompileError::syntax("unexpected end of file", self.eof_span())),
        }
    }

    pub fn expect_ident(&mut self) -> Result<Spanned<String>, CompileError> {
        match self.get() {
            Some(tok) if matches!(tok.node, Token::Ident) => {
                Ok(Spanned::new(self.text(&tok), tok.span))
            }
            Some(tok) => Err(CompileError::syntax(
                format!("expected identifier, found '{}'", self.text(&tok)),
                tok.span,
            )),
            None => Err(CompileError::syntax(
                "expected identifier, found end of file",
                self.eof_span(),
            )),
        }
    }

    /// Consume an integer (with optional leading minus) if one is next.
    pub fn check_number(&mut self) -> Option<i64> {
        let mark = self.mark();
        match self.get() {
            Some(tok) => match tok.node {
                Token::IntLit(v) => Some(v),
                Token::Minus => match self.get() {
                    Some(t2) => match t2.node {
                        Token::IntLit(v) => Some(-v),
                        _ => {
                            self.reset(mark);
                            None
                        }
                    },
                    None => {
                        self.reset(mark);
                        None
                    }
                },
                _ => {
                    self.reset(mark);
                    None
                }
            },
            None => None,
        }
    }

    /// Require an integer (with optional leading minus).
    pub fn expect_number(&mut self) -> Result<(i64, Span), CompileError> {
        match self.get() {
            Some(tok) => match tok.node {
                Token::IntLit(v) => Ok((v, tok.span)),
                Token::Minus => match self.get() {
                    Some(t2) => match t2.node {
                        Token::IntLit(v) => Ok((-v, Span::new(tok.span.start, t2.span.end))),
                        _ => Err(CompileError::syntax(
                            format!("expected a number, found '{}'", self.text(&t2)),
                            t2.span,
                        )),
                    },
                    None => Err(CompileError::syntax(
                        "expected a number, found end of file",
                        self.eof_span(),
                    )),
                },
                _ => Err(CompileError::syntax(
                    format!("expected a number, found '{}'", self.text(&tok)),
                    tok.span,
                )),
            },
            None => Err(CompileError::syntax(
                "expected a number, found end of file",
                self.eof_span(),
            )),
        }
    }

    /// Span of the most recently read token (EOF span before any read).
    pub fn last_span(&self) -> Span {
        self.last_span
    }

    pub fn eof_span(&self) -> Span {
        if let Some(last) = self.tokens.last() {
            Span::new(last.span.end, last.span.end)
        } else {
            Span::dummy()
        }
    }

    /// Positioned syntax error at the most recent token.
    pub fn error(&self, msg: impl Into<String>) -> CompileError {
        CompileError::syntax(msg, self.last_span)
    }

    /// Switch escape interpretation on or off, returning the previous mode.
    pub fn set_escapes(&mut self, on: bool) -> bool {
        std::mem::replace(&mut self.escapes, on)
    }

    /// Enter raw-string mode: string literals keep their backslashes until
    /// the returned guard is dropped, whatever the exit path.
    pub fn raw_strings<'s>(&'s mut self) -> RawStrings<'s, 'a> {
        let prev = self.escapes;
        self.escapes = false;
        RawStrings { sc: self, prev }
    }
}

pub struct RawStrings<'s, 'a> {
    sc: &'s mut TokenStream<'a>,
    prev: bool,
}

impl<'a> Deref for RawStrings<'_, 'a> {
    type Target = TokenStream<'a>;

    fn deref(&self) -> &Self::Target {
        self.sc
    }
}

impl DerefMut for RawStrings<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.sc
    }
}

impl Drop for RawStrings<'_, '_> {
    fn drop(&mut self) {
        self.sc.escapes = self.prev;
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
