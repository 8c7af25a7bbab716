//! Expression parser for questions and candidate answers
//!
//! Accepts the notation models and students actually write:
//! `2x + 3`, `x^2`, `x**2`, `3(x - 1)`, `(x+1)(x-1)`, `1/2`, `0.25`,
//! `sqrt(9)`, `−4` (Unicode minus), `6 × 7`, `8 ÷ 2`.
//!
//! Juxtaposition is multiplication. A run of letters is read letter by
//! letter (`xy` is `x * y`) unless it names a supported function.
//! Decimal literals are converted to exact rationals.

use crate::verifier::error::{SymbolicError, SymbolicResult};
use num_bigint::BigInt;
use num_rational::BigRational;
use std::collections::BTreeSet;

/// Nesting limit for parentheses and unary chains.
const MAX_DEPTH: usize = 128;

/// Names that would be misread as products of single-letter symbols.
const UNSUPPORTED_NAMES: &[&str] = &[
    "pi", "sin", "cos", "tan", "cot", "sec", "csc", "log", "ln", "exp", "lim", "inf",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sqrt,
    Abs,
}

impl Func {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "sqrt" => Some(Self::Sqrt),
            "abs" => Some(Self::Abs),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(BigRational),
    Symbol(String),
    Func(Func),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

impl Token {
    /// Tokens that can begin an implicit product such as `2x` or `x(x+1)`.
    fn starts_factor(&self) -> bool {
        matches!(
            self,
            Self::Number(_) | Self::Symbol(_) | Self::Func(_) | Self::LParen
        )
    }
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(BigRational),
    Symbol(String),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
}

impl Expr {
    pub fn integer(value: i64) -> Self {
        Self::Number(BigRational::from_integer(BigInt::from(value)))
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Self::Symbol(name.into())
    }

    /// Free symbols, sorted.
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Number(_) => {}
            Self::Symbol(name) => {
                out.insert(name.clone());
            }
            Self::Neg(inner) | Self::Call(_, inner) => inner.collect_symbols(out),
            Self::Add(a, b)
            | Self::Sub(a, b)
            | Self::Mul(a, b)
            | Self::Div(a, b)
            | Self::Pow(a, b) => {
                a.collect_symbols(out);
                b.collect_symbols(out);
            }
        }
    }
}

/// Parse a full expression. Trailing input is an error.
pub fn parse_expr(input: &str) -> SymbolicResult<Expr> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(SymbolicError::parse(input, 0, "empty expression"));
    }
    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(SymbolicError::parse(
            input,
            parser.pos,
            "unexpected trailing input",
        ));
    }
    Ok(expr)
}

fn tokenize(input: &str) -> SymbolicResult<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => {
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                tokens.push(Token::Number(parse_decimal(input, start, &literal)?));
            }
            c if c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_alphabetic() {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let lower = word.to_ascii_lowercase();
                if let Some(func) = Func::from_name(&lower) {
                    tokens.push(Token::Func(func));
                } else if UNSUPPORTED_NAMES.contains(&lower.as_str()) {
                    return Err(SymbolicError::unsupported(format!("function or constant `{word}`")));
                } else {
                    tokens.extend(word.chars().map(|ch| Token::Symbol(ch.to_string())));
                }
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' | '\u{2212}' | '\u{2013}' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Caret);
                i += 2;
            }
            '*' | '\u{00d7}' | '\u{00b7}' | '\u{22c5}' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' | '\u{00f7}' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Caret);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            other => {
                return Err(SymbolicError::parse(
                    input,
                    i,
                    format!("unexpected character {other:?}"),
                ));
            }
        }
    }

    Ok(tokens)
}

/// `"12.50"` → 25/2, exactly.
fn parse_decimal(input: &str, position: usize, literal: &str) -> SymbolicResult<BigRational> {
    let bad = |reason: &str| SymbolicError::parse(input, position, reason.to_string());
    let (whole, frac) = match literal.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (literal, ""),
    };
    if frac.contains('.') {
        return Err(bad("malformed number"));
    }
    if whole.is_empty() && frac.is_empty() {
        return Err(bad("lone decimal point"));
    }
    let digits = format!("{whole}{frac}");
    let numerator: BigInt = digits.parse().map_err(|_| bad("malformed number"))?;
    let denominator = BigInt::from(10u32).pow(frac.len() as u32);
    Ok(BigRational::new(numerator, denominator))
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, reason: impl Into<String>) -> SymbolicError {
        SymbolicError::parse(self.input, self.pos, reason)
    }

    fn enter(&mut self) -> SymbolicResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(SymbolicError::unsupported("expression nested too deeply"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn expr(&mut self) -> SymbolicResult<Expr> {
        let mut lhs = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    lhs = Expr::Add(Box::new(lhs), Box::new(self.term()?));
                }
                Some(Token::Minus) => {
                    self.advance();
                    lhs = Expr::Sub(Box::new(lhs), Box::new(self.term()?));
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn term(&mut self) -> SymbolicResult<Expr> {
        let mut lhs = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    lhs = Expr::Mul(Box::new(lhs), Box::new(self.unary()?));
                }
                Some(Token::Slash) => {
                    self.advance();
                    lhs = Expr::Div(Box::new(lhs), Box::new(self.unary()?));
                }
                Some(token) if token.starts_factor() => {
                    lhs = Expr::Mul(Box::new(lhs), Box::new(self.power()?));
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn unary(&mut self) -> SymbolicResult<Expr> {
        self.enter()?;
        let result = match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                self.unary().map(|inner| Expr::Neg(Box::new(inner)))
            }
            Some(Token::Plus) => {
                self.advance();
                self.unary()
            }
            _ => self.power(),
        };
        self.leave();
        result
    }

    fn power(&mut self) -> SymbolicResult<Expr> {
        let base = self.atom()?;
        if matches!(self.peek(), Some(Token::Caret)) {
            self.advance();
            let exponent = self.unary()?;
            return Ok(Expr::Pow(Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn atom(&mut self) -> SymbolicResult<Expr> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::Symbol(name)) => Ok(Expr::Symbol(name)),
            Some(Token::Func(func)) => {
                if !matches!(self.advance(), Some(Token::LParen)) {
                    return Err(self.error("expected '(' after function name"));
                }
                let arg = self.group()?;
                Ok(Expr::Call(func, Box::new(arg)))
            }
            Some(Token::LParen) => self.group(),
            Some(_) => Err(self.error("expected a number, symbol, or '('")),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    /// Body of a parenthesised group; the opening paren is already consumed.
    fn group(&mut self) -> SymbolicResult<Expr> {
        self.enter()?;
        let inner = self.expr();
        self.leave();
        let inner = inner?;
        if !matches!(self.advance(), Some(Token::RParen)) {
            return Err(self.error("expected ')'"));
        }
        Ok(inner)
    }
}

/// `numer/denom` as an exact rational.
#[cfg(test)]
pub(crate) fn rational(numer: i64, denom: i64) -> BigRational {
    BigRational::new(BigInt::from(numer), BigInt::from(denom))
}
