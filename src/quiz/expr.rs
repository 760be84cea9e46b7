//! Single-variable real expressions.
//!
//! A nom tokenizer feeds a recursive-descent parser that builds an [`Expr`]
//! tree. Concatenation (`2x`, `x(x+1)`, `(x+1)(x-1)`, `2π`) is read as
//! multiplication, `^` is right-associative and binds tighter than unary minus.
//!
//! ```ignore
//! let expr = expr::parse("3(2x+1)^2")?;
//! assert_eq!(expr.eval(1.0), 27.0);
//! ```

use std::f64::consts::PI;

use nom::{
    branch::alt,
    character::complete::{char, digit0, digit1},
    combinator::{map, map_res, opt, recognize},
    sequence::pair,
    IResult,
};

use super::error::ExprError;

/// Nesting allowed through parentheses, signs and exponents.
pub const MAX_DEPTH: usize = 256;
/// Bounds the size of the tree, and with it the depth of left-leaning chains like `x+x+…`.
pub const MAX_TOKENS: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    X,
    Pi,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

// ============================================================================
// Tokenizer
// ============================================================================

/// `12`, `1.5`, `5.` and `.5`; signs are separate tokens.
fn number(input: &str) -> IResult<&str, Token> {
    map_res(
        recognize(alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        ))),
        |digits: &str| digits.parse::<f64>().map(Token::Number),
    )(input)
}

fn symbol(input: &str) -> IResult<&str, Token> {
    alt((
        map(char('x'), |_| Token::X),
        map(char('π'), |_| Token::Pi),
        map(char('+'), |_| Token::Plus),
        map(char('-'), |_| Token::Minus),
        map(char('*'), |_| Token::Star),
        map(char('/'), |_| Token::Slash),
        map(char('^'), |_| Token::Caret),
        map(char('('), |_| Token::LParen),
        map(char(')'), |_| Token::RParen),
    ))(input)
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut remaining = input.trim_start();

    while !remaining.is_empty() {
        match alt((number, symbol))(remaining) {
            Ok((rest, token)) => {
                tokens.push(token);
                remaining = rest.trim_start();
            }
            Err(_) => {
                let unexpected = remaining.chars().next().unwrap_or_default();
                return Err(ExprError::UnexpectedCharacter(unexpected));
            }
        }
    }

    Ok(tokens)
}

// ============================================================================
// AST
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    X,
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Evaluates the expression with `x` bound to the given value.
    /// Division by zero and similar yield non-finite results rather than errors.
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Expr::Number(n) => *n,
            Expr::X => x,
            Expr::Neg(inner) => -inner.eval(x),
            Expr::Add(l, r) => l.eval(x) + r.eval(x),
            Expr::Sub(l, r) => l.eval(x) - r.eval(x),
            Expr::Mul(l, r) => l.eval(x) * r.eval(x),
            Expr::Div(l, r) => l.eval(x) / r.eval(x),
            Expr::Pow(base, exp) => base.eval(x).powf(exp.eval(x)),
        }
    }

    pub fn has_variable(&self) -> bool {
        match self {
            Expr::Number(_) => false,
            Expr::X => true,
            Expr::Neg(inner) => inner.has_variable(),
            Expr::Add(l, r)
            | Expr::Sub(l, r)
            | Expr::Mul(l, r)
            | Expr::Div(l, r)
            | Expr::Pow(l, r) => l.has_variable() || r.has_variable(),
        }
    }
}

// ============================================================================
// Parser (recursive descent)
// ============================================================================

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ExprError> {
        match self.advance() {
            Some(tok) if tok == expected => Ok(()),
            Some(tok) => Err(ExprError::UnexpectedToken(tok.clone())),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_term()?;

        while let Some(tok) = self.peek() {
            match tok {
                Token::Plus => {
                    self.advance();
                    let right = self.parse_term()?;
                    left = Expr::Add(Box::new(left), Box::new(right));
                }
                Token::Minus => {
                    self.advance();
                    let right = self.parse_term()?;
                    left = Expr::Sub(Box::new(left), Box::new(right));
                }
                _ => break,
            }
        }

        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_unary()?;

        while let Some(tok) = self.peek() {
            match tok {
                Token::Star => {
                    self.advance();
                    let right = self.parse_unary()?;
                    left = Expr::Mul(Box::new(left), Box::new(right));
                }
                Token::Slash => {
                    self.advance();
                    let right = self.parse_unary()?;
                    left = Expr::Div(Box::new(left), Box::new(right));
                }
                // implicit multiplication
                Token::Number(_) | Token::X | Token::Pi | Token::LParen => {
                    let right = self.parse_power()?;
                    left = Expr::Mul(Box::new(left), Box::new(right));
                }
                _ => break,
            }
        }

        Ok(left)
    }

    /// Every recursive cycle (parentheses, signs, exponents, implicit products)
    /// passes through here, so this is where the nesting depth is counted.
    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::TooDeep(MAX_DEPTH));
        }
        let result = self.parse_signed();
        self.depth -= 1;
        result
    }

    fn parse_signed(&mut self) -> Result<Expr, ExprError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            Some(Token::Plus) => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr, ExprError> {
        let base = self.parse_atom()?;

        if let Some(Token::Caret) = self.peek() {
            self.advance();
            let exp = self.parse_unary()?;
            Ok(Expr::Pow(Box::new(base), Box::new(exp)))
        } else {
            Ok(base)
        }
    }

    fn parse_atom(&mut self) -> Result<Expr, ExprError> {
        match self.advance().cloned() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::X) => Ok(Expr::X),
            Some(Token::Pi) => Ok(Expr::Number(PI)),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(tok) => Err(ExprError::UnexpectedToken(tok)),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}

pub fn parse(input: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ExprError::Empty);
    }
    if tokens.len() > MAX_TOKENS {
        return Err(ExprError::TooLong(MAX_TOKENS));
    }

    let mut parser = Parser::new(&tokens);
    let expr = parser.parse_expr()?;

    match parser.peek() {
        None => Ok(expr),
        Some(tok) => Err(ExprError::UnexpectedToken(tok.clone())),
    }
}

/// Parses and evaluates an expression that must not mention `x`.
pub fn eval_constant(input: &str) -> Result<f64, ExprError> {
    let expr = parse(input)?;
    if expr.has_variable() {
        return Err(ExprError::NotConstant);
    }
    Ok(expr.eval(0.0))
}
