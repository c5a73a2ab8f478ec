//! Single-variable expression parser.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! sum     := product (("+" | "-") product)*
//! product := unary (("*" | "/") unary | unary)*      -- juxtaposition multiplies
//! unary   := ("-" | "+") unary | power
//! power   := atom (("^" | "**") unary)?               -- right associative
//! atom    := number | "x" | "pi" | "e" | func "(" sum ")" | "(" sum ")"
//! ```

use crate::error::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Exp,
    Ln,
    Sqrt,
    Abs,
}

impl Func {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Func::Sin),
            "cos" => Some(Func::Cos),
            "tan" => Some(Func::Tan),
            "exp" => Some(Func::Exp),
            "ln" | "log" => Some(Func::Ln),
            "sqrt" => Some(Func::Sqrt),
            "abs" => Some(Func::Abs),
            _ => None,
        }
    }

    fn apply(self, v: f64) -> f64 {
        match self {
            Func::Sin => v.sin(),
            Func::Cos => v.cos(),
            Func::Tan => v.tan(),
            Func::Exp => v.exp(),
            Func::Ln => v.ln(),
            Func::Sqrt => v.sqrt(),
            Func::Abs => v.abs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    X,
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
}

impl Expr {
    pub fn parse(input: &str) -> Result<Self, ToolError> {
        let tokens = tokenize(input)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.sum()?;
        match parser.peek() {
            None => Ok(expr),
            Some(t) => Err(parser.error(t.position, "unexpected trailing input")),
        }
    }

    /// Value at `x`; may be NaN or infinite outside the domain.
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Expr::Num(n) => *n,
            Expr::X => x,
            Expr::Neg(e) => -e.eval(x),
            Expr::Add(a, b) => a.eval(x) + b.eval(x),
            Expr::Sub(a, b) => a.eval(x) - b.eval(x),
            Expr::Mul(a, b) => a.eval(x) * b.eval(x),
            Expr::Div(a, b) => a.eval(x) / b.eval(x),
            Expr::Pow(a, b) => a.eval(x).powf(b.eval(x)),
            Expr::Call(f, e) => f.apply(e.eval(x)),
        }
    }

    pub fn uses_x(&self) -> bool {
        match self {
            Expr::Num(_) => false,
            Expr::X => true,
            Expr::Neg(e) | Expr::Call(_, e) => e.uses_x(),
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b) => a.uses_x() || b.uses_x(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    position: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ToolError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (position, c) = chars[i];
        let kind = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].1.is_ascii_digit() || chars[i].1 == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().map(|(_, c)| c).collect();
                let value = literal.parse::<f64>().map_err(|_| ToolError::Parse {
                    position,
                    message: format!("invalid number '{}'", literal),
                })?;
                tokens.push(Token {
                    kind: TokenKind::Num(value),
                    position,
                });
                continue;
            }
            c if c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len() && chars[i].1.is_ascii_alphabetic() {
                    i += 1;
                }
                let name: String = chars[start..i].iter().map(|(_, c)| c).collect();
                tokens.push(Token {
                    kind: TokenKind::Ident(name.to_lowercase()),
                    position,
                });
                continue;
            }
            '+' => TokenKind::Plus,
            '-' | '−' => TokenKind::Minus,
            '*' if chars.get(i + 1).map(|(_, c)| *c) == Some('*') => {
                i += 1;
                TokenKind::Caret
            }
            '*' | '×' | '·' => TokenKind::Star,
            '/' | '÷' => TokenKind::Slash,
            '^' => TokenKind::Caret,
            '(' | '[' => TokenKind::LParen,
            ')' | ']' => TokenKind::RParen,
            other => {
                return Err(ToolError::Parse {
                    position,
                    message: format!("unexpected character '{}'", other),
                });
            }
        };
        tokens.push(Token { kind, position });
        i += 1;
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn end_position(&self) -> usize {
        self.tokens.last().map_or(0, |t| t.position + 1)
    }

    fn error(&self, position: usize, message: &str) -> ToolError {
        ToolError::Parse {
            position,
            message: message.to_string(),
        }
    }

    fn sum(&mut self) -> Result<Expr, ToolError> {
        let mut left = self.product()?;
        loop {
            match self.peek_kind() {
                Some(TokenKind::Plus) => {
                    self.pos += 1;
                    left = Expr::Add(Box::new(left), Box::new(self.product()?));
                }
                Some(TokenKind::Minus) => {
                    self.pos += 1;
                    left = Expr::Sub(Box::new(left), Box::new(self.product()?));
                }
                _ => return Ok(left),
            }
        }
    }

    fn product(&mut self) -> Result<Expr, ToolError> {
        let mut left = self.unary()?;
        loop {
            match self.peek_kind() {
                Some(TokenKind::Star) => {
                    self.pos += 1;
                    left = Expr::Mul(Box::new(left), Box::new(self.unary()?));
                }
                Some(TokenKind::Slash) => {
                    self.pos += 1;
                    left = Expr::Div(Box::new(left), Box::new(self.unary()?));
                }
                Some(TokenKind::Num(_) | TokenKind::Ident(_) | TokenKind::LParen) => {
                    left = Expr::Mul(Box::new(left), Box::new(self.power()?));
                }
                _ => return Ok(left),
            }
        }
    }

    fn unary(&mut self) -> Result<Expr, ToolError> {
        match self.peek_kind() {
            Some(TokenKind::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(TokenKind::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, ToolError> {
        let base = self.atom()?;
        if matches!(self.peek_kind(), Some(TokenKind::Caret)) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(Expr::Pow(Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr, ToolError> {
        let end = self.end_position();
        let token = self
            .next()
            .ok_or_else(|| self.error(end, "unexpected end of expression"))?;

        match token.kind {
            TokenKind::Num(n) => Ok(Expr::Num(n)),
            TokenKind::LParen => {
                let inner = self.sum()?;
                self.expect_close(token.position)?;
                Ok(inner)
            }
            TokenKind::Ident(name) => match name.as_str() {
                "x" => Ok(Expr::X),
                "pi" => Ok(Expr::Num(std::f64::consts::PI)),
                "e" => Ok(Expr::Num(std::f64::consts::E)),
                _ => {
                    let func = Func::from_name(&name).ok_or_else(|| {
                        self.error(token.position, &format!("unknown name '{}'", name))
                    })?;
                    match self.next() {
                        Some(Token {
                            kind: TokenKind::LParen,
                            position,
                        }) => {
                            let arg = self.sum()?;
                            self.expect_close(position)?;
                            Ok(Expr::Call(func, Box::new(arg)))
                        }
                        _ => Err(self.error(
                            token.position,
                            &format!("expected '(' after '{}'", name),
                        )),
                    }
                }
            },
            _ => Err(self.error(token.position, "expected a number, 'x' or '('")),
        }
    }

    fn expect_close(&mut self, open_position: usize) -> Result<(), ToolError> {
        match self.next() {
            Some(Token {
                kind: TokenKind::RParen,
                ..
            }) => Ok(()),
            _ => Err(self.error(open_position, "unclosed parenthesis")),
        }
    }
}
