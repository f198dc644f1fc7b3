//! Reader for the associative statement language.
//!
//! Parses programs of the form:
//!
//! ```text
//! count = 3;
//! arr = [1, 2, 3];
//! b = count + 1;   // comment
//! ```
//!
//! Statements are assignments only; expressions cover literals (int,
//! double, bool, char, string, null), array literals, identifiers,
//! unary minus, and `+ - * /`. Everything richer is assembled through
//! the executable's builder API rather than parsed.

use crate::error::StrandError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLoc {
    pub line: usize,
    pub col: usize,
}

impl SourceLoc {
    pub fn new(line: usize, col: usize) -> Self {
        SourceLoc { line, col }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Int(i64),
    Double(f64),
    Str(String),
    Char(char),
    True,
    False,
    Null,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Semicolon,
    Comma,
    LBracket,
    RBracket,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenWithLoc {
    pub token: Token,
    pub loc: SourceLoc,
}

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Expression tree of one statement's right-hand side.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLit(i64),
    DoubleLit(f64),
    BoolLit(bool),
    CharLit(char),
    StrLit(String),
    NullLit,
    Ident(String),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    ArrayLit(Vec<Expr>),
}

impl Expr {
    /// Collect the identifiers this expression reads, in first-use order.
    /// Drives dependency-graph edges.
    pub fn free_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, out: &mut Vec<String>) {
        match self {
            Expr::Ident(name) => {
                if !out.iter().any(|n| n == name) {
                    out.push(name.clone());
                }
            }
            Expr::Neg(inner) => inner.collect_names(out),
            Expr::Binary(_, lhs, rhs) => {
                lhs.collect_names(out);
                rhs.collect_names(out);
            }
            Expr::ArrayLit(elems) => {
                for e in elems {
                    e.collect_names(out);
                }
            }
            Expr::IntLit(_)
            | Expr::DoubleLit(_)
            | Expr::BoolLit(_)
            | Expr::CharLit(_)
            | Expr::StrLit(_)
            | Expr::NullLit => {}
        }
    }
}

/// One parsed assignment statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub target: String,
    pub expr: Expr,
    pub line: usize,
}

// =============================================================================
// Tokenizer
// =============================================================================

struct Tokenizer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    col: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str) -> Self {
        Tokenizer {
            chars: src.chars().peekable(),
            line: 1,
            col: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn tokenize(mut self) -> Result<Vec<TokenWithLoc>, StrandError> {
        let mut tokens = Vec::new();
        while let Some(&c) = self.chars.peek() {
            let loc = SourceLoc::new(self.line, self.col);
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.bump();
                }
                '/' => {
                    self.bump();
                    if self.chars.peek() == Some(&'/') {
                        while let Some(&c) = self.chars.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.bump();
                        }
                    } else {
                        tokens.push(TokenWithLoc {
                            token: Token::Slash,
                            loc,
                        });
                    }
                }
                '=' => {
                    self.bump();
                    tokens.push(TokenWithLoc {
                        token: Token::Assign,
                        loc,
                    });
                }
                '+' => {
                    self.bump();
                    tokens.push(TokenWithLoc {
                        token: Token::Plus,
                        loc,
                    });
                }
                '-' => {
                    self.bump();
                    tokens.push(TokenWithLoc {
                        token: Token::Minus,
                        loc,
                    });
                }
                '*' => {
                    self.bump();
                    tokens.push(TokenWithLoc {
                        token: Token::Star,
                        loc,
                    });
                }
                ';' => {
                    self.bump();
                    tokens.push(TokenWithLoc {
                        token: Token::Semicolon,
                        loc,
                    });
                }
                ',' => {
                    self.bump();
                    tokens.push(TokenWithLoc {
                        token: Token::Comma,
                        loc,
                    });
                }
                '[' => {
                    self.bump();
                    tokens.push(TokenWithLoc {
                        token: Token::LBracket,
                        loc,
                    });
                }
                ']' => {
                    self.bump();
                    tokens.push(TokenWithLoc {
                        token: Token::RBracket,
                        loc,
                    });
                }
                '(' => {
                    self.bump();
                    tokens.push(TokenWithLoc {
                        token: Token::LParen,
                        loc,
                    });
                }
                ')' => {
                    self.bump();
                    tokens.push(TokenWithLoc {
                        token: Token::RParen,
                        loc,
                    });
                }
                '"' => {
                    tokens.push(TokenWithLoc {
                        token: self.read_string()?,
                        loc,
                    });
                }
                '\'' => {
                    tokens.push(TokenWithLoc {
                        token: self.read_char()?,
                        loc,
                    });
                }
                c if c.is_ascii_digit() => {
                    tokens.push(TokenWithLoc {
                        token: self.read_number()?,
                        loc,
                    });
                }
                c if c.is_alphabetic() || c == '_' => {
                    tokens.push(TokenWithLoc {
                        token: self.read_ident(),
                        loc,
                    });
                }
                other => {
                    return Err(StrandError::syntax_error(
                        format!("unexpected character '{}'", other),
                        Some(self.line),
                    ));
                }
            }
        }
        Ok(tokens)
    }

    fn read_string(&mut self) -> Result<Token, StrandError> {
        self.bump(); // opening quote
        let mut s = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(Token::Str(s)),
                Some('\\') => match self.bump() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('"') => s.push('"'),
                    Some('\\') => s.push('\\'),
                    Some(other) => {
                        return Err(StrandError::syntax_error(
                            format!("unknown escape '\\{}'", other),
                            Some(self.line),
                        ))
                    }
                    None => {
                        return Err(StrandError::syntax_error(
                            "unterminated string",
                            Some(self.line),
                        ))
                    }
                },
                Some(c) => s.push(c),
                None => {
                    return Err(StrandError::syntax_error(
                        "unterminated string",
                        Some(self.line),
                    ))
                }
            }
        }
    }

    fn read_char(&mut self) -> Result<Token, StrandError> {
        self.bump(); // opening quote
        let c = self
            .bump()
            .ok_or_else(|| StrandError::syntax_error("unterminated character", Some(self.line)))?;
        match self.bump() {
            Some('\'') => Ok(Token::Char(c)),
            _ => Err(StrandError::syntax_error(
                "unterminated character",
                Some(self.line),
            )),
        }
    }

    fn read_number(&mut self) -> Result<Token, StrandError> {
        let mut text = String::new();
        let mut is_double = false;
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.bump();
            } else if c == '.' && !is_double {
                is_double = true;
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if is_double {
            text.parse::<f64>()
                .map(Token::Double)
                .map_err(|_| StrandError::syntax_error("malformed number", Some(self.line)))
        } else {
            text.parse::<i64>()
                .map(Token::Int)
                .map_err(|_| StrandError::syntax_error("integer overflow", Some(self.line)))
        }
    }

    fn read_ident(&mut self) -> Token {
        let mut text = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        match text.as_str() {
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            _ => Token::Ident(text),
        }
    }
}

// =============================================================================
// Parser
// =============================================================================

struct Parser {
    tokens: Vec<TokenWithLoc>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn line(&self) -> Option<usize> {
        self.tokens
            .get(self.pos.min(self.tokens.len().saturating_sub(1)))
            .map(|t| t.loc.line)
    }

    fn bump(&mut self) -> Option<TokenWithLoc> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn expect(&mut self, token: Token) -> Result<(), StrandError> {
        match self.bump() {
            Some(t) if t.token == token => Ok(()),
            Some(t) => Err(StrandError::syntax_error(
                format!("expected {:?}, found {:?}", token, t.token),
                Some(t.loc.line),
            )),
            None => Err(StrandError::syntax_error(
                format!("expected {:?}, found end of input", token),
                None,
            )),
        }
    }

    fn parse_program(&mut self) -> Result<Vec<Stmt>, StrandError> {
        let mut stmts = Vec::new();
        while self.peek().is_some() {
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, StrandError> {
        let (target, line) = match self.bump() {
            Some(TokenWithLoc {
                token: Token::Ident(name),
                loc,
            }) => (name, loc.line),
            Some(t) => {
                return Err(StrandError::syntax_error(
                    format!("expected identifier, found {:?}", t.token),
                    Some(t.loc.line),
                ))
            }
            None => return Err(StrandError::syntax_error("expected statement", None)),
        };
        self.expect(Token::Assign)?;
        let expr = self.parse_expr()?;
        self.expect(Token::Semicolon)?;
        Ok(Stmt { target, expr, line })
    }

    fn parse_expr(&mut self) -> Result<Expr, StrandError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, StrandError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, StrandError> {
        if self.peek() == Some(&Token::Minus) {
            self.bump();
            let inner = self.parse_unary()?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, StrandError> {
        let line = self.line();
        match self.bump().map(|t| t.token) {
            Some(Token::Int(n)) => Ok(Expr::IntLit(n)),
            Some(Token::Double(d)) => Ok(Expr::DoubleLit(d)),
            Some(Token::Str(s)) => Ok(Expr::StrLit(s)),
            Some(Token::Char(c)) => Ok(Expr::CharLit(c)),
            Some(Token::True) => Ok(Expr::BoolLit(true)),
            Some(Token::False) => Ok(Expr::BoolLit(false)),
            Some(Token::Null) => Ok(Expr::NullLit),
            Some(Token::Ident(name)) => Ok(Expr::Ident(name)),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::LBracket) => {
                let mut elems = Vec::new();
                if self.peek() == Some(&Token::RBracket) {
                    self.bump();
                    return Ok(Expr::ArrayLit(elems));
                }
                loop {
                    elems.push(self.parse_expr()?);
                    match self.bump().map(|t| t.token) {
                        Some(Token::Comma) => continue,
                        Some(Token::RBracket) => break,
                        _ => {
                            return Err(StrandError::syntax_error(
                                "expected ',' or ']' in array literal",
                                line,
                            ))
                        }
                    }
                }
                Ok(Expr::ArrayLit(elems))
            }
            Some(other) => Err(StrandError::syntax_error(
                format!("unexpected token {:?}", other),
                line,
            )),
            None => Err(StrandError::syntax_error("unexpected end of input", None)),
        }
    }
}

/// Parse a program: zero or more `name = expr;` statements.
pub fn parse_program(src: &str) -> Result<Vec<Stmt>, StrandError> {
    let tokens = Tokenizer::new(src).tokenize()?;
    Parser { tokens, pos: 0 }.parse_program()
}
