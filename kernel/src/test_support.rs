//! A small s-expression reader for building terms in tests.
//!
//! ```text
//! 3                      bound variable (de Bruijn index)
//! Prop | Type | Foo      sorts and constants
//! (sort n)               universe n
//! (pi x A B)             explicit binder; ipi / spi / instpi for the others
//! (lam x A b)            lambda; ilam / slam / instlam likewise
//! (let x T v b)          local definition
//! (app f a b ...)        left-nested application
//! (-> A B)               non-dependent arrow
//! ```
//!
//! A binder named `_` is anonymous.

use crate::ast::{BinderInfo, Level, Term};
use crate::name::Name;
use std::iter::Peekable;
use std::rc::Rc;
use std::str::Chars;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unexpected EOF")]
    UnexpectedEof,
    #[error("Expected {0}")]
    Expected(String),
    #[error("Unknown token: {0}")]
    UnknownToken(String),
    #[error("Integer literal out of range: {0}")]
    IntOutOfRange(String),
    #[error("Trailing input after term")]
    TrailingInput,
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    Symbol(String),
    Int(usize),
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Lexer {
            chars: input.chars().peekable(),
        }
    }

    fn next_token(&mut self) -> Option<Result<Token, ParseError>> {
        self.skip_whitespace();
        let c = self.chars.next()?;
        match c {
            '(' => Some(Ok(Token::LParen)),
            ')' => Some(Ok(Token::RParen)),
            c if c.is_ascii_digit() => {
                let mut s = String::new();
                s.push(c);
                while let Some(&c) = self.chars.peek() {
                    if !c.is_ascii_digit() {
                        break;
                    }
                    s.push(c);
                    self.chars.next();
                }
                Some(s.parse().map(Token::Int).map_err(|_| ParseError::IntOutOfRange(s)))
            }
            c => {
                let mut s = String::new();
                s.push(c);
                while let Some(&c) = self.chars.peek() {
                    if c.is_whitespace() || c == '(' || c == ')' {
                        break;
                    }
                    s.push(c);
                    self.chars.next();
                }
                Some(Ok(Token::Symbol(s)))
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

/// Parse a complete term, rejecting trailing input.
pub fn parse_term(input: &str) -> Result<Rc<Term>, ParseError> {
    let mut parser = Parser::new(input);
    let term = parser.parse_term()?;
    match parser.lexer.next_token() {
        None => Ok(term),
        Some(_) => Err(ParseError::TrailingInput),
    }
}

fn binder_form(head: &str) -> Option<(&'static str, BinderInfo)> {
    let form = match head {
        "pi" => ("pi", BinderInfo::Default),
        "ipi" => ("pi", BinderInfo::Implicit),
        "spi" => ("pi", BinderInfo::StrictImplicit),
        "instpi" => ("pi", BinderInfo::InstImplicit),
        "lam" => ("lam", BinderInfo::Default),
        "ilam" => ("lam", BinderInfo::Implicit),
        "slam" => ("lam", BinderInfo::StrictImplicit),
        "instlam" => ("lam", BinderInfo::InstImplicit),
        _ => return None,
    };
    Some(form)
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(input),
        }
    }

    pub fn parse_term(&mut self) -> Result<Rc<Term>, ParseError> {
        match self.lexer.next_token() {
            Some(Ok(Token::Int(n))) => Ok(Term::var(n)),
            Some(Ok(Token::Symbol(s))) => match s.as_str() {
                "Prop" => Ok(Term::prop()),
                "Type" => Ok(Term::sort(Level::one())),
                _ => Ok(Term::constant(s)),
            },
            Some(Ok(Token::LParen)) => {
                let head = self.expect_symbol()?;
                let term = self.parse_compound(head)?;
                self.expect_rparen()?;
                Ok(term)
            }
            Some(Ok(Token::RParen)) => Err(ParseError::Expected("term".to_string())),
            Some(Err(e)) => Err(e),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn parse_compound(&mut self, head: String) -> Result<Rc<Term>, ParseError> {
        if let Some((kind, info)) = binder_form(&head) {
            let name = self.expect_binder_name()?;
            let ty = self.parse_term()?;
            let body = self.parse_term()?;
            return Ok(if kind == "pi" {
                Term::pi(name, ty, body, info)
            } else {
                Term::lam(name, ty, body, info)
            });
        }
        match head.as_str() {
            "let" => {
                let name = self.expect_binder_name()?;
                let ty = self.parse_term()?;
                let val = self.parse_term()?;
                let body = self.parse_term()?;
                Ok(Term::let_e(name, ty, val, body))
            }
            "app" => {
                let mut acc = self.parse_term()?;
                acc = Term::app(acc, self.parse_term()?);
                while !self.at_rparen() {
                    acc = Term::app(acc, self.parse_term()?);
                }
                Ok(acc)
            }
            "->" => {
                let dom = self.parse_term()?;
                let cod = self.parse_term()?;
                Ok(Term::arrow(dom, cod))
            }
            "sort" => {
                let n = self.expect_int()?;
                Ok(Term::sort(Level::from_nat(n)))
            }
            _ => Err(ParseError::UnknownToken(head)),
        }
    }

    fn at_rparen(&self) -> bool {
        let mut lookahead = self.lexer.chars.clone();
        while let Some(c) = lookahead.peek() {
            if c.is_whitespace() {
                lookahead.next();
            } else {
                return *c == ')';
            }
        }
        true
    }

    fn expect_binder_name(&mut self) -> Result<Name, ParseError> {
        let sym = self.expect_symbol()?;
        Ok(if sym == "_" { Name::Anonymous } else { Name::Str(sym) })
    }

    fn expect_symbol(&mut self) -> Result<String, ParseError> {
        match self.lexer.next_token() {
            Some(Ok(Token::Symbol(s))) => Ok(s),
            Some(Err(e)) => Err(e),
            None => Err(ParseError::UnexpectedEof),
            _ => Err(ParseError::Expected("symbol".to_string())),
        }
    }

    fn expect_rparen(&mut self) -> Result<(), ParseError> {
        match self.lexer.next_token() {
            Some(Ok(Token::RParen)) => Ok(()),
            Some(Err(e)) => Err(e),
            None => Err(ParseError::UnexpectedEof),
            _ => Err(ParseError::Expected(")".to_string())),
        }
    }

    fn expect_int(&mut self) -> Result<usize, ParseError> {
        match self.lexer.next_token() {
            Some(Ok(Token::Int(n))) => Ok(n),
            Some(Err(e)) => Err(e),
            None => Err(ParseError::UnexpectedEof),
            _ => Err(ParseError::Expected("integer".to_string())),
        }
    }
}
