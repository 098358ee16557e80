//! Lexer and recursive-descent parser for matcher expressions
//!
//! Grammar, from loosest to tightest binding:
//!
//! ```text
//! or      := and ( '||' and )*
//! and     := cmp ( '&&' cmp )*
//! cmp     := unary ( ( '==' | '!=' ) unary )?
//! unary   := '!' unary | primary
//! primary := '(' or ')' | string | ident [ '(' args ')' ]
//! args    := or ( ',' or )*
//! ```
//!
//! Identifiers may contain dots (`r.sub`, `p2.obj`), which is how request
//! and policy attributes are referenced. String literals accept single or
//! double quotes.

use thiserror::Error;

/// Parse failures for matcher expressions
///
/// Offsets are byte positions into the matcher text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A character that cannot start any token
    #[error("Unexpected character `{ch}` at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    /// A string literal with no closing quote
    #[error("Unterminated string literal starting at offset {offset}")]
    UnterminatedString { offset: usize },

    /// A well-formed token in a position the grammar does not allow
    #[error("Unexpected token `{token}` at offset {offset}")]
    UnexpectedToken { token: String, offset: usize },

    /// The expression ended where more input was required
    #[error("Unexpected end of expression")]
    UnexpectedEnd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Str(String),
    LParen,
    RParen,
    Comma,
    AndAnd,
    OrOr,
    Not,
    EqEq,
    NotEq,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "{}", name),
            Token::Str(value) => write!(f, "\"{}\"", value),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::AndAnd => write!(f, "&&"),
            Token::OrOr => write!(f, "||"),
            Token::Not => write!(f, "!"),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
        }
    }
}

/// Parsed matcher expression tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A quoted string literal
    Str(String),
    /// An attribute reference such as `r.sub` or `p.obj`
    Attr(String),
    /// Boolean negation
    Not(Box<Expr>),
    /// Short-circuit conjunction
    And(Box<Expr>, Box<Expr>),
    /// Short-circuit disjunction
    Or(Box<Expr>, Box<Expr>),
    /// String or boolean equality
    Eq(Box<Expr>, Box<Expr>),
    /// String or boolean inequality
    Ne(Box<Expr>, Box<Expr>),
    /// A function call such as `keyMatch(r.obj, p.obj)` or `g(r.sub, p.sub)`
    Call(String, Vec<Expr>),
}

fn tokenize(text: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(offset, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push((Token::LParen, offset));
            }
            ')' => {
                chars.next();
                tokens.push((Token::RParen, offset));
            }
            ',' => {
                chars.next();
                tokens.push((Token::Comma, offset));
            }
            '&' => {
                chars.next();
                match chars.peek() {
                    Some(&(_, '&')) => {
                        chars.next();
                        tokens.push((Token::AndAnd, offset));
                    }
                    _ => return Err(ParseError::UnexpectedChar { ch: '&', offset }),
                }
            }
            '|' => {
                chars.next();
                match chars.peek() {
                    Some(&(_, '|')) => {
                        chars.next();
                        tokens.push((Token::OrOr, offset));
                    }
                    _ => return Err(ParseError::UnexpectedChar { ch: '|', offset }),
                }
            }
            '=' => {
                chars.next();
                match chars.peek() {
                    Some(&(_, '=')) => {
                        chars.next();
                        tokens.push((Token::EqEq, offset));
                    }
                    _ => return Err(ParseError::UnexpectedChar { ch: '=', offset }),
                }
            }
            '!' => {
                chars.next();
                match chars.peek() {
                    Some(&(_, '=')) => {
                        chars.next();
                        tokens.push((Token::NotEq, offset));
                    }
                    _ => tokens.push((Token::Not, offset)),
                }
            }
            quote @ ('"' | '\'') => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some((_, c)) if c == quote => break,
                        Some((_, c)) => value.push(c),
                        None => return Err(ParseError::UnterminatedString { offset }),
                    }
                }
                tokens.push((Token::Str(value), offset));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((Token::Ident(name), offset));
            }
            _ => return Err(ParseError::UnexpectedChar { ch, offset }),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn advance(&mut self) -> Option<(Token, usize)> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ParseError> {
        match self.advance() {
            Some((token, _)) if token == *expected => Ok(()),
            Some((token, offset)) => Err(ParseError::UnexpectedToken {
                token: token.to_string(),
                offset,
            }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::OrOr) {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_cmp()?;
        while self.peek() == Some(&Token::AndAnd) {
            self.advance();
            let right = self.parse_cmp()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_cmp(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_unary()?;
        match self.peek() {
            Some(&Token::EqEq) => {
                self.advance();
                let right = self.parse_unary()?;
                Ok(Expr::Eq(Box::new(left), Box::new(right)))
            }
            Some(&Token::NotEq) => {
                self.advance();
                let right = self.parse_unary()?;
                Ok(Expr::Ne(Box::new(left), Box::new(right)))
            }
            _ => Ok(left),
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.peek() == Some(&Token::Not) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.advance() {
            Some((Token::LParen, _)) => {
                let expr = self.parse_or()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Some((Token::Str(value), _)) => Ok(Expr::Str(value)),
            Some((Token::Ident(name), _)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.advance();
                    let args = self.parse_args()?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Attr(name))
                }
            }
            Some((token, offset)) => Err(ParseError::UnexpectedToken {
                token: token.to_string(),
                offset,
            }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    /// Parses a call argument list; the opening paren is already consumed
    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_or()?);
            match self.peek() {
                Some(&Token::Comma) => {
                    self.advance();
                }
                _ => break,
            }
        }
        self.expect(&Token::RParen)?;
        Ok(args)
    }
}

/// Parses a matcher expression into its tree form
pub fn parse(text: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(text)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if let Some((token, offset)) = parser.advance() {
        return Err(ParseError::UnexpectedToken {
            token: token.to_string(),
            offset,
        });
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(name: &str) -> Box<Expr> {
        Box::new(Expr::Attr(name.to_string()))
    }

    #[test]
    fn test_parse_equality() {
        let expr = parse("r.sub == p.sub").unwrap();
        assert_eq!(expr, Expr::Eq(attr("r.sub"), attr("p.sub")));
    }

    #[test]
    fn test_parse_and_chain() {
        let expr = parse("r.sub == p.sub && r.obj == p.obj && r.act == p.act").unwrap();
        // Left-associative: ((a && b) && c)
        let ab = Expr::And(
            Box::new(Expr::Eq(attr("r.sub"), attr("p.sub"))),
            Box::new(Expr::Eq(attr("r.obj"), attr("p.obj"))),
        );
        let expected = Expr::And(
            Box::new(ab),
            Box::new(Expr::Eq(attr("r.act"), attr("p.act"))),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_parse_or_binds_looser_than_and() {
        let expr = parse("a == b || c == d && e == f").unwrap();
        match expr {
            Expr::Or(_, right) => match *right {
                Expr::And(_, _) => {}
                other => panic!("expected And on the right, got {:?}", other),
            },
            other => panic!("expected Or at the top, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_not_and_parens() {
        let expr = parse("!(r.sub == p.sub)").unwrap();
        assert_eq!(
            expr,
            Expr::Not(Box::new(Expr::Eq(attr("r.sub"), attr("p.sub"))))
        );

        let expr = parse("!g(r.sub, p.sub)").unwrap();
        assert_eq!(
            expr,
            Expr::Not(Box::new(Expr::Call(
                "g".to_string(),
                vec![Expr::Attr("r.sub".to_string()), Expr::Attr("p.sub".to_string())],
            )))
        );
    }

    #[test]
    fn test_parse_call_with_domain() {
        let expr = parse("g(r.sub, p.sub, r.dom)").unwrap();
        match expr {
            Expr::Call(name, args) => {
                assert_eq!(name, "g");
                assert_eq!(args.len(), 3);
            }
            other => panic!("expected a call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_string_literals() {
        let expr = parse("r.act == \"read\"").unwrap();
        assert_eq!(
            expr,
            Expr::Eq(attr("r.act"), Box::new(Expr::Str("read".to_string())))
        );

        let expr = parse("r.act == 'write'").unwrap();
        assert_eq!(
            expr,
            Expr::Eq(attr("r.act"), Box::new(Expr::Str("write".to_string())))
        );
    }

    #[test]
    fn test_parse_not_equal() {
        let expr = parse("r.sub != 'anonymous'").unwrap();
        assert!(matches!(expr, Expr::Ne(_, _)));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse(""), Err(ParseError::UnexpectedEnd));
        assert!(matches!(
            parse("r.sub & p.sub"),
            Err(ParseError::UnexpectedChar { ch: '&', .. })
        ));
        assert!(matches!(
            parse("r.act == \"read"),
            Err(ParseError::UnterminatedString { .. })
        ));
        assert!(matches!(
            parse("r.sub == p.sub)"),
            Err(ParseError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse("g(r.sub, p.sub"),
            Err(ParseError::UnexpectedEnd)
        ));
    }

    #[test]
    fn test_parse_empty_call() {
        let expr = parse("anyRequest()").unwrap();
        assert_eq!(expr, Expr::Call("anyRequest".to_string(), Vec::new()));
    }
}
