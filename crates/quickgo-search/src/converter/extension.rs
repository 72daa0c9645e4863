//! Parser for the boolean mini-language accepted by the extension filter.
//!
//! A value such as `occurs_in(CL:0000001) AND part_of(UBERON:0000955) OR x`
//! is split on the literal `AND`/`OR` keywords; `AND` binds tighter, so the
//! example reads as `(occurs_in AND part_of) OR x`. Each operand becomes a
//! "contains" leaf on the extension field.

use crate::error::{FilterError, FilterResult};
use crate::fields::EXTENSION;
use crate::query::QuickGoQuery;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Operand(String),
    And,
    Or,
}

/// Parse one extension value into a query over the extension field.
pub fn parse_extension(value: &str) -> FilterResult<QuickGoQuery> {
    let tokens = tokenize(value);
    if tokens.is_empty() {
        return Err(FilterError::InvalidArgument(
            "Extension value cannot be empty".to_string(),
        ));
    }

    let mut parser = Parser::new(tokens);
    let query = parser.parse_or()?;
    match parser.peek() {
        None => Ok(query),
        Some(token) => Err(unexpected(value, token)),
    }
}

/// Keywords are matched case-sensitively; adjacent words between keywords
/// form one operand.
fn tokenize(value: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut words: Vec<&str> = Vec::new();

    for word in value.split_whitespace() {
        let keyword = match word {
            "AND" => Some(Token::And),
            "OR" => Some(Token::Or),
            _ => None,
        };
        match keyword {
            Some(keyword) => {
                if !words.is_empty() {
                    tokens.push(Token::Operand(words.join(" ")));
                    words.clear();
                }
                tokens.push(keyword);
            }
            None => words.push(word),
        }
    }
    if !words.is_empty() {
        tokens.push(Token::Operand(words.join(" ")));
    }
    tokens
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse_or(&mut self) -> FilterResult<QuickGoQuery> {
        let mut terms = vec![self.parse_and()?];
        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            terms.push(self.parse_and()?);
        }
        QuickGoQuery::or(terms)
    }

    fn parse_and(&mut self) -> FilterResult<QuickGoQuery> {
        let mut operands = vec![self.parse_operand()?];
        while matches!(self.peek(), Some(Token::And)) {
            self.advance();
            operands.push(self.parse_operand()?);
        }
        QuickGoQuery::and(operands)
    }

    fn parse_operand(&mut self) -> FilterResult<QuickGoQuery> {
        match self.advance() {
            Some(Token::Operand(text)) => QuickGoQuery::create_contain_query(EXTENSION, &text),
            Some(token) => Err(FilterError::InvalidArgument(format!(
                "Expected an extension term but found {token:?}"
            ))),
            None => Err(FilterError::InvalidArgument(
                "Extension value ends with a dangling operator".to_string(),
            )),
        }
    }
}

fn unexpected(value: &str, token: &Token) -> FilterError {
    FilterError::InvalidArgument(format!(
        "Unexpected {token:?} in extension value '{value}'"
    ))
}
