//! Recursive descent parser for the RSQL/FIQL grammar.
//!
//! ```text
//! or         = and { ( "," | " or " ) and }
//! and        = constraint { ( ";" | " and " ) constraint }
//! constraint = "(" or ")" | comparison
//! comparison = selector operator argument
//! operator   = "==" | "!=" | "=" ALPHA+ "="
//! argument   = "(" value { "," value } ")" | value
//! value      = unreserved+ | "'" chars "'" | '"' chars '"'
//! ```

use crate::ast::{is_reserved, Comparison, Node};
use crate::error::{ParseError, Result};

pub struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn parse(mut self) -> Result<Node> {
        self.skip_whitespace();
        if self.at_end() {
            return Err(self.error("empty expression"));
        }
        let node = self.parse_or()?;
        self.skip_whitespace();
        if !self.at_end() {
            let c = self.current_char();
            return Err(self.error(&format!("unexpected character '{c}'")));
        }
        Ok(node)
    }

    fn parse_or(&mut self) -> Result<Node> {
        let mut nodes = vec![self.parse_and()?];
        while self.match_separator(',', "or") {
            nodes.push(self.parse_and()?);
        }
        Ok(collapse(nodes, Node::Or))
    }

    fn parse_and(&mut self) -> Result<Node> {
        let mut nodes = vec![self.parse_constraint()?];
        while self.match_separator(';', "and") {
            nodes.push(self.parse_constraint()?);
        }
        Ok(collapse(nodes, Node::And))
    }

    fn parse_constraint(&mut self) -> Result<Node> {
        self.skip_whitespace();

        if self.match_char('(') {
            let node = self.parse_or()?;
            self.skip_whitespace();
            if !self.match_char(')') {
                return Err(self.error("expected ')'"));
            }
            return Ok(node);
        }

        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Node> {
        let selector = self.parse_unreserved("selector")?;
        let operator = self.parse_operator()?;
        let arguments = self.parse_arguments()?;

        Ok(Node::Comparison(Comparison {
            selector,
            operator,
            arguments,
        }))
    }

    fn parse_operator(&mut self) -> Result<String> {
        if self.match_str("==") {
            return Ok("==".to_string());
        }
        if self.match_str("!=") {
            return Ok("!=".to_string());
        }

        let start = self.pos;
        if self.match_char('=') {
            while !self.at_end() && self.current_char().is_ascii_alphabetic() {
                self.pos += 1;
            }
            if self.pos > start + 1 && self.match_char('=') {
                return Ok(self.input[start..self.pos].to_string());
            }
        }

        self.pos = start;
        Err(self.error("expected comparison operator (==, !=, =name=)"))
    }

    fn parse_arguments(&mut self) -> Result<Vec<String>> {
        if !self.match_char('(') {
            return Ok(vec![self.parse_value()?]);
        }

        self.skip_whitespace();
        if self.current_char() == ')' {
            return Err(self.error("empty argument group"));
        }

        let mut values = Vec::new();
        loop {
            self.skip_whitespace();
            values.push(self.parse_value()?);
            self.skip_whitespace();
            if self.match_char(',') {
                continue;
            }
            if self.match_char(')') {
                return Ok(values);
            }
            return Err(self.error("expected ',' or ')' in argument group"));
        }
    }

    fn parse_value(&mut self) -> Result<String> {
        match self.current_char() {
            q @ ('"' | '\'') => {
                self.pos += 1;
                self.parse_quoted(q)
            }
            _ => self.parse_unreserved("argument"),
        }
    }

    fn parse_quoted(&mut self, quote: char) -> Result<String> {
        let start = self.pos - 1;
        let mut value = String::new();
        let mut escaped = false;

        while !self.at_end() {
            let c = self.current_char();
            self.pos += c.len_utf8();
            if escaped {
                value.push(c);
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                return Ok(value);
            } else {
                value.push(c);
            }
        }

        Err(ParseError::new("unterminated quoted argument", start))
    }

    fn parse_unreserved(&mut self, what: &str) -> Result<String> {
        let start = self.pos;
        while !self.at_end() && !is_reserved(self.current_char()) {
            self.pos += self.current_char().len_utf8();
        }
        if self.pos == start {
            return Err(self.error(&format!("expected {what}")));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    /// Consumes a symbolic separator, or a whitespace-delimited keyword.
    fn match_separator(&mut self, symbol: char, keyword: &str) -> bool {
        let saved = self.pos;
        self.skip_whitespace();
        if self.match_char(symbol) {
            return true;
        }
        if self.pos > saved && self.match_keyword(keyword) {
            return true;
        }
        self.pos = saved;
        false
    }

    fn match_keyword(&mut self, kw: &str) -> bool {
        let remaining = &self.input[self.pos..];
        if remaining.len() <= kw.len() || !remaining.is_char_boundary(kw.len()) {
            return false;
        }
        if !remaining[..kw.len()].eq_ignore_ascii_case(kw) {
            return false;
        }
        let after = remaining[kw.len()..].chars().next();
        if after.is_some_and(|c| c.is_whitespace() || c == '(') {
            self.pos += kw.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.at_end() && self.current_char().is_whitespace() {
            self.pos += self.current_char().len_utf8();
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn current_char(&self) -> char {
        self.input[self.pos..].chars().next().unwrap_or('\0')
    }

    fn match_char(&mut self, c: char) -> bool {
        if !self.at_end() && self.current_char() == c {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn match_str(&mut self, s: &str) -> bool {
        if self.input[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn error(&self, message: &str) -> ParseError {
        ParseError::new(message, self.pos)
    }
}

fn collapse(mut nodes: Vec<Node>, group: fn(Vec<Node>) -> Node) -> Node {
    if nodes.len() == 1 {
        nodes.remove(0)
    } else {
        group(nodes)
    }
}

/// Parses an RSQL expression into a [`Node`] tree.
pub fn parse(input: &str) -> Result<Node> {
    Parser::new(input).parse()
}
