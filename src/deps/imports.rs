// src/deps/imports.rs

//! Extraction of import paths from Go source.
//!
//! Go requires every import declaration to follow the package clause and
//! precede any other top-level declaration, so only the file header is
//! scanned. Supported forms:
//!
//! ```go
//! package main
//!
//! import "fmt"
//! import alias "example.com/x/pkg/a"
//! import (
//!     _ "embed"
//!     . "example.com/x/pkg/b"
//!     `example.com/x/pkg/c`
//! )
//! ```

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportParseError {
    #[error("missing package clause")]
    MissingPackage,

    #[error("unterminated comment")]
    UnterminatedComment,

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unexpected input in import declaration at byte {0}")]
    Unexpected(usize),
}

/// Return every import path declared in `source`, in declaration order.
pub fn parse_imports(source: &str) -> Result<Vec<String>, ImportParseError> {
    let mut lexer = Lexer::new(source);

    lexer.skip_trivia()?;
    if lexer.ident() != Some("package") {
        return Err(ImportParseError::MissingPackage);
    }
    lexer.skip_trivia()?;
    if lexer.ident().is_none() {
        return Err(ImportParseError::MissingPackage);
    }

    let mut imports = Vec::new();
    loop {
        lexer.skip_trivia_and_semicolons()?;
        if !lexer.peek_keyword("import") {
            break;
        }
        lexer.ident();
        lexer.skip_trivia()?;

        if lexer.eat('(') {
            loop {
                lexer.skip_trivia_and_semicolons()?;
                if lexer.eat(')') {
                    break;
                }
                imports.push(lexer.import_spec()?);
            }
        } else {
            imports.push(lexer.import_spec()?);
        }
    }

    Ok(imports)
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        // Tolerate a UTF-8 byte order mark.
        let src = src.strip_prefix('\u{feff}').unwrap_or(src);
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) -> Result<(), ImportParseError> {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();

            if trimmed.starts_with("//") {
                let end = trimmed.find('\n').unwrap_or(trimmed.len());
                self.pos += end;
            } else if let Some(body) = trimmed.strip_prefix("/*") {
                let end = body.find("*/").ok_or(ImportParseError::UnterminatedComment)?;
                self.pos += 2 + end + 2;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_trivia_and_semicolons(&mut self) -> Result<(), ImportParseError> {
        loop {
            self.skip_trivia()?;
            if !self.eat(';') {
                return Ok(());
            }
        }
    }

    fn ident(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
            .map_or(rest.len(), |(i, _)| i);
        if len == 0 || rest.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
        self.pos += len;
        Some(&rest[..len])
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        self.rest()
            .strip_prefix(keyword)
            .is_some_and(|after| !after.starts_with(|c: char| c.is_alphanumeric() || c == '_'))
    }

    /// `[name | "_" | "."] path`
    fn import_spec(&mut self) -> Result<String, ImportParseError> {
        if !self.eat('.') {
            self.ident();
        }
        self.skip_trivia()?;
        match self.peek() {
            Some('"') => self.interpreted_string(),
            Some('`') => self.raw_string(),
            _ => Err(ImportParseError::Unexpected(self.pos)),
        }
    }

    fn interpreted_string(&mut self) -> Result<String, ImportParseError> {
        self.eat('"');
        let mut out = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 1;
                    return Ok(out);
                }
                '\\' => match chars.next() {
                    Some((_, escaped)) => out.push(escaped),
                    None => break,
                },
                '\n' => break,
                c => out.push(c),
            }
        }
        Err(ImportParseError::UnterminatedString)
    }

    fn raw_string(&mut self) -> Result<String, ImportParseError> {
        self.eat('`');
        let rest = self.rest();
        let end = rest.find('`').ok_or(ImportParseError::UnterminatedString)?;
        self.pos += end + 1;
        Ok(rest[..end].to_string())
    }
}
