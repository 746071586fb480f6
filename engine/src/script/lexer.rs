//! Line based, indentation aware tokenizer.
//!
//! Every non blank line produces its tokens followed by a [`TokenKind::Newline`]. Changes of
//! leading whitespace are reported as [`TokenKind::Indent`] and [`TokenKind::Dedent`] tokens
//! before the first token of the line. A file indents with tabs or with spaces; the first
//! indented line decides which.

use crate::{
    ecs::value::Operator,
    script::{
        error::{Error, ErrorKind},
        token::{Keyword, Token, TokenKind},
    },
};

/// Tokenize a whole source file.
pub fn tokenize(file: &str, source: &str) -> Result<Vec<Token>, Error> {
    Lexer::new(file).run(source)
}

struct Lexer<'a> {
    file: &'a str,
    tokens: Vec<Token>,
    indents: Vec<usize>,
    style: Option<char>,
}

impl<'a> Lexer<'a> {
    fn new(file: &'a str) -> Self {
        Self {
            file,
            tokens: Vec::new(),
            indents: vec![0],
            style: None,
        }
    }

    fn run(mut self, source: &str) -> Result<Vec<Token>, Error> {
        let mut last_line = 0;
        for (index, text) in source.lines().enumerate() {
            let line = index + 1;
            last_line = line;
            let chars: Vec<char> = text.chars().collect();
            let width = chars.iter().take_while(|c| **c == ' ' || **c == '\t').count();
            match chars.get(width) {
                None | Some('#') => continue,
                Some(_) => {}
            }
            self.indent(&chars[..width], line)?;
            self.line(&chars, width, line)?;
            self.push(TokenKind::Newline, "", line, chars.len() + 1);
        }

        let end = last_line + 1;
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(TokenKind::Dedent, "", end, 1);
        }
        self.push(TokenKind::Eof, "", end, 1);
        Ok(self.tokens)
    }

    fn current_indent(&self) -> usize {
        self.indents.last().copied().unwrap_or(0)
    }

    fn indent(&mut self, whitespace: &[char], line: usize) -> Result<(), Error> {
        if let Some(first) = whitespace.first() {
            let style = *self.style.get_or_insert(*first);
            if let Some(column) = whitespace.iter().position(|c| *c != style) {
                return Err(self.error(line, column + 1, ErrorKind::MixedIndent));
            }
        }

        let width = whitespace.len();
        if width > self.current_indent() {
            self.indents.push(width);
            self.push(TokenKind::Indent, "", line, 1);
            return Ok(());
        }
        while width < self.current_indent() {
            self.indents.pop();
            self.push(TokenKind::Dedent, "", line, 1);
        }
        if width != self.current_indent() {
            return Err(self.error(line, width + 1, ErrorKind::InconsistentIndent));
        }
        Ok(())
    }

    fn line(&mut self, chars: &[char], start: usize, line: usize) -> Result<(), Error> {
        let mut i = start;
        while let Some(&c) = chars.get(i) {
            let column = i + 1;
            let next = chars.get(i + 1).copied();
            match c {
                ' ' | '\t' => i += 1,
                '#' => break,
                '"' => i = self.string(chars, i, line)?,
                c if c.is_ascii_digit() => i = self.number(chars, i, line)?,
                '-' if next.is_some_and(|n| n.is_ascii_digit()) && self.expects_operand() => {
                    i = self.number(chars, i, line)?
                }
                c if c.is_alphabetic() || c == '_' => {
                    let end = scan(chars, i, |c| c.is_alphanumeric() || c == '_');
                    let text: String = chars[i..end].iter().collect();
                    let kind = Keyword::from_identifier(&text)
                        .map_or(TokenKind::Identifier, TokenKind::Keyword);
                    self.push(kind, text, line, column);
                    i = end;
                }
                _ => {
                    if let Some(n) = next {
                        let pair: String = [c, n].iter().collect();
                        if let Some(operator) = Operator::from_symbol(&pair) {
                            self.push(TokenKind::Operator(operator), pair, line, column);
                            i += 2;
                            continue;
                        }
                    }
                    let kind = match c {
                        '=' => TokenKind::Assign,
                        '(' => TokenKind::OpenParen,
                        ')' => TokenKind::CloseParen,
                        ',' => TokenKind::Comma,
                        '.' => TokenKind::Dot,
                        ':' => TokenKind::Colon,
                        _ => match Operator::from_symbol(c.encode_utf8(&mut [0; 4])) {
                            Some(operator) => TokenKind::Operator(operator),
                            None => {
                                return Err(self.error(
                                    line,
                                    column,
                                    ErrorKind::UnexpectedCharacter(c),
                                ));
                            }
                        },
                    };
                    self.push(kind, c, line, column);
                    i += 1;
                }
            }
        }
        Ok(())
    }

    /// Lex a string literal starting at the opening quote. Returns the index after the closing
    /// quote.
    fn string(&mut self, chars: &[char], start: usize, line: usize) -> Result<usize, Error> {
        let mut text = String::new();
        let mut i = start + 1;
        loop {
            match chars.get(i) {
                None => return Err(self.error(line, start + 1, ErrorKind::UnterminatedString)),
                Some('"') => break,
                Some('\\') => {
                    let escaped = match chars.get(i + 1) {
                        None => {
                            return Err(self.error(line, start + 1, ErrorKind::UnterminatedString));
                        }
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some(other) => *other,
                    };
                    text.push(escaped);
                    i += 2;
                }
                Some(c) => {
                    text.push(*c);
                    i += 1;
                }
            }
        }
        self.push(TokenKind::String, text, line, start + 1);
        Ok(i + 1)
    }

    /// Lex a number, optionally negative. A fractional part makes it a `Number`, otherwise it is
    /// an `Integer`. Integers must fit an `i64` and numbers must be finite.
    fn number(&mut self, chars: &[char], start: usize, line: usize) -> Result<usize, Error> {
        let digits = if chars[start] == '-' { start + 1 } else { start };
        let mut end = scan(chars, digits, |c| c.is_ascii_digit());
        let mut kind = TokenKind::Integer;
        if chars.get(end) == Some(&'.') && chars.get(end + 1).is_some_and(|c| c.is_ascii_digit()) {
            end = scan(chars, end + 1, |c| c.is_ascii_digit());
            kind = TokenKind::Number;
        }
        let text: String = chars[start..end].iter().collect();
        let in_range = match kind {
            TokenKind::Integer => text.parse::<i64>().is_ok(),
            _ => text.parse::<f64>().is_ok_and(f64::is_finite),
        };
        if !in_range {
            return Err(self.error(line, start + 1, ErrorKind::LiteralOutOfRange(text)));
        }
        self.push(kind, text, line, start + 1);
        Ok(end)
    }

    fn expects_operand(&self) -> bool {
        self.tokens
            .last()
            .is_none_or(|token| !token.kind.ends_operand())
    }

    fn push(&mut self, kind: TokenKind, text: impl Into<String>, line: usize, column: usize) {
        self.tokens.push(Token::new(kind, text, line, column));
    }

    fn error(&self, line: usize, column: usize, kind: ErrorKind) -> Error {
        Error::new(self.file, line, column, kind)
    }
}

fn scan(chars: &[char], start: usize, accept: impl Fn(char) -> bool) -> usize {
    chars[start..]
        .iter()
        .position(|c| !accept(*c))
        .map_or(chars.len(), |offset| start + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize("test.pivotscript", source)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    fn error(source: &str) -> (usize, usize, ErrorKind) {
        let error = tokenize("test.pivotscript", source).unwrap_err();
        (error.line, error.column, error.kind)
    }

    #[test]
    fn system_header() {
        use TokenKind as T;
        assert_eq!(
            kinds("system rename(e<Tag>) event ChangeName(String name)"),
            vec![
                T::Keyword(Keyword::System),
                T::Identifier,
                T::OpenParen,
                T::Identifier,
                T::Operator(Operator::Lt),
                T::Identifier,
                T::Operator(Operator::Gt),
                T::CloseParen,
                T::Keyword(Keyword::Event),
                T::Identifier,
                T::OpenParen,
                T::Identifier,
                T::Identifier,
                T::CloseParen,
                T::Newline,
                T::Eof,
            ]
        );
    }

    #[test]
    fn blocks_are_bracketed_by_indents() {
        use TokenKind as T;

        // Given
        let source = "if a:\n    if b:\n        pass\n\n    # done\nc = 1\n";

        // When
        let kinds = kinds(source);

        // Then
        assert_eq!(
            kinds,
            vec![
                T::Keyword(Keyword::If),
                T::Identifier,
                T::Colon,
                T::Newline,
                T::Indent,
                T::Keyword(Keyword::If),
                T::Identifier,
                T::Colon,
                T::Newline,
                T::Indent,
                T::Keyword(Keyword::Pass),
                T::Newline,
                T::Dedent,
                T::Dedent,
                T::Identifier,
                T::Assign,
                T::Integer,
                T::Newline,
                T::Eof,
            ]
        );
    }

    #[test]
    fn open_blocks_close_at_end_of_file() {
        let kinds = kinds("while true\n\tpass");
        assert_eq!(
            &kinds[kinds.len() - 3..],
            &[TokenKind::Newline, TokenKind::Dedent, TokenKind::Eof]
        );
    }

    #[test]
    fn literals() {
        let tokens = tokenize("f", "x = \"a \\\"b\\\"\", 2.5, -3, y-1, 7.").unwrap();
        let lexed: Vec<_> = tokens
            .iter()
            .map(|token| (token.kind, token.text.as_str()))
            .collect();
        assert_eq!(
            lexed,
            vec![
                (TokenKind::Identifier, "x"),
                (TokenKind::Assign, "="),
                (TokenKind::String, "a \"b\""),
                (TokenKind::Comma, ","),
                (TokenKind::Number, "2.5"),
                (TokenKind::Comma, ","),
                (TokenKind::Integer, "-3"),
                (TokenKind::Comma, ","),
                (TokenKind::Identifier, "y"),
                (TokenKind::Operator(Operator::Sub), "-"),
                (TokenKind::Integer, "1"),
                (TokenKind::Comma, ","),
                (TokenKind::Integer, "7"),
                (TokenKind::Dot, "."),
                (TokenKind::Newline, ""),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn two_character_operators() {
        let tokens = tokenize("f", "a <= b == c && d != e || f >= g").unwrap();
        let operators: Vec<_> = tokens
            .iter()
            .filter_map(|token| match token.kind {
                TokenKind::Operator(operator) => Some(operator),
                _ => None,
            })
            .collect();
        assert_eq!(
            operators,
            vec![
                Operator::Le,
                Operator::Eq,
                Operator::And,
                Operator::Ne,
                Operator::Or,
                Operator::Ge,
            ]
        );
    }

    #[test]
    fn positions_are_one_based() {
        let tokens = tokenize("f", "component Health\n  Integer value").unwrap();
        let value = tokens.iter().find(|token| token.text == "value").unwrap();
        assert_eq!((value.line, value.column), (2, 11));
    }

    #[test]
    fn mixing_tabs_and_spaces_fails() {
        assert_eq!(
            error("if a\n  pass\nif b\n\tpass\n"),
            (4, 1, ErrorKind::MixedIndent)
        );
        assert_eq!(error("if a\n \tpass\n"), (2, 2, ErrorKind::MixedIndent));
    }

    #[test]
    fn dedent_must_match_an_outer_level() {
        assert_eq!(
            error("if a\n    pass\n  pass\n"),
            (3, 3, ErrorKind::InconsistentIndent)
        );
    }

    #[test]
    fn bad_characters_and_strings() {
        assert_eq!(error("x = 1 ! 2"), (1, 7, ErrorKind::UnexpectedCharacter('!')));
        assert_eq!(error("print(\"oops)"), (1, 7, ErrorKind::UnterminatedString));
    }

    #[test]
    fn literals_must_fit_their_type() {
        assert_eq!(
            error("x = 99999999999999999999"),
            (
                1,
                5,
                ErrorKind::LiteralOutOfRange("99999999999999999999".to_string())
            )
        );
        assert_eq!(
            error("x = y + -9223372036854775809"),
            (
                1,
                9,
                ErrorKind::LiteralOutOfRange("-9223372036854775809".to_string())
            )
        );
        let huge = format!("x = {}.5", "9".repeat(400));
        assert!(matches!(error(&huge).2, ErrorKind::LiteralOutOfRange(_)));
        assert!(tokenize("f", "x = -9223372036854775808").is_ok());
    }
}
