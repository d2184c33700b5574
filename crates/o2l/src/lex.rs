use crate::exception::Exception;

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr, serde::Serialize)]
pub enum TokenKind {
    // Keywords
    Object,
    Method,
    Constructor,
    Property,
    Const,
    Enum,
    Record,
    Protocol,
    If,
    Else,
    While,
    Break,
    Continue,
    Return,
    This,
    True,
    False,
    Import,
    New,
    Throw,
    Try,
    Catch,
    Finally,
    Result,
    Error,
    Namespace,
    // Modifiers
    AtExternal,
    AtImport,
    // Literals and names
    Identifier,
    String,
    Number,
    Character,
    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    Not,
    Less,
    Greater,
    Equal,
    NotEqual,
    LessEqual,
    GreaterEqual,
    AndAnd,
    OrOr,
    Dot,
    Dollar,
    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Semicolon,
    Newline,
    Invalid,
    Eof,
}

/// One lexed token with its position (1-based line and column).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
    pub column: u32,
}

impl Token {
    fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
            column,
        }
    }
}

fn keyword_kind(identifier: &str) -> TokenKind {
    match identifier {
        "Object" => TokenKind::Object,
        "method" => TokenKind::Method,
        "constructor" => TokenKind::Constructor,
        "property" => TokenKind::Property,
        "const" => TokenKind::Const,
        "Enum" => TokenKind::Enum,
        "Record" => TokenKind::Record,
        "Protocol" => TokenKind::Protocol,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "return" => TokenKind::Return,
        "this" => TokenKind::This,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "import" => TokenKind::Import,
        "new" => TokenKind::New,
        "throw" => TokenKind::Throw,
        "try" => TokenKind::Try,
        "catch" => TokenKind::Catch,
        "finally" => TokenKind::Finally,
        "Result" => TokenKind::Result,
        "Error" => TokenKind::Error,
        "namespace" => TokenKind::Namespace,
        _ => TokenKind::Identifier,
    }
}

/// Turns UTF-8 source text into a token stream terminated by `Eof`.
///
/// Whitespace other than newline is discarded; newlines are tokens so the
/// parser can treat them as statement separators. `#` starts a line
/// comment, `### ... ###` a (non-nesting) block comment.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    #[must_use]
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(c) = self.current() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.pos += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current() {
            if c.is_whitespace() && c != '\n' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_comment(&mut self) {
        if self.current() != Some('#') {
            return;
        }
        if self.peek(1) == Some('#') && self.peek(2) == Some('#') {
            self.advance();
            self.advance();
            self.advance();
            while self.current().is_some() {
                if self.current() == Some('#') && self.peek(1) == Some('#') && self.peek(2) == Some('#') {
                    self.advance();
                    self.advance();
                    self.advance();
                    break;
                }
                self.advance();
            }
        } else {
            while let Some(c) = self.current() {
                if c == '\n' {
                    break;
                }
                self.advance();
            }
        }
    }

    fn make_string(&mut self) -> Result<Token, Exception> {
        let start_line = self.line;
        let start_column = self.column;
        self.advance(); // opening quote
        let mut value = String::new();

        while let Some(c) = self.current() {
            if c == '"' {
                break;
            }
            if c == '\\' {
                self.advance();
                match self.current() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    _ => {
                        return Err(Exception::syntax(format!(
                            "Invalid escape sequence at line {}",
                            self.line
                        )));
                    }
                }
            } else {
                value.push(c);
            }
            self.advance();
        }

        if self.current() != Some('"') {
            return Err(Exception::syntax(format!("Unterminated string at line {start_line}")));
        }
        self.advance(); // closing quote
        Ok(Token::new(TokenKind::String, value, start_line, start_column))
    }

    fn make_character(&mut self) -> Result<Token, Exception> {
        let start_line = self.line;
        let start_column = self.column;
        self.advance(); // opening quote

        let Some(c) = self.current() else {
            return Err(Exception::syntax(format!(
                "Unterminated character literal at line {start_line}"
            )));
        };
        self.advance();

        if self.current() != Some('\'') {
            return Err(Exception::syntax(format!(
                "Expected closing single quote at line {}",
                self.line
            )));
        }
        self.advance();

        if !c.is_ascii() {
            return Err(Exception::syntax(format!(
                "Character literal must be a single byte at line {start_line}"
            )));
        }
        Ok(Token::new(TokenKind::Character, c.to_string(), start_line, start_column))
    }

    fn make_number(&mut self) -> Token {
        let start_line = self.line;
        let start_column = self.column;
        let mut value = String::new();

        while let Some(c) = self.current() {
            if c.is_ascii_digit() {
                value.push(c);
                self.advance();
            } else {
                break;
            }
        }

        // A '.' only continues the literal when followed by a digit, so
        // `1.toString()` lexes as a method call on `1`.
        if self.current() == Some('.') && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
            value.push('.');
            self.advance();
            while let Some(c) = self.current() {
                if c.is_ascii_digit() {
                    value.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        match self.current() {
            Some(c @ ('f' | 'F' | 'd' | 'D')) => {
                value.push(c);
                self.advance();
            }
            Some(c @ ('l' | 'L')) => {
                // Long suffix only applies to integer literals.
                if !value.contains('.') {
                    value.push(c);
                    self.advance();
                }
            }
            _ => {}
        }

        Token::new(TokenKind::Number, value, start_line, start_column)
    }

    fn make_identifier_or_keyword(&mut self) -> Token {
        let start_line = self.line;
        let start_column = self.column;
        let mut value = String::new();

        while let Some(c) = self.current() {
            if c.is_alphanumeric() || c == '_' {
                value.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let kind = keyword_kind(&value);
        Token::new(kind, value, start_line, start_column)
    }

    /// Matches an exact word after the current position (used for the
    /// `@external` / `@import` modifiers).
    fn matches_at(&self, offset: usize, word: &str) -> bool {
        word.chars()
            .enumerate()
            .all(|(i, expected)| self.peek(offset + i) == Some(expected))
    }

    fn next_token(&mut self) -> Result<Token, Exception> {
        loop {
            let before = self.pos;
            self.skip_whitespace();
            self.skip_comment();
            if self.pos == before {
                break;
            }
        }

        let line = self.line;
        let column = self.column;
        let Some(c) = self.current() else {
            return Ok(Token::new(TokenKind::Eof, "", line, column));
        };

        if c == '\n' {
            self.advance();
            return Ok(Token::new(TokenKind::Newline, "\n", line, column));
        }
        if c == '"' {
            return self.make_string();
        }
        if c == '\'' {
            return self.make_character();
        }
        if c.is_ascii_digit() {
            return Ok(self.make_number());
        }
        if c.is_alphabetic() || c == '_' {
            return Ok(self.make_identifier_or_keyword());
        }

        // Multi-character operators before their single-character prefixes.
        let two = |kind, lexeme| Ok(Token::new(kind, lexeme, line, column));
        if c == '=' && self.peek(1) == Some('=') {
            self.advance();
            self.advance();
            return two(TokenKind::Equal, "==");
        }
        if c == '!' && self.peek(1) == Some('=') {
            self.advance();
            self.advance();
            return two(TokenKind::NotEqual, "!=");
        }
        if c == '<' && self.peek(1) == Some('=') {
            self.advance();
            self.advance();
            return two(TokenKind::LessEqual, "<=");
        }
        if c == '>' && self.peek(1) == Some('=') {
            self.advance();
            self.advance();
            return two(TokenKind::GreaterEqual, ">=");
        }
        if c == '&' && self.peek(1) == Some('&') {
            self.advance();
            self.advance();
            return two(TokenKind::AndAnd, "&&");
        }
        if c == '|' && self.peek(1) == Some('|') {
            self.advance();
            self.advance();
            return two(TokenKind::OrOr, "||");
        }

        if c == '@' {
            if self.matches_at(1, "external") {
                for _ in 0.."@external".len() {
                    self.advance();
                }
                return Ok(Token::new(TokenKind::AtExternal, "@external", line, column));
            }
            if self.matches_at(1, "import") {
                for _ in 0.."@import".len() {
                    self.advance();
                }
                return Ok(Token::new(TokenKind::AtImport, "@import", line, column));
            }
        }

        self.advance();
        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => TokenKind::Assign,
            '!' => TokenKind::Not,
            '<' => TokenKind::Less,
            '>' => TokenKind::Greater,
            '.' => TokenKind::Dot,
            '$' => TokenKind::Dollar,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            _ => TokenKind::Invalid,
        };
        Ok(Token::new(kind, c.to_string(), line, column))
    }

    /// Lexes the whole input, ending with an `Eof` token.
    pub fn tokenize_all(mut self) -> Result<Vec<Token>, Exception> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize_all()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("Object method property constructor"),
            vec![
                TokenKind::Object,
                TokenKind::Method,
                TokenKind::Property,
                TokenKind::Constructor,
                TokenKind::Eof
            ]
        );
        assert_eq!(kinds("widget"), vec![TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn multi_char_operators_win_over_prefixes() {
        assert_eq!(
            kinds("== != <= >= && || = ! < >"),
            vec![
                TokenKind::Equal,
                TokenKind::NotEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Assign,
                TokenKind::Not,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn number_suffixes() {
        let tokens = Lexer::new("42 42l 2.5 2.5f 2.5d 7L").tokenize_all().unwrap();
        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["42", "42l", "2.5", "2.5f", "2.5d", "7L", ""]);
    }

    #[test]
    fn long_suffix_rejected_after_decimal_point() {
        // The suffix stays unconsumed, becoming a trailing identifier.
        let tokens = Lexer::new("2.5l").tokenize_all().unwrap();
        assert_eq!(tokens[0].lexeme, "2.5");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn modifiers_are_single_tokens() {
        assert_eq!(
            kinds("@external @import"),
            vec![TokenKind::AtExternal, TokenKind::AtImport, TokenKind::Eof]
        );
    }

    #[test]
    fn string_escapes() {
        let tokens = Lexer::new("\"a\\nb\\t\\\"c\\\\\"").tokenize_all().unwrap();
        assert_eq!(tokens[0].lexeme, "a\nb\t\"c\\");
    }

    #[test]
    fn invalid_escape_is_rejected() {
        let err = Lexer::new("\"\\x\"").tokenize_all().unwrap_err();
        assert!(err.message().contains("Invalid escape sequence"));
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("1 # trailing\n### block\ncomment ### 2"),
            vec![TokenKind::Number, TokenKind::Newline, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn positions_are_tracked() {
        let tokens = Lexer::new("a\n  b").tokenize_all().unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
    }

    #[test]
    fn unknown_characters_become_invalid_tokens() {
        assert_eq!(kinds("?"), vec![TokenKind::Invalid, TokenKind::Eof]);
    }
}
