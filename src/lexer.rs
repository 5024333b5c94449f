use crate::ast::Literal;
use crate::error::{NyaaError, Position, Span};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Semicolon,
    Minus,
    Plus,
    Slash,
    Star,

    // One or two character tokens
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    EqualEqual,
    BangEqual,
    PlusPlus,
    MinusMinus,
    Arrow,

    // Literals
    Identifier,
    String,
    Integer,
    Float,

    // Keywords
    Def,
    Main,
    Assign,
    Print,
    Input,
    True,
    False,
    Return,
    While,
    If,
    Elif,
    Else,
    Break,
    Continue,
    Pass,
    Try,
    Except,
    And,
    Or,
    Not,

    // Special
    Eof,
}

impl TokenType {
    /// Tokens that can begin an expression.
    pub fn starts_expression(&self) -> bool {
        matches!(
            self,
            TokenType::Minus
                | TokenType::Not
                | TokenType::LeftParen
                | TokenType::Identifier
                | TokenType::True
                | TokenType::False
                | TokenType::Integer
                | TokenType::Float
                | TokenType::String
                | TokenType::Print
                | TokenType::Input
        )
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    /// Raw source text of the token.
    pub lexeme: String,
    /// Semantic value of literal tokens; string escapes are already resolved.
    pub literal: Option<Literal>,
    pub span: Span,
    pub position: Position,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, span: Span, position: Position) -> Self {
        Self {
            token_type,
            lexeme,
            literal: None,
            span,
            position,
        }
    }

    pub fn describe(&self) -> String {
        match self.token_type {
            TokenType::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.lexeme),
        }
    }
}

pub struct Lexer {
    source: String,
    tokens: Vec<Token>,
    // byte offsets, for slicing
    start: usize,
    current: usize,
    // character offsets, for spans
    start_char: usize,
    current_char: usize,
    line: usize,
    column: usize,
    start_position: Position,
    keywords: HashMap<&'static str, TokenType>,
}

impl Lexer {
    pub fn new(source: String) -> Self {
        let mut keywords = HashMap::new();
        keywords.insert("kawaii", TokenType::Def);
        keywords.insert("uWu_nyaa", TokenType::Main);
        keywords.insert("asain", TokenType::Assign);
        keywords.insert("purinto", TokenType::Print);
        keywords.insert("ohayo", TokenType::Input);
        keywords.insert("HAI", TokenType::True);
        keywords.insert("IIE", TokenType::False);
        keywords.insert("sayonara", TokenType::Return);
        keywords.insert("nani", TokenType::While);
        keywords.insert("nyan", TokenType::If);
        keywords.insert("nyanyan", TokenType::Elif);
        keywords.insert("baka", TokenType::Else);
        keywords.insert("yamete", TokenType::Break);
        keywords.insert("motto", TokenType::Continue);
        keywords.insert("pasu", TokenType::Pass);
        keywords.insert("ganbatte", TokenType::Try);
        keywords.insert("gomenasai", TokenType::Except);
        keywords.insert("and", TokenType::And);
        keywords.insert("or", TokenType::Or);
        keywords.insert("not", TokenType::Not);

        Self {
            source,
            tokens: Vec::new(),
            start: 0,
            current: 0,
            start_char: 0,
            current_char: 0,
            line: 1,
            column: 1,
            start_position: Position::new(1, 1),
            keywords,
        }
    }

    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, NyaaError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_char = self.current_char;
            self.start_position = Position::new(self.line, self.column);
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenType::Eof,
            String::new(),
            Span::single(self.current_char),
            Position::new(self.line, self.column),
        ));

        tracing::debug!(tokens = self.tokens.len(), "lexing finished");
        Ok(std::mem::take(&mut self.tokens))
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) -> Result<(), NyaaError> {
        let c = self.advance();

        match c {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            ',' => self.add_token(TokenType::Comma),
            ';' => self.add_token(TokenType::Semicolon),
            '*' => self.add_token(TokenType::Star),
            '/' => self.add_token(TokenType::Slash),
            '+' => {
                let token_type = if self.match_char('+') {
                    TokenType::PlusPlus
                } else {
                    TokenType::Plus
                };
                self.add_token(token_type);
            }
            '-' => {
                let token_type = if self.match_char('-') {
                    TokenType::MinusMinus
                } else {
                    TokenType::Minus
                };
                self.add_token(token_type);
            }
            '<' => {
                let token_type = if self.match_char('=') {
                    TokenType::LessEqual
                } else {
                    TokenType::Less
                };
                self.add_token(token_type);
            }
            '>' => {
                let token_type = if self.match_char('=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                };
                self.add_token(token_type);
            }
            '=' => {
                if self.match_char('=') {
                    self.add_token(TokenType::EqualEqual);
                } else if self.match_char('>') {
                    self.add_token(TokenType::Arrow);
                } else {
                    return Err(self.unexpected_character(c));
                }
            }
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenType::BangEqual);
                } else {
                    return Err(self.unexpected_character(c));
                }
            }
            '#' => {
                // Comment goes until end of line
                while self.peek() != '\n' && !self.is_at_end() {
                    self.advance();
                }
            }
            ' ' | '\r' | '\t' | '\n' => {}
            '"' => self.string()?,
            c if c.is_ascii_digit() => self.number()?,
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
            _ => return Err(self.unexpected_character(c)),
        }

        Ok(())
    }

    fn unexpected_character(&self, c: char) -> NyaaError {
        NyaaError::lex_error(
            Span::new(self.start_char, self.current_char),
            self.start_position,
            format!("Unexpected character: '{}'", c),
        )
    }

    fn advance(&mut self) -> char {
        let Some(c) = self.source[self.current..].chars().next() else {
            return '\0';
        };
        self.current += c.len_utf8();
        self.current_char += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    fn peek(&self) -> char {
        self.source[self.current..].chars().next().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        let mut chars = self.source[self.current..].chars();
        chars.next();
        chars.next().unwrap_or('\0')
    }

    fn string(&mut self) -> Result<(), NyaaError> {
        let mut value = String::new();

        loop {
            if self.is_at_end() || self.peek() == '\n' || self.peek() == '\r' {
                return Err(NyaaError::lex_error(
                    Span::new(self.start_char, self.current_char.max(self.start_char + 1)),
                    self.start_position,
                    "Unterminated string".to_string(),
                ));
            }

            match self.advance() {
                '"' => break,
                '\\' => match self.peek() {
                    '\\' | '"' | 'n' | 't' => {
                        let escaped = match self.advance() {
                            'n' => '\n',
                            't' => '\t',
                            other => other,
                        };
                        value.push(escaped);
                    }
                    // unknown escapes are kept as written
                    _ => value.push('\\'),
                },
                c => value.push(c),
            }
        }

        self.add_literal_token(TokenType::String, Literal::Str(value));
        Ok(())
    }

    fn number(&mut self) -> Result<(), NyaaError> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let mut is_float = false;

        // Look for fractional part
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            is_float = true;
            // Consume the "."
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let number_slice = &self.source[self.start..self.current];

        if is_float {
            let value = number_slice.parse::<f64>().map_err(|_| {
                NyaaError::lex_error(
                    Span::new(self.start_char, self.current_char),
                    self.start_position,
                    format!("Invalid float: {}", number_slice),
                )
            })?;
            self.add_literal_token(TokenType::Float, Literal::Float(value));
        } else {
            let value = number_slice.parse::<i64>().map_err(|_| {
                NyaaError::lex_error(
                    Span::new(self.start_char, self.current_char),
                    self.start_position,
                    format!("Invalid integer: {}", number_slice),
                )
            })?;
            self.add_literal_token(TokenType::Integer, Literal::Int(value));
        }

        Ok(())
    }

    fn identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = &self.source[self.start..self.current];
        let token_type = self
            .keywords
            .get(text)
            .cloned()
            .unwrap_or(TokenType::Identifier);

        self.add_token(token_type);
    }

    fn add_token(&mut self, token_type: TokenType) {
        let token = self.make_token(token_type);
        self.tokens.push(token);
    }

    fn add_literal_token(&mut self, token_type: TokenType, literal: Literal) {
        let mut token = self.make_token(token_type);
        token.literal = Some(literal);
        self.tokens.push(token);
    }

    fn make_token(&self, token_type: TokenType) -> Token {
        Token::new(
            token_type,
            self.source[self.start..self.current].to_string(),
            Span::new(self.start_char, self.current_char),
            self.start_position,
        )
    }
}

/// Tokenizes `source` in one call.
pub fn tokenize(source: &str) -> Result<Vec<Token>, NyaaError> {
    Lexer::new(source.to_string()).scan_tokens()
}
