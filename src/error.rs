use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::fmt;

/// Character offsets into the source text, half-open.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }

    pub fn to(&self, other: &Span) -> Span {
        Span::new(self.start, other.end.max(self.end))
    }
}

/// 1-based line and column of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Line/column of the character at `offset`, counted in characters.
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let mut line = 1;
        let mut column = 1;
        for c in source.chars().take(offset) {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    UndefinedName,
    ArityMismatch,
    TypeMismatch,
    DivisionByZero,
    InputExhausted,
    Overflow,
    RecursionLimit,
    Io,
}

impl RuntimeErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            RuntimeErrorKind::UndefinedName => "UndefinedName",
            RuntimeErrorKind::ArityMismatch => "ArityMismatch",
            RuntimeErrorKind::TypeMismatch => "TypeMismatch",
            RuntimeErrorKind::DivisionByZero => "DivisionByZero",
            RuntimeErrorKind::InputExhausted => "InputExhausted",
            RuntimeErrorKind::Overflow => "Overflow",
            RuntimeErrorKind::RecursionLimit => "RecursionLimit",
            RuntimeErrorKind::Io => "Io",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    LexError,
    ParseError,
    RuntimeError(RuntimeErrorKind),
}

#[derive(Debug, Clone)]
pub struct NyaaError {
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub help: Option<String>,
    pub position: Option<Position>,
}

impl NyaaError {
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: None,
            position: None,
        }
    }

    pub fn new_with_help(kind: ErrorKind, span: Span, message: String, help: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: Some(help),
            position: None,
        }
    }

    pub fn lex_error(span: Span, position: Position, message: String) -> Self {
        Self::new(ErrorKind::LexError, span, message).at(position)
    }

    pub fn parse_error(span: Span, position: Position, message: String) -> Self {
        Self::new(ErrorKind::ParseError, span, message).at(position)
    }

    pub fn parse_error_with_help(
        span: Span,
        position: Position,
        message: String,
        help: String,
    ) -> Self {
        Self::new_with_help(ErrorKind::ParseError, span, message, help).at(position)
    }

    pub fn runtime_error(kind: RuntimeErrorKind, span: Span, message: String) -> Self {
        Self::new(ErrorKind::RuntimeError(kind), span, message)
    }

    pub fn runtime_error_with_help(
        kind: RuntimeErrorKind,
        span: Span,
        message: String,
        help: String,
    ) -> Self {
        Self::new_with_help(ErrorKind::RuntimeError(kind), span, message, help)
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self.kind, ErrorKind::RuntimeError(_))
    }

    pub fn runtime_kind(&self) -> Option<RuntimeErrorKind> {
        match self.kind {
            ErrorKind::RuntimeError(kind) => Some(kind),
            _ => None,
        }
    }

    fn kind_str(&self) -> &'static str {
        match self.kind {
            ErrorKind::LexError => "Lexical Error",
            ErrorKind::ParseError => "Syntax Error",
            ErrorKind::RuntimeError(kind) => kind.name(),
        }
    }

    pub fn report(&self, source: &str, filename: Option<&str>) {
        let filename = filename.unwrap_or("<repl>");

        let color = match self.kind {
            ErrorKind::LexError => Color::Red,
            ErrorKind::ParseError => Color::Yellow,
            ErrorKind::RuntimeError(_) => Color::Magenta,
        };

        let kind_str = match self.kind {
            ErrorKind::RuntimeError(_) => format!("Runtime Error [{}]", self.kind_str()),
            _ => self.kind_str().to_string(),
        };

        let mut report_builder = Report::build(ReportKind::Error, filename, self.span.start)
            .with_message(format!("{}: {}", kind_str.fg(color), self.message))
            .with_label(
                Label::new((filename, self.span.start..self.span.end))
                    .with_message(&self.message)
                    .with_color(color),
            );

        if let Some(ref help_text) = self.help {
            report_builder =
                report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        if let Err(e) = report_builder
            .finish()
            .eprint((filename, Source::from(source)))
        {
            eprintln!("{}", self);
            eprintln!("(failed to render diagnostic: {})", e);
        }
    }
}

impl fmt::Display for NyaaError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "{} at {}: {}", self.kind_str(), position, self.message),
            None => write!(f, "{}: {}", self.kind_str(), self.message),
        }
    }
}

impl std::error::Error for NyaaError {}
