use crate::config::Config;
use crate::error::{NyaaError, Position, RuntimeErrorKind, Span};
use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::parser::Parser;
use std::io::{self, BufRead, BufReader, Write};
use std::thread;

/// Lexes, parses and evaluates `source` against the given streams. The first
/// error from any phase is returned unreported.
///
/// The work runs on a scoped thread whose stack is sized from the configured
/// call depth, so runaway recursion ends in `RecursionLimit`.
pub fn execute<R, W>(source: &str, config: &Config, input: R, output: W) -> Result<(), NyaaError>
where
    R: BufRead + Send,
    W: Write + Send,
{
    thread::scope(|scope| {
        let worker = thread::Builder::new()
            .name("nyaa-eval".to_string())
            .stack_size(config.stack_size())
            .spawn_scoped(scope, move || execute_here(source, config, input, output))
            .map_err(|e| {
                NyaaError::runtime_error(
                    RuntimeErrorKind::Io,
                    Span::single(0),
                    format!("Failed to start interpreter thread: {}", e),
                )
            })?;

        match worker.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    })
}

fn execute_here<R: BufRead, W: Write>(
    source: &str,
    config: &Config,
    input: R,
    output: W,
) -> Result<(), NyaaError> {
    let mut lexer = Lexer::new(source.to_string());
    let tokens = lexer.scan_tokens()?;

    let mut parser = Parser::new(tokens);
    let program = parser.parse()?;
    tracing::debug!(
        functions = program.functions.len(),
        has_main = program.main.is_some(),
        "parsed program"
    );

    let mut evaluator = Evaluator::new(input, output, config.clone());
    evaluator.evaluate_program(&program).map_err(|error| {
        let position = Position::from_offset(source, error.span.start);
        error.at(position)
    })
}

/// Runs a whole program on stdin/stdout and reports any error to stderr.
pub fn run(source: &str, filename: Option<&str>, config: &Config) -> Result<(), NyaaError> {
    let result = execute(source, config, BufReader::new(io::stdin()), io::stdout());
    if let Err(error) = &result {
        error.report(source, filename);
    }
    result
}
