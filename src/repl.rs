use crate::config::Config;
use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::parser::Parser;
use std::io::{self, BufRead, Write};
use std::thread;

/// Interactive session. Bindings and functions persist between lines, and
/// `ohayo` shares stdin with the prompt loop. The session runs on its own
/// thread with a stack sized from the configured call depth.
pub fn start(config: &Config) {
    let config = config.clone();
    let session = thread::Builder::new()
        .name("nyaa-repl".to_string())
        .stack_size(config.stack_size())
        .spawn(move || run_session(&config));

    match session {
        Ok(handle) => {
            if handle.join().is_err() {
                eprintln!("REPL session ended unexpectedly");
            }
        }
        Err(error) => eprintln!("Failed to start REPL session: {}", error),
    }
}

fn run_session(config: &Config) {
    println!("NYAA-PL Interpreter v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl+D to quit");
    println!();

    let mut evaluator = Evaluator::with_stdio(config.clone());

    loop {
        print!("nyaa> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match evaluator.input_mut().read_line(&mut line) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    println!("Sayonara!");
                    break;
                }

                run_repl_command(line, &mut evaluator);
            }
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        }
    }
}

fn run_repl_command<R: BufRead, W: Write>(source: &str, evaluator: &mut Evaluator<R, W>) {
    let mut lexer = Lexer::new(source.to_string());
    let tokens = match lexer.scan_tokens() {
        Ok(tokens) => tokens,
        Err(error) => {
            error.report(source, None);
            return;
        }
    };

    let mut parser = Parser::new(tokens);
    let input = match parser.parse_repl() {
        Ok(input) => input,
        Err(error) => {
            error.report(source, None);
            return;
        }
    };

    match evaluator.execute_repl(&input) {
        Ok(Some(value)) => println!("{}", value),
        Ok(None) => {}
        Err(error) => error.report(source, None),
    }
}
