use clap::{value_parser, Arg, ArgAction, Command};
use nyaa::config::{Config, DEFAULT_MAX_CALL_DEPTH, MAX_CALL_DEPTH_CEILING};
use nyaa::{repl, runner, NyaaError};
use std::fs;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let matches = Command::new("nyaa")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Interpreter for NYAA-PL, the kawaii programming language")
        .arg(
            Arg::new("file")
                .help("The .nyaa script to execute")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .help("Start in interactive REPL mode")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Log interpreter internals to stderr")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-depth")
                .long("max-depth")
                .value_name("N")
                .help(format!(
                    "Maximum nesting of user function calls, at most {} [default: {}]",
                    MAX_CALL_DEPTH_CEILING, DEFAULT_MAX_CALL_DEPTH
                ))
                .value_parser(value_parser!(u32).range(1..=MAX_CALL_DEPTH_CEILING as i64)),
        )
        .get_matches();

    let mut config = Config {
        debug: matches.get_flag("debug"),
        ..Config::default()
    };
    if let Some(depth) = matches.get_one::<u32>("max-depth") {
        config = config.with_max_call_depth(*depth as usize);
    }
    config.install_tracing();

    match matches.get_one::<String>("file") {
        Some(file_path) if !matches.get_flag("interactive") => run_file(file_path, &config),
        _ => {
            repl::start(&config);
            ExitCode::SUCCESS
        }
    }
}

fn run_file(path: &str, config: &Config) -> ExitCode {
    let path = Path::new(path);

    if !path.exists() {
        eprintln!("Error: File '{}' not found", path.display());
        return ExitCode::from(1);
    }

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            return ExitCode::from(1);
        }
    };

    let filename = path.to_string_lossy().into_owned();
    match runner::run(&source, Some(filename.as_str()), config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => exit_code(&error),
    }
}

fn exit_code(error: &NyaaError) -> ExitCode {
    if error.is_runtime() {
        ExitCode::from(70)
    } else {
        ExitCode::from(65)
    }
}
