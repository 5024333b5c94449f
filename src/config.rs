/// Deepest chain of nested user function calls before `RecursionLimit` is raised.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Largest call depth accepted; bigger requests are clamped.
pub const MAX_CALL_DEPTH_CEILING: usize = 4096;

// Native stack reserved per nested user call, plus room for the parser and
// deeply nested expressions.
const STACK_BYTES_PER_CALL: usize = 128 * 1024;
const BASE_STACK_BYTES: usize = 8 * 1024 * 1024;

/// Settings for one interpreter run, filled in from the command line.
#[derive(Debug, Clone)]
pub struct Config {
    pub max_call_depth: usize,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            debug: false,
        }
    }
}

impl Config {
    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth.min(MAX_CALL_DEPTH_CEILING);
        self
    }

    /// The call depth the evaluator enforces.
    pub fn call_depth_limit(&self) -> usize {
        self.max_call_depth.min(MAX_CALL_DEPTH_CEILING)
    }

    /// Stack size for the thread that parses and evaluates a program, large
    /// enough that the call depth limit is hit before the native stack runs out.
    pub fn stack_size(&self) -> usize {
        BASE_STACK_BYTES + self.call_depth_limit() * STACK_BYTES_PER_CALL
    }

    /// Installs the global `tracing` subscriber. `RUST_LOG` takes precedence
    /// over the `--debug` flag.
    pub fn install_tracing(&self) {
        use tracing_subscriber::EnvFilter;

        let default_directive = if self.debug { "nyaa=debug" } else { "warn" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
