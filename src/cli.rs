//! Command-line surface: flags, environment fallbacks, usage text.

use std::ffi::OsStr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use clap::builder::StyledStr;
use clap::{CommandFactory, Parser};
use retry::{
    BackoffPolicy, BackoffStrategy, Command, Config, DEFAULT_ATTEMPTS, ENV_ATTEMPTS, ENV_BACKOFF,
    ENV_DELAY, ENV_MAX_DELAY, ENV_QUIET, RetryError, RetryPolicy, parse_attempts, parse_bool,
    parse_duration,
};

const EXAMPLES: &str = "\
Examples:
  # Retry a flaky download with the defaults (3 attempts, 2s initial delay)
  retry curl -fsSL https://example.com/install.sh

  # Five attempts, fixed 500ms between them, no per-attempt output
  retry --attempts 5 --delay 500ms --backoff fixed --quiet -- make test

  # Piped input is replayed to every attempt
  cat payload.json | retry -- curl -fsS -d @- https://example.com/hook";

#[derive(Parser, Debug)]
#[command(
    name = "retry",
    version,
    about = "Tool to retry a command in case it fails",
    after_help = EXAMPLES
)]
pub struct Cli {
    /// Number of attempts
    #[arg(
        long,
        env = ENV_ATTEMPTS,
        value_name = "N",
        default_value_t = DEFAULT_ATTEMPTS,
        value_parser = parse_attempts
    )]
    pub attempts: u32,

    /// Initial delay between attempts
    #[arg(
        long,
        env = ENV_DELAY,
        value_name = "DURATION",
        default_value = "2s",
        value_parser = parse_duration
    )]
    pub delay: Duration,

    /// Upper bound for any single delay
    #[arg(
        long,
        env = ENV_MAX_DELAY,
        value_name = "DURATION",
        default_value = "1h",
        value_parser = parse_duration
    )]
    pub max_delay: Duration,

    /// How the delay grows between attempts (fixed, exponential)
    #[arg(
        long,
        env = ENV_BACKOFF,
        value_name = "STRATEGY",
        default_value = "exponential",
        value_parser = BackoffStrategy::from_str
    )]
    pub backoff: BackoffStrategy,

    /// Disable output for failed attempts
    #[arg(
        long,
        env = ENV_QUIET,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = parse_bool
    )]
    pub quiet: bool,

    /// Command to retry, followed by its own flags and arguments
    #[arg(value_name = "COMMAND", trailing_var_arg = true)]
    pub command: Vec<String>,
}

impl Cli {
    /// Turns parsed flags into the validated run configuration.
    pub fn into_config(self) -> Result<Config, RetryError> {
        let policy = RetryPolicy {
            max_attempts: self.attempts,
            backoff: BackoffPolicy {
                strategy: self.backoff,
                first: self.delay,
                max: self.max_delay,
            },
            quiet: self.quiet,
        };
        Config::new(policy, Command::from_argv(self.command)?)
    }
}

/// Help text rendered under the name the binary was invoked as.
pub fn usage() -> StyledStr {
    let arg0 = std::env::args_os().next();
    usage_for(arg0.as_deref())
}

fn usage_for(arg0: Option<&OsStr>) -> StyledStr {
    let name = arg0
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "retry".to_string());
    Cli::command().bin_name(name).render_help()
}
