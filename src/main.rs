//! retry - re-run a command until it succeeds

mod cli;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use retry::{ENV_LOG, Engine, Input, LogWriter, RetryError, Subscribe, spawn_signal_listener};

use crate::cli::Cli;

/// How long runtime shutdown waits for a stdin read still blocked in the background.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };
    let res = runtime.block_on(run(cli));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = err.as_label(), "run failed");
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), RetryError> {
    if cli.command.is_empty() {
        eprintln!("{}", cli::usage());
    }
    let config = cli.into_config()?;

    let token = CancellationToken::new();
    let listener = spawn_signal_listener(token.clone());

    let input = tokio::select! {
        biased;
        _ = token.cancelled() => return Err(RetryError::Canceled { attempts: 0 }),
        input = Input::from_stdin() => input?,
    };

    let log: Arc<dyn Subscribe> = Arc::new(LogWriter::new());
    let engine = Engine::builder(config.policy, Arc::new(config.command))
        .with_subscribers(vec![log])
        .build();
    let res = engine.execute(&input, &token).await;
    listener.abort();

    let done = res?;
    tracing::debug!(attempts = done.attempts, "command succeeded");
    Ok(())
}

/// Installs the stderr `tracing` subscriber; silent unless `RETRY_LOG` is set.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}
