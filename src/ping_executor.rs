use std::io::ErrorKind;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use tokio::process::Command;

use crate::command::{self, PingCommand};
use crate::error::{PingError, RunError};
use crate::parser;
use crate::ping::{PingOutcome, PingParams, PingRequest};

/// Return code the executor reports when the utility could not be found.
pub const RC_NOT_FOUND: i32 = 127;
/// Return code the executor reports when the utility could not be started
/// for any other reason.
pub const RC_CANNOT_EXECUTE: i32 = 126;
/// Return code the utility uses when it ran but got no replies, or could not
/// resolve the operand.
pub const RC_FAILED: i32 = 1;

/// Captured result of a process that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub rc: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Runs an argument vector to completion and captures its output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        argv: &[String],
        timeout: Option<Duration>,
    ) -> Result<ProcessOutput, RunError>;
}

/// Spawns the real process through tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        argv: &[String],
        timeout: Option<Duration>,
    ) -> Result<ProcessOutput, RunError> {
        let (program, args) = argv.split_first().ok_or_else(|| RunError::Spawn {
            program: String::new(),
            source: std::io::Error::new(ErrorKind::InvalidInput, "empty command line"),
        })?;

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true);

        // Dropping the future on timeout kills the child
        let output = command.output();

        let output = match timeout {
            Some(limit) => tokio::time::timeout(limit, output)
                .await
                .map_err(|_| RunError::TimedOut(limit))?,
            None => output.await,
        }
        .map_err(|source| RunError::Spawn {
            program: program.clone(),
            source,
        })?;

        Ok(ProcessOutput {
            // Killed by a signal
            rc: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

pub struct PingExecutor<R = SystemRunner> {
    runner: R,
    timeout: Option<Duration>,
}

impl PingExecutor {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self::with_runner(SystemRunner, timeout)
    }
}

impl<R: CommandRunner> PingExecutor<R> {
    pub fn with_runner(runner: R, timeout: Option<Duration>) -> Self {
        Self { runner, timeout }
    }

    /// Builds the command, runs it once and classifies the result.
    ///
    /// Never fails: spawn errors, timeouts and unparseable output all come back
    /// as fields of the outcome.
    pub async fn execute(&self, request: &PingRequest) -> PingOutcome {
        let command = command::build(request);
        self.execute_command(&command).await
    }

    pub async fn execute_command(&self, command: &PingCommand) -> PingOutcome {
        let cmd = command.to_string();
        let started_at = Utc::now();
        let start = Instant::now();
        debug!("Running '{cmd}'");

        let result = self.runner.run(command.argv(), self.timeout).await;
        let elapsed = start.elapsed();

        let outcome = match result {
            Err(RunError::TimedOut(limit)) => {
                warn!("'{cmd}' did not finish within {limit:?}");
                PingOutcome::timed_out(cmd, started_at)
            }
            Err(e @ RunError::Spawn { .. }) => {
                error!("{e}");
                let rc = match &e {
                    RunError::Spawn { source, .. } if source.kind() == ErrorKind::NotFound => {
                        RC_NOT_FOUND
                    }
                    _ => RC_CANNOT_EXECUTE,
                };
                PingOutcome::failure(cmd, rc, String::new(), e.to_string(), started_at)
            }
            Ok(output) => classify(cmd, output, started_at),
        };

        outcome.with_elapsed(elapsed)
    }

    /// Validates raw parameters, then runs them. Only invalid parameters fail.
    pub async fn execute_params(&self, params: PingParams) -> Result<PingOutcome, PingError> {
        let request = params.validate()?;
        Ok(self.execute(&request).await)
    }

    /// Runs [`execute_params`](Self::execute_params) on a private current-thread
    /// runtime, for callers that are not already inside one.
    pub fn execute_blocking(&self, params: PingParams) -> Result<PingOutcome, PingError> {
        let request = params.validate()?;
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(PingError::Runtime)?;
        Ok(rt.block_on(self.execute(&request)))
    }
}

fn classify(cmd: String, output: ProcessOutput, started_at: DateTime<Utc>) -> PingOutcome {
    let ProcessOutput { rc, stdout, stderr } = output;
    match rc {
        RC_FAILED => {
            debug!("'{cmd}' failed with rc {rc}");
            PingOutcome::failure(cmd, rc, stdout, stderr, started_at)
        }
        0 => {
            let parsed = parser::parse(&stdout);
            if parsed.is_none() {
                debug!("Output of '{cmd}' did not match the expected layout");
            }
            PingOutcome::success(cmd, rc, stdout, stderr, started_at, parsed)
        }
        _ => {
            // Reported as a completed run without statistics, same as a
            // successful run whose output could not be parsed
            warn!("'{cmd}' exited with unexpected rc {rc}");
            PingOutcome::success(cmd, rc, stdout, stderr, started_at, None)
        }
    }
}
