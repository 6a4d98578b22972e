use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command as TokioCommand};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::value_objects::command_spec::CommandSpec;

/// How long to keep collecting output after the process group was killed
const DRAIN_GRACE: Duration = Duration::from_millis(200);

/// Command executor errors
#[derive(Debug, Error)]
pub enum CommandExecutorError {
    #[error("Working directory does not exist: {}", .0.display())]
    WorkingDirectoryMissing(PathBuf),

    #[error("Failed to spawn '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for '{command}': {source}")]
    WaitFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration for command execution
#[derive(Debug, Clone, Default)]
pub struct ExecutionConfig {
    /// Working directory for command execution
    pub working_directory: Option<PathBuf>,

    /// Environment variables to set for the process
    pub environment_variables: HashMap<String, String>,
}

impl ExecutionConfig {
    /// Create a new execution config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set working directory
    pub fn with_working_directory<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.working_directory = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Add environment variable
    pub fn with_environment_variable(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.environment_variables.insert(key.into(), value.into());
        self
    }
}

/// Cancellation scope plus an optional deadline shared by one batch
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope that is cancelled together with `parent`
    pub fn child_of(parent: &CancellationToken) -> Self {
        Self {
            cancellation: parent.child_token(),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.map_or(false, |d| Instant::now() >= d)
    }

    /// Resolves when the deadline passes; never resolves without one.
    pub async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }
}

/// Output of a process that ran to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code (`128 + signal` when killed by a signal)
    pub exit_code: i32,

    /// Standard output and standard error, interleaved in arrival order
    pub output: String,

    /// Wall-clock time of the process
    pub duration: Duration,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// How a runner invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The process exited on its own; a non-zero code is still a completion.
    Completed(ProcessOutput),
    /// The cancellation token fired; the process group was killed.
    Cancelled { output: String, duration: Duration },
    /// The deadline passed; the process group was killed.
    TimedOut { output: String, duration: Duration },
}

/// Runs one command in one working directory
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(
        &self,
        command: &CommandSpec,
        config: &ExecutionConfig,
        context: &ExecutionContext,
    ) -> Result<RunOutcome, CommandExecutorError>;
}

/// Command executor for running external processes
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandExecutor;

impl CommandExecutor {
    pub fn new() -> Self {
        Self
    }

    fn build_command(command: &CommandSpec, config: &ExecutionConfig) -> TokioCommand {
        let (program, args) = command.to_program_and_args();

        let mut cmd = TokioCommand::new(&program);
        cmd.args(&args);

        if let Some(working_dir) = &config.working_directory {
            cmd.current_dir(working_dir);
        }

        for (key, value) in &config.environment_variables {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group, so a kill reaches every descendant
        #[cfg(unix)]
        cmd.process_group(0);

        cmd
    }
}

#[async_trait]
impl ProcessRunner for CommandExecutor {
    async fn run(
        &self,
        command: &CommandSpec,
        config: &ExecutionConfig,
        context: &ExecutionContext,
    ) -> Result<RunOutcome, CommandExecutorError> {
        let start_time = Instant::now();
        let command_text = command.to_string();

        if context.is_cancelled() {
            return Ok(RunOutcome::Cancelled {
                output: String::new(),
                duration: Duration::ZERO,
            });
        }
        if context.is_expired() {
            return Ok(RunOutcome::TimedOut {
                output: String::new(),
                duration: Duration::ZERO,
            });
        }

        if let Some(dir) = &config.working_directory {
            if !dir.is_dir() {
                return Err(CommandExecutorError::WorkingDirectoryMissing(dir.clone()));
            }
        }

        let mut child = Self::build_command(command, config)
            .spawn()
            .map_err(|source| CommandExecutorError::SpawnFailed {
                command: command_text.clone(),
                source,
            })?;
        // The group outlives the shell when a background job keeps running
        let pgid = child.id();
        debug!(command = %command_text, pid = ?pgid, "spawned process");

        let (chunk_tx, mut chunk_rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, chunk_tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, chunk_tx.clone()));
        }
        drop(chunk_tx);

        let mut output = String::new();
        let mut exit_code = None;
        let mut streams_open = true;

        loop {
            if let (Some(code), false) = (exit_code, streams_open) {
                return Ok(RunOutcome::Completed(ProcessOutput {
                    exit_code: code,
                    output,
                    duration: start_time.elapsed(),
                }));
            }

            tokio::select! {
                biased;

                _ = context.token().cancelled() => {
                    warn!(command = %command_text, "cancelled, killing process group");
                    terminate(&mut child, pgid).await;
                    drain_remaining(&mut chunk_rx, &mut output).await;
                    return Ok(RunOutcome::Cancelled { output, duration: start_time.elapsed() });
                }
                _ = context.expired() => {
                    warn!(command = %command_text, "deadline exceeded, killing process group");
                    terminate(&mut child, pgid).await;
                    drain_remaining(&mut chunk_rx, &mut output).await;
                    return Ok(RunOutcome::TimedOut { output, duration: start_time.elapsed() });
                }
                chunk = chunk_rx.recv(), if streams_open => match chunk {
                    Some(chunk) => output.push_str(&chunk),
                    None => streams_open = false,
                },
                status = child.wait(), if exit_code.is_none() => {
                    let status = status.map_err(|source| CommandExecutorError::WaitFailed {
                        command: command_text.clone(),
                        source,
                    })?;
                    exit_code = Some(normalize_exit(status));
                }
            }
        }
    }
}

/// Forward a pipe to the collector one line at a time
async fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if tx.send(String::from_utf8_lossy(&buf).into_owned()).is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!("output stream closed with error: {}", e);
                break;
            }
        }
    }
}

async fn drain_remaining(rx: &mut mpsc::UnboundedReceiver<String>, output: &mut String) {
    let _ = tokio::time::timeout(DRAIN_GRACE, async {
        while let Some(chunk) = rx.recv().await {
            output.push_str(&chunk);
        }
    })
    .await;
}

/// Kill the child's whole process group and reap the child
///
/// `pgid` is captured at spawn time: once the child has been reaped
/// `Child::id` returns `None`, but other group members may still be running.
async fn terminate(child: &mut Child, pgid: Option<u32>) {
    #[cfg(unix)]
    {
        if let Some(pgid) = pgid {
            // SAFETY: killpg only sends a signal; the group id is the child's pid
            // because the command was spawned with process_group(0).
            let rc = unsafe { libc::killpg(pgid as libc::pid_t, libc::SIGKILL) };
            if rc != 0 {
                debug!(pgid, "killpg failed: {}", std::io::Error::last_os_error());
            }
        }
    }
    #[cfg(not(unix))]
    let _ = pgid;

    if let Err(e) = child.start_kill() {
        debug!("start_kill: {}", e);
    }
    if let Err(e) = child.wait().await {
        warn!("failed to reap killed process: {}", e);
    }
}

fn normalize_exit(status: std::process::ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(code) = status.code() {
            code
        } else if let Some(sig) = status.signal() {
            128 + sig
        } else {
            -1
        }
    }
    #[cfg(not(unix))]
    {
        status.code().unwrap_or(-1)
    }
}
