//! Process runner - shell command execution with output streaming
//!
//! Features:
//! - Shell interpretation (`sh -c` / `cmd /C`, overridable)
//! - Real-time stdout/stderr streaming through a chunk sink
//! - UTF-8 decoding that carries split multi-byte sequences across reads
//! - Cancellation and optional timeout (process killed, execution reported)
//! - Fixed-shape textual report; spawn failures become reports, not errors

use super::decoder::Utf8Decoder;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use toolgate_foundation::{ActionState, HostConfig};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Read buffer size per stream
const READ_CHUNK_SIZE: usize = 8192;

/// Report body limit when no config is given
const DEFAULT_MAX_OUTPUT_BYTES: usize = 30_000;

/// How long readers may keep draining after the process exited
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// How long readers may keep draining after a kill
const KILL_GRACE: Duration = Duration::from_millis(500);

/// Sentinel body for an execution with no output
pub const NO_OUTPUT: &str = "(no output)";

// ============================================================================
// Chunks and cancellation
// ============================================================================

/// Which stream a chunk came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// One decoded piece of output, forwarded as soon as it is read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub stream: OutputStream,
    pub text: String,
}

/// Streaming callback
pub type ChunkSink = Arc<dyn Fn(OutputChunk) + Send + Sync>;

/// Cancellation handle for a running command
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request termination; the process is killed and the run ends `Cancelled`
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

// ============================================================================
// Report
// ============================================================================

/// Terminal status of one execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Exit code 0
    Success,
    /// Non-zero exit (or -1 when killed by a signal)
    Failed { code: i32 },
    Cancelled,
    TimedOut,
    /// The command could not be started at all
    SpawnError { message: String },
}

impl ExecutionStatus {
    pub fn label(&self) -> String {
        match self {
            Self::Success => "SUCCESS".to_string(),
            Self::Failed { code } => format!("FAILED (Exit Code: {})", code),
            Self::Cancelled => "CANCELLED".to_string(),
            Self::TimedOut => "TIMED OUT".to_string(),
            Self::SpawnError { .. } => "ERROR".to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Success => Some(0),
            Self::Failed { code } => Some(*code),
            _ => None,
        }
    }

    /// Terminal action state for this status
    pub fn action_state(&self) -> ActionState {
        match self {
            Self::Success | Self::Failed { .. } => ActionState::Closed,
            Self::Cancelled => ActionState::Cancelled,
            Self::TimedOut | Self::SpawnError { .. } => ActionState::Errored,
        }
    }
}

/// Completed execution
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub id: Uuid,
    pub command: String,
    pub status: ExecutionStatus,
    pub stdout: String,
    pub stderr: String,
    /// stdout and stderr in arrival order
    pub combined: String,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    max_output_bytes: usize,
}

impl ExecutionReport {
    /// Byte length of the combined output
    pub fn output_len(&self) -> usize {
        self.combined.len()
    }

    /// Textual report
    ///
    /// ```text
    /// Command: echo hello
    /// Status: SUCCESS
    /// Output Length: 6
    /// Output:
    /// hello
    /// ```
    pub fn render(&self) -> String {
        let body = if self.combined.is_empty() {
            NO_OUTPUT.to_string()
        } else {
            truncate_tail(&self.combined, self.max_output_bytes)
        };

        format!(
            "Command: {}\nStatus: {}\nOutput Length: {}\nOutput:\n{}",
            self.command,
            self.status.label(),
            self.output_len(),
            body.trim_end_matches('\n')
        )
    }
}

impl std::fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Keep the last `limit` bytes (on a char boundary) with a marker line
fn truncate_tail(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }

    let mut start = text.len() - limit;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!(
        "... ({} bytes truncated)\n{}",
        start,
        &text[start..]
    )
}

// ============================================================================
// Runner
// ============================================================================

#[derive(Default)]
struct Buffers {
    stdout: String,
    stderr: String,
    combined: String,
}

/// Spawns shell-interpreted commands
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    shell: String,
    shell_args: Vec<String>,
    marker_env: String,
    timeout: Option<Duration>,
    max_output_bytes: usize,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::from_config(&HostConfig::default())
    }

    pub fn from_config(config: &HostConfig) -> Self {
        let (shell, shell_args) = config.shell_command();
        Self {
            shell,
            shell_args,
            marker_env: config.agent_marker_env().to_string(),
            timeout: config.command_timeout(),
            max_output_bytes: config.max_output_bytes(),
        }
    }

    pub fn with_shell(mut self, shell: impl Into<String>, args: Vec<String>) -> Self {
        self.shell = shell.into();
        self.shell_args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_output_bytes(mut self, limit: usize) -> Self {
        self.max_output_bytes = if limit == 0 {
            DEFAULT_MAX_OUTPUT_BYTES
        } else {
            limit
        };
        self
    }

    pub fn marker_env(&self) -> &str {
        &self.marker_env
    }

    /// Run to completion
    pub async fn run(
        &self,
        command: &str,
        cwd: &Path,
        env: &HashMap<String, String>,
        sink: Option<ChunkSink>,
    ) -> ExecutionReport {
        self.run_cancellable(command, cwd, env, sink, &CancelHandle::new())
            .await
    }

    /// Run until completion, cancellation, or timeout
    pub async fn run_cancellable(
        &self,
        command: &str,
        cwd: &Path,
        env: &HashMap<String, String>,
        sink: Option<ChunkSink>,
        cancel: &CancelHandle,
    ) -> ExecutionReport {
        let id = Uuid::new_v4();
        let started_at = Utc::now();
        let started = Instant::now();

        let report = |status: ExecutionStatus, buffers: Buffers| ExecutionReport {
            id,
            command: command.to_string(),
            status,
            stdout: buffers.stdout,
            stderr: buffers.stderr,
            combined: buffers.combined,
            started_at,
            duration: started.elapsed(),
            max_output_bytes: self.max_output_bytes,
        };

        info!("Running command [{}]: {}", id, command);

        // Ambient environment is inherited; the marker is always set last
        let mut cmd = Command::new(&self.shell);
        cmd.args(&self.shell_args)
            .arg(command)
            .current_dir(cwd)
            .envs(env)
            .env(&self.marker_env, "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let message = format!("Failed to spawn '{}': {}", self.shell, e);
                warn!("[{}] {}", id, message);
                let buffers = Buffers {
                    combined: message.clone(),
                    ..Default::default()
                };
                return report(ExecutionStatus::SpawnError { message }, buffers);
            }
        };

        let buffers = Arc::new(Mutex::new(Buffers::default()));
        let mut readers: Vec<JoinHandle<usize>> = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(
                stdout,
                OutputStream::Stdout,
                Arc::clone(&buffers),
                sink.clone(),
            ));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(
                stderr,
                OutputStream::Stderr,
                Arc::clone(&buffers),
                sink.clone(),
            ));
        }

        enum Outcome {
            Exited(std::io::Result<std::process::ExitStatus>),
            Cancelled,
            TimedOut,
        }

        let timeout = self.timeout;
        let deadline = async move {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        let outcome = tokio::select! {
            status = child.wait() => Outcome::Exited(status),
            _ = cancel.cancelled() => Outcome::Cancelled,
            _ = deadline => Outcome::TimedOut,
        };

        let status = match outcome {
            Outcome::Exited(Ok(exit)) => match exit.code() {
                Some(0) => ExecutionStatus::Success,
                Some(code) => ExecutionStatus::Failed { code },
                None => ExecutionStatus::Failed { code: -1 },
            },
            Outcome::Exited(Err(e)) => ExecutionStatus::SpawnError {
                message: format!("Failed to wait for process: {}", e),
            },
            Outcome::Cancelled => {
                warn!("[{}] cancelled, killing process", id);
                let _ = child.kill().await;
                ExecutionStatus::Cancelled
            }
            Outcome::TimedOut => {
                warn!("[{}] timed out after {:?}, killing process", id, timeout);
                let _ = child.kill().await;
                ExecutionStatus::TimedOut
            }
        };

        // Background grandchildren can hold the pipes open; stop waiting after a grace period
        let grace = match status {
            ExecutionStatus::Cancelled | ExecutionStatus::TimedOut => KILL_GRACE,
            _ => DRAIN_GRACE,
        };
        let mut chunk_count = 0;
        for mut reader in readers {
            match tokio::time::timeout(grace, &mut reader).await {
                Ok(Ok(count)) => chunk_count += count,
                Ok(Err(e)) => warn!("[{}] output reader failed: {}", id, e),
                Err(_) => {
                    debug!("[{}] output reader still open after exit, aborting", id);
                    reader.abort();
                }
            }
        }

        let mut collected = std::mem::take(&mut *buffers.lock());
        if let ExecutionStatus::SpawnError { message } = &status {
            if collected.combined.is_empty() {
                collected.combined = message.clone();
            }
        }

        let result = report(status, collected);
        debug!(
            "[{}] {} after {:?} ({} chunks, {} bytes)",
            id,
            result.status.label(),
            result.duration,
            chunk_count,
            result.output_len()
        );
        result
    }
}

/// Reads one stream to EOF; returns the number of chunks forwarded
fn spawn_reader<R>(
    mut stream: R,
    kind: OutputStream,
    buffers: Arc<Mutex<Buffers>>,
    sink: Option<ChunkSink>,
) -> JoinHandle<usize>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut decoder = Utf8Decoder::new();
        let mut buf = vec![0u8; READ_CHUNK_SIZE];
        let mut count = 0;

        loop {
            let text = match stream.read(&mut buf).await {
                Ok(0) | Err(_) => decoder.finish(),
                Ok(n) => decoder.decode(&buf[..n]),
            };
            let done = decoder.is_finished();

            if !text.is_empty() {
                {
                    let mut b = buffers.lock();
                    match kind {
                        OutputStream::Stdout => b.stdout.push_str(&text),
                        OutputStream::Stderr => b.stderr.push_str(&text),
                    }
                    b.combined.push_str(&text);
                }
                count += 1;
                if let Some(sink) = &sink {
                    sink(OutputChunk { stream: kind, text });
                }
            }

            if done {
                break;
            }
        }

        count
    })
}
