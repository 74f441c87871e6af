//! Moving requests to the driver executable and answers back.

use anyhow::Result;
use async_lock::Mutex;
use async_trait::async_trait;
use smol::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use smol::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::protocol::{Answer, Request};
use crate::services::database::DatabaseError;
use crate::services::database::traits::types::PARAM_PASSWORD;

/// First argument that puts the driver in persistent mode.
pub const SERVE_COMMAND: &str = "serve";

/// Carries one request to the driver and returns its answer.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn exchange(&self, request: &Request) -> Result<Answer>;

    /// Release any process held by the transport.
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// Command line for logs, with the password masked.
fn display_command(program: &Path, request: &Request) -> String {
    let mut shown = request.clone();
    if let Some(password) = shown.params.get_mut(PARAM_PASSWORD) {
        *password = "***".to_string();
    }
    shown.to_command_line(&program.display().to_string())
}

fn invocation(context: &str, err: impl std::fmt::Display) -> DatabaseError {
    DatabaseError::Invocation(format!("{}: {}", context, err))
}

/// Spawns the driver once per request.
#[derive(Debug, Clone)]
pub struct OneShotTransport {
    program: PathBuf,
}

impl OneShotTransport {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl Transport for OneShotTransport {
    async fn exchange(&self, request: &Request) -> Result<Answer> {
        debug!(command = %display_command(&self.program, request), "driver call");

        let output = Command::new(&self.program)
            .args(request.to_argv())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| invocation(&format!("cannot run {}", self.program.display()), e))?;

        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DatabaseError::Invocation(format!(
                "driver exited with {} without an answer: {}",
                output.status,
                stderr.trim()
            ))
            .into());
        }

        Ok(Answer::decode(&output.stdout)?)
    }
}

struct Worker {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Worker {
    fn spawn(program: &Path) -> Result<Self, DatabaseError> {
        let mut child = Command::new(program)
            .arg(SERVE_COMMAND)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| invocation(&format!("cannot start {}", program.display()), e))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| DatabaseError::Invocation("driver stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DatabaseError::Invocation("driver stdout unavailable".to_string()))?;

        info!(program = %program.display(), pid = child.id(), "driver worker started");
        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    async fn exchange(&mut self, request: &Request) -> Result<Answer, DatabaseError> {
        let mut line = serde_json::to_string(request)
            .map_err(|e| DatabaseError::InvalidArgument(e.to_string()))?;
        line.push('\n');

        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| invocation("writing to driver", e))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| invocation("writing to driver", e))?;

        let mut reply = String::new();
        let read = self
            .stdout
            .read_line(&mut reply)
            .await
            .map_err(|e| invocation("reading from driver", e))?;
        if read == 0 {
            return Err(DatabaseError::Invocation(
                "driver worker exited before answering".to_string(),
            ));
        }

        Answer::decode(reply.as_bytes())
    }

    async fn stop(self) -> Result<()> {
        let Worker {
            mut child,
            stdin,
            stdout,
        } = self;
        // EOF on stdin ends the serve loop
        drop(stdin);
        drop(stdout);
        let status = child
            .status()
            .await
            .map_err(|e| invocation("waiting for driver", e))?;
        if !status.success() {
            warn!(%status, "driver worker exited abnormally");
        }
        Ok(())
    }
}

/// Keeps one `aleto-driver serve` process and talks JSON lines to it.
///
/// The worker is started on first use. If it dies, the failing call
/// reports an invocation error and the next call starts a new worker.
pub struct PersistentTransport {
    program: PathBuf,
    worker: Mutex<Option<Worker>>,
}

impl std::fmt::Debug for PersistentTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentTransport")
            .field("program", &self.program)
            .field("worker", &"<Child>")
            .finish()
    }
}

impl PersistentTransport {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            worker: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Transport for PersistentTransport {
    async fn exchange(&self, request: &Request) -> Result<Answer> {
        let mut slot = self.worker.lock().await;

        if slot.is_none() {
            *slot = Some(Worker::spawn(&self.program)?);
        }
        let Some(worker) = slot.as_mut() else {
            return Err(DatabaseError::Invocation("driver worker unavailable".to_string()).into());
        };

        debug!(command = %display_command(&self.program, request), "driver request");
        match worker.exchange(request).await {
            Ok(answer) => Ok(answer),
            Err(err @ DatabaseError::Invocation(_)) => {
                warn!(error = %err, "dropping driver worker");
                *slot = None;
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn shutdown(&self) -> Result<()> {
        let worker = self.worker.lock().await.take();
        match worker {
            Some(worker) => worker.stop().await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_masked_in_logs() {
        let request =
            Request::new("connect").with_params([("db", "mysql"), ("password", "hunter2")]);
        let line = display_command(Path::new("aleto-driver"), &request);
        assert!(!line.contains("hunter2"));
        assert!(line.contains(r#"--password="***""#));
    }

    #[test]
    fn test_missing_executable_is_invocation_error() {
        smol::block_on(async {
            let transport = OneShotTransport::new("/nonexistent/aleto-driver");
            let err = transport.exchange(&Request::new("connect")).await.unwrap_err();
            assert!(matches!(
                err.downcast_ref::<DatabaseError>(),
                Some(DatabaseError::Invocation(_))
            ));

            let transport = PersistentTransport::new("/nonexistent/aleto-driver");
            let err = transport.exchange(&Request::new("connect")).await.unwrap_err();
            assert!(matches!(
                err.downcast_ref::<DatabaseError>(),
                Some(DatabaseError::Invocation(_))
            ));
            transport.shutdown().await.unwrap();
        });
    }
}
