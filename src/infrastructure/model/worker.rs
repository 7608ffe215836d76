//! Long-lived TripoSR worker process.
//!
//! The worker loads the pretrained model and a rembg session once, then
//! serves jobs as JSON lines: one request on stdin, one event on stdout.

use super::RuntimeError;
use crate::config::RuntimeConfig;
use crate::domain::generation::Device;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info};

const WORKER_SOURCE: &str = include_str!("triposr_worker.py");

#[derive(Debug, Serialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum WorkerJob<'a> {
    RemoveBackground {
        input: &'a Path,
        output: &'a Path,
    },
    Mesh {
        input: &'a Path,
        output: &'a Path,
        resolution: u32,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum WorkerEvent {
    Ready { device: String },
    Done,
    Failed { error: String },
}

/// Handle to one running worker. The child is killed when the handle is dropped.
pub struct RuntimeWorker {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl RuntimeWorker {
    /// Starts the worker and waits until it reports the model as loaded.
    pub async fn spawn(config: &RuntimeConfig, device: Device) -> Result<Self, RuntimeError> {
        let program = config.python.display().to_string();
        info!(
            model = %config.pretrained_model,
            device = %device,
            "Spawning TripoSR worker with {}",
            program
        );

        let mut child = Command::new(&config.python)
            .current_dir(&config.triposr_dir)
            .arg("-c")
            .arg(WORKER_SOURCE)
            .arg("--pretrained-model-name-or-path")
            .arg(&config.pretrained_model)
            .arg("--device")
            .arg(device.runtime_arg())
            .arg("--chunk-size")
            .arg(config.chunk_size.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RuntimeError::Launch { program, source })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(RuntimeError::Protocol("worker pipes unavailable".to_string()));
        };

        let mut worker = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };

        match worker.next_event().await? {
            WorkerEvent::Ready { device } => {
                info!(device = %device, "TripoSR worker ready");
                Ok(worker)
            }
            other => Err(RuntimeError::Protocol(format!(
                "expected ready, got {other:?}"
            ))),
        }
    }

    /// Sends one job and waits for its result.
    pub async fn run(&mut self, job: &WorkerJob<'_>) -> Result<(), RuntimeError> {
        let mut line =
            serde_json::to_string(job).map_err(|e| RuntimeError::Protocol(e.to_string()))?;
        line.push('\n');
        debug!(job = %line.trim_end(), "Sending worker job");

        if let Err(e) = self.send(&line).await {
            debug!("Worker stdin closed: {}", e);
            return Err(self.exit_error().await);
        }

        match self.next_event().await? {
            WorkerEvent::Done => Ok(()),
            WorkerEvent::Failed { error } => Err(RuntimeError::JobFailed(error)),
            other => Err(RuntimeError::Protocol(format!(
                "expected job result, got {other:?}"
            ))),
        }
    }

    async fn send(&mut self, line: &str) -> std::io::Result<()> {
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await
    }

    async fn next_event(&mut self) -> Result<WorkerEvent, RuntimeError> {
        loop {
            let Some(line) = self.stdout.next_line().await? else {
                return Err(self.exit_error().await);
            };
            let line = line.trim();
            if !line.starts_with('{') {
                if !line.is_empty() {
                    debug!("worker: {}", line);
                }
                continue;
            }
            return serde_json::from_str(line)
                .map_err(|e| RuntimeError::Protocol(format!("{e}: {line}")));
        }
    }

    async fn exit_error(&mut self) -> RuntimeError {
        match self.child.wait().await {
            Ok(status) => RuntimeError::WorkerExited(status.to_string()),
            Err(e) => RuntimeError::WorkerExited(e.to_string()),
        }
    }
}

/// Shell stand-ins for the Python worker.
#[cfg(all(test, unix))]
pub(crate) mod test_helpers {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    #[derive(Debug, Clone, Copy)]
    pub(crate) enum FakeBehavior {
        Serve,
        ExitAfterFirstJob,
        FailJobs,
    }

    const TEMPLATE: &str = r#"#!/bin/sh
echo load >> '__LOADS__'
echo 'loading weights'
echo '{"event":"ready","device":"cpu"}'
while IFS= read -r line; do
  input=$(printf '%s\n' "$line" | sed 's/.*"input":"\([^"]*\)".*/\1/')
  output=$(printf '%s\n' "$line" | sed 's/.*"output":"\([^"]*\)".*/\1/')
  __HANDLE__
done
"#;

    /// Writes a fake interpreter into `dir`. Each start appends a line to the returned log.
    pub(crate) fn fake_interpreter(dir: &Path, mesh: &Path, behavior: FakeBehavior) -> (PathBuf, PathBuf) {
        let loads = dir.join("loads.log");
        let copy = format!(
            "case \"$line\" in *'\"task\":\"mesh\"'*) cp '{}' \"$output\" ;; *) cp \"$input\" \"$output\" ;; esac",
            mesh.display()
        );
        let handle = match behavior {
            FakeBehavior::Serve => format!("{copy}\n  echo '{{\"event\":\"done\"}}'"),
            FakeBehavior::ExitAfterFirstJob => {
                format!("{copy}\n  echo '{{\"event\":\"done\"}}'\n  exit 0")
            }
            FakeBehavior::FailJobs => {
                "echo '{\"event\":\"failed\",\"error\":\"CUDA out of memory\"}'".to_string()
            }
        };
        let script = TEMPLATE
            .replace("__LOADS__", &loads.display().to_string())
            .replace("__HANDLE__", &handle);

        let interpreter = dir.join("fake-python");
        std::fs::write(&interpreter, script).unwrap();
        std::fs::set_permissions(&interpreter, std::fs::Permissions::from_mode(0o755)).unwrap();
        (interpreter, loads)
    }

    pub(crate) fn load_count(loads: &Path) -> usize {
        std::fs::read_to_string(loads)
            .map(|log| log.lines().count())
            .unwrap_or(0)
    }
}
