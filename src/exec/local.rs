use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

use super::{Executor, OutputStream, ProcessOutcome, ProcessSpec};
use crate::interrupt::ProcessHandle;
use crate::prelude::*;

/// Runs processes on this machine.
#[derive(Default, Clone)]
pub struct LocalExecutor;

impl LocalExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
fn request_termination(child: &Child) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return;
    };
    debug!("Sending SIGTERM to {}", pid);
    if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        warn!("Failed to send SIGTERM to {}: {}", pid, e);
    }
}

#[cfg(not(unix))]
fn request_termination(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        warn!("Failed to stop child process: {}", e);
    }
}

#[async_trait]
impl Executor for LocalExecutor {
    async fn execute<F>(
        &self,
        spec: &ProcessSpec,
        handle: &ProcessHandle,
        on_output: F,
    ) -> Result<ProcessOutcome>
    where
        F: Fn(OutputStream, &str) + Send + Sync + 'static,
    {
        let cmd_str = spec.to_string();
        debug!("Executing command: {}", cmd_str);

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&spec.current_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let started = Instant::now();
        let mut child = cmd.spawn().map_err(|source| Error::SpawnError {
            cmd: cmd_str.clone(),
            source,
        })?;
        let mut stop_rx = handle.attach();

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let on_output = Arc::new(on_output);

        let on_stdout = on_output.clone();
        let stdout_task = tokio::spawn(async move {
            if let Some(stdout) = stdout {
                let mut reader = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = reader.next_line().await {
                    on_stdout(OutputStream::Stdout, &line);
                }
            }
        });

        let on_stderr = on_output.clone();
        let stderr_task = tokio::spawn(async move {
            if let Some(stderr) = stderr {
                let mut reader = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = reader.next_line().await {
                    on_stderr(OutputStream::Stderr, &line);
                }
            }
        });

        let mut interrupted = false;
        let mut stop_pending = true;
        let waited = loop {
            tokio::select! {
                status = child.wait() => break status,
                stop = &mut stop_rx, if stop_pending => {
                    stop_pending = false;
                    if stop.is_ok() {
                        interrupted = true;
                        #[cfg(unix)]
                        request_termination(&child);
                        #[cfg(not(unix))]
                        request_termination(&mut child);
                    }
                }
            }
        };
        handle.detach();
        let status = waited?;
        let elapsed = started.elapsed();

        let (stdout_res, stderr_res) = tokio::join!(stdout_task, stderr_task);
        stdout_res?;
        stderr_res?;

        debug!("Command completed with status: {}", status);
        Ok(ProcessOutcome {
            success: status.success(),
            code: status.code(),
            elapsed,
            interrupted,
        })
    }
}
