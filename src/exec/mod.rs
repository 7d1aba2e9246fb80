pub mod local;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::interrupt::ProcessHandle;
use crate::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Everything needed to start one external process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub current_dir: PathBuf,
}

impl ProcessSpec {
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for ProcessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutcome {
    pub success: bool,
    pub code: Option<i32>,
    pub elapsed: Duration,
    /// A stop was requested through the [`ProcessHandle`] before exit.
    pub interrupted: bool,
}

#[async_trait]
pub trait Executor: Send + Sync {
    /// Runs `spec` to completion. Every output line is passed to `on_output`
    /// as it arrives. The child is attached to `handle` for its lifetime.
    async fn execute<F>(
        &self,
        spec: &ProcessSpec,
        handle: &ProcessHandle,
        on_output: F,
    ) -> Result<ProcessOutcome>
    where
        F: Fn(OutputStream, &str) + Send + Sync + 'static;
}
