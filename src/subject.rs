//! The tool under test, invoked as an external process.
use async_trait::async_trait;
use std::fmt;
use std::io;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// Captured result of a subject tool run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Invocation {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self
            .code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "none".to_string());
        write!(
            f,
            "exit code: {code}\nStdout: {}\nStderr: {}",
            self.stdout, self.stderr
        )
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubjectTool: Send + Sync {
    /// Runs the tool with the provided arguments and waits for it to finish.
    async fn invoke(&self, args: &[String]) -> io::Result<Invocation>;
}

/// Runs the `kubectl-shovel` binary (or any binary with the same command line contract).
#[derive(Debug, Clone)]
pub struct ShovelBinary {
    binary: PathBuf,
}

impl ShovelBinary {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl SubjectTool for ShovelBinary {
    async fn invoke(&self, args: &[String]) -> io::Result<Invocation> {
        debug!("running {} {}", self.binary.display(), args.join(" "));
        let output = Command::new(&self.binary).args(args).output().await?;

        Ok(Invocation {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
