/// kubectl invocation
use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Captured result of a kubectl run
#[derive(Debug)]
pub struct KubectlOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl KubectlOutput {
    fn from_output(output: std::process::Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        }
    }

    /// Stdout on success, stderr as the error otherwise
    pub fn into_result(self) -> Result<String> {
        if self.success {
            Ok(self.stdout)
        } else {
            anyhow::bail!("{}", self.stderr.trim())
        }
    }
}

/// Builder for a single kubectl call
pub struct KubectlCommand {
    command: Command,
    description: String,
}

impl KubectlCommand {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        let mut command = Command::new(program);
        command.stdout(Stdio::piped()).stderr(Stdio::piped());
        Self {
            command,
            description: "kubectl".to_string(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.command.args(args);
        self
    }

    /// Point kubectl at a specific kubeconfig; `None` keeps the ambient one
    pub fn kubeconfig(mut self, path: Option<&Path>) -> Self {
        if let Some(path) = path {
            self.command.env("KUBECONFIG", path);
        }
        self
    }

    /// Label used in error context
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub async fn output(mut self) -> Result<KubectlOutput> {
        debug!("Running {}", self.description);
        let output = self
            .command
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.description))?;
        Ok(KubectlOutput::from_output(output))
    }

    pub async fn run(self) -> Result<String> {
        let description = self.description.clone();
        self.output()
            .await?
            .into_result()
            .with_context(|| format!("{} failed", description))
    }
}
