/// Kubeconfig context operations through kubectl
use anyhow::Result;
use futures::future::BoxFuture;
use std::path::PathBuf;
use tracing::info;

use super::kubectl::KubectlCommand;
use crate::tabs::{SwitchError, ContextSwitcher};

/// Kubernetes client for kubectl context operations
#[derive(Debug, Clone)]
pub struct KubernetesClient {
    program: String,
    kubeconfig: Option<PathBuf>,
}

impl KubernetesClient {
    pub fn new(kubeconfig: Option<PathBuf>) -> Self {
        Self {
            program: "kubectl".to_string(),
            kubeconfig,
        }
    }

    #[cfg(test)]
    fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
            kubeconfig: None,
        }
    }

    fn command(&self) -> KubectlCommand {
        KubectlCommand::new(&self.program).kubeconfig(self.kubeconfig.as_deref())
    }

    /// Check if kubectl is installed
    pub async fn check_kubectl_installed(&self) -> Result<()> {
        match self.command().args(["version", "--client"]).output().await {
            Ok(out) if out.success => Ok(()),
            _ => anyhow::bail!(
                "{} is not installed or not in PATH. Please install from https://kubernetes.io/docs/tasks/tools/",
                self.program
            ),
        }
    }

    /// Context names from the kubeconfig
    pub async fn list_contexts(&self) -> Result<Vec<String>> {
        let stdout = self
            .command()
            .args(["config", "get-contexts", "-o", "name"])
            .describe("kubectl config get-contexts")
            .run()
            .await?;
        Ok(parse_context_names(&stdout))
    }

    /// Make `context` the kubeconfig's current context
    pub async fn use_context(&self, context: &str) -> Result<()> {
        info!("Switching kubectl context to: {}", context);
        self.command()
            .args(["config", "use-context", context])
            .describe(format!("kubectl config use-context {}", context))
            .run()
            .await?;
        Ok(())
    }
}

impl ContextSwitcher for KubernetesClient {
    fn switch_context<'a>(&'a self, cluster: &'a str) -> BoxFuture<'a, Result<(), SwitchError>> {
        Box::pin(async move {
            self.use_context(cluster)
                .await
                .map_err(|e| SwitchError::Command(format!("{:#}", e)))
        })
    }
}

fn parse_context_names(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
