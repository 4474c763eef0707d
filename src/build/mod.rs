// Catalog rebuild - runs the external build step through a shell and checks
// that it actually left a catalog behind.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    pub shell: String,
    pub script: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    /// `Err` carries the message to show the user verbatim.
    Finished(Result<(), String>),
}

impl BuildCommand {
    pub fn new(shell: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            script: script.into(),
        }
    }

    /// Run the build to completion. Success means exit code 0 and a catalog
    /// present at `catalog_path` afterwards.
    pub async fn run(&self, catalog_path: &Path) -> Result<(), String> {
        info!("Starting catalog build: {}", self.script);

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(&self.script)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| format!("failed to start build: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let message = if stderr.is_empty() {
                format!("build failed: {}", output.status)
            } else {
                stderr.to_string()
            };
            warn!("Catalog build failed: {}", message);
            return Err(message);
        }

        if let Some(last) = String::from_utf8_lossy(&output.stdout).lines().last() {
            debug!(last_line = %last, "build output");
        }

        if !catalog_path.exists() {
            let message = format!(
                "build finished but catalog not found at {}",
                catalog_path.display()
            );
            warn!("{}", message);
            return Err(message);
        }

        info!("Catalog build finished");
        Ok(())
    }

    /// Run in the background and post the result to `events`.
    pub fn spawn(&self, catalog_path: PathBuf, events: mpsc::UnboundedSender<BuildEvent>) -> JoinHandle<()> {
        let command = self.clone();
        tokio::spawn(async move {
            let result = command.run(&catalog_path).await;
            let _ = events.send(BuildEvent::Finished(result));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn success_requires_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("tree.json");
        let script = format!("echo '[]' > '{}'", catalog.display());

        let result = BuildCommand::new("sh", script).run(&catalog).await;
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn zero_exit_without_catalog_fails() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("tree.json");

        let err = BuildCommand::new("sh", "true").run(&catalog).await.unwrap_err();
        assert!(err.contains("catalog not found"), "{}", err);
    }

    #[tokio::test]
    async fn stderr_is_surfaced_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let err = BuildCommand::new("sh", "echo 'no cache dir' >&2; exit 3")
            .run(&dir.path().join("tree.json"))
            .await
            .unwrap_err();
        assert_eq!(err, "no cache dir");
    }

    #[tokio::test]
    async fn silent_failure_reports_status() {
        let dir = tempfile::tempdir().unwrap();
        let err = BuildCommand::new("sh", "exit 2")
            .run(&dir.path().join("tree.json"))
            .await
            .unwrap_err();
        assert!(err.starts_with("build failed"), "{}", err);
    }

    #[tokio::test]
    async fn spawn_posts_completion() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        BuildCommand::new("sh", "exit 1")
            .spawn(dir.path().join("tree.json"), tx)
            .await
            .unwrap();

        assert!(matches!(rx.recv().await, Some(BuildEvent::Finished(Err(_)))));
    }
}
