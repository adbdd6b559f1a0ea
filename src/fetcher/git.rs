use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info};

use crate::core::error::{KeyhoundError, Result};

/// True if the target looks like a remote repository rather than a local path.
pub fn is_remote_target(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://") || target.starts_with("git@")
}

/// Clones a remote repository into a session-scoped temporary directory.
///
/// The checkout lives only as long as this fetcher: dropping it removes the
/// temporary directory on every exit path, including cancellation.
pub struct GitFetcher {
    url: String,
    temp: Option<TempDir>,
    checkout: Option<PathBuf>,
}

impl GitFetcher {
    pub fn new(url: &str) -> Result<Self> {
        if !is_remote_target(url) {
            return Err(KeyhoundError::InvalidTarget(format!(
                "not a recognized repository URL: {}",
                url
            )));
        }
        Ok(Self {
            url: url.to_string(),
            temp: None,
            checkout: None,
        })
    }

    /// Repository name derived from the URL, for display.
    pub fn repo_name(&self) -> String {
        self.url
            .trim_end_matches('/')
            .trim_end_matches(".git")
            .rsplit('/')
            .next()
            .unwrap_or("repository")
            .to_string()
    }

    /// Shallow-clone the repository head and return the checkout path.
    pub async fn clone_repo(&mut self) -> Result<&Path> {
        let temp = TempDir::new()?;
        let checkout = temp.path().join(self.repo_name());

        info!("Cloning {} (depth 1)", self.url);
        let output = Command::new("git")
            .arg("clone")
            .arg("--depth")
            .arg("1")
            .arg("--quiet")
            .arg(&self.url)
            .arg(&checkout)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KeyhoundError::GitClone(format!(
                "{}: {}",
                self.url,
                stderr.trim()
            )));
        }

        debug!("Cloned into {}", checkout.display());
        self.temp = Some(temp);
        self.checkout = Some(checkout);
        Ok(self.checkout.as_deref().unwrap_or(Path::new(".")))
    }

    /// Resolve the checked-out HEAD commit hash.
    pub async fn head_commit(&self) -> Result<String> {
        let checkout = self.checkout.as_deref().ok_or_else(|| {
            KeyhoundError::GitClone("repository has not been cloned".to_string())
        })?;

        let output = Command::new("git")
            .arg("-C")
            .arg(checkout)
            .arg("rev-parse")
            .arg("HEAD")
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KeyhoundError::GitClone(format!(
                "rev-parse failed: {}",
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    pub fn checkout_path(&self) -> Option<&Path> {
        self.checkout.as_deref()
    }
}
