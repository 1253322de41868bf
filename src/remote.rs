//! Transport for published artifacts: an HTTP host or a plain directory.

use std::path::{Path, PathBuf};

use crate::error::{CliError, CliResult};

#[derive(Debug, Clone)]
pub enum Remote {
    Http {
        base_url: String,
        token: Option<String>,
        client: reqwest::Client,
    },
    Directory(PathBuf),
}

impl Remote {
    /// `http://` and `https://` locations go over HTTP, anything else is a directory.
    pub fn from_location(location: &str, token: Option<String>) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Http {
                base_url: location.trim_end_matches('/').to_string(),
                token,
                client: reqwest::Client::new(),
            }
        } else {
            Self::Directory(PathBuf::from(location))
        }
    }

    pub fn describe(&self, relative: &str) -> String {
        match self {
            Self::Http { base_url, .. } => format!("{}/{}", base_url, relative),
            Self::Directory(dir) => dir.join(relative).display().to_string(),
        }
    }

    /// Download one artifact by its path relative to the state root.
    pub async fn fetch(&self, relative: &str) -> CliResult<Vec<u8>> {
        let target = self.describe(relative);
        match self {
            Self::Http { client, token, .. } => {
                let mut request = client.get(&target);
                if let Some(token) = token {
                    request = request.bearer_auth(token);
                }
                let response = request
                    .send()
                    .await
                    .map_err(|e| CliError::external(&target, e))?;
                if !response.status().is_success() {
                    return Err(CliError::external(
                        &target,
                        format!("HTTP {}", response.status()),
                    ));
                }
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| CliError::external(&target, e))?;
                Ok(bytes.to_vec())
            }
            Self::Directory(dir) => tokio::fs::read(dir.join(relative))
                .await
                .map_err(|e| CliError::external(&target, e)),
        }
    }

    /// Upload one artifact, replacing what the remote holds.
    pub async fn put(&self, relative: &str, body: Vec<u8>) -> CliResult<()> {
        let target = self.describe(relative);
        match self {
            Self::Http { client, token, .. } => {
                let mut request = client.put(&target).body(body);
                if let Some(token) = token {
                    request = request.bearer_auth(token);
                }
                let response = request
                    .send()
                    .await
                    .map_err(|e| CliError::external(&target, e))?;
                if !response.status().is_success() {
                    return Err(CliError::external(
                        &target,
                        format!("HTTP {}", response.status()),
                    ));
                }
                Ok(())
            }
            Self::Directory(dir) => {
                let path = dir.join(relative);
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| CliError::external(&target, e))?;
                }
                tokio::fs::write(&path, body)
                    .await
                    .map_err(|e| CliError::external(&target, e))
            }
        }
    }
}

/// Path of `file` relative to `root`, with `/` separators.
pub fn relative_path(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
