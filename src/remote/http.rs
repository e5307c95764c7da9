//! HTTP implementation of the remote collaborators.

use super::{ArtifactFetcher, CatalogFetcher};
use crate::options::with_suffix;
use crate::{InstallError, RemoteOptions, VersionToken, TOKEN_PREFIX};
use futures::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Longest response excerpt kept in a [`InstallError::CatalogMalformed`].
const EXCERPT_LEN: usize = 40;

/// Client for the VEXos content server.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    options: RemoteOptions,
}

impl HttpRemote {
    /// Build a client for `options`.
    ///
    /// Fails if the HTTP backend cannot be initialised, for example when no
    /// TLS roots are available.
    pub fn new(options: RemoteOptions) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!("vexos-dl/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, options })
    }

    pub fn options(&self) -> &RemoteOptions {
        &self.options
    }

    async fn download_to(&self, url: &str, part: &Path) -> Result<(), InstallError> {
        let failed = |status: Option<u16>, source: Option<crate::BoxError>| {
            InstallError::DownloadFailed {
                url: url.to_string(),
                status,
                source,
            }
        };

        if let Some(parent) = part.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| failed(None, Some(e.into())))?;
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| failed(None, Some(e.into())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(Some(status.as_u16()), None));
        }

        let mut file = tokio::fs::File::create(part)
            .await
            .map_err(|e| failed(None, Some(e.into())))?;

        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| failed(None, Some(e.into())))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| failed(None, Some(e.into())))?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| failed(None, Some(e.into())))?;
        debug!("Wrote {} bytes to {}", written, part.display());
        Ok(())
    }
}

impl CatalogFetcher for HttpRemote {
    async fn latest(&self) -> Result<String, InstallError> {
        let url = self.options.catalog_url();
        debug!("Fetching catalog from {}", url);

        let unavailable = |status: Option<u16>, source: Option<crate::BoxError>| {
            InstallError::CatalogUnavailable {
                url: url.clone(),
                status,
                source,
            }
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(None, Some(e.into())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(Some(status.as_u16()), None));
        }

        let body = response
            .text()
            .await
            .map_err(|e| unavailable(None, Some(e.into())))?;

        check_catalog_body(&url, &body).map(str::to_string)
    }
}

impl ArtifactFetcher for HttpRemote {
    async fn fetch(&self, token: &VersionToken, dest: &Path) -> Result<(), InstallError> {
        let url = self.options.artifact_url(token.as_str());
        let part = with_suffix(dest, ".part");
        info!("Downloading {} to {}", url, dest.display());

        if let Err(e) = self.download_to(&url, &part).await {
            discard_partial(&part).await;
            return Err(e);
        }

        if let Err(e) = tokio::fs::rename(&part, dest).await {
            discard_partial(&part).await;
            return Err(InstallError::DownloadFailed {
                url,
                status: None,
                source: Some(e.into()),
            });
        }
        Ok(())
    }
}

async fn discard_partial(part: &Path) {
    if let Err(e) = tokio::fs::remove_file(part).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove partial download {}: {}", part.display(), e);
        }
    }
}

/// Validate a catalog response and return the token it carries.
pub(crate) fn check_catalog_body<'a>(url: &str, body: &'a str) -> Result<&'a str, InstallError> {
    let trimmed = body.trim();
    if !trimmed.starts_with(TOKEN_PREFIX) {
        return Err(InstallError::CatalogMalformed {
            url: url.to_string(),
            excerpt: trimmed.chars().take(EXCERPT_LEN).collect(),
        });
    }
    Ok(trimmed)
}
