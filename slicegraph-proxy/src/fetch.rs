//! HTTP-backed remote file fetcher.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::{Client, Url};
use sha2::{Digest, Sha256};
use tokio::sync::{OnceCell, Semaphore};
use tracing::debug;

use crate::environment::{FetchRequest, FileNode, RemoteFileFetcher};

/// Downloads files into a cache directory.
///
/// Files are stored as `<sha256(url)>.<ext>` and the digest doubles as the
/// file node id. Each URL is downloaded at most once per fetcher, even when
/// requested concurrently; a failed download is retried on the next request.
/// A cached file is reported with the parent of the request that asked for it.
pub struct HttpFileFetcher {
    client: Client,
    cache_dir: PathBuf,
    permits: Arc<Semaphore>,
    files: DashMap<String, Arc<OnceCell<FileNode>>>,
}

impl HttpFileFetcher {
    pub fn new(cache_dir: impl Into<PathBuf>, max_concurrent_downloads: usize) -> Self {
        Self::with_client(Client::new(), cache_dir, max_concurrent_downloads)
    }

    pub fn with_client(
        client: Client,
        cache_dir: impl Into<PathBuf>,
        max_concurrent_downloads: usize,
    ) -> Self {
        Self {
            client,
            cache_dir: cache_dir.into(),
            permits: Arc::new(Semaphore::new(max_concurrent_downloads.max(1))),
            files: DashMap::new(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    async fn download(&self, request: &FetchRequest) -> anyhow::Result<FileNode> {
        let url = Url::parse(&request.url).with_context(|| format!("invalid URL {}", request.url))?;
        let id = file_id(&request.url);
        let path = self.cache_dir.join(file_name(&id, &url));

        let _permit = self
            .permits
            .acquire()
            .await
            .context("download limiter closed")?;

        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .with_context(|| format!("creating {}", self.cache_dir.display()))?;
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        debug!(url = %request.url, path = %path.display(), size = bytes.len(), "downloaded remote file");

        Ok(FileNode {
            id,
            parent_node_id: request.parent_node_id.clone(),
            url: request.url.clone(),
            path,
            size: bytes.len() as u64,
        })
    }
}

#[async_trait]
impl RemoteFileFetcher for HttpFileFetcher {
    async fn fetch(&self, request: FetchRequest) -> anyhow::Result<FileNode> {
        let cell = Arc::clone(&self.files.entry(request.url.clone()).or_default());
        let node = cell.get_or_try_init(|| self.download(&request)).await?;
        Ok(FileNode {
            parent_node_id: request.parent_node_id,
            ..node.clone()
        })
    }
}

/// Node id of a remote file: the hex SHA-256 of its URL.
pub fn file_id(url: &str) -> String {
    format!("{:x}", Sha256::digest(url.as_bytes()))
}

/// Cache file name, keeping a short alphanumeric extension from the URL path.
fn file_name(id: &str, url: &Url) -> String {
    let extension = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|last| last.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("{id}.{}", ext.to_ascii_lowercase()),
        None => id.to_string(),
    }
}
