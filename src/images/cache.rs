use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::filename::image_filename;
use crate::config::ImageConfig;

/// On-disk image cache. A file named `<hash><ext>` under `dir` is the only
/// cache-hit signal; its public path is `<public_prefix>/<hash><ext>`.
#[derive(Debug, Clone)]
pub struct ImageCache {
    dir: PathBuf,
    public_prefix: String,
}

impl ImageCache {
    pub fn new(dir: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        let prefix: String = public_prefix.into();
        Self {
            dir: dir.into(),
            public_prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ImageConfig) -> Self {
        Self::new(config.dir.clone(), config.public_prefix.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating image cache dir {}", self.dir.display()))
    }

    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    pub fn public_path(&self, filename: &str) -> String {
        format!("{}/{}", self.public_prefix, filename)
    }

    /// Existence check without any network access: the public path of the
    /// cached copy of `url`, if one is on disk.
    pub async fn lookup(&self, url: &str) -> Option<String> {
        let filename = image_filename(url)?;
        self.contains(&filename)
            .await
            .then(|| self.public_path(&filename))
    }

    pub async fn contains(&self, filename: &str) -> bool {
        tokio::fs::try_exists(self.file_path(filename))
            .await
            .unwrap_or(false)
    }

    pub async fn write(&self, filename: &str, bytes: &[u8]) -> Result<()> {
        let path = self.file_path(filename);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing cached image {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_hits_only_existing_files() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = ImageCache::new(tmp.path(), "/images/");
        let url = "/uploads/chair.png";
        assert_eq!(cache.lookup(url).await, None);

        let name = image_filename(url).unwrap();
        std::fs::write(tmp.path().join(&name), b"png").unwrap();
        assert_eq!(cache.lookup(url).await, Some(format!("/images/{name}")));
        assert_eq!(cache.lookup("").await, None);
    }

    #[tokio::test]
    async fn write_then_contains() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = ImageCache::new(tmp.path().join("nested/images"), "/images");
        cache.ensure_dir().await.unwrap();
        assert!(!cache.contains("abc.jpg").await);
        cache.write("abc.jpg", b"bytes").await.unwrap();
        assert!(cache.contains("abc.jpg").await);
        assert_eq!(std::fs::read(cache.file_path("abc.jpg")).unwrap(), b"bytes");
    }
}
