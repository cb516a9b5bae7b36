//! Scoped on-disk artifacts.
//!
//! A [`TempResource`] owns one file path for the duration of a pipeline run.
//! It is deleted exactly once: by an explicit [`TempResource::release`], or
//! on drop if the run bailed out before releasing it. A path that was
//! reserved but never written is not an error to release.

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

#[derive(Debug)]
pub struct TempResource {
    path: PathBuf,
    armed: bool,
}

impl TempResource {
    /// Claim a unique path without creating the file; a downstream step
    /// (e.g. the transcoder) writes it.
    ///
    /// Names carry a UUIDv7 suffix so concurrent runs for the same user
    /// never collide.
    pub fn reserve(dir: &Path, owner: &str, label: &str, ext: &str) -> Self {
        let owner: String = owner
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        let name = format!("{owner}-{label}-{}.{ext}", Uuid::now_v7().simple());
        Self {
            path: dir.join(name),
            armed: true,
        }
    }

    /// Claim a unique path and write `bytes` to it.
    pub async fn write(
        dir: &Path,
        owner: &str,
        label: &str,
        ext: &str,
        bytes: &[u8],
    ) -> io::Result<Self> {
        let resource = Self::reserve(dir, owner, label, ext);
        // On failure `resource` drops here and removes any partial file.
        tokio::fs::write(&resource.path, bytes).await?;
        Ok(resource)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }

    /// Delete the file now. Consumes the resource so it cannot be deleted twice.
    pub async fn release(mut self) -> io::Result<()> {
        self.armed = false;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "released temp resource");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for TempResource {
    fn drop(&mut self) {
        if self.armed {
            match std::fs::remove_file(&self.path) {
                Ok(()) => {
                    tracing::debug!(path = %self.path.display(), "removed temp resource on drop")
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "failed to remove temp resource")
                }
            }
        }
    }
}

/// Every temp resource created during one run, released together at the end.
#[derive(Debug, Default)]
pub struct TempSet {
    resources: Vec<TempResource>,
}

impl TempSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a resource and return its path.
    pub fn track(&mut self, resource: TempResource) -> PathBuf {
        let path = resource.path().to_path_buf();
        self.resources.push(resource);
        path
    }

    /// Release one tracked resource early (e.g. the raw download once it
    /// has been transcoded).
    pub async fn release_path(&mut self, path: &Path) {
        if let Some(pos) = self.resources.iter().position(|r| r.path() == path) {
            let resource = self.resources.swap_remove(pos);
            if let Err(e) = resource.release().await {
                tracing::warn!(path = %path.display(), error = %e, "failed to release temp resource");
            }
        }
    }

    /// Release everything still tracked. Returns how many were released.
    pub async fn release_all(&mut self) -> usize {
        let count = self.resources.len();
        for resource in self.resources.drain(..) {
            let path = resource.path().to_path_buf();
            if let Err(e) = resource.release().await {
                tracing::warn!(path = %path.display(), error = %e, "failed to release temp resource");
            }
        }
        count
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_release_removes_file() {
        let dir = TempDir::new().unwrap();
        let res = TempResource::write(dir.path(), "U1", "raw", "mp4", b"abc")
            .await
            .unwrap();
        let path = res.path().to_path_buf();
        assert_eq!(res.read().await.unwrap(), b"abc");

        res.release().await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_drop_removes_unreleased_file() {
        let dir = TempDir::new().unwrap();
        let path = {
            let res = TempResource::write(dir.path(), "U1", "raw", "mp4", b"abc")
                .await
                .unwrap();
            res.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_release_of_never_written_reservation_is_ok() {
        let dir = TempDir::new().unwrap();
        let res = TempResource::reserve(dir.path(), "U1", "resized", "mp4");
        assert!(!res.path().exists());
        res.release().await.unwrap();
    }

    #[test]
    fn test_same_owner_gets_distinct_paths() {
        let dir = Path::new("/tmp");
        let a = TempResource::reserve(dir, "U1", "raw", "mp4");
        let b = TempResource::reserve(dir, "U1", "raw", "mp4");
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_owner_is_sanitized() {
        let res = TempResource::reserve(Path::new("/tmp"), "../U1", "raw", "mp4");
        let name = res.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("U1-raw-"));
        assert_eq!(res.path().parent().unwrap(), Path::new("/tmp"));
    }

    #[tokio::test]
    async fn test_temp_set_releases_each_resource_once() {
        let dir = TempDir::new().unwrap();
        let mut set = TempSet::new();
        let raw = set.track(
            TempResource::write(dir.path(), "U1", "raw", "mp4", b"1")
                .await
                .unwrap(),
        );
        let thumb = set.track(
            TempResource::write(dir.path(), "U1", "thumb", "jpeg", b"2")
                .await
                .unwrap(),
        );

        set.release_path(&raw).await;
        assert!(!raw.exists());
        assert_eq!(set.len(), 1);

        // Releasing an already released path is a no-op.
        set.release_path(&raw).await;
        assert_eq!(set.release_all().await, 1);
        assert!(!thumb.exists());
        assert!(set.is_empty());
    }
}
