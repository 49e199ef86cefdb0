use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;

/// Blob store for uploaded profile pictures. Keys are bare filenames; the
/// store decides where they live.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn put(&self, filename: &str, body: Bytes) -> anyhow::Result<()>;
    async fn delete(&self, filename: &str) -> anyhow::Result<()>;
}

/// Local-disk implementation rooted at the configured upload directory.
#[derive(Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn ensure_root(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .context("create upload directory")
    }
}

#[async_trait]
impl FileStore for DiskStore {
    async fn put(&self, filename: &str, body: Bytes) -> anyhow::Result<()> {
        let path = self.root.join(filename);
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write upload {}", path.display()))
    }

    async fn delete(&self, filename: &str) -> anyhow::Result<()> {
        let path = self.root.join(filename);
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("delete upload {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> DiskStore {
        let dir = std::env::temp_dir().join(format!("scribe-store-{}", uuid::Uuid::new_v4()));
        DiskStore::new(dir)
    }

    #[tokio::test]
    async fn put_then_delete_roundtrip() {
        let store = temp_store();
        store.ensure_root().await.expect("create root");

        store
            .put("photo.jpg", Bytes::from_static(b"fake-jpeg"))
            .await
            .expect("put");
        let on_disk = tokio::fs::read(store.root.join("photo.jpg"))
            .await
            .expect("read back");
        assert_eq!(on_disk, b"fake-jpeg");

        store.delete("photo.jpg").await.expect("delete");
        assert!(!store.root.join("photo.jpg").exists());
    }

    #[tokio::test]
    async fn delete_missing_file_errors() {
        let store = temp_store();
        store.ensure_root().await.expect("create root");
        assert!(store.delete("nope.png").await.is_err());
    }
}
