use bytes::Bytes;
use rand::Rng;
use time::OffsetDateTime;
use tracing::warn;

use crate::error::ApiError;
use crate::storage::FileStore;
use crate::users::dto::DEFAULT_PICTURE;

/// Hard cap checked before anything touches the upload directory.
pub const MAX_FILE_BYTES: usize = 5_000_000;

const ALLOWED_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// Validate the original filename's extension and return it lowercased
/// (with the leading dot) for reuse in the generated name.
pub fn validate_extension(original_name: &str) -> Result<String, ApiError> {
    let lowered = original_name.to_lowercase();
    for ext in ALLOWED_EXTENSIONS {
        if lowered.ends_with(ext) {
            return Ok(ext.to_string());
        }
    }
    Err(ApiError::Validation(
        "Please upload an image file (jpg, jpeg, or png)".into(),
    ))
}

pub fn validate_size(len: usize) -> Result<(), ApiError> {
    if len > MAX_FILE_BYTES {
        return Err(ApiError::Validation(
            "Image must be 5MB or smaller".into(),
        ));
    }
    Ok(())
}

/// Collision-resistant name: millisecond timestamp plus a random suffix,
/// keeping the original extension.
pub fn unique_filename(ext: &str) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let suffix = rand::thread_rng().gen_range(0..1_000_000_000u32);
    format!("{millis}-{suffix}{ext}")
}

pub fn is_default_picture(path: &str) -> bool {
    path.contains(
        DEFAULT_PICTURE
            .rsplit('/')
            .next()
            .unwrap_or(DEFAULT_PICTURE),
    )
}

/// Bare filename component of a stored picture path, usable as a store key.
pub fn stored_filename(path: &str) -> Option<&str> {
    path.rsplit('/').next().filter(|s| !s.is_empty())
}

/// Write the replacement picture and return the relative path to persist on
/// the user record. Callers persist the record only after this succeeds.
pub async fn store_picture(
    files: &dyn FileStore,
    filename: &str,
    body: Bytes,
) -> Result<String, ApiError> {
    files.put(filename, body).await?;
    Ok(format!("uploads/{filename}"))
}

/// Best-effort removal of a superseded picture, called after the record
/// already points at the new file. The default placeholder is never deleted;
/// failures are logged, not surfaced.
pub async fn cleanup_old_picture(files: &dyn FileStore, old_path: &str) {
    if is_default_picture(old_path) {
        return;
    }
    let Some(old) = stored_filename(old_path) else {
        return;
    };
    if let Err(e) = files.delete(old).await {
        warn!(error = %e, path = %old_path, "failed to delete old profile picture");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_jpg_jpeg_png_case_insensitive() {
        assert_eq!(validate_extension("me.jpg").unwrap(), ".jpg");
        assert_eq!(validate_extension("me.JPEG").unwrap(), ".jpeg");
        assert_eq!(validate_extension("Photo.PNG").unwrap(), ".png");
    }

    #[test]
    fn rejects_other_extensions() {
        assert!(validate_extension("anim.gif").is_err());
        assert!(validate_extension("doc.pdf").is_err());
        assert!(validate_extension("noext").is_err());
        // jpg must be the extension, not a substring
        assert!(validate_extension("photo.jpg.exe").is_err());
    }

    #[test]
    fn size_limit_is_exact() {
        assert!(validate_size(MAX_FILE_BYTES).is_ok());
        assert!(validate_size(MAX_FILE_BYTES + 1).is_err());
        assert!(validate_size(8_000_000).is_err());
        assert!(validate_size(0).is_ok());
    }

    #[test]
    fn unique_filename_keeps_extension_and_varies() {
        let a = unique_filename(".png");
        let b = unique_filename(".png");
        assert!(a.ends_with(".png"));
        assert!(b.ends_with(".png"));
        assert_ne!(a, b);
        // shape: <millis>-<suffix>.png
        let stem = a.strip_suffix(".png").unwrap();
        let (millis, suffix) = stem.split_once('-').expect("dash separator");
        assert!(millis.parse::<i128>().is_ok());
        assert!(suffix.parse::<u32>().is_ok());
    }

    #[test]
    fn default_picture_is_recognized_in_any_form() {
        assert!(is_default_picture("uploads/default-profile.jpg"));
        assert!(is_default_picture("/uploads/default-profile.jpg"));
        assert!(!is_default_picture("uploads/1700000000000-42.jpg"));
    }

    #[test]
    fn stored_filename_strips_directories() {
        assert_eq!(stored_filename("uploads/a.jpg"), Some("a.jpg"));
        assert_eq!(stored_filename("/uploads/a.jpg"), Some("a.jpg"));
        assert_eq!(stored_filename("a.jpg"), Some("a.jpg"));
        assert_eq!(stored_filename("uploads/"), None);
    }

    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records store calls so tests can assert what got written and deleted.
    #[derive(Default)]
    struct RecordingStore {
        puts: Mutex<Vec<String>>,
        deletes: Mutex<Vec<String>>,
        fail_delete: bool,
    }

    #[async_trait]
    impl FileStore for RecordingStore {
        async fn put(&self, filename: &str, _body: Bytes) -> anyhow::Result<()> {
            self.puts.lock().unwrap().push(filename.to_string());
            Ok(())
        }

        async fn delete(&self, filename: &str) -> anyhow::Result<()> {
            if self.fail_delete {
                anyhow::bail!("disk on fire");
            }
            self.deletes.lock().unwrap().push(filename.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn replacement_writes_new_and_deletes_exactly_the_old_file() {
        let store = RecordingStore::default();

        let rel = store_picture(&store, "1700000000000-7.png", Bytes::from_static(b"img"))
            .await
            .expect("store");
        assert_eq!(rel, "uploads/1700000000000-7.png");

        cleanup_old_picture(&store, "uploads/1600000000000-3.jpg").await;

        assert_eq!(*store.puts.lock().unwrap(), vec!["1700000000000-7.png"]);
        assert_eq!(*store.deletes.lock().unwrap(), vec!["1600000000000-3.jpg"]);
    }

    #[tokio::test]
    async fn default_placeholder_is_never_deleted() {
        let store = RecordingStore::default();
        cleanup_old_picture(&store, DEFAULT_PICTURE).await;
        assert!(store.deletes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cleanup_failure_is_swallowed() {
        let store = RecordingStore {
            fail_delete: true,
            ..Default::default()
        };
        // must not panic or surface the error
        cleanup_old_picture(&store, "uploads/1600000000000-3.jpg").await;
    }

    #[tokio::test]
    async fn on_disk_replacement_leaves_only_the_new_file() {
        use crate::storage::DiskStore;

        let dir = std::env::temp_dir().join(format!("scribe-upload-{}", uuid::Uuid::new_v4()));
        let store = DiskStore::new(dir.clone());
        store.ensure_root().await.expect("create root");

        store
            .put("old.jpg", Bytes::from_static(b"old"))
            .await
            .expect("seed old picture");

        let rel = store_picture(&store, "new.png", Bytes::from_static(b"new"))
            .await
            .expect("store new");
        cleanup_old_picture(&store, "uploads/old.jpg").await;

        let names: Vec<String> = std::fs::read_dir(&dir)
            .expect("read upload dir")
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["new.png"]);
        assert_eq!(rel, "uploads/new.png");
    }
}
