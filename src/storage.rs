use std::io;
use std::path::{Path, PathBuf};

use crate::models::photos::PhotoId;

/// Blob store for uploaded images, keyed by photo id + filename to match
/// the `/api/files/photos/{id}/{name}` serving convention.
#[derive(Clone, Debug)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: &Path) -> Self {
        LocalStore {
            root: root.to_path_buf(),
        }
    }

    pub async fn put(&self, photo_id: PhotoId, filename: &str, data: &[u8]) -> io::Result<()> {
        let dir = self.root.join(photo_id.to_string());
        async_std::fs::create_dir_all(&dir).await?;
        async_std::fs::write(dir.join(filename), data).await
    }

    pub fn path_for(&self, photo_id: PhotoId, filename: &str) -> PathBuf {
        self.root.join(photo_id.to_string()).join(filename)
    }
}

/// Names this store accepts: no path separators, no parent references.
pub fn safe_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\') && !name.contains("..")
}
