use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::domain::errors::DomainError;

/// URL prefix under which stored images are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Product images on local disk.
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copies an uploaded file into the store under a fresh name and returns
    /// its public URL.
    pub fn save(&self, original_name: Option<&str>, source: &Path) -> Result<String, DomainError> {
        let extension = original_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| DomainError::InvalidInput("Only image files are allowed".into()))?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        fs::copy(source, self.dir.join(&file_name))
            .map_err(|e| DomainError::Internal(format!("failed to store image: {}", e)))?;
        Ok(format!("{}/{}", PUBLIC_PREFIX, file_name))
    }

    /// Deletes an image previously returned by `save`. Unknown URLs are ignored.
    pub fn remove(&self, url: &str) {
        let Some(file_name) = url
            .strip_prefix(PUBLIC_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && *name != "..")
        else {
            return;
        };
        if let Err(e) = fs::remove_file(self.dir.join(file_name)) {
            log::warn!("failed to remove image {}: {}", file_name, e);
        }
    }
}
