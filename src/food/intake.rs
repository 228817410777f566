use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("No image uploaded")]
    Missing,
    #[error("Uploaded file is not a supported image")]
    NotAnImage,
    #[error("Failed to store uploaded image: {0}")]
    Io(#[from] std::io::Error),
}

impl IntakeError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, IntakeError::Missing | IntakeError::NotAnImage)
    }
}

/// Handle to one transiently stored upload.
///
/// Not `Clone`: releasing consumes it, so a handle can't be used after
/// deletion was requested.
#[derive(Debug, PartialEq, Eq)]
pub struct ImageHandle {
    id: Uuid,
    path: PathBuf,
}

impl ImageHandle {
    pub fn new(id: Uuid, path: PathBuf) -> Self {
        Self { id, path }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

/// Transient storage for uploads that are being analyzed.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn accept(&self, bytes: &[u8]) -> Result<ImageHandle, IntakeError>;

    async fn read(&self, handle: &ImageHandle) -> Result<Vec<u8>, IntakeError>;

    /// Best effort; failures are logged, never returned.
    async fn release(&self, handle: ImageHandle);
}

/// Rejects empty uploads and anything whose magic bytes are not an image.
pub fn validate_image(bytes: &[u8]) -> Result<(), IntakeError> {
    if bytes.is_empty() {
        return Err(IntakeError::Missing);
    }
    image::guess_format(bytes).map_err(|_| IntakeError::NotAnImage)?;
    Ok(())
}

/// Stores each upload as `<dir>/<uuid>.upload`.
#[derive(Debug, Clone)]
pub struct DiskImageStore {
    dir: PathBuf,
}

impl DiskImageStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

async fn write_upload(path: &Path, bytes: &[u8]) -> Result<(), IntakeError> {
    if let Err(e) = tokio::fs::write(path, bytes).await {
        // A failed write never yields a handle, so nothing else would remove it.
        remove_partial(path).await;
        return Err(IntakeError::Io(e));
    }
    Ok(())
}

async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!("Removed partial upload {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove partial upload {}: {}", path.display(), e),
    }
}

#[async_trait]
impl ImageStore for DiskImageStore {
    async fn accept(&self, bytes: &[u8]) -> Result<ImageHandle, IntakeError> {
        validate_image(bytes)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let id = Uuid::new_v4();
        let path = self.dir.join(format!("{}.upload", id));
        write_upload(&path, bytes).await?;

        tracing::debug!("Stored upload {} ({} bytes)", id, bytes.len());
        Ok(ImageHandle::new(id, path))
    }

    async fn read(&self, handle: &ImageHandle) -> Result<Vec<u8>, IntakeError> {
        Ok(tokio::fs::read(handle.path()).await?)
    }

    async fn release(&self, handle: ImageHandle) {
        match tokio::fs::remove_file(handle.path()).await {
            Ok(()) => tracing::debug!("Removed upload {}", handle.id()),
            Err(e) => tracing::warn!("Failed to remove upload {}: {}", handle.path().display(), e),
        }
    }
}
