//! On-disk storage for property attachments (images and videos).
//!
//! Files are written before the row that references them, so every caller that fails after a
//! save is expected to `discard` what it saved. Removal is always best-effort.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Per-file size ceiling.
pub const MAX_FILE_BYTES: usize = 20 * 1024 * 1024;
/// Files accepted in a single request.
pub const MAX_FILES_PER_REQUEST: usize = 10;
/// Form field that carries attachments.
pub const MEDIA_FIELD: &str = "media";
/// URL prefix under which stored attachments are served.
pub const PUBLIC_PREFIX: &str = "/uploads/properties";

const SUBDIR: &str = "properties";
const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "mp4", "mov", "avi", "wmv"];
const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "video/mp4",
    "video/quicktime",
    "video/x-msvideo",
    "video/avi",
    "video/x-ms-wmv",
];

/// A file accepted for the current request and already written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub field_name: String,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: usize,
    pub path: PathBuf,
}

impl StoredUpload {
    pub fn public_url(&self) -> String {
        format!("{PUBLIC_PREFIX}/{}", self.filename)
    }
}

#[derive(Debug, Clone)]
pub struct AttachmentStore {
    root: PathBuf,
    dir: PathBuf,
}

impl AttachmentStore {
    /// `root` is the directory served under `/uploads`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let dir = root.join(SUBDIR);
        Self { root, dir }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::file_system(&self.dir, e))
    }

    /// Writes an accepted file as `<field>-<unix millis><ext>`, bumping the timestamp until
    /// the name is free.
    pub async fn save(
        &self,
        field_name: &str,
        original_name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<StoredUpload> {
        check_upload(field_name, original_name, mime_type, bytes.len())?;

        let ext = extension_of(original_name)
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        let mut stamp = Utc::now().timestamp_millis();

        loop {
            let filename = format!("{field_name}-{stamp}{ext}");
            let path = self.dir.join(&filename);
            let opened = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            let mut file = match opened {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    stamp += 1;
                    continue;
                }
                Err(e) => return Err(Error::file_system(path, e)),
            };

            if let Err(e) = file.write_all(bytes).await {
                drop(file);
                remove_partial(&path).await;
                return Err(Error::file_system(path, e));
            }
            file.flush()
                .await
                .map_err(|e| Error::file_system(&path, e))?;

            debug!(filename = %filename, size = bytes.len(), "stored attachment");
            return Ok(StoredUpload {
                field_name: field_name.to_string(),
                filename,
                original_name: original_name.to_string(),
                mime_type: mime_type.to_string(),
                size: bytes.len(),
                path,
            });
        }
    }

    /// Removes files saved for a request that did not go through. Failures are logged.
    pub async fn discard(&self, uploads: &[StoredUpload]) {
        for upload in uploads {
            match fs::remove_file(&upload.path).await {
                Ok(()) => info!(path = %upload.path.display(), "discarded attachment"),
                Err(e) => warn!(
                    path = %upload.path.display(),
                    error = %e,
                    "failed to discard attachment"
                ),
            }
        }
    }

    /// Maps a public attachment URL back to its file. Only plain filenames directly under
    /// [`PUBLIC_PREFIX`] resolve.
    pub fn resolve_url(&self, url: &str) -> Option<PathBuf> {
        let filename = url.strip_prefix(PUBLIC_PREFIX)?.strip_prefix('/')?;
        let plain = !filename.is_empty()
            && filename != "."
            && filename != ".."
            && !filename.contains(['/', '\\']);
        plain.then(|| self.dir.join(filename))
    }

    pub async fn remove_url(&self, url: &str) -> Result<()> {
        let path = self.resolve_url(url).ok_or_else(|| {
            Error::file_system(
                url,
                std::io::Error::new(ErrorKind::InvalidInput, "not a stored attachment path"),
            )
        })?;
        fs::remove_file(&path)
            .await
            .map_err(|e| Error::file_system(path, e))
    }
}

/// Rejects files the listing does not accept: wrong field, disallowed type, or too large.
pub fn check_upload(
    field_name: &str,
    original_name: &str,
    mime_type: &str,
    size: usize,
) -> Result<()> {
    if field_name != MEDIA_FIELD {
        return Err(Error::validation(format!(
            "Unexpected file field '{field_name}'; attachments must be sent as '{MEDIA_FIELD}'"
        )));
    }
    if size > MAX_FILE_BYTES {
        return Err(Error::validation(format!(
            "File '{original_name}' exceeds the {} MiB limit",
            MAX_FILE_BYTES / (1024 * 1024)
        )));
    }

    let ext_ok = extension_of(original_name)
        .map(|e| ALLOWED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    let mime_ok = ALLOWED_MIME_TYPES.contains(&mime_type.to_ascii_lowercase().as_str());

    if ext_ok && mime_ok {
        Ok(())
    } else {
        Err(Error::validation(
            "Only images (jpeg, jpg, png, gif) and videos (mp4, mov, avi, wmv) are allowed",
        ))
    }
}

fn extension_of(name: &str) -> Option<&str> {
    Path::new(name).extension().and_then(|e| e.to_str())
}

async fn remove_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        warn!(
            path = %path.display(),
            error = %e,
            "failed to remove partially written attachment"
        );
    }
}
