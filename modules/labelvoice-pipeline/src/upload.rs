//! Turning files on disk into uploads.
//!
//! Reading never fails the batch: a file that cannot be read becomes an
//! unreadable upload, and a file over the size limit is not read at all.

use std::path::Path;

use tracing::warn;

use labelvoice_common::{UploadedImage, MAX_UPLOAD_BYTES};

pub fn read_upload(path: &Path) -> UploadedImage {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = mime_for(path);

    let declared = match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => {
            warn!(path = %path.display(), "Upload is a directory");
            return UploadedImage::unreadable(name, mime_type, "path is a directory");
        }
        Ok(meta) => usize::try_from(meta.len()).unwrap_or(usize::MAX),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Upload metadata unavailable");
            return UploadedImage::unreadable(name, mime_type, e.to_string());
        }
    };

    if declared > MAX_UPLOAD_BYTES {
        return UploadedImage::new(name, Vec::new(), mime_type).with_declared_size(declared);
    }

    match std::fs::read(path) {
        Ok(bytes) => UploadedImage::new(name, bytes, mime_type).with_declared_size(declared),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Upload could not be read");
            UploadedImage::unreadable(name, mime_type, e.to_string())
        }
    }
}

/// Declared MIME type from the file extension.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}
