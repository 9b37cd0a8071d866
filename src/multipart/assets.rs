//! Loading local files for upload and rendering previews.
//!
//! A selection of several files is loaded concurrently and one failure
//! never cancels the others.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::future::join_all;

use super::LocalFile;
use crate::errors::AssetError;

/// Content type for a supported image or video extension.
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        _ => return None,
    };
    Some(content_type)
}

/// Read one local file into memory.
pub async fn load_local_file(path: impl AsRef<Path>) -> Result<LocalFile, AssetError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let content_type = content_type_for(path).ok_or_else(|| AssetError::UnsupportedType {
        path: display.clone(),
    })?;

    let bytes = tokio::fs::read(path).await.map_err(|e| AssetError::Read {
        path: display.clone(),
        message: e.to_string(),
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or(display);

    tracing::debug!("Loaded {} ({} bytes, {})", file_name, bytes.len(), content_type);
    Ok(LocalFile::new(file_name, content_type, bytes))
}

/// Read several files concurrently. Results keep the selection order.
pub async fn load_local_files<P: AsRef<Path>>(paths: &[P]) -> Vec<Result<LocalFile, AssetError>> {
    let results = join_all(paths.iter().map(|p| load_local_file(p))).await;

    for result in &results {
        if let Err(e) = result {
            tracing::warn!("Skipping attachment: {}", e);
        }
    }

    results
}

impl LocalFile {
    /// `data:` URL suitable for an inline preview.
    pub fn preview_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            STANDARD.encode(self.bytes.as_slice())
        )
    }

    pub fn is_video(&self) -> bool {
        self.content_type.starts_with("video/")
    }
}
