// SPDX-License-Identifier: MPL-2.0

//! Local photo archive
//!
//! When an archive directory is configured every captured PNG is also written
//! to disk. Archive failures are logged and never touch the upload path.

use crate::constants::app_info;
use crate::errors::{BoothError, BoothResult};
use crate::gallery::CapturedPhoto;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default archive location (`~/Pictures/gesture-booth`)
pub fn default_archive_directory() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(app_info::APP_DIR)
}

/// `booth_<YYYYmmdd_HHMMSS>_<id>.png`
pub fn archive_file_name(photo: &CapturedPhoto) -> String {
    format!(
        "booth_{}_{}.png",
        photo.captured_at.format("%Y%m%d_%H%M%S"),
        photo.id
    )
}

/// Write the photo's PNG into `dir`, creating it if needed
pub async fn archive_photo(dir: &Path, photo: &CapturedPhoto) -> BoothResult<PathBuf> {
    let path = dir.join(archive_file_name(photo));
    let dir = dir.to_path_buf();
    let png = photo.png.clone();
    let target = path.clone();

    tokio::task::spawn_blocking(move || {
        std::fs::create_dir_all(&dir)?;
        std::fs::write(&target, png.as_slice())?;
        Ok::<_, BoothError>(())
    })
    .await
    .map_err(|e| BoothError::Storage(format!("archive task error: {}", e)))??;

    info!(path = %path.display(), "Photo archived");
    Ok(path)
}

/// Fire-and-forget archive write
pub fn spawn_archive(dir: PathBuf, photo: CapturedPhoto) {
    tokio::spawn(async move {
        if let Err(e) = archive_photo(&dir, &photo).await {
            warn!(id = %photo.id, error = %e, "Failed to archive photo");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::tests::photo;
    use std::sync::Arc;

    #[test]
    fn test_archive_file_name() {
        let p = photo();
        let name = archive_file_name(&p);
        assert!(name.starts_with("booth_"));
        assert!(name.ends_with(&format!("_{}.png", p.id)));
    }

    #[tokio::test]
    async fn test_archive_writes_png_bytes() {
        let dir = std::env::temp_dir().join(format!("gesture-booth-archive-{}", std::process::id()));
        let mut p = photo();
        p.png = Arc::new(vec![0x89, b'P', b'N', b'G']);

        let path = archive_photo(&dir, &p).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![0x89, b'P', b'N', b'G']);

        let _ = std::fs::remove_dir_all(dir);
    }
}
