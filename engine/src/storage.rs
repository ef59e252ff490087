use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Local;
use log::info;
use uuid::Uuid;

use crate::error::ArtError;

/// A generated image persisted to disk. Ownership of the file transfers to
/// the caller, which is responsible for eventual deletion.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub size: u64,
}

/// Builds a fresh collision-free path: `temp_<timestamp>_<random hex>.png`
pub fn unique_image_path(dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    dir.join(format!("temp_{timestamp}_{}.png", &suffix[..8]))
}

/// Writes the image bytes and verifies the file actually landed on disk.
pub fn save(bytes: &[u8], path: &Path) -> Result<Artifact, ArtError> {
    let storage_err = |message: String| ArtError::Storage { message };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| storage_err(format!("couldn't create {}: {e}", parent.display())))?;
    }

    fs::write(path, bytes)
        .map_err(|e| storage_err(format!("couldn't write {}: {e}", path.display())))?;

    let meta = fs::metadata(path)
        .map_err(|e| storage_err(format!("file missing after write {}: {e}", path.display())))?;

    info!("saved image to {} ({} bytes)", path.display(), meta.len());

    Ok(Artifact {
        path: path.to_path_buf(),
        size: meta.len(),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn save_roundtrip() -> color_eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("image.png");

        let bytes = vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3];
        let artifact = save(&bytes, &path)?;

        assert_eq!(artifact.path, path);
        assert_eq!(artifact.size, bytes.len() as u64);
        assert_eq!(fs::read(&path)?, bytes);
        Ok(())
    }

    #[test]
    fn save_creates_missing_parent_dirs() -> color_eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested/deeper/image.png");

        save(b"img", &path)?;
        assert!(path.exists());
        Ok(())
    }

    #[test]
    fn save_into_unwritable_location_fails_with_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        // a file where the parent directory should be
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();

        let err = save(b"img", &blocker.join("image.png")).unwrap_err();
        assert!(matches!(err, ArtError::Storage { .. }));
    }

    #[test]
    fn unique_paths_do_not_collide() {
        let dir = Path::new("out");
        let a = unique_image_path(dir);
        let b = unique_image_path(dir);
        assert_ne!(a, b);
    }

    #[test]
    fn unique_path_shape() {
        let path = unique_image_path(Path::new("out"));
        let name = path.file_name().unwrap().to_str().unwrap();

        assert!(name.starts_with("temp_"));
        assert!(name.ends_with(".png"));

        // temp_<YYYYMMDD>_<HHMMSS>_<8 hex chars>.png
        let parts: Vec<&str> = name.trim_end_matches(".png").split('_').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[3].len(), 8);
        assert!(parts[3].chars().all(|c| c.is_ascii_hexdigit()));
    }
}
