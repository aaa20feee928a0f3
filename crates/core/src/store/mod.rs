use std::path::{Path, PathBuf};

use crate::Result;

/// Flat directory holding one file per frame number.
#[derive(Debug, Clone)]
pub struct FrameStore {
    dir: PathBuf,
}

impl FrameStore {
    /// Creates a store rooted at `<root>/frames`. Nothing touches the disk
    /// until the first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join("frames"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file that holds `frame_number`.
    pub fn path_for(&self, frame_number: u64, extension: &str) -> PathBuf {
        self.dir.join(format!("frame{frame_number}.{extension}"))
    }

    /// Idempotently creates the frame directory.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Writes the whole payload for `frame_number`, replacing any previous
    /// file. The bytes go to a temporary sibling first so the final path
    /// either holds the complete payload or is left untouched.
    pub fn write(&self, frame_number: u64, extension: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.ensure_dir()?;

        let path = self.path_for(frame_number, extension);
        let partial = self.dir.join(format!("frame{frame_number}.{extension}.part"));
        if let Err(err) = std::fs::write(&partial, bytes) {
            let _ = std::fs::remove_file(&partial);
            return Err(err.into());
        }
        if let Err(err) = std::fs::rename(&partial, &path) {
            let _ = std::fs::remove_file(&partial);
            return Err(err.into());
        }

        tracing::debug!(
            frame = frame_number,
            path = %path.display(),
            bytes = bytes.len(),
            "frame stored"
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_frame_files_by_number() {
        let root = tempfile::tempdir().unwrap();
        let store = FrameStore::new(root.path());

        let path = store.write(7, "png", b"payload").unwrap();

        assert_eq!(path, root.path().join("frames").join("frame7.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"payload");
        assert!(!root.path().join("frames/frame7.png.part").exists());
    }

    #[test]
    fn overwrite_replaces_whole_file() {
        let root = tempfile::tempdir().unwrap();
        let store = FrameStore::new(root.path());

        store.write(1, "png", b"a much longer first payload").unwrap();
        let path = store.write(1, "png", b"short").unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"short");
    }

    #[test]
    fn ensure_dir_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let store = FrameStore::new(root.path());

        store.ensure_dir().unwrap();
        store.ensure_dir().unwrap();
        assert!(store.dir().is_dir());
    }

    #[test]
    fn failed_rename_removes_partial_file() {
        let root = tempfile::tempdir().unwrap();
        let store = FrameStore::new(root.path());
        let occupied = store.path_for(3, "png");
        std::fs::create_dir_all(occupied.join("child")).unwrap();

        assert!(store.write(3, "png", b"payload").is_err());
        assert!(!store.dir().join("frame3.png.part").exists());
    }

    #[test]
    fn write_fails_when_root_is_a_file() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();

        let store = FrameStore::new(&blocker);
        assert!(store.write(0, "png", b"x").is_err());
    }
}
