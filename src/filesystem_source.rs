use std::fs::File;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use relative_path::RelativePath;

use crate::ByteSource;

/// Reads resources from files under a root directory.
///
/// Paths always use `/`, whatever the platform: `music/theme.ogg` opens `<root>/music/theme.ogg`.  `..` segments are
/// resolved logically rather than by asking the filesystem, and a path which would land outside the root is refused
/// with [ErrorKind::PermissionDenied], which usually means a bug in whoever built the path.
#[derive(Debug, Clone)]
pub struct FilesystemSource {
    root: PathBuf,
}

impl FilesystemSource {
    pub fn new(root: impl Into<PathBuf>) -> FilesystemSource {
        FilesystemSource { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file a resource path refers to.
    pub fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let resolved = RelativePath::new(path).to_logical_path(&self.root);
        if !resolved.starts_with(&self.root) {
            tracing::warn!(path, root = %self.root.display(), "refusing path outside the resource root");
            return Err(io::Error::new(
                ErrorKind::PermissionDenied,
                format!("{} is outside the resource root", path),
            ));
        }
        Ok(resolved)
    }
}

impl ByteSource for FilesystemSource {
    type Reader = File;

    fn open(&self, path: &str) -> io::Result<File> {
        File::open(self.resolve(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JsonManager, ResourceError};

    #[test]
    fn resolve_stays_under_root() {
        let fs = FilesystemSource::new("assets");
        assert_eq!(
            fs.resolve("music/theme.ogg").unwrap(),
            Path::new("assets").join("music").join("theme.ogg")
        );
        assert_eq!(
            fs.resolve("music/../fonts/body.ttf").unwrap(),
            Path::new("assets").join("fonts").join("body.ttf")
        );
        assert_eq!(
            fs.resolve("../secrets.json").unwrap_err().kind(),
            ErrorKind::PermissionDenied
        );
        assert_eq!(
            fs.resolve("music/../../secrets.json").unwrap_err().kind(),
            ErrorKind::PermissionDenied
        );
    }

    #[test]
    fn managers_read_through_the_root() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let root = tmp_dir.path().join("assets");
        std::fs::create_dir_all(root.join("levels")).unwrap();
        std::fs::write(root.join("levels").join("one.json"), "[1, 2, 3]").unwrap();
        // A sibling of the root, which must stay unreachable.
        std::fs::write(tmp_dir.path().join("outside.json"), "[4]").unwrap();

        let mut levels = JsonManager::<_, Vec<u8>>::new(FilesystemSource::new(&root));
        assert_eq!(*levels.get_json("levels/one.json").unwrap(), vec![1, 2, 3]);
        assert_eq!(
            *levels.get_json("levels/../levels/one.json").unwrap(),
            vec![1, 2, 3]
        );

        assert!(matches!(
            levels.get_json("levels/two.json"),
            Err(ResourceError::NotFound { ref path }) if path == "levels/two.json"
        ));
        match levels.get_json("../outside.json") {
            Err(ResourceError::Io { source, .. }) => assert_eq!(source.kind(), ErrorKind::PermissionDenied),
            other => panic!("expected a permission error, got {:?}", other.map(|_| ())),
        }
    }
}
