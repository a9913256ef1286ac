use std::path::Path;
#[cfg(test)]
use std::path::PathBuf;
use tempfile::TempPath;

enum Backing {
    Archive(TempPath),
    #[cfg(test)]
    External(PathBuf),
}

/// A commit's files made visible on disk for the line counter.
///
/// Temporary backings are removed when the value is dropped, whichever
/// way the caller leaves its scope.
pub struct MaterializedTree {
    backing: Backing,
}

impl MaterializedTree {
    /// A temporary archive file (e.g. the output of `git archive`).
    pub fn archive(path: TempPath) -> Self {
        Self { backing: Backing::Archive(path) }
    }

    /// A location owned by someone else; nothing is removed on drop.
    #[cfg(test)]
    pub(crate) fn external<P: Into<PathBuf>>(path: P) -> Self {
        Self { backing: Backing::External(path.into()) }
    }

    pub fn path(&self) -> &Path {
        match &self.backing {
            Backing::Archive(p) => &**p,
            #[cfg(test)]
            Backing::External(p) => p.as_path(),
        }
    }
}

impl std::fmt::Debug for MaterializedTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterializedTree").field("path", &self.path()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_is_removed_on_drop() {
        let file = tempfile::Builder::new().suffix(".tar").tempfile().unwrap();
        let tree = MaterializedTree::archive(file.into_temp_path());
        let path = tree.path().to_path_buf();
        assert!(path.exists());
        drop(tree);
        assert!(!path.exists());
    }

    #[test]
    fn external_location_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        drop(MaterializedTree::external(dir.path()));
        assert!(dir.path().exists());
    }
}
