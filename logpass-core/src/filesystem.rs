//! Directory layout helpers. The store itself lives under a fixed
//! `database/` subdirectory of the node's data root, leaving the root
//! free for logs, config, and anything else the node process keeps
//! alongside it.

use std::path::{Path, PathBuf};

use crate::error::CResult;

pub fn database_dir(root: &Path) -> PathBuf {
    root.join("database")
}

pub fn ensure_dir(path: &Path) -> CResult<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// A temporary data root that removes itself on drop. Used by tests
/// and by the `demos` example that needs a throwaway database.
pub struct TempInstance {
    dir: tempfile::TempDir,
}

impl TempInstance {
    pub fn new() -> CResult<Self> {
        let dir = tempfile::tempdir()?;
        ensure_dir(&database_dir(dir.path()))?;
        Ok(TempInstance { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn database_dir(&self) -> PathBuf {
        database_dir(self.dir.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_dir_is_a_fixed_subdirectory() {
        let root = Path::new("/var/lib/logpass");
        assert_eq!(database_dir(root), root.join("database"));
    }

    #[test]
    fn ensure_dir_creates_nested_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("c");
        assert!(!nested.exists());
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn temp_instance_database_dir_exists() {
        let instance = TempInstance::new().unwrap();
        assert!(instance.database_dir().is_dir());
    }
}
