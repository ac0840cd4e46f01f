//! Locating the file a patch names.

use std::path::{Component, Path, PathBuf};

/// Resolves patch file paths against an ordered list of base directories.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base_dirs: Vec<PathBuf>,
}

impl PathResolver {
    /// An empty list falls back to the current directory.
    pub fn new(base_dirs: Vec<PathBuf>) -> Self {
        let base_dirs = if base_dirs.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            base_dirs
        };
        Self { base_dirs }
    }

    pub fn base_dirs(&self) -> &[PathBuf] {
        &self.base_dirs
    }

    /// Absolute paths are used as given. Relative paths resolve to the first
    /// base directory under which they exist, else to the first base
    /// directory (the caller re-checks existence).
    pub fn resolve(&self, file_path: &str) -> PathBuf {
        let path = Path::new(file_path);
        if path.is_absolute() {
            return path.to_path_buf();
        }

        if let Some(found) = self
            .base_dirs
            .iter()
            .map(|base| base.join(path))
            .find(|candidate| candidate.exists())
        {
            log::debug!("resolved {} to {}", file_path, found.display());
            return found;
        }

        self.base_dirs[0].join(path)
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// True when both paths name the same file.
///
/// Existing paths are compared after canonicalisation (symlinks, `..`);
/// otherwise the lexically normalised absolute forms are compared.
pub fn paths_equal(a: impl AsRef<Path>, b: impl AsRef<Path>) -> bool {
    let (a, b) = (a.as_ref(), b.as_ref());
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => normalize(a) == normalize(b),
    }
}

fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    };
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_absolute_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("test.py");
        fs::write(&file, "x").unwrap();
        let resolver = PathResolver::new(vec![PathBuf::from("/nonexistent")]);
        assert_eq!(resolver.resolve(file.to_str().unwrap()), file);
    }

    #[test]
    fn test_resolve_searches_base_dirs_in_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::create_dir_all(second.path().join("pkg")).unwrap();
        fs::write(second.path().join("pkg/calc.py"), "x").unwrap();

        let resolver = PathResolver::new(vec![first.path().to_path_buf(), second.path().to_path_buf()]);
        assert_eq!(resolver.resolve("pkg/calc.py"), second.path().join("pkg/calc.py"));
    }

    #[test]
    fn test_resolve_prefers_earlier_base_dir() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::write(first.path().join("calc.py"), "a").unwrap();
        fs::write(second.path().join("calc.py"), "b").unwrap();

        let resolver = PathResolver::new(vec![first.path().to_path_buf(), second.path().to_path_buf()]);
        assert_eq!(resolver.resolve("calc.py"), first.path().join("calc.py"));
    }

    #[test]
    fn test_resolve_missing_falls_back_to_first_base() {
        let dir = TempDir::new().unwrap();
        let resolver = PathResolver::new(vec![dir.path().to_path_buf(), PathBuf::from("/elsewhere")]);
        assert_eq!(resolver.resolve("nonexistent.txt"), dir.path().join("nonexistent.txt"));
    }

    #[test]
    fn test_empty_base_dirs_default_to_current_dir() {
        let resolver = PathResolver::default();
        assert_eq!(resolver.base_dirs(), &[PathBuf::from(".")]);
    }

    #[test]
    fn test_paths_equal_existing_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("test.txt");
        fs::write(&file, "x").unwrap();
        let dotted = dir.path().join("sub").join("..").join("test.txt");
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        assert!(paths_equal(&file, &dotted));
    }

    #[test]
    fn test_paths_equal_missing_files() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("test1.txt");
        let b = dir.path().join("test2.txt");
        assert!(!paths_equal(&a, &b));
        assert!(paths_equal(&a, dir.path().join(".").join("test1.txt")));
    }
}
