//! File access used by extraction, cross-reference and `init`.
//!
//! Searches only report where something is. Reading the matched headers goes
//! through [`FileSystem`] so extraction can run against in-memory sources.

use std::io;
use std::path::Path;

pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Creates or replaces the file at `path`.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Shared real filesystem for callers that do not inject one.
pub fn default_fs() -> &'static RealFs {
    static INSTANCE: RealFs = RealFs;
    &INSTANCE
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::RwLock;

    /// In-memory source tree keyed by absolute path.
    #[derive(Debug, Default)]
    pub struct MockFs {
        files: RwLock<BTreeMap<PathBuf, String>>,
    }

    impl MockFs {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_files<I, P, C>(files: I) -> Self
        where
            I: IntoIterator<Item = (P, C)>,
            P: AsRef<Path>,
            C: Into<String>,
        {
            let files = files
                .into_iter()
                .map(|(p, c)| (p.as_ref().to_path_buf(), c.into()))
                .collect();
            Self {
                files: RwLock::new(files),
            }
        }

        pub fn contents(&self, path: &Path) -> Option<String> {
            self.files.read().unwrap().get(path).cloned()
        }
    }

    impl FileSystem for MockFs {
        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            self.contents(path).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no such file: {}", path.display()),
                )
            })
        }

        fn write(&self, path: &Path, content: &str) -> io::Result<()> {
            self.files
                .write()
                .unwrap()
                .insert(path.to_path_buf(), content.to_string());
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            self.files.read().unwrap().contains_key(path)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_missing_header_is_not_found() {
            let fs = MockFs::with_files([("/repo/src/workerd/api/blob.h", "class Blob {};")]);
            let err = fs
                .read_to_string(Path::new("/repo/src/workerd/api/url.h"))
                .unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::NotFound);
            assert!(fs.exists(Path::new("/repo/src/workerd/api/blob.h")));
        }

        #[test]
        fn test_write_replaces_contents() {
            let fs = MockFs::new();
            let path = Path::new("/repo/.declmap.toml");
            fs.write(path, "[search]").unwrap();
            fs.write(path, "[graph]").unwrap();
            assert_eq!(fs.contents(path).as_deref(), Some("[graph]"));
        }
    }
}
