//! Recursive directory walker.
//!
//! Produces [`FileDescriptor`]s in traversal order: at each directory, every
//! accepted file is emitted before the walker descends into any subdirectory
//! collected at that level. Entries are listed in name order so repeated
//! scans of an unchanged tree are deterministic.

use std::fs;
use std::path::{Path, PathBuf};

use pathdiff::diff_paths;

use crate::error::LoadError;
use crate::filters::{has_suffix, DirFilterFn, FileFilterFn};
use crate::models::{Depth, FileDescriptor};

/// Filesystem entry classification. `Other` covers anything that is neither
/// a regular file nor a directory after metadata resolution (sockets,
/// devices, ...) and is always excluded from traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Other,
    File,
    Directory,
}

/// Depth-bounded directory walker with independent file and directory
/// filters.
///
/// Configuration follows the builder-on-self convention: chain setters, then
/// call [`Scanner::scan`].
pub struct Scanner {
    cwd: PathBuf,
    default_depth: Depth,
    ext: String,
    file_filter: Option<FileFilterFn>,
    dir_filter: Option<DirFilterFn>,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            cwd: PathBuf::new(),
            default_depth: Depth::Unbounded,
            ext: std::env::consts::DLL_SUFFIX.to_string(),
            file_filter: None,
            dir_filter: None,
        }
    }

    /// Working directory used to resolve relative scan roots. Defaults to
    /// the process working directory.
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    pub fn depth(mut self, depth: impl Into<Depth>) -> Self {
        self.default_depth = depth.into();
        self
    }

    /// Extension suffix stripped from stems and matched by the default file
    /// filter. Defaults to the platform dynamic-library suffix.
    pub fn ext(mut self, ext: impl Into<String>) -> Self {
        self.ext = ext.into();
        self
    }

    /// Replace the file filter. The predicate sees the absolute path, the
    /// root-relative directory, and the stem.
    pub fn file_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Path, &Path, &str) -> bool + Send + Sync + 'static,
    {
        self.file_filter = Some(Box::new(filter));
        self
    }

    /// Replace the directory filter. The predicate sees the absolute path
    /// and the path relative to the scan root.
    pub fn dir_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Path, &Path) -> bool + Send + Sync + 'static,
    {
        self.dir_filter = Some(Box::new(filter));
        self
    }

    pub fn configured_ext(&self) -> &str {
        &self.ext
    }

    pub fn configured_depth(&self) -> Depth {
        self.default_depth
    }

    /// Walk `path` and collect every accepted file. An explicit `depth`
    /// overrides the configured default for this call only.
    pub fn scan(
        &self,
        path: impl AsRef<Path>,
        depth: Option<Depth>,
    ) -> Result<Vec<FileDescriptor>, LoadError> {
        let root = self.resolve_root(path.as_ref())?;
        let max_depth = depth.unwrap_or(self.default_depth);

        let mut files = Vec::new();
        self.walk(&root, &root, 0, max_depth, &mut files)?;
        log::debug!(
            "scan of {} found {} file(s) at depth {:?}",
            root.display(),
            files.len(),
            max_depth
        );
        Ok(files)
    }

    fn resolve_root(&self, path: &Path) -> Result<PathBuf, LoadError> {
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        let cwd = if self.cwd.is_absolute() {
            self.cwd.clone()
        } else {
            std::env::current_dir()?.join(&self.cwd)
        };
        Ok(cwd.join(path))
    }

    fn walk(
        &self,
        dir: &Path,
        root: &Path,
        depth: usize,
        max_depth: Depth,
        files: &mut Vec<FileDescriptor>,
    ) -> Result<(), LoadError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            names.push(entry?.file_name());
        }
        names.sort();

        // Files first, then the subdirectories collected at this level.
        let mut dirs = Vec::new();
        for name in names {
            let path = dir.join(&name);
            match classify(&path)? {
                FileType::File => {
                    if let Some(file) = self.accept_file(path, root) {
                        files.push(file);
                    }
                }
                FileType::Directory => {
                    if self.accept_dir(&path, root) {
                        dirs.push(path);
                    } else {
                        log::trace!("directory filtered out: {}", path.display());
                    }
                }
                FileType::Other => {}
            }
        }

        if !max_depth.permits_descent(depth) {
            return Ok(());
        }
        for sub in dirs {
            self.walk(&sub, root, depth + 1, max_depth, files)?;
        }
        Ok(())
    }

    fn accept_file(&self, path: PathBuf, root: &Path) -> Option<FileDescriptor> {
        let relative = diff_paths(&path, root).unwrap_or_else(|| path.clone());
        let relative_dir = match relative.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let name = path.file_name()?.to_string_lossy().into_owned();
        // The suffix is stripped once, exactly as configured.
        let stem = name.strip_suffix(&self.ext).unwrap_or(&name).to_string();

        let accepted = match &self.file_filter {
            Some(filter) => filter(&path, &relative_dir, &stem),
            None => has_suffix(&path, &self.ext),
        };
        if !accepted {
            return None;
        }

        log::trace!("accepted file: {}", path.display());
        Some(FileDescriptor {
            absolute_path: path,
            relative_dir,
            stem,
        })
    }

    fn accept_dir(&self, path: &Path, root: &Path) -> bool {
        match &self.dir_filter {
            Some(filter) => {
                let relative = diff_paths(path, root).unwrap_or_else(|| path.to_path_buf());
                filter(path, &relative)
            }
            None => true,
        }
    }
}

/// Classify one filesystem entry. Metadata is resolved, so a symlink to a
/// regular file counts as a file.
pub fn classify(path: &Path) -> Result<FileType, LoadError> {
    let metadata = fs::metadata(path)?;
    let file_type = metadata.file_type();
    if file_type.is_file() {
        Ok(FileType::File)
    } else if file_type.is_dir() {
        Ok(FileType::Directory)
    } else {
        Ok(FileType::Other)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    /// root/hello.ext, root/skip.txt, root/common/world.ext,
    /// root/common/nested/deep.ext, root/vendor/ignored.ext
    fn fixture_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("common/nested")).unwrap();
        fs::create_dir_all(root.join("vendor")).unwrap();
        touch(&root.join("hello.ext"));
        touch(&root.join("skip.txt"));
        touch(&root.join("common/world.ext"));
        touch(&root.join("common/nested/deep.ext"));
        touch(&root.join("vendor/ignored.ext"));
        dir
    }

    fn stems(files: &[FileDescriptor]) -> Vec<&str> {
        files.iter().map(|f| f.stem.as_str()).collect()
    }

    #[test]
    fn depth_zero_stays_in_root() {
        let tree = fixture_tree();
        let scanner = Scanner::new().ext(".ext");
        let files = scanner.scan(tree.path(), Some(Depth::Bounded(0))).unwrap();
        assert_eq!(stems(&files), vec!["hello"]);
    }

    #[test]
    fn unbounded_depth_reaches_every_accepted_file() {
        let tree = fixture_tree();
        let scanner = Scanner::new().ext(".ext");
        let files = scanner.scan(tree.path(), None).unwrap();
        assert_eq!(stems(&files), vec!["hello", "world", "deep", "ignored"]);
    }

    #[test]
    fn files_precede_subdirectory_contents() {
        let tree = fixture_tree();
        // "common" sorts before "hello.ext"; traversal order must still put
        // the root file first.
        let scanner = Scanner::new().ext(".ext");
        let files = scanner.scan(tree.path(), None).unwrap();
        assert_eq!(files[0].stem, "hello");
    }

    #[test]
    fn per_call_depth_overrides_configured_default() {
        let tree = fixture_tree();
        let scanner = Scanner::new().ext(".ext").depth(0usize);
        assert_eq!(stems(&scanner.scan(tree.path(), None).unwrap()), vec!["hello"]);

        let files = scanner.scan(tree.path(), Some(Depth::Unbounded)).unwrap();
        assert_eq!(files.len(), 4);
    }

    #[test]
    fn rejected_directory_contents_never_appear() {
        let tree = fixture_tree();
        let scanner = Scanner::new().ext(".ext").dir_filter(|_, relative| {
            !relative.starts_with("vendor")
        });
        let files = scanner.scan(tree.path(), None).unwrap();
        assert_eq!(stems(&files), vec!["hello", "world", "deep"]);
    }

    #[test]
    fn relative_dir_and_stem_values() {
        let tree = fixture_tree();
        let scanner = Scanner::new().ext(".ext");
        let files = scanner.scan(tree.path(), None).unwrap();

        let hello = files.iter().find(|f| f.stem == "hello").unwrap();
        assert_eq!(hello.relative_dir, PathBuf::from("."));

        let world = files.iter().find(|f| f.stem == "world").unwrap();
        assert_eq!(world.relative_dir, PathBuf::from("common"));

        let deep = files.iter().find(|f| f.stem == "deep").unwrap();
        assert_eq!(deep.relative_dir, PathBuf::from("common/nested"));
    }

    #[test]
    fn stem_strip_is_case_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Upper.EXT"));
        touch(&dir.path().join("lower.ext"));

        // Default filter is case-insensitive, suffix stripping is not.
        let scanner = Scanner::new().ext(".ext");
        let files = scanner.scan(dir.path(), None).unwrap();
        assert_eq!(stems(&files), vec!["Upper.EXT", "lower"]);
    }

    #[test]
    fn custom_file_filter_sees_relative_dir() {
        let tree = fixture_tree();
        let scanner = Scanner::new().ext(".ext").file_filter(|abs, dir, _stem| {
            has_suffix(abs, ".ext") && dir.starts_with("common")
        });
        let files = scanner.scan(tree.path(), None).unwrap();
        assert_eq!(stems(&files), vec!["world", "deep"]);
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = Scanner::new().ext(".ext");
        assert!(scanner.scan(dir.path(), None).unwrap().is_empty());
    }

    #[test]
    fn missing_root_propagates_the_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = Scanner::new().ext(".ext");
        let err = scanner.scan(dir.path().join("nope"), None).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn relative_root_resolves_against_cwd() {
        let tree = fixture_tree();
        let scanner = Scanner::new().ext(".ext").cwd(tree.path());
        let files = scanner.scan("common", None).unwrap();
        assert_eq!(stems(&files), vec!["world", "deep"]);
        assert!(files[0].absolute_path.is_absolute());
        // relative_dir is computed against the new root, not the cwd
        assert_eq!(files[0].relative_dir, PathBuf::from("."));
    }
}
