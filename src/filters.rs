//! Filter predicates applied during traversal.
//!
//! Files and directories are filtered independently: the file predicate sees
//! `(absolute path, relative dir, stem)`, the directory predicate sees
//! `(absolute path, path relative to the scan root)`. A rejected directory is
//! never descended into, so its contents cannot reach the results.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::LoadError;

pub type FileFilterFn = Box<dyn Fn(&Path, &Path, &str) -> bool + Send + Sync>;
pub type DirFilterFn = Box<dyn Fn(&Path, &Path) -> bool + Send + Sync>;

/// Whether the file name ends with `ext`, ignoring ASCII case.
pub fn has_suffix(path: &Path, ext: &str) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    name.to_string_lossy()
        .to_ascii_lowercase()
        .ends_with(&ext.to_ascii_lowercase())
}

/// The default file filter: accept names carrying the given extension suffix.
pub fn suffix(ext: impl Into<String>) -> FileFilterFn {
    let ext = ext.into();
    Box::new(move |absolute, _dir, _stem| has_suffix(absolute, &ext))
}

/// Compile a list of glob patterns into one matcher.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet, LoadError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
