//! Module resolution: the capability that turns a discovered file into a
//! runtime module.
//!
//! Resolution is injected into the loader so hosts can choose their loading
//! strategy: a pre-linked manifest ([`ModuleRegistry`]) for ahead-of-time
//! builds, or true dynamic loading ([`crate::dylib::DylibResolver`]).

use std::collections::HashMap;

use crate::error::LoadError;
use crate::models::FileDescriptor;
use crate::module::ModuleHandle;

/// Maps a discovered file to a module handle. Failure is fatal for the
/// whole `load` call; per-file opt-outs happen later, in the class policy.
pub trait ModuleResolver: Send + Sync {
    fn resolve(&self, file: &FileDescriptor) -> Result<ModuleHandle, LoadError>;
}

/// A startup-time manifest of pre-linked modules, keyed by the file's
/// root-relative location.
///
/// Keys use `/` separators regardless of platform: `common/world` for
/// `<root>/common/world.<ext>`, a bare `hello` for a file in the root.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, ModuleHandle>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, module: ModuleHandle) {
        self.modules.insert(key.into(), module);
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// The manifest key for a discovered file.
    pub fn key_for(file: &FileDescriptor) -> String {
        let dir: Vec<String> = file
            .relative_dir
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .filter(|c| c != ".")
            .collect();
        if dir.is_empty() {
            file.stem.clone()
        } else {
            format!("{}/{}", dir.join("/"), file.stem)
        }
    }
}

impl ModuleResolver for ModuleRegistry {
    fn resolve(&self, file: &FileDescriptor) -> Result<ModuleHandle, LoadError> {
        let key = Self::key_for(file);
        self.modules
            .get(&key)
            .cloned()
            .ok_or(LoadError::NotRegistered(key))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::module::StaticModule;

    fn descriptor(dir: &str, stem: &str) -> FileDescriptor {
        FileDescriptor {
            absolute_path: PathBuf::from(format!("/plugins/{dir}/{stem}.so")),
            relative_dir: PathBuf::from(dir),
            stem: stem.into(),
        }
    }

    #[test]
    fn keys_are_relative_with_forward_slashes() {
        assert_eq!(ModuleRegistry::key_for(&descriptor(".", "hello")), "hello");
        assert_eq!(
            ModuleRegistry::key_for(&descriptor("common", "world")),
            "common/world"
        );
        assert_eq!(
            ModuleRegistry::key_for(&descriptor("common/nested", "deep")),
            "common/nested/deep"
        );
    }

    #[test]
    fn unknown_key_is_an_error() {
        let registry = ModuleRegistry::new();
        let err = registry.resolve(&descriptor(".", "ghost")).err().unwrap();
        assert!(matches!(err, LoadError::NotRegistered(key) if key == "ghost"));
    }

    #[test]
    fn registered_module_resolves() {
        let mut registry = ModuleRegistry::new();
        registry.insert("common/world", StaticModule::new().into_handle());
        assert!(registry.resolve(&descriptor("common", "world")).is_ok());
        assert_eq!(registry.len(), 1);
    }
}
