//! Module and class abstractions.
//!
//! A [`Module`] is whatever the configured resolver produced for a file: a
//! bag of named exports, optionally usable as a class in its own right. A
//! [`ClassFactory`] is a constructor reference; calling [`ClassFactory::construct`]
//! with the loader's instantiation options yields an opaque instance, or
//! `None` when the class declines to produce one.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Opaque constructed object.
pub type Instance = Box<dyn Any + Send>;

/// Opaque instantiation options passed to every constructor.
pub type ConstructOpts = dyn Any + Send + Sync;

/// A constructor reference exported by a module.
pub trait ClassFactory: Send + Sync {
    /// Class name, for diagnostics and keyed transforms.
    fn name(&self) -> &str;

    /// Build an instance. `None` opts the file out of the result collection.
    fn construct(&self, opts: Option<&ConstructOpts>) -> Option<Instance>;
}

pub type ClassHandle = Arc<dyn ClassFactory>;

/// A loaded module: named-export lookup plus an optional "the module itself
/// is the class" view for loaders configured without an export key.
pub trait Module: Send + Sync {
    fn export(&self, key: &str) -> Option<ClassHandle>;

    fn as_class(&self) -> Option<ClassHandle> {
        None
    }
}

pub type ModuleHandle = Arc<dyn Module>;

/// In-memory module built from a map of named exports.
///
/// The building block for [`crate::resolver::ModuleRegistry`] manifests and
/// for plugin crates exporting through [`crate::export_module!`].
#[derive(Default)]
pub struct StaticModule {
    exports: HashMap<String, ClassHandle>,
    whole: Option<ClassHandle>,
}

impl StaticModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named export.
    pub fn with_export(mut self, key: impl Into<String>, class: ClassHandle) -> Self {
        self.exports.insert(key.into(), class);
        self
    }

    /// Make the module itself act as a class when the export key is disabled.
    pub fn with_class(mut self, class: ClassHandle) -> Self {
        self.whole = Some(class);
        self
    }

    pub fn into_handle(self) -> ModuleHandle {
        Arc::new(self)
    }
}

impl Module for StaticModule {
    fn export(&self, key: &str) -> Option<ClassHandle> {
        self.exports.get(key).cloned()
    }

    fn as_class(&self) -> Option<ClassHandle> {
        self.whole.clone()
    }
}

/// A [`ClassFactory`] backed by a closure.
pub struct FnFactory {
    name: String,
    construct: Box<dyn Fn(Option<&ConstructOpts>) -> Option<Instance> + Send + Sync>,
}

impl FnFactory {
    pub fn new<F>(name: impl Into<String>, construct: F) -> ClassHandle
    where
        F: Fn(Option<&ConstructOpts>) -> Option<Instance> + Send + Sync + 'static,
    {
        Arc::new(Self {
            name: name.into(),
            construct: Box::new(construct),
        })
    }
}

impl ClassFactory for FnFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn construct(&self, opts: Option<&ConstructOpts>) -> Option<Instance> {
        (self.construct)(opts)
    }
}
