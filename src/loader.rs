//! The load pipeline: discover files, resolve each into a module, post-process
//! each module, transform the aggregate.
//!
//! Every stage is a hook slot on [`LoaderCore`] with a complete default, so
//! overriding one stage never requires touching another. Specializations are
//! composed, not subclassed: the class loader is an ordinary [`FileLoader`]
//! whose `process_module` slot holds a class-extraction policy.

use std::path::Path;
use std::sync::Arc;

use crate::error::LoadError;
use crate::events::LoaderEvents;
use crate::models::{Artifact, Depth, FileDescriptor, InstanceRecord, ModuleRecord};
use crate::resolver::ModuleResolver;
use crate::scanner::Scanner;

pub type GetFilesFn = Box<
    dyn Fn(&LoaderCore, &Path, Option<Depth>) -> Result<Vec<FileDescriptor>, LoadError>
        + Send
        + Sync,
>;
pub type LoadFileFn =
    Box<dyn Fn(&LoaderCore, FileDescriptor) -> Result<Option<Artifact>, LoadError> + Send + Sync>;
pub type ProcessModuleFn =
    Box<dyn Fn(&LoaderCore, ModuleRecord) -> Result<Option<Artifact>, LoadError> + Send + Sync>;

/// Everything a pipeline stage may need: the walker, the module resolver,
/// the observer lists, and the overridable stage slots themselves.
pub struct LoaderCore {
    pub(crate) scanner: Scanner,
    pub(crate) resolver: Arc<dyn ModuleResolver>,
    pub(crate) events: LoaderEvents,
    pub(crate) get_files: Option<GetFilesFn>,
    pub(crate) load_file: Option<LoadFileFn>,
    pub(crate) process_module: Option<ProcessModuleFn>,
}

impl LoaderCore {
    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    pub fn resolver(&self) -> &Arc<dyn ModuleResolver> {
        &self.resolver
    }

    pub fn events(&self) -> &LoaderEvents {
        &self.events
    }

    /// Stage 1: discover candidate files.
    pub fn get_files(
        &self,
        path: &Path,
        depth: Option<Depth>,
    ) -> Result<Vec<FileDescriptor>, LoadError> {
        match &self.get_files {
            Some(hook) => hook(self, path, depth),
            None => self.default_get_files(path, depth),
        }
    }

    pub fn default_get_files(
        &self,
        path: &Path,
        depth: Option<Depth>,
    ) -> Result<Vec<FileDescriptor>, LoadError> {
        self.scanner.scan(path, depth)
    }

    /// Stage 2: turn one file into at most one artifact.
    pub fn load_file(&self, file: FileDescriptor) -> Result<Option<Artifact>, LoadError> {
        match &self.load_file {
            Some(hook) => hook(self, file),
            None => self.default_load_file(file),
        }
    }

    pub fn default_load_file(&self, file: FileDescriptor) -> Result<Option<Artifact>, LoadError> {
        log::trace!("loading module file: {}", file.absolute_path.display());
        let module = self.resolver.resolve(&file)?;
        self.process_module(ModuleRecord { module, file })
    }

    /// Stage 3: post-process a resolved module. The designated extension
    /// point; the class loader installs its pipeline here.
    pub fn process_module(&self, record: ModuleRecord) -> Result<Option<Artifact>, LoadError> {
        match &self.process_module {
            Some(hook) => hook(self, record),
            None => self.default_process_module(record),
        }
    }

    pub fn default_process_module(
        &self,
        record: ModuleRecord,
    ) -> Result<Option<Artifact>, LoadError> {
        self.events.emit_module_loaded(&record);
        Ok(Some(Artifact::Module(record)))
    }
}

/// Loads every accepted module file under a directory tree.
///
/// `T` is the aggregate produced by the transform stage; the default is the
/// plain artifact list in traversal order.
pub struct FileLoader<T = Vec<Artifact>> {
    core: LoaderCore,
    transform: Box<dyn Fn(Vec<Artifact>) -> T + Send + Sync>,
}

impl<T> FileLoader<T> {
    pub fn core(&self) -> &LoaderCore {
        &self.core
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<T, LoadError> {
        self.run(path.as_ref(), None)
    }

    /// Like [`FileLoader::load`] with the configured depth overridden for
    /// this call only.
    pub fn load_with_depth(&self, path: impl AsRef<Path>, depth: Depth) -> Result<T, LoadError> {
        self.run(path.as_ref(), Some(depth))
    }

    fn run(&self, path: &Path, depth: Option<Depth>) -> Result<T, LoadError> {
        let files = self.core.get_files(path, depth)?;
        let mut artifacts = Vec::with_capacity(files.len());
        for file in files {
            // A `None` here is a per-file opt-out, not an error.
            if let Some(artifact) = self.core.load_file(file)? {
                artifacts.push(artifact);
            }
        }
        log::debug!("loaded {} artifact(s) from {}", artifacts.len(), path.display());
        Ok((self.transform)(artifacts))
    }
}

/// Builds a [`FileLoader`]. Every setter is independent; anything not set
/// keeps its default.
pub struct LoaderBuilder {
    pub(crate) scanner: Scanner,
    pub(crate) resolver: Arc<dyn ModuleResolver>,
    pub(crate) events: LoaderEvents,
    pub(crate) get_files: Option<GetFilesFn>,
    pub(crate) load_file: Option<LoadFileFn>,
    pub(crate) process_module: Option<ProcessModuleFn>,
}

impl LoaderBuilder {
    pub fn new(resolver: Arc<dyn ModuleResolver>) -> Self {
        Self {
            scanner: Scanner::new(),
            resolver,
            events: LoaderEvents::new(),
            get_files: None,
            load_file: None,
            process_module: None,
        }
    }

    /// Replace the whole walker in one go.
    pub fn scanner(mut self, scanner: Scanner) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn cwd(mut self, cwd: impl Into<std::path::PathBuf>) -> Self {
        self.scanner = self.scanner.cwd(cwd);
        self
    }

    pub fn depth(mut self, depth: impl Into<Depth>) -> Self {
        self.scanner = self.scanner.depth(depth);
        self
    }

    pub fn ext(mut self, ext: impl Into<String>) -> Self {
        self.scanner = self.scanner.ext(ext);
        self
    }

    pub fn file_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Path, &Path, &str) -> bool + Send + Sync + 'static,
    {
        self.scanner = self.scanner.file_filter(filter);
        self
    }

    pub fn dir_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Path, &Path) -> bool + Send + Sync + 'static,
    {
        self.scanner = self.scanner.dir_filter(filter);
        self
    }

    pub fn get_files<F>(mut self, hook: F) -> Self
    where
        F: Fn(&LoaderCore, &Path, Option<Depth>) -> Result<Vec<FileDescriptor>, LoadError>
            + Send
            + Sync
            + 'static,
    {
        self.get_files = Some(Box::new(hook));
        self
    }

    pub fn load_file<F>(mut self, hook: F) -> Self
    where
        F: Fn(&LoaderCore, FileDescriptor) -> Result<Option<Artifact>, LoadError>
            + Send
            + Sync
            + 'static,
    {
        self.load_file = Some(Box::new(hook));
        self
    }

    pub fn process_module<F>(mut self, hook: F) -> Self
    where
        F: Fn(&LoaderCore, ModuleRecord) -> Result<Option<Artifact>, LoadError>
            + Send
            + Sync
            + 'static,
    {
        self.process_module = Some(Box::new(hook));
        self
    }

    pub fn on_module_loaded<F>(mut self, listener: F) -> Self
    where
        F: Fn(&ModuleRecord) + Send + Sync + 'static,
    {
        self.events.on_module_loaded(listener);
        self
    }

    pub fn on_instance_created<F>(mut self, listener: F) -> Self
    where
        F: Fn(&InstanceRecord) + Send + Sync + 'static,
    {
        self.events.on_instance_created(listener);
        self
    }

    pub fn build(self) -> FileLoader {
        self.build_with(|artifacts| artifacts)
    }

    /// Finish with a transform producing an arbitrary aggregate shape.
    pub fn build_with<T, F>(self, transform: F) -> FileLoader<T>
    where
        F: Fn(Vec<Artifact>) -> T + Send + Sync + 'static,
    {
        FileLoader {
            core: LoaderCore {
                scanner: self.scanner,
                resolver: self.resolver,
                events: self.events,
                get_files: self.get_files,
                load_file: self.load_file,
                process_module: self.process_module,
            },
            transform: Box::new(transform),
        }
    }
}
