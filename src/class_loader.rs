//! Class extraction and instantiation on top of the file-load pipeline.
//!
//! A class loader is a [`FileLoader`] whose `process_module` slot runs a
//! [`ClassPolicy`]: extract the designated class from the module, construct
//! an instance, wrap both into an [`InstanceRecord`], post-process. A module
//! with no eligible class, or a class that declines instantiation, simply
//! contributes nothing; a plugin directory can mix loadable classes with
//! plain utility modules.

use std::any::Any;
use std::path::Path;
use std::sync::Arc;

use crate::error::LoadError;
use crate::loader::{FileLoader, LoaderBuilder, LoaderCore};
use crate::models::{Artifact, Depth, FileDescriptor, InstanceRecord, ModuleRecord};
use crate::module::{ClassHandle, Instance};
use crate::resolver::ModuleResolver;

/// A class loader is a file loader with a different per-module policy.
pub type ClassLoader<T = Vec<Artifact>> = FileLoader<T>;

pub type GetClassFn =
    Box<dyn Fn(&ClassPolicy, &ModuleRecord) -> Option<ClassHandle> + Send + Sync>;
pub type ProcessClassFn = Box<
    dyn Fn(&ClassPolicy, &LoaderCore, ClassHandle, ModuleRecord) -> Option<InstanceRecord>
        + Send
        + Sync,
>;
pub type InstantiateFn =
    Box<dyn Fn(&ClassPolicy, &ClassHandle) -> Option<Instance> + Send + Sync>;
pub type ProcessInstanceFn =
    Box<dyn Fn(&ClassPolicy, &LoaderCore, InstanceRecord) -> Option<Artifact> + Send + Sync>;

/// The four-step per-module policy. Each step is an independent hook slot
/// with a complete default.
pub struct ClassPolicy {
    default_export: Option<String>,
    construct_opts: Option<Arc<dyn Any + Send + Sync>>,
    get_class: Option<GetClassFn>,
    process_class: Option<ProcessClassFn>,
    instantiate: Option<InstantiateFn>,
    process_instance: Option<ProcessInstanceFn>,
}

impl Default for ClassPolicy {
    fn default() -> Self {
        Self {
            default_export: Some("default".to_string()),
            construct_opts: None,
            get_class: None,
            process_class: None,
            instantiate: None,
            process_instance: None,
        }
    }
}

impl ClassPolicy {
    pub fn default_export(&self) -> Option<&str> {
        self.default_export.as_deref()
    }

    pub fn construct_opts(&self) -> Option<&Arc<dyn Any + Send + Sync>> {
        self.construct_opts.as_ref()
    }

    /// Run the whole policy for one resolved module.
    pub fn run(&self, core: &LoaderCore, record: ModuleRecord) -> Result<Option<Artifact>, LoadError> {
        let Some(class) = self.get_class(&record) else {
            log::trace!("no eligible class in {}", record.file.absolute_path.display());
            return Ok(None);
        };
        let Some(instance_record) = self.process_class(core, class, record) else {
            return Ok(None);
        };
        Ok(self.process_instance(core, instance_record))
    }

    /// Step 1: extract the designated class.
    pub fn get_class(&self, record: &ModuleRecord) -> Option<ClassHandle> {
        match &self.get_class {
            Some(hook) => hook(self, record),
            None => self.default_get_class(record),
        }
    }

    pub fn default_get_class(&self, record: &ModuleRecord) -> Option<ClassHandle> {
        match &self.default_export {
            Some(key) => record.module.export(key),
            None => record.module.as_class(),
        }
    }

    /// Step 2: build the instance record.
    pub fn process_class(
        &self,
        core: &LoaderCore,
        class: ClassHandle,
        record: ModuleRecord,
    ) -> Option<InstanceRecord> {
        match &self.process_class {
            Some(hook) => hook(self, core, class, record),
            None => self.default_process_class(class, record),
        }
    }

    pub fn default_process_class(
        &self,
        class: ClassHandle,
        record: ModuleRecord,
    ) -> Option<InstanceRecord> {
        let instance = self.instantiate(&class)?;
        Some(InstanceRecord {
            class,
            instance,
            file: record.file,
        })
    }

    /// Step 3: construct an instance with the configured options.
    pub fn instantiate(&self, class: &ClassHandle) -> Option<Instance> {
        match &self.instantiate {
            Some(hook) => hook(self, class),
            None => self.default_instantiate(class),
        }
    }

    pub fn default_instantiate(&self, class: &ClassHandle) -> Option<Instance> {
        class.construct(self.construct_opts.as_deref())
    }

    /// Step 4: post-process the finished record.
    pub fn process_instance(&self, core: &LoaderCore, record: InstanceRecord) -> Option<Artifact> {
        match &self.process_instance {
            Some(hook) => hook(self, core, record),
            None => self.default_process_instance(core, record),
        }
    }

    pub fn default_process_instance(
        &self,
        core: &LoaderCore,
        record: InstanceRecord,
    ) -> Option<Artifact> {
        core.events().emit_instance_created(&record);
        Some(Artifact::Instance(record))
    }
}

/// Builds a [`ClassLoader`]. Walker and pipeline setters mirror
/// [`LoaderBuilder`]; the class-tier setters configure the [`ClassPolicy`].
pub struct ClassLoaderBuilder {
    base: LoaderBuilder,
    policy: ClassPolicy,
}

impl ClassLoaderBuilder {
    pub fn new(resolver: Arc<dyn ModuleResolver>) -> Self {
        Self {
            base: LoaderBuilder::new(resolver),
            policy: ClassPolicy::default(),
        }
    }

    pub fn cwd(mut self, cwd: impl Into<std::path::PathBuf>) -> Self {
        self.base = self.base.cwd(cwd);
        self
    }

    pub fn depth(mut self, depth: impl Into<Depth>) -> Self {
        self.base = self.base.depth(depth);
        self
    }

    pub fn ext(mut self, ext: impl Into<String>) -> Self {
        self.base = self.base.ext(ext);
        self
    }

    pub fn file_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Path, &Path, &str) -> bool + Send + Sync + 'static,
    {
        self.base = self.base.file_filter(filter);
        self
    }

    pub fn dir_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Path, &Path) -> bool + Send + Sync + 'static,
    {
        self.base = self.base.dir_filter(filter);
        self
    }

    pub fn get_files<F>(mut self, hook: F) -> Self
    where
        F: Fn(&LoaderCore, &Path, Option<Depth>) -> Result<Vec<FileDescriptor>, LoadError>
            + Send
            + Sync
            + 'static,
    {
        self.base = self.base.get_files(hook);
        self
    }

    pub fn load_file<F>(mut self, hook: F) -> Self
    where
        F: Fn(&LoaderCore, FileDescriptor) -> Result<Option<Artifact>, LoadError>
            + Send
            + Sync
            + 'static,
    {
        self.base = self.base.load_file(hook);
        self
    }

    /// Raw `process_module` override. Replaces the class pipeline entirely.
    pub fn process_module<F>(mut self, hook: F) -> Self
    where
        F: Fn(&LoaderCore, ModuleRecord) -> Result<Option<Artifact>, LoadError>
            + Send
            + Sync
            + 'static,
    {
        self.base = self.base.process_module(hook);
        self
    }

    pub fn on_module_loaded<F>(mut self, listener: F) -> Self
    where
        F: Fn(&ModuleRecord) + Send + Sync + 'static,
    {
        self.base = self.base.on_module_loaded(listener);
        self
    }

    pub fn on_instance_created<F>(mut self, listener: F) -> Self
    where
        F: Fn(&InstanceRecord) + Send + Sync + 'static,
    {
        self.base = self.base.on_instance_created(listener);
        self
    }

    /// Key of the exported class looked up on every module. Defaults to
    /// `"default"`.
    pub fn default_export(mut self, key: impl Into<String>) -> Self {
        self.policy.default_export = Some(key.into());
        self
    }

    /// Disable the export key: each module handle itself is the class.
    pub fn module_as_class(mut self) -> Self {
        self.policy.default_export = None;
        self
    }

    /// Value handed to every constructor as its single argument.
    pub fn construct_opts(mut self, opts: impl Any + Send + Sync) -> Self {
        self.policy.construct_opts = Some(Arc::new(opts));
        self
    }

    pub fn get_class<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ClassPolicy, &ModuleRecord) -> Option<ClassHandle> + Send + Sync + 'static,
    {
        self.policy.get_class = Some(Box::new(hook));
        self
    }

    pub fn process_class<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ClassPolicy, &LoaderCore, ClassHandle, ModuleRecord) -> Option<InstanceRecord>
            + Send
            + Sync
            + 'static,
    {
        self.policy.process_class = Some(Box::new(hook));
        self
    }

    pub fn instantiate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ClassPolicy, &ClassHandle) -> Option<Instance> + Send + Sync + 'static,
    {
        self.policy.instantiate = Some(Box::new(hook));
        self
    }

    pub fn process_instance<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ClassPolicy, &LoaderCore, InstanceRecord) -> Option<Artifact>
            + Send
            + Sync
            + 'static,
    {
        self.policy.process_instance = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> ClassLoader {
        self.build_with(|artifacts| artifacts)
    }

    pub fn build_with<T, F>(self, transform: F) -> ClassLoader<T>
    where
        F: Fn(Vec<Artifact>) -> T + Send + Sync + 'static,
    {
        let Self { mut base, policy } = self;
        if base.process_module.is_none() {
            let policy = Arc::new(policy);
            base.process_module = Some(Box::new(move |core: &LoaderCore, record: ModuleRecord| {
                policy.run(core, record)
            }));
        }
        base.build_with(transform)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::module::{FnFactory, StaticModule};
    use crate::resolver::ModuleRegistry;

    struct Greeter {
        greeting: String,
    }

    fn fixture_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("common")).unwrap();
        fs::write(dir.path().join("hello.ext"), b"").unwrap();
        fs::write(dir.path().join("common/world.ext"), b"").unwrap();
        fs::write(dir.path().join("util.ext"), b"").unwrap();
        dir
    }

    fn greeter_class(name: &str, greeting: &'static str) -> ClassHandle {
        FnFactory::new(name, move |opts| {
            let suffix = opts
                .and_then(|o| o.downcast_ref::<String>())
                .cloned()
                .unwrap_or_default();
            Some(Box::new(Greeter {
                greeting: format!("{greeting}{suffix}"),
            }) as Instance)
        })
    }

    /// hello.ext and common/world.ext export classes; util.ext does not.
    fn registry() -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        registry.insert(
            "hello",
            StaticModule::new()
                .with_export("default", greeter_class("Hello", "hello"))
                .into_handle(),
        );
        registry.insert(
            "common/world",
            StaticModule::new()
                .with_export("default", greeter_class("World", "world"))
                .into_handle(),
        );
        registry.insert("util", StaticModule::new().into_handle());
        registry
    }

    #[test]
    fn instantiates_each_exported_class() {
        let tree = fixture_tree();
        let loader = ClassLoaderBuilder::new(Arc::new(registry())).ext(".ext").build();
        let artifacts = loader.load(tree.path()).unwrap();

        // util.ext exports nothing and is silently dropped.
        assert_eq!(artifacts.len(), 2);

        let hello = artifacts[0].as_instance().unwrap();
        assert_eq!(hello.class.name(), "Hello");
        assert_eq!(hello.file.stem, "hello");
        let greeter = hello.instance.downcast_ref::<Greeter>().unwrap();
        assert_eq!(greeter.greeting, "hello");

        let world = artifacts[1].as_instance().unwrap();
        assert_eq!(world.class.name(), "World");
        assert_eq!(world.file.relative_dir.to_string_lossy(), "common");
    }

    #[test]
    fn construct_opts_reach_every_constructor() {
        let tree = fixture_tree();
        let loader = ClassLoaderBuilder::new(Arc::new(registry()))
            .ext(".ext")
            .construct_opts(String::from("!"))
            .build();
        let artifacts = loader.load(tree.path()).unwrap();

        let greeter = artifacts[0]
            .as_instance()
            .unwrap()
            .instance
            .downcast_ref::<Greeter>()
            .unwrap();
        assert_eq!(greeter.greeting, "hello!");
    }

    #[test]
    fn classless_module_fires_no_instance_event() {
        let tree = fixture_tree();
        let count = Arc::new(Mutex::new(0usize));
        let count_in_listener = Arc::clone(&count);

        let loader = ClassLoaderBuilder::new(Arc::new(registry()))
            .ext(".ext")
            .on_instance_created(move |_| *count_in_listener.lock().unwrap() += 1)
            .build();
        let artifacts = loader.load(tree.path()).unwrap();

        assert_eq!(artifacts.len(), 2);
        assert_eq!(*count.lock().unwrap(), 2);
    }

    #[test]
    fn declined_instantiation_drops_the_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("shy.ext"), b"").unwrap();

        let mut registry = ModuleRegistry::new();
        registry.insert(
            "shy",
            StaticModule::new()
                .with_export("default", FnFactory::new("Shy", |_| None))
                .into_handle(),
        );

        let loader = ClassLoaderBuilder::new(Arc::new(registry)).ext(".ext").build();
        let artifacts = loader.load(dir.path()).unwrap();
        assert!(artifacts.is_empty());
    }

    #[test]
    fn module_as_class_skips_the_export_lookup() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("whole.ext"), b"").unwrap();

        let mut registry = ModuleRegistry::new();
        registry.insert(
            "whole",
            StaticModule::new()
                .with_class(greeter_class("Whole", "whole"))
                .into_handle(),
        );

        let loader = ClassLoaderBuilder::new(Arc::new(registry))
            .ext(".ext")
            .module_as_class()
            .build();
        let artifacts = loader.load(dir.path()).unwrap();

        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].as_instance().unwrap().class.name(), "Whole");
    }

    #[test]
    fn custom_export_key() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("named.ext"), b"").unwrap();

        let mut registry = ModuleRegistry::new();
        registry.insert(
            "named",
            StaticModule::new()
                .with_export("Handler", greeter_class("Handler", "handled"))
                .into_handle(),
        );

        let loader = ClassLoaderBuilder::new(Arc::new(registry))
            .ext(".ext")
            .default_export("Handler")
            .build();
        let artifacts = loader.load(dir.path()).unwrap();
        assert_eq!(artifacts.len(), 1);
    }

    #[test]
    fn get_class_override_leaves_instantiation_alone() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("alt.ext"), b"").unwrap();

        let mut registry = ModuleRegistry::new();
        registry.insert(
            "alt",
            StaticModule::new()
                .with_export("primary", greeter_class("Primary", "primary"))
                .with_export("fallback", greeter_class("Fallback", "fallback"))
                .into_handle(),
        );

        let loader = ClassLoaderBuilder::new(Arc::new(registry))
            .ext(".ext")
            .construct_opts(String::from("?"))
            .get_class(|_policy, record| {
                record
                    .module
                    .export("primary")
                    .or_else(|| record.module.export("fallback"))
            })
            .build();
        let artifacts = loader.load(dir.path()).unwrap();

        let instance = artifacts[0].as_instance().unwrap();
        assert_eq!(instance.class.name(), "Primary");
        // Default instantiate still runs with the configured opts.
        let greeter = instance.instance.downcast_ref::<Greeter>().unwrap();
        assert_eq!(greeter.greeting, "primary?");
    }

    #[test]
    fn instantiate_override_replaces_construction_only() {
        let tree = fixture_tree();
        let loader = ClassLoaderBuilder::new(Arc::new(registry()))
            .ext(".ext")
            .instantiate(|_policy, class| {
                Some(Box::new(format!("made:{}", class.name())) as Instance)
            })
            .build();
        let artifacts = loader.load(tree.path()).unwrap();

        assert_eq!(artifacts.len(), 2);
        let made = artifacts[0]
            .as_instance()
            .unwrap()
            .instance
            .downcast_ref::<String>()
            .unwrap();
        assert_eq!(made, "made:Hello");
    }
}
