//! Discover module files under a directory tree and load them into a
//! plugin host.
//!
//! The crate is built from three layers:
//!
//! 1. [`Scanner`]: a depth-bounded directory walker with independent file
//!    and directory filters, producing [`FileDescriptor`]s in traversal
//!    order.
//! 2. [`FileLoader`]: a pipeline that discovers files, resolves each into a
//!    module, post-processes it, and transforms the aggregate. Every stage
//!    is an overridable hook with a complete default.
//! 3. [`ClassLoader`]: a file loader whose per-module stage extracts a
//!    designated class, instantiates it, and wraps the result into an
//!    [`InstanceRecord`]. Modules without an eligible class are skipped
//!    silently, so a plugin directory can mix loadable classes with plain
//!    utility modules.
//!
//! Module resolution is injected through [`ModuleResolver`]: use a
//! [`ModuleRegistry`] manifest for ahead-of-time builds, or
//! [`dylib::DylibResolver`] to load dynamic libraries at runtime.
//!
//! ```no_run
//! use std::sync::Arc;
//! use plugload::{ClassLoaderBuilder, FnFactory, Instance, ModuleRegistry, StaticModule};
//!
//! let mut registry = ModuleRegistry::new();
//! registry.insert(
//!     "hello",
//!     StaticModule::new()
//!         .with_export("default", FnFactory::new("Hello", |_| {
//!             Some(Box::new("hi") as Instance)
//!         }))
//!         .into_handle(),
//! );
//!
//! let loader = ClassLoaderBuilder::new(Arc::new(registry)).ext(".so").build();
//! let plugins = loader.load("plugins")?;
//! # Ok::<(), plugload::LoadError>(())
//! ```

pub mod class_loader;
pub mod dylib;
pub mod error;
pub mod events;
pub mod filters;
pub mod loader;
pub mod models;
pub mod module;
pub mod resolver;
pub mod scanner;

pub use class_loader::{ClassLoader, ClassLoaderBuilder, ClassPolicy};
pub use dylib::DylibResolver;
pub use error::LoadError;
pub use events::LoaderEvents;
pub use loader::{FileLoader, LoaderBuilder, LoaderCore};
pub use models::{Artifact, Depth, FileDescriptor, InstanceRecord, ModuleRecord};
pub use module::{
    ClassFactory, ClassHandle, ConstructOpts, FnFactory, Instance, Module, ModuleHandle,
    StaticModule,
};
pub use resolver::{ModuleRegistry, ModuleResolver};
pub use scanner::{FileType, Scanner};
