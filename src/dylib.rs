//! Dynamic-library module resolution via `libloading`.
//!
//! A loadable library exports two symbols, both emitted by
//! [`export_module!`]: a `PLUGLOAD_ABI_VERSION` gate and a `plugload_module`
//! entry function returning the module's [`ModuleHandle`]. Handles returned
//! from here wrap the originating [`Library`] so the mapped code outlives
//! every class and module handle derived from it; instances themselves are
//! plain values and must not retain code pointers beyond their record.

use std::sync::Arc;

use libloading::Library;

use crate::error::LoadError;
use crate::models::FileDescriptor;
use crate::module::{ClassFactory, ClassHandle, ConstructOpts, Instance, Module, ModuleHandle};
use crate::resolver::ModuleResolver;

pub const ABI_VERSION: u32 = 1;

const VERSION_SYMBOL: &[u8] = b"PLUGLOAD_ABI_VERSION\0";
const ENTRY_SYMBOL: &[u8] = b"plugload_module\0";

/// Resolves module files by `dlopen`-ing them and calling their entry
/// function.
pub struct DylibResolver {
    abi_version: u32,
}

impl Default for DylibResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DylibResolver {
    pub fn new() -> Self {
        Self {
            abi_version: ABI_VERSION,
        }
    }
}

impl ModuleResolver for DylibResolver {
    fn resolve(&self, file: &FileDescriptor) -> Result<ModuleHandle, LoadError> {
        unsafe {
            let library = Library::new(&file.absolute_path).map_err(|e| LoadError::Library {
                path: file.absolute_path.clone(),
                reason: e.to_string(),
            })?;

            let version = *library
                .get::<*const u32>(VERSION_SYMBOL)
                .map_err(|e| LoadError::MissingExport(e.to_string()))?;
            if *version != self.abi_version {
                return Err(LoadError::AbiVersionMismatch {
                    expected: self.abi_version,
                    actual: *version,
                });
            }

            let inner = {
                let entry = library
                    .get::<fn() -> ModuleHandle>(ENTRY_SYMBOL)
                    .map_err(|e| LoadError::MissingExport(e.to_string()))?;
                entry()
            };

            log::debug!("loaded library module: {}", file.absolute_path.display());
            Ok(Arc::new(DylibModule {
                inner,
                library: Arc::new(library),
            }))
        }
    }
}

/// Keeps the [`Library`] mapped for as long as the module handle lives and
/// wraps every exported class the same way.
struct DylibModule {
    inner: ModuleHandle,
    library: Arc<Library>,
}

impl Module for DylibModule {
    fn export(&self, key: &str) -> Option<ClassHandle> {
        self.inner.export(key).map(|class| self.pin(class))
    }

    fn as_class(&self) -> Option<ClassHandle> {
        self.inner.as_class().map(|class| self.pin(class))
    }
}

impl DylibModule {
    fn pin(&self, inner: ClassHandle) -> ClassHandle {
        Arc::new(DylibClass {
            inner,
            _library: Arc::clone(&self.library),
        })
    }
}

struct DylibClass {
    inner: ClassHandle,
    _library: Arc<Library>,
}

impl ClassFactory for DylibClass {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn construct(&self, opts: Option<&ConstructOpts>) -> Option<Instance> {
        self.inner.construct(opts)
    }
}

/// Emit the symbols a [`DylibResolver`] looks for. Call once at the root of
/// a plugin crate built as a `dylib`:
///
/// ```ignore
/// plugload::export_module! {
///     plugload::StaticModule::new()
///         .with_export("default", plugload::FnFactory::new("Hello", |_| None))
///         .into_handle()
/// }
/// ```
#[macro_export]
macro_rules! export_module {
    ($module:expr) => {
        #[no_mangle]
        pub static PLUGLOAD_ABI_VERSION: u32 = $crate::dylib::ABI_VERSION;

        #[no_mangle]
        pub fn plugload_module() -> $crate::ModuleHandle {
            $module
        }
    };
}
