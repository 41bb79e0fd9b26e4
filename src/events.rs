//! Synchronous observer fan-out for loader notifications.
//!
//! Two named events exist: one per successfully loaded module and one per
//! successfully produced instance record. Listeners run inline during the
//! pipeline stage that fires them, in registration order; they observe the
//! record but cannot defer or cancel the load.

use crate::models::{InstanceRecord, ModuleRecord};

type ModuleListener = Box<dyn Fn(&ModuleRecord) + Send + Sync>;
type InstanceListener = Box<dyn Fn(&InstanceRecord) + Send + Sync>;

/// Per-loader listener lists. Each loader owns its own; there is no global
/// event bus.
#[derive(Default)]
pub struct LoaderEvents {
    module_loaded: Vec<ModuleListener>,
    instance_created: Vec<InstanceListener>,
}

impl LoaderEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_module_loaded<F>(&mut self, listener: F)
    where
        F: Fn(&ModuleRecord) + Send + Sync + 'static,
    {
        self.module_loaded.push(Box::new(listener));
    }

    pub fn on_instance_created<F>(&mut self, listener: F)
    where
        F: Fn(&InstanceRecord) + Send + Sync + 'static,
    {
        self.instance_created.push(Box::new(listener));
    }

    pub fn emit_module_loaded(&self, record: &ModuleRecord) {
        for listener in &self.module_loaded {
            listener(record);
        }
    }

    pub fn emit_instance_created(&self, record: &InstanceRecord) {
        for listener in &self.instance_created {
            listener(record);
        }
    }
}
