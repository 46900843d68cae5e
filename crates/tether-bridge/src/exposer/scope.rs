use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use super::ApiSurface;

/// Addressable global state of the client process.
///
/// Surfaces are installed under their bridge key; the client invoker
/// resolves them from the same slots. Cloning shares the slots.
#[derive(Clone, Default)]
pub struct GlobalScope {
    slots: Arc<RwLock<HashMap<String, Arc<ApiSurface>>>>,
}

impl GlobalScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `surface` under its own bridge key.
    pub fn install(&self, surface: ApiSurface) -> Arc<ApiSurface> {
        let key = surface.bridge_key().to_string();
        let surface = Arc::new(surface);
        self.expose(key, Arc::clone(&surface));
        surface
    }

    /// Install `surface` under `key`, returning whatever it replaced.
    pub fn expose(
        &self,
        key: impl Into<String>,
        surface: Arc<ApiSurface>,
    ) -> Option<Arc<ApiSurface>> {
        let key = key.into();
        let previous = self
            .slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), surface);
        match &previous {
            Some(_) => warn!(bridge_key = %key, "replaced installed bridge"),
            None => info!(bridge_key = %key, "bridge installed"),
        }
        previous
    }

    pub fn lookup(&self, key: &str) -> Option<Arc<ApiSurface>> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn remove(&self, key: &str) -> Option<Arc<ApiSurface>> {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }
}
