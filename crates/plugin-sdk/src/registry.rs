//! Method registry and discovery.
//!
//! Providers export explicit registration lists; discovery concatenates them
//! in order and builds an immutable name index. There is no scanning of
//! arbitrary namespaces: a provider that wants its methods served adds them
//! to its list.

use crate::error::{PluginError, Result};
use crate::method::{MethodMetadata, PluginMethod};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Registration list exported by one provider package.
pub struct ProviderMethods {
    pub provider: &'static str,
    pub methods: Vec<PluginMethod>,
}

/// Immutable index of all discovered methods.
///
/// Built once per discovery pass; `get` returns the same definition across
/// repeated calls within one epoch. Order of `list` is discovery order, so
/// operators can reason about provider precedence.
#[derive(Debug)]
pub struct Registry {
    methods: Vec<PluginMethod>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Build a registry from provider registration lists.
    ///
    /// # Errors
    ///
    /// Fails fast with [`PluginError::DuplicateMethodName`] when two
    /// definitions share a name (a packaging bug, caught before traffic is
    /// served), or with a configuration error when a definition is invalid.
    pub fn discover(providers: Vec<ProviderMethods>) -> Result<Self> {
        let mut methods = Vec::new();
        let mut index = HashMap::new();

        for provider in providers {
            let count = provider.methods.len();
            for method in provider.methods {
                method.validate()?;
                let name = method.metadata.name.clone();
                if index.contains_key(&name) {
                    return Err(PluginError::DuplicateMethodName { name });
                }
                index.insert(name, methods.len());
                methods.push(method);
            }
            tracing::info!(provider = provider.provider, methods = count, "registered provider methods");
        }

        Ok(Self { methods, index })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PluginMethod> {
        self.index.get(name).map(|&i| &self.methods[i])
    }

    /// All registered method metadata, in discovery order.
    pub fn list(&self) -> impl Iterator<Item = &MethodMetadata> {
        self.methods.iter().map(|m| &m.metadata)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Shared handle over the current registry epoch.
///
/// Readers take a cheap [`Arc`] snapshot; an explicit reload builds a whole
/// new registry and swaps it in atomically. Reloads are mutually exclusive
/// with themselves: a second reload while one is in flight is refused.
#[derive(Clone)]
pub struct SharedRegistry {
    inner: Arc<SharedRegistryInner>,
}

struct SharedRegistryInner {
    current: RwLock<Arc<Registry>>,
    reload: Mutex<()>,
}

impl SharedRegistry {
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(SharedRegistryInner {
                current: RwLock::new(Arc::new(registry)),
                reload: Mutex::new(()),
            }),
        }
    }

    /// The current discovery epoch.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Registry> {
        self.inner.current.read().clone()
    }

    /// Run a fresh discovery pass and swap it in.
    ///
    /// In-flight `execute` calls keep their snapshot; new calls see the new
    /// epoch.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if another reload is already in flight,
    /// or any error from [`Registry::discover`] (in which case the previous
    /// epoch stays in place).
    pub fn reload(&self, providers: Vec<ProviderMethods>) -> Result<()> {
        let Some(_guard) = self.inner.reload.try_lock() else {
            return Err(PluginError::Config(
                "a discovery pass is already in flight".to_string(),
            ));
        };

        let next = Registry::discover(providers)?;
        *self.inner.current.write() = Arc::new(next);
        Ok(())
    }
}
