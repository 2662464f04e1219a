//! Extension module registry with hot reload.
//!
//! Modules are named by stable ids and produced by a [`ModuleLoader`]
//! capability; the registry memoizes loaded handles. `load` always
//! evicts the cached handle before asking the loader again, so a
//! long-lived process picks up the latest build of a module — and a
//! failed reload leaves the entry removed rather than stale.
//!
//! `init` eagerly loads every configured module so dynamic failures
//! surface at startup instead of at first use.

mod contracts;
mod error;

pub use contracts::{HookContext, PostProcessor, QueryRunner};
pub use error::LoadError;

use crate::config::{self, Config};
use crate::log;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Module Handles
// ============================================================================

/// A loaded extension module.
#[derive(Clone)]
pub enum Module {
    Query(Arc<dyn QueryRunner>),
    PostProcessor(Arc<dyn PostProcessor>),
}

impl Module {
    pub fn kind(&self) -> ModuleKind {
        match self {
            Self::Query(_) => ModuleKind::Query,
            Self::PostProcessor(_) => ModuleKind::PostProcessor,
        }
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Module::{}", self.kind())
    }
}

/// Kind tag for [`Module`] handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    Query,
    PostProcessor,
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::PostProcessor => write!(f, "post-processor"),
        }
    }
}

/// Capability producing module handles from stable ids.
pub trait ModuleLoader: Send + Sync {
    /// Resolve and load the module named `id`.
    ///
    /// # Errors
    ///
    /// `LoadError::Unknown` when the id cannot be resolved,
    /// `LoadError::Failed` when resolution yields no usable handle.
    fn load(&self, id: &str) -> Result<Module, LoadError>;
}

// ============================================================================
// Registry
// ============================================================================

/// Registry of loaded extension modules, keyed by module id.
pub struct ModuleRegistry {
    loader: Box<dyn ModuleLoader>,
    handles: RwLock<FxHashMap<String, Module>>,
    config: Arc<Config>,
}

impl ModuleRegistry {
    /// Create a registry over `loader` using the process-wide config.
    pub fn new(loader: Box<dyn ModuleLoader>) -> Self {
        Self::with_config(loader, config::cfg())
    }

    /// Create a registry over `loader` with an explicit config.
    pub fn with_config(loader: Box<dyn ModuleLoader>, config: Arc<Config>) -> Self {
        Self {
            loader,
            handles: RwLock::new(FxHashMap::default()),
            config,
        }
    }

    /// Unconditionally (re)load the module at `id`.
    ///
    /// Any cached handle is discarded first: if the loader then fails,
    /// the registry is left without an entry for `id`, never with a
    /// stale one.
    ///
    /// # Errors
    ///
    /// Propagates the loader's `LoadError`.
    pub fn load(&self, id: &str) -> Result<Module, LoadError> {
        self.handles.write().remove(id);

        let module = self.loader.load(id)?;
        self.handles
            .write()
            .insert(id.to_owned(), module.clone());
        log!("modules"; "loaded `{}` ({})", id, module.kind());
        Ok(module)
    }

    /// Return the cached handle for `id`, loading it if absent.
    ///
    /// # Errors
    ///
    /// Propagates the loader's `LoadError` on a cache miss.
    pub fn get(&self, id: &str) -> Result<Module, LoadError> {
        if let Some(module) = self.handles.read().get(id) {
            return Ok(module.clone());
        }
        self.load(id)
    }

    /// Evict the cached handle for `id` without loading.
    pub fn remove(&self, id: &str) {
        if self.handles.write().remove(id).is_some() {
            log!("modules"; "removed `{}`", id);
        }
    }

    /// Eagerly load every configured module.
    ///
    /// Loads the `[modules].query` list, the query runner, and the
    /// post-processor if configured.
    ///
    /// # Errors
    ///
    /// The first failing module aborts startup with its `LoadError`.
    pub fn init(&self) -> Result<(), LoadError> {
        for id in &self.config.modules.query {
            self.load(id)?;
        }
        if let Some(id) = &self.config.modules.query_runner {
            self.load(id)?;
        }
        if let Some(id) = &self.config.modules.post_processor {
            self.load(id)?;
        }
        Ok(())
    }

    /// Fetch `id` as a query runner.
    ///
    /// # Errors
    ///
    /// `LoadError::WrongKind` when `id` resolves to another module kind.
    pub fn query_runner(&self, id: &str) -> Result<Arc<dyn QueryRunner>, LoadError> {
        match self.get(id)? {
            Module::Query(runner) => Ok(runner),
            other => Err(LoadError::WrongKind {
                id: id.to_owned(),
                expected: ModuleKind::Query,
                actual: other.kind(),
            }),
        }
    }

    /// Fetch `id` as a post-processor.
    ///
    /// # Errors
    ///
    /// `LoadError::WrongKind` when `id` resolves to another module kind.
    pub fn post_processor(&self, id: &str) -> Result<Arc<dyn PostProcessor>, LoadError> {
        match self.get(id)? {
            Module::PostProcessor(pp) => Ok(pp),
            other => Err(LoadError::WrongKind {
                id: id.to_owned(),
                expected: ModuleKind::PostProcessor,
                actual: other.kind(),
            }),
        }
    }

    /// The query runner named by `[modules].query_runner`, if any.
    ///
    /// # Errors
    ///
    /// Propagates load and kind errors for a configured id.
    pub fn configured_query_runner(&self) -> Result<Option<Arc<dyn QueryRunner>>, LoadError> {
        match &self.config.modules.query_runner {
            Some(id) => Ok(Some(self.query_runner(id)?)),
            None => Ok(None),
        }
    }

    /// The post-processor named by `[modules].post_processor`, if any.
    ///
    /// # Errors
    ///
    /// Propagates load and kind errors for a configured id.
    pub fn configured_post_processor(&self) -> Result<Option<Arc<dyn PostProcessor>>, LoadError> {
        match &self.config.modules.post_processor {
            Some(id) => Ok(Some(self.post_processor(id)?)),
            None => Ok(None),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use serde_json::{Map, Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoRunner;

    impl QueryRunner for EchoRunner {
        fn run(&self, query_id: &str, _params: &Map<String, Value>) -> anyhow::Result<Value> {
            Ok(json!({ "query": query_id }))
        }
    }

    struct NoopProcessor;

    impl PostProcessor for NoopProcessor {}

    /// Loader that knows a fixed set of ids and counts invocations.
    struct TestLoader {
        loads: Arc<AtomicUsize>,
    }

    impl ModuleLoader for TestLoader {
        fn load(&self, id: &str) -> Result<Module, LoadError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            match id {
                "query/echo" => Ok(Module::Query(Arc::new(EchoRunner))),
                "hooks/noop" => Ok(Module::PostProcessor(Arc::new(NoopProcessor))),
                "query/broken" => Err(LoadError::Failed {
                    id: id.to_owned(),
                    source: anyhow!("no usable handle"),
                }),
                _ => Err(LoadError::Unknown(id.to_owned())),
            }
        }
    }

    fn registry_with(config: Config) -> (ModuleRegistry, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let loader = TestLoader {
            loads: loads.clone(),
        };
        let registry = ModuleRegistry::with_config(Box::new(loader), Arc::new(config));
        (registry, loads)
    }

    fn registry() -> (ModuleRegistry, Arc<AtomicUsize>) {
        registry_with(Config::default())
    }

    #[test]
    fn test_get_memoizes() {
        let (registry, loads) = registry();
        registry.get("query/echo").unwrap();
        registry.get("query/echo").unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_load_always_reloads() {
        let (registry, loads) = registry();
        registry.load("query/echo").unwrap();
        registry.load("query/echo").unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_load_leaves_no_entry() {
        let (registry, loads) = registry();
        assert!(registry.get("query/broken").is_err());

        // A later get must retry the loader, not find a cached handle.
        assert!(registry.get("query/broken").is_err());
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_remove_evicts() {
        let (registry, loads) = registry();
        registry.get("query/echo").unwrap();
        registry.remove("query/echo");
        registry.get("query/echo").unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unknown_module() {
        let (registry, _) = registry();
        assert!(matches!(
            registry.get("query/missing"),
            Err(LoadError::Unknown(_))
        ));
    }

    #[test]
    fn test_typed_accessor_wrong_kind() {
        let (registry, _) = registry();
        assert!(matches!(
            registry.query_runner("hooks/noop"),
            Err(LoadError::WrongKind { .. })
        ));
        assert!(matches!(
            registry.post_processor("query/echo"),
            Err(LoadError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_init_loads_configured_modules() {
        let mut config = Config::default();
        config.modules.query = vec!["query/echo".into()];
        config.modules.post_processor = Some("hooks/noop".into());

        let (registry, loads) = registry_with(config);
        registry.init().unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);

        // Both handles are now cached
        registry.query_runner("query/echo").unwrap();
        registry.post_processor("hooks/noop").unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_init_aborts_on_failure() {
        let mut config = Config::default();
        config.modules.query = vec!["query/broken".into()];

        let (registry, _) = registry_with(config);
        assert!(registry.init().is_err());
    }

    #[test]
    fn test_configured_accessors() {
        let mut config = Config::default();
        config.modules.query_runner = Some("query/echo".into());

        let (registry, _) = registry_with(config);
        assert!(registry.configured_query_runner().unwrap().is_some());
        assert!(registry.configured_post_processor().unwrap().is_none());
    }
}
