//! canopy - an in-memory, path-indexed document store with include
//! resolution for content exports.
//!
//! Files exported by a content source are ingested into a tree that
//! mirrors their paths; every tree level aggregates the documents at
//! or below it, split into main documents and named variants. A
//! memoization cache keeps re-ingestion of unchanged files cheap, a
//! module registry supplies hot-reloadable extensions (query runners
//! and ingestion post-processors), and the include resolver embeds
//! cross-document references declared in document metadata.
//!
//! # Composition
//!
//! ```ignore
//! use canopy::{
//!     AddOptions, DocStore, FsSource, IncludeResolver, ModuleRegistry,
//!     config::{self, Config},
//! };
//!
//! config::init_config(Config::from_path(Path::new("canopy.toml"))?);
//!
//! let registry = ModuleRegistry::new(Box::new(loader));
//! registry.init()?;
//!
//! let store = DocStore::new(Box::new(FsSource));
//! store.set_post_processor(registry.configured_post_processor()?);
//!
//! for file in discovered_files {
//!     store.add(&base_dir, &file, AddOptions { use_stage: true, use_cache: true })?;
//! }
//! store.promote_stage();
//!
//! IncludeResolver::new().resolve_store(&store, &registry)?;
//! ```

pub mod cache;
pub mod config;
pub mod logger;
pub mod registry;
pub mod resolve;
pub mod store;

pub use cache::MemoCache;
pub use config::Config;
pub use registry::{
    HookContext, LoadError, Module, ModuleKind, ModuleLoader, ModuleRegistry, PostProcessor,
    QueryRunner,
};
pub use resolve::{IncludeResolver, MountStrategy, MountTable};
pub use store::{
    AddOptions, DocRef, DocStore, Document, FileBody, FileSource, FsSource, LevelIndex, Lookup,
};
