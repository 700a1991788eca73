//! Runtime attachments that never get persisted.
//!
//! A component owns two process-local handles: a tracing span that scopes
//! every event it emits, and a [`DiskCache`]. Both are rebuilt from
//! [`HandleSettings`] by [`RuntimeHandles::attach`], which is the only
//! constructor and is used at construction and after every load alike.

use std::env;
use std::path::PathBuf;

use tracing::Span;

use crate::cache::DiskCache;

/// Env var overriding the cache root.
pub const CACHE_DIR_ENV: &str = "VECPIPE_CACHE_DIR";
/// Env var enabling verbose (debug-level) component diagnostics.
pub const VERBOSE_ENV: &str = "VECPIPE_VERBOSE";

const DEFAULT_CACHE_DIR: &str = ".vecpipe_cache";

/// Where the runtime handles point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleSettings {
    /// Root directory; each component kind gets its own subdirectory.
    pub cache_root: PathBuf,
    /// Emit per-phase debug events from component hot paths.
    pub verbose: bool,
}

impl Default for HandleSettings {
    fn default() -> Self {
        Self {
            cache_root: PathBuf::from(DEFAULT_CACHE_DIR),
            verbose: false,
        }
    }
}

impl HandleSettings {
    /// Defaults overridden by `VECPIPE_CACHE_DIR` / `VECPIPE_VERBOSE`.
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Let `VECPIPE_CACHE_DIR` / `VECPIPE_VERBOSE` override these settings.
    pub fn apply_env(mut self) -> Self {
        if let Some(dir) = env::var_os(CACHE_DIR_ENV).filter(|v| !v.is_empty()) {
            self.cache_root = PathBuf::from(dir);
        }
        if let Ok(flag) = env::var(VERBOSE_ENV) {
            self.verbose = parse_flag(&flag);
        }
        self
    }

    pub fn with_cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = root.into();
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Logging span + disk cache for one component instance.
#[derive(Debug, Clone)]
pub struct RuntimeHandles {
    span: Span,
    cache: DiskCache,
    verbose: bool,
}

impl RuntimeHandles {
    pub fn attach(kind: &'static str, settings: &HandleSettings) -> Self {
        let span = tracing::info_span!("component", kind, verbose = settings.verbose);
        Self {
            span,
            cache: DiskCache::new(settings.cache_root.join(kind)),
            verbose: settings.verbose,
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn cache(&self) -> &DiskCache {
        &self.cache
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}
