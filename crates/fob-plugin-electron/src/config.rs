//! Plugin configuration
//!
//! `ElectronRendererOptions` is the user-facing option set. It deserializes
//! from the same camelCase shape as a JSON config file:
//!
//! ```json
//! {
//!   "resolve": {
//!     "serialport": { "type": "cjs" },
//!     "got": { "type": "esm", "esm": { "minify": true } }
//!   },
//!   "cacheDir": ".fob-electron-renderer",
//!   "verbose": true
//! }
//! ```

use crate::catalog::ProcessEnvironment;
use crate::codegen::generate_cjs_wrapper;
use crate::error::{Error, Result};
use crate::prebundle::{BundleOverrides, PrebundleRequest, Prebundler, prebundle};
use crate::runtime::Runtime;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default cache directory name, nested under `node_modules`
pub const DEFAULT_CACHE_DIR: &str = ".fob-electron-renderer";

/// How a declared module is loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    /// CommonJS package, wrapped directly
    #[default]
    Cjs,
    /// ESM-only package, pre-bundled to CommonJS first
    Esm,
}

/// Builds the adapter for a declared module in place of the default strategy.
///
/// Implementations must be deterministic and free of side effects: the
/// first resolutions of an id may race, in which case the builder runs more
/// than once and the last write wins.
#[async_trait]
pub trait CustomBuilder: Send + Sync {
    async fn build(&self, helpers: &BuildHelpers) -> Result<String>;
}

#[async_trait]
impl<F> CustomBuilder for F
where
    F: Fn(&BuildHelpers) -> Result<String> + Send + Sync,
{
    async fn build(&self, helpers: &BuildHelpers) -> Result<String> {
        self(helpers)
    }
}

/// The default strategies, bound to one declared module, for use inside a
/// [`CustomBuilder`]
#[derive(Debug, Clone)]
pub struct BuildHelpers {
    module_id: String,
    prebundler: Arc<dyn Prebundler>,
    outdir: PathBuf,
    project_root: PathBuf,
    verbose: bool,
}

impl BuildHelpers {
    pub(crate) fn new(
        module_id: impl Into<String>,
        prebundler: Arc<dyn Prebundler>,
        outdir: impl Into<PathBuf>,
        project_root: impl Into<PathBuf>,
        verbose: bool,
    ) -> Self {
        Self {
            module_id: module_id.into(),
            prebundler,
            outdir: outdir.into(),
            project_root: project_root.into(),
            verbose,
        }
    }

    /// The module being built
    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    /// CommonJS wrapper exposing `exports`
    pub fn cjs<S: AsRef<str>>(&self, exports: &[S]) -> String {
        generate_cjs_wrapper(&self.module_id, exports)
    }

    /// Pre-bundle the module with `overrides` and wrap the result
    pub async fn esm(&self, overrides: BundleOverrides) -> Result<String> {
        let request = PrebundleRequest::new(&self.module_id, &self.outdir, &self.project_root)
            .with_overrides(overrides);
        prebundle(
            self.prebundler.as_ref(),
            &request,
            &self.project_root,
            self.verbose,
        )
        .await
    }
}

/// Handling for one declared module
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleResolveConfig {
    #[serde(rename = "type")]
    pub kind: ModuleKind,

    /// Export names for a CommonJS wrapper. When empty the package entry
    /// is scanned instead.
    pub exports: Vec<String>,

    /// Pre-bundle overrides for ESM modules
    pub esm: BundleOverrides,

    /// Takes precedence over `kind` when set
    #[serde(skip)]
    pub build: Option<Arc<dyn CustomBuilder>>,
}

impl std::fmt::Debug for ModuleResolveConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleResolveConfig")
            .field("kind", &self.kind)
            .field("exports", &self.exports)
            .field("esm", &self.esm)
            .field("build", &self.build.as_ref().map(|_| "<custom builder>"))
            .finish()
    }
}

impl ModuleResolveConfig {
    pub fn cjs() -> Self {
        Self::default()
    }

    pub fn esm() -> Self {
        Self {
            kind: ModuleKind::Esm,
            ..Self::default()
        }
    }

    pub fn with_exports<I, S>(mut self, exports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exports = exports.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_overrides(mut self, overrides: BundleOverrides) -> Self {
        self.esm = overrides;
        self
    }

    pub fn with_builder(mut self, builder: impl CustomBuilder + 'static) -> Self {
        self.build = Some(Arc::new(builder));
        self
    }

    /// Whether a full build can skip the adapter for this module
    pub fn is_esm(&self) -> bool {
        self.build.is_none() && self.kind == ModuleKind::Esm
    }
}

/// Options for the Electron renderer plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElectronRendererOptions {
    /// Declared third-party modules, in declaration order
    pub resolve: IndexMap<String, ModuleResolveConfig>,

    /// Cache directory name under `node_modules`
    pub cache_dir: String,

    /// Log each pre-bundling action
    pub verbose: bool,

    /// Process the platform adapter is generated for
    pub environment: ProcessEnvironment,
}

impl Default for ElectronRendererOptions {
    fn default() -> Self {
        Self {
            resolve: IndexMap::new(),
            cache_dir: DEFAULT_CACHE_DIR.to_string(),
            verbose: false,
            environment: ProcessEnvironment::Renderer,
        }
    }
}

impl ElectronRendererOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a third-party module
    pub fn declare(mut self, module_id: impl Into<String>, config: ModuleResolveConfig) -> Self {
        self.resolve.insert(module_id.into(), config);
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<String>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_environment(mut self, environment: ProcessEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// Reject options that cannot produce a usable cache layout
    pub fn validate(&self) -> Result<()> {
        let cache_dir = Path::new(&self.cache_dir);
        if self.cache_dir.trim().is_empty() {
            return Err(Error::InvalidOptions("`cacheDir` must not be empty".into()));
        }
        if cache_dir.is_absolute()
            || cache_dir
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(Error::InvalidOptions(format!(
                "`cacheDir` must be a directory name relative to node_modules, got '{}'",
                self.cache_dir
            )));
        }
        if let Some(id) = self.resolve.keys().find(|id| id.trim().is_empty()) {
            return Err(Error::InvalidOptions(format!(
                "`resolve` contains an empty module identifier: {:?}",
                id
            )));
        }
        Ok(())
    }

    /// `<node_modules>/<cacheDir>`, with `node_modules` found by walking up
    /// from `project_root` (or `<project_root>/node_modules` if none exists)
    pub fn cache_root(&self, project_root: &Path, runtime: &dyn Runtime) -> PathBuf {
        node_modules_dir(project_root, runtime).join(&self.cache_dir)
    }
}

/// Nearest `node_modules` directory at or above `project_root`
pub fn find_node_modules(project_root: &Path, runtime: &dyn Runtime) -> Option<PathBuf> {
    project_root
        .ancestors()
        .map(|dir| dir.join("node_modules"))
        .find(|candidate| runtime.exists(candidate))
}

pub(crate) fn node_modules_dir(project_root: &Path, runtime: &dyn Runtime) -> PathBuf {
    find_node_modules(project_root, runtime).unwrap_or_else(|| project_root.join("node_modules"))
}
