//! Import interception
//!
//! Every specifier the host resolves is classified:
//!
//! - `electron`, a Node built-in, or `node:<built-in>`: served by a platform
//!   or built-in adapter keyed by the bare name
//! - a declared module: served by its custom builder, a CommonJS wrapper, or
//!   a pre-bundle, in that order of precedence
//! - anything else: left to the host
//!
//! ESM declared modules are only intercepted while serving. A full build
//! bundles them like any other dependency, so the declared pattern set
//! depends on the [`BuildMode`] and is recomputed on every configuration
//! pass.

use crate::builtins::{self, ELECTRON};
use crate::cache::CacheManager;
use crate::codegen::{generate_builtin_adapter, generate_cjs_wrapper, generate_platform_adapter};
use crate::config::{BuildHelpers, ElectronRendererOptions, ModuleKind, ModuleResolveConfig, node_modules_dir};
use crate::error::{Error, Result};
use crate::exports::scan_exports;
use crate::host::AliasResolver;
use crate::prebundle::{PrebundleRequest, Prebundler, prebundle};
use crate::runtime::Runtime;
use async_trait::async_trait;
use parking_lot::RwLock;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Whether the host is running a dev server or a production build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildMode {
    #[default]
    Serve,
    Build,
}

/// How a specifier is handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// `electron` or a built-in, by bare name
    Platform(String),
    /// A declared module
    Declared(String),
}

impl Interception {
    /// Cache key of the adapter
    pub fn module_id(&self) -> &str {
        match self {
            Self::Platform(id) | Self::Declared(id) => id,
        }
    }
}

/// Compiled matchers for one configuration pass
#[derive(Debug, Clone)]
pub struct InterceptPatterns {
    /// `^(?:node:)?(electron|fs|...)$`, group 1 is the bare name. Host
    /// aliases use it; `classify` goes through `builtins::normalize_platform`.
    pub builtin: Regex,
    /// `^(id|...)$` over the declared ids active in this mode
    pub declared: Option<Regex>,
    pub mode: BuildMode,
}

impl InterceptPatterns {
    pub fn compile(options: &ElectronRendererOptions, mode: BuildMode) -> Result<Self> {
        let names = std::iter::once(ELECTRON)
            .chain(builtins::NODE_BUILTINS.iter().copied())
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("|");
        let builtin_source = format!("^(?:node:)?({})$", names);
        let builtin = Regex::new(&builtin_source).map_err(|source| Error::InvalidPattern {
            identifier: ELECTRON.to_string(),
            source,
        })?;

        let active = active_declared_ids(options, mode);
        let declared = if active.is_empty() {
            None
        } else {
            // Compile each id alone first so an error names the culprit
            for id in &active {
                Regex::new(&format!("^{}$", regex::escape(id))).map_err(|source| {
                    Error::InvalidPattern {
                        identifier: id.to_string(),
                        source,
                    }
                })?;
            }
            let alternation = active
                .iter()
                .map(|id| regex::escape(id))
                .collect::<Vec<_>>()
                .join("|");
            let source = format!("^({})$", alternation);
            Some(Regex::new(&source).map_err(|source| Error::InvalidPattern {
                identifier: active.join(", "),
                source,
            })?)
        };

        Ok(Self {
            builtin,
            declared,
            mode,
        })
    }

    pub fn classify(&self, specifier: &str) -> Option<Interception> {
        if let Some(name) = builtins::normalize_platform(specifier) {
            return Some(Interception::Platform(name.to_string()));
        }
        if self.declared.as_ref().is_some_and(|re| re.is_match(specifier)) {
            return Some(Interception::Declared(specifier.to_string()));
        }
        None
    }
}

/// Declared ids intercepted in `mode`, in declaration order
pub fn active_declared_ids(options: &ElectronRendererOptions, mode: BuildMode) -> Vec<&str> {
    options
        .resolve
        .iter()
        .filter(|(_, config)| mode == BuildMode::Serve || !config.is_esm())
        .map(|(id, _)| id.as_str())
        .collect()
}

/// Classifies specifiers and materializes their adapters
#[derive(Debug)]
pub struct ResolutionInterceptor {
    options: Arc<ElectronRendererOptions>,
    cache: Arc<CacheManager>,
    prebundler: Arc<dyn Prebundler>,
    runtime: Arc<dyn Runtime>,
    project_root: PathBuf,
    patterns: RwLock<InterceptPatterns>,
}

impl ResolutionInterceptor {
    /// Create an interceptor configured for [`BuildMode::Serve`]
    pub fn new(
        options: Arc<ElectronRendererOptions>,
        cache: Arc<CacheManager>,
        prebundler: Arc<dyn Prebundler>,
        runtime: Arc<dyn Runtime>,
        project_root: impl Into<PathBuf>,
    ) -> Result<Self> {
        let patterns = InterceptPatterns::compile(&options, BuildMode::Serve)?;
        Ok(Self {
            options,
            cache,
            prebundler,
            runtime,
            project_root: project_root.into(),
            patterns: RwLock::new(patterns),
        })
    }

    /// Recompute the active patterns for `mode`
    pub fn configure(&self, mode: BuildMode) -> Result<()> {
        let patterns = InterceptPatterns::compile(&self.options, mode)?;
        debug!(
            "[fob-electron] Configured for {:?}: declared pattern {:?}",
            mode,
            patterns.declared.as_ref().map(Regex::as_str)
        );
        *self.patterns.write() = patterns;
        Ok(())
    }

    /// Snapshot of the active patterns
    pub fn patterns(&self) -> InterceptPatterns {
        self.patterns.read().clone()
    }

    pub fn mode(&self) -> BuildMode {
        self.patterns.read().mode
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn classify(&self, specifier: &str) -> Option<Interception> {
        self.patterns.read().classify(specifier)
    }

    /// Adapter path for `specifier`, or `None` when it is not intercepted
    pub async fn resolve(&self, specifier: &str) -> Result<Option<PathBuf>> {
        let Some(interception) = self.classify(specifier) else {
            return Ok(None);
        };
        debug!("[fob-electron] Intercepted {} as {:?}", specifier, interception);

        let module_id = interception.module_id().to_string();
        let path = self
            .cache
            .resolve(&module_id, || self.generate(&interception))
            .await?;
        Ok(Some(path))
    }

    async fn generate(&self, interception: &Interception) -> Result<String> {
        match interception {
            Interception::Platform(id) if id == ELECTRON => {
                Ok(generate_platform_adapter(self.options.environment))
            }
            Interception::Platform(id) => Ok(generate_builtin_adapter(id)),
            Interception::Declared(id) => match self.options.resolve.get(id) {
                Some(config) => self.generate_declared(id, config).await,
                None => Ok(generate_cjs_wrapper::<&str>(id, &[])),
            },
        }
    }

    async fn generate_declared(&self, id: &str, config: &ModuleResolveConfig) -> Result<String> {
        if let Some(builder) = &config.build {
            return builder
                .build(&self.build_helpers(id))
                .await
                .map_err(|e| match e {
                    Error::CustomBuilder { .. } => e,
                    other => Error::custom_builder(id, other),
                });
        }

        match config.kind {
            ModuleKind::Cjs if !config.exports.is_empty() => {
                Ok(generate_cjs_wrapper(id, &config.exports))
            }
            ModuleKind::Cjs => {
                let node_modules = node_modules_dir(&self.project_root, self.runtime.as_ref());
                let exports = discover_package_exports(self.runtime.as_ref(), &node_modules, id).await;
                Ok(generate_cjs_wrapper(id, &exports))
            }
            ModuleKind::Esm => {
                let request = PrebundleRequest::new(id, self.cache.root(), &self.project_root)
                    .with_overrides(config.esm.clone());
                prebundle(
                    self.prebundler.as_ref(),
                    &request,
                    &self.project_root,
                    self.options.verbose,
                )
                .await
            }
        }
    }

    fn build_helpers(&self, id: &str) -> BuildHelpers {
        BuildHelpers::new(
            id,
            Arc::clone(&self.prebundler),
            self.cache.root(),
            &self.project_root,
            self.options.verbose,
        )
    }
}

#[async_trait]
impl AliasResolver for ResolutionInterceptor {
    async fn resolve(&self, specifier: &str, _importer: Option<&str>) -> anyhow::Result<Option<String>> {
        use anyhow::Context;

        let path = ResolutionInterceptor::resolve(self, specifier)
            .await
            .with_context(|| format!("Failed to resolve '{}' for Electron", specifier))?;
        Ok(path.map(|p| p.to_string_lossy().into_owned()))
    }
}

/// Export names of an installed package, read from its entry file.
///
/// Best effort: a missing package, manifest or unparseable entry yields no
/// names, and the adapter falls back to a default export only.
pub async fn discover_package_exports(
    runtime: &dyn Runtime,
    node_modules: &Path,
    module_id: &str,
) -> Vec<String> {
    let Some(entry) = package_entry(runtime, node_modules, module_id).await else {
        warn!(
            "[fob-electron] Could not locate the entry of '{}'; exporting default only",
            module_id
        );
        return Vec::new();
    };

    let code = match runtime.read_file(&entry).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!("[fob-electron] Could not read {}: {}", entry.display(), e);
            return Vec::new();
        }
    };

    match scan_exports(&code) {
        Ok(scanned) => scanned.named,
        Err(e) => {
            warn!("[fob-electron] Could not scan exports of '{}': {}", module_id, e);
            Vec::new()
        }
    }
}

async fn package_entry(runtime: &dyn Runtime, node_modules: &Path, module_id: &str) -> Option<PathBuf> {
    let package_dir = node_modules.join(module_id);
    let manifest = runtime.read_file(&package_dir.join("package.json")).await.ok()?;
    let manifest: serde_json::Value = serde_json::from_slice(&manifest).ok()?;
    let main = manifest
        .get("main")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("index.js");

    let base = package_dir.join(main);
    let candidates = [
        base.clone(),
        base.with_extension("js"),
        base.with_extension("cjs"),
        base.join("index.js"),
    ];
    // Directories have no extension; `main` may omit one
    candidates
        .into_iter()
        .find(|candidate| candidate.extension().is_some() && runtime.exists(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModuleResolveConfig;

    fn options() -> ElectronRendererOptions {
        ElectronRendererOptions::new()
            .declare("serialport", ModuleResolveConfig::cjs())
            .declare("@scope/pkg", ModuleResolveConfig::cjs())
            .declare("lodash.merge", ModuleResolveConfig::cjs())
            .declare("got", ModuleResolveConfig::esm())
    }

    #[test]
    fn test_builtin_pattern() {
        let patterns = InterceptPatterns::compile(&options(), BuildMode::Serve).unwrap();

        assert_eq!(
            patterns.classify("electron"),
            Some(Interception::Platform("electron".into()))
        );
        assert_eq!(patterns.classify("fs"), Some(Interception::Platform("fs".into())));
        assert_eq!(
            patterns.classify("node:fs"),
            Some(Interception::Platform("fs".into()))
        );
        assert_eq!(
            patterns.classify("node:fs/promises"),
            Some(Interception::Platform("fs/promises".into()))
        );
        assert_eq!(patterns.classify("fsevents"), None);
        assert_eq!(patterns.classify("node:electron-store"), None);
        assert_eq!(patterns.classify("react"), None);
    }

    #[test]
    fn test_classify_agrees_with_alias_pattern() {
        let patterns = InterceptPatterns::compile(&options(), BuildMode::Serve).unwrap();
        let others = ["react", "node:react", "fsevents", "electron-store", "node:electron"];
        let samples = builtins::platform_module_ids()
            .into_iter()
            .chain(others.map(String::from));

        for specifier in samples {
            let from_alias = patterns
                .builtin
                .captures(&specifier)
                .and_then(|c| c.get(1))
                .map(|m| Interception::Platform(m.as_str().to_string()));
            let classified = patterns
                .classify(&specifier)
                .filter(|i| matches!(i, Interception::Platform(_)));
            assert_eq!(classified, from_alias, "{}", specifier);
        }
    }

    #[test]
    fn test_declared_ids_are_escaped() {
        let patterns = InterceptPatterns::compile(&options(), BuildMode::Serve).unwrap();

        assert_eq!(
            patterns.classify("@scope/pkg"),
            Some(Interception::Declared("@scope/pkg".into()))
        );
        assert_eq!(
            patterns.classify("lodash.merge"),
            Some(Interception::Declared("lodash.merge".into()))
        );
        assert_eq!(patterns.classify("lodashXmerge"), None);
        assert_eq!(patterns.classify("@scope/pkg2"), None);
        assert_eq!(patterns.classify("x@scope/pkg"), None);
    }

    #[test]
    fn test_esm_modules_skipped_in_build() {
        let serve = InterceptPatterns::compile(&options(), BuildMode::Serve).unwrap();
        let build = InterceptPatterns::compile(&options(), BuildMode::Build).unwrap();

        assert_eq!(serve.classify("got"), Some(Interception::Declared("got".into())));
        assert_eq!(build.classify("got"), None);
        assert_eq!(
            build.classify("serialport"),
            Some(Interception::Declared("serialport".into()))
        );
    }

    #[test]
    fn test_no_declared_modules() {
        let patterns =
            InterceptPatterns::compile(&ElectronRendererOptions::default(), BuildMode::Build).unwrap();
        assert!(patterns.declared.is_none());
        assert_eq!(patterns.classify("serialport"), None);
    }

    #[test]
    fn test_active_declared_ids_keep_order() {
        let opts = options();
        assert_eq!(
            active_declared_ids(&opts, BuildMode::Serve),
            vec!["serialport", "@scope/pkg", "lodash.merge", "got"]
        );
        assert_eq!(
            active_declared_ids(&opts, BuildMode::Build),
            vec!["serialport", "@scope/pkg", "lodash.merge"]
        );
    }
}
