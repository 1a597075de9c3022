//! Rolldown plugin for Electron renderers
//!
//! Lets renderer code import `electron`, Node.js built-ins and selected
//! CommonJS or ESM-only packages with plain ES module syntax. Each such import
//! is resolved to a generated adapter that loads the real module with the
//! renderer's `require` and re-exports its members statically.
//!
//! ## Architecture
//!
//! ```text
//! import "node:fs" → resolve_id() → ResolutionInterceptor::classify()
//!                                      ↓ Platform("fs")
//!                    CacheManager::resolve("fs") → hit: existing adapter path
//!                                      ↓ miss
//!                    codegen / prebundle → write <node_modules>/<cacheDir>/fs.mjs
//! ```
//!
//! Adapters are written once and trusted afterwards; delete the cache
//! directory to regenerate them.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fob_plugin_electron::{
//!     BuildMode, ElectronRendererOptions, FobElectronPlugin, HostConfig, ModuleResolveConfig,
//! };
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ElectronRendererOptions::new()
//!     .declare("serialport", ModuleResolveConfig::cjs())
//!     .declare("got", ModuleResolveConfig::esm())
//!     .with_verbose(true);
//! let plugin = FobElectronPlugin::new(".", options)?;
//!
//! // Dev-server hosts patch their configuration each pass
//! let mut host = HostConfig::default();
//! plugin.configure(&mut host, BuildMode::Serve)?;
//!
//! // Rolldown uses the plugin directly
//! let plugin = Arc::new(plugin);
//! # Ok(())
//! # }
//! ```

use anyhow::Context;
use rolldown_common::ResolvedExternal;
use rolldown_plugin::{HookResolveIdArgs, HookResolveIdOutput, HookResolveIdReturn, Plugin, PluginContext};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub mod builtins;
pub mod cache;
pub mod catalog;
pub mod codegen;
pub mod config;
pub mod error;
pub mod exports;
pub mod host;
#[cfg(feature = "logging")]
pub mod logging;
pub mod prebundle;
pub mod resolver;
pub mod runtime;

pub use cache::CacheManager;
pub use catalog::{ApiDescriptor, ProcessEnvironment};
pub use codegen::{
    ExportSource, generate_builtin_adapter, generate_cjs_wrapper, generate_platform_adapter,
    generate_prebundled_adapter,
};
pub use config::{
    BuildHelpers, CustomBuilder, DEFAULT_CACHE_DIR, ElectronRendererOptions, ModuleKind,
    ModuleResolveConfig,
};
pub use error::{Error, Result};
pub use host::{
    Alias, AliasInput, AliasPattern, AliasResolver, HostConfig, HostPatch, IgnorePredicate,
    IgnoreRule, OutputOptions, OutputTargets,
};
pub use prebundle::{
    BundleOverrides, BundlePlatform, PrebundleOutput, PrebundleRequest, Prebundler,
    RolldownPrebundler, prebundle,
};
pub use resolver::{BuildMode, Interception, ResolutionInterceptor};
pub use runtime::{NativeRuntime, Runtime, RuntimeError, RuntimeResult};

/// Name the plugin registers under, also used to tag its host aliases
pub const PLUGIN_NAME: &str = "fob-electron";

/// Rolldown plugin serving Electron and Node.js built-ins as ES modules
///
/// Owns one cache session: adapters resolved through this instance are
/// remembered until it is dropped. Clones share the session.
#[derive(Clone, Debug)]
pub struct FobElectronPlugin {
    options: Arc<ElectronRendererOptions>,
    interceptor: Arc<ResolutionInterceptor>,
    project_root: PathBuf,
}

impl FobElectronPlugin {
    /// Plugin using the host file system and Rolldown for pre-bundling
    pub fn new(project_root: impl Into<PathBuf>, options: ElectronRendererOptions) -> Result<Self> {
        Self::with_runtime(project_root, options, Arc::new(NativeRuntime::new()))
    }

    /// Plugin using `runtime` for all cache I/O
    pub fn with_runtime(
        project_root: impl Into<PathBuf>,
        options: ElectronRendererOptions,
        runtime: Arc<dyn Runtime>,
    ) -> Result<Self> {
        let prebundler = Arc::new(RolldownPrebundler::new(Arc::clone(&runtime)));
        Self::with_prebundler(project_root, options, runtime, prebundler)
    }

    /// Plugin with an explicit pre-bundler
    pub fn with_prebundler(
        project_root: impl Into<PathBuf>,
        options: ElectronRendererOptions,
        runtime: Arc<dyn Runtime>,
        prebundler: Arc<dyn Prebundler>,
    ) -> Result<Self> {
        options.validate()?;
        let project_root = project_root.into();
        let cache_root = options.cache_root(&project_root, runtime.as_ref());
        debug!("[fob-electron] Cache directory: {}", cache_root.display());

        let options = Arc::new(options);
        let cache = Arc::new(CacheManager::new(cache_root, Arc::clone(&runtime)));
        let interceptor = ResolutionInterceptor::new(
            Arc::clone(&options),
            cache,
            prebundler,
            runtime,
            project_root.clone(),
        )?;

        Ok(Self {
            options,
            interceptor: Arc::new(interceptor),
            project_root,
        })
    }

    pub fn options(&self) -> &ElectronRendererOptions {
        &self.options
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn cache_root(&self) -> &Path {
        self.interceptor.cache().root()
    }

    pub fn interceptor(&self) -> &Arc<ResolutionInterceptor> {
        &self.interceptor
    }

    /// Run one configuration pass: switch the interceptor to `mode` and
    /// patch `host` so it routes matching imports through the plugin.
    pub fn configure(&self, host: &mut HostConfig, mode: BuildMode) -> Result<()> {
        self.interceptor.configure(mode)?;
        host.apply(self.host_patch());
        Ok(())
    }

    /// Host changes for the interceptor's current mode
    pub fn host_patch(&self) -> HostPatch {
        let patterns = self.interceptor.patterns();
        let alias_resolver: Arc<dyn AliasResolver> = self.interceptor.clone();
        let declared = resolver::active_declared_ids(&self.options, patterns.mode)
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut aliases = vec![
            Alias::new(AliasPattern::Regex(patterns.builtin), "$1")
                .with_resolver(Arc::clone(&alias_resolver))
                .owned_by(PLUGIN_NAME),
        ];
        if let Some(declared_pattern) = patterns.declared {
            aliases.push(
                Alias::new(AliasPattern::Regex(declared_pattern), "$1")
                    .with_resolver(alias_resolver)
                    .owned_by(PLUGIN_NAME),
            );
        }

        let mut commonjs_ignore = builtins::platform_module_ids();
        commonjs_ignore.extend(declared.iter().cloned());

        HostPatch {
            aliases,
            commonjs_ignore,
            optimize_deps_exclude: declared,
        }
    }
}

impl Plugin for FobElectronPlugin {
    fn name(&self) -> Cow<'static, str> {
        PLUGIN_NAME.into()
    }

    fn register_hook_usage(&self) -> rolldown_plugin::HookUsage {
        use rolldown_plugin::HookUsage;
        HookUsage::ResolveId
    }

    /// Resolve intercepted specifiers to their adapter files.
    ///
    /// Anything not intercepted returns `Ok(None)` so Rolldown's own
    /// resolution (and its errors) apply unchanged.
    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let specifier = args.specifier.to_string();
        let interceptor = Arc::clone(&self.interceptor);

        async move {
            let Some(path) = interceptor
                .resolve(&specifier)
                .await
                .with_context(|| format!("Failed to resolve '{}' for Electron", specifier))?
            else {
                return Ok(None);
            };

            Ok(Some(HookResolveIdOutput {
                id: path.to_string_lossy().into_owned().into(),
                external: Some(ResolvedExternal::Bool(false)),
                ..Default::default()
            }))
        }
    }
}
