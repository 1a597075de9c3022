//! Pre-bundling of ESM-only packages
//!
//! An ESM-only package cannot be loaded with `require`, so it is first
//! flattened by a secondary bundler into a single CommonJS file inside the
//! cache directory. The adapter then loads that file instead of the package.

use crate::builtins;
use crate::codegen::{ExportSource, generate_prebundled_adapter};
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use async_trait::async_trait;
use path_clean::PathClean;
use rolldown::{
    BundlerBuilder as RolldownBundlerBuilder, BundlerOptions, InputItem, IsExternal,
    OutputFormat, Platform, RawMinifyOptions, SourceMapType,
};
use rolldown_common::Output;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Extension of pre-bundled files; `require` treats it as CommonJS
pub const BUNDLE_EXTENSION: &str = "cjs";

/// Target platform of a pre-bundle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundlePlatform {
    #[default]
    Node,
    Browser,
    Neutral,
}

impl From<BundlePlatform> for Platform {
    fn from(platform: BundlePlatform) -> Self {
        match platform {
            BundlePlatform::Node => Platform::Node,
            BundlePlatform::Browser => Platform::Browser,
            BundlePlatform::Neutral => Platform::Neutral,
        }
    }
}

/// Caller overrides for one pre-bundle.
///
/// Every field is optional; a set field replaces the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BundleOverrides {
    /// Emit inline source maps (default `true`)
    pub sourcemap: Option<bool>,
    /// Minify the bundle (default `false`)
    pub minify: Option<bool>,
    /// Target platform (default `node`)
    pub platform: Option<BundlePlatform>,
    /// Module ids left external (default: `electron` and every built-in)
    pub external: Option<Vec<String>>,
}

impl BundleOverrides {
    pub fn with_sourcemap(mut self, enabled: bool) -> Self {
        self.sourcemap = Some(enabled);
        self
    }

    pub fn with_minify(mut self, enabled: bool) -> Self {
        self.minify = Some(enabled);
        self
    }

    pub fn with_platform(mut self, platform: BundlePlatform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_external(mut self, external: Vec<String>) -> Self {
        self.external = Some(external);
        self
    }
}

/// Fully resolved options for one pre-bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrebundleOptions {
    /// Package to bundle, used as the entry
    pub entry: String,
    /// File the bundle is written to
    pub outfile: PathBuf,
    /// Directory the entry is resolved from
    pub cwd: PathBuf,
    pub sourcemap: bool,
    pub minify: bool,
    pub platform: BundlePlatform,
    pub external: Vec<String>,
}

impl PrebundleOptions {
    /// Defaults for bundling `request`, with its overrides merged last
    pub fn for_request(request: &PrebundleRequest) -> Self {
        let defaults = Self {
            entry: request.module_id.clone(),
            outfile: request.outfile(),
            cwd: request.cwd.clone(),
            sourcemap: true,
            minify: false,
            platform: BundlePlatform::Node,
            external: builtins::platform_module_ids(),
        };
        defaults.merge(&request.overrides)
    }

    /// Apply `overrides` on top of these options
    pub fn merge(mut self, overrides: &BundleOverrides) -> Self {
        if let Some(sourcemap) = overrides.sourcemap {
            self.sourcemap = sourcemap;
        }
        if let Some(minify) = overrides.minify {
            self.minify = minify;
        }
        if let Some(platform) = overrides.platform {
            self.platform = platform;
        }
        if let Some(external) = &overrides.external {
            self.external = external.clone();
        }
        self
    }

    fn to_bundler_options(&self) -> BundlerOptions {
        BundlerOptions {
            input: Some(vec![InputItem {
                name: None,
                import: self.entry.clone(),
            }]),
            cwd: Some(self.cwd.clone()),
            format: Some(OutputFormat::Cjs),
            platform: Some(self.platform.into()),
            sourcemap: self.sourcemap.then_some(SourceMapType::Inline),
            minify: self.minify.then(|| RawMinifyOptions::from(true)),
            external: Some(IsExternal::from(self.external.clone())),
            ..Default::default()
        }
    }
}

/// Request to flatten one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrebundleRequest {
    pub module_id: String,
    /// Directory the bundle is written into
    pub outdir: PathBuf,
    /// Directory the package is resolved from
    pub cwd: PathBuf,
    pub overrides: BundleOverrides,
}

impl PrebundleRequest {
    pub fn new(module_id: impl Into<String>, outdir: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            module_id: module_id.into(),
            outdir: outdir.into(),
            cwd: cwd.into(),
            overrides: BundleOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: BundleOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// `<outdir>/<sanitized id>.cjs`
    pub fn outfile(&self) -> PathBuf {
        self.outdir.join(format!(
            "{}.{}",
            sanitize_module_id(&self.module_id),
            BUNDLE_EXTENSION
        ))
    }
}

/// Result of a pre-bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrebundleOutput {
    /// Path of the written bundle
    pub file: PathBuf,
    /// Bundled code as written
    pub code: String,
    /// Export names reported by the bundler, if it reports any
    pub exports: Option<Vec<String>>,
}

/// Secondary bundler used for ESM-only packages
#[async_trait]
pub trait Prebundler: Send + Sync + std::fmt::Debug {
    /// Bundle `request.module_id` into a single CommonJS file at
    /// `request.outfile()`.
    ///
    /// Failures are returned as-is; callers do not retry.
    async fn bundle(&self, request: &PrebundleRequest) -> Result<PrebundleOutput>;
}

/// Pre-bundler backed by Rolldown
#[derive(Debug, Clone)]
pub struct RolldownPrebundler {
    runtime: Arc<dyn Runtime>,
}

impl RolldownPrebundler {
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl Prebundler for RolldownPrebundler {
    async fn bundle(&self, request: &PrebundleRequest) -> Result<PrebundleOutput> {
        let options = PrebundleOptions::for_request(request);
        let module = &request.module_id;

        let mut bundler = RolldownBundlerBuilder::default()
            .with_options(options.to_bundler_options())
            .build()
            .map_err(|e| Error::prebundle(module, format!("{:?}", e)))?;

        let bundle = bundler
            .generate()
            .await
            .map_err(|e| Error::prebundle(module, format!("{:?}", e)))?;

        let chunk = bundle
            .assets
            .iter()
            .find_map(|asset| match asset {
                Output::Chunk(chunk) if chunk.is_entry => Some(chunk),
                _ => None,
            })
            .ok_or_else(|| Error::NoEntryChunk {
                module: module.clone(),
            })?;

        let code = chunk.code.to_string();
        let exports: Vec<String> = chunk.exports.iter().map(|name| name.to_string()).collect();

        if let Some(parent) = options.outfile.parent() {
            self.runtime.create_dir(parent, true).await?;
        }
        self.runtime
            .write_file(&options.outfile, code.as_bytes())
            .await?;

        debug!(
            "[fob-electron] Pre-bundled {} -> {}",
            module,
            options.outfile.display()
        );

        Ok(PrebundleOutput {
            file: options.outfile,
            code,
            exports: (!exports.is_empty()).then_some(exports),
        })
    }
}

/// Make a module id safe to use as a file name.
///
/// Path separators, scope markers and drive colons become `_`, so
/// `@scope/pkg` and `fs/promises` map to `_scope_pkg` and `fs_promises`.
pub fn sanitize_module_id(module_id: &str) -> String {
    module_id
        .chars()
        .map(|c| match c {
            '/' | '\\' | '@' | ':' => '_',
            c => c,
        })
        .collect()
}

/// Pre-bundle `request` and return the adapter that loads the bundle.
///
/// The adapter references the bundle relative to `project_root`, which is
/// where the renderer's `require` resolves relative paths from.
pub async fn prebundle(
    prebundler: &dyn Prebundler,
    request: &PrebundleRequest,
    project_root: &Path,
    verbose: bool,
) -> Result<String> {
    if verbose {
        info!("[fob-electron] Pre-bundling {}", request.module_id);
    }

    let output = prebundler.bundle(request).await?;
    let relative = relative_path(project_root, &output.file);

    let adapter = match &output.exports {
        Some(names) => generate_prebundled_adapter(&relative, ExportSource::Names(names)),
        None => generate_prebundled_adapter(&relative, ExportSource::Source(&output.code)),
    };

    if verbose {
        info!(
            "[fob-electron] Pre-bundled {} into {}",
            request.module_id,
            output.file.display()
        );
    }

    Ok(adapter)
}

/// Path of `target` relative to `base`, with `/` separators.
///
/// Both paths are cleaned first; when they share no prefix (e.g. different
/// drives) the cleaned target is returned unchanged.
pub(crate) fn relative_path(base: &Path, target: &Path) -> String {
    let base = base.to_path_buf().clean();
    let target = target.to_path_buf().clean();

    // A cleaned "." is a lone CurDir, which is not a directory level
    let base_parts: Vec<Component<'_>> = base
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let target_parts: Vec<Component<'_>> = target
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    let common = base_parts
        .iter()
        .zip(&target_parts)
        .take_while(|(a, b)| a == b)
        .count();

    if common == 0 && base.is_absolute() {
        return target.to_string_lossy().replace('\\', "/");
    }

    let mut parts: Vec<String> = Vec::new();
    for _ in common..base_parts.len() {
        parts.push("..".to_string());
    }
    for part in &target_parts[common..] {
        parts.push(part.as_os_str().to_string_lossy().into_owned());
    }
    parts.join("/")
}
