//! Shared test utilities for fob-plugin-electron tests

#![allow(dead_code)]

use async_trait::async_trait;
use fob_plugin_electron::{
    ElectronRendererOptions, Error, FobElectronPlugin, NativeRuntime, PrebundleOutput,
    PrebundleRequest, Prebundler, Result, Runtime, RuntimeResult,
};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Runtime that counts writes and delegates to the host file system
#[derive(Debug, Default)]
pub struct CountingRuntime {
    inner: NativeRuntime,
    writes: AtomicUsize,
}

impl CountingRuntime {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Runtime for CountingRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        self.inner.read_file(path).await
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write_file(path, content).await
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    async fn create_dir(&self, path: &Path, recursive: bool) -> RuntimeResult<()> {
        self.inner.create_dir(path, recursive).await
    }
}

/// Pre-bundler that records requests and writes a canned CommonJS bundle
#[derive(Debug, Default)]
pub struct FakePrebundler {
    pub requests: Mutex<Vec<PrebundleRequest>>,
    /// Names reported back; `None` makes callers scan the code
    pub exports: Option<Vec<String>>,
    /// Fail every request with this message
    pub failure: Option<String>,
}

impl FakePrebundler {
    pub fn reporting(exports: &[&str]) -> Self {
        Self {
            exports: Some(exports.iter().map(|s| s.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn modules(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| r.module_id.clone())
            .collect()
    }
}

pub const FAKE_BUNDLE: &str = "\"use strict\";\nObject.defineProperty(exports, \"__esModule\", { value: true });\nexports.hello = function hello() {};\nexports.default = 1;\n";

#[async_trait]
impl Prebundler for FakePrebundler {
    async fn bundle(&self, request: &PrebundleRequest) -> Result<PrebundleOutput> {
        self.requests.lock().push(request.clone());
        if let Some(message) = &self.failure {
            return Err(Error::prebundle(&request.module_id, message));
        }

        let file = request.outfile();
        std::fs::create_dir_all(&request.outdir).unwrap();
        std::fs::write(&file, FAKE_BUNDLE).unwrap();
        Ok(PrebundleOutput {
            file,
            code: FAKE_BUNDLE.to_string(),
            exports: self.exports.clone(),
        })
    }
}

/// Project directory with an empty `node_modules`
pub fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("node_modules")).unwrap();
    dir
}

/// Write a package into `<root>/node_modules/<name>`
pub fn write_package(root: &Path, name: &str, manifest: serde_json::Value, files: &[(&str, &str)]) -> PathBuf {
    let dir = root.join("node_modules").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("package.json"), manifest.to_string()).unwrap();
    for (path, content) in files {
        let file = dir.join(path);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(file, content).unwrap();
    }
    dir
}

/// Plugin wired to a counting runtime and a fake pre-bundler
pub fn plugin_with_fakes(
    root: &Path,
    options: ElectronRendererOptions,
    prebundler: FakePrebundler,
) -> (FobElectronPlugin, Arc<CountingRuntime>, Arc<FakePrebundler>) {
    let runtime = Arc::new(CountingRuntime::default());
    let prebundler = Arc::new(prebundler);
    let plugin = FobElectronPlugin::with_prebundler(
        root,
        options,
        runtime.clone(),
        prebundler.clone(),
    )
    .unwrap();
    (plugin, runtime, prebundler)
}

pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}
