//! Rolldown-backed tests: real pre-bundling and the plugin inside a build

mod helpers;

use fob_plugin_electron::exports::{scan_exports, validate_module};
use fob_plugin_electron::{
    ElectronRendererOptions, FobElectronPlugin, ModuleResolveConfig, NativeRuntime,
    PrebundleRequest, Prebundler, RolldownPrebundler, prebundle,
};
use helpers::{project, read, write_package};
use rolldown::{BundlerBuilder, BundlerOptions, InputItem, OutputFormat, Platform};
use rolldown_common::Output;
use rolldown_plugin::__inner::SharedPluginable;
use serde_json::json;
use std::sync::Arc;

fn write_esm_package(root: &std::path::Path) {
    write_package(
        root,
        "esm-pkg",
        json!({
            "name": "esm-pkg",
            "type": "module",
            "main": "index.js",
            "exports": "./index.js"
        }),
        &[
            (
                "index.js",
                "import { join } from \"node:path\";\nimport { helper } from \"./helper.js\";\nexport const hello = (name) => join(\"greetings\", helper(name));\nexport function goodbye() { return \"bye\"; }\nexport default hello;\n",
            ),
            ("helper.js", "export const helper = (name) => `hi ${name}`;\n"),
        ],
    );
}

#[tokio::test]
async fn test_rolldown_prebundles_esm_package() {
    let dir = project();
    write_esm_package(dir.path());

    let prebundler = RolldownPrebundler::new(Arc::new(NativeRuntime::new()));
    let outdir = dir.path().join("node_modules").join(".fob-electron-renderer");
    let request = PrebundleRequest::new("esm-pkg", &outdir, dir.path());

    let output = prebundler.bundle(&request).await.unwrap();

    assert_eq!(output.file, outdir.join("esm-pkg.cjs"));
    assert_eq!(read(&output.file), output.code);
    // Local imports are inlined, built-ins stay external
    assert!(output.code.contains("hi "));
    assert!(output.code.contains("node:path"));

    let names = match &output.exports {
        Some(names) => names.clone(),
        None => scan_exports(&output.code).unwrap().named,
    };
    assert!(names.contains(&"hello".to_string()));
    assert!(names.contains(&"goodbye".to_string()));
    assert!(!names.contains(&"__esModule".to_string()));
}

#[tokio::test]
async fn test_prebundle_adapter_for_real_bundle() {
    let dir = project();
    write_esm_package(dir.path());

    let prebundler = RolldownPrebundler::new(Arc::new(NativeRuntime::new()));
    let outdir = dir.path().join("node_modules").join(".cache");
    let request = PrebundleRequest::new("esm-pkg", &outdir, dir.path());

    let adapter = prebundle(&prebundler, &request, dir.path(), true).await.unwrap();

    assert!(adapter.contains("avoid_parse_require(\"./node_modules/.cache/esm-pkg.cjs\")"));
    assert!(adapter.contains("export const hello = _M_.hello;"));
    assert!(adapter.contains("export const goodbye = _M_.goodbye;"));
    validate_module(&adapter).unwrap();
}

#[tokio::test]
async fn test_missing_package_fails_prebundle() {
    let dir = project();
    let prebundler = RolldownPrebundler::new(Arc::new(NativeRuntime::new()));
    let request = PrebundleRequest::new("does-not-exist", dir.path().join("out"), dir.path());

    let err = prebundler.bundle(&request).await.unwrap_err();
    assert!(matches!(err, fob_plugin_electron::Error::Prebundle { .. }));
    assert!(!request.outfile().exists());
}

#[tokio::test]
async fn test_plugin_serves_adapters_to_rolldown() {
    let dir = project();
    write_esm_package(dir.path());
    std::fs::write(
        dir.path().join("renderer.js"),
        "import { ipcRenderer } from \"electron\";\nimport { readFileSync } from \"node:fs\";\nimport { hello } from \"esm-pkg\";\nipcRenderer.send(\"ready\", readFileSync, hello(\"x\"));\n",
    )
    .unwrap();

    let options = ElectronRendererOptions::new().declare("esm-pkg", ModuleResolveConfig::esm());
    let plugin = FobElectronPlugin::new(dir.path(), options).unwrap();
    let cache_root = plugin.cache_root().to_path_buf();
    let plugins: Vec<SharedPluginable> = vec![Arc::new(plugin)];

    let mut bundler = BundlerBuilder::default()
        .with_options(BundlerOptions {
            input: Some(vec![InputItem {
                name: Some("renderer".to_string()),
                import: "./renderer.js".to_string(),
            }]),
            cwd: Some(dir.path().to_path_buf()),
            format: Some(OutputFormat::Esm),
            platform: Some(Platform::Browser),
            ..Default::default()
        })
        .with_plugins(plugins)
        .build()
        .unwrap();
    let bundle = bundler.generate().await.unwrap();

    let code = bundle
        .assets
        .iter()
        .find_map(|asset| match asset {
            Output::Chunk(chunk) if chunk.is_entry => Some(chunk.code.to_string()),
            _ => None,
        })
        .unwrap();

    assert!(code.contains("avoid_parse_require"));
    assert!(code.contains("\"electron\""));
    assert!(code.contains("\"fs\""));
    assert!(code.contains("esm-pkg.cjs"));

    assert!(cache_root.join("electron.mjs").exists());
    assert!(cache_root.join("fs.mjs").exists());
    assert!(cache_root.join("esm-pkg.mjs").exists());
    assert!(cache_root.join("esm-pkg.cjs").exists());
}
