//! Host configuration tests: merging into user-supplied config shapes

mod helpers;

use fob_plugin_electron::{
    Alias, AliasInput, AliasPattern, BuildMode, ElectronRendererOptions, FobElectronPlugin,
    HostConfig, IgnorePredicate, IgnoreRule, ModuleResolveConfig, OutputOptions, OutputTargets,
    PLUGIN_NAME,
};
use helpers::project;
use indexmap::IndexMap;
use std::sync::Arc;

fn plugin(root: &std::path::Path) -> FobElectronPlugin {
    let options = ElectronRendererOptions::new()
        .declare("serialport", ModuleResolveConfig::cjs().with_exports(["SerialPort"]))
        .declare("got", ModuleResolveConfig::esm());
    FobElectronPlugin::new(root, options).unwrap()
}

#[test]
fn test_ignore_list_merge_has_no_duplicates() {
    let dir = project();
    let plugin = plugin(dir.path());

    let mut host = HostConfig::default();
    host.build.commonjs_options.ignore = Some(IgnoreRule::List(vec![
        "my-addon".into(),
        "fs".into(),
        "serialport".into(),
    ]));

    plugin.configure(&mut host, BuildMode::Serve).unwrap();
    plugin.configure(&mut host, BuildMode::Serve).unwrap();

    let Some(IgnoreRule::List(list)) = &host.build.commonjs_options.ignore else {
        panic!("ignore list should stay a list");
    };
    let mut unique = list.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), list.len());

    assert_eq!(list[0], "my-addon");
    for required in ["electron", "fs", "node:fs", "path", "node:path", "serialport", "got"] {
        assert!(list.iter().any(|id| id == required), "{}", required);
    }
}

#[test]
fn test_ignore_predicate_keeps_user_semantics() {
    let dir = project();
    let plugin = plugin(dir.path());

    let mut host = HostConfig::default();
    host.build.commonjs_options.ignore =
        Some(IgnoreRule::Predicate(Arc::new(|id: &str| id.ends_with(".node"))));
    plugin.configure(&mut host, BuildMode::Build).unwrap();

    let ignore = host.build.commonjs_options.ignore.as_ref().unwrap();
    assert!(matches!(ignore, IgnoreRule::Extended { .. }));
    assert!(ignore.matches("addon.node"));
    assert!(ignore.matches("serialport"));
    assert!(ignore.matches("node:crypto"));
    assert!(!ignore.matches("got"));
}

#[test]
fn test_ignore_predicate_follows_latest_pass() {
    let dir = project();
    let plugin = plugin(dir.path());

    let user: IgnorePredicate = Arc::new(|id: &str| id.ends_with(".node"));
    let mut host = HostConfig::default();
    host.build.commonjs_options.ignore = Some(IgnoreRule::Predicate(Arc::clone(&user)));

    for _ in 0..10 {
        plugin.configure(&mut host, BuildMode::Serve).unwrap();
    }
    assert!(host.build.commonjs_options.ignore.as_ref().unwrap().matches("got"));

    plugin.configure(&mut host, BuildMode::Build).unwrap();
    let Some(IgnoreRule::Extended { predicate, ids }) = &host.build.commonjs_options.ignore else {
        panic!("ignore rule should keep the user predicate");
    };
    assert!(Arc::ptr_eq(predicate, &user));
    assert!(ids.iter().any(|id| id == "serialport"));
    assert!(!ids.iter().any(|id| id == "got"));

    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());
}

#[tokio::test]
async fn test_user_aliases_win() {
    let dir = project();
    let plugin = plugin(dir.path());

    let mut map = IndexMap::new();
    map.insert("path".to_string(), "path-browserify".to_string());
    let mut host = HostConfig::default();
    host.resolve.alias = Some(AliasInput::Map(map));

    plugin.configure(&mut host, BuildMode::Serve).unwrap();

    let aliases = host.aliases();
    assert_eq!(aliases[0].find, AliasPattern::Exact("path".into()));
    assert!(aliases[0].owner.is_none());
    assert!(aliases[1..].iter().all(|a| a.owner.as_deref() == Some(PLUGIN_NAME)));

    assert_eq!(
        host.resolve_alias("path", None).await.unwrap().as_deref(),
        Some("path-browserify")
    );

    let os = host.resolve_alias("node:os", None).await.unwrap().unwrap();
    assert_eq!(os, plugin.cache_root().join("os.mjs").to_string_lossy());
    assert!(std::path::Path::new(&os).exists());

    let serialport = host.resolve_alias("serialport", None).await.unwrap().unwrap();
    assert!(serialport.ends_with("serialport.mjs"));

    assert_eq!(host.resolve_alias("react", None).await.unwrap(), None);
}

#[test]
fn test_configure_passes_replace_plugin_aliases() {
    let dir = project();
    let plugin = plugin(dir.path());

    let mut host = HostConfig::default();
    host.resolve.alias = Some(AliasInput::List(vec![Alias::new(
        AliasPattern::Exact("@".into()),
        "/src",
    )]));

    plugin.configure(&mut host, BuildMode::Serve).unwrap();
    assert_eq!(host.aliases().len(), 3);

    // The declared alias no longer matches ESM modules in build mode
    plugin.configure(&mut host, BuildMode::Build).unwrap();
    let aliases = host.aliases();
    assert_eq!(aliases.len(), 3);
    let AliasPattern::Regex(declared) = &aliases[2].find else {
        panic!("declared alias should be a pattern");
    };
    assert!(declared.is_match("serialport"));
    assert!(!declared.is_match("got"));
}

#[test]
fn test_output_and_base_defaults() {
    let dir = project();
    let plugin = plugin(dir.path());

    let mut host = HostConfig::default();
    host.build.rollup_options.output = Some(OutputTargets::Multiple(vec![
        OutputOptions {
            freeze: Some(true),
            format: Some("es".into()),
        },
        OutputOptions {
            freeze: None,
            format: Some("cjs".into()),
        },
    ]));
    plugin.configure(&mut host, BuildMode::Build).unwrap();

    assert_eq!(host.base.as_deref(), Some("./"));
    let Some(OutputTargets::Multiple(outputs)) = &host.build.rollup_options.output else {
        panic!("expected multiple outputs");
    };
    assert!(outputs.iter().all(|o| o.freeze == Some(false)));
}

#[test]
fn test_optimize_deps_exclude_is_deduped() {
    let dir = project();
    let plugin = plugin(dir.path());

    let mut host = HostConfig::default();
    host.optimize_deps.exclude = vec!["serialport".into(), "lodash".into()];
    plugin.configure(&mut host, BuildMode::Serve).unwrap();
    plugin.configure(&mut host, BuildMode::Serve).unwrap();

    assert_eq!(host.optimize_deps.exclude, vec!["serialport", "lodash", "got"]);
}
