//! End-to-end builds with the built-in module-unification compiler

mod common;

use bytebundle_build::{
    read_container, seal_and_emit, AssetMap, BuildError, BuildHooks, BytecodePlugin, EntryKind,
    HostContext, PlaceholderModule, TemplateScope,
};
use bytebundle_config::ConfigLoader;
use common::{MemoryGraph, MemoryModule};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

/// Create a project directory holding a bytebundle.toml
fn create_project(config: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bytebundle.toml"), config).unwrap();
    dir
}

fn load_plugin(project: &TempDir) -> BytecodePlugin {
    let config = ConfigLoader::new()
        .without_env()
        .load_from_directory(project.path())
        .unwrap();
    BytecodePlugin::new(config.resolved_plugin()).unwrap()
}

fn parse_data_segment(source: &str) -> serde_json::Value {
    let body = source
        .strip_prefix("export default ")
        .and_then(|s| s.strip_suffix(";\n"))
        .unwrap();
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn test_build_from_config_file() {
    let project = create_project(
        r#"
output = "templates.gbx"
mode = "module-unification"
main_path = "src/ui/components/App"

[builtins.if]
module = "@glimmer/runtime"
export = "ifHelper"
kind = "helper"
"#,
    );
    let root = project.path().to_path_buf();
    let mut plugin = load_plugin(&project);
    let table = MemoryModule::new("src/data/table.js");

    plugin
        .on_session_start(&HostContext::with_context(&root))
        .unwrap();
    {
        let mut discovery = plugin.discovery().unwrap();
        discovery.register_placeholder(table.handle());
        discovery.register_component(
            root.join("src/ui/components/App.hbs"),
            "<Nav/>{{outlet}}",
            TemplateScope::from([("Nav".to_string(), "./Nav".to_string())]),
        );
        discovery.register_component(
            root.join("src/ui/components/Nav.hbs"),
            "<nav></nav>",
            TemplateScope::new(),
        );
        discovery.register_ast(
            root.join("src/ui/components/Footer.json"),
            json!({"statements": [["text", "bye"]]}),
        );
    }

    let mut graph = MemoryGraph::default();
    let mut assets = AssetMap::new();
    let summary = seal_and_emit(&mut plugin, &mut graph, &mut assets).await.unwrap();

    assert_eq!(summary.passes, 2);
    assert_eq!(summary.assets_written, 1);

    let asset = assets.get("templates.gbx").unwrap();
    let entries = read_container(&asset.bytes).unwrap();
    let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "src/ui/components/App.hbs",
            "src/ui/components/Footer.json",
            "src/ui/components/Nav.hbs",
        ]
    );
    assert_eq!(entries[1].kind, EntryKind::Ast);
    assert_eq!(entries[2].payload, b"<nav></nav>".to_vec());

    let segment = parse_data_segment(&table.source());
    assert_eq!(segment["main"], 0);
    assert_eq!(segment["heap"], "templates.gbx");
    assert_eq!(segment["checksum"], asset.metadata.checksum.as_str());
    assert_eq!(segment["table"][0]["scope"]["Nav"], "./Nav");
    assert_eq!(segment["builtins"]["if"]["kind"], "helper");
    assert_eq!(table.rebuilds.get(), 1);

    let session = plugin.session().unwrap();
    assert_eq!(session.stats().components, 2);
    assert_eq!(session.stats().asts, 1);
    assert_eq!(session.stats().placeholders, 1);
    assert_eq!(session.stats().bytecode_size, asset.size());
}

#[tokio::test]
async fn test_missing_main_template_fails_build() {
    let project = create_project(
        r#"
output = "templates.gbx"
mode = "module-unification"
main_path = "src/ui/components/App"
"#,
    );
    let root = project.path().to_path_buf();
    let mut plugin = load_plugin(&project);
    let table = MemoryModule::new("src/data/table.js");

    plugin
        .on_session_start(&HostContext::with_context(&root))
        .unwrap();
    plugin.discovery().unwrap().register_placeholder(table.handle());

    let mut assets = AssetMap::new();
    let err = seal_and_emit(&mut plugin, &mut MemoryGraph::default(), &mut assets)
        .await
        .unwrap_err();

    assert!(matches!(err, BuildError::CompilationError { .. }));
    assert!(err.to_string().contains("src/ui/components/App"));
    assert_eq!(table.rebuilds.get(), 0);
    assert!(assets.is_empty());
}

#[tokio::test]
async fn test_context_from_config_overrides_host() {
    let project = create_project(
        r#"
output = "templates.gbx"
mode = "module-unification"
context = "app"
"#,
    );
    let mut plugin = load_plugin(&project);

    plugin
        .on_session_start(&HostContext::with_context("/elsewhere"))
        .unwrap();
    plugin.discovery().unwrap().register_component(
        project.path().join("app/src/Hello.hbs"),
        "hello",
        TemplateScope::new(),
    );

    let mut assets = AssetMap::new();
    seal_and_emit(&mut plugin, &mut MemoryGraph::default(), &mut assets)
        .await
        .unwrap();

    let entries = read_container(&assets.get("templates.gbx").unwrap().bytes).unwrap();
    assert_eq!(entries[0].path, "src/Hello.hbs");
}

#[tokio::test]
async fn test_watch_mode_rebuilds_are_independent() {
    let project = create_project(
        r#"
output = "out/templates.gbx"
mode = "module-unification"
"#,
    );
    let root = project.path().to_path_buf();
    let mut plugin = load_plugin(&project);
    let output_dir = root.join("dist");

    for (iteration, template) in ["<p>one</p>", "<p>two</p>"].iter().enumerate() {
        let table = MemoryModule::new("src/data/table.js");
        plugin
            .on_session_start(&HostContext::with_context(&root))
            .unwrap();
        {
            let mut discovery = plugin.discovery().unwrap();
            discovery.register_placeholder(table.handle());
            discovery.register_component(root.join("src/App.hbs"), *template, TemplateScope::new());
        }

        let mut graph = MemoryGraph::default();
        let mut assets = AssetMap::new();
        let summary = seal_and_emit(&mut plugin, &mut graph, &mut assets).await.unwrap();
        assert_eq!(summary.passes, 2, "iteration {}", iteration);
        assert_eq!(graph.unseals, 1);

        let written = assets.write_all(&output_dir).unwrap();
        assert_eq!(written, vec![output_dir.join("out/templates.gbx")]);

        let entries = read_container(&fs::read(&written[0]).unwrap()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].payload, template.as_bytes().to_vec());
    }
}
