//! End-to-end runs against a temporary directory

use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use wueste_gen::fixtures::{self, TEST_SCHEMA_FILE};
use wueste_gen::{render, Error, GeneratorConfig, Language};

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_write_test_schema_generates_typescript() {
    let dir = tempfile::tempdir().unwrap();
    let config = GeneratorConfig {
        output_dir: dir.path().to_path_buf(),
        write_test_schema: true,
        ..GeneratorConfig::default()
    };
    let written = render::run(&config).unwrap();
    assert_eq!(written.len(), 2);
    assert_eq!(
        file_names(dir.path()),
        vec![TEST_SCHEMA_FILE, "simple_type.ts", "simple_type_sub.ts"]
    );
    let out = fs::read_to_string(dir.path().join("simple_type.ts")).unwrap();
    assert!(out.contains("export interface SimpleType {"));
}

#[test]
fn test_go_run_over_ref_chain_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let schemas = dir.path().join("schema");
    let out = dir.path().join("out");
    fs::create_dir_all(&schemas).unwrap();
    fs::write(schemas.join("base.schema.json"), fixtures::base().to_json()).unwrap();
    fs::write(schemas.join("sub.schema.json"), fixtures::base_sub().to_json()).unwrap();
    fs::write(schemas.join("sub2.schema.json"), fixtures::sub2().to_json()).unwrap();

    let mut config = GeneratorConfig {
        output_dir: out.clone(),
        input_files: vec![schemas.join("base.schema.json")],
        ..GeneratorConfig::default()
    };
    config.entity.language = Language::Go;
    config.entity.package_name = "entity".to_string();

    render::run(&config).unwrap();
    assert_eq!(file_names(&out), vec!["base.go", "sub.go", "sub2.go"]);
    let base = fs::read_to_string(out.join("base.go")).unwrap();
    assert!(base.contains("package entity\n"), "{base}");
    assert!(base.contains("Sub() SubClass"), "{base}");
}

#[test]
fn test_shared_refs_across_inputs_are_written_once() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("sub.schema.json"), fixtures::base_sub().to_json()).unwrap();
    fs::write(dir.path().join("sub2.schema.json"), fixtures::sub2().to_json()).unwrap();
    fs::write(dir.path().join("base.schema.json"), fixtures::base().to_json()).unwrap();
    let out = dir.path().join("out");

    let config = GeneratorConfig {
        output_dir: out.clone(),
        input_files: vec![
            dir.path().join("base.schema.json"),
            dir.path().join("sub.schema.json"),
        ],
        ..GeneratorConfig::default()
    };
    let written = render::run(&config).unwrap();
    assert_eq!(written.len(), 3);
    assert_eq!(file_names(&out), vec!["base.ts", "sub.ts", "sub2.ts"]);
}

#[test]
fn test_include_dirs_from_yaml_config() {
    let dir = tempfile::tempdir().unwrap();
    let lib = dir.path().join("lib");
    fs::create_dir_all(&lib).unwrap();
    fs::write(dir.path().join("base.schema.json"), fixtures::base().to_json()).unwrap();
    fs::write(lib.join("sub.schema.json"), fixtures::base_sub().to_json()).unwrap();
    fs::write(lib.join("sub2.schema.json"), fixtures::sub2().to_json()).unwrap();

    let yaml = format!(
        "include_dirs:\n  - {}\noutput_dir: {}\ninput_files:\n  - {}\n",
        lib.display(),
        dir.path().join("out").display(),
        dir.path().join("base.schema.json").display()
    );
    let config = GeneratorConfig::from_yaml(&yaml).unwrap();
    let written = render::run(&config).unwrap();
    assert_eq!(written.len(), 3);
}

#[test]
fn test_missing_input_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let config = GeneratorConfig {
        output_dir: out.clone(),
        input_files: vec![dir.path().join("missing.schema.json")],
        ..GeneratorConfig::default()
    };
    let err = render::run(&config).unwrap_err();
    assert!(matches!(err, Error::Resolution(_) | Error::Load { .. }), "{err}");
    assert!(!out.exists());
}

#[test]
fn test_run_requires_input() {
    let err = render::run(&GeneratorConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Config(_)), "{err}");
}
