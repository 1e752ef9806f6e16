//! Project file and command-line tests.
//!
//! Tests verify:
//! - Relative paths in project files
//! - Command-line overrides of project settings
//! - Slice filtering and its errors
//! - The JSON plan summary

use clap::Parser;
use std::fs;

use layout_tiler::config::{Cli, Command, ProjectConfig};
use layout_tiler::error::ConfigError;
use layout_tiler::export::prepare_session;
use layout_tiler::pyramid::ExportPlan;
use layout_tiler::render::VectorEngine;
use layout_tiler::slice::SliceSpec;

use super::test_utils::DesignFixture;

#[test]
fn test_project_paths_resolve_against_project_dir() {
    let fixture = DesignFixture::new();
    let config = ProjectConfig::load(&fixture.write_project("")).unwrap();

    assert_eq!(config.style_sheet, fixture.style_sheet);
    assert_eq!(config.layouts, vec![fixture.layout.clone()]);
    assert_eq!(config.output_dir, fixture.output_dir());
    assert_eq!(config.slices.len(), 2);
    assert!(matches!(
        config.slices[1].spec,
        SliceSpec::CumulativeThreshold { ref up_to } if up_to == "met1"
    ));
}

#[test]
fn test_export_cli_overrides_project() {
    let fixture = DesignFixture::new();
    let project = fixture.write_project("");
    let cli = Cli::try_parse_from([
        "layout-tiler",
        "export",
        "--config",
        project.to_str().unwrap(),
        "--opaque",
        "--levels",
        "2..=9",
        "--slice",
        "metal",
        "--tile-size-exp",
        "1",
    ])
    .unwrap();

    let Command::Export(args) = cli.command else {
        panic!("expected export command");
    };
    let config = args.project().unwrap();
    assert!(!config.transparent);
    assert_eq!(config.tile_size_exp, 1);
    assert_eq!(args.levels(&config).unwrap(), 2..=3);

    let slices = args.project.slice_set(&config).unwrap();
    let names: Vec<&str> = slices.slices().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["metal"]);
}

#[test]
fn test_unknown_slice_filter_is_rejected() {
    let fixture = DesignFixture::new();
    let project = fixture.write_project("");
    let cli = Cli::try_parse_from([
        "layout-tiler",
        "check",
        "-c",
        project.to_str().unwrap(),
        "--slice",
        "beol9",
    ])
    .unwrap();

    let Command::Check(args) = cli.command else {
        panic!("expected check command");
    };
    let config = args.project.project().unwrap();
    let err = args.project.slice_set(&config).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownSlice(ref name) if name == "beol9"));
}

#[test]
fn test_unknown_threshold_layer_is_rejected() {
    let fixture = DesignFixture::new();
    let path = fixture.dir.path().join("bad.toml");
    fs::write(
        &path,
        "layer_order = [\"poly\"]\n[[slice]]\nname = \"top\"\nup_to = \"met9\"\n",
    )
    .unwrap();

    let config = ProjectConfig::load(&path).unwrap();
    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::UnknownThresholdLayer { .. }));
}

#[test]
fn test_plan_summary_json() {
    let fixture = DesignFixture::new();
    let config = ProjectConfig::load(&fixture.write_project("")).unwrap();
    let slices = config.slice_set().unwrap();

    let mut engine = VectorEngine::new();
    let full_box = prepare_session(&mut engine, &config.style_sheet, &config.layouts).unwrap();
    let plan = ExportPlan::build(full_box, &slices, config.shape());

    let json: serde_json::Value = serde_json::to_value(plan.summary()).unwrap();
    assert_eq!(json["total_tiles"], 14);
    assert_eq!(json["tile_size"], 4);
    assert_eq!(json["width"], 8);
    assert_eq!(json["levels"].as_array().unwrap().len(), 4);
    assert_eq!(json["levels"][3]["subdiv"], 2);
    assert_eq!(json["slices"][0]["name"], "feol");
    assert_eq!(json["full_box"]["right"], 100.0);
}
