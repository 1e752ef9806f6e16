//! End-to-end export tests with the built-in vector engine.
//!
//! Tests verify:
//! - Manifest content and file layout
//! - Tile sizes per level
//! - Slice visibility in rendered pixels
//! - Transparent and opaque tile modes
//! - Partial level exports

use std::fs;

use layout_tiler::config::ProjectConfig;
use layout_tiler::export::{export_project, inventory, ExportOptions};
use layout_tiler::io::OutputTree;
use layout_tiler::pyramid::ExportPlan;
use layout_tiler::render::{RenderSession, VectorEngine};

use super::test_utils::{read_tile, DesignFixture};

const EXPECTED_MANIFEST: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<Image xmlns=\"http://schemas.microsoft.com/deepzoom/2008\" Format=\"png\" Overlap=\"0\" TileSize=\"4\">\n  \
<Size Height=\"8\" Width=\"8\" />\n\
</Image>\n";

fn load(fixture: &DesignFixture, extra: &str) -> ProjectConfig {
    ProjectConfig::load(&fixture.write_project(extra)).unwrap()
}

// =============================================================================
// Layout of the Output Tree
// =============================================================================

#[test]
fn test_export_writes_manifests_and_all_tiles() {
    let fixture = DesignFixture::new();
    let config = load(&fixture, "");
    let slices = config.slice_set().unwrap();

    let mut engine = VectorEngine::new();
    let stats = export_project(
        &mut engine,
        &config,
        slices,
        ExportOptions::transparent(0..=config.zoom_depth),
    )
    .unwrap();

    // Levels 0..=2 are one tile each, level 3 is a 2x2 grid.
    assert_eq!(stats.manifests, 2);
    assert_eq!(stats.passes, 8);
    assert_eq!(stats.tiles, 14);
    assert_eq!(stats.renders, 28);

    let out = fixture.output_dir();
    for slice in ["feol", "metal"] {
        let manifest = fs::read_to_string(out.join(format!("{slice}.dzi"))).unwrap();
        assert_eq!(manifest, EXPECTED_MANIFEST);

        for (level, size) in [(0, 1), (1, 2), (2, 4)] {
            let tile = read_tile(&out.join(format!("{slice}_files/{level}/0_0.png")));
            assert_eq!(tile.dimensions(), (size, size));
        }
        for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            let tile = read_tile(&out.join(format!("{slice}_files/3/{x}_{y}.png")));
            assert_eq!(tile.dimensions(), (4, 4));
        }
        assert!(!out.join(format!("{slice}_files/3/2_0.png")).exists());
    }
}

#[test]
fn test_export_leaves_no_temporary_files() {
    let fixture = DesignFixture::new();
    let config = load(&fixture, "");
    let slices = config.slice_set().unwrap();
    let mut engine = VectorEngine::new();
    export_project(&mut engine, &config, slices, ExportOptions::opaque(0..=3)).unwrap();

    let level = fixture.output_dir().join("feol_files/3");
    for entry in fs::read_dir(level).unwrap() {
        let name = entry.unwrap().file_name().into_string().unwrap();
        assert!(name.ends_with(".png"), "unexpected file {name}");
    }
}

#[test]
fn test_inventory_complete_after_export() {
    let fixture = DesignFixture::new();
    let config = load(&fixture, "");
    let slices = config.slice_set().unwrap();
    let mut engine = VectorEngine::new();
    export_project(
        &mut engine,
        &config,
        slices.clone(),
        ExportOptions::opaque(0..=3),
    )
    .unwrap();

    let full_box = engine.bounding_box().unwrap();
    let plan = ExportPlan::build(full_box, &slices, config.shape());
    let found = inventory(&OutputTree::new(&config.output_dir), &plan);
    assert!(found.is_complete());
    assert_eq!(found.manifests_present, 2);
}

// =============================================================================
// Rendered Content
// =============================================================================

#[test]
fn test_transparent_tiles_follow_slice_visibility() {
    let fixture = DesignFixture::new();
    let config = load(&fixture, "");
    let slices = config.slice_set().unwrap();
    let mut engine = VectorEngine::new();
    export_project(&mut engine, &config, slices, ExportOptions::transparent(3..=3)).unwrap();

    let out = fixture.output_dir();

    // Row 0 is the top of the design; column 0 is the poly half.
    let poly = read_tile(&out.join("feol_files/3/0_0.png"));
    for pixel in poly.pixels() {
        assert_eq!(pixel[3], 255);
        assert!(pixel[0] >= 250 && pixel[1] <= 5 && pixel[2] <= 5);
    }

    // met1 is not part of feol, and the unstyled 99/0 layer is never shown.
    let bare = read_tile(&out.join("feol_files/3/1_0.png"));
    assert!(bare.pixels().all(|p| p[3] == 0));

    // The cumulative slice includes met1, drawn through the cell instance.
    let metal = read_tile(&out.join("metal_files/3/1_0.png"));
    let corner = metal.get_pixel(3, 0);
    assert_eq!(corner[3], 255);
    assert!(corner[2] >= 250 && corner[0] <= 5 && corner[1] <= 5);
}

#[test]
fn test_opaque_tiles_are_white_where_empty() {
    let fixture = DesignFixture::new();
    let config = load(&fixture, "transparent = false");
    assert!(!config.transparent);
    let slices = config.slice_set().unwrap();
    let mut engine = VectorEngine::new();
    let stats =
        export_project(&mut engine, &config, slices, ExportOptions::opaque(3..=3)).unwrap();
    assert_eq!(stats.renders, stats.tiles);

    let bare = read_tile(&fixture.output_dir().join("feol_files/3/1_1.png"));
    for pixel in bare.pixels() {
        assert_eq!(pixel.0, [255, 255, 255, 255]);
    }
}

#[test]
fn test_unpremultiply_restores_edge_color() {
    let fixture = DesignFixture::new();
    let tile = fixture.output_dir().join("feol_files/0/0_0.png");

    // The single level-0 pixel is only partly covered by poly.
    let plain = load(&fixture, "");
    let slices = plain.slice_set().unwrap();
    let options = ExportOptions::from_config(&plain, 0..=0);
    assert!(options.transparent && !options.unpremultiply);
    export_project(&mut VectorEngine::new(), &plain, slices, options).unwrap();
    let premultiplied = read_tile(&tile).get_pixel(0, 0).0;
    assert!(premultiplied[3] > 0 && premultiplied[3] < 255);
    assert!(premultiplied[0] < 250);

    let config = load(&fixture, "unpremultiply = true");
    let slices = config.slice_set().unwrap();
    let options = ExportOptions::from_config(&config, 0..=0);
    assert!(options.unpremultiply);
    export_project(&mut VectorEngine::new(), &config, slices, options).unwrap();
    let restored = read_tile(&tile).get_pixel(0, 0).0;
    assert_eq!(restored[3], premultiplied[3]);
    assert!(restored[0] >= 250);
    assert!(restored[1] <= 5 && restored[2] <= 5);
}

#[test]
fn test_partial_levels_still_write_every_manifest() {
    let fixture = DesignFixture::new();
    let config = load(&fixture, "");
    let slices = config.slice_set().unwrap();
    let mut engine = VectorEngine::new();
    let stats =
        export_project(&mut engine, &config, slices, ExportOptions::opaque(2..=2)).unwrap();

    assert_eq!(stats.manifests, 2);
    assert_eq!(stats.tiles, 2);

    let out = fixture.output_dir();
    assert!(out.join("feol.dzi").is_file());
    assert!(out.join("metal.dzi").is_file());
    assert!(out.join("feol_files/2/0_0.png").is_file());
    assert!(!out.join("feol_files/3").exists());
    assert!(!out.join("feol_files/0").exists());
}

#[test]
fn test_missing_layout_fails_before_writing() {
    let fixture = DesignFixture::new();
    let mut config = load(&fixture, "");
    config.layouts = vec![fixture.dir.path().join("missing.json")];
    let slices = config.slice_set().unwrap();
    let mut engine = VectorEngine::new();

    let result = export_project(&mut engine, &config, slices, ExportOptions::opaque(0..=3));
    assert!(result.is_err());
    assert!(!fixture.output_dir().join("feol.dzi").exists());
}
