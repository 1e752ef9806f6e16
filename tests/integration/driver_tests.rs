//! Export driver tests against a recording render session.
//!
//! Tests verify:
//! - Design loading and export view setup
//! - Every render sees the visibility of its own slice
//! - Background and overlays are applied before every render
//! - Black/white render pairs in transparent mode
//! - The warm-up render only for engines that need it

use std::path::PathBuf;

use layout_tiler::export::{prepare_session, ExportOptions, PyramidExporter};
use layout_tiler::geometry::DBox;
use layout_tiler::io::OutputTree;
use layout_tiler::pyramid::{ExportPlan, PyramidShape};
use layout_tiler::render::{Overlays, BLACK, WHITE};
use layout_tiler::slice::{change_slice, malformed_layers, SliceSet};

use super::test_utils::{read_tile, small_slices, Call, RecordingSession, INK};

const LAYERS: &[&str] = &[
    "poly.drawing - 66/20",
    "met1.drawing - 68/20",
    "met1.label - 68/5",
    "garbage",
    "met5.drawing - 72/20",
];

fn full_box() -> DBox {
    DBox::new(-10.0, -20.0, 30.0, 20.0)
}

fn shape() -> PyramidShape {
    PyramidShape::new(0, 1)
}

fn expected_drawn(slice: &str) -> Vec<String> {
    match slice {
        "feol" => vec!["poly.drawing - 66/20".to_string()],
        "metal" => vec!["met1.drawing - 68/20".to_string()],
        _ => Vec::new(),
    }
}

fn run(
    session: &mut RecordingSession,
    slices: &SliceSet,
    options: ExportOptions,
) -> (ExportPlan, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let plan = ExportPlan::build_levels(full_box(), slices, shape(), options.levels.clone());
    let mut exporter =
        PyramidExporter::new(session, slices.clone(), OutputTree::new(dir.path()), options);
    exporter.execute(&plan).unwrap();
    (plan, dir)
}

// =============================================================================
// Session Setup
// =============================================================================

#[test]
fn test_prepare_session_loads_design_and_sets_export_view() {
    let mut session = RecordingSession::new(LAYERS, full_box());
    let layouts = vec![PathBuf::from("a.json"), PathBuf::from("b.json")];

    let extent = prepare_session(&mut session, "style.toml".as_ref(), &layouts).unwrap();

    assert_eq!(extent, full_box());
    assert_eq!(
        session.calls,
        vec![
            Call::LoadStyleSheet,
            Call::LoadLayout,
            Call::LoadLayout,
            Call::ExpandHierarchy,
            Call::Background(WHITE),
            Call::Overlays(Overlays::default()),
        ]
    );
}

#[test]
fn test_change_slice_hides_malformed_and_foreign_datatypes() {
    let mut session = RecordingSession::new(LAYERS, full_box());
    let slices = small_slices();
    let metal = slices.get("metal").unwrap().clone();

    let visible = change_slice(&mut session, &slices, &metal);

    assert_eq!(visible, 1);
    assert_eq!(
        session.calls,
        vec![
            Call::SetVisible(0, false),
            Call::SetVisible(1, true),
            Call::SetVisible(2, false),
            Call::SetVisible(3, false),
            Call::SetVisible(4, false),
            Call::Refresh,
        ]
    );
}

#[test]
fn test_malformed_layers_reported() {
    let session = RecordingSession::new(LAYERS, full_box());
    assert_eq!(malformed_layers(&session), vec!["garbage".to_string()]);

    let clean = RecordingSession::new(&LAYERS[..3], full_box());
    assert!(malformed_layers(&clean).is_empty());
}

// =============================================================================
// Rendering Order
// =============================================================================

#[test]
fn test_each_render_sees_its_slice() {
    let mut session = RecordingSession::new(LAYERS, full_box());
    let slices = small_slices();
    let (plan, _dir) = run(&mut session, &slices, ExportOptions::opaque(0..=1));

    let renders = session.renders();
    assert_eq!(renders.len() as u64, plan.tile_count());
    assert_eq!(plan.tile_count(), 15);

    let jobs = plan
        .passes
        .iter()
        .flat_map(|pass| pass.tiles().map(move |tile| (pass, tile)));
    for (render, (pass, tile)) in renders.iter().zip(jobs) {
        assert_eq!(render.drawn, expected_drawn(&pass.slice.name));
        assert_eq!(render.viewport, tile.viewport);
        assert_eq!(render.width, pass.level.tile_size);
        assert_eq!(render.height, pass.level.tile_size);
        assert_eq!(render.background, WHITE);
        assert_eq!(render.overlays, Overlays::default());
    }
}

#[test]
fn test_visibility_applied_once_per_pass() {
    let mut session = RecordingSession::new(LAYERS, full_box());
    let slices = small_slices();
    let (plan, _dir) = run(&mut session, &slices, ExportOptions::opaque(0..=1));

    let refreshes = session
        .calls
        .iter()
        .filter(|c| matches!(c, Call::Refresh))
        .count();
    // One initial pass with every slice's layers, then one per pass.
    assert_eq!(refreshes, plan.passes.len() + 1);

    let first_render = session
        .calls
        .iter()
        .position(|c| matches!(c, Call::Render(_)))
        .unwrap();
    let set_before = session.calls[..first_render]
        .iter()
        .filter(|c| matches!(c, Call::SetVisible(..)))
        .count();
    assert_eq!(set_before, 2 * LAYERS.len());
}

#[test]
fn test_transparent_mode_renders_black_then_white() {
    let mut session = RecordingSession::new(LAYERS, full_box());
    let slices = small_slices();
    let (plan, _dir) = run(&mut session, &slices, ExportOptions::transparent(1..=1));

    let renders = session.renders();
    assert_eq!(renders.len() as u64, 2 * plan.tile_count());
    for pair in renders.chunks(2) {
        assert_eq!(pair[0].background, BLACK);
        assert_eq!(pair[1].background, WHITE);
        assert_eq!(pair[0].viewport, pair[1].viewport);
        assert_eq!(pair[0].drawn, pair[1].drawn);
    }
}

#[test]
fn test_transparent_tiles_alpha_from_render_pair() {
    let mut session = RecordingSession::new(LAYERS, full_box());
    let slices = small_slices();
    let (_plan, dir) = run(&mut session, &slices, ExportOptions::transparent(0..=1));

    let inked = read_tile(&dir.path().join("feol_files/1/1_0.png"));
    assert_eq!(inked.dimensions(), (1, 1));
    assert_eq!(inked.get_pixel(0, 0).0, [INK[0], INK[1], INK[2], 255]);

    for path in ["empty_files/0/0_0.png", "empty_files/1/0_1.png"] {
        let empty = read_tile(&dir.path().join(path));
        assert!(empty.pixels().all(|p| p[3] == 0), "{path} not transparent");
    }
}

// =============================================================================
// Warm-up
// =============================================================================

#[test]
fn test_no_warm_up_render_by_default() {
    let mut session = RecordingSession::new(LAYERS, full_box());
    let slices = small_slices();
    let (plan, _dir) = run(&mut session, &slices, ExportOptions::opaque(1..=1));

    assert_eq!(session.renders().len() as u64, plan.tile_count());
}

#[test]
fn test_warm_up_render_uses_all_slices() {
    let mut session = RecordingSession::new(LAYERS, full_box()).with_warm_up();
    let slices = small_slices();
    let (plan, dir) = run(&mut session, &slices, ExportOptions::opaque(1..=1));

    let renders = session.renders();
    assert_eq!(renders.len() as u64, plan.tile_count() + 1);

    let warm_up = renders[0];
    assert_eq!((warm_up.width, warm_up.height), (1, 1));
    assert_eq!(warm_up.viewport, full_box());
    assert_eq!(
        warm_up.drawn,
        vec![
            "poly.drawing - 66/20".to_string(),
            "met1.drawing - 68/20".to_string(),
        ]
    );

    // The stale first render is discarded, so real tiles carry content.
    let tile = read_tile(&dir.path().join("feol_files/1/0_0.png"));
    assert_eq!(tile.get_pixel(0, 0).0, [INK[0], INK[1], INK[2], 255]);
}

#[test]
fn test_manifests_cover_every_slice() {
    let mut session = RecordingSession::new(LAYERS, full_box());
    let slices = small_slices();
    let dir = tempfile::tempdir().unwrap();
    let plan = ExportPlan::build_levels(full_box(), &slices, shape(), 0..=0);

    let stats = {
        let mut exporter = PyramidExporter::new(
            &mut session,
            slices.clone(),
            OutputTree::new(dir.path()),
            ExportOptions::opaque(0..=0),
        );
        exporter.execute(&plan).unwrap()
    };

    assert_eq!(stats.manifests, 3);
    assert_eq!(stats.tiles, 3);
    for slice in ["feol", "metal", "empty"] {
        let manifest = std::fs::read_to_string(dir.path().join(format!("{slice}.dzi"))).unwrap();
        assert!(manifest.contains("TileSize=\"1\""));
        assert!(manifest.contains("<Size Height=\"2\" Width=\"2\" />"));
    }
}
