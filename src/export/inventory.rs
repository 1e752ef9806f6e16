//! Inspection of an existing output tree against a plan.

use serde::Serialize;
use std::fs;

use crate::io::OutputTree;
use crate::pyramid::{parse_tile_coords, ExportPlan};

/// Tiles found on disk for one slice and level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassInventory {
    pub slice: String,
    pub level: u32,
    pub expected: u64,
    pub present: u64,
}

impl PassInventory {
    pub fn is_complete(&self) -> bool {
        self.present == self.expected
    }
}

/// What an output tree already contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub manifests_present: usize,
    pub manifests_expected: usize,
    pub passes: Vec<PassInventory>,
}

impl Inventory {
    pub fn is_complete(&self) -> bool {
        self.manifests_present == self.manifests_expected
            && self.passes.iter().all(PassInventory::is_complete)
    }
}

/// Count the manifests and in-grid tiles of `plan` present under `output`.
///
/// Files whose names are not `<x>_<y>.png` or fall outside the level's grid
/// are ignored, as are leftover temporary files.
pub fn inventory(output: &OutputTree, plan: &ExportPlan) -> Inventory {
    let manifests_present = plan
        .manifests
        .iter()
        .filter(|m| output.resolve(&m.path).is_file())
        .count();

    let passes = plan
        .passes
        .iter()
        .map(|pass| {
            let subdiv = pass.level.subdiv;
            let present = fs::read_dir(output.resolve(&pass.dir))
                .map(|entries| {
                    entries
                        .filter_map(Result::ok)
                        .filter_map(|e| e.file_name().into_string().ok())
                        .filter(|name| name.ends_with(".png"))
                        .filter_map(|name| parse_tile_coords(&name))
                        .filter(|&(x, y)| x < subdiv && y < subdiv)
                        .count() as u64
                })
                .unwrap_or(0);
            PassInventory {
                slice: pass.slice.name.clone(),
                level: pass.level.level,
                expected: pass.level.tile_count(),
                present,
            }
        })
        .collect();

    Inventory {
        manifests_present,
        manifests_expected: plan.manifests.len(),
        passes,
    }
}
