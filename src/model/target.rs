use std::collections::BTreeMap;

use super::bounds::BoundingBox;
use super::cell::{Cell, Universe};
use super::material::Material;
use super::settings::Settings;
use super::surface::Surface;

/// A fully cross-referenced model ready for serialisation.
///
/// Every map is keyed by id, so iteration yields surfaces, materials, cells
/// and universes in ascending id order.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetModel {
    pub title: String,
    pub surfaces: BTreeMap<u32, Surface>,
    pub materials: BTreeMap<u32, Material>,
    pub cells: BTreeMap<u32, Cell>,
    pub universes: BTreeMap<u32, Universe>,
    pub settings: Settings,
}

impl TargetModel {
    /// Cells placed directly in the root universe.
    pub fn root_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values().filter(|c| c.universe == 0)
    }

    /// Bounds of the union of all root cells.
    pub fn bounding_box(&self) -> BoundingBox {
        root_bounding_box(self.cells.values(), &self.surfaces)
    }
}

pub(crate) fn root_bounding_box<'a>(
    cells: impl Iterator<Item = &'a Cell>,
    surfaces: &BTreeMap<u32, Surface>,
) -> BoundingBox {
    cells
        .filter(|c| c.universe == 0)
        .fold(BoundingBox::empty(), |acc, c| {
            acc.union(&c.region.bounding_box(surfaces))
        })
}
