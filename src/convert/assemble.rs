use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::config::ConvertConfig;
use super::error::Error;
use super::expression;
use super::material::{self, MaterialInstances};
use super::surface;
use super::transform::{self, Placement};
use crate::deck::{CellRecord, Deck, Section, numeric};
use crate::model::cell::{Cell, Fill, Rotation, Universe};
use crate::model::material::Composition;
use crate::model::region::{Region, Sense};
use crate::model::settings::Settings;
use crate::model::surface::{BoundaryType, Surface, SurfaceKind};
use crate::model::target::{TargetModel, root_bounding_box};

/// Importances closer to zero than this count as zero.
const ZERO_IMPORTANCE: f64 = 5e-6;

/// Auxiliary plane of a one-sheet cone and the side its sheet lies on.
#[derive(Debug, Clone, Copy)]
struct SheetRef {
    plane: u32,
    up: bool,
}

#[derive(Debug, Clone)]
struct PlacedCell {
    id: u32,
    universe: u32,
    region: Region,
    fill: Option<Fill>,
    volume: Option<f64>,
    outside: bool,
}

pub fn assemble(deck: &Deck, config: &ConvertConfig) -> Result<TargetModel, Error> {
    let mut table = map_surfaces(deck, config.reduce_axis_planes)?;
    let compositions = map_materials(deck)?;

    let mut placed = place_cells(deck, &mut table)?;
    let mut surfaces = table.surfaces;

    if config.merge_duplicate_surfaces {
        placed = merge_duplicate_surfaces(&surfaces, placed);
    }
    if config.vacuum_from_importance {
        placed = mark_vacuum(placed, &mut surfaces);
    }

    let declared: BTreeSet<u32> = placed
        .iter()
        .map(|c| c.universe)
        .filter(|&u| u != 0)
        .collect();
    for cell in &placed {
        if let Some(Fill::Universe { id, .. }) = &cell.fill
            && !declared.contains(id)
        {
            return Err(Error::dangling(
                Section::Cells,
                cell.id,
                format!("fill names universe {} but no cell declares u={}", id, id),
            ));
        }
    }

    let records: BTreeMap<u32, &CellRecord> = deck.cells.iter().map(|c| (c.id, c)).collect();
    for cell in &deck.cells {
        if cell.material != 0 && !compositions.contains_key(&cell.material) {
            return Err(Error::dangling(
                Section::Cells,
                cell.id,
                format!("material {} is not defined", cell.material),
            ));
        }
    }
    let instances = material::instantiate(
        placed
            .iter()
            .filter(|c| c.fill.is_none())
            .filter_map(|c| records.get(&c.id).copied()),
        &compositions,
    )?;

    let mut cells = BTreeMap::new();
    let mut universes: BTreeMap<u32, Universe> = BTreeMap::new();
    universes.insert(0, Universe::default());
    for cell in placed {
        let record = records[&cell.id];
        let fill = match cell.fill {
            Some(fill) => fill,
            None => material_fill(record, &instances)?,
        };
        universes
            .entry(cell.universe)
            .or_insert_with(|| Universe {
                id: cell.universe,
                cells: Vec::new(),
            })
            .cells
            .push(cell.id);
        cells.insert(
            cell.id,
            Cell {
                id: cell.id,
                universe: cell.universe,
                region: cell.region,
                fill,
                volume: cell.volume,
            },
        );
    }

    let referenced: BTreeSet<u32> = cells.values().flat_map(|c: &Cell| c.region.surfaces()).collect();
    surfaces.retain(|id, _| referenced.contains(id));

    let source = match config.settings.source {
        Some(point) => point,
        None => {
            let bb = root_bounding_box(cells.values(), &surfaces);
            if bb.is_finite() && !bb.is_empty() {
                bb.center()
            } else {
                [0.0; 3]
            }
        }
    };

    Ok(TargetModel {
        title: deck.title.clone(),
        surfaces,
        materials: instances.materials,
        cells,
        universes,
        settings: Settings {
            batches: config.settings.batches,
            inactive: config.settings.inactive,
            particles: config.settings.particles,
            summary: config.settings.summary,
            source,
        },
    })
}

/// Surfaces of the model under construction together with the auxiliary
/// planes of one-sheet cones.
struct SurfaceTable {
    surfaces: BTreeMap<u32, Surface>,
    sheets: BTreeMap<u32, SheetRef>,
    /// Next fresh id; `None` once `u32::MAX` has been handed out.
    next_id: Option<u32>,
    reduce_axis_planes: bool,
    relocated: HashMap<(u32, [u64; 12]), u32>,
}

impl SurfaceTable {
    fn new(deck: &Deck, reduce_axis_planes: bool) -> Self {
        let next_id = match deck.surfaces.iter().map(|s| s.id).max() {
            Some(max) => max.checked_add(1),
            None => Some(1),
        };
        Self {
            surfaces: BTreeMap::new(),
            sheets: BTreeMap::new(),
            next_id,
            reduce_axis_planes,
            relocated: HashMap::new(),
        }
    }

    /// A surface id above every surface id of the deck.
    fn fresh_id(&mut self, section: Section, card: impl ToString) -> Result<u32, Error> {
        let id = self.next_id.ok_or_else(|| {
            Error::unsupported_feature(
                section,
                card,
                "no surface ids remain above the largest surface id",
            )
        })?;
        self.next_id = id.checked_add(1);
        Ok(id)
    }

    /// Id of a copy of `surface` moved by `placement`, creating it on first
    /// use. A one-sheet cone takes a moved copy of its sheet plane along.
    fn relocate(&mut self, surface: u32, placement: &Placement, cell: u32) -> Result<u32, Error> {
        let key = (surface, placement_key(placement));
        if let Some(&id) = self.relocated.get(&key) {
            return Ok(id);
        }

        let original = self.surfaces.get(&surface).ok_or_else(|| {
            Error::dangling(
                Section::Cells,
                cell,
                format!("surface {} is not defined", surface),
            )
        })?;
        let boundary = original.boundary;
        let mut kind = transform::apply(&original.kind, placement).ok_or_else(|| {
            Error::unsupported_feature(
                Section::Cells,
                cell,
                format!("surface {} has no target form after 'trcl'", surface),
            )
        })?;
        if self.reduce_axis_planes {
            kind = surface::reduce_plane(kind);
        }

        let id = self.fresh_id(Section::Cells, cell)?;
        self.surfaces
            .insert(id, Surface::new(id, kind).with_boundary(boundary));
        self.relocated.insert(key, id);

        if let Some(sheet) = self.sheets.get(&surface).copied() {
            let plane = self.relocate(sheet.plane, placement, cell)?;
            self.sheets.insert(id, SheetRef { plane, up: sheet.up });
        }
        Ok(id)
    }

    /// `region` with every surface replaced by its copy under `placement`.
    fn relocate_region(
        &mut self,
        region: Region,
        placement: &Placement,
        cell: u32,
    ) -> Result<Region, Error> {
        let mut moved = BTreeMap::new();
        for surface in region.surfaces() {
            moved.insert(surface, self.relocate(surface, placement, cell)?);
        }
        Ok(region.map_halfspaces(&mut |surface, sense| {
            Region::halfspace(moved.get(&surface).copied().unwrap_or(surface), sense)
        }))
    }
}

fn placement_key(placement: &Placement) -> [u64; 12] {
    let mut key = [0; 12];
    for (slot, value) in key
        .iter_mut()
        .zip(placement.origin.iter().chain(placement.basis.iter().flatten()))
    {
        *slot = value.to_bits();
    }
    key
}

/// Maps every surface card. One-sheet cones get an auxiliary plane with a
/// fresh id above all deck surface ids.
fn map_surfaces(deck: &Deck, reduce_axis_planes: bool) -> Result<SurfaceTable, Error> {
    let mut table = SurfaceTable::new(deck, reduce_axis_planes);

    for record in &deck.surfaces {
        let mapped = surface::map_surface(record, &deck.transformations, reduce_axis_planes)?;
        if let Some(sheet) = mapped.sheet {
            let plane = table.fresh_id(Section::Surfaces, record.id)?;
            table.surfaces.insert(plane, Surface::new(plane, sheet.plane));
            table.sheets.insert(
                record.id,
                SheetRef {
                    plane,
                    up: sheet.up,
                },
            );
        }
        table.surfaces.insert(
            record.id,
            Surface::new(record.id, mapped.kind).with_boundary(mapped.boundary),
        );
    }

    Ok(table)
}

fn map_materials(deck: &Deck) -> Result<BTreeMap<u32, Composition>, Error> {
    if let Some(orphan) = deck
        .thermals
        .keys()
        .find(|id| !deck.materials.contains_key(id))
    {
        return Err(Error::dangling(
            Section::Data,
            format!("mt{}", orphan),
            format!("material {} is not defined", orphan),
        ));
    }

    deck.materials
        .values()
        .map(|record| {
            let composition = material::map_composition(record, deck.thermals.get(&record.id))?;
            Ok((record.id, composition))
        })
        .collect()
}

fn place_cells(deck: &Deck, table: &mut SurfaceTable) -> Result<Vec<PlacedCell>, Error> {
    let surface_ids: BTreeSet<u32> = deck.surfaces.iter().map(|s| s.id).collect();
    let mut previous: BTreeMap<u32, Region> = BTreeMap::new();
    let mut placed = Vec::with_capacity(deck.cells.len());

    for record in &deck.cells {
        reject_unsupported(record)?;

        let shift = cell_transform(record, deck)?;

        let mut region = expression::translate(record, &previous, &surface_ids)?;
        if let Some((translation, rotation)) = shift {
            let placement = match rotation {
                Some(r) => Placement::new(translation, transform::transpose(&r)),
                None => Placement::translation(translation),
            };
            region = table.relocate_region(region, &placement, record.id)?;
        }
        previous.insert(record.id, region.clone());

        let sheets = &table.sheets;
        let region = region.map_halfspaces(&mut |surface, sense| match sheets.get(&surface) {
            Some(sheet) => expand_sheet(surface, sense, *sheet),
            None => Region::halfspace(surface, sense),
        });

        let universe = match record.universe() {
            Some(value) => numeric::parse_int(value)
                .and_then(|u| u32::try_from(u.unsigned_abs()).ok())
                .ok_or_else(|| {
                    Error::unsupported_feature(
                        Section::Cells,
                        record.id,
                        format!("universe '{}' is not an integer", value),
                    )
                })?,
            None => 0,
        };

        let volume = match record.options.get("vol") {
            Some(value) => Some(numeric::parse_float(value).ok_or_else(|| {
                Error::unsupported_feature(
                    Section::Cells,
                    record.id,
                    format!("volume '{}' is not a number", value),
                )
            })?),
            None => None,
        };

        let outside = record
            .neutron_importance()
            .and_then(numeric::parse_float)
            .is_some_and(|imp| imp.abs() < ZERO_IMPORTANCE);

        placed.push(PlacedCell {
            id: record.id,
            universe,
            region,
            fill: universe_fill(record, deck, shift)?,
            volume,
            outside,
        });
    }

    Ok(placed)
}

/// `-k` keeps the inside of one sheet; `+k` is its complement.
fn expand_sheet(cone: u32, sense: Sense, sheet: SheetRef) -> Region {
    let along = if sheet.up {
        Sense::Positive
    } else {
        Sense::Negative
    };
    match sense {
        Sense::Negative => {
            Region::halfspace(cone, sense).intersection(Region::halfspace(sheet.plane, along))
        }
        Sense::Positive => {
            Region::halfspace(cone, sense).union(Region::halfspace(sheet.plane, along.flip()))
        }
    }
}

fn reject_unsupported(record: &CellRecord) -> Result<(), Error> {
    if record.options.contains_key("lat") {
        return Err(Error::unsupported_feature(
            Section::Cells,
            record.id,
            "'lat' cells are not translated",
        ));
    }
    for (plain, starred) in [("fill", "*fill"), ("trcl", "*trcl")] {
        if record.options.contains_key(plain) && record.options.contains_key(starred) {
            return Err(Error::unsupported_feature(
                Section::Cells,
                record.id,
                format!("both '{}' and '{}' are given", plain, starred),
            ));
        }
    }
    Ok(())
}

/// Translation and rotation of a cell or fill, with the rotation as the
/// matrix taking main-frame coordinates into the moved frame (row `i`
/// holding moved axis `i`).
type FrameShift = ([f64; 3], Option<Rotation>);

/// Reads `trcl=k`, `trcl=(o1 o2 o3 [b1 .. b9])` or the `*trcl` form with
/// angles in degrees.
fn cell_transform(record: &CellRecord, deck: &Deck) -> Result<Option<FrameShift>, Error> {
    let (value, degrees) = match (record.options.get("trcl"), record.options.get("*trcl")) {
        (Some(v), _) => (v, false),
        (None, Some(v)) => (v, true),
        (None, None) => return Ok(None),
    };
    let text = value.trim().trim_start_matches('(').trim_end_matches(')');
    frame_shift(record, deck, "cell transformation", text, degrees).map(Some)
}

/// Reads `fill=n`, `fill=n (k)` or `fill=n (o1 o2 o3 [b1 .. b9])`.
///
/// A cell moved by `trcl` moves its fill with it; the fill may then carry
/// no transformation of its own.
fn universe_fill(
    record: &CellRecord,
    deck: &Deck,
    cell_transform: Option<FrameShift>,
) -> Result<Option<Fill>, Error> {
    let (value, degrees) = match (record.options.get("fill"), record.options.get("*fill")) {
        (Some(v), _) => (v, false),
        (None, Some(v)) => (v, true),
        (None, None) => return Ok(None),
    };
    let unsupported = |detail: String| Error::unsupported_feature(Section::Cells, record.id, detail);

    let (head, transform) = match value.split_once('(') {
        Some((head, rest)) => (head.trim(), Some(rest.trim_end_matches(')').trim())),
        None => (value.trim(), None),
    };
    let id = numeric::parse_id(head)
        .ok_or_else(|| unsupported(format!("fill '{}' is not a single universe", value)))?;

    let shift = match (transform, cell_transform) {
        (Some(_), Some(_)) => {
            return Err(unsupported(
                "fill transformation on a cell moved by 'trcl'".to_string(),
            ));
        }
        (Some(text), None) => Some(frame_shift(record, deck, "fill transformation", text, degrees)?),
        (None, shift) => shift,
    };

    Ok(Some(match shift {
        Some((translation, rotation)) => Fill::Universe {
            id,
            translation: Some(translation),
            rotation,
        },
        None => Fill::Universe {
            id,
            translation: None,
            rotation: None,
        },
    }))
}

/// Parses a transformation number or an inline displacement with an
/// optional row-major rotation matrix, given as cosines or, with
/// `degrees`, as angles.
fn frame_shift(
    record: &CellRecord,
    deck: &Deck,
    what: &str,
    text: &str,
    degrees: bool,
) -> Result<FrameShift, Error> {
    let unsupported = |detail: String| Error::unsupported_feature(Section::Cells, record.id, detail);

    let numbers = text
        .split_whitespace()
        .map(numeric::parse_float)
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| unsupported(format!("{} '{}' is not numeric", what, text)))?;

    match numbers.as_slice() {
        &[k] => {
            let tr_id = numeric::parse_id(text.trim()).ok_or_else(|| {
                unsupported(format!("'{}' is not a transformation number", k))
            })?;
            let tr = deck.transformations.get(&tr_id).ok_or_else(|| {
                Error::dangling(
                    Section::Cells,
                    record.id,
                    format!("transformation {} is not defined", tr_id),
                )
            })?;
            Ok((tr.displacement, tr.rotation.map(|r| transform::transpose(&r))))
        }
        &[x, y, z] => Ok(([x, y, z], None)),
        [x, y, z, rest @ ..] if rest.len() == 9 => {
            let mut rotation: Rotation = [[0.0; 3]; 3];
            for (k, v) in rest.iter().enumerate() {
                rotation[k / 3][k % 3] = if degrees { v.to_radians().cos() } else { *v };
            }
            Ok(([*x, *y, *z], Some(rotation)))
        }
        other => Err(unsupported(format!(
            "{} with {} entries",
            what,
            other.len()
        ))),
    }
}

/// Rewrites every cell to name the lowest-numbered surface identical to
/// the one it names. A general plane with every coefficient negated counts
/// as the same plane with its sides swapped.
fn merge_duplicate_surfaces(
    surfaces: &BTreeMap<u32, Surface>,
    placed: Vec<PlacedCell>,
) -> Vec<PlacedCell> {
    let mut kept: Vec<&Surface> = Vec::new();
    let mut replacement: BTreeMap<u32, (u32, bool)> = BTreeMap::new();
    for surface in surfaces.values() {
        let same = kept.iter().find_map(|k| {
            if k.boundary != surface.boundary {
                None
            } else if k.kind == surface.kind {
                Some((k.id, false))
            } else if negated_plane(&k.kind, &surface.kind) {
                Some((k.id, true))
            } else {
                None
            }
        });
        match same {
            Some(target) => {
                replacement.insert(surface.id, target);
            }
            None => kept.push(surface),
        }
    }
    if replacement.is_empty() {
        return placed;
    }

    placed
        .into_iter()
        .map(|mut cell| {
            cell.region = cell
                .region
                .map_halfspaces(&mut |surface, sense| match replacement.get(&surface) {
                    Some(&(target, true)) => Region::halfspace(target, sense.flip()),
                    Some(&(target, false)) => Region::halfspace(target, sense),
                    None => Region::halfspace(surface, sense),
                });
            cell
        })
        .collect()
}

fn negated_plane(first: &SurfaceKind, second: &SurfaceKind) -> bool {
    match (first, second) {
        (
            SurfaceKind::Plane { a, b, c, d },
            SurfaceKind::Plane {
                a: a2,
                b: b2,
                c: c2,
                d: d2,
            },
        ) => *a == -a2 && *b == -b2 && *c == -c2 && *d == -d2,
        _ => false,
    }
}

/// Root cells with zero neutron importance bounded by a half-space or a
/// union of half-spaces turn those surfaces into vacuum boundaries and are
/// removed.
fn mark_vacuum(placed: Vec<PlacedCell>, surfaces: &mut BTreeMap<u32, Surface>) -> Vec<PlacedCell> {
    placed
        .into_iter()
        .filter(|cell| {
            if !cell.outside || cell.universe != 0 {
                return true;
            }
            let Some(halfspaces) = cell.region.union_halfspaces() else {
                return true;
            };
            for (id, _) in halfspaces {
                if let Some(s) = surfaces.get_mut(&id)
                    && s.boundary == BoundaryType::Transmission
                {
                    s.boundary = BoundaryType::Vacuum;
                }
            }
            false
        })
        .collect()
}

fn material_fill(record: &CellRecord, instances: &MaterialInstances) -> Result<Fill, Error> {
    if record.material == 0 {
        return Ok(Fill::Void);
    }
    record
        .density
        .and_then(|d| instances.lookup(record.material, d))
        .map(Fill::Material)
        .ok_or_else(|| {
            Error::dangling(
                Section::Cells,
                record.id,
                format!("material {} has no instance for this density", record.material),
            )
        })
}
