use std::io::{self, Write};

use super::{escape, join, write_declaration};
use crate::model::cell::{Cell, Fill};
use crate::model::surface::{BoundaryType, Surface};
use crate::model::target::TargetModel;

pub fn write_geometry<W: Write>(mut writer: W, model: &TargetModel) -> io::Result<()> {
    write_declaration(&mut writer)?;
    writeln!(writer, "<geometry>")?;
    for cell in model.cells.values() {
        write_cell(&mut writer, cell)?;
    }
    for surface in model.surfaces.values() {
        write_surface(&mut writer, surface)?;
    }
    writeln!(writer, "</geometry>")?;
    writer.flush()
}

fn write_cell<W: Write>(writer: &mut W, cell: &Cell) -> io::Result<()> {
    write!(writer, "  <cell id=\"{}\"", cell.id)?;
    match &cell.fill {
        Fill::Void => write!(writer, " material=\"void\"")?,
        Fill::Material(id) => write!(writer, " material=\"{}\"", id)?,
        Fill::Universe { id, .. } => write!(writer, " fill=\"{}\"", id)?,
    }
    write!(writer, " region=\"{}\"", escape(&cell.region.to_string()))?;
    if let Fill::Universe {
        translation,
        rotation,
        ..
    } = &cell.fill
    {
        if let Some(rotation) = rotation {
            write!(
                writer,
                " rotation=\"{}\"",
                join(rotation.iter().flatten())
            )?;
        }
        if let Some(translation) = translation {
            write!(writer, " translation=\"{}\"", join(translation))?;
        }
    }
    write!(writer, " universe=\"{}\"", cell.universe)?;
    if let Some(volume) = cell.volume {
        write!(writer, " volume=\"{}\"", volume)?;
    }
    writeln!(writer, " />")
}

fn write_surface<W: Write>(writer: &mut W, surface: &Surface) -> io::Result<()> {
    write!(writer, "  <surface id=\"{}\"", surface.id)?;
    if surface.boundary != BoundaryType::Transmission {
        write!(writer, " boundary=\"{}\"", surface.boundary)?;
    }
    writeln!(
        writer,
        " coeffs=\"{}\" type=\"{}\" />",
        join(surface.kind.coefficients()),
        surface.kind.type_name()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::cell::Universe;
    use crate::model::region::{Region, Sense};
    use crate::model::settings::Settings;
    use crate::model::surface::{Axis, SurfaceKind};
    use std::collections::BTreeMap;

    fn model() -> TargetModel {
        let mut surfaces = BTreeMap::new();
        surfaces.insert(
            2,
            Surface::new(
                2,
                SurfaceKind::AxisPlane {
                    axis: Axis::Z,
                    offset: 1.5,
                },
            ),
        );
        surfaces.insert(
            1,
            Surface::new(
                1,
                SurfaceKind::Sphere {
                    center: [0.0; 3],
                    r: 10.0,
                },
            )
            .with_boundary(BoundaryType::Vacuum),
        );
        let mut cells = BTreeMap::new();
        cells.insert(
            1,
            Cell {
                id: 1,
                universe: 0,
                region: Region::halfspace(1, Sense::Negative)
                    .intersection(Region::halfspace(2, Sense::Positive)),
                fill: Fill::Material(3),
                volume: Some(2.5),
            },
        );
        cells.insert(
            4,
            Cell {
                id: 4,
                universe: 0,
                region: Region::halfspace(2, Sense::Negative),
                fill: Fill::Universe {
                    id: 7,
                    translation: Some([0.0, 0.0, 5.0]),
                    rotation: None,
                },
                volume: None,
            },
        );
        let mut universes = BTreeMap::new();
        universes.insert(
            0,
            Universe {
                id: 0,
                cells: vec![1, 4],
            },
        );
        TargetModel {
            title: "test".into(),
            surfaces,
            materials: BTreeMap::new(),
            cells,
            universes,
            settings: Settings {
                batches: 1,
                inactive: 0,
                particles: 10,
                summary: true,
                source: [0.0; 3],
            },
        }
    }

    fn render(model: &TargetModel) -> String {
        let mut buf = Vec::new();
        write_geometry(&mut buf, model).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn writes_cells_then_surfaces_in_id_order() {
        let xml = render(&model());
        let lines: Vec<&str> = xml.lines().collect();
        assert_eq!(lines[0], "<?xml version='1.0' encoding='utf-8'?>");
        assert_eq!(lines[1], "<geometry>");
        assert_eq!(
            lines[2],
            "  <cell id=\"1\" material=\"3\" region=\"-1 2\" universe=\"0\" volume=\"2.5\" />"
        );
        assert_eq!(
            lines[3],
            "  <cell id=\"4\" fill=\"7\" region=\"-2\" translation=\"0 0 5\" universe=\"0\" />"
        );
        assert_eq!(
            lines[4],
            "  <surface id=\"1\" boundary=\"vacuum\" coeffs=\"0 0 0 10\" type=\"sphere\" />"
        );
        assert_eq!(
            lines[5],
            "  <surface id=\"2\" coeffs=\"1.5\" type=\"z-plane\" />"
        );
        assert_eq!(lines[6], "</geometry>");
    }

    #[test]
    fn union_regions_are_written_with_pipes() {
        let mut m = model();
        m.cells.get_mut(&1).unwrap().region =
            Region::halfspace(1, Sense::Positive).union(Region::halfspace(2, Sense::Negative));
        assert!(render(&m).contains("region=\"1 | -2\""));
    }
}
