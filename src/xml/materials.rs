use std::io::{self, Write};

use super::{escape, write_declaration};
use crate::model::material::Material;
use crate::model::target::TargetModel;

pub fn write_materials<W: Write>(mut writer: W, model: &TargetModel) -> io::Result<()> {
    write_declaration(&mut writer)?;
    writeln!(writer, "<materials>")?;
    for material in model.materials.values() {
        write_material(&mut writer, material)?;
    }
    writeln!(writer, "</materials>")?;
    writer.flush()
}

fn write_material<W: Write>(writer: &mut W, material: &Material) -> io::Result<()> {
    writeln!(
        writer,
        "  <material id=\"{}\" name=\"{}\">",
        material.id,
        escape(&material.name)
    )?;
    writeln!(
        writer,
        "    <density units=\"{}\" value=\"{}\" />",
        material.density.units(),
        material.density.value()
    )?;

    let basis = material.composition.basis.as_str();
    for component in &material.composition.components {
        let tag = if component.nuclide.is_natural() {
            "element"
        } else {
            "nuclide"
        };
        writeln!(
            writer,
            "    <{} {}=\"{}\" name=\"{}\" />",
            tag, basis, component.fraction, component.nuclide
        )?;
    }
    for table in &material.composition.thermal {
        writeln!(writer, "    <sab name=\"{}\" />", escape(table))?;
    }
    writeln!(writer, "  </material>")
}
