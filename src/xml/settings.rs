use std::io::{self, Write};

use super::{join, write_declaration};
use crate::model::target::TargetModel;

pub fn write_settings<W: Write>(mut writer: W, model: &TargetModel) -> io::Result<()> {
    let settings = &model.settings;
    write_declaration(&mut writer)?;
    writeln!(writer, "<settings>")?;
    writeln!(writer, "  <run_mode>eigenvalue</run_mode>")?;
    writeln!(writer, "  <particles>{}</particles>", settings.particles)?;
    writeln!(writer, "  <batches>{}</batches>", settings.batches)?;
    writeln!(writer, "  <inactive>{}</inactive>", settings.inactive)?;
    writeln!(
        writer,
        "  <source particle=\"neutron\" strength=\"1.0\" type=\"independent\">"
    )?;
    writeln!(writer, "    <space type=\"point\">")?;
    writeln!(
        writer,
        "      <parameters>{}</parameters>",
        join(settings.source)
    )?;
    writeln!(writer, "    </space>")?;
    writeln!(writer, "  </source>")?;
    writeln!(writer, "  <output>")?;
    writeln!(writer, "    <summary>{}</summary>", settings.summary)?;
    writeln!(writer, "  </output>")?;
    writeln!(writer, "</settings>")?;
    writer.flush()
}
