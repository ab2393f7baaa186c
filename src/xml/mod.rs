//! OpenMC XML input files.
//!
//! Each writer renders one file of the target model. Elements are emitted
//! in ascending id order, so the same model always produces the same bytes.

use std::fmt::Display;
use std::io::{self, Write};

mod geometry;
mod materials;
mod settings;

pub use geometry::write_geometry;
pub use materials::write_materials;
pub use settings::write_settings;

/// File name each writer's output is conventionally stored under.
pub const GEOMETRY_FILE: &str = "geometry.xml";
pub const MATERIALS_FILE: &str = "materials.xml";
pub const SETTINGS_FILE: &str = "settings.xml";

const DECLARATION: &str = "<?xml version='1.0' encoding='utf-8'?>";

fn write_declaration<W: Write>(writer: &mut W) -> io::Result<()> {
    writeln!(writer, "{}", DECLARATION)
}

/// Escapes text for use inside a double-quoted attribute.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn join<T: Display>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
