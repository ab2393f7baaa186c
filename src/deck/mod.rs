//! Reading MCNP input decks.
//!
//! A deck is read in two passes: [`tokenizer`] splits the text into logical
//! cards per block, and [`parser`] turns every card into a typed record.
//! The result is an immutable [`Deck`] consumed by the converter.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{BufRead, Read};

pub mod error;
pub mod numeric;
pub mod parser;
pub mod records;
pub mod tokenizer;

pub use error::Error;
pub use records::{
    CellRecord, DataCard, MaterialRecord, Mnemonic, SurfaceRecord, ThermalRecord, Transformation,
};

/// Block of the deck a card was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Cells,
    Surfaces,
    Data,
}

impl Section {
    /// The block that follows this one, `None` after the data block.
    pub fn next(self) -> Option<Self> {
        match self {
            Section::Cells => Some(Section::Surfaces),
            Section::Surfaces => Some(Section::Data),
            Section::Data => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Cells => write!(f, "cell"),
            Section::Surfaces => write!(f, "surface"),
            Section::Data => write!(f, "data"),
        }
    }
}

/// Every record of one input deck.
///
/// Cells and surfaces keep deck order, since cell complements may only
/// refer to cells defined earlier.
#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    pub message: Option<String>,
    pub title: String,
    pub cells: Vec<CellRecord>,
    pub surfaces: Vec<SurfaceRecord>,
    pub materials: BTreeMap<u32, MaterialRecord>,
    pub thermals: BTreeMap<u32, ThermalRecord>,
    pub transformations: BTreeMap<u32, Transformation>,
    pub passthrough: Vec<DataCard>,
}

/// Parses deck text.
pub fn parse_str(text: &str) -> Result<Deck, Error> {
    parser::parse(tokenizer::tokenize(text)?)
}

/// Reads and parses a whole deck from `reader`.
pub fn read<R: BufRead>(mut reader: R) -> Result<Deck, Error> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_from_buffered_reader() {
        let text = "title\n1 0 -1 imp:n=1\n2 0 1 imp:n=0\n\n1 so 10\n\n";
        let deck = read(Cursor::new(text)).unwrap();
        assert_eq!(deck.title, "title");
        assert_eq!(deck.cells.len(), 2);
        assert_eq!(deck.surfaces.len(), 1);
        assert!(deck.materials.is_empty());
    }

    #[test]
    fn section_order_ends_after_data() {
        assert_eq!(Section::Cells.next(), Some(Section::Surfaces));
        assert_eq!(Section::Data.next(), None);
        assert_eq!(Section::Surfaces.to_string(), "surface");
    }
}
