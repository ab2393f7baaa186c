//! A pure Rust library for translating MCNP input decks into OpenMC models.
//! It reads the cell, surface and data cards of a deck, rebuilds every cell
//! region as a constructive-solid-geometry tree over analytic surfaces, and
//! writes the result as the `geometry.xml`, `materials.xml` and
//! `settings.xml` inputs of the target code.
//!
//! # Features
//!
//! - **Deck reading** — Message block, title card, comment cards, inline
//!   comments, continuation lines, `LIKE n BUT` cells and the numeric
//!   shortcuts (`nR`, `nI`, `xM`) of the card format
//! - **Geometry** — Planes, spheres, cylinders, cones (including one-sheet
//!   cones), general quadrics, tori and point-defined axisymmetric surfaces,
//!   with `TRn` transformations and reflective/white boundaries
//! - **Regions** — Intersections, unions and complements, including `#n`
//!   cell complements, normalised so that no complement node remains
//! - **Materials** — ZAID decomposition (natural and metastable nuclides),
//!   atom/weight fractions, thermal scattering tables and one material
//!   instance per distinct cell density
//! - **Universes** — `u=` and `fill=` with translations and rotations
//!
//! # Quick Start
//!
//! ```
//! use mcnp_adapter::{BoundaryType, ConvertConfig, Fill, convert, deck, xml};
//!
//! let text = "\
//! Bare sphere
//! 1 1 -10.0 -1 imp:n=1
//! 2 0 1 imp:n=0
//!
//! 1 so 8.5
//!
//! m1 92235.70c 1
//! ";
//!
//! let deck = deck::parse_str(text)?;
//! let model = convert(&deck, &ConvertConfig::default())?;
//!
//! // The zero-importance outside cell becomes a vacuum boundary.
//! assert_eq!(model.cells.len(), 1);
//! assert_eq!(model.surfaces[&1].boundary, BoundaryType::Vacuum);
//! assert_eq!(model.cells[&1].fill, Fill::Material(1));
//! assert_eq!(model.materials[&1].name, "M1 with density -10.0");
//!
//! let mut geometry = Vec::new();
//! xml::write_geometry(&mut geometry, &model)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module Organization
//!
//! - [`deck`] — Tokenizing and parsing of input decks into typed records
//! - [`convert`] — Translation of a parsed [`Deck`](deck::Deck) into a [`TargetModel`]
//! - [`xml`] — Serialisation of a [`TargetModel`] as XML input files
//! - [`ConvertConfig`] — Conversion options and run settings
//!
//! # Data Types
//!
//! - [`TargetModel`] — Surfaces, materials, cells and universes keyed by id
//! - [`Surface`] / [`SurfaceKind`] — Analytic surfaces and their coefficients
//! - [`Region`] — CSG region over signed half-spaces
//! - [`Cell`] / [`Fill`] / [`Universe`] — Cells and what fills them
//! - [`Material`] / [`Composition`] / [`Nuclide`] — Materials and nuclides

mod convert;
mod model;

pub mod deck;
pub mod xml;

pub use model::bounds::BoundingBox;
pub use model::cell::{Cell, Fill, Rotation, Universe};
pub use model::element::{Element, ParseElementError};
pub use model::material::{Component, Composition, Density, FractionBasis, Material, Nuclide};
pub use model::region::{Region, Sense};
pub use model::settings::Settings;
pub use model::surface::{Axis, BoundaryType, Surface, SurfaceKind};
pub use model::target::TargetModel;

pub use convert::{
    ConvertConfig, Placement, RunSettings, convert, decompose_zaid, default_settings,
    load_settings, thermal_name,
};

pub use convert::Error as ConvertError;
