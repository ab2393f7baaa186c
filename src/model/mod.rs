//! Data structures of the target model produced by the converter.
//!
//! - [`element`] – Periodic table lookup by atomic number.
//! - [`surface`] – Analytic surfaces and boundary conditions.
//! - [`region`] – CSG regions built from signed half-spaces.
//! - [`material`] – Nuclides, compositions and densities.
//! - [`cell`] – Cells, fills and universes.
//! - [`target`] – The assembled [`TargetModel`](target::TargetModel).

pub mod bounds;
pub mod cell;
pub mod element;
pub mod material;
pub mod region;
pub mod settings;
pub mod surface;
pub mod target;
