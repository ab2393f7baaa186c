mod assemble;
mod config;
mod error;
mod expression;
mod material;
mod surface;
mod transform;

pub use config::{ConvertConfig, RunSettings, default_settings, load_settings};
pub use error::Error;
pub use material::{decompose_zaid, thermal_name};
pub use transform::Placement;

use crate::deck::Deck;
use crate::model::target::TargetModel;

/// Converts a parsed deck into a target model.
///
/// Surfaces are mapped first, then materials, then every cell region is
/// translated and the results are cross-referenced. Any error aborts the
/// conversion.
pub fn convert(deck: &Deck, config: &ConvertConfig) -> Result<TargetModel, Error> {
    assemble::assemble(deck, config)
}
