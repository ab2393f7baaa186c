//! Error types for deck conversion.
//!
//! Every variant names the deck section and card it originated from so a
//! failure can be traced back to the input. Any error aborts the whole
//! conversion; no partial model is produced.

use thiserror::Error;

use crate::deck::Section;

/// Errors that can occur while converting a parsed deck.
#[derive(Debug, Error)]
pub enum Error {
    /// A `#n` or surface reference in a cell names nothing defined before it.
    #[error("unresolved reference in {section} card '{card}': {detail}")]
    UnresolvedReference {
        section: Section,
        card: String,
        detail: String,
    },

    /// The surface mnemonic has no counterpart in the target geometry.
    #[error("unsupported surface type {mnemonic} on surface card '{card}': {detail}")]
    UnsupportedSurfaceType {
        card: String,
        mnemonic: String,
        detail: String,
    },

    /// A nuclide identifier does not decompose into a valid element and
    /// mass number.
    #[error("unknown nuclide '{nuclide}' in data card '{card}': {detail}")]
    UnknownNuclide {
        card: String,
        nuclide: String,
        detail: String,
    },

    /// A material mixes positive (atom) and negative (weight) fractions.
    #[error("data card '{card}' mixes atom and weight fractions")]
    MixedFractions { card: String },

    /// A material, transformation or universe id is used but never defined.
    #[error("dangling reference in {section} card '{card}': {detail}")]
    DanglingReference {
        section: Section,
        card: String,
        detail: String,
    },

    /// The geometry expression of a cell is not well formed.
    #[error("invalid geometry in cell card '{card}': {detail}")]
    InvalidExpression { card: String, detail: String },

    /// Coefficients describe a degenerate surface.
    #[error("invalid surface card '{card}': {detail}")]
    InvalidSurface { card: String, detail: String },

    /// A thermal scattering table has no known target name.
    #[error("unknown thermal scattering table '{table}' in data card '{card}'")]
    UnknownThermalTable { card: String, table: String },

    /// A deck feature the converter does not translate.
    #[error("unsupported feature in {section} card '{card}': {detail}")]
    UnsupportedFeature {
        section: Section,
        card: String,
        detail: String,
    },

    /// Run settings TOML could not be read.
    #[error("failed to parse run settings: {0}")]
    Settings(#[from] toml::de::Error),
}

impl Error {
    pub fn unresolved(section: Section, card: impl ToString, detail: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            section,
            card: card.to_string(),
            detail: detail.into(),
        }
    }

    pub fn dangling(section: Section, card: impl ToString, detail: impl Into<String>) -> Self {
        Self::DanglingReference {
            section,
            card: card.to_string(),
            detail: detail.into(),
        }
    }

    pub fn unsupported_surface(
        card: impl ToString,
        mnemonic: impl ToString,
        detail: impl Into<String>,
    ) -> Self {
        Self::UnsupportedSurfaceType {
            card: card.to_string(),
            mnemonic: mnemonic.to_string(),
            detail: detail.into(),
        }
    }

    pub fn unsupported_feature(
        section: Section,
        card: impl ToString,
        detail: impl Into<String>,
    ) -> Self {
        Self::UnsupportedFeature {
            section,
            card: card.to_string(),
            detail: detail.into(),
        }
    }

    pub fn invalid_expression(card: impl ToString, detail: impl Into<String>) -> Self {
        Self::InvalidExpression {
            card: card.to_string(),
            detail: detail.into(),
        }
    }

    pub fn invalid_surface(card: impl ToString, detail: impl Into<String>) -> Self {
        Self::InvalidSurface {
            card: card.to_string(),
            detail: detail.into(),
        }
    }

    pub fn unknown_nuclide(
        card: impl ToString,
        nuclide: impl ToString,
        detail: impl Into<String>,
    ) -> Self {
        Self::UnknownNuclide {
            card: card.to_string(),
            nuclide: nuclide.to_string(),
            detail: detail.into(),
        }
    }
}
