use std::fmt;

use super::element::Element;

/// A nuclide, or a whole element in natural abundance when `mass_number`
/// is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Nuclide {
    pub element: Element,
    pub mass_number: Option<u16>,
    pub metastable: u8,
}

impl Nuclide {
    pub fn is_natural(&self) -> bool {
        self.mass_number.is_none()
    }
}

/// Target naming: `H1`, `U235`, `Am242_m1`, or the bare symbol for natural
/// elements.
impl fmt::Display for Nuclide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.element)?;
        if let Some(a) = self.mass_number {
            write!(f, "{}", a)?;
        }
        if self.metastable > 0 {
            write!(f, "_m{}", self.metastable)?;
        }
        Ok(())
    }
}

/// How composition fractions are to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FractionBasis {
    /// Atom fractions.
    Atom,
    /// Weight fractions.
    Weight,
}

impl FractionBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            FractionBasis::Atom => "ao",
            FractionBasis::Weight => "wo",
        }
    }
}

/// Overall material density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Density {
    /// Atoms per barn-centimetre.
    AtomPerBarnCm(f64),
    /// Grams per cubic centimetre.
    GramPerCm3(f64),
}

impl Density {
    /// Reads a signed MCNP cell density: positive values are atom
    /// densities, negative values mass densities.
    pub fn from_signed(value: f64) -> Self {
        if value > 0.0 {
            Density::AtomPerBarnCm(value)
        } else {
            Density::GramPerCm3(value.abs())
        }
    }

    pub fn units(&self) -> &'static str {
        match self {
            Density::AtomPerBarnCm(_) => "atom/b-cm",
            Density::GramPerCm3(_) => "g/cm3",
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Density::AtomPerBarnCm(v) | Density::GramPerCm3(v) => *v,
        }
    }
}

/// One normalised entry of a material composition.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub nuclide: Nuclide,
    pub fraction: f64,
}

/// Normalised composition shared by every density instance of one MCNP
/// material.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub basis: FractionBasis,
    pub components: Vec<Component>,
    pub thermal: Vec<String>,
}

impl Composition {
    pub fn total_fraction(&self) -> f64 {
        self.components.iter().map(|c| c.fraction).sum()
    }
}

/// A material of the assembled model.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id: u32,
    pub name: String,
    pub density: Density,
    pub composition: Composition,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(z: u32) -> Element {
        Element::from_atomic_number(z).unwrap()
    }

    #[test]
    fn nuclide_names_follow_target_convention() {
        let h1 = Nuclide {
            element: element(1),
            mass_number: Some(1),
            metastable: 0,
        };
        assert_eq!(h1.to_string(), "H1");
        let am = Nuclide {
            element: element(95),
            mass_number: Some(242),
            metastable: 1,
        };
        assert_eq!(am.to_string(), "Am242_m1");
        let fe = Nuclide {
            element: element(26),
            mass_number: None,
            metastable: 0,
        };
        assert_eq!(fe.to_string(), "Fe");
        assert!(fe.is_natural());
    }

    #[test]
    fn density_sign_selects_units() {
        let atom = Density::from_signed(0.1);
        assert_eq!(atom.units(), "atom/b-cm");
        assert_eq!(atom.value(), 0.1);
        let mass = Density::from_signed(-7.8);
        assert_eq!(mass.units(), "g/cm3");
        assert_eq!(mass.value(), 7.8);
    }
}
