use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::model::surface::BoundaryType;

/// A cell card after `LIKE n BUT` resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct CellRecord {
    pub id: u32,
    /// Material id, 0 for a void cell.
    pub material: u32,
    /// Signed density: positive for atom density, negative for mass density.
    pub density: Option<f64>,
    /// Raw geometry tokens, parsed later by the expression translator.
    pub geometry: Vec<String>,
    /// Cell parameters keyed by lower-cased name (`imp:n`, `u`, `fill`, ...).
    pub options: BTreeMap<String, String>,
    pub line: usize,
}

impl CellRecord {
    /// Neutron importance, if any importance card names neutrons.
    pub fn neutron_importance(&self) -> Option<&str> {
        self.options.iter().find_map(|(key, value)| {
            let particles = key.strip_prefix("imp:")?;
            particles
                .split(',')
                .any(|p| p == "n")
                .then_some(value.as_str())
        })
    }

    /// Universe the cell belongs to, 0 when absent.
    pub fn universe(&self) -> Option<&str> {
        self.options.get("u").map(String::as_str)
    }
}

/// Surface mnemonics of the card format.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    P,
    Px,
    Py,
    Pz,
    So,
    S,
    Sx,
    Sy,
    Sz,
    CX,
    CY,
    CZ,
    Cx,
    Cy,
    Cz,
    KX,
    KY,
    KZ,
    Kx,
    Ky,
    Kz,
    Sq,
    Gq,
    Tx,
    Ty,
    Tz,
    X,
    Y,
    Z,
    /// A macrobody such as `rpp` or `rcc`.
    Macrobody(String),
    Unrecognized(String),
}

const MACROBODIES: [&str; 11] = [
    "box", "rpp", "sph", "rcc", "rhp", "hex", "rec", "trc", "ell", "wed", "arb",
];

impl Mnemonic {
    /// Accepted coefficient counts, `None` when any count is accepted.
    pub fn arities(&self) -> Option<&'static [usize]> {
        Some(match self {
            Mnemonic::P => &[4, 9],
            Mnemonic::Px | Mnemonic::Py | Mnemonic::Pz | Mnemonic::So => &[1],
            Mnemonic::S => &[4],
            Mnemonic::Sx | Mnemonic::Sy | Mnemonic::Sz => &[2],
            Mnemonic::CX | Mnemonic::CY | Mnemonic::CZ => &[3],
            Mnemonic::Cx | Mnemonic::Cy | Mnemonic::Cz => &[1],
            Mnemonic::KX | Mnemonic::KY | Mnemonic::KZ => &[4, 5],
            Mnemonic::Kx | Mnemonic::Ky | Mnemonic::Kz => &[2, 3],
            Mnemonic::Sq | Mnemonic::Gq => &[10],
            Mnemonic::Tx | Mnemonic::Ty | Mnemonic::Tz => &[6],
            Mnemonic::X | Mnemonic::Y | Mnemonic::Z => &[2, 4, 6],
            Mnemonic::Macrobody(name) => match name.as_str() {
                "box" => &[9, 12],
                "rpp" => &[6],
                "sph" => &[4],
                "rcc" => &[7],
                "rhp" | "hex" => &[9, 15],
                "rec" => &[10, 12],
                "trc" => &[8],
                "ell" => &[7],
                "wed" => &[12],
                "arb" => &[30],
                _ => return None,
            },
            Mnemonic::Unrecognized(_) => return None,
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Mnemonic::P => "p",
            Mnemonic::Px => "px",
            Mnemonic::Py => "py",
            Mnemonic::Pz => "pz",
            Mnemonic::So => "so",
            Mnemonic::S => "s",
            Mnemonic::Sx => "sx",
            Mnemonic::Sy => "sy",
            Mnemonic::Sz => "sz",
            Mnemonic::CX => "c/x",
            Mnemonic::CY => "c/y",
            Mnemonic::CZ => "c/z",
            Mnemonic::Cx => "cx",
            Mnemonic::Cy => "cy",
            Mnemonic::Cz => "cz",
            Mnemonic::KX => "k/x",
            Mnemonic::KY => "k/y",
            Mnemonic::KZ => "k/z",
            Mnemonic::Kx => "kx",
            Mnemonic::Ky => "ky",
            Mnemonic::Kz => "kz",
            Mnemonic::Sq => "sq",
            Mnemonic::Gq => "gq",
            Mnemonic::Tx => "tx",
            Mnemonic::Ty => "ty",
            Mnemonic::Tz => "tz",
            Mnemonic::X => "x",
            Mnemonic::Y => "y",
            Mnemonic::Z => "z",
            Mnemonic::Macrobody(name) | Mnemonic::Unrecognized(name) => name,
        }
    }
}

impl FromStr for Mnemonic {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Ok(match lower.as_str() {
            "p" => Mnemonic::P,
            "px" => Mnemonic::Px,
            "py" => Mnemonic::Py,
            "pz" => Mnemonic::Pz,
            "so" => Mnemonic::So,
            "s" => Mnemonic::S,
            "sx" => Mnemonic::Sx,
            "sy" => Mnemonic::Sy,
            "sz" => Mnemonic::Sz,
            "c/x" => Mnemonic::CX,
            "c/y" => Mnemonic::CY,
            "c/z" => Mnemonic::CZ,
            "cx" => Mnemonic::Cx,
            "cy" => Mnemonic::Cy,
            "cz" => Mnemonic::Cz,
            "k/x" => Mnemonic::KX,
            "k/y" => Mnemonic::KY,
            "k/z" => Mnemonic::KZ,
            "kx" => Mnemonic::Kx,
            "ky" => Mnemonic::Ky,
            "kz" => Mnemonic::Kz,
            "sq" => Mnemonic::Sq,
            "gq" => Mnemonic::Gq,
            "tx" => Mnemonic::Tx,
            "ty" => Mnemonic::Ty,
            "tz" => Mnemonic::Tz,
            "x" => Mnemonic::X,
            "y" => Mnemonic::Y,
            "z" => Mnemonic::Z,
            m if MACROBODIES.contains(&m) => Mnemonic::Macrobody(lower),
            _ => Mnemonic::Unrecognized(lower),
        })
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceRecord {
    pub id: u32,
    pub boundary: BoundaryType,
    pub transform: Option<u32>,
    pub mnemonic: Mnemonic,
    pub coefficients: Vec<f64>,
    pub line: usize,
}

/// An `Mn` card.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialRecord {
    pub id: u32,
    /// `(nuclide identifier, signed fraction)` in card order.
    pub components: Vec<(String, f64)>,
    /// Keyword entries such as `nlib` or `gas`.
    pub options: BTreeMap<String, String>,
    pub line: usize,
}

/// An `MTn` card listing thermal scattering tables.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalRecord {
    pub id: u32,
    pub tables: Vec<String>,
    pub line: usize,
}

/// A `TRn` / `*TRn` card.
///
/// A point `r'` given in the auxiliary frame sits at `r = displacement +
/// rotation · r'` in the main frame. Column `j` of `rotation` is auxiliary
/// axis `j` expressed in main-frame coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformation {
    pub id: u32,
    pub displacement: [f64; 3],
    pub rotation: Option<[[f64; 3]; 3]>,
}

/// A data card carried through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct DataCard {
    pub name: String,
    pub text: String,
    pub line: usize,
}
