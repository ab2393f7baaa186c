use std::collections::{BTreeMap, HashMap};

use super::error::Error;
use crate::deck::{CellRecord, MaterialRecord, Section, ThermalRecord};
use crate::model::element::Element;
use crate::model::material::{Component, Composition, Density, FractionBasis, Material, Nuclide};

/// MCNP thermal scattering table names and their target library names.
const THERMAL_TABLES: &[(&str, &str)] = &[
    ("al27", "c_Al27"),
    ("be", "c_Be"),
    ("beo", "c_Be_in_BeO"),
    ("be/o", "c_Be_in_BeO"),
    ("benz", "c_Benzine"),
    ("dortho", "c_ortho_D"),
    ("fe56", "c_Fe56"),
    ("grph", "c_Graphite"),
    ("h/zr", "c_H_in_ZrH"),
    ("hortho", "c_ortho_H"),
    ("hpara", "c_para_H"),
    ("hwtr", "c_D_in_D2O"),
    ("lmeth", "c_H_in_CH4_liquid"),
    ("lwtr", "c_H_in_H2O"),
    ("o/be", "c_O_in_BeO"),
    ("o2/u", "c_O_in_UO2"),
    ("orthd", "c_ortho_D"),
    ("orthh", "c_ortho_H"),
    ("o/uo2", "c_O_in_UO2"),
    ("parad", "c_para_D"),
    ("parah", "c_para_H"),
    ("poly", "c_H_in_CH2"),
    ("sio2", "c_SiO2_alpha"),
    ("smeth", "c_H_in_CH4_solid"),
    ("u/o2", "c_U_in_UO2"),
    ("u/uo2", "c_U_in_UO2"),
    ("zr/h", "c_Zr_in_ZrH"),
];

/// Target library name of a thermal table, with any `.nnt` suffix ignored.
/// Names already in target form are accepted case-insensitively.
pub fn thermal_name(table: &str) -> Option<&'static str> {
    let name = table.split('.').next().unwrap_or(table).to_ascii_lowercase();
    THERMAL_TABLES
        .iter()
        .find(|(mcnp, target)| *mcnp == name || target.eq_ignore_ascii_case(&name))
        .map(|(_, target)| *target)
}

/// Splits a `ZZZAAA[.nnX]` or `SZZZAAA[.nnX]` identifier into a nuclide.
///
/// `AAA = 0` is the natural element. In the short form `AAA > 300` is an
/// excited state encoded as `A + 300 + 100 m`; the real mass number is
/// recovered by stepping down in hundreds until it is at most `3 Z`. In the
/// long form the leading `S` is the state itself. Americium 242 uses the
/// swapped convention: `95242` is the metastable state and `95642` (or
/// `1095242`) the ground state.
pub fn decompose_zaid(text: &str) -> Result<Nuclide, String> {
    let digits = text.split('.').next().unwrap_or(text);
    let zaid: u32 = digits
        .parse()
        .map_err(|_| format!("'{}' is not a ZZZAAA identifier", digits))?;

    let (z, mut a) = ((zaid / 1000) % 1000, zaid % 1000);
    let metastable = match zaid {
        95242 => 1,
        95642 | 1095242 => {
            a = 242;
            0
        }
        _ if zaid >= 1_000_000 => u8::try_from(zaid / 1_000_000)
            .map_err(|_| format!("state field of '{}' is out of range", digits))?,
        _ if a > 300 => {
            let field = a;
            while a > 3 * z && a > 100 {
                a -= 100;
            }
            let shift = field - a;
            if a > 3 * z || shift < 400 {
                return Err(format!(
                    "mass number field {} has no excited-state form",
                    field
                ));
            }
            ((shift - 300) / 100) as u8
        }
        _ => 0,
    };

    let element = Element::from_atomic_number(z)
        .ok_or_else(|| format!("atomic number {} is not an element", z))?;
    if a > 0 && a < z {
        return Err(format!(
            "mass number {} is below atomic number {}",
            a, z
        ));
    }

    Ok(Nuclide {
        element,
        mass_number: (a > 0).then_some(a as u16),
        metastable,
    })
}

/// Converts an `Mn` card, plus its optional `MTn` card, into a normalised
/// composition.
pub fn map_composition(
    record: &MaterialRecord,
    thermal: Option<&ThermalRecord>,
) -> Result<Composition, Error> {
    let card = format!("m{}", record.id);

    let positive = record.components.iter().any(|(_, f)| *f > 0.0);
    let negative = record.components.iter().any(|(_, f)| *f < 0.0);
    if positive && negative {
        return Err(Error::MixedFractions { card });
    }
    let basis = if negative {
        FractionBasis::Weight
    } else {
        FractionBasis::Atom
    };

    let total: f64 = record.components.iter().map(|(_, f)| f.abs()).sum();
    if total == 0.0 {
        return Err(Error::unsupported_feature(
            Section::Data,
            card,
            "every fraction is zero",
        ));
    }

    let mut components: Vec<Component> = Vec::with_capacity(record.components.len());
    for (zaid, fraction) in &record.components {
        let nuclide =
            decompose_zaid(zaid).map_err(|detail| Error::unknown_nuclide(&card, zaid, detail))?;
        let share = fraction.abs() / total;
        match components.iter_mut().find(|c| c.nuclide == nuclide) {
            Some(existing) => existing.fraction += share,
            None => components.push(Component {
                nuclide,
                fraction: share,
            }),
        }
    }

    let thermal = match thermal {
        Some(mt) => mt
            .tables
            .iter()
            .map(|table| {
                thermal_name(table)
                    .map(String::from)
                    .ok_or_else(|| Error::UnknownThermalTable {
                        card: format!("mt{}", mt.id),
                        table: table.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(Composition {
        basis,
        components,
        thermal,
    })
}

/// Target materials created from the (material, density) pairs of the
/// deck's cells.
#[derive(Debug, Clone, Default)]
pub struct MaterialInstances {
    pub materials: BTreeMap<u32, Material>,
    index: HashMap<(u32, u64), u32>,
}

impl MaterialInstances {
    /// Id of the instance for `material` at signed `density`.
    pub fn lookup(&self, material: u32, density: f64) -> Option<u32> {
        self.index.get(&(material, density.to_bits())).copied()
    }
}

/// Creates one material per distinct (material, density) pair in cell
/// order. The first instance of a material keeps its id; later densities
/// get fresh ids above every defined material id.
pub fn instantiate<'a>(
    cells: impl IntoIterator<Item = &'a CellRecord>,
    compositions: &BTreeMap<u32, Composition>,
) -> Result<MaterialInstances, Error> {
    let mut instances = MaterialInstances::default();
    let mut next_id = compositions.keys().max().map_or(Some(1), |max| max.checked_add(1));

    for cell in cells {
        if cell.material == 0 {
            continue;
        }
        let composition = compositions.get(&cell.material).ok_or_else(|| {
            Error::dangling(
                Section::Cells,
                cell.id,
                format!("material {} is not defined", cell.material),
            )
        })?;
        let Some(density) = cell.density else {
            continue;
        };
        let key = (cell.material, density.to_bits());
        if instances.index.contains_key(&key) {
            continue;
        }

        let id = if instances.materials.contains_key(&cell.material) {
            let id = next_id.ok_or_else(|| {
                Error::unsupported_feature(
                    Section::Cells,
                    cell.id,
                    "no material ids remain above the largest material id",
                )
            })?;
            next_id = id.checked_add(1);
            id
        } else {
            cell.material
        };
        instances.materials.insert(
            id,
            Material {
                id,
                name: format!("M{} with density {:?}", cell.material, density),
                density: Density::from_signed(density),
                composition: composition.clone(),
            },
        );
        instances.index.insert(key, id);
    }

    Ok(instances)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    fn material(id: u32, components: &[(&str, f64)]) -> MaterialRecord {
        MaterialRecord {
            id,
            components: components
                .iter()
                .map(|(z, f)| (z.to_string(), *f))
                .collect(),
            options: BTreeMap::new(),
            line: 1,
        }
    }

    fn cell(id: u32, material: u32, density: f64) -> CellRecord {
        CellRecord {
            id,
            material,
            density: Some(density),
            geometry: vec!["-1".into()],
            options: BTreeMap::new(),
            line: 1,
        }
    }

    #[test]
    fn zaids_follow_target_naming() {
        let name = |z: &str| decompose_zaid(z).unwrap().to_string();
        assert_eq!(name("1001.70c"), "H1");
        assert_eq!(name("92235"), "U235");
        assert_eq!(name("26000.50c"), "Fe");
        assert_eq!(name("52527"), "Te127_m1");
        assert_eq!(name("95242.70c"), "Am242_m1");
        assert_eq!(name("95642"), "Am242");
    }

    #[test]
    fn excited_states_above_the_first_decode_their_level() {
        let name = |z: &str| decompose_zaid(z).unwrap().to_string();
        assert_eq!(name("52627.70c"), "Te127_m2");
        assert_eq!(name("92635"), "U235_m1");
        assert_eq!(name("1052127"), "Te127_m1");
        assert_eq!(name("2052127.80c"), "Te127_m2");
        assert_eq!(name("1095242"), "Am242");
    }

    #[test]
    fn impossible_zaids_are_rejected() {
        assert!(decompose_zaid("999001").is_err());
        assert!(decompose_zaid("92001").is_err());
        assert!(decompose_zaid("1350").is_err());
        assert!(decompose_zaid("h-1").is_err());
    }

    #[test]
    fn atom_fractions_are_normalised() {
        let comp = map_composition(&material(1, &[("1001.70c", 2.0), ("8016.70c", 1.0)]), None)
            .unwrap();
        assert_eq!(comp.basis, FractionBasis::Atom);
        assert!(approx_eq(comp.components[0].fraction, 2.0 / 3.0));
        assert!(approx_eq(comp.components[1].fraction, 1.0 / 3.0));
        assert!(approx_eq(comp.total_fraction(), 1.0));
    }

    #[test]
    fn weight_fractions_keep_proportions() {
        let comp = map_composition(&material(2, &[("26056", -0.7), ("24052", -0.3)]), None)
            .unwrap();
        assert_eq!(comp.basis, FractionBasis::Weight);
        assert!(approx_eq(comp.components[0].fraction, 0.7));
        assert!(approx_eq(comp.components[1].fraction, 0.3));
    }

    #[test]
    fn duplicate_nuclides_accumulate() {
        let comp = map_composition(
            &material(3, &[("1001.70c", 1.0), ("8016", 1.0), ("1001.80c", 2.0)]),
            None,
        )
        .unwrap();
        assert_eq!(comp.components.len(), 2);
        assert!(approx_eq(comp.components[0].fraction, 0.75));
    }

    #[test]
    fn mixed_signs_fail() {
        let err = map_composition(&material(4, &[("1001", 1.0), ("8016", -1.0)]), None)
            .unwrap_err();
        assert!(matches!(err, Error::MixedFractions { ref card } if card == "m4"));
    }

    #[test]
    fn unknown_nuclide_names_the_card() {
        let err = map_composition(&material(5, &[("200001", 1.0)]), None).unwrap_err();
        assert!(matches!(err, Error::UnknownNuclide { ref card, .. } if card == "m5"));
    }

    #[test]
    fn thermal_tables_map_to_target_names() {
        assert_eq!(thermal_name("lwtr.10t"), Some("c_H_in_H2O"));
        assert_eq!(thermal_name("grph"), Some("c_Graphite"));
        assert_eq!(thermal_name("c_h_in_h2o"), Some("c_H_in_H2O"));
        assert_eq!(thermal_name("unobtanium"), None);

        let mt = ThermalRecord {
            id: 1,
            tables: vec!["bogus.20t".into()],
            line: 2,
        };
        let err = map_composition(&material(1, &[("1001", 1.0)]), Some(&mt)).unwrap_err();
        assert!(matches!(err, Error::UnknownThermalTable { .. }));
    }

    #[test]
    fn one_instance_per_material_density_pair() {
        let mut comps = BTreeMap::new();
        comps.insert(1, map_composition(&material(1, &[("1001", 1.0)]), None).unwrap());
        comps.insert(3, map_composition(&material(3, &[("8016", 1.0)]), None).unwrap());
        let cells = [
            cell(10, 1, -1.0),
            cell(11, 1, -1.0),
            cell(12, 1, 0.05),
            cell(13, 3, -2.0),
            cell(14, 0, 0.0),
        ];
        let inst = instantiate(&cells, &comps).unwrap();
        assert_eq!(inst.materials.len(), 3);
        assert_eq!(inst.lookup(1, -1.0), Some(1));
        assert_eq!(inst.lookup(1, 0.05), Some(4));
        assert_eq!(inst.lookup(3, -2.0), Some(3));

        let fresh = &inst.materials[&4];
        assert_eq!(fresh.name, "M1 with density 0.05");
        assert_eq!(fresh.density, Density::AtomPerBarnCm(0.05));
        assert_eq!(inst.materials[&1].density, Density::GramPerCm3(1.0));
    }

    #[test]
    fn exhausted_material_ids_are_an_error() {
        let mut comps = BTreeMap::new();
        comps.insert(
            u32::MAX,
            map_composition(&material(u32::MAX, &[("1001", 1.0)]), None).unwrap(),
        );
        let cells = [cell(1, u32::MAX, -1.0), cell(2, u32::MAX, -2.0)];
        let err = instantiate(&cells, &comps).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature { .. }));
        assert!(err.to_string().contains("no material ids remain"));
    }

    #[test]
    fn undefined_material_is_dangling() {
        let err = instantiate(&[cell(1, 9, -1.0)], &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, Error::DanglingReference { .. }));
    }
}
