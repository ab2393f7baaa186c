use std::collections::BTreeMap;

use super::error::Error;
use super::transform::{self, Placement};
use crate::deck::{Mnemonic, Section, SurfaceRecord, Transformation};
use crate::model::surface::{Axis, BoundaryType, SurfaceKind};

/// Plane cutting a two-sheet cone down to a single sheet.
///
/// `up` keeps the sheet on the positive side of `plane`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub plane: SurfaceKind,
    pub up: bool,
}

/// A surface card translated into the target frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedSurface {
    pub kind: SurfaceKind,
    pub boundary: BoundaryType,
    pub sheet: Option<Sheet>,
}

struct Native {
    kind: SurfaceKind,
    sheet: Option<Sheet>,
}

impl Native {
    fn plain(kind: SurfaceKind) -> Self {
        Self { kind, sheet: None }
    }
}

/// Maps one surface card, applying its transformation if it names one.
pub fn map_surface(
    record: &SurfaceRecord,
    transformations: &BTreeMap<u32, Transformation>,
    reduce_axis_planes: bool,
) -> Result<MappedSurface, Error> {
    let Native { mut kind, mut sheet } = native(record)?;

    if let Some(tr_id) = record.transform {
        let tr = transformations.get(&tr_id).ok_or_else(|| {
            Error::dangling(
                Section::Surfaces,
                record.id,
                format!("transformation {} is not defined", tr_id),
            )
        })?;
        let placement = Placement::from_transformation(tr);
        kind = transform::apply(&kind, &placement).ok_or_else(|| {
            Error::unsupported_surface(
                record.id,
                &record.mnemonic,
                format!(
                    "transformation {} tilts the torus axis off the coordinate axes",
                    tr_id
                ),
            )
        })?;
        if let Some(s) = sheet.as_mut() {
            // Planes always survive a transformation.
            if let Some(plane) = transform::apply(&s.plane, &placement) {
                s.plane = plane;
            }
        }
    }

    if reduce_axis_planes {
        kind = reduce_plane(kind);
        if let Some(s) = sheet.as_mut() {
            s.plane = reduce_plane(s.plane.clone());
        }
    }

    Ok(MappedSurface {
        kind,
        boundary: record.boundary,
        sheet,
    })
}

/// Replaces a general plane whose normal is exactly a coordinate axis with
/// the matching axis plane.
pub fn reduce_plane(kind: SurfaceKind) -> SurfaceKind {
    if let SurfaceKind::Plane { a, b, c, d } = kind {
        let axis = match (a, b, c) {
            (1.0, 0.0, 0.0) => Some(Axis::X),
            (0.0, 1.0, 0.0) => Some(Axis::Y),
            (0.0, 0.0, 1.0) => Some(Axis::Z),
            _ => None,
        };
        if let Some(axis) = axis {
            return SurfaceKind::AxisPlane { axis, offset: d };
        }
    }
    kind
}

fn native(record: &SurfaceRecord) -> Result<Native, Error> {
    let id = record.id;
    let kind = match (&record.mnemonic, record.coefficients.as_slice()) {
        (Mnemonic::P, &[a, b, c, d]) => SurfaceKind::Plane { a, b, c, d },
        (Mnemonic::P, &[x1, y1, z1, x2, y2, z2, x3, y3, z3]) => {
            plane_from_points([x1, y1, z1], [x2, y2, z2], [x3, y3, z3])
                .ok_or_else(|| Error::invalid_surface(id, "the three points are collinear"))?
        }
        (Mnemonic::Px, &[d]) => unit_plane(Axis::X, d),
        (Mnemonic::Py, &[d]) => unit_plane(Axis::Y, d),
        (Mnemonic::Pz, &[d]) => unit_plane(Axis::Z, d),
        (Mnemonic::So, &[r]) => SurfaceKind::Sphere {
            center: [0.0; 3],
            r,
        },
        (Mnemonic::S, &[x, y, z, r]) => SurfaceKind::Sphere {
            center: [x, y, z],
            r,
        },
        (Mnemonic::Sx, &[x, r]) => SurfaceKind::Sphere {
            center: [x, 0.0, 0.0],
            r,
        },
        (Mnemonic::Sy, &[y, r]) => SurfaceKind::Sphere {
            center: [0.0, y, 0.0],
            r,
        },
        (Mnemonic::Sz, &[z, r]) => SurfaceKind::Sphere {
            center: [0.0, 0.0, z],
            r,
        },
        (Mnemonic::CX, &[u, v, r]) => cylinder(Axis::X, [u, v], r),
        (Mnemonic::CY, &[u, v, r]) => cylinder(Axis::Y, [u, v], r),
        (Mnemonic::CZ, &[u, v, r]) => cylinder(Axis::Z, [u, v], r),
        (Mnemonic::Cx, &[r]) => cylinder(Axis::X, [0.0, 0.0], r),
        (Mnemonic::Cy, &[r]) => cylinder(Axis::Y, [0.0, 0.0], r),
        (Mnemonic::Cz, &[r]) => cylinder(Axis::Z, [0.0, 0.0], r),
        (m @ (Mnemonic::KX | Mnemonic::KY | Mnemonic::KZ), &[x, y, z, r2, ref rest @ ..]) => {
            return cone(id, cone_axis(m), [x, y, z], r2, rest.first().copied());
        }
        (m @ (Mnemonic::Kx | Mnemonic::Ky | Mnemonic::Kz), &[t, r2, ref rest @ ..]) => {
            let axis = cone_axis(m);
            let mut apex = [0.0; 3];
            apex[axis.index()] = t;
            return cone(id, axis, apex, r2, rest.first().copied());
        }
        (Mnemonic::Sq, &[a, b, c, d, e, f, g, x, y, z]) => SurfaceKind::Quadric {
            coeffs: [
                a,
                b,
                c,
                0.0,
                0.0,
                0.0,
                2.0 * (d - a * x),
                2.0 * (e - b * y),
                2.0 * (f - c * z),
                a * x * x + b * y * y + c * z * z - 2.0 * (d * x + e * y + f * z) + g,
            ],
        },
        (Mnemonic::Gq, &[a, b, c, d, e, f, g, h, j, k]) => SurfaceKind::Quadric {
            coeffs: [a, b, c, d, e, f, g, h, j, k],
        },
        (Mnemonic::Tx, &[x, y, z, a, b, c]) => torus(Axis::X, [x, y, z], a, b, c),
        (Mnemonic::Ty, &[x, y, z, a, b, c]) => torus(Axis::Y, [x, y, z], a, b, c),
        (Mnemonic::Tz, &[x, y, z, a, b, c]) => torus(Axis::Z, [x, y, z], a, b, c),
        (m @ (Mnemonic::X | Mnemonic::Y | Mnemonic::Z), coeffs) => {
            return point_defined(record, point_axis(m), coeffs);
        }
        (m @ (Mnemonic::Macrobody(_) | Mnemonic::Unrecognized(_)), _) => {
            return Err(Error::unsupported_surface(
                id,
                m,
                "no analytic counterpart in the target geometry",
            ));
        }
        (m, coeffs) => {
            return Err(Error::invalid_surface(
                id,
                format!("{} does not take {} coefficients", m, coeffs.len()),
            ));
        }
    };
    Ok(Native::plain(kind))
}

/// Plane through three points with the sense convention of the input
/// format: the origin lies on the negative side. A plane through the
/// origin puts the point at infinity along +z (then +y, then +x) on the
/// positive side.
fn plane_from_points(p1: [f64; 3], p2: [f64; 3], p3: [f64; 3]) -> Option<SurfaceKind> {
    let n = transform::cross(transform::sub(p2, p1), transform::sub(p3, p1));
    let d = transform::dot(n, p1);
    let [a, b, c] = n;

    let key = [d, c, b, a].into_iter().find(|v| *v != 0.0)?;
    let s = if key < 0.0 { -1.0 } else { 1.0 };
    Some(SurfaceKind::Plane {
        a: s * a,
        b: s * b,
        c: s * c,
        d: s * d,
    })
}

fn unit_plane(axis: Axis, d: f64) -> SurfaceKind {
    let mut n = [0.0; 3];
    n[axis.index()] = 1.0;
    SurfaceKind::Plane {
        a: n[0],
        b: n[1],
        c: n[2],
        d,
    }
}

fn cylinder(axis: Axis, center: [f64; 2], r: f64) -> SurfaceKind {
    SurfaceKind::Cylinder { axis, center, r }
}

fn torus(axis: Axis, center: [f64; 3], a: f64, b: f64, c: f64) -> SurfaceKind {
    SurfaceKind::Torus {
        axis,
        center,
        a,
        b,
        c,
    }
}

fn cone(id: u32, axis: Axis, apex: [f64; 3], r2: f64, selector: Option<f64>) -> Result<Native, Error> {
    let kind = SurfaceKind::Cone { axis, apex, r2 };
    let sheet = match selector {
        None => None,
        Some(v) if v == 1.0 || v == -1.0 => Some(sheet_plane(axis, apex[axis.index()], v > 0.0)),
        Some(v) => {
            return Err(Error::invalid_surface(
                id,
                format!("cone sheet selector must be +1 or -1, found {}", v),
            ));
        }
    };
    Ok(Native { kind, sheet })
}

fn sheet_plane(axis: Axis, offset: f64, up: bool) -> Sheet {
    Sheet {
        plane: SurfaceKind::AxisPlane { axis, offset },
        up,
    }
}

/// Axisymmetric surface through point pairs `(t, r)` on `axis`.
fn point_defined(record: &SurfaceRecord, axis: Axis, coeffs: &[f64]) -> Result<Native, Error> {
    let kind = match *coeffs {
        [t, _] => SurfaceKind::AxisPlane {
            axis,
            offset: t,
        },
        [t1, r1, t2, r2] => {
            if t1 == t2 {
                SurfaceKind::AxisPlane { axis, offset: t1 }
            } else if r1 == r2 {
                cylinder(axis, [0.0, 0.0], r1)
            } else {
                let grad = (t2 - t1) / (r2 - r1);
                let offset = t2 - grad * r2;
                let mut apex = [0.0; 3];
                apex[axis.index()] = offset;
                let slope = 1.0 / grad;
                return Ok(Native {
                    kind: SurfaceKind::Cone {
                        axis,
                        apex,
                        r2: slope * slope,
                    },
                    sheet: Some(sheet_plane(axis, offset, grad >= 0.0)),
                });
            }
        }
        _ => {
            return Err(Error::unsupported_surface(
                record.id,
                &record.mnemonic,
                format!("{} point pairs are not supported", coeffs.len() / 2),
            ));
        }
    };
    Ok(Native::plain(kind))
}

fn cone_axis(m: &Mnemonic) -> Axis {
    match m {
        Mnemonic::KX | Mnemonic::Kx => Axis::X,
        Mnemonic::KY | Mnemonic::Ky => Axis::Y,
        _ => Axis::Z,
    }
}

fn point_axis(m: &Mnemonic) -> Axis {
    match m {
        Mnemonic::X => Axis::X,
        Mnemonic::Y => Axis::Y,
        _ => Axis::Z,
    }
}
