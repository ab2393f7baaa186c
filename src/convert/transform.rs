//! Coordinate transformations of surfaces.
//!
//! A [`Placement`] moves a point `r'` of an auxiliary frame to `r = O + B r'`
//! in the main frame, where the columns of `B` are the auxiliary axes. A
//! surface `f` defined in the auxiliary frame becomes `g(r) = f(Bᵀ (r - O))`.

use crate::deck::Transformation;
use crate::model::surface::{Axis, SurfaceKind};

pub type Matrix3 = [[f64; 3]; 3];

const IDENTITY: Matrix3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Entries closer than this to the identity (or to a coordinate axis) are
/// treated as exact.
const AXIS_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub origin: [f64; 3],
    pub basis: Matrix3,
}

impl Placement {
    pub fn new(origin: [f64; 3], basis: Matrix3) -> Self {
        Self { origin, basis }
    }

    pub fn translation(origin: [f64; 3]) -> Self {
        Self::new(origin, IDENTITY)
    }

    pub fn from_transformation(tr: &Transformation) -> Self {
        Self::new(tr.displacement, tr.rotation.unwrap_or(IDENTITY))
    }

    pub fn is_translation(&self) -> bool {
        (0..3).all(|i| (0..3).all(|j| (self.basis[i][j] - IDENTITY[i][j]).abs() < AXIS_TOLERANCE))
    }

    /// Main-frame point to auxiliary-frame point.
    pub fn to_local(&self, r: [f64; 3]) -> [f64; 3] {
        let d = sub(r, self.origin);
        mul_vec(&transpose(&self.basis), d)
    }

    /// Auxiliary-frame point to main-frame point.
    pub fn to_global(&self, r: [f64; 3]) -> [f64; 3] {
        add(self.origin, mul_vec(&self.basis, r))
    }

    /// Main-frame axis that auxiliary axis `axis` lands on, if any.
    fn aligned_axis(&self, axis: Axis) -> Option<Axis> {
        let column = [
            self.basis[0][axis.index()],
            self.basis[1][axis.index()],
            self.basis[2][axis.index()],
        ];
        let (idx, _) = column
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))?;
        let aligned = column
            .iter()
            .enumerate()
            .all(|(k, v)| k == idx || v.abs() < AXIS_TOLERANCE);
        if aligned { Axis::from_index(idx) } else { None }
    }
}

/// Moves `kind` from the auxiliary frame of `placement` to the main frame.
///
/// Planes and spheres keep their kind. Under a pure translation every kind
/// keeps its kind; a rotated cylinder, cone or quadric becomes a general
/// quadric. Returns `None` for a torus whose axis no longer lies on a
/// coordinate axis.
pub fn apply(kind: &SurfaceKind, placement: &Placement) -> Option<SurfaceKind> {
    let o = placement.origin;
    let translation = placement.is_translation();

    let mapped = match kind {
        SurfaceKind::Plane { a, b, c, d } => plane(placement, [*a, *b, *c], *d),
        SurfaceKind::AxisPlane { axis, offset } if translation => SurfaceKind::AxisPlane {
            axis: *axis,
            offset: offset + o[axis.index()],
        },
        SurfaceKind::AxisPlane { axis, offset } => {
            let mut normal = [0.0; 3];
            normal[axis.index()] = 1.0;
            plane(placement, normal, *offset)
        }
        SurfaceKind::Sphere { center, r } => SurfaceKind::Sphere {
            center: placement.to_global(*center),
            r: *r,
        },
        SurfaceKind::Cylinder { axis, center, r } if translation => {
            let (i, j) = axis.others();
            SurfaceKind::Cylinder {
                axis: *axis,
                center: [center[0] + o[i], center[1] + o[j]],
                r: *r,
            }
        }
        SurfaceKind::Cone { axis, apex, r2 } if translation => SurfaceKind::Cone {
            axis: *axis,
            apex: add(*apex, o),
            r2: *r2,
        },
        SurfaceKind::Torus {
            axis,
            center,
            a,
            b,
            c,
        } => SurfaceKind::Torus {
            axis: if translation {
                *axis
            } else {
                placement.aligned_axis(*axis)?
            },
            center: placement.to_global(*center),
            a: *a,
            b: *b,
            c: *c,
        },
        other => SurfaceKind::Quadric {
            coeffs: quadric(&other.as_quadric()?, placement),
        },
    };

    Some(mapped)
}

fn plane(placement: &Placement, normal: [f64; 3], d: f64) -> SurfaceKind {
    let n = mul_vec(&placement.basis, normal);
    SurfaceKind::Plane {
        a: n[0],
        b: n[1],
        c: n[2],
        d: d + dot(n, placement.origin),
    }
}

/// Transforms quadric coefficients through the homogeneous form
/// `M' = Tᵀ M T` with `T` mapping main-frame points to auxiliary ones.
fn quadric(q: &[f64; 10], placement: &Placement) -> [f64; 10] {
    let m = [
        [q[0], q[3] / 2.0, q[5] / 2.0, q[6] / 2.0],
        [q[3] / 2.0, q[1], q[4] / 2.0, q[7] / 2.0],
        [q[5] / 2.0, q[4] / 2.0, q[2], q[8] / 2.0],
        [q[6] / 2.0, q[7] / 2.0, q[8] / 2.0, q[9]],
    ];

    let bt = transpose(&placement.basis);
    let shift = mul_vec(&bt, placement.origin);
    let mut t = [[0.0; 4]; 4];
    for i in 0..3 {
        t[i][..3].copy_from_slice(&bt[i]);
        t[i][3] = -shift[i];
    }
    t[3][3] = 1.0;

    let mut mt = [[0.0; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            mt[i][j] = (0..4).map(|k| m[i][k] * t[k][j]).sum();
        }
    }
    let mut g = [[0.0; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            g[i][j] = (0..4).map(|k| t[k][i] * mt[k][j]).sum();
        }
    }

    [
        g[0][0],
        g[1][1],
        g[2][2],
        2.0 * g[0][1],
        2.0 * g[1][2],
        2.0 * g[0][2],
        2.0 * g[0][3],
        2.0 * g[1][3],
        2.0 * g[2][3],
        g[3][3],
    ]
}

pub fn transpose(m: &Matrix3) -> Matrix3 {
    let mut t = [[0.0; 3]; 3];
    for (i, row) in m.iter().enumerate() {
        for (j, v) in row.iter().enumerate() {
            t[j][i] = *v;
        }
    }
    t
}

pub fn mul_vec(m: &Matrix3, v: [f64; 3]) -> [f64; 3] {
    [dot(m[0], v), dot(m[1], v), dot(m[2], v)]
}

pub fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps * (1.0 + a.abs().max(b.abs()))
    }

    /// Rotation about z by `gamma` after rotation about x by `alpha`.
    fn rotation(alpha: f64, gamma: f64) -> Matrix3 {
        let (sa, ca) = alpha.to_radians().sin_cos();
        let (sg, cg) = gamma.to_radians().sin_cos();
        let rx = [[1.0, 0.0, 0.0], [0.0, ca, -sa], [0.0, sa, ca]];
        let rz = [[cg, -sg, 0.0], [sg, cg, 0.0], [0.0, 0.0, 1.0]];
        let mut m = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                m[i][j] = (0..3).map(|k| rz[i][k] * rx[k][j]).sum();
            }
        }
        m
    }

    fn kinds() -> Vec<SurfaceKind> {
        vec![
            SurfaceKind::Plane {
                a: 1.0,
                b: 2.0,
                c: -1.0,
                d: 0.5,
            },
            SurfaceKind::AxisPlane {
                axis: Axis::Z,
                offset: 3.0,
            },
            SurfaceKind::Sphere {
                center: [1.0, 0.0, -2.0],
                r: 2.5,
            },
            SurfaceKind::Cylinder {
                axis: Axis::Y,
                center: [1.0, -1.0],
                r: 0.75,
            },
            SurfaceKind::Cone {
                axis: Axis::X,
                apex: [0.5, 0.0, 1.0],
                r2: 0.3,
            },
            SurfaceKind::Quadric {
                coeffs: [1.0, 2.0, 0.5, 0.1, -0.2, 0.3, 1.0, -1.0, 0.5, -4.0],
            },
        ]
    }

    fn points() -> Vec<[f64; 3]> {
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 2.0, 3.0],
            [-4.0, 0.5, 2.0],
            [3.3, -1.7, -0.9],
        ]
    }

    #[test]
    fn mapped_surface_agrees_at_inverse_point() {
        let placements = [
            Placement::translation([1.0, -2.0, 0.5]),
            Placement::new([0.0, 0.0, 0.0], rotation(30.0, 0.0)),
            Placement::new([2.0, 1.0, -3.0], rotation(25.0, 60.0)),
        ];
        for placement in &placements {
            for kind in kinds() {
                let mapped = apply(&kind, placement).unwrap();
                for r in points() {
                    let expected = kind.evaluate(placement.to_local(r));
                    let actual = mapped.evaluate(r);
                    assert!(
                        approx_eq(expected, actual, 1e-9),
                        "{} under {:?}: {} vs {}",
                        kind.type_name(),
                        placement,
                        expected,
                        actual
                    );
                }
            }
        }
    }

    #[test]
    fn translation_keeps_native_kinds() {
        let placement = Placement::translation([1.0, 2.0, 3.0]);
        for kind in kinds() {
            let mapped = apply(&kind, &placement).unwrap();
            assert_eq!(mapped.type_name(), kind.type_name());
        }
        let cyl = apply(
            &SurfaceKind::Cylinder {
                axis: Axis::Z,
                center: [0.0, 0.0],
                r: 1.0,
            },
            &placement,
        )
        .unwrap();
        assert_eq!(cyl.coefficients(), vec![1.0, 2.0, 1.0]);
    }

    #[test]
    fn rotation_upgrades_cylinder_to_quadric() {
        let placement = Placement::new([0.0; 3], rotation(45.0, 0.0));
        let cyl = SurfaceKind::Cylinder {
            axis: Axis::Z,
            center: [0.0, 0.0],
            r: 1.0,
        };
        assert_eq!(apply(&cyl, &placement).unwrap().type_name(), "quadric");
        let sphere = SurfaceKind::Sphere {
            center: [0.0; 3],
            r: 1.0,
        };
        assert_eq!(apply(&sphere, &placement).unwrap().type_name(), "sphere");
    }

    #[test]
    fn torus_follows_axis_permutations_only() {
        let torus = SurfaceKind::Torus {
            axis: Axis::Z,
            center: [0.0; 3],
            a: 3.0,
            b: 1.0,
            c: 1.0,
        };
        // Auxiliary z lands on main-frame x.
        let swap = [[0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0]];
        let mapped = apply(&torus, &Placement::new([1.0, 0.0, 0.0], swap)).unwrap();
        assert_eq!(mapped.type_name(), "x-torus");
        assert_eq!(mapped.coefficients()[0], 1.0);

        let tilted = Placement::new([0.0; 3], rotation(30.0, 0.0));
        assert!(apply(&torus, &tilted).is_none());
    }

    #[test]
    fn placement_round_trips_points() {
        let placement = Placement::new([1.0, 2.0, 3.0], rotation(10.0, 70.0));
        let p = [0.3, -0.4, 5.0];
        let back = placement.to_global(placement.to_local(p));
        for k in 0..3 {
            assert!(approx_eq(back[k], p[k], 1e-12));
        }
    }

    #[test]
    fn cross_product_is_right_handed() {
        assert_eq!(cross([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]), [0.0, 0.0, 1.0]);
    }
}
