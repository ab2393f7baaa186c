use std::fmt;

use super::bounds::BoundingBox;
use super::region::Sense;

/// Boundary condition applied to particles crossing a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoundaryType {
    #[default]
    Transmission,
    Vacuum,
    Reflective,
    White,
}

impl BoundaryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryType::Transmission => "transmission",
            BoundaryType::Vacuum => "vacuum",
            BoundaryType::Reflective => "reflective",
            BoundaryType::White => "white",
        }
    }
}

impl fmt::Display for BoundaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coordinate axis a surface is aligned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    #[inline]
    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// The two remaining axes, in increasing order.
    pub fn others(&self) -> (usize, usize) {
        match self {
            Axis::X => (1, 2),
            Axis::Y => (0, 2),
            Axis::Z => (0, 1),
        }
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    fn prefix(&self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

/// Analytic surface kinds understood by the target geometry.
///
/// Coefficients follow the target convention: for every kind the negative
/// half-space is where [`SurfaceKind::evaluate`] is below zero.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceKind {
    /// `a x + b y + c z - d = 0`
    Plane { a: f64, b: f64, c: f64, d: f64 },
    /// Plane perpendicular to `axis` at `offset`.
    AxisPlane { axis: Axis, offset: f64 },
    Sphere { center: [f64; 3], r: f64 },
    /// Infinite cylinder parallel to `axis`. `center` holds the two
    /// off-axis coordinates in increasing axis order.
    Cylinder { axis: Axis, center: [f64; 2], r: f64 },
    /// Two-sheet cone with apex `apex` and squared slope `r2`.
    Cone { axis: Axis, apex: [f64; 3], r2: f64 },
    /// `A x² + B y² + C z² + D xy + E yz + F xz + G x + H y + J z + K = 0`
    Quadric { coeffs: [f64; 10] },
    /// Elliptical torus of major radius `a` with axial semi-axis `b` and
    /// radial semi-axis `c`.
    Torus {
        axis: Axis,
        center: [f64; 3],
        a: f64,
        b: f64,
        c: f64,
    },
}

impl SurfaceKind {
    /// Type name as used in `geometry.xml`.
    pub fn type_name(&self) -> String {
        match self {
            SurfaceKind::Plane { .. } => "plane".to_string(),
            SurfaceKind::AxisPlane { axis, .. } => format!("{}-plane", axis.prefix()),
            SurfaceKind::Sphere { .. } => "sphere".to_string(),
            SurfaceKind::Cylinder { axis, .. } => format!("{}-cylinder", axis.prefix()),
            SurfaceKind::Cone { axis, .. } => format!("{}-cone", axis.prefix()),
            SurfaceKind::Quadric { .. } => "quadric".to_string(),
            SurfaceKind::Torus { axis, .. } => format!("{}-torus", axis.prefix()),
        }
    }

    /// Coefficients in the order `geometry.xml` expects them.
    pub fn coefficients(&self) -> Vec<f64> {
        match self {
            SurfaceKind::Plane { a, b, c, d } => vec![*a, *b, *c, *d],
            SurfaceKind::AxisPlane { offset, .. } => vec![*offset],
            SurfaceKind::Sphere { center, r } => vec![center[0], center[1], center[2], *r],
            SurfaceKind::Cylinder { center, r, .. } => vec![center[0], center[1], *r],
            SurfaceKind::Cone { apex, r2, .. } => vec![apex[0], apex[1], apex[2], *r2],
            SurfaceKind::Quadric { coeffs } => coeffs.to_vec(),
            SurfaceKind::Torus {
                center, a, b, c, ..
            } => vec![center[0], center[1], center[2], *a, *b, *c],
        }
    }

    pub fn evaluate(&self, p: [f64; 3]) -> f64 {
        match self {
            SurfaceKind::Plane { a, b, c, d } => a * p[0] + b * p[1] + c * p[2] - d,
            SurfaceKind::AxisPlane { axis, offset } => p[axis.index()] - offset,
            SurfaceKind::Sphere { center, r } => {
                let dx = p[0] - center[0];
                let dy = p[1] - center[1];
                let dz = p[2] - center[2];
                dx * dx + dy * dy + dz * dz - r * r
            }
            SurfaceKind::Cylinder { axis, center, r } => {
                let (i, j) = axis.others();
                let du = p[i] - center[0];
                let dv = p[j] - center[1];
                du * du + dv * dv - r * r
            }
            SurfaceKind::Cone { axis, apex, r2 } => {
                let (i, j) = axis.others();
                let k = axis.index();
                let du = p[i] - apex[i];
                let dv = p[j] - apex[j];
                let dw = p[k] - apex[k];
                du * du + dv * dv - r2 * dw * dw
            }
            SurfaceKind::Quadric { coeffs: q } => {
                let [x, y, z] = p;
                q[0] * x * x
                    + q[1] * y * y
                    + q[2] * z * z
                    + q[3] * x * y
                    + q[4] * y * z
                    + q[5] * x * z
                    + q[6] * x
                    + q[7] * y
                    + q[8] * z
                    + q[9]
            }
            SurfaceKind::Torus {
                axis,
                center,
                a,
                b,
                c,
            } => {
                let (i, j) = axis.others();
                let k = axis.index();
                let w = p[k] - center[k];
                let u = p[i] - center[i];
                let v = p[j] - center[j];
                let rho = (u * u + v * v).sqrt() - a;
                w * w / (b * b) + rho * rho / (c * c) - 1.0
            }
        }
    }

    /// Expands the surface into general quadric coefficients
    /// `[A, B, C, D, E, F, G, H, J, K]`. Tori have no quadric form.
    pub fn as_quadric(&self) -> Option<[f64; 10]> {
        let mut q = [0.0; 10];
        match self {
            SurfaceKind::Plane { a, b, c, d } => {
                q[6] = *a;
                q[7] = *b;
                q[8] = *c;
                q[9] = -d;
            }
            SurfaceKind::AxisPlane { axis, offset } => {
                q[6 + axis.index()] = 1.0;
                q[9] = -offset;
            }
            SurfaceKind::Sphere { center, r } => {
                for k in 0..3 {
                    q[k] = 1.0;
                    q[6 + k] = -2.0 * center[k];
                }
                q[9] = center.iter().map(|c| c * c).sum::<f64>() - r * r;
            }
            SurfaceKind::Cylinder { axis, center, r } => {
                let (i, j) = axis.others();
                q[i] = 1.0;
                q[j] = 1.0;
                q[6 + i] = -2.0 * center[0];
                q[6 + j] = -2.0 * center[1];
                q[9] = center[0] * center[0] + center[1] * center[1] - r * r;
            }
            SurfaceKind::Cone { axis, apex, r2 } => {
                let (i, j) = axis.others();
                let k = axis.index();
                q[i] = 1.0;
                q[j] = 1.0;
                q[k] = -r2;
                q[6 + i] = -2.0 * apex[i];
                q[6 + j] = -2.0 * apex[j];
                q[6 + k] = 2.0 * r2 * apex[k];
                q[9] = apex[i] * apex[i] + apex[j] * apex[j] - r2 * apex[k] * apex[k];
            }
            SurfaceKind::Quadric { coeffs } => q = *coeffs,
            SurfaceKind::Torus { .. } => return None,
        }
        Some(q)
    }

    /// Axis-aligned box enclosing the given half-space. Unbounded
    /// directions are infinite.
    pub fn bounding_box(&self, sense: Sense) -> BoundingBox {
        let mut bb = BoundingBox::infinite();
        let inside = sense == Sense::Negative;
        match self {
            SurfaceKind::AxisPlane { axis, offset } => {
                let k = axis.index();
                if inside {
                    bb.upper[k] = *offset;
                } else {
                    bb.lower[k] = *offset;
                }
            }
            SurfaceKind::Sphere { center, r } if inside => {
                for k in 0..3 {
                    bb.lower[k] = center[k] - r;
                    bb.upper[k] = center[k] + r;
                }
            }
            SurfaceKind::Cylinder { axis, center, r } if inside => {
                let (i, j) = axis.others();
                bb.lower[i] = center[0] - r;
                bb.upper[i] = center[0] + r;
                bb.lower[j] = center[1] - r;
                bb.upper[j] = center[1] + r;
            }
            SurfaceKind::Torus {
                axis,
                center,
                a,
                b,
                c,
            } if inside => {
                let (i, j) = axis.others();
                let k = axis.index();
                bb.lower[k] = center[k] - b;
                bb.upper[k] = center[k] + b;
                for m in [i, j] {
                    bb.lower[m] = center[m] - a - c;
                    bb.upper[m] = center[m] + a + c;
                }
            }
            _ => {}
        }
        bb
    }
}

/// A surface of the assembled model.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub id: u32,
    pub kind: SurfaceKind,
    pub boundary: BoundaryType,
}

impl Surface {
    pub fn new(id: u32, kind: SurfaceKind) -> Self {
        Self {
            id,
            kind,
            boundary: BoundaryType::Transmission,
        }
    }

    pub fn with_boundary(mut self, boundary: BoundaryType) -> Self {
        self.boundary = boundary;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    fn samples() -> Vec<[f64; 3]> {
        vec![
            [0.0, 0.0, 0.0],
            [1.5, -2.0, 0.25],
            [-3.0, 4.0, 5.0],
            [10.0, 0.1, -7.5],
        ]
    }

    #[test]
    fn type_names_follow_axis() {
        let kind = SurfaceKind::Cylinder {
            axis: Axis::Y,
            center: [1.0, 2.0],
            r: 3.0,
        };
        assert_eq!(kind.type_name(), "y-cylinder");
        assert_eq!(kind.coefficients(), vec![1.0, 2.0, 3.0]);
        let plane = SurfaceKind::AxisPlane {
            axis: Axis::Z,
            offset: 4.0,
        };
        assert_eq!(plane.type_name(), "z-plane");
    }

    #[test]
    fn quadric_expansion_matches_native_evaluation() {
        let kinds = vec![
            SurfaceKind::Plane {
                a: 1.0,
                b: -2.0,
                c: 0.5,
                d: 3.0,
            },
            SurfaceKind::AxisPlane {
                axis: Axis::Y,
                offset: -1.0,
            },
            SurfaceKind::Sphere {
                center: [1.0, 2.0, 3.0],
                r: 4.0,
            },
            SurfaceKind::Cylinder {
                axis: Axis::X,
                center: [0.5, -0.5],
                r: 2.0,
            },
            SurfaceKind::Cone {
                axis: Axis::Z,
                apex: [1.0, -1.0, 2.0],
                r2: 0.25,
            },
        ];
        for kind in kinds {
            let q = SurfaceKind::Quadric {
                coeffs: kind.as_quadric().unwrap(),
            };
            for p in samples() {
                assert!(
                    approx_eq(kind.evaluate(p), q.evaluate(p), 1e-9),
                    "{} disagrees at {:?}",
                    kind.type_name(),
                    p
                );
            }
        }
    }

    #[test]
    fn torus_has_no_quadric_form() {
        let torus = SurfaceKind::Torus {
            axis: Axis::Z,
            center: [0.0; 3],
            a: 5.0,
            b: 1.0,
            c: 1.0,
        };
        assert!(torus.as_quadric().is_none());
        assert!(torus.evaluate([5.0, 0.0, 0.0]) < 0.0);
        assert!(torus.evaluate([0.0, 0.0, 0.0]) > 0.0);
    }

    #[test]
    fn sphere_inside_is_bounded() {
        let sphere = SurfaceKind::Sphere {
            center: [0.0, 0.0, 1.0],
            r: 2.0,
        };
        let bb = sphere.bounding_box(Sense::Negative);
        assert_eq!(bb.lower, [-2.0, -2.0, -1.0]);
        assert_eq!(bb.upper, [2.0, 2.0, 3.0]);
        assert!(!sphere.bounding_box(Sense::Positive).is_finite());
    }

    #[test]
    fn axis_plane_bounds_one_side() {
        let plane = SurfaceKind::AxisPlane {
            axis: Axis::X,
            offset: 2.0,
        };
        assert_eq!(plane.bounding_box(Sense::Negative).upper[0], 2.0);
        assert_eq!(plane.bounding_box(Sense::Positive).lower[0], 2.0);
    }
}
