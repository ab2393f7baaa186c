/// Axis-aligned bounding box. Infinite extents mark unbounded directions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lower: [f64; 3],
    pub upper: [f64; 3],
}

impl BoundingBox {
    pub fn new(lower: [f64; 3], upper: [f64; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn infinite() -> Self {
        Self::new([f64::NEG_INFINITY; 3], [f64::INFINITY; 3])
    }

    pub fn empty() -> Self {
        Self::new([f64::INFINITY; 3], [f64::NEG_INFINITY; 3])
    }

    pub fn intersection(&self, other: &Self) -> Self {
        let mut out = *self;
        for k in 0..3 {
            out.lower[k] = out.lower[k].max(other.lower[k]);
            out.upper[k] = out.upper[k].min(other.upper[k]);
        }
        out
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut out = *self;
        for k in 0..3 {
            out.lower[k] = out.lower[k].min(other.lower[k]);
            out.upper[k] = out.upper[k].max(other.upper[k]);
        }
        out
    }

    pub fn is_finite(&self) -> bool {
        self.lower.iter().chain(self.upper.iter()).all(|v| v.is_finite())
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|k| self.lower[k] > self.upper[k])
    }

    pub fn center(&self) -> [f64; 3] {
        [
            0.5 * (self.lower[0] + self.upper[0]),
            0.5 * (self.lower[1] + self.upper[1]),
            0.5 * (self.lower[2] + self.upper[2]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection_tightens_and_union_widens() {
        let a = BoundingBox::new([-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]);
        let b = BoundingBox::new([0.0, -2.0, 0.0], [3.0, 0.5, 0.5]);
        let i = a.intersection(&b);
        assert_eq!(i.lower, [0.0, -1.0, 0.0]);
        assert_eq!(i.upper, [1.0, 0.5, 0.5]);
        let u = a.union(&b);
        assert_eq!(u.lower, [-1.0, -2.0, -1.0]);
        assert_eq!(u.upper, [3.0, 1.0, 1.0]);
    }

    #[test]
    fn empty_is_identity_for_union() {
        let a = BoundingBox::new([0.0; 3], [2.0; 3]);
        assert_eq!(BoundingBox::empty().union(&a), a);
        assert!(BoundingBox::empty().is_empty());
        assert_eq!(a.center(), [1.0; 3]);
    }

    #[test]
    fn infinite_is_not_finite() {
        assert!(!BoundingBox::infinite().is_finite());
        assert!(BoundingBox::new([0.0; 3], [1.0; 3]).is_finite());
    }
}
