use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::bounds::BoundingBox;
use super::surface::Surface;

/// Side of a surface a half-space lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sense {
    Negative,
    Positive,
}

impl Sense {
    pub fn flip(self) -> Self {
        match self {
            Sense::Negative => Sense::Positive,
            Sense::Positive => Sense::Negative,
        }
    }

    /// Sense of a point given the surface function value there.
    pub fn of(value: f64) -> Self {
        if value < 0.0 {
            Sense::Negative
        } else {
            Sense::Positive
        }
    }
}

/// A constructive-solid-geometry region.
///
/// Trees produced by the converter are normalised: complements are pushed
/// down to the half-spaces and nested nodes of the same kind are flattened,
/// so a finished region never contains [`Region::Complement`].
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    Halfspace { surface: u32, sense: Sense },
    Intersection(Vec<Region>),
    Union(Vec<Region>),
    Complement(Box<Region>),
}

impl Region {
    pub fn halfspace(surface: u32, sense: Sense) -> Self {
        Region::Halfspace { surface, sense }
    }

    /// Intersects two regions, merging nested intersections.
    pub fn intersection(self, other: Region) -> Self {
        let mut children = Vec::new();
        for r in [self, other] {
            match r {
                Region::Intersection(inner) => children.extend(inner),
                r => children.push(r),
            }
        }
        Region::Intersection(children)
    }

    /// Unites two regions, merging nested unions.
    pub fn union(self, other: Region) -> Self {
        let mut children = Vec::new();
        for r in [self, other] {
            match r {
                Region::Union(inner) => children.extend(inner),
                r => children.push(r),
            }
        }
        Region::Union(children)
    }

    /// Logical complement with De Morgan's laws applied all the way down.
    pub fn complement(self) -> Self {
        match self {
            Region::Halfspace { surface, sense } => Region::Halfspace {
                surface,
                sense: sense.flip(),
            },
            Region::Intersection(children) => {
                Region::Union(children.into_iter().map(Region::complement).collect())
            }
            Region::Union(children) => {
                Region::Intersection(children.into_iter().map(Region::complement).collect())
            }
            Region::Complement(inner) => inner.normalized(),
        }
        .flattened()
    }

    /// Removes every complement node and flattens the tree.
    pub fn normalized(self) -> Self {
        match self {
            Region::Halfspace { .. } => self,
            Region::Intersection(children) => {
                Region::Intersection(children.into_iter().map(Region::normalized).collect())
                    .flattened()
            }
            Region::Union(children) => {
                Region::Union(children.into_iter().map(Region::normalized).collect()).flattened()
            }
            Region::Complement(inner) => inner.complement(),
        }
    }

    fn flattened(self) -> Self {
        match self {
            Region::Intersection(children) => {
                let mut flat = Vec::with_capacity(children.len());
                for child in children {
                    match child.flattened() {
                        Region::Intersection(inner) => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                collapse(flat, Region::Intersection)
            }
            Region::Union(children) => {
                let mut flat = Vec::with_capacity(children.len());
                for child in children {
                    match child.flattened() {
                        Region::Union(inner) => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                collapse(flat, Region::Union)
            }
            other => other,
        }
    }

    pub fn is_normalized(&self) -> bool {
        match self {
            Region::Halfspace { .. } => true,
            Region::Intersection(children) => children
                .iter()
                .all(|c| !matches!(c, Region::Intersection(_)) && c.is_normalized()),
            Region::Union(children) => children
                .iter()
                .all(|c| !matches!(c, Region::Union(_)) && c.is_normalized()),
            Region::Complement(_) => false,
        }
    }

    /// Replaces every half-space by the region `f` returns for it.
    pub fn map_halfspaces<F>(self, f: &mut F) -> Self
    where
        F: FnMut(u32, Sense) -> Region,
    {
        match self {
            Region::Halfspace { surface, sense } => f(surface, sense),
            Region::Intersection(children) => {
                Region::Intersection(children.into_iter().map(|c| c.map_halfspaces(f)).collect())
                    .flattened()
            }
            Region::Union(children) => {
                Region::Union(children.into_iter().map(|c| c.map_halfspaces(f)).collect())
                    .flattened()
            }
            Region::Complement(inner) => Region::Complement(Box::new(inner.map_halfspaces(f))),
        }
    }

    /// Ids of every surface the region references.
    pub fn surfaces(&self) -> BTreeSet<u32> {
        let mut out = BTreeSet::new();
        self.collect_surfaces(&mut out);
        out
    }

    fn collect_surfaces(&self, out: &mut BTreeSet<u32>) {
        match self {
            Region::Halfspace { surface, .. } => {
                out.insert(*surface);
            }
            Region::Intersection(children) | Region::Union(children) => {
                for c in children {
                    c.collect_surfaces(out);
                }
            }
            Region::Complement(inner) => inner.collect_surfaces(out),
        }
    }

    /// Half-spaces of a region that is a single half-space or a union of
    /// half-spaces, `None` for any other shape.
    pub fn union_halfspaces(&self) -> Option<Vec<(u32, Sense)>> {
        match self {
            Region::Halfspace { surface, sense } => Some(vec![(*surface, *sense)]),
            Region::Union(children) => children
                .iter()
                .map(|c| match c {
                    Region::Halfspace { surface, sense } => Some((*surface, *sense)),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }

    /// Evaluates membership given the side of each surface a point lies on.
    pub fn contains_with<F>(&self, side: &F) -> bool
    where
        F: Fn(u32) -> Sense,
    {
        match self {
            Region::Halfspace { surface, sense } => side(*surface) == *sense,
            Region::Intersection(children) => children.iter().all(|c| c.contains_with(side)),
            Region::Union(children) => children.iter().any(|c| c.contains_with(side)),
            Region::Complement(inner) => !inner.contains_with(side),
        }
    }

    /// Whether `point` lies inside the region. Surfaces missing from
    /// `surfaces` count as never containing the point.
    pub fn contains(&self, point: [f64; 3], surfaces: &BTreeMap<u32, Surface>) -> bool {
        match self {
            Region::Halfspace { surface, sense } => surfaces
                .get(surface)
                .is_some_and(|s| Sense::of(s.kind.evaluate(point)) == *sense),
            Region::Intersection(children) => children.iter().all(|c| c.contains(point, surfaces)),
            Region::Union(children) => children.iter().any(|c| c.contains(point, surfaces)),
            Region::Complement(inner) => !inner.contains(point, surfaces),
        }
    }

    /// Conservative axis-aligned bounds of the region.
    pub fn bounding_box(&self, surfaces: &BTreeMap<u32, Surface>) -> BoundingBox {
        match self {
            Region::Halfspace { surface, sense } => surfaces
                .get(surface)
                .map(|s| s.kind.bounding_box(*sense))
                .unwrap_or_else(BoundingBox::infinite),
            Region::Intersection(children) => children
                .iter()
                .fold(BoundingBox::infinite(), |acc, c| {
                    acc.intersection(&c.bounding_box(surfaces))
                }),
            Region::Union(children) => children
                .iter()
                .fold(BoundingBox::empty(), |acc, c| acc.union(&c.bounding_box(surfaces))),
            Region::Complement(_) => BoundingBox::infinite(),
        }
    }
}

fn collapse(mut children: Vec<Region>, wrap: fn(Vec<Region>) -> Region) -> Region {
    if children.len() == 1 {
        children.remove(0)
    } else {
        wrap(children)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn child(f: &mut fmt::Formatter<'_>, r: &Region) -> fmt::Result {
            match r {
                Region::Halfspace { .. } | Region::Complement(_) => write!(f, "{}", r),
                _ => write!(f, "({})", r),
            }
        }

        match self {
            Region::Halfspace { surface, sense } => match sense {
                Sense::Negative => write!(f, "-{}", surface),
                Sense::Positive => write!(f, "{}", surface),
            },
            Region::Intersection(children) | Region::Union(children) => {
                let sep = if matches!(self, Region::Intersection(_)) {
                    " "
                } else {
                    " | "
                };
                for (i, c) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    child(f, c)?;
                }
                Ok(())
            }
            Region::Complement(inner) => write!(f, "~({})", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hs(surface: u32, sense: Sense) -> Region {
        Region::halfspace(surface, sense)
    }

    #[test]
    fn complement_of_union_is_intersection_of_flipped() {
        let r = hs(1, Sense::Positive).union(hs(2, Sense::Negative));
        let c = r.complement();
        assert_eq!(
            c,
            Region::Intersection(vec![hs(1, Sense::Negative), hs(2, Sense::Positive)])
        );
    }

    #[test]
    fn normalized_removes_nested_complements() {
        let inner = hs(1, Sense::Negative).intersection(hs(2, Sense::Positive));
        let r = Region::Complement(Box::new(Region::Complement(Box::new(inner.clone()))));
        assert_eq!(r.normalized(), inner);
    }

    #[test]
    fn normalized_flattens_same_kind_children() {
        let r = Region::Union(vec![
            hs(1, Sense::Negative),
            Region::Complement(Box::new(Region::Intersection(vec![
                hs(2, Sense::Negative),
                hs(3, Sense::Negative),
            ]))),
        ]);
        let n = r.normalized();
        assert!(n.is_normalized());
        assert_eq!(
            n,
            Region::Union(vec![
                hs(1, Sense::Negative),
                hs(2, Sense::Positive),
                hs(3, Sense::Positive)
            ])
        );
    }

    #[test]
    fn complement_preserves_membership_for_every_assignment() {
        let r = hs(1, Sense::Negative)
            .intersection(hs(2, Sense::Positive).union(hs(3, Sense::Negative)));
        let c = r.clone().complement();
        for bits in 0..8u32 {
            let side = |s: u32| {
                if bits & (1 << (s - 1)) != 0 {
                    Sense::Positive
                } else {
                    Sense::Negative
                }
            };
            assert_eq!(r.contains_with(&side), !c.contains_with(&side));
        }
    }

    #[test]
    fn union_halfspaces_rejects_nested_intersections() {
        let u = hs(1, Sense::Positive).union(hs(2, Sense::Negative));
        assert_eq!(
            u.union_halfspaces(),
            Some(vec![(1, Sense::Positive), (2, Sense::Negative)])
        );
        let nested = hs(1, Sense::Positive).union(hs(2, Sense::Negative).intersection(hs(
            3,
            Sense::Negative,
        )));
        assert!(nested.union_halfspaces().is_none());
    }

    #[test]
    fn display_uses_target_operators() {
        let r = hs(1, Sense::Negative)
            .intersection(hs(2, Sense::Positive).union(hs(3, Sense::Negative)));
        assert_eq!(r.to_string(), "-1 (2 | -3)");
    }

    #[test]
    fn map_halfspaces_expands_and_flattens() {
        let r = hs(1, Sense::Negative).intersection(hs(2, Sense::Positive));
        let mapped = r.map_halfspaces(&mut |s, sense| {
            if s == 2 {
                hs(2, sense).intersection(hs(9, Sense::Positive))
            } else {
                hs(s, sense)
            }
        });
        assert_eq!(
            mapped,
            Region::Intersection(vec![
                hs(1, Sense::Negative),
                hs(2, Sense::Positive),
                hs(9, Sense::Positive)
            ])
        );
    }
}
