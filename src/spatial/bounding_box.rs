use nalgebra::Point3;

use super::Axis;

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub mins: Point3<f32>,
    pub maxs: Point3<f32>,
}

impl Aabb {
    #[inline]
    pub fn new(mins: Point3<f32>, maxs: Point3<f32>) -> Self {
        Self { mins, maxs }
    }

    /// A degenerate box containing only `p`.
    #[inline]
    pub fn from_point(p: Point3<f32>) -> Self {
        Self { mins: p, maxs: p }
    }

    /// The smallest box containing every point of `points`, or `None` if there are none.
    pub fn from_points(points: impl IntoIterator<Item = Point3<f32>>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = Self::from_point(points.next()?);
        Some(points.fold(first, |mut res, p| {
            res.extend(&p);
            res
        }))
    }

    /// Grow `self` to contain `p`.
    #[inline]
    pub fn extend(&mut self, p: &Point3<f32>) {
        self.mins = self.mins.inf(p);
        self.maxs = self.maxs.sup(p);
    }

    /// Grow `self` to contain `other`.
    #[inline]
    pub fn merge(&mut self, other: &Aabb) {
        self.extend(&other.mins);
        self.extend(&other.maxs);
    }

    #[inline]
    pub fn contains(&self, p: &Point3<f32>) -> bool {
        let Self { mins: i, maxs: a } = self;
        (p.x >= i.x && p.y >= i.y && p.z >= i.z) && (p.x <= a.x && p.y <= a.y && p.z <= a.z)
    }

    /// Determine the center of `self`.
    #[inline]
    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.mins, &self.maxs)
    }

    /// The midpoint of `self` along one axis: `min + (max - min) / 2`.
    #[inline]
    pub fn mid(&self, axis: Axis) -> f32 {
        let (min, max) = (self.mins[axis.index()], self.maxs[axis.index()]);
        min + (max - min) / 2.0
    }
}
