use std::ops::Add;

use glam::Vec3;

/// Axis aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AaBox {
    pub low: Vec3,
    pub high: Vec3,
}

impl AaBox {
    pub const fn new(low: Vec3, high: Vec3) -> Self {
        Self { low, high }
    }

    pub const fn zero() -> Self {
        Self::new(Vec3::ZERO, Vec3::ZERO)
    }

    pub const fn from_point(p: Vec3) -> Self {
        Self::new(p, p)
    }

    /// Smallest box holding every point, `None` for an empty iterator.
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::from_point(first), |mut b, p| {
            b.merge_point(p);
            b
        }))
    }

    pub fn merge_point(&mut self, p: Vec3) {
        self.low = self.low.min(p);
        self.high = self.high.max(p);
    }

    pub fn merge(&mut self, other: &Self) {
        self.low = self.low.min(other.low);
        self.high = self.high.max(other.high);
    }

    /// Inclusive on both corners.
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.low).all() && p.cmple(self.high).all()
    }

    pub fn extent(&self) -> Vec3 {
        self.high - self.low
    }

    /// Reorder the components of both corners from file order (x, y, z)
    /// to the engine's native order (z, x, y).
    pub fn to_engine_order(&self) -> Self {
        Self::new(to_engine_order(self.low), to_engine_order(self.high))
    }

    /// The six floats in write order: low corner then high corner.
    pub fn to_array(&self) -> [f32; 6] {
        [
            self.low.x,
            self.low.y,
            self.low.z,
            self.high.x,
            self.high.y,
            self.high.z,
        ]
    }
}

/// Six floats as stored on disk: low corner then high corner.
impl From<[f32; 6]> for AaBox {
    fn from(v: [f32; 6]) -> Self {
        Self::new(Vec3::new(v[0], v[1], v[2]), Vec3::new(v[3], v[4], v[5]))
    }
}

impl Add<Vec3> for AaBox {
    type Output = Self;

    fn add(self, offset: Vec3) -> Self {
        Self::new(self.low + offset, self.high + offset)
    }
}

/// (x, y, z) in file order becomes (z, x, y).
pub const fn to_engine_order(v: Vec3) -> Vec3 {
    Vec3::new(v.z, v.x, v.y)
}
