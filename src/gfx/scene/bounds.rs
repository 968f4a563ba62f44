use cgmath::{Matrix4, Point3, Transform, Vector3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Bounds of `positions` in their own space.
    ///
    /// Returns `None` for an empty slice.
    pub fn from_points(positions: &[[f32; 3]]) -> Option<Self> {
        let (first, rest) = positions.split_first()?;
        let mut aabb = Self::new(Vector3::from(*first), Vector3::from(*first));
        for point in rest {
            aabb.expand_point(Vector3::from(*point));
        }
        Some(aabb)
    }

    pub fn corners(&self) -> [Vector3<f32>; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vector3::new(lo.x, lo.y, lo.z),
            Vector3::new(hi.x, lo.y, lo.z),
            Vector3::new(lo.x, hi.y, lo.z),
            Vector3::new(hi.x, hi.y, lo.z),
            Vector3::new(lo.x, lo.y, hi.z),
            Vector3::new(hi.x, lo.y, hi.z),
            Vector3::new(lo.x, hi.y, hi.z),
            Vector3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Box enclosing the eight corners after transforming them by `world`.
    ///
    /// Under rotation this is looser than the bounds of the transformed
    /// vertices, and it is what model centering uses.
    pub fn transformed(&self, world: &Matrix4<f32>) -> Self {
        let corners = self
            .corners()
            .map(|c| world.transform_point(Point3::new(c.x, c.y, c.z)))
            .map(|p| Vector3::new(p.x, p.y, p.z));

        let mut aabb = Self::new(corners[0], corners[0]);
        for corner in &corners[1..] {
            aabb.expand_point(*corner);
        }
        aabb
    }

    pub fn expand_point(&mut self, point: Vector3<f32>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        let mut merged = *self;
        merged.expand_point(other.min);
        merged.expand_point(other.max);
        merged
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::{Deg, SquareMatrix};
    use std::f32::consts::FRAC_1_SQRT_2;

    #[test]
    fn test_aabb_creation() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [-1.0, -1.0, -1.0]];
        let aabb = Aabb::from_points(&positions).unwrap();

        assert_eq!(aabb.min, Vector3::new(-1.0, -1.0, -1.0));
        assert_eq!(aabb.max, Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(aabb.center(), Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_transformed_bounds() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 2.0, 3.0]];
        let world = Matrix4::from_translation(Vector3::new(10.0, 0.0, 0.0)) * Matrix4::from_scale(2.0);
        let aabb = Aabb::from_points(&positions).unwrap().transformed(&world);

        assert_eq!(aabb.min, Vector3::new(10.0, 0.0, 0.0));
        assert_eq!(aabb.max, Vector3::new(12.0, 4.0, 6.0));
    }

    #[test]
    fn test_rotated_bounds_use_box_corners() {
        // Local box is [0,1] x [0,0] x [0,1]; its far corner (1,0,1) is not a vertex
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        let world = Matrix4::from_angle_y(Deg(45.0));
        let aabb = Aabb::from_points(&positions).unwrap().transformed(&world);

        assert_relative_eq!(aabb.min.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(aabb.max.x, 2.0f32.sqrt(), epsilon = 1e-5);
        assert_relative_eq!(aabb.min.z, -FRAC_1_SQRT_2, epsilon = 1e-5);
        assert_relative_eq!(aabb.max.z, FRAC_1_SQRT_2, epsilon = 1e-5);
        assert_relative_eq!(aabb.center().x, FRAC_1_SQRT_2, epsilon = 1e-5);
    }

    #[test]
    fn test_identity_transform_keeps_box() {
        let aabb = Aabb::new(Vector3::new(-1.0, 2.0, 0.0), Vector3::new(3.0, 4.0, 5.0));
        assert_eq!(aabb.transformed(&Matrix4::identity()), aabb);
    }

    #[test]
    fn test_empty_has_no_bounds() {
        assert!(Aabb::from_points(&[]).is_none());
    }

    #[test]
    fn test_union() {
        let a = Aabb::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Vector3::new(-2.0, 0.5, 0.0), Vector3::new(0.0, 3.0, 0.5));
        let merged = a.union(&b);
        assert_eq!(merged.min, Vector3::new(-2.0, 0.0, 0.0));
        assert_eq!(merged.max, Vector3::new(1.0, 3.0, 1.0));
    }
}
