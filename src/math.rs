//! Abstractions over numerical types and position-like types, plus the small
//! amount of geometry the mesh levels need.

use std::fmt::Debug;

use cgmath::{Point3, Vector3, prelude::*};
use num_traits::{AsPrimitive, Num, NumAssign, Zero};


/// Primitive numerical types, like `f64` and `u32`.
///
/// This trait is automatically implemented for all types that satisfy the
/// super-trait constraints.
pub trait PrimitiveNum: 'static + Copy + Debug + Num + PartialOrd + NumAssign + AsPrimitive<f64> {}

impl<T> PrimitiveNum for T
where
    T: 'static + Copy + Debug + Num + PartialOrd + NumAssign + AsPrimitive<f64>,
{}


/// Types that can be interpreted to represent some kind of 3D position.
///
/// This type is implemented for `cgmath::Point3`, as well as for generic
/// "weaker" types such as tuples `(T, T, T)` and arrays `[T; 3]`. Mesh levels
/// always store `Point3<f64>`; this trait only exists to make feeding
/// positions into a [`LevelBuilder`][crate::build::LevelBuilder] convenient.
pub trait Pos3Like: Copy {
    /// The type of each component.
    type Scalar: PrimitiveNum;

    /// Returns the `x` component of this position.
    fn x(&self) -> Self::Scalar;

    /// Returns the `y` component of this position.
    fn y(&self) -> Self::Scalar;

    /// Returns the `z` component of this position.
    fn z(&self) -> Self::Scalar;

    /// Converts this position into the representation used by the mesh.
    fn to_point3(self) -> Point3<f64> {
        Point3::new(self.x().as_(), self.y().as_(), self.z().as_())
    }
}

impl<T: PrimitiveNum> Pos3Like for Point3<T> {
    type Scalar = T;
    fn x(&self) -> Self::Scalar { self.x }
    fn y(&self) -> Self::Scalar { self.y }
    fn z(&self) -> Self::Scalar { self.z }
}

impl<T: PrimitiveNum> Pos3Like for (T, T, T) {
    type Scalar = T;
    fn x(&self) -> Self::Scalar { self.0 }
    fn y(&self) -> Self::Scalar { self.1 }
    fn z(&self) -> Self::Scalar { self.2 }
}

impl<T: PrimitiveNum> Pos3Like for [T; 3] {
    type Scalar = T;
    fn x(&self) -> Self::Scalar { self[0] }
    fn y(&self) -> Self::Scalar { self[1] }
    fn z(&self) -> Self::Scalar { self[2] }
}


/// Area, unit normal and centroid of a planar-ish surface element.
///
/// Polygons are fanned from their first corner; the area is the sum of the
/// triangle areas, the normal and the centroid are area weighted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementGeometry {
    pub area: f64,
    pub normal: Vector3<f64>,
    pub centroid: Point3<f64>,
}

impl ElementGeometry {
    /// Geometry of the polygon with the given corners (in counter clockwise
    /// order seen from the normal).
    pub fn of_polygon(corners: &[Point3<f64>]) -> Self {
        debug_assert!(corners.len() >= 3);

        let mut area = 0.0;
        let mut normal = Vector3::zero();
        let mut centroid = Vector3::zero();

        let first = corners[0];
        for w in corners[1..].windows(2) {
            let cross = (w[0] - first).cross(w[1] - first);
            let tri_area = 0.5 * cross.magnitude();
            let tri_centroid = (first.to_vec() + w[0].to_vec() + w[1].to_vec()) / 3.0;

            area += tri_area;
            normal += cross;
            centroid += tri_centroid * tri_area;
        }

        let centroid = if area > 0.0 {
            centroid / area
        } else {
            corners.iter().fold(Vector3::zero(), |acc, p| acc + p.to_vec()) / corners.len() as f64
        };
        let normal = if normal.magnitude2() > 0.0 { normal.normalize() } else { normal };

        Self {
            area,
            normal,
            centroid: Point3::from_vec(centroid),
        }
    }

    /// The geometry of the union of several elements: areas are summed,
    /// normal and centroid are area weighted.
    pub fn combine(parts: impl IntoIterator<Item = ElementGeometry>) -> Self {
        let mut area = 0.0;
        let mut normal = Vector3::zero();
        let mut centroid = Vector3::zero();
        let mut plain_sum = Vector3::zero();
        let mut count = 0;

        for part in parts {
            area += part.area;
            normal += part.normal * part.area;
            centroid += part.centroid.to_vec() * part.area;
            plain_sum += part.centroid.to_vec();
            count += 1;
        }

        let centroid = if area > 0.0 {
            centroid / area
        } else if count > 0 {
            plain_sum / count as f64
        } else {
            centroid
        };
        let normal = if normal.magnitude2() > 0.0 { normal.normalize() } else { normal };

        Self {
            area,
            normal,
            centroid: Point3::from_vec(centroid),
        }
    }
}


/// An orthonormal basis `(t1, t2)` of the plane orthogonal to `normal`.
///
/// `normal` has to be a unit vector.
pub(crate) fn tangent_basis(normal: Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    // Use the coordinate axis that is "most orthogonal" to the normal as
    // helper to avoid cancellation.
    let helper = if normal.x.abs() <= normal.y.abs() && normal.x.abs() <= normal.z.abs() {
        Vector3::unit_x()
    } else if normal.y.abs() <= normal.z.abs() {
        Vector3::unit_y()
    } else {
        Vector3::unit_z()
    };

    let t1 = helper.cross(normal).normalize();
    let t2 = normal.cross(t1);
    (t1, t2)
}


#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use super::*;

    #[test]
    fn pos_like_conversions() {
        assert_eq!([1.0f32, 2.0, 3.0].to_point3(), Point3::new(1.0, 2.0, 3.0));
        assert_eq!((1u8, 0u8, 7u8).to_point3(), Point3::new(1.0, 0.0, 7.0));
        assert_eq!(Point3::new(0.5, 0.25, 1.0).to_point3(), Point3::new(0.5, 0.25, 1.0));
    }

    #[test]
    fn unit_square_geometry() {
        let g = ElementGeometry::of_polygon(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]);

        assert_relative_eq!(g.area, 1.0);
        assert_relative_eq!(g.normal, Vector3::unit_z());
        assert_relative_eq!(g.centroid, Point3::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn triangle_geometry_clockwise() {
        let g = ElementGeometry::of_polygon(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
        ]);

        assert_relative_eq!(g.area, 4.5);
        assert_relative_eq!(g.normal, -Vector3::unit_z());
        assert_relative_eq!(g.centroid, Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn combined_geometry() {
        let left = ElementGeometry::of_polygon(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]);
        let right = ElementGeometry::of_polygon(&[
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(3.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ]);
        let g = ElementGeometry::combine(vec![left, right]);

        assert_relative_eq!(g.area, 3.0);
        assert_relative_eq!(g.normal, Vector3::unit_z());
        assert_relative_eq!(g.centroid, Point3::new(1.5, 0.5, 0.0));
    }

    #[test]
    fn tangent_basis_is_orthonormal() {
        let n = Vector3::new(1.0, 2.0, -0.5).normalize();
        let (t1, t2) = tangent_basis(n);

        assert_relative_eq!(t1.magnitude(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(t2.magnitude(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(t1.dot(n), 0.0, epsilon = 1e-12);
        assert_relative_eq!(t2.dot(n), 0.0, epsilon = 1e-12);
        assert_relative_eq!(t1.dot(t2), 0.0, epsilon = 1e-12);
    }
}
