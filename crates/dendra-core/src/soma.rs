//! The cell body.
//!
//! The soma lives outside section id space: it is never addressable as a
//! section, and root sections have no section parent even when they are
//! attached to it.

use crate::error::SomaError;
use crate::geometry::{Point, PointLevel, SomaType};

/// Relative tolerance for the three-point cylinder layout check.
const THREE_POINT_TOLERANCE: f32 = 1e-3;

/// Soma points and the type governing their interpretation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Soma {
    soma_type: SomaType,
    points: PointLevel,
}

impl Soma {
    /// Creates a soma.
    pub fn new(soma_type: SomaType, points: PointLevel) -> Self {
        Self { soma_type, points }
    }

    /// The soma type.
    pub fn soma_type(&self) -> SomaType {
        self.soma_type
    }

    /// Soma points with per-point attributes.
    pub fn point_level(&self) -> &PointLevel {
        &self.points
    }

    /// Soma point coordinates.
    pub fn points(&self) -> &[Point] {
        &self.points.points
    }

    /// Soma point diameters.
    pub fn diameters(&self) -> &[f32] {
        &self.points.diameters
    }

    /// True if the soma has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Centroid of the soma points.
    pub fn center(&self) -> Point {
        Point::centroid(&self.points.points)
    }

    /// Mean distance from the centroid. For a single-point soma this is the
    /// point's radius.
    pub fn mean_radius(&self) -> f32 {
        match self.points.len() {
            0 => 0.0,
            1 => self.points.diameters.first().map_or(0.0, |d| d / 2.0),
            n => {
                let c = self.center();
                self.points.points.iter().map(|p| p.distance(c)).sum::<f32>() / n as f32
            }
        }
    }

    /// Collapses the soma into a single-point sphere of equivalent radius.
    pub fn to_sphere(&self) -> Soma {
        if self.is_empty() {
            return self.clone();
        }
        Soma::new(
            SomaType::SinglePoint,
            PointLevel::new(vec![self.center()], vec![2.0 * self.mean_radius()]),
        )
    }

    /// Checks that the point count agrees with the soma type.
    pub(crate) fn check_type(&self) -> Result<(), SomaError> {
        let n = self.points.len();
        let ok = match self.soma_type {
            SomaType::Undefined => n == 0,
            SomaType::SinglePoint => n == 1,
            SomaType::ThreePointCylinders => n == 3,
            SomaType::Cylinders => n >= 1,
            SomaType::SimpleContour => n >= 3,
        };
        if ok {
            return Ok(());
        }
        if n == 0 {
            return Err(SomaError::Absent {
                declared: self.soma_type,
            });
        }
        Err(SomaError::TypeMismatch {
            declared: self.soma_type,
            points: n,
        })
    }

    /// True if a three-point soma follows the NeuroMorpho layout: both side
    /// points offset by ±radius along y, sharing the center's x, z and radius.
    pub(crate) fn is_conform_three_point(&self) -> bool {
        if self.soma_type != SomaType::ThreePointCylinders || self.points.len() != 3 {
            return true;
        }
        let p = &self.points.points;
        let d = &self.points.diameters;
        if d.len() != 3 {
            return false;
        }
        let r = d[0] / 2.0;
        let tol = THREE_POINT_TOLERANCE * r.abs().max(1.0);
        let close = |a: f32, b: f32| (a - b).abs() <= tol;
        let side_ok = |i: usize| {
            close(p[i].x, p[0].x)
                && close(p[i].z, p[0].z)
                && close((p[i].y - p[0].y).abs(), r)
                && close(d[i], d[0])
        };
        side_ok(1) && side_ok(2) && (p[1].y - p[0].y) * (p[2].y - p[0].y) < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_point(offset: f32) -> Soma {
        Soma::new(
            SomaType::ThreePointCylinders,
            PointLevel::new(
                vec![
                    Point::new(0.0, 0.0, 0.0),
                    Point::new(0.0, -offset, 0.0),
                    Point::new(0.0, offset, 0.0),
                ],
                vec![2.0, 2.0, 2.0],
            ),
        )
    }

    #[test]
    fn test_three_point_conformance() {
        assert!(three_point(1.0).is_conform_three_point());
        assert!(!three_point(3.0).is_conform_three_point());
    }

    #[test]
    fn test_check_type() {
        let soma = Soma::new(
            SomaType::SinglePoint,
            PointLevel::new(vec![Point::default(); 2], vec![1.0; 2]),
        );
        assert_eq!(
            soma.check_type(),
            Err(SomaError::TypeMismatch {
                declared: SomaType::SinglePoint,
                points: 2
            })
        );
        let absent = Soma::new(SomaType::SimpleContour, PointLevel::default());
        assert!(matches!(absent.check_type(), Err(SomaError::Absent { .. })));
        assert!(Soma::default().check_type().is_ok());
        assert!(three_point(1.0).check_type().is_ok());
    }

    #[test]
    fn test_sphere() {
        let sphere = three_point(1.0).to_sphere();
        assert_eq!(sphere.soma_type(), SomaType::SinglePoint);
        assert_eq!(sphere.points(), &[Point::new(0.0, 0.0, 0.0)]);
        // Mean distance of (0, ±1, 0, origin) from origin is 2/3.
        assert!((sphere.diameters()[0] - 4.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_unchecked_points_do_not_panic() {
        let lone = Soma::new(
            SomaType::SinglePoint,
            PointLevel {
                points: vec![Point::new(1.0, 2.0, 3.0)],
                diameters: Vec::new(),
                perimeters: Vec::new(),
            },
        );
        assert_eq!(lone.mean_radius(), 0.0);
        let sphere = lone.to_sphere();
        assert_eq!(sphere.points(), &[Point::new(1.0, 2.0, 3.0)]);
        assert_eq!(sphere.diameters(), &[0.0]);

        let short = Soma::new(
            SomaType::ThreePointCylinders,
            PointLevel {
                points: vec![Point::default(); 3],
                diameters: vec![2.0],
                perimeters: Vec::new(),
            },
        );
        assert!(!short.is_conform_three_point());
        assert!(short.to_sphere().diameters()[0].is_finite());
    }
}
