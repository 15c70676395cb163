//! Geometry primitives and identifiers.
//!
//! Points are stored as `f32` triples. Per-point attributes (diameter,
//! perimeter) live in parallel vectors inside a [`PointLevel`], the unit that
//! sections, the soma, markers, and annotations all share.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::RawDataError;

/// A 3D coordinate in micrometers.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
}

impl Point {
    /// Creates a point from its three coordinates.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Component-wise mean of a set of points. Returns the origin for an empty set.
    pub fn centroid(points: &[Point]) -> Point {
        if points.is_empty() {
            return Point::default();
        }
        let n = points.len() as f32;
        let (sx, sy, sz) = points.iter().fold((0.0, 0.0, 0.0), |(x, y, z), p| {
            (x + p.x, y + p.y, z + p.z)
        });
        Point::new(sx / n, sy / n, sz / n)
    }
}

impl From<[f32; 3]> for Point {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Point> for [f32; 3] {
    fn from(p: Point) -> Self {
        [p.x, p.y, p.z]
    }
}

/// A single sample: position plus per-point attributes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Sample position.
    pub point: Point,
    /// Sample diameter.
    pub diameter: f32,
    /// Optional perimeter (only some formats carry it).
    pub perimeter: Option<f32>,
}

impl Sample {
    /// True if both samples have identical position, diameter and perimeter.
    pub fn same_as(&self, other: &Sample) -> bool {
        self.point == other.point
            && self.diameter == other.diameter
            && self.perimeter == other.perimeter
    }
}

/// Parallel point/diameter/perimeter vectors.
///
/// `perimeters` is either empty or exactly as long as `points`.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointLevel {
    /// Point coordinates.
    pub points: Vec<Point>,
    /// Per-point diameters.
    pub diameters: Vec<f32>,
    /// Per-point perimeters; empty when the source carries none.
    #[cfg_attr(feature = "serde", serde(default))]
    pub perimeters: Vec<f32>,
}

impl PointLevel {
    /// Creates a point level without perimeters.
    pub fn new(points: Vec<Point>, diameters: Vec<f32>) -> Self {
        Self {
            points,
            diameters,
            perimeters: Vec::new(),
        }
    }

    /// Attaches perimeters.
    pub fn with_perimeters(mut self, perimeters: Vec<f32>) -> Self {
        self.perimeters = perimeters;
        self
    }

    /// Builds a point level from samples. Perimeters are kept only if every
    /// sample carries one.
    pub fn from_samples(samples: &[Sample]) -> Self {
        let mut level = Self::default();
        for s in samples {
            level.push(*s);
        }
        if samples.iter().any(|s| s.perimeter.is_none()) {
            level.perimeters.clear();
        }
        level
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if there are no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True if perimeters are present.
    #[inline]
    pub fn has_perimeters(&self) -> bool {
        !self.perimeters.is_empty()
    }

    /// Appends one sample. The perimeter is dropped when `sample` has none.
    pub fn push(&mut self, sample: Sample) {
        self.points.push(sample.point);
        self.diameters.push(sample.diameter);
        if let Some(p) = sample.perimeter {
            self.perimeters.push(p);
        }
    }

    /// Returns the sample at `index`.
    pub fn sample(&self, index: usize) -> Option<Sample> {
        Some(Sample {
            point: *self.points.get(index)?,
            diameter: *self.diameters.get(index)?,
            perimeter: self.perimeters.get(index).copied(),
        })
    }

    /// First sample, if any.
    pub fn first(&self) -> Option<Sample> {
        self.sample(0)
    }

    /// Last sample, if any.
    pub fn last(&self) -> Option<Sample> {
        self.len().checked_sub(1).and_then(|i| self.sample(i))
    }

    /// Removes the sample at `index`.
    pub fn remove(&mut self, index: usize) {
        self.points.remove(index);
        self.diameters.remove(index);
        if self.has_perimeters() {
            self.perimeters.remove(index);
        }
    }

    /// Keeps only the first and last sample.
    pub fn keep_endpoints(&mut self) {
        let n = self.len();
        if n <= 2 {
            return;
        }
        self.points = vec![self.points[0], self.points[n - 1]];
        self.diameters = vec![self.diameters[0], self.diameters[n - 1]];
        if self.has_perimeters() {
            self.perimeters = vec![self.perimeters[0], self.perimeters[n - 1]];
        }
    }

    /// Checks that the parallel vectors agree in length.
    pub fn validate(&self) -> Result<(), RawDataError> {
        if self.diameters.len() != self.points.len() {
            return Err(RawDataError::VectorLengthMismatch {
                first: "points",
                first_len: self.points.len(),
                second: "diameters",
                second_len: self.diameters.len(),
            });
        }
        if self.has_perimeters() && self.perimeters.len() != self.points.len() {
            return Err(RawDataError::VectorLengthMismatch {
                first: "points",
                first_len: self.points.len(),
                second: "perimeters",
                second_len: self.perimeters.len(),
            });
        }
        Ok(())
    }

    /// Sum of segment lengths.
    pub fn path_length(&self) -> f32 {
        self.as_slice().path_length()
    }

    /// Borrows the parallel vectors.
    pub fn as_slice(&self) -> PointSlice<'_> {
        PointSlice {
            points: &self.points,
            diameters: &self.diameters,
            perimeters: &self.perimeters,
        }
    }
}

/// Borrowed counterpart of [`PointLevel`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointSlice<'a> {
    /// Point coordinates.
    pub points: &'a [Point],
    /// Per-point diameters.
    pub diameters: &'a [f32],
    /// Per-point perimeters; empty when absent.
    pub perimeters: &'a [f32],
}

impl PointSlice<'_> {
    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if there are no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the sample at `index`.
    pub fn sample(&self, index: usize) -> Option<Sample> {
        Some(Sample {
            point: *self.points.get(index)?,
            diameter: *self.diameters.get(index)?,
            perimeter: self.perimeters.get(index).copied(),
        })
    }

    /// Last sample, if any.
    pub fn last(&self) -> Option<Sample> {
        self.len().checked_sub(1).and_then(|i| self.sample(i))
    }

    /// Sum of segment lengths.
    pub fn path_length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// Copies into an owned [`PointLevel`].
    pub fn to_level(&self) -> PointLevel {
        PointLevel {
            points: self.points.to_vec(),
            diameters: self.diameters.to_vec(),
            perimeters: self.perimeters.to_vec(),
        }
    }
}

/// Biological category of a section or point group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SectionType {
    /// No category given.
    Undefined,
    /// Cell body. Only valid for soma points, never for a section.
    Soma,
    /// Axon.
    Axon,
    /// General or basal dendrite (near the soma).
    BasalDendrite,
    /// Apical dendrite (far from the soma).
    ApicalDendrite,
    /// User-defined category; the code is always at least
    /// [`SectionType::CUSTOM_START`].
    Custom(u8),
}

impl SectionType {
    /// First numeric code reserved for custom types.
    pub const CUSTOM_START: u8 = 5;

    /// Maps a numeric type code (SWC convention) to a section type.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Undefined,
            1 => Self::Soma,
            2 => Self::Axon,
            3 => Self::BasalDendrite,
            4 => Self::ApicalDendrite,
            n => Self::Custom(n),
        }
    }

    /// Numeric type code (SWC convention).
    pub fn code(self) -> u8 {
        match self {
            Self::Undefined => 0,
            Self::Soma => 1,
            Self::Axon => 2,
            Self::BasalDendrite => 3,
            Self::ApicalDendrite => 4,
            Self::Custom(n) => n,
        }
    }

    /// True for types that may label a neurite section.
    pub fn is_neurite(self) -> bool {
        !matches!(self, Self::Undefined | Self::Soma)
    }

    /// True for [`SectionType::Custom`].
    pub fn is_custom(self) -> bool {
        matches!(self, Self::Custom(_))
    }

    /// Rank used to order root sections like NEURON does.
    pub(crate) fn nrn_rank(self) -> u16 {
        match self {
            Self::Axon => 0,
            Self::BasalDendrite => 1,
            Self::ApicalDendrite => 2,
            Self::Custom(n) => 3 + u16::from(n),
            Self::Undefined | Self::Soma => u16::MAX,
        }
    }
}

impl core::fmt::Display for SectionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Soma => write!(f, "soma"),
            Self::Axon => write!(f, "axon"),
            Self::BasalDendrite => write!(f, "basal dendrite"),
            Self::ApicalDendrite => write!(f, "apical dendrite"),
            Self::Custom(n) => write!(f, "custom({n})"),
        }
    }
}

/// How soma points are to be interpreted geometrically.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SomaType {
    /// Unknown or absent soma.
    #[default]
    Undefined,
    /// A sphere described by one point.
    SinglePoint,
    /// NeuroMorpho three-point cylinder soma.
    ThreePointCylinders,
    /// A stack of cylinders.
    Cylinders,
    /// A closed contour.
    SimpleContour,
}

impl core::fmt::Display for SomaType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Undefined => "undefined",
            Self::SinglePoint => "single point",
            Self::ThreePointCylinders => "three-point cylinders",
            Self::Cylinders => "cylinders",
            Self::SimpleContour => "simple contour",
        };
        f.write_str(name)
    }
}

/// Stable identifier of a neurite section.
///
/// In a built [`Morphology`](crate::Morphology) ids are contiguous from 0 in
/// depth-first order. In a [`MutableMorphology`](crate::MutableMorphology)
/// ids are assigned sequentially and never reused within one edit session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SectionId(pub(crate) u32);

impl SectionId {
    /// Wraps a raw section index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for SectionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SectionId({})", self.0)
    }
}

/// Stable identifier of a mitochondrial section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MitoSectionId(pub(crate) u32);

impl MitoSectionId {
    /// Wraps a raw mitochondrial section index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for MitoSectionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "MitoSectionId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(x: f32, d: f32) -> Sample {
        Sample {
            point: Point::new(x, 0.0, 0.0),
            diameter: d,
            perimeter: None,
        }
    }

    #[test]
    fn test_distance_and_centroid() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(3.0, 4.0, 0.0);
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(Point::centroid(&[a, b]), Point::new(1.5, 2.0, 0.0));
        assert_eq!(Point::centroid(&[]), Point::default());
    }

    #[test]
    fn test_section_type_codes() {
        for code in 0..12u8 {
            assert_eq!(SectionType::from_code(code).code(), code);
        }
        assert!(SectionType::from_code(7).is_custom());
        assert!(!SectionType::Soma.is_neurite());
        assert!(SectionType::Axon.nrn_rank() < SectionType::BasalDendrite.nrn_rank());
        assert!(SectionType::ApicalDendrite.nrn_rank() < SectionType::Custom(5).nrn_rank());
    }

    #[test]
    fn test_point_level_mismatch() {
        let level = PointLevel::new(vec![Point::default(); 3], vec![1.0; 2]);
        let err = level.validate().unwrap_err();
        assert!(err.to_string().contains("diameters"), "got: {err}");

        let level = PointLevel::new(vec![Point::default(); 2], vec![1.0; 2])
            .with_perimeters(vec![1.0]);
        assert!(level.validate().is_err());
    }

    #[test]
    fn test_from_samples_drops_partial_perimeters() {
        let mut a = sample(0.0, 1.0);
        a.perimeter = Some(2.0);
        let b = sample(1.0, 1.0);
        let level = PointLevel::from_samples(&[a, b]);
        assert_eq!(level.len(), 2);
        assert!(!level.has_perimeters());
        assert!(level.validate().is_ok());
    }

    #[test]
    fn test_keep_endpoints() {
        let mut level = PointLevel::from_samples(&[
            sample(0.0, 1.0),
            sample(1.0, 2.0),
            sample(2.0, 3.0),
        ]);
        level.keep_endpoints();
        assert_eq!(level.len(), 2);
        assert_eq!(level.diameters, vec![1.0, 3.0]);
        assert_eq!(level.path_length(), 2.0);
    }

    #[test]
    fn test_remove_and_last() {
        let mut level = PointLevel::from_samples(&[sample(0.0, 5.0), sample(1.0, 1.0), sample(2.0, 1.0)]);
        assert_eq!(level.first().unwrap().diameter, 5.0);
        assert_eq!(level.last().unwrap().point.x, 2.0);
        level.remove(0);
        assert_eq!(level.first().unwrap().point.x, 1.0);
        assert_eq!(level.len(), 2);
    }
}
