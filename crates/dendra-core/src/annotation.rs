//! Provenance records attached to a morphology. Never affect traversal.

use crate::geometry::{PointLevel, SectionId};

/// What an [`Annotation`] points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnnotationType {
    /// A section with exactly one child section.
    SingleChild,
    /// Two consecutive identical soma points.
    DuplicateSomaPoint,
    /// Two consecutive identical points inside a section.
    ZeroLengthSegment,
}

/// An error locus recorded during a build.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    /// Classification.
    pub kind: AnnotationType,
    /// The section concerned, if any.
    pub section: Option<SectionId>,
    /// Source line, when known.
    pub line: Option<usize>,
    /// Free-form details.
    pub message: String,
    /// Points at the locus.
    pub points: PointLevel,
}

/// A labeled point set supplied by the codec (e.g. a Neurolucida marker).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Marker {
    /// Label as found in the source.
    pub label: String,
    /// Marker points.
    pub points: PointLevel,
}

impl Marker {
    /// Creates a marker.
    pub fn new(label: impl Into<String>, points: PointLevel) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }
}
