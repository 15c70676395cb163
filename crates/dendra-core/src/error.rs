//! Error taxonomy for morphology builds, edits, and exports.
//!
//! Every fatal condition maps to exactly one [`MorphologyError`] variant.
//! Variants with several distinct causes wrap a detail enum so callers can
//! match coarsely (via [`MorphologyError::kind`]) or precisely.

// thiserror passes fields by reference.
#![allow(clippy::ref_option, clippy::trivially_copy_pass_by_ref)]

use thiserror::Error;

use crate::geometry::{MitoSectionId, SectionId, SectionType, SomaType};
use crate::writer::FileFormat;

/// Formats an optional source line as a message suffix.
fn at_line(line: &Option<usize>) -> String {
    match line {
        Some(n) => format!(" (line {n})"),
        None => String::new(),
    }
}

fn at_point(id: &Option<u32>) -> String {
    match id {
        Some(id) => format!(" at point id {id}"),
        None => String::new(),
    }
}

fn carry_or_lack(perimeters: &bool) -> &'static str {
    if *perimeters { "carry" } else { "lack" }
}

fn mismatch_hint(first_len: &usize, second_len: &usize) -> &'static str {
    if *first_len == 0 || *second_len == 0 {
        " (did you forget to fill one of them?)"
    } else {
        ""
    }
}

/// Malformed records: duplicated ids, cyclic references, inconsistent vectors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RawDataError {
    /// Two records share the same point id.
    #[error("repeated point id {id}{}; first defined{}", at_line(.line), at_line(.first_line))]
    DuplicateId {
        /// The repeated id.
        id: u32,
        /// Line of the second occurrence.
        line: Option<usize>,
        /// Line of the first occurrence.
        first_line: Option<usize>,
    },

    /// A record names itself as parent.
    #[error("point id {id} has itself as parent (cyclic reference){}", at_line(.line))]
    SelfParent {
        /// The offending id.
        id: u32,
        /// Source line.
        line: Option<usize>,
    },

    /// Following parent references from a record loops back onto itself.
    #[error("cyclic parent reference through point id {id}{}", at_line(.line))]
    Cycle {
        /// An id on the cycle.
        id: u32,
        /// Source line.
        line: Option<usize>,
    },

    /// Parallel per-point vectors disagree in length.
    #[error(
        "vector length mismatch: {first} has {first_len} entries, {second} has {second_len}{}",
        mismatch_hint(.first_len, .second_len)
    )]
    VectorLengthMismatch {
        /// Name of the first vector.
        first: &'static str,
        /// Length of the first vector.
        first_len: usize,
        /// Name of the second vector.
        second: &'static str,
        /// Length of the second vector.
        second_len: usize,
    },

    /// Some records carry a perimeter and others do not.
    #[error("point id {id} has no perimeter while other points do{}", at_line(.line))]
    PartialPerimeters {
        /// First record without a perimeter.
        id: u32,
        /// Source line.
        line: Option<usize>,
    },

    /// A record carries [`SectionType::Undefined`].
    #[error("point id {id} has an undefined section type{}", at_line(.line))]
    UndefinedSectionType {
        /// The offending id.
        id: u32,
        /// Source line.
        line: Option<usize>,
    },

    /// Two mitochondrial sections share an id.
    #[error("repeated mitochondrial section id {id}")]
    DuplicateMitoId {
        /// The repeated id.
        id: u32,
    },

    /// A mitochondrial section names a parent that does not exist.
    #[error("mitochondrial section {id} refers to non-existent parent {parent}")]
    MissingMitoParent {
        /// The child mitochondrial section.
        id: u32,
        /// The missing parent.
        parent: u32,
    },

    /// Mitochondrial parent references form a cycle.
    #[error("cyclic parent reference through mitochondrial section {id}")]
    MitoCycle {
        /// An id on the cycle.
        id: u32,
    },

    /// A mitochondrial sample references a section that does not exist.
    #[error("mitochondrial section {mito} references unknown neurite section {section}")]
    DanglingMitochondrion {
        /// The mitochondrial section.
        mito: u32,
        /// The missing neurite section id.
        section: u32,
    },

    /// A relative offset along a neurite section is outside `[0, 1]`.
    #[error("mitochondrial section {mito} has relative offset {offset} outside [0, 1]")]
    OffsetOutOfRange {
        /// The mitochondrial section.
        mito: u32,
        /// The offending offset.
        offset: f32,
    },

    /// A mitochondrial section carries no samples.
    #[error("mitochondrial section {mito} has no samples")]
    EmptyMitoSection {
        /// The mitochondrial section.
        mito: u32,
    },

    /// An endoplasmic reticulum entry references a section that does not exist.
    #[error("endoplasmic reticulum entry references unknown section {section}")]
    DanglingReticulum {
        /// The missing neurite section id.
        section: u32,
    },
}

/// Soma points are absent, disjoint, or contradict the declared soma type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SomaError {
    /// A soma type was declared but no soma points exist.
    #[error("soma declared as {declared} but no soma points were found")]
    Absent {
        /// The declared soma type.
        declared: SomaType,
    },

    /// More than one disjoint group of soma points.
    #[error("multiple somata found, rooted at point ids {ids:?}")]
    MultipleSomata {
        /// Root id of each soma group.
        ids: Vec<u32>,
    },

    /// A soma point has a neurite point as parent.
    #[error("soma point {id} has a neurite point as parent{}", at_line(.line))]
    NeuriteParent {
        /// The soma point.
        id: u32,
        /// Source line.
        line: Option<usize>,
    },

    /// A soma point has more than one soma child.
    #[error("soma bifurcation at point id {id}{}", at_line(.line))]
    Bifurcation {
        /// The branching soma point.
        id: u32,
        /// Source line.
        line: Option<usize>,
    },

    /// The number of soma points contradicts the declared soma type.
    #[error("soma declared as {declared} cannot have {points} points")]
    TypeMismatch {
        /// The declared soma type.
        declared: SomaType,
        /// Number of soma points found.
        points: usize,
    },
}

/// An edit or build step violates point-count or parent-existence constraints.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SectionBuilderError {
    /// A section needs at least 2 points.
    #[error("a section needs at least 2 points, got {count}")]
    TooFewPoints {
        /// Number of points supplied.
        count: usize,
    },

    /// The referenced section does not exist.
    #[error("section {0} not found")]
    UnknownSection(SectionId),

    /// The referenced mitochondrial section does not exist.
    #[error("mitochondrial section {0} not found")]
    UnknownMitoSection(MitoSectionId),

    /// Non-recursive delete of a section that still has children.
    #[error("section {0} has children; delete recursively to remove its subtree")]
    HasChildren(SectionId),

    /// Mitochondrial counterpart of [`SectionBuilderError::HasChildren`].
    #[error("mitochondrial section {0} has children; delete recursively to remove its subtree")]
    MitoHasChildren(MitoSectionId),

    /// Grafting would make a section its own ancestor.
    #[error("grafting {section} onto {new_parent} would create a cycle")]
    WouldCreateCycle {
        /// The section being moved.
        section: SectionId,
        /// The requested new parent.
        new_parent: SectionId,
    },

    /// A single-point section was found and the active policy rejects it.
    #[error("single-point section{}{}", at_point(.id), at_line(.line))]
    SinglePoint {
        /// Id of the lone point, when it came from a record stream.
        id: Option<u32>,
        /// Source line.
        line: Option<usize>,
    },

    /// Soma and undefined types cannot label a neurite section.
    #[error("section type {0} cannot label a neurite section")]
    InvalidSectionType(SectionType),

    /// New points disagree with the morphology on carrying perimeters.
    #[error("new points {} perimeters, unlike the morphology's existing points", carry_or_lack(.perimeters))]
    PerimeterMismatch {
        /// Whether the rejected points carry perimeters.
        perimeters: bool,
    },
}

/// A re-serialization step cannot represent the in-memory state.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WriterError {
    /// The target format has no encoding for this section type.
    #[error("{format} cannot encode section {section} of type {section_type}")]
    UnsupportedSectionType {
        /// Target format.
        format: FileFormat,
        /// The section that cannot be written.
        section: SectionId,
        /// Its type.
        section_type: SectionType,
    },

    /// A section reached the writer with fewer than 2 points.
    #[error("{format} cannot encode section {section} with {points} points")]
    DegenerateSection {
        /// Target format.
        format: FileFormat,
        /// The section that cannot be written.
        section: SectionId,
        /// Its point count.
        points: usize,
    },
}

/// Coarse classification of a [`MorphologyError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`MorphologyError::RawData`].
    RawData,
    /// See [`MorphologyError::MissingParent`].
    MissingParent,
    /// See [`MorphologyError::Soma`].
    Soma,
    /// See [`MorphologyError::SectionBuilder`].
    SectionBuilder,
    /// See [`MorphologyError::IdSequence`].
    IdSequence,
    /// See [`MorphologyError::MultipleTrees`].
    MultipleTrees,
    /// See [`MorphologyError::Writer`].
    Writer,
    /// See [`MorphologyError::UnknownFileType`].
    UnknownFileType,
}

/// Fatal errors raised while building, editing, or exporting a morphology.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MorphologyError {
    /// Malformed records.
    #[error("raw data error: {0}")]
    RawData(#[from] RawDataError),

    /// A referenced parent point id does not exist in the stream.
    #[error("sample id {id} refers to non-existent parent id {parent}{}", at_line(.line))]
    MissingParent {
        /// The child point.
        id: u32,
        /// The missing parent id.
        parent: u32,
        /// Source line.
        line: Option<usize>,
    },

    /// Soma inconsistency.
    #[error("soma error: {0}")]
    Soma(#[from] SomaError),

    /// Edit or build step violates section constraints.
    #[error("section builder error: {0}")]
    SectionBuilder(#[from] SectionBuilderError),

    /// Point ids are not a contiguous ascending sequence under strict ids.
    #[error("id sequence error: expected point id {expected}, found {found}{}", at_line(.line))]
    IdSequence {
        /// The id that should have come next.
        expected: u32,
        /// The id that was found.
        found: u32,
        /// Source line.
        line: Option<usize>,
    },

    /// More than one disconnected tree under a fatal multi-root policy.
    #[error("found {count} disconnected trees")]
    MultipleTrees {
        /// Number of trees.
        count: usize,
    },

    /// Export cannot represent the morphology.
    #[error("writer error: {0}")]
    Writer(#[from] WriterError),

    /// No codec matches the given input.
    #[error("unknown file type '{path}': must have one of the following extensions: swc, asc or h5")]
    UnknownFileType {
        /// The rejected path.
        path: String,
    },
}

impl MorphologyError {
    /// Returns the taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RawData(_) => ErrorKind::RawData,
            Self::MissingParent { .. } => ErrorKind::MissingParent,
            Self::Soma(_) => ErrorKind::Soma,
            Self::SectionBuilder(_) => ErrorKind::SectionBuilder,
            Self::IdSequence { .. } => ErrorKind::IdSequence,
            Self::MultipleTrees { .. } => ErrorKind::MultipleTrees,
            Self::Writer(_) => ErrorKind::Writer,
            Self::UnknownFileType { .. } => ErrorKind::UnknownFileType,
        }
    }
}

/// Result type for morphology operations.
pub type MorphologyResult<T> = Result<T, MorphologyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_parent_display_includes_line() {
        let err = MorphologyError::MissingParent {
            id: 3,
            parent: 7,
            line: Some(12),
        };
        assert_eq!(
            err.to_string(),
            "sample id 3 refers to non-existent parent id 7 (line 12)"
        );
        assert_eq!(err.kind(), ErrorKind::MissingParent);
    }

    #[test]
    fn missing_parent_display_without_line() {
        let err = MorphologyError::MissingParent {
            id: 3,
            parent: 7,
            line: None,
        };
        assert_eq!(err.to_string(), "sample id 3 refers to non-existent parent id 7");
    }

    #[test]
    fn duplicate_id_wraps_as_raw_data() {
        let err: MorphologyError = RawDataError::DuplicateId {
            id: 2,
            line: Some(4),
            first_line: Some(3),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::RawData);
        let msg = err.to_string();
        assert!(msg.contains("repeated point id 2 (line 4)"), "got: {msg}");
        assert!(msg.contains("first defined (line 3)"), "got: {msg}");
    }

    #[test]
    fn vector_mismatch_hints_empty_vector() {
        let err = RawDataError::VectorLengthMismatch {
            first: "points",
            first_len: 3,
            second: "diameters",
            second_len: 0,
        };
        assert!(err.to_string().contains("did you forget"));
    }

    #[test]
    fn kinds_cover_taxonomy() {
        let soma: MorphologyError = SomaError::Absent {
            declared: SomaType::SinglePoint,
        }
        .into();
        assert_eq!(soma.kind(), ErrorKind::Soma);

        let section: MorphologyError = SectionBuilderError::TooFewPoints { count: 1 }.into();
        assert_eq!(section.kind(), ErrorKind::SectionBuilder);

        let trees = MorphologyError::MultipleTrees { count: 2 };
        assert_eq!(trees.kind(), ErrorKind::MultipleTrees);

        let unknown = MorphologyError::UnknownFileType {
            path: "cell.xyz".to_string(),
        };
        assert_eq!(unknown.kind(), ErrorKind::UnknownFileType);
        assert!(unknown.to_string().contains("swc, asc or h5"));
    }
}
