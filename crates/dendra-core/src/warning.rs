//! Non-fatal diagnostics collected during a build or export.
//!
//! The core only classifies warnings; formatting and display belong to the
//! caller. With the `tracing` feature each recorded warning is also emitted
//! as a `tracing::warn!` event.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Classification of a non-fatal condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WarningKind {
    /// Mitochondria dropped because the target format cannot encode them.
    MitochondriaWriteNotSupported,
    /// Endoplasmic reticulum dropped because the target format cannot encode it.
    EndoplasmicReticulumWriteNotSupported,
    /// Perimeters dropped because the target format cannot encode them.
    PerimeterWriteNotSupported,
    /// Writing a morphology without a soma.
    WriteNoSoma,
    /// Writing a morphology without soma and sections.
    WriteEmptyMorphology,
    /// Soma geometry does not conform to its soma type.
    SomaNonConform,
    /// A neurite has no parent although a soma exists.
    DisconnectedNeurite,
    /// A child section does not start at its parent's last point.
    WrongDuplicate,
    /// A neurite attaches to the soma at an unexpected point.
    WrongRootPoint,
    /// A section has exactly one child section.
    OnlyChild,
    /// More than one disconnected tree (under the warn policy).
    MultipleTrees,
    /// Point ids are not contiguous (under relaxed ids).
    IdSequence,
    /// Two consecutive points of a section coincide.
    ZeroLengthSegment,
    /// A single-point section was merged or padded.
    SinglePointSection,
    /// A child section's type differs from its parent's.
    MixedTypeAdjacency,
}

impl WarningKind {
    /// Every warning kind, in declaration order.
    pub const ALL: [WarningKind; 15] = [
        Self::MitochondriaWriteNotSupported,
        Self::EndoplasmicReticulumWriteNotSupported,
        Self::PerimeterWriteNotSupported,
        Self::WriteNoSoma,
        Self::WriteEmptyMorphology,
        Self::SomaNonConform,
        Self::DisconnectedNeurite,
        Self::WrongDuplicate,
        Self::WrongRootPoint,
        Self::OnlyChild,
        Self::MultipleTrees,
        Self::IdSequence,
        Self::ZeroLengthSegment,
        Self::SinglePointSection,
        Self::MixedTypeAdjacency,
    ];
}

/// One entry of a [`WarningLog`].
#[derive(Clone, Debug, PartialEq)]
pub struct Warning {
    /// Classification.
    pub kind: WarningKind,
    /// Human-readable context.
    pub message: String,
    /// Source line, when the codec supplied one.
    pub line: Option<usize>,
}

impl core::fmt::Display for Warning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.line {
            Some(line) => write!(f, "{:?} (line {line}): {}", self.kind, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

/// Ordered, append-only record of warnings.
///
/// Only the crate appends; once a build hands the log to a
/// [`Morphology`](crate::Morphology) it is read-only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WarningLog {
    entries: Vec<Warning>,
    ignored: Vec<WarningKind>,
    cap: Option<usize>,
    suppressed: usize,
}

impl WarningLog {
    pub(crate) fn new(cap: Option<usize>, ignored: &[WarningKind]) -> Self {
        Self {
            entries: Vec::new(),
            ignored: ignored.to_vec(),
            cap,
            suppressed: 0,
        }
    }

    /// Records a warning unless its kind is ignored. Past the cap the entry
    /// is only counted.
    pub(crate) fn push(&mut self, kind: WarningKind, message: impl Into<String>, line: Option<usize>) {
        if self.ignored.contains(&kind) {
            return;
        }
        if self.cap.is_some_and(|cap| self.entries.len() >= cap) {
            self.suppressed += 1;
            return;
        }
        let warning = Warning {
            kind,
            message: message.into(),
            line,
        };
        #[cfg(feature = "tracing")]
        tracing::warn!("{warning}");
        self.entries.push(warning);
    }

    /// Recorded warnings in emission order.
    pub fn entries(&self) -> &[Warning] {
        &self.entries
    }

    /// Iterates the recorded warnings.
    pub fn iter(&self) -> core::slice::Iter<'_, Warning> {
        self.entries.iter()
    }

    /// Number of recorded warnings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of warnings dropped because the cap was reached.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    /// True if at least one warning was dropped by the cap.
    pub fn is_truncated(&self) -> bool {
        self.suppressed > 0
    }

    /// True if a warning of `kind` was recorded.
    pub fn contains(&self, kind: WarningKind) -> bool {
        self.entries.iter().any(|w| w.kind == kind)
    }

    /// Number of recorded warnings of `kind`.
    pub fn count(&self, kind: WarningKind) -> usize {
        self.entries.iter().filter(|w| w.kind == kind).count()
    }
}

impl<'a> IntoIterator for &'a WarningLog {
    type Item = &'a Warning;
    type IntoIter = core::slice::Iter<'a, Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
