//! Tree builder / validator.
//!
//! Building runs in two stages:
//!
//! 1. [`records`] indexes a [`RecordStream`], rejects malformed input,
//!    collects the soma, and partitions the neurite records into a
//!    [`RawTree`] of unbranched same-type runs.
//! 2. [`assemble`] applies the section-level policies (tree count,
//!    single-point sections, zero-length segments), numbers the sections,
//!    resolves organelle references, applies modifiers, and freezes the
//!    result into a [`Morphology`].
//!
//! A [`MutableMorphology`](crate::MutableMorphology) rebuild skips stage 1
//! and hands its arena straight to stage 2 as a [`RawTree`].

mod assemble;
mod records;

pub(crate) use assemble::assemble;

use crate::annotation::{Annotation, Marker};
use crate::error::MorphologyResult;
use crate::geometry::{PointLevel, SectionType};
use crate::morphology::Morphology;
use crate::options::BuildOptions;
use crate::record::{RawMitoSection, RawReticulum, RecordStream};
use crate::soma::Soma;
use crate::warning::WarningLog;

/// A section before numbering. Links are indices into [`RawTree::sections`].
#[derive(Clone, Debug)]
pub(crate) struct RawSection {
    pub(crate) section_type: SectionType,
    pub(crate) points: PointLevel,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
    /// Source line of the first record.
    pub(crate) line: Option<usize>,
    /// Id of the first record.
    pub(crate) first_id: Option<u32>,
}

/// How neurite references of raw organelles are read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SectionRefs {
    /// Final section ids of the built model.
    Final,
    /// Indices into [`RawTree::sections`].
    Index,
}

/// Stage 1 output, also produced directly by a mutable model.
#[derive(Clone, Debug)]
pub(crate) struct RawTree {
    pub(crate) sections: Vec<RawSection>,
    pub(crate) roots: Vec<usize>,
    pub(crate) soma: Soma,
    /// Number of connected components in the input.
    pub(crate) tree_count: usize,
    pub(crate) mitochondria: Vec<RawMitoSection>,
    pub(crate) reticulum: Vec<RawReticulum>,
    pub(crate) refs: SectionRefs,
    pub(crate) markers: Vec<Marker>,
    pub(crate) annotations: Vec<Annotation>,
}

/// Builds a morphology from a record stream.
pub(crate) fn build(stream: &RecordStream, options: &BuildOptions) -> MorphologyResult<Morphology> {
    let mut log = WarningLog::new(options.max_warnings, &options.ignored_warnings);
    let tree = records::partition(stream, options, &mut log)?;
    assemble(tree, options, log)
}

/// Finds a node on a parent-link cycle, walking each chain once.
pub(crate) fn find_cycle(parents: &[Option<usize>]) -> Option<usize> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnPath,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; parents.len()];
    let mut path = Vec::new();
    for start in 0..parents.len() {
        let mut cur = Some(start);
        while let Some(i) = cur {
            match marks[i] {
                Mark::Done => break,
                Mark::OnPath => return Some(i),
                Mark::Unvisited => {
                    marks[i] = Mark::OnPath;
                    path.push(i);
                    cur = parents[i];
                }
            }
        }
        for i in path.drain(..) {
            marks[i] = Mark::Done;
        }
    }
    None
}
