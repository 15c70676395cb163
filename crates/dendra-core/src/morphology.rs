//! Immutable morphology model.
//!
//! A [`Morphology`] is a frozen snapshot produced by the builder. Points of
//! every section live in three flat arrays; each section records the range it
//! owns, its parent id, and its child ids. The whole snapshot sits behind an
//! [`Arc`], so clones share storage and can be handed to any number of reader
//! threads. Nothing in the public interface mutates it; editing goes through
//! [`MutableMorphology`](crate::MutableMorphology) and a fresh build.

use std::sync::Arc;

use crate::annotation::{Annotation, Marker};
use crate::builder;
use crate::error::MorphologyResult;
use crate::geometry::{Point, PointSlice, SectionId, SectionType};
use crate::mitochondria::Mitochondria;
use crate::options::BuildOptions;
use crate::record::RecordStream;
use crate::reticulum::EndoplasmicReticulum;
use crate::soma::Soma;
use crate::traversal::TreeTopology;
use crate::warning::WarningLog;

/// Topology and point range of one section.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SectionData {
    pub(crate) section_type: SectionType,
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) parent: Option<SectionId>,
    pub(crate) children: Vec<SectionId>,
}

/// Shared storage behind a [`Morphology`].
#[derive(Debug, Default)]
pub(crate) struct Properties {
    pub(crate) points: Vec<Point>,
    pub(crate) diameters: Vec<f32>,
    pub(crate) perimeters: Vec<f32>,
    pub(crate) sections: Vec<SectionData>,
    pub(crate) roots: Vec<SectionId>,
    pub(crate) soma: Soma,
    pub(crate) mitochondria: Mitochondria,
    pub(crate) reticulum: EndoplasmicReticulum,
    pub(crate) annotations: Vec<Annotation>,
    pub(crate) markers: Vec<Marker>,
    pub(crate) warnings: WarningLog,
}

/// A validated, read-only neuronal morphology.
///
/// Section ids are contiguous from 0, assigned root-first in depth-first
/// pre-order. Two morphologies compare equal when their soma, sections,
/// points, organelles, and markers match; warnings and annotations are
/// provenance and do not take part in equality.
#[derive(Clone, Debug)]
pub struct Morphology {
    props: Arc<Properties>,
}

impl Morphology {
    /// Builds a morphology from a raw record stream.
    ///
    /// Fails with the first fatal condition found; no partial model is ever
    /// returned. Non-fatal conditions end up in [`Morphology::warnings`].
    pub fn from_records(stream: &RecordStream, options: &BuildOptions) -> MorphologyResult<Self> {
        builder::build(stream, options)
    }

    pub(crate) fn from_properties(props: Properties) -> Self {
        Self {
            props: Arc::new(props),
        }
    }

    /// The soma. Empty when the source had none.
    pub fn soma(&self) -> &Soma {
        &self.props.soma
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.props.sections.len()
    }

    /// True if there are no sections.
    pub fn is_empty(&self) -> bool {
        self.props.sections.is_empty()
    }

    /// Looks up a section.
    pub fn section(&self, id: SectionId) -> Option<Section<'_>> {
        Section::new(self, id)
    }

    /// All sections in id order, which is depth-first pre-order.
    pub fn sections(&self) -> impl Iterator<Item = Section<'_>> {
        self.props
            .sections
            .iter()
            .enumerate()
            .map(|(i, data)| Section {
                morph: self,
                id: SectionId(i as u32),
                data,
            })
    }

    /// Root sections in stored order.
    pub fn root_sections(&self) -> impl Iterator<Item = Section<'_>> {
        self.props
            .roots
            .iter()
            .filter_map(|&id| Section::new(self, id))
    }

    /// Sections in depth-first pre-order.
    pub fn depth_first_sections(&self) -> impl Iterator<Item = Section<'_>> {
        self.depth_first().filter_map(|id| Section::new(self, id))
    }

    /// Sections in level order.
    pub fn breadth_first_sections(&self) -> impl Iterator<Item = Section<'_>> {
        self.breadth_first().filter_map(|id| Section::new(self, id))
    }

    /// Every section point, concatenated in id order.
    pub fn points(&self) -> &[Point] {
        &self.props.points
    }

    /// Every section diameter, concatenated in id order.
    pub fn diameters(&self) -> &[f32] {
        &self.props.diameters
    }

    /// Every section perimeter; empty when the source carried none.
    pub fn perimeters(&self) -> &[f32] {
        &self.props.perimeters
    }

    /// The mitochondrial forest.
    pub fn mitochondria(&self) -> &Mitochondria {
        &self.props.mitochondria
    }

    /// Endoplasmic reticulum entries.
    pub fn endoplasmic_reticulum(&self) -> &EndoplasmicReticulum {
        &self.props.reticulum
    }

    /// Error loci recorded during the build.
    pub fn annotations(&self) -> &[Annotation] {
        &self.props.annotations
    }

    /// Markers carried over from the source.
    pub fn markers(&self) -> &[Marker] {
        &self.props.markers
    }

    /// Non-fatal conditions found during the build.
    pub fn warnings(&self) -> &WarningLog {
        &self.props.warnings
    }

    /// True if both values share the same underlying storage.
    pub fn shares_storage_with(&self, other: &Morphology) -> bool {
        Arc::ptr_eq(&self.props, &other.props)
    }

    fn data(&self, id: SectionId) -> Option<&SectionData> {
        self.props.sections.get(id.0 as usize)
    }
}

impl PartialEq for Morphology {
    fn eq(&self, other: &Self) -> bool {
        if self.shares_storage_with(other) {
            return true;
        }
        let (a, b) = (&*self.props, &*other.props);
        a.sections == b.sections
            && a.roots == b.roots
            && a.points == b.points
            && a.diameters == b.diameters
            && a.perimeters == b.perimeters
            && a.soma == b.soma
            && a.mitochondria == b.mitochondria
            && a.reticulum == b.reticulum
            && a.markers == b.markers
    }
}

impl TreeTopology for Morphology {
    type Id = SectionId;

    fn root_ids(&self) -> &[SectionId] {
        &self.props.roots
    }

    fn children_of(&self, id: SectionId) -> &[SectionId] {
        self.data(id).map_or(&[][..], |d| d.children.as_slice())
    }

    fn parent_of(&self, id: SectionId) -> Option<SectionId> {
        self.data(id)?.parent
    }

    fn contains(&self, id: SectionId) -> bool {
        (id.0 as usize) < self.props.sections.len()
    }
}

/// Read-only view of one section of a [`Morphology`].
#[derive(Clone, Copy)]
pub struct Section<'a> {
    morph: &'a Morphology,
    id: SectionId,
    data: &'a SectionData,
}

impl<'a> Section<'a> {
    fn new(morph: &'a Morphology, id: SectionId) -> Option<Self> {
        Some(Self {
            morph,
            id,
            data: morph.data(id)?,
        })
    }

    /// Section id.
    pub fn id(&self) -> SectionId {
        self.id
    }

    /// Structural type.
    pub fn section_type(&self) -> SectionType {
        self.data.section_type
    }

    /// Point coordinates, parent end first.
    pub fn points(&self) -> &'a [Point] {
        &self.morph.props.points[self.data.start..self.data.end]
    }

    /// Per-point diameters.
    pub fn diameters(&self) -> &'a [f32] {
        &self.morph.props.diameters[self.data.start..self.data.end]
    }

    /// Per-point perimeters; empty when the morphology has none.
    pub fn perimeters(&self) -> &'a [f32] {
        let perimeters = &self.morph.props.perimeters;
        if perimeters.is_empty() {
            return &[];
        }
        &perimeters[self.data.start..self.data.end]
    }

    /// The three parallel slices together.
    pub fn point_slice(&self) -> PointSlice<'a> {
        PointSlice {
            points: self.points(),
            diameters: self.diameters(),
            perimeters: self.perimeters(),
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.data.end - self.data.start
    }

    /// Always false for a built section, which has at least 2 points.
    pub fn is_empty(&self) -> bool {
        self.data.end == self.data.start
    }

    /// Path length along the section.
    pub fn length(&self) -> f32 {
        self.point_slice().path_length()
    }

    /// Parent section; `None` for roots.
    pub fn parent(&self) -> Option<Section<'a>> {
        self.data.parent.and_then(|p| Section::new(self.morph, p))
    }

    /// Child sections in stored order.
    pub fn children(&self) -> impl Iterator<Item = Section<'a>> + 'a {
        let morph = self.morph;
        self.data
            .children
            .iter()
            .filter_map(move |&id| Section::new(morph, id))
    }

    /// True if the section has no parent.
    pub fn is_root(&self) -> bool {
        self.data.parent.is_none()
    }

    /// True if the section has no children.
    pub fn is_leaf(&self) -> bool {
        self.data.children.is_empty()
    }

    /// This section and its descendants, depth-first pre-order.
    pub fn depth_first(&self) -> impl Iterator<Item = Section<'a>> + 'a {
        let morph = self.morph;
        morph
            .depth_first_from(self.id)
            .filter_map(move |id| Section::new(morph, id))
    }

    /// This section and its descendants, level order.
    pub fn breadth_first(&self) -> impl Iterator<Item = Section<'a>> + 'a {
        let morph = self.morph;
        morph
            .breadth_first_from(self.id)
            .filter_map(move |id| Section::new(morph, id))
    }

    /// This section followed by its ancestors up to the root.
    pub fn upstream(&self) -> impl Iterator<Item = Section<'a>> + 'a {
        let morph = self.morph;
        morph
            .upstream_from(self.id)
            .filter_map(move |id| Section::new(morph, id))
    }
}

impl core::fmt::Debug for Section<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Section")
            .field("id", &self.id)
            .field("section_type", &self.data.section_type)
            .field("points", &self.len())
            .field("parent", &self.data.parent)
            .finish()
    }
}
