//! Mutable morphology model.
//!
//! [`MutableMorphology`] is an arena of sections indexed by [`SectionId`].
//! Each section stores its parent id and an ordered list of child ids, so
//! reparenting never moves point data. Deleted slots stay vacant and ids are
//! never reused within one edit session.
//!
//! Every edit validates fully before touching the arena: a failed call leaves
//! the model exactly as it was. [`MutableMorphology::build`] re-runs the
//! builder's section stage over the arena and returns a fresh
//! [`Morphology`]; the arena itself is left untouched.

use crate::annotation::Marker;
use crate::builder::{self, RawSection, RawTree, SectionRefs};
use crate::error::{MorphologyResult, RawDataError, SectionBuilderError};
use crate::geometry::{MitoSectionId, PointLevel, SectionId, SectionType, SomaType};
use crate::mitochondria::{MitoPointLevel, Mitochondria};
use crate::morphology::{Morphology, Section};
use crate::options::BuildOptions;
use crate::reticulum::{EndoplasmicReticulum, ReticulumEntry};
use crate::soma::Soma;
use crate::traversal::TreeTopology;
use crate::warning::{WarningKind, WarningLog};

/// One section of a [`MutableMorphology`].
#[derive(Clone, Debug, PartialEq)]
pub struct MutableSection {
    section_type: SectionType,
    points: PointLevel,
    parent: Option<SectionId>,
    children: Vec<SectionId>,
}

impl MutableSection {
    /// Structural type.
    pub fn section_type(&self) -> SectionType {
        self.section_type
    }

    /// Points with per-point attributes.
    pub fn points(&self) -> &PointLevel {
        &self.points
    }

    /// Parent section; `None` for roots.
    pub fn parent(&self) -> Option<SectionId> {
        self.parent
    }

    /// Child sections in stored order.
    pub fn children(&self) -> &[SectionId] {
        &self.children
    }

    /// True if the section has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Editable morphology.
///
/// Created empty or as a deep copy of a [`Morphology`]; ids of a copied
/// morphology are preserved. Traversal borrows the model, so edits cannot
/// happen while an iterator is live.
#[derive(Clone, Debug, Default)]
pub struct MutableMorphology {
    sections: Vec<Option<MutableSection>>,
    roots: Vec<SectionId>,
    soma: Soma,
    mitochondria: Mitochondria,
    reticulum: EndoplasmicReticulum,
    markers: Vec<Marker>,
}

impl MutableMorphology {
    /// Creates an empty morphology.
    pub fn new() -> Self {
        Self::default()
    }

    /// The soma.
    pub fn soma(&self) -> &Soma {
        &self.soma
    }

    /// Looks up a live section.
    pub fn section(&self, id: SectionId) -> Option<&MutableSection> {
        self.sections.get(id.0 as usize)?.as_ref()
    }

    /// Live section ids in id order.
    pub fn section_ids(&self) -> impl Iterator<Item = SectionId> + '_ {
        self.sections
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| SectionId(i as u32))
    }

    /// Number of live sections.
    pub fn len(&self) -> usize {
        self.sections.iter().flatten().count()
    }

    /// True if there are no live sections.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// The mitochondrial forest.
    pub fn mitochondria(&self) -> &Mitochondria {
        &self.mitochondria
    }

    /// Endoplasmic reticulum entries.
    pub fn endoplasmic_reticulum(&self) -> &EndoplasmicReticulum {
        &self.reticulum
    }

    /// Markers.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Adds a marker.
    pub fn push_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    // --- Section edits ---

    /// Appends a section under `parent`, or as a new root when `parent` is
    /// `None`. Returns the new section's id.
    ///
    /// Fails if `points` has fewer than 2 entries, its vectors disagree in
    /// length, `section_type` cannot label a neurite, or `parent` is not live.
    /// Perimeters must be present exactly when the existing points have them.
    pub fn append_section(
        &mut self,
        parent: Option<SectionId>,
        section_type: SectionType,
        points: PointLevel,
    ) -> MorphologyResult<SectionId> {
        check_section(section_type, &points)?;
        self.check_perimeters(&points, true)?;
        if let Some(p) = parent {
            self.get_section(p)?;
        }
        Ok(self.insert(parent, section_type, points))
    }

    /// Copies a section of a built morphology under `parent`, together with
    /// its subtree when `recursive`. Returns the id of the copied top section.
    pub fn append_section_from(
        &mut self,
        parent: Option<SectionId>,
        source: Section<'_>,
        recursive: bool,
    ) -> MorphologyResult<SectionId> {
        if let Some(p) = parent {
            self.get_section(p)?;
        }
        let subtree: Vec<Section<'_>> = if recursive {
            source.depth_first().collect()
        } else {
            vec![source]
        };
        for s in &subtree {
            let points = s.point_slice().to_level();
            check_section(s.section_type(), &points)?;
            self.check_perimeters(&points, true)?;
        }

        // Source ids map onto new ids; pre-order guarantees parents first.
        let mut copied: Vec<(SectionId, SectionId)> = Vec::with_capacity(subtree.len());
        for s in &subtree {
            let new_parent = if s.id() == source.id() {
                parent
            } else {
                s.parent()
                    .and_then(|p| copied.iter().find(|(old, _)| *old == p.id()))
                    .map(|&(_, new)| new)
            };
            let id = self.insert(new_parent, s.section_type(), s.point_slice().to_level());
            copied.push((s.id(), id));
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("mutable_append_from: {} sections", copied.len());
        Ok(copied.first().map_or(SectionId(0), |&(_, new)| new))
    }

    /// Deletes a section. With `recursive` its whole subtree goes too;
    /// otherwise a section with children is refused.
    ///
    /// Mitochondrial sections with a sample on a deleted section are removed
    /// (their children move up to the nearest surviving ancestor), as are
    /// reticulum entries of deleted sections. Returns the deleted section ids
    /// in depth-first order.
    pub fn delete_section(
        &mut self,
        id: SectionId,
        recursive: bool,
    ) -> MorphologyResult<Vec<SectionId>> {
        let section = self.get_section(id)?;
        if !recursive && !section.children.is_empty() {
            return Err(SectionBuilderError::HasChildren(id).into());
        }
        let parent = section.parent;
        let doomed: Vec<SectionId> = self.depth_first_from(id).collect();

        self.detach(id, parent);
        for d in &doomed {
            self.sections[d.0 as usize] = None;
        }
        let sections = &self.sections;
        let is_dead = |s: SectionId| sections.get(s.0 as usize).is_none_or(Option::is_none);
        let _mito = self.mitochondria.drop_referencing(is_dead);
        let _er = self.reticulum.drop_referencing(is_dead);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "mutable_delete: {id} ({} sections, {_mito} mitochondrial sections, {_er} reticulum entries)",
            doomed.len()
        );
        Ok(doomed)
    }

    /// Moves a section and its subtree under `new_parent`, or makes it a
    /// root when `new_parent` is `None`. The section becomes the last child.
    ///
    /// Fails if either id is not live or if `new_parent` lies in the
    /// section's own subtree.
    pub fn graft(&mut self, id: SectionId, new_parent: Option<SectionId>) -> MorphologyResult<()> {
        let old_parent = self.get_section(id)?.parent;
        if let Some(p) = new_parent {
            self.get_section(p)?;
            // A cycle exists if the new parent already descends from `id`.
            if self.is_descendant(p, id) {
                return Err(SectionBuilderError::WouldCreateCycle {
                    section: id,
                    new_parent: p,
                }
                .into());
            }
        }

        self.detach(id, old_parent);
        if let Some(section) = self.section_mut(id) {
            section.parent = new_parent;
        }
        match new_parent.and_then(|p| self.section_mut(p)) {
            Some(parent) => parent.children.push(id),
            None => self.roots.push(id),
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("mutable_graft: {id} -> {new_parent:?}");
        Ok(())
    }

    /// Replaces the soma wholesale. The point count is checked against
    /// `soma_type` at build time; perimeters must match the sections'.
    pub fn set_soma(&mut self, points: PointLevel, soma_type: SomaType) -> MorphologyResult<()> {
        points.validate()?;
        if !points.is_empty() {
            self.check_perimeters(&points, false)?;
        }
        self.soma = Soma::new(soma_type, points);
        Ok(())
    }

    // --- Organelle edits ---

    /// Appends a mitochondrial section under `parent` (or as a root).
    ///
    /// Every sample must reference a live section with an offset in `[0, 1]`.
    pub fn append_mito_section(
        &mut self,
        parent: Option<MitoSectionId>,
        points: MitoPointLevel,
    ) -> MorphologyResult<MitoSectionId> {
        let sections = &self.sections;
        self.mitochondria.append(parent, points, |s| {
            sections.get(s.0 as usize).is_some_and(Option::is_some)
        })
    }

    /// Deletes a mitochondrial section, and its subtree when `recursive`.
    pub fn delete_mito_section(
        &mut self,
        id: MitoSectionId,
        recursive: bool,
    ) -> MorphologyResult<Vec<MitoSectionId>> {
        Ok(self.mitochondria.delete(id, recursive)?)
    }

    /// Attaches a reticulum entry to a live section.
    pub fn append_reticulum(&mut self, entry: ReticulumEntry) -> MorphologyResult<()> {
        if !self.contains(entry.section) {
            return Err(RawDataError::DanglingReticulum {
                section: entry.section.index(),
            }
            .into());
        }
        self.reticulum.push(entry);
        Ok(())
    }

    // --- Build ---

    /// Validates the current state and freezes it into a new [`Morphology`].
    ///
    /// Section ids of the result are renumbered root-first in depth-first
    /// order. Fails with the same classified errors a fresh load would.
    pub fn build(&self, options: &BuildOptions) -> MorphologyResult<Morphology> {
        let mut log = WarningLog::new(options.max_warnings, &options.ignored_warnings);
        self.soma.check_type()?;
        if !self.soma.is_conform_three_point() {
            log.push(
                WarningKind::SomaNonConform,
                "three-point soma side points are not at center ± radius along y",
                None,
            );
        }
        let morphology = builder::assemble(self.to_raw_tree(), options, log)?;
        #[cfg(feature = "tracing")]
        tracing::debug!("mutable_build: {} sections", morphology.len());
        Ok(morphology)
    }

    /// Lays the arena out as a raw tree indexed by live-section rank.
    fn to_raw_tree(&self) -> RawTree {
        let mut rank: Vec<Option<usize>> = vec![None; self.sections.len()];
        for (n, id) in self.section_ids().enumerate() {
            rank[id.0 as usize] = Some(n);
        }
        let to_index = |id: SectionId| rank.get(id.0 as usize).copied().flatten();
        let to_raw_ref = |id: SectionId| to_index(id).map_or(u32::MAX, |i| i as u32);

        let sections = self
            .sections
            .iter()
            .flatten()
            .map(|s| RawSection {
                section_type: s.section_type,
                points: s.points.clone(),
                parent: s.parent.and_then(to_index),
                children: s.children.iter().filter_map(|&c| to_index(c)).collect(),
                line: None,
                first_id: None,
            })
            .collect();

        let tree_count = if self.soma.is_empty() {
            self.roots.len()
        } else {
            1
        };
        RawTree {
            sections,
            roots: self.roots.iter().filter_map(|&r| to_index(r)).collect(),
            soma: self.soma.clone(),
            tree_count,
            mitochondria: self.mitochondria.to_raw(to_raw_ref),
            reticulum: self.reticulum.to_raw(to_raw_ref),
            refs: SectionRefs::Index,
            markers: self.markers.clone(),
            annotations: Vec::new(),
        }
    }

    // --- Internal helpers ---

    fn get_section(&self, id: SectionId) -> Result<&MutableSection, SectionBuilderError> {
        self.section(id)
            .ok_or(SectionBuilderError::UnknownSection(id))
    }

    fn section_mut(&mut self, id: SectionId) -> Option<&mut MutableSection> {
        self.sections.get_mut(id.0 as usize)?.as_mut()
    }

    /// Perimeters are all-or-nothing across soma and sections. The first
    /// live section, or the soma when `with_soma`, sets the expectation.
    fn check_perimeters(
        &self,
        points: &PointLevel,
        with_soma: bool,
    ) -> Result<(), SectionBuilderError> {
        let existing = self
            .sections
            .iter()
            .flatten()
            .next()
            .map(|s| s.points.has_perimeters())
            .or_else(|| {
                (with_soma && !self.soma.is_empty())
                    .then(|| self.soma.point_level().has_perimeters())
            });
        match existing {
            Some(expected) if expected != points.has_perimeters() => {
                Err(SectionBuilderError::PerimeterMismatch {
                    perimeters: points.has_perimeters(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Inserts a checked section into the next free slot.
    fn insert(
        &mut self,
        parent: Option<SectionId>,
        section_type: SectionType,
        points: PointLevel,
    ) -> SectionId {
        let id = SectionId(self.sections.len() as u32);
        self.sections.push(Some(MutableSection {
            section_type,
            points,
            parent,
            children: Vec::new(),
        }));
        match parent.and_then(|p| self.section_mut(p)) {
            Some(p) => p.children.push(id),
            None => self.roots.push(id),
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("mutable_append: {id} under {parent:?}");
        id
    }

    /// Removes `id` from its parent's child list or from the root list.
    fn detach(&mut self, id: SectionId, parent: Option<SectionId>) {
        let list = match parent {
            Some(p) => match self.section_mut(p) {
                Some(section) => &mut section.children,
                None => return,
            },
            None => &mut self.roots,
        };
        list.retain(|&c| c != id);
    }
}

fn check_section(section_type: SectionType, points: &PointLevel) -> MorphologyResult<()> {
    if !section_type.is_neurite() {
        return Err(SectionBuilderError::InvalidSectionType(section_type).into());
    }
    points.validate()?;
    if points.len() < 2 {
        return Err(SectionBuilderError::TooFewPoints {
            count: points.len(),
        }
        .into());
    }
    Ok(())
}

impl From<&Morphology> for MutableMorphology {
    /// Deep copy; section and mitochondrial ids are preserved.
    fn from(morphology: &Morphology) -> Self {
        let sections = morphology
            .sections()
            .map(|s| {
                Some(MutableSection {
                    section_type: s.section_type(),
                    points: s.point_slice().to_level(),
                    parent: s.parent().map(|p| p.id()),
                    children: s.children().map(|c| c.id()).collect(),
                })
            })
            .collect();
        Self {
            sections,
            roots: morphology.root_ids().to_vec(),
            soma: morphology.soma().clone(),
            mitochondria: morphology.mitochondria().clone(),
            reticulum: morphology.endoplasmic_reticulum().clone(),
            markers: morphology.markers().to_vec(),
        }
    }
}

impl TreeTopology for MutableMorphology {
    type Id = SectionId;

    fn root_ids(&self) -> &[SectionId] {
        &self.roots
    }

    fn children_of(&self, id: SectionId) -> &[SectionId] {
        self.section(id).map_or(&[][..], |s| s.children.as_slice())
    }

    fn parent_of(&self, id: SectionId) -> Option<SectionId> {
        self.section(id)?.parent
    }

    fn contains(&self, id: SectionId) -> bool {
        self.section(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MorphologyError;
    use crate::geometry::Point;

    fn line(x0: f32, x1: f32) -> PointLevel {
        PointLevel::new(
            vec![Point::new(x0, 0.0, 0.0), Point::new(x1, 0.0, 0.0)],
            vec![1.0, 1.0],
        )
    }

    /// root(0) -> a(1) -> b(2); root -> c(3)
    fn sample() -> MutableMorphology {
        let mut m = MutableMorphology::new();
        let root = m.append_section(None, SectionType::Axon, line(0.0, 1.0)).unwrap();
        let a = m.append_section(Some(root), SectionType::Axon, line(1.0, 2.0)).unwrap();
        m.append_section(Some(a), SectionType::Axon, line(2.0, 3.0)).unwrap();
        m.append_section(Some(root), SectionType::Axon, line(1.0, 5.0)).unwrap();
        m
    }

    #[test]
    fn test_append_checks() {
        let mut m = sample();
        let single = PointLevel::new(vec![Point::default()], vec![1.0]);
        assert_eq!(
            m.append_section(None, SectionType::Axon, single),
            Err(MorphologyError::SectionBuilder(SectionBuilderError::TooFewPoints { count: 1 }))
        );
        assert_eq!(
            m.append_section(Some(SectionId(42)), SectionType::Axon, line(0.0, 1.0)),
            Err(MorphologyError::SectionBuilder(SectionBuilderError::UnknownSection(
                SectionId(42)
            )))
        );
        assert!(matches!(
            m.append_section(None, SectionType::Soma, line(0.0, 1.0)),
            Err(MorphologyError::SectionBuilder(
                SectionBuilderError::InvalidSectionType(SectionType::Soma)
            ))
        ));
        assert_eq!(m.len(), 4);
    }

    #[test]
    fn test_delete_requires_recursive_for_subtrees() {
        let mut m = sample();
        assert_eq!(
            m.delete_section(SectionId(1), false),
            Err(MorphologyError::SectionBuilder(SectionBuilderError::HasChildren(
                SectionId(1)
            )))
        );
        assert_eq!(m.len(), 4);
        let deleted = m.delete_section(SectionId(1), true).unwrap();
        assert_eq!(deleted, vec![SectionId(1), SectionId(2)]);
        assert_eq!(m.children_of(SectionId(0)), &[SectionId(3)]);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut m = sample();
        m.delete_section(SectionId(3), false).unwrap();
        let id = m.append_section(None, SectionType::Axon, line(9.0, 10.0)).unwrap();
        assert_eq!(id, SectionId(4));
        assert!(m.section(SectionId(3)).is_none());
    }

    #[test]
    fn test_graft_rejects_cycles() {
        let mut m = sample();
        let before = m.clone().sections;
        assert_eq!(
            m.graft(SectionId(1), Some(SectionId(2))),
            Err(MorphologyError::SectionBuilder(SectionBuilderError::WouldCreateCycle {
                section: SectionId(1),
                new_parent: SectionId(2),
            }))
        );
        assert!(m.graft(SectionId(1), Some(SectionId(1))).is_err());
        assert_eq!(m.sections, before);

        m.graft(SectionId(2), Some(SectionId(3))).unwrap();
        assert_eq!(m.parent_of(SectionId(2)), Some(SectionId(3)));
        assert!(m.children_of(SectionId(1)).is_empty());

        m.graft(SectionId(1), None).unwrap();
        assert_eq!(m.root_ids(), &[SectionId(0), SectionId(1)]);
    }

    #[test]
    fn test_delete_cascades_to_organelles() {
        let mut m = sample();
        let on_b = MitoPointLevel::new(vec![SectionId(2)], vec![0.5], vec![0.1]);
        let on_root = MitoPointLevel::new(vec![SectionId(0)], vec![0.5], vec![0.1]);
        let top = m.append_mito_section(None, on_root.clone()).unwrap();
        let mid = m.append_mito_section(Some(top), on_b).unwrap();
        let leaf = m.append_mito_section(Some(mid), on_root).unwrap();
        m.append_reticulum(ReticulumEntry {
            section: SectionId(2),
            volume: 1.0,
            surface_area: 1.0,
            filament_count: 1,
        })
        .unwrap();

        m.delete_section(SectionId(1), true).unwrap();
        assert_eq!(m.mitochondria().len(), 2);
        assert_eq!(m.mitochondria().parent_of(leaf), Some(top));
        assert!(m.endoplasmic_reticulum().is_empty());
    }

    #[test]
    fn test_append_mito_rejects_dead_sections() {
        let mut m = sample();
        let points = MitoPointLevel::new(vec![SectionId(7)], vec![0.5], vec![0.1]);
        assert!(matches!(
            m.append_mito_section(None, points),
            Err(MorphologyError::RawData(RawDataError::DanglingMitochondrion { .. }))
        ));
    }

    #[test]
    fn test_build_renumbers_depth_first() {
        let mut m = sample();
        m.delete_section(SectionId(2), false).unwrap();
        let built = m.build(&BuildOptions::default()).unwrap();
        assert_eq!(built.len(), 3);
        let order: Vec<_> = built.depth_first().collect();
        assert_eq!(order, vec![SectionId(0), SectionId(1), SectionId(2)]);
    }

    #[test]
    fn test_perimeters_are_all_or_nothing() {
        let with_perimeters = || line(0.0, 1.0).with_perimeters(vec![2.0, 2.0]);
        let mut m = MutableMorphology::new();
        let root = m
            .append_section(None, SectionType::Axon, with_perimeters())
            .unwrap();

        let err = m
            .append_section(Some(root), SectionType::Axon, line(1.0, 2.0))
            .unwrap_err();
        assert_eq!(
            err,
            MorphologyError::SectionBuilder(SectionBuilderError::PerimeterMismatch {
                perimeters: false
            })
        );
        assert_eq!(m.len(), 1);

        let plain_soma = PointLevel::new(vec![Point::default()], vec![2.0]);
        assert!(m.set_soma(plain_soma, SomaType::SinglePoint).is_err());
        assert!(m.soma().is_empty());

        m.delete_section(root, false).unwrap();
        let soma = PointLevel::new(vec![Point::default()], vec![2.0]).with_perimeters(vec![6.0]);
        m.set_soma(soma, SomaType::SinglePoint).unwrap();
        assert!(m.append_section(None, SectionType::Axon, line(0.0, 1.0)).is_err());
        m.append_section(None, SectionType::Axon, with_perimeters()).unwrap();
        let built = m.build(&BuildOptions::default()).unwrap();
        assert_eq!(built.perimeters(), &[2.0, 2.0]);
    }
}
