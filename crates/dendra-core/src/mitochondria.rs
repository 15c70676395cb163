//! Mitochondrial forest.
//!
//! Mitochondrial sections form their own forest. Each sample points into the
//! neurite forest through a `(section id, relative offset)` pair instead of
//! being owned by a neurite section. References are checked whenever the
//! forest is built or extended, never at query time.

use std::collections::HashMap;

use crate::builder::find_cycle;
use crate::error::{MorphologyResult, RawDataError, SectionBuilderError};
use crate::geometry::{MitoSectionId, SectionId};
use crate::record::RawMitoSection;
use crate::traversal::TreeTopology;

/// Parallel sample vectors of one mitochondrial section.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MitoPointLevel {
    /// Neurite section of each sample.
    pub section_ids: Vec<SectionId>,
    /// Relative position along the neurite section, in `[0, 1]`.
    pub relative_path_lengths: Vec<f32>,
    /// Mitochondrial diameter at each sample.
    pub diameters: Vec<f32>,
}

impl MitoPointLevel {
    /// Creates a point level from its three parallel vectors.
    pub fn new(
        section_ids: Vec<SectionId>,
        relative_path_lengths: Vec<f32>,
        diameters: Vec<f32>,
    ) -> Self {
        Self {
            section_ids,
            relative_path_lengths,
            diameters,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.section_ids.len()
    }

    /// True if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.section_ids.is_empty()
    }

    /// Checks lengths, offsets, and that every referenced section is live.
    pub(crate) fn validate(
        &self,
        mito: u32,
        is_live: impl Fn(SectionId) -> bool,
    ) -> Result<(), RawDataError> {
        check_lengths(
            self.section_ids.len(),
            self.relative_path_lengths.len(),
            self.diameters.len(),
        )?;
        if self.is_empty() {
            return Err(RawDataError::EmptyMitoSection { mito });
        }
        if let Some(&offset) = self
            .relative_path_lengths
            .iter()
            .find(|o| !(0.0..=1.0).contains(*o))
        {
            return Err(RawDataError::OffsetOutOfRange { mito, offset });
        }
        if let Some(section) = self.section_ids.iter().find(|&&s| !is_live(s)) {
            return Err(RawDataError::DanglingMitochondrion {
                mito,
                section: section.index(),
            });
        }
        Ok(())
    }
}

fn check_lengths(ids: usize, offsets: usize, diameters: usize) -> Result<(), RawDataError> {
    if ids != offsets {
        return Err(RawDataError::VectorLengthMismatch {
            first: "neurite section ids",
            first_len: ids,
            second: "relative path lengths",
            second_len: offsets,
        });
    }
    if ids != diameters {
        return Err(RawDataError::VectorLengthMismatch {
            first: "neurite section ids",
            first_len: ids,
            second: "diameters",
            second_len: diameters,
        });
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq)]
struct MitoNode {
    points: MitoPointLevel,
    parent: Option<MitoSectionId>,
    children: Vec<MitoSectionId>,
}

/// Forest of mitochondrial sections.
///
/// In a built [`Morphology`](crate::Morphology) ids are contiguous from 0 in
/// depth-first order. Inside a [`MutableMorphology`](crate::MutableMorphology)
/// deleted ids stay vacant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mitochondria {
    nodes: Vec<Option<MitoNode>>,
    roots: Vec<MitoSectionId>,
}

impl Mitochondria {
    /// True if there are no mitochondrial sections.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of live mitochondrial sections.
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Root mitochondrial sections.
    pub fn root_sections(&self) -> impl Iterator<Item = MitoSection<'_>> {
        self.roots.iter().filter_map(|&id| MitoSection::new(self, id))
    }

    /// Looks up a mitochondrial section.
    pub fn section(&self, id: MitoSectionId) -> Option<MitoSection<'_>> {
        MitoSection::new(self, id)
    }

    /// All live mitochondrial sections in id order.
    pub fn sections(&self) -> impl Iterator<Item = MitoSection<'_>> {
        self.nodes.iter().enumerate().filter_map(|(i, n)| {
            Some(MitoSection {
                mito: self,
                id: MitoSectionId(i as u32),
                node: n.as_ref()?,
            })
        })
    }

    /// True if any sample references `section`.
    pub fn references(&self, section: SectionId) -> bool {
        self.nodes
            .iter()
            .flatten()
            .any(|n| n.points.section_ids.contains(&section))
    }

    fn node(&self, id: MitoSectionId) -> Option<&MitoNode> {
        self.nodes.get(id.0 as usize)?.as_ref()
    }

    fn node_mut(&mut self, id: MitoSectionId) -> Option<&mut MitoNode> {
        self.nodes.get_mut(id.0 as usize)?.as_mut()
    }

    /// Resolves raw mitochondrial sections. `resolve` maps a raw neurite
    /// reference to a live section id, or `None` when it dangles. New ids are
    /// assigned in depth-first order, roots and children in input order.
    pub(crate) fn from_raw(
        raw: &[RawMitoSection],
        resolve: impl Fn(u32) -> Option<SectionId>,
    ) -> Result<Self, RawDataError> {
        let mut index: HashMap<u32, usize> = HashMap::with_capacity(raw.len());
        for (i, section) in raw.iter().enumerate() {
            if index.insert(section.id, i).is_some() {
                return Err(RawDataError::DuplicateMitoId { id: section.id });
            }
        }

        let mut parents = Vec::with_capacity(raw.len());
        for section in raw {
            let parent = match section.parent {
                Some(p) => Some(*index.get(&p).ok_or(RawDataError::MissingMitoParent {
                    id: section.id,
                    parent: p,
                })?),
                None => None,
            };
            parents.push(parent);
        }
        if let Some(i) = find_cycle(&parents) {
            return Err(RawDataError::MitoCycle { id: raw[i].id });
        }

        let mut levels = Vec::with_capacity(raw.len());
        for section in raw {
            check_lengths(
                section.neurite_sections.len(),
                section.relative_path_lengths.len(),
                section.diameters.len(),
            )?;
            let mut ids = Vec::with_capacity(section.neurite_sections.len());
            for &s in &section.neurite_sections {
                ids.push(resolve(s).ok_or(RawDataError::DanglingMitochondrion {
                    mito: section.id,
                    section: s,
                })?);
            }
            let level = MitoPointLevel::new(
                ids,
                section.relative_path_lengths.clone(),
                section.diameters.clone(),
            );
            level.validate(section.id, |_| true)?;
            levels.push(level);
        }

        let mut children = vec![Vec::new(); raw.len()];
        let mut roots = Vec::new();
        for (i, parent) in parents.iter().enumerate() {
            match parent {
                Some(p) => children[*p].push(i),
                None => roots.push(i),
            }
        }

        // Depth-first renumbering.
        let mut order = Vec::with_capacity(raw.len());
        let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
        while let Some(i) = stack.pop() {
            order.push(i);
            stack.extend(children[i].iter().rev().copied());
        }
        let mut new_id = vec![MitoSectionId(0); raw.len()];
        for (n, &i) in order.iter().enumerate() {
            new_id[i] = MitoSectionId(n as u32);
        }

        let mut levels: Vec<Option<MitoPointLevel>> = levels.into_iter().map(Some).collect();
        let mut nodes = Vec::with_capacity(order.len());
        for &i in &order {
            nodes.push(Some(MitoNode {
                points: levels[i].take().unwrap_or_default(),
                parent: parents[i].map(|p| new_id[p]),
                children: children[i].iter().map(|&c| new_id[c]).collect(),
            }));
        }
        Ok(Self {
            nodes,
            roots: roots.iter().map(|&r| new_id[r]).collect(),
        })
    }

    /// Emits raw sections in depth-first order with ids from 0. `map`
    /// translates neurite references.
    pub(crate) fn to_raw(&self, map: impl Fn(SectionId) -> u32) -> Vec<RawMitoSection> {
        let order: Vec<MitoSectionId> = self.depth_first().collect();
        let position: HashMap<MitoSectionId, u32> = order
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i as u32))
            .collect();
        order
            .iter()
            .enumerate()
            .filter_map(|(i, &id)| {
                let node = self.node(id)?;
                Some(RawMitoSection {
                    id: i as u32,
                    parent: node.parent.and_then(|p| position.get(&p).copied()),
                    neurite_sections: node.points.section_ids.iter().map(|&s| map(s)).collect(),
                    relative_path_lengths: node.points.relative_path_lengths.clone(),
                    diameters: node.points.diameters.clone(),
                })
            })
            .collect()
    }

    /// Appends a section under `parent` (or as a root).
    pub(crate) fn append(
        &mut self,
        parent: Option<MitoSectionId>,
        points: MitoPointLevel,
        is_live: impl Fn(SectionId) -> bool,
    ) -> MorphologyResult<MitoSectionId> {
        if let Some(p) = parent
            && !self.contains(p)
        {
            return Err(SectionBuilderError::UnknownMitoSection(p).into());
        }
        let id = MitoSectionId(self.nodes.len() as u32);
        points.validate(id.0, is_live)?;
        self.nodes.push(Some(MitoNode {
            points,
            parent,
            children: Vec::new(),
        }));
        match parent.and_then(|p| self.node_mut(p)) {
            Some(node) => node.children.push(id),
            None => self.roots.push(id),
        }
        Ok(id)
    }

    /// Deletes a section, and its subtree when `recursive`. Returns the
    /// removed ids in depth-first order.
    pub(crate) fn delete(
        &mut self,
        id: MitoSectionId,
        recursive: bool,
    ) -> Result<Vec<MitoSectionId>, SectionBuilderError> {
        let node = self
            .node(id)
            .ok_or(SectionBuilderError::UnknownMitoSection(id))?;
        if !recursive && !node.children.is_empty() {
            return Err(SectionBuilderError::MitoHasChildren(id));
        }
        let parent = node.parent;
        let doomed: Vec<MitoSectionId> = self.depth_first_from(id).collect();
        self.unlink(id, parent, &[]);
        for d in &doomed {
            self.nodes[d.0 as usize] = None;
        }
        Ok(doomed)
    }

    /// Removes every section with a sample in a dead neurite section. Their
    /// children move up to the nearest surviving ancestor.
    pub(crate) fn drop_referencing(&mut self, is_dead: impl Fn(SectionId) -> bool) -> usize {
        let doomed: Vec<MitoSectionId> = self
            .depth_first()
            .filter(|&id| {
                self.node(id)
                    .is_some_and(|n| n.points.section_ids.iter().any(|&s| is_dead(s)))
            })
            .collect();
        for &id in &doomed {
            let Some(node) = self.node(id) else { continue };
            let parent = node.parent;
            let children = node.children.clone();
            for &c in &children {
                if let Some(child) = self.node_mut(c) {
                    child.parent = parent;
                }
            }
            self.unlink(id, parent, &children);
            self.nodes[id.0 as usize] = None;
        }
        doomed.len()
    }

    /// Replaces `id` in its parent's child list (or the root list) by
    /// `replacement`, keeping its position.
    fn unlink(
        &mut self,
        id: MitoSectionId,
        parent: Option<MitoSectionId>,
        replacement: &[MitoSectionId],
    ) {
        let list = match parent {
            Some(p) => match self.node_mut(p) {
                Some(node) => &mut node.children,
                None => return,
            },
            None => &mut self.roots,
        };
        if let Some(pos) = list.iter().position(|&c| c == id) {
            list.splice(pos..=pos, replacement.iter().copied());
        }
    }
}

impl TreeTopology for Mitochondria {
    type Id = MitoSectionId;

    fn root_ids(&self) -> &[MitoSectionId] {
        &self.roots
    }

    fn children_of(&self, id: MitoSectionId) -> &[MitoSectionId] {
        self.node(id).map_or(&[][..], |n| n.children.as_slice())
    }

    fn parent_of(&self, id: MitoSectionId) -> Option<MitoSectionId> {
        self.node(id)?.parent
    }

    fn contains(&self, id: MitoSectionId) -> bool {
        self.node(id).is_some()
    }
}

/// Read-only view of one mitochondrial section.
#[derive(Clone, Copy)]
pub struct MitoSection<'a> {
    mito: &'a Mitochondria,
    id: MitoSectionId,
    node: &'a MitoNode,
}

impl<'a> MitoSection<'a> {
    fn new(mito: &'a Mitochondria, id: MitoSectionId) -> Option<Self> {
        Some(Self {
            mito,
            id,
            node: mito.node(id)?,
        })
    }

    fn node(&self) -> &'a MitoNode {
        self.node
    }

    /// Section id.
    pub fn id(&self) -> MitoSectionId {
        self.id
    }

    /// All samples.
    pub fn points(&self) -> &'a MitoPointLevel {
        &self.node().points
    }

    /// Neurite section of each sample.
    pub fn neurite_section_ids(&self) -> &'a [SectionId] {
        &self.node().points.section_ids
    }

    /// Relative offsets along the neurite sections.
    pub fn relative_path_lengths(&self) -> &'a [f32] {
        &self.node().points.relative_path_lengths
    }

    /// Diameters.
    pub fn diameters(&self) -> &'a [f32] {
        &self.node().points.diameters
    }

    /// Parent section.
    pub fn parent(&self) -> Option<MitoSection<'a>> {
        self.node.parent.and_then(|id| MitoSection::new(self.mito, id))
    }

    /// Child sections in stored order.
    pub fn children(&self) -> impl Iterator<Item = MitoSection<'a>> + 'a {
        let mito = self.mito;
        self.node
            .children
            .iter()
            .filter_map(move |&id| MitoSection::new(mito, id))
    }

    /// True if the section has no parent.
    pub fn is_root(&self) -> bool {
        self.node().parent.is_none()
    }
}

impl core::fmt::Debug for MitoSection<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MitoSection")
            .field("id", &self.id)
            .field("points", self.points())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: u32, parent: Option<u32>, section: u32) -> RawMitoSection {
        RawMitoSection {
            id,
            parent,
            neurite_sections: vec![section, section],
            relative_path_lengths: vec![0.25, 0.75],
            diameters: vec![0.1, 0.1],
        }
    }

    fn live(n: u32) -> impl Fn(u32) -> Option<SectionId> {
        move |s| (s < n).then_some(SectionId(s))
    }

    #[test]
    fn test_from_raw_renumbers_depth_first() {
        // Input order: child before parent, ids not contiguous.
        let sections = [raw(10, Some(20), 1), raw(20, None, 0), raw(30, Some(20), 1)];
        let mito = Mitochondria::from_raw(&sections, live(2)).unwrap();
        assert_eq!(mito.len(), 3);
        let root = mito.root_sections().next().unwrap();
        assert_eq!(root.id(), MitoSectionId(0));
        assert_eq!(root.neurite_section_ids(), &[SectionId(0), SectionId(0)]);
        let kids: Vec<_> = root.children().map(|c| c.id()).collect();
        assert_eq!(kids, vec![MitoSectionId(1), MitoSectionId(2)]);
    }

    #[test]
    fn test_from_raw_errors() {
        let dup = [raw(1, None, 0), raw(1, None, 0)];
        assert_eq!(
            Mitochondria::from_raw(&dup, live(1)),
            Err(RawDataError::DuplicateMitoId { id: 1 })
        );

        let missing = [raw(1, Some(9), 0)];
        assert_eq!(
            Mitochondria::from_raw(&missing, live(1)),
            Err(RawDataError::MissingMitoParent { id: 1, parent: 9 })
        );

        let cycle = [raw(1, Some(2), 0), raw(2, Some(1), 0)];
        assert!(matches!(
            Mitochondria::from_raw(&cycle, live(1)),
            Err(RawDataError::MitoCycle { .. })
        ));

        let dangling = [raw(1, None, 5)];
        assert_eq!(
            Mitochondria::from_raw(&dangling, live(1)),
            Err(RawDataError::DanglingMitochondrion { mito: 1, section: 5 })
        );

        let mut out_of_range = raw(1, None, 0);
        out_of_range.relative_path_lengths[1] = 1.5;
        assert_eq!(
            Mitochondria::from_raw(&[out_of_range], live(1)),
            Err(RawDataError::OffsetOutOfRange { mito: 1, offset: 1.5 })
        );
    }

    #[test]
    fn test_drop_referencing_reattaches_children() {
        let sections = [raw(0, None, 0), raw(1, Some(0), 1), raw(2, Some(1), 0)];
        let mut mito = Mitochondria::from_raw(&sections, live(2)).unwrap();
        let dropped = mito.drop_referencing(|s| s == SectionId(1));
        assert_eq!(dropped, 1);
        assert_eq!(mito.len(), 2);
        assert_eq!(mito.children_of(MitoSectionId(0)), &[MitoSectionId(2)]);
        assert_eq!(mito.parent_of(MitoSectionId(2)), Some(MitoSectionId(0)));
        assert!(!mito.references(SectionId(1)));
    }

    #[test]
    fn test_append_and_delete() {
        let mut mito = Mitochondria::default();
        let points = MitoPointLevel::new(vec![SectionId(0)], vec![0.5], vec![0.2]);
        let root = mito.append(None, points.clone(), |s| s == SectionId(0)).unwrap();
        let child = mito.append(Some(root), points.clone(), |_| true).unwrap();
        assert!(mito.append(Some(MitoSectionId(9)), points, |_| true).is_err());

        assert_eq!(
            mito.delete(root, false),
            Err(SectionBuilderError::MitoHasChildren(root))
        );
        assert_eq!(mito.delete(root, true).unwrap(), vec![root, child]);
        assert!(mito.is_empty());
    }
}
