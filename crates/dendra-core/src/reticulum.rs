//! Endoplasmic reticulum: per-section scalar measurements.

use crate::error::RawDataError;
use crate::geometry::SectionId;
use crate::record::RawReticulum;

/// Reticulum measurements attached to one neurite section.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReticulumEntry {
    /// The neurite section.
    pub section: SectionId,
    /// Volume.
    pub volume: f32,
    /// Surface area.
    pub surface_area: f32,
    /// Number of filaments.
    pub filament_count: u32,
}

/// All reticulum entries of a morphology, in input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EndoplasmicReticulum {
    entries: Vec<ReticulumEntry>,
}

impl EndoplasmicReticulum {
    /// Entries in input order.
    pub fn entries(&self) -> &[ReticulumEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries attached to `section`.
    pub fn for_section(&self, section: SectionId) -> impl Iterator<Item = &ReticulumEntry> {
        self.entries.iter().filter(move |e| e.section == section)
    }

    pub(crate) fn from_raw(
        raw: &[RawReticulum],
        resolve: impl Fn(u32) -> Option<SectionId>,
    ) -> Result<Self, RawDataError> {
        let mut entries = Vec::with_capacity(raw.len());
        for r in raw {
            let section = resolve(r.section)
                .ok_or(RawDataError::DanglingReticulum { section: r.section })?;
            entries.push(ReticulumEntry {
                section,
                volume: r.volume,
                surface_area: r.surface_area,
                filament_count: r.filament_count,
            });
        }
        Ok(Self { entries })
    }

    pub(crate) fn to_raw(&self, map: impl Fn(SectionId) -> u32) -> Vec<RawReticulum> {
        self.entries
            .iter()
            .map(|e| RawReticulum {
                section: map(e.section),
                volume: e.volume,
                surface_area: e.surface_area,
                filament_count: e.filament_count,
            })
            .collect()
    }

    pub(crate) fn push(&mut self, entry: ReticulumEntry) {
        self.entries.push(entry);
    }

    /// Drops entries of dead sections and returns how many were removed.
    pub(crate) fn drop_referencing(&mut self, is_dead: impl Fn(SectionId) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !is_dead(e.section));
        before - self.entries.len()
    }
}
