//! Raw Record Stream: the flat, per-point input produced by format codecs.
//!
//! Records may arrive in any order; parent references are resolved by the
//! builder. Mitochondria, endoplasmic reticulum, and markers ride along with
//! the point records.

use crate::annotation::Marker;
use crate::geometry::{Point, Sample, SectionType, SomaType};

/// One sample of the raw stream.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Record {
    /// Stream-local point id.
    pub id: u32,
    /// Position.
    pub point: Point,
    /// Diameter.
    pub diameter: f32,
    /// Optional perimeter.
    pub perimeter: Option<f32>,
    /// Structural type tag.
    pub section_type: SectionType,
    /// Parent point id; `None` marks a root.
    pub parent: Option<u32>,
    /// Source line, for diagnostics.
    pub line: Option<usize>,
}

impl Record {
    /// Creates a record without perimeter or line information.
    pub fn new(
        id: u32,
        section_type: SectionType,
        point: Point,
        diameter: f32,
        parent: Option<u32>,
    ) -> Self {
        Self {
            id,
            point,
            diameter,
            perimeter: None,
            section_type,
            parent,
            line: None,
        }
    }

    /// Attaches a perimeter.
    pub fn with_perimeter(mut self, perimeter: f32) -> Self {
        self.perimeter = Some(perimeter);
        self
    }

    /// Attaches a source line.
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// The record's sample (position and per-point attributes).
    pub fn sample(&self) -> Sample {
        Sample {
            point: self.point,
            diameter: self.diameter,
            perimeter: self.perimeter,
        }
    }
}

/// A mitochondrial section as supplied by a codec.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawMitoSection {
    /// Stream-local id.
    pub id: u32,
    /// Parent mitochondrial section id.
    pub parent: Option<u32>,
    /// Final neurite section id of each sample.
    pub neurite_sections: Vec<u32>,
    /// Relative position of each sample along its neurite section, in `[0, 1]`.
    pub relative_path_lengths: Vec<f32>,
    /// Diameter of each sample.
    pub diameters: Vec<f32>,
}

/// An endoplasmic reticulum entry as supplied by a codec.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawReticulum {
    /// Final neurite section id.
    pub section: u32,
    /// Volume.
    pub volume: f32,
    /// Surface area.
    pub surface_area: f32,
    /// Number of filaments.
    pub filament_count: u32,
}

/// Ordered sequence of records plus sub-cellular payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordStream {
    records: Vec<Record>,
    soma_type: Option<SomaType>,
    mitochondria: Vec<RawMitoSection>,
    reticulum: Vec<RawReticulum>,
    markers: Vec<Marker>,
}

impl RecordStream {
    /// Creates an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the soma type. Without a declaration the builder infers it.
    pub fn with_soma_type(mut self, soma_type: SomaType) -> Self {
        self.soma_type = Some(soma_type);
        self
    }

    /// Appends a record.
    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Appends a record, builder style.
    pub fn with_record(mut self, record: Record) -> Self {
        self.records.push(record);
        self
    }

    /// Appends a mitochondrial section.
    pub fn push_mito_section(&mut self, section: RawMitoSection) {
        self.mitochondria.push(section);
    }

    /// Appends an endoplasmic reticulum entry.
    pub fn push_reticulum(&mut self, entry: RawReticulum) {
        self.reticulum.push(entry);
    }

    /// Appends a marker.
    pub fn push_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    /// Point records in stream order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Declared soma type, if any.
    pub fn soma_type(&self) -> Option<SomaType> {
        self.soma_type
    }

    /// Mitochondrial sections.
    pub fn mitochondria(&self) -> &[RawMitoSection] {
        &self.mitochondria
    }

    /// Endoplasmic reticulum entries.
    pub fn reticulum(&self) -> &[RawReticulum] {
        &self.reticulum
    }

    /// Markers.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Number of point records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if there are no point records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<Record> for RecordStream {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl Extend<Record> for RecordStream {
    fn extend<I: IntoIterator<Item = Record>>(&mut self, iter: I) {
        self.records.extend(iter);
    }
}
