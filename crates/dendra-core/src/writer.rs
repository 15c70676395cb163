//! Re-serialization boundary.
//!
//! [`to_record_stream`] turns either model back into a [`RecordStream`]:
//! soma records first, then one depth-first pass over the sections with
//! point ids contiguous from 1. [`export`] additionally checks what a target
//! [`FileFormat`] can represent, dropping unsupported payload with a warning
//! or failing with a [`WriterError`]. Byte-level codecs live outside this
//! crate and consume the resulting stream.

use std::collections::HashMap;
use std::path::Path;

use crate::annotation::Marker;
use crate::error::{MorphologyError, MorphologyResult, WriterError};
use crate::geometry::{PointSlice, SectionId, SectionType, SomaType};
use crate::mitochondria::Mitochondria;
use crate::morphology::Morphology;
use crate::mutable::MutableMorphology;
use crate::record::{Record, RecordStream};
use crate::reticulum::EndoplasmicReticulum;
use crate::soma::Soma;
use crate::traversal::TreeTopology;
use crate::warning::{WarningKind, WarningLog};

/// Read access a writer needs, implemented by both models.
pub trait MorphologyView: TreeTopology<Id = SectionId> {
    /// The soma.
    fn soma(&self) -> &Soma;

    /// Type of a live section.
    fn section_type(&self, id: SectionId) -> Option<SectionType>;

    /// Points of a live section.
    fn section_points(&self, id: SectionId) -> Option<PointSlice<'_>>;

    /// The mitochondrial forest.
    fn mitochondria(&self) -> &Mitochondria;

    /// Endoplasmic reticulum entries.
    fn endoplasmic_reticulum(&self) -> &EndoplasmicReticulum;

    /// Markers.
    fn markers(&self) -> &[Marker];
}

impl MorphologyView for Morphology {
    fn soma(&self) -> &Soma {
        Morphology::soma(self)
    }

    fn section_type(&self, id: SectionId) -> Option<SectionType> {
        self.section(id).map(|s| s.section_type())
    }

    fn section_points(&self, id: SectionId) -> Option<PointSlice<'_>> {
        self.section(id).map(|s| s.point_slice())
    }

    fn mitochondria(&self) -> &Mitochondria {
        Morphology::mitochondria(self)
    }

    fn endoplasmic_reticulum(&self) -> &EndoplasmicReticulum {
        Morphology::endoplasmic_reticulum(self)
    }

    fn markers(&self) -> &[Marker] {
        Morphology::markers(self)
    }
}

impl MorphologyView for MutableMorphology {
    fn soma(&self) -> &Soma {
        MutableMorphology::soma(self)
    }

    fn section_type(&self, id: SectionId) -> Option<SectionType> {
        self.section(id).map(|s| s.section_type())
    }

    fn section_points(&self, id: SectionId) -> Option<PointSlice<'_>> {
        self.section(id).map(|s| s.points().as_slice())
    }

    fn mitochondria(&self) -> &Mitochondria {
        MutableMorphology::mitochondria(self)
    }

    fn endoplasmic_reticulum(&self) -> &EndoplasmicReticulum {
        MutableMorphology::endoplasmic_reticulum(self)
    }

    fn markers(&self) -> &[Marker] {
        MutableMorphology::markers(self)
    }
}

/// Re-emits a morphology as a raw record stream.
///
/// Soma points come first as a chain (a three-point cylinder soma hangs both
/// side points off its center). Sections follow in depth-first pre-order; a
/// child's first point is skipped when it repeats the parent's last sample.
/// Root sections attach to the first soma record. Organelle references are
/// remapped to the section order the stream will build into.
pub fn to_record_stream<V: MorphologyView + ?Sized>(view: &V) -> RecordStream {
    let mut stream = RecordStream::new();
    let soma = view.soma();
    if !soma.is_empty() || soma.soma_type() != SomaType::Undefined {
        stream = stream.with_soma_type(soma.soma_type());
    }

    let mut next_id: u32 = 1;
    let soma_root = (!soma.is_empty()).then_some(next_id);
    let soma_level = soma.point_level();
    for i in 0..soma_level.len() {
        let Some(sample) = soma_level.sample(i) else {
            continue;
        };
        let parent = match (i, soma.soma_type()) {
            (0, _) => None,
            (_, SomaType::ThreePointCylinders) => soma_root,
            _ => Some(next_id - 1),
        };
        stream.push(sample_record(next_id, SectionType::Soma, sample, parent));
        next_id += 1;
    }

    // Id of the last record emitted for each section.
    let mut last_record: HashMap<SectionId, u32> = HashMap::new();
    let mut section_rank: HashMap<SectionId, u32> = HashMap::new();
    for (rank, id) in view.depth_first().enumerate() {
        section_rank.insert(id, rank as u32);
        let (Some(section_type), Some(points)) = (view.section_type(id), view.section_points(id))
        else {
            continue;
        };
        let parent_section = view.parent_of(id);
        let mut parent = match parent_section {
            Some(p) => last_record.get(&p).copied(),
            None => soma_root,
        };
        let parent_end = parent_section
            .and_then(|p| view.section_points(p))
            .and_then(|p| p.last());
        for j in 0..points.len() {
            let Some(sample) = points.sample(j) else {
                continue;
            };
            if j == 0 && parent_end.is_some_and(|end| end.same_as(&sample)) {
                continue;
            }
            stream.push(sample_record(next_id, section_type, sample, parent));
            parent = Some(next_id);
            next_id += 1;
        }
        if let Some(last) = parent {
            last_record.insert(id, last);
        }
    }

    let remap = |s: SectionId| section_rank.get(&s).copied().unwrap_or(u32::MAX);
    for section in view.mitochondria().to_raw(remap) {
        stream.push_mito_section(section);
    }
    for entry in view.endoplasmic_reticulum().to_raw(remap) {
        stream.push_reticulum(entry);
    }
    for marker in view.markers() {
        stream.push_marker(marker.clone());
    }
    stream
}

fn sample_record(
    id: u32,
    section_type: SectionType,
    sample: crate::geometry::Sample,
    parent: Option<u32>,
) -> Record {
    let record = Record::new(id, section_type, sample.point, sample.diameter, parent);
    match sample.perimeter {
        Some(p) => record.with_perimeter(p),
        None => record,
    }
}

/// On-disk formats the codec layer knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// SWC text format.
    Swc,
    /// Neurolucida ASCII format.
    Asc,
    /// HDF5 container.
    H5,
}

impl FileFormat {
    /// Every supported format.
    pub const ALL: [FileFormat; 3] = [Self::Swc, Self::Asc, Self::H5];

    /// Picks the format from a path's extension, ignoring case.
    pub fn from_path(path: impl AsRef<Path>) -> MorphologyResult<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("swc") => Ok(Self::Swc),
            Some("asc") => Ok(Self::Asc),
            Some("h5") => Ok(Self::H5),
            _ => Err(MorphologyError::UnknownFileType {
                path: path.display().to_string(),
            }),
        }
    }

    /// Canonical lower-case extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Swc => "swc",
            Self::Asc => "asc",
            Self::H5 => "h5",
        }
    }

    fn supports_organelles(self) -> bool {
        self == Self::H5
    }

    fn supports_perimeters(self) -> bool {
        self == Self::H5
    }
}

impl core::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Swc => write!(f, "SWC"),
            Self::Asc => write!(f, "ASC"),
            Self::H5 => write!(f, "H5"),
        }
    }
}

/// A record stream checked against a target format.
#[derive(Clone, Debug)]
pub struct Export {
    /// Target format.
    pub format: FileFormat,
    /// Records ready for the codec.
    pub stream: RecordStream,
    /// What was dropped or looks suspicious.
    pub warnings: WarningLog,
}

/// Prepares a morphology for writing in `format`.
///
/// Fails if a section cannot be encoded (custom types in ASC, sections with
/// fewer than 2 points). Payload the format cannot carry (mitochondria,
/// reticulum, perimeters in SWC and ASC) is dropped with a warning.
pub fn export<V: MorphologyView + ?Sized>(view: &V, format: FileFormat) -> MorphologyResult<Export> {
    for id in view.depth_first() {
        let section_type = view.section_type(id).unwrap_or(SectionType::Undefined);
        if format == FileFormat::Asc && section_type.is_custom() {
            return Err(WriterError::UnsupportedSectionType {
                format,
                section: id,
                section_type,
            }
            .into());
        }
        let points = view.section_points(id).map_or(0, |p| p.len());
        if points < 2 {
            return Err(WriterError::DegenerateSection {
                format,
                section: id,
                points,
            }
            .into());
        }
    }

    let mut warnings = WarningLog::new(None, &[]);
    let soma = view.soma();
    let has_sections = !view.root_ids().is_empty();
    if soma.is_empty() && !has_sections {
        warnings.push(
            WarningKind::WriteEmptyMorphology,
            format!("writing an empty morphology to {format}"),
            None,
        );
    } else if soma.is_empty() {
        warnings.push(
            WarningKind::WriteNoSoma,
            format!("writing a morphology without soma to {format}"),
            None,
        );
    }
    if format == FileFormat::Asc && !soma.is_empty() && soma.soma_type() != SomaType::SimpleContour
    {
        warnings.push(
            WarningKind::SomaNonConform,
            format!("{format} expects a contour soma, found {}", soma.soma_type()),
            None,
        );
    }

    let mut stream = to_record_stream(view);
    if !format.supports_organelles() {
        if !view.mitochondria().is_empty() {
            warnings.push(
                WarningKind::MitochondriaWriteNotSupported,
                format!("{format} cannot store mitochondria; dropped"),
                None,
            );
        }
        if !view.endoplasmic_reticulum().is_empty() {
            warnings.push(
                WarningKind::EndoplasmicReticulumWriteNotSupported,
                format!("{format} cannot store endoplasmic reticulum; dropped"),
                None,
            );
        }
    }
    let has_perimeters = stream.records().iter().any(|r| r.perimeter.is_some());
    if has_perimeters && !format.supports_perimeters() {
        warnings.push(
            WarningKind::PerimeterWriteNotSupported,
            format!("{format} cannot store perimeters; dropped"),
            None,
        );
    }
    if !format.supports_organelles() || !format.supports_perimeters() {
        stream = strip(stream, format);
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        "export: {} records to {format}, {} warnings",
        stream.len(),
        warnings.len()
    );
    Ok(Export {
        format,
        stream,
        warnings,
    })
}

/// Rebuilds `stream` without the payload `format` cannot carry.
fn strip(stream: RecordStream, format: FileFormat) -> RecordStream {
    let mut out = RecordStream::new();
    if let Some(soma_type) = stream.soma_type() {
        out = out.with_soma_type(soma_type);
    }
    for record in stream.records() {
        let mut record = *record;
        if !format.supports_perimeters() {
            record.perimeter = None;
        }
        out.push(record);
    }
    if format.supports_organelles() {
        for section in stream.mitochondria() {
            out.push_mito_section(section.clone());
        }
        for entry in stream.reticulum() {
            out.push_reticulum(*entry);
        }
    }
    for marker in stream.markers() {
        out.push_marker(marker.clone());
    }
    out
}
