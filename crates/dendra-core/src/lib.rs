//! Dendra Core - neuronal morphology tree model
//!
//! A neuron's reconstructed shape is a soma plus a forest of neurite
//! sections: unbranched runs of 3D points, each with a diameter and an
//! optional perimeter. This crate turns a flat stream of point records into
//! that forest, validates it, and exposes it through an immutable view and
//! an editable one.
//!
//! # Core Abstractions
//!
//! ## Input
//!
//! - [`Record`] / [`RecordStream`] - Flat per-point input from a format codec
//! - [`BuildOptions`] - Id strictness, tree and single-point policies, modifiers
//!
//! ## Models
//!
//! - [`Morphology`] - Immutable, cheaply cloned snapshot with id-indexed [`Section`] views
//! - [`MutableMorphology`] - Arena-backed editor: append, delete, graft, set soma
//! - [`Soma`], [`Mitochondria`], [`EndoplasmicReticulum`], [`Marker`] - Payload riding on the tree
//!
//! ## Traversal
//!
//! - [`TreeTopology`] - Shared family queries and iterators for every tree in the crate
//! - [`DepthFirst`], [`BreadthFirst`], [`Upstream`] - Iterative, restartable walkers
//!
//! ## Diagnostics
//!
//! - [`MorphologyError`] - Fatal conditions, classified by [`ErrorKind`]
//! - [`WarningLog`] - Non-fatal conditions recorded during a build or export
//!
//! ## Output
//!
//! - [`to_record_stream`] / [`export`] - Re-serialize either model for a [`FileFormat`]
//!
//! # Features
//!
//! - `tracing` - Emit `tracing` events for builds, edits, and every recorded warning
//! - `serde` - Derive `Serialize`/`Deserialize` for options and plain value types
//!
//! # Example
//!
//! ```rust
//! use dendra_core::{
//!     BuildOptions, Morphology, MutableMorphology, Point, PointLevel, Record,
//!     RecordStream, SectionType, TreeTopology,
//! };
//!
//! let stream: RecordStream = [
//!     Record::new(1, SectionType::Soma, Point::new(0.0, 0.0, 0.0), 4.0, None),
//!     Record::new(2, SectionType::Axon, Point::new(0.0, 2.0, 0.0), 1.0, Some(1)),
//!     Record::new(3, SectionType::Axon, Point::new(0.0, 5.0, 0.0), 1.0, Some(2)),
//! ]
//! .into_iter()
//! .collect();
//!
//! let morph = Morphology::from_records(&stream, &BuildOptions::default())?;
//! assert_eq!(morph.len(), 1);
//!
//! let mut editor = MutableMorphology::from(&morph);
//! let root = editor.root_ids()[0];
//! editor.append_section(
//!     Some(root),
//!     SectionType::Axon,
//!     PointLevel::new(
//!         vec![Point::new(0.0, 5.0, 0.0), Point::new(1.0, 6.0, 0.0)],
//!         vec![1.0, 0.8],
//!     ),
//! )?;
//! let edited = editor.build(&BuildOptions::default())?;
//! assert_eq!(edited.len(), 2);
//! # Ok::<(), dendra_core::MorphologyError>(())
//! ```

pub mod annotation;
mod builder;
pub mod error;
pub mod geometry;
pub mod mitochondria;
pub mod morphology;
pub mod mutable;
pub mod options;
pub mod record;
pub mod reticulum;
pub mod soma;
pub mod traversal;
pub mod warning;
pub mod writer;

pub use annotation::{Annotation, AnnotationType, Marker};
pub use error::{
    ErrorKind, MorphologyError, MorphologyResult, RawDataError, SectionBuilderError, SomaError,
    WriterError,
};
pub use geometry::{
    MitoSectionId, Point, PointLevel, PointSlice, Sample, SectionId, SectionType, SomaType,
};
pub use mitochondria::{MitoPointLevel, MitoSection, Mitochondria};
pub use morphology::{Morphology, Section};
pub use mutable::{MutableMorphology, MutableSection};
pub use options::{BuildOptions, Modifiers, MultiRootPolicy, SinglePointPolicy};
pub use record::{RawMitoSection, RawReticulum, Record, RecordStream};
pub use reticulum::{EndoplasmicReticulum, ReticulumEntry};
pub use soma::Soma;
pub use traversal::{BreadthFirst, DepthFirst, TreeTopology, Upstream};
pub use warning::{Warning, WarningKind, WarningLog};
pub use writer::{Export, FileFormat, MorphologyView, export, to_record_stream};
