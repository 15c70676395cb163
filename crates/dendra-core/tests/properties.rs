//! Property-based tests for dendra-core tree invariants.
//!
//! Random cells are built, edited, and re-emitted to check acyclicity,
//! record-stream round trips, rebuild idempotence, graft cycle rejection,
//! and delete cascades.

use proptest::prelude::*;
use proptest::sample::Index;
use dendra_core::{
    BuildOptions, Morphology, MorphologyError, MutableMorphology, Point, RawMitoSection, Record,
    RecordStream, SectionBuilderError, SectionId, SectionType, TreeTopology, to_record_stream,
};

/// One neurite record: root roll, parent pick, type roll, y coordinate.
type NeuriteSpec = (u8, Index, u8, f32);

/// One mitochondrial section: parent pick and `(section pick, offset)` samples.
type MitoSpec = (Option<Index>, Vec<(Index, f32)>);

fn soma_records(kind: usize) -> Vec<Record> {
    let at = |id: u32, y: f32, parent: Option<u32>| {
        Record::new(id, SectionType::Soma, Point::new(0.0, y, 0.0), 2.0, parent)
    };
    match kind {
        0 => Vec::new(),
        1 => vec![at(1, 0.0, None)],
        _ => vec![at(1, 0.0, None), at(2, -1.0, Some(1)), at(3, 1.0, Some(1))],
    }
}

/// Records of a random cell with distinct coordinates.
///
/// Roots attach to the soma when there is one; without a soma every root
/// record starts its own tree. Root records may fork at once, and a record
/// switches to a dendrite type now and then, so single-point roots and
/// mixed-type runs both occur.
fn cell_records(soma: usize, perimeters: bool, neurites: &[NeuriteSpec]) -> RecordStream {
    let mut records = soma_records(soma);
    let soma_root = (!records.is_empty()).then_some(1);
    let first = records.len() as u32 + 1;

    let mut types: Vec<SectionType> = Vec::with_capacity(neurites.len());
    for (i, &(root_roll, parent, type_roll, y)) in neurites.iter().enumerate() {
        let parent = (i > 0 && root_roll >= 24).then(|| parent.index(i));
        let inherited = parent.map_or(SectionType::Axon, |p| types[p]);
        let section_type = match type_roll % 8 {
            0 => SectionType::BasalDendrite,
            1 => SectionType::ApicalDendrite,
            _ => inherited,
        };
        types.push(section_type);
        records.push(Record::new(
            first + i as u32,
            section_type,
            Point::new(i as f32 + 1.0, y, 0.0),
            1.0,
            parent.map_or(soma_root, |p| Some(first + p as u32)),
        ));
    }
    if perimeters {
        records = records.into_iter().map(|r| r.with_perimeter(3.0)).collect();
    }
    records.into_iter().collect()
}

/// Adds a mitochondrial forest whose samples point at sections of the
/// default build of `stream`.
fn with_mitochondria(mut stream: RecordStream, forest: &[MitoSpec]) -> RecordStream {
    let sections = build(&stream).len();
    let raw_id = |k: usize| k as u32 * 3 + 7;
    for (k, (parent, samples)) in forest.iter().enumerate() {
        stream.push_mito_section(RawMitoSection {
            id: raw_id(k),
            parent: parent.filter(|_| k > 0).map(|p| raw_id(p.index(k))),
            neurite_sections: samples.iter().map(|(s, _)| s.index(sections) as u32).collect(),
            relative_path_lengths: samples.iter().map(|&(_, offset)| offset).collect(),
            diameters: vec![0.2; samples.len()],
        });
    }
    stream
}

fn arb_cell() -> impl Strategy<Value = RecordStream> {
    (
        0usize..3,
        any::<bool>(),
        prop::collection::vec(
            (any::<u8>(), any::<Index>(), any::<u8>(), -50.0f32..50.0),
            1..50,
        ),
        prop::collection::vec(
            (
                prop::option::of(any::<Index>()),
                prop::collection::vec((any::<Index>(), 0.0f32..=1.0), 1..4),
            ),
            0..6,
        ),
    )
        .prop_map(|(soma, perimeters, neurites, forest)| {
            with_mitochondria(cell_records(soma, perimeters, &neurites), &forest)
        })
}

fn build(stream: &RecordStream) -> Morphology {
    Morphology::from_records(stream, &BuildOptions::default()).unwrap()
}

fn option_sets() -> [BuildOptions; 2] {
    [BuildOptions::default(), BuildOptions::strict()]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Following parents from any section reaches a root within
    /// `len` steps.
    #[test]
    fn parent_chains_terminate(stream in arb_cell()) {
        let morph = build(&stream);
        for section in morph.sections() {
            let chain: Vec<SectionId> = morph.upstream_from(section.id()).take(morph.len() + 1).collect();
            prop_assert!(chain.len() <= morph.len());
            let top = *chain.last().unwrap();
            prop_assert!(morph.is_root(top));
        }
        for section in morph.sections() {
            prop_assert!(section.len() >= 2, "{:?} has fewer than 2 points", section);
        }
    }

    /// Re-emitting a built morphology depth-first and building the result
    /// with the same options gives back an equal morphology.
    #[test]
    fn record_stream_round_trip(stream in arb_cell()) {
        for options in option_sets() {
            let Ok(morph) = Morphology::from_records(&stream, &options) else {
                continue;
            };
            let again = Morphology::from_records(&to_record_stream(&morph), &options);
            let expected: Result<Morphology, MorphologyError> = Ok(morph);
            prop_assert_eq!(again, expected);
        }
    }

    /// An unedited mutable copy rebuilds into the morphology it came from,
    /// and rebuilding twice gives equal but separate snapshots.
    #[test]
    fn rebuild_is_idempotent(stream in arb_cell()) {
        for options in option_sets() {
            let Ok(morph) = Morphology::from_records(&stream, &options) else {
                continue;
            };
            let editor = MutableMorphology::from(&morph);
            let first = editor.build(&options);
            let expected: Result<Morphology, MorphologyError> = Ok(morph);
            prop_assert_eq!(&first, &expected);
            let first = first.unwrap();
            let second = editor.build(&options).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert!(!first.shares_storage_with(&second));
        }
    }

    /// Grafting a section under its own subtree fails and changes nothing.
    #[test]
    fn graft_into_own_subtree_rejected(
        stream in arb_cell(),
        pick in any::<Index>(),
        target in any::<Index>(),
    ) {
        let morph = build(&stream);
        let mut editor = MutableMorphology::from(&morph);
        let ids: Vec<SectionId> = editor.section_ids().collect();
        let moved = ids[pick.index(ids.len())];
        let subtree: Vec<SectionId> = editor.depth_first_from(moved).collect();
        let onto = subtree[target.index(subtree.len())];

        let before = editor.build(&BuildOptions::default()).unwrap();
        let err = editor.graft(moved, Some(onto)).unwrap_err();
        let is_cycle = matches!(
            err,
            MorphologyError::SectionBuilder(SectionBuilderError::WouldCreateCycle { .. })
        );
        prop_assert!(is_cycle);
        prop_assert_eq!(editor.parent_of(moved), morph.parent_of(moved));
        prop_assert_eq!(editor.build(&BuildOptions::default()).unwrap(), before);
    }

    /// Recursive delete removes exactly the subtree and every mitochondrial
    /// section with a sample in it.
    #[test]
    fn delete_cascades(stream in arb_cell(), pick in any::<Index>()) {
        let morph = build(&stream);
        let mut editor = MutableMorphology::from(&morph);
        let ids: Vec<SectionId> = editor.section_ids().collect();
        let doomed = ids[pick.index(ids.len())];
        let mut subtree: Vec<SectionId> = editor.depth_first_from(doomed).collect();

        let mito_before = editor.mitochondria().len();
        let hit = editor
            .mitochondria()
            .sections()
            .filter(|m| m.neurite_section_ids().iter().any(|s| subtree.contains(s)))
            .count();

        let mut deleted = editor.delete_section(doomed, true).unwrap();
        subtree.sort();
        deleted.sort();
        prop_assert_eq!(&deleted, &subtree);

        prop_assert_eq!(editor.len(), ids.len() - deleted.len());
        for id in &deleted {
            prop_assert!(!editor.contains(*id));
        }
        prop_assert_eq!(editor.mitochondria().len(), mito_before - hit);
        for mito in editor.mitochondria().sections() {
            for id in mito.neurite_section_ids() {
                prop_assert!(editor.contains(*id));
            }
        }

        let rebuilt = editor.build(&BuildOptions::default()).unwrap();
        prop_assert_eq!(rebuilt.len(), editor.len());
        prop_assert_eq!(rebuilt.mitochondria().len(), editor.mitochondria().len());
        for mito in rebuilt.mitochondria().sections() {
            for &id in mito.neurite_section_ids() {
                prop_assert!(rebuilt.contains(id));
            }
        }
    }
}
