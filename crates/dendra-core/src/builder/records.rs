//! Stage 1: record stream to raw section tree.

use std::collections::HashMap;

use super::{RawSection, RawTree, SectionRefs, find_cycle};
use crate::annotation::{Annotation, AnnotationType};
use crate::error::{MorphologyError, MorphologyResult, RawDataError, SomaError};
use crate::geometry::{PointLevel, SectionType, SomaType};
use crate::options::BuildOptions;
use crate::record::{Record, RecordStream};
use crate::soma::Soma;
use crate::warning::{WarningKind, WarningLog};

/// Validates the records and splits them into unbranched same-type runs.
pub(super) fn partition(
    stream: &RecordStream,
    options: &BuildOptions,
    log: &mut WarningLog,
) -> MorphologyResult<RawTree> {
    let records = stream.records();
    let index = index_records(records)?;
    check_attributes(records)?;
    let parents = resolve_parents(records, &index)?;
    if let Some(i) = find_cycle(&parents) {
        return Err(RawDataError::Cycle {
            id: records[i].id,
            line: records[i].line,
        }
        .into());
    }
    check_id_sequence(records, options.strict_ids, log)?;

    let mut children = vec![Vec::new(); records.len()];
    for (i, parent) in parents.iter().enumerate() {
        if let Some(p) = parent {
            children[*p].push(i);
        }
    }
    #[cfg(feature = "tracing")]
    tracing::debug!(records = records.len(), "record index built");

    let scan = collect_soma(stream, &parents, &children, log)?;
    let tree_count = parents.iter().filter(|p| p.is_none()).count();

    let is_soma = |i: usize| records[i].section_type == SectionType::Soma;
    let mut tree = RawTree {
        sections: Vec::new(),
        roots: Vec::new(),
        soma: scan.soma,
        tree_count,
        mitochondria: stream.mitochondria().to_vec(),
        reticulum: stream.reticulum().to_vec(),
        refs: SectionRefs::Final,
        markers: stream.markers().to_vec(),
        annotations: scan.annotations,
    };

    // Neurite runs start at records without parent or attached to the soma.
    let mut stack: Vec<(usize, Option<usize>)> = (0..records.len())
        .filter(|&i| !is_soma(i) && parents[i].is_none_or(is_soma))
        .rev()
        .map(|i| (i, None))
        .collect();
    while let Some((start, parent)) = stack.pop() {
        let section_type = records[start].section_type;
        let mut points = PointLevel::default();
        if let Some(last) = parent.and_then(|p| tree.sections[p].points.last())
            && last.point != records[start].point
        {
            points.push(last);
        }
        let mut cur = start;
        points.push(records[cur].sample());
        while let [only] = children[cur].as_slice()
            && records[*only].section_type == section_type
        {
            cur = *only;
            points.push(records[cur].sample());
        }

        let idx = tree.sections.len();
        tree.sections.push(RawSection {
            section_type,
            points,
            parent,
            children: Vec::new(),
            line: records[start].line,
            first_id: Some(records[start].id),
        });
        match parent {
            Some(p) => tree.sections[p].children.push(idx),
            None => tree.roots.push(idx),
        }
        stack.extend(children[cur].iter().rev().map(|&c| (c, Some(idx))));
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        sections = tree.sections.len(),
        trees = tree.tree_count,
        "records partitioned"
    );
    Ok(tree)
}

fn index_records(records: &[Record]) -> Result<HashMap<u32, usize>, RawDataError> {
    let mut index = HashMap::with_capacity(records.len());
    for (i, r) in records.iter().enumerate() {
        if let Some(first) = index.insert(r.id, i) {
            return Err(RawDataError::DuplicateId {
                id: r.id,
                line: r.line,
                first_line: records[first].line,
            });
        }
    }
    Ok(index)
}

fn check_attributes(records: &[Record]) -> Result<(), RawDataError> {
    if let Some(r) = records
        .iter()
        .find(|r| r.section_type == SectionType::Undefined)
    {
        return Err(RawDataError::UndefinedSectionType {
            id: r.id,
            line: r.line,
        });
    }
    if records.iter().any(|r| r.perimeter.is_some())
        && let Some(r) = records.iter().find(|r| r.perimeter.is_none())
    {
        return Err(RawDataError::PartialPerimeters {
            id: r.id,
            line: r.line,
        });
    }
    Ok(())
}

fn resolve_parents(
    records: &[Record],
    index: &HashMap<u32, usize>,
) -> MorphologyResult<Vec<Option<usize>>> {
    records
        .iter()
        .map(|r| match r.parent {
            None => Ok(None),
            Some(p) if p == r.id => Err(MorphologyError::from(RawDataError::SelfParent {
                id: r.id,
                line: r.line,
            })),
            Some(p) => index
                .get(&p)
                .copied()
                .map(Some)
                .ok_or(MorphologyError::MissingParent {
                    id: r.id,
                    parent: p,
                    line: r.line,
                }),
        })
        .collect()
}

/// Ids must ascend by exactly one from the first record.
fn check_id_sequence(
    records: &[Record],
    strict: bool,
    log: &mut WarningLog,
) -> MorphologyResult<()> {
    for w in records.windows(2) {
        let expected = w[0].id.wrapping_add(1);
        if w[1].id == expected {
            continue;
        }
        if strict {
            return Err(MorphologyError::IdSequence {
                expected,
                found: w[1].id,
                line: w[1].line,
            });
        }
        log.push(
            WarningKind::IdSequence,
            format!("expected point id {expected}, found {}; ids renumbered", w[1].id),
            w[1].line,
        );
    }
    Ok(())
}

struct SomaScan {
    soma: Soma,
    annotations: Vec<Annotation>,
}

fn collect_soma(
    stream: &RecordStream,
    parents: &[Option<usize>],
    children: &[Vec<usize>],
    log: &mut WarningLog,
) -> MorphologyResult<SomaScan> {
    let records = stream.records();
    let is_soma = |i: usize| records[i].section_type == SectionType::Soma;
    let soma_children = |i: usize| -> Vec<usize> {
        children[i].iter().copied().filter(|&c| is_soma(c)).collect()
    };

    let mut roots = Vec::new();
    let mut total = 0;
    for (i, r) in records.iter().enumerate() {
        if !is_soma(i) {
            continue;
        }
        total += 1;
        match parents[i] {
            Some(p) if !is_soma(p) => {
                return Err(SomaError::NeuriteParent {
                    id: r.id,
                    line: r.line,
                }
                .into());
            }
            Some(_) => {}
            None => roots.push(i),
        }
    }
    if roots.len() > 1 {
        return Err(SomaError::MultipleSomata {
            ids: roots.iter().map(|&i| records[i].id).collect(),
        }
        .into());
    }

    let mut members = Vec::with_capacity(total);
    let mut three_point = false;
    if let Some(&root) = roots.first() {
        let kids = soma_children(root);
        three_point = total == 3
            && kids.len() == 2
            && kids.iter().all(|&k| soma_children(k).is_empty());
        if three_point {
            members.push(root);
            members.extend(kids);
        } else {
            let mut cur = root;
            loop {
                members.push(cur);
                match soma_children(cur).as_slice() {
                    [] => break,
                    [next] => cur = *next,
                    _ => {
                        return Err(SomaError::Bifurcation {
                            id: records[cur].id,
                            line: records[cur].line,
                        }
                        .into());
                    }
                }
            }
        }
    }

    let samples: Vec<_> = members.iter().map(|&i| records[i].sample()).collect();
    let soma_type = match stream.soma_type() {
        Some(declared) if declared != SomaType::Undefined => declared,
        _ => match members.len() {
            0 => SomaType::Undefined,
            1 => SomaType::SinglePoint,
            _ if three_point => SomaType::ThreePointCylinders,
            _ => SomaType::Cylinders,
        },
    };
    let soma = Soma::new(soma_type, PointLevel::from_samples(&samples));
    soma.check_type()?;

    if !soma.is_conform_three_point() {
        log.push(
            WarningKind::SomaNonConform,
            "three-point soma side points are not at center ± radius along y",
            roots.first().and_then(|&r| records[r].line),
        );
    }

    let mut annotations = Vec::new();
    for w in members.windows(2) {
        let (a, b) = (&records[w[0]], &records[w[1]]);
        if a.point != b.point {
            continue;
        }
        let message = format!("soma points {} and {} coincide", a.id, b.id);
        log.push(WarningKind::SomaNonConform, message.clone(), b.line);
        annotations.push(Annotation {
            kind: AnnotationType::DuplicateSomaPoint,
            section: None,
            line: b.line,
            message,
            points: PointLevel::from_samples(&[a.sample(), b.sample()]),
        });
    }

    if let Some(&root) = roots.first() {
        for (i, r) in records.iter().enumerate() {
            if is_soma(i) {
                continue;
            }
            match parents[i] {
                None => log.push(
                    WarningKind::DisconnectedNeurite,
                    format!("neurite starting at point {} is not attached to the soma", r.id),
                    r.line,
                ),
                Some(p)
                    if soma_type == SomaType::ThreePointCylinders && is_soma(p) && p != root =>
                {
                    log.push(
                        WarningKind::WrongRootPoint,
                        format!(
                            "neurite starting at point {} attaches to soma point {} instead of {}",
                            r.id, records[p].id, records[root].id
                        ),
                        r.line,
                    );
                }
                Some(_) => {}
            }
        }
    }

    Ok(SomaScan { soma, annotations })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn rec(id: u32, t: SectionType, y: f32, parent: Option<u32>) -> Record {
        Record::new(id, t, Point::new(0.0, y, 0.0), 2.0, parent)
    }

    fn run(stream: &RecordStream) -> (MorphologyResult<RawTree>, WarningLog) {
        let mut log = WarningLog::new(None, &[]);
        let tree = partition(stream, &BuildOptions::default(), &mut log);
        (tree, log)
    }

    #[test]
    fn test_runs_split_at_type_change() {
        let stream: RecordStream = [
            rec(1, SectionType::Axon, 0.0, None),
            rec(2, SectionType::Axon, 1.0, Some(1)),
            rec(3, SectionType::BasalDendrite, 2.0, Some(2)),
            rec(4, SectionType::BasalDendrite, 3.0, Some(3)),
        ]
        .into_iter()
        .collect();
        let (tree, _) = run(&stream);
        let tree = tree.unwrap();
        assert_eq!(tree.sections.len(), 2);
        assert_eq!(tree.sections[0].points.len(), 2);
        // Branch point copied onto the child run.
        assert_eq!(tree.sections[1].points.len(), 3);
        assert_eq!(tree.sections[1].parent, Some(0));
    }

    #[test]
    fn test_unordered_records() {
        let stream: RecordStream = [
            rec(3, SectionType::Axon, 2.0, Some(2)),
            rec(1, SectionType::Axon, 0.0, None),
            rec(2, SectionType::Axon, 1.0, Some(1)),
        ]
        .into_iter()
        .collect();
        let (tree, log) = run(&stream);
        let tree = tree.unwrap();
        assert_eq!(tree.sections.len(), 1);
        let ys: Vec<f32> = tree.sections[0].points.points.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![0.0, 1.0, 2.0]);
        assert!(log.contains(WarningKind::IdSequence));
    }

    #[test]
    fn test_three_point_soma_inferred() {
        let stream: RecordStream = [
            rec(1, SectionType::Soma, 0.0, None),
            rec(2, SectionType::Soma, -1.0, Some(1)),
            rec(3, SectionType::Soma, 1.0, Some(1)),
            rec(4, SectionType::Axon, 0.0, Some(2)),
            rec(5, SectionType::Axon, -2.0, Some(4)),
        ]
        .into_iter()
        .collect();
        let (tree, log) = run(&stream);
        let tree = tree.unwrap();
        assert_eq!(tree.soma.soma_type(), SomaType::ThreePointCylinders);
        assert_eq!(tree.tree_count, 1);
        assert!(log.contains(WarningKind::WrongRootPoint));
        assert!(!log.contains(WarningKind::SomaNonConform));
    }

    #[test]
    fn test_soma_errors() {
        let bifurcating: RecordStream = [
            rec(1, SectionType::Soma, 0.0, None),
            rec(2, SectionType::Soma, 1.0, Some(1)),
            rec(3, SectionType::Soma, 2.0, Some(1)),
            rec(4, SectionType::Soma, 3.0, Some(3)),
        ]
        .into_iter()
        .collect();
        assert!(matches!(
            run(&bifurcating).0,
            Err(MorphologyError::Soma(SomaError::Bifurcation { id: 1, .. }))
        ));

        let neurite_parent: RecordStream = [
            rec(1, SectionType::Axon, 0.0, None),
            rec(2, SectionType::Soma, 1.0, Some(1)),
        ]
        .into_iter()
        .collect();
        assert!(matches!(
            run(&neurite_parent).0,
            Err(MorphologyError::Soma(SomaError::NeuriteParent { id: 2, .. }))
        ));

        let two_somata: RecordStream = [
            rec(1, SectionType::Soma, 0.0, None),
            rec(2, SectionType::Soma, 5.0, None),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            run(&two_somata).0.unwrap_err(),
            MorphologyError::Soma(SomaError::MultipleSomata { ids: vec![1, 2] })
        );
    }

    #[test]
    fn test_duplicate_soma_point_annotated() {
        let stream: RecordStream = [
            rec(1, SectionType::Soma, 0.0, None),
            rec(2, SectionType::Soma, 0.0, Some(1)),
            rec(3, SectionType::Soma, 1.0, Some(2)),
        ]
        .into_iter()
        .collect();
        let (tree, log) = run(&stream);
        let tree = tree.unwrap();
        assert_eq!(tree.soma.soma_type(), SomaType::Cylinders);
        assert!(log.contains(WarningKind::SomaNonConform));
        assert_eq!(tree.annotations.len(), 1);
        assert_eq!(tree.annotations[0].kind, AnnotationType::DuplicateSomaPoint);
    }

    #[test]
    fn test_partial_perimeters_rejected() {
        let stream: RecordStream = [
            rec(1, SectionType::Axon, 0.0, None).with_perimeter(1.0),
            rec(2, SectionType::Axon, 1.0, Some(1)),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            run(&stream).0.unwrap_err(),
            MorphologyError::RawData(RawDataError::PartialPerimeters { id: 2, line: None })
        );
    }

    #[test]
    fn test_disconnected_neurite_warns() {
        let stream: RecordStream = [
            rec(1, SectionType::Soma, 0.0, None),
            rec(2, SectionType::Axon, 1.0, None),
            rec(3, SectionType::Axon, 2.0, Some(2)),
        ]
        .into_iter()
        .collect();
        let (tree, log) = run(&stream);
        assert_eq!(tree.unwrap().tree_count, 2);
        assert!(log.contains(WarningKind::DisconnectedNeurite));
    }
}
