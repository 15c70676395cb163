//! Stage 2: raw section tree to frozen morphology.

use super::{RawTree, SectionRefs};
use crate::annotation::{Annotation, AnnotationType};
use crate::error::{MorphologyError, MorphologyResult, SectionBuilderError};
use crate::geometry::{PointLevel, SectionId};
use crate::mitochondria::Mitochondria;
use crate::morphology::{Morphology, Properties, SectionData};
use crate::options::{BuildOptions, Modifiers, MultiRootPolicy, SinglePointPolicy};
use crate::reticulum::EndoplasmicReticulum;
use crate::warning::{WarningKind, WarningLog};

/// Applies section policies, numbers sections, and freezes the tree.
pub(crate) fn assemble(
    mut tree: RawTree,
    options: &BuildOptions,
    mut log: WarningLog,
) -> MorphologyResult<Morphology> {
    if tree.tree_count > 1 {
        match options.multi_root_policy {
            MultiRootPolicy::Fatal => {
                return Err(MorphologyError::MultipleTrees {
                    count: tree.tree_count,
                });
            }
            MultiRootPolicy::Warn => log.push(
                WarningKind::MultipleTrees,
                format!("found {} disconnected trees", tree.tree_count),
                None,
            ),
        }
    }
    for section in &tree.sections {
        section.points.validate()?;
    }

    apply_single_point_policy(&mut tree, options.single_point_policy, &mut log)?;
    let (roots, order) = number_sections(&tree, options.modifiers.nrn_order);
    let mut final_id: Vec<Option<SectionId>> = vec![None; tree.sections.len()];
    for (n, &i) in order.iter().enumerate() {
        final_id[i] = Some(SectionId(n as u32));
    }
    #[cfg(feature = "tracing")]
    tracing::debug!(sections = order.len(), roots = roots.len(), "section ids assigned");

    let mut annotations = std::mem::take(&mut tree.annotations);
    inspect_sections(
        &mut tree,
        &order,
        &final_id,
        options.collapse_zero_length_segments,
        &mut log,
        &mut annotations,
    );

    let count = order.len();
    let refs = tree.refs;
    let resolve = |r: u32| -> Option<SectionId> {
        match refs {
            SectionRefs::Final => ((r as usize) < count).then_some(SectionId(r)),
            SectionRefs::Index => final_id.get(r as usize).copied().flatten(),
        }
    };
    let mitochondria = Mitochondria::from_raw(&tree.mitochondria, resolve)?;
    let reticulum = EndoplasmicReticulum::from_raw(&tree.reticulum, resolve)?;

    apply_modifiers(&mut tree, &order, options.modifiers);

    let has_perimeters =
        !order.is_empty() && order.iter().all(|&i| tree.sections[i].points.has_perimeters());
    let total_points = order.iter().map(|&i| tree.sections[i].points.len()).sum();
    let mut props = Properties {
        points: Vec::with_capacity(total_points),
        diameters: Vec::with_capacity(total_points),
        sections: Vec::with_capacity(count),
        ..Properties::default()
    };
    for &i in &order {
        let section = &tree.sections[i];
        let start = props.points.len();
        props.points.extend_from_slice(&section.points.points);
        props.diameters.extend_from_slice(&section.points.diameters);
        if has_perimeters {
            props.perimeters.extend_from_slice(&section.points.perimeters);
        }
        props.sections.push(SectionData {
            section_type: section.section_type,
            start,
            end: props.points.len(),
            parent: section.parent.and_then(|p| final_id[p]),
            children: section.children.iter().filter_map(|&c| final_id[c]).collect(),
        });
    }
    props.roots = roots.iter().filter_map(|&r| final_id[r]).collect();
    props.soma = if options.modifiers.soma_sphere {
        tree.soma.to_sphere()
    } else {
        tree.soma
    };
    props.mitochondria = mitochondria;
    props.reticulum = reticulum;
    props.annotations = annotations;
    props.markers = tree.markers;
    props.warnings = log;

    #[cfg(feature = "tracing")]
    tracing::debug!(
        sections = props.sections.len(),
        warnings = props.warnings.len(),
        "morphology frozen"
    );
    Ok(Morphology::from_properties(props))
}

/// Resolves every single-point section.
fn apply_single_point_policy(
    tree: &mut RawTree,
    policy: SinglePointPolicy,
    log: &mut WarningLog,
) -> MorphologyResult<()> {
    for i in 0..tree.sections.len() {
        let section = &tree.sections[i];
        if section.points.len() != 1 {
            continue;
        }
        if policy == SinglePointPolicy::Reject {
            return Err(SectionBuilderError::SinglePoint {
                id: section.first_id,
                line: section.line,
            }
            .into());
        }

        let line = section.line;
        let mergeable = policy == SinglePointPolicy::Merge
            && match section.parent {
                Some(p) => {
                    let parent = &tree.sections[p];
                    parent.section_type == section.section_type
                        && parent.points.last().map(|s| s.point) == Some(section.points.points[0])
                }
                // Without a soma, splicing out a forking root splits its
                // tree into several.
                None => {
                    !section.children.is_empty()
                        && (section.children.len() == 1 || !tree.soma.is_empty())
                        && section
                            .children
                            .iter()
                            .all(|&c| tree.sections[c].section_type == section.section_type)
                }
            };

        if mergeable {
            splice_out(tree, i);
            log.push(
                WarningKind::SinglePointSection,
                "single-point section merged into its neighbours",
                line,
            );
        } else if let Some(sample) = tree.sections[i].points.first() {
            tree.sections[i].points.push(sample);
            log.push(
                WarningKind::SinglePointSection,
                "single-point section padded by repeating its point",
                line,
            );
        }
    }
    Ok(())
}

/// Detaches section `i`; its children take its place under its parent.
fn splice_out(tree: &mut RawTree, i: usize) {
    let parent = tree.sections[i].parent;
    let children = std::mem::take(&mut tree.sections[i].children);
    for &c in &children {
        tree.sections[c].parent = parent;
    }
    let list = match parent {
        Some(p) => &mut tree.sections[p].children,
        None => &mut tree.roots,
    };
    if let Some(pos) = list.iter().position(|&c| c == i) {
        list.splice(pos..=pos, children);
    }
    tree.sections[i].parent = None;
}

/// Returns the root order and the depth-first pre-order of reachable sections.
fn number_sections(tree: &RawTree, nrn_order: bool) -> (Vec<usize>, Vec<usize>) {
    let mut roots = tree.roots.clone();
    if nrn_order {
        roots.sort_by_key(|&r| tree.sections[r].section_type.nrn_rank());
    }
    let mut order = Vec::with_capacity(tree.sections.len());
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(i) = stack.pop() {
        order.push(i);
        stack.extend(tree.sections[i].children.iter().rev().copied());
    }
    (roots, order)
}

/// Per-section checks that need final ids: zero-length segments, wrong
/// duplicates, only children, and mixed-type adjacency.
fn inspect_sections(
    tree: &mut RawTree,
    order: &[usize],
    final_id: &[Option<SectionId>],
    collapse: bool,
    log: &mut WarningLog,
    annotations: &mut Vec<Annotation>,
) {
    for &i in order {
        let id = final_id[i];
        let section = &tree.sections[i];
        let line = section.line;

        let repeats: Vec<usize> = section
            .points
            .points
            .windows(2)
            .enumerate()
            .filter(|(_, w)| w[0] == w[1])
            .map(|(j, _)| j)
            .collect();
        for &j in &repeats {
            let message = match id {
                Some(id) => format!("zero-length segment at point {j} of {id}"),
                None => format!("zero-length segment at point {j}"),
            };
            log.push(WarningKind::ZeroLengthSegment, message.clone(), line);
            let samples: Vec<_> = [j, j + 1]
                .iter()
                .filter_map(|&k| section.points.sample(k))
                .collect();
            annotations.push(Annotation {
                kind: AnnotationType::ZeroLengthSegment,
                section: id,
                line,
                message,
                points: PointLevel::from_samples(&samples),
            });
        }

        if let Some(p) = section.parent {
            let parent = &tree.sections[p];
            if parent.points.last().map(|s| s.point) != section.points.first().map(|s| s.point) {
                log.push(
                    WarningKind::WrongDuplicate,
                    format!(
                        "{} does not start at the last point of its parent",
                        describe(id)
                    ),
                    line,
                );
            }
            if parent.section_type != section.section_type {
                log.push(
                    WarningKind::MixedTypeAdjacency,
                    format!(
                        "{} of type {} has a parent of type {}",
                        describe(id),
                        section.section_type,
                        parent.section_type
                    ),
                    line,
                );
            }
        }

        if section.children.len() == 1 {
            let message = format!("{} has a single child section", describe(id));
            log.push(WarningKind::OnlyChild, message.clone(), line);
            annotations.push(Annotation {
                kind: AnnotationType::SingleChild,
                section: id,
                line,
                message,
                points: section.points.clone(),
            });
        }

        if collapse && !repeats.is_empty() {
            let points = &mut tree.sections[i].points;
            for &j in repeats.iter().rev() {
                if points.len() <= 2 {
                    break;
                }
                points.remove(j + 1);
            }
        }
    }
}

fn describe(id: Option<SectionId>) -> String {
    id.map_or_else(|| "section".to_string(), |id| format!("section {}", id.index()))
}

fn apply_modifiers(tree: &mut RawTree, order: &[usize], modifiers: Modifiers) {
    if modifiers.two_points_sections {
        for &i in order {
            tree.sections[i].points.keep_endpoints();
        }
    }
    if modifiers.no_duplicates {
        for &i in order {
            let Some(p) = tree.sections[i].parent else {
                continue;
            };
            let parent_end = tree.sections[p].points.last().map(|s| s.point);
            let points = &mut tree.sections[i].points;
            if points.len() > 2 && points.points.first().copied() == parent_end {
                points.remove(0);
            }
        }
    }
}
