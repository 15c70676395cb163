//! Edit session: load records, inspect warnings, edit, rebuild, export.
//!
//! Run with: RUST_LOG=debug cargo run -p dendra-core --features tracing --example edit_session

use dendra_core::{
    BuildOptions, FileFormat, Morphology, MorphologyError, MutableMorphology, Point, PointLevel,
    Record, RecordStream, SectionType, TreeTopology, export,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), MorphologyError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Soma, an axon that forks once, and a basal dendrite with an id gap.
    let records = [
        Record::new(1, SectionType::Soma, Point::new(0.0, 0.0, 0.0), 8.0, None),
        Record::new(2, SectionType::Axon, Point::new(0.0, 4.0, 0.0), 1.2, Some(1)),
        Record::new(3, SectionType::Axon, Point::new(0.0, 10.0, 0.0), 1.0, Some(2)),
        Record::new(4, SectionType::Axon, Point::new(3.0, 14.0, 0.0), 0.8, Some(3)),
        Record::new(5, SectionType::Axon, Point::new(-3.0, 14.0, 0.0), 0.8, Some(3)),
        Record::new(7, SectionType::BasalDendrite, Point::new(0.0, -4.0, 0.0), 1.5, Some(1)),
        Record::new(8, SectionType::BasalDendrite, Point::new(1.0, -9.0, 0.0), 1.2, Some(7)),
    ];
    let stream: RecordStream = records.into_iter().collect();

    let morph = Morphology::from_records(&stream, &BuildOptions::default())?;
    println!("=== Loaded ===\n");
    print_tree(&morph);
    println!("\nWarnings:");
    for warning in morph.warnings() {
        println!("  {warning}");
    }

    // --- Edit ---
    let mut editor = MutableMorphology::from(&morph);
    let Some(dendrite) = editor.root_ids().iter().copied().find(|&id| {
        editor
            .section(id)
            .is_some_and(|s| s.section_type() == SectionType::BasalDendrite)
    }) else {
        println!("no basal dendrite to extend");
        return Ok(());
    };
    let tip = editor
        .section(dendrite)
        .and_then(|s| s.points().last())
        .map_or(Point::new(0.0, 0.0, 0.0), |s| s.point);
    for dx in [-2.0, 2.0] {
        editor.append_section(
            Some(dendrite),
            SectionType::BasalDendrite,
            PointLevel::new(
                vec![tip, Point::new(tip.x + dx, tip.y - 5.0, 0.0)],
                vec![1.0, 0.6],
            ),
        )?;
    }

    // Drop one axon branch.
    let first_branch = editor
        .root_ids()
        .first()
        .and_then(|&axon| editor.children_of(axon).first().copied());
    if let Some(first_branch) = first_branch {
        let removed = editor.delete_section(first_branch, true)?;
        println!("\nDeleted {} section(s)", removed.len());
    }

    let edited = editor.build(&BuildOptions::default())?;
    println!("\n=== Edited ===\n");
    print_tree(&edited);

    // --- Export ---
    println!("\n=== Export ===\n");
    for format in FileFormat::ALL {
        match export(&edited, format) {
            Ok(out) => println!(
                "{format}: {} records, {} warning(s)",
                out.stream.len(),
                out.warnings.len()
            ),
            Err(err) => println!("{format}: failed: {err}"),
        }
    }
    Ok(())
}

fn print_tree(morph: &Morphology) {
    println!(
        "Soma: {} ({} points)",
        morph.soma().soma_type(),
        morph.soma().points().len()
    );
    for id in morph.depth_first() {
        let Some(section) = morph.section(id) else {
            continue;
        };
        println!(
            "{:indent$}{id} {} - {} points, {:.1} um",
            "",
            section.section_type(),
            section.len(),
            section.length(),
            indent = 2 * morph.depth_of(id),
        );
    }
}
