use std::collections::HashMap;

use crate::normalizer::GroupKey;
use crate::schema::{ExtractionResult, Group};

/// Fold per-chunk results, given in chunk index order, into one cause list.
///
/// Benches with equal [`GroupKey`]s are combined; entries already present in
/// a bench (same serial and case number) are skipped. Bench order is the
/// order in which keys are first seen.
pub fn merge(partials: &[ExtractionResult]) -> ExtractionResult {
    let mut merged = ExtractionResult::empty();
    let mut positions: HashMap<GroupKey, usize> = HashMap::new();

    for (chunk, partial) in partials.iter().enumerate() {
        for (position, group) in partial.groups.iter().enumerate() {
            let key = GroupKey::derive(group, chunk, position);

            match positions.get(&key) {
                Some(&idx) => absorb(&mut merged.groups[idx], group),
                None => {
                    positions.insert(key, merged.groups.len());
                    let mut fresh = Group::new(group.number.clone(), group.name.clone());
                    absorb(&mut fresh, group);
                    merged.groups.push(fresh);
                }
            }
        }
    }

    if let Some(header) = header_chunk(partials) {
        merged.source = header.source.clone();
        merged.date = header.date.clone();
    }
    merged.degraded = !partials.is_empty() && partials.iter().all(|p| p.degraded);
    if merged.degraded {
        merged.source = ExtractionResult::degraded().source;
    }

    merged
}

fn absorb(target: &mut Group, incoming: &Group) {
    if target.name.trim().is_empty() && !incoming.name.trim().is_empty() {
        target.name = incoming.name.clone();
    }
    for entry in &incoming.entries {
        target.push_unique(entry.clone());
    }
}

/// The chunk that supplies the header: the first one that found benches,
/// otherwise the first non-degraded one carrying a source or a date.
fn header_chunk(partials: &[ExtractionResult]) -> Option<&ExtractionResult> {
    partials.iter().find(|p| p.has_groups()).or_else(|| {
        partials
            .iter()
            .filter(|p| !p.degraded)
            .find(|p| !p.source.trim().is_empty() || !p.date.trim().is_empty())
    })
}
