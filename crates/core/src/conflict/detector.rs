//! Conflict pairing.
//!
//! Both delta sequences are ordered by their OLD offsets and address the same
//! merge buffer, so a single forward sweep finds every overlapping pair.
//! Each pair is then classified: identical edits are SAME, otherwise the
//! first resolve option in the chain that accepts the pair makes it
//! RESOLVABLE, and anything else is CONFLICTING.

use std::collections::HashMap;

use tracing::{debug, info};

use super::{ConflictPair, ConflictType};
use crate::diff::{ranges_overlap, ChangeKind, ChangeSide, FileDiff};
use crate::resolve::{is_same_change, ConflictContext, ResolveOptionChain};

/// Indices `(yours, theirs)` of every pair of deltas whose OLD ranges
/// overlap, in ascending OLD order. Rename markers never overlap anything.
pub fn overlapping_pairs(yours: &FileDiff, theirs: &FileDiff) -> Vec<(usize, usize)> {
    let theirs_deltas = theirs.deltas();
    let mut pairs = Vec::new();
    let mut low = 0;

    for (yi, y) in yours.deltas().iter().enumerate() {
        if y.kind() == ChangeKind::Rename {
            continue;
        }
        let y_span = y.span(ChangeSide::Old);
        // Deltas ending before this one starts cannot reach any later delta.
        while low < theirs_deltas.len() && theirs_deltas[low].span(ChangeSide::Old).end < y_span.start {
            low += 1;
        }
        let mut ti = low;
        while ti < theirs_deltas.len() && theirs_deltas[ti].span(ChangeSide::Old).start <= y_span.end {
            let t = &theirs_deltas[ti];
            if t.kind() != ChangeKind::Rename && ranges_overlap(&y_span, &t.span(ChangeSide::Old)) {
                pairs.push((yi, ti));
            }
            ti += 1;
        }
    }
    pairs
}

/// Classifies overlapping delta pairs with a resolve-option chain.
#[derive(Debug)]
pub struct ConflictDetector<'a> {
    chain: &'a ResolveOptionChain,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(chain: &'a ResolveOptionChain) -> Self {
        Self { chain }
    }

    /// Find and classify every overlapping pair between the two diffs.
    ///
    /// A delta that overlaps more than one counterpart is only ever SAME or
    /// CONFLICTING: pairwise strategies cannot reconcile a cluster.
    pub fn detect(&self, yours: &FileDiff, theirs: &FileDiff) -> Vec<ConflictPair> {
        let overlaps = overlapping_pairs(yours, theirs);

        let mut yours_count: HashMap<usize, usize> = HashMap::new();
        let mut theirs_count: HashMap<usize, usize> = HashMap::new();
        for &(y, t) in &overlaps {
            *yours_count.entry(y).or_default() += 1;
            *theirs_count.entry(t).or_default() += 1;
        }

        let pairs: Vec<ConflictPair> = overlaps
            .into_iter()
            .map(|(y, t)| {
                let clustered = yours_count.get(&y).copied().unwrap_or(0) > 1
                    || theirs_count.get(&t).copied().unwrap_or(0) > 1;
                let conflict = match ConflictContext::new(yours, theirs, y, t) {
                    Ok(ctx) if is_same_change(&ctx) => ConflictType::Same,
                    Ok(_) if clustered => ConflictType::Conflicting,
                    Ok(ctx) => match self.chain.find(&ctx) {
                        Some(option) => ConflictType::Resolvable(option.name()),
                        None => ConflictType::Conflicting,
                    },
                    Err(_) => ConflictType::Conflicting,
                };
                debug!(yours = y, theirs = t, %conflict, "classified delta pair");
                ConflictPair {
                    yours: y,
                    theirs: t,
                    conflict,
                }
            })
            .collect();

        let conflicting = pairs.iter().filter(|p| p.conflict.is_conflicting()).count();
        info!(
            path = yours.header().path(),
            pairs = pairs.len(),
            conflicting,
            "conflict pairing complete"
        );
        pairs
    }
}
