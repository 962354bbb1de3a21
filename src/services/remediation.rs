//! Remediation consolidation.
//!
//! npm frequently proposes one upgrade per resolved advisory even when
//! several advisories share the same action. Proposals with byte-identical
//! summaries are merged so each upgrade appears once with all its fixes.

use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::models::report::Remediation;
use crate::services::fingerprint;

/// Merge proposals that share a summary.
///
/// Output keeps the order in which each distinct summary first appeared;
/// fixes are concatenated in input order without deduplication.
pub fn consolidate(proposals: Vec<Remediation>) -> Vec<Remediation> {
    let total = proposals.len();
    let mut grouped: IndexMap<String, Remediation> = IndexMap::with_capacity(total);

    for proposal in proposals {
        match grouped.entry(fingerprint::compute_remediation(&proposal.summary)) {
            Entry::Occupied(mut existing) => existing.get_mut().fixes.extend(proposal.fixes),
            Entry::Vacant(slot) => {
                slot.insert(proposal);
            }
        }
    }

    tracing::debug!(
        proposals = total,
        remediations = grouped.len(),
        "Consolidated remediations"
    );

    grouped.into_values().collect()
}
