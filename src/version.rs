//! Append-only version creation for a proposal lineage
use crate::error::NegotiationStateError;
use crate::proposal::{BarterProposal, ProposalUpdate};
use uuid7::uuid7;

/// Minimum length of a version comment after trimming.
pub const MIN_COMMENT_LEN: usize = 10;

/// Produce the next version of a lineage from its current latest version.
///
/// The base version is archived as an immutable snapshot in the version
/// history (skipped if the base is already the last archived entry, so the
/// append is idempotent), the updates are merged over the base's content
/// fields, and the version number advances by exactly one with a fresh id.
///
/// The stale-base optimistic-concurrency check happens at the store boundary
/// before this runs; terminal lineages are refused here as well.
pub fn create_version(
    base: &BarterProposal,
    updates: ProposalUpdate,
    comment: &str,
) -> Result<BarterProposal, NegotiationStateError> {
    let trimmed = comment.trim();
    if trimmed.chars().count() < MIN_COMMENT_LEN {
        return Err(NegotiationStateError::CommentTooShort {
            length: trimmed.chars().count(),
        });
    }
    if base.status.is_terminal() {
        return Err(NegotiationStateError::TerminalLineage {
            root: base.lineage_root_id.clone(),
            status: base.status,
        });
    }

    let mut next = base.clone();

    let already_archived = next
        .version_history
        .last()
        .map(|snapshot| snapshot.version == base.version)
        .unwrap_or(false);
    if !already_archived {
        next.version_history.push(base.snapshot());
    }

    next.version = base.version + 1;
    next.id = uuid7().to_string();

    if let Some(items) = updates.services_offered {
        next.services_offered = items;
    }
    if let Some(items) = updates.services_requested {
        next.services_requested = items;
    }
    if let Some(rule) = updates.settlement_rule {
        next.settlement_rule = Some(rule);
    }
    if let Some(amount) = updates.cash_component {
        next.cash_component = Some(amount);
    }
    if let Some(waiver) = updates.explicit_waiver {
        next.explicit_waiver = waiver;
    }
    if let Some(timeline) = updates.timeline {
        next.timeline = Some(timeline);
    }
    if let Some(terms) = updates.terms {
        next.terms = Some(terms);
    }
    if let Some(clause) = updates.dispute_resolution {
        next.dispute_resolution = Some(clause);
    }

    Ok(next)
}
