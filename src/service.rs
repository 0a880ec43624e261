//! Service layer API for negotiation workflow operations
use crate::agreement::{AgreementTerms, generate_agreement};
use crate::diff::diff_snapshots;
use crate::error::{NegotiationError, NegotiationStateError};
use crate::item::ItemNormalizer;
use crate::proposal::{
    BarterProposal, NegotiationAction, NegotiationStatus, ProposalDraft, ProposalStatus,
    ProposalUpdate, ThreadEntry, TimeStamp,
};
use crate::store::ProposalStore;
use crate::validator::{ValidationReport, validate_proposal};
use crate::version::create_version;

/// The negotiation state machine over an injected storage port and item
/// normalizer.
pub struct NegotiationService<S: ProposalStore, N: ItemNormalizer> {
    store: S,
    normalizer: N,
}

impl<S: ProposalStore, N: ItemNormalizer> NegotiationService<S, N> {
    pub fn new(store: S, normalizer: N) -> Self {
        Self { store, normalizer }
    }

    /// Load a lineage's current version.
    fn load_current(&self, lineage_root_id: &str) -> Result<BarterProposal, NegotiationError> {
        Ok(self.store.load(lineage_root_id)?)
    }

    /// Guards shared by every transition: the lineage must be open and the
    /// caller must be editing its latest version.
    fn guard_open_and_fresh(
        current: &BarterProposal,
        base_version: u32,
    ) -> Result<(), NegotiationStateError> {
        if current.status.is_terminal() {
            return Err(NegotiationStateError::TerminalLineage {
                root: current.lineage_root_id.clone(),
                status: current.status,
            });
        }
        if current.version != base_version {
            return Err(NegotiationStateError::StaleBase {
                provided: base_version,
                current: current.version,
            });
        }
        Ok(())
    }

    /// Submit a new proposal, opening a lineage at version 1.
    ///
    /// The draft is validated before anything is stored; an invalid draft is
    /// refused with the validator's complete error list.
    pub fn submit(&self, draft: ProposalDraft) -> Result<BarterProposal, NegotiationError> {
        let mut proposal = draft
            .finalise(&self.normalizer)
            .map_err(|err| NegotiationStateError::ValidationFailed(vec![err.into()]))?;

        let report = validate_proposal(&proposal);
        if !report.valid {
            return Err(NegotiationStateError::ValidationFailed(report.errors).into());
        }

        proposal.push_thread_entry(ThreadEntry::new(
            proposal.version,
            NegotiationAction::Submit,
            proposal.proposed_by.clone(),
            vec![],
            TimeStamp::new(),
            None,
        ));

        self.store.save(&proposal)?;
        Ok(proposal)
    }

    /// Counter a proposal with changed terms. Only the opportunity owner may
    /// counter, and never a version they submitted themselves.
    pub fn counter_offer(
        &self,
        lineage_root_id: &str,
        base_version: u32,
        updates: ProposalUpdate,
        actor_id: &str,
        comment: &str,
    ) -> Result<BarterProposal, NegotiationError> {
        let current = self.load_current(lineage_root_id)?;
        Self::guard_open_and_fresh(&current, base_version)?;

        if actor_id != current.opportunity_owner || actor_id == current.proposed_by {
            return Err(NegotiationStateError::WrongParty {
                actor: actor_id.to_string(),
            }
            .into());
        }

        self.transition(
            current,
            updates,
            actor_id,
            comment,
            NegotiationAction::Counteroffer,
            NegotiationStatus::Counteroffer,
        )
    }

    /// Revise a proposal under negotiation. Either negotiating party may
    /// revise while a counteroffer is open or the lineage is in negotiation.
    pub fn revise(
        &self,
        lineage_root_id: &str,
        base_version: u32,
        updates: ProposalUpdate,
        actor_id: &str,
        comment: &str,
    ) -> Result<BarterProposal, NegotiationError> {
        let current = self.load_current(lineage_root_id)?;
        Self::guard_open_and_fresh(&current, base_version)?;

        let (proposer, owner) = current.participants();
        if actor_id != proposer && actor_id != owner {
            return Err(NegotiationStateError::WrongParty {
                actor: actor_id.to_string(),
            }
            .into());
        }
        if current.negotiation_status != NegotiationStatus::Counteroffer
            && current.status != ProposalStatus::Negotiation
        {
            return Err(NegotiationStateError::IllegalTransition {
                from: current.negotiation_status,
            }
            .into());
        }

        self.transition(
            current,
            updates,
            actor_id,
            comment,
            NegotiationAction::Revision,
            NegotiationStatus::Revision,
        )
    }

    /// Accept the lineage's current version, closing the lineage and
    /// generating the agreement terms for contract creation.
    pub fn accept(
        &self,
        lineage_root_id: &str,
        expected_version: u32,
        actor_id: &str,
        notes: Option<&str>,
    ) -> Result<(BarterProposal, AgreementTerms), NegotiationError> {
        let mut current = self.load_current(lineage_root_id)?;
        Self::guard_open_and_fresh(&current, expected_version)?;

        let report = validate_proposal(&current);
        if !report.valid {
            return Err(NegotiationStateError::ValidationFailed(report.errors).into());
        }
        let settlement = report
            .settlement
            .clone()
            .ok_or_else(|| NegotiationStateError::ValidationFailed(report.errors.clone()))?;

        let terms = generate_agreement(&current, &report.equivalence, &settlement);

        current.status = ProposalStatus::Accepted;
        current.negotiation_status = NegotiationStatus::Accepted;
        current.push_thread_entry(ThreadEntry::new(
            current.version,
            NegotiationAction::Accept,
            actor_id.to_string(),
            vec![],
            TimeStamp::new(),
            notes.map(|s| s.to_string()),
        ));

        self.store.save(&current)?;
        Ok((current, terms))
    }

    /// Reject the lineage's current version, closing the lineage.
    pub fn reject(
        &self,
        lineage_root_id: &str,
        expected_version: u32,
        actor_id: &str,
        notes: Option<&str>,
    ) -> Result<BarterProposal, NegotiationError> {
        let mut current = self.load_current(lineage_root_id)?;
        Self::guard_open_and_fresh(&current, expected_version)?;

        current.status = ProposalStatus::Rejected;
        current.negotiation_status = NegotiationStatus::Rejected;
        current.push_thread_entry(ThreadEntry::new(
            current.version,
            NegotiationAction::Reject,
            actor_id.to_string(),
            vec![],
            TimeStamp::new(),
            notes.map(|s| s.to_string()),
        ));

        self.store.save(&current)?;
        Ok(current)
    }

    /// Validate a lineage's current version without changing anything.
    pub fn validate(&self, lineage_root_id: &str) -> Result<ValidationReport, NegotiationError> {
        let current = self.load_current(lineage_root_id)?;
        Ok(validate_proposal(&current))
    }

    /// Shared tail of counteroffer/revision: create the next version, diff it
    /// against the base, re-validate when settlement-bearing fields moved,
    /// record the thread entry and persist.
    fn transition(
        &self,
        current: BarterProposal,
        updates: ProposalUpdate,
        actor_id: &str,
        comment: &str,
        action: NegotiationAction,
        negotiation_status: NegotiationStatus,
    ) -> Result<BarterProposal, NegotiationError> {
        let mut next = create_version(&current, updates, comment)?;
        next.proposed_by = actor_id.to_string();
        next.status = ProposalStatus::Negotiation;
        next.negotiation_status = negotiation_status;

        let diff = diff_snapshots(&current.snapshot(), &next.snapshot());
        if diff.touches_settlement() {
            let report = validate_proposal(&next);
            if !report.valid {
                return Err(NegotiationStateError::ValidationFailed(report.errors).into());
            }
        }

        next.push_thread_entry(ThreadEntry::new(
            next.version,
            action,
            actor_id.to_string(),
            diff.changed_fields(),
            TimeStamp::new(),
            Some(comment.to_string()),
        ));

        self.store.save(&next)?;
        Ok(next)
    }
}
