//! Finalized agreement terms for downstream contract creation
use crate::equivalence::EquivalenceResult;
use crate::item::ServiceItem;
use crate::proposal::BarterProposal;
use crate::settlement::SettlementOutcome;

pub const DEFAULT_EXCHANGE_SCHEDULE: &str =
    "Services exchanged within 30 days of agreement acceptance";
pub const DEFAULT_QUALITY_STANDARD: &str =
    "Services delivered to a professional standard consistent with the listing";
pub const DEFAULT_DISPUTE_RESOLUTION: &str = "Disputes resolved through platform mediation";

/// Immutable terms record generated from an accepted proposal version.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct AgreementTerms {
    #[n(0)]
    pub proposal_id: String,
    #[n(1)]
    pub lineage_root_id: String,
    #[n(2)]
    pub version: u32,
    #[n(3)]
    pub proposer_id: String,
    #[n(4)]
    pub owner_id: String,
    #[n(5)]
    pub services_offered: Vec<ServiceItem>,
    #[n(6)]
    pub services_requested: Vec<ServiceItem>,
    #[n(7)]
    pub total_offered: f64,
    #[n(8)]
    pub total_requested: f64,
    #[n(9)]
    pub settlement: SettlementOutcome,
    #[n(10)]
    pub exchange_schedule: String,
    #[n(11)]
    pub quality_standard: String,
    #[n(12)]
    pub dispute_resolution: String,
}

/// Pure transform from a validated proposal to its agreement terms.
///
/// Reads no clock and mints no ids, so the same inputs always produce
/// field-identical output. The settlement union carries the cash amount and
/// direction for cash-balanced outcomes, the waived amount for waived ones,
/// and nothing extra when the baskets were equal.
pub fn generate_agreement(
    proposal: &BarterProposal,
    equivalence: &EquivalenceResult,
    settlement: &SettlementOutcome,
) -> AgreementTerms {
    let (proposer_id, owner_id) = proposal.participants();

    AgreementTerms {
        proposal_id: proposal.id.clone(),
        lineage_root_id: proposal.lineage_root_id.clone(),
        version: proposal.version,
        proposer_id,
        owner_id,
        services_offered: proposal.services_offered.clone(),
        services_requested: proposal.services_requested.clone(),
        total_offered: equivalence.total_offered,
        total_requested: equivalence.total_requested,
        settlement: settlement.clone(),
        exchange_schedule: proposal
            .timeline
            .clone()
            .unwrap_or_else(|| DEFAULT_EXCHANGE_SCHEDULE.to_string()),
        quality_standard: proposal
            .terms
            .clone()
            .unwrap_or_else(|| DEFAULT_QUALITY_STANDARD.to_string()),
        dispute_resolution: proposal
            .dispute_resolution
            .clone()
            .unwrap_or_else(|| DEFAULT_DISPUTE_RESOLUTION.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Currency, RawServiceItem, StandardNormalizer};
    use crate::proposal::ProposalDraft;
    use crate::settlement::SettlementRule;
    use crate::validator::validate_proposal;

    fn validated_proposal() -> BarterProposal {
        ProposalDraft::new()
            .proposed_by("user_a")
            .opportunity_owner("user_b")
            .offer_service(RawServiceItem::new("design", 1.0, 1_200.0, Currency::EUR))
            .request_service(RawServiceItem::new("writing", 1.0, 1_000.0, Currency::EUR))
            .set_settlement_rule(SettlementRule::AllowDifferenceWithCash)
            .set_cash_component(200.0)
            .set_timeline("delivery by end of quarter")
            .finalise(&StandardNormalizer)
            .unwrap()
    }

    #[test]
    fn generation_is_idempotent() {
        let proposal = validated_proposal();
        let report = validate_proposal(&proposal);
        let settlement = report.settlement.unwrap();

        let first = generate_agreement(&proposal, &report.equivalence, &settlement);
        let second = generate_agreement(&proposal, &report.equivalence, &settlement);

        assert_eq!(first, second);
    }

    #[test]
    fn overrides_win_over_default_clauses() {
        let proposal = validated_proposal();
        let report = validate_proposal(&proposal);
        let terms = generate_agreement(
            &proposal,
            &report.equivalence,
            report.settlement.as_ref().unwrap(),
        );

        assert_eq!(terms.exchange_schedule, "delivery by end of quarter");
        assert_eq!(terms.quality_standard, DEFAULT_QUALITY_STANDARD);
        assert_eq!(terms.dispute_resolution, DEFAULT_DISPUTE_RESOLUTION);
        assert_eq!(terms.settlement.cash_component(), 200.0);
    }
}
