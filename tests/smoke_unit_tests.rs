//! Smoke Screen Unit tests for negotiation engine components
//!
//! These test are unit tests that span the codebase, testing behavior in
//! isolation from integration scenarios. These are intended as smoke-screen
//! and generally test the happy-path.
//!
#![allow(unused_imports)]

use barter_negotiation::agreement::{
    DEFAULT_DISPUTE_RESOLUTION, DEFAULT_EXCHANGE_SCHEDULE, DEFAULT_QUALITY_STANDARD,
    generate_agreement,
};
use barter_negotiation::diff::diff_snapshots;
use barter_negotiation::equivalence::calculate_equivalence;
use barter_negotiation::error::{
    NegotiationStateError, SettlementViolation, StructuralError, ValidationIssue,
};
use barter_negotiation::item::{
    Currency, ItemNormalizer, RawServiceItem, ServiceItem, StandardNormalizer,
};
use barter_negotiation::proposal::{
    BarterProposal, NegotiationStatus, ProposalDraft, ProposalStatus, ProposalUpdate,
};
use barter_negotiation::settlement::{
    SettlementOptions, SettlementOutcome, SettlementRule, apply_settlement_rule,
};
use barter_negotiation::utils::new_uuid_to_bech32;
use barter_negotiation::validator::validate_proposal;
use barter_negotiation::version::create_version;

fn usd_item(description: &str, quantity: f64, unit_price: f64) -> RawServiceItem {
    RawServiceItem::new(description, quantity, unit_price, Currency::USD)
}

fn hybrid_proposal(offered_total: f64, requested_total: f64) -> BarterProposal {
    ProposalDraft::new()
        .proposed_by("user_proposer")
        .opportunity_owner("user_owner")
        .offer_service(usd_item("offered services", 1.0, offered_total))
        .request_service(usd_item("requested services", 1.0, requested_total))
        .set_settlement_rule(SettlementRule::AllowDifferenceWithCash)
        .finalise(&StandardNormalizer)
        .unwrap()
}

// UTILS MODULE TESTS
#[cfg(test)]
mod utils_tests {
    use super::*;

    /// Test that new_uuid_to_bech32 generates valid bech32-encoded strings
    /// with the correct human-readable prefix
    #[test]
    fn generates_valid_bech32_with_hrp() {
        let result = new_uuid_to_bech32("user_");
        assert!(result.is_ok());

        let encoded = result.unwrap();
        assert!(encoded.starts_with("user_1"));
        assert!(encoded.len() > 10); // UUID should produce substantial output
    }

    /// Test that the function handles empty strings appropriately
    #[test]
    fn handles_empty_hrp() {
        // Empty string should fail
        let result = new_uuid_to_bech32("");
        assert!(result.is_err());
    }

    /// Test that multiple calls generate unique identifiers
    #[test]
    fn generates_unique_ids() {
        let id1 = new_uuid_to_bech32("user_").unwrap();
        let id2 = new_uuid_to_bech32("user_").unwrap();

        assert_ne!(id1, id2);
    }
}

// EQUIVALENCE MODULE TESTS
#[cfg(test)]
mod equivalence_tests {
    use super::*;

    /// Test the headline scenario: two 100_000 baskets are equal and no rule
    /// demands consent
    #[test]
    fn equal_baskets_need_no_consent_under_any_rule() {
        let proposal = hybrid_proposal(100_000.0, 100_000.0);
        let equivalence =
            calculate_equivalence(&proposal.services_offered, &proposal.services_requested);

        assert!(equivalence.is_equal);

        for rule in [
            SettlementRule::EqualValueOnly,
            SettlementRule::AllowDifferenceWithCash,
            SettlementRule::AcceptAsIs,
        ] {
            let outcome =
                apply_settlement_rule(&equivalence, rule, &SettlementOptions::default()).unwrap();
            assert!(!outcome.requires_consent());
            assert_eq!(outcome.cash_component(), 0.0);
        }
    }

    /// Test that tiny differences inside the tolerance still count as equal
    #[test]
    fn tolerance_absorbs_rounding_noise() {
        // 0.005% apart, inside the 0.01% tolerance
        let offered = vec![
            StandardNormalizer
                .normalize(&usd_item("offered", 1.0, 100_005.0))
                .unwrap(),
        ];
        let requested = vec![
            StandardNormalizer
                .normalize(&usd_item("requested", 1.0, 100_000.0))
                .unwrap(),
        ];

        let equivalence = calculate_equivalence(&offered, &requested);
        assert!(equivalence.is_equal);
    }

    /// Test that per-currency subtotals expose a multi-currency mismatch to
    /// the caller
    #[test]
    fn subtotals_surface_currency_mismatch() {
        let offered = vec![
            StandardNormalizer
                .normalize(&RawServiceItem::new("offered", 1.0, 1_000.0, Currency::USD))
                .unwrap(),
        ];
        let requested = vec![
            StandardNormalizer
                .normalize(&RawServiceItem::new("requested", 1.0, 1_000.0, Currency::EUR))
                .unwrap(),
        ];

        let equivalence = calculate_equivalence(&offered, &requested);

        // the totals agree, the currencies do not; detection is the caller's
        assert!(equivalence.is_equal);
        assert!(equivalence.offered_by_currency.contains_key(&Currency::USD));
        assert!(equivalence.requested_by_currency.contains_key(&Currency::EUR));
    }
}

// VALIDATOR MODULE TESTS
#[cfg(test)]
mod validator_tests {
    use super::*;

    /// Test the worked example: 120_000 vs 100_000 with matching cash passes
    #[test]
    fn matching_cash_component_passes() {
        let mut proposal = hybrid_proposal(120_000.0, 100_000.0);
        proposal.cash_component = Some(20_000.0);

        let report = validate_proposal(&proposal);

        assert!(report.valid);
        assert_eq!(report.equivalence.absolute_balance, 20_000.0);
    }

    /// Test the worked example: a 19_000 cash component is rejected and the
    /// error names both amounts
    #[test]
    fn mismatched_cash_component_fails_naming_both_amounts() {
        let mut proposal = hybrid_proposal(120_000.0, 100_000.0);
        proposal.cash_component = Some(19_000.0);

        let report = validate_proposal(&proposal);

        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec![ValidationIssue::Settlement(SettlementViolation::CashMismatch {
                expected: 20_000.0,
                provided: 19_000.0,
            })]
        );
    }

    /// Test that a proposal with no settlement rule reports the missing rule
    /// together with any other structural problems
    #[test]
    fn missing_rule_is_collected_not_fail_fast() {
        let mut proposal = hybrid_proposal(1_000.0, 1_000.0);
        proposal.settlement_rule = None;
        proposal.services_requested.clear();

        let report = validate_proposal(&proposal);

        assert!(!report.valid);
        assert!(report.errors.contains(&ValidationIssue::Structural(
            StructuralError::MissingSettlementRule
        )));
        assert_eq!(report.errors.len(), 2);
    }
}

// AGREEMENT MODULE TESTS
#[cfg(test)]
mod agreement_tests {
    use super::*;

    /// Test that agreement generation embeds the waived amount for waived
    /// settlements
    #[test]
    fn waived_settlement_carries_the_waived_amount() {
        let mut proposal = hybrid_proposal(120_000.0, 100_000.0);
        proposal.settlement_rule = Some(SettlementRule::AcceptAsIs);
        proposal.explicit_waiver = true;

        let report = validate_proposal(&proposal);
        assert!(report.valid);

        let terms = generate_agreement(
            &proposal,
            &report.equivalence,
            report.settlement.as_ref().unwrap(),
        );

        assert_eq!(
            terms.settlement,
            SettlementOutcome::Waived { waived_amount: 20_000.0 }
        );
        assert_eq!(terms.settlement.tag(), "WAIVED");
        assert_eq!(terms.exchange_schedule, DEFAULT_EXCHANGE_SCHEDULE);
        assert_eq!(terms.quality_standard, DEFAULT_QUALITY_STANDARD);
        assert_eq!(terms.dispute_resolution, DEFAULT_DISPUTE_RESOLUTION);
    }

    /// Test that repeated generation over the same inputs is field-identical
    #[test]
    fn repeated_generation_is_field_identical() {
        let mut proposal = hybrid_proposal(120_000.0, 100_000.0);
        proposal.cash_component = Some(20_000.0);

        let report = validate_proposal(&proposal);
        let settlement = report.settlement.unwrap();

        let first = generate_agreement(&proposal, &report.equivalence, &settlement);
        let second = generate_agreement(&proposal, &report.equivalence, &settlement);
        let third = generate_agreement(&proposal, &report.equivalence, &settlement);

        assert_eq!(first, second);
        assert_eq!(second, third);
    }
}

// DIFF MODULE TESTS
#[cfg(test)]
mod diff_tests {
    use super::*;

    /// Test that the summary line counts changes between the right versions
    #[test]
    fn summary_names_versions_and_count() {
        let base = hybrid_proposal(1_000.0, 1_000.0);
        let next = create_version(
            &base,
            ProposalUpdate::new()
                .set_timeline("four weeks")
                .set_cash_component(100.0)
                .set_terms("priority support included"),
            "updating three fields",
        )
        .unwrap();

        let diff = diff_snapshots(&base.snapshot(), &next.snapshot());

        assert_eq!(diff.summary(), "3 field(s) changed between version 1 and 2");
        assert!(diff.touches_settlement());
    }

    /// Test that basket edits flag both the amount and the basket itself
    #[test]
    fn basket_edit_flags_amount_and_basket() {
        let base = hybrid_proposal(1_000.0, 1_000.0);
        let next = create_version(
            &base,
            ProposalUpdate::new().set_services_offered(vec![
                StandardNormalizer
                    .normalize(&usd_item("offered services", 1.0, 1_500.0))
                    .unwrap(),
            ]),
            "offering more value",
        )
        .unwrap();

        let diff = diff_snapshots(&base.snapshot(), &next.snapshot());

        assert_eq!(diff.changed_fields(), vec!["amount", "services_offered"]);
    }
}

// PROPOSAL MODULE TESTS
#[cfg(test)]
mod proposal_tests {
    use super::*;

    /// Test that a proposal CBOR round-trips with history and thread intact
    #[test]
    fn proposal_cbor_roundtrip() {
        let base = hybrid_proposal(2_000.0, 1_500.0);
        let next = create_version(
            &base,
            ProposalUpdate::new().set_cash_component(500.0),
            "covering the difference in cash",
        )
        .unwrap();

        let encoded = minicbor::to_vec(&next).unwrap();
        let decoded: BarterProposal = minicbor::decode(&encoded).unwrap();

        assert_eq!(next, decoded);
        assert_eq!(decoded.version_history.len(), 1);
    }

    /// Test that finalising a draft containing an item with no currency is
    /// refused by the injected normalizer
    #[test]
    fn draft_with_missing_currency_is_refused() {
        let draft = ProposalDraft::new()
            .proposed_by("user_proposer")
            .opportunity_owner("user_owner")
            .offer_service(RawServiceItem {
                description: "design retainer".to_string(),
                quantity: 1.0,
                unit_price: 1_000.0,
                currency: None,
            })
            .request_service(usd_item("copywriting", 1.0, 1_000.0))
            .set_settlement_rule(SettlementRule::EqualValueOnly);

        let result = draft.finalise(&StandardNormalizer);

        assert!(matches!(
            result,
            Err(StructuralError::MissingItemCurrency { .. })
        ));
    }

    /// Test that participants are stable across authorship changes
    #[test]
    fn participants_survive_counteroffers() {
        let base = hybrid_proposal(1_000.0, 1_000.0);
        let mut next = create_version(
            &base,
            ProposalUpdate::new().set_timeline("four weeks"),
            "pushing the timeline",
        )
        .unwrap();
        // the owner authored this version
        next.proposed_by = "user_owner".to_string();

        let (proposer, owner) = next.participants();
        assert_eq!(proposer, "user_proposer");
        assert_eq!(owner, "user_owner");
    }
}
