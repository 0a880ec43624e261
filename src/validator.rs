//! One-pass proposal validation with a complete error list
use crate::equivalence::{EquivalenceResult, calculate_equivalence};
use crate::error::{StructuralError, ValidationIssue};
use crate::item::{BasketSide, ServiceItem};
use crate::proposal::BarterProposal;
use crate::settlement::{SettlementOutcome, apply_settlement_rule};

/// Outcome of validating one proposal version. `errors` holds every problem
/// found in the pass, structural and settlement alike.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub equivalence: EquivalenceResult,
    pub settlement: Option<SettlementOutcome>,
}

fn check_basket(side: BasketSide, items: &[ServiceItem], errors: &mut Vec<ValidationIssue>) {
    if items.is_empty() {
        errors.push(StructuralError::EmptyBasket { side }.into());
        return;
    }
    for (index, item) in items.iter().enumerate() {
        if item.quantity <= 0.0 {
            errors.push(StructuralError::NonPositiveQuantity { side, index }.into());
        }
        if item.unit_price <= 0.0 {
            errors.push(StructuralError::NonPositiveUnitPrice { side, index }.into());
        }
    }
}

/// Run the full check battery over a proposal version: structural checks,
/// value equivalence, then the chosen settlement rule. Problems are collected
/// rather than short-circuited so the caller sees the complete list in one
/// pass.
pub fn validate_proposal(proposal: &BarterProposal) -> ValidationReport {
    let mut errors: Vec<ValidationIssue> = Vec::new();

    check_basket(BasketSide::Offered, &proposal.services_offered, &mut errors);
    check_basket(
        BasketSide::Requested,
        &proposal.services_requested,
        &mut errors,
    );

    if proposal.settlement_rule.is_none() {
        errors.push(StructuralError::MissingSettlementRule.into());
    }
    if let Some(cash) = proposal.cash_component {
        if cash < 0.0 {
            errors.push(StructuralError::NegativeCashComponent(cash).into());
        }
    }

    let equivalence =
        calculate_equivalence(&proposal.services_offered, &proposal.services_requested);

    let settlement = proposal.settlement_rule.and_then(|rule| {
        match apply_settlement_rule(&equivalence, rule, &proposal.settlement_options()) {
            Ok(outcome) => Some(outcome),
            Err(violation) => {
                errors.push(violation.into());
                None
            }
        }
    });

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        equivalence,
        settlement,
    }
}
