//! Settlement policies for value-imbalanced exchanges
use crate::equivalence::EquivalenceResult;
use crate::error::SettlementViolation;

/// Absolute tolerance when matching a supplied cash component against the
/// basket imbalance.
pub const CASH_TOLERANCE: f64 = 0.01;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementRule {
    #[n(0)]
    EqualValueOnly,
    #[n(1)]
    AllowDifferenceWithCash,
    #[n(2)]
    AcceptAsIs,
}

impl SettlementRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementRule::EqualValueOnly => "equal-value-only",
            SettlementRule::AllowDifferenceWithCash => "allow-difference-with-cash",
            SettlementRule::AcceptAsIs => "accept-as-is",
        }
    }
}

/// Rule-specific knobs supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettlementOptions {
    pub cash_component: Option<f64>,
    pub explicit_waiver: bool,
}

/// Which side owes the cash component of a hybrid exchange. Always the side
/// whose basket is worth less.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashDirection {
    #[n(0)]
    OfferingParty,
    #[n(1)]
    RequestingParty,
}

/// Settlement decision for one proposal version. The variants carry exactly
/// the data that is meaningful for their tag, so a cash amount on a waived
/// outcome is unrepresentable.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub enum SettlementOutcome {
    #[n(0)]
    Equal,
    #[n(1)]
    CashBalanced {
        #[n(0)]
        cash_component: f64,
        #[n(1)]
        direction: CashDirection,
        /// True when no cash amount was supplied and the component is the
        /// advisory expected amount, still awaiting confirmation.
        #[n(2)]
        pending: bool,
    },
    #[n(2)]
    Waived {
        #[n(0)]
        waived_amount: f64,
    },
}

impl SettlementOutcome {
    /// Whether the counterparty still has to consent to this outcome.
    pub fn requires_consent(&self) -> bool {
        !matches!(self, SettlementOutcome::Equal)
    }

    pub fn cash_component(&self) -> f64 {
        match self {
            SettlementOutcome::CashBalanced { cash_component, .. } => *cash_component,
            SettlementOutcome::Equal | SettlementOutcome::Waived { .. } => 0.0,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            SettlementOutcome::Equal => "EQUAL",
            SettlementOutcome::CashBalanced { .. } => "CASH_BALANCED",
            SettlementOutcome::Waived { .. } => "WAIVED",
        }
    }
}

/// Apply a settlement rule to an equivalence result.
///
/// Baskets already within tolerance settle as [`SettlementOutcome::Equal`]
/// with a zero cash component no matter which rule was chosen; the rules only
/// dispatch on genuinely imbalanced exchanges.
pub fn apply_settlement_rule(
    equivalence: &EquivalenceResult,
    rule: SettlementRule,
    options: &SettlementOptions,
) -> Result<SettlementOutcome, SettlementViolation> {
    if equivalence.is_equal {
        return Ok(SettlementOutcome::Equal);
    }

    match rule {
        SettlementRule::EqualValueOnly => Err(SettlementViolation::ValueMismatch {
            delta: equivalence.absolute_balance,
        }),
        SettlementRule::AllowDifferenceWithCash => {
            let direction = if equivalence.balance < 0.0 {
                CashDirection::OfferingParty
            } else {
                CashDirection::RequestingParty
            };

            match options.cash_component {
                Some(provided) => {
                    if (provided - equivalence.absolute_balance).abs() <= CASH_TOLERANCE {
                        Ok(SettlementOutcome::CashBalanced {
                            cash_component: provided,
                            direction,
                            pending: false,
                        })
                    } else {
                        Err(SettlementViolation::CashMismatch {
                            expected: equivalence.absolute_balance,
                            provided,
                        })
                    }
                }
                // No amount supplied: report the expected cash component as
                // advisory and leave the outcome pending confirmation.
                None => Ok(SettlementOutcome::CashBalanced {
                    cash_component: equivalence.absolute_balance,
                    direction,
                    pending: true,
                }),
            }
        }
        SettlementRule::AcceptAsIs => {
            if options.explicit_waiver {
                Ok(SettlementOutcome::Waived {
                    waived_amount: equivalence.absolute_balance,
                })
            } else {
                Err(SettlementViolation::WaiverRequired {
                    imbalance: equivalence.absolute_balance,
                })
            }
        }
    }
}
