use crate::item::BasketSide;
use crate::proposal::{NegotiationStatus, ProposalStatus};

/// Structural problems with a proposal's shape. Collected by the validator,
/// never fail-fast.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StructuralError {
    #[error("the {side} services basket is empty")]
    EmptyBasket { side: BasketSide },
    #[error("no settlement rule was chosen")]
    MissingSettlementRule,
    #[error("{side} item {index} has a non-positive quantity")]
    NonPositiveQuantity { side: BasketSide, index: usize },
    #[error("{side} item {index} has a non-positive unit price")]
    NonPositiveUnitPrice { side: BasketSide, index: usize },
    #[error("service item {description:?} is missing a currency")]
    MissingItemCurrency { description: String },
    #[error("cash component {0} is negative")]
    NegativeCashComponent(f64),
    #[error("{role} is not set")]
    MissingParticipant { role: &'static str },
}

/// Settlement-rule failures. Collected alongside [`StructuralError`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SettlementViolation {
    #[error("baskets differ by {delta:.2}; the equal-value rule requires parity")]
    ValueMismatch { delta: f64 },
    #[error("cash component {provided:.2} does not cover the imbalance; expected {expected:.2}")]
    CashMismatch { expected: f64, provided: f64 },
    #[error("an imbalance of {imbalance:.2} requires explicit waiver consent")]
    WaiverRequired { imbalance: f64 },
}

/// A single entry in a validation report's error list.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    #[error(transparent)]
    Structural(#[from] StructuralError),
    #[error(transparent)]
    Settlement(#[from] SettlementViolation),
}

/// Protocol violations in the negotiation workflow. These are fail-fast: the
/// first one encountered aborts the transition.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum NegotiationStateError {
    #[error(
        "revision comment must be at least {} characters after trimming, got {length}",
        crate::version::MIN_COMMENT_LEN
    )]
    CommentTooShort { length: usize },
    #[error("lineage {root} is closed with status {status:?}")]
    TerminalLineage { root: String, status: ProposalStatus },
    #[error("actor {actor} is not permitted to make this transition")]
    WrongParty { actor: String },
    #[error("transition not permitted while negotiation is {from:?}")]
    IllegalTransition { from: NegotiationStatus },
    #[error("base version {provided} is stale, lineage is at version {current}")]
    StaleBase { provided: u32, current: u32 },
    #[error("proposal failed validation with {} problem(s)", .0.len())]
    ValidationFailed(Vec<ValidationIssue>),
}

/// Lineage lookup and storage failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LineageError {
    #[error("no proposal lineage found for root {0}")]
    UnknownLineage(String),
    #[error("missing snapshot for version {version} of lineage {root}")]
    MissingSnapshot { root: String, version: u32 },
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Top-level error surface of the negotiation service.
#[derive(thiserror::Error, Debug)]
pub enum NegotiationError {
    #[error(transparent)]
    State(#[from] NegotiationStateError),
    #[error(transparent)]
    Lineage(#[from] LineageError),
}
