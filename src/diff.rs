//! Field-level comparison between two proposal versions
use crate::item::{self, Currency, ServiceItem};
use crate::proposal::ProposalSnapshot;
use crate::settlement::SettlementRule;

/// The fixed watch-list of fields the differ compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchedField {
    Amount,
    Currency,
    Timeline,
    Terms,
    ServicesOffered,
    ServicesRequested,
    Payment,
}

impl WatchedField {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchedField::Amount => "amount",
            WatchedField::Currency => "currency",
            WatchedField::Timeline => "timeline",
            WatchedField::Terms => "terms",
            WatchedField::ServicesOffered => "services_offered",
            WatchedField::ServicesRequested => "services_requested",
            WatchedField::Payment => "payment",
        }
    }

    /// Fields whose change forces settlement re-validation.
    pub fn is_settlement_bearing(&self) -> bool {
        matches!(
            self,
            WatchedField::ServicesOffered | WatchedField::ServicesRequested | WatchedField::Payment
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: WatchedField,
    pub before: String,
    pub after: String,
}

/// Change-set between two versions of one lineage.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionDiff {
    pub from_version: u32,
    pub to_version: u32,
    pub changes: Vec<FieldChange>,
}

impl VersionDiff {
    pub fn summary(&self) -> String {
        format!(
            "{} field(s) changed between version {} and {}",
            self.changes.len(),
            self.from_version,
            self.to_version
        )
    }

    pub fn changed_fields(&self) -> Vec<String> {
        self.changes
            .iter()
            .map(|change| change.field.as_str().to_string())
            .collect()
    }

    pub fn touches_settlement(&self) -> bool {
        self.changes
            .iter()
            .any(|change| change.field.is_settlement_bearing())
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

fn render_money(value: f64) -> String {
    format!("{value:.2}")
}

fn render_text(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

fn render_basket(items: &[ServiceItem]) -> String {
    format!(
        "{} item(s) totalling {:.2}",
        items.len(),
        item::sum(items)
    )
}

fn render_currencies(currencies: &[Currency]) -> String {
    if currencies.is_empty() {
        return "-".to_string();
    }
    currencies
        .iter()
        .map(|currency| currency.code())
        .collect::<Vec<_>>()
        .join(",")
}

fn render_payment(
    rule: Option<SettlementRule>,
    cash_component: Option<f64>,
    explicit_waiver: bool,
) -> String {
    format!(
        "rule {}, cash {}, waiver {}",
        rule.map(|r| r.as_str()).unwrap_or("-"),
        cash_component
            .map(render_money)
            .unwrap_or_else(|| "-".to_string()),
        explicit_waiver
    )
}

/// Currencies of a version's items, in order of appearance across both
/// baskets.
fn currency_profile(snapshot: &ProposalSnapshot) -> Vec<Currency> {
    snapshot
        .services_offered
        .iter()
        .chain(snapshot.services_requested.iter())
        .map(|item| item.currency)
        .collect()
}

/// Compare two versions over the fixed watch-list.
///
/// Comparison is whole-value structural equality, so reordering the items of
/// a basket registers as a change to that basket.
pub fn diff_snapshots(older: &ProposalSnapshot, newer: &ProposalSnapshot) -> VersionDiff {
    let mut changes = Vec::new();

    let amount_before = item::sum(&older.services_offered);
    let amount_after = item::sum(&newer.services_offered);
    if amount_before != amount_after {
        changes.push(FieldChange {
            field: WatchedField::Amount,
            before: render_money(amount_before),
            after: render_money(amount_after),
        });
    }

    let currencies_before = currency_profile(older);
    let currencies_after = currency_profile(newer);
    if currencies_before != currencies_after {
        changes.push(FieldChange {
            field: WatchedField::Currency,
            before: render_currencies(&currencies_before),
            after: render_currencies(&currencies_after),
        });
    }

    if older.timeline != newer.timeline {
        changes.push(FieldChange {
            field: WatchedField::Timeline,
            before: render_text(&older.timeline),
            after: render_text(&newer.timeline),
        });
    }

    if older.terms != newer.terms {
        changes.push(FieldChange {
            field: WatchedField::Terms,
            before: render_text(&older.terms),
            after: render_text(&newer.terms),
        });
    }

    if older.services_offered != newer.services_offered {
        changes.push(FieldChange {
            field: WatchedField::ServicesOffered,
            before: render_basket(&older.services_offered),
            after: render_basket(&newer.services_offered),
        });
    }

    if older.services_requested != newer.services_requested {
        changes.push(FieldChange {
            field: WatchedField::ServicesRequested,
            before: render_basket(&older.services_requested),
            after: render_basket(&newer.services_requested),
        });
    }

    let payment_before = (older.settlement_rule, older.cash_component, older.explicit_waiver);
    let payment_after = (newer.settlement_rule, newer.cash_component, newer.explicit_waiver);
    if payment_before != payment_after {
        changes.push(FieldChange {
            field: WatchedField::Payment,
            before: render_payment(payment_before.0, payment_before.1, payment_before.2),
            after: render_payment(payment_after.0, payment_after.1, payment_after.2),
        });
    }

    VersionDiff {
        from_version: older.version,
        to_version: newer.version,
        changes,
    }
}
