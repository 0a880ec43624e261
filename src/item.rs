//! Service items and basket arithmetic
use crate::error::StructuralError;
use std::collections::BTreeMap;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, Ord, PartialEq, PartialOrd)]
pub enum Currency {
    #[n(0)]
    USD,
    #[n(1)]
    GBP,
    #[n(2)]
    EUR,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::GBP => "GBP",
            Currency::EUR => "EUR",
        }
    }
}

/// Which basket of an exchange an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasketSide {
    Offered,
    Requested,
}

impl std::fmt::Display for BasketSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BasketSide::Offered => write!(f, "offered"),
            BasketSide::Requested => write!(f, "requested"),
        }
    }
}

/// A normalized service item as it appears inside a proposal basket.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct ServiceItem {
    #[n(0)]
    pub description: String,
    #[n(1)]
    pub quantity: f64,
    #[n(2)]
    pub unit_price: f64,
    #[n(3)]
    pub currency: Currency,
    #[n(4)]
    pub total_reference_value: f64,
}

/// Caller-facing raw input before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawServiceItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub currency: Option<Currency>,
}

impl RawServiceItem {
    pub fn new(description: &str, quantity: f64, unit_price: f64, currency: Currency) -> Self {
        Self {
            description: description.to_string(),
            quantity,
            unit_price,
            currency: Some(currency),
        }
    }
}

/// Converts raw caller input into a normalized [`ServiceItem`]. Injected into
/// the engine's entry points rather than looked up ambiently.
pub trait ItemNormalizer {
    fn normalize(&self, raw: &RawServiceItem) -> Result<ServiceItem, StructuralError>;
}

/// Default normalizer: the reference value of an item is quantity times unit
/// price in the item's own currency.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardNormalizer;

impl ItemNormalizer for StandardNormalizer {
    fn normalize(&self, raw: &RawServiceItem) -> Result<ServiceItem, StructuralError> {
        let currency = raw
            .currency
            .ok_or_else(|| StructuralError::MissingItemCurrency {
                description: raw.description.clone(),
            })?;

        Ok(ServiceItem {
            description: raw.description.clone(),
            quantity: raw.quantity,
            unit_price: raw.unit_price,
            currency,
            total_reference_value: raw.quantity * raw.unit_price,
        })
    }
}

/// Total reference value of a basket.
pub fn sum(items: &[ServiceItem]) -> f64 {
    items.iter().map(|item| item.total_reference_value).sum()
}

/// Per-currency subtotals of a basket, in stable currency order.
pub fn sum_by_currency(items: &[ServiceItem]) -> BTreeMap<Currency, f64> {
    let mut subtotals = BTreeMap::new();
    for item in items {
        *subtotals.entry(item.currency).or_insert(0.0) += item.total_reference_value;
    }
    subtotals
}
