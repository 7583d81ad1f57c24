// Price resolution for activity listings
// The API hands back several optional price fields per activity and per booking option.
// Everything that turns those into a single display price goes through this module.

use serde::{Deserialize, Serialize};

// A resolved amount in a given currency
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
}

impl Price {
    pub fn new(amount: f64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    // "USD 42.50"
    pub fn display(&self) -> String {
        format!("{} {:.2}", self.currency, self.amount)
    }
}

// The raw, possibly-null price fields as they appear on the wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceFields {
    pub price_after_discount: Option<f64>,
    pub discounted_price: Option<f64>,
    pub normal_price: Option<f64>,
    pub price_per_person: Option<f64>,
    pub base_price: Option<f64>,
    pub discount_percentage: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    PriceAfterDiscount,
    DiscountedPrice,
    NormalPrice,
    PricePerPerson,
    BasePrice,
}

impl PriceField {
    fn read(self, fields: &PriceFields) -> Option<f64> {
        match self {
            PriceField::PriceAfterDiscount => fields.price_after_discount,
            PriceField::DiscountedPrice => fields.discounted_price,
            PriceField::NormalPrice => fields.normal_price,
            PriceField::PricePerPerson => fields.price_per_person,
            PriceField::BasePrice => fields.base_price,
        }
    }
}

// Ordered list of fields to try. The first strictly positive, finite value wins.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePriority(Vec<PriceField>);

impl PricePriority {
    pub fn new(order: Vec<PriceField>) -> Self {
        Self(order)
    }

    pub fn fields(&self) -> &[PriceField] {
        &self.0
    }
}

impl Default for PricePriority {
    // priceAfterDiscount -> discountedPrice -> normalPrice -> pricePerPerson -> basePrice
    fn default() -> Self {
        Self(vec![
            PriceField::PriceAfterDiscount,
            PriceField::DiscountedPrice,
            PriceField::NormalPrice,
            PriceField::PricePerPerson,
            PriceField::BasePrice,
        ])
    }
}

pub const DEFAULT_CURRENCY: &str = "USD";

fn usable(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

pub fn resolve_price_with(fields: &PriceFields, priority: &PricePriority) -> Option<Price> {
    let amount = priority
        .fields()
        .iter()
        .find_map(|field| usable(field.read(fields)))?;

    let currency = fields
        .currency
        .clone()
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    Some(Price::new(amount, currency))
}

pub fn resolve_price(fields: &PriceFields) -> Option<Price> {
    resolve_price_with(fields, &PricePriority::default())
}

// The undiscounted price, used for strike-through display next to an offer
pub fn original_price(fields: &PriceFields) -> Option<Price> {
    let priority = PricePriority::new(vec![
        PriceField::NormalPrice,
        PriceField::PricePerPerson,
        PriceField::BasePrice,
    ]);
    resolve_price_with(fields, &priority)
}

// Cheapest resolvable price across tiers / booking options
pub fn from_price<'a, I>(tiers: I) -> Option<Price>
where
    I: IntoIterator<Item = &'a PriceFields>,
{
    tiers
        .into_iter()
        .filter_map(resolve_price)
        .min_by(|a, b| a.amount.total_cmp(&b.amount))
}

pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

// Reduced price for a special offer. Percentages outside 0..=100 are clamped.
pub fn apply_discount(base: f64, percentage: f64) -> f64 {
    let pct = if percentage.is_finite() {
        percentage.clamp(0.0, 100.0)
    } else {
        0.0
    };
    round_cents(base * (100.0 - pct) / 100.0)
}

// Discount badge value: the server percentage if present, otherwise derived from the two prices
pub fn discount_percentage(fields: &PriceFields) -> Option<u32> {
    if let Some(pct) = usable(fields.discount_percentage) {
        return Some(pct.clamp(0.0, 100.0).round() as u32);
    }

    let original = original_price(fields)?;
    let current = resolve_price(fields)?;
    if current.amount >= original.amount {
        return None;
    }

    let pct = (1.0 - current.amount / original.amount) * 100.0;
    Some(pct.round() as u32)
}
