//! Pricing engine: supplier cost + category → resale price.
//!
//! Pure and deterministic. The only failure mode is a negative cost, which
//! indicates corrupt upstream data and is surfaced immediately rather than
//! priced.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("invalid supplier cost {0}: cost must be non-negative")]
    InvalidCost(Decimal),
}

/// Pricing rules loaded from the supplier file.
///
/// Markup rates are fractions (`0.30` = 30%). `category_markup` is keyed by
/// internal taxonomy names; `category_map` translates supplier raw category
/// strings into that taxonomy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    pub default_markup: Decimal,
    pub minimum_profit: Decimal,
    #[serde(default)]
    pub shipping_markup: Decimal,
    #[serde(default)]
    pub category_markup: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub category_map: BTreeMap<String, String>,
}

impl PricingConfig {
    /// Computes the resale price for a supplier cost in the given internal
    /// category.
    ///
    /// The per-category markup applies when the category is mapped; otherwise
    /// the default markup. When the markup-derived profit falls below the
    /// minimum profit floor, the floor wins: the result is
    /// `cost + minimum_profit`. Rounded half-up to 2 decimal places.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidCost`] if `cost` is negative.
    pub fn calculate_price(
        &self,
        cost: Decimal,
        category: Option<&str>,
    ) -> Result<Decimal, PricingError> {
        if cost.is_sign_negative() && !cost.is_zero() {
            return Err(PricingError::InvalidCost(cost));
        }

        let rate = category
            .and_then(|c| self.category_markup.get(c))
            .copied()
            .unwrap_or(self.default_markup);

        let marked_up = cost * (Decimal::ONE + rate);
        let price = if marked_up - cost < self.minimum_profit {
            cost + self.minimum_profit
        } else {
            marked_up
        };

        Ok(price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Maps a supplier's raw category string into the internal taxonomy.
    /// Unmapped categories pass through unchanged.
    #[must_use]
    pub fn map_category(&self, raw: &str) -> String {
        self.category_map
            .get(raw)
            .cloned()
            .unwrap_or_else(|| raw.to_string())
    }

    /// Estimated shipping charge derived from the resale price via the
    /// configured shipping markup rate, rounded half-up to 2 decimal places.
    #[must_use]
    pub fn shipping_estimate(&self, resale_price: Decimal) -> Decimal {
        (resale_price * self.shipping_markup)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}
