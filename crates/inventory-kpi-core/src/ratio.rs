//! Ratio KPIs and their two zero-denominator policies.
//!
//! Turnover divides two aggregates and is undefined as a whole when the
//! denominator aggregate is zero. Inventory age divides per day and drops
//! the zero-denominator days from the mean instead.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{InventoryTransaction, KpiError, ProductId};

/// `numerator / denominator`, or `None` when the denominator is exactly zero.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn safe_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator)
}

/// Adds `units` to a running unit total, failing instead of wrapping.
/// `what` names the total in the error message.
///
/// # Errors
/// Returns [`KpiError::Computation`] when the total no longer fits in `i64`.
pub(crate) fn add_units(
    total: i64,
    units: i64,
    what: impl FnOnce() -> String,
) -> Result<i64, KpiError> {
    total
        .checked_add(units)
        .ok_or_else(|| KpiError::Computation(format!("{} overflows i64", what())))
}

/// Running arithmetic mean. An accumulator that saw no values has no mean.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanAccumulator {
    count: u64,
    sum: f64,
}

impl MeanAccumulator {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(self.sum / self.count as f64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnoverRow {
    pub product_id: ProductId,
    pub total_units_sold: i64,
    pub avg_inventory: f64,
    pub inventory_turnover_ratio: Option<f64>,
}

/// Inventory turnover per product across every store and date:
/// `sum(units_sold) / avg(inventory_level)`.
///
/// # Errors
/// Returns [`KpiError::Computation`] when a product's total units sold
/// overflows.
#[allow(clippy::cast_precision_loss)]
pub fn turnover(facts: &[InventoryTransaction]) -> Result<Vec<TurnoverRow>, KpiError> {
    let mut groups: HashMap<&ProductId, (i64, MeanAccumulator)> = HashMap::new();

    for fact in facts {
        let (sold, inventory) = groups.entry(&fact.product_id).or_default();
        *sold = add_units(*sold, fact.units_sold, || {
            format!("units sold for product {}", fact.product_id)
        })?;
        inventory.push(fact.inventory_level as f64);
    }

    let mut rows: Vec<TurnoverRow> = groups
        .into_iter()
        .filter_map(|(product_id, (sold, inventory))| {
            let avg_inventory = inventory.mean()?;
            Some(TurnoverRow {
                product_id: product_id.clone(),
                total_units_sold: sold,
                avg_inventory,
                inventory_turnover_ratio: safe_ratio(sold as f64, avg_inventory),
            })
        })
        .collect();

    rows.sort_by(|lhs, rhs| lhs.product_id.cmp(&rhs.product_id));
    Ok(rows)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryAgeRow {
    pub product_id: ProductId,
    pub avg_inventory_age_days: Option<f64>,
}

/// Average days of cover per product: the mean over facts of
/// `inventory_level / units_sold`. Days with zero sales are left out of the
/// mean; a product with no selling day at all has an undefined age.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn inventory_age(facts: &[InventoryTransaction]) -> Vec<InventoryAgeRow> {
    let mut groups: HashMap<&ProductId, MeanAccumulator> = HashMap::new();

    for fact in facts {
        let acc = groups.entry(&fact.product_id).or_default();
        if let Some(days) = safe_ratio(fact.inventory_level as f64, fact.units_sold as f64) {
            acc.push(days);
        }
    }

    let mut rows: Vec<InventoryAgeRow> = groups
        .into_iter()
        .map(|(product_id, acc)| InventoryAgeRow {
            product_id: product_id.clone(),
            avg_inventory_age_days: acc.mean(),
        })
        .collect();

    rows.sort_by(|lhs, rhs| lhs.product_id.cmp(&rhs.product_id));
    rows
}
