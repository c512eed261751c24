use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::{InventoryTransaction, KpiError, NumericField, ProductId, StoreId};

/// Inclusive date range `[anchor - days + 1, anchor]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub struct TrailingWindow {
    pub start: Date,
    pub end: Date,
    pub days: u32,
}

impl TrailingWindow {
    /// Builds the window of `days` calendar days ending at `anchor`.
    ///
    /// # Errors
    /// Returns [`KpiError::Configuration`] for a zero-length window and
    /// [`KpiError::Computation`] when the start date is not representable.
    pub fn ending_at(anchor: Date, days: u32) -> Result<Self, KpiError> {
        if days == 0 {
            return Err(KpiError::Configuration(
                "window_days MUST be >= 1".to_string(),
            ));
        }

        let start = anchor
            .checked_sub(Duration::days(i64::from(days) - 1))
            .ok_or_else(|| {
                KpiError::Computation(format!(
                    "window of {days} days ending at {anchor} starts before the minimum date"
                ))
            })?;

        Ok(Self {
            start,
            end: anchor,
            days,
        })
    }

    #[must_use]
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    StoreProduct,
    Product,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct GroupKey {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub store_id: Option<StoreId>,
    pub product_id: ProductId,
}

impl GroupKey {
    fn for_fact(fact: &InventoryTransaction, grouping: Grouping) -> Self {
        Self {
            store_id: match grouping {
                Grouping::StoreProduct => Some(fact.store_id.clone()),
                Grouping::Product => None,
            },
            product_id: fact.product_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowStatsRow {
    #[serde(flatten)]
    pub key: GroupKey,
    pub fact_count: u64,
    pub sum: f64,
    pub mean: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy)]
struct StatsAccumulator {
    count: u64,
    sum: f64,
    max: f64,
}

impl StatsAccumulator {
    fn new(value: f64) -> Self {
        Self {
            count: 1,
            sum: value,
            max: value,
        }
    }

    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.max = self.max.max(value);
    }

    #[allow(clippy::cast_precision_loss)]
    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Mean, max and sum of `field` over the facts inside `window`, per group.
///
/// Facts outside the window are dropped entirely. A group with no facts in
/// the window produces no row. Rows come back ordered by group key.
#[must_use]
pub fn window_stats(
    facts: &[InventoryTransaction],
    window: &TrailingWindow,
    grouping: Grouping,
    field: NumericField,
) -> Vec<WindowStatsRow> {
    let mut groups: HashMap<GroupKey, StatsAccumulator> = HashMap::new();

    for fact in facts.iter().filter(|fact| window.contains(fact.date)) {
        let value = field.value(fact);
        groups
            .entry(GroupKey::for_fact(fact, grouping))
            .and_modify(|acc| acc.push(value))
            .or_insert_with(|| StatsAccumulator::new(value));
    }

    let mut rows: Vec<WindowStatsRow> = groups
        .into_iter()
        .map(|(key, acc)| WindowStatsRow {
            key,
            fact_count: acc.count,
            sum: acc.sum,
            mean: acc.mean(),
            max: acc.max,
        })
        .collect();

    rows.sort_by(|lhs, rhs| lhs.key.cmp(&rhs.key));
    rows
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReorderRow {
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub avg_daily_sales: f64,
    pub max_daily_sales: i64,
    pub reorder_point: f64,
}

/// Recent sales velocity per (store, product) and the inventory level at
/// which restocking should trigger: `avg_daily_sales * lead_time_multiplier`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn reorder_points(
    facts: &[InventoryTransaction],
    window: &TrailingWindow,
    lead_time_multiplier: f64,
) -> Vec<ReorderRow> {
    window_stats(facts, window, Grouping::StoreProduct, NumericField::UnitsSold)
        .into_iter()
        .filter_map(|row| {
            let store_id = row.key.store_id?;
            Some(ReorderRow {
                store_id,
                product_id: row.key.product_id,
                avg_daily_sales: row.mean,
                // units_sold is integral, so the max round-trips exactly.
                max_daily_sales: row.max as i64,
                reorder_point: row.mean * lead_time_multiplier,
            })
        })
        .collect()
}
