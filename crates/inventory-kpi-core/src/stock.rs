use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::latest::resolve_latest;
use crate::ratio::MeanAccumulator;
use crate::{InventoryTransaction, ProductId, StoreId};

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct CurrentStockRow {
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub latest_date: Date,
    pub inventory_level: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LowInventoryRow {
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub latest_date: Date,
    pub inventory_level: i64,
    pub latest_forecast: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    Overstock,
    Understock,
    Balanced,
}

impl StockStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overstock => "overstock",
            Self::Understock => "understock",
            Self::Balanced => "balanced",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockStatusRow {
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub latest_date: Date,
    pub inventory_level: i64,
    pub latest_forecast: f64,
    pub status: StockStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockoutRow {
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub total_days: u64,
    pub stockout_days: u64,
    pub stockout_rate_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvgStockRow {
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub avg_inventory: f64,
}

/// Inventory level on the most recent fact of every (store, product).
#[must_use]
pub fn current_stock(facts: &[InventoryTransaction]) -> Vec<CurrentStockRow> {
    resolve_latest(facts, |fact| fact.inventory_level)
        .into_iter()
        .map(|latest| CurrentStockRow {
            store_id: latest.store_id,
            product_id: latest.product_id,
            latest_date: latest.latest_date,
            inventory_level: latest.value,
        })
        .collect()
}

/// Current stock rows whose level is below `threshold_ratio` times the
/// forecast recorded on the same latest fact.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn low_inventory(facts: &[InventoryTransaction], threshold_ratio: f64) -> Vec<LowInventoryRow> {
    resolve_latest(facts, |fact| (fact.inventory_level, fact.demand_forecast))
        .into_iter()
        .filter(|latest| {
            let (level, forecast) = latest.value;
            (level as f64) < forecast * threshold_ratio
        })
        .map(|latest| LowInventoryRow {
            store_id: latest.store_id,
            product_id: latest.product_id,
            latest_date: latest.latest_date,
            inventory_level: latest.value.0,
            latest_forecast: latest.value.1,
        })
        .collect()
}

/// Classifies current stock against the latest forecast: above
/// `overstock_threshold * forecast` is overstock, below
/// `understock_threshold * forecast` is understock.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn stock_status(
    facts: &[InventoryTransaction],
    overstock_threshold: f64,
    understock_threshold: f64,
) -> Vec<StockStatusRow> {
    resolve_latest(facts, |fact| (fact.inventory_level, fact.demand_forecast))
        .into_iter()
        .map(|latest| {
            let (level, forecast) = latest.value;
            let status = if level as f64 > forecast * overstock_threshold {
                StockStatus::Overstock
            } else if (level as f64) < forecast * understock_threshold {
                StockStatus::Understock
            } else {
                StockStatus::Balanced
            };

            StockStatusRow {
                store_id: latest.store_id,
                product_id: latest.product_id,
                latest_date: latest.latest_date,
                inventory_level: level,
                latest_forecast: forecast,
                status,
            }
        })
        .collect()
}

/// Share of days per (store, product) on which forecast demand exceeded the
/// inventory on hand.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn stockout_rates(facts: &[InventoryTransaction]) -> Vec<StockoutRow> {
    let mut groups: HashMap<(&StoreId, &ProductId), (u64, u64)> = HashMap::new();

    for fact in facts {
        let (total, stockouts) = groups
            .entry((&fact.store_id, &fact.product_id))
            .or_default();
        *total += 1;
        if fact.demand_forecast > fact.inventory_level as f64 {
            *stockouts += 1;
        }
    }

    let mut rows: Vec<StockoutRow> = groups
        .into_iter()
        .map(|((store_id, product_id), (total, stockouts))| StockoutRow {
            store_id: store_id.clone(),
            product_id: product_id.clone(),
            total_days: total,
            stockout_days: stockouts,
            stockout_rate_percent: stockouts as f64 * 100.0 / total as f64,
        })
        .collect();

    rows.sort_by(|lhs, rhs| {
        (&lhs.store_id, &lhs.product_id).cmp(&(&rhs.store_id, &rhs.product_id))
    });
    rows
}

/// Mean inventory level per (store, product) over every fact.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn avg_stock(facts: &[InventoryTransaction]) -> Vec<AvgStockRow> {
    let mut groups: HashMap<(&StoreId, &ProductId), MeanAccumulator> = HashMap::new();

    for fact in facts {
        groups
            .entry((&fact.store_id, &fact.product_id))
            .or_default()
            .push(fact.inventory_level as f64);
    }

    let mut rows: Vec<AvgStockRow> = groups
        .into_iter()
        .filter_map(|((store_id, product_id), acc)| {
            Some(AvgStockRow {
                store_id: store_id.clone(),
                product_id: product_id.clone(),
                avg_inventory: acc.mean()?,
            })
        })
        .collect();

    rows.sort_by(|lhs, rhs| {
        (&lhs.store_id, &lhs.product_id).cmp(&(&rhs.store_id, &rhs.product_id))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{fact, must_date};

    #[test]
    fn current_stock_uses_latest_fact() {
        let facts = vec![
            fact(1, "2024-01-01", "S1", "P1", 100, 5, 10.0),
            fact(2, "2024-01-03", "S1", "P1", 30, 5, 10.0),
            fact(3, "2024-01-02", "S1", "P1", 60, 5, 10.0),
        ];

        let rows = current_stock(&facts);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].latest_date, must_date("2024-01-03"));
        assert_eq!(rows[0].inventory_level, 30);
    }

    #[test]
    fn low_inventory_compares_against_latest_forecast() {
        let facts = vec![
            fact(1, "2024-01-01", "S1", "P1", 5, 5, 100.0),
            fact(2, "2024-01-02", "S1", "P1", 50, 5, 40.0),
            fact(3, "2024-01-02", "S1", "P2", 10, 5, 40.0),
            fact(4, "2024-01-02", "S2", "P1", 40, 5, 40.0),
        ];

        let rows = low_inventory(&facts, 1.0);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].product_id.as_str(), "P2");
        assert!((rows[0].latest_forecast - 40.0).abs() < 1e-9);
    }

    #[test]
    fn low_inventory_threshold_scales_the_forecast() {
        let facts = vec![fact(1, "2024-01-02", "S1", "P1", 50, 5, 40.0)];
        assert!(low_inventory(&facts, 1.0).is_empty());
        assert_eq!(low_inventory(&facts, 1.5).len(), 1);
    }

    #[test]
    fn stock_status_bands() {
        let facts = vec![
            fact(1, "2024-01-02", "S1", "P1", 160, 5, 100.0),
            fact(2, "2024-01-02", "S1", "P2", 40, 5, 100.0),
            fact(3, "2024-01-02", "S1", "P3", 150, 5, 100.0),
            fact(4, "2024-01-02", "S1", "P4", 50, 5, 100.0),
        ];

        let statuses: Vec<StockStatus> = stock_status(&facts, 1.5, 0.5)
            .into_iter()
            .map(|row| row.status)
            .collect();
        assert_eq!(
            statuses,
            vec![
                StockStatus::Overstock,
                StockStatus::Understock,
                StockStatus::Balanced,
                StockStatus::Balanced,
            ]
        );
    }

    #[test]
    fn stockout_counts_days_where_forecast_exceeds_inventory() {
        let facts = vec![
            fact(1, "2024-01-01", "S1", "P1", 10, 5, 12.0),
            fact(2, "2024-01-02", "S1", "P1", 10, 5, 10.0),
            fact(3, "2024-01-03", "S1", "P1", 10, 5, 8.0),
            fact(4, "2024-01-04", "S1", "P1", 0, 5, 0.5),
        ];

        let rows = stockout_rates(&facts);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_days, 4);
        assert_eq!(rows[0].stockout_days, 2);
        assert!((rows[0].stockout_rate_percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn avg_stock_is_per_store_and_product() {
        let facts = vec![
            fact(1, "2024-01-01", "S1", "P1", 10, 5, 1.0),
            fact(2, "2024-01-02", "S1", "P1", 30, 5, 1.0),
            fact(3, "2024-01-01", "S2", "P1", 7, 5, 1.0),
        ];

        let rows = avg_stock(&facts);
        assert_eq!(rows.len(), 2);
        assert!((rows[0].avg_inventory - 20.0).abs() < 1e-9);
        assert!((rows[1].avg_inventory - 7.0).abs() < 1e-9);
    }
}
