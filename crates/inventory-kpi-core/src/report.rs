use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    AvgStockRow, InventoryAgeRow, ProductId, ReorderRow, StockoutRow, StoreId, TurnoverRow,
};

/// One row per (store, product) with stockout data, enriched with whatever
/// other KPIs exist for the same entity. Missing KPIs are `None`.
///
/// Inventory age and turnover are product-wide figures, so every store of a
/// product carries the same values for them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryReportRow {
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub total_days: u64,
    pub stockout_days: u64,
    pub stockout_rate_percent: f64,
    pub avg_inventory_age_days: Option<f64>,
    pub avg_stock_level: Option<f64>,
    pub total_units_sold: Option<i64>,
    pub product_avg_inventory: Option<f64>,
    pub inventory_turnover_ratio: Option<f64>,
    pub avg_daily_sales: Option<f64>,
    pub max_daily_sales: Option<i64>,
    pub reorder_point: Option<f64>,
}

/// Left-outer joins the KPI tables onto the stockout rows.
///
/// Stockout rows are the anchor: the output has exactly their keys, in
/// their order. Age and turnover match on `product_id`; average stock and
/// reorder data match on `(store_id, product_id)`.
#[must_use]
pub fn compose_summary(
    stockouts: &[StockoutRow],
    ages: &[InventoryAgeRow],
    avg_stock: &[AvgStockRow],
    turnover: &[TurnoverRow],
    reorder: &[ReorderRow],
) -> Vec<SummaryReportRow> {
    let age_by_product: HashMap<&ProductId, &InventoryAgeRow> =
        ages.iter().map(|row| (&row.product_id, row)).collect();
    let turnover_by_product: HashMap<&ProductId, &TurnoverRow> =
        turnover.iter().map(|row| (&row.product_id, row)).collect();
    let stock_by_key: HashMap<(&StoreId, &ProductId), &AvgStockRow> = avg_stock
        .iter()
        .map(|row| ((&row.store_id, &row.product_id), row))
        .collect();
    let reorder_by_key: HashMap<(&StoreId, &ProductId), &ReorderRow> = reorder
        .iter()
        .map(|row| ((&row.store_id, &row.product_id), row))
        .collect();

    stockouts
        .iter()
        .map(|stockout| {
            let key = (&stockout.store_id, &stockout.product_id);
            let age = age_by_product.get(&stockout.product_id);
            let turnover = turnover_by_product.get(&stockout.product_id);
            let stock = stock_by_key.get(&key);
            let reorder = reorder_by_key.get(&key);

            SummaryReportRow {
                store_id: stockout.store_id.clone(),
                product_id: stockout.product_id.clone(),
                total_days: stockout.total_days,
                stockout_days: stockout.stockout_days,
                stockout_rate_percent: stockout.stockout_rate_percent,
                avg_inventory_age_days: age.and_then(|row| row.avg_inventory_age_days),
                avg_stock_level: stock.map(|row| row.avg_inventory),
                total_units_sold: turnover.map(|row| row.total_units_sold),
                product_avg_inventory: turnover.map(|row| row.avg_inventory),
                inventory_turnover_ratio: turnover.and_then(|row| row.inventory_turnover_ratio),
                avg_daily_sales: reorder.map(|row| row.avg_daily_sales),
                max_daily_sales: reorder.map(|row| row.max_daily_sales),
                reorder_point: reorder.map(|row| row.reorder_point),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]

    use super::*;

    fn stockout(store: &str, product: &str) -> StockoutRow {
        StockoutRow {
            store_id: StoreId::from(store),
            product_id: ProductId::from(product),
            total_days: 10,
            stockout_days: 2,
            stockout_rate_percent: 20.0,
        }
    }

    fn turnover_row(product: &str, ratio: Option<f64>) -> TurnoverRow {
        TurnoverRow {
            product_id: ProductId::from(product),
            total_units_sold: 120,
            avg_inventory: 40.0,
            inventory_turnover_ratio: ratio,
        }
    }

    #[test]
    fn missing_turnover_leaves_nulls_but_keeps_the_row() {
        let rows = compose_summary(
            &[stockout("S1", "P1")],
            &[],
            &[],
            &[turnover_row("P2", Some(3.0))],
            &[],
        );

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].store_id.as_str(), "S1");
        assert_eq!(rows[0].inventory_turnover_ratio, None);
        assert_eq!(rows[0].total_units_sold, None);
        assert_eq!(rows[0].reorder_point, None);
        assert_eq!(rows[0].avg_stock_level, None);
        assert_eq!(rows[0].avg_inventory_age_days, None);
    }

    #[test]
    fn product_level_kpis_fan_out_to_every_store() {
        let rows = compose_summary(
            &[stockout("S1", "P1"), stockout("S2", "P1")],
            &[InventoryAgeRow {
                product_id: ProductId::from("P1"),
                avg_inventory_age_days: Some(4.5),
            }],
            &[AvgStockRow {
                store_id: StoreId::from("S2"),
                product_id: ProductId::from("P1"),
                avg_inventory: 33.0,
            }],
            &[turnover_row("P1", Some(3.0))],
            &[ReorderRow {
                store_id: StoreId::from("S1"),
                product_id: ProductId::from("P1"),
                avg_daily_sales: 5.0,
                max_daily_sales: 9,
                reorder_point: 10.0,
            }],
        );

        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.avg_inventory_age_days, Some(4.5));
            assert_eq!(row.inventory_turnover_ratio, Some(3.0));
        }

        assert_eq!(rows[0].reorder_point, Some(10.0));
        assert_eq!(rows[0].avg_stock_level, None);
        assert_eq!(rows[1].reorder_point, None);
        assert_eq!(rows[1].avg_stock_level, Some(33.0));
    }

    #[test]
    fn keys_without_stockout_rows_are_dropped() {
        let rows = compose_summary(
            &[],
            &[],
            &[AvgStockRow {
                store_id: StoreId::from("S1"),
                product_id: ProductId::from("P1"),
                avg_inventory: 1.0,
            }],
            &[turnover_row("P1", None)],
            &[],
        );
        assert!(rows.is_empty());
    }

    #[test]
    fn undefined_turnover_stays_undefined_after_join() {
        let rows = compose_summary(
            &[stockout("S1", "P1")],
            &[],
            &[],
            &[turnover_row("P1", None)],
            &[],
        );
        assert_eq!(rows[0].total_units_sold, Some(120));
        assert_eq!(rows[0].inventory_turnover_ratio, None);
    }
}
