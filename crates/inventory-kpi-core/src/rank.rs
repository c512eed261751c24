use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ratio::add_units;
use crate::{InventoryTransaction, KpiError, ProductId, SalesMonth, StoreId};

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct MonthlySalesRow {
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub sales_month: SalesMonth,
    pub monthly_units_sold: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct RankedSalesRow {
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub sales_month: SalesMonth,
    pub monthly_units_sold: i64,
    pub rank_in_store_month: u32,
}

/// Units sold per (store, product, calendar month), ordered by
/// (store, month, product).
///
/// # Errors
/// Returns [`KpiError::Computation`] when a monthly total overflows.
pub fn monthly_sales(facts: &[InventoryTransaction]) -> Result<Vec<MonthlySalesRow>, KpiError> {
    let mut totals: HashMap<(&StoreId, &ProductId, SalesMonth), i64> = HashMap::new();

    for fact in facts {
        let month = fact.sales_month();
        let total = totals
            .entry((&fact.store_id, &fact.product_id, month))
            .or_default();
        *total = add_units(*total, fact.units_sold, || {
            format!(
                "{month} units sold for store {} product {}",
                fact.store_id, fact.product_id
            )
        })?;
    }

    let mut rows: Vec<MonthlySalesRow> = totals
        .into_iter()
        .map(|((store_id, product_id, sales_month), units)| MonthlySalesRow {
            store_id: store_id.clone(),
            product_id: product_id.clone(),
            sales_month,
            monthly_units_sold: units,
        })
        .collect();

    rows.sort_by(|lhs, rhs| {
        (&lhs.store_id, lhs.sales_month, &lhs.product_id).cmp(&(
            &rhs.store_id,
            rhs.sales_month,
            &rhs.product_id,
        ))
    });
    Ok(rows)
}

/// Ranks rows inside each partition by `metric`, highest first.
///
/// Equal metrics share a rank and the next distinct metric skips the tied
/// slots, so `[100, 100, 80]` ranks as `[1, 1, 3]`. Output is grouped by
/// partition in ascending key order; tied rows keep their input order.
pub fn rank_within_partitions<R, K, V>(
    mut rows: Vec<R>,
    partition: impl Fn(&R) -> K,
    metric: impl Fn(&R) -> V,
) -> Vec<(R, u32)>
where
    K: Ord,
    V: Ord,
{
    rows.sort_by(|lhs, rhs| {
        partition(lhs)
            .cmp(&partition(rhs))
            .then_with(|| metric(rhs).cmp(&metric(lhs)))
    });

    let mut ranked = Vec::with_capacity(rows.len());
    let mut previous: Option<(K, V, u32)> = None;
    let mut position = 0_u32;

    for row in rows {
        let key = partition(&row);
        let value = metric(&row);

        let rank = match &previous {
            Some((prev_key, prev_value, prev_rank)) if *prev_key == key => {
                position += 1;
                if *prev_value == value {
                    *prev_rank
                } else {
                    position
                }
            }
            _ => {
                position = 1;
                1
            }
        };

        previous = Some((key, value, rank));
        ranked.push((row, rank));
    }

    ranked
}

/// Best sellers: monthly units sold ranked within each (store, month).
///
/// # Errors
/// Returns [`KpiError::Computation`] when a monthly total overflows.
pub fn ranked_sales(facts: &[InventoryTransaction]) -> Result<Vec<RankedSalesRow>, KpiError> {
    let ranked = rank_within_partitions(
        monthly_sales(facts)?,
        |row| (row.store_id.clone(), row.sales_month),
        |row| row.monthly_units_sold,
    )
    .into_iter()
    .map(|(row, rank)| RankedSalesRow {
        store_id: row.store_id,
        product_id: row.product_id,
        sales_month: row.sales_month,
        monthly_units_sold: row.monthly_units_sold,
        rank_in_store_month: rank,
    })
    .collect();
    Ok(ranked)
}
