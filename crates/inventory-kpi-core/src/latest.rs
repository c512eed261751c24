use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{InventoryTransaction, NumericField, ProductId, StoreId};

/// Point-in-time value of one field for a (store, product).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LatestValue<T> {
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub latest_date: Date,
    pub seq: i64,
    pub value: T,
}

/// Picks, per (store, product), the value of `extract` on the most recent
/// fact. Values are never blended across dates.
///
/// Most recent means maximum `date`; among facts sharing that date the one
/// with the highest ingestion `seq` wins. Rows come back ordered by
/// (store, product).
pub fn resolve_latest<T, F>(facts: &[InventoryTransaction], extract: F) -> Vec<LatestValue<T>>
where
    F: Fn(&InventoryTransaction) -> T,
{
    let mut latest: HashMap<(&StoreId, &ProductId), &InventoryTransaction> = HashMap::new();

    for fact in facts {
        latest
            .entry((&fact.store_id, &fact.product_id))
            .and_modify(|current| {
                if is_more_recent(fact, current) {
                    *current = fact;
                }
            })
            .or_insert(fact);
    }

    let mut rows: Vec<LatestValue<T>> = latest
        .into_values()
        .map(|fact| LatestValue {
            store_id: fact.store_id.clone(),
            product_id: fact.product_id.clone(),
            latest_date: fact.date,
            seq: fact.seq,
            value: extract(fact),
        })
        .collect();

    rows.sort_by(|lhs, rhs| {
        (&lhs.store_id, &lhs.product_id).cmp(&(&rhs.store_id, &rhs.product_id))
    });
    rows
}

/// [`resolve_latest`] for a named numeric field.
#[must_use]
pub fn resolve_latest_field(
    facts: &[InventoryTransaction],
    field: NumericField,
) -> Vec<LatestValue<f64>> {
    resolve_latest(facts, |fact| field.value(fact))
}

fn is_more_recent(candidate: &InventoryTransaction, current: &InventoryTransaction) -> bool {
    (candidate.date, candidate.seq) > (current.date, current.seq)
}
