use time::Date;

use crate::{
    parse_date, FactSnapshot, InventoryTransaction, Product, ProductId, Store, StoreId,
    TransactionInput,
};

pub(crate) fn must_ok<T, E: std::fmt::Display>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("expected Ok(..), got error: {err}"),
    }
}

pub(crate) fn must_some<T>(value: Option<T>) -> T {
    match value {
        Some(inner) => inner,
        None => panic!("expected Some(..), got None"),
    }
}

pub(crate) fn must_date(value: &str) -> Date {
    must_ok(parse_date(value))
}

pub(crate) fn fact_input(
    date: &str,
    store_id: &str,
    product_id: &str,
    inventory_level: i64,
    units_sold: i64,
    demand_forecast: f64,
) -> TransactionInput {
    TransactionInput {
        date: must_date(date),
        store_id: StoreId::from(store_id),
        product_id: ProductId::from(product_id),
        inventory_level,
        units_sold,
        units_ordered: 0,
        demand_forecast,
        price: 10.0,
        discount: 0,
        weather_condition: "Sunny".to_string(),
        holiday_promotion: false,
        competitor_pricing: 10.5,
        seasonality: "Winter".to_string(),
    }
}

pub(crate) fn fact(
    seq: i64,
    date: &str,
    store_id: &str,
    product_id: &str,
    inventory_level: i64,
    units_sold: i64,
    demand_forecast: f64,
) -> InventoryTransaction {
    fact_input(
        date,
        store_id,
        product_id,
        inventory_level,
        units_sold,
        demand_forecast,
    )
    .into_transaction(seq)
}

/// Snapshot whose reference tables cover every store and product the facts
/// mention. Every product lands in the `Groceries` category.
pub(crate) fn snapshot_of(transactions: Vec<InventoryTransaction>) -> FactSnapshot {
    let mut stores: Vec<Store> = Vec::new();
    let mut products: Vec<Product> = Vec::new();

    for fact in &transactions {
        if !stores.iter().any(|store| store.store_id == fact.store_id) {
            stores.push(Store {
                store_id: fact.store_id.clone(),
                region: "North".to_string(),
            });
        }
        if !products
            .iter()
            .any(|product| product.product_id == fact.product_id)
        {
            products.push(Product {
                product_id: fact.product_id.clone(),
                category: "Groceries".to_string(),
            });
        }
    }

    FactSnapshot {
        stores,
        products,
        transactions,
    }
}
