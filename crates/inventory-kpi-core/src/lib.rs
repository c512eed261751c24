//! Inventory KPI pipeline.
//!
//! Turns an immutable snapshot of daily per-store/per-product inventory
//! transactions into decision-ready result sets: current stock, low
//! inventory flags, reorder points, turnover, stockout rates, inventory age,
//! monthly sales ranks and seasonal demand, plus a composed summary report.
//!
//! Every computation is a pure function of `(FactSnapshot, PipelineConfig)`.
//! The entrypoint is [`Pipeline::run`]; the individual calculators are public
//! for callers that only need one result set.

use time::macros::format_description;
use time::Date;

mod config;
mod latest;
mod model;
mod pipeline;
mod rank;
mod ratio;
mod report;
mod season;
mod stock;
mod window;

#[cfg(test)]
mod fixtures;

pub use config::PipelineConfig;
pub use latest::{resolve_latest, resolve_latest_field, LatestValue};
pub use model::{
    FactSnapshot, InventoryTransaction, NumericField, Product, ProductId, RecordSource,
    SalesMonth, Store, StoreId, TransactionInput,
};
pub use pipeline::{
    check_referential_integrity, Pipeline, PipelineOutput, ReferentialViolation, ViolationKind,
};
pub use rank::{
    monthly_sales, rank_within_partitions, ranked_sales, MonthlySalesRow, RankedSalesRow,
};
pub use ratio::{
    inventory_age, safe_ratio, turnover, InventoryAgeRow, MeanAccumulator, TurnoverRow,
};
pub use report::{compose_summary, SummaryReportRow};
pub use season::{seasonal_demand, Season, SeasonalDemandRow};
pub use stock::{
    avg_stock, current_stock, low_inventory, stock_status, stockout_rates, AvgStockRow,
    CurrentStockRow, LowInventoryRow, StockStatus, StockStatusRow, StockoutRow,
};
pub use window::{
    reorder_points, window_stats, GroupKey, Grouping, ReorderRow, TrailingWindow,
    WindowStatsRow,
};

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum KpiError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("computation error: {0}")]
    Computation(String),
}

/// Parses a calendar date in `YYYY-MM-DD` form.
///
/// # Errors
/// Returns [`KpiError::Validation`] when the value is not a valid date.
pub fn parse_date(value: &str) -> Result<Date, KpiError> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|err| KpiError::Validation(format!("invalid date {value:?}: {err}")))
}

/// Formats a calendar date as `YYYY-MM-DD`.
///
/// # Errors
/// Returns [`KpiError::Validation`] when formatting fails.
pub fn format_date(value: Date) -> Result<String, KpiError> {
    value
        .format(format_description!("[year]-[month]-[day]"))
        .map_err(|err| KpiError::Validation(format!("failed to format date: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_round_trips_through_text() {
        let date = match parse_date("2024-01-02") {
            Ok(value) => value,
            Err(err) => panic!("expected date, got {err}"),
        };
        assert_eq!(date.day(), 2);
        assert_eq!(format_date(date), Ok("2024-01-02".to_string()));
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(matches!(
            parse_date("2024-13-40"),
            Err(KpiError::Validation(_))
        ));
        assert!(matches!(parse_date("yesterday"), Err(KpiError::Validation(_))));
    }
}
