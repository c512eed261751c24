use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use time::Date;
use tracing::{debug, warn};

use crate::rank::ranked_sales;
use crate::ratio::{inventory_age, turnover};
use crate::report::compose_summary;
use crate::season::seasonal_demand;
use crate::stock::{avg_stock, current_stock, low_inventory, stock_status, stockout_rates};
use crate::window::{reorder_points, TrailingWindow};
use crate::{
    AvgStockRow, CurrentStockRow, FactSnapshot, InventoryAgeRow, KpiError, LowInventoryRow,
    PipelineConfig, ProductId, RankedSalesRow, RecordSource, ReorderRow, SeasonalDemandRow,
    StockStatusRow, StockoutRow, StoreId, SummaryReportRow, TurnoverRow,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    UnknownStore,
    UnknownProduct,
}

impl ViolationKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownStore => "unknown_store",
            Self::UnknownProduct => "unknown_product",
        }
    }
}

/// A fact that references a store or product absent from the reference
/// tables.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ReferentialViolation {
    pub kind: ViolationKind,
    pub seq: i64,
    pub date: Date,
    pub store_id: StoreId,
    pub product_id: ProductId,
}

/// Lists referential violations in fact order. A fact with both an unknown
/// store and an unknown product yields two violations.
#[must_use]
pub fn check_referential_integrity(snapshot: &FactSnapshot) -> Vec<ReferentialViolation> {
    let stores: HashSet<&StoreId> = snapshot
        .stores
        .iter()
        .map(|store| &store.store_id)
        .collect();
    let products: HashSet<&ProductId> = snapshot
        .products
        .iter()
        .map(|product| &product.product_id)
        .collect();

    let mut violations = Vec::new();
    for fact in &snapshot.transactions {
        for (kind, known) in [
            (ViolationKind::UnknownStore, stores.contains(&fact.store_id)),
            (
                ViolationKind::UnknownProduct,
                products.contains(&fact.product_id),
            ),
        ] {
            if !known {
                violations.push(ReferentialViolation {
                    kind,
                    seq: fact.seq,
                    date: fact.date,
                    store_id: fact.store_id.clone(),
                    product_id: fact.product_id.clone(),
                });
            }
        }
    }

    violations
}

/// Every result set of one run, plus the anchor the run used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineOutput {
    pub anchor_date: Option<Date>,
    pub window: Option<TrailingWindow>,
    pub current_stock: Vec<CurrentStockRow>,
    pub low_inventory: Vec<LowInventoryRow>,
    pub stock_status: Vec<StockStatusRow>,
    pub reorder: Vec<ReorderRow>,
    pub turnover: Vec<TurnoverRow>,
    pub stockout: Vec<StockoutRow>,
    pub inventory_age: Vec<InventoryAgeRow>,
    pub avg_stock: Vec<AvgStockRow>,
    pub summary: Vec<SummaryReportRow>,
    pub ranked_sales: Vec<RankedSalesRow>,
    pub seasonal_demand: Vec<SeasonalDemandRow>,
    pub violations: Vec<ReferentialViolation>,
}

/// A validated KPI pipeline. Holds configuration only; every run reads the
/// snapshot it is handed and nothing else.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Validates `config` and builds a pipeline.
    ///
    /// # Errors
    /// Returns [`KpiError::Configuration`] when the configuration is invalid.
    pub fn new(config: PipelineConfig) -> Result<Self, KpiError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The date trailing windows end at for `snapshot`: the configured
    /// anchor, otherwise the latest fact date.
    #[must_use]
    pub fn anchor_for(&self, snapshot: &FactSnapshot) -> Option<Date> {
        self.config.anchor_date.or_else(|| snapshot.max_date())
    }

    /// Computes every result set over `snapshot`.
    ///
    /// # Errors
    /// Returns [`KpiError::Computation`] when the trailing window cannot be
    /// built from the anchor date or a unit total overflows.
    pub fn run(&self, snapshot: &FactSnapshot) -> Result<PipelineOutput, KpiError> {
        let facts = snapshot.transactions.as_slice();
        let anchor_date = self.anchor_for(snapshot);
        debug!(
            facts = facts.len(),
            stores = snapshot.stores.len(),
            products = snapshot.products.len(),
            anchor_date = ?anchor_date,
            "pipeline run started"
        );

        let violations = check_referential_integrity(snapshot);
        if !violations.is_empty() {
            warn!(
                violations = violations.len(),
                first_seq = violations[0].seq,
                "facts reference unknown stores or products; excluded from seasonal demand"
            );
        }

        let window = anchor_date
            .map(|anchor| TrailingWindow::ending_at(anchor, self.config.window_days))
            .transpose()?;
        let reorder = window
            .as_ref()
            .map(|window| reorder_points(facts, window, self.config.lead_time_multiplier))
            .unwrap_or_default();

        let turnover = turnover(facts)?;
        let stockout = stockout_rates(facts);
        let inventory_age = inventory_age(facts);
        let avg_stock = avg_stock(facts);
        let summary = compose_summary(&stockout, &inventory_age, &avg_stock, &turnover, &reorder);

        let output = PipelineOutput {
            anchor_date,
            window,
            current_stock: current_stock(facts),
            low_inventory: low_inventory(facts, self.config.low_inventory_threshold_ratio),
            stock_status: stock_status(
                facts,
                self.config.overstock_threshold,
                self.config.understock_threshold,
            ),
            reorder,
            turnover,
            stockout,
            inventory_age,
            avg_stock,
            summary,
            ranked_sales: ranked_sales(facts)?,
            seasonal_demand: seasonal_demand(snapshot)?,
            violations,
        };

        debug!(
            current_stock = output.current_stock.len(),
            low_inventory = output.low_inventory.len(),
            reorder = output.reorder.len(),
            turnover = output.turnover.len(),
            summary = output.summary.len(),
            ranked_sales = output.ranked_sales.len(),
            seasonal_demand = output.seasonal_demand.len(),
            "pipeline run finished"
        );

        Ok(output)
    }

    /// Loads one snapshot from `source` and runs over it.
    ///
    /// # Errors
    /// Returns the source's error when loading fails, or a converted
    /// [`KpiError`] when the run fails.
    pub fn run_source<S: RecordSource>(&self, source: &S) -> Result<PipelineOutput, S::Error> {
        let snapshot = source.load_snapshot()?;
        Ok(self.run(&snapshot)?)
    }
}
