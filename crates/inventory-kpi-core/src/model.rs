use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::Date;

use crate::KpiError;

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(transparent)]
pub struct StoreId(pub String);

impl StoreId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StoreId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StoreId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Store {
    pub store_id: StoreId,
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Product {
    pub product_id: ProductId,
    pub category: String,
}

/// One immutable fact: the state of a product at a store on a given day.
///
/// `seq` is the ingestion sequence. It is unique within a snapshot and breaks
/// ties between facts sharing a date (the higher `seq` is the more recent).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryTransaction {
    pub seq: i64,
    pub date: Date,
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub inventory_level: i64,
    pub units_sold: i64,
    pub units_ordered: i64,
    pub demand_forecast: f64,
    pub price: f64,
    pub discount: i64,
    pub weather_condition: String,
    pub holiday_promotion: bool,
    pub competitor_pricing: f64,
    pub seasonality: String,
}

impl InventoryTransaction {
    #[must_use]
    pub fn sales_month(&self) -> SalesMonth {
        SalesMonth::of(self.date)
    }
}

/// A fact as presented at the ingestion boundary, before it is sequenced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionInput {
    pub date: Date,
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub inventory_level: i64,
    pub units_sold: i64,
    pub units_ordered: i64,
    pub demand_forecast: f64,
    pub price: f64,
    pub discount: i64,
    pub weather_condition: String,
    pub holiday_promotion: bool,
    pub competitor_pricing: f64,
    pub seasonality: String,
}

impl TransactionInput {
    /// Validates a fact before it is appended to a record store.
    ///
    /// `inventory_level` is deliberately not range-checked: negative levels
    /// are unexpected but accepted.
    ///
    /// # Errors
    /// Returns [`KpiError::Validation`] when identifiers are blank, counts are
    /// negative, the discount is not a percentage or a float is not finite.
    pub fn validate(&self) -> Result<(), KpiError> {
        if self.store_id.0.trim().is_empty() {
            return Err(KpiError::Validation(
                "store_id MUST be provided".to_string(),
            ));
        }

        if self.product_id.0.trim().is_empty() {
            return Err(KpiError::Validation(
                "product_id MUST be provided".to_string(),
            ));
        }

        for (name, value) in [
            ("units_sold", self.units_sold),
            ("units_ordered", self.units_ordered),
        ] {
            if value < 0 {
                return Err(KpiError::Validation(format!("{name} MUST be >= 0")));
            }
        }

        if !(0..=100).contains(&self.discount) {
            return Err(KpiError::Validation(
                "discount MUST be a percentage in [0, 100]".to_string(),
            ));
        }

        for (name, value) in [
            ("demand_forecast", self.demand_forecast),
            ("price", self.price),
            ("competitor_pricing", self.competitor_pricing),
        ] {
            if !value.is_finite() {
                return Err(KpiError::Validation(format!("{name} MUST be finite")));
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn into_transaction(self, seq: i64) -> InventoryTransaction {
        InventoryTransaction {
            seq,
            date: self.date,
            store_id: self.store_id,
            product_id: self.product_id,
            inventory_level: self.inventory_level,
            units_sold: self.units_sold,
            units_ordered: self.units_ordered,
            demand_forecast: self.demand_forecast,
            price: self.price,
            discount: self.discount,
            weather_condition: self.weather_condition,
            holiday_promotion: self.holiday_promotion,
            competitor_pricing: self.competitor_pricing,
            seasonality: self.seasonality,
        }
    }
}

/// Immutable view of the record store that a pipeline run reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FactSnapshot {
    pub stores: Vec<Store>,
    pub products: Vec<Product>,
    pub transactions: Vec<InventoryTransaction>,
}

impl FactSnapshot {
    /// Builds a snapshot from unsequenced inputs, numbering them from 1 in
    /// the given order.
    #[must_use]
    pub fn from_inputs(
        stores: Vec<Store>,
        products: Vec<Product>,
        inputs: Vec<TransactionInput>,
    ) -> Self {
        let transactions = inputs
            .into_iter()
            .zip(1_i64..)
            .map(|(input, seq)| input.into_transaction(seq))
            .collect();

        Self {
            stores,
            products,
            transactions,
        }
    }

    #[must_use]
    pub fn max_date(&self) -> Option<Date> {
        self.transactions.iter().map(|fact| fact.date).max()
    }

    #[must_use]
    pub fn min_date(&self) -> Option<Date> {
        self.transactions.iter().map(|fact| fact.date).min()
    }
}

/// A read-only source of fact snapshots.
pub trait RecordSource {
    type Error: From<KpiError>;

    /// Reads the current fact set as one immutable snapshot.
    ///
    /// # Errors
    /// Returns the source's error when the snapshot cannot be read.
    fn load_snapshot(&self) -> Result<FactSnapshot, Self::Error>;
}

impl RecordSource for FactSnapshot {
    type Error = KpiError;

    fn load_snapshot(&self) -> Result<FactSnapshot, KpiError> {
        Ok(self.clone())
    }
}

/// Calendar month bucket, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(into = "String", try_from = "String")]
pub struct SalesMonth {
    pub year: i32,
    pub month: u8,
}

impl SalesMonth {
    #[must_use]
    pub fn of(date: Date) -> Self {
        Self {
            year: date.year(),
            month: u8::from(date.month()),
        }
    }

    /// Parses `YYYY-MM`.
    ///
    /// # Errors
    /// Returns [`KpiError::Validation`] when the value is malformed or the
    /// month is outside 1..=12.
    pub fn parse(value: &str) -> Result<Self, KpiError> {
        let invalid = || KpiError::Validation(format!("sales month must be YYYY-MM: {value:?}"));

        let (year_raw, month_raw) = value.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year_raw.parse().map_err(|_| invalid())?;
        let month: u8 = month_raw.parse().map_err(|_| invalid())?;

        if !(1..=12).contains(&month) {
            return Err(invalid());
        }

        Ok(Self { year, month })
    }
}

impl Display for SalesMonth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl From<SalesMonth> for String {
    fn from(value: SalesMonth) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for SalesMonth {
    type Error = KpiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Numeric fact fields that calculators can select by name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    InventoryLevel,
    UnitsSold,
    UnitsOrdered,
    DemandForecast,
    Price,
    Discount,
    CompetitorPricing,
}

impl NumericField {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InventoryLevel => "inventory_level",
            Self::UnitsSold => "units_sold",
            Self::UnitsOrdered => "units_ordered",
            Self::DemandForecast => "demand_forecast",
            Self::Price => "price",
            Self::Discount => "discount",
            Self::CompetitorPricing => "competitor_pricing",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "inventory_level" => Some(Self::InventoryLevel),
            "units_sold" => Some(Self::UnitsSold),
            "units_ordered" => Some(Self::UnitsOrdered),
            "demand_forecast" => Some(Self::DemandForecast),
            "price" => Some(Self::Price),
            "discount" => Some(Self::Discount),
            "competitor_pricing" => Some(Self::CompetitorPricing),
            _ => None,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(self, fact: &InventoryTransaction) -> f64 {
        match self {
            Self::InventoryLevel => fact.inventory_level as f64,
            Self::UnitsSold => fact.units_sold as f64,
            Self::UnitsOrdered => fact.units_ordered as f64,
            Self::DemandForecast => fact.demand_forecast,
            Self::Price => fact.price,
            Self::Discount => fact.discount as f64,
            Self::CompetitorPricing => fact.competitor_pricing,
        }
    }
}
