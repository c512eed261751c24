use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::Month;

use crate::ratio::{add_units, MeanAccumulator};
use crate::{FactSnapshot, KpiError, ProductId, StoreId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Season {
    Winter,
    Summer,
    Monsoon,
    Festive,
}

impl Season {
    #[must_use]
    pub fn from_month(month: Month) -> Self {
        match month {
            Month::December | Month::January | Month::February => Self::Winter,
            Month::March | Month::April | Month::May | Month::June => Self::Summer,
            Month::July | Month::August | Month::September => Self::Monsoon,
            Month::October | Month::November => Self::Festive,
        }
    }

    /// Classifies a month number in `1..=12`.
    ///
    /// # Errors
    /// Returns [`KpiError::Validation`] for any other number.
    pub fn from_month_number(month: u8) -> Result<Self, KpiError> {
        let month = Month::try_from(month).map_err(|_| {
            KpiError::Validation(format!("month MUST be in [1, 12], got {month}"))
        })?;
        Ok(Self::from_month(month))
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Winter => "Winter",
            Self::Summer => "Summer",
            Self::Monsoon => "Monsoon",
            Self::Festive => "Festive",
        }
    }
}

impl Display for Season {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Demand per (category, calendar month). `season` is always
/// `Season::from_month(month)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeasonalDemandRow {
    pub category: String,
    pub month: u8,
    pub season: Season,
    pub total_units_sold: i64,
    pub avg_forecast: f64,
}

/// Aggregates units sold and mean forecast per (category, month, season).
///
/// Facts whose store or product is missing from the reference tables cannot
/// be categorized and are left out.
///
/// # Errors
/// Returns [`KpiError::Computation`] when a category's monthly total
/// overflows.
pub fn seasonal_demand(snapshot: &FactSnapshot) -> Result<Vec<SeasonalDemandRow>, KpiError> {
    let categories: HashMap<&ProductId, &str> = snapshot
        .products
        .iter()
        .map(|product| (&product.product_id, product.category.as_str()))
        .collect();
    let stores: HashSet<&StoreId> = snapshot
        .stores
        .iter()
        .map(|store| &store.store_id)
        .collect();

    let mut groups: HashMap<(&str, Month), (i64, MeanAccumulator)> = HashMap::new();

    for fact in &snapshot.transactions {
        if !stores.contains(&fact.store_id) {
            continue;
        }
        let Some(category) = categories.get(&fact.product_id) else {
            continue;
        };

        let (sold, forecast) = groups.entry((*category, fact.date.month())).or_default();
        *sold = add_units(*sold, fact.units_sold, || {
            format!("month {} units sold for category {category}", u8::from(fact.date.month()))
        })?;
        forecast.push(fact.demand_forecast);
    }

    let mut rows: Vec<SeasonalDemandRow> = groups
        .into_iter()
        .filter_map(|((category, month), (sold, forecast))| {
            Some(SeasonalDemandRow {
                category: category.to_string(),
                month: u8::from(month),
                season: Season::from_month(month),
                total_units_sold: sold,
                avg_forecast: forecast.mean()?,
            })
        })
        .collect();

    rows.sort_by(|lhs, rhs| (&lhs.category, lhs.month).cmp(&(&rhs.category, rhs.month)));
    Ok(rows)
}
