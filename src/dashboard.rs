use std::path::Path;
use std::sync::Arc;

use polars::prelude::*;
use tracing::{info, warn};

use crate::config::ColumnsConfig;
use crate::error::{Result, SalesError};
use crate::insights::Insights;
use crate::metrics::{add_profit_margin, AggregationSpec};
use crate::source::load_transactions;
use crate::views::{self, DiscountBand, Dimension, HeatValue, Heatmap, Metric, StateBar};
use crate::OpenOptions;

/// Loaded transactions plus the aggregates that do not depend on UI state.
///
/// The base table is never mutated after construction. Geography is computed once and
/// shared by every state chart.
#[derive(Clone)]
pub struct Dashboard {
    base: Arc<DataFrame>,
    geography: Arc<DataFrame>,
    insights: Option<Insights>,
}

impl Dashboard {
    pub fn new(transactions: DataFrame) -> Result<Self> {
        AggregationSpec::default().validate(&transactions)?;
        let base = add_profit_margin(&transactions)?;

        let (geography, insights) = if base.height() == 0 {
            warn!("transaction table is empty");
            (DataFrame::empty(), None)
        } else {
            (views::group_by_geography(&base)?, Some(Insights::compute(&base)?))
        };
        info!(
            rows = base.height(),
            states = geography.height(),
            "dashboard ready"
        );

        Ok(Self {
            base: Arc::new(base),
            geography: Arc::new(geography),
            insights,
        })
    }

    pub fn load(path: &Path, options: &OpenOptions, columns: &ColumnsConfig) -> Result<Self> {
        Self::new(load_transactions(path, options, columns)?)
    }

    /// Transactions with the per-row profit margin column.
    pub fn base(&self) -> &DataFrame {
        &self.base
    }

    pub fn geography(&self) -> &DataFrame {
        &self.geography
    }

    pub fn insights(&self) -> Option<&Insights> {
        self.insights.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.base.height() == 0
    }

    pub fn dimension(&self, dimension: Dimension) -> Result<DataFrame> {
        views::dimension_summary(&self.base, dimension)
    }

    /// Bars of one dimension chart.
    pub fn dimension_bars(
        &self,
        dimension: Dimension,
        metric: Metric,
    ) -> Result<Vec<(String, f64)>> {
        let summary = self.dimension(dimension)?;
        views::metric_values(&summary, &[dimension.column()], metric)
    }

    pub fn states(&self, metric: Metric) -> Result<Vec<StateBar>> {
        views::state_ranking(&self.geography, metric)
    }

    pub fn heatmap(&self, value: HeatValue) -> Result<Heatmap> {
        self.require_rows()?;
        views::discount_heatmap(&self.base, value)
    }

    pub fn margin_bands(&self) -> Result<Vec<DiscountBand>> {
        views::margin_by_discount(&self.base)
    }

    pub fn categories(&self) -> Result<DataFrame> {
        views::category_breakdown(&self.base)
    }

    fn require_rows(&self) -> Result<()> {
        if self.is_empty() {
            Err(SalesError::EmptyInput)
        } else {
            Ok(())
        }
    }
}
