//! Named aggregate queries consumed by the dashboard charts.
//!
//! All of them build on [`crate::metrics::group_by`] and take the base transaction table
//! by reference.

use polars::polars_compute::rolling::QuantileMethod;
use polars::prelude::*;

use crate::error::{Result, SalesError};
use crate::metrics::{add_profit_margin, group_by, round2};
use crate::schema::{
    CATEGORY, DELIVERY_TYPE, DISCOUNT, PROFIT, PROFIT_MARGIN, QUANTITY, REGION, SALE, SEGMENT,
    STATE, STATE_CODE, SUB_CATEGORY, TRANSACTIONS,
};

/// Share of the total quantity, percent with 2 decimals (category breakdown).
pub const QUANTITY_SHARE: &str = "quantity_share";

/// Categorical column a dimension chart groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    DeliveryType,
    Segment,
    Region,
    Category,
}

impl Dimension {
    pub const ALL: [Self; 4] = [
        Self::DeliveryType,
        Self::Segment,
        Self::Region,
        Self::Category,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Self::DeliveryType => DELIVERY_TYPE,
            Self::Segment => SEGMENT,
            Self::Region => REGION,
            Self::Category => CATEGORY,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::DeliveryType => "Delivery Type",
            Self::Segment => "Segment",
            Self::Region => "Region",
            Self::Category => "Product Category",
        }
    }
}

/// Value plotted by the dimension and state charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Transactions,
    Sale,
    Profit,
    Quantity,
    Discount,
}

impl Metric {
    pub const ALL: [Self; 5] = [
        Self::Transactions,
        Self::Sale,
        Self::Profit,
        Self::Quantity,
        Self::Discount,
    ];

    /// Summary-table column holding this metric.
    pub fn column(self) -> &'static str {
        match self {
            Self::Transactions => TRANSACTIONS,
            Self::Sale => SALE,
            Self::Profit => PROFIT,
            Self::Quantity => QUANTITY,
            Self::Discount => DISCOUNT,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Transactions => "Transactions",
            Self::Sale => "Sales",
            Self::Profit => "Profit",
            Self::Quantity => "Quantity",
            Self::Discount => "Mean Discount",
        }
    }

    /// Name used in config files and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Self::Transactions => "transactions",
            Self::Sale => "sale",
            Self::Profit => "profit",
            Self::Quantity => "quantity",
            Self::Discount => "discount",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Metric used for per-state values: a transaction count per state is not charted,
    /// total sale is shown instead.
    pub fn for_states(self) -> Self {
        match self {
            Self::Transactions => Self::Sale,
            other => other,
        }
    }
}

/// Value summed in the discount heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatValue {
    Quantity,
    Profit,
}

impl HeatValue {
    pub fn column(self) -> &'static str {
        match self {
            Self::Quantity => QUANTITY,
            Self::Profit => PROFIT,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Quantity => "Quantity",
            Self::Profit => "Profit",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "quantity" => Some(Self::Quantity),
            "profit" => Some(Self::Profit),
            _ => None,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Quantity => Self::Profit,
            Self::Profit => Self::Quantity,
        }
    }
}

pub(crate) fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| SalesError::MissingColumn(name.to_string()))?
        .cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

pub(crate) fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| SalesError::MissingColumn(name.to_string()))?
        .cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Summary table of `table` grouped by one dimension.
pub fn dimension_summary(table: &DataFrame, dimension: Dimension) -> Result<DataFrame> {
    group_by(table, dimension.column())
}

/// `(label, value)` pairs for one metric of a summary table, in summary order.
/// Labels of composite keys are joined with " / ".
pub fn metric_values(
    summary: &DataFrame,
    label_columns: &[&str],
    metric: Metric,
) -> Result<Vec<(String, f64)>> {
    let labels: Vec<Vec<Option<String>>> = label_columns
        .iter()
        .map(|name| string_values(summary, name))
        .collect::<Result<_>>()?;
    let values = float_values(summary, metric.column())?;

    Ok(values
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            let label = labels
                .iter()
                .map(|col| col[row].clone().unwrap_or_else(|| "(null)".to_string()))
                .collect::<Vec<_>>()
                .join(" / ");
            (label, value.unwrap_or(f64::NAN))
        })
        .collect())
}

/// One summary row per (state, state code, region), ordered by descending total sale.
/// States with equal sale keep their key order.
pub fn group_by_geography(table: &DataFrame) -> Result<DataFrame> {
    let summary = group_by(table, [STATE, STATE_CODE, REGION])?;
    Ok(summary
        .lazy()
        .sort_by_exprs(
            vec![col(SALE)],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .collect()?)
}

/// One bar of the state ranking chart.
#[derive(Debug, Clone, PartialEq)]
pub struct StateBar {
    pub state: String,
    pub state_code: String,
    pub value: f64,
    pub margin: f64,
}

/// Per-state values of `metric` from the geography summary, in its order.
pub fn state_ranking(geography: &DataFrame, metric: Metric) -> Result<Vec<StateBar>> {
    if geography.height() == 0 {
        return Ok(Vec::new());
    }
    let metric = metric.for_states();
    let states = string_values(geography, STATE)?;
    let codes = string_values(geography, STATE_CODE)?;
    let values = float_values(geography, metric.column())?;
    let margins = float_values(geography, PROFIT_MARGIN)?;

    Ok(states
        .into_iter()
        .zip(codes)
        .zip(values.into_iter().zip(margins))
        .map(|((state, code), (value, margin))| StateBar {
            state: state.unwrap_or_default(),
            state_code: code.unwrap_or_default(),
            value: value.unwrap_or(f64::NAN),
            margin: margin.unwrap_or(f64::NAN),
        })
        .collect())
}

/// Crosstab of discount level by sub-category.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    pub value: HeatValue,
    /// Row labels, ascending.
    pub discounts: Vec<f64>,
    /// Column labels, ascending.
    pub sub_categories: Vec<String>,
    /// `cells[row][col]`; `None` where no transaction has that combination.
    pub cells: Vec<Vec<Option<f64>>>,
}

impl Heatmap {
    /// Smallest and largest cell value, if any cell is filled.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.cells
            .iter()
            .flatten()
            .flatten()
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Sum of `value` for every (discount, sub-category) pair.
pub fn discount_heatmap(table: &DataFrame, value: HeatValue) -> Result<Heatmap> {
    for key in [DISCOUNT, SUB_CATEGORY] {
        if table.get_column_index(key).is_none() {
            return Err(SalesError::InvalidKey(key.to_string()));
        }
    }
    if table.height() == 0 {
        return Err(SalesError::EmptyInput);
    }

    let grouped = table
        .clone()
        .lazy()
        .group_by([col(DISCOUNT), col(SUB_CATEGORY)])
        .agg([col(value.column())
            .cast(DataType::Float64)
            .sum()
            .alias(value.column())])
        .collect()?;

    let discounts = float_values(&grouped, DISCOUNT)?;
    let subs = string_values(&grouped, SUB_CATEGORY)?;
    let sums = float_values(&grouped, value.column())?;

    let mut row_labels: Vec<f64> = discounts.iter().flatten().copied().collect();
    row_labels.sort_by(f64::total_cmp);
    row_labels.dedup();
    let mut col_labels: Vec<String> = subs.iter().flatten().cloned().collect();
    col_labels.sort();
    col_labels.dedup();

    let mut cells = vec![vec![None; col_labels.len()]; row_labels.len()];
    for ((discount, sub), sum) in discounts.into_iter().zip(subs).zip(sums) {
        let (Some(discount), Some(sub)) = (discount, sub) else {
            continue;
        };
        let row = row_labels.binary_search_by(|d| d.total_cmp(&discount));
        let col = col_labels.binary_search(&sub);
        if let (Ok(row), Ok(col)) = (row, col) {
            cells[row][col] = sum;
        }
    }

    Ok(Heatmap {
        value,
        discounts: row_labels,
        sub_categories: col_labels,
        cells,
    })
}

/// Distribution of row margins at one discount level.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountBand {
    pub discount: f64,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Five-number summary of the row margins per discount level, ascending by discount.
/// Rows without a defined margin (zero sale) are left out.
pub fn margin_by_discount(table: &DataFrame) -> Result<Vec<DiscountBand>> {
    if table.get_column_index(DISCOUNT).is_none() {
        return Err(SalesError::InvalidKey(DISCOUNT.to_string()));
    }
    if table.height() == 0 {
        return Err(SalesError::EmptyInput);
    }
    let with_margin = add_profit_margin(table)?;
    let margin = || col(PROFIT_MARGIN);

    let bands = with_margin
        .lazy()
        .filter(col(SALE).neq(lit(0.0)).and(margin().is_not_null()))
        .group_by([col(DISCOUNT)])
        .agg([
            len().alias("count"),
            margin().min().alias("min"),
            margin()
                .quantile(lit(0.25), QuantileMethod::Linear)
                .alias("q1"),
            margin().median().alias("median"),
            margin()
                .quantile(lit(0.75), QuantileMethod::Linear)
                .alias("q3"),
            margin().max().alias("max"),
        ])
        .sort_by_exprs(vec![col(DISCOUNT)], SortMultipleOptions::default())
        .collect()?;

    let discount = float_values(&bands, DISCOUNT)?;
    let count = float_values(&bands, "count")?;
    let min = float_values(&bands, "min")?;
    let q1 = float_values(&bands, "q1")?;
    let median = float_values(&bands, "median")?;
    let q3 = float_values(&bands, "q3")?;
    let max = float_values(&bands, "max")?;

    let nan = |v: Option<f64>| v.unwrap_or(f64::NAN);
    Ok((0..bands.height())
        .filter_map(|i| {
            Some(DiscountBand {
                discount: discount[i]?,
                count: count[i].unwrap_or(0.0) as usize,
                min: nan(min[i]),
                q1: nan(q1[i]),
                median: nan(median[i]),
                q3: nan(q3[i]),
                max: nan(max[i]),
            })
        })
        .collect())
}

/// Summary per (category, sub-category) plus each row's share of the total quantity.
pub fn category_breakdown(table: &DataFrame) -> Result<DataFrame> {
    let mut summary = group_by(table, [CATEGORY, SUB_CATEGORY])?;
    let quantity = float_values(&summary, QUANTITY)?;
    let total: f64 = quantity.iter().flatten().sum();

    let share: Float64Chunked = quantity
        .into_iter()
        .map(|q| match q {
            Some(_) if total == 0.0 => Some(f64::NAN),
            Some(q) => Some(round2(q / total * 100.0)),
            None => None,
        })
        .collect();
    summary.with_column(share.with_name(QUANTITY_SHARE.into()).into_column())?;
    Ok(summary)
}
