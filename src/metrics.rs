//! Profit-margin derivation and the generic group-and-aggregate operation.
//!
//! Every function here is pure: the input table is borrowed, never modified, and a new
//! table is returned. Margins of grouped rows are always recomputed from the summed sale
//! and profit of the group.

use polars::prelude::*;
use tracing::debug;

use crate::error::{Result, SalesError};
use crate::schema::{DISCOUNT, PROFIT, PROFIT_MARGIN, QUANTITY, SALE, TRANSACTIONS};

/// Round to 2 decimals, ties to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Margin in percent of a single (profit, sale) pair.
///
/// A zero sale has no defined margin and yields `NaN`, never an error.
pub fn profit_margin(profit: f64, sale: f64) -> f64 {
    if sale == 0.0 {
        return f64::NAN;
    }
    round2(profit / sale * 100.0)
}

/// How a column is reduced when grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFn {
    Sum,
    Mean,
}

impl AggFn {
    fn apply(self, expr: Expr) -> Expr {
        match self {
            Self::Sum => expr.sum(),
            Self::Mean => expr.mean(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
        }
    }
}

/// Fixed mapping from column name to its aggregation.
///
/// Sale and profit must be summed, otherwise the group margin would not be a
/// margin-of-sums.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationSpec {
    columns: Vec<(String, AggFn)>,
}

impl Default for AggregationSpec {
    fn default() -> Self {
        Self {
            columns: vec![
                (SALE.to_string(), AggFn::Sum),
                (PROFIT.to_string(), AggFn::Sum),
                (QUANTITY.to_string(), AggFn::Sum),
                (DISCOUNT.to_string(), AggFn::Mean),
            ],
        }
    }
}

impl AggregationSpec {
    pub fn new(columns: Vec<(String, AggFn)>) -> Result<Self> {
        for required in [SALE, PROFIT] {
            match columns.iter().find(|(name, _)| name == required) {
                Some((_, AggFn::Sum)) => {}
                Some((_, other)) => {
                    return Err(SalesError::InvalidAggregation(format!(
                        "'{}' must be summed, not {}",
                        required,
                        other.as_str()
                    )))
                }
                None => {
                    return Err(SalesError::InvalidAggregation(format!(
                        "'{}' is required",
                        required
                    )))
                }
            }
        }
        for (i, (name, _)) in columns.iter().enumerate() {
            if columns[..i].iter().any(|(other, _)| other == name) {
                return Err(SalesError::InvalidAggregation(format!(
                    "'{}' listed more than once",
                    name
                )));
            }
            if name == TRANSACTIONS || name == PROFIT_MARGIN {
                return Err(SalesError::InvalidAggregation(format!(
                    "'{}' is a derived column",
                    name
                )));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[(String, AggFn)] {
        &self.columns
    }

    /// Check that every aggregated column exists in `table` and is numeric.
    pub fn validate(&self, table: &DataFrame) -> Result<()> {
        for (name, _) in &self.columns {
            let column = table
                .column(name.as_str())
                .map_err(|_| SalesError::MissingColumn(name.clone()))?;
            let dtype = column.dtype();
            if !(dtype.is_float() || dtype.is_integer()) {
                return Err(SalesError::InvalidAggregation(format!(
                    "'{}' has non-numeric type {}",
                    name, dtype
                )));
            }
        }
        Ok(())
    }

    /// Aggregate expressions for every column not already part of `key`.
    fn exprs(&self, key: &GroupKey) -> Vec<Expr> {
        self.columns
            .iter()
            .filter(|(name, _)| !key.contains(name))
            .map(|(name, agg)| {
                agg.apply(col(name.as_str()).cast(DataType::Float64))
                    .alias(name.as_str())
            })
            .collect()
    }
}

/// Ordered list of categorical columns a table is partitioned by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupKey(Vec<String>);

impl GroupKey {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(columns.into_iter().map(Into::into).collect())
    }

    pub fn columns(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.iter().any(|c| c == column)
    }

    fn exprs(&self) -> Vec<Expr> {
        self.0.iter().map(|c| col(c.as_str())).collect()
    }
}

impl From<&str> for GroupKey {
    fn from(column: &str) -> Self {
        Self(vec![column.to_string()])
    }
}

impl<const N: usize> From<[&str; N]> for GroupKey {
    fn from(columns: [&str; N]) -> Self {
        Self::new(columns)
    }
}

impl From<&[&str]> for GroupKey {
    fn from(columns: &[&str]) -> Self {
        Self::new(columns.iter().copied())
    }
}

fn float_column(table: &DataFrame, name: &str) -> Result<Column> {
    let column = table
        .column(name)
        .map_err(|_| SalesError::MissingColumn(name.to_string()))?;
    Ok(column.cast(&DataType::Float64)?)
}

/// Returns a copy of `table` with a `profit_margin` column computed from its `sale` and
/// `profit` columns. An existing margin column is replaced, so applying this twice gives
/// the same values.
pub fn add_profit_margin(table: &DataFrame) -> Result<DataFrame> {
    let sale = float_column(table, SALE)?;
    let profit = float_column(table, PROFIT)?;

    let margin: Float64Chunked = sale
        .f64()?
        .into_iter()
        .zip(profit.f64()?.into_iter())
        .map(|(sale, profit)| match (sale, profit) {
            (Some(sale), Some(profit)) => Some(profit_margin(profit, sale)),
            _ => None,
        })
        .collect();

    let mut out = table.clone();
    out.with_column(margin.with_name(PROFIT_MARGIN.into()).into_column())?;
    Ok(out)
}

/// Sale and profit feed the group margin and must stay aggregated; the derived
/// columns are recomputed per group.
const UNGROUPABLE: [&str; 4] = [SALE, PROFIT, PROFIT_MARGIN, TRANSACTIONS];

fn check_key(table: &DataFrame, key: &GroupKey) -> Result<()> {
    if key.columns().is_empty() {
        return Err(SalesError::InvalidKey("<empty>".to_string()));
    }
    if let Some(column) = UNGROUPABLE.iter().find(|c| key.contains(c)) {
        return Err(SalesError::InvalidKey(column.to_string()));
    }
    for column in key.columns() {
        if table.get_column_index(column.as_str()).is_none() {
            return Err(SalesError::InvalidKey(column.clone()));
        }
    }
    Ok(())
}

/// Partition `table` by `key` and aggregate with the default spec: summed sale, profit
/// and quantity, mean discount, the transaction count, and the group margin.
///
/// A numeric column used as key (`discount`) is kept as key and not aggregated. Keys
/// naming sale, profit or a derived column are rejected with `InvalidKey`. Rows come
/// out ordered by the key values.
pub fn group_by(table: &DataFrame, key: impl Into<GroupKey>) -> Result<DataFrame> {
    group_by_with(table, &key.into(), &AggregationSpec::default())
}

/// Like [`group_by`] with an explicit aggregation spec.
pub fn group_by_with(
    table: &DataFrame,
    key: &GroupKey,
    spec: &AggregationSpec,
) -> Result<DataFrame> {
    check_key(table, key)?;
    if table.height() == 0 {
        return Err(SalesError::EmptyInput);
    }
    spec.validate(table)?;

    let mut aggs = spec.exprs(key);
    aggs.push(len().alias(TRANSACTIONS));

    let summary = table
        .clone()
        .lazy()
        .group_by(key.exprs())
        .agg(aggs)
        .sort_by_exprs(key.exprs(), SortMultipleOptions::default())
        .collect()?;

    debug!(
        key = ?key.columns(),
        rows = table.height(),
        groups = summary.height(),
        "grouped transactions"
    );

    add_profit_margin(&summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_values(df: &DataFrame, name: &str) -> Vec<f64> {
        df.column(name)
            .unwrap()
            .cast(&DataType::Float64)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect()
    }

    fn str_values(df: &DataFrame, name: &str) -> Vec<String> {
        df.column(name)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect()
    }

    fn three_rows() -> DataFrame {
        df!(
            "sale" => &[100.0_f64, 200.0, 50.0],
            "profit" => &[20.0_f64, 40.0, -10.0],
            "quantity" => &[1.0_f64, 2.0, 3.0],
            "discount" => &[0.0_f64, 0.2, 0.4],
            "region" => &["A", "A", "B"]
        )
        .unwrap()
    }

    #[test]
    fn margin_formula() {
        assert_eq!(profit_margin(20.0, 100.0), 20.0);
        assert_eq!(profit_margin(-10.0, 50.0), -20.0);
        assert_eq!(profit_margin(1.0, 3.0), 33.33);
        assert_eq!(profit_margin(2.0, 3.0), 66.67);
    }

    #[test]
    fn zero_sale_margin_is_nan() {
        assert!(profit_margin(10.0, 0.0).is_nan());
        assert!(profit_margin(0.0, 0.0).is_nan());
        assert!(profit_margin(-5.0, 0.0).is_nan());
    }

    #[test]
    fn add_profit_margin_per_row() {
        let df = add_profit_margin(&three_rows()).unwrap();
        assert_eq!(f64_values(&df, PROFIT_MARGIN), vec![20.0, 20.0, -20.0]);
    }

    #[test]
    fn add_profit_margin_does_not_touch_input() {
        let base = three_rows();
        let _ = add_profit_margin(&base).unwrap();
        assert!(base.column(PROFIT_MARGIN).is_err());
        assert_eq!(base.width(), 5);
    }

    #[test]
    fn add_profit_margin_is_idempotent() {
        let once = add_profit_margin(&three_rows()).unwrap();
        let twice = add_profit_margin(&once).unwrap();
        assert_eq!(once.width(), twice.width());
        assert_eq!(
            f64_values(&once, PROFIT_MARGIN),
            f64_values(&twice, PROFIT_MARGIN)
        );
    }

    #[test]
    fn add_profit_margin_single_zero_sale_row() {
        let df = df!("sale" => &[0.0_f64], "profit" => &[12.5_f64]).unwrap();
        let out = add_profit_margin(&df).unwrap();
        assert!(f64_values(&out, PROFIT_MARGIN)[0].is_nan());
    }

    #[test]
    fn add_profit_margin_null_input_gives_null() {
        let df = df!("sale" => &[Some(10.0_f64), None], "profit" => &[Some(1.0_f64), Some(2.0)])
            .unwrap();
        let out = add_profit_margin(&df).unwrap();
        let margin = out.column(PROFIT_MARGIN).unwrap().f64().unwrap().clone();
        assert_eq!(margin.get(0), Some(10.0));
        assert_eq!(margin.get(1), None);
    }

    #[test]
    fn add_profit_margin_accepts_integer_columns() {
        let df = df!("sale" => &[200_i64], "profit" => &[30_i64]).unwrap();
        let out = add_profit_margin(&df).unwrap();
        assert_eq!(f64_values(&out, PROFIT_MARGIN), vec![15.0]);
    }

    #[test]
    fn add_profit_margin_missing_column() {
        let df = df!("sale" => &[1.0_f64]).unwrap();
        match add_profit_margin(&df) {
            Err(SalesError::MissingColumn(name)) => assert_eq!(name, "profit"),
            other => panic!("expected MissingColumn, got {:?}", other.map(|d| d.shape())),
        }
    }

    #[test]
    fn group_by_region_end_to_end() {
        let summary = group_by(&three_rows(), "region").unwrap();
        assert_eq!(str_values(&summary, "region"), vec!["A", "B"]);
        assert_eq!(f64_values(&summary, SALE), vec![300.0, 50.0]);
        assert_eq!(f64_values(&summary, PROFIT), vec![60.0, -10.0]);
        assert_eq!(f64_values(&summary, PROFIT_MARGIN), vec![20.0, -20.0]);
        assert_eq!(f64_values(&summary, QUANTITY), vec![3.0, 3.0]);
        assert_eq!(f64_values(&summary, TRANSACTIONS), vec![2.0, 1.0]);
        let discount = f64_values(&summary, DISCOUNT);
        assert!((discount[0] - 0.1).abs() < 1e-12);
        assert!((discount[1] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn group_margin_is_margin_of_sums() {
        let df = df!(
            "sale" => &[50.0_f64, 200.0],
            "profit" => &[10.0_f64, 10.0],
            "quantity" => &[1.0_f64, 1.0],
            "discount" => &[0.0_f64, 0.0],
            "region" => &["A", "A"]
        )
        .unwrap();
        let summary = group_by(&df, "region").unwrap();
        assert_eq!(f64_values(&summary, PROFIT_MARGIN), vec![8.0]);
    }

    #[test]
    fn group_by_composite_key() {
        let df = df!(
            "sale" => &[10.0_f64, 20.0, 30.0],
            "profit" => &[1.0_f64, 2.0, 3.0],
            "quantity" => &[1.0_f64, 1.0, 1.0],
            "discount" => &[0.0_f64, 0.0, 0.0],
            "category" => &["X", "X", "X"],
            "sub_category" => &["b", "a", "b"]
        )
        .unwrap();
        let summary = group_by(&df, ["category", "sub_category"]).unwrap();
        assert_eq!(str_values(&summary, "sub_category"), vec!["a", "b"]);
        assert_eq!(f64_values(&summary, SALE), vec![20.0, 40.0]);
    }

    #[test]
    fn group_by_unknown_key() {
        match group_by(&three_rows(), "regionn") {
            Err(SalesError::InvalidKey(key)) => assert_eq!(key, "regionn"),
            other => panic!("expected InvalidKey, got {:?}", other.map(|d| d.shape())),
        }
    }

    #[test]
    fn group_by_numeric_spec_column() {
        let summary = group_by(&three_rows(), "discount").unwrap();
        assert_eq!(summary.height(), 3);
        assert_eq!(
            summary
                .get_column_names()
                .iter()
                .filter(|name| name.as_str() == DISCOUNT)
                .count(),
            1
        );
        assert_eq!(f64_values(&summary, DISCOUNT), vec![0.0, 0.2, 0.4]);
        assert_eq!(f64_values(&summary, SALE), vec![100.0, 200.0, 50.0]);
        assert_eq!(f64_values(&summary, PROFIT_MARGIN), vec![20.0, 20.0, -20.0]);
    }

    #[test]
    fn group_by_sale_or_derived_column_is_rejected() {
        let with_margin = add_profit_margin(&three_rows()).unwrap();
        for key in [SALE, PROFIT, PROFIT_MARGIN] {
            match group_by(&with_margin, key) {
                Err(SalesError::InvalidKey(name)) => assert_eq!(name, key),
                other => panic!("expected InvalidKey, got {:?}", other.map(|d| d.shape())),
            }
        }
        assert!(matches!(
            group_by(&three_rows(), ["region", "sale"]),
            Err(SalesError::InvalidKey(_))
        ));
    }

    #[test]
    fn group_by_empty_key() {
        let key = GroupKey::new(Vec::<String>::new());
        let result = group_by_with(&three_rows(), &key, &AggregationSpec::default());
        assert!(matches!(result, Err(SalesError::InvalidKey(_))));
    }

    #[test]
    fn group_by_empty_table() {
        let empty = three_rows().head(Some(0));
        assert!(matches!(
            group_by(&empty, "region"),
            Err(SalesError::EmptyInput)
        ));
    }

    #[test]
    fn group_by_zero_sale_group_is_nan() {
        let df = df!(
            "sale" => &[0.0_f64, 10.0],
            "profit" => &[-3.0_f64, 1.0],
            "quantity" => &[1.0_f64, 1.0],
            "discount" => &[0.5_f64, 0.0],
            "region" => &["A", "B"]
        )
        .unwrap();
        let margins = f64_values(&group_by(&df, "region").unwrap(), PROFIT_MARGIN);
        assert!(margins[0].is_nan());
        assert_eq!(margins[1], 10.0);
    }

    #[test]
    fn spec_requires_summed_sale_and_profit() {
        let mean_sale = AggregationSpec::new(vec![
            ("sale".to_string(), AggFn::Mean),
            ("profit".to_string(), AggFn::Sum),
        ]);
        assert!(matches!(mean_sale, Err(SalesError::InvalidAggregation(_))));

        let missing_profit = AggregationSpec::new(vec![("sale".to_string(), AggFn::Sum)]);
        assert!(matches!(
            missing_profit,
            Err(SalesError::InvalidAggregation(_))
        ));

        let duplicated = AggregationSpec::new(vec![
            ("sale".to_string(), AggFn::Sum),
            ("profit".to_string(), AggFn::Sum),
            ("sale".to_string(), AggFn::Sum),
        ]);
        assert!(matches!(duplicated, Err(SalesError::InvalidAggregation(_))));
    }

    #[test]
    fn spec_validate_against_schema() {
        let spec = AggregationSpec::default();
        assert!(spec.validate(&three_rows()).is_ok());

        let no_quantity = three_rows().drop("quantity").unwrap();
        assert!(matches!(
            spec.validate(&no_quantity),
            Err(SalesError::MissingColumn(name)) if name == "quantity"
        ));

        let text_discount = df!(
            "sale" => &[1.0_f64],
            "profit" => &[1.0_f64],
            "quantity" => &[1.0_f64],
            "discount" => &["ten"]
        )
        .unwrap();
        assert!(matches!(
            spec.validate(&text_discount),
            Err(SalesError::InvalidAggregation(_))
        ));
    }

    #[test]
    fn custom_spec_only_aggregates_listed_columns() {
        let spec = AggregationSpec::new(vec![
            ("sale".to_string(), AggFn::Sum),
            ("profit".to_string(), AggFn::Sum),
        ])
        .unwrap();
        let summary = group_by_with(&three_rows(), &GroupKey::from("region"), &spec).unwrap();
        assert!(summary.column(QUANTITY).is_err());
        assert_eq!(f64_values(&summary, PROFIT_MARGIN), vec![20.0, -20.0]);
    }
}
