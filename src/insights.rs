use polars::prelude::*;

use crate::error::{Result, SalesError};
use crate::metrics::{group_by, profit_margin};
use crate::schema::{DISCOUNT, PROFIT, SALE};
use crate::views::float_values;

/// Headline figures of the whole transaction table.
#[derive(Debug, Clone, PartialEq)]
pub struct Insights {
    pub transactions: usize,
    pub total_sale: f64,
    pub total_profit: f64,
    pub mean_sale: f64,
    pub mean_profit: f64,
    /// Margin of the summed sale and profit.
    pub margin: f64,
    /// Smallest discount level from which every higher level loses money in total.
    pub loss_threshold: Option<f64>,
}

impl Insights {
    pub fn compute(table: &DataFrame) -> Result<Self> {
        if table.height() == 0 {
            return Err(SalesError::EmptyInput);
        }
        let sales = float_values(table, SALE)?;
        let profits = float_values(table, PROFIT)?;
        let transactions = table.height();
        let total_sale: f64 = sales.iter().flatten().sum();
        let total_profit: f64 = profits.iter().flatten().sum();

        Ok(Self {
            transactions,
            total_sale,
            total_profit,
            mean_sale: total_sale / transactions as f64,
            mean_profit: total_profit / transactions as f64,
            margin: profit_margin(total_profit, total_sale),
            loss_threshold: loss_threshold(table)?,
        })
    }

    /// Human-readable lines for the insights page.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("{} transactions in total.", self.transactions),
            format!("Total sales of {:.2}.", self.total_sale),
            format!("Total profit of {:.2}.", self.total_profit),
            format!("Mean sale of {:.2} per transaction.", self.mean_sale),
            format!("Mean profit of {:.2} per transaction.", self.mean_profit),
            format!("Overall profit margin of {:.2}%.", self.margin),
        ];
        match self.loss_threshold {
            Some(d) => lines.push(format!(
                "From a {:.0}% discount upwards every discount level loses money.",
                d * 100.0
            )),
            None => lines.push("No discount level range is loss-making throughout.".to_string()),
        }
        lines
    }
}

fn loss_threshold(table: &DataFrame) -> Result<Option<f64>> {
    let by_discount = group_by(table, DISCOUNT)?;
    let discounts = float_values(&by_discount, DISCOUNT)?;
    let profits = float_values(&by_discount, PROFIT)?;

    let mut threshold = None;
    for (discount, profit) in discounts.into_iter().zip(profits).rev() {
        match (discount, profit) {
            (Some(d), Some(p)) if p < 0.0 => threshold = Some(d),
            _ => break,
        }
    }
    Ok(threshold)
}
