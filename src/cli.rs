//! Command-line types live in the `salesdash-cli` crate so the build script can render
//! the manpage from them; this module maps them onto the dashboard's own types.

pub use salesdash_cli::{Args, CompressionFormat, MetricArg, PageArg, PrintView};

use crate::views::Metric;
use crate::Page;

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Transactions => Metric::Transactions,
            MetricArg::Sale => Metric::Sale,
            MetricArg::Profit => Metric::Profit,
            MetricArg::Quantity => Metric::Quantity,
            MetricArg::Discount => Metric::Discount,
        }
    }
}

impl From<PageArg> for Page {
    fn from(arg: PageArg) -> Self {
        match arg {
            PageArg::Overview => Page::Overview,
            PageArg::Financial => Page::Financial,
            PageArg::Insights => Page::Insights,
        }
    }
}
