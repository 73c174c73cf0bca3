//! Canonical column names of the transaction table.
//!
//! The loader renames the CSV headers (see `ColumnsConfig`) to these names, so every
//! aggregation below works against a fixed schema.

pub const SALE: &str = "sale";
pub const PROFIT: &str = "profit";
pub const DISCOUNT: &str = "discount";
pub const QUANTITY: &str = "quantity";
pub const DELIVERY_TYPE: &str = "delivery_type";
pub const SEGMENT: &str = "segment";
pub const CATEGORY: &str = "category";
pub const SUB_CATEGORY: &str = "sub_category";
pub const STATE: &str = "state";
pub const STATE_CODE: &str = "state_code";
pub const REGION: &str = "region";

/// Derived per-row (or per-group) margin, percent with 2 decimals.
pub const PROFIT_MARGIN: &str = "profit_margin";
/// Number of transactions in a group.
pub const TRANSACTIONS: &str = "transactions";

/// One field of a transaction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Sale,
    Profit,
    Discount,
    Quantity,
    DeliveryType,
    Segment,
    Category,
    SubCategory,
    State,
    StateCode,
    Region,
}

impl Field {
    pub const ALL: [Self; 11] = [
        Self::Sale,
        Self::Profit,
        Self::Discount,
        Self::Quantity,
        Self::DeliveryType,
        Self::Segment,
        Self::Category,
        Self::SubCategory,
        Self::State,
        Self::StateCode,
        Self::Region,
    ];

    /// Canonical column name in the loaded table.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sale => SALE,
            Self::Profit => PROFIT,
            Self::Discount => DISCOUNT,
            Self::Quantity => QUANTITY,
            Self::DeliveryType => DELIVERY_TYPE,
            Self::Segment => SEGMENT,
            Self::Category => CATEGORY,
            Self::SubCategory => SUB_CATEGORY,
            Self::State => STATE,
            Self::StateCode => STATE_CODE,
            Self::Region => REGION,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Sale | Self::Profit | Self::Discount | Self::Quantity
        )
    }
}
