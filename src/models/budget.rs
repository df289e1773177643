use rust_decimal::Decimal;

use super::MonthKey;

/// A spending ceiling for one category in one month.
#[derive(Debug, Clone)]
pub(crate) struct Budget {
    pub id: Option<i64>,
    pub category_id: i64,
    pub month: MonthKey,
    pub limit_amount: Decimal,
}

impl Budget {
    pub(crate) fn new(category_id: i64, month: MonthKey, limit_amount: Decimal) -> Self {
        Self {
            id: None,
            category_id,
            month,
            limit_amount,
        }
    }
}
