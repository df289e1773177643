use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{Category, Transaction, TxnKind};

pub(crate) const UNCATEGORIZED: &str = "Uncategorized";

/// Expense total for one category or for the uncategorized bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CategorySpend {
    pub label: String,
    pub total: Decimal,
}

/// The `limit` expense categories with the largest totals, largest first.
///
/// Transactions dated before `since` are ignored. Expenses with no category,
/// or with a category that no longer exists, land in one uncategorized
/// bucket. Ties are ordered by label.
pub(crate) fn top_categories(
    transactions: &[Transaction],
    categories: &[Category],
    since: Option<NaiveDate>,
    limit: usize,
) -> Vec<CategorySpend> {
    let mut sums: HashMap<Option<i64>, Decimal> = HashMap::new();
    for txn in transactions {
        if txn.kind != TxnKind::Expense {
            continue;
        }
        if since.is_some_and(|cutoff| txn.date < cutoff) {
            continue;
        }
        let amount = txn.amount.abs();
        if amount.is_zero() {
            continue;
        }
        let key = txn
            .category_id
            .filter(|id| Category::find_by_id(categories, *id).is_some());
        *sums.entry(key).or_default() += amount;
    }

    let mut rows: Vec<CategorySpend> = sums
        .into_iter()
        .map(|(category_id, total)| {
            let label = category_id
                .and_then(|id| Category::find_by_id(categories, id))
                .map(|c| c.name.clone())
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            CategorySpend { label, total }
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.label.cmp(&b.label)));
    rows.truncate(limit);
    rows
}
