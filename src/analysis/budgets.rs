use rust_decimal::Decimal;

use crate::models::{Budget, Category, MonthKey, Transaction, TxnKind};

use super::percent_of;

/// Share of a limit at which a budget starts warning.
pub(crate) const WARNING_PCT: u32 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BudgetLevel {
    Ok,
    Warning,
    Exceeded,
}

impl BudgetLevel {
    pub(crate) fn from_pct(pct: u32) -> Self {
        if pct >= 100 {
            Self::Exceeded
        } else if pct >= WARNING_PCT {
            Self::Warning
        } else {
            Self::Ok
        }
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Exceeded => "exceeded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BudgetStatus {
    pub category_id: i64,
    pub category_name: String,
    pub month: MonthKey,
    pub spent: Decimal,
    pub limit: Decimal,
    pub pct: u32,
    pub level: BudgetLevel,
}

impl BudgetStatus {
    pub(crate) fn remaining(&self) -> Decimal {
        self.limit - self.spent
    }

    /// One-line alert, or `None` while the budget is comfortably under.
    pub(crate) fn alert(&self) -> Option<String> {
        match self.level {
            BudgetLevel::Ok => None,
            BudgetLevel::Warning => Some(format!(
                "{}: {}% of the {} budget used",
                self.category_name, self.pct, self.month
            )),
            BudgetLevel::Exceeded => Some(format!(
                "{}: reached {}% of the {} budget!",
                self.category_name, self.pct, self.month
            )),
        }
    }
}

/// Spend against every budget set for `month`. Budgets with a non-positive
/// limit are skipped.
pub(crate) fn budget_statuses(
    budgets: &[Budget],
    transactions: &[Transaction],
    categories: &[Category],
    month: MonthKey,
) -> Vec<BudgetStatus> {
    budgets
        .iter()
        .filter(|b| b.month == month && b.limit_amount > Decimal::ZERO)
        .map(|b| {
            let spent: Decimal = transactions
                .iter()
                .filter(|t| {
                    t.kind == TxnKind::Expense
                        && t.category_id == Some(b.category_id)
                        && t.in_month(month)
                })
                .map(|t| t.amount)
                .sum();
            let pct = percent_of(spent, b.limit_amount);
            BudgetStatus {
                category_id: b.category_id,
                category_name: Category::find_by_id(categories, b.category_id)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| format!("#{}", b.category_id)),
                month,
                spent,
                limit: b.limit_amount,
                pct,
                level: BudgetLevel::from_pct(pct),
            }
        })
        .collect()
}
