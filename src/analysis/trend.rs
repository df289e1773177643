use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{Category, MonthKey, Transaction, TxnKind};

use super::targets::{nature_map, NatureTotals};

/// Totals per transaction kind for one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct MonthlyTotals {
    pub income: Decimal,
    pub expenses: Decimal,
    pub debt: Decimal,
    pub savings: Decimal,
}

impl MonthlyTotals {
    /// Savings count as money leaving the balance, as in the 50/30/20 plan.
    pub(crate) fn balance(&self) -> Decimal {
        self.income - self.expenses - self.debt - self.savings
    }
}

pub(crate) fn monthly_totals(transactions: &[Transaction], month: MonthKey) -> MonthlyTotals {
    let mut totals = MonthlyTotals::default();
    for txn in transactions.iter().filter(|t| t.in_month(month)) {
        match txn.kind {
            TxnKind::Income => totals.income += txn.amount,
            TxnKind::Expense => totals.expenses += txn.amount,
            TxnKind::Debt => totals.debt += txn.amount,
            TxnKind::Savings => totals.savings += txn.amount,
        }
    }
    totals
}

/// Totals for the `months` months ending at `end`, oldest first.
pub(crate) fn monthly_trend(
    transactions: &[Transaction],
    end: MonthKey,
    months: usize,
) -> Vec<(MonthKey, MonthlyTotals)> {
    MonthKey::last_n(end, months)
        .into_iter()
        .map(|m| (m, monthly_totals(transactions, m)))
        .collect()
}

/// Needs/wants/savings spend for the `months` months ending at `end`.
pub(crate) fn nature_trend(
    transactions: &[Transaction],
    categories: &[Category],
    end: MonthKey,
    months: usize,
) -> Vec<(MonthKey, NatureTotals)> {
    let natures = nature_map(categories);
    let keys = MonthKey::last_n(end, months);
    let mut rows: Vec<(MonthKey, NatureTotals)> =
        keys.iter().map(|m| (*m, NatureTotals::default())).collect();

    for txn in transactions {
        let month = txn.month();
        if let Ok(idx) = keys.binary_search(&month) {
            rows[idx].1.add(txn, &natures);
        }
    }
    rows
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DayFlow {
    pub date: NaiveDate,
    pub income: Decimal,
    pub expenses: Decimal,
    pub balance: Decimal,
}

/// Income and expenses for each day of `month`. With `cumulative`, each
/// day carries the running totals up to and including that day.
pub(crate) fn daily_flow(
    transactions: &[Transaction],
    month: MonthKey,
    cumulative: bool,
) -> Vec<DayFlow> {
    let Some(first) = month.first_day() else {
        return Vec::new();
    };
    let mut days: Vec<DayFlow> = first
        .iter_days()
        .take(month.days() as usize)
        .map(|date| DayFlow {
            date,
            income: Decimal::ZERO,
            expenses: Decimal::ZERO,
            balance: Decimal::ZERO,
        })
        .collect();

    for txn in transactions.iter().filter(|t| t.in_month(month)) {
        let idx = (txn.date - first).num_days() as usize;
        let Some(day) = days.get_mut(idx) else {
            continue;
        };
        match txn.kind {
            TxnKind::Income => day.income += txn.amount,
            TxnKind::Expense => day.expenses += txn.amount,
            TxnKind::Debt | TxnKind::Savings => {}
        }
    }

    let (mut income, mut expenses) = (Decimal::ZERO, Decimal::ZERO);
    for day in days.iter_mut() {
        if cumulative {
            income += day.income;
            expenses += day.expenses;
            day.income = income;
            day.expenses = expenses;
        }
        day.balance = day.income - day.expenses;
    }
    days
}

/// Trailing mean over `window` values; `None` until the window fills.
pub(crate) fn moving_average(values: &[Decimal], window: usize) -> Vec<Option<Decimal>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let sum: Decimal = slice.iter().sum();
            Some(sum / Decimal::from(window as u64))
        })
        .collect()
}
