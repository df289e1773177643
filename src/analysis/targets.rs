use std::collections::HashMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{Allocation, Category, CategoryKind, MonthKey, Slot, SpendNature, Transaction, TxnKind};

/// Money spent per 50/30/20 bucket in one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct NatureTotals {
    pub needs: Decimal,
    pub wants: Decimal,
    pub savings: Decimal,
    /// Expenses whose category is missing or carries no nature.
    pub unclassified: Decimal,
}

impl NatureTotals {
    pub(crate) fn get(&self, slot: Slot) -> Decimal {
        match slot {
            Slot::Needs => self.needs,
            Slot::Wants => self.wants,
            Slot::Savings => self.savings,
        }
    }

    pub(super) fn add(&mut self, txn: &Transaction, natures: &HashMap<i64, SpendNature>) {
        match txn.kind {
            TxnKind::Savings => self.savings += txn.amount,
            TxnKind::Expense => {
                match txn.category_id.and_then(|id| natures.get(&id)) {
                    Some(SpendNature::Needs) => self.needs += txn.amount,
                    Some(SpendNature::Wants) => self.wants += txn.amount,
                    None => self.unclassified += txn.amount,
                }
            }
            TxnKind::Income | TxnKind::Debt => {}
        }
    }
}

/// Target amount per bucket for one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct NatureTargets {
    pub needs: Decimal,
    pub wants: Decimal,
    pub savings: Decimal,
}

impl NatureTargets {
    pub(crate) fn get(&self, slot: Slot) -> Decimal {
        match slot {
            Slot::Needs => self.needs,
            Slot::Wants => self.wants,
            Slot::Savings => self.savings,
        }
    }
}

pub(crate) fn nature_map(categories: &[Category]) -> HashMap<i64, SpendNature> {
    categories
        .iter()
        .filter(|c| c.kind == CategoryKind::Expense)
        .filter_map(|c| Some((c.id?, c.nature?)))
        .collect()
}

pub(crate) fn monthly_income(transactions: &[Transaction], month: MonthKey) -> Decimal {
    transactions
        .iter()
        .filter(|t| t.kind == TxnKind::Income && t.in_month(month))
        .map(|t| t.amount)
        .sum()
}

pub(crate) fn spend_by_nature(
    transactions: &[Transaction],
    categories: &[Category],
    month: MonthKey,
) -> NatureTotals {
    let natures = nature_map(categories);
    let mut totals = NatureTotals::default();
    for txn in transactions.iter().filter(|t| t.in_month(month)) {
        totals.add(txn, &natures);
    }
    totals
}

pub(crate) fn targets(income: Decimal, allocation: Allocation) -> NatureTargets {
    let share = |pct: u8| income * Decimal::from(pct) / Decimal::ONE_HUNDRED;
    NatureTargets {
        needs: share(allocation.needs()),
        wants: share(allocation.wants()),
        savings: share(allocation.savings()),
    }
}

/// Whole percent of `part` in `whole`, or 0 when `whole` is not positive.
pub(crate) fn percent_of(part: Decimal, whole: Decimal) -> u32 {
    if whole <= Decimal::ZERO {
        return 0;
    }
    (part / whole * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BucketRow {
    pub slot: Slot,
    pub pct: u8,
    pub actual: Decimal,
    pub target: Decimal,
    /// Share of the target already used, capped at 100.
    pub used_pct: u32,
}

impl BucketRow {
    pub(crate) fn is_over(&self) -> bool {
        self.actual > self.target
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AllocationReport {
    pub month: MonthKey,
    pub allocation: Allocation,
    pub income: Decimal,
    pub rows: Vec<BucketRow>,
    pub unclassified: Decimal,
}

/// Actual spend against the allocation targets for one month.
pub(crate) fn allocation_report(
    transactions: &[Transaction],
    categories: &[Category],
    allocation: Allocation,
    month: MonthKey,
) -> AllocationReport {
    let income = monthly_income(transactions, month);
    let actual = spend_by_nature(transactions, categories, month);
    let target = targets(income, allocation);

    let rows = Slot::all()
        .iter()
        .map(|&slot| BucketRow {
            slot,
            pct: allocation.get(slot),
            actual: actual.get(slot),
            target: target.get(slot),
            used_pct: percent_of(actual.get(slot), target.get(slot)).min(100),
        })
        .collect();

    AllocationReport {
        month,
        allocation,
        income,
        rows,
        unclassified: actual.unclassified,
    }
}
