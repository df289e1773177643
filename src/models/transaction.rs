use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::MonthKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TxnKind {
    Income,
    Expense,
    Debt,
    Savings,
}

impl TxnKind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Debt => "debt",
            Self::Savings => "savings",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            "debt" => Some(Self::Debt),
            "savings" | "saving" => Some(Self::Savings),
            _ => None,
        }
    }
}

impl std::fmt::Display for TxnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded money movement. Amounts are stored unsigned; the kind carries
/// the direction. There is no update path: a wrong entry is deleted and
/// recorded again.
#[derive(Debug, Clone)]
pub(crate) struct Transaction {
    pub id: Option<i64>,
    pub kind: TxnKind,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category_id: Option<i64>,
    pub note: String,
    pub created_at: String,
}

impl Transaction {
    pub(crate) fn new(kind: TxnKind, amount: Decimal, date: NaiveDate) -> Self {
        Self {
            id: None,
            kind,
            amount: amount.abs(),
            date,
            category_id: None,
            note: String::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub(crate) fn with_category(mut self, category_id: Option<i64>) -> Self {
        self.category_id = category_id;
        self
    }

    pub(crate) fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub(crate) fn month(&self) -> MonthKey {
        MonthKey::of_date(self.date)
    }

    pub(crate) fn in_month(&self, month: MonthKey) -> bool {
        month.contains(self.date)
    }
}
