mod allocation;
mod budget;
mod category;
mod month;
mod transaction;

pub(crate) use allocation::{Allocation, Slot};
pub(crate) use budget::Budget;
pub(crate) use category::{build_tree, slugify, Category, CategoryKind, CategoryNode, SpendNature};
pub(crate) use month::MonthKey;
pub(crate) use transaction::{Transaction, TxnKind};
