mod budgets;
mod targets;
mod top;
mod trend;

pub(crate) use budgets::{budget_statuses, BudgetLevel};
pub(crate) use targets::{allocation_report, percent_of};
pub(crate) use top::top_categories;
pub(crate) use trend::{daily_flow, monthly_totals, monthly_trend, moving_average, nature_trend};
