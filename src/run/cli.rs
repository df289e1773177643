use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Instant;

use crate::allocation::{
    normalize, propagate, AllocationCommand, AllocationSession, AllocationSource, AllocationStore,
    PropagationError, PropagationReport, PropagationRequest,
};
use crate::analysis::{
    allocation_report, budget_statuses, daily_flow, monthly_totals, monthly_trend,
    moving_average, nature_trend, percent_of, top_categories, BudgetLevel,
};
use crate::config::Config;
use crate::db::Database;
use crate::models::{
    build_tree, Allocation, Budget, Category, CategoryKind, CategoryNode, MonthKey, Slot,
    SpendNature, Transaction, TxnKind,
};

pub(super) const BAR_WIDTH: usize = 40;
const DEFAULT_TREND_MONTHS: usize = 6;
const MAX_TREND_MONTHS: usize = 1200;
const TREND_AVERAGE_WINDOW: usize = 3;
const DEFAULT_TOP_LIMIT: usize = 5;

pub(crate) fn as_cli(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    let Some(command) = args.get(1) else {
        print_usage();
        return Ok(());
    };
    let rest = &args[2..];
    match command.as_str() {
        "alloc" | "a" => cli_alloc(rest, db, config),
        "txn" | "t" => cli_txn(rest, db),
        "category" | "cat" => cli_category(rest, db),
        "budget" | "b" => cli_budget(rest, db),
        "summary" | "s" => cli_summary(rest, db, config),
        "trend" => cli_trend(rest, db),
        "flow" => cli_flow(rest, db),
        "top" => cli_top(rest, db),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("budgetsplit {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            bail!("Unknown command: {other}");
        }
    }
}

pub(crate) fn print_usage() {
    println!("BudgetSplit: local-first 50/30/20 household budget tracker");
    println!();
    println!("Usage: budgetsplit [--owner <id>] <command>");
    println!();
    println!("Allocation:");
    println!("  alloc show [YYYY-MM]                     Show the split and how spending tracks it");
    println!("  alloc list                               List every stored month");
    println!("  alloc set <YYYY-MM> <needs> <wants> <savings>");
    println!("                                           Set all three (normalized to 100)");
    println!("  alloc edit <YYYY-MM> <slot> <value>      Change one slot, rebalance the others");
    println!("  alloc drag <YYYY-MM> <low> <high>        Place both dividers of the bar");
    println!("    --min <N>                              Minimum segment width");
    println!("  alloc reset <YYYY-MM>                    Back to 50/30/20");
    println!("  alloc apply <FROM> <TO>                  Copy an allocation across a month range");
    println!("    --source <YYYY-MM>                     Month to copy (default: current)");
    println!("    --custom <N> <W> <S>                   Use these percentages instead");
    println!("    --only-missing                         Skip months that already have one");
    println!("  alloc tune <YYYY-MM>                     Interactive line editor");
    println!();
    println!("Records:");
    println!("  txn add <kind> <amount> <YYYY-MM-DD>     kind: income, expense, debt, savings");
    println!("    --category <slug>  --note <text>");
    println!("  txn list [YYYY-MM]                       List transactions, newest first");
    println!("  txn delete <id>                          Delete a transaction");
    println!("  category add <kind> <name>               kind: income, expense, savings");
    println!("    --parent <slug>  --nature needs|wants");
    println!("  category list                            Show the category tree");
    println!("  budget set <slug> <YYYY-MM> <limit>      Set a monthly category limit");
    println!("  budget delete <slug> <YYYY-MM>           Remove a limit");
    println!("  budget list [YYYY-MM]                    Budget usage for a month");
    println!();
    println!("Reports:");
    println!("  summary [YYYY-MM]                        Monthly totals, allocation and alerts");
    println!("  trend [YYYY-MM] [--months N]             Month over month totals");
    println!("  flow [YYYY-MM] [--cumulative]            Daily income and expenses");
    println!("  top [--since YYYY-MM-DD] [--limit N]     Largest expense categories");
    println!();
    println!("  --help, -h                               Show this help");
    println!("  --version, -V                            Show version");
}

// ── Argument helpers ──────────────────────────────────────────

/// Arguments that are neither flags nor flag values. Each entry of
/// `value_flags` names a flag and how many values follow it.
pub(super) fn positionals<'a>(args: &'a [String], value_flags: &[(&str, usize)]) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut skip = 0;
    for arg in args {
        if skip > 0 {
            skip -= 1;
            continue;
        }
        if let Some((_, n)) = value_flags.iter().find(|(name, _)| name == arg) {
            skip = *n;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        out.push(arg.as_str());
    }
    out
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

fn month_or_current(arg: Option<&&str>) -> Result<MonthKey> {
    match arg {
        Some(s) => MonthKey::parse(s),
        None => Ok(MonthKey::current()),
    }
}

pub(super) fn parse_pct(s: &str) -> Result<f64> {
    s.trim()
        .trim_end_matches('%')
        .parse::<f64>()
        .with_context(|| format!("Not a number: '{s}'"))
}

pub(super) fn parse_amount(s: &str) -> Result<Decimal> {
    let cleaned: String = s.trim().chars().filter(|c| *c != '$' && *c != ',').collect();
    let amount =
        Decimal::from_str(&cleaned).with_context(|| format!("Not a valid amount: '{s}'"))?;
    if amount <= Decimal::ZERO {
        bail!("Amount must be positive: '{s}'");
    }
    Ok(amount)
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD"))
}

fn require_category(db: &Database, slug: &str) -> Result<Category> {
    db.find_category(slug)?
        .ok_or_else(|| anyhow::anyhow!("Category '{slug}' not found (see `budgetsplit category list`)"))
}

/// Three-segment text bar: `#` needs, `=` wants, `.` savings.
pub(super) fn allocation_bar(allocation: Allocation, width: usize) -> String {
    let (low, high) = allocation.boundaries();
    let cut = |pct: u8| (usize::from(pct) * width + 50) / 100;
    let (a, b) = (cut(low), cut(high));
    format!(
        "[{}{}{}]",
        "#".repeat(a),
        "=".repeat(b - a),
        ".".repeat(width - b)
    )
}

// ── Allocation ────────────────────────────────────────────────

fn cli_alloc(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    let pos = positionals(args, &[("--min", 1), ("--source", 1), ("--custom", 3)]);
    let Some((action, rest)) = pos.split_first() else {
        bail!("Usage: budgetsplit alloc <show|list|set|edit|drag|reset|apply|tune> ...");
    };

    match *action {
        "show" => alloc_show(rest.first(), db, config),
        "list" | "ls" => alloc_list(db, config),
        "set" => {
            let [month, needs, wants, savings] = rest else {
                bail!("Usage: budgetsplit alloc set <YYYY-MM> <needs> <wants> <savings>");
            };
            let command = AllocationCommand::Set {
                needs: parse_pct(needs)?,
                wants: parse_pct(wants)?,
                savings: parse_pct(savings)?,
            };
            alloc_update(db, config, MonthKey::parse(month)?, command)
        }
        "edit" => {
            let [month, slot, value] = rest else {
                bail!("Usage: budgetsplit alloc edit <YYYY-MM> <needs|wants|savings> <value>");
            };
            let slot = Slot::parse(slot)
                .ok_or_else(|| anyhow::anyhow!("Unknown slot '{slot}', expected needs, wants or savings"))?;
            let command = AllocationCommand::Edit {
                slot,
                value: parse_pct(value)?,
            };
            alloc_update(db, config, MonthKey::parse(month)?, command)
        }
        "drag" => {
            let [month, low, high] = rest else {
                bail!("Usage: budgetsplit alloc drag <YYYY-MM> <low> <high> [--min N]");
            };
            let min_segment = match flag_value(args, "--min") {
                Some(m) => parse_pct(m)?,
                None => config.min_segment,
            };
            let command = AllocationCommand::Boundaries {
                low: parse_pct(low)?,
                high: parse_pct(high)?,
                min_segment,
            };
            alloc_update(db, config, MonthKey::parse(month)?, command)
        }
        "reset" => {
            let [month] = rest else {
                bail!("Usage: budgetsplit alloc reset <YYYY-MM>");
            };
            alloc_update(db, config, MonthKey::parse(month)?, AllocationCommand::Reset)
        }
        "apply" => alloc_apply(args, rest, db, config),
        "tune" => {
            let month = month_or_current(rest.first())?;
            let mut session = AllocationSession::open(&*db, &config.owner, month, config.debounce)?;
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            super::tune::run_tune(
                db,
                &mut session,
                config.min_segment,
                stdin.lock(),
                &mut stdout,
                Instant::now,
            )?;
            if let Some(err) = session.last_error() {
                bail!("{err}");
            }
            Ok(())
        }
        other => bail!("Unknown alloc action: {other}"),
    }
}

fn alloc_update(
    db: &mut Database,
    config: &Config,
    month: MonthKey,
    command: AllocationCommand,
) -> Result<()> {
    let mut session = AllocationSession::open(&*db, &config.owner, month, config.debounce)?;
    let value = session.apply(command, Instant::now());
    session.flush(db);
    if let Some(err) = session.last_error() {
        bail!("{err}");
    }
    println!("{month}  {}  {value}", allocation_bar(value, BAR_WIDTH));
    Ok(())
}

fn alloc_show(month: Option<&&str>, db: &Database, config: &Config) -> Result<()> {
    let month = month_or_current(month)?;
    let stored = db.load_allocation(&config.owner, month)?;
    let allocation = stored.unwrap_or_default();
    let txns = db.get_transactions(Some(month))?;
    let categories = db.get_categories()?;
    let report = allocation_report(&txns, &categories, allocation, month);

    println!("BudgetSplit: {month} ({})", config.owner);
    println!("{}", "─".repeat(BAR_WIDTH + 2));
    println!("{}", allocation_bar(allocation, BAR_WIDTH));
    println!(
        "{allocation}{}",
        if stored.is_none() { "  (default)" } else { "" }
    );
    println!();
    println!("  Income: ${:.2}", report.income);
    for row in &report.rows {
        println!(
            "  {:<8} {:>3}%  target ${:>10.2}  actual ${:>10.2}  used {:>3}%{}",
            row.slot.as_str(),
            row.pct,
            row.target,
            row.actual,
            row.used_pct,
            if row.is_over() { "  OVER" } else { "" }
        );
    }
    if report.unclassified > Decimal::ZERO {
        println!("  Unclassified spending: ${:.2}", report.unclassified);
    }
    Ok(())
}

fn alloc_list(db: &Database, config: &Config) -> Result<()> {
    let rows = db.get_allocations(&config.owner)?;
    if rows.is_empty() {
        println!("No stored allocations for '{}'", config.owner);
        return Ok(());
    }
    for (month, allocation) in &rows {
        println!("{month}  {}  {allocation}", allocation_bar(*allocation, BAR_WIDTH));
    }
    Ok(())
}

fn alloc_apply(args: &[String], rest: &[&str], db: &mut Database, config: &Config) -> Result<()> {
    let [from, to] = rest else {
        bail!("Usage: budgetsplit alloc apply <FROM> <TO> [--source YYYY-MM | --custom N W S] [--only-missing]");
    };
    let start = MonthKey::parse(from)?;
    let end = MonthKey::parse(to)?;

    let source = if let Some(pos) = args.iter().position(|a| a == "--custom") {
        let values = args.get(pos + 1..pos + 4).ok_or_else(|| {
            anyhow::anyhow!("--custom needs three values: <needs> <wants> <savings>")
        })?;
        AllocationSource::Custom(normalize(
            parse_pct(&values[0])?,
            parse_pct(&values[1])?,
            parse_pct(&values[2])?,
        ))
    } else {
        match flag_value(args, "--source") {
            Some(m) => AllocationSource::CopyFrom(MonthKey::parse(m)?),
            None => AllocationSource::CopyFrom(MonthKey::current()),
        }
    };

    let req = PropagationRequest {
        owner: config.owner.clone(),
        source,
        start,
        end,
        only_if_absent: has_flag(args, "--only-missing"),
    };
    match propagate(db, &req, config.batch_limit) {
        Ok(report) => {
            print_propagation(&report, start, end);
            Ok(())
        }
        Err(e) => Err(propagation_failed(e, start, end)),
    }
}

fn print_propagation(report: &PropagationReport, start: MonthKey, end: MonthKey) {
    if report.months_considered == 0 {
        println!("Nothing to do: {start} is after {end}");
        return;
    }
    println!(
        "Applied {} to {} month(s) from {start} to {end} in {} batch(es)",
        report.allocation, report.written, report.batches
    );
    if report.skipped > 0 {
        println!("Skipped {} month(s) that already had an allocation", report.skipped);
    }
}

/// Committed batches stay in place; tell the user how far it got.
fn propagation_failed(e: PropagationError, start: MonthKey, end: MonthKey) -> anyhow::Error {
    let written = e.written();
    tracing::warn!(%start, %end, written, error = %e, "allocation propagation stopped");
    anyhow::Error::new(e).context(format!(
        "Applying allocations {start}..{end} stopped; {written} month(s) were saved"
    ))
}

// ── Transactions ──────────────────────────────────────────────

fn cli_txn(args: &[String], db: &mut Database) -> Result<()> {
    let pos = positionals(args, &[("--category", 1), ("--note", 1)]);
    let Some((action, rest)) = pos.split_first() else {
        bail!("Usage: budgetsplit txn <add|list|delete> ...");
    };

    match *action {
        "add" => {
            let [kind, amount, date] = rest else {
                bail!("Usage: budgetsplit txn add <kind> <amount> <YYYY-MM-DD> [--category <slug>] [--note <text>]");
            };
            let kind = TxnKind::parse(kind).ok_or_else(|| {
                anyhow::anyhow!("Unknown kind '{kind}', expected income, expense, debt or savings")
            })?;
            let category = flag_value(args, "--category")
                .map(|slug| require_category(db, slug))
                .transpose()?;
            let mut txn = Transaction::new(kind, parse_amount(amount)?, parse_date(date)?)
                .with_category(category.as_ref().and_then(|c| c.id));
            if let Some(note) = flag_value(args, "--note") {
                txn = txn.with_note(note);
            }
            let id = db.insert_transaction(&txn)?;
            tracing::info!(id, kind = %txn.kind, amount = %txn.amount, "transaction added");
            println!("Added {} #{id}: ${:.2} on {}", txn.kind, txn.amount, txn.date);

            if let (TxnKind::Expense, Some(category_id)) = (txn.kind, txn.category_id) {
                print_budget_alerts(db, txn.month(), Some(category_id))?;
            }
            Ok(())
        }
        "list" | "ls" => {
            let month = rest.first().map(|m| MonthKey::parse(m)).transpose()?;
            let txns = db.get_transactions(month)?;
            if txns.is_empty() {
                println!("No transactions");
                return Ok(());
            }
            let categories = db.get_categories()?;
            println!(
                "{:<6} {:<10} {:<8} {:>12}  {:<20} Note",
                "ID", "Date", "Kind", "Amount", "Category"
            );
            println!("{}", "─".repeat(72));
            for txn in &txns {
                let category = txn
                    .category_id
                    .and_then(|id| Category::find_by_id(&categories, id))
                    .map(|c| c.name.as_str())
                    .unwrap_or("-");
                println!(
                    "{:<6} {:<10} {:<8} {:>12.2}  {:<20} {}",
                    txn.id.unwrap_or(0),
                    txn.date.format("%Y-%m-%d").to_string(),
                    txn.kind.as_str(),
                    txn.amount,
                    category,
                    txn.note
                );
            }
            Ok(())
        }
        "delete" | "rm" => {
            let [id] = rest else {
                bail!("Usage: budgetsplit txn delete <id>");
            };
            let id: i64 = id
                .trim_start_matches('#')
                .parse()
                .with_context(|| format!("Invalid transaction id '{id}'"))?;
            if !db.delete_transaction(id)? {
                bail!("Transaction #{id} not found");
            }
            println!("Deleted transaction #{id}");
            Ok(())
        }
        other => bail!("Unknown txn action: {other}"),
    }
}

// ── Categories ────────────────────────────────────────────────

fn cli_category(args: &[String], db: &mut Database) -> Result<()> {
    let pos = positionals(args, &[("--parent", 1), ("--nature", 1)]);
    let Some((action, rest)) = pos.split_first() else {
        bail!("Usage: budgetsplit category <add|list> ...");
    };

    match *action {
        "add" => {
            let Some((kind, name_parts)) = rest.split_first() else {
                bail!("Usage: budgetsplit category add <kind> <name> [--parent <slug>] [--nature needs|wants]");
            };
            let name = name_parts.join(" ");
            if name.trim().is_empty() {
                bail!("Category name is required");
            }
            let kind = CategoryKind::parse(kind).ok_or_else(|| {
                anyhow::anyhow!("Unknown kind '{kind}', expected income, expense or savings")
            })?;
            let nature = flag_value(args, "--nature")
                .map(|n| {
                    SpendNature::parse(n)
                        .ok_or_else(|| anyhow::anyhow!("Unknown nature '{n}', expected needs or wants"))
                })
                .transpose()?;
            if nature.is_some() && kind != CategoryKind::Expense {
                bail!("Only expense categories carry a needs/wants nature");
            }
            let parent = flag_value(args, "--parent")
                .map(|slug| require_category(db, slug))
                .transpose()?;

            let category = Category::new(kind, name.trim().to_string(), nature)
                .with_parent(parent.and_then(|p| p.id));
            let id = db.insert_category(&category)?;
            println!("Added category #{id}: {} ({})", category.name, category.slug);
            Ok(())
        }
        "list" | "ls" => {
            let categories = db.get_categories()?;
            if categories.is_empty() {
                println!("No categories");
                return Ok(());
            }
            print_tree(&build_tree(&categories), 0);
            Ok(())
        }
        other => bail!("Unknown category action: {other}"),
    }
}

fn print_tree(nodes: &[CategoryNode], depth: usize) {
    for node in nodes {
        let cat = &node.category;
        let nature = cat.nature.map(|n| format!(" [{n}]")).unwrap_or_default();
        println!(
            "{}{:<width$} {:<8} {}{nature}",
            "  ".repeat(depth),
            cat.name,
            cat.kind.as_str(),
            cat.slug,
            width = 24usize.saturating_sub(depth * 2),
        );
        print_tree(&node.children, depth + 1);
    }
}

// ── Budgets ───────────────────────────────────────────────────

fn cli_budget(args: &[String], db: &mut Database) -> Result<()> {
    let pos = positionals(args, &[]);
    let Some((action, rest)) = pos.split_first() else {
        bail!("Usage: budgetsplit budget <set|delete|list> ...");
    };

    match *action {
        "set" => {
            let [slug, month, limit] = rest else {
                bail!("Usage: budgetsplit budget set <category-slug> <YYYY-MM> <limit>");
            };
            let category = require_category(db, slug)?;
            if category.kind != CategoryKind::Expense {
                bail!("Budgets can only be set on expense categories");
            }
            let category_id = category
                .id
                .ok_or_else(|| anyhow::anyhow!("Category has no ID"))?;
            let month = MonthKey::parse(month)?;
            let limit = parse_amount(limit)?;
            db.upsert_budget(&Budget::new(category_id, month, limit))?;
            println!("Budget for {} in {month}: ${limit:.2}", category.name);
            Ok(())
        }
        "delete" | "rm" => {
            let [slug, month] = rest else {
                bail!("Usage: budgetsplit budget delete <category-slug> <YYYY-MM>");
            };
            let category = require_category(db, slug)?;
            let category_id = category
                .id
                .ok_or_else(|| anyhow::anyhow!("Category has no ID"))?;
            let month = MonthKey::parse(month)?;
            if !db.delete_budget(category_id, month)? {
                bail!("No budget for {} in {month}", category.name);
            }
            println!("Removed budget for {} in {month}", category.name);
            Ok(())
        }
        "list" | "ls" => {
            let month = month_or_current(rest.first())?;
            let budgets = db.get_budgets(month)?;
            let txns = db.get_transactions(Some(month))?;
            let categories = db.get_categories()?;
            let statuses = budget_statuses(&budgets, &txns, &categories, month);
            if statuses.is_empty() {
                println!("No budgets for {month}");
                return Ok(());
            }
            println!(
                "{:<20} {:>10} {:>10} {:>10} {:>5}  Status",
                "Category", "Spent", "Limit", "Left", "Used"
            );
            println!("{}", "─".repeat(68));
            for s in &statuses {
                println!(
                    "{:<20} {:>10.2} {:>10.2} {:>10.2} {:>4}%  {}",
                    s.category_name,
                    s.spent,
                    s.limit,
                    s.remaining(),
                    s.pct,
                    s.level.as_str()
                );
            }
            Ok(())
        }
        other => bail!("Unknown budget action: {other}"),
    }
}

fn print_budget_alerts(db: &Database, month: MonthKey, only: Option<i64>) -> Result<()> {
    let budgets = db.get_budgets(month)?;
    if budgets.is_empty() {
        return Ok(());
    }
    let txns = db.get_transactions(Some(month))?;
    let categories = db.get_categories()?;
    for status in budget_statuses(&budgets, &txns, &categories, month) {
        if only.is_some_and(|id| id != status.category_id) {
            continue;
        }
        if let Some(alert) = status.alert() {
            println!("  ! {alert}");
        }
    }
    Ok(())
}

// ── Reports ───────────────────────────────────────────────────

fn cli_summary(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    let pos = positionals(args, &[]);
    let month = month_or_current(pos.first())?;
    let txns = db.get_transactions(Some(month))?;
    let categories = db.get_categories()?;
    let totals = monthly_totals(&txns, month);
    let allocation = db
        .load_allocation(&config.owner, month)?
        .unwrap_or_default();
    let report = allocation_report(&txns, &categories, allocation, month);

    println!("BudgetSplit: {month}");
    println!("{}", "─".repeat(40));
    println!("  Income:     ${:.2}", totals.income);
    println!("  Expenses:   ${:.2}", totals.expenses);
    println!("  Debt:       ${:.2}", totals.debt);
    println!("  Savings:    ${:.2}", totals.savings);
    println!("  Balance:    ${:.2}", totals.balance());
    println!("  Txns:       {}", txns.len());
    println!();
    println!("Allocation {allocation}:");
    for row in &report.rows {
        println!(
            "  {:<8} ${:>10.2} of ${:>10.2}  {:>3}%",
            row.slot.as_str(),
            row.actual,
            row.target,
            row.used_pct
        );
    }

    let budgets = db.get_budgets(month)?;
    let flagged: Vec<_> = budget_statuses(&budgets, &txns, &categories, month)
        .into_iter()
        .filter(|s| s.level != BudgetLevel::Ok)
        .collect();
    if !flagged.is_empty() {
        println!();
        println!("Budget alerts:");
        for status in &flagged {
            if let Some(alert) = status.alert() {
                println!("  ! {alert}");
            }
        }
    }
    Ok(())
}

fn cli_trend(args: &[String], db: &mut Database) -> Result<()> {
    let pos = positionals(args, &[("--months", 1)]);
    let end = month_or_current(pos.first())?;
    let months = match flag_value(args, "--months") {
        Some(n) => n
            .parse::<usize>()
            .with_context(|| format!("Invalid month count '{n}'"))?,
        None => DEFAULT_TREND_MONTHS,
    };
    if months == 0 {
        bail!("--months must be at least 1");
    }
    if months > MAX_TREND_MONTHS {
        bail!("--months must be at most {MAX_TREND_MONTHS}");
    }

    let keys = MonthKey::last_n(end, months);
    let start = keys.first().copied().unwrap_or(end);
    let txns = db.get_transactions_between(start, end)?;
    let categories = db.get_categories()?;
    let totals = monthly_trend(&txns, end, months);
    let natures = nature_trend(&txns, &categories, end, months);
    let expenses: Vec<Decimal> = totals.iter().map(|(_, t)| t.expenses).collect();
    let averages = moving_average(&expenses, TREND_AVERAGE_WINDOW);

    println!(
        "{:<8} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Month", "Income", "Expenses", "Avg(3)", "Needs", "Wants", "Savings", "Balance"
    );
    println!("{}", "─".repeat(86));
    for (((month, t), (_, n)), avg) in totals.iter().zip(&natures).zip(&averages) {
        let avg = avg.map(|a| format!("{a:.2}")).unwrap_or_else(|| "-".into());
        println!(
            "{:<8} {:>10.2} {:>10.2} {:>10} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
            month.to_string(),
            t.income,
            t.expenses,
            avg,
            n.needs,
            n.wants,
            n.savings,
            t.balance()
        );
    }
    Ok(())
}

fn cli_flow(args: &[String], db: &mut Database) -> Result<()> {
    let pos = positionals(args, &[]);
    let month = month_or_current(pos.first())?;
    let cumulative = has_flag(args, "--cumulative");
    let txns = db.get_transactions(Some(month))?;
    let days = daily_flow(&txns, month, cumulative);

    println!("{:<10} {:>10} {:>10} {:>10}", "Date", "Income", "Expenses", "Balance");
    println!("{}", "─".repeat(43));
    for day in &days {
        if !cumulative && day.income.is_zero() && day.expenses.is_zero() {
            continue;
        }
        println!(
            "{:<10} {:>10.2} {:>10.2} {:>10.2}",
            day.date.format("%Y-%m-%d").to_string(),
            day.income,
            day.expenses,
            day.balance
        );
    }
    Ok(())
}

fn cli_top(args: &[String], db: &mut Database) -> Result<()> {
    let since = flag_value(args, "--since").map(parse_date).transpose()?;
    let limit = match flag_value(args, "--limit") {
        Some(n) => n
            .parse::<usize>()
            .with_context(|| format!("Invalid limit '{n}'"))?,
        None => DEFAULT_TOP_LIMIT,
    };
    if limit == 0 {
        bail!("--limit must be at least 1");
    }

    let txns = db.get_transactions(None)?;
    let categories = db.get_categories()?;
    let top = top_categories(&txns, &categories, since, limit);
    if top.is_empty() {
        println!("No expenses found.");
        return Ok(());
    }

    let largest = top[0].total;
    println!("{:<24} {:>10}", "Category", "Spent");
    println!("{}", "─".repeat(24 + 1 + 10 + 1 + BAR_WIDTH));
    for row in &top {
        let width = (percent_of(row.total, largest) as usize * BAR_WIDTH) / 100;
        println!("{:<24} {:>10.2} {}", row.label, row.total, "#".repeat(width));
    }
    Ok(())
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
