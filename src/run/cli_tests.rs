#![allow(clippy::unwrap_used)]

use std::path::PathBuf;

use super::*;
use crate::allocation::DEFAULT_DEBOUNCE;
use rust_decimal_macros::dec;

fn config(batch_limit: usize) -> Config {
    Config {
        db_path: PathBuf::new(),
        owner: "public".into(),
        debounce: DEFAULT_DEBOUNCE,
        batch_limit,
        min_segment: 5.0,
    }
}

fn cli(db: &mut Database, config: &Config, line: &str) -> Result<()> {
    let mut args = vec!["budgetsplit".to_string()];
    args.extend(line.split_whitespace().map(String::from));
    as_cli(&args, db, config)
}

fn month(s: &str) -> MonthKey {
    MonthKey::parse(s).unwrap()
}

fn alloc(n: u8, w: u8, s: u8) -> Allocation {
    Allocation::from_parts(n, w, s).unwrap()
}

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ── Helpers ───────────────────────────────────────────────────

#[test]
fn test_allocation_bar() {
    assert_eq!(
        allocation_bar(Allocation::DEFAULT, 20),
        "[##########======....]"
    );
    assert_eq!(allocation_bar(alloc(100, 0, 0), 4), "[####]");
    assert_eq!(allocation_bar(alloc(0, 0, 100), 4), "[....]");
}

#[test]
fn test_positionals_skip_flags_and_values() {
    let args = strings(&["apply", "2024-01", "--custom", "60", "30", "10", "2024-06", "--only-missing"]);
    assert_eq!(
        positionals(&args, &[("--custom", 3)]),
        vec!["apply", "2024-01", "2024-06"]
    );
    let args = strings(&["edit", "2024-01", "needs", "-5"]);
    assert_eq!(positionals(&args, &[]), vec!["edit", "2024-01", "needs", "-5"]);
}

#[test]
fn test_parse_amount() {
    assert_eq!(parse_amount("$1,234.50").unwrap(), dec!(1234.50));
    assert!(parse_amount("0").is_err());
    assert!(parse_amount("-3").is_err());
    assert!(parse_amount("abc").is_err());
}

#[test]
fn test_parse_pct() {
    assert_eq!(parse_pct("45%").unwrap(), 45.0);
    assert_eq!(parse_pct(" 12.5 ").unwrap(), 12.5);
    assert!(parse_pct("half").is_err());
}

#[test]
fn test_shellexpand_plain_path() {
    assert_eq!(shellexpand("/tmp/x.db"), "/tmp/x.db");
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn test_alloc_set_normalizes_and_saves() {
    let mut db = Database::open_in_memory().unwrap();
    let config = config(450);
    cli(&mut db, &config, "alloc set 2024-01 33 33 33").unwrap();
    assert_eq!(
        db.load_allocation("public", month("2024-01")).unwrap(),
        Some(alloc(34, 33, 33))
    );
}

#[test]
fn test_alloc_edit_drag_and_reset() {
    let mut db = Database::open_in_memory().unwrap();
    let config = config(450);

    cli(&mut db, &config, "alloc edit 2024-01 needs 80").unwrap();
    assert_eq!(
        db.load_allocation("public", month("2024-01")).unwrap(),
        Some(alloc(80, 12, 8))
    );

    cli(&mut db, &config, "alloc drag 2024-01 40 70").unwrap();
    assert_eq!(
        db.load_allocation("public", month("2024-01")).unwrap(),
        Some(alloc(40, 30, 30))
    );

    cli(&mut db, &config, "alloc drag 2024-01 0 100 --min 10").unwrap();
    assert_eq!(
        db.load_allocation("public", month("2024-01")).unwrap(),
        Some(alloc(10, 80, 10))
    );

    cli(&mut db, &config, "alloc reset 2024-01").unwrap();
    assert_eq!(
        db.load_allocation("public", month("2024-01")).unwrap(),
        Some(Allocation::DEFAULT)
    );
}

#[test]
fn test_alloc_owner_is_respected() {
    let mut db = Database::open_in_memory().unwrap();
    let mut config = config(450);
    config.owner = "alice".into();
    cli(&mut db, &config, "alloc set 2024-01 70 20 10").unwrap();
    assert!(db.load_allocation("public", month("2024-01")).unwrap().is_none());
    assert_eq!(
        db.load_allocation("alice", month("2024-01")).unwrap(),
        Some(alloc(70, 20, 10))
    );
}

#[test]
fn test_alloc_apply_copies_source_in_batches() {
    let mut db = Database::open_in_memory().unwrap();
    let config = config(5);
    cli(&mut db, &config, "alloc set 2024-01 60 30 10").unwrap();
    cli(&mut db, &config, "alloc set 2024-05 10 10 80").unwrap();

    cli(
        &mut db,
        &config,
        "alloc apply 2024-02 2024-12 --source 2024-01 --only-missing",
    )
    .unwrap();

    let rows = db.get_allocations("public").unwrap();
    assert_eq!(rows.len(), 12);
    assert_eq!(
        db.load_allocation("public", month("2024-05")).unwrap(),
        Some(alloc(10, 10, 80))
    );
    assert_eq!(
        db.load_allocation("public", month("2024-12")).unwrap(),
        Some(alloc(60, 30, 10))
    );
}

#[test]
fn test_alloc_apply_custom_overwrites() {
    let mut db = Database::open_in_memory().unwrap();
    let config = config(450);
    cli(&mut db, &config, "alloc set 2024-02 10 10 80").unwrap();
    cli(&mut db, &config, "alloc apply 2024-01 2024-03 --custom 1 1 4").unwrap();
    for m in ["2024-01", "2024-02", "2024-03"] {
        assert_eq!(
            db.load_allocation("public", month(m)).unwrap(),
            Some(alloc(17, 17, 66))
        );
    }
}

#[test]
fn test_alloc_apply_reversed_range_writes_nothing() {
    let mut db = Database::open_in_memory().unwrap();
    let config = config(450);
    cli(&mut db, &config, "alloc apply 2024-06 2024-01 --custom 50 30 20").unwrap();
    assert!(db.get_allocations("public").unwrap().is_empty());
}

#[test]
fn test_alloc_usage_errors() {
    let mut db = Database::open_in_memory().unwrap();
    let config = config(450);
    assert!(cli(&mut db, &config, "alloc set 2024-01 50 50").is_err());
    assert!(cli(&mut db, &config, "alloc edit 2024-01 fun 10").is_err());
    assert!(cli(&mut db, &config, "alloc set 2024-13 50 30 20").is_err());
    assert!(cli(&mut db, &config, "alloc apply 2024-01 2024-02 --custom 1 2").is_err());
    assert!(cli(&mut db, &config, "alloc").is_err());
}

#[test]
fn test_txn_add_list_delete() {
    let mut db = Database::open_in_memory().unwrap();
    let config = config(450);
    cli(
        &mut db,
        &config,
        "txn add expense 12.50 2024-01-05 --category groceries --note milk",
    )
    .unwrap();
    cli(&mut db, &config, "txn add income 3000 2024-01-01").unwrap();
    cli(&mut db, &config, "txn list 2024-01").unwrap();

    let txns = db.get_transactions(Some(month("2024-01"))).unwrap();
    assert_eq!(txns.len(), 2);
    let grocery = txns.iter().find(|t| t.kind == TxnKind::Expense).unwrap();
    assert_eq!(grocery.amount, dec!(12.50));
    assert_eq!(grocery.note, "milk");
    assert!(grocery.category_id.is_some());

    let id = grocery.id.unwrap();
    cli(&mut db, &config, &format!("txn delete {id}")).unwrap();
    assert!(cli(&mut db, &config, &format!("txn delete {id}")).is_err());
    assert_eq!(db.get_transactions(None).unwrap().len(), 1);
}

#[test]
fn test_txn_add_rejects_bad_input() {
    let mut db = Database::open_in_memory().unwrap();
    let config = config(450);
    assert!(cli(&mut db, &config, "txn add gift 10 2024-01-01").is_err());
    assert!(cli(&mut db, &config, "txn add expense 10 2024-02-30").is_err());
    assert!(cli(&mut db, &config, "txn add expense 10 2024-01-01 --category nope").is_err());
    assert!(db.get_transactions(None).unwrap().is_empty());
}

#[test]
fn test_category_add_with_parent_and_nature() {
    let mut db = Database::open_in_memory().unwrap();
    let config = config(450);
    cli(
        &mut db,
        &config,
        "category add expense Pet Food --parent groceries --nature wants",
    )
    .unwrap();
    let cat = db.find_category("pet-food").unwrap().unwrap();
    assert_eq!(cat.name, "Pet Food");
    assert_eq!(cat.nature, Some(SpendNature::Wants));
    assert!(cat.parent_id.is_some());

    assert!(cli(&mut db, &config, "category add income Tips --nature needs").is_err());
    cli(&mut db, &config, "category list").unwrap();
}

#[test]
fn test_budget_set_list_delete() {
    let mut db = Database::open_in_memory().unwrap();
    let config = config(450);
    cli(&mut db, &config, "budget set groceries 2024-01 400").unwrap();
    assert_eq!(db.get_budgets(month("2024-01")).unwrap().len(), 1);
    cli(&mut db, &config, "txn add expense 350 2024-01-10 --category groceries").unwrap();
    cli(&mut db, &config, "budget list 2024-01").unwrap();
    cli(&mut db, &config, "summary 2024-01").unwrap();

    assert!(cli(&mut db, &config, "budget set salary 2024-01 400").is_err());
    cli(&mut db, &config, "budget delete groceries 2024-01").unwrap();
    assert!(db.get_budgets(month("2024-01")).unwrap().is_empty());
}

#[test]
fn test_reports_run_on_empty_data() {
    let mut db = Database::open_in_memory().unwrap();
    let config = config(450);
    cli(&mut db, &config, "summary 2024-01").unwrap();
    cli(&mut db, &config, "trend 2024-01 --months 3").unwrap();
    cli(&mut db, &config, "flow 2024-01 --cumulative").unwrap();
    cli(&mut db, &config, "alloc show 2024-01").unwrap();
    cli(&mut db, &config, "alloc list").unwrap();
    assert!(cli(&mut db, &config, "trend 2024-01 --months 0").is_err());
}

#[test]
fn test_trend_rejects_huge_month_counts() {
    let mut db = Database::open_in_memory().unwrap();
    let config = config(450);
    cli(&mut db, &config, "trend 2024-01 --months 1200").unwrap();
    let err = cli(&mut db, &config, "trend 2024-01 --months 1201").unwrap_err();
    assert!(err.to_string().contains("at most 1200"));
    assert!(cli(&mut db, &config, "trend 2024-01 --months 18446744073709551615").is_err());
    assert!(cli(&mut db, &config, "trend 2024-01 --months 99999999999999999999").is_err());
}

#[test]
fn test_top_categories_command() {
    let mut db = Database::open_in_memory().unwrap();
    let config = config(450);
    cli(&mut db, &config, "top").unwrap();
    cli(&mut db, &config, "txn add expense 80 2024-01-05 --category groceries").unwrap();
    cli(&mut db, &config, "txn add expense 15 2024-02-05").unwrap();
    cli(&mut db, &config, "top --since 2024-02-01 --limit 3").unwrap();
    assert!(cli(&mut db, &config, "top --since 2024-02-30").is_err());
    assert!(cli(&mut db, &config, "top --limit 0").is_err());
    assert!(cli(&mut db, &config, "top --limit many").is_err());
}

#[test]
fn test_unknown_command() {
    let mut db = Database::open_in_memory().unwrap();
    let err = cli(&mut db, &config(450), "frobnicate").unwrap_err();
    assert!(err.to_string().contains("Unknown command"));
    cli(&mut db, &config(450), "help").unwrap();
}
