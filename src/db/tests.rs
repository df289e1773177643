#![allow(clippy::unwrap_used)]

use super::*;
use crate::allocation::{propagate, AllocationSource, PropagationRequest, DEFAULT_BATCH_LIMIT};
use rust_decimal_macros::dec;

fn month(s: &str) -> MonthKey {
    MonthKey::parse(s).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn alloc(n: u8, w: u8, s: u8) -> Allocation {
    Allocation::from_parts(n, w, s).unwrap()
}

// ── Default data ──────────────────────────────────────────────

#[test]
fn test_default_categories_seeded() {
    let db = Database::open_in_memory().unwrap();
    let cats = db.get_categories().unwrap();
    assert!(!cats.is_empty());
    let groceries = cats.iter().find(|c| c.slug == "groceries").unwrap();
    assert_eq!(groceries.kind, CategoryKind::Expense);
    assert_eq!(groceries.nature, Some(SpendNature::Needs));
    let dining = cats.iter().find(|c| c.slug == "dining-out").unwrap();
    assert_eq!(dining.nature, Some(SpendNature::Wants));
    let salary = cats.iter().find(|c| c.slug == "salary").unwrap();
    assert!(salary.nature.is_none());
}

#[test]
fn test_default_categories_not_reseeded() {
    let mut db = Database::open_in_memory().unwrap();
    let count_before = db.get_categories().unwrap().len();
    db.seed_default_categories().unwrap();
    let count_after = db.get_categories().unwrap().len();
    assert_eq!(count_before, count_after);
}

#[test]
fn test_reopen_file_database_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("budgetsplit.db");
    {
        let mut db = Database::open(&path).unwrap();
        db.save_allocation("public", month("2024-01"), alloc(60, 30, 10))
            .unwrap();
    }
    let db = Database::open(&path).unwrap();
    assert_eq!(
        db.load_allocation("public", month("2024-01")).unwrap(),
        Some(alloc(60, 30, 10))
    );
    let version: i32 = db
        .conn
        .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, schema::CURRENT_VERSION);
}

// ── Categories ────────────────────────────────────────────────

#[test]
fn test_category_insert_and_find() {
    let db = Database::open_in_memory().unwrap();
    let cat = Category::new(CategoryKind::Expense, "Pet Care".into(), Some(SpendNature::Wants));
    let id = db.insert_category(&cat).unwrap();

    let fetched = db.get_category_by_id(id).unwrap().unwrap();
    assert_eq!(fetched.name, "Pet Care");
    assert_eq!(fetched.slug, "pet-care");
    assert_eq!(fetched.nature, Some(SpendNature::Wants));

    let by_name = db.find_category("Pet Care").unwrap().unwrap();
    assert_eq!(by_name.id, Some(id));
    assert!(db.find_category("does-not-exist").unwrap().is_none());
    assert!(db.get_category_by_id(99999).unwrap().is_none());
}

#[test]
fn test_category_duplicate_slug_rejected() {
    let db = Database::open_in_memory().unwrap();
    let cat = Category::new(CategoryKind::Expense, "Groceries!".into(), None);
    let err = db.insert_category(&cat).unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

#[test]
fn test_category_same_slug_under_different_parent() {
    let db = Database::open_in_memory().unwrap();
    let housing = db.find_category("housing").unwrap().unwrap();
    let travel = db.find_category("travel").unwrap().unwrap();

    let a = Category::new(CategoryKind::Expense, "Insurance Fees".into(), None).with_parent(housing.id);
    let b = Category::new(CategoryKind::Expense, "Insurance Fees".into(), None).with_parent(travel.id);
    db.insert_category(&a).unwrap();
    db.insert_category(&b).unwrap();

    let err = db.find_category("insurance-fees").unwrap_err();
    assert!(err.to_string().contains("ambiguous"));

    let tree = build_tree(&db.get_categories().unwrap());
    let housing_node = tree.iter().find(|n| n.category.slug == "housing").unwrap();
    assert_eq!(housing_node.children.len(), 1);
}

#[test]
fn test_category_parent_must_exist_and_match_kind() {
    let db = Database::open_in_memory().unwrap();
    let orphan = Category::new(CategoryKind::Expense, "Orphan".into(), None).with_parent(Some(99999));
    assert!(db.insert_category(&orphan).is_err());

    let salary = db.find_category("salary").unwrap().unwrap();
    let mismatched = Category::new(CategoryKind::Expense, "Bonus Spend".into(), None).with_parent(salary.id);
    let err = db.insert_category(&mismatched).unwrap_err();
    assert!(err.to_string().contains("income"));
}

#[test]
fn test_category_empty_slug_rejected() {
    let db = Database::open_in_memory().unwrap();
    let cat = Category::new(CategoryKind::Expense, "!!!".into(), None);
    assert!(db.insert_category(&cat).is_err());
}

// ── Transactions ──────────────────────────────────────────────

fn setup_transactions(db: &Database) -> i64 {
    let groceries = db.find_category("groceries").unwrap().unwrap().id;
    let txns = vec![
        Transaction::new(TxnKind::Income, dec!(3000), date("2024-01-01")).with_note("salary"),
        Transaction::new(TxnKind::Expense, dec!(85.40), date("2024-01-05")).with_category(groceries),
        Transaction::new(TxnKind::Expense, dec!(12.00), date("2024-01-20")),
        Transaction::new(TxnKind::Savings, dec!(500), date("2024-02-01")),
    ];
    let mut last = 0;
    for t in &txns {
        last = db.insert_transaction(t).unwrap();
    }
    last
}

#[test]
fn test_transaction_roundtrip() {
    let db = Database::open_in_memory().unwrap();
    setup_transactions(&db);

    let all = db.get_transactions(None).unwrap();
    assert_eq!(all.len(), 4);
    // Newest first.
    assert_eq!(all[0].date, date("2024-02-01"));
    assert_eq!(all[0].kind, TxnKind::Savings);

    let grocery = all.iter().find(|t| t.amount == dec!(85.40)).unwrap();
    assert!(grocery.category_id.is_some());
    let income = all.iter().find(|t| t.kind == TxnKind::Income).unwrap();
    assert_eq!(income.note, "salary");
}

#[test]
fn test_transactions_filtered_by_month() {
    let db = Database::open_in_memory().unwrap();
    setup_transactions(&db);
    assert_eq!(db.get_transactions(Some(month("2024-01"))).unwrap().len(), 3);
    assert_eq!(db.get_transactions(Some(month("2024-02"))).unwrap().len(), 1);
    assert!(db.get_transactions(Some(month("2024-03"))).unwrap().is_empty());
}

#[test]
fn test_transactions_between() {
    let db = Database::open_in_memory().unwrap();
    setup_transactions(&db);
    let txns = db
        .get_transactions_between(month("2023-12"), month("2024-01"))
        .unwrap();
    assert_eq!(txns.len(), 3);
    assert_eq!(txns[0].date, date("2024-01-01"));
}

#[test]
fn test_transaction_delete() {
    let db = Database::open_in_memory().unwrap();
    let last = setup_transactions(&db);
    assert!(db.delete_transaction(last).unwrap());
    assert!(!db.delete_transaction(last).unwrap());
    assert_eq!(db.get_transactions(None).unwrap().len(), 3);
}

#[test]
fn test_transaction_unknown_category_rejected() {
    let db = Database::open_in_memory().unwrap();
    let txn = Transaction::new(TxnKind::Expense, dec!(1), date("2024-01-01")).with_category(Some(99999));
    assert!(db.insert_transaction(&txn).is_err());
}

// ── Budgets ───────────────────────────────────────────────────

#[test]
fn test_budget_upsert_overwrites() {
    let db = Database::open_in_memory().unwrap();
    let cat_id = db.find_category("groceries").unwrap().unwrap().id.unwrap();

    db.upsert_budget(&Budget::new(cat_id, month("2024-01"), dec!(400)))
        .unwrap();
    db.upsert_budget(&Budget::new(cat_id, month("2024-01"), dec!(450)))
        .unwrap();
    db.upsert_budget(&Budget::new(cat_id, month("2024-02"), dec!(300)))
        .unwrap();

    let jan = db.get_budgets(month("2024-01")).unwrap();
    assert_eq!(jan.len(), 1);
    assert_eq!(jan[0].limit_amount, dec!(450));
    assert_eq!(jan[0].month, month("2024-01"));

    assert!(db.delete_budget(cat_id, month("2024-01")).unwrap());
    assert!(db.get_budgets(month("2024-01")).unwrap().is_empty());
    assert_eq!(db.get_budgets(month("2024-02")).unwrap().len(), 1);
}

// ── Allocations ───────────────────────────────────────────────

#[test]
fn test_allocation_missing_is_none() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.load_allocation("public", month("2024-01")).unwrap().is_none());
    assert!(!db.has_allocation("public", month("2024-01")).unwrap());
}

#[test]
fn test_allocation_save_merges() {
    let mut db = Database::open_in_memory().unwrap();
    db.save_allocation("public", month("2024-01"), alloc(60, 30, 10))
        .unwrap();
    db.save_allocation("public", month("2024-01"), alloc(40, 40, 20))
        .unwrap();
    assert_eq!(
        db.load_allocation("public", month("2024-01")).unwrap(),
        Some(alloc(40, 40, 20))
    );
    assert!(db.load_allocation("alice", month("2024-01")).unwrap().is_none());
}

#[test]
fn test_allocation_invalid_row_is_normalized_on_read() {
    let db = Database::open_in_memory().unwrap();
    db.conn
        .execute(
            "INSERT INTO allocations (owner, month, needs_pct, wants_pct, savings_pct, updated_at)
             VALUES ('public', '2024-01', 33, 33, 33, '')",
            [],
        )
        .unwrap();
    assert_eq!(
        db.load_allocation("public", month("2024-01")).unwrap(),
        Some(alloc(34, 33, 33))
    );
}

#[test]
fn test_get_allocations_sorted() {
    let mut db = Database::open_in_memory().unwrap();
    db.commit_allocations(
        "public",
        &[
            (month("2024-03"), alloc(50, 30, 20)),
            (month("2023-12"), alloc(70, 20, 10)),
        ],
    )
    .unwrap();
    let rows = db.get_allocations("public").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].0, month("2023-12"));
    assert_eq!(rows[0].1, alloc(70, 20, 10));
}

#[test]
fn test_propagate_against_database() {
    let mut db = Database::open_in_memory().unwrap();
    db.save_allocation("public", month("2024-01"), alloc(55, 25, 20))
        .unwrap();
    db.save_allocation("public", month("2024-03"), alloc(10, 10, 80))
        .unwrap();

    let req = PropagationRequest {
        owner: "public".into(),
        source: AllocationSource::CopyFrom(month("2024-01")),
        start: month("2024-02"),
        end: month("2024-06"),
        only_if_absent: true,
    };
    let report = propagate(&mut db, &req, DEFAULT_BATCH_LIMIT).unwrap();
    assert_eq!(report.written, 4);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.batches, 1);

    let rows = db.get_allocations("public").unwrap();
    assert_eq!(rows.len(), 6);
    assert_eq!(
        db.load_allocation("public", month("2024-03")).unwrap(),
        Some(alloc(10, 10, 80))
    );
    assert_eq!(
        db.load_allocation("public", month("2024-06")).unwrap(),
        Some(alloc(55, 25, 20))
    );
}
