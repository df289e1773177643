pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    kind      TEXT NOT NULL,
    name      TEXT NOT NULL,
    slug      TEXT NOT NULL,
    parent_id INTEGER REFERENCES categories(id),
    nature    TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_unique
    ON categories(kind, COALESCE(parent_id, 0), slug);

CREATE TABLE IF NOT EXISTS transactions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    kind        TEXT NOT NULL,
    amount      TEXT NOT NULL,
    date        TEXT NOT NULL,
    category_id INTEGER REFERENCES categories(id),
    note        TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category_id);

CREATE TABLE IF NOT EXISTS budgets (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    category_id   INTEGER NOT NULL REFERENCES categories(id),
    month         TEXT NOT NULL,
    limit_amount  TEXT NOT NULL,
    UNIQUE(category_id, month)
);

CREATE TABLE IF NOT EXISTS allocations (
    owner       TEXT NOT NULL,
    month       TEXT NOT NULL,
    needs_pct   INTEGER NOT NULL,
    wants_pct   INTEGER NOT NULL,
    savings_pct INTEGER NOT NULL,
    updated_at  TEXT NOT NULL,
    PRIMARY KEY (owner, month)
);
"#;

pub(crate) const CURRENT_VERSION: i32 = 1;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[];
