mod schema;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::allocation::{normalize, AllocationStore};
use crate::models::*;

pub(crate) struct Database {
    conn: Connection,
}

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

fn parse_date(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| conversion_error(idx, format!("bad date '{s}': {e}")))
}

fn parse_month(idx: usize, s: &str) -> rusqlite::Result<MonthKey> {
    MonthKey::parse(s).map_err(|e| conversion_error(idx, e.to_string()))
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    let kind_str: String = row.get(1)?;
    let kind = CategoryKind::parse(&kind_str)
        .ok_or_else(|| conversion_error(1, format!("unknown category kind '{kind_str}'")))?;
    let nature: Option<String> = row.get(5)?;
    Ok(Category {
        id: Some(row.get(0)?),
        kind,
        name: row.get(2)?,
        slug: row.get(3)?,
        parent_id: row.get(4)?,
        nature: nature.as_deref().and_then(SpendNature::parse),
    })
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let kind_str: String = row.get(1)?;
    let kind = TxnKind::parse(&kind_str)
        .ok_or_else(|| conversion_error(1, format!("unknown transaction kind '{kind_str}'")))?;
    let amount_str: String = row.get(2)?;
    let date_str: String = row.get(3)?;
    Ok(Transaction {
        id: Some(row.get(0)?),
        kind,
        amount: Decimal::from_str(&amount_str).unwrap_or_default(),
        date: parse_date(3, &date_str)?,
        category_id: row.get(4)?,
        note: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Stored rows may predate validation; run them through the normalizer.
fn allocation_from_row(row: &Row<'_>, first: usize) -> rusqlite::Result<Allocation> {
    let needs: i64 = row.get(first)?;
    let wants: i64 = row.get(first + 1)?;
    let savings: i64 = row.get(first + 2)?;
    Ok(normalize(needs as f64, wants as f64, savings as f64))
}

const CATEGORY_COLUMNS: &str = "id, kind, name, slug, parent_id, nature";
const TRANSACTION_COLUMNS: &str = "id, kind, amount, date, category_id, note, created_at";

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        db.seed_default_categories()?;
        tracing::debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        db.seed_default_categories()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                tracing::info!(from_version, "applying schema migration");
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    fn seed_default_categories(&mut self) -> Result<()> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        let defaults: &[(CategoryKind, &str, Option<SpendNature>)] = &[
            (CategoryKind::Income, "Salary", None),
            (CategoryKind::Income, "Freelance", None),
            (CategoryKind::Income, "Other Income", None),
            (CategoryKind::Expense, "Housing", Some(SpendNature::Needs)),
            (CategoryKind::Expense, "Utilities", Some(SpendNature::Needs)),
            (CategoryKind::Expense, "Groceries", Some(SpendNature::Needs)),
            (CategoryKind::Expense, "Transportation", Some(SpendNature::Needs)),
            (CategoryKind::Expense, "Insurance", Some(SpendNature::Needs)),
            (CategoryKind::Expense, "Health", Some(SpendNature::Needs)),
            (CategoryKind::Expense, "Education", Some(SpendNature::Needs)),
            (CategoryKind::Expense, "Dining Out", Some(SpendNature::Wants)),
            (CategoryKind::Expense, "Entertainment", Some(SpendNature::Wants)),
            (CategoryKind::Expense, "Shopping", Some(SpendNature::Wants)),
            (CategoryKind::Expense, "Subscriptions", Some(SpendNature::Wants)),
            (CategoryKind::Expense, "Travel", Some(SpendNature::Wants)),
            (CategoryKind::Savings, "Emergency Fund", None),
            (CategoryKind::Savings, "Investments", None),
            (CategoryKind::Savings, "Retirement", None),
        ];

        let tx = self.conn.transaction()?;
        for (kind, name, nature) in defaults {
            tx.execute(
                "INSERT OR IGNORE INTO categories (kind, name, slug, parent_id, nature)
                 VALUES (?1, ?2, ?3, NULL, ?4)",
                params![kind.as_str(), name, slugify(name), nature.map(|n| n.as_str())],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ── Categories ────────────────────────────────────────────

    pub(crate) fn get_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY kind, name"
        ))?;
        let rows = stmt.query_map([], category_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_category_by_id(&self, id: i64) -> Result<Option<Category>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"),
                params![id],
                category_from_row,
            )
            .optional()?)
    }

    /// Look a category up by slug (or display name). Errors when the slug is
    /// ambiguous across kinds or parents.
    pub(crate) fn find_category(&self, slug_or_name: &str) -> Result<Option<Category>> {
        let slug = slugify(slug_or_name);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = ?1 ORDER BY id"
        ))?;
        let mut found = stmt
            .query_map(params![slug], category_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        match found.len() {
            0 => Ok(None),
            1 => Ok(found.pop()),
            n => bail!("Category '{slug_or_name}' is ambiguous ({n} matches)"),
        }
    }

    pub(crate) fn insert_category(&self, cat: &Category) -> Result<i64> {
        if cat.slug.is_empty() {
            bail!("Category name '{}' has no usable characters", cat.name);
        }
        if let Some(parent_id) = cat.parent_id {
            let parent = self
                .get_category_by_id(parent_id)?
                .ok_or_else(|| anyhow::anyhow!("Parent category #{parent_id} not found"))?;
            if parent.kind != cat.kind {
                bail!(
                    "Parent '{}' is a {} category, not {}",
                    parent.name,
                    parent.kind,
                    cat.kind
                );
            }
        }
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM categories
             WHERE kind = ?1 AND COALESCE(parent_id, 0) = COALESCE(?2, 0) AND slug = ?3)",
            params![cat.kind.as_str(), cat.parent_id, cat.slug],
            |row| row.get(0),
        )?;
        if exists {
            bail!("Category '{}' already exists", cat.name);
        }
        self.conn.execute(
            "INSERT INTO categories (kind, name, slug, parent_id, nature)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                cat.kind.as_str(),
                cat.name,
                cat.slug,
                cat.parent_id,
                cat.nature.map(|n| n.as_str()),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    // ── Transactions ──────────────────────────────────────────

    pub(crate) fn insert_transaction(&self, txn: &Transaction) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO transactions (kind, amount, date, category_id, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                txn.kind.as_str(),
                txn.amount.to_string(),
                txn.date.format("%Y-%m-%d").to_string(),
                txn.category_id,
                txn.note,
                txn.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Transactions newest first, optionally limited to one month.
    pub(crate) fn get_transactions(&self, month: Option<MonthKey>) -> Result<Vec<Transaction>> {
        let mut sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        if let Some(m) = month {
            sql.push_str(" WHERE date LIKE ?1");
            param_values.push(Box::new(format!("{m}%")));
        }
        sql.push_str(" ORDER BY date DESC, id DESC");

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), transaction_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Transactions dated within `start..=end`, oldest first.
    pub(crate) fn get_transactions_between(
        &self,
        start: MonthKey,
        end: MonthKey,
    ) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions
             WHERE substr(date, 1, 7) >= ?1 AND substr(date, 1, 7) <= ?2
             ORDER BY date, id"
        ))?;
        let rows = stmt.query_map(
            params![start.to_string(), end.to_string()],
            transaction_from_row,
        )?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn delete_transaction(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    // ── Budgets ───────────────────────────────────────────────

    pub(crate) fn get_budgets(&self, month: MonthKey) -> Result<Vec<Budget>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, category_id, month, limit_amount FROM budgets WHERE month = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![month.to_string()], |row| {
            let month_str: String = row.get(2)?;
            let amt_str: String = row.get(3)?;
            Ok(Budget {
                id: Some(row.get(0)?),
                category_id: row.get(1)?,
                month: parse_month(2, &month_str)?,
                limit_amount: Decimal::from_str(&amt_str).unwrap_or_default(),
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn upsert_budget(&self, budget: &Budget) -> Result<()> {
        self.conn.execute(
            "INSERT INTO budgets (category_id, month, limit_amount)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(category_id, month) DO UPDATE SET limit_amount = ?3",
            params![
                budget.category_id,
                budget.month.to_string(),
                budget.limit_amount.to_string(),
            ],
        )?;
        Ok(())
    }

    pub(crate) fn delete_budget(&self, category_id: i64, month: MonthKey) -> Result<bool> {
        let affected = self.conn.execute(
            "DELETE FROM budgets WHERE category_id = ?1 AND month = ?2",
            params![category_id, month.to_string()],
        )?;
        Ok(affected > 0)
    }

    // ── Allocations ───────────────────────────────────────────

    /// Every stored allocation for `owner`, oldest month first.
    pub(crate) fn get_allocations(&self, owner: &str) -> Result<Vec<(MonthKey, Allocation)>> {
        let mut stmt = self.conn.prepare(
            "SELECT month, needs_pct, wants_pct, savings_pct FROM allocations
             WHERE owner = ?1 ORDER BY month",
        )?;
        let rows = stmt.query_map(params![owner], |row| {
            let month_str: String = row.get(0)?;
            Ok((parse_month(0, &month_str)?, allocation_from_row(row, 1)?))
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

impl AllocationStore for Database {
    fn load_allocation(&self, owner: &str, month: MonthKey) -> Result<Option<Allocation>> {
        Ok(self
            .conn
            .query_row(
                "SELECT needs_pct, wants_pct, savings_pct FROM allocations
                 WHERE owner = ?1 AND month = ?2",
                params![owner, month.to_string()],
                |row| allocation_from_row(row, 0),
            )
            .optional()?)
    }

    fn commit_allocations(&mut self, owner: &str, writes: &[(MonthKey, Allocation)]) -> Result<()> {
        let updated_at = chrono::Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        for (month, a) in writes {
            let [needs, wants, savings] = a.as_array();
            tx.execute(
                "INSERT INTO allocations (owner, month, needs_pct, wants_pct, savings_pct, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(owner, month) DO UPDATE SET
                    needs_pct = ?3, wants_pct = ?4, savings_pct = ?5, updated_at = ?6",
                params![
                    owner,
                    month.to_string(),
                    needs,
                    wants,
                    savings,
                    updated_at,
                ],
            )
            .with_context(|| format!("Failed to write allocation for {month}"))?;
        }
        tx.commit().context("Failed to commit allocation batch")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
