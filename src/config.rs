use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::allocation::{clamp_batch_limit, DEFAULT_BATCH_LIMIT, DEFAULT_DEBOUNCE};

pub(crate) const DEFAULT_OWNER: &str = "public";
pub(crate) const DEFAULT_MIN_SEGMENT: u8 = 5;

/// Runtime settings gathered from the environment and global flags.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Config {
    pub db_path: PathBuf,
    pub owner: String,
    pub debounce: Duration,
    pub batch_limit: usize,
    pub min_segment: f64,
}

impl Config {
    /// Read the process environment and strip `--owner <id>` out of `args`.
    pub(crate) fn load(args: &mut Vec<String>) -> Result<Self> {
        Self::resolve(args, |key| std::env::var(key).ok(), default_db_path)
    }

    fn resolve(
        args: &mut Vec<String>,
        env: impl Fn(&str) -> Option<String>,
        default_db: impl FnOnce() -> Result<PathBuf>,
    ) -> Result<Self> {
        let owner = take_flag(args, "--owner")?
            .or_else(|| env("BUDGETSPLIT_OWNER"))
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| DEFAULT_OWNER.to_string());

        let db_path = match env("BUDGETSPLIT_DB").filter(|p| !p.trim().is_empty()) {
            Some(p) => PathBuf::from(crate::run::shellexpand(p.trim())),
            None => default_db()?,
        };

        let debounce = match env("BUDGETSPLIT_DEBOUNCE_MS") {
            Some(ms) => Duration::from_millis(
                ms.trim()
                    .parse()
                    .with_context(|| format!("BUDGETSPLIT_DEBOUNCE_MS is not a number: {ms}"))?,
            ),
            None => DEFAULT_DEBOUNCE,
        };

        let batch_limit = match env("BUDGETSPLIT_BATCH_LIMIT") {
            Some(n) => clamp_batch_limit(
                n.trim()
                    .parse()
                    .with_context(|| format!("BUDGETSPLIT_BATCH_LIMIT is not a number: {n}"))?,
            ),
            None => DEFAULT_BATCH_LIMIT,
        };

        let min_segment: u8 = match env("BUDGETSPLIT_MIN_SEGMENT") {
            Some(n) => n
                .trim()
                .parse()
                .with_context(|| format!("BUDGETSPLIT_MIN_SEGMENT is not a number: {n}"))?,
            None => DEFAULT_MIN_SEGMENT,
        };

        Ok(Self {
            db_path,
            owner,
            debounce,
            batch_limit,
            min_segment: f64::from(min_segment),
        })
    }
}

/// Remove `name <value>` from `args`, returning the value.
fn take_flag(args: &mut Vec<String>, name: &str) -> Result<Option<String>> {
    let Some(pos) = args.iter().position(|a| a == name) else {
        return Ok(None);
    };
    if pos + 1 >= args.len() {
        anyhow::bail!("{name} requires a value");
    }
    let value = args.remove(pos + 1);
    args.remove(pos);
    Ok(Some(value))
}

fn default_db_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "budgetsplit", "BudgetSplit")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.join("budgetsplit.db"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
