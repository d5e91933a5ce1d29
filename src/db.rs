// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

/// Opens the ledger at `path`, creating tables on first use.
pub fn open_or_init(path: &Path) -> Result<Connection> {
    let mut conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    tracing::debug!(path = %path.display(), "ledger opened");
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    init_schema(&mut conn)?;
    Ok(conn)
}

// Amounts and roi are TEXT holding decimal strings. Timestamps are TEXT in
// fixed-width zero-padded form so that range filters can compare strings.
fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS expenses(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        category TEXT NOT NULL,
        date TEXT NOT NULL -- YYYY-MM-DD HH:MM
    );
    CREATE INDEX IF NOT EXISTS idx_expenses_user_date ON expenses(user_id, date);

    CREATE TABLE IF NOT EXISTS income(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        source TEXT NOT NULL,
        date TEXT NOT NULL -- YYYY-MM-DD HH:MM
    );
    CREATE INDEX IF NOT EXISTS idx_income_user_date ON income(user_id, date);

    CREATE TABLE IF NOT EXISTS investments(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        type TEXT NOT NULL,
        roi TEXT NOT NULL, -- percent, '%' stripped
        interval TEXT NOT NULL,
        start_date TEXT NOT NULL -- YYYY-MM-DD
    );
    CREATE INDEX IF NOT EXISTS idx_investments_user_date ON investments(user_id, start_date);

    CREATE TABLE IF NOT EXISTS losses(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        reason TEXT NOT NULL,
        date TEXT NOT NULL -- YYYY-MM-DD HH:MM
    );
    CREATE INDEX IF NOT EXISTS idx_losses_user_date ON losses(user_id, date);
    "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.sqlite");
        open_or_init(&path).unwrap();
        let conn = open_or_init(&path).unwrap();
        let n: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('expenses','income','investments','losses','settings')",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(n, 5);
    }
}
