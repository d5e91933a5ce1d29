// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Record store for the four ledger tables.
//!
//! The aggregator only sees [`RecordReader`]; the command layer writes through
//! [`RecordWriter`]. [`SqliteStore`] implements both over a borrowed
//! connection, so the handle is opened once and passed in explicitly.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{
    Expense, Income, Investment, LedgerEntry, Loss, NewEntry, RecordKind, Revision, UserId,
    DAY_FORMAT, MINUTE_FORMAT,
};

pub trait RecordReader {
    /// Rows of one kind for one user, newest first. With `since`, only rows
    /// on or after that day are returned.
    fn list_records(
        &self,
        kind: RecordKind,
        user: UserId,
        since: Option<NaiveDate>,
    ) -> Result<Vec<LedgerEntry>>;
}

pub trait RecordWriter {
    fn append(&self, user: UserId, entry: &NewEntry, at: NaiveDateTime) -> Result<i64>;

    /// Overwrites amount and descriptive field, and refreshes the timestamp.
    fn replace(
        &self,
        user: UserId,
        kind: RecordKind,
        id: i64,
        rev: &Revision,
        at: NaiveDateTime,
    ) -> Result<()>;

    fn delete(&self, user: UserId, kind: RecordKind, id: i64) -> Result<()>;
}

pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

/// One page of a listing. `has_next` is exact: one extra row is fetched.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub kind: RecordKind,
    pub page: usize,
    pub entries: Vec<LedgerEntry>,
    pub has_next: bool,
}

pub const PAGE_SIZE: usize = 5;

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        SqliteStore { conn }
    }

    /// Most recent entries of one kind, as offered for editing.
    pub fn list_recent(&self, kind: RecordKind, user: UserId, limit: usize) -> Result<Vec<LedgerEntry>> {
        let sql = format!(
            "{} WHERE user_id=?1 ORDER BY {} DESC, id DESC LIMIT ?2",
            select_clause(kind),
            kind.date_column()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![user, limit as i64])?;
        collect(kind, &mut rows)
    }

    pub fn list_page(&self, kind: RecordKind, user: UserId, page: usize, size: usize) -> Result<Page> {
        let out_of_range = || Error::invalid("page", &page.to_string(), "too far past the end");
        let offset = page
            .checked_mul(size)
            .and_then(|o| i64::try_from(o).ok())
            .ok_or_else(out_of_range)?;
        let fetch = size
            .checked_add(1)
            .and_then(|n| i64::try_from(n).ok())
            .ok_or_else(out_of_range)?;
        let sql = format!(
            "{} WHERE user_id=?1 ORDER BY {} DESC, id DESC LIMIT ?2 OFFSET ?3",
            select_clause(kind),
            kind.date_column()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![user, fetch, offset])?;
        let mut entries = collect(kind, &mut rows)?;
        let has_next = entries.len() > size;
        entries.truncate(size);
        Ok(Page {
            kind,
            page,
            entries,
            has_next,
        })
    }

    /// Substring match on the descriptive field plus a prefix match on the
    /// stored timestamp, across all kinds, newest first.
    pub fn search(&self, user: UserId, text: &str, date_prefix: &str) -> Result<Vec<LedgerEntry>> {
        let mut out = Vec::new();
        for kind in RecordKind::ALL {
            let sql = format!(
                "{sel} WHERE user_id=?1 AND {label} LIKE ?2 ESCAPE '\\' AND {date} LIKE ?3 ESCAPE '\\'",
                sel = select_clause(kind),
                label = kind.label_column(),
                date = kind.date_column()
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let mut rows = stmt.query(params![
                user,
                format!("%{}%", like_escape(text.trim())),
                format!("{}%", like_escape(date_prefix.trim())),
            ])?;
            out.extend(collect(kind, &mut rows)?);
        }
        out.sort_by(|a, b| b.stamp().cmp(&a.stamp()).then(b.id().cmp(&a.id())));
        tracing::debug!(user, text, date_prefix, hits = out.len(), "search");
        Ok(out)
    }
}

impl RecordReader for SqliteStore<'_> {
    fn list_records(
        &self,
        kind: RecordKind,
        user: UserId,
        since: Option<NaiveDate>,
    ) -> Result<Vec<LedgerEntry>> {
        // Day-only cutoff compares correctly against minute stamps: the
        // shorter string is a prefix, so same-day rows sort after it.
        let cutoff = since
            .map(|d| d.format(DAY_FORMAT).to_string())
            .unwrap_or_default();
        let sql = format!(
            "{sel} WHERE user_id=?1 AND {date} >= ?2 ORDER BY {date} DESC, id DESC",
            sel = select_clause(kind),
            date = kind.date_column()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![user, cutoff])?;
        let entries = collect(kind, &mut rows)?;
        tracing::debug!(table = kind.table(), user, cutoff = %cutoff, rows = entries.len(), "list_records");
        Ok(entries)
    }
}

impl RecordWriter for SqliteStore<'_> {
    fn append(&self, user: UserId, entry: &NewEntry, at: NaiveDateTime) -> Result<i64> {
        let stamp = at.format(MINUTE_FORMAT).to_string();
        match entry {
            NewEntry::Expense { amount, category } => self.conn.execute(
                "INSERT INTO expenses(user_id, amount, category, date) VALUES (?1, ?2, ?3, ?4)",
                params![user, amount.to_string(), category, stamp],
            )?,
            NewEntry::Income { amount, source } => self.conn.execute(
                "INSERT INTO income(user_id, amount, source, date) VALUES (?1, ?2, ?3, ?4)",
                params![user, amount.to_string(), source, stamp],
            )?,
            NewEntry::Investment {
                amount,
                r#type,
                roi,
                interval,
            } => self.conn.execute(
                "INSERT INTO investments(user_id, amount, type, roi, interval, start_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user,
                    amount.to_string(),
                    r#type,
                    roi.to_string(),
                    interval,
                    at.date().format(DAY_FORMAT).to_string()
                ],
            )?,
            NewEntry::Loss { amount, reason } => self.conn.execute(
                "INSERT INTO losses(user_id, amount, reason, date) VALUES (?1, ?2, ?3, ?4)",
                params![user, amount.to_string(), reason, stamp],
            )?,
        };
        let id = self.conn.last_insert_rowid();
        tracing::debug!(table = entry.kind().table(), user, id, "append");
        Ok(id)
    }

    fn replace(
        &self,
        user: UserId,
        kind: RecordKind,
        id: i64,
        rev: &Revision,
        at: NaiveDateTime,
    ) -> Result<()> {
        let stamp = match kind {
            RecordKind::Investment => at.date().format(DAY_FORMAT).to_string(),
            _ => at.format(MINUTE_FORMAT).to_string(),
        };
        let sql = format!(
            "UPDATE {} SET amount=?1, {}=?2, {}=?3 WHERE id=?4 AND user_id=?5",
            kind.table(),
            kind.label_column(),
            kind.date_column()
        );
        let n = self
            .conn
            .execute(&sql, params![rev.amount.to_string(), rev.label, stamp, id, user])?;
        if n == 0 {
            return Err(Error::NotFound {
                kind: kind.table(),
                id,
            });
        }
        tracing::debug!(table = kind.table(), user, id, "replace");
        Ok(())
    }

    fn delete(&self, user: UserId, kind: RecordKind, id: i64) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id=?1 AND user_id=?2", kind.table());
        let n = self.conn.execute(&sql, params![id, user])?;
        if n == 0 {
            return Err(Error::NotFound {
                kind: kind.table(),
                id,
            });
        }
        tracing::debug!(table = kind.table(), user, id, "delete");
        Ok(())
    }
}

fn select_clause(kind: RecordKind) -> String {
    match kind {
        RecordKind::Investment => {
            "SELECT id, user_id, amount, type, start_date, roi, interval FROM investments".into()
        }
        _ => format!(
            "SELECT id, user_id, amount, {}, date FROM {}",
            kind.label_column(),
            kind.table()
        ),
    }
}

fn like_escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn collect(kind: RecordKind, rows: &mut rusqlite::Rows<'_>) -> Result<Vec<LedgerEntry>> {
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(decode(kind, r)?);
    }
    Ok(out)
}

fn decode(kind: RecordKind, r: &Row<'_>) -> Result<LedgerEntry> {
    let table = kind.table();
    let id: i64 = r.get(0)?;
    let user_id: UserId = r.get(1)?;
    let amount = decimal_column(r, 2, table, id, "amount")?;
    let label: String = r.get(3)?;
    let stamp: String = r.get(4)?;
    let corrupt = |detail: String| Error::DataIntegrity { table, id, detail };
    let entry = match kind {
        RecordKind::Investment => LedgerEntry::Investment(Investment {
            id,
            user_id,
            amount,
            r#type: label,
            roi: decimal_column(r, 5, table, id, "roi")?,
            interval: r.get(6)?,
            start_date: NaiveDate::parse_from_str(&stamp, DAY_FORMAT)
                .map_err(|e| corrupt(format!("start_date '{}': {}", stamp, e)))?,
        }),
        _ => {
            let date = NaiveDateTime::parse_from_str(&stamp, MINUTE_FORMAT)
                .map_err(|e| corrupt(format!("date '{}': {}", stamp, e)))?;
            match kind {
                RecordKind::Expense => LedgerEntry::Expense(Expense {
                    id,
                    user_id,
                    amount,
                    category: label,
                    date,
                }),
                RecordKind::Income => LedgerEntry::Income(Income {
                    id,
                    user_id,
                    amount,
                    source: label,
                    date,
                }),
                _ => LedgerEntry::Loss(Loss {
                    id,
                    user_id,
                    amount,
                    reason: label,
                    date,
                }),
            }
        }
    };
    Ok(entry)
}

/// Reads a numeric column. Text must parse as a decimal; REAL and INTEGER
/// values from older databases are accepted. Anything else is corruption,
/// never a silent zero.
fn decimal_column(
    r: &Row<'_>,
    idx: usize,
    table: &'static str,
    id: i64,
    column: &str,
) -> Result<Decimal> {
    let corrupt = |detail: String| Error::DataIntegrity {
        table,
        id,
        detail: format!("{} {}", column, detail),
    };
    match r.get_ref(idx)? {
        ValueRef::Text(bytes) => {
            let s = String::from_utf8_lossy(bytes);
            s.trim()
                .parse::<Decimal>()
                .map_err(|_| corrupt(format!("'{}' is not a number", s)))
        }
        ValueRef::Integer(i) => Ok(Decimal::from(i)),
        ValueRef::Real(f) => {
            Decimal::try_from(f).map_err(|_| corrupt(format!("{} is not representable", f)))
        }
        ValueRef::Null => Err(corrupt("is NULL".into())),
        ValueRef::Blob(_) => Err(corrupt("is a blob".into())),
    }
}
