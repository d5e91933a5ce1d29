// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Windowed totals and full listings over a user's ledger.
//!
//! Reads go through [`RecordReader`] only; nothing here writes. Every
//! category is loaded before any number is produced, so a failed read fails
//! the whole report instead of yielding partial totals.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{Investment, LedgerEntry, RecordKind, UserId};
use crate::store::RecordReader;
use crate::utils::{checked_sum, parse_day};

static CUSTOM_WINDOW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})(?:\.\.(\d{4}-\d{2}-\d{2}))?$").expect("static regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Last7Days,
    Last30Days,
    All,
    /// Explicit range, both ends inclusive. `to: None` runs to the present.
    Custom { from: NaiveDate, to: Option<NaiveDate> },
}

impl Window {
    /// Inclusive lower and upper day bounds relative to `today`.
    pub fn bounds(&self, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
        match *self {
            Window::Last7Days => (Some(today - Duration::days(7)), None),
            Window::Last30Days => (Some(today - Duration::days(30)), None),
            Window::All => (None, None),
            Window::Custom { from, to } => (Some(from), to),
        }
    }

    /// Filename-safe token, stable for identical windows.
    pub fn token(&self) -> String {
        match self {
            Window::Last7Days => "7d".into(),
            Window::Last30Days => "30d".into(),
            Window::All => "all".into(),
            Window::Custom { from, to: None } => format!("{}", from),
            Window::Custom { from, to: Some(to) } => format!("{}_{}", from, to),
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Window::Custom { from, to: Some(to) } => write!(f, "{}..{}", from, to),
            other => f.write_str(&other.token()),
        }
    }
}

impl FromStr for Window {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let t = s.trim().to_ascii_lowercase();
        match t.as_str() {
            "7d" => return Ok(Window::Last7Days),
            "30d" => return Ok(Window::Last30Days),
            "all" => return Ok(Window::All),
            _ => {}
        }
        let caps = CUSTOM_WINDOW
            .captures(&t)
            .ok_or_else(|| Error::unknown("window", s))?;
        let from = parse_day(&caps[1])?;
        let to = caps.get(2).map(|m| parse_day(m.as_str())).transpose()?;
        if let Some(to) = to {
            if to < from {
                return Err(Error::invalid("window", s, "range ends before it starts"));
            }
        }
        Ok(Window::Custom { from, to })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Totals,
    Full,
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "totals" => Ok(Scope::Totals),
            "full" => Ok(Scope::Full),
            _ => Err(Error::unknown("report scope", s)),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scope::Totals => "totals",
            Scope::Full => "full",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRequest {
    pub window: Window,
    pub scope: Scope,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub total_expenses: Decimal,
    pub total_income: Decimal,
    pub total_invested: Decimal,
    pub total_roi: Decimal,
    pub total_losses: Decimal,
}

impl Totals {
    pub const FIELDS: [&'static str; 5] = [
        "total_expenses",
        "total_income",
        "total_invested",
        "total_roi",
        "total_losses",
    ];

    pub fn values(&self) -> [Decimal; 5] {
        [
            self.total_expenses,
            self.total_income,
            self.total_invested,
            self.total_roi,
            self.total_losses,
        ]
    }

    /// Sum of the four amount totals. ROI is derived, so it is not included.
    pub fn amount_sum(&self) -> Result<Decimal> {
        checked_sum(
            "amount sum",
            [
                self.total_expenses,
                self.total_income,
                self.total_invested,
                self.total_losses,
            ],
        )
    }
}

/// Output of one report request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Totals(Totals),
    Full(Vec<LedgerEntry>),
}

/// The four filtered record sets behind one report.
#[derive(Debug, Clone, Default)]
pub struct Filtered {
    sets: BTreeMap<RecordKind, Vec<LedgerEntry>>,
}

impl Filtered {
    pub fn of(&self, kind: RecordKind) -> &[LedgerEntry] {
        self.sets.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn totals(&self) -> Result<Totals> {
        let sum = |kind: RecordKind, what| {
            checked_sum(what, self.of(kind).iter().map(LedgerEntry::amount))
        };
        let returns = self
            .of(RecordKind::Investment)
            .iter()
            .filter_map(LedgerEntry::as_investment)
            .map(Investment::expected_return)
            .collect::<Result<Vec<_>>>()?;
        Ok(Totals {
            total_expenses: sum(RecordKind::Expense, "total_expenses")?,
            total_income: sum(RecordKind::Income, "total_income")?,
            total_invested: sum(RecordKind::Investment, "total_invested")?,
            total_roi: checked_sum("total_roi", returns)?,
            total_losses: sum(RecordKind::Loss, "total_losses")?,
        })
    }

    /// Every surviving row, kinds in ledger order, newest first within a kind.
    pub fn listing(&self) -> Vec<LedgerEntry> {
        RecordKind::ALL
            .iter()
            .flat_map(|k| self.of(*k).iter().cloned())
            .collect()
    }
}

pub struct Aggregator<'r, R: RecordReader + ?Sized> {
    reader: &'r R,
    today: NaiveDate,
}

impl<'r, R: RecordReader + ?Sized> Aggregator<'r, R> {
    pub fn new(reader: &'r R, today: NaiveDate) -> Self {
        Aggregator { reader, today }
    }

    /// One kind, filtered to the window.
    pub fn load(&self, user: UserId, kind: RecordKind, window: Window) -> Result<Vec<LedgerEntry>> {
        let (from, to) = window.bounds(self.today);
        let mut rows = self.reader.list_records(kind, user, from)?;
        rows.retain(|e| from.is_none_or(|f| e.day() >= f) && to.is_none_or(|t| e.day() <= t));
        Ok(rows)
    }

    pub fn load_kinds(&self, user: UserId, kinds: &[RecordKind], window: Window) -> Result<Filtered> {
        let mut sets = BTreeMap::new();
        for &kind in kinds {
            sets.insert(kind, self.load(user, kind, window)?);
        }
        Ok(Filtered { sets })
    }

    pub fn load_all(&self, user: UserId, window: Window) -> Result<Filtered> {
        self.load_kinds(user, &RecordKind::ALL, window)
    }

    pub fn totals(&self, user: UserId, window: Window) -> Result<Totals> {
        self.load_all(user, window)?.totals()
    }

    pub fn listing(&self, user: UserId, window: Window) -> Result<Vec<LedgerEntry>> {
        Ok(self.load_all(user, window)?.listing())
    }

    pub fn run(&self, user: UserId, req: &ReportRequest) -> Result<Report> {
        let filtered = self.load_all(user, req.window)?;
        let report = match req.scope {
            Scope::Totals => Report::Totals(filtered.totals()?),
            Scope::Full => Report::Full(filtered.listing()),
        };
        tracing::debug!(user, window = %req.window, scope = %req.scope, "report aggregated");
        Ok(report)
    }
}
