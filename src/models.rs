// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::{parse_amount, parse_roi, required_text};

/// Identifier handed to us by the chat surface. Trusted as-is.
pub type UserId = i64;

/// Storage format for expense, income and loss timestamps.
///
/// Both formats are fixed-width and zero-padded, so stored values sort the
/// same lexicographically as chronologically. The store's `date >= ?` filter
/// depends on this.
pub const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";
/// Storage format for investment start dates.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    Expense,
    Income,
    Investment,
    Loss,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Expense,
        RecordKind::Income,
        RecordKind::Investment,
        RecordKind::Loss,
    ];

    pub fn table(self) -> &'static str {
        match self {
            RecordKind::Expense => "expenses",
            RecordKind::Income => "income",
            RecordKind::Investment => "investments",
            RecordKind::Loss => "losses",
        }
    }

    /// Free-text column describing what the money was for.
    pub fn label_column(self) -> &'static str {
        match self {
            RecordKind::Expense => "category",
            RecordKind::Income => "source",
            RecordKind::Investment => "type",
            RecordKind::Loss => "reason",
        }
    }

    pub fn date_column(self) -> &'static str {
        match self {
            RecordKind::Investment => "start_date",
            _ => "date",
        }
    }

    /// Category tag used in the full listing.
    pub fn tag(self) -> &'static str {
        match self {
            RecordKind::Expense => "Expense",
            RecordKind::Income => "Income",
            RecordKind::Investment => "Investment",
            RecordKind::Loss => "Loss",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            RecordKind::Expense => "Expenses",
            RecordKind::Income => "Income",
            RecordKind::Investment => "Investments",
            RecordKind::Loss => "Losses",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

impl FromStr for RecordKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "expense" | "expenses" | "exp" => Ok(RecordKind::Expense),
            "income" | "inc" => Ok(RecordKind::Income),
            "investment" | "investments" | "inv" => Ok(RecordKind::Investment),
            "loss" | "losses" => Ok(RecordKind::Loss),
            _ => Err(Error::unknown("record kind", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: UserId,
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    pub id: i64,
    pub user_id: UserId,
    pub amount: Decimal,
    pub source: String,
    pub date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub id: i64,
    pub user_id: UserId,
    pub amount: Decimal,
    pub r#type: String,
    /// Percentage, `7.5` means 7.5%.
    pub roi: Decimal,
    pub interval: String,
    pub start_date: NaiveDate,
}

impl Investment {
    /// `amount * roi / 100`. Fails instead of panicking on rows too large
    /// to multiply.
    pub fn expected_return(&self) -> Result<Decimal> {
        self.amount
            .checked_mul(self.roi)
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
            .ok_or(Error::Overflow { what: "expected return" })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loss {
    pub id: i64,
    pub user_id: UserId,
    pub amount: Decimal,
    pub reason: String,
    pub date: NaiveDateTime,
}

/// One row of any kind. The full-scope report is a `Vec` of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum LedgerEntry {
    Expense(Expense),
    Income(Income),
    Investment(Investment),
    Loss(Loss),
}

impl LedgerEntry {
    pub fn kind(&self) -> RecordKind {
        match self {
            LedgerEntry::Expense(_) => RecordKind::Expense,
            LedgerEntry::Income(_) => RecordKind::Income,
            LedgerEntry::Investment(_) => RecordKind::Investment,
            LedgerEntry::Loss(_) => RecordKind::Loss,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            LedgerEntry::Expense(e) => e.id,
            LedgerEntry::Income(i) => i.id,
            LedgerEntry::Investment(v) => v.id,
            LedgerEntry::Loss(l) => l.id,
        }
    }

    pub fn amount(&self) -> Decimal {
        match self {
            LedgerEntry::Expense(e) => e.amount,
            LedgerEntry::Income(i) => i.amount,
            LedgerEntry::Investment(v) => v.amount,
            LedgerEntry::Loss(l) => l.amount,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            LedgerEntry::Expense(e) => &e.category,
            LedgerEntry::Income(i) => &i.source,
            LedgerEntry::Investment(v) => &v.r#type,
            LedgerEntry::Loss(l) => &l.reason,
        }
    }

    /// Calendar day the entry falls on, used for windows and time series.
    pub fn day(&self) -> NaiveDate {
        match self {
            LedgerEntry::Expense(e) => e.date.date(),
            LedgerEntry::Income(i) => i.date.date(),
            LedgerEntry::Investment(v) => v.start_date,
            LedgerEntry::Loss(l) => l.date.date(),
        }
    }

    /// Timestamp in its storage format.
    pub fn stamp(&self) -> String {
        match self {
            LedgerEntry::Expense(e) => e.date.format(MINUTE_FORMAT).to_string(),
            LedgerEntry::Income(i) => i.date.format(MINUTE_FORMAT).to_string(),
            LedgerEntry::Investment(v) => v.start_date.format(DAY_FORMAT).to_string(),
            LedgerEntry::Loss(l) => l.date.format(MINUTE_FORMAT).to_string(),
        }
    }

    pub fn as_investment(&self) -> Option<&Investment> {
        match self {
            LedgerEntry::Investment(v) => Some(v),
            _ => None,
        }
    }
}

/// A validated record about to be appended. Amounts are already numeric.
#[derive(Debug, Clone, PartialEq)]
pub enum NewEntry {
    Expense {
        amount: Decimal,
        category: String,
    },
    Income {
        amount: Decimal,
        source: String,
    },
    Investment {
        amount: Decimal,
        r#type: String,
        roi: Decimal,
        interval: String,
    },
    Loss {
        amount: Decimal,
        reason: String,
    },
}

impl NewEntry {
    pub fn expense(amount: &str, category: &str) -> Result<Self> {
        Ok(NewEntry::Expense {
            amount: parse_amount(amount)?,
            category: required_text("category", category)?,
        })
    }

    pub fn income(amount: &str, source: &str) -> Result<Self> {
        Ok(NewEntry::Income {
            amount: parse_amount(amount)?,
            source: required_text("source", source)?,
        })
    }

    pub fn investment(amount: &str, kind: &str, roi: &str, interval: &str) -> Result<Self> {
        Ok(NewEntry::Investment {
            amount: parse_amount(amount)?,
            r#type: required_text("type", kind)?,
            roi: parse_roi(roi)?,
            interval: required_text("interval", interval)?,
        })
    }

    pub fn loss(amount: &str, reason: &str) -> Result<Self> {
        Ok(NewEntry::Loss {
            amount: parse_amount(amount)?,
            reason: required_text("reason", reason)?,
        })
    }

    /// Parses a chat-style line: `amount label` for expenses, income and
    /// losses, `amount type roi% interval` for investments. The label may
    /// contain spaces; the interval takes whatever follows the roi.
    pub fn parse(kind: RecordKind, input: &str) -> Result<Self> {
        let input = input.trim();
        match kind {
            RecordKind::Investment => {
                let bad = || {
                    Error::invalid("investment", input, "expected: amount type ROI% interval")
                };
                let (amount, rest) = next_word(input).ok_or_else(bad)?;
                let (kind, rest) = next_word(rest).ok_or_else(bad)?;
                let (roi, interval) = next_word(rest).ok_or_else(bad)?;
                NewEntry::investment(amount, kind, roi, interval)
            }
            _ => {
                let (amount, label) = next_word(input).ok_or_else(|| {
                    Error::invalid(
                        "entry",
                        input,
                        format!("expected: amount {}", kind.label_column()),
                    )
                })?;
                match kind {
                    RecordKind::Expense => NewEntry::expense(amount, label),
                    RecordKind::Income => NewEntry::income(amount, label),
                    _ => NewEntry::loss(amount, label),
                }
            }
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            NewEntry::Expense { .. } => RecordKind::Expense,
            NewEntry::Income { .. } => RecordKind::Income,
            NewEntry::Investment { .. } => RecordKind::Investment,
            NewEntry::Loss { .. } => RecordKind::Loss,
        }
    }

    pub fn amount(&self) -> Decimal {
        match self {
            NewEntry::Expense { amount, .. }
            | NewEntry::Income { amount, .. }
            | NewEntry::Investment { amount, .. }
            | NewEntry::Loss { amount, .. } => *amount,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            NewEntry::Expense { category, .. } => category,
            NewEntry::Income { source, .. } => source,
            NewEntry::Investment { r#type, .. } => r#type,
            NewEntry::Loss { reason, .. } => reason,
        }
    }
}

fn next_word(input: &str) -> Option<(&str, &str)> {
    let (head, rest) = input.trim_start().split_once(char::is_whitespace)?;
    Some((head, rest.trim_start()))
}

/// Replacement values for an edit: amount plus the descriptive field.
#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    pub amount: Decimal,
    pub label: String,
}

impl Revision {
    pub fn new(amount: &str, label: &str) -> Result<Self> {
        Ok(Revision {
            amount: parse_amount(amount)?,
            label: required_text("label", label)?,
        })
    }

    /// Parses the edit form `amount, label`.
    pub fn parse(input: &str) -> Result<Self> {
        let parts: Vec<&str> = input.split(',').map(str::trim).collect();
        match parts.as_slice() {
            [amount, label] => Revision::new(amount, label),
            _ => Err(Error::invalid("edit", input, "expected: amount, label")),
        }
    }
}
