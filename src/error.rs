// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Errors raised by the ledger store, the aggregator and the renderer.
#[derive(Debug, Error)]
pub enum Error {
    /// User input that must never reach the store.
    #[error("Invalid {field} '{value}': {reason}")]
    Validation {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// An unrecognised report, chart, format, window or record-kind token.
    #[error("Unknown {what} '{token}'")]
    UnknownSelector { what: &'static str, token: String },

    #[error("Record store unavailable: {0}")]
    Store(#[from] rusqlite::Error),

    /// A stored row whose amount, roi or timestamp does not parse.
    #[error("Corrupt {table} row {id}: {detail}")]
    DataIntegrity {
        table: &'static str,
        id: i64,
        detail: String,
    },

    #[error("No {kind} entry with id {id} for this user")]
    NotFound { kind: &'static str, id: i64 },

    /// A sum or product left the range `Decimal` can represent.
    #[error("Arithmetic overflow while computing {what}")]
    Overflow { what: &'static str },

    #[error("Render failed: {0}")]
    Render(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid(field: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Error::Validation {
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown(what: &'static str, token: &str) -> Self {
        tracing::warn!(what, token, "rejected selector");
        Error::UnknownSelector {
            what,
            token: token.to_string(),
        }
    }
}
