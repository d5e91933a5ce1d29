// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Turns aggregated ledger data into files: CSV/PDF reports and SVG charts.

pub mod chart;
pub mod document;

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use crate::aggregate::{Filtered, Report, ReportRequest, Window};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{RecordKind, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Document,
    Chart,
}

/// Durable storage for generated artifacts.
pub trait FileSink {
    /// Stores `payload` and returns a handle the caller can hand to the user.
    fn write_artifact(
        &self,
        kind: ArtifactKind,
        user: UserId,
        name: &str,
        payload: &[u8],
    ) -> Result<PathBuf>;
}

/// Writes documents under `reports/` and charts under `charts/`, one file per
/// user and request signature.
#[derive(Debug, Clone)]
pub struct FsSink {
    pub reports_dir: PathBuf,
    pub charts_dir: PathBuf,
}

impl FsSink {
    pub fn new(reports_dir: impl Into<PathBuf>, charts_dir: impl Into<PathBuf>) -> Self {
        FsSink {
            reports_dir: reports_dir.into(),
            charts_dir: charts_dir.into(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        FsSink::new(cfg.reports_dir.clone(), cfg.charts_dir.clone())
    }
}

impl FileSink for FsSink {
    fn write_artifact(
        &self,
        kind: ArtifactKind,
        user: UserId,
        name: &str,
        payload: &[u8],
    ) -> Result<PathBuf> {
        let dir = match kind {
            ArtifactKind::Document => &self.reports_dir,
            ArtifactKind::Chart => &self.charts_dir,
        };
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}_{}", user, name));
        fs::write(&path, payload)?;
        tracing::info!(user, path = %path.display(), bytes = payload.len(), "artifact written");
        Ok(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Tabular spreadsheet, CSV.
    Spreadsheet,
    /// Paginated document, PDF.
    Pdf,
}

impl DocumentFormat {
    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Spreadsheet => "csv",
            DocumentFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" | "spreadsheet" => Ok(DocumentFormat::Spreadsheet),
            "pdf" => Ok(DocumentFormat::Pdf),
            _ => Err(Error::unknown("document format", s)),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Amount per descriptive field of one kind. Losses have no breakdown.
    Breakdown(RecordKind),
    /// Expenses vs income vs investments totals. Losses are not shown.
    Comparison,
    /// Two per-day series on one date axis.
    Overlay(RecordKind, RecordKind),
}

impl ChartKind {
    pub fn token(self) -> &'static str {
        match self {
            ChartKind::Breakdown(RecordKind::Expense) => "exp",
            ChartKind::Breakdown(RecordKind::Income) => "inc",
            ChartKind::Breakdown(_) => "inv",
            ChartKind::Comparison => "all",
            ChartKind::Overlay(RecordKind::Expense, _) => "ei",
            ChartKind::Overlay(..) => "ii",
        }
    }

    /// Record kinds the chart needs loaded.
    pub fn kinds(self) -> Vec<RecordKind> {
        match self {
            ChartKind::Breakdown(k) => vec![k],
            ChartKind::Comparison => vec![
                RecordKind::Expense,
                RecordKind::Income,
                RecordKind::Investment,
            ],
            ChartKind::Overlay(a, b) => vec![a, b],
        }
    }
}

impl FromStr for ChartKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let t = s.trim().to_ascii_lowercase();
        let t = t.strip_prefix("chart_").unwrap_or(&t);
        match t {
            "exp" | "expenses" => Ok(ChartKind::Breakdown(RecordKind::Expense)),
            "inc" | "income" => Ok(ChartKind::Breakdown(RecordKind::Income)),
            "inv" | "investments" => Ok(ChartKind::Breakdown(RecordKind::Investment)),
            "all" => Ok(ChartKind::Comparison),
            "ei" => Ok(ChartKind::Overlay(RecordKind::Expense, RecordKind::Income)),
            "ii" => Ok(ChartKind::Overlay(RecordKind::Income, RecordKind::Investment)),
            _ => Err(Error::unknown("chart", s)),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

pub struct Renderer<'s, S: FileSink + ?Sized> {
    sink: &'s S,
}

impl<'s, S: FileSink + ?Sized> Renderer<'s, S> {
    pub fn new(sink: &'s S) -> Self {
        Renderer { sink }
    }

    pub fn document(
        &self,
        user: UserId,
        req: &ReportRequest,
        report: &Report,
        format: DocumentFormat,
    ) -> Result<PathBuf> {
        let payload = match format {
            DocumentFormat::Spreadsheet => document::to_csv(report)?,
            DocumentFormat::Pdf => document::to_pdf(report, &document::title(req))?,
        };
        let name = format!(
            "report_{}_{}.{}",
            req.window.token(),
            req.scope,
            format.extension()
        );
        self.sink
            .write_artifact(ArtifactKind::Document, user, &name, &payload)
    }

    pub fn chart(
        &self,
        user: UserId,
        kind: ChartKind,
        window: Window,
        data: &Filtered,
    ) -> Result<PathBuf> {
        let svg = chart::draw(kind, data)?;
        let name = format!("chart_{}_{}.svg", kind.token(), window.token());
        self.sink
            .write_artifact(ArtifactKind::Chart, user, &name, svg.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_tokens_accept_menu_prefix() {
        assert_eq!("chart_ei".parse::<ChartKind>().unwrap().token(), "ei");
        assert_eq!(
            "inv".parse::<ChartKind>().unwrap(),
            ChartKind::Breakdown(RecordKind::Investment)
        );
        assert!(matches!(
            "chart_pie".parse::<ChartKind>(),
            Err(Error::UnknownSelector { what: "chart", .. })
        ));
        assert!("losses".parse::<ChartKind>().is_err());
    }

    #[test]
    fn document_format_is_strict() {
        assert_eq!("PDF".parse::<DocumentFormat>().unwrap(), DocumentFormat::Pdf);
        assert_eq!(
            "csv".parse::<DocumentFormat>().unwrap(),
            DocumentFormat::Spreadsheet
        );
        assert!("docx".parse::<DocumentFormat>().is_err());
    }

    #[test]
    fn sink_separates_documents_and_charts() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsSink::new(dir.path().join("reports"), dir.path().join("charts"));
        let doc = sink
            .write_artifact(ArtifactKind::Document, 9, "report_all_totals.csv", b"a,b\n")
            .unwrap();
        let img = sink
            .write_artifact(ArtifactKind::Chart, 9, "chart_exp_all.svg", b"<svg/>")
            .unwrap();
        assert_eq!(doc, dir.path().join("reports").join("9_report_all_totals.csv"));
        assert_eq!(img, dir.path().join("charts").join("9_chart_exp_all.svg"));
        assert_eq!(std::fs::read(&doc).unwrap(), b"a,b\n");
    }
}
