// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregate::{Aggregator, Report, ReportRequest, Scope, Window};
use crate::config::get_setting;
use crate::models::UserId;
use crate::render::{ChartKind, DocumentFormat, FileSink, Renderer};
use crate::store::SqliteStore;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use std::path::PathBuf;

fn user(sub: &clap::ArgMatches) -> UserId {
    *sub.get_one::<i64>("user").expect("user is required")
}

/// Flag value, else the stored setting, else `fallback`.
fn with_default(
    conn: &Connection,
    sub: &clap::ArgMatches,
    arg: &str,
    key: &str,
    fallback: &str,
) -> Result<String> {
    if let Some(v) = sub.get_one::<String>(arg) {
        return Ok(v.clone());
    }
    Ok(get_setting(conn, key)?.unwrap_or_else(|| fallback.to_string()))
}

pub fn request(conn: &Connection, sub: &clap::ArgMatches) -> Result<(ReportRequest, DocumentFormat)> {
    let window: Window = with_default(conn, sub, "window", "report_window", "all")?.parse()?;
    let scope: Scope = sub
        .get_one::<String>("scope")
        .map(String::as_str)
        .unwrap_or("full")
        .parse()?;
    let format: DocumentFormat = with_default(conn, sub, "format", "report_format", "csv")?.parse()?;
    Ok((ReportRequest { window, scope }, format))
}

/// Aggregates and writes one report. Returns the written path and the report
/// it was rendered from.
pub fn generate_report(
    conn: &Connection,
    sink: &dyn FileSink,
    sub: &clap::ArgMatches,
    today: NaiveDate,
) -> Result<(PathBuf, Report)> {
    let user = user(sub);
    let (req, format) = request(conn, sub)?;
    let store = SqliteStore::new(conn);
    let report = Aggregator::new(&store, today)
        .run(user, &req)
        .with_context(|| format!("Building {} report ({})", req.scope, req.window))?;
    let path = Renderer::new(sink).document(user, &req, &report, format)?;
    Ok((path, report))
}

pub fn generate_chart(
    conn: &Connection,
    sink: &dyn FileSink,
    sub: &clap::ArgMatches,
    today: NaiveDate,
) -> Result<PathBuf> {
    let user = user(sub);
    let kind: ChartKind = sub
        .get_one::<String>("kind")
        .expect("kind is required")
        .parse()?;
    let window: Window = sub
        .get_one::<String>("window")
        .map(String::as_str)
        .unwrap_or("all")
        .parse()?;
    let store = SqliteStore::new(conn);
    let data = Aggregator::new(&store, today).load_kinds(user, &kind.kinds(), window)?;
    Ok(Renderer::new(sink).chart(user, kind, window, &data)?)
}

pub fn report(conn: &Connection, sink: &dyn FileSink, sub: &clap::ArgMatches) -> Result<()> {
    let (path, report) = generate_report(conn, sink, sub, Local::now().date_naive())?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        return Ok(());
    }
    if let Report::Totals(t) = &report {
        let rows = crate::aggregate::Totals::FIELDS
            .iter()
            .zip(t.values())
            .map(|(k, v)| vec![k.to_string(), fmt_money(&v)])
            .collect();
        println!("{}", pretty_table(&["Total", "Amount"], rows));
    }
    println!("Report saved to {}", path.display());
    Ok(())
}

pub fn chart(conn: &Connection, sink: &dyn FileSink, sub: &clap::ArgMatches) -> Result<()> {
    let path = generate_chart(conn, sink, sub, Local::now().date_naive())?;
    println!("Chart saved to {}", path.display());
    Ok(())
}
