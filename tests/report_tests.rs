// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use ceefi::aggregate::{Aggregator, Report, ReportRequest, Scope, Totals, Window};
use ceefi::commands::{reports, settings};
use ceefi::error::Error;
use ceefi::models::{LedgerEntry, NewEntry, RecordKind, UserId};
use ceefi::render::{ChartKind, FsSink};
use ceefi::store::{RecordReader, RecordWriter, SqliteStore};
use ceefi::{cli, db};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

fn sub_of(args: &[&str]) -> clap::ArgMatches {
    let mut argv = vec!["ceefi"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some((_, sub)) => sub.clone(),
        None => panic!("no subcommand"),
    }
}

const TODAY: &str = "2025-03-31";

/// Ledger for user 1 spread across the last few months. User 2 owns one row
/// that must never show up in user 1's numbers.
fn seeded() -> Connection {
    let conn = db::open_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let rows = [
        (NewEntry::expense("20", "food"), "2025-03-30 12:00"),
        (NewEntry::expense("15.25", "transport"), "2025-03-24 08:00"),
        (NewEntry::expense("300", "rent"), "2025-03-10 09:00"),
        (NewEntry::expense("80", "food"), "2025-01-15 19:00"),
        (NewEntry::income("2500", "salary"), "2025-03-28 09:00"),
        (NewEntry::income("400", "freelance"), "2025-02-01 09:00"),
        (
            NewEntry::investment("1000", "stocks", "5", "monthly"),
            "2025-03-29 10:00",
        ),
        (
            NewEntry::investment("2000", "bonds", "10%", "yearly"),
            "2025-03-05 10:00",
        ),
        (NewEntry::loss("50", "stolen bike"), "2025-03-27 18:00"),
        (NewEntry::loss("5", "parking fine"), "2024-12-01 18:00"),
    ];
    for (entry, ts) in rows {
        store.append(1, &entry.unwrap(), at(ts)).unwrap();
    }
    store
        .append(2, &NewEntry::expense("999", "food").unwrap(), at("2025-03-30 12:00"))
        .unwrap();
    conn
}

fn totals(conn: &Connection, window: Window) -> Totals {
    let store = SqliteStore::new(conn);
    Aggregator::new(&store, day(TODAY)).totals(1, window).unwrap()
}

#[test]
fn totals_match_full_listing_for_every_window() {
    let conn = seeded();
    let store = SqliteStore::new(&conn);
    let agg = Aggregator::new(&store, day(TODAY));
    let windows = [
        Window::Last7Days,
        Window::Last30Days,
        Window::All,
        "2025-03-01..2025-03-29".parse().unwrap(),
    ];
    for window in windows {
        let t = match agg
            .run(1, &ReportRequest { window, scope: Scope::Totals })
            .unwrap()
        {
            Report::Totals(t) => t,
            other => panic!("expected totals, got {:?}", other),
        };
        let rows = match agg.run(1, &ReportRequest { window, scope: Scope::Full }).unwrap() {
            Report::Full(rows) => rows,
            other => panic!("expected listing, got {:?}", other),
        };
        let recomputed: Decimal = rows.iter().map(LedgerEntry::amount).sum();
        assert_eq!(t.amount_sum().unwrap(), recomputed, "window {}", window);
    }
}

#[test]
fn last_seven_days_keeps_only_recent_rows() {
    let t = totals(&seeded(), Window::Last7Days);
    assert_eq!(t.total_expenses, d("35.25"));
    assert_eq!(t.total_income, d("2500"));
    assert_eq!(t.total_invested, d("1000"));
    assert_eq!(t.total_roi, d("50"));
    assert_eq!(t.total_losses, d("50"));
}

#[test]
fn empty_ledger_reports_zero_everywhere() {
    let conn = db::open_in_memory().unwrap();
    for window in [Window::Last7Days, Window::Last30Days, Window::All] {
        let t = totals(&conn, window);
        assert_eq!(t, Totals::default());
        assert!(t.values().iter().all(|v| v.is_zero()));
    }
}

#[test]
fn roi_total_weights_by_amount() {
    let conn = db::open_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    store
        .append(1, &NewEntry::investment("1000", "a", "5", "m").unwrap(), at("2025-03-01 10:00"))
        .unwrap();
    store
        .append(1, &NewEntry::investment("2000", "b", "10", "m").unwrap(), at("2025-03-02 10:00"))
        .unwrap();
    assert_eq!(totals(&conn, Window::All).total_roi, d("250"));
}

#[test]
fn wider_window_never_totals_less() {
    let conn = seeded();
    let week = totals(&conn, Window::Last7Days);
    let month = totals(&conn, Window::Last30Days);
    let all = totals(&conn, Window::All);
    for (a, b) in [(&week, &month), (&month, &all)] {
        assert!(a.total_expenses <= b.total_expenses);
        assert!(a.total_income <= b.total_income);
        assert!(a.total_invested <= b.total_invested);
        assert!(a.total_losses <= b.total_losses);
    }
    assert_eq!(all.total_expenses, d("415.25"));
}

#[test]
fn other_users_rows_are_invisible() {
    let t = totals(&seeded(), Window::All);
    assert_eq!(t.total_expenses, d("415.25"));
    let t2 = {
        let conn = seeded();
        let store = SqliteStore::new(&conn);
        Aggregator::new(&store, day(TODAY)).totals(2, Window::All).unwrap()
    };
    assert_eq!(t2.total_expenses, d("999"));
    assert_eq!(t2.total_income, Decimal::ZERO);
}

#[test]
fn custom_window_includes_both_end_days() {
    let conn = db::open_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    for (amount, ts) in [
        ("1", "2025-02-28 23:59"),
        ("2", "2025-03-01 00:00"),
        ("4", "2025-03-10 23:59"),
        ("8", "2025-03-11 00:00"),
    ] {
        store
            .append(1, &NewEntry::expense(amount, "edge").unwrap(), at(ts))
            .unwrap();
        store
            .append(1, &NewEntry::investment(amount, "edge", "10", "m").unwrap(), at(ts))
            .unwrap();
    }
    let window: Window = "2025-03-01..2025-03-10".parse().unwrap();
    let t = totals(&conn, window);
    assert_eq!(t.total_expenses, d("6"));
    assert_eq!(t.total_invested, d("6"));
    assert_eq!(t.total_roi, d("0.6"));

    let open: Window = "2025-03-01".parse().unwrap();
    assert_eq!(totals(&conn, open).total_expenses, d("14"));
}

/// Rows written by older builds bypass today's input limits.
fn insert_raw(conn: &Connection, sql: &str) {
    conn.execute(sql, []).unwrap();
}

#[test]
fn oversized_stored_rows_fail_with_overflow() {
    let conn = db::open_in_memory().unwrap();
    insert_raw(
        &conn,
        "INSERT INTO investments(user_id, amount, type, roi, interval, start_date)
         VALUES (1, '100000000000000000000', 'x', '100000000000', 'm', '2025-03-01')",
    );
    let store = SqliteStore::new(&conn);
    let err = Aggregator::new(&store, day(TODAY))
        .totals(1, Window::All)
        .unwrap_err();
    assert!(matches!(err, Error::Overflow { .. }));

    let conn = db::open_in_memory().unwrap();
    for _ in 0..2 {
        insert_raw(
            &conn,
            "INSERT INTO expenses(user_id, amount, category, date)
             VALUES (1, '79228162514264337593543950335', 'x', '2025-03-01 10:00')",
        );
    }
    let store = SqliteStore::new(&conn);
    let agg = Aggregator::new(&store, day(TODAY));
    assert!(matches!(
        agg.totals(1, Window::All),
        Err(Error::Overflow { what: "total_expenses" })
    ));
    // the listing itself has no arithmetic and still loads
    assert_eq!(agg.listing(1, Window::All).unwrap().len(), 2);

    let dir = tempfile::tempdir().unwrap();
    let sink = FsSink::new(dir.path().join("reports"), dir.path().join("charts"));
    for token in ["exp", "all", "ei"] {
        let sub = sub_of(&["chart", "-u", "1", token]);
        assert!(reports::generate_chart(&conn, &sink, &sub, day(TODAY)).is_err());
    }
    let sub = sub_of(&["report", "-u", "1", "-f", "pdf"]);
    assert!(reports::generate_report(&conn, &sink, &sub, day(TODAY)).is_err());
}

struct FailingReader;

impl RecordReader for FailingReader {
    fn list_records(
        &self,
        kind: RecordKind,
        _user: UserId,
        _since: Option<NaiveDate>,
    ) -> ceefi::error::Result<Vec<LedgerEntry>> {
        if kind == RecordKind::Investment {
            return Err(Error::Store(rusqlite::Error::InvalidQuery));
        }
        Ok(Vec::new())
    }
}

#[test]
fn store_failure_fails_the_whole_report() {
    let agg = Aggregator::new(&FailingReader, day(TODAY));
    for scope in [Scope::Totals, Scope::Full] {
        let err = agg
            .run(1, &ReportRequest { window: Window::All, scope })
            .unwrap_err();
        assert!(matches!(err, Error::Store(_)));
    }
}

#[test]
fn corrupt_amount_surfaces_as_integrity_error() {
    let conn = seeded();
    conn.execute(
        "INSERT INTO losses(user_id, amount, reason, date) VALUES (1, 'twelve', 'x', '2025-03-30 10:00')",
        [],
    )
    .unwrap();
    let store = SqliteStore::new(&conn);
    let err = Aggregator::new(&store, day(TODAY))
        .totals(1, Window::All)
        .unwrap_err();
    assert!(matches!(err, Error::DataIntegrity { table: "losses", .. }));
}

#[test]
fn report_files_land_in_reports_dir() {
    let conn = seeded();
    let dir = tempfile::tempdir().unwrap();
    let sink = FsSink::new(dir.path().join("reports"), dir.path().join("charts"));

    let sub = sub_of(&["report", "-u", "1", "-w", "7d", "-s", "totals"]);
    let (path, report) = reports::generate_report(&conn, &sink, &sub, day(TODAY)).unwrap();
    assert_eq!(path, dir.path().join("reports").join("1_report_7d_totals.csv"));
    assert!(matches!(report, Report::Totals(_)));
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("total_expenses,total_income,total_invested,total_roi,total_losses\n"));
    assert!(text.contains("35.25,2500,1000,"));

    let sub = sub_of(&["report", "-u", "1", "-f", "pdf"]);
    let (path, _) = reports::generate_report(&conn, &sink, &sub, day(TODAY)).unwrap();
    assert_eq!(path, dir.path().join("reports").join("1_report_all_full.pdf"));
    assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));
}

#[test]
fn stored_defaults_apply_when_flags_are_absent() {
    let conn = seeded();
    settings::set(&conn, "report_format", "pdf").unwrap();
    settings::set(&conn, "report_window", "30d").unwrap();
    let dir = tempfile::tempdir().unwrap();
    let sink = FsSink::new(dir.path().join("reports"), dir.path().join("charts"));

    let sub = sub_of(&["report", "-u", "1", "-s", "totals"]);
    let (path, _) = reports::generate_report(&conn, &sink, &sub, day(TODAY)).unwrap();
    assert_eq!(path.file_name().unwrap(), "1_report_30d_totals.pdf");

    let sub = sub_of(&["report", "-u", "1", "-s", "totals", "-f", "csv", "-w", "all"]);
    let (path, _) = reports::generate_report(&conn, &sink, &sub, day(TODAY)).unwrap();
    assert_eq!(path.file_name().unwrap(), "1_report_all_totals.csv");
}

#[test]
fn unknown_tokens_abort_without_writing() {
    let conn = seeded();
    let dir = tempfile::tempdir().unwrap();
    let sink = FsSink::new(dir.path().join("reports"), dir.path().join("charts"));

    let sub = sub_of(&["report", "-u", "1", "-f", "docx"]);
    assert!(reports::generate_report(&conn, &sink, &sub, day(TODAY)).is_err());
    let sub = sub_of(&["report", "-u", "1", "-s", "summary"]);
    assert!(reports::generate_report(&conn, &sink, &sub, day(TODAY)).is_err());
    let sub = sub_of(&["report", "-u", "1", "-w", "fortnight"]);
    assert!(reports::generate_report(&conn, &sink, &sub, day(TODAY)).is_err());
    let sub = sub_of(&["chart", "-u", "1", "chart_pie"]);
    assert!(reports::generate_chart(&conn, &sink, &sub, day(TODAY)).is_err());

    assert!(!dir.path().join("reports").exists());
    assert!(!dir.path().join("charts").exists());
}

#[test]
fn every_chart_mode_writes_an_svg() {
    let conn = seeded();
    let dir = tempfile::tempdir().unwrap();
    let sink = FsSink::new(dir.path().join("reports"), dir.path().join("charts"));
    for token in ["chart_exp", "chart_inc", "chart_inv", "chart_all", "chart_ei", "chart_ii"] {
        let sub = sub_of(&["chart", "-u", "1", token, "-w", "30d"]);
        let path = reports::generate_chart(&conn, &sink, &sub, day(TODAY)).unwrap();
        let short = token.trim_start_matches("chart_");
        assert_eq!(
            path,
            dir.path().join("charts").join(format!("1_chart_{}_30d.svg", short))
        );
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
    }
}

#[test]
fn breakdown_chart_on_empty_window_still_writes_a_file() {
    let conn = db::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let sink = FsSink::new(dir.path().join("reports"), dir.path().join("charts"));
    let sub = sub_of(&["chart", "-u", "1", "exp", "-w", "7d"]);
    let path = reports::generate_chart(&conn, &sink, &sub, day(TODAY)).unwrap();
    assert!(path.exists());
    assert_eq!(
        "exp".parse::<ChartKind>().unwrap(),
        ChartKind::Breakdown(RecordKind::Expense)
    );
}
