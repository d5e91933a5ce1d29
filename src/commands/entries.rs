// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{LedgerEntry, NewEntry, RecordKind, Revision, UserId};
use crate::store::{Page, RecordWriter, SqliteStore, PAGE_SIZE};
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use rusqlite::Connection;

fn user(sub: &clap::ArgMatches) -> UserId {
    *sub.get_one::<i64>("user").expect("user is required")
}

fn kind(sub: &clap::ArgMatches) -> Result<RecordKind> {
    let token = sub.get_one::<String>("kind").expect("kind is required");
    Ok(token.parse::<RecordKind>()?)
}

fn joined_input(sub: &clap::ArgMatches) -> String {
    sub.get_many::<String>("input")
        .map(|v| v.map(String::as_str).collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

fn print_entries(entries: &[LedgerEntry]) {
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            vec![
                e.id().to_string(),
                e.kind().tag().to_string(),
                format!("{:.2}", e.amount()),
                e.label().to_string(),
                e.stamp(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["ID", "Kind", "Amount", "Label", "Date"], rows)
    );
}

/// Validates the chat-style input and appends it. Returns the new row id.
pub fn add_entry(
    conn: &Connection,
    sub: &clap::ArgMatches,
    now: NaiveDateTime,
) -> Result<(i64, NewEntry)> {
    let kind = kind(sub)?;
    let input = joined_input(sub);
    let entry = NewEntry::parse(kind, &input)?;
    let id = SqliteStore::new(conn)
        .append(user(sub), &entry, now)
        .with_context(|| format!("Saving {} '{}'", kind.tag(), input))?;
    Ok((id, entry))
}

pub fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (id, entry) = add_entry(conn, sub, Local::now().naive_local())?;
    match &entry {
        NewEntry::Investment {
            amount,
            r#type,
            roi,
            interval,
        } => println!(
            "Investment logged: {} in {} with {}% ROI ({}) [#{}]",
            amount, r#type, roi, interval, id
        ),
        other => println!(
            "Logged {} {} for {} [#{}]",
            other.kind().tag().to_lowercase(),
            other.amount(),
            other.label(),
            id
        ),
    }
    Ok(())
}

pub fn edit_entry(conn: &Connection, sub: &clap::ArgMatches, now: NaiveDateTime) -> Result<Revision> {
    let kind = kind(sub)?;
    let id = *sub.get_one::<i64>("id").expect("id is required");
    let rev = Revision::parse(&joined_input(sub))?;
    SqliteStore::new(conn).replace(user(sub), kind, id, &rev, now)?;
    Ok(rev)
}

pub fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let rev = edit_entry(conn, sub, Local::now().naive_local())?;
    println!(
        "{} updated to {} for {}",
        kind(sub)?.tag(),
        rev.amount,
        rev.label
    );
    Ok(())
}

pub fn remove(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let kind = kind(sub)?;
    let id = *sub.get_one::<i64>("id").expect("id is required");
    SqliteStore::new(conn).delete(user(sub), kind, id)?;
    println!("Deleted {} entry #{}", kind.tag().to_lowercase(), id);
    Ok(())
}

pub fn recent(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let limit = *sub.get_one::<usize>("limit").unwrap_or(&5);
    let entries = SqliteStore::new(conn).list_recent(kind(sub)?, user(sub), limit)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &entries)? {
        if entries.is_empty() {
            println!("No recent entries.");
        } else {
            print_entries(&entries);
        }
    }
    Ok(())
}

pub fn page_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Page> {
    let page = *sub.get_one::<usize>("page").unwrap_or(&0);
    Ok(SqliteStore::new(conn).list_page(kind(sub)?, user(sub), page, PAGE_SIZE)?)
}

pub fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let page = page_rows(conn, sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &page)? {
        return Ok(());
    }
    if page.entries.is_empty() {
        println!("No data found.");
        return Ok(());
    }
    println!("{} - Page {}:", page.kind.plural(), page.page + 1);
    print_entries(&page.entries);
    let mut nav = Vec::new();
    if page.page > 0 {
        nav.push(format!("prev: --page {}", page.page - 1));
    }
    if page.has_next {
        nav.push(format!("next: --page {}", page.page + 1));
    }
    if !nav.is_empty() {
        println!("{}", nav.join("  "));
    }
    Ok(())
}

/// Splits `text,date-prefix`. A query without a comma searches text only.
pub fn split_query(q: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = q.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [text] => Ok((text.to_string(), String::new())),
        [text, date] => Ok((text.to_string(), date.to_string())),
        _ => Err(crate::error::Error::Validation {
            field: "search",
            value: q.to_string(),
            reason: "expected: text,date".into(),
        }
        .into()),
    }
}

pub fn search_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<LedgerEntry>> {
    let query = sub.get_one::<String>("query").expect("query is required");
    let (text, date) = split_query(query)?;
    Ok(SqliteStore::new(conn).search(user(sub), &text, &date)?)
}

pub fn search(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let hits = search_rows(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &hits)? {
        if hits.is_empty() {
            println!("No results found.");
        } else {
            print_entries(&hits);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_split_accepts_one_or_two_parts() {
        assert_eq!(
            split_query("groceries, 2025-05").unwrap(),
            ("groceries".to_string(), "2025-05".to_string())
        );
        assert_eq!(
            split_query("rent").unwrap(),
            ("rent".to_string(), String::new())
        );
        assert!(split_query("a,b,c").is_err());
    }
}
