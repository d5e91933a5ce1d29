// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregate::Window;
use crate::config::{get_setting, set_setting};
use crate::render::DocumentFormat;
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => {
            let key = sub.get_one::<String>("key").expect("key is required");
            match get_setting(conn, key)? {
                Some(v) => println!("{}", v),
                None => println!("{} is not set", key),
            }
        }
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").expect("key is required");
            let value = sub.get_one::<String>("value").expect("value is required");
            set(conn, key, value)?;
            println!("{} = {}", key, value);
        }
        _ => {}
    }
    Ok(())
}

/// Stores a default after checking it parses as the setting's type.
pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    match key {
        "report_format" => {
            value.parse::<DocumentFormat>()?;
        }
        "report_window" => {
            value.parse::<Window>()?;
        }
        _ => {}
    }
    set_setting(conn, key, value)
}
