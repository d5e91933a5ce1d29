// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::path::PathBuf;

use ceefi::config::Config;
use ceefi::render::FsSink;
use ceefi::{cli, commands, db, logging};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    logging::init(matches.get_count("verbose"))?;
    let cfg = Config::resolve(matches.get_one::<PathBuf>("data-dir").map(PathBuf::as_path))?;
    cfg.ensure_dirs()?;
    let conn = db::open_or_init(&cfg.db_path)?;
    let sink = FsSink::from_config(&cfg);

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", cfg.db_path.display());
        }
        Some(("add", sub)) => commands::entries::add(&conn, sub)?,
        Some(("edit", sub)) => commands::entries::edit(&conn, sub)?,
        Some(("rm", sub)) => commands::entries::remove(&conn, sub)?,
        Some(("recent", sub)) => commands::entries::recent(&conn, sub)?,
        Some(("list", sub)) => commands::entries::list(&conn, sub)?,
        Some(("search", sub)) => commands::entries::search(&conn, sub)?,
        Some(("report", sub)) => commands::reports::report(&conn, &sink, sub)?,
        Some(("chart", sub)) => commands::reports::chart(&conn, &sink, sub)?,
        Some(("config", sub)) => commands::settings::handle(&conn, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
