// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};
use std::path::PathBuf;

const KINDS: &str = "expense | income | investment | loss";

fn user_arg() -> Arg {
    Arg::new("user")
        .long("user")
        .short('u')
        .help("User identifier supplied by the chat surface")
        .value_parser(value_parser!(i64))
        .required(true)
}

fn kind_arg() -> Arg {
    Arg::new("kind").help(KINDS).required(true)
}

fn json_args() -> [Arg; 2] {
    [
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Output as pretty JSON"),
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Output as JSON lines"),
    ]
}

fn window_arg() -> Arg {
    Arg::new("window")
        .long("window")
        .short('w')
        .help("7d | 30d | all | YYYY-MM-DD | YYYY-MM-DD..YYYY-MM-DD")
}

pub fn build_cli() -> Command {
    Command::new("ceefi")
        .about("Personal finance ledger: log money, get reports and charts")
        .version(clap::crate_version!())
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory for the ledger and generated files (default: $CEEFI_HOME or platform data dir)"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("More log output on stderr (-v info, -vv debug)"),
        )
        .subcommand(Command::new("init").about("Create the ledger database"))
        .subcommand(
            Command::new("add")
                .about("Log an entry: `amount label`, or `amount type ROI% interval` for investments")
                .arg(user_arg())
                .arg(kind_arg())
                .arg(
                    Arg::new("input")
                        .required(true)
                        .num_args(1..)
                        .allow_hyphen_values(true),
                ),
        )
        .subcommand(
            Command::new("edit")
                .about("Replace amount and label of an entry: `amount, label`")
                .arg(user_arg())
                .arg(kind_arg())
                .arg(
                    Arg::new("id")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                )
                .arg(
                    Arg::new("input")
                        .required(true)
                        .num_args(1..)
                        .allow_hyphen_values(true),
                ),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete an entry")
                .arg(user_arg())
                .arg(kind_arg())
                .arg(
                    Arg::new("id")
                        .required(true)
                        .value_parser(value_parser!(i64)),
                ),
        )
        .subcommand(
            Command::new("recent")
                .about("Most recent entries of one kind")
                .arg(user_arg())
                .arg(kind_arg())
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize))
                        .default_value("5"),
                )
                .args(json_args()),
        )
        .subcommand(
            Command::new("list")
                .about("Page through entries of one kind")
                .arg(user_arg())
                .arg(kind_arg())
                .arg(
                    Arg::new("page")
                        .long("page")
                        .value_parser(value_parser!(usize))
                        .default_value("0"),
                )
                .args(json_args()),
        )
        .subcommand(
            Command::new("search")
                .about("Search all kinds: `text,date-prefix` (e.g. groceries,2025-05)")
                .arg(user_arg())
                .arg(Arg::new("query").required(true))
                .args(json_args()),
        )
        .subcommand(
            Command::new("report")
                .about("Write a totals or full report as CSV or PDF")
                .arg(user_arg())
                .arg(window_arg())
                .arg(
                    Arg::new("scope")
                        .long("scope")
                        .short('s')
                        .default_value("full")
                        .help("totals | full"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("csv | pdf"),
                )
                .args(json_args()),
        )
        .subcommand(
            Command::new("chart")
                .about("Draw a chart: exp | inc | inv | all | ei | ii")
                .arg(user_arg())
                .arg(Arg::new("kind").required(true))
                .arg(window_arg()),
        )
        .subcommand(
            Command::new("config")
                .about("Read or change report defaults")
                .subcommand(
                    Command::new("get").arg(Arg::new("key").required(true)),
                )
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                ),
        )
}
