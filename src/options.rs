//! Command-line options for the demo binary.
//! Every numeric flag overrides the corresponding config field; `--workers`
//! replaces the configured worker list with rotated orders.

use clap::{Arg, ArgAction, Command, value_parser};
use std::error::Error;

use crate::worker::AcquireMode;

#[derive(Debug)]
pub struct Options {
    pub config: Option<String>,
    pub mode: Option<AcquireMode>,
    pub workers: Option<u32>,
    pub resources: Option<u32>,
    pub timeout_ms: Option<u64>,
    pub window_ms: Option<u64>,
    pub output: String,
    pub shuffle: bool,
}

fn make_options_parser() -> Command {
    Command::new("contend")
        .no_binary_name(true)
        .about("Ordered vs timeout-retry multi-resource acquisition under contention")
        .version("v0.1.0")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML scenario file"),
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .help("Override every worker's acquisition mode")
                .value_parser(["ordered-blocking", "timeout-retry"]),
        )
        .arg(
            Arg::new("workers")
                .short('w')
                .long("workers")
                .help("Run this many workers with rotated orders instead of the configured ones")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("resources")
                .short('n')
                .long("resources")
                .help("Size of the fixed resource set")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("timeout-ms")
                .short('t')
                .long("timeout-ms")
                .help("Bounded wait per acquisition attempt")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("window-ms")
                .long("window-ms")
                .help("Observation window before undone workers count as stalled")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Path to file where the run report will be stored")
                .default_value("report.json"),
        )
        .arg(
            Arg::new("shuffle")
                .long("shuffle")
                .help("Randomize each worker's acquisition order")
                .action(ArgAction::SetTrue),
        )
}

impl Options {
    pub fn parse() -> Result<Self, Box<dyn Error>> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::parse_from_args(&args)
    }

    pub fn parse_from_args(flags: &[String]) -> Result<Self, Box<dyn Error>> {
        let app = make_options_parser();
        let matches = app.try_get_matches_from(flags.iter())?;

        let mode = match matches.get_one::<String>("mode").map(String::as_str) {
            Some("ordered-blocking") => Some(AcquireMode::OrderedBlocking),
            Some("timeout-retry") => Some(AcquireMode::TimeoutRetry),
            Some(other) => return Err(format!("unsupported mode {other}"))?,
            None => None,
        };

        Ok(Options {
            config: matches.get_one::<String>("config").cloned(),
            mode,
            workers: matches.get_one::<u32>("workers").copied(),
            resources: matches.get_one::<u32>("resources").copied(),
            timeout_ms: matches.get_one::<u64>("timeout-ms").copied(),
            window_ms: matches.get_one::<u64>("window-ms").copied(),
            output: matches.get_one::<String>("output").unwrap().to_string(),
            shuffle: matches.get_flag("shuffle"),
        })
    }
}
