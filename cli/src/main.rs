#[macro_use]
extern crate clap;

use std::path::Path;
use std::process;

use clap::{Arg, ArgGroup};

use dcj_core::{LogLevel, Logger};

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("convert")
                .short("c")
                .takes_value(true)
                .value_name("FILE")
                .help("Translate a register-dialect program to stack IR and run it (mixed mode)"),
        )
        .arg(
            Arg::with_name("stack")
                .short("s")
                .takes_value(true)
                .value_name("FILE")
                .help("Run a stack-dialect program directly"),
        )
        .arg(
            Arg::with_name("register")
                .short("r")
                .takes_value(true)
                .value_name("FILE")
                .help("Run a register-dialect program directly"),
        )
        .group(
            ArgGroup::with_name("input")
                .args(&["convert", "stack", "register"])
                .required(true),
        )
        .arg(
            Arg::with_name("verbosity")
                .short("v")
                .takes_value(true)
                .value_name("LVL")
                .default_value("0")
                .help("Log level: 0 silent, 1 info, 2 debug, 3 debug2"),
        )
        .arg(
            Arg::with_name("fast")
                .short("f")
                .help("Disable the speed limit (convert/register modes)"),
        )
        .arg(
            Arg::with_name("opt")
                .short("o")
                .takes_value(true)
                .value_name("N")
                .default_value("0")
                .help("Optimisation level for convert mode: 0, 1, or 2"),
        )
        .arg(
            Arg::with_name("no_cache")
                .short("n")
                .help("Disable the mixed-mode driver's section cache"),
        )
        .get_matches();

    let verbosity = value_t!(matches, "verbosity", u8).unwrap_or_else(|e| e.exit());
    let opt = value_t!(matches, "opt", u8).unwrap_or_else(|e| e.exit());
    if opt > 2 {
        eprintln!("optimisation level must be 0, 1, or 2");
        process::exit(1);
    }

    let logger = Logger::new(LogLevel::from_verbosity(verbosity));
    let fast = matches.is_present("fast");
    let no_cache = matches.is_present("no_cache");

    let result = if let Some(path) = matches.value_of("convert") {
        let cost_logger = logger.clone();
        dcj_cli::run_convert(Path::new(path), opt, !no_cache, !fast, logger)
            .map(|cost| cost_logger.info(format!("program cost: {}", cost)))
    } else if let Some(path) = matches.value_of("stack") {
        dcj_cli::run_stack(Path::new(path), logger)
    } else if let Some(path) = matches.value_of("register") {
        dcj_cli::run_register(Path::new(path), logger)
    } else {
        unreachable!("clap enforces exactly one of -c/-s/-r via the \"input\" group")
    };

    if let Err(err) = result {
        eprintln!("{}", err);
        process::exit(1);
    }
}
