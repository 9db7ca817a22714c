/// PathTransform CLI
///
/// Usage:
///     pathtransform apply <REPRESENTATION> -p 100,100,100 -p 1000,1000,1000
///     pathtransform single <REPRESENTATION> 1,1,0
///     pathtransform describe <REPRESENTATION>
///     pathtransform fit --kind triangulated --pair 0,0,1,1 --pair ...

use clap::Parser;
use log::LevelFilter;
use std::io;
use pathtransform_cli::{run, Cli};

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    run(cli)
}
