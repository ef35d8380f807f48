use anyhow::Result;
use clap::Parser;
use slog::{o, Drain};
use std::io;

use plssc::{run, Opts};

fn main() -> Result<()> {
    let opts = Opts::parse();

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let log = slog::Logger::root(drain, o!());

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    run(&opts, &log, &mut handle)
}
