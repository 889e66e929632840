use clap::Parser;
use log::{debug, warn};
use snafu::ErrorCompat;

mod args;
mod import;

use crate::args::{Args, Command};
use crate::import::ImportError;

fn run(args: &Args) -> Result<(), ImportError> {
    match &args.command {
        Command::Init { database, reset } => import::run_init(database, *reset),
        Command::Import { config, only } => {
            let reports = import::run_import(config, only.as_deref())?;
            println!("{} import job(s) completed", reports.len());
            Ok(())
        }
        Command::Export { database, out } => import::run_export(database, out).map(|_| ()),
    }
}

fn main() {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    debug!("args: {:?}", args);

    if let Err(e) = run(&args) {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured: {}", e);
        for cause in e.iter_chain().skip(1) {
            eprintln!("  caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
