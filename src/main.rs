mod args;
mod clean;

use clap::Parser;
use log::{debug, info};
use snafu::ErrorCompat;
use std::error::Error;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
            .init();
    } else {
        env_logger::init();
    }
    debug!("args: {:?}", args);

    let res = clean::run_cleaning(
        args.config.clone(),
        args.input.clone(),
        args.input_type.clone(),
        args.excel_worksheet_name.clone(),
        args.out.clone(),
        args.summary.clone(),
        args.reference.clone(),
    );

    match res {
        Ok(()) => {
            info!("cleaning completed");
        }
        Err(e) => {
            eprintln!("An error occured: {}", e);
            let mut cause = e.source();
            while let Some(c) = cause {
                eprintln!("  caused by: {}", c);
                cause = c.source();
            }
            if let Some(bt) = ErrorCompat::backtrace(&e) {
                eprintln!("trace: {}", bt);
            }
            std::process::exit(1);
        }
    }
}
