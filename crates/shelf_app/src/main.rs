mod cli;
mod platform;

use clap::Parser;
use shelf_logging::shelf_error;

fn main() {
    let args = cli::Args::parse();
    if let Err(err) = cli::dispatch(args) {
        shelf_error!("{:#}", err);
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
