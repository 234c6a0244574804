//! Static dynamic-inventory responder.
//!
//! ```text
//! inventory --list         whole inventory
//! inventory --host web-01  variables of one host
//! inventory                empty inventory
//! ```

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use hit_counter::inventory::{respond, Inventory, Query};

/// Print fixed inventory data as JSON.
#[derive(Parser, Debug)]
#[command(name = "inventory")]
#[command(about = "Static dynamic-inventory script")]
#[command(version)]
struct Args {
    /// Print all groups and host variables.
    #[arg(long)]
    list: bool,

    /// Print the variables of one host.
    #[arg(long, value_name = "NAME", conflicts_with = "list")]
    host: Option<String>,

    /// Enable verbose logging on standard error. Takes precedence over RUST_LOG.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    hit_counter::logging::init_cli_logging(args.verbose);

    let query = Query::from_flags(args.list, args.host);
    debug!(?query, "Answering inventory query");

    match respond(&Inventory::example(), &query) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("inventory: {}", e);
            ExitCode::FAILURE
        }
    }
}
