use clap::Parser;

use dantalian::cli::{bootstrap, output, Cli};
use dantalian::diagnostics::Diagnostics;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = bootstrap(&cli, Diagnostics::builder()) {
        output::error(&e);
        std::process::exit(e.exit_code());
    }
}
