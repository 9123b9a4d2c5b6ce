mod cli;
mod history;
mod paths;
mod report;
mod run;
mod state;
mod templates;
mod texture;
mod watch;

use anyhow::Result;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();
    run::run(cli.command)
}
