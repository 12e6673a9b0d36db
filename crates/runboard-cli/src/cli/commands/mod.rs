pub mod ingest;
pub mod query;
pub mod watch;

use super::args::{Cli, Command};
use super::helpers;

/// Open the store, then hand off to the subcommand.
///
/// The database URL is checked first for every command; Jenkins settings only
/// for commands that fetch.
pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let store = helpers::open_store(&cli)?;

    match cli.cmd {
        Command::Ingest => ingest::run(&cli.jenkins, store).await,
        Command::Watch => watch::run(&cli.jenkins, cli.interval, store).await,
        Command::Results(args) => query::results(store, args),
        Command::Heatmap(args) => query::heatmap(store, args),
        Command::Projects(args) => query::projects(store, args),
        Command::Get(args) => query::get(store, args),
    }
}
