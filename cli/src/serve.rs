use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use tokio_util::sync::CancellationToken;

use unlist::Config;

pub fn cmd() -> Command {
    Command::new("serve")
        .about("Serve the unsubscribe endpoint")
        .display_order(10)
        .arg(
            Arg::new("address")
                .long("address")
                .short('a')
                .value_name("ADDR")
                .help("Address to listen on, overrides the config"),
        )
}

pub async fn run(matches: &ArgMatches, mut config: Config, cancel: CancellationToken) -> Result<()> {
    if let Some(address) = matches.get_one::<String>("address") {
        config.address = address.parse()?;
    }

    // Cancel on ctrl_c, server shuts down gracefully once cancelled
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("Initiating graceful shutdown...");
            signal.cancel();
        }
    });

    unlist::axum::start_with(config, cancel.cancelled_owned()).await?;

    Ok(())
}
