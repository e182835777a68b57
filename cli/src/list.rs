use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};

use unlist::{Config, Store};

pub fn cmd() -> Command {
    Command::new("list")
        .about("List all unsubscribed addresses")
        .display_order(20)
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print as json")
                .action(ArgAction::SetTrue),
        )
}

pub fn run(matches: &ArgMatches, config: &Config) -> Result<()> {
    let db = crate::open_store(config)?;
    let records = db.list()?;

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        for record in &records {
            println!("{}\t{}", record.unsubscribed_at.to_rfc3339(), record.email);
        }
        eprintln!("{} unsubscribed addresses", records.len());
    }

    Ok(())
}
