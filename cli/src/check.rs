use anyhow::Result;
use clap::{arg, ArgMatches, Command};

use unlist::{email, Config, Store};

pub fn cmd() -> Command {
    Command::new("check")
        .about("Check whether an address is unsubscribed")
        .display_order(30)
        .arg_required_else_help(true)
        .arg(arg!(<email> "Email address, normalized before lookup"))
}

pub fn run(matches: &ArgMatches, config: &Config) -> Result<()> {
    let raw = matches
        .get_one::<String>("email")
        .ok_or_else(|| anyhow::Error::msg("missing email"))?;
    let address = email::normalize(raw);
    if address.is_empty() {
        anyhow::bail!("empty email address");
    }

    let db = crate::open_store(config)?;
    match db.find(&address)? {
        Some(record) => println!(
            "{} unsubscribed at {}",
            record.email,
            record.unsubscribed_at.to_rfc3339()
        ),
        None => println!("{address} is not unsubscribed"),
    }

    Ok(())
}
