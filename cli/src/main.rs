mod check;
mod list;
mod serve;

use clap::{Arg, ArgMatches, Command};
use tokio_util::sync::CancellationToken;

use unlist::{config, Config};

pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let matches = cmd().get_matches();

    // Load the config from the provided path, falling back to the default
    // file name. Both can be complemented by the environment.
    let mut config: Config = match matches.get_one::<String>("config") {
        Some(path) => config::load_from(path)?,
        None => config::load()?,
    };

    apply_verbosity(&matches, &mut config)?;

    match matches.subcommand() {
        // The server initializes tracing itself as it starts
        Some(("serve", m)) => serve::run(m, config, cancel.clone()).await?,
        Some((name, m)) => {
            unlist::tracing::init(&config)?;
            match name {
                "list" => list::run(m, &config)?,
                "check" => check::run(m, &config)?,
                _ => unreachable!("unknown subcommand: {name}"),
            }
        }
        None => unreachable!("subcommand is required"),
    }

    Ok(())
}

pub fn cmd() -> Command {
    Command::new("unlist")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .infer_subcommands(true)
        .version(VERSION)
        .about("Records addresses unsubscribing from a mailing list.")
        .subcommand(serve::cmd())
        .subcommand(list::cmd())
        .subcommand(check::cmd())
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .global(true)
                .help("Path to the config file"),
        )
        .arg(
            Arg::new("verbosity")
                .long("verbosity")
                .short('v')
                .display_order(100)
                .value_name("level")
                .value_parser(["trace", "debug", "info", "warn", "error", "none"])
                .global(true)
                .help("Set the verbosity of the log output"),
        )
}

/// Overrides the configured log level with the one passed on the command
/// line, if any.
fn apply_verbosity(matches: &ArgMatches, config: &mut Config) -> anyhow::Result<()> {
    if let Some(level) = matches.get_one::<String>("verbosity") {
        config.tracing.level = level.parse()?;
    }
    Ok(())
}

/// Opens the store described by the config, failing if it isn't configured.
pub fn open_store(config: &Config) -> anyhow::Result<unlist::Database> {
    Ok(unlist::Database::connect_with(&config.store)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmd_is_valid() {
        cmd().debug_assert();
    }

    #[test]
    fn check_takes_an_address() {
        let matches = cmd()
            .try_get_matches_from(["unlist", "check", "Foo@Example.com"])
            .unwrap();
        let (name, m) = matches.subcommand().unwrap();
        assert_eq!(name, "check");
        assert_eq!(m.get_one::<String>("email").unwrap(), "Foo@Example.com");
    }

    #[test]
    fn verbosity_applies_to_every_subcommand() {
        for args in [
            vec!["unlist", "list", "-v", "debug"],
            vec!["unlist", "check", "-v", "debug", "a@b.com"],
            vec!["unlist", "serve", "-v", "debug"],
        ] {
            let matches = cmd().try_get_matches_from(args.clone()).unwrap();
            let mut config = Config::default();
            apply_verbosity(&matches, &mut config).unwrap();
            assert_eq!(config.tracing.level, unlist::tracing::Level::Debug, "{args:?}");
        }
    }
}
