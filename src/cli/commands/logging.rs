use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";

// `-v` count indexes this table, zero keeps the subscriber default.
const LEVELS: [Level; 5] = [
    Level::ERROR,
    Level::WARN,
    Level::INFO,
    Level::DEBUG,
    Level::TRACE,
];

/// `NIGHTVOLT_LOG_LEVEL` takes either a count (`0` to `4`) or a level name.
fn parse_verbosity(value: &str) -> Result<u8, String> {
    let value = value.trim();

    let index = match value.parse::<usize>() {
        Ok(count) if count < LEVELS.len() => count,
        Ok(count) => return Err(format!("log level count {count} is above 4")),
        Err(_) => {
            let level = value
                .parse::<Level>()
                .map_err(|_| format!("invalid log level: {value}"))?;
            LEVELS.iter().position(|known| *known == level).unwrap_or(0)
        }
    };

    u8::try_from(index).map_err(|e| e.to_string())
}

/// Level asked for on the command line or environment.
#[must_use]
pub fn level(matches: &ArgMatches) -> Option<Level> {
    match matches.get_one::<u8>(ARG_VERBOSITY).copied().unwrap_or(0) {
        0 => None,
        count => LEVELS.get(usize::from(count)).or(LEVELS.last()).copied(),
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Log more: -v warn, -vv info, -vvv debug, -vvvv trace (default: error)")
            .env("NIGHTVOLT_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(parse_verbosity),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches_from(args: &[&str]) -> ArgMatches {
        temp_env::with_var_unset("NIGHTVOLT_LOG_LEVEL", || {
            with_args(Command::new("nightvolt-auth")).get_matches_from(args)
        })
    }

    #[test]
    fn level_names_and_counts() {
        assert_eq!(parse_verbosity("error"), Ok(0));
        assert_eq!(parse_verbosity("WARN"), Ok(1));
        assert_eq!(parse_verbosity(" info "), Ok(2));
        assert_eq!(parse_verbosity("3"), Ok(3));
        assert!(parse_verbosity("9").is_err());
        assert!(parse_verbosity("loud").is_err());
    }

    #[test]
    fn count_maps_to_level() {
        assert_eq!(level(&matches_from(&["nightvolt-auth"])), None);
        assert_eq!(level(&matches_from(&["nightvolt-auth", "-v"])), Some(Level::WARN));
        assert_eq!(level(&matches_from(&["nightvolt-auth", "-vv"])), Some(Level::INFO));
        assert_eq!(
            level(&matches_from(&["nightvolt-auth", "-vvvv"])),
            Some(Level::TRACE)
        );
        assert_eq!(
            level(&matches_from(&["nightvolt-auth", "-vvvvvvv"])),
            Some(Level::TRACE)
        );
    }
}
