use clap::{builder::ValueParser, Arg, ArgAction, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

// Accepts a level name or a repeat count, so `TESSERA_LOG_LEVEL=debug` and
// `-vvv` mean the same thing.
fn level_parser() -> ValueParser {
    ValueParser::from(|value: &str| -> std::result::Result<u8, String> {
        match value.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            other => match other.parse::<u8>() {
                Ok(count) if count <= 4 => Ok(count),
                _ => Err(format!("unknown log level: {value}")),
            },
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Log verbosity: -v warnings, -vv info, -vvv debug, -vvvv trace")
            .env("TESSERA_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(level_parser()),
    )
}
