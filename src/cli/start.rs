use crate::cli::{actions::Action, commands, dispatch, telemetry};
use anyhow::Result;

/// Build the action for this invocation: parse the arguments, bring up
/// logging, and map the matches to something executable.
///
/// # Errors
/// Returns an error if argument validation or telemetry setup fails.
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    let verbosity = matches
        .get_one::<u8>(commands::logging::ARG_VERBOSITY)
        .copied()
        .unwrap_or(0);
    telemetry::init(verbosity)?;

    dispatch::handler(&matches)
}
