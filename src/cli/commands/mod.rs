pub mod gateway;
pub mod logging;
pub mod verifier;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    ColorChoice, Command,
};

use self::verifier::{ARG_VERIFIER, ARG_VERIFIER_URL};

/// Validate that the remote verifier has an endpoint to call.
///
/// # Errors
/// Returns an error string if `--verifier remote` is set without `--verifier-url`.
pub fn validate(matches: &clap::ArgMatches) -> Result<(), String> {
    let Some(provider) = matches.get_one::<String>(ARG_VERIFIER) else {
        return Ok(()); // Should be handled by the default value in clap
    };

    if provider == "remote" && !matches.contains_id(ARG_VERIFIER_URL) {
        return Err(format!(
            "Missing required argument: --{ARG_VERIFIER_URL} (required for the remote verifier)"
        ));
    }

    Ok(())
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("tessera")
        .about("Token-based authentication gateway")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            clap::Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("TESSERA_PORT")
                .value_parser(clap::value_parser!(u16)),
        );

    let command = gateway::with_args(command);
    let command = verifier::with_args(command);
    logging::with_args(command)
}
