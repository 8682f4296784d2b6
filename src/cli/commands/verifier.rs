use anyhow::{Context, Result};
use clap::{Arg, Command};

pub const ARG_VERIFIER: &str = "verifier";
pub const ARG_VERIFIER_URL: &str = "verifier-url";
pub const ARG_VERIFIER_TIMEOUT_SECONDS: &str = "verifier-timeout-seconds";

/// Parsed secondary-verifier options.
#[derive(Debug)]
pub struct Options {
    pub provider: String,
    pub url: Option<String>,
    pub timeout_seconds: u64,
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VERIFIER)
                .long(ARG_VERIFIER)
                .help("Secondary-factor provider")
                .value_parser(["allow-all", "remote"])
                .default_value("allow-all")
                .env("TESSERA_VERIFIER"),
        )
        .arg(
            Arg::new(ARG_VERIFIER_URL)
                .long(ARG_VERIFIER_URL)
                .help("Face verification endpoint, example: https://faces.tld/verify")
                .env("TESSERA_VERIFIER_URL"),
        )
        .arg(
            Arg::new(ARG_VERIFIER_TIMEOUT_SECONDS)
                .long(ARG_VERIFIER_TIMEOUT_SECONDS)
                .help("Upper bound for a single verification call")
                .default_value("5")
                .env("TESSERA_VERIFIER_TIMEOUT_SECONDS")
                .value_parser(clap::value_parser!(u64)),
        )
}

impl Options {
    /// Extract verifier options from validated matches.
    ///
    /// # Errors
    /// Returns an error if the provider argument is absent.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let provider = matches
            .get_one::<String>(ARG_VERIFIER)
            .cloned()
            .context("missing required argument: --verifier")?;
        let url = matches.get_one::<String>(ARG_VERIFIER_URL).cloned();
        let timeout_seconds = matches
            .get_one::<u64>(ARG_VERIFIER_TIMEOUT_SECONDS)
            .copied()
            .unwrap_or(5);

        Ok(Self {
            provider,
            url,
            timeout_seconds,
        })
    }
}
