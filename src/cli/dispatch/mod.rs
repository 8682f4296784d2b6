//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the gateway with its full configuration state.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{gateway, verifier};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    // Validate verifier arguments relative to the provider
    crate::cli::commands::validate(matches).map_err(|e| anyhow::anyhow!(e))?;

    let gateway_opts = gateway::Options::parse(matches)?;
    let verifier_opts = verifier::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        login_url: gateway_opts.login_url,
        logout_path: gateway_opts.logout_path,
        session_cookie_name: gateway_opts.session_cookie_name,
        session_ttl_seconds: gateway_opts.session_ttl_seconds,
        users_file: gateway_opts.users_file,
        verifier: verifier_opts.provider,
        verifier_url: verifier_opts.url,
        verifier_timeout_seconds: verifier_opts.timeout_seconds,
    }))
}
