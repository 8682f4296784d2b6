use anyhow::{Context, Result};
use clap::{Arg, Command};

pub const ARG_LOGIN_URL: &str = "login-url";
pub const ARG_LOGOUT_PATH: &str = "logout-path";
pub const ARG_SESSION_COOKIE_NAME: &str = "session-cookie-name";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_USERS_FILE: &str = "users-file";

/// Parsed gateway options.
#[derive(Debug)]
pub struct Options {
    pub login_url: String,
    pub logout_path: String,
    pub session_cookie_name: String,
    pub session_ttl_seconds: i64,
    pub users_file: Option<String>,
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_LOGIN_URL)
                .long(ARG_LOGIN_URL)
                .help("Login endpoint: a path (/login) or an absolute URL")
                .default_value("/login")
                .env("TESSERA_LOGIN_URL"),
        )
        .arg(
            Arg::new(ARG_LOGOUT_PATH)
                .long(ARG_LOGOUT_PATH)
                .help("Logout endpoint path")
                .default_value("/logout")
                .env("TESSERA_LOGOUT_PATH"),
        )
        .arg(
            Arg::new(ARG_SESSION_COOKIE_NAME)
                .long(ARG_SESSION_COOKIE_NAME)
                .help("Name of the session cookie")
                .default_value("tessera_session")
                .env("TESSERA_SESSION_COOKIE_NAME"),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session lifetime in seconds")
                .default_value("43200")
                .env("TESSERA_SESSION_TTL_SECONDS")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_USERS_FILE)
                .long(ARG_USERS_FILE)
                .help("JSON file with the known principals")
                .env("TESSERA_USERS_FILE"),
        )
}

impl Options {
    /// Extract gateway options from validated matches.
    ///
    /// # Errors
    /// Returns an error if a defaulted argument is somehow absent.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let login_url = matches
            .get_one::<String>(ARG_LOGIN_URL)
            .cloned()
            .context("missing required argument: --login-url")?;
        let logout_path = matches
            .get_one::<String>(ARG_LOGOUT_PATH)
            .cloned()
            .context("missing required argument: --logout-path")?;
        let session_cookie_name = matches
            .get_one::<String>(ARG_SESSION_COOKIE_NAME)
            .cloned()
            .context("missing required argument: --session-cookie-name")?;
        let session_ttl_seconds = matches
            .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .unwrap_or(43200);
        let users_file = matches.get_one::<String>(ARG_USERS_FILE).cloned();

        Ok(Self {
            login_url,
            logout_path,
            session_cookie_name,
            session_ttl_seconds,
            users_file,
        })
    }
}
