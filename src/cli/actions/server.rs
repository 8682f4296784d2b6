use crate::{
    api,
    gateway::{
        AllowAllVerifier, FaceServiceVerifier, Gateway, GatewayConfig, IdentityProvider,
        SecondaryVerifier, StaticDirectory,
    },
};
use anyhow::{anyhow, Context, Result};
use std::{path::Path, sync::Arc};
use tracing::warn;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub login_url: String,
    pub logout_path: String,
    pub session_cookie_name: String,
    pub session_ttl_seconds: i64,
    pub users_file: Option<String>,
    pub verifier: String,
    pub verifier_url: Option<String>,
    pub verifier_timeout_seconds: u64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the principal directory cannot be loaded, the verifier
/// endpoint is invalid, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let config = GatewayConfig::new(args.login_url)
        .with_logout_path(args.logout_path)
        .with_session_cookie_name(args.session_cookie_name)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_verifier_timeout_seconds(args.verifier_timeout_seconds);

    let directory = match &args.users_file {
        Some(path) => StaticDirectory::from_file(Path::new(path))?,
        None => StaticDirectory::new(Vec::new()),
    };

    if directory.is_empty() {
        warn!("Principal directory is empty, every login will be rejected");
    }

    let identity: Arc<dyn IdentityProvider> = Arc::new(directory);

    let verifier: Arc<dyn SecondaryVerifier> = match args.verifier.as_str() {
        "remote" => {
            let raw = args
                .verifier_url
                .ok_or_else(|| anyhow!("Verifier URL is required for the remote provider"))?;
            let endpoint = Url::parse(&raw)
                .with_context(|| format!("Invalid verifier URL: {raw}"))?;
            Arc::new(FaceServiceVerifier::new(
                endpoint,
                config.verifier_timeout(),
            )?)
        }
        _ => Arc::new(AllowAllVerifier),
    };

    let gateway = Arc::new(Gateway::new(config, identity, verifier));

    api::serve(args.port, gateway).await
}
