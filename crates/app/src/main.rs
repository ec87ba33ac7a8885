//! Tollgate - Command-line entry point
//!
//! Loads the gateway settings, wires the reqwest and file-backed adapters
//! into the application layer and runs one command against the backend.

mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tollgate_application::{
    CredentialRefresher, GatewayError, GatewayOptions, Login, Logout, RefreshCoordinator,
    RequestGateway, SessionEvents, TokenStore,
};
use tollgate_domain::{ApiRequest, Credentials, TokenPool};
use tollgate_infrastructure::{
    FileSessionStorage, GatewayConfig, ReqwestHttpClient, RestTokenEndpoint, SystemClock,
    TokioFileSystem,
};

use crate::cli::{Cli, Command};

/// Everything one command needs, bound to a single pool.
struct Client {
    store: Arc<TokenStore>,
    login: Login,
    logout: Logout,
    gateway: RequestGateway<ReqwestHttpClient>,
}

impl Client {
    async fn connect(
        config: &GatewayConfig,
        pool: TokenPool,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let http = Arc::new(ReqwestHttpClient::with_options(
            config.base_url.clone(),
            config.request_timeout(),
            &config.user_agent,
        )?);
        let endpoint = Arc::new(RestTokenEndpoint::new(http.clone(), pool));
        let storage = Arc::new(FileSessionStorage::new(
            TokioFileSystem::new(),
            config.session_dir()?,
        ));
        let clock = Arc::new(SystemClock);
        let events = SessionEvents::default();

        let buffer = config.refresh_buffer();
        let store =
            Arc::new(TokenStore::new(pool, storage, clock.clone()).with_refresh_buffer(buffer));
        store.load().await?;

        let mut coordinator = RefreshCoordinator::new(
            store.clone(),
            CredentialRefresher::new(endpoint.clone(), clock),
            events.clone(),
        );
        if let Some(timeout) = config.refresh_timeout() {
            coordinator = coordinator.with_refresh_timeout(timeout);
        }

        let options = GatewayOptions::for_pool(pool)
            .with_signed_out_path(config.signed_out_path(pool))
            .with_proactive_refresh(!buffer.is_zero());

        Ok(Self {
            store: store.clone(),
            login: Login::new(endpoint, store.clone(), events.clone()),
            logout: Logout::new(store, events.clone()),
            gateway: RequestGateway::new(http, Arc::new(coordinator), events, options),
        })
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = GatewayConfig::load(cli.config.as_deref())?;
    tracing::debug!(base_url = %config.base_url, pool = %cli.pool, "Loaded configuration");

    let client = Client::connect(&config, cli.pool).await?;

    match cli.command {
        Command::Login { username, password } => {
            let credentials = username
                .zip(password)
                .map(|(username, password)| Credentials::new(username, password));
            let status = client.login.execute(credentials.as_ref()).await?;
            println!("Signed in ({}): {}", cli.pool, status.display_message());
        }
        Command::Logout => {
            client.logout.execute().await?;
            println!("Signed out ({})", cli.pool);
        }
        Command::Status => {
            println!("{}: {}", cli.pool, client.store.status().display_message());
        }
        Command::Refresh => match client.gateway.refresh().await {
            Ok(_) => println!(
                "Refreshed ({}): {}",
                cli.pool,
                client.store.status().display_message()
            ),
            Err(e) => return Ok(report(&e, &client.gateway.options().redirect_to())),
        },
        Command::Request { method, path, body } => {
            let mut request = ApiRequest::new(method, path);
            if let Some(body) = body {
                request = request.with_body(body);
            }

            match client.gateway.send(&request).await {
                Ok(response) => {
                    println!("{}", serde_json::to_string_pretty(&response.data)?);
                    if !response.is_success() {
                        eprintln!("Backend answered with status {}", response.status);
                        return Ok(ExitCode::FAILURE);
                    }
                }
                Err(e) => {
                    let redirect = e
                        .redirect_to()
                        .map_or_else(|| client.gateway.options().redirect_to(), str::to_string);
                    return Ok(report(&e, &redirect));
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Prints a gateway failure; a lost session also prints where to sign in again.
fn report(error: &GatewayError, redirect_to: &str) -> ExitCode {
    eprintln!("Error: {error}");
    if matches!(
        error,
        GatewayError::SessionEnded { .. }
            | GatewayError::NoRefreshToken
            | GatewayError::RefreshRejected { .. }
    ) {
        eprintln!("Sign in again: {redirect_to}");
    }
    ExitCode::FAILURE
}
