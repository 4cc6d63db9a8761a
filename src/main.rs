use std::path::PathBuf;
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, app};
use bewell_core::config::{flag_from_env_value, recent_cases_limit_from_env_value};
use bewell_core::constants::{DEFAULT_DATA_DIR, DEFAULT_PUBLIC_BASE_URL};
use bewell_core::{CoreConfig, LocalBackend};

/// Default log levels, one per crate that logs. `RUST_LOG` adds to these.
const LOG_DIRECTIVES: [&str; 2] = ["bewell=info", "api_rest=info"];

fn env_filter() -> Result<EnvFilter, ParseError> {
    LOG_DIRECTIVES
        .iter()
        .try_fold(EnvFilter::from_default_env(), |filter, directive| {
            Ok(filter.add_directive(directive.parse::<Directive>()?))
        })
}

/// Main entry point for the Be Well service
///
/// Resolves configuration from the environment once, opens the local data directory and serves
/// the screen API over REST.
///
/// # Environment Variables
/// - `BEWELL_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `BEWELL_DATA_DIR`: Directory for all local data (default: "bewell_data")
/// - `BEWELL_PUBLIC_BASE_URL`: Base used to build photo URLs (default: "http://localhost:3000")
/// - `BEWELL_RECENT_CASES_LIMIT`: Cases listed on the home screen (default: 20)
/// - `BEWELL_ALLOW_UNSCOPED_CHILDREN`: Let symptom entry fall back to every child (default: true)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(env_filter()?)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("BEWELL_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir = std::env::var("BEWELL_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
    let public_base_url = std::env::var("BEWELL_PUBLIC_BASE_URL")
        .unwrap_or_else(|_| DEFAULT_PUBLIC_BASE_URL.into());
    let recent_cases_limit =
        recent_cases_limit_from_env_value(std::env::var("BEWELL_RECENT_CASES_LIMIT").ok())?;
    let allow_unscoped_children =
        flag_from_env_value(std::env::var("BEWELL_ALLOW_UNSCOPED_CHILDREN").ok(), true)?;

    let cfg = CoreConfig::new(
        data_dir,
        public_base_url,
        recent_cases_limit,
        allow_unscoped_children,
    )?;
    tracing::info!("++ Using data directory {}", cfg.data_dir().display());

    let backend = LocalBackend::open(cfg)?;
    let rest_app = app(AppState::new(&backend));

    tracing::info!("++ Starting Be Well REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, rest_app).await?;

    Ok(())
}
