pub(crate) mod core;
pub(crate) mod routes;
pub(crate) mod tools;
pub(crate) mod types;
pub(crate) mod utils;

use config::Config;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::core::config::Args;
use crate::core::error::ConfigError as Error;
use crate::core::state::AppState;

pub async fn run() -> Result<(), Error> {
    let config = Config::builder()
        .add_source(config::Environment::with_prefix("YAHOO"))
        .build()
        .map_err(Error::Config)?;

    let config = config.try_deserialize::<Args>().map_err(Error::Config)?;

    // stdout is the tool protocol channel in stdio mode, so logs go to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_new(&config.log_level).unwrap_or_default())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let state = AppState::new(&config)?;

    if std::env::args().nth(1).as_deref() == Some("stdio") {
        tracing::debug!("serving tool calls over stdio");
        return tools::stdio::serve(state).await;
    }

    let app = routes::router::routes(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .map_err(Error::IO)?;

    tracing::info!("setup page: http://127.0.0.1:{}", config.port);

    axum::serve(listener, app).await.map_err(Error::IO)?;

    Ok(())
}
