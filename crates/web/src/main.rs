use database::{DatabaseConnectionInfo, PgDatabase};
use log::{error, info, warn};
use parking::{
    database::Database,
    memory::MemoryDatabase,
    server::{Server, ServerConfig},
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use web::{auth::TokenService, config::WebConfig, start_web_server, WebState};

#[tokio::main]
async fn main() {
    env_logger::init();

    // request spans emitted by the http trace layer
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("could not install tracing subscriber.");

    let config = WebConfig::from_env().expect("invalid configuration in env.");

    // database
    match DatabaseConnectionInfo::from_env() {
        Some(connection_info) => {
            let database = PgDatabase::connect(connection_info)
                .await
                .expect("could not connect to database.");
            run(database, config).await;
        }
        None => {
            warn!("no database connection info in env, zones are kept in memory only");
            run(MemoryDatabase::new(), config).await;
        }
    }
}

async fn run<D: Database + 'static>(database: D, config: WebConfig) {
    // server
    let server = Server::start(
        database,
        ServerConfig {
            refresh_interval: config.refresh_interval,
            ..Default::default()
        },
    )
    .await;

    // web server
    let state = WebState {
        client: server.client(),
        tokens: Arc::new(TokenService::new(&config.auth)),
    };
    if let Err(why) = start_web_server(state, config.bind_address).await {
        error!("web server stopped: {}", why);
    }

    server.shutdown().await;
    info!("bye");
}
