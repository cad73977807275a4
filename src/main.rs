mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod models;
mod routes;
mod service;
mod ussd;
mod utils;

use std::sync::Arc;

use config::Config;
use dotenv::dotenv;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::filter::LevelFilter;

use crate::db::db::DBClient;
use crate::db::schema::init_schema;
use crate::service::anchor_service::{AnchorNotifier, HttpAnchor, NoopAnchor};
use crate::service::matching_service::MatchingService;
use crate::ussd::Interpreter;

pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    pub matching_service: Arc<MatchingService>,
    pub interpreter: Interpreter,
}

impl AppState {
    pub fn new(db_client: DBClient, config: Config) -> Self {
        let db_client = Arc::new(db_client);

        let anchor: Arc<dyn AnchorNotifier> = match config.anchor_url.as_deref() {
            Some(url) => Arc::new(HttpAnchor::new(url)),
            None => Arc::new(NoopAnchor),
        };

        let matching_service = Arc::new(MatchingService::new(
            db_client.clone(),
            config.match_policy.clone(),
            anchor,
        ));
        let interpreter = Interpreter::new(
            db_client.clone(),
            matching_service.clone(),
            config.clone(),
        );

        Self {
            env: config,
            db_client,
            matching_service,
            interpreter,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::INFO)
        .init();

    dotenv().ok();

    let config = Config::init();

    let pool = match PgPoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            println!("✅ Connection to the database is successful!");
            pool
        }
        Err(err) => {
            println!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = init_schema(&pool).await {
        println!("🔥 Schema bootstrap failed: {:?}", err);
        std::process::exit(1);
    }

    let port = config.port;
    if config.anchor_url.is_some() {
        tracing::info!("completion anchoring is enabled");
    }

    let app_state = Arc::new(AppState::new(DBClient::new(pool), config));
    let app = create_router(app_state);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await {
        Ok(listener) => listener,
        Err(err) => {
            println!("🔥 Could not bind port {}: {:?}", port, err);
            std::process::exit(1);
        }
    };

    println!("🚀 Server running on port {}", port);
    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("server error: {:?}", err);
    }
}
