#[cfg(test)]
#[macro_use]
mod test_support;

mod config;
mod db;
mod errors;
mod middleware;
mod models;
mod routes;
mod services;
mod state;
mod utils;

use actix_web::{web, App, HttpServer};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    tracing::info!("Connecting to database...");
    let db = db::establish_connection(&config)
        .await
        .map_err(std::io::Error::other)?;
    tracing::info!("Database connected");

    if config.auto_migrate {
        db::create_schema(&db).await.map_err(std::io::Error::other)?;
    }

    let bind_address = (config.server_host.clone(), config.server_port);
    let state = AppState::from_config(db.clone(), config).map_err(std::io::Error::other)?;
    let data = web::Data::new(state);

    tracing::info!("Starting server on http://{}:{}", bind_address.0, bind_address.1);

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(data.clone())
            .configure(routes::configure_routes)
    })
        .bind(bind_address)?
        .run()
        .await?;

    tracing::info!("Server stopped, closing database pool");
    db.close().await.map_err(std::io::Error::other)?;
    Ok(())
}
