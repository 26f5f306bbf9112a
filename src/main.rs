mod config;
mod core;
mod cors;
mod error;
mod formatters;
mod handlers;
mod models;
mod persisters;
mod validators;

use crate::config::{Config, StoreBackend};
use crate::core::Persister;
use crate::cors::{cors_gate, CorsPolicy};
use actix_web::{
    self,
    middleware::{from_fn, Logger},
    web::Data,
};
use log::info;
use persisters::{MemoryPersister, MongoPersister};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    match &config.store {
        StoreBackend::Mongo { uri, database } => {
            let persister = MongoPersister::connect(uri, database).await?;
            serve(&config, persister).await?;
        }
        StoreBackend::Memory => {
            info!("using in-memory document store, data is lost on exit");
            serve(&config, MemoryPersister::default()).await?;
        }
    }
    Ok(())
}

async fn serve<P>(config: &Config, persister: P) -> std::io::Result<()>
where
    P: Persister + Send + Sync + 'static,
{
    let persister = Data::new(persister);
    let cors = Data::new(CorsPolicy::default());
    info!("listening on {}", config.server_address());
    actix_web::HttpServer::new(move || {
        actix_web::App::new()
            .app_data(persister.clone())
            .app_data(cors.clone())
            .wrap(from_fn(cors_gate))
            .wrap(Logger::default())
            .configure(handlers::configure::<P>)
    })
    .bind(config.server_address())?
    .run()
    .await
}
