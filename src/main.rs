use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use std::io;

mod config;
mod database;
mod error;
mod models;
mod routes;
mod telemetry;
mod workflow;

use config::{Config, StoreKind};
use database::{mongo, Env};
use models::user::{Keys, UserAuthenticationMiddlewareFactory};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    let config: Config = Config::from_env()
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error.to_string()))?;
    telemetry::init(&config.log_format);

    let keys: Keys = Keys::from_config(&config)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error.to_string()))?;

    let env: Env = match config.store {
        StoreKind::Mongo => {
            let store: mongo::MongoStore =
                mongo::connect(&config.mongodb_uri, &config.database_name)
                    .await
                    .map_err(|error| io::Error::new(io::ErrorKind::Other, error.to_string()))?;
            store
                .ensure_unique_indexes(models::UNIQUE_INDEXES)
                .await
                .map_err(|error| io::Error::new(io::ErrorKind::Other, error.to_string()))?;
            Env::mongo(store, config.currency.clone())
        }
        StoreKind::Memory => {
            tracing::warn!("using the in-memory store, records are lost on shutdown");
            Env::in_memory(config.currency.clone())
        }
    };
    let env: web::Data<Env> = web::Data::new(env);
    let address: (String, u16) = (config.host.clone(), config.port);
    let config: web::Data<Config> = web::Data::new(config);

    tracing::info!(host = %address.0, port = address.1, "starting server");

    HttpServer::new(move || {
        let cors: Cors = match &config.cors_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header(),
            None => Cors::permissive(),
        };

        App::new()
            .wrap(UserAuthenticationMiddlewareFactory::new(keys.clone()))
            .wrap(cors)
            .app_data(env.clone())
            .app_data(config.clone())
            .configure(routes::configure)
    })
    .bind(address)?
    .run()
    .await
}
