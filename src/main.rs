use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use std::sync::Arc;

use sweep::auth::AuthMiddleware;
use sweep::config::Config;
use sweep::routes::{self, health};
use sweep::services::AppState;
use sweep::store::{postgres, PgStore};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = postgres::create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to connect to database")?;
    postgres::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let state = AppState::new(Arc::new(PgStore::new(pool)));
    let jwt_secret = config.jwt_secret.clone();

    log::info!("Starting SWEEP server at {}", config.server_url());

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(jwt_secret.clone()))
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await?;

    Ok(())
}
